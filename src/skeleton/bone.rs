//! 骨骼节点
//!
//! 每个 Bone 是 arena 中的一个节点：父子关系用 arena 槽位索引表达，
//! 不持有引用，层级循环在结构上不可能出现。
//!
//! 变换集合：
//! - bind_local: 绑定姿势下相对父骨骼的变换（不变）
//! - inverse_bind: 角色空间静止姿势的逆矩阵，用于蒙皮（不变）
//! - local: 当前帧相对父骨骼的变换（Animator / IK / 约束写入）
//! - animated: 角色空间变换 = parent.animated * local

use glam::{Mat4, Quat};

/// 骨骼节点
#[derive(Clone, Debug)]
pub struct Bone {
    // ========================================
    // 静态数据（初始化后不变）
    // ========================================
    /// 骨骼名称
    pub name: String,

    /// 蒙皮索引（>= 0 时写入蒙皮矩阵数组，-1 表示辅助骨骼不参与蒙皮）
    pub skin_index: i32,

    /// 父骨骼 arena 槽位（None 表示根骨骼）
    pub parent: Option<usize>,

    /// 子骨骼 arena 槽位列表
    pub children: Vec<usize>,

    /// 绑定姿势本地变换
    pub bind_local: Mat4,

    /// 逆绑定矩阵（用于蒙皮）
    pub inverse_bind: Mat4,

    /// 绑定姿势本地旋转（约束参考系，build 时从 bind_local 分解缓存）
    pub bind_local_rotation: Quat,

    // ========================================
    // 动态数据（每帧更新）
    // ========================================
    /// 当前本地变换
    pub local: Mat4,

    /// 角色空间变换
    pub animated: Mat4,
}

impl Bone {
    /// 创建新骨骼，当前姿势初始化为绑定姿势
    pub fn new(
        name: String,
        skin_index: i32,
        parent: Option<usize>,
        inverse_bind: Mat4,
        bind_local: Mat4,
    ) -> Self {
        let (_, bind_local_rotation, _) = bind_local.to_scale_rotation_translation();
        Self {
            name,
            skin_index,
            parent,
            children: Vec::new(),
            bind_local,
            inverse_bind,
            bind_local_rotation,
            local: bind_local,
            animated: Mat4::IDENTITY,
        }
    }

    /// 是否为根骨骼
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// 是否参与蒙皮
    #[inline]
    pub fn is_skinned(&self) -> bool {
        self.skin_index >= 0
    }

    /// 角色空间位置
    #[inline]
    pub fn position(&self) -> glam::Vec3 {
        self.animated.col(3).truncate()
    }

    /// 角色空间旋转
    #[inline]
    pub fn rotation(&self) -> Quat {
        Quat::from_mat4(&self.animated)
    }

    /// 蒙皮矩阵
    /// skinning = animated * inverse_bind
    #[inline]
    pub fn skinning_matrix(&self) -> Mat4 {
        self.animated * self.inverse_bind
    }

    /// 绑定段长：绑定姿势下到父骨骼的距离（IK 求解用）
    #[inline]
    pub fn bind_segment_length(&self) -> f32 {
        self.bind_local.col(3).truncate().length()
    }

    /// 重置为绑定姿势
    #[inline]
    pub fn reset_to_bind(&mut self) {
        self.local = self.bind_local;
    }
}
