//! 骨骼系统
//!
//! 核心设计思想：
//! - Bone: 骨骼节点，arena 存储，父子关系用索引表达
//! - Armature: 管理骨骼层次结构与名称 / 蒙皮索引双向查找
//! - 变换计算: animated = parent.animated * local（根到叶传播）

mod armature;
mod bone;

pub use armature::Armature;
pub use bone::Bone;

use glam::{Mat4, Quat, Vec3};

// ============================================================================
// 公共类型定义
// ============================================================================

/// 骨骼变换数据
#[derive(Clone, Copy, Debug)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl BoneTransform {
    /// 转换为 4x4 矩阵
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// 从矩阵分解
    #[inline]
    pub fn from_matrix(m: Mat4) -> Self {
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// 平移 / 缩放线性插值，旋转最短弧球面插值
    pub fn interpolate(&self, other: &BoneTransform, t: f32) -> BoneTransform {
        BoneTransform {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.slerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}
