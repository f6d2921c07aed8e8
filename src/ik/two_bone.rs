//! 两骨解析 IK
//!
//! root -> mid -> end 必须是直接父子链。骨段长取绑定姿势下
//! mid / end 的本地偏移长度。目标距离钳到 [|L1-L2|, L1+L2]：
//! 不可达目标解到完全伸直 / 完全折叠姿势，永不失败。根部
//! 内角由余弦定理给出，中段随精确对齐自然成立。
//!
//! 可选极向目标（pole target）固定弯曲平面；链与目标共线且
//! 无极向目标时回退到固定正交轴。

use glam::Vec3;

use crate::math::{orthogonal_axis, rotation_between, DIR_EPSILON};
use crate::skeleton::Armature;
use crate::Result;

use super::apply_world_delta_rotation;

/// 可达区间收缩量（避免完全伸直 / 完全折叠的奇异姿势）
const REACH_MARGIN: f32 = 1.0e-5;

/// 两骨解析 IK 求解器
#[derive(Clone, Debug)]
pub struct TwoBoneIk {
    root: usize,
    mid: usize,
    end: usize,
    /// 绑定段长 root->mid
    len_upper: f32,
    /// 绑定段长 mid->end
    len_lower: f32,
    /// 极向目标（角色空间），决定弯曲平面
    pole: Option<Vec3>,
}

impl TwoBoneIk {
    /// 构建求解器，校验 root -> mid -> end 为严格父子链
    pub fn new(armature: &Armature, root: &str, mid: &str, end: &str) -> Result<Self> {
        let root_slot = armature.bone_index(root).ok_or_else(|| {
            crate::SkelError::InvalidIkChain(format!("root bone '{}' not found", root))
        })?;
        let mid_slot = armature.bone_index(mid).ok_or_else(|| {
            crate::SkelError::InvalidIkChain(format!("mid bone '{}' not found", mid))
        })?;
        let end_slot = armature.bone_index(end).ok_or_else(|| {
            crate::SkelError::InvalidIkChain(format!("end bone '{}' not found", end))
        })?;
        armature.verify_chain(&[root_slot, mid_slot, end_slot])?;

        Ok(Self {
            root: root_slot,
            mid: mid_slot,
            end: end_slot,
            len_upper: armature.bone(mid_slot).bind_segment_length(),
            len_lower: armature.bone(end_slot).bind_segment_length(),
            pole: None,
        })
    }

    /// 设置极向目标（角色空间）
    pub fn with_pole(mut self, pole: Vec3) -> Self {
        self.pole = Some(pole);
        self
    }

    /// 求解：把 end 驱动到角色空间目标点
    ///
    /// 写入 root / mid 的本地旋转并刷新 root 子树。骨段长退化
    /// 或目标与根重合时告警返回，不修改姿势。
    pub fn solve(&self, armature: &mut Armature, target: Vec3) {
        let (l1, l2) = (self.len_upper, self.len_lower);
        // 短于收缩量两倍的骨段无法构成非空可达区间
        if l1 < 2.0 * REACH_MARGIN || l2 < 2.0 * REACH_MARGIN {
            log::warn!("[IK] 两骨链骨段长退化 (L1={}, L2={})，跳过求解", l1, l2);
            return;
        }

        let root_pos = armature.bone(self.root).position();
        let to_target = target - root_pos;
        let dist_raw = to_target.length();
        if dist_raw < DIR_EPSILON {
            log::warn!("[IK] 目标与链根重合，跳过求解");
            return;
        }

        // 目标距离钳到可达区间（骨段长校验保证区间非空）
        let dist = dist_raw.clamp((l1 - l2).abs() + REACH_MARGIN, l1 + l2 - REACH_MARGIN);
        let dir = to_target / dist_raw;

        // 弯曲平面内、垂直于目标方向、指向弯曲侧的单位向量
        let mid_pos = armature.bone(self.mid).position();
        let bend_hint = match self.pole {
            Some(pole) => pole - root_pos,
            None => mid_pos - root_pos,
        };
        let mut side = bend_hint - dir * bend_hint.dot(dir);
        if side.length_squared() < DIR_EPSILON {
            // 链与目标共线：弯曲方向任选固定正交轴
            side = orthogonal_axis(dir);
        }
        let side = side.normalize();

        // 余弦定理：根部内角
        let cos_root = ((l1 * l1 + dist * dist - l2 * l2) / (2.0 * l1 * dist)).clamp(-1.0, 1.0);
        let root_angle = cos_root.acos();

        // 期望的 mid / end 位置
        let desired_mid = root_pos + (dir * root_angle.cos() + side * root_angle.sin()) * l1;
        let desired_end = root_pos + dir * dist;

        // 根骨：把当前 mid 方向转到期望 mid 方向
        let delta_root = rotation_between(mid_pos - root_pos, desired_mid - root_pos, side);
        apply_world_delta_rotation(armature, self.root, delta_root);
        armature.update_animated_transforms(self.root, true);

        // 中骨：把当前 end 方向转到期望 end 方向
        let mid_pos = armature.bone(self.mid).position();
        let end_pos = armature.bone(self.end).position();
        let delta_mid = rotation_between(end_pos - mid_pos, desired_end - mid_pos, side);
        apply_world_delta_rotation(armature, self.mid, delta_mid);
        armature.update_animated_transforms(self.mid, true);
    }

    /// 绑定段长 (L1, L2)
    #[inline]
    pub fn segment_lengths(&self) -> (f32, f32) {
        (self.len_upper, self.len_lower)
    }
}
