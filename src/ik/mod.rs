//! IK 求解器
//!
//! 面向 2–4 骨短链的解析求解：
//! - TwoBoneIk: 余弦定理两骨解析解
//! - ThreeBoneIk: 两次重叠 TwoBone 求解的组合
//! - LookAtIk: 两骨注视，按权重分配旋转
//!
//! 所有求解器在构建时校验严格父子链（结构错误快速失败），
//! 运行期不持有骨架状态；求解结束用
//! `Armature::update_animated_transforms` 刷新被编辑的子树。
//! 目标坐标一律为角色空间。

mod look_at;
mod three_bone;
mod two_bone;

pub use look_at::{LookAtConfig, LookAtIk};
pub use three_bone::ThreeBoneIk;
pub use two_bone::TwoBoneIk;

use glam::{Mat4, Quat};

use crate::skeleton::Armature;

/// 把角色空间的增量旋转换算为本地旋转并写入骨骼
///
/// new_world = delta * old_world，因此
/// new_local = parent_world⁻¹ * delta * parent_world * old_local。
/// 父链不含非均匀缩放（骨骼动画的常规假设）。
pub(crate) fn apply_world_delta_rotation(armature: &mut Armature, slot: usize, delta: Quat) {
    let parent_rot = match armature.bone(slot).parent {
        Some(p) => Quat::from_mat4(&armature.bone(p).animated),
        None => Quat::IDENTITY,
    };
    let bone = armature.bone_mut(slot);
    let (scale, rotation, translation) = bone.local.to_scale_rotation_translation();
    let new_rotation = (parent_rot.inverse() * delta * parent_rot * rotation).normalize();
    bone.local = Mat4::from_scale_rotation_translation(scale, new_rotation, translation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_apply_world_delta_rotation() {
        let mut arm = Armature::new();
        arm.add_bone("root", 0, None, Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap();
        arm.add_bone("arm", 1, Some("root"), Mat4::IDENTITY, Mat4::from_translation(Vec3::Y))
            .unwrap();
        arm.add_bone("hand", 2, Some("arm"), Mat4::IDENTITY, Mat4::from_translation(Vec3::Y))
            .unwrap();
        arm.update_animated_transforms(arm.root().unwrap(), true);

        // 角色空间绕 Z 转 90°，hand 应从 (0,2,0) 移到 (-1,1,0)
        let slot = arm.bone_index("arm").unwrap();
        apply_world_delta_rotation(&mut arm, slot, Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_2));
        arm.update_animated_transforms(slot, true);
        let hand = arm.bone_by_name("hand").unwrap();
        assert!(hand.position().abs_diff_eq(Vec3::new(-1.0, 1.0, 0.0), 1.0e-4));
    }
}
