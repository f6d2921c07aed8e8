//! 铰链约束
//!
//! 单自由度：绑定相对旋转被投影为绕固定本地轴的纯旋转，
//! 角度钳位到 [min, max]。偏离铰链轴的 swing 分量被丢弃。

use glam::{Quat, Vec3};

use crate::math::twist_angle_about;

use super::{is_near_pi, LIMIT_EPSILON};

/// 限制覆盖全范围时铰链退化为无操作
#[inline]
pub(crate) fn is_full_range(min: f32, max: f32) -> bool {
    is_near_pi(min) && is_near_pi(max) && min < 0.0 && max > 0.0
}

/// 把绑定相对旋转投影为限制内的纯铰链旋转
pub(crate) fn clamp_rel(rel: Quat, axis: Vec3, min: f32, max: f32) -> Quat {
    let angle = twist_angle_about(rel, axis);
    Quat::from_axis_angle(axis, angle.clamp(min, max))
}

/// 绑定相对旋转是否已是限制内的纯铰链旋转
pub(crate) fn rel_within(rel: Quat, axis: Vec3, min: f32, max: f32) -> bool {
    let angle = twist_angle_about(rel, axis);
    if angle < min - LIMIT_EPSILON || angle > max + LIMIT_EPSILON {
        return false;
    }
    // swing 残差必须可忽略（纯铰链子空间）
    let hinge_only = Quat::from_axis_angle(axis, angle);
    rel.dot(hinge_only).abs() > 1.0 - LIMIT_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::JointConstraint;
    use crate::skeleton::Armature;
    use glam::Mat4;
    use std::f32::consts::PI;

    fn armature() -> Armature {
        let mut arm = Armature::new();
        arm.add_bone("root", 0, None, Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap();
        arm.add_bone("knee", 1, Some("root"), Mat4::IDENTITY, Mat4::from_translation(Vec3::Y))
            .unwrap();
        arm
    }

    #[test]
    fn test_hinge_clamps_150_to_90() {
        let arm = armature();
        let c = JointConstraint::hinge(&arm, "knee", Vec3::Z, -90.0, 90.0).unwrap();
        let candidate = Mat4::from_rotation_translation(
            Quat::from_axis_angle(Vec3::Z, 150.0_f32.to_radians()),
            Vec3::Y,
        );
        let out = c.apply(candidate);
        let (_, rotation, translation) = out.to_scale_rotation_translation();
        let angle = twist_angle_about(rotation, Vec3::Z);
        // 150° 钳到恰好 90°，平移不变
        assert!((angle - PI / 2.0).abs() < 1.0e-4);
        assert!(translation.abs_diff_eq(Vec3::Y, 1.0e-5));
    }

    #[test]
    fn test_hinge_within_range_unchanged() {
        let arm = armature();
        let c = JointConstraint::hinge(&arm, "knee", Vec3::Z, -90.0, 90.0).unwrap();
        let candidate = Mat4::from_rotation_translation(
            Quat::from_axis_angle(Vec3::Z, 0.5),
            Vec3::Y,
        );
        let out = c.apply(candidate);
        let (_, rotation, _) = out.to_scale_rotation_translation();
        assert!(rotation.dot(Quat::from_axis_angle(Vec3::Z, 0.5)).abs() > 1.0 - 1.0e-5);
    }

    #[test]
    fn test_hinge_discards_swing() {
        let arm = armature();
        let c = JointConstraint::hinge(&arm, "knee", Vec3::Z, -90.0, 90.0).unwrap();
        // 绕 X 的分量不属于铰链子空间，应被丢弃
        let candidate = Mat4::from_quat(
            Quat::from_axis_angle(Vec3::X, 0.8) * Quat::from_axis_angle(Vec3::Z, 0.3),
        );
        let out = c.apply(candidate);
        let (_, rotation, _) = out.to_scale_rotation_translation();
        let hinge_angle = twist_angle_about(rotation, Vec3::Z);
        let rebuilt = Quat::from_axis_angle(Vec3::Z, hinge_angle);
        assert!(rotation.dot(rebuilt).abs() > 1.0 - 1.0e-4);
    }

    #[test]
    fn test_hinge_idempotent_and_sound() {
        let arm = armature();
        let c = JointConstraint::hinge(&arm, "knee", Vec3::Z, -45.0, 60.0).unwrap();
        for angle_deg in [-170.0_f32, -45.0, 0.0, 59.0, 120.0] {
            let candidate = Mat4::from_quat(Quat::from_axis_angle(
                Vec3::Z,
                angle_deg.to_radians(),
            ));
            let once = c.apply(candidate);
            let twice = c.apply(once);
            assert!(once.abs_diff_eq(twice, 1.0e-4), "idempotence at {}", angle_deg);
            assert!(c.is_within_limits(&once), "soundness at {}", angle_deg);
        }
    }

    #[test]
    fn test_full_range_is_noop() {
        let arm = armature();
        let c = JointConstraint::hinge(&arm, "knee", Vec3::Z, -180.0, 180.0).unwrap();
        let candidate = Mat4::from_quat(
            Quat::from_axis_angle(Vec3::X, 1.0) * Quat::from_axis_angle(Vec3::Z, 2.5),
        );
        let out = c.apply(candidate);
        assert!(out.abs_diff_eq(candidate, 1.0e-5));
        assert!(c.is_within_limits(&candidate));
    }

    #[test]
    fn test_hinge_relative_to_bind_rotation() {
        // 绑定姿势本身带旋转：限制应相对绑定而不是相对单位
        let mut arm = Armature::new();
        arm.add_bone("root", 0, None, Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap();
        let bind_rot = Quat::from_axis_angle(Vec3::Z, 0.8);
        arm.add_bone(
            "knee",
            1,
            Some("root"),
            Mat4::IDENTITY,
            Mat4::from_rotation_translation(bind_rot, Vec3::Y),
        )
        .unwrap();

        let c = JointConstraint::hinge(&arm, "knee", Vec3::Z, -10.0, 10.0).unwrap();
        // 候选 == 绑定旋转：相对角为 0，在限制内
        let candidate = Mat4::from_quat(bind_rot);
        assert!(c.is_within_limits(&candidate));
        // 相对 +30°：钳到 +10°
        let over = Mat4::from_quat(bind_rot * Quat::from_axis_angle(Vec3::Z, 30.0_f32.to_radians()));
        let out = c.apply(over);
        let (_, rotation, _) = out.to_scale_rotation_translation();
        let rel = bind_rot.inverse() * rotation;
        assert!((twist_angle_about(rel, Vec3::Z) - 10.0_f32.to_radians()).abs() < 1.0e-4);
    }
}
