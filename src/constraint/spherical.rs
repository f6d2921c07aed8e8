//! 球面约束（遗留）
//!
//! 绑定相对旋转分解为绕参考前向轴的 twist 与其余的 swing：
//! rel = swing * twist（twist 先作用于本地前向轴，等价于绕
//! 摆动后轴的 twist 后作用）。swing 钳到锥半角，twist 钳到
//! 有符号范围后原序重组。
//!
//! 新内容请使用 SwingTwist 变体；本实现为旧资产保留。

use glam::{Quat, Vec3};

use crate::math::{axis_angle_shortest, clamp_rotation_angle, swing_twist_decompose, twist_angle_about};

use super::LIMIT_EPSILON;

/// 钳位绑定相对旋转
pub(crate) fn clamp_rel(
    rel: Quat,
    twist_axis: Vec3,
    cone_angle: f32,
    twist_min: f32,
    twist_max: f32,
) -> Quat {
    let (swing, twist) = swing_twist_decompose(rel, twist_axis);

    let swing = clamp_rotation_angle(swing, cone_angle);

    let twist_angle = twist_angle_about(twist, twist_axis).clamp(twist_min, twist_max);
    let twist = Quat::from_axis_angle(twist_axis, twist_angle);

    swing * twist
}

/// 绑定相对旋转是否在限制内
pub(crate) fn rel_within(
    rel: Quat,
    twist_axis: Vec3,
    cone_angle: f32,
    twist_min: f32,
    twist_max: f32,
) -> bool {
    let (swing, twist) = swing_twist_decompose(rel, twist_axis);

    let (_, swing_angle) = axis_angle_shortest(swing);
    if swing_angle > cone_angle + LIMIT_EPSILON {
        return false;
    }

    let twist_angle = twist_angle_about(twist, twist_axis);
    twist_angle >= twist_min - LIMIT_EPSILON && twist_angle <= twist_max + LIMIT_EPSILON
}
