//! Swing/Twist 球窝约束
//!
//! 从绑定和候选旋转各取一组正交基：
//! 1. swing = 把绑定 twist 轴方向带到候选 twist 轴方向的最小
//!    旋转，钳到锥最大角
//! 2. twist = 绕摆动后轴、对齐剩余基向量的有符号旋转，钳到
//!    [min, max]
//! 3. final = twist ∘ swing ∘ bind
//!
//! 先 swing 后 twist 是球窝关节的规范顺序，不可颠倒。绑定与
//! 候选方向反平行时叉积轴退化，回退到固定副轴。

use glam::{Quat, Vec3};

use crate::math::{clamp_rotation_angle, rotation_between};

use super::LIMIT_EPSILON;

/// 分解候选旋转为（钳位前的）swing 角 / twist 角与钳位后的重组量
struct Decomposed {
    swing: Quat,
    swing_angle: f32,
    twist_angle: f32,
    /// 摆动后的 twist 轴（父空间）
    swung_axis: Vec3,
}

/// 相对绑定分解候选旋转
///
/// `max_swing` 为 None 时不钳 swing（用于限内检查）。
fn decompose(
    bind: Quat,
    candidate: Quat,
    twist_axis: Vec3,
    secondary_axis: Vec3,
    max_swing: Option<f32>,
) -> Decomposed {
    // 绑定 / 候选基向量（父空间）
    let bind_dir = bind * twist_axis;
    let cand_dir = candidate * twist_axis;

    // swing：绑定轴方向 -> 候选轴方向的最小旋转
    // 反平行时以绑定姿势的副轴为回退旋转轴
    let fallback = bind * secondary_axis;
    let swing_full = rotation_between(bind_dir, cand_dir, fallback);
    let swing_angle = bind_dir.dot(cand_dir).clamp(-1.0, 1.0).acos();

    let swing = match max_swing {
        Some(limit) => clamp_rotation_angle(swing_full, limit),
        None => swing_full,
    };
    let swung_axis = (swing * bind_dir).normalize_or_zero();

    // twist：绕摆动后轴，把参考副轴对齐到候选副轴的有符号角
    let reference_secondary = swing * (bind * secondary_axis);
    let candidate_secondary = candidate * secondary_axis;

    let twist_angle = signed_angle_about(reference_secondary, candidate_secondary, swung_axis);

    Decomposed {
        swing,
        swing_angle,
        twist_angle,
        swung_axis,
    }
}

/// 绕 `axis` 从 `from` 转到 `to` 的有符号角（两向量先投影到垂直平面）
fn signed_angle_about(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    let from_p = (from - axis * from.dot(axis)).normalize_or_zero();
    let to_p = (to - axis * to.dot(axis)).normalize_or_zero();
    if from_p.length_squared() < 1.0e-8 || to_p.length_squared() < 1.0e-8 {
        // 副轴与 twist 轴平行：twist 无定义，视为零
        return 0.0;
    }
    let cos = from_p.dot(to_p).clamp(-1.0, 1.0);
    let sin = axis.dot(from_p.cross(to_p));
    sin.atan2(cos)
}

/// 钳位候选本地旋转，返回完整的约束后旋转
pub(crate) fn clamp(
    bind: Quat,
    candidate: Quat,
    twist_axis: Vec3,
    secondary_axis: Vec3,
    max_swing: f32,
    twist_min: f32,
    twist_max: f32,
) -> Quat {
    let d = decompose(bind, candidate, twist_axis, secondary_axis, Some(max_swing));

    let twist_angle = d.twist_angle.clamp(twist_min, twist_max);
    let twist = Quat::from_axis_angle(d.swung_axis, twist_angle);

    // final = twist ∘ swing ∘ bind
    twist * d.swing * bind
}

/// 候选本地旋转是否在限制内
pub(crate) fn within(
    bind: Quat,
    candidate: Quat,
    twist_axis: Vec3,
    secondary_axis: Vec3,
    max_swing: f32,
    twist_min: f32,
    twist_max: f32,
) -> bool {
    let d = decompose(bind, candidate, twist_axis, secondary_axis, None);
    d.swing_angle <= max_swing + LIMIT_EPSILON
        && d.twist_angle >= twist_min - LIMIT_EPSILON
        && d.twist_angle <= twist_max + LIMIT_EPSILON
}
