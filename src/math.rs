//! 旋转数学工具
//!
//! 约束和 IK 共用的四元数分解 / 构造函数：
//! - 最短弧旋转（含反平行回退）
//! - Swing/Twist 分解
//! - 绕指定轴的有符号扭转角

use glam::{Quat, Vec3};
use std::f32::consts::PI;

/// 方向向量退化判断阈值
pub const DIR_EPSILON: f32 = 1.0e-6;

/// 反平行判断阈值（dot < -1 + ANTIPARALLEL_EPSILON 视为反平行）
pub const ANTIPARALLEL_EPSILON: f32 = 1.0e-5;

/// 计算从 `from` 到 `to` 的最短弧旋转
///
/// 两个方向反平行时，叉积轴退化，使用 `fallback_axis`（正交化后）
/// 作为 180° 旋转轴。任一输入接近零向量时返回单位旋转。
pub fn rotation_between(from: Vec3, to: Vec3, fallback_axis: Vec3) -> Quat {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    if from.length_squared() < DIR_EPSILON || to.length_squared() < DIR_EPSILON {
        return Quat::IDENTITY;
    }

    let dot = from.dot(to).clamp(-1.0, 1.0);

    // 反平行：轴不确定，回退到固定副轴
    if dot < -1.0 + ANTIPARALLEL_EPSILON {
        let mut axis = fallback_axis - from * fallback_axis.dot(from);
        if axis.length_squared() < DIR_EPSILON {
            axis = orthogonal_axis(from);
        }
        return Quat::from_axis_angle(axis.normalize(), PI);
    }

    // 近似平行：无需旋转
    if dot > 1.0 - DIR_EPSILON {
        return Quat::IDENTITY;
    }

    let axis = from.cross(to).normalize_or_zero();
    if axis.length_squared() < DIR_EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis, dot.acos())
}

/// 选择与 `v` 正交的固定轴
///
/// 取与 `v` 对齐程度最低的坐标轴做叉积，保证结果非退化。
pub fn orthogonal_axis(v: Vec3) -> Vec3 {
    let abs = v.abs();
    let pick = if abs.x <= abs.y && abs.x <= abs.z {
        Vec3::X
    } else if abs.y <= abs.z {
        Vec3::Y
    } else {
        Vec3::Z
    };
    v.cross(pick).normalize()
}

/// Swing/Twist 分解
///
/// 将旋转 `q` 分解为 `q = swing * twist`：
/// - `twist`: 绕 `twist_axis` 的自旋分量
/// - `swing`: 把轴本身转到新方向的分量
///
/// `twist_axis` 必须是单位向量。旋转与轴垂直（twist 分量为零）时
/// twist 返回单位旋转。
pub fn swing_twist_decompose(q: Quat, twist_axis: Vec3) -> (Quat, Quat) {
    let rot_axis = Vec3::new(q.x, q.y, q.z);
    let proj = rot_axis.dot(twist_axis);
    let twist = Quat::from_xyzw(
        twist_axis.x * proj,
        twist_axis.y * proj,
        twist_axis.z * proj,
        q.w,
    );

    // 旋转恰好垂直于轴时投影为零，twist 退化为零四元数
    if twist.length_squared() < DIR_EPSILON {
        return (q, Quat::IDENTITY);
    }

    let twist = twist.normalize();
    let swing = q * twist.inverse();
    (swing, twist)
}

/// 绕 `axis` 的有符号扭转角，结果在 [-π, π]
///
/// `axis` 必须是单位向量。
pub fn twist_angle_about(q: Quat, axis: Vec3) -> f32 {
    let proj = Vec3::new(q.x, q.y, q.z).dot(axis);
    let mut angle = 2.0 * proj.atan2(q.w);
    if angle > PI {
        angle -= 2.0 * PI;
    } else if angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// 取旋转的最短表示 (轴, 角)，角度在 [0, π]
pub fn axis_angle_shortest(q: Quat) -> (Vec3, f32) {
    let q = if q.w < 0.0 { -q } else { q };
    let (axis, angle) = q.to_axis_angle();
    (axis, angle)
}

/// 将旋转角度限制到 `max_angle`（弧度，≥ 0）
///
/// 超过上限时保持旋转轴不变、缩减角度。
pub fn clamp_rotation_angle(q: Quat, max_angle: f32) -> Quat {
    let (axis, angle) = axis_angle_shortest(q);
    if angle <= max_angle || axis.length_squared() < DIR_EPSILON {
        q
    } else {
        Quat::from_axis_angle(axis, max_angle)
    }
}
