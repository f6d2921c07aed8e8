//! 关节约束
//!
//! 把候选本地变换投影回允许的旋转子空间。约束在构建时绑定到
//! 唯一骨骼，并缓存该骨骼的绑定本地旋转作为参考系；平移和缩放
//! 原样通过。
//!
//! 类型封闭：Hinge / Spherical（遗留）/ SwingTwist，不做开放
//! 式的名称分发。角度参数以度为单位接收（外部配置单位），内部
//! 存弧度；min > max 交换归一，不报错。

mod hinge;
mod spherical;
mod swing_twist;

use glam::{Mat4, Quat, Vec3};
use std::f32::consts::PI;

use crate::math::orthogonal_axis;
use crate::skeleton::Armature;
use crate::{Result, SkelError};

/// 角度限制判定容差（弧度）
pub(crate) const LIMIT_EPSILON: f32 = 1.0e-4;

/// 约束种类与限制参数（无状态）
#[derive(Clone, Copy, Debug)]
pub enum ConstraintKind {
    /// 铰链：绕固定本地轴的单自由度旋转
    Hinge {
        /// 铰链轴（骨骼本地系，单位向量）
        axis: Vec3,
        /// 角度下限（弧度，>= -π）
        min: f32,
        /// 角度上限（弧度，<= π）
        max: f32,
    },
    /// 球面（遗留）：绕固定前向轴分解 twist，其余为 swing
    ///
    /// 旧内容兼容保留，新内容请使用 SwingTwist。
    Spherical {
        /// 参考前向轴（骨骼本地系，单位向量）
        twist_axis: Vec3,
        /// swing 锥半角（弧度）
        cone_angle: f32,
        /// twist 下限（弧度）
        twist_min: f32,
        /// twist 上限（弧度）
        twist_max: f32,
    },
    /// Swing/Twist 球窝：先 swing 后 twist（规范顺序，不可颠倒）
    SwingTwist {
        /// twist 轴（骨骼本地系，单位向量）
        twist_axis: Vec3,
        /// 副轴（骨骼本地系，与 twist 轴正交，twist 对齐参考）
        secondary_axis: Vec3,
        /// swing 锥最大角（弧度）
        max_swing: f32,
        /// twist 下限（弧度）
        twist_min: f32,
        /// twist 上限（弧度）
        twist_max: f32,
    },
}

/// 关节约束：绑定到唯一骨骼
#[derive(Clone, Debug)]
pub struct JointConstraint {
    /// 约束骨骼的 arena 槽位
    bone: usize,
    /// 绑定姿势本地旋转（参考系，构建时捕获）
    bind_rotation: Quat,
    /// 限制参数
    kind: ConstraintKind,
}

/// 归一化轴：退化输入回退到 X 轴并告警
fn normalize_axis(axis: Vec3, what: &str) -> Vec3 {
    let n = axis.normalize_or_zero();
    if n.length_squared() < 1.0e-8 {
        log::warn!("[Constraint] {} 轴退化，回退到 X 轴", what);
        Vec3::X
    } else {
        n
    }
}

/// min > max 时交换归一
fn ordered(min_deg: f32, max_deg: f32) -> (f32, f32) {
    let (min, max) = if min_deg > max_deg {
        (max_deg, min_deg)
    } else {
        (min_deg, max_deg)
    };
    (min.to_radians(), max.to_radians())
}

impl JointConstraint {
    /// 铰链约束，角度限制以度为单位，各自限制在 [-180°, 180°]
    pub fn hinge(
        armature: &Armature,
        bone_name: &str,
        axis: Vec3,
        min_deg: f32,
        max_deg: f32,
    ) -> Result<Self> {
        let slot = armature
            .bone_index(bone_name)
            .ok_or_else(|| SkelError::BoneNotFound(bone_name.to_string()))?;
        let (min, max) = ordered(min_deg.clamp(-180.0, 180.0), max_deg.clamp(-180.0, 180.0));
        Ok(Self {
            bone: slot,
            bind_rotation: armature.bone(slot).bind_local_rotation,
            kind: ConstraintKind::Hinge {
                axis: normalize_axis(axis, "hinge"),
                min,
                max,
            },
        })
    }

    /// 球面约束（遗留）
    pub fn spherical(
        armature: &Armature,
        bone_name: &str,
        twist_axis: Vec3,
        cone_angle_deg: f32,
        twist_min_deg: f32,
        twist_max_deg: f32,
    ) -> Result<Self> {
        let slot = armature
            .bone_index(bone_name)
            .ok_or_else(|| SkelError::BoneNotFound(bone_name.to_string()))?;
        let (twist_min, twist_max) = ordered(twist_min_deg, twist_max_deg);
        Ok(Self {
            bone: slot,
            bind_rotation: armature.bone(slot).bind_local_rotation,
            kind: ConstraintKind::Spherical {
                twist_axis: normalize_axis(twist_axis, "spherical twist"),
                cone_angle: cone_angle_deg.abs().to_radians(),
                twist_min,
                twist_max,
            },
        })
    }

    /// Swing/Twist 约束
    pub fn swing_twist(
        armature: &Armature,
        bone_name: &str,
        twist_axis: Vec3,
        max_swing_deg: f32,
        twist_min_deg: f32,
        twist_max_deg: f32,
    ) -> Result<Self> {
        let slot = armature
            .bone_index(bone_name)
            .ok_or_else(|| SkelError::BoneNotFound(bone_name.to_string()))?;
        let twist_axis = normalize_axis(twist_axis, "swing/twist");
        let (twist_min, twist_max) = ordered(twist_min_deg, twist_max_deg);
        Ok(Self {
            bone: slot,
            bind_rotation: armature.bone(slot).bind_local_rotation,
            kind: ConstraintKind::SwingTwist {
                twist_axis,
                secondary_axis: orthogonal_axis(twist_axis),
                max_swing: max_swing_deg.abs().to_radians(),
                twist_min,
                twist_max,
            },
        })
    }

    /// 约束骨骼的 arena 槽位
    #[inline]
    pub fn bone(&self) -> usize {
        self.bone
    }

    #[inline]
    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    /// 把候选本地变换投影到允许的旋转子空间
    ///
    /// 平移和缩放原样通过；旋转相对于缓存的绑定旋转做限制。
    pub fn apply(&self, candidate: Mat4) -> Mat4 {
        let (scale, rotation, translation) = candidate.to_scale_rotation_translation();
        let constrained = self.constrain_rotation(rotation);
        Mat4::from_scale_rotation_translation(scale, constrained, translation)
    }

    /// 变换是否已在限制内
    pub fn is_within_limits(&self, transform: &Mat4) -> bool {
        let (_, rotation, _) = transform.to_scale_rotation_translation();
        self.rotation_within_limits(rotation)
    }

    /// 应用约束到骨骼的当前 local，并刷新其子树
    ///
    /// IK / 主姿势求值之后调用（帧内后处理）。
    pub fn apply_to_armature(&self, armature: &mut Armature) {
        let constrained = self.apply(armature.bone(self.bone).local);
        armature.bone_mut(self.bone).local = constrained;
        armature.update_animated_transforms(self.bone, true);
    }

    fn constrain_rotation(&self, rotation: Quat) -> Quat {
        // 绑定相对旋转（绑定本地参考系）
        let rel = self.bind_rotation.inverse() * rotation;
        match self.kind {
            ConstraintKind::Hinge { axis, min, max } => {
                if hinge::is_full_range(min, max) {
                    // 全范围限制：直通
                    return rotation;
                }
                self.bind_rotation * hinge::clamp_rel(rel, axis, min, max)
            }
            ConstraintKind::Spherical {
                twist_axis,
                cone_angle,
                twist_min,
                twist_max,
            } => {
                self.bind_rotation
                    * spherical::clamp_rel(rel, twist_axis, cone_angle, twist_min, twist_max)
            }
            ConstraintKind::SwingTwist {
                twist_axis,
                secondary_axis,
                max_swing,
                twist_min,
                twist_max,
            } => swing_twist::clamp(
                self.bind_rotation,
                rotation,
                twist_axis,
                secondary_axis,
                max_swing,
                twist_min,
                twist_max,
            ),
        }
    }

    fn rotation_within_limits(&self, rotation: Quat) -> bool {
        let rel = self.bind_rotation.inverse() * rotation;
        match self.kind {
            ConstraintKind::Hinge { axis, min, max } => {
                hinge::is_full_range(min, max) || hinge::rel_within(rel, axis, min, max)
            }
            ConstraintKind::Spherical {
                twist_axis,
                cone_angle,
                twist_min,
                twist_max,
            } => spherical::rel_within(rel, twist_axis, cone_angle, twist_min, twist_max),
            ConstraintKind::SwingTwist {
                twist_axis,
                secondary_axis,
                max_swing,
                twist_min,
                twist_max,
            } => swing_twist::within(
                self.bind_rotation,
                rotation,
                twist_axis,
                secondary_axis,
                max_swing,
                twist_min,
                twist_max,
            ),
        }
    }
}

/// 角度接近 ±180° 视为无限制
pub(crate) fn is_near_pi(angle: f32) -> bool {
    angle.abs() >= PI - LIMIT_EPSILON
}
