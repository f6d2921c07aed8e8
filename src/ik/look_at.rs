//! 两骨注视 IK
//!
//! 让 proximal -> distal 两骨链的前向轴对准角色空间目标点。
//! 权重决定旋转分配：0 = 全部由 distal 承担，1 = 全部由
//! proximal 承担。先给 proximal 加权重份额的完整旋转，再把
//! distal 精确重解，使链最终严格指向目标。
//!
//! 备选入口：
//! - solve_clamped: 单骨旋转角钳位
//! - solve_smoothed: 与帧率无关的指数平滑逼近

use glam::{Quat, Vec3};

use crate::math::{clamp_rotation_angle, orthogonal_axis, rotation_between, DIR_EPSILON};
use crate::skeleton::Armature;
use crate::Result;

use super::apply_world_delta_rotation;

/// 注视 IK 配置（扁平化）
#[derive(Clone, Copy, Debug)]
pub struct LookAtConfig {
    /// 旋转分配权重 [0, 1]：0 = 全部 distal，1 = 全部 proximal，默认 0.5
    pub weight: f32,
    /// 单骨最大旋转角（度），solve_clamped 使用，默认 180.0
    pub max_angle_deg: f32,
    /// 指数平滑速度（1/秒），solve_smoothed 使用，默认 8.0
    pub smoothing_speed: f32,
}

impl Default for LookAtConfig {
    fn default() -> Self {
        Self {
            weight: 0.5,
            max_angle_deg: 180.0,
            smoothing_speed: 8.0,
        }
    }
}

/// 两骨注视 IK 求解器
#[derive(Clone, Debug)]
pub struct LookAtIk {
    proximal: usize,
    distal: usize,
    /// distal 骨本地系的前向轴（单位向量）
    forward_axis: Vec3,
    config: LookAtConfig,
}

impl LookAtIk {
    /// 构建求解器，校验 distal 的父骨骼是 proximal
    pub fn new(
        armature: &Armature,
        proximal: &str,
        distal: &str,
        forward_axis: Vec3,
        config: LookAtConfig,
    ) -> Result<Self> {
        let proximal_slot = armature.bone_index(proximal).ok_or_else(|| {
            crate::SkelError::InvalidIkChain(format!("proximal bone '{}' not found", proximal))
        })?;
        let distal_slot = armature.bone_index(distal).ok_or_else(|| {
            crate::SkelError::InvalidIkChain(format!("distal bone '{}' not found", distal))
        })?;
        armature.verify_chain(&[proximal_slot, distal_slot])?;

        let forward_axis = forward_axis.normalize_or_zero();
        if forward_axis.length_squared() < DIR_EPSILON {
            return Err(crate::SkelError::InvalidIkChain(
                "look-at forward axis is degenerate".to_string(),
            ));
        }

        Ok(Self {
            proximal: proximal_slot,
            distal: distal_slot,
            forward_axis,
            config: LookAtConfig {
                weight: config.weight.clamp(0.0, 1.0),
                ..config
            },
        })
    }

    #[inline]
    pub fn config(&self) -> &LookAtConfig {
        &self.config
    }

    /// 精确注视：链最终严格指向目标
    pub fn solve(&self, armature: &mut Armature, target: Vec3) {
        self.solve_inner(armature, target, None, 1.0);
    }

    /// 带单骨角度钳位的注视
    ///
    /// 钳位可能使链无法完全对准目标，剩余偏差保留。
    pub fn solve_clamped(&self, armature: &mut Armature, target: Vec3) {
        let max_angle = self.config.max_angle_deg.to_radians();
        self.solve_inner(armature, target, Some(max_angle), 1.0);
    }

    /// 指数平滑注视：每帧向目标旋转收敛 1 - exp(-speed * dt)
    ///
    /// 收敛速率与帧率无关；连续调用趋于精确注视。
    pub fn solve_smoothed(&self, armature: &mut Armature, target: Vec3, dt: f32) {
        let factor = 1.0 - (-self.config.smoothing_speed * dt.max(0.0)).exp();
        self.solve_inner(armature, target, None, factor);
    }

    fn solve_inner(
        &self,
        armature: &mut Armature,
        target: Vec3,
        max_angle: Option<f32>,
        factor: f32,
    ) {
        // distal 当前前向与期望方向
        let Some(full) = self.aim_delta(armature, target) else {
            return;
        };

        // proximal：权重份额
        let mut delta_proximal = Quat::IDENTITY.slerp(full, self.config.weight * factor);
        if let Some(limit) = max_angle {
            delta_proximal = clamp_rotation_angle(delta_proximal, limit);
        }
        apply_world_delta_rotation(armature, self.proximal, delta_proximal);
        armature.update_animated_transforms(self.proximal, true);

        // distal：重解剩余旋转，保证最终精确指向
        let Some(remaining) = self.aim_delta(armature, target) else {
            return;
        };
        let mut delta_distal = Quat::IDENTITY.slerp(remaining, factor);
        if let Some(limit) = max_angle {
            delta_distal = clamp_rotation_angle(delta_distal, limit);
        }
        apply_world_delta_rotation(armature, self.distal, delta_distal);
        armature.update_animated_transforms(self.distal, true);
    }

    /// distal 前向轴到目标方向的增量旋转（角色空间）
    ///
    /// 目标与 distal 原点重合时返回 None。
    fn aim_delta(&self, armature: &Armature, target: Vec3) -> Option<Quat> {
        let distal = armature.bone(self.distal);
        let position = distal.position();
        let desired = target - position;
        if desired.length_squared() < DIR_EPSILON {
            log::warn!("[IK] 注视目标与 distal 骨骼重合，跳过求解");
            return None;
        }
        let forward = distal.rotation() * self.forward_axis;
        Some(rotation_between(
            forward,
            desired,
            orthogonal_axis(forward),
        ))
    }
}
