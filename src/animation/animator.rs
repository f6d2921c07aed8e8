//! 动画播放状态机
//!
//! 每个角色持有一个 Animator：推进动画时间、处理过渡和回绕、
//! 然后做一次根到叶的层级遍历，产出角色空间变换和蒙皮矩阵。
//!
//! 状态：Idle -> Playing -> Transitioning（current 为合成混合、
//! next 排队）-> Playing(next)。
//!
//! 层级遍历使用显式栈而非递归：深度有界，也避免重入问题。

use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;

use crate::skeleton::Armature;
use crate::{Result, SkelError};

use super::blend::BlendMotion;
use super::motion::{MotionSource, Pose};

/// 播放完成一次性回调
pub type CompletionCallback = Box<dyn FnOnce() + Send>;

/// Animator 状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimatorState {
    /// 无动画
    Idle,
    /// 正常播放
    Playing,
    /// 过渡中（current 是合成混合，next 已排队）
    Transitioning,
}

/// 每角色动画播放状态机
pub struct Animator {
    /// 骨架（独占）
    armature: Armature,
    /// 已注册动画：名称 -> 动画源
    motions: HashMap<String, Arc<dyn MotionSource>>,
    /// 未知名称回退的默认动画
    default_motion: Option<String>,
    /// 当前动画（过渡中为合成混合）
    current: Option<Arc<dyn MotionSource>>,
    /// 过渡完成后接管的动画（仅过渡中有效）
    next: Option<Arc<dyn MotionSource>>,
    /// 当前动画时间，范围 [0, current.duration())
    motion_time: f32,
    /// 是否推进时间（暂停时仍然做层级求值，支持冻结重绘）
    playing: bool,
    /// 一次性完成回调，触发后清除
    on_complete: Option<CompletionCallback>,
    /// 蒙皮矩阵数组，按蒙皮索引寻址
    skinning: Vec<Mat4>,
    /// 姿势采样暂存
    pose_scratch: Pose,
}

impl Animator {
    /// 以加载好的骨架构建 Animator
    pub fn new(armature: Armature) -> Self {
        let palette_len = (armature.max_skin_index() + 1) as usize;
        let mut animator = Self {
            armature,
            motions: HashMap::new(),
            default_motion: None,
            current: None,
            next: None,
            motion_time: 0.0,
            playing: false,
            on_complete: None,
            skinning: vec![Mat4::IDENTITY; palette_len],
            pose_scratch: Pose::new(),
        };
        // 初始输出绑定姿势
        animator.armature.reset_to_bind_pose();
        animator.evaluate_hierarchy();
        animator
    }

    // ========================================
    // 动画注册
    // ========================================

    /// 注册命名动画
    pub fn register_motion(&mut self, motion: Arc<dyn MotionSource>) {
        self.motions.insert(motion.name().to_string(), motion);
    }

    /// 设置未知名称回退的默认动画（必须已注册）
    pub fn set_default_motion(&mut self, name: &str) -> Result<()> {
        if !self.motions.contains_key(name) {
            return Err(SkelError::MotionNotFound(name.to_string()));
        }
        self.default_motion = Some(name.to_string());
        Ok(())
    }

    /// 按名称查找已注册动画
    pub fn motion(&self, name: &str) -> Option<Arc<dyn MotionSource>> {
        self.motions.get(name).cloned()
    }

    // ========================================
    // 播放控制
    // ========================================

    /// 切换动画
    ///
    /// 空闲或 `blend_interval <= 0` 时直接采用；否则合成
    /// 「当前姿势 -> 新动画 0 时刻」的混合动画进入过渡状态。
    /// 过渡中再次切换同样成立：当前混合本身就是动画源。
    pub fn set_motion(&mut self, motion: Arc<dyn MotionSource>, blend_interval: f32) {
        let current = match self.current.clone() {
            Some(current) if blend_interval > 0.0 => current,
            _ => {
                log::debug!("[Animator] 直接切换到 '{}'", motion.name());
                self.current = Some(motion);
                self.next = None;
                self.motion_time = 0.0;
                self.playing = true;
                return;
            }
        };

        log::debug!(
            "[Animator] 过渡 '{}' -> '{}' ({}s)",
            current.name(),
            motion.name(),
            blend_interval
        );
        let blend = BlendMotion::new(
            format!("{} -> {}", current.name(), motion.name()),
            current,
            self.motion_time,
            motion.clone(),
            0.0,
            blend_interval,
        );
        self.current = Some(Arc::new(blend));
        self.next = Some(motion);
        self.motion_time = 0.0;
        self.playing = true;
    }

    /// 按名称切换动画
    ///
    /// 未知名称回退到默认动画并告警；没有默认动画时报错。
    pub fn set_motion_by_name(&mut self, name: &str, blend_interval: f32) -> Result<()> {
        let motion = match self.motions.get(name) {
            Some(motion) => motion.clone(),
            None => {
                let fallback = self
                    .default_motion
                    .as_deref()
                    .and_then(|default| self.motions.get(default))
                    .cloned()
                    .ok_or_else(|| SkelError::MotionNotFound(name.to_string()))?;
                log::warn!(
                    "[Animator] 未知动画 '{}'，回退到默认动画 '{}'",
                    name,
                    fallback.name()
                );
                fallback
            }
        };
        self.set_motion(motion, blend_interval);
        Ok(())
    }

    /// 设置一次性完成回调（非过渡动画回绕时触发一次并清除）
    pub fn set_on_complete<F>(&mut self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    #[inline]
    pub fn play(&mut self) {
        self.playing = true;
    }

    #[inline]
    pub fn pause(&mut self) {
        self.playing = false;
    }

    #[inline]
    pub fn toggle(&mut self) {
        self.playing = !self.playing;
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// 当前状态机状态
    pub fn state(&self) -> AnimatorState {
        match (&self.current, &self.next) {
            (None, _) => AnimatorState::Idle,
            (Some(_), Some(_)) => AnimatorState::Transitioning,
            (Some(_), None) => AnimatorState::Playing,
        }
    }

    /// 当前动画时间（秒）
    #[inline]
    pub fn motion_time(&self) -> f32 {
        self.motion_time
    }

    /// 当前动画名称
    pub fn current_motion_name(&self) -> Option<&str> {
        self.current.as_deref().map(|m| m.name())
    }

    // ========================================
    // 每帧更新
    // ========================================

    /// 推进动画并重算层级变换
    ///
    /// 时间推进只在播放中进行；层级求值总是执行（暂停时输出
    /// 冻结时刻的姿势）。每次调用最多回绕一次，时长趋近零的
    /// 动画直接钳位到 0，不会陷入回绕循环。
    pub fn update(&mut self, dt: f32) {
        if self.playing {
            if let Some(current) = self.current.clone() {
                self.motion_time += dt;
                let duration = current.duration();
                if self.motion_time >= duration {
                    self.handle_wrap(duration);
                }
            }
        }
        self.evaluate_hierarchy();
    }

    /// 处理动画回绕 / 过渡完成
    fn handle_wrap(&mut self, duration: f32) {
        if let Some(next) = self.next.take() {
            // 过渡完成：next 原子接管，时间归零，在下一次姿势求值前生效
            log::debug!("[Animator] 过渡完成，进入 '{}'", next.name());
            self.current = Some(next);
            self.motion_time = 0.0;
            return;
        }

        // 普通回绕：只减一次时长；剩余仍超界（dt 远大于时长或
        // 时长退化）时钳位到 0
        if duration <= f32::EPSILON {
            self.motion_time = 0.0;
        } else {
            self.motion_time -= duration;
            if self.motion_time >= duration {
                self.motion_time = 0.0;
            }
        }

        if let Some(callback) = self.on_complete.take() {
            callback();
        }
    }

    /// 层级求值：一次根到叶遍历
    ///
    /// 显式栈存 (骨骼槽位, 父角色空间变换)。每个骨骼：
    /// 1. 从当前姿势解析 local（未覆盖回退绑定姿势）
    /// 2. animated = parent_animated * local
    /// 3. skin_index >= 0 时写蒙皮矩阵 animated * inverse_bind
    fn evaluate_hierarchy(&mut self) {
        let root = match self.armature.root() {
            Some(root) => root,
            None => return,
        };

        self.pose_scratch.clear();
        if let Some(current) = &self.current {
            current.sample_pose(self.motion_time, &mut self.pose_scratch);
        }

        let mut stack: Vec<(usize, Mat4)> = Vec::with_capacity(self.armature.len());
        stack.push((root, Mat4::IDENTITY));

        while let Some((slot, parent_animated)) = stack.pop() {
            let bone = self.armature.bone_mut(slot);
            if let Some(transform) = self.pose_scratch.get(&bone.name) {
                bone.local = transform.to_matrix();
            } else {
                bone.local = bone.bind_local;
            }
            bone.animated = parent_animated * bone.local;

            let animated = bone.animated;
            if bone.skin_index >= 0 {
                self.skinning[bone.skin_index as usize] = animated * bone.inverse_bind;
            }

            for child in self.armature.bone(slot).children.iter() {
                stack.push((*child, animated));
            }
        }
    }

    // ========================================
    // 输出
    // ========================================

    /// 蒙皮矩阵数组（按蒙皮索引寻址，渲染端每帧消费一次）
    #[inline]
    pub fn skinning_matrices(&self) -> &[Mat4] {
        &self.skinning
    }

    /// 骨架只读访问（挂载系统按名称查活动变换）
    #[inline]
    pub fn armature(&self) -> &Armature {
        &self.armature
    }

    /// 骨架可变访问（IK / 约束后处理使用，须与 update 串行）
    #[inline]
    pub fn armature_mut(&mut self) -> &mut Armature {
        &mut self.armature
    }
}
