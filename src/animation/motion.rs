//! 动画源与动画片段
//!
//! `MotionSource` 是 Animator 消费的统一接口：按时间产出
//! 骨骼名 -> 本地变换 的姿势映射。片段（ClipMotion）和混合
//! （BlendMotion）都实现它，过渡因此可以自由组合。

use std::collections::HashMap;

use crate::skeleton::BoneTransform;

use super::keyframe::{BoneKeyframe, BoneTrack};

/// 姿势：骨骼名 -> 本地变换
///
/// 未被轨道覆盖的骨骼不出现在映射中，由 Animator 回退到绑定姿势。
pub type Pose = HashMap<String, BoneTransform>;

/// 动画源
///
/// `time` 超出 [0, duration) 的行为由调用方负责（Animator 维护
/// 自己的时间不变量，不在这里重复钳位）。
pub trait MotionSource: Send + Sync {
    /// 动画名称
    fn name(&self) -> &str;

    /// 动画时长（秒）
    fn duration(&self) -> f32;

    /// 采样指定时间的姿势，结果写入 `out`（调用前应已清空）
    fn sample_pose(&self, time: f32, out: &mut Pose);
}

/// 关键帧动画片段
#[derive(Clone, Debug)]
pub struct ClipMotion {
    name: String,
    duration: f32,
    /// 骨骼名 -> 轨道
    tracks: HashMap<String, BoneTrack>,
}

impl ClipMotion {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
            tracks: HashMap::new(),
        }
    }

    /// 插入骨骼关键帧，轨道不存在时自动创建
    pub fn insert_keyframe(&mut self, bone_name: &str, keyframe: BoneKeyframe) {
        self.tracks
            .entry(bone_name.to_string())
            .or_default()
            .insert_keyframe(keyframe);
        // 时长随关键帧增长
        if keyframe.time > self.duration {
            self.duration = keyframe.time;
        }
    }

    /// 轨道数量
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// 是否包含指定骨骼的轨道
    pub fn has_track(&self, bone_name: &str) -> bool {
        self.tracks.contains_key(bone_name)
    }
}

impl MotionSource for ClipMotion {
    fn name(&self) -> &str {
        &self.name
    }

    fn duration(&self) -> f32 {
        self.duration
    }

    fn sample_pose(&self, time: f32, out: &mut Pose) {
        for (bone_name, track) in &self.tracks {
            if let Some(transform) = track.sample(time) {
                out.insert(bone_name.clone(), transform);
            }
        }
    }
}
