//! 关键帧与单骨骼轨道
//!
//! 轨道按时间升序存放关键帧，采样时二分查找前后帧：
//! 平移 / 缩放线性插值，旋转最短弧球面插值。

use glam::{Quat, Vec3};

use crate::skeleton::BoneTransform;

/// 骨骼关键帧
#[derive(Clone, Copy, Debug)]
pub struct BoneKeyframe {
    /// 时间（秒）
    pub time: f32,
    /// 平移
    pub translation: Vec3,
    /// 旋转
    pub rotation: Quat,
    /// 缩放
    pub scale: Vec3,
}

impl BoneKeyframe {
    pub fn new(time: f32, translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            time,
            translation,
            rotation,
            scale,
        }
    }

    #[inline]
    pub fn transform(&self) -> BoneTransform {
        BoneTransform {
            translation: self.translation,
            rotation: self.rotation,
            scale: self.scale,
        }
    }
}

/// 单骨骼动画轨道
#[derive(Clone, Debug, Default)]
pub struct BoneTrack {
    /// 关键帧，按 time 升序
    keyframes: Vec<BoneKeyframe>,
}

impl BoneTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入关键帧，保持时间升序；时间相同则替换
    pub fn insert_keyframe(&mut self, keyframe: BoneKeyframe) {
        let pos = self
            .keyframes
            .partition_point(|kf| kf.time < keyframe.time);
        if pos < self.keyframes.len() && self.keyframes[pos].time == keyframe.time {
            self.keyframes[pos] = keyframe;
        } else {
            self.keyframes.insert(pos, keyframe);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// 最后一个关键帧的时间
    pub fn end_time(&self) -> f32 {
        self.keyframes.last().map(|kf| kf.time).unwrap_or(0.0)
    }

    /// 按时间采样
    ///
    /// 时间早于首帧 / 晚于末帧时钳位到端点帧。空轨道返回 None。
    pub fn sample(&self, time: f32) -> Option<BoneTransform> {
        if self.keyframes.is_empty() {
            return None;
        }

        // 第一个 time > t 的关键帧
        let next = self.keyframes.partition_point(|kf| kf.time <= time);

        if next == 0 {
            return Some(self.keyframes[0].transform());
        }
        if next == self.keyframes.len() {
            return Some(self.keyframes[next - 1].transform());
        }

        let prev_kf = &self.keyframes[next - 1];
        let next_kf = &self.keyframes[next];
        let interval = next_kf.time - prev_kf.time;
        if interval <= f32::EPSILON {
            return Some(prev_kf.transform());
        }

        let t = (time - prev_kf.time) / interval;
        Some(prev_kf.transform().interpolate(&next_kf.transform(), t))
    }
}
