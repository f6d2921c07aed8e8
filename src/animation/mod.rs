//! 动画系统
//!
//! - BoneKeyframe / BoneTrack: 单骨骼关键帧轨道
//! - ClipMotion: 命名动画片段，按时间查询骨骼姿势
//! - BlendMotion: 两个动画源的交叉淡化合成，本身也是动画源
//! - Animator: 每角色播放状态机 + 层级变换传播

mod animator;
mod blend;
mod keyframe;
mod motion;

pub use animator::{Animator, AnimatorState};
pub use blend::BlendMotion;
pub use keyframe::{BoneKeyframe, BoneTrack};
pub use motion::{ClipMotion, MotionSource, Pose};
