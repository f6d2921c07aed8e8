//! Skel Engine - Rust 实现的骨骼动画运行时
//!
//! 提供角色动画所需的核心功能：
//! - 骨骼层级系统（绑定姿势 / 本地变换 / 角色空间变换传播）
//! - 关键帧动画播放与混合（Motion / BlendMotion）
//! - 动画状态机（Animator，支持过渡混合和一次性回调）
//! - 关节约束（Hinge / Spherical / SwingTwist）
//! - 解析 IK 求解（两骨 / 三骨 / 注视）
//!
//! 模型加载、渲染、物理由外部协作者负责，本 crate 只消费已加载的
//! 骨架与动画数据，并输出蒙皮矩阵。

pub mod animation;
pub mod constraint;
pub mod ik;
pub mod math;
pub mod skeleton;

pub use animation::{Animator, BlendMotion, BoneKeyframe, ClipMotion, MotionSource, Pose};
pub use constraint::{ConstraintKind, JointConstraint};
pub use ik::{LookAtConfig, LookAtIk, ThreeBoneIk, TwoBoneIk};
pub use skeleton::{Armature, Bone, BoneTransform};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkelError {
    #[error("duplicate bone name: {0}")]
    DuplicateBoneName(String),

    #[error("duplicate skin index: {0}")]
    DuplicateSkinIndex(i32),

    #[error("missing parent bone: {0}")]
    MissingParent(String),

    #[error("armature already has a root bone: {0}")]
    DuplicateRoot(String),

    #[error("bone not found: {0}")]
    BoneNotFound(String),

    #[error("motion not found: {0}")]
    MotionNotFound(String),

    #[error("invalid IK chain: {0}")]
    InvalidIkChain(String),
}

pub type Result<T> = std::result::Result<T, SkelError>;
