//! 动画混合
//!
//! BlendMotion 把两个动画源在固定时间点的姿势按 τ/interval
//! 交叉淡化，合成一个时长为 interval 的新动画源。Animator 的
//! 过渡就是「把当前姿势淡化到下一个动画的 0 时刻姿势」，混合
//! 本身也是 MotionSource，过渡中途再切换会自然地继续组合。

use std::sync::Arc;

use super::motion::{MotionSource, Pose};

/// 混合动画：A 在 time_a 的姿势 -> B 在 time_b 的姿势
pub struct BlendMotion {
    name: String,
    /// 混合时长（秒）
    interval: f32,
    source_a: Arc<dyn MotionSource>,
    time_a: f32,
    source_b: Arc<dyn MotionSource>,
    time_b: f32,
}

impl BlendMotion {
    /// 最小混合时长，防止时长为零的动画进入 Animator 的回绕逻辑
    const MIN_INTERVAL: f32 = 1.0e-4;

    pub fn new(
        name: impl Into<String>,
        source_a: Arc<dyn MotionSource>,
        time_a: f32,
        source_b: Arc<dyn MotionSource>,
        time_b: f32,
        interval: f32,
    ) -> Self {
        Self {
            name: name.into(),
            interval: interval.max(Self::MIN_INTERVAL),
            source_a,
            time_a,
            source_b,
            time_b,
        }
    }
}

impl MotionSource for BlendMotion {
    fn name(&self) -> &str {
        &self.name
    }

    fn duration(&self) -> f32 {
        self.interval
    }

    fn sample_pose(&self, time: f32, out: &mut Pose) {
        let factor = (time / self.interval).clamp(0.0, 1.0);

        let mut pose_a = Pose::new();
        let mut pose_b = Pose::new();
        self.source_a.sample_pose(self.time_a, &mut pose_a);
        self.source_b.sample_pose(self.time_b, &mut pose_b);

        // 两侧都覆盖的骨骼做插值；只有一侧覆盖的骨骼原样通过
        // （绑定姿势回退在 Animator 中，这里不知道骨架）
        for (bone_name, a) in &pose_a {
            let blended = match pose_b.get(bone_name) {
                Some(b) => a.interpolate(b, factor),
                None => *a,
            };
            out.insert(bone_name.clone(), blended);
        }
        for (bone_name, b) in pose_b {
            if !out.contains_key(&bone_name) {
                out.insert(bone_name, b);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::keyframe::BoneKeyframe;
    use crate::animation::motion::ClipMotion;
    use glam::{Quat, Vec3};

    fn clip(name: &str, bone: &str, translation: Vec3, rotation: Quat) -> Arc<dyn MotionSource> {
        let mut clip = ClipMotion::new(name, 1.0);
        clip.insert_keyframe(bone, BoneKeyframe::new(0.0, translation, rotation, Vec3::ONE));
        clip.insert_keyframe(bone, BoneKeyframe::new(1.0, translation, rotation, Vec3::ONE));
        Arc::new(clip)
    }

    #[test]
    fn test_blend_endpoints() {
        let a = clip("a", "arm", Vec3::ZERO, Quat::IDENTITY);
        let b = clip(
            "b",
            "arm",
            Vec3::new(2.0, 0.0, 0.0),
            Quat::from_axis_angle(Vec3::Y, 1.0),
        );
        let blend = BlendMotion::new("a -> b", a, 0.5, b, 0.0, 0.2);

        // τ=0 ≈ A 的姿势
        let mut pose = Pose::new();
        blend.sample_pose(0.0, &mut pose);
        let arm = pose.get("arm").unwrap();
        assert!(arm.translation.abs_diff_eq(Vec3::ZERO, 1.0e-5));

        // τ=interval ≈ B 的姿势
        pose.clear();
        blend.sample_pose(0.2, &mut pose);
        let arm = pose.get("arm").unwrap();
        assert!(arm.translation.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1.0e-4));
        assert!(arm.rotation.dot(Quat::from_axis_angle(Vec3::Y, 1.0)).abs() > 1.0 - 1.0e-4);
    }

    #[test]
    fn test_blend_midpoint() {
        let a = clip("a", "arm", Vec3::ZERO, Quat::IDENTITY);
        let b = clip("b", "arm", Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY);
        let blend = BlendMotion::new("a -> b", a, 0.0, b, 0.0, 1.0);

        let mut pose = Pose::new();
        blend.sample_pose(0.5, &mut pose);
        let arm = pose.get("arm").unwrap();
        assert!(arm.translation.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1.0e-4));
    }

    #[test]
    fn test_blend_one_sided_track_passes_through() {
        let a = clip("a", "arm", Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
        let b = clip("b", "leg", Vec3::new(0.0, 3.0, 0.0), Quat::IDENTITY);
        let blend = BlendMotion::new("a -> b", a, 0.0, b, 0.0, 1.0);

        let mut pose = Pose::new();
        blend.sample_pose(0.5, &mut pose);
        assert!(pose.get("arm").unwrap().translation.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1.0e-5));
        assert!(pose.get("leg").unwrap().translation.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1.0e-5));
    }

    #[test]
    fn test_blend_of_blend_composes() {
        // 过渡中再过渡：混合源本身可以作为 A 端
        let a = clip("a", "arm", Vec3::ZERO, Quat::IDENTITY);
        let b = clip("b", "arm", Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY);
        let c = clip("c", "arm", Vec3::new(4.0, 0.0, 0.0), Quat::IDENTITY);
        let ab: Arc<dyn MotionSource> = Arc::new(BlendMotion::new("a -> b", a, 0.0, b, 0.0, 1.0));
        let abc = BlendMotion::new("ab -> c", ab, 0.5, c, 0.0, 1.0);

        let mut pose = Pose::new();
        abc.sample_pose(1.0, &mut pose);
        assert!(pose.get("arm").unwrap().translation.abs_diff_eq(Vec3::new(4.0, 0.0, 0.0), 1.0e-4));

        pose.clear();
        abc.sample_pose(0.0, &mut pose);
        // ab 在 0.5 处的姿势是 (1, 0, 0)
        assert!(pose.get("arm").unwrap().translation.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1.0e-4));
    }

    #[test]
    fn test_zero_interval_normalized() {
        let a = clip("a", "arm", Vec3::ZERO, Quat::IDENTITY);
        let b = clip("b", "arm", Vec3::X, Quat::IDENTITY);
        let blend = BlendMotion::new("a -> b", a, 0.0, b, 0.0, 0.0);
        assert!(blend.duration() > 0.0);
    }
}
