//! 骨架
//!
//! arena 方式管理骨骼层次：骨骼存放在 Vec 中，名称与蒙皮索引
//! 各自维护一张查找表。结构性错误（重名、重索引、父骨骼缺失、
//! 多根）一律在构建期快速失败，运行期不再校验。

use std::collections::HashMap;

use glam::Mat4;

use crate::{Result, SkelError};

use super::Bone;

/// 骨架：骨骼 arena + 双向查找
#[derive(Clone, Debug, Default)]
pub struct Armature {
    /// 骨骼 arena
    bones: Vec<Bone>,
    /// 名称 -> arena 槽位
    name_to_slot: HashMap<String, usize>,
    /// 蒙皮索引 -> arena 槽位
    skin_to_slot: HashMap<i32, usize>,
    /// 根骨骼槽位
    root: Option<usize>,
}

impl Armature {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加骨骼
    ///
    /// - `parent` 为 None 时作为根骨骼（每个骨架只允许一个根）
    /// - 名称重复、蒙皮索引重复（仅 >= 0 时检查）、父骨骼缺失均报错
    ///
    /// 返回新骨骼的 arena 槽位。
    pub fn add_bone(
        &mut self,
        name: &str,
        skin_index: i32,
        parent: Option<&str>,
        inverse_bind: Mat4,
        bind_local: Mat4,
    ) -> Result<usize> {
        if self.name_to_slot.contains_key(name) {
            return Err(SkelError::DuplicateBoneName(name.to_string()));
        }
        if skin_index >= 0 && self.skin_to_slot.contains_key(&skin_index) {
            return Err(SkelError::DuplicateSkinIndex(skin_index));
        }

        let parent_slot = match parent {
            Some(parent_name) => Some(
                self.bone_index(parent_name)
                    .ok_or_else(|| SkelError::MissingParent(parent_name.to_string()))?,
            ),
            None => {
                if let Some(root) = self.root {
                    return Err(SkelError::DuplicateRoot(self.bones[root].name.clone()));
                }
                None
            }
        };

        let slot = self.bones.len();
        self.bones.push(Bone::new(
            name.to_string(),
            skin_index,
            parent_slot,
            inverse_bind,
            bind_local,
        ));
        self.name_to_slot.insert(name.to_string(), slot);
        if skin_index >= 0 {
            self.skin_to_slot.insert(skin_index, slot);
        }

        match parent_slot {
            Some(p) => self.bones[p].children.push(slot),
            None => self.root = Some(slot),
        }

        Ok(slot)
    }

    // ========================================
    // 查找
    // ========================================

    /// 骨骼数量
    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// 根骨骼槽位
    #[inline]
    pub fn root(&self) -> Option<usize> {
        self.root
    }

    /// 按槽位访问骨骼
    #[inline]
    pub fn bone(&self, slot: usize) -> &Bone {
        &self.bones[slot]
    }

    /// 按槽位访问骨骼（可变）
    #[inline]
    pub fn bone_mut(&mut self, slot: usize) -> &mut Bone {
        &mut self.bones[slot]
    }

    /// 名称查找，未命中返回 None
    #[inline]
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.name_to_slot.get(name).copied()
    }

    /// 名称查找骨骼，未命中返回显式错误
    ///
    /// 挂载 / 装备系统按名称取活动变换时使用；未知名称绝不
    /// 返回零变换。
    pub fn bone_by_name(&self, name: &str) -> Result<&Bone> {
        self.bone_index(name)
            .map(|slot| &self.bones[slot])
            .ok_or_else(|| SkelError::BoneNotFound(name.to_string()))
    }

    /// 名称查找骨骼（可变）
    pub fn bone_by_name_mut(&mut self, name: &str) -> Result<&mut Bone> {
        match self.bone_index(name) {
            Some(slot) => Ok(&mut self.bones[slot]),
            None => Err(SkelError::BoneNotFound(name.to_string())),
        }
    }

    /// 蒙皮索引查找槽位
    #[inline]
    pub fn slot_by_skin_index(&self, skin_index: i32) -> Option<usize> {
        self.skin_to_slot.get(&skin_index).copied()
    }

    /// 最大蒙皮索引（蒙皮矩阵数组容量 = max + 1）
    pub fn max_skin_index(&self) -> i32 {
        self.skin_to_slot.keys().copied().max().unwrap_or(-1)
    }

    /// 遍历全部骨骼
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Bone> {
        self.bones.iter()
    }

    // ========================================
    // 变换传播
    // ========================================

    /// 重新传播指定骨骼及其后代的角色空间变换
    ///
    /// 父链的 animated 视为已知（IK / 约束只改子树的 local，
    /// 父链不受影响），因此无需重跑整个 Animator 主遍历。
    /// `include_self` 为 false 时只刷新后代。
    ///
    /// 显式栈遍历，不递归。
    pub fn update_animated_transforms(&mut self, slot: usize, include_self: bool) {
        let mut stack: Vec<usize> = Vec::with_capacity(8);
        if include_self {
            stack.push(slot);
        } else {
            stack.extend(self.bones[slot].children.iter().copied());
        }

        while let Some(idx) = stack.pop() {
            let parent_animated = match self.bones[idx].parent {
                Some(p) => self.bones[p].animated,
                None => Mat4::IDENTITY,
            };
            let bone = &mut self.bones[idx];
            bone.animated = parent_animated * bone.local;
            stack.extend(self.bones[idx].children.iter().copied());
        }
    }

    /// 全部骨骼重置为绑定姿势并重新传播
    pub fn reset_to_bind_pose(&mut self) {
        for bone in &mut self.bones {
            bone.reset_to_bind();
        }
        if let Some(root) = self.root {
            self.update_animated_transforms(root, true);
        }
    }

    /// 校验严格父子链：`chain[i+1]` 的父骨骼必须是 `chain[i]`
    pub(crate) fn verify_chain(&self, chain: &[usize]) -> Result<()> {
        for slot in chain {
            if *slot >= self.bones.len() {
                return Err(SkelError::InvalidIkChain(format!(
                    "bone slot {} out of range",
                    slot
                )));
            }
        }
        for pair in chain.windows(2) {
            if self.bones[pair[1]].parent != Some(pair[0]) {
                return Err(SkelError::InvalidIkChain(format!(
                    "'{}' is not the parent of '{}'",
                    self.bones[pair[0]].name, self.bones[pair[1]].name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn simple_armature() -> Armature {
        // root -> spine -> head，各段 Y 方向偏移 1
        let offset = Mat4::from_translation(Vec3::Y);
        let mut arm = Armature::new();
        arm.add_bone("root", 0, None, Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap();
        arm.add_bone("spine", 1, Some("root"), Mat4::from_translation(-Vec3::Y), offset)
            .unwrap();
        arm.add_bone(
            "head",
            2,
            Some("spine"),
            Mat4::from_translation(Vec3::Y * -2.0),
            offset,
        )
        .unwrap();
        arm
    }

    #[test]
    fn test_add_bone_duplicate_name() {
        let mut arm = simple_armature();
        let err = arm
            .add_bone("spine", 9, Some("root"), Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, SkelError::DuplicateBoneName(_)));
    }

    #[test]
    fn test_add_bone_duplicate_skin_index() {
        let mut arm = simple_armature();
        let err = arm
            .add_bone("extra", 1, Some("root"), Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, SkelError::DuplicateSkinIndex(1)));
    }

    #[test]
    fn test_add_bone_missing_parent() {
        let mut arm = simple_armature();
        let err = arm
            .add_bone("hand", 3, Some("nope"), Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, SkelError::MissingParent(_)));
    }

    #[test]
    fn test_add_bone_second_root() {
        let mut arm = simple_armature();
        let err = arm
            .add_bone("root2", 3, None, Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap_err();
        assert!(matches!(err, SkelError::DuplicateRoot(_)));
    }

    #[test]
    fn test_helper_bone_skin_index_not_registered() {
        let mut arm = simple_armature();
        // -1 辅助骨骼可以有多个
        arm.add_bone("helper_a", -1, Some("root"), Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap();
        arm.add_bone("helper_b", -1, Some("root"), Mat4::IDENTITY, Mat4::IDENTITY)
            .unwrap();
        assert_eq!(arm.max_skin_index(), 2);
    }

    #[test]
    fn test_bone_by_name_miss() {
        let arm = simple_armature();
        assert!(matches!(
            arm.bone_by_name("missing"),
            Err(SkelError::BoneNotFound(_))
        ));
    }

    #[test]
    fn test_propagation_invariant() {
        let mut arm = simple_armature();
        // 给 spine 一个旋转姿势
        let spine = arm.bone_index("spine").unwrap();
        arm.bone_mut(spine).local = Mat4::from_rotation_translation(
            Quat::from_axis_angle(Vec3::Z, 0.5),
            Vec3::Y,
        );
        arm.update_animated_transforms(arm.root().unwrap(), true);

        // animated(b) == animated(parent(b)) * local(b)
        for slot in 0..arm.len() {
            let bone = arm.bone(slot);
            let parent_animated = match bone.parent {
                Some(p) => arm.bone(p).animated,
                None => Mat4::IDENTITY,
            };
            let expect = parent_animated * bone.local;
            assert!(bone.animated.abs_diff_eq(expect, 1.0e-5));
            // skinning(b) == animated(b) * inverse_bind(b)
            assert!(bone
                .skinning_matrix()
                .abs_diff_eq(bone.animated * bone.inverse_bind, 1.0e-6));
        }
    }

    #[test]
    fn test_subtree_update_after_local_edit() {
        let mut arm = simple_armature();
        arm.update_animated_transforms(arm.root().unwrap(), true);
        let head = arm.bone_index("head").unwrap();
        let before = arm.bone(head).position();
        assert!(before.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1.0e-5));

        // 带外编辑 spine 的 local，只刷新子树
        let spine = arm.bone_index("spine").unwrap();
        arm.bone_mut(spine).local =
            Mat4::from_rotation_translation(Quat::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_2), Vec3::Y);
        arm.update_animated_transforms(spine, true);

        let after = arm.bone(head).position();
        // head 绕 spine 旋转 90° 后应位于 (-1, 1, 0)
        assert!(after.abs_diff_eq(Vec3::new(-1.0, 1.0, 0.0), 1.0e-4));
    }

    #[test]
    fn test_reset_to_bind_pose() {
        let mut arm = simple_armature();
        let spine = arm.bone_index("spine").unwrap();
        arm.bone_mut(spine).local = Mat4::from_translation(Vec3::X * 5.0);
        arm.reset_to_bind_pose();
        assert!(arm.bone(spine).local.abs_diff_eq(arm.bone(spine).bind_local, 1.0e-6));
        let head = arm.bone_index("head").unwrap();
        assert!(arm.bone(head).position().abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1.0e-5));
    }

    #[test]
    fn test_verify_chain() {
        let arm = simple_armature();
        let root = arm.bone_index("root").unwrap();
        let spine = arm.bone_index("spine").unwrap();
        let head = arm.bone_index("head").unwrap();
        assert!(arm.verify_chain(&[root, spine, head]).is_ok());
        assert!(arm.verify_chain(&[spine, root]).is_err());
        assert!(arm.verify_chain(&[root, head]).is_err());
    }
}
