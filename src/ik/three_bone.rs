//! 三骨组合 IK
//!
//! root -> mid1 -> mid2 -> end 四骨三段链，由两次重叠的两骨
//! 求解组成：(root, mid1, mid2) 先朝目标收拢，(mid1, mid2, end)
//! 再精确对齐。数值上不如真正的三段解析解稳定，适用于脊柱、
//! 尾巴等非关键链；如需更高精度可换成 CCD / FABRIK 迭代解，
//! 但要保持收敛容差。

use glam::Vec3;

use crate::skeleton::Armature;
use crate::Result;

use super::two_bone::TwoBoneIk;

/// 三骨组合 IK 求解器
#[derive(Clone, Debug)]
pub struct ThreeBoneIk {
    upper: TwoBoneIk,
    lower: TwoBoneIk,
}

impl ThreeBoneIk {
    /// 构建求解器，校验 root -> mid1 -> mid2 -> end 为严格父子链
    pub fn new(
        armature: &Armature,
        root: &str,
        mid1: &str,
        mid2: &str,
        end: &str,
    ) -> Result<Self> {
        // 两条重叠子链各自校验，等价于整链校验
        let upper = TwoBoneIk::new(armature, root, mid1, mid2)?;
        let lower = TwoBoneIk::new(armature, mid1, mid2, end)?;
        Ok(Self { upper, lower })
    }

    /// 设置极向目标（角色空间），两条子链共用
    pub fn with_pole(mut self, pole: Vec3) -> Self {
        self.upper = self.upper.with_pole(pole);
        self.lower = self.lower.with_pole(pole);
        self
    }

    /// 求解：先收拢上段子链，再用下段子链精确对齐目标
    pub fn solve(&self, armature: &mut Armature, target: Vec3) {
        self.upper.solve(armature, target);
        self.lower.solve(armature, target);
    }
}
