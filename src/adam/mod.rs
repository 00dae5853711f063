/*
 * @Description  : Adam逐元素算子模块：前向（一阶矩、二阶矩、更新量，及三者融合的原地版本）
 *                 与对应的反向（用于对优化器步骤本身求导的元学习场景）。
 */

use serde::{Deserialize, Serialize};

use crate::errors::{AdamError, ComparisonOperator};

pub mod kernels;
mod op;

pub use kernels::{
    MomentGrads, PARALLEL_THRESHOLD, UpdatesGrads, adam_backward_mu, adam_backward_nu,
    adam_backward_updates, adam_forward_inplace, adam_forward_mu, adam_forward_nu,
    adam_forward_updates,
};
pub use op::{AdamContext, AdamForward, AdamInputGrads, AdamOp, AdamOutputGrads};

#[cfg(test)]
mod tests;

/// Adam的超参数
///
/// 反序列化时缺失的字段取默认值（`b1=0.9`，`b2=0.999`，`eps=1e-8`，`eps_root=0`）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamConfig {
    /// 一阶矩的衰减率
    pub b1: f32,
    /// 二阶矩的衰减率
    pub b2: f32,
    /// 加在分母`sqrt`之外的稳定项
    pub eps: f32,
    /// 加在分母`sqrt`之内的稳定项
    pub eps_root: f32,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-8, 0.0)
    }
}

impl AdamConfig {
    pub const fn new(b1: f32, b2: f32, eps: f32, eps_root: f32) -> Self {
        Self {
            b1,
            b2,
            eps,
            eps_root,
        }
    }

    /// 从json字符串读取超参数，读取后会做一次`validate`
    pub fn from_json(json: &str) -> Result<Self, AdamError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验：`b1`、`b2`须在(0, 1)内，`eps`、`eps_root`须非负
    pub fn validate(&self) -> Result<(), AdamError> {
        check("b1", self.b1, ComparisonOperator::GreaterThan, 0.0)?;
        check("b1", self.b1, ComparisonOperator::LessThan, 1.0)?;
        check("b2", self.b2, ComparisonOperator::GreaterThan, 0.0)?;
        check("b2", self.b2, ComparisonOperator::LessThan, 1.0)?;
        check("eps", self.eps, ComparisonOperator::GreaterOrEqual, 0.0)?;
        check("eps_root", self.eps_root, ComparisonOperator::GreaterOrEqual, 0.0)
    }

    /// 第`count`步的偏差修正分母：`(1 - b1^count, 1 - b2^count)`
    pub fn bias_corrections(&self, count: usize) -> (f32, f32) {
        (
            bias_correction(self.b1, count),
            bias_correction(self.b2, count),
        )
    }
}

/// `1 - decay^count`。`count`超出`i32`范围时`decay^count`按0处理（`decay`∈(0, 1)）
pub(crate) fn bias_correction(decay: f32, count: usize) -> f32 {
    let decay_pow = i32::try_from(count).map_or(0.0, |n| decay.powi(n));
    1.0 - decay_pow
}

fn check(
    value_name: &str,
    value: f32,
    operator: ComparisonOperator,
    threshold: f32,
) -> Result<(), AdamError> {
    let satisfied = match operator {
        ComparisonOperator::GreaterOrEqual => value >= threshold,
        ComparisonOperator::LessOrEqual => value <= threshold,
        ComparisonOperator::GreaterThan => value > threshold,
        ComparisonOperator::LessThan => value < threshold,
    };
    if satisfied {
        Ok(())
    } else {
        Err(AdamError::ValueMustSatisfyComparison {
            value_name: value_name.to_string(),
            operator,
            threshold,
        })
    }
}
