/*
 * @Description  : 缩放类变换：按Adam规则缩放（维护一阶、二阶矩估计）与按固定步长缩放
 */

use super::GradientTransformation;
use crate::adam::kernels::check_shapes;
use crate::adam::{
    AdamConfig, adam_forward_inplace, adam_forward_mu, adam_forward_nu, adam_forward_updates,
};
use crate::errors::{AdamError, KernelOperator};
use crate::tensor::Tensor;

/// 按Adam规则缩放梯度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleByAdam {
    config: AdamConfig,
}

/// `ScaleByAdam`的状态：每个参数一份一阶矩、二阶矩估计，以及已执行的步数
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleByAdamState {
    pub mu: Vec<Tensor>,
    pub nu: Vec<Tensor>,
    pub count: usize,
}

impl ScaleByAdam {
    /// 创建前会校验超参数
    pub fn new(config: AdamConfig) -> Result<Self, AdamError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub const fn config(&self) -> &AdamConfig {
        &self.config
    }
}

impl GradientTransformation for ScaleByAdam {
    type State = ScaleByAdamState;

    fn init(&self, params: &[Tensor]) -> Self::State {
        ScaleByAdamState {
            mu: params.iter().map(Tensor::zeros_like).collect(),
            nu: params.iter().map(Tensor::zeros_like).collect(),
            count: 0,
        }
    }

    fn update(
        &self,
        mut updates: Vec<Tensor>,
        state: &mut Self::State,
        inplace: bool,
    ) -> Result<Vec<Tensor>, AdamError> {
        if updates.len() != state.mu.len() {
            return Err(AdamError::StateLengthMismatch {
                expected: state.mu.len(),
                found: updates.len(),
            });
        }
        // 先检查全部形状，避免只更新了一部分状态
        let operator = if inplace {
            KernelOperator::ForwardInplace
        } else {
            KernelOperator::ForwardMu
        };
        for ((update, mu), nu) in updates.iter().zip(&state.mu).zip(&state.nu) {
            check_shapes(operator, update, &[("mu", mu), ("nu", nu)])?;
        }

        let count = state.count.saturating_add(1);
        let AdamConfig {
            b1,
            b2,
            eps,
            eps_root,
        } = self.config;
        log::debug!(
            "scale_by_adam：第{}步，{}个张量，inplace={}",
            count,
            updates.len(),
            inplace
        );
        for ((update, mu), nu) in updates
            .iter_mut()
            .zip(state.mu.iter_mut())
            .zip(state.nu.iter_mut())
        {
            if inplace {
                adam_forward_inplace(update, mu, nu, b1, b2, eps, eps_root, count)?;
            } else {
                let new_mu = adam_forward_mu(update, mu, b1)?;
                let new_nu = adam_forward_nu(update, nu, b2)?;
                *update = adam_forward_updates(&new_mu, &new_nu, b1, b2, eps, eps_root, count)?;
                *mu = new_mu;
                *nu = new_nu;
            }
        }
        state.count = count;
        Ok(updates)
    }
}

/// 按固定步长缩放，无状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    step_size: f32,
}

impl Scale {
    pub const fn new(step_size: f32) -> Self {
        Self { step_size }
    }

    pub const fn step_size(&self) -> f32 {
        self.step_size
    }
}

impl GradientTransformation for Scale {
    type State = ();

    fn init(&self, _params: &[Tensor]) -> Self::State {}

    fn update(
        &self,
        updates: Vec<Tensor>,
        _state: &mut Self::State,
        inplace: bool,
    ) -> Result<Vec<Tensor>, AdamError> {
        let updates = if inplace {
            updates
                .into_iter()
                .map(|mut update| {
                    update *= self.step_size;
                    update
                })
                .collect()
        } else {
            updates.iter().map(|update| update * self.step_size).collect()
        };
        Ok(updates)
    }
}
