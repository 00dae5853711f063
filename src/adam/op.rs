/*
 * @Description  : 可微分的Adam算子：前向时保存反向所需的张量，反向时把三个反向算子串起来，
 *                 得到对本步输入（梯度`updates`及上一步的`mu`、`nu`）的梯度。
 */

use super::kernels::{
    UpdatesGrads, adam_backward_mu, adam_backward_nu, adam_backward_updates, adam_forward_mu,
    adam_forward_nu, adam_forward_updates,
};
use super::AdamConfig;
use crate::errors::{AdamError, KernelOperator};
use crate::tensor::Tensor;

/// 可微分的Adam算子
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdamOp {
    config: AdamConfig,
}

/// 前向时保存下来、供反向使用的张量
#[derive(Debug, Clone)]
pub struct AdamContext {
    updates: Tensor,
    mu: Tensor,
    nu: Tensor,
    new_mu: Tensor,
    new_nu: Tensor,
    new_updates: Tensor,
    count: usize,
}

impl AdamContext {
    pub fn count(&self) -> usize {
        self.count
    }
}

/// 前向结果
#[derive(Debug, Clone)]
pub struct AdamForward {
    pub updates: Tensor,
    pub mu: Tensor,
    pub nu: Tensor,
    pub context: AdamContext,
}

/// 来自下游的梯度。新的矩估计若未被下游使用，对应项为`None`（视为全零）
#[derive(Debug, Clone)]
pub struct AdamOutputGrads {
    pub dupdates: Tensor,
    pub dmu: Option<Tensor>,
    pub dnu: Option<Tensor>,
}

/// 对本步输入的梯度
#[derive(Debug, Clone, PartialEq)]
pub struct AdamInputGrads {
    pub dupdates: Tensor,
    pub dmu: Tensor,
    pub dnu: Tensor,
}

impl AdamOp {
    pub const fn new(config: AdamConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &AdamConfig {
        &self.config
    }

    /// 依次执行一阶矩、二阶矩、更新量的前向，结果与`adam_forward_inplace`一致，但不修改输入
    pub fn forward(
        &self,
        updates: &Tensor,
        mu: &Tensor,
        nu: &Tensor,
        count: usize,
    ) -> Result<AdamForward, AdamError> {
        let AdamConfig {
            b1,
            b2,
            eps,
            eps_root,
        } = self.config;
        let new_mu = adam_forward_mu(updates, mu, b1)?;
        let new_nu = adam_forward_nu(updates, nu, b2)?;
        let new_updates = adam_forward_updates(&new_mu, &new_nu, b1, b2, eps, eps_root, count)?;

        let context = AdamContext {
            updates: updates.clone(),
            mu: mu.clone(),
            nu: nu.clone(),
            new_mu: new_mu.clone(),
            new_nu: new_nu.clone(),
            new_updates: new_updates.clone(),
            count,
        };
        Ok(AdamForward {
            updates: new_updates,
            mu: new_mu,
            nu: new_nu,
            context,
        })
    }

    /// 反向：
    /// ```text
    /// (dnew_mu, dnew_nu) = 更新量反向(dupdates) + 下游直接传给新矩估计的梯度
    /// (du_mu, dmu) = 一阶矩反向(dnew_mu)
    /// (du_nu, dnu) = 二阶矩反向(dnew_nu)
    /// dupdates_in = du_mu + du_nu
    /// ```
    pub fn backward(
        &self,
        context: &AdamContext,
        grads: AdamOutputGrads,
    ) -> Result<AdamInputGrads, AdamError> {
        let AdamConfig {
            b1,
            b2,
            eps,
            eps_root,
        } = self.config;
        let AdamOutputGrads { dupdates, dmu, dnu } = grads;

        let UpdatesGrads {
            mut dnew_mu,
            mut dnew_nu,
        } = adam_backward_updates(
            &dupdates,
            &context.new_updates,
            &context.new_mu,
            &context.new_nu,
            b1,
            b2,
            eps,
            eps_root,
            context.count,
        )?;
        if let Some(dmu) = dmu {
            accumulate(&mut dnew_mu, &dmu, KernelOperator::BackwardMu, "dmu")?;
        }
        if let Some(dnu) = dnu {
            accumulate(&mut dnew_nu, &dnu, KernelOperator::BackwardNu, "dnu")?;
        }

        let mu_grads = adam_backward_mu(&dnew_mu, &context.updates, &context.mu, b1)?;
        let nu_grads = adam_backward_nu(&dnew_nu, &context.updates, &context.nu, b2)?;
        Ok(AdamInputGrads {
            dupdates: mu_grads.dupdates + &nu_grads.dupdates,
            dmu: mu_grads.dprev,
            dnu: nu_grads.dprev,
        })
    }
}

fn accumulate(
    target: &mut Tensor,
    grad: &Tensor,
    operator: KernelOperator,
    argument: &'static str,
) -> Result<(), AdamError> {
    if !target.is_same_shape(grad) {
        return Err(AdamError::ShapeMismatch {
            operator,
            argument,
            expected: target.shape().to_vec(),
            found: grad.shape().to_vec(),
        });
    }
    *target += grad;
    Ok(())
}
