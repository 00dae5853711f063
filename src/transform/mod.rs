/*
 * @Description  : 梯度变换：把原始梯度映射为参数更新量，并在多步之间维护优化器状态。
 *                 每个变换由`init`（根据参数创建状态）与`update`（消耗梯度、更新状态、返回更新量）组成，
 *                 可以用`chain`串联，如`adam()`即`scale_by_adam`后接`scale(-lr)`。
 */

use crate::adam::AdamConfig;
use crate::errors::AdamError;
use crate::tensor::Tensor;

mod combine;
mod hook;
mod scale;

pub use combine::{Chain, chain};
pub use hook::{RegisterHook, zero_nan_hook};
pub use scale::{Scale, ScaleByAdam, ScaleByAdamState};


/// 梯度变换核心 trait
pub trait GradientTransformation {
    type State;

    /// 根据参数（仅用到其形状）创建初始状态
    fn init(&self, params: &[Tensor]) -> Self::State;

    /// 消耗一组梯度（或上一个变换的输出），返回变换后的更新量。
    ///
    /// `inplace`为`true`时直接在传入的张量缓冲区上计算，否则分配新张量；两者数值结果一致。
    /// 出错时返回的错误来自底层算子，此前状态不会被修改（`Chain`中已执行完的前序变换除外）。
    fn update(
        &self,
        updates: Vec<Tensor>,
        state: &mut Self::State,
        inplace: bool,
    ) -> Result<Vec<Tensor>, AdamError>;
}

/// Adam优化器：`chain(scale_by_adam(config), scale(-learning_rate))`
///
/// 返回的更新量直接加到参数上即可（已取负号）。
pub fn adam(
    learning_rate: f32,
    config: AdamConfig,
) -> Result<Chain<ScaleByAdam, Scale>, AdamError> {
    Ok(chain(ScaleByAdam::new(config)?, Scale::new(-learning_rate)))
}
