//! # Adam Op
//!
//! `adam_op`提供Adam优化器的逐元素算子：一阶矩、二阶矩、更新量的前向，三者融合的原地前向，
//! 以及它们的反向（reverse-mode）版本，以便在元学习中对优化器步骤本身求导。
//!
//! - [`adam`]：七个底层算子、超参数[`AdamConfig`]与可微分算子[`AdamOp`]；
//! - [`transform`]：维护矩估计状态的梯度变换（`scale_by_adam`、`chain`、`adam`等）；
//! - [`tensor`]：基于`ndarray`的张量。
//!
//! 所有算子都是纯函数（原地前向除外），唯一的错误是参与运算的张量形状不一致。

pub mod adam;
pub mod errors;
pub mod tensor;
pub mod transform;
pub mod utils;

pub use adam::{AdamConfig, AdamOp};
pub use errors::AdamError;
pub use tensor::Tensor;
