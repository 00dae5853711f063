use thiserror::Error;
mod ops;
pub use self::ops::*;

#[derive(Error, Debug, PartialEq)]
pub enum AdamError {
    // 逐元素算子的唯一错误：参与同一次调用的张量形状必须严格一致
    #[error(
        "形状不一致，故无法执行{operator}：参数`{argument}`的形状应为{expected:?}，实际为{found:?}"
    )]
    ShapeMismatch {
        operator: KernelOperator,
        argument: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("数据长度{data_len}与形状{shape:?}所需的元素个数不符")]
    ElementCountMismatch { data_len: usize, shape: Vec<usize> },

    #[error("更新量与优化器状态的数量须一致：状态中有{expected}个，传入{found}个")]
    StateLengthMismatch { expected: usize, found: usize },

    // 超参数校验用
    #[error("{value_name}须{operator}{threshold}")]
    ValueMustSatisfyComparison {
        value_name: String,
        operator: ComparisonOperator,
        threshold: f32,
    },

    #[error("配置解析失败：{0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for AdamError {
    fn from(err: serde_json::Error) -> Self {
        AdamError::InvalidConfig(err.to_string())
    }
}
