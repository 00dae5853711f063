use std::fmt::{self, Display};

/// Adam的各个逐元素算子，用于在错误信息中指明出错的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelOperator {
    ForwardInplace,
    ForwardMu,
    ForwardNu,
    ForwardUpdates,
    BackwardMu,
    BackwardNu,
    BackwardUpdates,
}
impl Display for KernelOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation_name = match self {
            KernelOperator::ForwardInplace => "Adam原地前向",
            KernelOperator::ForwardMu => "一阶矩前向",
            KernelOperator::ForwardNu => "二阶矩前向",
            KernelOperator::ForwardUpdates => "更新量前向",
            KernelOperator::BackwardMu => "一阶矩反向",
            KernelOperator::BackwardNu => "二阶矩反向",
            KernelOperator::BackwardUpdates => "更新量反向",
        };
        write!(f, "{}", operation_name)
    }
}

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    GreaterOrEqual,
    LessOrEqual,
    GreaterThan,
    LessThan,
}
impl Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operator_name = match self {
            ComparisonOperator::GreaterOrEqual => "≥",
            ComparisonOperator::LessOrEqual => "≤",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
        };
        write!(f, "{}", operator_name)
    }
}
