use super::GradientTransformation;
use crate::errors::AdamError;
use crate::tensor::Tensor;

/// 把张量中的NaN替换为0，其余元素不变
pub fn zero_nan_hook(grad: &Tensor) -> Tensor {
    grad.map(|x| if x.is_nan() { 0. } else { x })
}

/// 无状态变换：对流经的每个更新量调用`hook`，常与`zero_nan_hook`搭配
pub struct RegisterHook<F> {
    hook: F,
}

impl<F> RegisterHook<F>
where
    F: Fn(&Tensor) -> Tensor,
{
    pub const fn new(hook: F) -> Self {
        Self { hook }
    }
}

impl<F> GradientTransformation for RegisterHook<F>
where
    F: Fn(&Tensor) -> Tensor,
{
    type State = ();

    fn init(&self, _params: &[Tensor]) -> Self::State {}

    fn update(
        &self,
        updates: Vec<Tensor>,
        _state: &mut Self::State,
        _inplace: bool,
    ) -> Result<Vec<Tensor>, AdamError> {
        Ok(updates.iter().map(|update| (self.hook)(update)).collect())
    }
}
