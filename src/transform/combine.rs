use super::GradientTransformation;
use crate::errors::AdamError;
use crate::tensor::Tensor;

/// 依次执行两个变换，前一个的输出作为后一个的输入。更多变换可嵌套：`chain(a, chain(b, c))`
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

pub fn chain<A, B>(first: A, second: B) -> Chain<A, B>
where
    A: GradientTransformation,
    B: GradientTransformation,
{
    Chain { first, second }
}

impl<A, B> GradientTransformation for Chain<A, B>
where
    A: GradientTransformation,
    B: GradientTransformation,
{
    type State = (A::State, B::State);

    fn init(&self, params: &[Tensor]) -> Self::State {
        (self.first.init(params), self.second.init(params))
    }

    fn update(
        &self,
        updates: Vec<Tensor>,
        state: &mut Self::State,
        inplace: bool,
    ) -> Result<Vec<Tensor>, AdamError> {
        let updates = self.first.update(updates, &mut state.0, inplace)?;
        self.second.update(updates, &mut state.1, inplace)
    }
}
