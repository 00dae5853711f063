use std::cmp::PartialEq;

use crate::tensor::Tensor;

//↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓张量 == f32↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓
impl PartialEq<f32> for Tensor {
    fn eq(&self, other: &f32) -> bool {
        self.number().is_some_and(|x| x == *other)
    }
}

impl PartialEq<Tensor> for f32 {
    fn eq(&self, other: &Tensor) -> bool {
        other == self
    }
}
//↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑张量 == f32↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑

// 形状和所有元素都相等才算相等（NaN与任何值都不相等）
impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}
