/*
 * @Description  : 张量的加法，实现了两个形状严格一致的张量“逐元素”相加的运算，并返回一个新的张量。
 *                 主要用于反向传播时累加来自不同路径的梯度，故不支持广播。
 */

use crate::tensor::Tensor;
use std::ops::{Add, AddAssign};

/*↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓（不）带引用的张量 +（不）带引用的张量↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓↓*/
impl Add for Tensor {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += &other;
        self
    }
}

impl<'a> Add<&'a Self> for Tensor {
    type Output = Self;

    fn add(mut self, other: &'a Self) -> Self {
        self += other;
        self
    }
}

impl<'b> Add<&'b Tensor> for &Tensor {
    type Output = Tensor;

    fn add(self, other: &'b Tensor) -> Tensor {
        assert_same_shape(self, other);
        Tensor {
            data: &self.data + &other.data,
        }
    }
}
/*↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑（不）带引用的张量 +（不）带引用的张量↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑↑*/

impl<'a> AddAssign<&'a Tensor> for Tensor {
    fn add_assign(&mut self, other: &'a Tensor) {
        assert_same_shape(self, other);
        self.data += &other.data;
    }
}

fn assert_same_shape(tensor_1: &Tensor, tensor_2: &Tensor) {
    assert!(
        tensor_1.is_same_shape(tensor_2),
        "形状不一致，故无法相加：第一个张量的形状为{:?}，第二个张量的形状为{:?}",
        tensor_1.shape(),
        tensor_2.shape()
    );
}
