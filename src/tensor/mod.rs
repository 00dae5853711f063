/*
 * @Description  : 张量，Adam各算子的输入输出均为此类型。
 *                 内部即`ndarray`的动态维数组，形状可为任意维度（标量的形状为`[]`）。
 */

use ndarray::{Array, ArrayD, IxDyn};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::errors::AdamError;

mod ops {
    pub mod add;
    pub mod eq;
    pub mod mul;
}

mod property;


/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
#[derive(Debug, Clone)]
pub struct Tensor {
    pub(crate) data: ArrayD<f32>,
}

impl Tensor {
    /// 创建一个张量，若为标量，`shape`可以是[]、[1]、[1,1]...
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；
    /// 若为更高维度的数组，`shape`可以是[c,n,m,...]；
    /// `data`的长度必须和`shape`中所有元素的乘积相等，否则返回`ElementCountMismatch`。
    pub fn try_new(data: &[f32], shape: &[usize]) -> Result<Self, AdamError> {
        let data_len = data.len();
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec()).map_err(|_| {
            AdamError::ElementCountMismatch {
                data_len,
                shape: shape.to_vec(),
            }
        })?;
        Ok(Self { data })
    }

    /// 同`try_new`，但数据与形状不符时直接panic
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        Self::try_new(data, shape).unwrap_or_else(|err| panic!("{}", err))
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(shape)),
        }
    }

    pub fn zeros_like(other: &Self) -> Self {
        Self::zeros(other.shape())
    }

    /// 创建一个随机张量，其值在[min, max]的闭区间
    pub fn new_random(min: f32, max: f32, shape: &[usize]) -> Self {
        let mut rng = rand::thread_rng();
        Self::random_with(&mut rng, min, max, shape)
    }

    /// 同`new_random`，但使用固定种子，便于测试复现
    pub fn new_random_seeded(min: f32, max: f32, shape: &[usize], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::random_with(&mut rng, min, max, shape)
    }

    /// 取出内部的`ndarray`数组
    pub fn into_array(self) -> ArrayD<f32> {
        self.data
    }
}

impl From<ArrayD<f32>> for Tensor {
    fn from(data: ArrayD<f32>) -> Self {
        Self { data }
    }
}

impl From<f32> for Tensor {
    /// 将`f32`转换为形状为`[1]`的张量
    fn from(scalar: f32) -> Self {
        Self::new(&[scalar], &[1])
    }
}

// 私有方法
impl Tensor {
    fn random_with<R: rand::Rng>(rng: &mut R, min: f32, max: f32, shape: &[usize]) -> Self {
        let uniform = Uniform::from(min..=max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| uniform.sample(&mut *rng))
            .collect::<Vec<_>>();
        Self::new(&data, shape)
    }
}
