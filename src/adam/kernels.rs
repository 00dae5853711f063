/*
 * @Description  : Adam的逐元素算子。
 *                 所有算子都要求参与运算的张量形状严格一致，且在开始计算（或原地修改）前完成检查；
 *                 除形状不一致外没有其他错误，`eps_root=0`且`nu_hat=0`之类的数值问题按IEEE浮点语义得到inf/nan。
 *                 超参数（`b1`、`b2`∈(0, 1)，`count`≥1）不在此处校验，见`AdamConfig::validate`。
 */

use ndarray::{ArrayD, Zip};

use super::bias_correction;
use crate::errors::{AdamError, KernelOperator};
use crate::tensor::Tensor;

/// 元素个数不少于此值时改用rayon并行计算，结果与串行完全一致
pub const PARALLEL_THRESHOLD: usize = 1 << 14;

macro_rules! zip_for_each {
    ($len:expr, $zip:expr, $f:expr) => {
        if $len >= PARALLEL_THRESHOLD {
            $zip.par_for_each($f)
        } else {
            $zip.for_each($f)
        }
    };
}

macro_rules! zip_map_collect {
    ($len:expr, $zip:expr, $f:expr) => {
        if $len >= PARALLEL_THRESHOLD {
            $zip.par_map_collect($f)
        } else {
            $zip.map_collect($f)
        }
    };
}

/// 一阶矩或二阶矩算子的反向结果
#[derive(Debug, Clone, PartialEq)]
pub struct MomentGrads {
    /// 对`updates`的梯度
    pub dupdates: Tensor,
    /// 对上一步矩估计（`mu`或`nu`）的梯度
    pub dprev: Tensor,
}

/// 更新量算子的反向结果
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatesGrads {
    pub dnew_mu: Tensor,
    pub dnew_nu: Tensor,
}

/// 融合的Adam前向，原地修改`updates`、`mu`、`nu`：
/// ```text
/// mu'  = b1*mu + (1-b1)*updates
/// nu'  = b2*nu + (1-b2)*updates^2
/// updates' = (mu'/(1-b1^count)) / (sqrt(nu'/(1-b2^count) + eps_root) + eps)
/// ```
/// 返回修改后的`[updates', mu', nu']`。
/// 三者形状不一致时返回`ShapeMismatch`，此时三个张量均未被修改。
#[allow(clippy::too_many_arguments)]
pub fn adam_forward_inplace<'a>(
    updates: &'a mut Tensor,
    mu: &'a mut Tensor,
    nu: &'a mut Tensor,
    b1: f32,
    b2: f32,
    eps: f32,
    eps_root: f32,
    count: usize,
) -> Result<[&'a Tensor; 3], AdamError> {
    let operator = KernelOperator::ForwardInplace;
    check_shapes(operator, updates, &[("mu", &*mu), ("nu", &*nu)])?;
    log::trace!("{}：{}个元素，count={}", operator, updates.size(), count);

    let inv_b1c = 1.0 / bias_correction(b1, count);
    let inv_b2c = 1.0 / bias_correction(b2, count);
    let len = updates.size();
    zip_for_each!(
        len,
        Zip::from(&mut updates.data)
            .and(&mut mu.data)
            .and(&mut nu.data),
        |u: &mut f32, m: &mut f32, v: &mut f32| {
            let g = *u;
            *m = b1 * *m + (1.0 - b1) * g;
            *v = b2 * *v + (1.0 - b2) * g * g;
            *u = stabilized_update(*m * inv_b1c, *v * inv_b2c, eps, eps_root);
        }
    );
    Ok([&*updates, &*mu, &*nu])
}

/// 一阶矩前向：`b1*mu + (1-b1)*updates`
pub fn adam_forward_mu(updates: &Tensor, mu: &Tensor, b1: f32) -> Result<Tensor, AdamError> {
    let operator = KernelOperator::ForwardMu;
    check_shapes(operator, updates, &[("mu", mu)])?;
    log::trace!("{}：{}个元素", operator, updates.size());

    let data: ArrayD<f32> = zip_map_collect!(
        updates.size(),
        Zip::from(&updates.data).and(&mu.data),
        |&g: &f32, &m: &f32| b1 * m + (1.0 - b1) * g
    );
    Ok(Tensor::from(data))
}

/// 二阶矩前向：`b2*nu + (1-b2)*updates^2`
pub fn adam_forward_nu(updates: &Tensor, nu: &Tensor, b2: f32) -> Result<Tensor, AdamError> {
    let operator = KernelOperator::ForwardNu;
    check_shapes(operator, updates, &[("nu", nu)])?;
    log::trace!("{}：{}个元素", operator, updates.size());

    let data: ArrayD<f32> = zip_map_collect!(
        updates.size(),
        Zip::from(&updates.data).and(&nu.data),
        |&g: &f32, &v: &f32| b2 * v + (1.0 - b2) * g * g
    );
    Ok(Tensor::from(data))
}

/// 更新量前向：对新的矩估计做偏差修正，再做带稳定项的除法。不改动矩估计本身。
pub fn adam_forward_updates(
    new_mu: &Tensor,
    new_nu: &Tensor,
    b1: f32,
    b2: f32,
    eps: f32,
    eps_root: f32,
    count: usize,
) -> Result<Tensor, AdamError> {
    let operator = KernelOperator::ForwardUpdates;
    check_shapes(operator, new_mu, &[("new_nu", new_nu)])?;
    log::trace!("{}：{}个元素，count={}", operator, new_mu.size(), count);

    let inv_b1c = 1.0 / bias_correction(b1, count);
    let inv_b2c = 1.0 / bias_correction(b2, count);
    let data: ArrayD<f32> = zip_map_collect!(
        new_mu.size(),
        Zip::from(&new_mu.data).and(&new_nu.data),
        |&m: &f32, &v: &f32| stabilized_update(m * inv_b1c, v * inv_b2c, eps, eps_root)
    );
    Ok(Tensor::from(data))
}

/// 一阶矩前向的反向：`dupdates = (1-b1)*dmu`，`dmu_prev = b1*dmu`。
/// `updates`与`mu`仅用于形状检查（该算子对二者是线性的）。
pub fn adam_backward_mu(
    dmu: &Tensor,
    updates: &Tensor,
    mu: &Tensor,
    b1: f32,
) -> Result<MomentGrads, AdamError> {
    let operator = KernelOperator::BackwardMu;
    check_shapes(operator, dmu, &[("updates", updates), ("mu", mu)])?;
    log::trace!("{}：{}个元素", operator, dmu.size());

    let len = dmu.size();
    let dupdates: ArrayD<f32> =
        zip_map_collect!(len, Zip::from(&dmu.data), |&d: &f32| (1.0 - b1) * d);
    let dprev: ArrayD<f32> = zip_map_collect!(len, Zip::from(&dmu.data), |&d: &f32| b1 * d);
    Ok(MomentGrads {
        dupdates: Tensor::from(dupdates),
        dprev: Tensor::from(dprev),
    })
}

/// 二阶矩前向的反向：`dupdates = 2*(1-b2)*updates*dnu`，`dnu_prev = b2*dnu`
pub fn adam_backward_nu(
    dnu: &Tensor,
    updates: &Tensor,
    nu: &Tensor,
    b2: f32,
) -> Result<MomentGrads, AdamError> {
    let operator = KernelOperator::BackwardNu;
    check_shapes(operator, dnu, &[("updates", updates), ("nu", nu)])?;
    log::trace!("{}：{}个元素", operator, dnu.size());

    let len = dnu.size();
    let dupdates: ArrayD<f32> = zip_map_collect!(
        len,
        Zip::from(&dnu.data).and(&updates.data),
        |&d: &f32, &g: &f32| 2.0 * (1.0 - b2) * g * d
    );
    let dprev: ArrayD<f32> = zip_map_collect!(len, Zip::from(&dnu.data), |&d: &f32| b2 * d);
    Ok(MomentGrads {
        dupdates: Tensor::from(dupdates),
        dprev: Tensor::from(dprev),
    })
}

/// 更新量前向的反向，即对`new_mu`、`new_nu`求偏导：
/// ```text
/// b1c = 1 - b1^count ; b2c = 1 - b2^count
/// nu_hat = new_nu/b2c ; root = sqrt(nu_hat + eps_root) ; denom = root + eps
/// dnew_mu = dupdates / denom / b1c
/// dnew_nu = -dupdates * updates / (denom * 2*root) / b2c
/// ```
/// 其中`updates`须为同一组输入下`adam_forward_updates`的输出（即`mu_hat/denom`）。
#[allow(clippy::too_many_arguments)]
pub fn adam_backward_updates(
    dupdates: &Tensor,
    updates: &Tensor,
    new_mu: &Tensor,
    new_nu: &Tensor,
    b1: f32,
    b2: f32,
    eps: f32,
    eps_root: f32,
    count: usize,
) -> Result<UpdatesGrads, AdamError> {
    let operator = KernelOperator::BackwardUpdates;
    check_shapes(
        operator,
        dupdates,
        &[("updates", updates), ("new_mu", new_mu), ("new_nu", new_nu)],
    )?;
    log::trace!("{}：{}个元素，count={}", operator, dupdates.size(), count);

    let b1c = bias_correction(b1, count);
    let b2c = bias_correction(b2, count);
    let mut dnew_mu = ArrayD::<f32>::zeros(dupdates.data.raw_dim());
    let mut dnew_nu = ArrayD::<f32>::zeros(dupdates.data.raw_dim());
    zip_for_each!(
        dupdates.size(),
        Zip::from(&mut dnew_mu)
            .and(&mut dnew_nu)
            .and(&dupdates.data)
            .and(&updates.data)
            .and(&new_nu.data),
        |dm: &mut f32, dv: &mut f32, &d: &f32, &u: &f32, &v: &f32| {
            let root = (v / b2c + eps_root).sqrt();
            let denom = root + eps;
            *dm = d / denom / b1c;
            *dv = -d * u / (denom * 2.0 * root) / b2c;
        }
    );
    Ok(UpdatesGrads {
        dnew_mu: Tensor::from(dnew_mu),
        dnew_nu: Tensor::from(dnew_nu),
    })
}

fn stabilized_update(mu_hat: f32, nu_hat: f32, eps: f32, eps_root: f32) -> f32 {
    mu_hat / ((nu_hat + eps_root).sqrt() + eps)
}

/// 其余参与运算的张量须与首个张量`reference`形状严格一致
pub(crate) fn check_shapes(
    operator: KernelOperator,
    reference: &Tensor,
    others: &[(&'static str, &Tensor)],
) -> Result<(), AdamError> {
    match others.iter().find(|(_, t)| !t.is_same_shape(reference)) {
        Some(&(argument, tensor)) => Err(AdamError::ShapeMismatch {
            operator,
            argument,
            expected: reference.shape().to_vec(),
            found: tensor.shape().to_vec(),
        }),
        None => Ok(()),
    }
}
