mod backward;

use crate::tensor::Tensor;

fn scalar(value: f32) -> Tensor {
    Tensor::new(&[value], &[1])
}

/// 更新量前向的f64参考实现，超参数先按f32取值再转为f64，以便与算子使用完全相同的常数
fn reference_updates(
    new_mu: f64,
    new_nu: f64,
    b1: f32,
    b2: f32,
    eps: f32,
    eps_root: f32,
    count: usize,
) -> f64 {
    let count = count as i32;
    let b1c = 1.0 - f64::from(b1).powi(count);
    let b2c = 1.0 - f64::from(b2).powi(count);
    (new_mu / b1c) / ((new_nu / b2c + f64::from(eps_root)).sqrt() + f64::from(eps))
}

/// 完整一步Adam（矩估计更新 + 更新量）的f64参考实现，返回`(updates', mu', nu')`
fn reference_step(
    updates: f64,
    mu: f64,
    nu: f64,
    b1: f32,
    b2: f32,
    eps: f32,
    eps_root: f32,
    count: usize,
) -> (f64, f64, f64) {
    let (b1, b2) = (f64::from(b1), f64::from(b2));
    let new_mu = b1 * mu + (1.0 - b1) * updates;
    let new_nu = b2 * nu + (1.0 - b2) * updates * updates;
    let new_updates = reference_updates(
        new_mu, new_nu, b1 as f32, b2 as f32, eps, eps_root, count,
    );
    (new_updates, new_mu, new_nu)
}

/// 中心差分求数值导数
fn central_difference<F: Fn(f64) -> f64>(f: F, x: f64) -> f64 {
    let h = 1e-6 * x.abs().max(1e-3);
    (f(x + h) - f(x - h)) / (2.0 * h)
}
