/*
 * @Description  : Adam反向算子测试，解析梯度与f64参考实现的中心差分对比
 */

use approx::{assert_abs_diff_eq, assert_relative_eq};

use super::{central_difference, reference_updates, scalar};
use crate::adam::{
    adam_backward_mu, adam_backward_nu, adam_backward_updates, adam_forward_mu,
    adam_forward_updates,
};
use crate::assert_err;
use crate::errors::{AdamError, KernelOperator};
use crate::tensor::Tensor;

#[test]
fn test_backward_mu_with_identity_seed() {
    let b1 = 0.9;
    let dmu = Tensor::new(&[1.; 6], &[2, 3]);
    let updates = Tensor::new_random_seeded(-1., 1., &[2, 3], 21);
    let mu = Tensor::new_random_seeded(-1., 1., &[2, 3], 22);

    let grads = adam_backward_mu(&dmu, &updates, &mu, b1).unwrap();
    assert_eq!(grads.dupdates, Tensor::new(&[1. - b1; 6], &[2, 3]));
    assert_eq!(grads.dprev, Tensor::new(&[b1; 6], &[2, 3]));
}

#[test]
fn test_backward_mu_matches_forward_slope() {
    // 一阶矩前向对两个输入都是线性的，直接用有限差分验证
    let b1 = 0.8;
    let updates = scalar(0.25);
    let mu = scalar(-0.5);
    let base = adam_forward_mu(&updates, &mu, b1).unwrap().number().unwrap();
    let bumped_updates = adam_forward_mu(&scalar(1.25), &mu, b1)
        .unwrap()
        .number()
        .unwrap();
    let bumped_mu = adam_forward_mu(&updates, &scalar(0.5), b1)
        .unwrap()
        .number()
        .unwrap();

    let grads = adam_backward_mu(&scalar(1.), &updates, &mu, b1).unwrap();
    assert_abs_diff_eq!(grads.dupdates.number().unwrap(), bumped_updates - base, epsilon = 1e-6);
    assert_abs_diff_eq!(grads.dprev.number().unwrap(), bumped_mu - base, epsilon = 1e-6);
}

#[test]
fn test_backward_nu() {
    let b2 = 0.9;
    let dnu = Tensor::new(&[1., 2.], &[2]);
    let updates = Tensor::new(&[0.5, -2.], &[2]);
    let nu = Tensor::new(&[0.1, 0.2], &[2]);

    let grads = adam_backward_nu(&dnu, &updates, &nu, b2).unwrap();
    let dupdates = grads.dupdates.to_vec();
    let dprev = grads.dprev.to_vec();
    // dupdates = 2*(1-b2)*updates*dnu
    assert_abs_diff_eq!(dupdates[0], 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(dupdates[1], -0.8, epsilon = 1e-6);
    // dnu_prev = b2*dnu
    assert_abs_diff_eq!(dprev[0], 0.9, epsilon = 1e-6);
    assert_abs_diff_eq!(dprev[1], 1.8, epsilon = 1e-6);
}

#[test]
fn test_backward_updates_matches_finite_difference() {
    // (new_mu, new_nu, b1, b2, eps, eps_root, count)
    let cases: &[(f32, f32, f32, f32, f32, f32, usize)] = &[
        (0.05, 0.002, 0.9, 0.99, 1e-8, 0.0, 3),
        (-0.3, 0.04, 0.9, 0.999, 1e-8, 1e-8, 1),
        (1.2, 0.5, 0.8, 0.9, 1e-3, 1e-4, 10),
        (0.001, 1e-5, 0.9, 0.999, 1e-8, 0.0, 100),
    ];
    for &(m, v, b1, b2, eps, eps_root, count) in cases {
        let new_mu = scalar(m);
        let new_nu = scalar(v);
        let updates = adam_forward_updates(&new_mu, &new_nu, b1, b2, eps, eps_root, count).unwrap();

        for dupdates in [1.0f32, -2.5] {
            let grads = adam_backward_updates(
                &scalar(dupdates),
                &updates,
                &new_mu,
                &new_nu,
                b1,
                b2,
                eps,
                eps_root,
                count,
            )
            .unwrap();

            let (m, v) = (f64::from(m), f64::from(v));
            let numeric_dmu = f64::from(dupdates)
                * central_difference(
                    |x| reference_updates(x, v, b1, b2, eps, eps_root, count),
                    m,
                );
            let numeric_dnu = f64::from(dupdates)
                * central_difference(
                    |x| reference_updates(m, x, b1, b2, eps, eps_root, count),
                    v,
                );
            assert_relative_eq!(
                f64::from(grads.dnew_mu.number().unwrap()),
                numeric_dmu,
                max_relative = 1e-4
            );
            assert_relative_eq!(
                f64::from(grads.dnew_nu.number().unwrap()),
                numeric_dnu,
                max_relative = 1e-4
            );
        }
    }
}

#[test]
fn test_backward_updates_on_first_step() {
    // count=1，eps=eps_root=0，nu_hat=1 => denom=1，dnew_mu = 1/(1-b1)
    let (b1, b2) = (0.9, 0.999);
    let new_mu = scalar(0.1);
    let new_nu = scalar(1. - b2);
    let updates = adam_forward_updates(&new_mu, &new_nu, b1, b2, 0.0, 0.0, 1).unwrap();
    assert_abs_diff_eq!(updates.number().unwrap(), 1.0, epsilon = 1e-5);

    let grads =
        adam_backward_updates(&scalar(1.), &updates, &new_mu, &new_nu, b1, b2, 0.0, 0.0, 1)
            .unwrap();
    assert_abs_diff_eq!(grads.dnew_mu.number().unwrap(), 10.0, epsilon = 1e-4);
    // dnew_nu = -updates/(2*denom^2)/(1-b2) = -500
    assert_relative_eq!(grads.dnew_nu.number().unwrap(), -500.0, max_relative = 1e-4);
}

#[test]
fn test_backward_updates_with_zero_mu() {
    let (b1, b2) = (0.9, 0.999);
    let new_mu = Tensor::zeros(&[3]);
    let new_nu = Tensor::new(&[0.001, 0.01, 0.1], &[3]);
    let updates = adam_forward_updates(&new_mu, &new_nu, b1, b2, 1e-8, 0.0, 2).unwrap();
    let dupdates = Tensor::new(&[1., -1., 3.], &[3]);

    let grads =
        adam_backward_updates(&dupdates, &updates, &new_mu, &new_nu, b1, b2, 1e-8, 0.0, 2)
            .unwrap();
    assert!(grads.dnew_nu.to_vec().iter().all(|&x| x == 0.));
    assert!(grads.dnew_mu.to_vec().iter().all(|&x| x != 0.));
}

#[test]
fn test_backward_shape_mismatch() {
    let good = Tensor::zeros(&[2, 3]);
    let bad = Tensor::zeros(&[3, 2]);

    let result = adam_backward_mu(&good, &good, &bad, 0.9);
    assert_err!(
        result,
        AdamError::ShapeMismatch { operator: KernelOperator::BackwardMu, argument: "mu", .. }
    );

    let result = adam_backward_nu(&good, &bad, &good, 0.999);
    assert_err!(
        result,
        AdamError::ShapeMismatch { operator: KernelOperator::BackwardNu, argument: "updates", .. }
    );

    let result =
        adam_backward_updates(&good, &good, &good, &bad, 0.9, 0.999, 1e-8, 0.0, 1);
    assert_err!(
        result,
        AdamError::ShapeMismatch { operator: KernelOperator::BackwardUpdates, argument: "new_nu", expected, found }
            if expected == &[2, 3] && found == &[3, 2]
    );
}
