//! Finite difference Jacobian computation.

use nalgebra::{DMatrix, DVector};

use crate::error::SimResult;

/// Default relative perturbation: square root of machine epsilon.
pub const FD_EPSILON: f64 = 1.490_116_119_384_765_6e-8;

/// Compute Jacobian using forward finite differences.
///
/// For each column j, perturbs x[j] by epsilon and computes (f(x+e) - f(x))/epsilon.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SimResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SimResult<DVector<f64>>,
{
    let f_x = f(x)?;
    finite_difference_jacobian_at(x, &f_x, f, epsilon)
}

/// Forward differences around a point whose value `f_x` is already known.
pub fn finite_difference_jacobian_at<F>(
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SimResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SimResult<DVector<f64>>,
{
    let n = x.len();
    let m = f_x.len();

    let mut jac = DMatrix::zeros(m, n);
    let mut x_perturbed = x.clone();

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);
        x_perturbed[j] = x[j] + dx;

        let f_perturbed = f(&x_perturbed)?;
        let df = (f_perturbed - f_x) / dx;
        jac.set_column(j, &df);

        x_perturbed[j] = x[j];
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_linear() {
        // f(x) = A*x, so J = A
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, -1.0, 3.0]);
        let x = DVector::from_vec(vec![1.0, 2.0]);
        let f = |v: &DVector<f64>| -> SimResult<DVector<f64>> { Ok(&a * v) };

        let jac = finite_difference_jacobian(&x, f, FD_EPSILON).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert!((jac[(i, j)] - a[(i, j)]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn jacobian_nonlinear() {
        // f(x) = [x0^2, x0*x1]
        let x = DVector::from_vec(vec![3.0, 2.0]);
        let f = |v: &DVector<f64>| -> SimResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![v[0] * v[0], v[0] * v[1]]))
        };
        let jac = finite_difference_jacobian(&x, f, FD_EPSILON).unwrap();
        assert!((jac[(0, 0)] - 6.0).abs() < 1e-5);
        assert!(jac[(0, 1)].abs() < 1e-5);
        assert!((jac[(1, 0)] - 2.0).abs() < 1e-5);
        assert!((jac[(1, 1)] - 3.0).abs() < 1e-5);
    }
}
