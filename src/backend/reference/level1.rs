//! Reference Level 1 kernels.
//!
//! Straight loops over [`RawVector`] operands; correct for any increment,
//! including negative ones. The rotation constructors follow the reference
//! BLAS algorithms (`?rotg`, `?rotmg`, `?rotm`).

use crate::kernel::{RawVector, RawVectorMut};
use crate::scalar::{BlasReal, BlasScalar};
use num_traits::{Float, One, Zero};

/// Index of the first element with the largest `|re| + |im|`.
pub unsafe fn iamax<T: BlasScalar>(x: RawVector<T>) -> usize {
    let mut best = 0;
    let mut max = x.get(0).abs1();
    for i in 1..x.len {
        let v = x.get(i).abs1();
        if v > max {
            max = v;
            best = i;
        }
    }
    best
}

/// Index of the first element with the smallest `|re| + |im|`.
pub unsafe fn iamin<T: BlasScalar>(x: RawVector<T>) -> usize {
    let mut best = 0;
    let mut min = x.get(0).abs1();
    for i in 1..x.len {
        let v = x.get(i).abs1();
        if v < min {
            min = v;
            best = i;
        }
    }
    best
}

/// Givens rotation: `[a, b, c, s]` becomes `[r, z, c, s]`.
pub unsafe fn rotg<T: BlasReal>(abcs: RawVectorMut<T>) {
    let a = abcs.get(0);
    let b = abcs.get(1);
    let roe = if a.abs() > b.abs() { a } else { b };
    let scale = a.abs() + b.abs();
    let (r, z, c, s) = if scale.is_zero() {
        (T::zero(), T::zero(), T::one(), T::zero())
    } else {
        let (sa, sb) = (a / scale, b / scale);
        let r = (scale * (sa * sa + sb * sb).sqrt()).copysign(roe);
        let c = a / r;
        let s = b / r;
        let z = if a.abs() > b.abs() {
            s
        } else if !c.is_zero() {
            T::one() / c
        } else {
            T::one()
        };
        (r, z, c, s)
    };
    abcs.set(0, r);
    abcs.set(1, z);
    abcs.set(2, c);
    abcs.set(3, s);
}

/// Modified Givens construction.
///
/// `args = [d1, d2, x1, y1]`; `param = [flag, h11, h21, h12, h22]`.
pub unsafe fn rotmg<T: BlasReal>(args: RawVectorMut<T>, param: RawVectorMut<T>) {
    let gam = T::constant(4096.0);
    let gamsq = T::constant(16_777_216.0);
    let rgamsq = T::constant(5.960_464_5e-8);
    let zero = T::zero();
    let one = T::one();

    let mut d1 = args.get(0);
    let mut d2 = args.get(1);
    let mut x1 = args.get(2);
    let y1 = args.get(3);

    let (mut h11, mut h21, mut h12, mut h22) = (zero, zero, zero, zero);
    let mut flag;

    if d1 < zero {
        flag = -one;
        d1 = zero;
        d2 = zero;
        x1 = zero;
    } else {
        let p2 = d2 * y1;
        if p2.is_zero() {
            param.set(0, -T::constant(2.0));
            return;
        }
        let p1 = d1 * x1;
        let q2 = p2 * y1;
        let q1 = p1 * x1;

        if q1.abs() > q2.abs() {
            h21 = -y1 / x1;
            h12 = p2 / p1;
            let u = one - h12 * h21;
            if u > zero {
                flag = zero;
                d1 = d1 / u;
                d2 = d2 / u;
                x1 = x1 * u;
            } else {
                flag = -one;
                h11 = zero;
                h21 = zero;
                h12 = zero;
                h22 = zero;
                d1 = zero;
                d2 = zero;
                x1 = zero;
            }
        } else if q2 < zero {
            flag = -one;
            h11 = zero;
            h21 = zero;
            h12 = zero;
            h22 = zero;
            d1 = zero;
            d2 = zero;
            x1 = zero;
        } else {
            flag = one;
            h11 = p1 / p2;
            h22 = x1 / y1;
            let u = one + h11 * h22;
            let temp = d2 / u;
            d2 = d1 / u;
            d1 = temp;
            x1 = y1 * u;
        }

        // Convert the flag 0/1 forms to the full matrix before rescaling.
        let expand = |flag: &mut T, h11: &mut T, h21: &mut T, h12: &mut T, h22: &mut T| {
            if *flag >= zero {
                if flag.is_zero() {
                    *h11 = one;
                    *h22 = one;
                } else {
                    *h21 = -one;
                    *h12 = one;
                }
                *flag = -one;
            }
        };

        if !d1.is_zero() {
            while d1 <= rgamsq || d1 >= gamsq {
                expand(&mut flag, &mut h11, &mut h21, &mut h12, &mut h22);
                if d1 <= rgamsq {
                    d1 = d1 * gam * gam;
                    x1 = x1 / gam;
                    h11 = h11 / gam;
                    h12 = h12 / gam;
                } else {
                    d1 = d1 / (gam * gam);
                    x1 = x1 * gam;
                    h11 = h11 * gam;
                    h12 = h12 * gam;
                }
            }
        }

        if !d2.is_zero() {
            while d2.abs() <= rgamsq || d2.abs() >= gamsq {
                expand(&mut flag, &mut h11, &mut h21, &mut h12, &mut h22);
                if d2.abs() <= rgamsq {
                    d2 = d2 * gam * gam;
                    h21 = h21 / gam;
                    h22 = h22 / gam;
                } else {
                    d2 = d2 / (gam * gam);
                    h21 = h21 * gam;
                    h22 = h22 * gam;
                }
            }
        }
    }

    if flag < zero {
        param.set(1, h11);
        param.set(2, h21);
        param.set(3, h12);
        param.set(4, h22);
    } else if flag.is_zero() {
        param.set(2, h21);
        param.set(3, h12);
    } else {
        param.set(1, h11);
        param.set(4, h22);
    }
    param.set(0, flag);
    args.set(0, d1);
    args.set(1, d2);
    args.set(2, x1);
}

/// Apply a modified Givens rotation.
pub unsafe fn rotm<T: BlasReal>(x: RawVectorMut<T>, y: RawVectorMut<T>, param: RawVector<T>) {
    let flag = param.get(0);
    if flag == -T::constant(2.0) {
        return;
    }
    let (h11, h21, h12, h22) = (param.get(1), param.get(2), param.get(3), param.get(4));
    for i in 0..x.len {
        let w = x.get(i);
        let z = y.get(i);
        let (xi, yi) = if flag < T::zero() {
            (w * h11 + z * h12, w * h21 + z * h22)
        } else if flag.is_zero() {
            (w + z * h12, w * h21 + z)
        } else {
            (w * h11 + z, -w + h22 * z)
        };
        x.set(i, xi);
        y.set(i, yi);
    }
}

pub unsafe fn swap<T: BlasScalar>(x: RawVectorMut<T>, y: RawVectorMut<T>) {
    for i in 0..x.len {
        let t = x.get(i);
        x.set(i, y.get(i));
        y.set(i, t);
    }
}

pub unsafe fn copy<T: BlasScalar>(x: RawVector<T>, y: RawVectorMut<T>) {
    for i in 0..x.len {
        y.set(i, x.get(i));
    }
}

/// `Σ conj(x[i]) * y[i]`.
pub unsafe fn dot<T: BlasScalar>(x: RawVector<T>, y: RawVector<T>) -> T {
    let mut acc = T::zero();
    for i in 0..x.len {
        acc = acc + x.get(i).conj() * y.get(i);
    }
    acc
}

/// Euclidean norm by scaled sum of squares; does not overflow or underflow
/// for finite inputs whose norm is representable.
pub unsafe fn nrm2<T: BlasScalar>(x: RawVector<T>) -> T::Real {
    let mut scale = T::Real::zero();
    let mut ssq = T::Real::one();
    let mut accumulate = |v: T::Real| {
        if !v.is_zero() {
            let a = v.abs();
            if scale < a {
                let r = scale / a;
                ssq = T::Real::one() + ssq * r * r;
                scale = a;
            } else {
                let r = a / scale;
                ssq = ssq + r * r;
            }
        }
    };
    for i in 0..x.len {
        let v = x.get(i);
        accumulate(v.re());
        accumulate(v.im());
    }
    scale * ssq.sqrt()
}

/// `Σ |re| + |im|`.
pub unsafe fn asum<T: BlasScalar>(x: RawVector<T>) -> T::Real {
    let mut acc = T::Real::zero();
    for i in 0..x.len {
        acc = acc + x.get(i).abs1();
    }
    acc
}

pub unsafe fn sum<T: BlasScalar>(x: RawVector<T>) -> T {
    let mut acc = T::zero();
    for i in 0..x.len {
        acc = acc + x.get(i);
    }
    acc
}

/// Plane rotation with real `c`, `s`.
pub unsafe fn rot<T: BlasScalar>(x: RawVectorMut<T>, y: RawVectorMut<T>, c: T::Real, s: T::Real) {
    for i in 0..x.len {
        let xi = x.get(i);
        let yi = y.get(i);
        x.set(i, xi.scale_real(c) + yi.scale_real(s));
        y.set(i, yi.scale_real(c) - xi.scale_real(s));
    }
}

pub unsafe fn scal<T: BlasScalar>(alpha: T, x: RawVectorMut<T>) {
    for i in 0..x.len {
        x.set(i, alpha * x.get(i));
    }
}

pub unsafe fn axpy<T: BlasScalar>(alpha: T, x: RawVector<T>, y: RawVectorMut<T>) {
    if alpha.is_zero() {
        return;
    }
    for i in 0..x.len {
        y.set(i, alpha * x.get(i) + y.get(i));
    }
}

/// `y = alpha * x + beta * y`; `y` is not read when `beta == 0`.
pub unsafe fn axpby<T: BlasScalar>(alpha: T, x: RawVector<T>, beta: T, y: RawVectorMut<T>) {
    if beta.is_zero() {
        for i in 0..x.len {
            y.set(i, alpha * x.get(i));
        }
    } else {
        for i in 0..x.len {
            y.set(i, alpha * x.get(i) + beta * y.get(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    fn raw<T>(data: &[T]) -> RawVector<T> {
        RawVector {
            ptr: data.as_ptr(),
            len: data.len(),
            inc: 1,
        }
    }

    fn raw_mut<T>(data: &mut [T]) -> RawVectorMut<T> {
        RawVectorMut {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            inc: 1,
        }
    }

    #[test]
    fn test_iamax_ties_go_to_first() {
        let x = [1.0, -3.0, 3.0, 2.0];
        assert_eq!(unsafe { iamax(raw(&x)) }, 1);
        assert_eq!(unsafe { iamin(raw(&x)) }, 0);
        let z = [Complex64::new(1.0, 1.0), Complex64::new(0.0, 2.5), Complex64::new(-2.0, 0.5)];
        assert_eq!(unsafe { iamax(raw(&z)) }, 1);
    }

    #[test]
    fn test_rotg_classic() {
        let mut abcs = [3.0f64, 4.0, 0.0, 0.0];
        unsafe { rotg(raw_mut(&mut abcs)) };
        let [r, z, c, s] = abcs;
        assert_relative_eq!(r, 5.0);
        assert_relative_eq!(c, 0.6);
        assert_relative_eq!(s, 0.8);
        // |b| >= |a| and c != 0: z = 1/c
        assert_relative_eq!(z, 1.0 / 0.6);

        let mut zero = [0.0f64, 0.0, 9.0, 9.0];
        unsafe { rotg(raw_mut(&mut zero)) };
        assert_eq!(zero, [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_rotmg_then_rotm_zeroes_y() {
        let (d1, d2, x1, y1) = (2.0f64, 3.0, 1.5, 0.7);
        let mut args = [d1, d2, x1, y1];
        let mut param = [0.0f64; 5];
        unsafe { rotmg(raw_mut(&mut args), raw_mut(&mut param)) };

        let mut x = [x1];
        let mut y = [y1];
        unsafe { rotm(raw_mut(&mut x), raw_mut(&mut y), raw(&param)) };
        assert_relative_eq!(y[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(x[0], args[2], epsilon = 1e-12);
        // The scaled rotation preserves the weighted norm d1*x^2 + d2*y^2.
        assert_relative_eq!(
            args[0] * args[2] * args[2],
            d1 * x1 * x1 + d2 * y1 * y1,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_rotmg_negative_d1_zeroes_everything() {
        let mut args = [-1.0f64, 2.0, 3.0, 4.0];
        let mut param = [9.0f64; 5];
        unsafe { rotmg(raw_mut(&mut args), raw_mut(&mut param)) };
        assert_eq!(param, [-1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(&args[..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rotmg_zero_p2_sets_identity_flag() {
        let mut args = [1.0f64, 2.0, 3.0, 0.0];
        let mut param = [0.0f64; 5];
        unsafe { rotmg(raw_mut(&mut args), raw_mut(&mut param)) };
        assert_eq!(param[0], -2.0);
        assert_eq!(args, [1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_nrm2_extremes() {
        let big = [f64::MAX / 2.0, f64::MAX / 2.0];
        let n = unsafe { nrm2(raw(&big)) };
        assert_relative_eq!(n, f64::MAX / 2.0 * 2f64.sqrt(), max_relative = 1e-12);
        let tiny = [3e-300 * 1e-10, 4e-300 * 1e-10];
        let n = unsafe { nrm2(raw(&tiny)) };
        assert_relative_eq!(n, 5e-310, max_relative = 1e-6);
    }

    #[test]
    fn test_complex_dot_conjugates_first() {
        let x = [Complex64::new(1.0, 2.0)];
        let y = [Complex64::new(3.0, 4.0)];
        // conj(1+2i) * (3+4i) = (1-2i)(3+4i) = 11 - 2i
        assert_eq!(unsafe { dot(raw(&x), raw(&y)) }, Complex64::new(11.0, -2.0));
    }

    #[test]
    fn test_axpby_beta_zero_ignores_nan() {
        let x = [1.0, 2.0];
        let mut y = [f64::NAN, f64::INFINITY];
        unsafe { axpby(2.0, raw(&x), 0.0, raw_mut(&mut y)) };
        assert_eq!(y, [2.0, 4.0]);
    }
}
