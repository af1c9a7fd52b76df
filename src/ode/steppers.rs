//! Single-step integrators: explicit Euler, classical RK4 and the
//! Dormand–Prince 5(4) embedded pair used for adaptive stepping.

use super::OdeSystem;
use nalgebra::SVector;

pub fn euler_step<S: OdeSystem<D>, const D: usize>(
    system: &S,
    t: f64,
    y: &SVector<f64, D>,
    h: f64,
) -> SVector<f64, D> {
    y + system.derivative(t, y) * h
}

pub fn rk4_step<S: OdeSystem<D>, const D: usize>(
    system: &S,
    t: f64,
    y: &SVector<f64, D>,
    h: f64,
) -> SVector<f64, D> {
    let half = h / 2.0;
    let k1 = system.derivative(t, y);
    let k2 = system.derivative(t + half, &(y + k1 * half));
    let k3 = system.derivative(t + half, &(y + k2 * half));
    let k4 = system.derivative(t + h, &(y + k3 * h));
    y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
}

// Dormand–Prince tableau
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th order weights (also the last stage row, FSAL)
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between the 5th and embedded 4th order weights
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

/// One Dormand–Prince step. Returns the 5th order solution and the local
/// error estimate (difference to the embedded 4th order solution).
pub fn dopri_step<S: OdeSystem<D>, const D: usize>(
    system: &S,
    t: f64,
    y: &SVector<f64, D>,
    h: f64,
) -> (SVector<f64, D>, SVector<f64, D>) {
    let k1 = system.derivative(t, y);
    let k2 = system.derivative(t + C2 * h, &(y + k1 * (A21 * h)));
    let k3 = system.derivative(t + C3 * h, &(y + (k1 * A31 + k2 * A32) * h));
    let k4 = system.derivative(t + C4 * h, &(y + (k1 * A41 + k2 * A42 + k3 * A43) * h));
    let k5 = system.derivative(
        t + C5 * h,
        &(y + (k1 * A51 + k2 * A52 + k3 * A53 + k4 * A54) * h),
    );
    let k6 = system.derivative(
        t + h,
        &(y + (k1 * A61 + k2 * A62 + k3 * A63 + k4 * A64 + k5 * A65) * h),
    );
    let y_new = y + (k1 * B1 + k3 * B3 + k4 * B4 + k5 * B5 + k6 * B6) * h;
    let k7 = system.derivative(t + h, &y_new);
    let err = (k1 * E1 + k3 * E3 + k4 * E4 + k5 * E5 + k6 * E6 + k7 * E7) * h;
    (y_new, err)
}

/// RMS of the error scaled by the mixed absolute/relative tolerance.
pub fn error_norm<const D: usize>(
    err: &SVector<f64, D>,
    y: &SVector<f64, D>,
    y_new: &SVector<f64, D>,
    rtol: f64,
    atol: f64,
) -> f64 {
    if D == 0 {
        return 0.0;
    }
    let sum: f64 = (0..D)
        .map(|i| {
            let scale = atol + rtol * y[i].abs().max(y_new[i].abs());
            let e = err[i] / scale;
            e * e
        })
        .sum();
    (sum / D as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector1;

    struct Decay;

    impl OdeSystem<1> for Decay {
        fn derivative(&self, _t: f64, y: &Vector1<f64>) -> Vector1<f64> {
            -y
        }
    }

    #[test]
    fn test_euler_single_step() {
        let y = euler_step(&Decay, 0.0, &Vector1::new(1.0), 0.1);
        assert!((y[0] - 0.9).abs() < 1e-15);
    }

    #[test]
    fn test_rk4_matches_exponential() {
        let y = rk4_step(&Decay, 0.0, &Vector1::new(1.0), 0.1);
        assert!((y[0] - (-0.1f64).exp()).abs() < 1e-6);
    }

    #[test]
    fn test_dopri_error_estimate_is_small() {
        let (y, err) = dopri_step(&Decay, 0.0, &Vector1::new(1.0), 0.1);
        assert!((y[0] - (-0.1f64).exp()).abs() < 1e-8);
        assert!(err[0].abs() < 1e-6);
    }

    #[test]
    fn test_error_norm_scaling() {
        let err = Vector1::new(1e-6);
        let y = Vector1::new(0.0);
        let norm = error_norm(&err, &y, &y, 1e-3, 1e-6);
        assert!((norm - 1.0).abs() < 1e-12);
    }
}
