//! Standard normal helpers.
//!
//! Draws use the Box-Muller transform; quantiles use Acklam's rational
//! approximation, accurate to about `1.15e-9` relative error.

use std::f64::consts::PI;

use rand::Rng;

/// Smallest uniform draw fed to the logarithm in Box-Muller.
const MIN_UNIFORM: f64 = 1e-300;

/// Draw one sample from `N(0, 1)`.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.random::<f64>().max(MIN_UNIFORM);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Quantile function of `N(0, 1)`.
///
/// `p` is clamped to `[1e-15, 1 - 1e-15]` so the tails stay finite.
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_690e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;
    const P_HIGH: f64 = 1.0 - P_LOW;

    let p = p.clamp(1e-15, 1.0 - 1e-15);

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt(), &C, &D)
    } else if p <= P_HIGH {
        let q = p - 0.5;
        let r = q * q;
        horner(r, &A) * q / horner(r, &B).mul_add(r, 1.0)
    } else {
        -tail((-2.0 * (1.0 - p).ln()).sqrt(), &C, &D)
    }
}

fn tail(q: f64, c: &[f64; 6], d: &[f64; 4]) -> f64 {
    horner(q, c) / horner(q, d).mul_add(q, 1.0)
}

/// Evaluate a polynomial with coefficients in descending order.
fn horner(x: f64, coefficients: &[f64]) -> f64 {
    coefficients
        .iter()
        .fold(0.0, |acc, &coefficient| acc.mul_add(x, coefficient))
}
