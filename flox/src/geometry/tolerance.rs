// Numeric guards shared by the metric functions

pub const EPS_DENOM: f64 = 1e-12; // denominator guard for ratios

#[inline] pub fn clamp01(x: f64) -> f64 { x.max(0.0).min(1.0) }
#[inline] pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool { (a - b).abs() <= eps }

#[inline]
pub fn safe_div(num: f64, den: f64, fallback: f64) -> f64 {
    if den.abs() <= EPS_DENOM || !den.is_finite() { fallback } else { num/den }
}
