use super::tolerance::clamp01;
use crate::model::Color;

/// Linear per-channel blend from `a` (w = 0) to `b` (w = 1).
pub fn blend(a: Color, b: Color, w: f64) -> Color {
    let w = if w.is_nan() { 0.0 } else { clamp01(w) };
    let mix = |p: u8, q: u8| -> u8 {
        let v = p as f64 + (q as f64 - p as f64) * w;
        v.round().max(0.0).min(255.0) as u8
    };
    Color {
        r: mix(a.r, b.r),
        g: mix(a.g, b.g),
        b: mix(a.b, b.b),
        a: mix(a.a, b.a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    #[test]
    fn endpoints_and_midpoint() {
        assert_eq!(blend(BLACK, WHITE, 0.0), BLACK);
        assert_eq!(blend(BLACK, WHITE, 1.0), WHITE);
        let mid = blend(BLACK, WHITE, 0.5);
        assert_eq!(mid.r, 128);
        assert_eq!(mid.a, 255);
    }

    #[test]
    fn out_of_range_weight_is_clamped() {
        assert_eq!(blend(BLACK, WHITE, 4.0), WHITE);
        assert_eq!(blend(BLACK, WHITE, -1.0), BLACK);
        assert_eq!(blend(BLACK, WHITE, f64::NAN), BLACK);
    }
}
