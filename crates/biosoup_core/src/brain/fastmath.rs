/// Rational tanh approximation, exact at the ±4 clamp.
#[inline]
pub fn fast_tanh(x: f32) -> f32 {
    if x > 4.0 {
        return 1.0;
    }
    if x < -4.0 {
        return -1.0;
    }
    let x2 = x * x;
    x * (27.0 + x2) / (27.0 + 9.0 * x2)
}

#[inline]
pub fn saturate01(x: f32) -> f32 {
    if x <= 0.0 {
        0.0
    } else if x >= 1.0 {
        1.0
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_tanh_tracks_tanh() {
        for i in -40..=40 {
            let x = i as f32 * 0.1;
            assert!((fast_tanh(x) - x.tanh()).abs() < 0.03, "x = {x}");
        }
        assert_eq!(fast_tanh(100.0), 1.0);
        assert_eq!(fast_tanh(-100.0), -1.0);
        assert_eq!(fast_tanh(0.0), 0.0);
    }

    #[test]
    fn test_saturate01() {
        assert_eq!(saturate01(-1.0), 0.0);
        assert_eq!(saturate01(0.25), 0.25);
        assert_eq!(saturate01(7.0), 1.0);
    }
}
