//! RGB to HSV conversion and hue-band tests.

/// HSV color representation
/// - H (hue): 0.0-360.0 degrees
/// - S (saturation): 0.0-1.0
/// - V (value): 0.0-1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

/// Convert 8-bit RGB to HSV.
///
/// Achromatic pixels (all channels equal) get hue 0 and saturation 0.
/// Black has saturation 0.
#[inline]
#[must_use]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = f32::from(max - min);
    let v = f32::from(max) / 255.0;

    if max == min {
        return Hsv { h: 0.0, s: 0.0, v };
    }

    let s = delta / f32::from(max);

    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let h = if max == r {
        let mut h = (gf - bf) / delta;
        if g < b {
            h += 6.0;
        }
        h * 60.0
    } else if max == g {
        ((bf - rf) / delta + 2.0) * 60.0
    } else {
        ((rf - gf) / delta + 4.0) * 60.0
    };

    Hsv {
        h: h % 360.0,
        s,
        v,
    }
}

/// Whether `hue` lies in the inclusive band `[min, max]`.
///
/// When `min > max` the band wraps through 0 degrees, so
/// `in_hue_band(350.0, 340.0, 40.0)` and `in_hue_band(10.0, 340.0, 40.0)`
/// are both true.
#[must_use]
pub fn in_hue_band(hue: f32, min: f32, max: f32) -> bool {
    if min <= max {
        (min..=max).contains(&hue)
    } else {
        hue >= min || hue <= max
    }
}
