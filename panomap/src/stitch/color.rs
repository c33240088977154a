//! Color math for seam blending.
//!
//! Blending happens in linear light (the sRGB transfer function is
//! decoded first) and interpolates in hue/saturation/value space rather
//! than raw RGB. A straight RGB lerp between dissimilar colors passes
//! through muddy desaturated midpoints, which shows up as a grey band
//! along every seam; moving through HSV keeps the midpoints vivid.
//!
//! Hue is interpolated along the shortest arc around the color wheel.
//! Alpha has no gamma and is interpolated linearly.

/// Decodes one 8-bit sRGB channel to linear light.
pub fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Encodes one linear-light channel back to 8-bit sRGB.
pub fn linear_to_srgb(channel: f32) -> u8 {
    let c = channel.clamp(0.0, 1.0);
    let encoded = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}

/// Linear RGB to HSV. Hue in degrees `[0, 360)`, saturation and value in
/// `[0, 1]`. The hue of a grey (zero-saturation) color is 0 by convention.
pub fn rgb_to_hsv(rgb: [f32; 3]) -> [f32; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta <= 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let saturation = if max <= 0.0 { 0.0 } else { delta / max };
    [hue, saturation, max]
}

/// HSV back to linear RGB. Accepts any hue; it is wrapped into
/// `[0, 360)` first.
pub fn hsv_to_rgb(hsv: [f32; 3]) -> [f32; 3] {
    let [h, s, v] = hsv;
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [r + m, g + m, b + m]
}

/// Interpolates between two linear RGBA colors through HSV space.
///
/// `t == 0` returns `from` and `t == 1` returns `to` exactly. Hue takes
/// the shortest arc between the two endpoints; saturation, value and
/// alpha interpolate linearly.
pub fn lerp_hsv(from: [f32; 4], to: [f32; 4], t: f32) -> [f32; 4] {
    if t <= 0.0 {
        return from;
    }
    if t >= 1.0 {
        return to;
    }

    let from_hsv = rgb_to_hsv([from[0], from[1], from[2]]);
    let to_hsv = rgb_to_hsv([to[0], to[1], to[2]]);

    let (mut from_hue, mut to_hue) = (from_hsv[0], to_hsv[0]);
    if (from_hue - to_hue).abs() > 180.0 {
        if to_hue > from_hue {
            from_hue += 360.0;
        } else {
            to_hue += 360.0;
        }
    }

    let hue = (from_hue + (to_hue - from_hue) * t).rem_euclid(360.0);
    let saturation = from_hsv[1] + (to_hsv[1] - from_hsv[1]) * t;
    let value = from_hsv[2] + (to_hsv[2] - from_hsv[2]) * t;
    let alpha = from[3] + (to[3] - from[3]) * t;

    let [r, g, b] = hsv_to_rgb([hue, saturation, value]);
    [r, g, b, alpha]
}
