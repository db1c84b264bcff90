//! RGB/HSV conversion for per-particle color jitter.
//!
//! All channels are in `0..=1`; hue is a fraction of a full turn.

use glam::Vec3;

pub fn rgb_to_hsv(rgb: Vec3) -> Vec3 {
    let max = rgb.max_element();
    let min = rgb.min_element();
    if max == min {
        return Vec3::new(0.0, 0.0, max);
    }

    let delta = max - min;
    let saturation = delta / max;
    let rc = (max - rgb.x) / delta;
    let gc = (max - rgb.y) / delta;
    let bc = (max - rgb.z) / delta;

    let hue = if rgb.x == max {
        bc - gc
    } else if rgb.y == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };

    Vec3::new((hue / 6.0).rem_euclid(1.0), saturation, max)
}

pub fn hsv_to_rgb(hsv: Vec3) -> Vec3 {
    let (h, s, v) = (hsv.x, hsv.y, hsv.z);
    if s == 0.0 {
        return Vec3::splat(v);
    }

    let hh = h.rem_euclid(1.0) * 6.0;
    // rem_euclid can round up to exactly 1.0
    let sector = (hh as u32).min(5);
    let f = hh - sector as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match sector {
        0 => Vec3::new(v, t, p),
        1 => Vec3::new(q, v, p),
        2 => Vec3::new(p, v, t),
        3 => Vec3::new(p, q, v),
        4 => Vec3::new(t, p, v),
        _ => Vec3::new(v, p, q),
    }
}

/// Shift `rgb` in HSV space. Hue wraps around, saturation and value clamp.
pub fn apply_hsv_offset(rgb: Vec3, offset: Vec3) -> Vec3 {
    let hsv = rgb_to_hsv(rgb) + offset;
    hsv_to_rgb(Vec3::new(
        hsv.x.rem_euclid(1.0),
        hsv.y.clamp(0.0, 1.0),
        hsv.z.clamp(0.0, 1.0),
    ))
}
