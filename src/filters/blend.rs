//! Separable blend modes and straight-alpha source-over compositing.
//!
//! Formulas follow the W3C Compositing and Blending Level 1 definitions,
//! with colour channels normalised to [0, 1].

use image::Rgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    SoftLight,
    HardLight,
    ColorDodge,
    ColorBurn,
    Difference,
    Exclusion,
}

impl BlendMode {
    pub const ALL: [BlendMode; 10] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::SoftLight,
        BlendMode::HardLight,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::Difference,
        BlendMode::Exclusion,
    ];

    /// Blend one backdrop channel `cb` with one source channel `cs`
    pub fn channel(&self, cb: f32, cs: f32) -> f32 {
        match self {
            BlendMode::Normal => cs,
            BlendMode::Multiply => cb * cs,
            BlendMode::Screen => screen(cb, cs),
            BlendMode::Overlay => hard_light(cs, cb),
            BlendMode::SoftLight => soft_light(cb, cs),
            BlendMode::HardLight => hard_light(cb, cs),
            BlendMode::ColorDodge => {
                if cb == 0.0 {
                    0.0
                } else if cs >= 1.0 {
                    1.0
                } else {
                    (cb / (1.0 - cs)).min(1.0)
                }
            }
            BlendMode::ColorBurn => {
                if cb >= 1.0 {
                    1.0
                } else if cs == 0.0 {
                    0.0
                } else {
                    1.0 - ((1.0 - cb) / cs).min(1.0)
                }
            }
            BlendMode::Difference => (cb - cs).abs(),
            BlendMode::Exclusion => cb + cs - 2.0 * cb * cs,
        }
    }
}

fn screen(cb: f32, cs: f32) -> f32 {
    cb + cs - cb * cs
}

fn hard_light(cb: f32, cs: f32) -> f32 {
    if cs <= 0.5 {
        cb * 2.0 * cs
    } else {
        screen(cb, 2.0 * cs - 1.0)
    }
}

fn soft_light(cb: f32, cs: f32) -> f32 {
    if cs <= 0.5 {
        cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
    } else {
        let d = if cb <= 0.25 {
            ((16.0 * cb - 12.0) * cb + 4.0) * cb
        } else {
            cb.sqrt()
        };
        cb + (2.0 * cs - 1.0) * (d - cb)
    }
}

/// Composite `src` over `dst` with an extra `opacity` in [0, 1].
///
/// A fully transparent source leaves `dst` bit-for-bit unchanged.
pub fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>, opacity: f32, mode: BlendMode) {
    let alpha_s = src[3] as f32 / 255.0 * opacity;
    if alpha_s <= 0.0 {
        return;
    }
    let alpha_b = dst[3] as f32 / 255.0;
    let alpha_o = alpha_s + alpha_b * (1.0 - alpha_s);
    if alpha_o <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }

    for channel in 0..3 {
        let cs = src[channel] as f32 / 255.0;
        let cb = dst[channel] as f32 / 255.0;
        let mixed = (1.0 - alpha_b) * cs + alpha_b * mode.channel(cb, cs);
        let out = (alpha_s * mixed + alpha_b * cb * (1.0 - alpha_s)) / alpha_o;
        dst[channel] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (alpha_o * 255.0).round().clamp(0.0, 255.0) as u8;
}
