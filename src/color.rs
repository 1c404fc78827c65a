use crate::error::Error;

/// RGBA color
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn as_slice(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub(crate) fn from_slice(pix: &[u8]) -> Self {
        Self::new(pix[0], pix[1], pix[2], pix[3])
    }

    /// Drops `bits` least significant bits of every channel, replicating the
    /// high bits into the freed ones so that 255 stays 255. At least one
    /// bit is always kept.
    pub(crate) fn posterize(self, bits: u8) -> Self {
        if bits == 0 {
            return self;
        }

        let bits = bits.min(7);
        let kept = 8 - bits;

        let ch = |v: u8| -> u8 {
            let high = v & !((1u16 << bits) - 1) as u8;

            let mut out = high;
            let mut shift = kept;
            while shift < 8 {
                out |= high >> shift;
                shift += kept;
            }
            out
        };

        Self::new(ch(self.r), ch(self.g), ch(self.b), ch(self.a))
    }

    pub(crate) fn pack(self) -> u32 {
        u32::from_le_bytes(self.as_slice())
    }
}

/// Default sRGB-like gamma used when `0.0` is passed
pub const DEFAULT_GAMMA: f64 = 0.45455;

const INTERNAL_GAMMA: f64 = 0.5499;

pub(crate) const WEIGHT_R: f32 = 0.5;
pub(crate) const WEIGHT_G: f32 = 1.0;
pub(crate) const WEIGHT_B: f32 = 0.45;
pub(crate) const WEIGHT_A: f32 = 0.625;

/// Internal color: channels are gamma-adjusted, premultiplied by alpha and
/// scaled by perceptual weights, so plain squared euclidean distance is
/// the color difference.
pub(crate) type FColor = [f32; 4];

/// Resolves `0.0` to the default gamma and validates everything else.
pub(crate) fn normalize_gamma(gamma: f64) -> Result<f64, Error> {
    if gamma == 0.0 {
        return Ok(DEFAULT_GAMMA);
    }

    if !(gamma > 0.0 && gamma < 1.0) {
        return Err(Error::ValueOutOfRange);
    }

    Ok(gamma)
}

pub(crate) struct GammaLut {
    table: [f32; 256],
}

impl GammaLut {
    pub(crate) fn new(gamma: f64) -> Self {
        let exp = INTERNAL_GAMMA / gamma;
        let mut table = [0f32; 256];

        for (i, v) in table.iter_mut().enumerate() {
            *v = (i as f64 / 255.0).powf(exp) as f32;
        }

        Self { table }
    }

    pub(crate) fn to_f(&self, c: Color) -> FColor {
        let a = c.a as f32 / 255.0;

        [
            self.table[c.r as usize] * a * WEIGHT_R,
            self.table[c.g as usize] * a * WEIGHT_G,
            self.table[c.b as usize] * a * WEIGHT_B,
            a * WEIGHT_A,
        ]
    }
}

/// Inverse of [`GammaLut::to_f`] for the given gamma.
pub(crate) fn to_rgb(gamma: f64, px: &FColor) -> Color {
    let a = px[3] / WEIGHT_A;

    if a < 1.0 / 256.0 {
        return Color::default();
    }

    let exp = (gamma / INTERNAL_GAMMA) as f32;
    let ch = |v: f32, w: f32| -> u8 {
        ((v / w / a).clamp(0.0, 1.0).powf(exp) * 255.0).round() as u8
    };

    Color {
        r: ch(px[0], WEIGHT_R),
        g: ch(px[1], WEIGHT_G),
        b: ch(px[2], WEIGHT_B),
        a: (a * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}

pub(crate) fn alpha(px: &FColor) -> f32 {
    px[3] / WEIGHT_A
}

/// Premultiplied "over": `fg` composited onto `bg`.
pub(crate) fn composite_over(fg: &FColor, bg: &FColor) -> FColor {
    let k = 1.0 - alpha(fg);

    [
        fg[0] + bg[0] * k,
        fg[1] + bg[1] * k,
        fg[2] + bg[2] * k,
        fg[3] + bg[3] * k,
    ]
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub(crate) fn dist(c1: &FColor, c2: &FColor) -> f32 {
    unsafe {
        use std::arch::x86_64::*;

        let pc1 = _mm_loadu_ps(c1.as_ptr());
        let pc2 = _mm_loadu_ps(c2.as_ptr());

        let mut dist = _mm_sub_ps(pc1, pc2);
        dist = _mm_mul_ps(dist, dist);

        let mut tmp = [0f32; 4];
        _mm_storeu_ps(tmp.as_mut_ptr(), dist);

        tmp[0] + tmp[1] + tmp[2] + tmp[3]
    }
}

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
#[inline(always)]
pub(crate) fn dist(c1: &FColor, c2: &FColor) -> f32 {
    unsafe {
        use std::arch::aarch64::*;

        let pc1 = vld1q_f32(c1.as_ptr());
        let pc2 = vld1q_f32(c2.as_ptr());

        let mut dist = vsubq_f32(pc1, pc2);
        dist = vmulq_f32(dist, dist);

        vaddvq_f32(dist)
    }
}

#[cfg(not(any(target_arch = "x86_64", all(target_arch = "aarch64", target_feature = "neon"))))]
#[inline(always)]
pub(crate) fn dist(c1: &FColor, c2: &FColor) -> f32 {
    (c1[0] - c2[0]).powi(2) +
    (c1[1] - c2[1]).powi(2) +
    (c1[2] - c2[2]).powi(2) +
    (c1[3] - c2[3]).powi(2)
}
