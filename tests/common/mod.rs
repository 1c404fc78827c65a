#![allow(dead_code)]

/// Deterministic pseudo-random bytes
pub struct Lcg(u32);

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self(seed)
    }

    pub fn next_u8(&mut self) -> u8 {
        self.0 = self.0.wrapping_mul(1103515245).wrapping_add(12345);
        (self.0 >> 16) as u8
    }
}

/// Random RGBA bytes, every channel including alpha
pub fn noise(width: usize, height: usize, seed: u32) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    (0..width * height * 4).map(|_| rng.next_u8()).collect()
}

/// Opaque smooth gradients with a little grain, resembles a photo
pub fn photo(width: usize, height: usize, seed: u32) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    let mut data = Vec::with_capacity(width * height * 4);

    for y in 0..height {
        for x in 0..width {
            let grain = rng.next_u8() / 16;
            data.extend_from_slice(&[
                ((x * 200 / width) as u8).saturating_add(grain),
                ((y * 200 / height) as u8).saturating_add(grain),
                ((x + y) * 100 / (width + height)) as u8 + 60,
                255,
            ]);
        }
    }

    data
}

/// 16x16 image with one RGB color and alpha going from 0 to 255
pub fn alpha_gradient() -> Vec<u8> {
    (0..256).flat_map(|a| [100, 150, 200, a as u8]).collect()
}
