use crate::color::{alpha, composite_over, dist, Color, FColor, GammaLut, WEIGHT_A, WEIGHT_B, WEIGHT_G, WEIGHT_R};
use crate::colormap::Colormap;
use crate::error::Error;
use crate::image::Image;
use crate::progress::Phase;

fn buffer<T: Clone>(len: usize, value: T) -> Result<Vec<T>, Error> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, value);
    Ok(buf)
}

/// Reads image rows as internal colors, composited over the background
struct RowReader<'a, 'pixels> {
    image: &'a Image<'pixels>,
    lut: GammaLut,
    tmp: Vec<Color>,
    background: Option<(&'a Image<'pixels>, GammaLut)>,
    bg_tmp: Vec<Color>,
    bg_row: Vec<FColor>,
}

impl<'a, 'pixels> RowReader<'a, 'pixels> {
    fn new(image: &'a Image<'pixels>) -> Result<Self, Error> {
        let width = image.width();
        let background = image.background().map(|bg| (bg, GammaLut::new(bg.gamma())));

        let bg_len = if background.is_some() { width } else { 0 };

        Ok(Self {
            image,
            lut: GammaLut::new(image.gamma()),
            tmp: buffer(width, Color::default())?,
            background,
            bg_tmp: buffer(bg_len, Color::default())?,
            bg_row: buffer(bg_len, [0f32; 4])?,
        })
    }

    fn read(&mut self, y: usize, row: &mut [FColor]) {
        self.image.fill_row_f(y, &self.lut, &mut self.tmp, row);

        if let Some((bg, lut)) = &self.background {
            bg.fill_row_f(y, lut, &mut self.bg_tmp, &mut self.bg_row);

            for (px, bg_px) in row.iter_mut().zip(self.bg_row.iter()) {
                if alpha(px) < 1.0 {
                    *px = composite_over(px, bg_px);
                }
            }
        }
    }
}

#[inline]
fn len_sq(c: &FColor) -> f32 {
    c[0] * c[0] + c[1] * c[1] + c[2] * c[2] + c[3] * c[3]
}

#[inline]
fn scale(c: &mut FColor, k: f32) {
    for v in c.iter_mut() {
        *v *= k;
    }
}

#[inline]
fn add_scaled(dst: &mut FColor, src: &FColor, k: f32) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d += s * k;
    }
}

/// Keeps a dithered color within valid premultiplied bounds
#[inline]
fn clamp_color(c: &FColor) -> FColor {
    let a = c[3].clamp(0.0, WEIGHT_A);
    let frac = a / WEIGHT_A;

    [
        c[0].clamp(0.0, WEIGHT_R * frac),
        c[1].clamp(0.0, WEIGHT_G * frac),
        c[2].clamp(0.0, WEIGHT_B * frac),
        a,
    ]
}

/// Maps images to palette indices
pub(crate) struct Remapper<'a> {
    pub colormap: &'a Colormap,
    pub dithering_level: f32,
    /// Errors above this are damped so they don't smear across the image
    pub max_dither_error: f32,
}

impl Remapper<'_> {
    /// Writes one index per pixel, returns the mean squared error between
    /// source pixels and the chosen palette colors.
    pub(crate) fn remap(&self, image: &Image, out: &mut [u8], phase: &mut Phase) -> Result<f64, Error> {
        let width = image.width();
        let height = image.height();

        let mut reader = RowReader::new(image)?;
        let mut row = buffer(width, [0f32; 4])?;

        let mut total_error = 0f64;

        if self.dithering_level > 0.0 {
            let mut error_curr = buffer(width + 2, [0f32; 4])?;
            let mut error_next = buffer(width + 2, [0f32; 4])?;

            for y in 0..height {
                reader.read(y, &mut row);

                total_error += self.dither_row(image, y, &row, &mut out[y * width..(y + 1) * width], &mut error_curr, &mut error_next);

                std::mem::swap(&mut error_curr, &mut error_next);
                error_next.fill([0f32; 4]);

                phase.step(y + 1, height)?;
            }
        } else {
            let mut last_ind = 0;

            for y in 0..height {
                reader.read(y, &mut row);

                for (px, ind_out) in row.iter().zip(out[y * width..(y + 1) * width].iter_mut()) {
                    let (ind, distance_sq) = self.colormap.nearest(px, last_ind);

                    *ind_out = ind as u8;
                    last_ind = ind;
                    total_error += distance_sq as f64;
                }

                phase.step(y + 1, height)?;
            }
        }

        Ok(total_error / (width * height) as f64)
    }

    /// Serpentine Floyd-Steinberg, odd rows go right to left
    fn dither_row(&self, image: &Image, y: usize, row: &[FColor], out: &mut [u8], error_curr: &mut [FColor], error_next: &mut [FColor]) -> f64 {
        let width = row.len();
        let reverse = y % 2 == 1;
        let coeff = self.dithering_level * 15.0 / 16.0 / 16.0;
        let importance = image.importance_map().map(|m| &m[y * width..(y + 1) * width]);

        let mut total_error = 0f64;
        let mut last_ind = 0;

        for i in 0..width {
            let x = if reverse { width - 1 - i } else { i };
            let px = &row[x];

            let err_ind = x + 1;
            let (back, fwd) = if reverse { (err_ind + 1, err_ind - 1) } else { (err_ind - 1, err_ind + 1) };

            // Error is invisible on fully transparent pixels
            if px[3] <= 0.0 {
                let (ind, distance_sq) = self.colormap.nearest(px, last_ind);
                out[x] = ind as u8;
                last_ind = ind;
                total_error += distance_sq as f64;
                continue;
            }

            let mut err = error_curr[err_ind];
            if len_sq(&err) > self.max_dither_error {
                scale(&mut err, 0.8);
            }

            let mut target = *px;
            add_scaled(&mut target, &err, 1.0);
            let target = clamp_color(&target);

            let (ind, _) = self.colormap.nearest(&target, last_ind);
            out[x] = ind as u8;
            last_ind = ind;

            let pal = self.colormap.color(ind);
            total_error += dist(pal, px) as f64;

            let mut diff = [
                target[0] - pal[0],
                target[1] - pal[1],
                target[2] - pal[2],
                target[3] - pal[3],
            ];

            if len_sq(&diff) > self.max_dither_error {
                scale(&mut diff, 0.75);
            }

            let weight = importance.map_or(1.0, |m| m[x] as f32 / 255.0);
            scale(&mut diff, coeff * weight);

            add_scaled(&mut error_curr[fwd], &diff, 7.0);
            add_scaled(&mut error_next[back], &diff, 3.0);
            add_scaled(&mut error_next[err_ind], &diff, 5.0);
            add_scaled(&mut error_next[fwd], &diff, 1.0);
        }

        total_error
    }
}
