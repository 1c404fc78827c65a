use std::collections::HashMap;

use crate::attr::Attr;
use crate::color::{normalize_gamma, Color, FColor, GammaLut};
use crate::error::Error;
use crate::image::Image;
use crate::progress::Phase;
use crate::quantize::QuantizeResult;

/// Past this, posterization would drop most of the color information
const MAX_POSTERIZATION: u8 = 4;

/// Number of pixels in a given color.
///
/// Used to build a histogram from precomputed statistics, see
/// [`Histogram::add_colors`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistogramEntry {
    pub color: Color,
    pub count: u32,
}

impl HistogramEntry {
    pub fn new(color: Color, count: u32) -> Self {
        Self { color, count }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct HistKey {
    color: u32,
    gamma: u64,
}

#[derive(Clone, Copy)]
struct HistValue {
    color: Color,
    gamma: f64,
    weight: f64,
}

/// Weighted color ready for clustering
#[derive(Clone, Copy, Debug)]
pub(crate) struct HistItem {
    pub color: FColor,
    pub weight: f32,
}

/// Colors fed to palette generation
pub(crate) struct Items {
    pub items: Vec<HistItem>,
    pub fixed: Vec<FixedColor>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct FixedColor {
    pub color: Color,
    pub gamma: f64,
    pub f: FColor,
}

/// Generates one shared palette for multiple images.
pub struct Histogram {
    map: HashMap<HistKey, HistValue>,
    fixed_colors: Vec<(Color, f64)>,
    posterize_bits: u8,
    max_entries: usize,
    has_bitmap: bool,
}

impl Histogram {
    /// Creates an empty histogram.
    ///
    /// Options should be set on `attr` before the histogram is created.
    pub fn new(attr: &Attr) -> Self {
        Self {
            map: HashMap::new(),
            fixed_colors: vec![],
            posterize_bits: attr.input_posterization(),
            max_entries: attr.max_histogram_entries(),
            has_bitmap: false,
        }
    }

    /// Number of distinct colors collected so far
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty() && self.fixed_colors.is_empty()
    }

    pub(crate) fn has_bitmap(&self) -> bool {
        self.has_bitmap
    }

    /// "Learns" colors from the image.
    ///
    /// Fixed colors of the image are added to the histogram as well.
    pub fn add_image(&mut self, attr: &Attr, image: &Image) -> Result<(), Error> {
        self.add_image_reporting(attr, image, &mut Phase::new(attr.progress_callback(), 0.0, 0.0))
    }

    /// Counts the image into a scratch map first, so a failure (an abort
    /// from the progress callback included) leaves the histogram as it was.
    pub(crate) fn add_image_reporting(&mut self, attr: &Attr, image: &Image, phase: &mut Phase) -> Result<(), Error> {
        if self.fixed_colors.len() + image.fixed_colors().len() > 256 {
            return Err(Error::Unsupported);
        }

        let mut bits = self.posterize_bits.max(attr.input_posterization());

        let width = image.width();
        let height = image.height();
        let gamma = image.gamma();
        let importance = image.importance_map();

        let mut row = Vec::new();
        row.try_reserve_exact(width)?;
        row.resize(width, Color::default());

        let mut scratch = HashMap::new();

        for y in 0..height {
            image.fill_row(y, &mut row);

            for (x, c) in row.iter().enumerate() {
                let weight = match importance {
                    Some(map) => map[y * width + x] as f64 / 255.0,
                    None => 1.0,
                };

                if weight > 0.0 {
                    insert(&mut scratch, bits, *c, gamma, weight);
                }
            }

            if self.map.len() + scratch.len() > self.max_entries && bits < MAX_POSTERIZATION {
                bits += 1;
                scratch = reposterize(scratch, bits);

                attr.verbose_print(&format!("  too many colors, increasing posterization to {} bits", bits));
            }

            phase.step(y + 1, height)?;
        }

        if bits > self.posterize_bits {
            self.posterize_bits = bits;
            self.map = reposterize(std::mem::take(&mut self.map), bits);
        }

        for v in scratch.into_values() {
            insert(&mut self.map, bits, v.color, v.gamma, v.weight);
        }

        for c in image.fixed_colors() {
            self.fixed_colors.push((*c, gamma));
        }

        self.has_bitmap = true;

        attr.verbose_print(&format!("  made histogram...{} colors found", self.map.len()));

        Ok(())
    }

    /// Alternative to [`Histogram::add_image`]. Instead of counting colors in
    /// an image, it directly takes an array of colors and their counts.
    ///
    /// Use `0.0` for gamma if the colors are sRGB.
    pub fn add_colors(&mut self, attr: &Attr, entries: &[HistogramEntry], gamma: f64) -> Result<(), Error> {
        let gamma = normalize_gamma(gamma)?;

        self.posterize_bits = self.posterize_bits.max(attr.input_posterization());

        for e in entries.iter().filter(|e| e.count > 0) {
            self.insert(e.color, gamma, e.count as f64);
        }

        attr.verbose_print(&format!("  added {} colors to the histogram", entries.len()));

        Ok(())
    }

    /// Reserves a color in the output palette.
    ///
    /// Returns [`Error::Unsupported`] once 256 colors have been added.
    pub fn add_fixed_color(&mut self, color: Color, gamma: f64) -> Result<(), Error> {
        let gamma = normalize_gamma(gamma)?;

        if self.fixed_colors.len() >= 256 {
            return Err(Error::Unsupported);
        }

        self.fixed_colors.push((color, gamma));

        Ok(())
    }

    /// Generates a palette for all images and colors added to the histogram.
    pub fn quantize(&self, attr: &Attr) -> Result<QuantizeResult, Error> {
        QuantizeResult::quantize_histogram(self, attr)
    }

    fn insert(&mut self, color: Color, gamma: f64, weight: f64) {
        insert(&mut self.map, self.posterize_bits, color, gamma, weight);
    }

    pub(crate) fn items(&self) -> Result<Items, Error> {
        let mut luts: HashMap<u64, GammaLut> = HashMap::new();

        // Same input gives the same palette regardless of hashing
        let mut values = Vec::new();
        values.try_reserve_exact(self.map.len())?;
        values.extend(self.map.values().copied());
        values.sort_unstable_by_key(|v| (v.gamma.to_bits(), v.color.pack()));

        let mut items = Vec::new();
        items.try_reserve_exact(values.len())?;

        for v in values.iter() {
            let lut = luts.entry(v.gamma.to_bits()).or_insert_with(|| GammaLut::new(v.gamma));

            items.push(HistItem {
                color: lut.to_f(v.color),
                weight: v.weight as f32,
            });
        }

        let fixed = self.fixed_colors.iter().map(|&(color, gamma)| {
            let lut = luts.entry(gamma.to_bits()).or_insert_with(|| GammaLut::new(gamma));

            FixedColor { color, gamma, f: lut.to_f(color) }
        }).collect();

        Ok(Items { items, fixed })
    }
}

fn insert(map: &mut HashMap<HistKey, HistValue>, bits: u8, color: Color, gamma: f64, weight: f64) {
    // Transparent pixels look the same whatever their RGB is
    let color = if color.a == 0 { Color::default() } else { color.posterize(bits) };

    let key = HistKey {
        color: color.pack(),
        gamma: gamma.to_bits(),
    };

    map.entry(key)
        .and_modify(|e| e.weight += weight)
        .or_insert(HistValue { color, gamma, weight });
}

fn reposterize(map: HashMap<HistKey, HistValue>, bits: u8) -> HashMap<HistKey, HistValue> {
    let mut out = HashMap::with_capacity(map.len());
    for v in map.into_values() {
        insert(&mut out, bits, v.color, v.gamma, v.weight);
    }
    out
}
