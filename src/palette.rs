use crate::color::{to_rgb, Color, FColor, GammaLut};
use crate::kmeans::Centroid;

/// Color palette
#[repr(C)]
#[derive(Clone, Debug)]
pub struct Palette {
    /// The number of colors in the palette
    pub count: u32,
    /// The palette colors, only the first `count` are meaningful
    pub entries: [Color; 256],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            count: 0,
            entries: [Color::default(); 256],
        }
    }
}

impl Palette {
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Colors in index order
    pub fn colors(&self) -> &[Color] {
        &self.entries[..self.len()]
    }
}

impl From<&[Color]> for Palette {
    fn from(colors: &[Color]) -> Self {
        let mut palette = Self::default();
        let count = colors.len().min(256);

        palette.entries[..count].copy_from_slice(&colors[..count]);
        palette.count = count as u32;

        palette
    }
}

/// How centroids are turned into 8-bit palette entries
pub(crate) struct PaletteOptions {
    pub gamma: f64,
    pub posterize_bits: u8,
    pub min_opacity: u8,
    pub last_index_transparent: bool,
}

/// Final palette plus what the colormap needs, in palette order
pub(crate) struct Built {
    pub palette: Palette,
    pub colors: Vec<FColor>,
    pub popularity: Vec<f32>,
}

fn emit(c: &Centroid, opts: &PaletteOptions) -> Color {
    if let Some(fixed) = c.fixed {
        if fixed.gamma == opts.gamma {
            return fixed.color;
        }

        return to_rgb(opts.gamma, &fixed.f);
    }

    let mut color = to_rgb(opts.gamma, &c.color).posterize(opts.posterize_bits);

    if opts.min_opacity > 0 && color.a >= opts.min_opacity {
        color.a = 255;
    }

    color
}

/// Converts centroids to the output palette.
///
/// Transparent entries go first in ascending alpha, or last in descending
/// alpha with `last_index_transparent`. Sorting is stable so equal alphas
/// keep the centroid order.
pub(crate) fn build(centroids: &[Centroid], opts: &PaletteOptions) -> Built {
    let mut entries: Vec<(Color, f32)> = centroids.iter()
        .take(256)
        .map(|c| (emit(c, opts), c.popularity as f32))
        .collect();

    if opts.last_index_transparent {
        entries.sort_by_key(|(c, _)| std::cmp::Reverse(c.a));
    } else {
        entries.sort_by_key(|(c, _)| if c.a < 255 { c.a as u16 } else { 256 });
    }

    let colors: Vec<Color> = entries.iter().map(|(c, _)| *c).collect();
    let palette = Palette::from(colors.as_slice());

    // What the palette colors look like once written out
    let lut = GammaLut::new(opts.gamma);

    Built {
        palette,
        colors: colors.iter().map(|c| lut.to_f(*c)).collect(),
        popularity: entries.iter().map(|(_, p)| *p).collect(),
    }
}
