use std::sync::Arc;

use crate::attr::Attr;
use crate::cluster::median_cut;
use crate::color::DEFAULT_GAMMA;
use crate::colormap::Colormap;
use crate::error::Error;
use crate::histogram::{Histogram, Items};
use crate::image::Image;
use crate::kmeans::{self, Centroid};
use crate::palette::{self, Palette, PaletteOptions};
use crate::progress::{Phase, ProgressCallback};
use crate::quality::{mse_to_quality, mse_to_standard_mse, quality_to_mse};
use crate::remap::Remapper;

/// Result of quantization: the palette and everything needed to remap
/// images to it
pub struct QuantizeResult {
    palette: Palette,
    centroids: Vec<Centroid>,
    colormap: Colormap,
    dithering_level: f32,
    output_gamma: f64,
    quantization_mse: f64,
    remapping_mse: Option<f64>,
    posterize_bits: u8,
    min_opacity: u8,
    last_index_transparent: bool,
    has_bitmap: bool,
    attr: Attr,
    progress_callback: Option<ProgressCallback>,
}

impl QuantizeResult {
    /// Quantizes the provided [`Image`]
    pub fn quantize(image: &Image, attr: &Attr) -> Result<Self, Error> {
        let mut hist = Histogram::new(attr);
        hist.add_image_reporting(attr, image, &mut Phase::new(attr.progress_callback(), 0.0, 10.0))?;

        Self::generate(&hist, attr)
    }

    /// Quantizes the provided [`Histogram`].
    ///
    /// Returns [`Error::BitmapNotAvailable`] if nothing was added to it
    pub fn quantize_histogram(hist: &Histogram, attr: &Attr) -> Result<Self, Error> {
        if hist.is_empty() {
            attr.verbose_print("  histogram is empty, there are no colors to quantize");
            return Err(Error::BitmapNotAvailable);
        }

        Self::generate(hist, attr)
    }

    fn generate(hist: &Histogram, attr: &Attr) -> Result<Self, Error> {
        let callback = attr.progress_callback();
        let Items { items, fixed } = hist.items()?;

        let max_colors = attr.max_colors() as usize;

        if fixed.len() > max_colors {
            attr.verbose_print(&format!("  {} fixed colors don't fit in the palette, ignoring the rest", fixed.len() - max_colors));
        }

        let mut centroids: Vec<Centroid> = Vec::new();
        centroids.try_reserve_exact(max_colors)?;
        centroids.extend(fixed.iter().take(max_colors).map(|f| Centroid::fixed(*f)));

        let target = max_colors - centroids.len();
        let target_mse = quality_to_mse(attr.max_quality() as u8);

        let mut phase = Phase::new(callback, 10.0, 50.0);

        if items.len() <= target {
            attr.verbose_print(&format!("  image has {} colors, which fit in the palette without quantization", items.len()));

            centroids.extend(items.iter().map(|i| Centroid::new(i.color, i.weight as f64)));
            phase.finish()?;
        } else {
            let clusters = median_cut(&items, target, target_mse, &mut phase)?;
            phase.finish()?;

            attr.verbose_print(&format!("  median cut made {} colors out of {}", clusters.len(), items.len()));

            centroids.extend(clusters.iter().map(|c| Centroid::new(c.mean, c.weight)));
        }

        let mse = kmeans::refine(&items, &mut centroids, attr, &mut Phase::new(callback, 50.0, 95.0))?;

        let quality = mse_to_quality(mse);
        if quality < attr.min_quality() as u8 {
            attr.verbose_print(&format!(
                "  image degradation MSE={:.3} (Q={}) exceeded limit of {:.3} ({})",
                mse_to_standard_mse(mse),
                quality,
                mse_to_standard_mse(quality_to_mse(attr.min_quality() as u8)),
                attr.min_quality(),
            ));
            return Err(Error::QualityTooLow);
        }

        // Most popular colors first, transparency ordering is applied later
        centroids.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));

        attr.verbose_print(&format!("  selected {} colors, MSE={:.3} (Q={})", centroids.len(), mse_to_standard_mse(mse), quality));

        let mut result = Self {
            palette: Palette::default(),
            centroids,
            colormap: Colormap::new(vec![], &[]),
            dithering_level: 1.0,
            output_gamma: DEFAULT_GAMMA,
            quantization_mse: mse,
            remapping_mse: None,
            posterize_bits: attr.min_posterization() as u8,
            min_opacity: attr.min_opacity() as u8,
            last_index_transparent: attr.last_index_transparent(),
            has_bitmap: hist.has_bitmap(),
            attr: attr.clone(),
            progress_callback: None,
        };
        result.build_palette();

        Phase::new(callback, 95.0, 100.0).finish()?;

        Ok(result)
    }

    fn build_palette(&mut self) {
        let built = palette::build(&self.centroids, &PaletteOptions {
            gamma: self.output_gamma,
            posterize_bits: self.posterize_bits,
            min_opacity: self.min_opacity,
            last_index_transparent: self.last_index_transparent,
        });

        self.palette = built.palette;
        self.colormap = Colormap::new(built.colors, &built.popularity);
    }

    /// Sets the dithering level.
    ///
    /// Returns [`Error::ValueOutOfRange`] if the provided value is greater
    /// than 1.0 or lesser than 0.0
    pub fn set_dithering_level(&mut self, level: f32) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&level) {
            return Err(Error::ValueOutOfRange);
        }

        self.dithering_level = level;

        Ok(())
    }

    pub fn dithering_level(&self) -> f32 {
        self.dithering_level
    }

    /// Gamma of the palette colors, `0.45455` (sRGB) by default.
    ///
    /// Must be greater than 0 and less than 1. The palette is regenerated.
    pub fn set_output_gamma(&mut self, gamma: f64) -> Result<(), Error> {
        if !(gamma > 0.0 && gamma < 1.0) {
            return Err(Error::ValueOutOfRange);
        }

        self.output_gamma = gamma;
        self.build_palette();

        Ok(())
    }

    pub fn output_gamma(&self) -> f64 {
        self.output_gamma
    }

    /// Returns the [`Palette`] generated after quantization
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Mean squared error of the palette against the histogram, on a scale
    /// comparable to 8-bit RGB differences
    pub fn quantization_error(&self) -> f64 {
        mse_to_standard_mse(self.quantization_mse)
    }

    /// `0..=100`, derived from [`QuantizeResult::quantization_error`]
    pub fn quantization_quality(&self) -> u8 {
        mse_to_quality(self.quantization_mse)
    }

    /// Like [`QuantizeResult::quantization_error`], but measured on the last
    /// remapped image. `None` until an image has been remapped.
    pub fn remapping_error(&self) -> Option<f64> {
        self.remapping_mse.map(mse_to_standard_mse)
    }

    pub fn remapping_quality(&self) -> Option<u8> {
        self.remapping_mse.map(mse_to_quality)
    }

    /// Called with the progress of remapping
    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: Fn(f32) -> bool + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
    }

    pub fn clear_progress_callback(&mut self) {
        self.progress_callback = None;
    }

    /// Remaps the provided [`Image`] to palette indices, one byte per pixel.
    ///
    /// Returns [`Error::BufferTooSmall`] if the provided buffer is smaller
    /// than `image.width * image.height` or the image's background has
    /// different dimensions, and [`Error::BitmapNotAvailable`] if the
    /// palette wasn't made from images.
    pub fn remap_image(&mut self, image: &Image, buf: &mut [u8]) -> Result<(), Error> {
        if !self.has_bitmap {
            self.attr.verbose_print("  the palette was made without images, can't remap");
            return Err(Error::BitmapNotAvailable);
        }

        let len = image.width() * image.height();
        if buf.len() < len {
            return Err(Error::BufferTooSmall);
        }

        // `Image::set_background` rejects mismatches already, this only
        // guards the row reader's indexing
        if let Some(bg) = image.background() {
            if bg.width() != image.width() || bg.height() != image.height() {
                return Err(Error::BufferTooSmall);
            }
        }

        let remapper = Remapper {
            colormap: &self.colormap,
            dithering_level: self.dithering_level,
            max_dither_error: (self.quantization_mse as f32 * 2.4).max((16.0f32 / 256.0).powi(2)),
        };

        let mut phase = Phase::new(self.progress_callback.as_ref(), 0.0, 100.0);
        let mse = remapper.remap(image, &mut buf[..len], &mut phase)?;

        self.remapping_mse = Some(mse);

        self.attr.verbose_print(&format!("  remapped image to {} colors, MSE={:.3} (Q={})", self.palette.len(), mse_to_standard_mse(mse), mse_to_quality(mse)));

        Ok(())
    }

    /// Like [`QuantizeResult::remap_image`], but allocates the output
    pub fn remapped(&mut self, image: &Image) -> Result<Vec<u8>, Error> {
        let len = image.width() * image.height();

        let mut buf = Vec::new();
        buf.try_reserve_exact(len)?;
        buf.resize(len, 0);

        self.remap_image(image, &mut buf)?;

        Ok(buf)
    }
}
