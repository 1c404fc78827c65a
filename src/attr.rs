use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::progress::{LogCallback, ProgressCallback};

/// Whether [`Attr::set_min_opacity`] is a real bound (`min-opacity` feature)
/// or a stub that accepts anything and always reads back `0`.
pub const MIN_OPACITY_SUPPORTED: bool = cfg!(feature = "min-opacity");

/// Quantization settings.
///
/// Cloning produces an independent copy with identical settings and
/// callbacks.
#[derive(Clone)]
pub struct Attr {
    max_colors: u32,
    speed: u8,
    min_opacity: u8,
    min_posterization: u8,
    min_quality: u8,
    max_quality: u8,
    last_index_transparent: bool,
    log_callback: Option<LogCallback>,
    progress_callback: Option<ProgressCallback>,
}

impl Default for Attr {
    fn default() -> Self {
        Self {
            max_colors: 256,
            speed: 4,
            min_opacity: 0,
            min_posterization: 0,
            min_quality: 0,
            max_quality: 100,
            last_index_transparent: false,
            log_callback: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attr")
            .field("max_colors", &self.max_colors)
            .field("speed", &self.speed)
            .field("min_opacity", &self.min_opacity)
            .field("min_posterization", &self.min_posterization)
            .field("min_quality", &self.min_quality)
            .field("max_quality", &self.max_quality)
            .field("last_index_transparent", &self.last_index_transparent)
            .field("log_callback", &self.log_callback.is_some())
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl Attr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of palette colors.
    ///
    /// Returns [`Error::ValueOutOfRange`] if the value is not in `2..=256`
    pub fn set_max_colors(&mut self, colors: i32) -> Result<(), Error> {
        if !(2..=256).contains(&colors) {
            return Err(Error::ValueOutOfRange);
        }

        self.max_colors = colors as u32;

        Ok(())
    }

    pub fn max_colors(&self) -> i32 {
        self.max_colors as i32
    }

    /// `1..=10`. Lower is slower and gives better quality.
    pub fn set_speed(&mut self, speed: i32) -> Result<(), Error> {
        if !(1..=10).contains(&speed) {
            return Err(Error::ValueOutOfRange);
        }

        self.speed = speed as u8;

        Ok(())
    }

    pub fn speed(&self) -> i32 {
        self.speed as i32
    }

    /// Alpha values at or above this threshold are emitted as opaque.
    ///
    /// Without the `min-opacity` feature this is a no-op, see
    /// [`MIN_OPACITY_SUPPORTED`].
    pub fn set_min_opacity(&mut self, min: i32) -> Result<(), Error> {
        if !MIN_OPACITY_SUPPORTED {
            return Ok(());
        }

        if !(0..=255).contains(&min) {
            return Err(Error::ValueOutOfRange);
        }

        self.min_opacity = min as u8;

        Ok(())
    }

    pub fn min_opacity(&self) -> i32 {
        self.min_opacity as i32
    }

    /// Number of least significant bits to ignore in every channel, `0..=4`
    pub fn set_min_posterization(&mut self, bits: i32) -> Result<(), Error> {
        if !(0..=4).contains(&bits) {
            return Err(Error::ValueOutOfRange);
        }

        self.min_posterization = bits as u8;

        Ok(())
    }

    pub fn min_posterization(&self) -> i32 {
        self.min_posterization as i32
    }

    /// Range 0-100, roughly like JPEG.
    ///
    /// Quantization fails with [`Error::QualityTooLow`] if `min` can't be
    /// met. Fewer colors are used once `max` is reached.
    pub fn set_quality(&mut self, min: i32, max: i32) -> Result<(), Error> {
        if !(0..=100).contains(&min) || !(0..=100).contains(&max) || min > max {
            return Err(Error::ValueOutOfRange);
        }

        self.min_quality = min as u8;
        self.max_quality = max as u8;

        Ok(())
    }

    pub fn set_min_quality(&mut self, min: i32) -> Result<(), Error> {
        self.set_quality(min, self.max_quality as i32)
    }

    pub fn set_max_quality(&mut self, max: i32) -> Result<(), Error> {
        self.set_quality(self.min_quality as i32, max)
    }

    pub fn min_quality(&self) -> i32 {
        self.min_quality as i32
    }

    pub fn max_quality(&self) -> i32 {
        self.max_quality as i32
    }

    /// Moves transparent colors to the end of the palette instead of the
    /// beginning
    pub fn set_last_index_transparent(&mut self, value: bool) {
        self.last_index_transparent = value;
    }

    pub fn last_index_transparent(&self) -> bool {
        self.last_index_transparent
    }

    pub fn set_log_callback<F>(&mut self, callback: F)
    where
        F: Fn(&Attr, &str) + Send + Sync + 'static,
    {
        self.log_callback = Some(Arc::new(callback));
    }

    pub fn clear_log_callback(&mut self) {
        self.log_callback = None;
    }

    /// Called with the progress of palette generation
    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: Fn(f32) -> bool + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
    }

    pub fn clear_progress_callback(&mut self) {
        self.progress_callback = None;
    }

    pub(crate) fn progress_callback(&self) -> Option<&ProgressCallback> {
        self.progress_callback.as_ref()
    }

    pub(crate) fn verbose_print(&self, msg: &str) {
        log::debug!("{}", msg);

        if let Some(cb) = &self.log_callback {
            cb(self, msg);
        }
    }

    pub(crate) fn kmeans_iterations(&self) -> usize {
        let iterations = 8usize.saturating_sub(self.speed as usize);
        iterations + iterations * iterations / 2
    }

    /// Mean squared centroid movement below which k-means stops
    pub(crate) fn kmeans_iteration_limit(&self) -> f64 {
        1.0 / (1u32 << (23 - self.speed as u32)) as f64
    }

    pub(crate) fn input_posterization(&self) -> u8 {
        let speed_bits = if self.speed >= 8 { 1 } else { 0 };
        speed_bits.max(self.min_posterization)
    }

    pub(crate) fn max_histogram_entries(&self) -> usize {
        (1 << 17) + (1 << 18) * (10 - self.speed as usize)
    }
}
