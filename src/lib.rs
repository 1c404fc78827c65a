//! Palette quantization of RGBA images.
//!
//! ```no_run
//! use liquant::{Attr, Image};
//!
//! # fn main() -> Result<(), liquant::Error> {
//! let pixels = vec![0u8; 64 * 64 * 4];
//!
//! let mut attr = Attr::new();
//! attr.set_max_colors(64)?;
//!
//! let image = Image::new(&attr, &pixels, 64, 64, 0.0)?;
//! let mut result = image.quantize(&attr)?;
//! result.set_dithering_level(0.8)?;
//!
//! let indexes = result.remapped(&image)?;
//! let palette = result.palette().colors();
//! # let _ = (indexes, palette);
//! # Ok(())
//! # }
//! ```

mod arena;
mod attr;
mod cluster;
mod color;
mod colormap;
mod error;
mod histogram;
mod image;
mod kmeans;
mod palette;
mod progress;
mod quality;
mod quantize;
mod remap;
mod vpsearch;

pub use arena::{ImageArena, ImageHandle, ImageMut};
pub use attr::{Attr, MIN_OPACITY_SUPPORTED};
pub use color::{Color, DEFAULT_GAMMA};
pub use error::Error;
pub use histogram::{Histogram, HistogramEntry};
pub use image::{Image, RowFn};
pub use palette::Palette;
pub use progress::{LogCallback, ProgressCallback};
pub use quantize::QuantizeResult;
