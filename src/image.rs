use std::borrow::Cow;
use std::fmt;

use crate::attr::Attr;
use crate::color::{normalize_gamma, Color, FColor, GammaLut};
use crate::error::Error;
use crate::quantize::QuantizeResult;

/// Writes row `y` of the image into the provided slice of `width` pixels
pub type RowFn<'pixels> = dyn Fn(usize, &mut [Color]) + Send + Sync + 'pixels;

enum PixelSource<'pixels> {
    /// RGBA bytes, `stride` is in pixels
    Slice { data: Cow<'pixels, [u8]>, stride: usize },
    Rows(Box<RowFn<'pixels>>),
}

/// Image reference containing pixel data and dimensions info
pub struct Image<'pixels> {
    width: usize,
    height: usize,
    gamma: f64,
    source: PixelSource<'pixels>,
    background: Option<Box<Image<'pixels>>>,
    importance_map: Option<Vec<u8>>,
    fixed_colors: Vec<Color>,
}

impl fmt::Debug for Image<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("gamma", &self.gamma)
            .field("background", &self.background)
            .field("importance_map", &self.importance_map.is_some())
            .field("fixed_colors", &self.fixed_colors)
            .finish_non_exhaustive()
    }
}

fn check_dimensions(width: usize, height: usize) -> Result<(), Error> {
    if width == 0 || height == 0 || width > i32::MAX as usize || height > i32::MAX as usize {
        return Err(Error::ValueOutOfRange);
    }

    match width.checked_mul(height).and_then(|n| n.checked_mul(4)) {
        Some(_) => Ok(()),
        None => Err(Error::ValueOutOfRange),
    }
}

impl<'pixels> Image<'pixels> {
    /// Creates an [`Image`] from a slice of RGBA pixels.
    ///
    /// Use `0.0` for gamma if the image is sRGB (most images are).
    ///
    /// Returns [`Error::BufferTooSmall`] if the provided slice length is less
    /// than `width * height * 4`
    pub fn new(attr: &Attr, data: &'pixels [u8], width: usize, height: usize, gamma: f64) -> Result<Self, Error> {
        Self::new_stride(attr, data, width, height, width, gamma)
    }

    /// Like [`Image::new`] but rows start every `stride` pixels, which
    /// allows defining regions of larger images without copying.
    pub fn new_stride(attr: &Attr, data: &'pixels [u8], width: usize, height: usize, stride: usize, gamma: f64) -> Result<Self, Error> {
        Self::from_source(attr, Cow::Borrowed(data), width, height, stride, gamma)
    }

    /// Creates an [`Image`] that owns its pixels
    pub fn new_owned(attr: &Attr, data: Vec<u8>, width: usize, height: usize, gamma: f64) -> Result<Image<'static>, Error> {
        Image::from_source(attr, Cow::Owned(data), width, height, width, gamma)
    }

    /// Creates a self-contained [`Image`] by copying the pixels
    pub fn new_copy(attr: &Attr, data: &[u8], width: usize, height: usize, gamma: f64) -> Result<Image<'static>, Error> {
        check_dimensions(width, height)?;

        let len = width * height * 4;
        if data.len() < len {
            attr.verbose_print(&format!("  buffer length is {} bytes, which is not enough for {}x{}x4 RGBA bytes", data.len(), width, height));
            return Err(Error::BufferTooSmall);
        }

        let mut copy = Vec::new();
        copy.try_reserve_exact(len)?;
        copy.extend_from_slice(&data[..len]);

        Image::new_owned(attr, copy, width, height, gamma)
    }

    /// Generates rows on demand using a callback.
    ///
    /// The callback must be cheap, it's called for every pass over the
    /// image.
    pub fn from_rows<F>(_attr: &Attr, rows: F, width: usize, height: usize, gamma: f64) -> Result<Self, Error>
    where
        F: Fn(usize, &mut [Color]) + Send + Sync + 'pixels,
    {
        check_dimensions(width, height)?;

        Ok(Self {
            width,
            height,
            gamma: normalize_gamma(gamma)?,
            source: PixelSource::Rows(Box::new(rows)),
            background: None,
            importance_map: None,
            fixed_colors: vec![],
        })
    }

    fn from_source(attr: &Attr, data: Cow<'pixels, [u8]>, width: usize, height: usize, stride: usize, gamma: f64) -> Result<Self, Error> {
        check_dimensions(width, height)?;

        if stride < width {
            return Err(Error::ValueOutOfRange);
        }

        let required = stride
            .checked_mul(height - 1)
            .and_then(|n| n.checked_add(width))
            .and_then(|n| n.checked_mul(4))
            .ok_or(Error::ValueOutOfRange)?;

        if data.len() < required {
            attr.verbose_print(&format!("  buffer length is {} bytes, which is not enough for {}x{}x4 RGBA bytes", data.len(), stride, height));
            return Err(Error::BufferTooSmall);
        }

        Ok(Self {
            width,
            height,
            gamma: normalize_gamma(gamma)?,
            source: PixelSource::Slice { data, stride },
            background: None,
            importance_map: None,
            fixed_colors: vec![],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Remap pixels assuming they will be displayed on this background.
    ///
    /// The image takes ownership of the background and drops it together
    /// with itself. Returns [`Error::BufferTooSmall`] if the dimensions
    /// differ.
    pub fn set_background(&mut self, background: Image<'pixels>) -> Result<(), Error> {
        if background.width != self.width || background.height != self.height {
            return Err(Error::BufferTooSmall);
        }

        self.background = Some(Box::new(background));

        Ok(())
    }

    pub fn background(&self) -> Option<&Image<'pixels>> {
        self.background.as_deref()
    }

    pub(crate) fn background_mut(&mut self) -> Option<&mut Image<'pixels>> {
        self.background.as_deref_mut()
    }

    /// Sets which pixels are more important. Higher numbers mean more
    /// important, `0` excludes the pixel from palette generation.
    ///
    /// The map is copied and must hold at least `width * height` bytes.
    pub fn set_importance_map(&mut self, map: &[u8]) -> Result<(), Error> {
        let len = self.width * self.height;
        if map.len() < len {
            return Err(Error::BufferTooSmall);
        }

        let mut copy = Vec::new();
        copy.try_reserve_exact(len)?;
        copy.extend_from_slice(&map[..len]);

        self.importance_map = Some(copy);

        Ok(())
    }

    pub fn importance_map(&self) -> Option<&[u8]> {
        self.importance_map.as_deref()
    }

    /// Reserves a color in the output palette created from this image.
    ///
    /// Returns [`Error::Unsupported`] once 256 colors have been added.
    pub fn add_fixed_color(&mut self, color: Color) -> Result<(), Error> {
        if self.fixed_colors.len() >= 256 {
            return Err(Error::Unsupported);
        }

        self.fixed_colors.push(color);

        Ok(())
    }

    pub fn fixed_colors(&self) -> &[Color] {
        &self.fixed_colors
    }

    /// Generates a palette for this image
    pub fn quantize(&self, attr: &Attr) -> Result<QuantizeResult, Error> {
        QuantizeResult::quantize(self, attr)
    }

    pub(crate) fn fill_row(&self, y: usize, row: &mut [Color]) {
        match &self.source {
            PixelSource::Slice { data, stride } => {
                let start = y * stride * 4;
                let pixels = data[start..start + self.width * 4].chunks_exact(4);

                for (px, c) in pixels.zip(row.iter_mut()) {
                    *c = Color::from_slice(px);
                }
            },
            PixelSource::Rows(rows) => rows(y, &mut row[..self.width]),
        }
    }

    pub(crate) fn fill_row_f(&self, y: usize, lut: &GammaLut, tmp: &mut [Color], out: &mut [FColor]) {
        self.fill_row(y, tmp);

        for (c, f) in tmp.iter().zip(out.iter_mut()) {
            *f = lut.to_f(*c);
        }
    }
}
