use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The value provided to the function is out of allowed range
    #[error("Value out of range")]
    ValueOutOfRange,
    /// The generated palette doesn't reach the minimum quality
    #[error("Quality too low")]
    QualityTooLow,
    /// Memory allocation failed
    #[error("Out of memory")]
    OutOfMemory,
    /// Progress callback asked to stop
    #[error("Aborted")]
    Aborted,
    /// The result wasn't generated from image pixels
    #[error("Bitmap not available")]
    BitmapNotAvailable,
    /// The slice provided to the function is too small
    #[error("Buffer is too small")]
    BufferTooSmall,
    /// A structural limit was exceeded
    #[error("Unsupported")]
    Unsupported,
    /// The handle doesn't refer to a live object
    #[error("Invalid pointer")]
    InvalidPointer,
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::OutOfMemory
    }
}
