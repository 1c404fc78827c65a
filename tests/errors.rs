use liquant::Error;

#[test]
fn errors_have_messages() {
    let all = [
        Error::ValueOutOfRange,
        Error::QualityTooLow,
        Error::OutOfMemory,
        Error::Aborted,
        Error::BitmapNotAvailable,
        Error::BufferTooSmall,
        Error::Unsupported,
        Error::InvalidPointer,
    ];

    for e in all {
        assert!(!e.to_string().is_empty());
    }
}

#[test]
fn errors_are_std_errors() {
    fn takes(_: &dyn std::error::Error) {}

    takes(&Error::Aborted);
}
