use thiserror::Error;

// Error
//------------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq, Eq, Copy, Clone)]
pub enum QRError {
    #[error("Data too long")]
    DataTooLong,
    #[error("Invalid version")]
    InvalidVersion,
    #[error("Invalid error correction level")]
    InvalidECLevel,
    #[error("Invalid character for the requested mode")]
    InvalidChar,
    #[error("Invalid masking pattern")]
    InvalidMaskingPattern,
    #[error("Invalid mode")]
    InvalidMode,
    #[error("Invalid format info detected")]
    InvalidFormatInfo,
}

pub type QRResult<T> = Result<T, QRError>;

#[cfg(test)]
mod error_tests {
    use super::QRError;

    #[test]
    fn test_display() {
        assert_eq!(QRError::DataTooLong.to_string(), "Data too long");
        assert_eq!(QRError::InvalidECLevel.to_string(), "Invalid error correction level");
        assert_eq!(QRError::InvalidFormatInfo.to_string(), "Invalid format info detected");
    }
}
