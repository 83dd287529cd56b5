//! # qrsmith
//!
//! A Rust library for generating QR codes (model 2, versions 1 to 40) with Reed-Solomon
//! error correction.
//!
//! ## Features
//!
//! - **Automatic encoding**: Picks the densest of numeric, alphanumeric, byte and kanji modes
//!   and the smallest version that fits the data
//! - **Reed-Solomon Error Correction**: Configurable levels (L, M, Q, H)
//! - **Mask selection**: Scores all 8 data masks with the standard penalty rules in parallel
//! - **Rendering**: Grayscale and two-colour images, terminal strings and bitmap files
//!
//! ## Quick Start
//!
//! ```rust
//! use qrsmith::QRBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Provide only data, all other settings are chosen automatically
//! let qr = QRBuilder::new("Hello, World!").build()?;
//!
//! let img = qr.render(4); // 4 pixels per module
//! assert_eq!(img.width(), (qr.width() as u32 + 8) * 4);
//! # Ok(())
//! # }
//! ```
//!
//! ### Full Configuration
//!
//! ```rust
//! use qrsmith::{ECLevel, MaskPattern, Mode, QRBuilder, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let qr = QRBuilder::new("HELLO WORLD")
//!     .version(Version::new(2)?)       // If not provided, finds the smallest version to fit data
//!     .ec_level(ECLevel::Q)            // If not provided, defaults to ECLevel::M
//!     .mode(Mode::Alphanumeric)        // If not provided, classifies the data
//!     .mask(MaskPattern::new(3)?)      // If not provided, finds the mask with the lowest penalty
//!     .build()?;
//!
//! assert_eq!(qr.width(), 25);
//! println!("{}", qr.to_str(1));
//! # Ok(())
//! # }
//! ```
//!
//! ### Lenient parameters
//!
//! ```rust
//! // Out of range values fall back to automatic selection instead of failing
//! let qr = qrsmith::encode("12345", None, Some(99), None, Some(42)).unwrap();
//! assert_eq!(*qr.version(), 1);
//! ```

#![allow(clippy::items_after_test_module, clippy::suspicious_arithmetic_impl)]

pub mod builder;
pub(crate) mod common;

pub use builder::{Module, QRBuilder, QR};
pub use common::codec::Mode;
pub use common::error::{QRError, QRResult};
pub use common::mask::{compute_total_penalty, MaskPattern};
pub use common::metadata::{format_info, parse_format_info, Color, ECLevel, Metadata, Version};

/// Builds a symbol from raw, possibly invalid parameters. A missing or out of
/// range version or mask selects it automatically and a missing level means M.
pub fn encode(
    content: &str,
    ec_level: Option<ECLevel>,
    version: Option<usize>,
    mode: Option<Mode>,
    mask: Option<u8>,
) -> QRResult<QR> {
    let mut builder = QRBuilder::new(content);
    builder.ec_level(ec_level.unwrap_or_default());
    if let Some(v) = version {
        builder.version_number(v);
    }
    if let Some(m) = mode {
        builder.mode(m);
    }
    if let Some(m) = mask {
        builder.mask_number(m);
    }
    builder.build()
}
