use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qrsmith::{Mode, QRBuilder};

// CLI arguments
//------------------------------------------------------------------------------

/// Generates a QR code and prints it or saves it as an image
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
struct Args {
    /// Text to encode
    content: String,

    /// Error correction level (L, M, Q, H), anything else falls back to M
    #[arg(short, long, env = "QRSMITH_LEVEL", default_value_t = 'M')]
    level: char,

    /// Version 1-40, out of range values select the smallest fitting version
    #[arg(short, long, env = "QRSMITH_VERSION")]
    version: Option<usize>,

    /// Encoding mode
    #[arg(long, env = "QRSMITH_MODE", value_enum, default_value_t = ModeArg::Auto)]
    mode: ModeArg,

    /// Mask pattern 0-7, out of range values select the lowest penalty mask
    #[arg(long, env = "QRSMITH_MASK")]
    mask: Option<u8>,

    /// Pixels per module for image output, characters per module for the terminal
    #[arg(short, long, env = "QRSMITH_SCALE", default_value_t = 8)]
    scale: u32,

    /// Output image path, the format follows the extension (.bmp, .png, ...)
    #[arg(short, long, env = "QRSMITH_OUTPUT")]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "QRSMITH_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ModeArg {
    Auto,
    Numeric,
    Alphanumeric,
    Byte,
    Kanji,
}

impl ModeArg {
    fn mode(self) -> Option<Mode> {
        match self {
            ModeArg::Auto => None,
            ModeArg::Numeric => Some(Mode::Numeric),
            ModeArg::Alphanumeric => Some(Mode::Alphanumeric),
            ModeArg::Byte => Some(Mode::Byte),
            ModeArg::Kanji => Some(Mode::Kanji),
        }
    }
}

// Main
//------------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let mut builder = QRBuilder::new(&args.content);
    builder.ec_level_char(args.level);
    if let Some(v) = args.version {
        builder.version_number(v);
    }
    if let Some(mode) = args.mode.mode() {
        builder.mode(mode);
    }
    if let Some(m) = args.mask {
        builder.mask_number(m);
    }

    let qr = builder.build().with_context(|| format!("Failed to encode {:?}", args.content))?;

    match &args.output {
        Some(path) => {
            qr.save(path, args.scale.max(1))
                .with_context(|| format!("Failed to save {}", path.display()))?;
            info!("Saved {} to {}", qr.metadata(), path.display());
        }
        None => print!("{}", qr.to_str(args.scale.clamp(1, 4) as usize)),
    }

    Ok(())
}

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
