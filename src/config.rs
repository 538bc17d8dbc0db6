use crate::error::OcrError;
use crate::segmentation::SegmentationParams;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "line-ocr-server")]
#[command(about = "Line-segmenting OCR server for handwritten and printed pages")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value = "9292")]
    pub port: u16,

    /// Default language for OCR (e.g., "eng", "deu", "fra")
    #[arg(long, env = "OCR_DEFAULT_LANGUAGE", default_value = "eng")]
    pub default_language: String,

    /// Engine used by `POST /ocr` (defaults to the first compiled engine)
    #[arg(long, env = "OCR_DEFAULT_ENGINE")]
    pub default_engine: Option<String>,

    /// Maximum file size in bytes (default: 50MB)
    #[arg(long, env = "OCR_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Maximum number of characters decoded per line
    #[arg(long, env = "OCR_MAX_TOKENS", default_value = "1000")]
    pub max_tokens: usize,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Drop lines whose height deviates from the mean by more than this fraction
    #[arg(long, env = "OCR_HEIGHT_RATIO_THRESHOLD", default_value = "0.75")]
    pub height_ratio_threshold: f64,

    /// Standard deviation of the projection smoothing kernel
    #[arg(long, env = "OCR_SIGMA", default_value = "3.0")]
    pub sigma: f64,

    /// Fraction of the projection peak a row must exceed to count as ink
    #[arg(long, env = "OCR_ACTIVITY_FRACTION", default_value = "0.2")]
    pub activity_fraction: f64,

    /// Minimum padding in pixels around each detected line
    #[arg(long, env = "OCR_MIN_PADDING", default_value = "10")]
    pub min_padding: u32,

    /// Allow rendering of projection profile plots
    #[arg(
        long,
        env = "OCR_PROJECTION_PLOTS",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub projection_plots: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub default_language: String,
    pub default_engine: Option<String>,
    pub max_file_size: usize,
    pub max_tokens: usize,
    pub tessdata_path: Option<String>,
    pub segmentation: SegmentationParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9292,
            default_language: "eng".to_string(),
            default_engine: None,
            max_file_size: 52_428_800,
            max_tokens: 1000,
            tessdata_path: None,
            segmentation: SegmentationParams {
                plot_projection: true,
                ..SegmentationParams::default()
            },
        }
    }
}

impl TryFrom<Args> for Config {
    type Error = OcrError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let segmentation = SegmentationParams {
            height_ratio_threshold: args.height_ratio_threshold,
            sigma: args.sigma,
            activity_fraction: args.activity_fraction,
            min_padding: args.min_padding,
            plot_projection: args.projection_plots,
        };
        segmentation.validate()?;

        if args.max_tokens == 0 {
            return Err(OcrError::InvalidParameter(
                "max_tokens must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host: args.host,
            port: args.port,
            default_language: args.default_language,
            default_engine: args.default_engine,
            max_file_size: args.max_file_size,
            max_tokens: args.max_tokens,
            tessdata_path: args.tessdata_path,
            segmentation,
        })
    }
}
