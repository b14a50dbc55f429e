use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop one of the plotting apps.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("No such column {column}. Options are: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("need at least one metric")]
    NoMetrics,

    #[error("invalid state for metric {0}")]
    UnknownMetric(String),

    #[error(
        "unsupported output format for {}, use one of pdf, svg, png, bmp, jpg",
        .0.display()
    )]
    UnsupportedFormat(PathBuf),

    #[error("could not render the chart: {0}")]
    Render(String),

    #[error("invalid value for --{name}: {value}")]
    InvalidArgument { name: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
