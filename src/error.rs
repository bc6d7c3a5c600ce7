use thiserror::Error;

pub type ManifestResult<T> = Result<T, ManifestError>;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Line item '{item}' has quantity 0, unit price is undefined")]
    ZeroQuantity { item: String },

    #[error("Amount '{field}' is not a finite number ({value})")]
    InvalidAmount { field: String, value: f64 },

    #[error("Image error: {0}")]
    Image(String),

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Import error: {0}")]
    Import(String),
}
