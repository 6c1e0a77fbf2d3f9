use thiserror::Error;

#[derive(Error, Debug)]
pub enum PagemarkError {
    #[error("HTTP request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to bind reverse proxy on port {port}: {source}")]
    ProxyBind { port: u16, source: std::io::Error },

    #[error("Proxy error: {message}")]
    Proxy { message: String },

    #[error("HTML parse error: {message}")]
    Parse { message: String },

    #[error("Markdown conversion error: {message}")]
    Convert { message: String },

    #[error("Front matter error: {message}")]
    FrontMatter { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Front matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {field}: {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Invalid configuration value for {field}: {value} ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration value: {field}")]
    MissingConfig { field: String },
}

pub type Result<T> = std::result::Result<T, PagemarkError>;
