pub mod cli;
pub mod toml_config;

pub use cli::{CliConfig, LocalNoteStore};
pub use toml_config::PagemarkConfig;
