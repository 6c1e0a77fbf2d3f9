pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::{CliConfig, LocalNoteStore, PagemarkConfig};
pub use crate::core::convert::HtmdConvert;
pub use crate::core::fetch::ContentFetcher;
pub use crate::core::notes::NoteOptions;
pub use crate::core::proxy::ReverseProxy;
pub use crate::core::registry::{PortRegistry, BASE_PROXY_PORT};
pub use crate::core::retriever::Retriever;
pub use crate::domain::model::{ExtractedArticle, RemoteDocument, RetrievalResult};
pub use crate::domain::ports::{MarkdownConvert, NoteStore};
pub use crate::utils::error::{PagemarkError, Result};
