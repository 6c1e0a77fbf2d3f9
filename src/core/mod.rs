pub mod convert;
pub mod extract;
pub mod fetch;
pub mod notes;
pub mod proxy;
pub mod registry;
pub mod retriever;

pub use crate::domain::model::{ExtractedArticle, RemoteDocument, RetrievalResult};
pub use crate::domain::ports::{MarkdownConvert, NoteStore};
pub use crate::utils::error::Result;
