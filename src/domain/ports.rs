use crate::utils::error::Result;

/// Turns article HTML into markdown. The conversion algorithm is
/// substitutable; the retriever only depends on this one operation.
pub trait MarkdownConvert: Send + Sync {
    fn convert(&self, html: &str) -> Result<String>;
}

pub trait NoteStore: Send + Sync {
    fn read_note(&self, path: &str)
        -> impl std::future::Future<Output = Result<String>> + Send;
    fn write_note(
        &self,
        path: &str,
        content: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Renames the note to `<new_stem>.md` within its directory and returns
    /// the new path.
    fn rename_note(
        &self,
        path: &str,
        new_stem: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}
