use url::Url;

/// A page as fetched, before extraction. Lives within one retrieval.
#[derive(Debug, Clone)]
pub struct RemoteDocument {
    pub source_url: Url,
    pub raw_html: String,
}

/// Title and primary readable region of a parsed page. The title is empty
/// when the document carries none; the content falls back to the whole
/// `<body>` when no `<article>` region exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub content_html: String,
}

/// What a retrieval hands back to callers. Both fields are empty when the
/// retrieval failed anywhere along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalResult {
    pub title: String,
    pub markdown: String,
}
