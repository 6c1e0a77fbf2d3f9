use regex::Regex;
use url::Url;

use crate::core::retriever::Retriever;
use crate::domain::model::RetrievalResult;
use crate::domain::ports::{MarkdownConvert, NoteStore};
use crate::utils::error::Result;

/// How captured notes are named and where they go.
#[derive(Debug, Clone)]
pub struct NoteOptions {
    /// Front-matter attribute holding the source URL.
    pub url_attribute: String,
    /// Folder (under the store root) for captured notes; the root itself
    /// when unset.
    pub read_later_folder: Option<String>,
}

impl Default for NoteOptions {
    fn default() -> Self {
        Self {
            url_attribute: "source".to_string(),
            read_later_folder: None,
        }
    }
}

/// Strips path-hostile characters (`\`, `/`, `:`) out of a note title.
pub fn normalize_file_name(title: &str) -> String {
    let re = Regex::new(r"[\\/:]").unwrap();
    re.replace_all(title, "").to_string()
}

/// Retrieves `url` and writes it as a new note: a front-matter block
/// holding the source URL, then the markdown body. A failed retrieval
/// still produces a note (with an empty body) — the save is never blocked.
/// Returns the created path.
pub async fn create_note_from_url<S, C>(
    store: &S,
    retriever: &mut Retriever<C>,
    options: &NoteOptions,
    url: &str,
    use_proxy: bool,
) -> Result<String>
where
    S: NoteStore,
    C: MarkdownConvert,
{
    let result = retrieve(retriever, url, use_proxy).await;

    let content = format!(
        "---\n{}: \"{}\"\n---\n{}",
        options.url_attribute, url, result.markdown
    );
    let file_name = format!("{}.md", note_stem(&result.title, url));
    let path = match &options.read_later_folder {
        Some(folder) => format!("{}/{}", folder.trim_end_matches('/'), file_name),
        None => file_name,
    };

    store.write_note(&path, &content).await?;
    tracing::info!("captured {} into {}", url, path);
    Ok(path)
}

/// Refreshes an existing note from the URL in its front matter: the body
/// below the front-matter block is replaced with freshly retrieved
/// markdown and the note is renamed to the extracted title. Notes without
/// the configured attribute are left untouched (returns `None`).
pub async fn sync_note<S, C>(
    store: &S,
    retriever: &mut Retriever<C>,
    options: &NoteOptions,
    path: &str,
    use_proxy: bool,
) -> Result<Option<String>>
where
    S: NoteStore,
    C: MarkdownConvert,
{
    let content = store.read_note(path).await?;

    let front_matter = match FrontMatter::parse(&content)? {
        Some(front_matter) => front_matter,
        None => {
            tracing::debug!("{} has no front matter, skipping", path);
            return Ok(None);
        }
    };
    let url = match front_matter.attribute(&options.url_attribute) {
        Some(url) => url,
        None => {
            tracing::debug!("{} has no {} attribute, skipping", path, options.url_attribute);
            return Ok(None);
        }
    };

    let result = retrieve(retriever, &url, use_proxy).await;

    let new_content = format!("{}\n{}", front_matter.raw(), result.markdown);
    store.write_note(path, &new_content).await?;

    let new_path = store
        .rename_note(path, &note_stem(&result.title, &url))
        .await?;
    tracing::info!("refreshed {} from {}", new_path, url);
    Ok(Some(new_path))
}

async fn retrieve<C: MarkdownConvert>(
    retriever: &mut Retriever<C>,
    url: &str,
    use_proxy: bool,
) -> RetrievalResult {
    if use_proxy {
        retriever.download_as_markdown_using_proxy(url).await
    } else {
        retriever.download_as_markdown(url).await
    }
}

/// Normalized title, or the URL host when the title normalizes to nothing,
/// so a file can be named even for a failed retrieval.
fn note_stem(title: &str, url: &str) -> String {
    let stem = normalize_file_name(title);
    if !stem.trim().is_empty() {
        return stem;
    }
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| "untitled".to_string())
}

/// The leading `---` delimited YAML block of a note.
pub struct FrontMatter {
    raw: String,
    values: serde_yaml::Value,
}

impl FrontMatter {
    /// `None` when the note has no front-matter block; an error when the
    /// block exists but is not valid YAML.
    pub fn parse(content: &str) -> Result<Option<FrontMatter>> {
        let rest = match content.strip_prefix("---\n") {
            Some(rest) => rest,
            None => return Ok(None),
        };

        let (yaml, raw_len) = if let Some(end) = rest.find("\n---\n") {
            (&rest[..end], "---\n".len() + end + "\n---".len())
        } else if rest.ends_with("\n---") {
            (&rest[..rest.len() - "\n---".len()], content.len())
        } else {
            return Ok(None);
        };

        let values: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        Ok(Some(FrontMatter {
            raw: content[..raw_len].to_string(),
            values,
        }))
    }

    /// The raw block, both delimiter lines included, no trailing newline.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}
