use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::domain::ports::NoteStore;
use crate::utils::error::{PagemarkError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};

#[derive(Debug, Clone, Parser)]
#[command(name = "pagemark")]
#[command(about = "Capture web pages as markdown notes")]
pub struct CliConfig {
    /// URL to capture as a new note.
    #[arg(long, conflicts_with = "sync")]
    pub url: Option<String>,

    /// Existing note to refresh from the URL in its front matter.
    #[arg(long)]
    pub sync: Option<String>,

    /// Route the fetch through a local reverse proxy.
    #[arg(long)]
    pub proxy: bool,

    /// Folder (under the notes root) for captured notes.
    #[arg(long)]
    pub folder: Option<String>,

    /// Front-matter attribute holding the source URL.
    #[arg(long)]
    pub attribute: Option<String>,

    /// Notes root directory.
    #[arg(long, default_value = ".")]
    pub notes_root: String,

    /// First port tried when spinning up the reverse proxy.
    #[arg(long)]
    pub base_port: Option<u16>,

    /// TOML configuration file; flags win over file values.
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.url.is_none() && self.sync.is_none() {
            return Err(PagemarkError::MissingConfig {
                field: "url or sync".to_string(),
            });
        }
        if let Some(url) = &self.url {
            validate_url("url", url)?;
        }
        if let Some(attribute) = &self.attribute {
            validate_non_empty_string("attribute", attribute)?;
        }
        Ok(())
    }
}

/// Filesystem note store rooted at a base directory.
#[derive(Debug, Clone)]
pub struct LocalNoteStore {
    base_path: String,
}

impl LocalNoteStore {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl NoteStore for LocalNoteStore {
    async fn read_note(&self, path: &str) -> Result<String> {
        Ok(fs::read_to_string(self.full_path(path))?)
    }

    async fn write_note(&self, path: &str, content: &str) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, content)?;
        Ok(())
    }

    async fn rename_note(&self, path: &str, new_stem: &str) -> Result<String> {
        let full_path = self.full_path(path);
        let new_name = format!("{}.md", new_stem);
        let new_full_path = full_path.with_file_name(&new_name);

        fs::rename(&full_path, &new_full_path)?;

        let new_path = match Path::new(path).parent() {
            Some(parent) if parent != Path::new("") => parent
                .join(&new_name)
                .to_string_lossy()
                .into_owned(),
            _ => new_name,
        };
        Ok(new_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read_note() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalNoteStore::new(temp_dir.path().to_str().unwrap().to_string());

        store.write_note("a/b.md", "content").await.unwrap();
        let content = store.read_note("a/b.md").await.unwrap();

        assert_eq!(content, "content");
    }

    #[tokio::test]
    async fn test_rename_note_keeps_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalNoteStore::new(temp_dir.path().to_str().unwrap().to_string());

        store.write_note("inbox/old.md", "x").await.unwrap();
        let new_path = store.rename_note("inbox/old.md", "New Title").await.unwrap();

        assert_eq!(new_path, "inbox/New Title.md");
        assert_eq!(store.read_note(&new_path).await.unwrap(), "x");
        assert!(store.read_note("inbox/old.md").await.is_err());
    }

    #[test]
    fn test_cli_requires_url_or_sync() {
        let config = CliConfig::parse_from(["pagemark"]);
        assert!(config.validate().is_err());

        let config = CliConfig::parse_from(["pagemark", "--url", "https://example.com"]);
        assert!(config.validate().is_ok());

        let config = CliConfig::parse_from(["pagemark", "--sync", "note.md"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_rejects_bad_url() {
        let config = CliConfig::parse_from(["pagemark", "--url", "not-a-url"]);
        assert!(config.validate().is_err());
    }
}
