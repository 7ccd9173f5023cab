//! Filesystem adapter for daily notes
//!
//! Implements [`IDailyNoteVault`] with `tokio::fs`. Notes live at
//! `<vault>/<folder>/<date formatted with the daily format>.md`;
//! attachments at vault-relative paths. Writes go to a temporary sibling
//! first and are renamed into place.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context};
use memosync_core::config::DailyNotesConfig;
use memosync_core::domain::DateKey;
use memosync_core::ports::IDailyNoteVault;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct MarkdownVault {
    root: PathBuf,
    folder: String,
    format: String,
}

impl MarkdownVault {
    pub fn new(root: impl Into<PathBuf>, folder: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            folder: folder.into(),
            format: format.into(),
        }
    }

    pub fn from_config(config: &DailyNotesConfig) -> Self {
        Self::new(config.vault_path(), config.folder.clone(), config.format.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the daily note for `date`
    pub fn note_path(&self, date: &DateKey) -> anyhow::Result<PathBuf> {
        let stem = date.format(&self.format)?;
        let relative = format!("{}/{}.md", self.folder.trim_matches('/'), stem);
        self.resolve(relative.trim_start_matches('/'))
    }

    /// Joins a `/`-separated relative path onto the root, refusing escapes
    fn resolve(&self, relative: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(relative);
        if relative.as_os_str().is_empty() {
            bail!("empty vault path");
        }
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => bail!("path '{}' escapes the vault", relative.display()),
            }
        }
        Ok(self.root.join(relative))
    }
}

async fn write_atomic(target: &Path, data: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let tmp_path = {
        let mut p = target.as_os_str().to_owned();
        p.push(".memosync.tmp");
        PathBuf::from(p)
    };

    tokio::fs::write(&tmp_path, data)
        .await
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    if let Err(err) = tokio::fs::rename(&tmp_path, target).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(err).with_context(|| format!("Failed to replace {}", target.display()));
    }
    Ok(())
}

#[async_trait::async_trait]
impl IDailyNoteVault for MarkdownVault {
    #[instrument(skip(self), fields(date = %date))]
    async fn read_daily_note(&self, date: &DateKey) -> anyhow::Result<Option<String>> {
        let path = self.note_path(date)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                debug!(path = %path.display(), bytes = text.len(), "Read daily note");
                Ok(Some(text))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    #[instrument(skip(self, content), fields(date = %date, bytes = content.len()))]
    async fn write_daily_note(&self, date: &DateKey, content: &str) -> anyhow::Result<()> {
        let path = self.note_path(date)?;
        write_atomic(&path, content.as_bytes()).await?;
        debug!(path = %path.display(), "Wrote daily note");
        Ok(())
    }

    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn write_attachment(&self, relative_path: &str, data: &[u8]) -> anyhow::Result<()> {
        let path = self.resolve(relative_path)?;
        write_atomic(&path, data).await
    }
}
