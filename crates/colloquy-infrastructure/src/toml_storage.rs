//! TOML-based ContextStorage implementation.

use crate::dto::ContextDto;
use anyhow::Context as _;
use async_trait::async_trait;
use colloquy_core::error::{ColloquyError, Result};
use colloquy_core::{Context, ContextStorage, HistoryField};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A storage backend keeping one TOML file per context.
///
/// The directory structure is created on construction:
/// ```text
/// base_dir/
/// └── contexts/
///     ├── context-id-1.toml
///     └── context-id-2.toml
/// ```
///
/// Contexts are persisted through [`ContextDto`]; the engine-owned scratch
/// state is never written to disk.
pub struct TomlContextStorage {
    base_dir: PathBuf,
}

impl TomlContextStorage {
    /// Creates a `TomlContextStorage` rooted at the given base directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory structure cannot be created.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let contexts_dir = base_dir.join("contexts");
        fs::create_dir_all(&contexts_dir)?;
        Ok(Self { base_dir })
    }

    /// Creates a `TomlContextStorage` at the default location (`~/.colloquy`).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or if the
    /// directory structure cannot be created.
    pub fn default_location() -> Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| ColloquyError::io("failed to get home directory"))?;
        Self::new(home_dir.join(".colloquy"))
    }

    /// Returns the file path for a given context ID.
    fn context_file_path(&self, context_id: &str) -> PathBuf {
        self.base_dir
            .join("contexts")
            .join(format!("{context_id}.toml"))
    }

    fn read_context(&self, context_id: &str) -> anyhow::Result<Option<Context>> {
        let path = self.context_file_path(context_id);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read context file {}", path.display()))?;
        let dto: ContextDto = toml::from_str(&text)
            .with_context(|| format!("failed to parse context file {}", path.display()))?;
        Ok(Some(dto.into()))
    }

    fn write_context(&self, context: &Context) -> anyhow::Result<()> {
        let path = self.context_file_path(&context.id);
        let dto = ContextDto::from(context);
        let text = toml::to_string_pretty(&dto)
            .with_context(|| format!("failed to serialize context '{}'", context.id))?;
        fs::write(&path, text)
            .with_context(|| format!("failed to write context file {}", path.display()))?;
        debug!(context_id = %context.id, path = %path.display(), "context persisted");
        Ok(())
    }
}

#[async_trait]
impl ContextStorage for TomlContextStorage {
    async fn get(&self, context_id: &str) -> Result<Option<Context>> {
        self.read_context(context_id)
            .map_err(|e| ColloquyError::storage(e.to_string()))
    }

    async fn put(&self, context: &Context) -> Result<()> {
        self.write_context(context)
            .map_err(|e| ColloquyError::storage(e.to_string()))
    }

    async fn contains(&self, context_id: &str) -> Result<bool> {
        Ok(self.context_file_path(context_id).exists())
    }

    async fn delete(&self, context_id: &str) -> Result<()> {
        let path = self.context_file_path(context_id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    async fn clear(
        &self,
        context_id: &str,
        keep_last: usize,
        fields: &[HistoryField],
    ) -> Result<()> {
        let mut context = self
            .read_context(context_id)
            .map_err(|e| ColloquyError::storage(e.to_string()))?
            .ok_or_else(|| ColloquyError::not_found("context", context_id))?;
        context.clear(keep_last, fields);
        self.write_context(&context)
            .map_err(|e| ColloquyError::storage(e.to_string()))
    }
}
