use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};

use super::DocumentError;
use crate::config::DocumentsConfig;

/// Files making up one saved document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDocument {
    pub document: Option<Value>,
    pub styles: Option<String>,
    pub thumbnails: Option<Value>,
}

/// Files making up one template
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFiles {
    pub document: Option<Value>,
    pub styles: Option<String>,
    pub page_styles: Option<Value>,
    pub thumbnails: Option<Value>,
    pub metadata: Option<Value>,
}

/// Per-user document tree with a staging area for in-progress saves
#[derive(Clone)]
pub struct DocumentStore {
    root: PathBuf,
    templates: PathBuf,
}

impl DocumentStore {
    pub fn new(config: &DocumentsConfig) -> Self {
        Self {
            root: config.root_dir.clone(),
            templates: config.templates_dir.clone(),
        }
    }

    fn staging_dir(&self, user_id: &str) -> PathBuf {
        self.root.join("temp").join(user_id)
    }

    /// Stage one page's elements and thumbnail for a user.
    pub async fn save_page(
        &self,
        user_id: &str,
        page_id: &str,
        elements: &Value,
        thumbnail: &Value,
    ) -> Result<(), DocumentError> {
        validate_name(user_id)?;
        validate_name(page_id)?;

        let dir = self.staging_dir(user_id);
        tokio::fs::create_dir_all(&dir).await?;

        tokio::fs::write(
            dir.join(format!("{page_id}.json")),
            serde_json::to_vec(elements)?,
        )
        .await?;
        tokio::fs::write(
            dir.join(format!("{page_id}-thumbnail.json")),
            serde_json::to_vec(&json!({ "thumbnail": thumbnail }))?,
        )
        .await?;

        Ok(())
    }

    /// Assemble the staged pages into a finished document folder.
    ///
    /// The target folder name comes from `metadata.folderName`; the staging
    /// area is dropped once everything is written.
    pub async fn finalize(
        &self,
        user_id: &str,
        styles: &str,
        metadata: &Value,
    ) -> Result<(), DocumentError> {
        validate_name(user_id)?;
        let folder = metadata
            .get("folderName")
            .and_then(Value::as_str)
            .ok_or(DocumentError::MissingFolderName)?;
        validate_name(folder)?;

        let staging = self.staging_dir(user_id);
        let final_dir = self.root.join(user_id).join(folder);
        tokio::fs::create_dir_all(&final_dir).await?;

        let mut document = serde_json::Map::new();
        let mut thumbnails = serde_json::Map::new();

        let mut entries = tokio::fs::read_dir(&staging).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".json") || name.contains("-thumbnail") {
                continue;
            }
            let page_id = name.trim_end_matches(".json").to_string();

            let elements: Value = serde_json::from_slice(&tokio::fs::read(entry.path()).await?)?;
            document.insert(page_id.clone(), elements);

            // A missing thumbnail file is recorded as null, not an error.
            let thumb_path = staging.join(format!("{page_id}-thumbnail.json"));
            let thumbnail = match tokio::fs::read(&thumb_path).await {
                Ok(bytes) => serde_json::from_slice::<Value>(&bytes)
                    .ok()
                    .and_then(|v| v.get("thumbnail").cloned())
                    .unwrap_or(Value::Null),
                Err(_) => Value::Null,
            };
            thumbnails.insert(page_id, thumbnail);
        }

        tokio::fs::write(
            final_dir.join("document.json"),
            serde_json::to_vec(&document)?,
        )
        .await?;
        tokio::fs::write(
            final_dir.join("thumbnails.json"),
            serde_json::to_vec(&thumbnails)?,
        )
        .await?;
        tokio::fs::write(final_dir.join("styles.html"), styles).await?;
        tokio::fs::write(
            final_dir.join("metadata.json"),
            serde_json::to_vec_pretty(metadata)?,
        )
        .await?;

        if let Err(e) = tokio::fs::remove_dir_all(&staging).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to clear staging directory");
        }

        tracing::info!(user_id = %user_id, folder = %folder, pages = document.len(), "Finalized document");
        Ok(())
    }

    /// Load a saved document, tolerating individually missing files.
    pub async fn load(
        &self,
        user_id: &str,
        folder: &str,
    ) -> Result<Option<SavedDocument>, DocumentError> {
        validate_name(user_id)?;
        validate_name(folder)?;

        let dir = self.root.join(user_id).join(folder);
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(None);
        }

        Ok(Some(SavedDocument {
            document: read_json_opt(&dir.join("document.json")).await,
            styles: read_text_opt(&dir.join("styles.html")).await,
            thumbnails: read_json_opt(&dir.join("thumbnails.json")).await,
        }))
    }

    /// Delete a saved document folder. Returns true iff it existed.
    pub async fn delete(&self, user_id: &str, folder: &str) -> Result<bool, DocumentError> {
        validate_name(user_id)?;
        validate_name(folder)?;

        let dir = self.root.join(user_id).join(folder);
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(false);
        }

        tokio::fs::remove_dir_all(&dir).await?;
        tracing::info!(user_id = %user_id, folder = %folder, "Deleted document");
        Ok(true)
    }

    /// Load a template by kind.
    pub async fn template(&self, kind: &str) -> Result<Option<TemplateFiles>, DocumentError> {
        let folder = template_folder(kind)
            .ok_or_else(|| DocumentError::UnknownTemplate(kind.to_string()))?;

        let dir = self.templates.join(folder);
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(None);
        }

        Ok(Some(TemplateFiles {
            document: read_json_opt(&dir.join("document.json")).await,
            styles: read_text_opt(&dir.join("styles.html")).await,
            page_styles: read_json_opt(&dir.join("pageStyles.json")).await,
            thumbnails: read_json_opt(&dir.join("thumbnails.json")).await,
            metadata: read_json_opt(&dir.join("metadata.json")).await,
        }))
    }
}

fn template_folder(kind: &str) -> Option<&'static str> {
    match kind {
        "blank" => Some("blank-page"),
        "resume" => Some("Professional-Resume"),
        "meeting" => Some("meeting-notes"),
        "report" => Some("report"),
        _ => None,
    }
}

/// All client-supplied path segments share the folder-name rule: 1-255
/// chars of `[A-Za-z0-9_-]`. Anything else could escape the document tree.
fn validate_name(name: &str) -> Result<(), DocumentError> {
    let valid = !name.is_empty()
        && name.len() <= 255
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(DocumentError::InvalidName(name.to_string()))
    }
}

async fn read_json_opt(path: &Path) -> Option<Value> {
    let bytes = tokio::fs::read(path).await.ok()?;
    serde_json::from_slice(&bytes).ok()
}

async fn read_text_opt(path: &Path) -> Option<String> {
    tokio::fs::read_to_string(path).await.ok()
}
