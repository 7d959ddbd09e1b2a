//! Configuration management for Folio Server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::storage::{MAX_FILE_AGE_SECS, MAX_UPLOAD_BYTES, REAPER_INTERVAL_SECS};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub convert: ConvertConfig,
    pub render: RenderConfig,
    pub documents: DocumentsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded PDFs and the registry snapshot
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub reaper_interval_secs: u64,
    pub max_file_age_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    /// PDF-to-HTML converter jar
    pub converter_jar: PathBuf,
    pub java_bin: String,
    pub ocrmypdf_bin: String,
    pub pdfinfo_bin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub chromium_bin: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsConfig {
    /// Root of the per-user saved-document tree
    pub root_dir: PathBuf,
    pub templates_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 2025,
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("/tmp/pdf-storage"),
                max_upload_bytes: MAX_UPLOAD_BYTES,
                reaper_interval_secs: REAPER_INTERVAL_SECS,
                max_file_age_secs: MAX_FILE_AGE_SECS,
            },
            convert: ConvertConfig {
                converter_jar: PathBuf::from("./tools/PDFToHTML.jar"),
                java_bin: "java".to_string(),
                ocrmypdf_bin: "ocrmypdf".to_string(),
                pdfinfo_bin: "pdfinfo".to_string(),
            },
            render: RenderConfig {
                chromium_bin: "chromium".to_string(),
                timeout_secs: 30,
            },
            documents: DocumentsConfig {
                root_dir: PathBuf::from("/home/pdf"),
                templates_dir: PathBuf::from("/home/templates"),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.upload_dir),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.storage.max_upload_bytes),
                reaper_interval_secs: env::var("REAPER_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.storage.reaper_interval_secs),
                max_file_age_secs: env::var("MAX_FILE_AGE_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.storage.max_file_age_secs),
            },
            convert: ConvertConfig {
                converter_jar: env::var("CONVERTER_JAR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.convert.converter_jar),
                java_bin: env::var("JAVA_BIN").unwrap_or(defaults.convert.java_bin),
                ocrmypdf_bin: env::var("OCRMYPDF_BIN").unwrap_or(defaults.convert.ocrmypdf_bin),
                pdfinfo_bin: env::var("PDFINFO_BIN").unwrap_or(defaults.convert.pdfinfo_bin),
            },
            render: RenderConfig {
                chromium_bin: env::var("CHROMIUM_BIN").unwrap_or(defaults.render.chromium_bin),
                timeout_secs: env::var("RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.render.timeout_secs),
            },
            documents: DocumentsConfig {
                root_dir: env::var("DOCUMENTS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.documents.root_dir),
                templates_dir: env::var("TEMPLATES_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.documents.templates_dir),
            },
        }
    }
}
