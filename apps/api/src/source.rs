//! Source material: the candidate's full resume and their personal information.
//!
//! Both live as JSON files under `DATA_DIR`. Personal information is read only
//! at finalization; the resume handed to workflows never carries it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::AppError;
use crate::models::personal_info::PersonalInfo;
use crate::models::resume::Resume;

pub const FULL_RESUME_FILE: &str = "full_resume.json";
pub const PRIVATE_INFO_FILE: &str = "private_info.json";

#[async_trait]
pub trait SourceMaterial: Send + Sync {
    /// The un-refined resume, personal information stripped.
    async fn full_resume(&self) -> Result<Resume, AppError>;

    async fn personal_info(&self) -> Result<PersonalInfo, AppError>;
}

/// Reads source material from a data directory.
pub struct FileSourceMaterial {
    data_dir: PathBuf,
}

impl FileSourceMaterial {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

#[async_trait]
impl SourceMaterial for FileSourceMaterial {
    async fn full_resume(&self) -> Result<Resume, AppError> {
        let resume: Resume = read_json(&self.data_dir.join(FULL_RESUME_FILE)).await?;
        Ok(resume.anonymized())
    }

    async fn personal_info(&self) -> Result<PersonalInfo, AppError> {
        read_json(&self.data_dir.join(PRIVATE_INFO_FILE)).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!(
                "Source file {} does not exist",
                path.display()
            )))
        }
        Err(e) => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "Failed to read {}: {e}",
                path.display()
            )))
        }
    };
    debug!("Loaded {} ({} bytes)", path.display(), raw.len());
    serde_json::from_str(&raw)
        .map_err(|e| AppError::Validation(format!("{} is malformed: {e}", path.display())))
}

/// In-memory source material for tests.
#[cfg(test)]
pub struct StaticSourceMaterial {
    resume: Resume,
    personal: Option<PersonalInfo>,
}

#[cfg(test)]
impl StaticSourceMaterial {
    pub fn new(resume: Resume, personal: Option<PersonalInfo>) -> Self {
        Self { resume, personal }
    }
}

#[cfg(test)]
#[async_trait]
impl SourceMaterial for StaticSourceMaterial {
    async fn full_resume(&self) -> Result<Resume, AppError> {
        Ok(self.resume.anonymized())
    }

    async fn personal_info(&self) -> Result<PersonalInfo, AppError> {
        self.personal
            .clone()
            .ok_or_else(|| AppError::NotFound("No personal information on file".to_string()))
    }
}
