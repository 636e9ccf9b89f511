use std::{
    fs,
    path::{Path, PathBuf},
};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Scene image handed to the model alongside the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRef {
    /// An http(s) or `data:` URL the completion service can fetch as is.
    Url(String),
    /// A local image file, inlined as a base64 data URL.
    Path(PathBuf),
}

impl ImageRef {
    pub fn url(url: impl Into<String>) -> Self {
        ImageRef::Url(url.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        ImageRef::Path(path.into())
    }

    /// Resolves the reference into the URL placed in the user turn.
    pub fn to_url(&self) -> Result<String, TaskError> {
        match self {
            ImageRef::Url(url) => {
                let trimmed = url.trim();
                if trimmed.is_empty() {
                    return Err(TaskError::Image("image url is empty".to_string()));
                }
                Ok(trimmed.to_string())
            }
            ImageRef::Path(path) => path_to_data_url(path),
        }
    }
}

fn path_to_data_url(path: &Path) -> Result<String, TaskError> {
    let bytes = fs::read(path)
        .map_err(|e| TaskError::Image(format!("failed reading {}: {e}", path.display())))?;
    let mime = mime_for_path(path).unwrap_or("image/png");
    Ok(format!("data:{mime};base64,{}", BASE64.encode(bytes)))
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}
