//! Candidate URL derivation
//!
//! Fixed order:
//!
//! 1. provider streaming URL (the original URL when no file id is known)
//! 2. the original URL
//! 3. provider download URL, when a file id is known
//! 4. provider preview/embed URL, when a file id is known

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `/file/d/<id>/...` share links
static SHARE_PATH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/file/d/(?<id>[A-Za-z0-9_-]+)").unwrap());

/// `...?id=<id>` and `...&id=<id>` links
static ID_QUERY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]id=(?<id>[A-Za-z0-9_-]+)").unwrap());

/// Placeholder substituted with the URL-encoded file id
pub const FILE_ID_PLACEHOLDER: &str = "{id}";

/// A video to resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    /// URL as given by the content author
    pub primary_url: String,
    /// Video host file id, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_file_id: Option<String>,
}

impl MediaDescriptor {
    /// Descriptor without an explicit file id
    pub fn new(primary_url: impl Into<String>) -> Self {
        Self {
            primary_url: primary_url.into(),
            provider_file_id: None,
        }
    }

    /// Attach an explicit file id
    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.provider_file_id = Some(file_id.into());
        self
    }

    /// Explicit file id, falling back to one found in the primary URL
    pub fn resolved_file_id(&self) -> Option<String> {
        self.provider_file_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| extract_file_id(&self.primary_url))
    }
}

/// URL templates of the video host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoHostConfig {
    /// Streaming-optimized view URL
    pub stream_template: String,
    /// Direct download URL
    pub download_template: String,
    /// Embeddable preview URL
    pub preview_template: String,
}

impl Default for VideoHostConfig {
    fn default() -> Self {
        Self {
            stream_template: "https://drive.google.com/uc?export=view&id={id}".to_string(),
            download_template: "https://drive.google.com/uc?export=download&id={id}".to_string(),
            preview_template: "https://drive.google.com/file/d/{id}/preview".to_string(),
        }
    }
}

impl VideoHostConfig {
    fn render(template: &str, file_id: &str) -> String {
        template.replace(FILE_ID_PLACEHOLDER, &urlencoding::encode(file_id))
    }

    /// Streaming URL for `file_id`
    pub fn stream_url(&self, file_id: &str) -> String {
        Self::render(&self.stream_template, file_id)
    }

    /// Download URL for `file_id`
    pub fn download_url(&self, file_id: &str) -> String {
        Self::render(&self.download_template, file_id)
    }

    /// Preview URL for `file_id`
    pub fn preview_url(&self, file_id: &str) -> String {
        Self::render(&self.preview_template, file_id)
    }
}

/// Candidate list options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CandidateOptions {
    /// Drop later duplicates of an earlier candidate
    pub dedupe: bool,
    /// Host URL templates
    pub host: VideoHostConfig,
}

/// Pull a host file id out of a share link.
pub fn extract_file_id(url: &str) -> Option<String> {
    SHARE_PATH_REGEX
        .captures(url)
        .or_else(|| ID_QUERY_REGEX.captures(url))
        .and_then(|caps| caps.name("id"))
        .map(|m| m.as_str().to_string())
}

/// Ordered retrieval URLs for `descriptor`. Never empty.
pub fn build_candidates(descriptor: &MediaDescriptor, options: &CandidateOptions) -> Vec<String> {
    let primary = descriptor.primary_url.clone();
    let file_id = descriptor.resolved_file_id();

    let mut candidates = Vec::with_capacity(4);
    match &file_id {
        Some(id) => {
            candidates.push(options.host.stream_url(id));
            candidates.push(primary);
            candidates.push(options.host.download_url(id));
            candidates.push(options.host.preview_url(id));
        }
        None => {
            candidates.push(primary.clone());
            candidates.push(primary);
        }
    }

    if options.dedupe {
        let mut seen = std::collections::HashSet::new();
        candidates.retain(|url| seen.insert(url.clone()));
    }

    debug!(
        url = %descriptor.primary_url,
        file_id = ?file_id,
        count = candidates.len(),
        "Built video candidates"
    );
    candidates
}
