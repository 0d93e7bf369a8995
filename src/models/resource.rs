//! Knowledge-base resources: uploaded files and external links.

use serde::{Deserialize, Serialize};

use super::double_option;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    File,
    Link,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::File => "file",
            ResourceKind::Link => "link",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "file" => Some(ResourceKind::File),
            "link" => Some(ResourceKind::Link),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub kind: ResourceKind,
    pub tipo_recurso_id: Option<String>,
    pub tags: Vec<String>,
    /// Object key in storage; `None` for links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    pub url: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Resource {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Resource title is required".to_string()));
        }
        if self.kind == ResourceKind::Link && !is_http_url(&self.url) {
            return Err(AppError::Validation(
                "Link resources need an http(s) URL".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub tipo_recurso_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Metadata update; file contents are immutable once uploaded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tipo_recurso_id: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Only accepted for link resources
    #[serde(default)]
    pub url: Option<String>,
}

/// Fields collected from a multipart upload.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub title: String,
    pub description: Option<String>,
    pub tipo_recurso_id: Option<String>,
    pub tags: Vec<String>,
    pub file_name: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFilter {
    pub kind: Option<ResourceKind>,
    pub tipo_recurso_id: Option<String>,
    pub tag: Option<String>,
}

/// Trim, lowercase, drop empties and duplicates, keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/'))
}
