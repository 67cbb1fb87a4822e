//! File resolution and the anti-cache response.

use std::io;
use std::path::{Component, Path, PathBuf};

use axum::{
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// Path prefix owned by the static asset server.
pub const ASSET_PREFIX: &str = "/_utils";

/// Sent as `Expires` so every cache treats the file as stale.
pub const EXPIRED_DATE: &str = "Fri, 01 Jan 1990 00:00:00 GMT";

const CONTENT_SIZE: HeaderName = HeaderName::from_static("content-size");

/// Everything needed to answer for one existing file.
#[derive(Debug, Clone)]
pub struct StaticFileDescriptor {
    pub absolute_path: PathBuf,
    pub content_type: String,
    pub size: u64,
    /// Random per request, never derived from the file.
    pub etag: String,
}

impl StaticFileDescriptor {
    fn into_response(self, contents: Vec<u8>) -> Response {
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, self.content_type),
                (CONTENT_SIZE, self.size.to_string()),
                (header::CACHE_CONTROL, "no-cache".to_string()),
                (header::EXPIRES, EXPIRED_DATE.to_string()),
                (header::PRAGMA, "no-cache".to_string()),
                (header::ETAG, self.etag),
            ],
            contents,
        )
            .into_response()
    }
}

/// Serves files from the document root.
#[derive(Debug, Clone)]
pub struct AssetServer {
    root: PathBuf,
    confine_to_root: bool,
}

impl AssetServer {
    /// The root is made absolute once, at startup.
    pub fn new(document_root: &Path, confine_to_root: bool) -> io::Result<Self> {
        Ok(Self {
            root: normalize(&std::path::absolute(document_root)?),
            confine_to_root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a raw request path (query already removed) onto the filesystem.
    ///
    /// Returns `None` when confinement is on and the path leaves the root.
    pub fn resolve(&self, raw_path: &str) -> Option<PathBuf> {
        let rest = raw_path
            .strip_prefix(ASSET_PREFIX)
            .unwrap_or(raw_path)
            .trim_start_matches('/');

        let mut path = self.root.join(rest);
        if rest.is_empty() || rest.ends_with('/') {
            path.push("index.html");
        }
        let path = normalize(&path);

        if self.confine_to_root && !path.starts_with(&self.root) {
            tracing::warn!(
                path = %path.display(),
                root = %self.root.display(),
                "Refusing asset outside document root"
            );
            return None;
        }
        Some(path)
    }

    /// Describe `path` if it is an existing regular file.
    pub async fn describe(&self, path: PathBuf) -> Option<StaticFileDescriptor> {
        let metadata = tokio::fs::metadata(&path).await.ok()?;
        if !metadata.is_file() {
            return None;
        }

        let content_type = mime_guess::from_path(&path).first_or_text_plain().to_string();
        Some(StaticFileDescriptor {
            absolute_path: path,
            content_type,
            size: metadata.len(),
            etag: Uuid::new_v4().simple().to_string().to_uppercase(),
        })
    }

    /// Answer for `raw`, a request-target with its query removed:
    /// 200 with the file or 404.
    pub async fn serve(&self, raw: String) -> Response {
        let Some(path) = self.resolve(&raw) else {
            return not_found();
        };
        let Some(file) = self.describe(path).await else {
            tracing::debug!(raw_target = %raw, "Asset not found");
            return not_found();
        };

        match tokio::fs::read(&file.absolute_path).await {
            Ok(contents) => file.into_response(contents),
            Err(e) => {
                tracing::warn!(
                    path = %file.absolute_path.display(),
                    error = %e,
                    "Failed to read asset"
                );
                not_found()
            }
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "File not found").into_response()
}

/// Collapse `.` and `..` without touching the filesystem.
///
/// `..` never climbs above the filesystem root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
