//! Static web UI served from the document store's root.
//!
//! Any non-API `GET` is mapped onto a file under the root.  Directory
//! paths fall back to `index.html`, and a pre-compressed `<file>.gz` is
//! served when the plain file is absent.  The credentials document
//! shares the root and is never served.

use std::path::{Component, Path, PathBuf};

/// File served for `/` and any path ending in `/`.
pub const DEFAULT_FILE: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: PathBuf,
    pub content_type: &'static str,
    /// Body is gzip; answer with `Content-Encoding: gzip`.
    pub gzipped: bool,
}

/// Resolve a request URI to a file under `root`.
///
/// Query strings are ignored.  `None` on parent-directory components, for
/// the `private` document, or when nothing matching exists.
pub fn locate(root: &Path, uri: &str, private: &str) -> Option<Asset> {
    let rel = relative_path(uri)?;
    if rel == Path::new(private.trim_start_matches('/')) {
        return None;
    }
    let content_type = content_type(&rel);

    let plain = root.join(&rel);
    if plain.is_file() {
        return Some(Asset {
            path: plain,
            content_type,
            gzipped: false,
        });
    }

    let mut gz = plain.into_os_string();
    gz.push(".gz");
    let gz = PathBuf::from(gz);
    gz.is_file().then_some(Asset {
        path: gz,
        content_type,
        gzipped: true,
    })
}

fn relative_path(uri: &str) -> Option<PathBuf> {
    let path = uri.split(['?', '#']).next().unwrap_or_default();
    let mut rel = PathBuf::new();
    for part in Path::new(path.trim_start_matches('/')).components() {
        match part {
            Component::Normal(p) => rel.push(p),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if path.is_empty() || path.ends_with('/') {
        rel.push(DEFAULT_FILE);
    }
    Some(rel)
}

/// MIME type from the file extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
