//! Static asset responder.
//!
//! Files are resolved under a web root canonicalized once at startup. The
//! resolved file must canonicalize to a path inside that root; anything else
//! (missing file, directory, `..` escape, symlink out of the root) is a 404.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use sysguard_core::error::Result;
use sysguard_core::protocol::http::{self, content_type_for, ResponseHead, StatusCode};

use crate::config::AssetsSection;

/// Body chunk size.
pub const CHUNK_BYTES: usize = 8192;

/// Canonicalized web root.
#[derive(Debug, Clone)]
pub struct WebRoot {
    canonical: Option<PathBuf>,
}

impl WebRoot {
    /// Canonicalize `path`. A missing root is not fatal: every lookup 404s.
    pub fn open(path: &Path) -> Self {
        let canonical = match std::fs::canonicalize(path) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(web_root = %path.display(), error = %e, "web root unavailable; assets will 404");
                None
            }
        };
        Self { canonical }
    }

    /// Resolve `rel` to a regular file inside the root.
    pub async fn resolve(&self, rel: &str) -> Option<PathBuf> {
        let root = self.canonical.as_ref()?;
        let resolved = tokio::fs::canonicalize(root.join(rel)).await.ok()?;
        if !resolved.starts_with(root) {
            warn!(requested = rel, "asset path escapes web root");
            return None;
        }
        let meta = tokio::fs::metadata(&resolved).await.ok()?;
        meta.is_file().then_some(resolved)
    }
}

async fn open_asset(root: &WebRoot, rel: &str) -> Option<(PathBuf, File, u64)> {
    let path = root.resolve(rel).await?;
    let file = File::open(&path).await.ok()?;
    let len = file.metadata().await.ok()?.len();
    Some((path, file, len))
}

/// Write `rel` (or a 404) to `out`.
pub async fn serve<W>(out: &mut W, root: &WebRoot, assets: &AssetsSection, rel: &str) -> Result<StatusCode>
where
    W: AsyncWrite + Unpin,
{
    let mut found = open_asset(root, rel).await;
    if found.is_none() && assets.fallback_to_index && rel != assets.index {
        found = open_asset(root, &assets.index).await;
    }

    let Some((path, file, len)) = found else {
        debug!(requested = rel, "asset not found");
        out.write_all(&http::not_found()).await?;
        out.flush().await?;
        return Ok(StatusCode::NotFound);
    };

    let head = ResponseHead::new(StatusCode::Ok)
        .header("Content-Type", content_type_for(&path))
        .content_length(len)
        .header("Connection", "close");
    out.write_all(head.encode().as_bytes()).await?;

    // Never send more than the advertised length, even if the file grows.
    let mut body = file.take(len);
    let mut buf = vec![0u8; CHUNK_BYTES];
    loop {
        let n = body.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n]).await?;
    }
    out.flush().await?;
    Ok(StatusCode::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site() -> (tempfile::TempDir, WebRoot) {
        let dir = tempfile::tempdir().unwrap();
        let web = dir.path().join("web");
        fs::create_dir(&web).unwrap();
        fs::write(web.join("index.html"), "<h1>SysGuard</h1>").unwrap();
        fs::write(web.join("dashboard.js"), "console.log('ok');").unwrap();
        fs::write(dir.path().join("secret.txt"), "top secret").unwrap();
        let root = WebRoot::open(&web);
        (dir, root)
    }

    async fn get(root: &WebRoot, assets: &AssetsSection, rel: &str) -> (StatusCode, String) {
        let mut out = Vec::new();
        let status = serve(&mut out, root, assets, rel).await.unwrap();
        (status, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn serves_file_with_type_and_length() {
        let (_dir, root) = site();
        let (status, resp) = get(&root, &AssetsSection::default(), "dashboard.js").await;
        assert_eq!(status, StatusCode::Ok);
        assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(resp.contains("Content-Type: application/javascript\r\n"));
        assert!(resp.contains("Content-Length: 18\r\n"));
        assert!(resp.contains("Connection: close\r\n"));
        assert!(resp.ends_with("\r\n\r\nconsole.log('ok');"));
    }

    #[tokio::test]
    async fn traversal_is_a_not_found() {
        let (_dir, root) = site();
        let (status, resp) = get(&root, &AssetsSection::default(), "../secret.txt").await;
        assert_eq!(status, StatusCode::NotFound);
        assert!(resp.ends_with("Not Found"));
        assert!(!resp.contains("top secret"));
    }

    #[tokio::test]
    async fn directories_are_not_served() {
        let (dir, root) = site();
        fs::create_dir(dir.path().join("web").join("img")).unwrap();
        let (status, _) = get(&root, &AssetsSection::default(), "img").await;
        assert_eq!(status, StatusCode::NotFound);
    }

    #[tokio::test]
    async fn fallback_serves_index_for_missing_files() {
        let (_dir, root) = site();
        let assets = AssetsSection {
            fallback_to_index: true,
            ..AssetsSection::default()
        };
        let (status, resp) = get(&root, &assets, "nope.css").await;
        assert_eq!(status, StatusCode::Ok);
        assert!(resp.contains("Content-Type: text/html\r\n"));
        assert!(resp.ends_with("<h1>SysGuard</h1>"));
    }

    #[tokio::test]
    async fn large_files_stream_in_chunks() {
        let (dir, root) = site();
        let big = "x".repeat(CHUNK_BYTES * 3 + 17);
        fs::write(dir.path().join("web").join("big.json"), &big).unwrap();
        let (status, resp) = get(&root, &AssetsSection::default(), "big.json").await;
        assert_eq!(status, StatusCode::Ok);
        assert!(resp.contains(&format!("Content-Length: {}\r\n", big.len())));
        assert!(resp.ends_with(&big));
    }

    #[tokio::test]
    async fn missing_root_always_404s() {
        let root = WebRoot::open(Path::new("/nonexistent/sysguard-web"));
        let (status, _) = get(&root, &AssetsSection::default(), "index.html").await;
        assert_eq!(status, StatusCode::NotFound);
    }
}
