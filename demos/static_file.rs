//! Reference static-file handler ([spec §1]/[spec §2]), shown only as a conforming
//! implementation of [`embers::service::Handler`] — not a dependency of the crate
//! itself.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWrite};

use embers::headers::standard;
use embers::http::{date, Method, StatusCode};
use embers::request::Request;
use embers::response::{apply_if_range, evaluate, parse_range, Response, Validators};

/// Serves files rooted at `root`. `req.path()` is joined onto `root` after rejecting
/// `..` segments; anything outside `root` or not a regular file is `404`.
pub struct StaticFileHandler {
    root: PathBuf,
}

impl StaticFileHandler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn serve<R, W>(&self, req: &mut Request<R>, res: &mut Response<W>) -> io::Result<i32>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return Ok(405);
        }

        let Some(path) = resolve_path(&self.root, req.path().unwrap_or("/")) else {
            return Ok(404);
        };

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            _ => return Ok(404),
        };

        let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
        let etag = format!("\"{:x}-{:x}\"", metadata.len(), unix_secs(modified));
        let validators = Validators { last_modified: Some(modified), etag: Some(&etag) };

        if let Some(status) = evaluate(req.method(), req.headers(), validators) {
            if status != StatusCode::OK {
                res.send_headers(status, Some(0), None, None).await?;
                return Ok(0);
            }
        }

        let range = req
            .headers()
            .get(standard::RANGE)
            .and_then(|v| v.try_as_str().ok())
            .and_then(|r| parse_range(r, metadata.len()));
        let range = apply_if_range(range, req.headers(), validators);

        res.headers_mut()
            .insert(standard::LAST_MODIFIED, embers::headers::HeaderValue::try_copy_from_slice(&date::httpdate(modified)).unwrap());
        res.headers_mut().insert(standard::ETAG, etag.parse().unwrap());
        res.headers_mut().insert(standard::ACCEPT_RANGES, "bytes".parse().unwrap());

        res.send_headers(StatusCode::OK, Some(metadata.len()), Some(content_type_for(&path)), range).await?;

        let mut file = File::open(&path).await?;
        let mut remaining = match range {
            Some(r) => {
                file.seek(io::SeekFrom::Start(r.start)).await?;
                r.len()
            }
            None => metadata.len(),
        };

        let mut buf = [0u8; 64 * 1024];
        while remaining > 0 {
            let want = (buf.len() as u64).min(remaining) as usize;
            let n = file.read(&mut buf[..want]).await?;
            if n == 0 {
                break;
            }
            res.send_body(&buf[..n]).await?;
            remaining -= n as u64;
        }

        Ok(0)
    }
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Joins `request_path` onto `root`, rejecting any `..` segment so a request can
/// never escape `root`.
fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s => resolved.push(s),
        }
    }
    Some(resolved)
}

/// Not a MIME-sniffing library ([spec §1] non-goal) — a handful of extensions common
/// enough to be worth a default.
fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_parent_directory_traversal() {
        assert!(resolve_path(Path::new("/srv"), "/../etc/passwd").is_none());
    }

    #[test]
    fn joins_a_plain_request_path() {
        assert_eq!(resolve_path(Path::new("/srv"), "/a/b.html"), Some(PathBuf::from("/srv/a/b.html")));
    }

    #[test]
    fn content_type_falls_back_to_octet_stream() {
        assert_eq!(content_type_for(Path::new("file.unknown")), "application/octet-stream");
        assert_eq!(content_type_for(Path::new("file.css")), "text/css; charset=utf-8");
    }
}
