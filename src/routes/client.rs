//! Serves the pre-built single-page client for everything outside `/api`.

use super::GREETING;
use crate::error::{ApiError, MessageResponse};
use actix_files::NamedFile;
use actix_web::http::Method;
use actix_web::{web, Error, HttpRequest, HttpResponse, ResponseError};
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone)]
pub struct ClientBundle {
    root: PathBuf,
}

impl ClientBundle {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A bundle is only usable once it has been built, i.e. has an index page.
    pub fn is_present(&self) -> bool {
        self.root.join(INDEX_FILE).is_file()
    }

    /// File to answer `request_path` with: the file itself when it exists,
    /// otherwise the index page so the client router can take over.
    /// Paths trying to leave the bundle resolve to nothing.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        if !self.is_present() {
            return None;
        }
        let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
        let mut file = self.root.clone();
        for segment in decoded.split(|c: char| c == '/' || c == '\\') {
            match segment {
                "" | "." => continue,
                ".." => return None,
                segment => file.push(segment),
            }
        }
        if file.is_file() {
            Some(file)
        } else {
            Some(self.root.join(INDEX_FILE))
        }
    }
}

fn not_found(req: &HttpRequest) -> HttpResponse {
    ApiError::NotFound(format!("Not Found - {}", req.path())).error_response()
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}

/// Default service: JSON 404 for the API and for anything the bundle cannot
/// answer, static files for the rest. Without a built bundle the root path
/// answers with the greeting.
pub async fn fallback(
    req: HttpRequest,
    bundle: Option<web::Data<ClientBundle>>,
) -> Result<HttpResponse, Error> {
    if is_api_path(req.path()) || !(req.method() == Method::GET || req.method() == Method::HEAD) {
        return Ok(not_found(&req));
    }
    let bundle = match bundle {
        Some(bundle) if bundle.is_present() => bundle,
        _ if req.path() == "/" => {
            return Ok(HttpResponse::Ok().json(MessageResponse::new(GREETING)));
        }
        _ => return Ok(not_found(&req)),
    };
    let file = match bundle.resolve(req.path()) {
        Some(file) => file,
        None => return Ok(not_found(&req)),
    };
    NamedFile::open(file)?.into_response(&req)
}
