//! HTTP routes for the file API.
//!
//! Each route maps to one file operation. Handlers push the blocking
//! filesystem call onto tokio's blocking pool and translate the
//! [`FileResult`](crate::files::FileResult) into a response. Failure bodies are
//! always one of the fixed texts in [`protocol::text`]; error details only
//! reach the log.

use std::sync::Arc;

use actix_multipart::{Field, Multipart};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::http::StatusCode;
use actix_web::{delete, get, post, web, HttpResponse, ResponseError};
use futures_util::TryStreamExt;
use protocol::{
    text, BrowseResponse, ErrorResponse, HealthResponse, HomeResponse, HomeUpdated,
    MessageResponse, SearchResponse, API_SCOPE,
};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::files::{DirectoryBrowser, FileTransfer, HomeDirectory};

/// Result type for route handlers.
pub type RouterResult = Result<HttpResponse, RouterError>;

/// Errors returned to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// The request was rejected or the operation failed.
    #[error("{0}")]
    BadRequest(&'static str),

    /// The target does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// Unexpected internal fault.
    #[error("{0}")]
    Internal(&'static str),
}

impl ResponseError for RouterError {
    fn status_code(&self) -> StatusCode {
        match self {
            RouterError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RouterError::NotFound(_) => StatusCode::NOT_FOUND,
            RouterError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}

/// Shared handles the routes operate on.
pub struct FileRouter {
    /// Current home directory.
    home: Arc<HomeDirectory>,
    /// Listing, search, create and delete.
    browser: Arc<DirectoryBrowser>,
    /// Download and upload.
    transfer: Arc<FileTransfer>,
}

impl FileRouter {
    /// Create a new router with the given dependencies.
    pub fn new(
        home: Arc<HomeDirectory>,
        browser: Arc<DirectoryBrowser>,
        transfer: Arc<FileTransfer>,
    ) -> Self {
        Self {
            home,
            browser,
            transfer,
        }
    }
}

/// Register all routes. Expects `web::Data<FileRouter>` in app data.
pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(
        web::scope(API_SCOPE)
            .app_data(home_json_config())
            .service(browse)
            .service(search)
            .service(get_home)
            .service(set_home)
            .service(download)
            .service(upload)
            .service(create_folder)
            .service(delete_file)
            .service(delete_folder),
    );
}

/// A malformed home body gets the same answer as an invalid path.
fn home_json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!(error = %err, "Rejected home directory body");
        RouterError::BadRequest(text::HOME_INVALID).into()
    })
}

/// Run a blocking file operation off the async workers.
///
/// Only a failure of the blocking task itself (e.g. a panic) becomes an
/// error here; `unavailable` is the text the client sees.
async fn run_blocking<T, F>(
    operation: &'static str,
    unavailable: &'static str,
    f: F,
) -> Result<T, RouterError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(operation, error = %e, "Blocking file task failed");
        RouterError::Internal(unavailable)
    })
}

#[derive(Debug, Deserialize)]
struct PathQuery {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    query: Option<String>,
}

#[get("/healthz")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        service: "direxplorer".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[get("/browse")]
async fn browse(query: web::Query<PathQuery>, router: web::Data<FileRouter>) -> RouterResult {
    let path = query.into_inner().path.unwrap_or_default();
    let browser = router.browser.clone();

    // A failed listing is already logged; the client just sees no items
    let items = run_blocking("browse", text::BROWSE_UNAVAILABLE, move || {
        browser.browse(&path)
    })
    .await?
    .unwrap_or_default();

    Ok(HttpResponse::Ok().json(BrowseResponse::new(items)))
}

#[get("/search")]
async fn search(query: web::Query<SearchQuery>, router: web::Data<FileRouter>) -> RouterResult {
    let query = query.into_inner().query.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(RouterError::BadRequest(text::SEARCH_QUERY_REQUIRED));
    }

    let browser = router.browser.clone();
    let needle = query.clone();
    let items = run_blocking("search", text::SEARCH_UNAVAILABLE, move || {
        browser.search(&needle)
    })
    .await?
    .unwrap_or_default();

    if items.is_empty() {
        return Err(RouterError::NotFound(text::SEARCH_NO_RESULTS));
    }

    Ok(HttpResponse::Ok().json(SearchResponse::new(items, query)))
}

#[get("/home")]
async fn get_home(router: web::Data<FileRouter>) -> HttpResponse {
    HttpResponse::Ok().json(HomeResponse {
        home: router.home.current().to_string_lossy().to_string(),
    })
}

#[post("/home")]
async fn set_home(body: web::Json<String>, router: web::Data<FileRouter>) -> RouterResult {
    let path = body.into_inner();
    let home = router.home.clone();
    let requested = path.clone();

    run_blocking("set_home_directory", text::HOME_INVALID, move || {
        home.set(&requested)
    })
    .await?
    .map_err(|_| RouterError::BadRequest(text::HOME_INVALID))?;

    Ok(HttpResponse::Ok().json(HomeUpdated::new(path)))
}

#[get("/download")]
async fn download(query: web::Query<PathQuery>, router: web::Data<FileRouter>) -> RouterResult {
    let path = query
        .into_inner()
        .path
        .filter(|p| !p.is_empty())
        .ok_or(RouterError::BadRequest(text::DOWNLOAD_PATH_REQUIRED))?;

    let transfer = router.transfer.clone();
    let file = run_blocking("download", text::DOWNLOAD_UNAVAILABLE, move || {
        transfer.download(&path)
    })
    .await?
    .map_err(|_| RouterError::NotFound(text::DOWNLOAD_NOT_FOUND))?;

    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file.file_name)],
        })
        .body(file.content))
}

/// A file part received in an upload form.
struct UploadedFile {
    file_name: String,
    content: Vec<u8>,
}

#[post("/upload")]
async fn upload(mut payload: Multipart, router: web::Data<FileRouter>) -> RouterResult {
    let limit = router.transfer.max_upload_size();
    let mut path_field: Option<String> = None;
    let mut file_field: Option<UploadedFile> = None;

    while let Some(mut field) = payload.try_next().await.map_err(|err| {
        warn!(error = %err, "Malformed upload form");
        RouterError::BadRequest(text::UPLOAD_FAILED)
    })? {
        let content_disposition = field.content_disposition().clone();
        let field_name = content_disposition.get_name().unwrap_or("").to_string();

        match field_name.as_str() {
            "path" => {
                let bytes = collect_field(&mut field, limit).await?;
                let value = String::from_utf8(bytes)
                    .map_err(|_| RouterError::BadRequest(text::UPLOAD_FAILED))?;
                path_field = Some(value);
            }
            "file" => {
                let file_name = content_disposition
                    .get_filename()
                    .unwrap_or("")
                    .to_string();
                let content = collect_field(&mut field, limit).await?;
                file_field = Some(UploadedFile { file_name, content });
            }
            _ => {
                // Ignore unknown fields
                collect_field(&mut field, limit).await?;
            }
        }
    }

    let file = file_field.ok_or_else(|| {
        debug!("Upload form has no file part");
        RouterError::BadRequest(text::UPLOAD_FAILED)
    })?;
    let path = path_field.unwrap_or_default();

    let transfer = router.transfer.clone();
    run_blocking("upload", text::UPLOAD_FAILED, move || {
        transfer.upload(&path, &file.content, &file.file_name)
    })
    .await?
    .map_err(|_| RouterError::BadRequest(text::UPLOAD_FAILED))?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(text::UPLOAD_OK)))
}

/// Read a whole multipart field, refusing to buffer more than `limit` bytes.
async fn collect_field(field: &mut Field, limit: u64) -> Result<Vec<u8>, RouterError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(|err| {
        warn!(error = %err, "Failed to read upload field");
        RouterError::BadRequest(text::UPLOAD_FAILED)
    })? {
        if (data.len() + chunk.len()) as u64 > limit {
            warn!(limit, "Upload exceeds size limit");
            return Err(RouterError::BadRequest(text::UPLOAD_FAILED));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

#[post("/create/folder/{relative_path:.*}")]
async fn create_folder(path: web::Path<String>, router: web::Data<FileRouter>) -> RouterResult {
    let relative = path.into_inner();
    let browser = router.browser.clone();

    run_blocking("create_folder", text::FOLDER_CREATE_FAILED, move || {
        browser.create_folder(&relative)
    })
    .await?
    .map_err(|_| RouterError::BadRequest(text::FOLDER_CREATE_FAILED))?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(text::FOLDER_CREATED)))
}

#[delete("/delete/file/{path:.*}")]
async fn delete_file(path: web::Path<String>, router: web::Data<FileRouter>) -> RouterResult {
    let relative = path.into_inner();
    if relative.is_empty() {
        return Err(RouterError::BadRequest(text::FILE_DELETE_FAILED));
    }

    let browser = router.browser.clone();
    run_blocking("delete_file", text::FILE_DELETE_FAILED, move || {
        browser.delete_file(&relative)
    })
    .await?
    .map_err(|_| RouterError::BadRequest(text::FILE_DELETE_FAILED))?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(text::FILE_DELETED)))
}

#[delete("/delete/folder/{path:.*}")]
async fn delete_folder(path: web::Path<String>, router: web::Data<FileRouter>) -> RouterResult {
    let relative = path.into_inner();
    if relative.is_empty() {
        return Err(RouterError::BadRequest(text::FOLDER_DELETE_FAILED));
    }

    let browser = router.browser.clone();
    run_blocking("delete_folder", text::FOLDER_DELETE_FAILED, move || {
        browser.delete_folder(&relative)
    })
    .await?
    .map_err(|_| RouterError::BadRequest(text::FOLDER_DELETE_FAILED))?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(text::FOLDER_DELETED)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::MessageBody;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            RouterError::BadRequest(text::UPLOAD_FAILED).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RouterError::NotFound(text::DOWNLOAD_NOT_FOUND).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RouterError::Internal(text::BROWSE_UNAVAILABLE).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_is_fixed_text() {
        let response = RouterError::NotFound(text::SEARCH_NO_RESULTS).error_response();
        let body = response.into_body().try_into_bytes().unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "No results found.");
    }

    #[actix_web::test]
    async fn test_run_blocking_maps_panic_to_internal() {
        let result: Result<(), RouterError> =
            run_blocking("test", text::BROWSE_UNAVAILABLE, || panic!("boom")).await;

        match result {
            Err(RouterError::Internal(msg)) => assert_eq!(msg, text::BROWSE_UNAVAILABLE),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
