//! Image upload and retrieval handlers.
//!
//! Two upload shapes share one [`FileStore`]:
//!
//! - `POST /images/:id/:filename` streams the raw request body into the store.
//! - `POST /` reads a `multipart/form-data` form and saves every file part,
//!   reporting each outcome separately.
//!
//! `GET /images/:id/:filename` validates the same grammar before handing the
//! resolved path to [`ServeFile`].

use std::error::Error as StdError;
use std::io;

use axum::body::Body;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Path, Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use futures::TryStreamExt;
use http_body_util::LengthLimitError;
use pimg_store::{CollectionId, FileStore, Filename, ObjectKey, StoreError, StoreResult};
use serde::Serialize;
use tokio_util::io::StreamReader;
use tower::util::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, info, instrument, warn};

use crate::error::{store_error_kind, store_message, ServerError, ServerResult};
use crate::state::AppState;

/// Multipart text field that sets the collection for the file parts after it.
pub const ID_FIELD: &str = "id";

/// Body of a successful single-file upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub id: u64,
    pub filename: String,
    pub bytes: u64,
    pub location: String,
}

impl StoredFile {
    fn new(key: &ObjectKey, bytes: u64) -> Self {
        Self {
            id: key.collection.get(),
            filename: key.filename.to_string(),
            bytes,
            location: format!("/images/{key}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartStatus {
    Saved,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PartError {
    pub kind: &'static str,
    pub message: String,
}

impl PartError {
    fn from_store(err: &StoreError) -> Self {
        Self {
            kind: store_error_kind(err),
            message: store_message(err),
        }
    }
}

/// Outcome of one multipart file part.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PartResult {
    pub field: String,
    pub filename: String,
    pub id: u64,
    pub status: PartStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PartError>,
}

impl PartResult {
    fn new(field: String, filename: String, id: CollectionId, outcome: StoreResult<u64>) -> Self {
        match outcome {
            Ok(bytes) => Self {
                location: Some(format!("/images/{id}/{filename}")),
                field,
                filename,
                id: id.get(),
                status: PartStatus::Saved,
                bytes: Some(bytes),
                error: None,
            },
            Err(e) => Self {
                field,
                filename,
                id: id.get(),
                status: PartStatus::Failed,
                bytes: None,
                location: None,
                error: Some(PartError::from_store(&e)),
            },
        }
    }

    pub fn is_saved(&self) -> bool {
        self.status == PartStatus::Saved
    }
}

/// Body of a multipart upload response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MultipartReport {
    /// Collection the server picked when the form carried no `id` field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_id: Option<u64>,
    pub results: Vec<PartResult>,
    /// Why the form stopped early, when it broke after a file part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PartError>,
}

impl MultipartReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.results.iter().all(PartResult::is_saved)
    }
}

/// Marker carried inside an `io::Error` when the request body hit the
/// router's size limit.
#[derive(Debug, thiserror::Error)]
#[error("request body exceeds the configured limit")]
struct BodyLimitReached;

fn hits_length_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// Adapt a body stream error for [`StreamReader`].
fn body_read_error<E>(err: E) -> io::Error
where
    E: StdError + Send + Sync + 'static,
{
    if hits_length_limit(&err) {
        io::Error::other(BodyLimitReached)
    } else {
        io::Error::other(err)
    }
}

/// A save that failed because the body limit cut the stream is a size
/// violation, not a broken upload.
fn at_body_limit(err: StoreError, limit: u64) -> StoreError {
    match err {
        StoreError::Source(e) if e.get_ref().is_some_and(|inner| inner.is::<BodyLimitReached>()) => {
            StoreError::LimitExceeded { limit }
        }
        other => other,
    }
}

/// Handle a form-level error. Before any file part it fails the request;
/// afterwards it ends the report so saved parts are still listed.
fn form_failure(err: MultipartError, results: &[PartResult], body_limit: u64) -> ServerResult<PartError> {
    let err = if hits_length_limit(&err) || err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::Store(StoreError::LimitExceeded { limit: body_limit })
    } else {
        ServerError::Multipart(err.body_text())
    };
    if results.is_empty() {
        return Err(err);
    }
    warn!(error = %err, parts = results.len(), "multipart form cut short");
    Ok(match &err {
        ServerError::Store(e) => PartError::from_store(e),
        _ => PartError {
            kind: "malformed_form",
            message: err.client_message(),
        },
    })
}

/// `POST /images/:id/:filename`: the request body is the file.
#[instrument(skip(state, body))]
pub async fn upload_rest(
    State(state): State<AppState>,
    Path((id, filename)): Path<(String, String)>,
    body: Body,
) -> ServerResult<(StatusCode, Json<StoredFile>)> {
    let key = ObjectKey::parse(&id, &filename)?;

    let reader = StreamReader::new(body.into_data_stream().map_err(body_read_error));
    tokio::pin!(reader);
    let bytes = state
        .store
        .save(key.collection, key.filename.as_str(), &mut reader)
        .await
        .map_err(|e| at_body_limit(e, state.max_body_size))?;

    info!(key = %key, bytes, "stored image");
    Ok((StatusCode::CREATED, Json(StoredFile::new(&key, bytes))))
}

/// `POST /`: save every file part of a multipart form.
///
/// A failing part does not stop the others and parts already saved are kept,
/// even when the form itself breaks after them. Responds `201` when every
/// part was saved and `207` otherwise.
#[instrument(skip(state, multipart))]
pub async fn upload_multipart(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<(StatusCode, Json<MultipartReport>)> {
    let mut collection: Option<CollectionId> = None;
    let mut assigned_id = None;
    let mut results: Vec<PartResult> = Vec::new();
    let mut form_error = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                form_error = Some(form_failure(e, &results, state.max_body_size)?);
                break;
            }
        };
        let field_name = field.name().unwrap_or_default().to_string();

        if field_name == ID_FIELD && field.file_name().is_none() {
            match field.text().await {
                Ok(text) => match CollectionId::parse(text.trim()) {
                    Ok(id) => collection = Some(id),
                    Err(e) if results.is_empty() => return Err(e.into()),
                    Err(e) => {
                        form_error = Some(PartError::from_store(&e));
                        break;
                    }
                },
                Err(e) => {
                    form_error = Some(form_failure(e, &results, state.max_body_size)?);
                    break;
                }
            }
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| field_name.clone());
        let id = *collection.get_or_insert_with(|| {
            let id = CollectionId::new(u64::from(rand::random::<u32>()));
            assigned_id = Some(id.get());
            id
        });

        let outcome = save_part(state.store.as_ref(), id, &filename, field)
            .await
            .map_err(|e| at_body_limit(e, state.max_body_size));
        debug!(field = %field_name, filename = %filename, ok = outcome.is_ok(), "multipart part processed");
        results.push(PartResult::new(field_name, filename, id, outcome));
    }

    if results.is_empty() {
        return Err(ServerError::BadRequest("multipart form contains no file parts".into()));
    }

    let report = MultipartReport {
        assigned_id,
        results,
        error: form_error,
    };
    let saved = report.results.iter().filter(|r| r.is_saved()).count();
    info!(parts = report.results.len(), saved, complete = report.is_complete(), "multipart upload finished");
    let status = if report.is_complete() {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(report)))
}

/// Save one part. The filename is checked before the part's data is read.
async fn save_part(
    store: &dyn FileStore,
    collection: CollectionId,
    filename: &str,
    field: Field<'_>,
) -> StoreResult<u64> {
    Filename::parse(filename)?;
    let reader = StreamReader::new(field.map_err(body_read_error));
    tokio::pin!(reader);
    store.save(collection, filename, &mut reader).await
}

/// `GET /images/:id/:filename`
///
/// Only keys that pass the upload grammar reach the filesystem, so nothing
/// else under the storage root (staging files included) can be served.
#[instrument(skip(state, request))]
pub async fn serve_image(
    State(state): State<AppState>,
    Path((id, filename)): Path<(String, String)>,
    request: Request,
) -> ServerResult<Response> {
    let path = state.store.resolver().resolve_raw(&id, &filename)?;

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    Ok(response.map(Body::new))
}
