//! Router fixtures shared by handler tests.

use std::io;
use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use futures::StreamExt;
use tempfile::TempDir;

use crate::config::ServerConfig;
use crate::router::build_router;
use crate::state::AppState;

const BOUNDARY: &str = "pimg-test-boundary";

pub struct TestApp {
    _dir: TempDir,
    pub config: ServerConfig,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let defaults = ServerConfig::default();
        Self::with_limits(defaults.max_file_size, defaults.max_body_size)
    }

    pub fn with_max_file_size(max_file_size: u64) -> Self {
        Self::with_limits(max_file_size, ServerConfig::default().max_body_size)
    }

    pub fn with_limits(max_file_size: u64, max_body_size: u64) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            base_path: dir.path().join("imagestore"),
            max_file_size,
            max_body_size,
            ..ServerConfig::default()
        };
        let state = AppState::from_config(&config).unwrap();
        Self { _dir: dir, config, state }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    pub fn root(&self) -> PathBuf {
        self.state.store.resolver().root().to_path_buf()
    }
}

pub fn request(method: Method, uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if !content_type.is_empty() {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(body.into()).unwrap()
}

/// Stream `data` in `chunk` sized frames with no `Content-Length`, yielding
/// to the runtime between frames.
pub fn chunked_body(data: Vec<u8>, chunk: usize) -> Body {
    Body::from_stream(chunk_stream(data, chunk))
}

/// Like [`chunked_body`], but the connection resets after the data.
pub fn broken_body(data: Vec<u8>, chunk: usize) -> Body {
    let reset = futures::stream::once(async {
        Err::<Vec<u8>, _>(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
    });
    Body::from_stream(chunk_stream(data, chunk).chain(reset))
}

fn chunk_stream(data: Vec<u8>, chunk: usize) -> impl futures::Stream<Item = io::Result<Vec<u8>>> + Send {
    let frames: Vec<Vec<u8>> = data.chunks(chunk).map(<[u8]>::to_vec).collect();
    futures::stream::iter(frames).then(|frame| async move {
        tokio::task::yield_now().await;
        Ok(frame)
    })
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn json_body(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub struct MultipartPart<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    data: &'a [u8],
}

impl<'a> MultipartPart<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self { name, filename: None, data: value.as_bytes() }
    }

    pub fn file(name: &'a str, filename: &'a str, data: &'a [u8]) -> Self {
        Self { name, filename: Some(filename), data }
    }
}

/// Encode `parts` as `multipart/form-data`; returns the content type and body.
pub fn multipart_body(parts: &[MultipartPart<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
