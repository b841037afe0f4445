use crate::server::AppState;
use crate::session::{clear_session, current_session, ensure_session};
use crate::templates::UploadView;
use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::SignedCookieJar;
use pdf_chat_core::{persist_upload, Answer, IngestError, SearchError, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info, warn};

pub const NO_FILE_PROVIDED: &str = "No file provided";
pub const UPLOAD_SUCCEEDED: &str = "Successfully Uploaded";
pub const RESET_MESSAGE: &str = "Session reset successfully";

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub message: String,
}

/// JSON error body `{"error": ...}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(error: SearchError) -> Self {
        match error {
            SearchError::MissingStore | SearchError::EmptyQuery => Self::bad_request(error.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn render_page(state: &AppState, status: StatusCode, view: UploadView) -> Response {
    match state.templates.render_upload(&view) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(error) => {
            error!(%error, "failed to render upload page");
            (StatusCode::INTERNAL_SERVER_ERROR, "template error").into_response()
        }
    }
}

pub async fn home(State(state): State<AppState>, jar: SignedCookieJar) -> impl IntoResponse {
    let (jar, _session) = ensure_session(jar);
    (jar, render_page(&state, StatusCode::OK, UploadView::default()))
}

struct UploadedFile {
    name: String,
    bytes: Bytes,
}

/// Finds the `file` field. A file input submitted without a selection has an
/// empty file name and counts as no file.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<UploadedFile>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        if name.trim().is_empty() {
            return Ok(None);
        }
        return Ok(Some(UploadedFile { name, bytes }));
    }
    Ok(None)
}

pub async fn upload(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    multipart: Result<Multipart, MultipartRejection>,
) -> impl IntoResponse {
    let (jar, session) = ensure_session(jar);
    let page = handle_upload(&state, session, multipart).await;
    (jar, page)
}

async fn handle_upload(
    state: &AppState,
    session: SessionId,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let file = match multipart {
        Ok(mut multipart) => read_file_field(&mut multipart).await,
        Err(rejection) => {
            warn!(%rejection, "upload was not a multipart form");
            Ok(None)
        }
    };

    let file = match file {
        Ok(Some(file)) => file,
        Ok(None) => return render_page(state, StatusCode::BAD_REQUEST, UploadView::status(NO_FILE_PROVIDED)),
        Err(error) => {
            warn!(%error, "failed to read multipart upload");
            return render_page(
                state,
                StatusCode::BAD_REQUEST,
                UploadView::status(format!("Error reading upload: {error}")),
            );
        }
    };

    let path = match save_upload(state.upload_dir.clone(), &file).await {
        Ok(path) => path,
        Err(IngestError::MissingFileName(_)) => {
            return render_page(state, StatusCode::BAD_REQUEST, UploadView::status(NO_FILE_PROVIDED))
        }
        Err(error) => {
            error!(%error, file = %file.name, "failed to save upload");
            return render_page(
                state,
                StatusCode::INTERNAL_SERVER_ERROR,
                UploadView::status(format!("Error saving upload: {error}")),
            );
        }
    };

    info!(%session, path = %path.display(), bytes = file.bytes.len(), "saved upload");

    match state.coordinator.ingest_pdf(session, &path).await {
        Ok(summary) => render_page(
            state,
            StatusCode::OK,
            UploadView {
                status: Some(UPLOAD_SUCCEEDED.to_string()),
                filename: Some(file.name),
                doc_len: Some(summary.document_count),
                chunks: Some(summary.chunk_count),
            },
        ),
        Err(error) => {
            error!(%session, %error, path = %path.display(), "failed to process pdf");
            render_page(
                state,
                StatusCode::INTERNAL_SERVER_ERROR,
                UploadView::status(format!("Error processing PDF: {error}")),
            )
        }
    }
}

async fn save_upload(upload_dir: PathBuf, file: &UploadedFile) -> Result<PathBuf, IngestError> {
    let name = file.name.clone();
    let bytes = file.bytes.clone();
    tokio::task::spawn_blocking(move || persist_upload(&upload_dir, &name, &bytes))
        .await
        .map_err(|error| IngestError::Task(error.to_string()))?
}

pub async fn ask_pdf(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<Answer>, ApiError> {
    let Some(session) = current_session(&jar) else {
        return Err(SearchError::MissingStore.into());
    };
    if !state.coordinator.has_store(&session).await {
        return Err(SearchError::MissingStore.into());
    }

    let Json(request) =
        payload.map_err(|rejection| ApiError::bad_request(format!("Invalid request: {}", rejection.body_text())))?;
    let query = request
        .query
        .ok_or_else(|| ApiError::bad_request("Missing \"query\" field"))?;

    let answer = state.coordinator.ask(&session, &query).await.map_err(|error| {
        error!(%session, %error, "failed to answer question");
        ApiError::from(error)
    })?;

    Ok(Json(answer))
}

pub async fn reset(State(state): State<AppState>, jar: SignedCookieJar) -> impl IntoResponse {
    if let Some(session) = current_session(&jar) {
        state.coordinator.reset(&session).await;
    }
    (
        clear_session(jar),
        Json(ResetResponse {
            message: RESET_MESSAGE.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_caller_mistakes_are_bad_requests() {
        assert_eq!(ApiError::from(SearchError::MissingStore).status, StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(SearchError::EmptyQuery).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(SearchError::Request("query vector dim 3 is not 2".to_string())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
