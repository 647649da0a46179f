use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::adapters::http::response::{json_bytes, HttpError};
use crate::adapters::http::HttpState;
use crate::domain::ports::{CustomerFilter, CustomersParser, FilterCache};
use crate::utils::validation::validate_file_extension;

pub const UPLOAD_FIELD: &str = "file";
const TXT_EXTENSION: &str = "txt";
const READ_ERROR: &str = "error to read uploaded file";

struct Upload {
    filename: String,
    data: Bytes,
}

/// `POST /filter-customers`: filters the uploaded customers file.
pub async fn filter_customers<P, F, C>(
    State(state): State<Arc<HttpState<P, F, C>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    P: CustomersParser + 'static,
    F: CustomerFilter + 'static,
    C: FilterCache + 'static,
{
    let correlation_id = Uuid::new_v4();
    let span = info_span!("filter_customers", correlation_id = %correlation_id);

    async move {
        let upload = match read_upload(multipart, state.max_upload_bytes).await {
            Ok(upload) => upload,
            Err(e) => return e.into_response(),
        };

        info!(
            filename = %upload.filename,
            filesize = upload.data.len(),
            "Filtering customers"
        );

        match state.service.invite(upload.data).await {
            Ok(body) => json_bytes(body),
            Err(e) => HttpError::from_error("error to filter customers", &e).into_response(),
        }
    }
    .instrument(span)
    .await
}

pub async fn method_not_allowed() -> HttpError {
    HttpError::new(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}

pub async fn health() -> &'static str {
    "ok"
}

async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
    max_upload_bytes: usize,
) -> Result<Upload, HttpError> {
    let mut multipart = multipart.map_err(|e| HttpError::bad_request(READ_ERROR, e))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(READ_ERROR, e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        validate_file_extension(UPLOAD_FIELD, &filename, TXT_EXTENSION)
            .map_err(|e| HttpError::from_error("", &e))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| HttpError::bad_request(READ_ERROR, e))?;

        if data.len() > max_upload_bytes {
            return Err(HttpError::bad_request(
                READ_ERROR,
                format!("file exceeds the maximum size of {} bytes", max_upload_bytes),
            ));
        }

        return Ok(Upload { filename, data });
    }

    Err(HttpError::bad_request(
        READ_ERROR,
        format!("missing '{}' field", UPLOAD_FIELD),
    ))
}
