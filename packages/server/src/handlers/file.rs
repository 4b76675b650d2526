use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use super::run_to_completion;
use crate::error::{AppError, ErrorBody};
use crate::extractors::multipart::AppMultipart;
use crate::models::file::FileResponse;
use crate::observability::{DB_CALL, Event, STORAGE_CALL, timed};
use crate::persistence::FileRecord;
use crate::state::AppState;
use crate::utils::filename::{storage_key, validate_flat_filename};

/// Multipart field that carries the upload.
pub const FILE_FIELD: &str = "file";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// The single file part of an upload request.
#[derive(Debug)]
struct FilePart {
    filename: String,
    content_type: String,
    data: Vec<u8>,
}

#[utoipa::path(
    post,
    path = "/v1/file",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Stores the `file` multipart field in the object store, then records its \
        metadata. Exactly one `file` field is accepted; other fields are ignored.",
    request_body(content_type = "multipart/form-data", description = "Single `file` field"),
    responses(
        (status = 201, description = "File stored", body = FileResponse),
        (status = 400, description = "No file part, several file parts, or a bad filename (VALIDATION_ERROR)", body = ErrorBody),
        (status = 413, description = "Upload exceeds the size limit (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 500, description = "Object store or database failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip_all)]
pub async fn upload_file(
    State(state): State<AppState>,
    AppMultipart(mut multipart): AppMultipart,
) -> Result<impl IntoResponse, AppError> {
    const OPERATION: &str = "upload_file";

    let part = match read_file_part(&mut multipart).await {
        Ok(part) => part,
        Err(e) => {
            state
                .telemetry
                .log_event(Event::warn(OPERATION, "Rejected upload").field("reason", &e));
            return Err(e);
        }
    };

    let tasks = state.tasks.clone();
    let record = run_to_completion(&tasks, OPERATION, store_upload(state, part)).await?;

    Ok((StatusCode::CREATED, Json(FileResponse::from(record))))
}

/// Write the blob, then its metadata. A failed blob write leaves nothing behind;
/// a failed metadata write leaves an orphan blob, which is logged with its key.
async fn store_upload(state: AppState, part: FilePart) -> Result<FileRecord, AppError> {
    const OPERATION: &str = "upload_file";
    let sink = &*state.telemetry;

    let id = Uuid::new_v4();
    let key = storage_key(id, &part.filename);
    let size = part.data.len();

    if let Err(e) = timed(
        sink,
        STORAGE_CALL,
        "put",
        state.storage.put(&key, part.data, &part.content_type),
    )
    .await
    {
        sink.log_event(
            Event::error(OPERATION, "Object store rejected upload")
                .field("file_id", id)
                .field("storage_key", &key)
                .field("cause", &e),
        );
        return Err(e.into());
    }

    let record = match timed(
        sink,
        DB_CALL,
        "create_file_record",
        state.persistence.create_file_record(id, &part.filename, &key),
    )
    .await
    {
        Ok(record) => record,
        Err(e) => {
            sink.log_event(
                Event::error(OPERATION, "Metadata write failed; blob is orphaned")
                    .field("file_id", id)
                    .field("storage_key", &key)
                    .field("cause", &e),
            );
            return Err(e.into());
        }
    };

    sink.log_event(
        Event::info(OPERATION, "File uploaded")
            .field("file_id", id)
            .field("storage_key", &key)
            .field("content_type", &part.content_type)
            .field("size", size),
    );
    Ok(record)
}

/// Pull exactly one `file` field out of the multipart body.
async fn read_file_part(multipart: &mut Multipart) -> Result<FilePart, AppError> {
    let mut part: Option<FilePart> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue; // Ignore unknown fields.
        }
        if part.is_some() {
            return Err(AppError::Validation(
                "Exactly one 'file' field is allowed".into(),
            ));
        }

        let filename = field
            .file_name()
            .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
        let filename = validate_flat_filename(filename)
            .map_err(|e| AppError::Validation(e.message().into()))?
            .to_string();

        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| mime_guess::from_path(&filename).first().map(|m| m.to_string()))
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let data = field.bytes().await.map_err(multipart_error)?.to_vec();

        part = Some(FilePart {
            filename,
            content_type,
            data,
        });
    }

    part.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Multipart error: {}", e.body_text()))
    }
}

#[utoipa::path(
    get,
    path = "/v1/file/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get file metadata",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 404, description = "No file with this ID (empty body)"),
        (status = 500, description = "Lookup failed (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    const OPERATION: &str = "get_file";

    let id = parse_file_id(&id)?;
    let sink = &*state.telemetry;

    let record = timed(
        sink,
        DB_CALL,
        "get_file_record",
        state.persistence.get_file_record(id),
    )
    .await
    .map_err(|e| {
        sink.log_event(
            Event::error(OPERATION, "Metadata lookup failed")
                .field("file_id", id)
                .field("cause", &e),
        );
        AppError::from(e)
    })?
    .ok_or(AppError::NotFound)?;

    Ok(Json(FileResponse::from(record)))
}

#[utoipa::path(
    delete,
    path = "/v1/file/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Deletes the blob first, then the metadata. If the blob deletion fails the \
        metadata is left untouched.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "No file with this ID (empty body)"),
        (status = 500, description = "Deletion failed (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_file_id(&id)?;
    let tasks = state.tasks.clone();
    run_to_completion(&tasks, "delete_file", remove_file(state, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_file(state: AppState, id: Uuid) -> Result<(), AppError> {
    const OPERATION: &str = "delete_file";
    let sink = &*state.telemetry;

    let record = timed(
        sink,
        DB_CALL,
        "get_file_record",
        state.persistence.get_file_record(id),
    )
    .await
    .map_err(|e| {
        sink.log_event(
            Event::error(OPERATION, "Metadata lookup failed")
                .field("file_id", id)
                .field("cause", &e),
        );
        AppError::from(e)
    })?
    .ok_or(AppError::NotFound)?;

    if let Err(e) = timed(
        sink,
        STORAGE_CALL,
        "delete",
        state.storage.delete(&record.storage_key),
    )
    .await
    {
        sink.log_event(
            Event::error(OPERATION, "Object store delete failed; metadata kept")
                .field("file_id", id)
                .field("storage_key", &record.storage_key)
                .field("cause", &e),
        );
        return Err(e.into());
    }

    match timed(
        sink,
        DB_CALL,
        "delete_file_record",
        state.persistence.delete_file_record(id),
    )
    .await
    {
        Ok(true) => {}
        Ok(false) => sink.log_event(
            Event::warn(OPERATION, "Metadata already gone after blob delete").field("file_id", id),
        ),
        Err(e) => {
            sink.log_event(
                Event::error(OPERATION, "Metadata delete failed; record is stale")
                    .field("file_id", id)
                    .field("storage_key", &record.storage_key)
                    .field("cause", &e),
            );
            return Err(e.into());
        }
    }

    sink.log_event(
        Event::info(OPERATION, "File deleted")
            .field("file_id", id)
            .field("storage_key", &record.storage_key),
    );
    Ok(())
}

/// Ids that are not UUIDs cannot name a record.
fn parse_file_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}
