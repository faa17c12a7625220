//! JSON API surface: webhook relay, uploads, file serving, health.
use std::collections::HashMap;
use std::str::FromStr;

use actix_files::NamedFile;
use actix_multipart::form::MultipartForm;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{Either, HttpRequest, HttpResponse, Responder, get, post, web};
use uuid::Uuid;

use crate::domain::{FileId, FileName};
use crate::dto::{ErrorBody, HealthStatus, RelayReceipt, UploadReceipt};
use crate::forms::submissions::UploadFileForm;
use crate::models::config::ServerConfig;
use crate::services::ServiceError;
use crate::services::registry::RetrieveError;
use crate::services::relay::{RelayOutcome, SubmissionRelay};
use crate::services::uploads::UploadService;

fn relay_response(outcome: RelayOutcome) -> HttpResponse {
    match outcome {
        RelayOutcome::Delivered { .. } => HttpResponse::Ok().json(RelayReceipt::delivered()),
        RelayOutcome::Failed { error } => {
            HttpResponse::InternalServerError().json(RelayReceipt::failed(error))
        }
    }
}

/// Forward the query string untouched to the webhook.
#[get("/api/email")]
pub async fn relay_email_get(
    req: HttpRequest,
    relay: web::Data<SubmissionRelay>,
) -> impl Responder {
    log::info!("relay GET request: {}", req.query_string());
    relay_response(relay.forward_raw_query(req.query_string()).await)
}

/// Accept a form-encoded body and forward it as GET query parameters.
#[post("/api/email")]
pub async fn relay_email_post(
    web::Form(fields): web::Form<HashMap<String, String>>,
    relay: web::Data<SubmissionRelay>,
) -> impl Responder {
    log::info!("relay POST request with {} fields", fields.len());
    let pairs: Vec<(String, String)> = fields.into_iter().collect();
    relay_response(relay.forward_pairs(&pairs).await)
}

#[post("/api/upload")]
pub async fn upload_file(
    MultipartForm(form): MultipartForm<UploadFileForm>,
    uploads: web::Data<UploadService>,
    config: web::Data<ServerConfig>,
) -> impl Responder {
    let file = form.file;
    let raw_name = file
        .file_name
        .unwrap_or_else(|| format!("upload-{}", Uuid::new_v4()));
    let original_name = match FileName::try_from_str(&raw_name) {
        Ok(name) => name,
        Err(_) => {
            return HttpResponse::BadRequest()
                .json(ErrorBody::new(ServiceError::InvalidFileName.to_string()));
        }
    };
    let mime_type = file
        .content_type
        .map(|mime| mime.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    match uploads
        .store(original_name, mime_type, file.size as u64, file.file)
        .await
    {
        Ok(stored) => {
            HttpResponse::Ok().json(UploadReceipt::from_stored(stored, &config.public_base_url))
        }
        Err(err @ (ServiceError::NotAnImage | ServiceError::TooLarge)) => {
            HttpResponse::BadRequest().json(ErrorBody::new(err.to_string()))
        }
        Err(err) => {
            log::error!("file upload failed: {err}");
            HttpResponse::InternalServerError().json(ErrorBody::new(err.to_string()))
        }
    }
}

/// Stream a stored file back with its original name and mime type.
/// 404 for unknown ids, 410 for ids whose retention window has passed.
#[get("/api/file/{file_id}")]
pub async fn download_file(
    path: web::Path<String>,
    uploads: web::Data<UploadService>,
) -> Either<std::io::Result<NamedFile>, HttpResponse> {
    let id = match FileId::from_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => {
            return Either::Right(
                HttpResponse::NotFound().json(ErrorBody::new("File not found or expired")),
            );
        }
    };

    match uploads.registry().retrieve(id) {
        Ok(entry) => {
            let mime = entry
                .mime_type
                .parse::<mime::Mime>()
                .unwrap_or(mime::APPLICATION_OCTET_STREAM);
            let disposition = ContentDisposition {
                disposition: DispositionType::Inline,
                parameters: vec![DispositionParam::Filename(
                    entry.original_name.to_string(),
                )],
            };
            Either::Left(NamedFile::open(&entry.path).map(|file| {
                file.set_content_type(mime)
                    .set_content_disposition(disposition)
            }))
        }
        Err(RetrieveError::NotFound) => Either::Right(
            HttpResponse::NotFound().json(ErrorBody::new("File not found or expired")),
        ),
        Err(RetrieveError::Expired) => {
            Either::Right(HttpResponse::Gone().json(ErrorBody::new("File has expired")))
        }
    }
}

#[get("/api/health")]
pub async fn health(uploads: web::Data<UploadService>) -> impl Responder {
    HttpResponse::Ok().json(HealthStatus::current(uploads.registry().len()))
}
