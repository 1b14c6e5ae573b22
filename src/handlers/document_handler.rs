use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse};
use futures::TryStreamExt;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    handlers::form_or_json,
    models::dto::{
        request::ProcessLinkRequest,
        response::{ProcessLinkResponse, ProcessPdfResponse},
    },
    services::text_extractor::PDF_CONTENT_TYPE,
};

const PDF_FIELD: &str = "pdf";

/// Reads the `pdf` field of a multipart upload, enforcing content type and
/// the configured size limit while streaming.
async fn read_pdf_field(mut payload: Multipart, limit: usize) -> Result<Vec<u8>, AppError> {
    while let Some(mut field) = payload.try_next().await? {
        if field.name() != Some(PDF_FIELD) {
            continue;
        }

        let is_pdf = field
            .content_type()
            .map(|mime| mime.essence_str() == PDF_CONTENT_TYPE)
            .unwrap_or(false);
        if !is_pdf {
            return Err(AppError::ValidationError("Not a pdf file.".to_string()));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if bytes.len() + chunk.len() > limit {
                return Err(AppError::ValidationError(format!(
                    "File is larger than the {} byte upload limit.",
                    limit
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(bytes);
    }

    Err(AppError::ValidationError("No pdf file provided.".to_string()))
}

#[post("/api/processPdf")]
async fn process_pdf(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let bytes = read_pdf_field(payload, state.config.max_upload_bytes()).await?;
    log::info!("Processing uploaded pdf of {} bytes", bytes.len());

    let window = state.document_service.process_pdf(bytes).await?;
    Ok(HttpResponse::Ok().json(ProcessPdfResponse::new(
        window,
        state.document_service.max_tokens(),
    )))
}

#[post("/api/processLink")]
async fn process_link(
    state: web::Data<AppState>,
    body: web::Either<web::Form<ProcessLinkRequest>, web::Json<ProcessLinkRequest>>,
) -> Result<HttpResponse, AppError> {
    let request = form_or_json(body);
    request.validate()?;

    let (source, window) = state.document_service.process_link(&request.link).await?;
    log::info!(
        "Processed {} link into {} of {} tokens",
        source.kind(),
        window.window_text.len(),
        window.total_tokens
    );

    Ok(HttpResponse::Ok().json(ProcessLinkResponse::new(
        &source,
        window,
        state.document_service.max_tokens(),
    )))
}
