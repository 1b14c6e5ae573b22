use actix_web::{
    delete, get,
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    post, put, web, HttpResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    handlers::form_or_json,
    models::{
        domain::Quiz,
        dto::{
            request::{
                CreateSessionRequest, GenerateQuizRequest, SelectAnswerRequest, UpdateDraftRequest,
            },
            response::{GradeDto, SessionDto},
        },
    },
};

const EXPORT_FILE_NAME: &str = "quiz_export.json";

#[post("/api/generateQuiz")]
async fn generate_quiz(
    state: web::Data<AppState>,
    body: web::Either<web::Form<GenerateQuizRequest>, web::Json<GenerateQuizRequest>>,
) -> Result<HttpResponse, AppError> {
    let request = form_or_json(body);
    request.validate()?;

    let quiz = state.quiz_generator.generate(&request.passage).await?;
    log::info!("Generated quiz with {} questions", quiz.len());
    Ok(HttpResponse::Ok().json(quiz.items))
}

#[get("/api/demoQuiz")]
async fn demo_quiz() -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(Quiz::demo()?.items))
}

#[post("/api/sessions")]
async fn create_session(
    state: web::Data<AppState>,
    request: web::Json<CreateSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let session = match (request.passage, request.items) {
        (Some(passage), None) => state.session_service.create_from_passage(&passage).await?,
        (None, Some(items)) => state.session_service.create_from_items(items).await?,
        _ => {
            return Err(AppError::ValidationError(
                "Provide either a passage or quiz items".to_string(),
            ))
        }
    };

    Ok(HttpResponse::Created().json(SessionDto::from(session)))
}

#[post("/api/sessions/import")]
async fn import_session(
    state: web::Data<AppState>,
    body: String,
) -> Result<HttpResponse, AppError> {
    let session = state.session_service.import(&body).await?;
    Ok(HttpResponse::Created().json(SessionDto::from(session)))
}

#[post("/api/sessions/demo")]
async fn create_demo_session(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let session = state.session_service.create_demo().await?;
    Ok(HttpResponse::Created().json(SessionDto::from(session)))
}

#[get("/api/sessions/{id}")]
async fn get_session(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_service.get_session(&id).await?;
    Ok(HttpResponse::Ok().json(SessionDto::from(session)))
}

#[put("/api/sessions/{id}/answers/{index}")]
async fn select_answer(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, usize)>,
    request: web::Json<SelectAnswerRequest>,
) -> Result<HttpResponse, AppError> {
    let (id, index) = path.into_inner();
    let session = state
        .session_service
        .select_answer(&id, index, request.into_inner().option_text)
        .await?;
    Ok(HttpResponse::Ok().json(SessionDto::from(session)))
}

#[post("/api/sessions/{id}/edit")]
async fn enter_edit(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_service.enter_edit(&id).await?;
    Ok(HttpResponse::Ok().json(SessionDto::from(session)))
}

#[put("/api/sessions/{id}/draft")]
async fn update_draft(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    request: web::Json<UpdateDraftRequest>,
) -> Result<HttpResponse, AppError> {
    let session = state
        .session_service
        .update_draft(&id, request.into_inner().items)
        .await?;
    Ok(HttpResponse::Ok().json(SessionDto::from(session)))
}

#[post("/api/sessions/{id}/edit/save")]
async fn save_edits(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_service.save_edits(&id).await?;
    Ok(HttpResponse::Ok().json(SessionDto::from(session)))
}

#[post("/api/sessions/{id}/edit/cancel")]
async fn cancel_edits(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session = state.session_service.cancel_edits(&id).await?;
    Ok(HttpResponse::Ok().json(SessionDto::from(session)))
}

#[post("/api/sessions/{id}/regenerate")]
async fn regenerate(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    request: web::Json<GenerateQuizRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let session = state
        .session_service
        .regenerate(&id, &request.passage)
        .await?;
    Ok(HttpResponse::Ok().json(SessionDto::from(session)))
}

#[post("/api/sessions/{id}/grade")]
async fn grade(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let grade = state.session_service.grade(&id).await?;
    Ok(HttpResponse::Ok().json(GradeDto::from(grade)))
}

#[get("/api/sessions/{id}/export")]
async fn export(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let json = state.session_service.export(&id).await?;
    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(EXPORT_FILE_NAME.to_string())],
        })
        .body(json))
}

#[delete("/api/sessions/{id}")]
async fn delete_session(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    state.session_service.delete_session(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}
