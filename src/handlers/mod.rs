use actix_web::web;

pub mod auth_handler;
pub mod document_handler;
pub mod health_handler;
pub mod quiz_handler;

/// Endpoints accept both urlencoded forms and JSON bodies.
pub fn form_or_json<T>(body: web::Either<web::Form<T>, web::Json<T>>) -> T {
    match body {
        web::Either::Left(form) => form.into_inner(),
        web::Either::Right(json) => json.into_inner(),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_handler::health_check)
        .service(health_handler::health_check_ready)
        .service(health_handler::health_check_live)
        .service(document_handler::process_pdf)
        .service(document_handler::process_link)
        .service(quiz_handler::generate_quiz)
        .service(quiz_handler::demo_quiz)
        // Literal session routes before the `{id}` matchers.
        .service(quiz_handler::import_session)
        .service(quiz_handler::create_demo_session)
        .service(quiz_handler::create_session)
        .service(quiz_handler::get_session)
        .service(quiz_handler::select_answer)
        .service(quiz_handler::enter_edit)
        .service(quiz_handler::update_draft)
        .service(quiz_handler::save_edits)
        .service(quiz_handler::cancel_edits)
        .service(quiz_handler::regenerate)
        .service(quiz_handler::grade)
        .service(quiz_handler::export)
        .service(quiz_handler::delete_session)
        .service(auth_handler::register_user)
        .service(auth_handler::login_user)
        .service(auth_handler::fetch_user)
        .service(auth_handler::logout_user);
}
