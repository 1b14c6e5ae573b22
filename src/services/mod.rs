pub mod auth_service;
pub mod cache;
pub mod document_service;
pub mod link_service;
pub mod model_service;
pub mod quiz_generator;
pub mod session_service;
pub mod text_extractor;
pub mod token_window;
pub mod transcription_service;
