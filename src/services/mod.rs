pub mod application_service;
pub mod auth_service;
pub mod document_service;
pub mod mail_service;
pub mod platform_service;
pub mod token_service;
