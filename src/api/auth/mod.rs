pub mod dto;
pub mod extractor;
pub mod handlers;
pub mod service;

pub use extractor::AuthenticatedUser;
pub use service::AuthService;
