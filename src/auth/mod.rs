mod helpers;
mod middleware;

pub use helpers::{TokenValidationError, extract_bearer_token, tokens_match};
pub use middleware::{AuthError, RequireAdmin};
