mod admin;
mod catalog;
pub mod dto;
pub mod response;
mod router;
mod verify;

pub use admin::admin_router;
pub use router::{AppState, create_router};
