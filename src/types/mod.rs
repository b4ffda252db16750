mod json_list;
mod models;

pub use json_list::JsonList;
pub use models::*;
