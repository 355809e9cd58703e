mod admin;
pub mod dto;
mod owner;
pub mod response;
mod router;
pub mod validation;

pub use admin::admin_router;
pub use owner::owner_router;
pub use router::{AppState, create_router};
