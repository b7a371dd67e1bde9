//! Response bodies shared by all handlers.

mod error_response;
mod reply;

pub use error_response::ErrorResponse;
pub use reply::Reply;
