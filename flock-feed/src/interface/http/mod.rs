pub mod error;
pub mod handler;
pub mod router;

pub use error::{ApiError, ApiResult};
pub use handler::{DataEnvelope, HttpState, VIEWER_HEADER, ViewerId};
pub use router::feed_router;
