pub mod model;
pub mod repository;
pub mod service;

pub use model::*;
pub use repository::*;
pub use service::*;
