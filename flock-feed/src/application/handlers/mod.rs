//! CQRS Handler（编排层）

pub mod query_handler;


pub use query_handler::FeedQueryHandler;
