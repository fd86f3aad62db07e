pub mod helpers;
pub mod memory;
pub mod mongo;

pub use memory::InMemoryFeedStore;
pub use mongo::MongoFeedStore;
