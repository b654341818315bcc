pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod schema;
pub mod store;
pub mod summary;

pub use config::Settings;
pub use error::IngestError;
pub use store::{ingest_db, Store, WriteMode};
