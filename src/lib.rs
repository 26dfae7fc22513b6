pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod importer;
pub mod models;
pub mod normalize;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::ImportError;
pub use feed::{Action, LoadedPage, Payload, Signal};
pub use importer::Importer;
pub use models::{Category, CategoryId, FacebookEvent, FbId, ImportedEvent};
pub use session::Session;
pub use store::{Entities, EntityKeys, EntityStore};
