// HBNB - Core Library
// Exposes the entity model, storage engine and REST API for the server,
// the console and the tests.

pub mod config;
pub mod models;
pub mod storage;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{ServerArgs, StorageArgs, StorageKind};
pub use models::{
    Amenity, BaseModel, Child, City, Entity, EntityKind, Model, ModelError, Place, Review, State,
    User,
};
pub use storage::{DbStorage, FileStorage, Objects, Storage, StorageError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
