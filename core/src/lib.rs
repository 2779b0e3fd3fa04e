//! Storage, codec and content negotiation for the text file service.

pub mod breaker;
pub mod codec;
pub mod config;
pub mod db;
pub mod ids;
pub mod media_type;
pub mod retry;
pub mod text_file_store;

pub use codec::{DecodeError, LineRecord};
pub use db::{Database, StoreError};
pub use ids::{ComponentId, DocumentKey, FileType, ValidationError};
pub use media_type::MediaType;
pub use text_file_store::TextFileStore;
