// Document synchronization layer
// - store.rs: per-session Document Store keyed by uri
// - text.rs: UTF-16 line/character grid helpers
// - error.rs: DocumentError

pub mod error;
pub mod store;
pub mod text;

pub use error::DocumentError;
pub use store::{Document, DocumentStore};
