pub mod error;
pub mod session_store;

pub use error::{StorageError, StorageErrorKind};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
