//! Session and alert persistence.

mod blob_store;
mod local;
mod models;
mod persistence;
mod remote;

pub use blob_store::{BlobEntry, BlobStore, StorageError};
pub use local::LocalBlobStore;
pub use models::{
    record_stamp, session_path, SessionData, SessionLogEntry, ALERTS_DIR, SESSIONS_DIR,
};
pub use persistence::{SessionPersistence, StorageMode, StoredRecord};
pub use remote::RemoteBlobStore;
