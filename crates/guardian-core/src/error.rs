//! Core error types

use guardian_dom::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Document error: {0}")]
    Dom(#[from] guardian_dom::DomError),

    #[error("Storage error: {0}")]
    Storage(#[from] guardian_storage::StorageError),

    #[error("Mount point {0:?} is not attached to the document")]
    MountPointDetached(NodeId),

    #[error("Banner markup has no {0} control")]
    MissingControl(&'static str),
}
