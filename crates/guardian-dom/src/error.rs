//! Document error types

use thiserror::Error;

use crate::NodeId;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomError {
    #[error("Fragment is empty")]
    EmptyFragment,

    #[error("Fragment does not start with an element")]
    NotAnElement,

    #[error("Node {0:?} is not an element")]
    ExpectedElement(NodeId),

    #[error("Node {0:?} is not attached to the document")]
    Detached(NodeId),

    #[error("Cannot insert {child:?} into its own subtree at {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}
