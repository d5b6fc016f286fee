//! A generic doubly linked list whose nodes live in an index arena.
//!
//! [`DoublyLinkedList`] keeps its nodes in a growable vector of slots and
//! links them by slot index instead of by pointer. Callers refer to nodes
//! through [`NodeId`] handles, which pair a slot index with the generation of
//! the slot. Removing a node bumps the generation, so a handle kept across a
//! removal is reported as stale rather than silently aliasing whatever node
//! reuses the slot later.
//!
//! ```text
//!            head                                   tail
//!             │                                      │
//!             ▼                                      ▼
//!   slots: [ #0 A ] ⇄ [ #3 B ] ⇄ [ #1 C ]     [ #2 vacant ] → free chain
//! ```
//!
//! # Operations
//!
//! - Insertion next to a node (or at either end) and removal by handle are
//!   O(1).
//! - [`DoublyLinkedList::iterate`] and [`DoublyLinkedList::iterate_reverse`]
//!   walk an inclusive span of nodes and let the callback stop the walk early.
//! - [`DoublyLinkedList::iter`] is a plain double-ended iterator over
//!   `(NodeId, &T)` pairs.
//!
//! # Example
//!
//! ```
//! use core::ops::ControlFlow;
//!
//! use dll::{DoublyLinkedList, Traversal};
//!
//! let mut list = DoublyLinkedList::new();
//! let a = list.push_back('a').unwrap();
//! let c = list.push_back('c').unwrap();
//! list.insert_after(Some(a), 'b').unwrap();
//!
//! let mut seen = Vec::new();
//! let outcome = list
//!     .iterate(None, Some(c), |list, node| {
//!         seen.push(*list.get(node).unwrap());
//!         ControlFlow::Continue(())
//!     })
//!     .unwrap();
//! assert_eq!(outcome, Traversal::Completed);
//! assert_eq!(seen, ['a', 'b', 'c']);
//!
//! assert_eq!(list.remove(a).unwrap(), 'a');
//! assert!(list.get(a).is_none());
//! ```

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

use alloc::collections::TryReserveError;

use snafu::Snafu;
use snafu_utils::{Located, Location};

pub use self::{
    iter::{Iter, Traversal},
    list::DoublyLinkedList,
    node::NodeId,
};

mod iter;
mod list;
mod node;

/// Errors reported by [`DoublyLinkedList`] operations.
#[derive(Debug, Snafu)]
pub enum ListError {
    #[snafu(display("failed to allocate list node"))]
    AllocNode {
        #[snafu(source)]
        source: TryReserveError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("node {node} is not linked into this list"))]
    StaleNode {
        node: NodeId,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("end node {end} is not reachable from the start node"))]
    UnreachableEnd {
        end: NodeId,
        #[snafu(implicit)]
        location: Location,
    },
}

impl Located for ListError {
    fn location(&self) -> Location {
        match self {
            Self::AllocNode { location, .. }
            | Self::StaleNode { location, .. }
            | Self::UnreachableEnd { location, .. } => *location,
        }
    }
}
