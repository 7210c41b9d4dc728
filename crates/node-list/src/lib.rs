//! Node-based lists that allocate through a [`MemoryResource`].
//!
//! Each element is stored in its own node, and every node is obtained from
//! the resource the list was created with. The list borrows the resource
//! for its whole lifetime, so one resource can back any number of lists.
//!
//! - [`SinglyLinkedList`] tracks head, tail and length and supports pushing at
//!   both ends.
//! - [`ForwardList`] tracks only the head.
//!
//! ```rust
//! use memory_resource::DynamicListMemoryResource;
//! use node_list::{ForwardList, SinglyLinkedList};
//!
//! let resource = DynamicListMemoryResource::new();
//! let mut numbers = SinglyLinkedList::new_in(&resource);
//! let mut names = ForwardList::new_in(&resource);
//!
//! numbers.push_back(42).unwrap();
//! names.push_front("first").unwrap();
//! assert_eq!(resource.allocated_count(), 2);
//! ```
//!
//! [`MemoryResource`]: memory_resource::MemoryResource

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub use self::{
    forward::ForwardList,
    node::{Iter, IterMut},
    singly_linked::{IntoIter, SinglyLinkedList},
};

mod forward;
mod node;
mod singly_linked;
