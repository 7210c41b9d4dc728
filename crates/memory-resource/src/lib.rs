//! Pluggable memory resources.
//!
//! A memory resource hands out and takes back raw, untyped memory regions.
//! Every strategy in this crate implements the [`MemoryResource`] trait, so
//! consumers such as node-based lists are written once against
//! `&dyn MemoryResource` and can be backed by whichever strategy fits.
//!
//! # Available Resources
//!
//! ## [`FixedBlockMemoryResource`]
//!
//! Owns one pre-sized pool that never grows. The pool is partitioned into
//! blocks kept in address order; requests are served by first-fit search and
//! block splitting, and freed blocks are coalesced with free neighbours.
//! Best suited for:
//!
//! - Bounded workloads whose peak usage is known up front
//! - Keeping a container's memory in one contiguous region
//!
//! ## [`DynamicListMemoryResource`]
//!
//! Obtains independent allocations from the global allocator and keeps them
//! after they are returned, so later requests of a compatible size and
//! alignment reuse them. Blocks are never split or merged. Best suited for:
//!
//! - Repeated allocation of same-sized nodes
//! - Workloads without a known upper bound
//!
//! ## [`SystemMemoryResource`]
//!
//! Pass-through to the global allocator with no bookkeeping. [`system()`]
//! returns the process-wide instance used as the default backing store.
//!
//! # Usage Example
//!
//! ```rust
//! use core::alloc::Layout;
//!
//! use memory_resource::{FixedBlockMemoryResource, MemoryResource as _};
//!
//! let pool = FixedBlockMemoryResource::new(1024).unwrap();
//! let layout = Layout::from_size_align(64, 8).unwrap();
//!
//! let ptr = pool.allocate(layout).unwrap();
//! assert_eq!(pool.used_bytes(), 64);
//!
//! unsafe { pool.deallocate(ptr, layout).unwrap() };
//! assert_eq!(pool.free_bytes(), 1024);
//! ```
//!
//! # Error Handling
//!
//! Both operations report failures through [`MemoryResourceError`]:
//!
//! | Error | Raised by | Condition |
//! |-------|-----------|-----------|
//! | `OutOfMemory` | every resource | no single region can satisfy the request |
//! | `InvalidPointer` | `FixedBlockMemoryResource::deallocate` | pointer is not the start of a used block |
//!
//! `DynamicListMemoryResource::deallocate` silently ignores pointers it does
//! not track.
//!
//! # Thread Safety
//!
//! The resources keep their bookkeeping in a [`RefCell`](core::cell::RefCell)
//! and are therefore `!Sync`. A resource can be shared by many containers on
//! one thread; sharing across threads requires an external lock.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

use core::{
    alloc::{Layout, LayoutError},
    ptr::{self, NonNull},
};

use snafu::{OptionExt as _, Snafu};
use snafu_utils::Location;

pub use self::{
    dynamic_list::DynamicListMemoryResource,
    fixed_block::{BlockInfo, BlockState, FixedBlockMemoryResource, POOL_ALIGN},
    system::{SystemMemoryResource, system},
};

mod dynamic_list;
mod fixed_block;
mod system;

/// A source of raw memory regions.
///
/// # Contract
///
/// - [`allocate`](Self::allocate) returns a region of at least
///   `layout.size()` bytes aligned to `layout.align()` that does not overlap
///   any region currently handed out by the same resource.
/// - [`deallocate`](Self::deallocate) returns a region to the resource so
///   later calls may reuse it. The `layout` must echo the one used to
///   allocate it.
/// - [`is_equal`](Self::is_equal) compares identity: two resources are equal
///   only if they are the same instance, so memory allocated from one can be
///   deallocated through the other.
pub trait MemoryResource {
    /// Allocates a region described by `layout`.
    ///
    /// Zero-sized layouts are served as one-byte requests, so every returned
    /// pointer owns a distinct region.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, MemoryResourceError>;

    /// Returns a region previously obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// - `ptr` was returned by `allocate` on a resource equal to `self`
    /// - `layout` is the layout that was passed to that `allocate` call
    /// - the region has not been deallocated already and is not accessed
    ///   after this call
    ///
    /// Resources that track their blocks may detect a violation and report
    /// [`MemoryResourceError::InvalidPointer`] instead of corrupting their
    /// state, but callers must not rely on it.
    unsafe fn deallocate(
        &self,
        ptr: NonNull<u8>,
        layout: Layout,
    ) -> Result<(), MemoryResourceError>;

    /// Returns `true` if `other` is this very resource.
    fn is_equal(&self, other: &dyn MemoryResource) -> bool {
        ptr::addr_eq(self, other)
    }
}

/// Errors reported by [`MemoryResource`] implementations.
///
/// A failed operation never leaves partial state behind: the resource looks
/// exactly as it did before the call.
#[derive(Debug, Snafu, derive_more::IsVariant)]
#[snafu(module)]
pub enum MemoryResourceError {
    #[snafu(display(
        "out of memory: no free block can hold {} bytes (align {})",
        layout.size(),
        layout.align()
    ))]
    OutOfMemory {
        layout: Layout,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("invalid pointer to deallocate: {addr:#x}"))]
    InvalidPointer {
        addr: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("invalid memory pool size: {pool_size}"))]
    InvalidPoolSize {
        pool_size: usize,
        #[snafu(source)]
        source: LayoutError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl MemoryResourceError {
    /// Returns the source location of the call that failed.
    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            Self::OutOfMemory { location, .. }
            | Self::InvalidPointer { location, .. }
            | Self::InvalidPoolSize { location, .. } => *location,
        }
    }
}

/// Number of bytes actually reserved for `layout`.
fn request_size(layout: Layout) -> usize {
    layout.size().max(1)
}

/// Layout actually reserved for `layout`: same alignment, never zero-sized.
fn request_layout(layout: Layout) -> Result<Layout, MemoryResourceError> {
    use self::memory_resource_error::OutOfMemorySnafu;

    Layout::from_size_align(request_size(layout), layout.align())
        .ok()
        .context(OutOfMemorySnafu { layout })
}
