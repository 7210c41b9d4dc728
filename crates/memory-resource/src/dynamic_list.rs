//! Dynamic free-list memory resource implementation.
//!
//! This module provides a memory resource that requests every region
//! independently from the global allocator and keeps it for reuse once it is
//! returned. Each region is tracked as one entry that lives in exactly one of
//! two lists:
//!
//! - **allocated**: handed out and not yet returned
//! - **free**: returned and waiting to be handed out again
//!
//! Entries are never split, merged or trimmed. An entry serves any request
//! whose size and alignment it covers, so a returned region may be larger than
//! requested. The set of entries only grows while the resource lives; all of
//! them, in either list, are released when it is dropped.

use alloc::{alloc as raw, vec::Vec};
use core::{alloc::Layout, cell::RefCell, ptr::NonNull};

use snafu::OptionExt as _;

use crate::{MemoryResource, MemoryResourceError, memory_resource_error::OutOfMemorySnafu};

/// One region obtained from the global allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TrackedAllocation {
    ptr: NonNull<u8>,
    /// Layout the region was allocated with.
    layout: Layout,
}

impl TrackedAllocation {
    fn satisfies(&self, layout: Layout) -> bool {
        self.layout.size() >= crate::request_size(layout) && self.layout.align() >= layout.align()
    }
}

#[derive(Debug)]
struct Lists {
    allocated: Vec<TrackedAllocation>,
    free: Vec<TrackedAllocation>,
    system_allocations: usize,
}

/// A memory resource that recycles whole regions from the global allocator.
///
/// # Algorithm
///
/// - **Allocation**: scans the free list in the order regions were returned
///   and reuses the first one whose recorded size and alignment cover the
///   request. On a miss a new region of exactly the requested layout is
///   allocated.
/// - **Deallocation**: moves the region from the allocated list to the free
///   list. Pointers that are not currently allocated are ignored.
///
/// Both operations are O(n) in the number of tracked regions.
///
/// # Examples
///
/// ```
/// # use core::alloc::Layout;
/// # use memory_resource::{DynamicListMemoryResource, MemoryResource as _};
/// let resource = DynamicListMemoryResource::new();
/// let layout = Layout::from_size_align(100, 8).unwrap();
///
/// let first = resource.allocate(layout).unwrap();
/// unsafe { resource.deallocate(first, layout).unwrap() };
/// let second = resource.allocate(layout).unwrap();
///
/// assert_eq!(first, second);
/// assert_eq!(resource.system_allocations(), 1);
/// ```
#[derive(Debug)]
pub struct DynamicListMemoryResource {
    lists: RefCell<Lists>,
}

unsafe impl Send for DynamicListMemoryResource {}

impl Default for DynamicListMemoryResource {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicListMemoryResource {
    /// Creates an empty resource. No memory is requested until the first
    /// allocation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lists: RefCell::new(Lists {
                allocated: Vec::new(),
                free: Vec::new(),
                system_allocations: 0,
            }),
        }
    }

    /// Returns the number of regions currently handed out.
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.lists.borrow().allocated.len()
    }

    /// Returns the number of regions waiting for reuse.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.lists.borrow().free.len()
    }

    /// Returns how many regions have been requested from the global allocator
    /// so far.
    #[must_use]
    pub fn system_allocations(&self) -> usize {
        self.lists.borrow().system_allocations
    }

    /// Returns the total size of every region owned by the resource, in either
    /// list.
    #[must_use]
    pub fn tracked_bytes(&self) -> usize {
        let lists = self.lists.borrow();
        lists
            .allocated
            .iter()
            .chain(&lists.free)
            .map(|entry| entry.layout.size())
            .sum()
    }
}

impl Drop for DynamicListMemoryResource {
    fn drop(&mut self) {
        let lists = self.lists.get_mut();
        for entry in lists.allocated.drain(..).chain(lists.free.drain(..)) {
            unsafe { raw::dealloc(entry.ptr.as_ptr(), entry.layout) };
        }
    }
}

impl MemoryResource for DynamicListMemoryResource {
    /// Reuses the first compatible free region or allocates a new one.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryResourceError::OutOfMemory`] if no free region fits and
    /// the global allocator cannot provide a new one.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, MemoryResourceError> {
        let mut lists = self.lists.borrow_mut();

        if let Some(index) = lists.free.iter().position(|entry| entry.satisfies(layout)) {
            let entry = lists.free.remove(index);
            lists.allocated.push(entry);
            return Ok(entry.ptr);
        }

        let request = crate::request_layout(layout)?;
        let ptr =
            NonNull::new(unsafe { raw::alloc(request) }).context(OutOfMemorySnafu { layout })?;
        lists.allocated.push(TrackedAllocation {
            ptr,
            layout: request,
        });
        lists.system_allocations += 1;
        Ok(ptr)
    }

    /// Moves the region at `ptr` to the free list.
    ///
    /// Only the layout recorded at allocation time matters for later reuse;
    /// `layout` is ignored. Unknown pointers are ignored as well, so this
    /// never fails.
    unsafe fn deallocate(
        &self,
        ptr: NonNull<u8>,
        _layout: Layout,
    ) -> Result<(), MemoryResourceError> {
        let mut lists = self.lists.borrow_mut();

        if let Some(index) = lists.allocated.iter().position(|entry| entry.ptr == ptr) {
            let entry = lists.allocated.remove(index);
            lists.free.push(entry);
        }
        Ok(())
    }
}
