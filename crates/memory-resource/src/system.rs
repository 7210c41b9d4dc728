//! Pass-through memory resource over the global allocator.
//!
//! [`system()`] is the resource lists fall back to when none is given.

use alloc::alloc as raw;
use core::{alloc::Layout, ptr::NonNull};

use snafu::OptionExt as _;

use crate::{MemoryResource, MemoryResourceError, memory_resource_error::OutOfMemorySnafu};

static SYSTEM: SystemMemoryResource = SystemMemoryResource { _private: () };

/// Returns the process-wide [`SystemMemoryResource`].
///
/// Containers constructed without an explicit resource allocate from here.
#[must_use]
pub fn system() -> &'static SystemMemoryResource {
    &SYSTEM
}

/// A memory resource that forwards every request to the global allocator.
///
/// It keeps no bookkeeping, so it cannot detect pointers it did not hand out.
#[derive(Debug)]
pub struct SystemMemoryResource {
    _private: (),
}

impl MemoryResource for SystemMemoryResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, MemoryResourceError> {
        let request = crate::request_layout(layout)?;
        NonNull::new(unsafe { raw::alloc(request) }).context(OutOfMemorySnafu { layout })
    }

    unsafe fn deallocate(
        &self,
        ptr: NonNull<u8>,
        layout: Layout,
    ) -> Result<(), MemoryResourceError> {
        let request = crate::request_layout(layout)?;
        unsafe { raw::dealloc(ptr.as_ptr(), request) };
        Ok(())
    }
}
