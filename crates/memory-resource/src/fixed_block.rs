//! Fixed-block memory resource implementation.
//!
//! This module provides a memory resource that owns a single pool of a size
//! chosen at construction. The pool never grows; it is partitioned into
//! blocks whose metadata lives outside the pool, in a vector kept in address
//! order.
//!
//! # Algorithm
//!
//! - **Allocation**: first-fit. The first free block that can hold the
//!   request at the requested alignment is split: leading padding (if any)
//!   and the unused tail each become a free block of their own, and the middle
//!   part is marked used.
//! - **Deallocation**: the used block starting at the given pointer is marked
//!   free and merged with physically adjacent free blocks.
//!
//! # Invariants
//!
//! After every operation:
//!
//! - the blocks partition the pool: each block starts where its predecessor
//!   ends and their sizes sum to the pool size
//! - no two neighbouring blocks are both free
//!
//! Free capacity that is split across non-adjacent blocks is never compacted,
//! so a request can fail while the total free space would suffice.
//!
//! ```text
//! pool: 256 bytes
//! ┌──────────────┬───────────────────────────┬──────────────┐
//! │ free (64)    │ used (128)                │ free (64)    │
//! └──────────────┴───────────────────────────┴──────────────┘
//! allocate(100) -> OutOfMemory
//! ```

use alloc::{alloc as raw, vec, vec::Vec};
use core::{alloc::Layout, cell::RefCell, ptr::NonNull};

use snafu::{OptionExt as _, ResultExt as _};

use crate::{
    MemoryResource, MemoryResourceError,
    memory_resource_error::{InvalidPointerSnafu, InvalidPoolSizeSnafu, OutOfMemorySnafu},
};

/// Alignment of the pool start.
///
/// Requests with an alignment up to this value are served without padding
/// when the candidate block starts at a multiple of it.
pub const POOL_ALIGN: usize = 16;

/// Occupancy of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum BlockState {
    #[display("free")]
    Free,
    #[display("used")]
    Used,
}

/// Metadata of one contiguous region of the pool.
///
/// Offsets are relative to the pool start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub offset: usize,
    pub size: usize,
    pub state: BlockState,
}

impl BlockInfo {
    const fn free(offset: usize, size: usize) -> Self {
        Self {
            offset,
            size,
            state: BlockState::Free,
        }
    }

    /// Offset one past the last byte of the block.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.size
    }

    /// Returns `true` if this block is free and holds `size` bytes after
    /// skipping `padding` bytes.
    fn fits(&self, padding: usize, size: usize) -> bool {
        self.state.is_free()
            && padding
                .checked_add(size)
                .is_some_and(|needed| needed <= self.size)
    }
}

/// A memory resource serving requests from one pre-sized pool.
///
/// See the [module documentation](self) for the algorithm.
///
/// # Thread Safety
///
/// The resource is `Send` but not `Sync`. It can be moved between threads but
/// requires external synchronization for concurrent access.
#[derive(derive_more::Debug)]
pub struct FixedBlockMemoryResource {
    pool: NonNull<u8>,
    #[debug(skip)]
    pool_layout: Option<Layout>,
    blocks: RefCell<Vec<BlockInfo>>,
}

unsafe impl Send for FixedBlockMemoryResource {}

impl FixedBlockMemoryResource {
    /// Creates a resource owning a freshly allocated pool of `pool_size`
    /// bytes, tracked as a single free block.
    ///
    /// A zero-byte pool owns no memory and fails every allocation.
    ///
    /// # Errors
    ///
    /// - [`MemoryResourceError::InvalidPoolSize`] if `pool_size` is too large
    ///   to describe a layout
    /// - [`MemoryResourceError::OutOfMemory`] if the global allocator cannot
    ///   provide the pool
    ///
    /// # Examples
    ///
    /// ```
    /// # use memory_resource::FixedBlockMemoryResource;
    /// let pool = FixedBlockMemoryResource::new(4096).unwrap();
    /// assert_eq!(pool.pool_size(), 4096);
    /// assert_eq!(pool.free_bytes(), 4096);
    /// ```
    pub fn new(pool_size: usize) -> Result<Self, MemoryResourceError> {
        if pool_size == 0 {
            return Ok(Self {
                pool: NonNull::dangling(),
                pool_layout: None,
                blocks: RefCell::new(Vec::new()),
            });
        }

        let layout = Layout::from_size_align(pool_size, POOL_ALIGN)
            .context(InvalidPoolSizeSnafu { pool_size })?;
        let pool =
            NonNull::new(unsafe { raw::alloc(layout) }).context(OutOfMemorySnafu { layout })?;

        Ok(Self {
            pool,
            pool_layout: Some(layout),
            blocks: RefCell::new(vec![BlockInfo::free(0, pool_size)]),
        })
    }

    /// Returns the capacity of the pool in bytes.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool_layout.map_or(0, |layout| layout.size())
    }

    /// Returns a snapshot of the blocks in address order.
    #[must_use]
    pub fn blocks(&self) -> Vec<BlockInfo> {
        self.blocks.borrow().clone()
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }

    /// Returns the total size of all free blocks.
    #[must_use]
    pub fn free_bytes(&self) -> usize {
        self.blocks
            .borrow()
            .iter()
            .filter(|block| block.state.is_free())
            .map(|block| block.size)
            .sum()
    }

    /// Returns the total size of all used blocks.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.pool_size() - self.free_bytes()
    }

    /// Returns the size of the largest free block, which bounds the largest
    /// request that can currently succeed.
    #[must_use]
    pub fn largest_free_block(&self) -> usize {
        self.blocks
            .borrow()
            .iter()
            .filter(|block| block.state.is_free())
            .map(|block| block.size)
            .max()
            .unwrap_or(0)
    }

    /// Returns `true` if `ptr` points into the pool.
    #[must_use]
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.offset_of(ptr).is_some()
    }

    /// Converts `ptr` into an offset from the pool start.
    fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        let offset = ptr.addr().get().checked_sub(self.pool.addr().get())?;
        (offset < self.pool_size()).then_some(offset)
    }

    /// Number of bytes to skip from `offset` so that the address is aligned
    /// to `align`.
    fn padding(&self, offset: usize, align: usize) -> Option<usize> {
        let addr = self.pool.addr().get() + offset;
        Some(addr.checked_next_multiple_of(align)? - addr)
    }

    /// Carves `size` bytes starting `padding` bytes into the free block at
    /// `index` and marks them used.
    ///
    /// Returns the index of the used block.
    fn carve(blocks: &mut Vec<BlockInfo>, mut index: usize, padding: usize, size: usize) -> usize {
        let block = blocks[index];
        assert!(block.fits(padding, size));

        if padding > 0 {
            blocks[index].size = padding;
            index += 1;
            blocks.insert(
                index,
                BlockInfo::free(block.offset + padding, block.size - padding),
            );
        }

        let block = blocks[index];
        if block.size > size {
            blocks.insert(
                index + 1,
                BlockInfo::free(block.offset + size, block.size - size),
            );
        }

        let block = &mut blocks[index];
        block.size = size;
        block.state = BlockState::Used;
        index
    }

    /// Merges every pair of neighbouring free blocks that touch each other.
    fn coalesce(blocks: &mut Vec<BlockInfo>) {
        let mut index = 0;
        while index + 1 < blocks.len() {
            let (current, next) = (blocks[index], blocks[index + 1]);
            if current.state.is_free() && next.state.is_free() && current.end() == next.offset {
                blocks[index].size += next.size;
                blocks.remove(index + 1);
            } else {
                index += 1;
            }
        }
    }
}

impl Drop for FixedBlockMemoryResource {
    fn drop(&mut self) {
        if let Some(layout) = self.pool_layout {
            unsafe { raw::dealloc(self.pool.as_ptr(), layout) };
        }
    }
}

impl MemoryResource for FixedBlockMemoryResource {
    /// Allocates from the first free block that can hold `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryResourceError::OutOfMemory`] if no single free block is
    /// large enough. No compaction is attempted.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, MemoryResourceError> {
        let size = crate::request_size(layout);
        let mut blocks = self.blocks.borrow_mut();

        let (index, padding) = blocks
            .iter()
            .enumerate()
            .find_map(|(index, block)| {
                let padding = self.padding(block.offset, layout.align())?;
                block.fits(padding, size).then_some((index, padding))
            })
            .context(OutOfMemorySnafu { layout })?;

        let index = Self::carve(&mut blocks, index, padding, size);
        Ok(unsafe { self.pool.add(blocks[index].offset) })
    }

    /// Frees the used block starting at `ptr` and coalesces it with its free
    /// neighbours.
    ///
    /// `layout` is not compared with the recorded block size.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryResourceError::InvalidPointer`] if `ptr` is not the
    /// start of a used block. The resource is left untouched in that case.
    unsafe fn deallocate(
        &self,
        ptr: NonNull<u8>,
        _layout: Layout,
    ) -> Result<(), MemoryResourceError> {
        let mut blocks = self.blocks.borrow_mut();

        let index = self
            .offset_of(ptr)
            .and_then(|offset| {
                blocks
                    .binary_search_by_key(&offset, |block| block.offset)
                    .ok()
            })
            .filter(|&index| blocks[index].state.is_used())
            .context(InvalidPointerSnafu {
                addr: ptr.addr().get(),
            })?;

        blocks[index].state = BlockState::Free;
        Self::coalesce(&mut blocks);
        Ok(())
    }
}
