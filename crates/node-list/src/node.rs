use core::{alloc::Layout, iter::FusedIterator, marker::PhantomData, ptr::NonNull};

use memory_resource::{MemoryResource, MemoryResourceError};

pub(crate) type Link<T> = Option<NonNull<Node<T>>>;

/// A list element together with the link to its successor.
///
/// Nodes live in memory obtained from the owning list's resource, one
/// allocation per node.
pub(crate) struct Node<T> {
    pub(crate) value: T,
    pub(crate) next: Link<T>,
}

impl<T> Node<T> {
    const LAYOUT: Layout = Layout::new::<Self>();

    /// Allocates a node from `resource` and moves `value` into it.
    ///
    /// On failure `value` is dropped and nothing is allocated.
    pub(crate) fn allocate(
        resource: &dyn MemoryResource,
        value: T,
        next: Link<T>,
    ) -> Result<NonNull<Self>, MemoryResourceError> {
        let node = resource.allocate(Self::LAYOUT)?.cast::<Self>();
        unsafe { node.write(Self { value, next }) };
        Ok(node)
    }

    /// Moves the contents out of `node` and returns its memory to
    /// `resource`.
    ///
    /// # Safety
    ///
    /// `node` must have been created by [`Node::allocate`] with a resource
    /// equal to `resource`, must not be reachable from any list afterwards and
    /// must not be released twice.
    ///
    /// # Panics
    ///
    /// Panics if the resource refuses to take the node back.
    pub(crate) unsafe fn release(
        resource: &dyn MemoryResource,
        node: NonNull<Self>,
    ) -> (T, Link<T>) {
        let Self { value, next } = unsafe { node.read() };
        if let Err(err) = unsafe { resource.deallocate(node.cast(), Self::LAYOUT) } {
            panic!("list node rejected by its memory resource: {err}");
        }
        (value, next)
    }
}

/// Borrowing iterator over the values of a chain of nodes.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, T> {
    next: Link<T>,
    _marker: PhantomData<&'a T>,
}

impl<T> Iter<'_, T> {
    pub(crate) fn new(head: Link<T>) -> Self {
        Self {
            next: head,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self::new(self.next)
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.map(|node| {
            let node = unsafe { &*node.as_ptr() };
            self.next = node.next;
            &node.value
        })
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

/// Mutably borrowing iterator over the values of a chain of nodes.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct IterMut<'a, T> {
    next: Link<T>,
    _marker: PhantomData<&'a mut T>,
}

impl<T> IterMut<'_, T> {
    pub(crate) fn new(head: Link<T>) -> Self {
        Self {
            next: head,
            _marker: PhantomData,
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.map(|node| {
            let node = unsafe { &mut *node.as_ptr() };
            self.next = node.next;
            &mut node.value
        })
    }
}

impl<T> FusedIterator for IterMut<'_, T> {}
