use core::{fmt, marker::PhantomData};

use memory_resource::{MemoryResource, MemoryResourceError};

use crate::node::{Iter, IterMut, Link, Node};

/// A minimal singly linked list that only grows and shrinks at the front.
///
/// It keeps nothing but the head link, so it costs one pointer plus the
/// resource reference.
pub struct ForwardList<'r, T> {
    head: Link<T>,
    resource: &'r dyn MemoryResource,
    _marker: PhantomData<T>,
}

impl<'r, T> ForwardList<'r, T> {
    /// Creates an empty list that allocates from [`memory_resource::system`].
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(memory_resource::system())
    }

    /// Creates an empty list that allocates from `resource`.
    #[must_use]
    pub fn new_in(resource: &'r dyn MemoryResource) -> Self {
        Self {
            head: None,
            resource,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn resource(&self) -> &'r dyn MemoryResource {
        self.resource
    }

    /// Inserts `value` at the front.
    ///
    /// # Errors
    ///
    /// Returns the resource's error if no node could be allocated. `value` is
    /// dropped and the list is unchanged in that case.
    pub fn push_front(&mut self, value: T) -> Result<(), MemoryResourceError> {
        let node = Node::allocate(self.resource, value, self.head)?;
        self.head = Some(node);
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        let (value, next) = unsafe { Node::release(self.resource, head) };
        self.head = next;
        Some(value)
    }

    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.head.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    #[must_use]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.head.map(|node| unsafe { &mut (*node.as_ptr()).value })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.head)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.head)
    }
}

impl<T> Default for ForwardList<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for ForwardList<'_, T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> fmt::Debug for ForwardList<'_, T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a ForwardList<'_, T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut ForwardList<'_, T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
