use core::{fmt, iter::FusedIterator, marker::PhantomData};

use memory_resource::{MemoryResource, MemoryResourceError};

use crate::node::{Iter, IterMut, Link, Node};

/// A singly linked list with head and tail links and a cached length.
///
/// Every element lives in its own node allocated from the list's
/// [`MemoryResource`]. Pushing at either end and popping from the front are
/// constant time. Popping from the back walks the list to find the new tail.
///
/// A push that the resource cannot satisfy returns the resource's error and
/// leaves the list exactly as it was.
///
/// # Examples
///
/// ```
/// use memory_resource::FixedBlockMemoryResource;
/// use node_list::SinglyLinkedList;
///
/// let pool = FixedBlockMemoryResource::new(256)?;
/// let mut list = SinglyLinkedList::new_in(&pool);
/// list.push_back(2)?;
/// list.push_front(1)?;
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), [1, 2]);
/// assert_eq!(list.pop_back(), Some(2));
/// # Ok::<(), memory_resource::MemoryResourceError>(())
/// ```
pub struct SinglyLinkedList<'r, T> {
    head: Link<T>,
    tail: Link<T>,
    len: usize,
    resource: &'r dyn MemoryResource,
    _marker: PhantomData<T>,
}

impl<'r, T> SinglyLinkedList<'r, T> {
    /// Creates an empty list that allocates from [`memory_resource::system`].
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(memory_resource::system())
    }

    /// Creates an empty list that allocates from `resource`.
    ///
    /// No memory is requested until the first push.
    #[must_use]
    pub fn new_in(resource: &'r dyn MemoryResource) -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            resource,
            _marker: PhantomData,
        }
    }

    /// Returns the resource this list allocates its nodes from.
    #[must_use]
    pub fn resource(&self) -> &'r dyn MemoryResource {
        self.resource
    }

    /// Returns `true` if both lists allocate from the same resource.
    #[must_use]
    pub fn shares_resource_with<U>(&self, other: &SinglyLinkedList<'_, U>) -> bool {
        self.resource.is_equal(other.resource)
    }

    /// Appends `value` at the back.
    ///
    /// # Errors
    ///
    /// Returns the resource's error if no node could be allocated. `value` is
    /// dropped and the list is unchanged in that case.
    pub fn push_back(&mut self, value: T) -> Result<(), MemoryResourceError> {
        let node = Node::allocate(self.resource, value, None)?;
        match self.tail {
            Some(tail) => unsafe { (*tail.as_ptr()).next = Some(node) },
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Inserts `value` at the front.
    ///
    /// # Errors
    ///
    /// Returns the resource's error if no node could be allocated. `value` is
    /// dropped and the list is unchanged in that case.
    pub fn push_front(&mut self, value: T) -> Result<(), MemoryResourceError> {
        let node = Node::allocate(self.resource, value, self.head)?;
        if self.tail.is_none() {
            self.tail = Some(node);
        }
        self.head = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Removes the first element and returns it, or `None` if the list is
    /// empty.
    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        let (value, next) = unsafe { Node::release(self.resource, head) };
        self.head = next;
        if next.is_none() {
            self.tail = None;
        }
        self.len -= 1;
        Some(value)
    }

    /// Removes the last element and returns it, or `None` if the list is
    /// empty.
    ///
    /// This walks the list from the front.
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail?;
        if self.head == Some(tail) {
            return self.pop_front();
        }

        let mut new_tail = self.head?;
        unsafe {
            while (*new_tail.as_ptr()).next != Some(tail) {
                new_tail = (*new_tail.as_ptr()).next?;
            }
            (*new_tail.as_ptr()).next = None;
        }
        self.tail = Some(new_tail);
        self.len -= 1;

        let (value, _) = unsafe { Node::release(self.resource, tail) };
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
    pub fn back(&self) -> Option<&T> {
        self.tail.map(|node| unsafe { &(*node.as_ptr()).value })
    }

    #[must_use]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.tail.map(|node| unsafe { &mut (*node.as_ptr()).value })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every element, returning each node to the resource.
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Returns an iterator over the elements from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.head)
    }

    /// Returns an iterator that allows modifying each element.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.head)
    }

    /// Appends every element of `iter` in order.
    ///
    /// # Errors
    ///
    /// Stops at the first element that could not be allocated and returns the
    /// resource's error. Elements pushed before the failure stay in the list.
    pub fn try_extend<I>(&mut self, iter: I) -> Result<(), MemoryResourceError>
    where
        I: IntoIterator<Item = T>,
    {
        for value in iter {
            self.push_back(value)?;
        }
        Ok(())
    }

    /// Returns an element-wise copy allocating from the same resource.
    ///
    /// # Errors
    ///
    /// Returns the resource's error if any node could not be allocated. Nodes
    /// already allocated for the copy are returned before this returns.
    pub fn try_clone(&self) -> Result<Self, MemoryResourceError>
    where
        T: Clone,
    {
        let mut copy = Self::new_in(self.resource);
        copy.try_extend(self.iter().cloned())?;
        Ok(copy)
    }
}

impl<T> Default for SinglyLinkedList<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for SinglyLinkedList<'_, T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> fmt::Debug for SinglyLinkedList<'_, T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> PartialEq<SinglyLinkedList<'_, T>> for SinglyLinkedList<'_, T>
where
    T: PartialEq,
{
    fn eq(&self, other: &SinglyLinkedList<'_, T>) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T> Eq for SinglyLinkedList<'_, T> where T: Eq {}

impl<'a, T> IntoIterator for &'a SinglyLinkedList<'_, T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut SinglyLinkedList<'_, T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<'r, T> IntoIterator for SinglyLinkedList<'r, T> {
    type Item = T;
    type IntoIter = IntoIter<'r, T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { list: self }
    }
}

/// Owning iterator that pops elements from the front of a
/// [`SinglyLinkedList`].
///
/// Elements left when the iterator is dropped are released together with
/// their nodes.
#[derive(Debug)]
pub struct IntoIter<'r, T> {
    list: SinglyLinkedList<'r, T>,
}

impl<T> Iterator for IntoIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len, Some(self.list.len))
    }
}

impl<T> ExactSizeIterator for IntoIter<'_, T> {}
impl<T> FusedIterator for IntoIter<'_, T> {}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use core::alloc::Layout;

    use memory_resource::{DynamicListMemoryResource, FixedBlockMemoryResource};

    use super::*;

    const POOL_SIZE: usize = 2048;

    fn collect<T: Copy>(list: &SinglyLinkedList<'_, T>) -> Vec<T> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_new_list_is_empty() {
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let list = SinglyLinkedList::<i32>::new_in(&pool);
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
        assert_eq!(pool.used_bytes(), 0);
    }

    #[test]
    fn test_push_back() {
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        list.push_back(1).unwrap();
        list.push_back(2).unwrap();
        list.push_back(3).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&3));
        assert_eq!(collect(&list), [1, 2, 3]);
    }

    #[test]
    fn test_push_front() {
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        list.push_front(1).unwrap();
        list.push_front(2).unwrap();
        list.push_front(3).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(list.front(), Some(&3));
        assert_eq!(list.back(), Some(&1));
        assert_eq!(collect(&list), [3, 2, 1]);
    }

    #[test]
    fn test_pop_front() {
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        list.try_extend([1, 2, 3]).unwrap();

        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.len(), 2);
        assert_eq!(list.front(), Some(&2));
        assert_eq!(list.back(), Some(&3));
    }

    #[test]
    fn test_pop_back() {
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        list.try_extend([1, 2, 3]).unwrap();

        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.len(), 2);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&2));

        list.push_back(4).unwrap();
        assert_eq!(collect(&list), [1, 2, 4]);
    }

    #[test]
    fn test_pop_until_empty_resets_both_ends() {
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        list.try_extend([1, 2]).unwrap();

        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), Some(1));
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);

        list.push_front(5).unwrap();
        assert_eq!(list.front(), Some(&5));
        assert_eq!(list.back(), Some(&5));
    }

    #[test]
    fn test_pop_on_empty_list() {
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let mut list = SinglyLinkedList::<i32>::new_in(&pool);
        assert_eq!(list.pop_front(), None);
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_front_and_back_mut() {
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        list.try_extend([1, 2, 3]).unwrap();

        *list.front_mut().unwrap() = 10;
        *list.back_mut().unwrap() = 30;
        assert_eq!(collect(&list), [10, 2, 30]);
    }

    #[test]
    fn test_clear() {
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        list.try_extend([1, 2, 3]).unwrap();
        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(pool.used_bytes(), 0);
        assert_eq!(pool.block_count(), 1);
    }

    #[test]
    fn test_iter_mut() {
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        list.try_extend([1, 2, 3]).unwrap();

        for value in &mut list {
            *value *= 2;
        }
        assert_eq!(collect(&list), [2, 4, 6]);
    }

    #[test]
    fn test_into_iter() {
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        list.try_extend([1, 2, 3]).unwrap();

        let mut iter = list.into_iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next(), Some(1));
        drop(iter);
        assert_eq!(pool.used_bytes(), 0);
    }

    #[test]
    fn test_try_clone() {
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        list.try_extend([1, 2, 3]).unwrap();

        let mut copy = list.try_clone().unwrap();
        assert_eq!(copy, list);
        assert!(copy.shares_resource_with(&list));

        copy.push_back(4).unwrap();
        assert_ne!(copy, list);
        assert_eq!(collect(&list), [1, 2, 3]);
    }

    #[test]
    fn test_try_clone_failure_releases_partial_copy() {
        let node = Layout::new::<Node<u64>>().size();
        let pool = FixedBlockMemoryResource::new(node * 3).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        list.try_extend([1_u64, 2]).unwrap();

        let err = list.try_clone().unwrap_err();
        assert!(err.is_out_of_memory());
        assert_eq!(pool.used_bytes(), node * 2);
        assert_eq!(collect(&list), [1, 2]);
    }

    #[test]
    fn test_failed_push_leaves_list_unchanged() {
        let node = Layout::new::<Node<i32>>().size();
        let pool = FixedBlockMemoryResource::new(node).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        list.push_back(1).unwrap();

        assert!(list.push_back(2).unwrap_err().is_out_of_memory());
        assert!(list.push_front(0).unwrap_err().is_out_of_memory());
        assert_eq!(list.len(), 1);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&1));
    }

    #[test]
    fn test_one_allocation_per_element() {
        let resource = DynamicListMemoryResource::new();
        let mut list = SinglyLinkedList::new_in(&resource);
        list.try_extend(0..5).unwrap();
        assert_eq!(resource.allocated_count(), 5);

        list.pop_front();
        list.pop_back();
        assert_eq!(resource.allocated_count(), 3);
        assert_eq!(resource.free_count(), 2);

        list.push_back(7).unwrap();
        assert_eq!(resource.system_allocations(), 5);

        drop(list);
        assert_eq!(resource.allocated_count(), 0);
        assert_eq!(resource.free_count(), 5);
    }

    #[test]
    fn test_drops_elements() {
        use std::rc::Rc;

        let counter = Rc::new(());
        let pool = FixedBlockMemoryResource::new(POOL_SIZE).unwrap();
        let mut list = SinglyLinkedList::new_in(&pool);
        for _ in 0..4 {
            list.push_back(Rc::clone(&counter)).unwrap();
        }
        assert_eq!(Rc::strong_count(&counter), 5);

        drop(list.pop_back());
        assert_eq!(Rc::strong_count(&counter), 4);
        drop(list);
        assert_eq!(Rc::strong_count(&counter), 1);
    }

    #[test]
    fn test_default_uses_system_resource() {
        let mut list = SinglyLinkedList::default();
        list.try_extend(["a", "b"]).unwrap();
        assert!(list.resource().is_equal(memory_resource::system()));
        assert_eq!(format!("{list:?}"), r#"["a", "b"]"#);
    }
}
