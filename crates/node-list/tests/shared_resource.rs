#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]
#![cfg(test)]

use memory_resource::{DynamicListMemoryResource, FixedBlockMemoryResource};
use node_list::{ForwardList, SinglyLinkedList};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    id: i32,
    weight: f64,
    tag: char,
}

#[test]
fn small_pool_holds_ten_ints_and_refills_after_clear() {
    let pool = FixedBlockMemoryResource::new(256).unwrap();
    let mut list = SinglyLinkedList::new_in(&pool);

    list.try_extend(0..10).unwrap();
    assert_eq!(list.len(), 10);
    assert_eq!(list.back(), Some(&9));

    list.clear();
    assert_eq!(pool.block_count(), 1);
    assert_eq!(pool.free_bytes(), 256);

    list.try_extend(10..20).unwrap();
    assert_eq!(list.iter().sum::<i32>(), (10..20).sum());
}

#[test]
fn dropping_lists_reclaims_the_pool() {
    let pool = FixedBlockMemoryResource::new(2048).unwrap();
    {
        let mut ints = SinglyLinkedList::new_in(&pool);
        let mut samples = ForwardList::new_in(&pool);
        ints.try_extend([1, 2, 3]).unwrap();
        samples
            .push_front(Sample {
                id: 1,
                weight: 1.1,
                tag: 'a',
            })
            .unwrap();
        assert!(pool.block_count() > 1);
    }
    assert_eq!(pool.block_count(), 1);
    assert_eq!(pool.used_bytes(), 0);
}

#[test]
fn lists_sharing_a_dynamic_resource_recycle_each_others_nodes() {
    let resource = DynamicListMemoryResource::new();
    let mut first = SinglyLinkedList::new_in(&resource);
    let mut second = SinglyLinkedList::new_in(&resource);
    assert!(first.shares_resource_with(&second));

    first.try_extend([1, 2, 3]).unwrap();
    assert_eq!(first.pop_front(), Some(1));
    second.push_back(4).unwrap();
    assert_eq!(resource.system_allocations(), 3);

    drop(first);
    drop(second);
    assert_eq!(resource.allocated_count(), 0);
    assert_eq!(resource.free_count(), 3);
}

#[test]
fn composite_values_keep_their_fields() {
    let pool = FixedBlockMemoryResource::new(1024).unwrap();
    let mut list = SinglyLinkedList::new_in(&pool);
    let samples = [
        Sample {
            id: 1,
            weight: 1.1,
            tag: 'a',
        },
        Sample {
            id: 2,
            weight: 2.2,
            tag: 'b',
        },
    ];
    list.try_extend(samples).unwrap();

    let copy = list.try_clone().unwrap();
    assert_eq!(copy.into_iter().collect::<Vec<_>>(), samples);
    assert_eq!(list.front().map(|s| s.tag), Some('a'));
}

#[test]
fn lists_on_different_resources_do_not_share() {
    let pool = FixedBlockMemoryResource::new(128).unwrap();
    let on_pool = SinglyLinkedList::<u8>::new_in(&pool);
    let on_system = SinglyLinkedList::<u8>::new();
    assert!(!on_pool.shares_resource_with(&on_system));
    assert_eq!(on_pool, on_system);
}
