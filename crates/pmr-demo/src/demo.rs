use core::alloc::Layout;
use std::fmt;

use memory_resource::{FixedBlockMemoryResource, MemoryResource as _};
use node_list::{ForwardList, SinglyLinkedList};
use snafu::{ResultExt as _, ensure_whatever, whatever};
use snafu_utils::GenericError;

use crate::{
    Args,
    resource::{self, Resource},
};

#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display)]
#[display("({id}, {weight}, {tag})")]
struct Sample {
    id: i32,
    weight: f64,
    tag: char,
}

/// Displays the items of an iterator separated by single spaces.
struct Spaced<I>(I);

impl<I> fmt::Display for Spaced<I>
where
    I: Iterator + Clone,
    I::Item: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.clone().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

fn create_resource(args: &Args) -> Result<Resource, GenericError> {
    Resource::new(args.resource, args.pool_size).with_whatever_context(|_| {
        format!(
            "failed to create memory resource, kind={}, pool_size={}",
            args.resource, args.pool_size
        )
    })
}

fn bytes(size: usize) -> Result<Layout, GenericError> {
    Layout::from_size_align(size, 1)
        .with_whatever_context(|_| format!("invalid layout, size={size}"))
}

pub fn simple_types(args: &Args) -> Result<(), GenericError> {
    info!("demo: lists of integers");
    let resource = create_resource(args)?;

    let mut forward = ForwardList::new_in(resource.as_dyn());
    for value in [10, 20, 30, 40] {
        forward
            .push_front(value)
            .with_whatever_context(|_| format!("failed to push {value} onto forward list"))?;
        trace!("pushed {value} to the front of the forward list");
    }
    println!("forward list:       {}", Spaced(forward.iter()));

    let mut list = SinglyLinkedList::new_in(resource.as_dyn());
    list.try_extend([10, 20, 30, 40]).whatever_context("failed to fill singly linked list")?;
    list.push_front(0).whatever_context("failed to push onto singly linked list")?;
    println!("singly linked list: {}", Spaced(list.iter()));

    let (front, back) = (list.pop_front(), list.pop_back());
    println!("popped front {front:?} and back {back:?}, {} elements left", list.len());
    resource.report("integer lists filled", args.dump_blocks);

    Ok(())
}

pub fn complex_types(args: &Args) -> Result<(), GenericError> {
    info!("demo: lists of a composite type");
    let resource = create_resource(args)?;

    let mut list = ForwardList::new_in(resource.as_dyn());
    for (id, weight, tag) in [(1, 1.1, 'A'), (2, 2.2, 'B'), (3, 3.3, 'C'), (4, 4.4, 'D')] {
        let sample = Sample { id, weight, tag };
        list.push_front(sample).with_whatever_context(|_| format!("failed to push {sample}"))?;
    }
    println!("samples: {}", Spaced(list.iter()));
    let fields = list.iter().map(|s| format!("{{{}|{}|{}}}", s.id, s.weight, s.tag));
    println!("fields:  {}", Spaced(fields));

    if let Some(first) = list.front_mut() {
        first.weight *= 10.0;
        debug!("scaled the front sample to {first}");
    }
    resource.report("composite list filled", args.dump_blocks);

    Ok(())
}

pub fn shared_resource(args: &Args) -> Result<(), GenericError> {
    info!("demo: two lists sharing one resource");
    let resource = create_resource(args)?;

    let mut first = SinglyLinkedList::new_in(resource.as_dyn());
    let mut second = SinglyLinkedList::new_in(resource.as_dyn());
    first.try_extend([100, 200]).whatever_context("failed to fill list 1")?;
    second.try_extend([300, 400]).whatever_context("failed to fill list 2")?;
    println!("list 1: {}", Spaced(first.iter()));
    println!("list 2: {}", Spaced(second.iter()));
    info!("lists share one resource: {}", first.shares_resource_with(&second));
    resource.report("both lists filled", args.dump_blocks);

    if let Some(value) = first.pop_front() {
        second.push_back(value).whatever_context("failed to move element into list 2")?;
        trace!("moved {value} from list 1 to list 2");
    }
    println!("list 2 after move: {}", Spaced(second.iter()));
    resource.report("after moving one element", args.dump_blocks);

    drop(first);
    drop(second);
    resource.report("both lists dropped", args.dump_blocks);

    Ok(())
}

/// Shows first-fit failing on a fragmented pool and a freed block being
/// handed out again.
pub fn fragmentation(args: &Args) -> Result<(), GenericError> {
    if !args.resource.is_fixed() {
        info!("skipping fragmentation walkthrough, it needs `--resource fixed`");
        return Ok(());
    }
    info!("demo: fragmentation and recovery in fixed pools");

    let pool = FixedBlockMemoryResource::new(256).whatever_context("failed to create pool")?;
    let (small, large) = (bytes(64)?, bytes(128)?);
    let p1 = pool.allocate(small).whatever_context("failed to allocate 64 bytes")?;
    let _p2 = pool.allocate(large).whatever_context("failed to allocate 128 bytes")?;
    unsafe { pool.deallocate(p1, small) }.whatever_context("failed to free 64 bytes")?;
    resource::report_pool(&pool, "fragmented pool", args.dump_blocks);

    match pool.allocate(bytes(100)?) {
        Ok(_) => whatever!("100 bytes fitted into a pool without a large enough free block"),
        Err(err) => warn!(
            "{} bytes free but refused: {err} (at {})",
            pool.free_bytes(),
            err.location()
        ),
    }

    let pool = FixedBlockMemoryResource::new(100).whatever_context("failed to create pool")?;
    let half = bytes(50)?;
    let p1 = pool.allocate(half).whatever_context("failed to allocate 50 bytes")?;
    let _p2 = pool.allocate(bytes(40)?).whatever_context("failed to allocate 40 bytes")?;
    match pool.allocate(bytes(60)?) {
        Ok(_) => whatever!("60 bytes fitted into an exhausted pool"),
        Err(err) => warn!("pool exhausted: {err} (at {})", err.location()),
    }

    unsafe { pool.deallocate(p1, half) }.whatever_context("failed to free 50 bytes")?;
    let again = pool.allocate(half).whatever_context("failed to reallocate 50 bytes")?;
    ensure_whatever!(again == p1, "freed block was not handed out again");
    info!("freed block at {p1:p} handed out again");
    resource::report_pool(&pool, "recovered pool", args.dump_blocks);

    Ok(())
}
