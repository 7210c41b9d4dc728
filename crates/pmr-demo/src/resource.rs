use std::{fmt, str::FromStr};

use memory_resource::{
    DynamicListMemoryResource, FixedBlockMemoryResource, MemoryResource, MemoryResourceError,
};

/// Which memory resource backs the demonstration lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum ResourceKind {
    #[display("dynamic")]
    Dynamic,
    #[display("fixed")]
    Fixed,
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dynamic" => Ok(Self::Dynamic),
            "fixed" => Ok(Self::Fixed),
            _ => Err(format!("unknown resource `{s}`, expected `dynamic` or `fixed`")),
        }
    }
}

#[derive(Debug)]
pub enum Resource {
    Dynamic(DynamicListMemoryResource),
    Fixed(FixedBlockMemoryResource),
}

impl Resource {
    pub fn new(kind: ResourceKind, pool_size: usize) -> Result<Self, MemoryResourceError> {
        let resource = match kind {
            ResourceKind::Dynamic => Self::Dynamic(DynamicListMemoryResource::new()),
            ResourceKind::Fixed => Self::Fixed(FixedBlockMemoryResource::new(pool_size)?),
        };
        debug!("created {resource}");
        Ok(resource)
    }

    pub fn as_dyn(&self) -> &dyn MemoryResource {
        match self {
            Self::Dynamic(resource) => resource,
            Self::Fixed(resource) => resource,
        }
    }

    /// Logs the current bookkeeping and optionally prints the block map.
    pub fn report(&self, label: &str, dump_blocks: bool) {
        match self {
            Self::Dynamic(resource) => {
                debug!(
                    "{label}: {} allocated, {} free, {} system allocations ({} bytes tracked)",
                    resource.allocated_count(),
                    resource.free_count(),
                    resource.system_allocations(),
                    resource.tracked_bytes(),
                );
            }
            Self::Fixed(pool) => report_pool(pool, label, dump_blocks),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dynamic(_) => write!(f, "dynamic free-list resource"),
            Self::Fixed(pool) => write!(f, "fixed pool of {} bytes", pool.pool_size()),
        }
    }
}

pub fn report_pool(pool: &FixedBlockMemoryResource, label: &str, dump_blocks: bool) {
    debug!(
        "{label}: {}/{} bytes used in {} blocks, largest free block {} bytes",
        pool.used_bytes(),
        pool.pool_size(),
        pool.block_count(),
        pool.largest_free_block(),
    );
    if dump_blocks {
        for block in pool.blocks() {
            println!(
                "    [{:>6}, {:>6}) {:>6} bytes  {}",
                block.offset,
                block.end(),
                block.size,
                block.state
            );
        }
    }
}
