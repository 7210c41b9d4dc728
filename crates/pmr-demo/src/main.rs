use std::process;

use argh::FromArgs;
use snafu_utils::{GenericError, Report};

use self::{log::LogLevel, resource::ResourceKind};

#[macro_use]
mod log;
mod demo;
mod resource;

/// Demonstrate node-based lists backed by pluggable memory resources.
#[derive(Debug, FromArgs)]
struct Args {
    /// memory resource backing the lists, `dynamic` or `fixed` (default: dynamic)
    #[argh(option, default = "ResourceKind::Dynamic")]
    resource: ResourceKind,
    /// size in bytes of the fixed pool backing the lists (default: 4096)
    #[argh(option, default = "4096")]
    pool_size: usize,
    /// least severe log level printed: trace, debug, info, warn or error (default: info)
    #[argh(option, default = "LogLevel::Info")]
    log_level: LogLevel,
    /// print the block map of fixed pools after each step
    #[argh(switch)]
    dump_blocks: bool,
}

fn main() {
    let args: Args = argh::from_env();
    log::init(args.log_level);

    if let Err(err) = run(&args) {
        error!("demonstration aborted");
        let report = Report::new(err);
        eprintln!("{report}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), GenericError> {
    info!("lists are backed by the {} resource", args.resource);

    demo::simple_types(args)?;
    demo::complex_types(args)?;
    demo::shared_resource(args)?;
    demo::fragmentation(args)?;

    println!("all demonstrations completed");
    Ok(())
}
