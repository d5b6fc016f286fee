use std::{process, ptr::NonNull, str::FromStr};

use argh::FromArgs;
use log::{LevelFilter, Log, Metadata, Record};
use poolalloc::{Block, MemoryPool};
use snafu::{OptionExt as _, ResultExt as _, whatever};
use snafu_utils::{GenericError, Report};

/// Run a scripted sequence of allocations against a memory pool.
#[derive(Debug, FromArgs)]
struct Args {
    /// pool size in bytes
    #[argh(option, default = "256")]
    size: usize,
    /// maximum log level (off, error, warn, info, debug, trace)
    #[argh(option, default = "LevelFilter::Warn")]
    log_level: LevelFilter,
    /// operations to run: `alloc:<size>`, `free:<allocation index>` or `dump`
    #[argh(positional)]
    ops: Vec<Op>,
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Alloc(usize),
    Free(usize),
    Dump,
}

impl FromStr for Op {
    type Err = GenericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "dump" {
            return Ok(Self::Dump);
        }
        let Some((name, arg)) = s.split_once(':') else {
            whatever!("invalid operation `{s}`");
        };
        let value = arg
            .parse()
            .with_whatever_context(|_| format!("invalid argument in `{s}`"))?;
        match name {
            "alloc" => Ok(Self::Alloc(value)),
            "free" => Ok(Self::Free(value)),
            _ => whatever!("unknown operation `{name}`"),
        }
    }
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "[{:>5}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    let args: Args = argh::from_env();

    if let Err(err) = run(&args) {
        let report = Report::new(err);
        eprintln!("{report}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), GenericError> {
    log::set_logger(&LOGGER)
        .ok()
        .whatever_context("failed to install logger")?;
    log::set_max_level(args.log_level);

    let mut pool = MemoryPool::create(args.size)
        .with_whatever_context(|_| format!("failed to create pool, size={}", args.size))?;
    println!("pool of {} bytes at {:p}", pool.size(), pool.base());
    dump(&pool);

    let mut handles: Vec<NonNull<u8>> = Vec::new();
    for (step, op) in args.ops.iter().enumerate() {
        match *op {
            Op::Alloc(size) => {
                let ptr = pool
                    .alloc(size)
                    .with_whatever_context(|_| format!("step {step}: alloc:{size} failed"))?;
                println!(
                    "#{} = alloc({size}) at offset {}",
                    handles.len(),
                    offset(&pool, ptr)
                );
                handles.push(ptr);
            }
            Op::Free(index) => {
                let ptr = *handles
                    .get(index)
                    .with_whatever_context(|| format!("step {step}: no allocation #{index}"))?;
                pool.free(ptr.as_ptr())
                    .with_whatever_context(|_| format!("step {step}: free:{index} failed"))?;
                println!("free(#{index})");
            }
            Op::Dump => println!("dump"),
        }
        dump(&pool);
    }

    for ptr in handles {
        if pool.allocation_size(ptr.as_ptr()).is_some() {
            pool.free(ptr.as_ptr())
                .whatever_context("failed to release leftover allocation")?;
        }
    }
    pool.check_consistency()
        .whatever_context("pool is inconsistent")?;
    pool.destroy().whatever_context("failed to destroy pool")?;

    Ok(())
}

fn offset(pool: &MemoryPool, ptr: NonNull<u8>) -> usize {
    ptr.addr().get() - pool.base().addr().get()
}

fn dump(pool: &MemoryPool) {
    let free = pool.free_blocks().map(Block::range).collect::<Vec<_>>();
    let allocated = pool.allocations().map(Block::range).collect::<Vec<_>>();
    let stats = pool.stats();
    println!("  free:  {free:?}");
    println!("  alloc: {allocated:?}");
    println!(
        "  {} of {} bytes free, largest free block {}",
        stats.free_bytes, stats.total_size, stats.largest_free_block
    );
}
