#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]
#![cfg(test)]

use std::{ops::Range, ptr::NonNull};

use poolalloc::{Block, ErrorKind, MemoryPool, align_for};

fn offset(pool: &MemoryPool, ptr: NonNull<u8>) -> usize {
    ptr.addr().get() - pool.base().addr().get()
}

fn free_ranges(pool: &MemoryPool) -> Vec<Range<usize>> {
    pool.free_blocks().map(Block::range).collect()
}

fn alloc_ranges(pool: &MemoryPool) -> Vec<Range<usize>> {
    pool.allocations().map(Block::range).collect()
}

/// Small deterministic generator so stress runs are reproducible.
struct XorShift(u64);

impl XorShift {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, bound: usize) -> usize {
        usize::try_from(self.next_u64() % bound as u64).unwrap()
    }
}

#[test]
fn exhaustion_fails_without_state_change() {
    let mut pool = MemoryPool::create(96).unwrap();
    let a = pool.alloc(48).unwrap();
    let b = pool.alloc(48).unwrap();
    assert_eq!(offset(&pool, b), 48);

    let err = pool.alloc(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoFitFound);
    assert_eq!(free_ranges(&pool), Vec::<Range<usize>>::new());
    assert_eq!(alloc_ranges(&pool), [0..48, 48..96]);

    pool.free(a.as_ptr()).unwrap();
    pool.free(b.as_ptr()).unwrap();
    pool.destroy().unwrap();
}

#[test]
fn alignment_can_exhaust_pool_early() {
    let mut pool = MemoryPool::create(100).unwrap();
    let a = pool.alloc(50).unwrap();

    // 50 bytes at a 16 byte boundary would have to start at 64
    let err = pool.alloc(50).unwrap_err();
    assert!(err.kind().is_no_fit_found());
    assert_eq!(free_ranges(&pool), [50..100]);
    assert_eq!(alloc_ranges(&pool), [0..50]);

    let c = pool.alloc(1).unwrap();
    assert_eq!(offset(&pool, c), 50);

    pool.free(c.as_ptr()).unwrap();
    pool.free(a.as_ptr()).unwrap();
    pool.destroy().unwrap();
}

#[test]
fn freeing_everything_coalesces_to_one_block() {
    let mut pool = MemoryPool::create(100).unwrap();
    let a = pool.alloc(40).unwrap();
    let b = pool.alloc(40).unwrap();
    pool.check_consistency().unwrap();

    pool.free(a.as_ptr()).unwrap();
    pool.check_consistency().unwrap();
    pool.free(b.as_ptr()).unwrap();

    assert_eq!(free_ranges(&pool), [0..100]);
    pool.check_consistency().unwrap();
    pool.destroy().unwrap();
}

#[test]
fn double_free_is_rejected() {
    let mut pool = MemoryPool::create(64).unwrap();
    let a = pool.alloc(8).unwrap();
    let b = pool.alloc(8).unwrap();
    pool.free(a.as_ptr()).unwrap();

    let free_before = free_ranges(&pool);
    let alloc_before = alloc_ranges(&pool);
    let err = pool.free(a.as_ptr()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAddress);
    assert_eq!(free_ranges(&pool), free_before);
    assert_eq!(alloc_ranges(&pool), alloc_before);

    pool.free(b.as_ptr()).unwrap();
    pool.destroy().unwrap();
}

#[test]
fn pointer_from_another_pool_is_rejected() {
    let mut first = MemoryPool::create(32).unwrap();
    let mut second = MemoryPool::create(32).unwrap();
    let a = first.alloc(4).unwrap();

    let err = second.free(a.as_ptr()).unwrap_err();
    assert!(err.kind().is_invalid_address());
    assert_eq!(free_ranges(&second), [0..32]);

    first.free(a.as_ptr()).unwrap();
    first.destroy().unwrap();
    second.destroy().unwrap();
}

#[test]
fn alloc_then_free_restores_state() {
    let mut pool = MemoryPool::create(256).unwrap();
    let keep = [pool.alloc(3).unwrap(), pool.alloc(17).unwrap(), pool.alloc(6).unwrap()];
    pool.free(keep[1].as_ptr()).unwrap();

    let free_before = free_ranges(&pool);
    let alloc_before = alloc_ranges(&pool);
    for size in 1..=64 {
        let ptr = pool.alloc(size).unwrap();
        pool.free(ptr.as_ptr()).unwrap();
        assert_eq!(free_ranges(&pool), free_before, "size={size}");
        assert_eq!(alloc_ranges(&pool), alloc_before, "size={size}");
    }

    pool.free(keep[0].as_ptr()).unwrap();
    pool.free(keep[2].as_ptr()).unwrap();
    pool.destroy().unwrap();
}

#[test]
fn every_address_honors_size_alignment() {
    let mut pool = MemoryPool::create(4096).unwrap();
    let mut live = Vec::new();
    for size in (1..=33).cycle().take(120) {
        let ptr = pool.alloc(size).unwrap();
        assert_eq!(ptr.addr().get() % align_for(size), 0, "size={size}");
        assert_eq!(pool.allocation_size(ptr.as_ptr()), Some(size));
        live.push(ptr);
    }
    pool.check_consistency().unwrap();
    for ptr in live {
        pool.free(ptr.as_ptr()).unwrap();
    }
    assert_eq!(free_ranges(&pool), [0..4096]);
    pool.destroy().unwrap();
}

#[test]
fn lowest_fitting_offset_wins() {
    let mut pool = MemoryPool::create(160).unwrap();
    let blocks: Vec<_> = (0..5).map(|_| pool.alloc(32).unwrap()).collect();
    assert!(pool.alloc(1).is_err());

    // free 0..32, 64..96 and 128..160; all three can hold the request
    for index in [4, 2, 0] {
        pool.free(blocks[index].as_ptr()).unwrap();
    }
    assert_eq!(free_ranges(&pool), [0..32, 64..96, 128..160]);

    let first = pool.alloc(20).unwrap();
    assert_eq!(offset(&pool, first), 0);
    let second = pool.alloc(20).unwrap();
    assert_eq!(offset(&pool, second), 64);

    // the leftover 20..32 still takes 8 bytes at 24
    let third = pool.alloc(8).unwrap();
    assert_eq!(offset(&pool, third), 24);
    assert_eq!(free_ranges(&pool), [20..24, 84..96, 128..160]);
    pool.check_consistency().unwrap();
}

#[test]
fn destroy_refuses_live_allocations() {
    let mut pool = MemoryPool::create(64).unwrap();
    let a = pool.alloc(1).unwrap();
    let b = pool.alloc(2).unwrap();

    let err = pool.destroy().unwrap_err();
    assert!(err.kind().is_precondition_violation());
    assert_eq!(err.live(), 2);

    let mut pool = err.into_pool();
    assert_eq!(alloc_ranges(&pool), [0..1, 2..4]);
    pool.free(a.as_ptr()).unwrap();
    pool.free(b.as_ptr()).unwrap();
    pool.destroy().unwrap();
}

#[test]
fn random_workload_keeps_invariants() {
    const POOL_SIZE: usize = 2048;

    let mut rng = XorShift(0x2545_f491_4f6c_dd1d);
    let mut pool = MemoryPool::create(POOL_SIZE).unwrap();
    let mut live: Vec<(NonNull<u8>, usize)> = Vec::new();

    for _ in 0..2000 {
        if live.is_empty() || rng.below(3) != 0 {
            let size = 1 + rng.below(96);
            match pool.alloc(size) {
                Ok(ptr) => {
                    assert_eq!(ptr.addr().get() % align_for(size), 0);
                    live.push((ptr, size));
                }
                Err(err) => assert!(err.kind().is_no_fit_found()),
            }
        } else {
            let (ptr, size) = live.swap_remove(rng.below(live.len()));
            assert_eq!(pool.allocation_size(ptr.as_ptr()), Some(size));
            pool.free(ptr.as_ptr()).unwrap();
        }

        pool.check_consistency().unwrap();
        let stats = pool.stats();
        assert_eq!(stats.free_bytes + stats.allocated_bytes, POOL_SIZE);
        assert_eq!(stats.allocations, live.len());
    }

    for (ptr, _) in live {
        pool.free(ptr.as_ptr()).unwrap();
    }
    assert_eq!(free_ranges(&pool), [0..POOL_SIZE]);
    pool.destroy().unwrap();
}
