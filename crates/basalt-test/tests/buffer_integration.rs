//! End-to-end buffer pool tests.
//!
//! These tests drive a `BufferManager` the way the record and recovery
//! layers do: several threads pinning, modifying and unpinning blocks of a
//! shared pool backed by either memory or real files.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use basalt_common::types::{BlockId, Lsn, TxnId};
use basalt_storage::buffer::{BufferError, BufferManager, BufferResult};
use basalt_storage::file::BlockStore;
use basalt_test::utils::{file_manager, memory_manager, seed_blocks, seeded_number};
use basalt_test::workload::PinWorkload;

const SHORT_WAIT: Duration = Duration::from_millis(100);

fn block(n: u64) -> BlockId {
    BlockId::new("test.tbl", n)
}

#[test]
fn test_pin_wait_and_reuse_sequence() {
    let (buffers, store) = memory_manager(8, SHORT_WAIT).expect("Failed to create pool");
    seed_blocks(store.as_ref(), "test.tbl", 12).expect("Failed to seed blocks");

    let frames: Vec<_> = (0..8)
        .map(|n| buffers.pin(&block(n)).expect("pin should succeed"))
        .collect();
    assert_eq!(buffers.available(), 0);
    for (n, frame) in frames.iter().enumerate() {
        assert_eq!(seeded_number(&frame.read_data()), n as u64);
    }

    // Every frame is pinned: the ninth block cannot get in.
    let err = buffers.pin(&block(8)).unwrap_err();
    assert!(matches!(err, BufferError::PinTimeout { .. }));
    assert!(!buffers.contains(&block(8)));

    buffers.unpin(&frames[7]).unwrap();
    buffers.unpin(&frames[6]).unwrap();
    assert_eq!(buffers.available(), 2);

    let eighth = buffers.pin(&block(8)).expect("a frame was released");
    assert_eq!(seeded_number(&eighth.read_data()), 8);
    assert_eq!(buffers.available(), 1);

    buffers.unpin(&frames[3]).unwrap();
    buffers.unpin(&frames[2]).unwrap();
    assert_eq!(buffers.available(), 3);

    for n in 9..12 {
        let frame = buffers.pin(&block(n)).expect("pin should succeed");
        assert_eq!(seeded_number(&frame.read_data()), n);
    }
    assert_eq!(buffers.available(), 0);

    for n in [0, 1, 4, 5, 8, 9, 10, 11] {
        assert!(buffers.contains(&block(n)), "block {n} should be resident");
    }
    for n in [2, 3, 6, 7] {
        assert!(!buffers.contains(&block(n)), "block {n} should be evicted");
    }

    let report = buffers.report();
    assert_eq!(report.pinned_frames(), 8);
    assert_eq!(report.pin_timeouts, 1);
}

#[test]
fn test_single_unpin_admits_exactly_one_block() {
    let (buffers, store) = memory_manager(8, SHORT_WAIT).expect("Failed to create pool");
    seed_blocks(store.as_ref(), "test.tbl", 10).expect("Failed to seed blocks");

    let frames: Vec<_> = (0..8)
        .map(|n| buffers.pin(&block(n)).expect("pin should succeed"))
        .collect();
    assert!(matches!(
        buffers.pin(&block(8)).unwrap_err(),
        BufferError::PinTimeout { .. }
    ));

    buffers.unpin(&frames[5]).unwrap();
    assert_eq!(buffers.available(), 1);

    // The only unpinned frame is the one reused, and its block leaves.
    let ninth = buffers.pin(&block(8)).expect("a frame was released");
    assert!(Arc::ptr_eq(&ninth, &frames[5]));
    assert!(!buffers.contains(&block(5)));
    assert_eq!(seeded_number(&ninth.read_data()), 8);
    assert_eq!(buffers.available(), 0);

    // One release admits one block: the next distinct pin times out again.
    let err = buffers.pin(&block(9)).unwrap_err();
    assert!(matches!(err, BufferError::PinTimeout { .. }));
    assert!(!buffers.contains(&block(9)));
    assert!(buffers.contains(&block(8)));
    assert_eq!(buffers.report().pin_timeouts, 2);
}

#[test]
fn test_unpin_from_other_thread_unblocks_pin() {
    let (buffers, _store) = memory_manager(8, Duration::from_secs(10)).expect("Failed to create pool");
    let buffers = Arc::new(buffers);
    let frames: Vec<_> = (0..8).map(|n| buffers.pin(&block(n)).unwrap()).collect();

    let waiter = {
        let buffers = Arc::clone(&buffers);
        thread::spawn(move || {
            let start = Instant::now();
            let frame = buffers.pin(&block(8));
            (frame, start.elapsed())
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert!(!buffers.contains(&block(8)));
    buffers.unpin(&frames[4]).unwrap();

    let (frame, waited) = waiter.join().expect("waiter panicked");
    let frame = frame.expect("pin should succeed once a frame is released");
    assert!(Arc::ptr_eq(&frame, &frames[4]));
    assert!(waited < Duration::from_secs(10));
    assert!(!buffers.contains(&block(4)));
}

#[test]
fn test_timeout_leaves_pool_unchanged() {
    let (buffers, store) = memory_manager(2, SHORT_WAIT).expect("Failed to create pool");
    let a = buffers.pin(&block(0)).unwrap();
    let b = buffers.pin(&block(1)).unwrap();
    a.set_modified(TxnId::new(1), Lsn::new(3));

    let before = buffers.report().frames;
    let reads = store.reads();
    let writes = store.writes();

    let start = Instant::now();
    assert!(buffers.pin(&block(2)).is_err());
    assert!(start.elapsed() >= SHORT_WAIT);

    assert_eq!(buffers.report().frames, before);
    assert_eq!(store.reads(), reads);
    assert_eq!(store.writes(), writes);

    buffers.unpin(&a).unwrap();
    buffers.unpin(&b).unwrap();
    assert_eq!(buffers.available(), 2);
}

#[test]
fn test_many_waiters_all_served() {
    let (buffers, _store) = memory_manager(1, Duration::from_secs(10)).expect("Failed to create pool");
    let buffers = Arc::new(buffers);
    let held = buffers.pin(&block(0)).unwrap();

    let waiters: Vec<_> = (1..=4)
        .map(|n| {
            let buffers = Arc::clone(&buffers);
            thread::spawn(move || -> BufferResult<()> {
                let frame = buffers.pin(&block(n))?;
                thread::sleep(Duration::from_millis(5));
                buffers.unpin(&frame)
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    buffers.unpin(&held).unwrap();

    for waiter in waiters {
        waiter.join().expect("waiter panicked").expect("waiter should be served");
    }
    assert_eq!(buffers.available(), 1);
}

#[test]
fn test_available_count_under_concurrent_load() {
    let (buffers, store) = memory_manager(6, Duration::from_secs(10)).expect("Failed to create pool");
    let workload = PinWorkload {
        workers: 6,
        ops_per_worker: 300,
        ..PinWorkload::default()
    };

    let outcome = workload.run(&buffers).expect("workload should not fail");
    assert_eq!(outcome.pins, 6 * 300);

    assert_eq!(buffers.available(), buffers.capacity());
    let report = buffers.report();
    assert_eq!(report.pinned_frames(), 0);
    let pins: u64 = report.frames.iter().map(|f| f.pins).sum();
    let unpins: u64 = report.frames.iter().map(|f| f.unpins).sum();
    assert_eq!(pins, unpins);
    assert_eq!(pins, outcome.pins);

    for worker in 1..=6 {
        buffers.flush_all(TxnId::new(worker)).unwrap();
    }
    assert_eq!(buffers.report().dirty_frames(), 0);
    assert!(store.writes() > 0 || outcome.writes == 0);
}

#[test]
fn test_evicts_most_recently_modified() {
    let (buffers, store) = memory_manager(3, SHORT_WAIT).expect("Failed to create pool");
    let txn = TxnId::new(7);

    for (n, lsn) in [(0, 5), (1, 12), (2, 7)] {
        let frame = buffers.pin(&block(n)).unwrap();
        frame.write_data()[0] = 0xA0 + n as u8;
        frame.set_modified(txn, Lsn::new(lsn));
        buffers.unpin(&frame).unwrap();
    }

    let frame = buffers.pin(&block(3)).unwrap();
    assert!(!buffers.contains(&block(1)));
    assert!(buffers.contains(&block(0)));
    assert!(buffers.contains(&block(2)));
    assert_eq!(frame.lsn(), Lsn::INVALID);
    assert!(!frame.is_dirty());

    // The victim was dirty and must have been written back first.
    let written = store.snapshot(&block(1)).expect("block 1 written back");
    assert_eq!(written[0], 0xA1);
    // Writing block 1 extended the file; block 0 was never written back.
    assert_eq!(store.snapshot(&block(0)).map(|data| data[0]), Some(0));
}

#[test]
fn test_flush_all_writes_only_that_transaction() {
    let (buffers, store) = memory_manager(4, SHORT_WAIT).expect("Failed to create pool");

    let mine = buffers.pin(&block(0)).unwrap();
    mine.write_data()[..4].copy_from_slice(b"mine");
    mine.set_modified(TxnId::new(1), Lsn::new(10));

    let theirs = buffers.pin(&block(1)).unwrap();
    theirs.write_data()[..6].copy_from_slice(b"theirs");
    theirs.set_modified(TxnId::new(2), Lsn::new(11));

    assert_eq!(buffers.flush_all(TxnId::new(1)).unwrap(), 1);
    assert_eq!(&store.snapshot(&block(0)).unwrap()[..4], b"mine");
    assert!(store.snapshot(&block(1)).is_none());
    assert!(!mine.is_dirty());
    assert!(theirs.is_dirty());

    // Flushing does not release pins.
    assert_eq!(buffers.available(), 2);
}

#[test]
fn test_repin_reuses_resident_frame() {
    let (buffers, store) = memory_manager(4, SHORT_WAIT).expect("Failed to create pool");

    let first = buffers.pin(&block(5)).unwrap();
    let second = buffers.pin(&block(5)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.pin_count(), 2);
    assert_eq!(buffers.available(), 3);

    first.write_data()[0] = 42;
    buffers.unpin(&first).unwrap();
    buffers.unpin(&second).unwrap();

    let reads = store.reads();
    let again = buffers.pin(&block(5)).unwrap();
    assert!(Arc::ptr_eq(&again, &first));
    assert_eq!(again.read_data()[0], 42);
    assert_eq!(store.reads(), reads);
}

#[test]
fn test_pin_new_appends_formatted_block() {
    let (buffers, store) = memory_manager(2, SHORT_WAIT).expect("Failed to create pool");
    seed_blocks(store.as_ref(), "log.tbl", 3).unwrap();

    let header = |data: &mut [u8]| data[..4].copy_from_slice(b"HDR!");
    let frame = buffers.pin_new("log.tbl", &header).unwrap();

    assert_eq!(frame.block(), Some(BlockId::new("log.tbl", 3)));
    assert_eq!(&frame.read_data()[..4], b"HDR!");
    assert_eq!(store.block_count("log.tbl").unwrap(), 4);
    assert!(buffers.contains(&BlockId::new("log.tbl", 3)));
}

#[test]
fn test_file_backed_pool_persists_flushed_blocks() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let txn = TxnId::new(3);

    {
        let (buffers, _files) = file_manager(dir.path(), 3, SHORT_WAIT).expect("Failed to open pool");
        let frame = buffers.pin_new("accounts.tbl", &|_: &mut [u8]| {}).unwrap();
        let id = frame.block().unwrap();
        assert_eq!(id.number(), 0);

        frame.write_data()[..5].copy_from_slice(b"hello");
        frame.set_modified(txn, Lsn::new(1));
        buffers.unpin(&frame).unwrap();
        assert_eq!(buffers.flush_all(txn).unwrap(), 1);
    }

    let (buffers, files) = file_manager(dir.path(), 3, SHORT_WAIT).expect("Failed to reopen pool");
    assert_eq!(files.block_count("accounts.tbl").unwrap(), 1);
    let frame = buffers.pin(&BlockId::new("accounts.tbl", 0)).unwrap();
    assert_eq!(&frame.read_data()[..5], b"hello");
    buffers.unpin(&frame).unwrap();
}

#[test]
fn test_eviction_writes_back_to_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let (buffers, files) = file_manager(dir.path(), 1, SHORT_WAIT).expect("Failed to open pool");
    seed_blocks(files.as_ref(), "data.tbl", 2).unwrap();

    let frame = buffers.pin(&BlockId::new("data.tbl", 0)).unwrap();
    frame.write_data()[8] = 0xEE;
    frame.set_modified(TxnId::new(1), Lsn::new(9));
    buffers.unpin(&frame).unwrap();

    let other = buffers.pin(&BlockId::new("data.tbl", 1)).unwrap();
    assert_eq!(seeded_number(&other.read_data()), 1);
    buffers.unpin(&other).unwrap();

    let mut raw = vec![0u8; files.block_size()];
    files.read_block(&BlockId::new("data.tbl", 0), &mut raw).unwrap();
    assert_eq!(raw[8], 0xEE);
    assert_eq!(seeded_number(&raw), 0);
}

#[test]
fn test_misuse_is_reported() {
    let (buffers, _store) = memory_manager(2, SHORT_WAIT).expect("Failed to create pool");
    let (other, _other_store) = memory_manager(2, SHORT_WAIT).expect("Failed to create pool");

    let frame = buffers.pin(&block(0)).unwrap();
    let err = other.unpin(&frame).unwrap_err();
    assert!(matches!(err, BufferError::ForeignFrame { .. }));
    assert!(err.is_fatal());

    buffers.unpin(&frame).unwrap();
    let err = buffers.unpin(&frame).unwrap_err();
    assert!(matches!(err, BufferError::NotPinned { .. }));
    assert_eq!(buffers.available(), 2);
}

#[test]
fn test_manager_is_send_sync() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<BufferManager>();
}
