use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::*;

/// Many threads sharing one accumulator behind a single lock admit exactly
/// what one thread would have.
#[test]
fn test_locked_accumulator_admits_exact_capacity() {
    let node = Arc::new(Mutex::new(Node::new(2, &test_config()).unwrap()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let node = Arc::clone(&node);
            thread::spawn(move || {
                (0..50)
                    .filter(|_| {
                        let mut node = node.lock();
                        !node
                            .accumulator
                            .should_throttle_n_of_unscaled(1, OperationTag::TokenCreate, t0())
                    })
                    .count()
            })
        })
        .collect();
    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // Bucket C: 50 TokenCreate per second per node, 3s burst.
    assert_eq!(admitted, 150);
}

/// Query threads read multipliers while the writer keeps updating.
#[test]
fn test_readers_run_alongside_writer() {
    let mut node = Node::new(3, &test_config()).unwrap();
    let readers = node.sources.readers();

    let reader = thread::spawn(move || {
        let mut seen = Vec::new();
        for i in 0..200u64 {
            seen.push(readers.current_multiplier(OperationTag::ContractCall, t0().plus_secs(i)));
            let starts = readers.gas.congestion_level_starts();
            assert_eq!(starts.len(), 3);
        }
        seen
    });

    for (usage, now) in workload(2_000, 1_000_000) {
        node.handle(&usage, now);
    }
    let seen = reader.join().unwrap();
    assert!(seen.iter().all(|&m| [1, 10, 25, 100].contains(&m)));
}
