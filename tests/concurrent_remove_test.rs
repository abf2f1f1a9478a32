use lockfree_vec::LockFreeVec;
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 10_000;

#[test]
fn test_concurrent_remove_drains() {
    let vec: LockFreeVec<usize> = (0..THREADS * PER_THREAD).collect();
    let vec_ref = &vec;

    let mut removed: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(move || {
                    (0..PER_THREAD)
                        .map(|_| vec_ref.remove_tail(0).expect("preloaded elements remain"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(vec.size(), 0);
    assert!(vec.remove_tail(0).is_err());

    removed.sort_unstable();
    assert_eq!(removed, (0..THREADS * PER_THREAD).collect::<Vec<_>>());
}

#[test]
fn test_concurrent_remove_per_thread_is_descending() {
    let vec: LockFreeVec<usize> = (0..40_000).collect();
    let vec_ref = &vec;

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(move || {
                let mut prev = usize::MAX;
                for _ in 0..10_000 {
                    let value = vec_ref.remove_tail(0).unwrap();
                    // The tail only moves down while nobody appends.
                    assert!(value < prev);
                    prev = value;
                }
            });
        }
    });

    assert!(vec.is_empty());
}

#[test]
fn test_concurrent_append_and_remove() {
    const ADDERS: usize = 6;
    const REMOVERS: usize = 2;

    let vec = LockFreeVec::new();
    let vec_ref = &vec;

    thread::scope(|s| {
        for t in 0..ADDERS {
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    vec_ref.append(t * PER_THREAD + i);
                }
            });
        }
        for _ in 0..REMOVERS {
            s.spawn(move || {
                let mut removed = 0;
                while removed < PER_THREAD {
                    // Empty is transient while adders are still running.
                    match vec_ref.remove_tail(0) {
                        Ok(value) => {
                            assert!(value < ADDERS * PER_THREAD);
                            removed += 1;
                        }
                        Err(_) => thread::yield_now(),
                    }
                }
            });
        }
    });

    assert_eq!(vec.size(), (ADDERS - REMOVERS) * PER_THREAD);
    for index in 0..vec.size() {
        assert!(vec.get(index).is_ok());
    }
}
