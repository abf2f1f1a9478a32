use lockfree_vec::LockFreeVec;
use std::collections::HashSet;
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 20_000;

#[test]
fn test_concurrent_append() {
    let vec = LockFreeVec::new();
    let vec_ref = &vec;

    thread::scope(|s| {
        for t in 0..THREADS {
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    vec_ref.append(t * PER_THREAD + i);
                }
            });
        }
    });

    assert_eq!(vec.size(), THREADS * PER_THREAD);

    // Every index is readable and every appended value landed exactly once.
    let mut seen = HashSet::with_capacity(THREADS * PER_THREAD);
    for index in 0..vec.size() {
        let value = vec.get(index).unwrap();
        assert!(seen.insert(value), "value {value} stored twice");
    }
    assert_eq!(seen.len(), THREADS * PER_THREAD);
}

#[test]
fn test_concurrent_append_keeps_per_thread_order() {
    let vec = LockFreeVec::new();
    let vec_ref = &vec;

    thread::scope(|s| {
        for t in 0..4 {
            s.spawn(move || {
                for i in 0..5_000usize {
                    vec_ref.append((t, i));
                }
            });
        }
    });

    // Appends from one thread are linearized in program order.
    let mut last = [None::<usize>; 4];
    for (t, i) in vec.iter() {
        if let Some(prev) = last[t] {
            assert!(i > prev);
        }
        last[t] = Some(i);
    }
    assert!(last.iter().all(|l| *l == Some(4_999)));
}

#[test]
fn test_readers_never_see_unpublished_slots() {
    let vec = LockFreeVec::new();
    let vec_ref = &vec;

    thread::scope(|s| {
        for t in 0..4 {
            s.spawn(move || {
                for i in 0..10_000u64 {
                    vec_ref.append(t * 10_000 + i);
                }
            });
        }
        for _ in 0..2 {
            s.spawn(move || {
                let mut reads = 0;
                while reads < 20_000 {
                    let len = vec_ref.size();
                    if len == 0 {
                        std::hint::spin_loop();
                        continue;
                    }
                    // Anything counted by `size` is already written.
                    assert!(vec_ref.get(len - 1).unwrap() < 40_000);
                    assert!(vec_ref.get(len / 2).unwrap() < 40_000);
                    reads += 1;
                }
            });
        }
    });

    assert_eq!(vec.size(), 40_000);
}
