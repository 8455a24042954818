//! Concurrency tests for `FrameQueue` under real threads.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use live_audio_core::{AudioFrame, FrameQueue, VadActivity};

const OPERATIONS: usize = 100_000;
const FRAME_SAMPLES: usize = 960;

fn tagged_frame(tag: i16) -> AudioFrame {
    AudioFrame::new(vec![tag; FRAME_SAMPLES], 2, 48_000, VadActivity::Active)
}

#[test]
fn test_two_producers_one_consumer_never_tear_or_overflow() {
    let queue = Arc::new(FrameQueue::new(30));
    let producers_done = Arc::new(AtomicUsize::new(0));
    let overflowed = Arc::new(AtomicBool::new(false));

    let producers: Vec<_> = (0..2)
        .map(|id| {
            let queue = Arc::clone(&queue);
            let done = Arc::clone(&producers_done);
            let overflowed = Arc::clone(&overflowed);
            thread::spawn(move || {
                for i in 0..OPERATIONS / 2 {
                    let tag = (id * 10_000 + i % 10_000) as i16;
                    queue.push(tagged_frame(tag));
                    if queue.len() > queue.capacity() {
                        overflowed.store(true, Ordering::SeqCst);
                    }
                }
                done.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    let consumer = {
        let queue = Arc::clone(&queue);
        let done = Arc::clone(&producers_done);
        thread::spawn(move || {
            let mut popped = 0usize;
            loop {
                match queue.pop() {
                    Some(frame) => {
                        assert_eq!(frame.samples.len(), FRAME_SAMPLES);
                        let tag = frame.samples[0];
                        assert!(frame.samples.iter().all(|&s| s == tag), "torn frame");
                        popped += 1;
                    }
                    None if done.load(Ordering::SeqCst) == 2 => break,
                    None => thread::yield_now(),
                }
            }
            popped
        })
    };

    for producer in producers {
        producer.join().unwrap();
    }
    let popped = consumer.join().unwrap();

    assert!(!overflowed.load(Ordering::SeqCst));
    assert!(queue.len() <= 30);
    assert_eq!(
        popped as u64 + queue.len() as u64 + queue.evicted_frames(),
        OPERATIONS as u64
    );
}

#[test]
fn test_clear_races_with_push_without_losing_bounds() {
    let queue = Arc::new(FrameQueue::new(30));
    let pusher = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 0..10_000 {
                queue.push(tagged_frame((i % 100) as i16));
            }
        })
    };

    for _ in 0..1_000 {
        queue.clear();
        assert!(queue.len() <= 30);
    }
    pusher.join().unwrap();

    queue.clear();
    assert!(queue.is_empty());
}
