use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioFrame, CapturedAudio, SourceKind};
use crate::traits::audio_device::AudioTransport;
use crate::traits::clock::Clock;
use crate::traits::mixer::MixerParticipant;

/// Bounded FIFO of whole frames for one capture source.
///
/// Pushes happen on the capture device's real-time thread and pops on the
/// mixer tick, so the single mutex is only ever held for a deque operation.
///
/// Overflow behavior: drops the oldest frame, never the newest.
#[derive(Debug)]
pub struct FrameQueue {
    frames: Mutex<VecDeque<AudioFrame>>,
    capacity: usize,
    pushed: AtomicU64,
    evicted: AtomicU64,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            pushed: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        }
    }

    /// Take ownership of `frame`, evicting the oldest frame if full.
    ///
    /// Returns true if a frame was evicted.
    pub fn push(&self, frame: AudioFrame) -> bool {
        let evicted = {
            let mut frames = self.frames.lock();
            let evicted = if frames.len() >= self.capacity {
                frames.pop_front()
            } else {
                None
            };
            frames.push_back(frame);
            evicted
        };
        self.pushed.fetch_add(1, Ordering::Relaxed);

        match evicted {
            Some(_) => {
                self.evicted.fetch_add(1, Ordering::Relaxed);
                log::trace!("frame queue full, dropped oldest frame");
                true
            }
            None => false,
        }
    }

    /// Remove and return the oldest frame.
    pub fn pop(&self) -> Option<AudioFrame> {
        self.frames.lock().pop_front()
    }

    /// Drop every buffered frame before returning. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let stale = std::mem::take(&mut *self.frames.lock());
        stale.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn pushed_frames(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }

    /// Frames discarded by drop-oldest since creation.
    pub fn evicted_frames(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}

/// Mixer participant backed by a `FrameQueue`.
///
/// Also a device transport: in mixed mode the BGM device delivers straight
/// into its participant, and the microphone tap pushes into its own.
pub struct QueueParticipant {
    source: SourceKind,
    queue: FrameQueue,
    last_delivery: AtomicI64,
    accepting: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl QueueParticipant {
    pub fn new(source: SourceKind, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            queue: FrameQueue::new(capacity),
            last_delivery: AtomicI64::new(0),
            accepting: AtomicBool::new(true),
            clock,
        }
    }

    pub fn queue(&self) -> &FrameQueue {
        &self.queue
    }

    /// Gate device deliveries. A closed participant drops frames on arrival.
    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.store(accepting, Ordering::SeqCst);
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Buffer one device delivery and stamp the delivery time.
    pub fn accept(&self, audio: &CapturedAudio<'_>) -> bool {
        if !self.is_accepting() {
            log::trace!("{} participant closed, dropping frame", self.source.label());
            return false;
        }
        self.push(AudioFrame::from_captured(audio));
        true
    }
}

impl MixerParticipant for QueueParticipant {
    fn push(&self, frame: AudioFrame) {
        self.queue.push(frame);
        self.last_delivery
            .fetch_max(self.clock.now_secs(), Ordering::SeqCst);
    }

    fn pop(&self) -> Option<AudioFrame> {
        self.queue.pop()
    }

    fn last_delivery_secs(&self) -> i64 {
        self.last_delivery.load(Ordering::SeqCst)
    }
}

impl AudioTransport for QueueParticipant {
    fn recorded_data_is_available(&self, audio: &CapturedAudio<'_>) -> u32 {
        self.accept(audio);
        audio.current_mic_level
    }
}
