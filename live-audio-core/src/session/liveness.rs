use std::sync::atomic::{AtomicI64, Ordering};

use crate::models::audio_models::MixMode;

/// Answers "is the microphone path still delivering audio".
///
/// Only configurations where the microphone contributes are watched. BGM is
/// allowed to be silent for any length of time, so it never makes the
/// stream look stalled.
#[derive(Debug)]
pub struct LivenessMonitor {
    passthrough_last: AtomicI64,
    timeout_secs: i64,
}

impl LivenessMonitor {
    pub fn new(timeout_secs: i64) -> Self {
        Self {
            passthrough_last: AtomicI64::new(0),
            timeout_secs,
        }
    }

    /// Record a passthrough delivery at `now_secs`. Never moves backwards.
    pub fn record_passthrough(&self, now_secs: i64) {
        self.passthrough_last.fetch_max(now_secs, Ordering::SeqCst);
    }

    pub fn passthrough_last_secs(&self) -> i64 {
        self.passthrough_last.load(Ordering::SeqCst)
    }

    pub fn timeout_secs(&self) -> i64 {
        self.timeout_secs
    }

    /// `mixed_microphone_last_secs` is the microphone participant's last
    /// delivery, used only in mixed mode.
    pub fn is_flowing(&self, mode: MixMode, mixed_microphone_last_secs: i64, now_secs: i64) -> bool {
        match mode {
            MixMode::Mixed => now_secs - mixed_microphone_last_secs < self.timeout_secs,
            MixMode::MicOnly => now_secs - self.passthrough_last_secs() < self.timeout_secs,
            // A fully disabled pipeline reads as flowing, same as BGM alone.
            MixMode::BgmOnly | MixMode::None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn mic_only_tracks_passthrough_deliveries() {
        let monitor = LivenessMonitor::new(5);
        assert!(!monitor.is_flowing(MixMode::MicOnly, 0, NOW));

        monitor.record_passthrough(NOW);
        assert!(monitor.is_flowing(MixMode::MicOnly, 0, NOW));
        assert!(monitor.is_flowing(MixMode::MicOnly, 0, NOW + 4));
        assert!(!monitor.is_flowing(MixMode::MicOnly, 0, NOW + 5));
    }

    #[test]
    fn mixed_uses_microphone_participant_only() {
        let monitor = LivenessMonitor::new(5);
        monitor.record_passthrough(NOW + 100);

        assert!(monitor.is_flowing(MixMode::Mixed, NOW, NOW + 4));
        assert!(!monitor.is_flowing(MixMode::Mixed, NOW, NOW + 5));
    }

    #[test]
    fn bgm_only_and_none_always_flow() {
        let monitor = LivenessMonitor::new(5);
        for elapsed in [0, 5, 3600] {
            assert!(monitor.is_flowing(MixMode::BgmOnly, 0, NOW + elapsed));
            assert!(monitor.is_flowing(MixMode::None, 0, NOW + elapsed));
        }
    }

    #[test]
    fn timestamp_never_moves_backwards() {
        let monitor = LivenessMonitor::new(5);
        monitor.record_passthrough(NOW);
        monitor.record_passthrough(NOW - 10);
        assert_eq!(monitor.passthrough_last_secs(), NOW);
    }
}
