// src/drivers/channel.rs
use std::sync::atomic::{AtomicBool, AtomicI16, AtomicI32, AtomicU32, AtomicU64, Ordering};

use crate::config::{PlotConfig, BASELINE_SHIFT};

/// Everything a reader needs to know about the write side, captured by a single
/// atomic load of the written-sample counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorSnapshot {
    written: u64,
    capacity: usize,
    session: u32,
}

impl CursorSnapshot {
    /// Cursor of a freshly reset ring in `session`.
    pub(crate) fn start(capacity: usize, session: u32) -> Self {
        Self {
            written: 0,
            capacity: capacity.max(1),
            session,
        }
    }

    /// Bumped by every [`Channel::reset`]; `written` only counts within one session.
    pub fn session(&self) -> u32 {
        self.session
    }

    /// Samples appended since the last reset (not bounded by capacity).
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slot the next sample goes to.
    pub fn write_pos(&self) -> usize {
        (self.written % self.capacity as u64) as usize
    }

    pub fn elem_count(&self) -> usize {
        self.written.min(self.capacity as u64) as usize
    }

    /// True once the ring has been written through at least once.
    pub fn is_filled(&self) -> bool {
        self.written >= self.capacity as u64
    }

    /// Slot holding the oldest sample of a window of `len` samples ending at the cursor.
    pub fn first_slot(&self, len: usize) -> usize {
        let len = len.min(self.elem_count());
        (self.write_pos() + self.capacity - len) % self.capacity
    }
}

/// Samples read out of a channel, oldest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleWindow {
    samples: Vec<i16>,
    requested: usize,
    first_slot: usize,
    cursor: CursorSnapshot,
}

impl SampleWindow {
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Fewer samples than requested were valid.
    pub fn is_short(&self) -> bool {
        self.samples.len() < self.requested
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Ring slot of `samples()[0]`.
    pub fn first_slot(&self) -> usize {
        self.first_slot
    }

    pub fn cursor(&self) -> CursorSnapshot {
        self.cursor
    }
}

/// One lead's sample ring.
///
/// Exactly one context appends and exactly one context reads. Slots are
/// written relaxed and the written counter is published with release ordering
/// after the slot store, so a reader that loads the counter once (see
/// [`Channel::cursor`]) never sees a slot that has not been written for it.
#[derive(Debug)]
pub struct Channel {
    name: String,
    samples: Box<[AtomicI16]>,
    written: AtomicU64,
    session: AtomicU32,
    write_enabled: AtomicBool,
    // Q24.8 fixed point
    baseline: AtomicI32,
    baseline_shift: u32,
}

impl Channel {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self::with_baseline_shift(name, capacity, BASELINE_SHIFT)
    }

    pub fn from_config(name: impl Into<String>, config: &PlotConfig) -> Self {
        Self::with_baseline_shift(name, config.capacity, config.baseline_shift)
    }

    pub fn with_baseline_shift(name: impl Into<String>, capacity: usize, shift: u32) -> Self {
        let capacity = capacity.max(1);
        Self {
            name: name.into(),
            samples: (0..capacity).map(|_| AtomicI16::new(0)).collect(),
            written: AtomicU64::new(0),
            session: AtomicU32::new(0),
            write_enabled: AtomicBool::new(true),
            baseline: AtomicI32::new(0),
            baseline_shift: shift.min(15),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn set_write_enabled(&self, enabled: bool) {
        self.write_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_write_enabled(&self) -> bool {
        self.write_enabled.load(Ordering::Relaxed)
    }

    pub fn cursor(&self) -> CursorSnapshot {
        let written = self.written.load(Ordering::Acquire);
        CursorSnapshot {
            written,
            capacity: self.capacity(),
            session: self.session.load(Ordering::Relaxed),
        }
    }

    pub fn session(&self) -> u32 {
        self.session.load(Ordering::Relaxed)
    }

    pub fn write_pos(&self) -> usize {
        self.cursor().write_pos()
    }

    pub fn elem_count(&self) -> usize {
        self.cursor().elem_count()
    }

    pub fn is_filled(&self) -> bool {
        self.cursor().is_filled()
    }

    /// Running baseline in raw counts.
    pub fn baseline(&self) -> i16 {
        let fixed = self.baseline.load(Ordering::Relaxed);
        ((fixed + 128) >> 8) as i16
    }

    /// Producer side. Dropped while writes are disabled.
    pub fn append(&self, sample: i16) {
        if !self.is_write_enabled() {
            return;
        }
        let written = self.written.load(Ordering::Relaxed);
        let pos = (written % self.capacity() as u64) as usize;
        self.samples[pos].store(sample, Ordering::Relaxed);
        self.track_baseline(sample, written == 0);
        self.written.store(written + 1, Ordering::Release);
    }

    pub fn append_slice(&self, samples: &[i16]) {
        for &sample in samples {
            self.append(sample);
        }
    }

    /// Starts a new session. Stale samples stay in place unless `clear_buffer`
    /// is set; they are unreachable through windows either way.
    pub fn reset(&self, clear_buffer: bool) {
        // session first: a reader that sees the zeroed counter sees the new session
        self.session.fetch_add(1, Ordering::Relaxed);
        self.written.store(0, Ordering::Release);
        self.baseline.store(0, Ordering::Relaxed);
        if clear_buffer {
            for slot in self.samples.iter() {
                slot.store(0, Ordering::Relaxed);
            }
        }
        log::info!(
            "channel {} reset (clear_buffer={clear_buffer})",
            self.name
        );
    }

    pub fn window(&self, count: usize) -> SampleWindow {
        self.window_at(self.cursor(), count)
    }

    pub fn window_at(&self, cursor: CursorSnapshot, count: usize) -> SampleWindow {
        let mut samples = Vec::with_capacity(count.min(cursor.elem_count()));
        let first_slot = self.copy_window(cursor, count, &mut samples);
        SampleWindow {
            samples,
            requested: count,
            first_slot,
            cursor,
        }
    }

    /// Fills `out` with up to `count` samples ending at `cursor`, oldest first,
    /// and returns the ring slot of the first one. `out` keeps its allocation.
    pub fn copy_window(&self, cursor: CursorSnapshot, count: usize, out: &mut Vec<i16>) -> usize {
        out.clear();
        let len = count.min(cursor.elem_count());
        let capacity = self.capacity();
        let first = cursor.first_slot(len);
        out.extend((0..len).map(|i| self.samples[(first + i) % capacity].load(Ordering::Relaxed)));
        first
    }

    fn track_baseline(&self, sample: i16, first: bool) {
        let target = (sample as i32) << 8;
        let next = if first {
            target
        } else {
            let current = self.baseline.load(Ordering::Relaxed);
            current + ((target - current) >> self.baseline_shift)
        };
        self.baseline.store(next, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn partial_fill_tracks_count_and_cursor() {
        let channel = Channel::new("II", 8);
        for n in 1..=8u64 {
            channel.append(n as i16);
            let cursor = channel.cursor();
            assert_eq!(cursor.elem_count() as u64, n);
            assert_eq!(cursor.write_pos() as u64, n % 8);
            assert_eq!(cursor.is_filled(), n == 8);
        }
    }

    #[test]
    fn wrapped_window_is_in_temporal_order() {
        let channel = Channel::new("II", 5);
        for v in 0..13 {
            channel.append(v);
        }
        assert!(channel.is_filled());
        assert_eq!(channel.elem_count(), 5);
        assert_eq!(channel.write_pos(), 3);
        let window = channel.window(5);
        assert_eq!(window.samples(), &[8, 9, 10, 11, 12]);
        assert_eq!(window.first_slot(), 3);
        assert!(!window.is_short());
    }

    #[test]
    fn short_window_returns_valid_prefix_only() {
        let channel = Channel::new("V1", 10);
        channel.append_slice(&[4, 5, 6]);
        let window = channel.window(7);
        assert_eq!(window.samples(), &[4, 5, 6]);
        assert!(window.is_short());
        assert_eq!(window.first_slot(), 0);
    }

    #[test]
    fn window_is_idempotent() {
        let channel = Channel::new("V2", 16);
        channel.append_slice(&[3, -1, 4, -1, 5, -9, 2, 6]);
        assert_eq!(channel.window(5), channel.window(5));
    }

    #[test]
    fn disabled_channel_drops_samples() {
        let channel = Channel::new("aVR", 4);
        channel.append(1);
        channel.set_write_enabled(false);
        channel.append(2);
        channel.append(3);
        assert_eq!(channel.elem_count(), 1);
        channel.set_write_enabled(true);
        channel.append(4);
        assert_eq!(channel.window(4).samples(), &[1, 4]);
    }

    #[test]
    fn reset_hides_stale_data() {
        let channel = Channel::new("I", 4);
        channel.append_slice(&[7, 7, 7, 7, 7]);
        assert_eq!(channel.session(), 0);
        channel.reset(true);
        assert_eq!(channel.cursor().session(), 1);
        assert_eq!(channel.elem_count(), 0);
        assert!(!channel.is_filled());
        let window = channel.window(1);
        assert!(window.is_empty());
        assert!(window.is_short());

        channel.append_slice(&[1, 2, 3, 4, 5]);
        channel.reset(false);
        assert!(channel.window(4).is_empty());
        assert_eq!(channel.session(), 2);
    }

    #[test]
    fn baseline_follows_offset() {
        let channel = Channel::with_baseline_shift("I", 64, 2);
        channel.append(100);
        assert_eq!(channel.baseline(), 100);
        for _ in 0..64 {
            channel.append(200);
        }
        assert_eq!(channel.baseline(), 200);
        for _ in 0..64 {
            channel.append(-50);
        }
        assert_eq!(channel.baseline(), -50);
    }

    #[test]
    fn reader_sees_monotonic_cursor_while_producer_runs() {
        let channel = Arc::new(Channel::new("II", 97));
        let producer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                for v in 0..20_000u32 {
                    channel.append((v % 1000) as i16);
                }
            })
        };
        let mut last = 0;
        let mut out = Vec::new();
        while last < 20_000 {
            let cursor = channel.cursor();
            assert!(cursor.written() >= last);
            last = cursor.written();
            channel.copy_window(cursor, 97, &mut out);
            assert_eq!(out.len(), cursor.elem_count());
        }
        producer.join().unwrap();
        let tail = channel.window(3);
        assert_eq!(tail.samples(), &[997, 998, 999]);
    }
}
