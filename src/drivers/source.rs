use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::drivers::Channel;

/// Something that yields raw samples for one lead on demand.
pub trait SampleSource {
    /// Replaces `out` with the next chunk and returns its length. Zero means
    /// nothing is available right now.
    fn next_chunk(&mut self, out: &mut Vec<i16>) -> usize;
}

/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<Vec<i16>>,
}

impl ManualSource {
    pub fn new(chunks: impl IntoIterator<Item = Vec<i16>>) -> Self {
        Self {
            queue: chunks.into_iter().collect(),
        }
    }
}

impl SampleSource for ManualSource {
    fn next_chunk(&mut self, out: &mut Vec<i16>) -> usize {
        out.clear();
        if let Some(chunk) = self.queue.pop_front() {
            out.extend_from_slice(&chunk);
        }
        out.len()
    }
}

/// One gaussian wave of the PQRST complex: offset into the beat (s), width (s), height (mV).
struct Wave {
    at: f32,
    width: f32,
    height: f32,
}

const COMPLEX: [Wave; 5] = [
    Wave { at: 0.16, width: 0.025, height: 0.15 },
    Wave { at: 0.30, width: 0.010, height: -0.12 },
    Wave { at: 0.33, width: 0.012, height: 1.0 },
    Wave { at: 0.36, width: 0.012, height: -0.25 },
    Wave { at: 0.55, width: 0.040, height: 0.30 },
];

/// Synthetic lead-II style ECG. Deterministic for a given seed.
pub struct SyntheticEcg {
    sample_rate_hz: f32,
    heart_rate_bpm: f32,
    amplitude_mv: f32,
    samples_per_mv: f32,
    noise_counts: i16,
    chunk_len: usize,
    beat_time: f32,
    rng: StdRng,
}

impl SyntheticEcg {
    pub fn new(sample_rate_hz: u32, samples_per_mv: i32, seed: u64) -> Self {
        Self {
            sample_rate_hz: sample_rate_hz.max(1) as f32,
            heart_rate_bpm: 72.0,
            amplitude_mv: 1.0,
            samples_per_mv: samples_per_mv as f32,
            noise_counts: 0,
            chunk_len: (sample_rate_hz / 50).max(1) as usize,
            beat_time: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_noise(mut self, noise_counts: i16) -> Self {
        self.set_noise(noise_counts);
        self
    }

    /// Uniform noise of up to `noise_counts` raw counts either way.
    pub fn set_noise(&mut self, noise_counts: i16) {
        self.noise_counts = noise_counts.max(0);
    }

    pub fn with_chunk_len(mut self, chunk_len: usize) -> Self {
        self.chunk_len = chunk_len.max(1);
        self
    }

    pub fn amplitude_mv(&self) -> f32 {
        self.amplitude_mv
    }

    /// Height of the R wave in millivolts.
    pub fn set_amplitude_mv(&mut self, amplitude_mv: f32) {
        self.amplitude_mv = amplitude_mv.max(0.0);
    }

    pub fn set_heart_rate(&mut self, bpm: f32) {
        self.heart_rate_bpm = bpm.clamp(20.0, 250.0);
    }

    pub fn next_sample(&mut self) -> i16 {
        let period = 60.0 / self.heart_rate_bpm;
        let t = self.beat_time;
        let mut mv = 0.0;
        for wave in &COMPLEX {
            // the complex is laid out for 60 bpm; squeeze it with the period
            let d = t - wave.at * period;
            let w = wave.width * period.sqrt();
            mv += wave.height * (-(d * d) / (2.0 * w * w)).exp();
        }
        self.beat_time += 1.0 / self.sample_rate_hz;
        if self.beat_time >= period {
            self.beat_time -= period;
        }
        let mut counts = mv * self.amplitude_mv * self.samples_per_mv;
        if self.noise_counts > 0 {
            counts += self.rng.gen_range(-self.noise_counts..=self.noise_counts) as f32;
        }
        counts.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
    }
}

impl SampleSource for SyntheticEcg {
    fn next_chunk(&mut self, out: &mut Vec<i16>) -> usize {
        out.clear();
        for _ in 0..self.chunk_len {
            let sample = self.next_sample();
            out.push(sample);
        }
        out.len()
    }
}

/// Moves one chunk from `source` into `channel`. Returns the chunk length.
pub fn pump(source: &mut impl SampleSource, channel: &Channel, scratch: &mut Vec<i16>) -> usize {
    let n = source.next_chunk(scratch);
    channel.append_slice(scratch);
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_source_replays_chunks() {
        let mut source = ManualSource::new(vec![vec![1, 2], vec![3]]);
        let channel = Channel::new("I", 8);
        let mut scratch = Vec::new();
        assert_eq!(pump(&mut source, &channel, &mut scratch), 2);
        assert_eq!(pump(&mut source, &channel, &mut scratch), 1);
        assert_eq!(pump(&mut source, &channel, &mut scratch), 0);
        assert_eq!(channel.window(8).samples(), &[1, 2, 3]);
    }

    #[test]
    fn synthetic_ecg_is_seeded() {
        let mut a = SyntheticEcg::new(700, 10, 7).with_noise(2);
        let mut b = SyntheticEcg::new(700, 10, 7).with_noise(2);
        let xs: Vec<i16> = (0..700).map(|_| a.next_sample()).collect();
        let ys: Vec<i16> = (0..700).map(|_| b.next_sample()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn r_wave_tracks_amplitude() {
        let mut ecg = SyntheticEcg::new(700, 10, 1);
        ecg.set_amplitude_mv(3.0);
        let peak = (0..700).map(|_| ecg.next_sample()).max().unwrap();
        // 1 mV R wave scaled by 3 and 10 counts per mV, plus the neighbours
        assert!((25..=35).contains(&peak), "peak {peak}");
    }

    #[test]
    fn default_chunk_is_twenty_milliseconds() {
        let mut ecg = SyntheticEcg::new(700, 10, 1);
        let mut out = Vec::new();
        assert_eq!(ecg.next_chunk(&mut out), 14);
    }
}
