// src/engine.rs
use leadscope::drivers::{pump, Channel, SyntheticEcg};
use leadscope::PlotConfig;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::types::*;

const TICK: Duration = Duration::from_millis(20);

/// Simulated acquisition front end: the only writer of `channel`.
pub fn spawn_thread(
    channel: Arc<Channel>,
    config: &PlotConfig,
    tx: Sender<EngineMessage>,
    rx_cmd: Receiver<EngineCommand>,
) -> JoinHandle<()> {
    let sample_rate = config.sample_rate_hz;
    let samples_per_mv = config.samples_per_mv;
    thread::spawn(move || {
        tx.send(EngineMessage::Log(format!(
            "acquisition on {} at {sample_rate} Hz",
            channel.name()
        )))
        .ok();

        let mut ecg = SyntheticEcg::new(sample_rate, samples_per_mv, 0x5EED).with_noise(1);
        let mut scratch = Vec::with_capacity(sample_rate as usize);
        let started = Instant::now();
        let mut produced: u64 = 0;

        loop {
            // 1. 命令处理
            while let Ok(cmd) = rx_cmd.try_recv() {
                match cmd {
                    EngineCommand::SetAmplitude(mv) => ecg.set_amplitude_mv(mv),
                    EngineCommand::SetHeartRate(bpm) => ecg.set_heart_rate(bpm),
                    EngineCommand::SetNoise(counts) => ecg.set_noise(counts),
                    EngineCommand::Freeze(frozen) => {
                        channel.set_write_enabled(!frozen);
                        tx.send(EngineMessage::Frozen(frozen)).ok();
                    }
                    EngineCommand::ResetSession => {
                        channel.reset(false);
                        tx.send(EngineMessage::SessionReset).ok();
                        tx.send(EngineMessage::Log("session restarted".to_owned())).ok();
                    }
                    EngineCommand::Shutdown => {
                        log::info!("acquisition thread stopping");
                        return;
                    }
                }
            }

            // 2. keep pace with the wall clock, one chunk at a time
            let due = (started.elapsed().as_secs_f64() * sample_rate as f64) as u64;
            while produced < due {
                produced += pump(&mut ecg, &channel, &mut scratch) as u64;
            }
            thread::sleep(TICK);
        }
    })
}
