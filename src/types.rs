// src/types.rs

// GUI 发给采集线程的命令
#[derive(Clone, Debug)]
pub enum EngineCommand {
    SetAmplitude(f32),
    SetHeartRate(f32),
    SetNoise(i16),
    // freeze: the engine keeps generating, the channel drops the samples
    Freeze(bool),
    ResetSession,
    Shutdown,
}

// 采集线程发给 GUI 的消息
#[derive(Clone, Debug)]
pub enum EngineMessage {
    Log(String),
    Frozen(bool),
    SessionReset,
}
