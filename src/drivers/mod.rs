// src/drivers/mod.rs
pub mod channel;
pub mod compress;
pub mod display;
pub mod error;
pub mod plot;
pub mod render;
pub mod scale;
pub mod snapshot;
pub mod source;
pub use channel::{Channel, CursorSnapshot, SampleWindow};
pub use compress::{compress, Bar, Compressor};
pub use display::{DisplaySink, DrawSpan, Framebuffer, Rgb565, SpanRecorder};
pub use error::PlotError;
pub use plot::{PlotView, RenderReport};
pub use render::{Bounds, GridStyle, RedrawMode, RenderMapper};
pub use scale::{Scale, ScaleController, ScaleDecision};
pub use snapshot::render_spans_png;
pub use source::{pump, ManualSource, SampleSource, SyntheticEcg};
