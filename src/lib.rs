//! Signal-to-pixel engine for a sweeping ECG trace.
//!
//! Samples land in a [`Channel`] ring, a [`PlotView`] compresses them into one
//! bar per pixel column, picks a millivolt [`Scale`] and emits [`DrawSpan`]s for
//! whatever display sits behind a [`DisplaySink`].
pub mod config;
pub mod drivers;

pub use config::PlotConfig;
pub use drivers::{
    Bar, Bounds, Channel, CursorSnapshot, DisplaySink, DrawSpan, GridStyle, PlotError, PlotView,
    RedrawMode, RenderReport, Rgb565, Scale, ScaleController, ScaleDecision,
};
