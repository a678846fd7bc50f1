use std::sync::Arc;

use crate::config::PlotConfig;
use crate::drivers::render::wrapping_columns;
use crate::drivers::{
    Bar, Bounds, Channel, Compressor, CursorSnapshot, DisplaySink, DrawSpan, GridStyle,
    RedrawMode, RenderMapper, Rgb565, Scale, ScaleController, ScaleDecision,
};

/// What one render pass did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderReport {
    pub mode: RedrawMode,
    pub decision: ScaleDecision,
    pub scale: Scale,
    /// Columns repainted.
    pub columns: usize,
    /// Column holding the write cursor after this pass.
    pub cursor_column: usize,
}

/// A sweeping trace of one channel inside a widget rectangle.
///
/// The whole ring is laid out across the widget by slot, so the write cursor
/// sweeps left to right and each tick only the columns it crossed need to be
/// repainted. The plot reads the channel but never resets or frees it.
pub struct PlotView {
    channel: Arc<Channel>,
    scale: ScaleController,
    compressor: Compressor,
    mapper: RenderMapper,
    bars: Vec<Option<Bar>>,
    scratch: Vec<i16>,
    spans: Vec<DrawSpan>,
    last: Option<CursorSnapshot>,
    invalidated: bool,
}

impl PlotView {
    pub fn new(bounds: Bounds, channel: Arc<Channel>, config: &PlotConfig) -> Self {
        let columns = bounds.width();
        let span = channel.capacity();
        Self {
            scale: ScaleController::new(config),
            compressor: Compressor::new(columns, span),
            mapper: RenderMapper::new(
                bounds,
                config.samples_per_mv,
                config.trace_color(),
                config.background_color(),
            )
            .with_grid_style(config.grid_style()),
            bars: vec![None; columns],
            scratch: Vec::with_capacity(span),
            spans: Vec::with_capacity(2 * columns + 1),
            last: None,
            invalidated: true,
            channel,
        }
    }

    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    pub fn bounds(&self) -> Bounds {
        self.mapper.bounds()
    }

    pub fn scale(&self) -> Scale {
        self.scale.scale()
    }

    pub fn is_auto_scale(&self) -> bool {
        self.scale.is_auto()
    }

    pub fn color(&self) -> Rgb565 {
        self.mapper.trace()
    }

    /// Bars currently on screen, one per column.
    pub fn bars(&self) -> &[Option<Bar>] {
        &self.bars
    }

    pub fn set_scale(&mut self, scale: Scale) {
        if self.scale.set_scale(scale) {
            log::debug!("plot {}: scale set to {scale}", self.channel.name());
            self.invalidated = true;
        }
    }

    pub fn set_auto_scale(&mut self, auto: bool) {
        self.scale.set_auto(auto);
    }

    pub fn set_color(&mut self, color: Rgb565, invalidate: bool) {
        self.mapper.set_trace(color);
        if invalidate {
            self.invalidated = true;
        }
    }

    /// Switches the grid and calibration marker; always repaints everything.
    pub fn set_grid(&mut self, grid: Option<GridStyle>) {
        self.mapper.set_grid(grid);
        self.invalidated = true;
    }

    pub fn grid(&self) -> Option<GridStyle> {
        self.mapper.grid()
    }

    pub fn set_background(&mut self, color: Rgb565) {
        self.mapper.set_background(color);
        self.invalidated = true;
    }

    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    /// Moves the plot cursor back to the left edge and forgets what is on
    /// screen. Without `invalidate` the old picture stays until overdrawn.
    pub fn reset(&mut self, invalidate: bool) {
        self.bars.fill(None);
        self.last = Some(CursorSnapshot::start(
            self.compressor.span(),
            self.channel.session(),
        ));
        if invalidate {
            self.invalidated = true;
        }
        log::info!(
            "plot {}: cursor reset (invalidate={invalidate})",
            self.channel.name()
        );
    }

    /// One redraw tick. Replaces the contents of `out` with the spans to paint.
    pub fn render(&mut self, out: &mut Vec<DrawSpan>) -> RenderReport {
        out.clear();
        let cursor = self.channel.cursor();
        let baseline = self.channel.baseline();
        let span = self.compressor.span();
        let mut mode = self.plan(cursor);
        let cursor_column = self.compressor.column_of_slot(cursor.write_pos());

        match mode {
            RedrawMode::Full => {
                self.bars.fill(None);
                let first = self.channel.copy_window(cursor, span, &mut self.scratch);
                self.compressor
                    .compress_into(&self.scratch, first, baseline, &mut self.bars);
            }
            RedrawMode::IncrementalFrom(from) => {
                for column in wrapping_columns(from, cursor_column, self.bars.len()) {
                    self.bars[column] = None;
                }
                let first_slot = self.compressor.first_slot_of_column(from);
                let count = (cursor.write_pos() + span - first_slot) % span;
                let first = self.channel.copy_window(cursor, count, &mut self.scratch);
                self.compressor
                    .compress_into(&self.scratch, first, baseline, &mut self.bars);
            }
        }

        let decision = self.scale.evaluate_bars(&self.bars);
        if decision != ScaleDecision::Stay {
            mode = RedrawMode::Full;
        }

        let columns = self
            .mapper
            .map(&self.bars, self.scale.scale(), mode, cursor_column, out);
        self.last = Some(cursor);
        self.invalidated = false;
        log::trace!(
            "plot {}: {mode:?} {columns} columns, cursor column {cursor_column}",
            self.channel.name()
        );
        RenderReport {
            mode,
            decision,
            scale: self.scale.scale(),
            columns,
            cursor_column,
        }
    }

    /// Renders and hands every span to `sink`.
    pub fn draw(&mut self, sink: &mut impl DisplaySink) -> RenderReport {
        let mut spans = std::mem::take(&mut self.spans);
        let report = self.render(&mut spans);
        for span in &spans {
            sink.fill_span(span);
        }
        self.spans = spans;
        report
    }

    fn plan(&self, cursor: CursorSnapshot) -> RedrawMode {
        if self.invalidated {
            return RedrawMode::Full;
        }
        let Some(last) = self.last else {
            return RedrawMode::Full;
        };
        let span = self.compressor.span();
        if span < self.compressor.columns() {
            return RedrawMode::Full;
        }
        if cursor.session() != last.session() || cursor.written() < last.written() {
            log::debug!("plot {}: channel restarted, full redraw", self.channel.name());
            return RedrawMode::Full;
        }
        let from = self.compressor.column_of_slot(last.write_pos());
        let back = last.write_pos() - self.compressor.first_slot_of_column(from);
        let from_written = last.written().saturating_sub(back as u64);
        if cursor.written() - from_written >= span as u64 {
            log::debug!("plot {}: producer lapped the plot, full redraw", self.channel.name());
            return RedrawMode::Full;
        }
        RedrawMode::IncrementalFrom(from)
    }
}
