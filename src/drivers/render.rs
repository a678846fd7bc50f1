// src/drivers/render.rs
use crate::drivers::{Bar, DrawSpan, Rgb565, Scale};

/// Widget rectangle in display coordinates, corners inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl Bounds {
    pub fn new(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Pixel columns, one bar each.
    pub fn width(&self) -> usize {
        (self.x1 - self.x0) as usize + 1
    }

    pub fn height(&self) -> usize {
        (self.y1 - self.y0) as usize + 1
    }

    pub fn center_y(&self) -> u16 {
        self.y0 + (self.y1 - self.y0) / 2
    }

    /// Pixels from the center row to the top edge.
    pub fn half_height(&self) -> i32 {
        ((self.y1 - self.y0) / 2) as i32
    }
}

/// What a render pass has to repaint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedrawMode {
    /// Clear the whole widget and draw every column.
    Full,
    /// Repaint only the columns from this one up to the cursor column.
    IncrementalFrom(usize),
}

/// Columns covered by the calibration marker at the left edge.
pub const MARKER_COLUMNS: usize = 3;

/// Colors of the static layer under the trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridStyle {
    pub lines: Rgb565,
    pub marker: Rgb565,
}

/// Turns bars into spans for one widget.
///
/// With a grid, one cell is one division of the current scale: the center row
/// and every `half_height` pixels from it, with square cells across. The
/// marker is a 1 mV calibration pulse, so its height tracks the scale.
#[derive(Clone, Debug)]
pub struct RenderMapper {
    bounds: Bounds,
    samples_per_mv: i32,
    trace: Rgb565,
    background: Rgb565,
    grid: Option<GridStyle>,
}

impl RenderMapper {
    pub fn new(bounds: Bounds, samples_per_mv: i32, trace: Rgb565, background: Rgb565) -> Self {
        Self {
            bounds,
            samples_per_mv: samples_per_mv.max(1),
            trace,
            background,
            grid: None,
        }
    }

    pub fn with_grid(self, grid: GridStyle) -> Self {
        self.with_grid_style(Some(grid))
    }

    pub fn with_grid_style(mut self, grid: Option<GridStyle>) -> Self {
        self.grid = grid;
        self
    }

    pub fn grid(&self) -> Option<GridStyle> {
        self.grid
    }

    pub fn set_grid(&mut self, grid: Option<GridStyle>) {
        self.grid = grid;
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn trace(&self) -> Rgb565 {
        self.trace
    }

    pub fn background(&self) -> Rgb565 {
        self.background
    }

    pub fn set_trace(&mut self, color: Rgb565) {
        self.trace = color;
    }

    pub fn set_background(&mut self, color: Rgb565) {
        self.background = color;
    }

    /// Display row for a deviation from the baseline, clamped to the widget.
    pub fn row_of(&self, deviation: i32, scale: Scale) -> u16 {
        let half = self.bounds.half_height() as i64;
        let full_scale = scale.full_scale(self.samples_per_mv) as i64;
        let scaled = deviation as i64 * half;
        let offset = if scaled >= 0 {
            (scaled + full_scale / 2) / full_scale
        } else {
            (scaled - full_scale / 2) / full_scale
        };
        let row = self.bounds.center_y() as i64 - offset.clamp(-half, half);
        row.clamp(self.bounds.y0 as i64, self.bounds.y1 as i64) as u16
    }

    /// The trace span for one bar in `column`.
    pub fn bar_span(&self, column: usize, bar: Bar, scale: Scale) -> DrawSpan {
        let x = self.bounds.x0 + column as u16;
        DrawSpan::column(x, self.row_of(bar.high, scale), self.row_of(bar.low, scale), self.trace)
    }

    /// Pixels per grid division.
    pub fn grid_pitch(&self) -> usize {
        self.bounds.half_height().max(1) as usize
    }

    /// Grid rows, top to bottom.
    pub fn grid_rows(&self) -> impl Iterator<Item = u16> {
        let pitch = self.grid_pitch() as i32;
        let center = self.bounds.center_y() as i32;
        let above = (center - self.bounds.y0 as i32) / pitch;
        let below = (self.bounds.y1 as i32 - center) / pitch;
        (-above..=below).map(move |k| (center + k * pitch) as u16)
    }

    pub fn is_grid_column(&self, column: usize) -> bool {
        column % self.grid_pitch() == 0
    }

    /// Top row of the calibration pulse; it rises from the center row.
    pub fn marker_top(&self, scale: Scale) -> u16 {
        self.row_of(self.samples_per_mv, scale)
    }

    /// Grid and marker pixels of one column, drawn over a cleared column.
    fn column_backdrop(&self, column: usize, scale: Scale, out: &mut Vec<DrawSpan>) {
        let x = self.bounds.x0 + column as u16;
        out.push(DrawSpan::column(x, self.bounds.y0, self.bounds.y1, self.background));
        let Some(grid) = self.grid else {
            return;
        };
        if self.is_grid_column(column) {
            out.push(DrawSpan::column(x, self.bounds.y0, self.bounds.y1, grid.lines));
        } else {
            out.extend(self.grid_rows().map(|y| DrawSpan::column(x, y, y, grid.lines)));
        }
        if column < MARKER_COLUMNS {
            out.push(DrawSpan::column(
                x,
                self.marker_top(scale),
                self.bounds.center_y(),
                grid.marker,
            ));
        }
    }

    /// Whole-widget clear plus grid lines and marker.
    fn backdrop(&self, columns: usize, scale: Scale, out: &mut Vec<DrawSpan>) {
        let b = self.bounds;
        out.push(DrawSpan {
            x0: b.x0,
            y0: b.y0,
            x1: b.x1,
            y1: b.y1,
            color: self.background,
        });
        let Some(grid) = self.grid else {
            return;
        };
        for y in self.grid_rows() {
            out.push(DrawSpan {
                x0: b.x0,
                y0: y,
                x1: b.x1,
                y1: y,
                color: grid.lines,
            });
        }
        for column in (0..columns).step_by(self.grid_pitch()) {
            let x = b.x0 + column as u16;
            out.push(DrawSpan::column(x, b.y0, b.y1, grid.lines));
        }
        out.push(DrawSpan {
            x0: b.x0,
            y0: self.marker_top(scale),
            x1: b.x0 + (MARKER_COLUMNS.min(columns) - 1) as u16,
            y1: b.center_y(),
            color: grid.marker,
        });
    }

    /// Appends the spans for `mode` to `out` and returns how many columns were
    /// touched. `cursor_column` is the column holding the write cursor; an
    /// incremental pass that starts past it wraps around the right edge.
    pub fn map(
        &self,
        bars: &[Option<Bar>],
        scale: Scale,
        mode: RedrawMode,
        cursor_column: usize,
        out: &mut Vec<DrawSpan>,
    ) -> usize {
        let columns = bars.len().min(self.bounds.width());
        if columns == 0 {
            return 0;
        }
        match mode {
            RedrawMode::Full => {
                self.backdrop(columns, scale, out);
                for (column, bar) in bars[..columns].iter().enumerate() {
                    if let Some(bar) = bar {
                        out.push(self.bar_span(column, *bar, scale));
                    }
                }
                columns
            }
            RedrawMode::IncrementalFrom(from) => {
                let from = if from < columns { from } else { 0 };
                let to = cursor_column.min(columns - 1);
                let mut touched = 0;
                for column in wrapping_columns(from, to, columns) {
                    self.column_backdrop(column, scale, out);
                    if let Some(bar) = bars[column] {
                        out.push(self.bar_span(column, bar, scale));
                    }
                    touched += 1;
                }
                touched
            }
        }
    }
}

/// Columns `from..=to`, continuing from column 0 when `to` is left of `from`.
pub(crate) fn wrapping_columns(
    from: usize,
    to: usize,
    columns: usize,
) -> impl Iterator<Item = usize> {
    let (head, tail) = if from <= to {
        (from..to + 1, 0..0)
    } else {
        (from..columns, 0..to + 1)
    };
    head.chain(tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{DisplaySink, Framebuffer};

    const GRID: GridStyle = GridStyle {
        lines: Rgb565(0x4208),
        marker: Rgb565::RED,
    };

    fn mapper() -> RenderMapper {
        // rows 10..=110, center 60, half 50
        RenderMapper::new(Bounds::new(20, 10, 29, 110), 10, Rgb565::GREEN, Rgb565::BLACK)
    }

    #[test]
    fn zero_sits_on_the_center_row() {
        let m = mapper();
        assert_eq!(m.row_of(0, Scale::Mv1), 60);
        let span = m.bar_span(3, Bar::point(0), Scale::Mv1);
        assert_eq!((span.x0, span.y0, span.y1), (23, 60, 60));
    }

    #[test]
    fn full_scale_reaches_the_edges_and_beyond_clamps() {
        let m = mapper();
        assert_eq!(m.row_of(10, Scale::Mv1), 10);
        assert_eq!(m.row_of(-10, Scale::Mv1), 110);
        assert_eq!(m.row_of(5, Scale::Mv1), 35);
        assert_eq!(m.row_of(10_000, Scale::Mv1), 10);
        assert_eq!(m.row_of(-10_000, Scale::Mv1), 110);
        // same deviation, coarser scale, half the height
        assert_eq!(m.row_of(10, Scale::Mv2), 35);
    }

    #[test]
    fn full_redraw_clears_then_draws_set_columns() {
        let m = mapper();
        let mut bars = vec![None; 10];
        bars[0] = Some(Bar { low: -5, high: 5 });
        bars[4] = Some(Bar::point(0));
        let mut out = Vec::new();
        assert_eq!(m.map(&bars, Scale::Mv1, RedrawMode::Full, 4, &mut out), 10);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].color, Rgb565::BLACK);
        assert_eq!((out[0].width(), out[0].height()), (10, 101));
        assert_eq!((out[1].x0, out[1].y0, out[1].y1), (20, 35, 85));
        assert_eq!(out[2].x0, 24);
    }

    #[test]
    fn incremental_touches_only_new_columns() {
        let m = mapper();
        let bars = vec![Some(Bar::point(1)); 10];
        let mut out = Vec::new();
        let touched = m.map(&bars, Scale::Mv1, RedrawMode::IncrementalFrom(3), 5, &mut out);
        assert_eq!(touched, 3);
        let xs: Vec<u16> = out.iter().map(|s| s.x0).collect();
        assert_eq!(xs, vec![23, 23, 24, 24, 25, 25]);
    }

    #[test]
    fn incremental_wraps_past_the_right_edge() {
        let m = mapper();
        let mut bars = vec![None; 10];
        bars[9] = Some(Bar::point(0));
        let mut out = Vec::new();
        let touched = m.map(&bars, Scale::Mv1, RedrawMode::IncrementalFrom(8), 1, &mut out);
        assert_eq!(touched, 4);
        let xs: Vec<u16> = out.iter().map(|s| s.x0).collect();
        // only column 9 has a bar
        assert_eq!(xs, vec![28, 29, 29, 20, 21]);
    }

    #[test]
    fn marker_height_follows_scale() {
        let m = mapper().with_grid(GRID);
        assert_eq!(m.marker_top(Scale::Mv1), 10);
        assert_eq!(m.marker_top(Scale::Mv2), 35);
        assert_eq!(m.marker_top(Scale::Mv10), 55);

        let mut out = Vec::new();
        m.map(&[None; 10], Scale::Mv2, RedrawMode::Full, 0, &mut out);
        // clear, rows 10/60/110, column 20, marker
        assert_eq!(out.len(), 6);
        assert!(out[1..4].iter().all(|s| s.width() == 10 && s.height() == 1));
        assert_eq!((out[4].x0, out[4].height()), (20, 101));
        let marker = out[5];
        assert_eq!((marker.x0, marker.x1, marker.y0, marker.y1), (20, 22, 35, 60));
        assert_eq!(marker.color, GRID.marker);
    }

    #[test]
    fn column_repaint_restores_grid_pixels() {
        let m = mapper().with_grid(GRID);
        let mut fb = Framebuffer::new(30, 111, Rgb565::BLACK);
        let mut bars = vec![None; 10];
        bars[5] = Some(Bar { low: -10, high: 10 });
        let mut out = Vec::new();
        m.map(&bars, Scale::Mv1, RedrawMode::Full, 0, &mut out);
        out.iter().for_each(|s| fb.fill_span(s));
        assert_eq!(fb.pixel(25, 60), Some(Rgb565::GREEN));
        assert_eq!(fb.pixel(24, 60), Some(GRID.lines));

        bars[5] = None;
        out.clear();
        m.map(&bars, Scale::Mv1, RedrawMode::IncrementalFrom(5), 5, &mut out);
        out.iter().for_each(|s| fb.fill_span(s));
        for y in [10, 60, 110] {
            assert_eq!(fb.pixel(25, y), Some(GRID.lines));
        }
        assert_eq!(fb.pixel(25, 30), Some(Rgb565::BLACK));
    }

    #[test]
    fn marker_columns_are_repainted_with_the_marker() {
        let m = mapper().with_grid(GRID);
        let mut out = Vec::new();
        m.map(&[None; 10], Scale::Mv1, RedrawMode::IncrementalFrom(0), 3, &mut out);
        let marker: Vec<u16> = out.iter().filter(|s| s.color == GRID.marker).map(|s| s.x0).collect();
        assert_eq!(marker, vec![20, 21, 22]);
    }
}
