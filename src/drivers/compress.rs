//! Bar-diagram reduction: many samples per pixel column down to one
//! `[low, high]` bar measured from the baseline.
use std::ops::Range;

/// Vertical extent of one column, in raw counts relative to the baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bar {
    pub low: i32,
    pub high: i32,
}

impl Bar {
    pub fn point(deviation: i32) -> Self {
        Self {
            low: deviation,
            high: deviation,
        }
    }

    pub fn include(&mut self, deviation: i32) {
        self.low = self.low.min(deviation);
        self.high = self.high.max(deviation);
    }

    /// Largest distance from the baseline covered by the bar.
    pub fn magnitude(&self) -> i32 {
        self.low.abs().max(self.high.abs())
    }
}

/// Geometry of `span` consecutive ring slots spread across `columns` pixels.
///
/// Slot `s` lands in column `s * columns / span`; when there are fewer slots
/// than columns a slot covers every column up to the next slot's first one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Compressor {
    columns: usize,
    span: usize,
}

impl Compressor {
    pub fn new(columns: usize, span: usize) -> Self {
        Self {
            columns: columns.max(1),
            span: span.max(1),
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn span(&self) -> usize {
        self.span
    }

    pub fn column_of_slot(&self, slot: usize) -> usize {
        (slot % self.span) * self.columns / self.span
    }

    pub fn columns_of_slot(&self, slot: usize) -> Range<usize> {
        let slot = slot % self.span;
        let start = slot * self.columns / self.span;
        let end = ((slot + 1) * self.columns / self.span).max(start + 1);
        start..end.min(self.columns)
    }

    /// First slot drawn in `column`. Exact only when `span >= columns`.
    pub fn first_slot_of_column(&self, column: usize) -> usize {
        (column * self.span).div_ceil(self.columns) % self.span
    }

    /// Compresses a window whose first sample sits in slot 0.
    pub fn compress(&self, window: &[i16], baseline: i16) -> Vec<Option<Bar>> {
        let mut bars = vec![None; self.columns];
        self.compress_into(window, 0, baseline, &mut bars);
        bars
    }

    /// Folds `window` into `bars`, the first sample living in `first_slot`.
    /// Bars already present are widened, not replaced; columns no sample
    /// reaches are left as they are.
    pub fn compress_into(
        &self,
        window: &[i16],
        first_slot: usize,
        baseline: i16,
        bars: &mut [Option<Bar>],
    ) {
        let baseline = baseline as i32;
        for (i, &sample) in window.iter().enumerate() {
            let deviation = sample as i32 - baseline;
            for column in self.columns_of_slot(first_slot + i) {
                let Some(bar) = bars.get_mut(column) else {
                    break;
                };
                match bar {
                    Some(bar) => bar.include(deviation),
                    None => *bar = Some(Bar::point(deviation)),
                }
            }
        }
    }
}

/// One-shot reduction of a whole window onto `columns` pixels.
pub fn compress(window: &[i16], baseline: i16, columns: usize) -> Vec<Option<Bar>> {
    Compressor::new(columns, window.len()).compress(window, baseline)
}
