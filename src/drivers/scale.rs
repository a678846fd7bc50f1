use std::fmt;

use crate::config::PlotConfig;
use crate::drivers::Bar;

/// Millivolts per grid division.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scale {
    Mv1,
    Mv2,
    Mv4,
    Mv8,
    Mv10,
}

impl Scale {
    pub const ALL: [Scale; 5] = [Scale::Mv1, Scale::Mv2, Scale::Mv4, Scale::Mv8, Scale::Mv10];

    pub fn millivolts(self) -> u32 {
        match self {
            Scale::Mv1 => 1,
            Scale::Mv2 => 2,
            Scale::Mv4 => 4,
            Scale::Mv8 => 8,
            Scale::Mv10 => 10,
        }
    }

    /// Next coarser scale, `None` at the top.
    pub fn up(self) -> Option<Scale> {
        match self {
            Scale::Mv1 => Some(Scale::Mv2),
            Scale::Mv2 => Some(Scale::Mv4),
            Scale::Mv4 => Some(Scale::Mv8),
            Scale::Mv8 => Some(Scale::Mv10),
            Scale::Mv10 => None,
        }
    }

    /// Next finer scale, `None` at the bottom.
    pub fn down(self) -> Option<Scale> {
        match self {
            Scale::Mv1 => None,
            Scale::Mv2 => Some(Scale::Mv1),
            Scale::Mv4 => Some(Scale::Mv2),
            Scale::Mv8 => Some(Scale::Mv4),
            Scale::Mv10 => Some(Scale::Mv8),
        }
    }

    /// Closest supported scale to an arbitrary request. Ties resolve to the finer one.
    pub fn nearest(millivolts: u32) -> Scale {
        let mut best = Scale::Mv1;
        for scale in Scale::ALL {
            if scale.millivolts().abs_diff(millivolts) < best.millivolts().abs_diff(millivolts) {
                best = scale;
            }
        }
        best
    }

    /// Raw counts between the baseline and the edge of the plot.
    pub fn full_scale(self, samples_per_mv: i32) -> i32 {
        (self.millivolts() as i32).saturating_mul(samples_per_mv)
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mV", self.millivolts())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleDecision {
    Stay,
    StepUp,
    StepDown,
}

/// Picks the scale from the observed peak, one step per evaluation at most.
#[derive(Clone, Debug)]
pub struct ScaleController {
    scale: Scale,
    samples_per_mv: i32,
    low_limit_coef: f32,
    hi_limit_coef: f32,
    step_down_debounce: u32,
    quiet_evaluations: u32,
    auto: bool,
}

impl ScaleController {
    pub fn new(config: &PlotConfig) -> Self {
        Self {
            scale: config.initial_scale(),
            samples_per_mv: config.samples_per_mv.max(1),
            low_limit_coef: config.low_limit_coef,
            hi_limit_coef: config.hi_limit_coef,
            step_down_debounce: config.step_down_debounce.max(1),
            quiet_evaluations: 0,
            auto: config.auto_scale,
        }
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn full_scale(&self) -> i32 {
        self.scale.full_scale(self.samples_per_mv)
    }

    pub fn samples_per_mv(&self) -> i32 {
        self.samples_per_mv
    }

    /// Manual override. Returns true if the scale changed.
    pub fn set_scale(&mut self, scale: Scale) -> bool {
        self.quiet_evaluations = 0;
        let changed = self.scale != scale;
        self.scale = scale;
        changed
    }

    pub fn set_auto(&mut self, auto: bool) {
        self.auto = auto;
        self.quiet_evaluations = 0;
    }

    pub fn is_auto(&self) -> bool {
        self.auto
    }

    /// Upper switching threshold in raw counts for the current scale.
    pub fn step_up_threshold(&self) -> f32 {
        self.hi_limit_coef * self.full_scale() as f32
    }

    /// Lower switching threshold in raw counts, `None` at the finest scale.
    pub fn step_down_threshold(&self) -> Option<f32> {
        self.scale
            .down()
            .map(|finer| self.low_limit_coef * finer.full_scale(self.samples_per_mv) as f32)
    }

    /// Judges raw samples against `baseline`. An empty window changes nothing.
    pub fn evaluate(&mut self, window: &[i16], baseline: i16) -> ScaleDecision {
        let peak = window
            .iter()
            .map(|&s| (s as i32 - baseline as i32).abs())
            .max();
        match peak {
            Some(peak) => self.evaluate_magnitude(peak),
            None => ScaleDecision::Stay,
        }
    }

    /// Judges compressed columns. Unset columns are ignored.
    pub fn evaluate_bars(&mut self, bars: &[Option<Bar>]) -> ScaleDecision {
        let peak = bars.iter().flatten().map(Bar::magnitude).max();
        match peak {
            Some(peak) => self.evaluate_magnitude(peak),
            None => ScaleDecision::Stay,
        }
    }

    /// Applies one evaluation cycle for a peak deviation in raw counts.
    pub fn evaluate_magnitude(&mut self, magnitude: i32) -> ScaleDecision {
        if !self.auto {
            return ScaleDecision::Stay;
        }
        let magnitude = magnitude as f32;
        if magnitude >= self.step_up_threshold() {
            self.quiet_evaluations = 0;
            return match self.scale.up() {
                Some(coarser) => {
                    log::debug!("scale {} -> {} (peak {magnitude})", self.scale, coarser);
                    self.scale = coarser;
                    ScaleDecision::StepUp
                }
                None => ScaleDecision::Stay,
            };
        }
        let Some(low) = self.step_down_threshold() else {
            self.quiet_evaluations = 0;
            return ScaleDecision::Stay;
        };
        if magnitude > low {
            self.quiet_evaluations = 0;
            return ScaleDecision::Stay;
        }
        self.quiet_evaluations += 1;
        if self.quiet_evaluations < self.step_down_debounce {
            return ScaleDecision::Stay;
        }
        self.quiet_evaluations = 0;
        match self.scale.down() {
            Some(finer) => {
                log::debug!("scale {} -> {} (peak {magnitude})", self.scale, finer);
                self.scale = finer;
                ScaleDecision::StepDown
            }
            None => ScaleDecision::Stay,
        }
    }
}
