use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::drivers::{GridStyle, PlotError, Rgb565, Scale};

/// Acquisition front-end sample rate (samples per second).
pub const AFE_DATA_RATE: u32 = 700;
/// Raw counts per millivolt.
pub const SAMPLES_PER_MV: i32 = 10;
/// Step down once the trace fits under this fraction of the next smaller scale.
pub const LOW_LIMIT_COEF: f32 = 0.82;
/// Step up once the trace reaches this fraction of the current scale.
pub const HI_LIMIT_COEF: f32 = 0.95;
/// Consecutive quiet evaluations needed before stepping down.
pub const STEP_DOWN_DEBOUNCE: u32 = 3;
/// Baseline smoothing: each sample moves the baseline by 1/2^shift of the error.
pub const BASELINE_SHIFT: u32 = 6;
/// Largest accepted counts-per-millivolt; keeps `10 mV` full scale inside `i32`.
pub const MAX_SAMPLES_PER_MV: i32 = i16::MAX as i32;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub samples_per_mv: i32,
    pub low_limit_coef: f32,
    pub hi_limit_coef: f32,
    pub step_down_debounce: u32,
    pub baseline_shift: u32,
    pub auto_scale: bool,
    /// Millivolts per division; clamped to the nearest supported scale.
    pub initial_scale_mv: u32,
    /// Ring capacity in samples. The plot sweeps the whole ring once per screen.
    pub capacity: usize,
    pub sample_rate_hz: u32,
    pub trace_color: u16,
    pub background_color: u16,
    pub show_grid: bool,
    pub grid_color: u16,
    pub marker_color: u16,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            samples_per_mv: SAMPLES_PER_MV,
            low_limit_coef: LOW_LIMIT_COEF,
            hi_limit_coef: HI_LIMIT_COEF,
            step_down_debounce: STEP_DOWN_DEBOUNCE,
            baseline_shift: BASELINE_SHIFT,
            auto_scale: true,
            initial_scale_mv: 1,
            // one second of signal per sweep
            capacity: AFE_DATA_RATE as usize,
            sample_rate_hz: AFE_DATA_RATE,
            trace_color: Rgb565::GREEN.0,
            background_color: Rgb565::BLACK.0,
            show_grid: true,
            grid_color: Rgb565::DARK_GRAY.0,
            marker_color: Rgb565::ORANGE.0,
        }
    }
}

impl PlotConfig {
    pub fn from_json(text: &str) -> Result<Self, PlotError> {
        let config: PlotConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlotError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), PlotError> {
        if self.capacity == 0 {
            return Err(PlotError::InvalidConfig("capacity must be greater than zero".into()));
        }
        if self.samples_per_mv <= 0 || self.samples_per_mv > MAX_SAMPLES_PER_MV {
            return Err(PlotError::InvalidConfig(format!(
                "samples_per_mv must lie in 1..={MAX_SAMPLES_PER_MV}, got {}",
                self.samples_per_mv
            )));
        }
        if self.sample_rate_hz == 0 {
            return Err(PlotError::InvalidConfig(
                "sample_rate_hz must be greater than zero".into(),
            ));
        }
        let coef_ok = |c: f32| c > 0.0 && c <= 1.0;
        if !coef_ok(self.low_limit_coef) || !coef_ok(self.hi_limit_coef) {
            return Err(PlotError::InvalidConfig(
                "hysteresis coefficients must lie in (0, 1]".into(),
            ));
        }
        if self.low_limit_coef >= self.hi_limit_coef {
            return Err(PlotError::InvalidConfig(format!(
                "low limit {} must be below high limit {}",
                self.low_limit_coef, self.hi_limit_coef
            )));
        }
        if self.baseline_shift > 15 {
            return Err(PlotError::InvalidConfig("baseline_shift must be at most 15".into()));
        }
        Ok(())
    }

    pub fn initial_scale(&self) -> Scale {
        Scale::nearest(self.initial_scale_mv)
    }

    pub fn trace_color(&self) -> Rgb565 {
        Rgb565(self.trace_color)
    }

    pub fn background_color(&self) -> Rgb565 {
        Rgb565(self.background_color)
    }

    /// `None` when the grid is switched off.
    pub fn grid_style(&self) -> Option<GridStyle> {
        self.show_grid.then(|| GridStyle {
            lines: Rgb565(self.grid_color),
            marker: Rgb565(self.marker_color),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_front_end_constants() {
        let config = PlotConfig::default();
        assert_eq!(config.capacity, 700);
        assert_eq!(config.samples_per_mv, 10);
        assert_eq!(config.initial_scale(), Scale::Mv1);
        config.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PlotConfig::from_json(r#"{ "capacity": 350, "initial_scale_mv": 3 }"#).unwrap();
        assert_eq!(config.capacity, 350);
        assert_eq!(config.hi_limit_coef, HI_LIMIT_COEF);
        // 3 mV is not a scale; nearest wins, ties go down
        assert_eq!(config.initial_scale(), Scale::Mv2);
    }

    #[test]
    fn inverted_hysteresis_is_rejected() {
        let err = PlotConfig::from_json(r#"{ "low_limit_coef": 0.96 }"#).unwrap_err();
        assert!(matches!(err, PlotError::InvalidConfig(_)));
    }

    #[test]
    fn oversized_samples_per_mv_is_rejected() {
        let err = PlotConfig::from_json(r#"{ "samples_per_mv": 1000000 }"#).unwrap_err();
        assert!(matches!(err, PlotError::InvalidConfig(_)));
        let config = PlotConfig::from_json(r#"{ "samples_per_mv": 32767 }"#).unwrap();
        assert_eq!(Scale::Mv10.full_scale(config.samples_per_mv), 327_670);
        assert_eq!(Scale::Mv10.full_scale(i32::MAX), i32::MAX);
    }

    #[test]
    fn grid_can_be_switched_off() {
        assert_eq!(
            PlotConfig::default().grid_style().map(|g| g.lines),
            Some(Rgb565::DARK_GRAY)
        );
        let config = PlotConfig::from_json(r#"{ "show_grid": false }"#).unwrap();
        assert_eq!(config.grid_style(), None);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = PlotConfig::from_json("{ capacity: ").unwrap_err();
        assert!(matches!(err, PlotError::Parse(_)));
    }
}
