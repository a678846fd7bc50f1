use thiserror::Error;
/// Failures at the crate's edges. The drawing core itself never fails.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("snapshot size {width}x{height} is empty")]
    EmptySnapshot { width: u32, height: u32 },
    #[error("failed to render snapshot: {0}")]
    Snapshot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for PlotError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        PlotError::Snapshot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for PlotError {
    fn from(value: image::ImageError) -> Self {
        PlotError::Snapshot(value.to_string())
    }
}
