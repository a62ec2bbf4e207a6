pub mod metrics;
pub mod models;
pub mod walk_forward;

pub use metrics::EvaluationMetrics;
pub use models::*;
pub use walk_forward::{run_backtest, WalkForwardBacktest};
