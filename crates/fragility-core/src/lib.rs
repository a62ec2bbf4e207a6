pub mod error;
pub mod features;
pub mod loader;
pub mod stats;
pub mod types;

pub use error::*;
pub use features::*;
pub use loader::{load_panel, load_panel_from_reader, load_portfolio, load_portfolio_from_reader};
pub use types::*;
