//! Flea-market map engine: filtering, proximity grouping, Dutch date parsing and
//! the selection state that keeps a map layer and a sidebar list in step.

pub mod api;
pub mod config;
pub mod dates;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod geo;
pub mod loader;
pub mod selection;
pub mod state;
pub mod types;
pub mod view;

pub use error::{AppError, Result};
pub use state::Session;
