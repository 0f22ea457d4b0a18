//! Globe card widget: ties acquisition, normalization, placement and card
//! rendering to one explicitly owned per-instance context.

pub mod config;
pub mod context;
pub mod paging;
pub mod selection;

pub use config::*;
pub use context::*;
pub use paging::*;
pub use selection::*;
