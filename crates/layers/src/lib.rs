//! Per-frame card layout: projection, visibility and card markup.

pub mod cards;
pub mod placement;
pub mod projection;

pub use cards::*;
pub use placement::*;
pub use projection::*;
