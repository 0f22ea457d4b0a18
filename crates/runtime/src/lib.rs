pub mod frame;
pub mod view;

pub use frame::*;
pub use view::*;
