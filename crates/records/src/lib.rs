pub mod entity;
pub mod normalize;
pub mod overrides;
pub mod priority;

pub use entity::*;
pub use normalize::*;
pub use overrides::*;
pub use priority::*;
