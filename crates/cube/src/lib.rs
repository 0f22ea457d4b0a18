//! Column-limited cube acquisition.
//!
//! The query host serves rectangular windows of a cube but may clip the
//! number of columns per request. This crate fetches a full-width window,
//! patches any missing columns with placeholder cells, and tracks which fetch
//! cycle a result belongs to.

pub mod acquirer;
pub mod cache;
pub mod cell;
pub mod field;
pub mod protocol;
pub mod request;
pub mod source;

pub use acquirer::*;
pub use cache::*;
pub use cell::*;
pub use field::*;
pub use protocol::*;
pub use request::*;
pub use source::*;
