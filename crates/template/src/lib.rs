//! Card template micro-language.
//!
//! Supports `{{path}}` substitution, `{{#if path}}..{{/if}}` and
//! `{{#each path}}..{{/each}}` with `@index`, `@first` and `@last`. Output is
//! not escaped. Tags that do not form a well-nested block are kept as literal
//! text.

pub mod parse;
pub mod render;
pub mod token;
pub mod value;

pub use parse::*;
pub use render::*;
pub use token::*;
pub use value::*;
