//! Parser-facing interfaces
//!
//! The grammar lives outside this crate. What the lowering pass needs from
//! the parser side is collected here:
//! - `ast`: the closed set of node variants it consumes
//! - `source`: line access and definition ranges
//! - `scope`: lexical scopes and the parse environment

pub mod ast;
pub mod scope;
pub mod source;

pub use scope::{LexicalScope, ParseEnvironment};
pub use source::{extend_to_closing_line, Source, SourceRange};
