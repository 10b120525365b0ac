//! Core of the GDX transpiler.
//!
//! GDX is GDScript with JSX-like tags for building node trees. The
//! pipeline is:
//!
//!   source .gdx
//!     -> cursor + matcher  (backtracking match engine)
//!     -> lexer             (imports, declaration headers, tags)
//!     -> parser            (declarations pass, tree pass)
//!     -> codegen + rewrite (create_node(...) calls spliced into the source)
//!
//! Everything the lexer does not recognize is copied through untouched.
//! The crate performs no I/O; the CLI supplies sources and writes results.

// ---------------------------------------------------------------------
// Error handling and configuration
// ---------------------------------------------------------------------

pub mod error;
pub mod context;

// ---------------------------------------------------------------------
// Match engine
// ---------------------------------------------------------------------

pub mod cursor;
pub mod matcher;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;

// ---------------------------------------------------------------------
// Back-end: rendering and source rewriting
// ---------------------------------------------------------------------

pub mod codegen;
pub mod rewrite;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use context::ParseContext;
pub use error::ParseError;
pub use parser::{parse, transpile};
