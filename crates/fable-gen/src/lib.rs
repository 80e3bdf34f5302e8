//! Parse, print and merge primitives for JavaScript/TypeScript modules
//!
//! This crate wraps the OXC (Oxidation Compiler) toolchain with the small
//! surface the rest of the workspace needs:
//!
//! - a parser façade with source-type auto-detection and aggregated
//!   diagnostics ([`parse`], [`ParseOptions`]);
//! - fresh-format printing through the OXC codegen ([`print`]);
//! - diff-preserving printing that keeps untouched statements byte-identical
//!   to the original source ([`print_preserving`]);
//! - a structural module merge for folding generated configuration into an
//!   existing module ([`merge_programs`]).
//!
//! # Example
//!
//! ```rust
//! use fable_gen::{Allocator, ParseOptions, parse, print};
//!
//! let allocator = Allocator::default();
//! let parsed = parse(&allocator, "export const answer = 42;", ParseOptions::default())?;
//! let code = print(parsed.ast());
//! assert!(code.contains("answer"));
//! # Ok::<(), fable_gen::GenError>(())
//! ```

mod error;
mod merge;
mod parser;
mod print;

pub use error::{GenError, Result};
pub use merge::merge_programs;
pub use parser::{ParseDiagnostic, ParseOptions, ParsedProgram, parse};
pub use print::{print, print_preserving, print_statement};

// Re-export commonly used OXC types for convenience
pub use oxc_allocator::Allocator;
pub use oxc_span::{GetSpan, SPAN, SourceType, Span};
