//! Parser façade for reading JavaScript/TypeScript source code
//!
//! Provides a unified interface for parsing source text into ASTs that the
//! rest of the workspace can inspect, transform and regenerate.

use crate::error::{GenError, Result};
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Parse options for reading source code
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Source type (JavaScript, TypeScript, JSX, TSX)
    pub source_type: SourceType,
    /// Allow parsing errors (returns partial AST)
    pub allow_errors: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        // Story files are routinely typed JSX, and TSX is a superset of the
        // other module flavors we care about.
        Self {
            source_type: SourceType::tsx(),
            allow_errors: false,
        }
    }
}

impl ParseOptions {
    /// Create parse options from a file path (auto-detects source type)
    pub fn from_path(path: &str) -> Self {
        Self {
            source_type: SourceType::from_path(path).unwrap_or(SourceType::tsx()),
            allow_errors: false,
        }
    }

    /// Create parse options for TypeScript
    pub fn typescript() -> Self {
        Self {
            source_type: SourceType::ts(),
            allow_errors: false,
        }
    }

    /// Create parse options for JSX
    pub fn jsx() -> Self {
        Self {
            source_type: SourceType::jsx(),
            allow_errors: false,
        }
    }

    /// Create parse options for TSX
    pub fn tsx() -> Self {
        Self {
            source_type: SourceType::tsx(),
            allow_errors: false,
        }
    }
}

/// Parse diagnostic information
#[derive(Debug, Clone)]
pub struct ParseDiagnostic {
    /// Error message
    pub message: String,
}

/// Parsed program with AST and metadata
pub struct ParsedProgram<'a> {
    /// The parsed AST program
    pub program: oxc_ast::ast::Program<'a>,
    /// Parse diagnostics (errors/warnings)
    pub diagnostics: Vec<ParseDiagnostic>,
    /// Original source text
    pub source_text: &'a str,
    /// Allocator used for AST nodes
    pub allocator: &'a Allocator,
}

impl<'a> ParsedProgram<'a> {
    /// Get the program AST
    pub fn ast(&self) -> &oxc_ast::ast::Program<'a> {
        &self.program
    }

    /// Get mutable access to the program AST
    pub fn ast_mut(&mut self) -> &mut oxc_ast::ast::Program<'a> {
        &mut self.program
    }

    /// Get the allocator for creating new AST nodes
    pub fn allocator(&self) -> &'a Allocator {
        self.allocator
    }

    /// Check if parsing had errors
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Parse source code into an AST
///
/// The allocator must outlive the returned program.
pub fn parse<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    options: ParseOptions,
) -> Result<ParsedProgram<'a>> {
    let parser = Parser::new(allocator, source, options.source_type);
    let result = parser.parse();

    let diagnostics: Vec<ParseDiagnostic> = result
        .errors
        .iter()
        .map(|err| ParseDiagnostic {
            message: format!("{err:?}"),
        })
        .collect();

    if !options.allow_errors && !diagnostics.is_empty() {
        let messages: Vec<String> = diagnostics.iter().map(|d| d.message.clone()).collect();
        return Err(GenError::parse_error(&messages));
    }

    Ok(ParsedProgram {
        program: result.program,
        diagnostics,
        source_text: source,
        allocator,
    })
}
