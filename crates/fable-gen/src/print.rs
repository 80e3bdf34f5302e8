//! Printing for parsed and transformed programs
//!
//! Two strategies: `print` reformats the whole program through the OXC
//! codegen, while `print_preserving` splices original source slices for
//! top-level statements whose spans are intact and only code-generates
//! statements that were synthesized by a transform (empty spans). The
//! second keeps human-authored files diffable after a targeted rewrite.

use oxc_allocator::{Allocator, CloneIn};
use oxc_ast::AstBuilder;
use oxc_ast::ast::{Program, Statement};
use oxc_codegen::Codegen;
use oxc_span::{GetSpan, SPAN, SourceType, Span};

/// Print a program from scratch through the codegen.
pub fn print(program: &Program<'_>) -> String {
    Codegen::new().build(program).code
}

/// Print a program over its original source text.
///
/// Statements with intact spans are emitted as the exact source slice,
/// including the text between them (comments, blank lines). Statements with
/// empty spans are code-generated. `replaced` lists spans of original
/// statements a transform removed or rewrote; their text is skipped when
/// emitting inter-statement gaps so it cannot leak back into the output.
pub fn print_preserving(program: &Program<'_>, source: &str, replaced: &[Span]) -> String {
    let mut replaced: Vec<Span> = replaced.to_vec();
    replaced.sort_by_key(|s| s.start);

    let mut out = String::new();
    let mut cursor: u32 = 0;
    for stmt in &program.body {
        let span = stmt.span();
        if span.start == span.end {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&print_statement(stmt));
        } else {
            emit_gap(&mut out, source, cursor, span.start, &replaced);
            out.push_str(&source[span.start as usize..span.end as usize]);
            cursor = span.end;
        }
    }
    emit_gap(&mut out, source, cursor, source.len() as u32, &replaced);
    out
}

/// Code-generate a single statement in isolation.
pub fn print_statement(stmt: &Statement<'_>) -> String {
    let allocator = Allocator::default();
    let ast = AstBuilder::new(&allocator);
    let stmt = stmt.clone_in(&allocator);
    let program = ast.program(
        SPAN,
        SourceType::tsx(),
        "",
        ast.vec(),
        None,
        ast.vec(),
        ast.vec1(stmt),
    );
    Codegen::new().build(&program).code
}

// Emits source[from..to] minus any portion covered by a replaced span.
// `replaced` must be sorted by start offset.
fn emit_gap(out: &mut String, source: &str, from: u32, to: u32, replaced: &[Span]) {
    let mut pos = from;
    for r in replaced {
        if r.end <= pos || r.start >= to {
            continue;
        }
        if r.start > pos {
            out.push_str(&source[pos as usize..r.start as usize]);
        }
        pos = pos.max(r.end);
        if pos >= to {
            return;
        }
    }
    if pos < to {
        out.push_str(&source[pos as usize..to as usize]);
    }
}
