//! Tests for whole-program and source-preserving printing

use fable_gen::{ParseOptions, parse, print, print_preserving, print_statement};
use oxc_allocator::Allocator;

#[test]
fn print_regenerates_parseable_code() {
    let source = r#"
import { Button } from './Button';

export default { title: 'Example/Button', component: Button };

export const Primary = { args: { label: 'Click' } };
"#;
    let allocator = Allocator::default();
    let parsed = parse(&allocator, source, ParseOptions::tsx()).unwrap();
    let code = print(&parsed.program);

    let allocator2 = Allocator::default();
    let reparsed = parse(&allocator2, &code, ParseOptions::tsx()).unwrap();
    assert_eq!(parsed.program.body.len(), reparsed.program.body.len());
    assert!(code.contains("Example/Button"));
}

#[test]
fn print_preserving_is_identity_without_edits() {
    let source = "// leading comment\nimport x from 'y';\n\n// story\nexport const A = {};\n";
    let allocator = Allocator::default();
    let parsed = parse(&allocator, source, ParseOptions::tsx()).unwrap();
    let output = print_preserving(&parsed.program, source, &[]);
    assert_eq!(output, source);
}

#[test]
fn print_preserving_skips_replaced_spans() {
    let source = "const keep = 1;\nconst drop = 2;\nconst tail = 3;\n";
    let allocator = Allocator::default();
    let mut parsed = parse(&allocator, source, ParseOptions::tsx()).unwrap();

    // simulate a transform that removed the middle statement
    let removed_span = fable_gen::GetSpan::span(&parsed.program.body[1]);
    let mut index = 0;
    parsed.program.body.retain(|_| {
        let keep = index != 1;
        index += 1;
        keep
    });
    let output = print_preserving(&parsed.program, source, &[removed_span]);

    assert!(output.contains("const keep = 1;"));
    assert!(output.contains("const tail = 3;"));
    assert!(!output.contains("drop"));
}

#[test]
fn print_statement_emits_one_statement() {
    let source = "export const Primary = { args: {} };";
    let allocator = Allocator::default();
    let parsed = parse(&allocator, source, ParseOptions::tsx()).unwrap();
    let code = print_statement(&parsed.program.body[0]);
    assert!(code.contains("export const Primary"));
}

#[test]
fn parse_rejects_broken_source() {
    let allocator = Allocator::default();
    let result = parse(&allocator, "export const = ;", ParseOptions::tsx());
    assert!(result.is_err());
}
