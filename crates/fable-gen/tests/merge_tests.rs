//! Tests for merging a generated module into an existing one

use fable_gen::{ParseOptions, merge_programs, parse, print};
use oxc_allocator::Allocator;

fn merge(target_src: &str, addition_src: &str) -> String {
    let allocator = Allocator::default();
    let mut target = parse(&allocator, target_src, ParseOptions::tsx())
        .unwrap()
        .program;
    let addition = parse(&allocator, addition_src, ParseOptions::tsx())
        .unwrap()
        .program;
    merge_programs(&mut target, addition);
    print(&target)
}

#[test]
fn new_imports_are_added_before_statements() {
    let out = merge(
        "import a from 'a';\nexport default { x: 1 };",
        "import b from 'b';",
    );
    let a = out.find("from \"a\"").unwrap();
    let b = out.find("from \"b\"").unwrap();
    let export = out.find("export default").unwrap();
    assert!(a < export && b < export);
}

#[test]
fn imports_with_taken_bindings_are_skipped() {
    let out = merge("import a from 'a';", "import a from 'other';");
    assert!(out.contains("from \"a\""));
    assert!(!out.contains("other"));
}

#[test]
fn variables_dedupe_by_name() {
    let out = merge(
        "const shared = 1;\nexport default {};",
        "const shared = 2;\nconst fresh = 3;",
    );
    assert!(out.contains("const shared = 1;"));
    assert!(!out.contains("const shared = 2;"));
    assert!(out.contains("const fresh = 3;"));
}

#[test]
fn default_export_objects_merge_deeply() {
    let out = merge(
        "export default { parameters: { layout: 'padded' }, tags: ['a'] };",
        "export default { parameters: { docs: true }, tags: ['b'], addons: [] };",
    );
    assert!(out.contains("layout"));
    assert!(out.contains("docs"));
    assert!(out.contains("addons"));
    // arrays concatenate in order
    let a = out.find("\"a\"").unwrap();
    let b = out.find("\"b\"").unwrap();
    assert!(a < b);
}

#[test]
fn scalar_values_are_overwritten() {
    let out = merge(
        "export default { framework: 'old' };",
        "export default { framework: 'new' };",
    );
    assert!(out.contains("new"));
    assert!(!out.contains("old"));
}

#[test]
fn config_builder_wrappers_are_unwrapped() {
    let out = merge(
        "import { definePreview } from './preview';\nexport default definePreview({ tags: ['x'] });",
        "export default { tags: ['y'] };",
    );
    assert!(out.contains("definePreview"));
    let x = out.find("\"x\"").unwrap();
    let y = out.find("\"y\"").unwrap();
    assert!(x < y);
}

#[test]
fn missing_default_export_is_appended() {
    let out = merge("import a from 'a';", "export default { x: 1 };");
    assert!(out.contains("export default"));
}
