//! Tests for source regeneration and the inline-meta rewrite

use fable_csf::{CsfFile, CsfOptions, read_csf};
use oxc_allocator::Allocator;

#[test]
fn preserving_output_is_identity_without_transforms() {
    let source = "// header\nimport x from './x';\n\nexport default { title: 'T' };\n\nexport const A = {};\n";
    let allocator = Allocator::default();
    let csf = CsfFile::parse(&allocator, source, CsfOptions::default()).unwrap();
    assert_eq!(csf.to_source_preserving(), source);
}

#[test]
fn inline_meta_is_hoisted_into_a_binding() {
    let source = "import x from './x';\nexport default { title: 'T' };\nexport const A = {};\n";
    let allocator = Allocator::default();
    let csf = CsfFile::parse(
        &allocator,
        source,
        CsfOptions::new().with_transform_inline_meta(true),
    )
    .unwrap();

    // the model is unaffected by the rewrite
    assert_eq!(csf.meta().title.as_deref(), Some("T"));
    assert_eq!(csf.stories().len(), 1);

    let output = csf.to_source_preserving();
    assert!(output.contains("const _meta"));
    assert!(output.contains("export default _meta;"));
    assert!(!output.contains("export default {"));
    // untouched statements keep their original text
    assert!(output.contains("import x from './x';"));
    assert!(output.contains("export const A = {};"));
}

#[test]
fn hoisted_meta_name_avoids_collisions() {
    let source = "const _meta = 1;\nexport default { title: 'T' };\nexport const A = {};\n";
    let allocator = Allocator::default();
    let csf = CsfFile::parse(
        &allocator,
        source,
        CsfOptions::new().with_transform_inline_meta(true),
    )
    .unwrap();
    let output = csf.to_source_preserving();
    assert!(output.contains("const _meta1"));
    assert!(output.contains("export default _meta1;"));
}

#[test]
fn transform_leaves_bound_metas_alone() {
    let source = "const meta = { title: 'T' };\nexport default meta;\nexport const A = {};\n";
    let allocator = Allocator::default();
    let csf = CsfFile::parse(
        &allocator,
        source,
        CsfOptions::new().with_transform_inline_meta(true),
    )
    .unwrap();
    assert_eq!(csf.to_source_preserving(), source);
}

#[test]
fn transform_leaves_wrapped_identifier_metas_alone() {
    let source =
        "const meta = { title: 'T' };\nexport default meta satisfies Meta;\nexport const A = {};\n";
    let allocator = Allocator::default();
    let csf = CsfFile::parse(
        &allocator,
        source,
        CsfOptions::new().with_transform_inline_meta(true),
    )
    .unwrap();
    assert_eq!(csf.meta().title.as_deref(), Some("T"));
    assert_eq!(csf.stories().len(), 1);
    assert_eq!(csf.to_source_preserving(), source);
}

#[test]
fn wrapped_inline_meta_is_still_hoisted() {
    let source = "export default { title: 'T' } satisfies Meta;\nexport const A = {};\n";
    let allocator = Allocator::default();
    let csf = CsfFile::parse(
        &allocator,
        source,
        CsfOptions::new().with_transform_inline_meta(true),
    )
    .unwrap();
    let output = csf.to_source_preserving();
    assert!(output.contains("const _meta"));
    assert!(output.contains("export default _meta;"));
}

#[test]
fn titles_survive_reserialization() {
    let source = "export default { title: 'Example/Button' };\nexport const Primary = {};\n";
    let allocator = Allocator::default();
    let csf = CsfFile::parse(&allocator, source, CsfOptions::default()).unwrap();
    assert_eq!(csf.meta().title.as_deref(), Some("Example/Button"));

    let preserved = csf.to_source_preserving();
    let regenerated = csf.to_source();

    let allocator2 = Allocator::default();
    let reparsed = CsfFile::parse(&allocator2, &preserved, CsfOptions::default()).unwrap();
    assert_eq!(reparsed.meta().title.as_deref(), Some("Example/Button"));

    let allocator3 = Allocator::default();
    let reparsed = CsfFile::parse(&allocator3, &regenerated, CsfOptions::default()).unwrap();
    assert_eq!(reparsed.meta().title.as_deref(), Some("Example/Button"));
    assert_eq!(reparsed.stories()[0].id, "example-button--primary");
}

#[test]
fn read_csf_parses_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Button.stories.ts");
    std::fs::write(
        &path,
        "export default { title: 'Example/Button' };\nexport const Primary = {};\n",
    )
    .unwrap();

    let allocator = Allocator::default();
    let csf = read_csf(&allocator, &path, CsfOptions::default()).unwrap();
    assert_eq!(csf.stories()[0].id, "example-button--primary");
    assert_eq!(
        csf.options().file_name.as_deref(),
        Some(path.display().to_string().as_str())
    );
}

#[test]
fn read_csf_reports_missing_files() {
    let allocator = Allocator::default();
    let err = read_csf(
        &allocator,
        std::path::Path::new("/no/such/file.stories.ts"),
        CsfOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("failed to read source"));
}
