//! Tests for the index-input projection and its wire shape

use fable_csf::{CsfFile, CsfOptions};
use oxc_allocator::Allocator;

#[test]
fn index_inputs_cover_every_story() {
    let source = r#"
import { Button } from './Button';
export default { title: 'Example/Button', component: Button, tags: ['autodocs'] };
export const Primary = {};
export const Secondary = { play: async () => {} };
"#;
    let allocator = Allocator::default();
    let csf = CsfFile::parse(
        &allocator,
        source,
        CsfOptions::new().with_file_name("src/Button.stories.tsx"),
    )
    .unwrap();
    let inputs = csf.index_inputs().unwrap();
    assert_eq!(inputs.len(), 2);

    let primary = &inputs[0];
    assert_eq!(primary.kind, "story");
    assert_eq!(primary.import_path, "src/Button.stories.tsx");
    assert_eq!(primary.raw_component_path.as_deref(), Some("./Button"));
    assert_eq!(primary.title, "Example/Button");
    assert_eq!(primary.id, "example-button--primary");
    assert_eq!(primary.tags, ["autodocs"]);

    let secondary = &inputs[1];
    assert!(secondary.stats.play);
    assert!(secondary.tags.iter().any(|t| t == "play-fn"));
}

#[test]
fn index_inputs_require_a_file_name() {
    let source = "export default { title: 'T' };\nexport const A = {};\n";
    let allocator = Allocator::default();
    let csf = CsfFile::parse(&allocator, source, CsfOptions::default()).unwrap();
    let err = csf.index_inputs().unwrap_err();
    assert!(err.to_string().contains("without a fileName"));
}

#[test]
fn index_inputs_serialize_with_wire_field_names() {
    let source = "export default { title: 'T' };\nexport const SomeStory = {};\n";
    let allocator = Allocator::default();
    let csf = CsfFile::parse(
        &allocator,
        source,
        CsfOptions::new().with_file_name("a.stories.ts"),
    )
    .unwrap();
    let inputs = csf.index_inputs().unwrap();
    let json = serde_json::to_value(&inputs[0]).unwrap();

    assert_eq!(json["type"], "story");
    assert_eq!(json["importPath"], "a.stories.ts");
    assert_eq!(json["exportName"], "SomeStory");
    assert_eq!(json["name"], "Some Story");
    assert_eq!(json["__id"], "t--some-story");
    assert_eq!(json["__stats"]["storyFn"], false);
    assert_eq!(json["__stats"]["moduleMock"], false);
    assert!(json.get("rawComponentPath").is_none());
    assert!(json.get("metaId").is_none());
}
