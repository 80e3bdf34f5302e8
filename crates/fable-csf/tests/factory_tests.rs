//! Tests for the factory form: `config.meta({...})` metas and
//! `meta.story({...})` exports

use fable_csf::{CsfError, CsfFile, CsfOptions};
use oxc_allocator::Allocator;

#[test]
fn factory_meta_and_stories() {
    let source = r#"
import config from '#.storybook/preview';
const meta = config.meta({ title: 'Example/Button' });
export const Primary = meta.story({ args: { label: 'Click' } });
export const WithPlay = meta.story({ play: async ({ mount }) => {} });
"#;
    let allocator = Allocator::default();
    let csf = CsfFile::parse(&allocator, source, CsfOptions::default()).unwrap();
    assert_eq!(csf.meta().title.as_deref(), Some("Example/Button"));
    assert_eq!(csf.stories().len(), 2);
    let primary = &csf.stories()[0];
    assert!(primary.stats.factory);
    assert_eq!(primary.id, "example-button--primary");
    let with_play = &csf.stories()[1];
    assert!(with_play.stats.play);
    assert!(with_play.stats.mount);
    assert!(with_play.tags.iter().any(|t| t == "play-fn"));
}

#[test]
fn factory_meta_with_relative_preview_path() {
    let source = r#"
import preview from '../../.storybook/preview.tsx';
const meta = preview.meta({ title: 'T' });
export const A = meta.story({});
"#;
    let allocator = Allocator::default();
    let csf = CsfFile::parse(&allocator, source, CsfOptions::default()).unwrap();
    assert!(csf.stories()[0].stats.factory);
}

#[test]
fn factory_story_without_factory_meta() {
    let source = r#"
export default { title: 'T' };
export const A = meta.story({});
"#;
    let allocator = Allocator::default();
    let err = CsfFile::parse(&allocator, source, CsfOptions::default()).unwrap_err();
    assert!(matches!(err, CsfError::MixedFactory { .. }));
}

#[test]
fn plain_story_in_factory_module() {
    let source = r#"
import config from '#.storybook/preview';
const meta = config.meta({ title: 'T' });
export const A = meta.story({});
export const B = {};
"#;
    let allocator = Allocator::default();
    let err = CsfFile::parse(&allocator, source, CsfOptions::default()).unwrap_err();
    assert!(matches!(err, CsfError::MixedFactory { .. }));
}

#[test]
fn meta_from_invalid_path_is_rejected() {
    let source = r#"
import config from 'some-package/config';
const meta = config.meta({ title: 'T' });
export const A = meta.story({});
"#;
    let allocator = Allocator::default();
    let err = CsfFile::parse(&allocator, source, CsfOptions::default()).unwrap_err();
    assert!(matches!(err, CsfError::BadMeta { .. }));
}

#[test]
fn factory_meta_plus_default_export_is_multiple_meta() {
    let source = r#"
import config from '#.storybook/preview';
const meta = config.meta({ title: 'T' });
export default { title: 'Other' };
export const A = meta.story({});
"#;
    let allocator = Allocator::default();
    let err = CsfFile::parse(&allocator, source, CsfOptions::default()).unwrap_err();
    assert!(matches!(err, CsfError::MultipleMeta { .. }));
}

#[test]
fn unrelated_member_calls_are_ignored() {
    let source = r#"
import utils from './utils';
export default { title: 'T' };
const data = utils.meta;
export const A = {};
"#;
    let allocator = Allocator::default();
    let csf = CsfFile::parse(&allocator, source, CsfOptions::default()).unwrap();
    assert_eq!(csf.stories().len(), 1);
}
