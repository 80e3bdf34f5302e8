//! Static analysis for Component Story Format (CSF) modules
//!
//! Parses a story module without executing it and produces a validated
//! model: one meta, a list of stories with deterministic ids and display
//! names, per-story usage stats, and index entries for catalog tooling.
//! Supports classic CSF (default-export meta plus named exports) and the
//! factory form (`config.meta({...})` with `meta.story({...})` exports).
//!
//! ```no_run
//! use fable_csf::{CsfFile, CsfOptions};
//! use fable_gen::Allocator;
//!
//! # fn main() -> fable_csf::Result<()> {
//! let allocator = Allocator::default();
//! let source = r#"
//!     export default { title: 'Example/Button' };
//!     export const Primary = { args: { label: 'Click' } };
//! "#;
//! let csf = CsfFile::parse(
//!     &allocator,
//!     source,
//!     CsfOptions::new().with_file_name("Button.stories.ts"),
//! )?;
//! assert_eq!(csf.stories()[0].id, "example-button--primary");
//! # Ok(())
//! # }
//! ```

pub mod annotations;
mod csf;
mod error;
pub mod ids;
mod index;
pub mod vars;

pub use csf::{CsfFile, CsfOptions, MakeTitle, Meta, ParameterValue, Story, read_csf};
pub use error::{CsfError, LineIndex, Location, Result};
pub use ids::{IncludeExcludeList, is_export_story, sanitize, story_name_from_export, to_id};
pub use index::{IndexInput, IndexInputStats};
