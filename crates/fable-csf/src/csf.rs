//! The CSF module model builder
//!
//! One [`CsfFile`] instance analyzes exactly one module: a single pass over
//! the top-level statements accumulates meta and story candidates plus their
//! pending annotations, and a post-pass reconciles everything once the whole
//! module has been seen (annotations may legally arrive after the story they
//! belong to). The instance holds no process-wide state, so callers are free
//! to parse many modules on independent threads.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, ArrayExpressionElement, AssignmentExpression, AssignmentTarget, BindingPatternKind,
    CallExpression, Declaration, ExportDefaultDeclaration, ExportDefaultDeclarationKind,
    ExportNamedDeclaration, Expression, FormalParameters, ImportDeclaration,
    ImportDeclarationSpecifier, ModuleExportName, ObjectExpression, ObjectPropertyKind, Program,
    PropertyKey, Statement, VariableDeclaration,
};
use oxc_ast_visit::{Visit, walk};
use oxc_span::{GetSpan, SPAN, Span};
use rustc_hash::{FxHashMap, FxHashSet};

use fable_gen::ParseOptions;

use crate::annotations;
use crate::error::{CsfError, LineIndex, Location, Result};
use crate::ids::{IncludeExcludeList, is_export_story, story_name_from_export, to_id};
use crate::index::IndexInputStats;
use crate::vars::{find_var_initializer, resolve_expression, unwrap_expression};

/// Title-resolution callback: receives the raw title from the module (if
/// any) and returns the effective title. Lets the caller inject project-wide
/// prefixing conventions or derive a default title from the file name.
pub type MakeTitle = Box<dyn Fn(Option<String>) -> Option<String> + Send + Sync>;

/// Options controlling a single [`CsfFile::parse`] run.
pub struct CsfOptions {
    /// Path of the module, used for source-type detection, index inputs and
    /// error reporting.
    pub file_name: Option<String>,
    /// Title-resolution callback, applied once in the post-pass.
    pub make_title: MakeTitle,
    /// Rewrite an inline `export default {...}` meta into a named `const`
    /// binding plus `export default` of that binding.
    pub transform_inline_meta: bool,
}

impl Default for CsfOptions {
    fn default() -> Self {
        Self {
            file_name: None,
            make_title: Box::new(|title| title),
            transform_inline_meta: false,
        }
    }
}

impl CsfOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_make_title(
        mut self,
        make_title: impl Fn(Option<String>) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.make_title = Box::new(make_title);
        self
    }

    pub fn with_transform_inline_meta(mut self, enabled: bool) -> Self {
        self.transform_inline_meta = enabled;
        self
    }
}

/// The component-level configuration declared once per module.
#[derive(Debug, Default)]
pub struct Meta {
    pub id: Option<String>,
    pub title: Option<String>,
    /// Verbatim source text of the `component` expression.
    pub component: Option<String>,
    /// Import source path when `component` references an imported binding.
    pub component_path: Option<String>,
    pub include_stories: Option<IncludeExcludeList>,
    pub exclude_stories: Option<IncludeExcludeList>,
    /// Ordered, duplicates allowed.
    pub tags: Vec<String>,
    /// Spans of the meta object's property values, keyed by property name.
    pub raw_annotations: IndexMap<String, Span>,
}

/// A computed parameter on a finished story.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Bool(bool),
    String(String),
    /// Opaque pass-through: the span of the original expression.
    Raw(Span),
}

/// One finished story export.
#[derive(Debug)]
pub struct Story {
    pub export_name: String,
    pub id: String,
    pub name: String,
    /// Present only for re-export forms (`export { X as Y }`).
    pub local_name: Option<String>,
    pub parameters: IndexMap<String, ParameterValue>,
    /// Meta tags concatenated with story tags, never deduplicated.
    pub tags: Vec<String>,
    pub stats: IndexInputStats,
    /// Spans of the story's annotation values, keyed by annotation name.
    pub raw_annotations: IndexMap<String, Span>,
}

/// A parsed and validated CSF module.
pub struct CsfFile<'a> {
    options: CsfOptions,
    source: &'a str,
    program: Program<'a>,
    meta: Meta,
    stories: Vec<Story>,
    imports: Vec<String>,
    replaced_spans: Vec<Span>,
}

impl<'a> CsfFile<'a> {
    /// Parse and validate one module. The allocator must outlive the
    /// returned file; any format violation aborts the whole parse.
    pub fn parse(allocator: &'a Allocator, source: &'a str, options: CsfOptions) -> Result<Self> {
        let parse_options = match options.file_name.as_deref() {
            Some(path) => ParseOptions::from_path(path),
            None => ParseOptions::default(),
        };
        let parsed = fable_gen::parse(allocator, source, parse_options).map_err(|err| {
            CsfError::Parse {
                file_name: options.file_name.clone(),
                message: err.to_string(),
            }
        })?;
        let mut program = parsed.program;
        let lines = LineIndex::new(source);

        let mut replaced_spans = Vec::new();
        if options.transform_inline_meta {
            loop {
                let replaced = rewrite_inline_meta(allocator, &mut program)?;
                if replaced.is_empty() {
                    break;
                }
                replaced_spans.extend(replaced);
            }
        }

        let mut detector = StoriesOfDetector::default();
        detector.visit_program(&program);
        if let Some(span) = detector.span {
            return Err(CsfError::invalid(
                "unexpected `storiesOf` usage: the storiesOf API is no longer supported",
                Some(lines.location(source, span.start)),
            ));
        }

        let model = {
            let ctx = Ctx {
                body: &program.body,
                source,
                lines: &lines,
            };
            let mut builder = CsfBuilder::default();
            for stmt in ctx.body {
                builder.on_statement(stmt, &ctx)?;
            }
            builder.finish(&options, &ctx)?
        };
        tracing::debug!(
            file = options.file_name.as_deref().unwrap_or("<memory>"),
            stories = model.stories.len(),
            "parsed CSF module"
        );

        Ok(Self {
            options,
            source,
            program,
            meta: model.meta,
            stories: model.stories,
            imports: model.imports,
            replaced_spans,
        })
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// Raw import sources in declaration order.
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn options(&self) -> &CsfOptions {
        &self.options
    }

    pub fn program(&self) -> &Program<'a> {
        &self.program
    }

    /// Regenerate source text with fresh formatting.
    pub fn to_source(&self) -> String {
        fable_gen::print(&self.program)
    }

    /// Regenerate source text, keeping statements the builder did not touch
    /// byte-identical to the original.
    pub fn to_source_preserving(&self) -> String {
        fable_gen::print_preserving(&self.program, self.source, &self.replaced_spans)
    }
}

// The options hold a boxed callback, so Debug is written by hand over the
// summarizable parts.
impl fmt::Debug for CsfFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsfFile")
            .field("file_name", &self.options.file_name)
            .field("meta", &self.meta)
            .field("stories", &self.stories)
            .field("imports", &self.imports)
            .finish_non_exhaustive()
    }
}

/// Read a module from disk and parse it. The file name is recorded in the
/// options so `index_inputs` works out of the box.
pub fn read_csf<'a>(
    allocator: &'a Allocator,
    path: &Path,
    options: CsfOptions,
) -> Result<CsfFile<'a>> {
    let text = std::fs::read_to_string(path).map_err(|error| CsfError::Io {
        path: path.to_path_buf(),
        error,
    })?;
    let source = allocator.alloc_str(&text);
    let mut options = options;
    if options.file_name.is_none() {
        options.file_name = Some(path.display().to_string());
    }
    CsfFile::parse(allocator, source, options)
}

// Shared read-only context threaded through the traversal.
struct Ctx<'a, 'b> {
    body: &'b [Statement<'a>],
    source: &'b str,
    lines: &'b LineIndex,
}

impl Ctx<'_, '_> {
    fn location(&self, span: Span) -> Option<Location> {
        Some(self.lines.location(self.source, span.start))
    }
}

// A story candidate discovered during the traversal, keyed by export name
// in the builder map and finalized in the post-pass.
struct StoryDecl<'a, 'b> {
    local_name: Option<String>,
    init: Option<&'b Expression<'a>>,
    // Arity of an `export function` story declaration.
    fn_param_count: Option<usize>,
    is_factory: bool,
}

#[derive(Default)]
struct CsfBuilder<'a, 'b> {
    meta: Option<Meta>,
    meta_is_factory: bool,
    // Name of the variable holding the meta, when the meta was introduced
    // through a binding rather than an inline default export.
    meta_variable: Option<String>,
    meta_annotations: IndexMap<String, &'b Expression<'a>>,
    stories: IndexMap<String, StoryDecl<'a, 'b>>,
    // Pending annotations keyed by export name; entries may precede the
    // story's own declaration.
    annotations: FxHashMap<String, IndexMap<String, &'b Expression<'a>>>,
    named_exports_order: Option<Vec<String>>,
    order_span: Option<Span>,
    imports: Vec<String>,
    import_bindings: FxHashMap<String, String>,
}

struct BuiltModel {
    meta: Meta,
    stories: Vec<Story>,
    imports: Vec<String>,
}

impl<'a, 'b> CsfBuilder<'a, 'b> {
    fn on_statement(&mut self, stmt: &'b Statement<'a>, ctx: &Ctx<'a, 'b>) -> Result<()> {
        match stmt {
            Statement::ImportDeclaration(import) => self.on_import(import),
            Statement::ExportDefaultDeclaration(export) => self.on_export_default(export, ctx),
            Statement::ExportNamedDeclaration(export) => self.on_export_named(export, ctx),
            Statement::VariableDeclaration(var) => self.on_variable(var, ctx),
            Statement::ExpressionStatement(stmt) => self.on_expression(&stmt.expression, ctx),
            _ => Ok(()),
        }
    }

    fn on_import(&mut self, import: &'b ImportDeclaration<'a>) -> Result<()> {
        let source_path = import.source.value.to_string();
        if let Some(specifiers) = &import.specifiers {
            for spec in specifiers {
                let local = match spec {
                    ImportDeclarationSpecifier::ImportSpecifier(named) => &named.local,
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => &default.local,
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(ns) => &ns.local,
                };
                self.import_bindings
                    .insert(local.name.to_string(), source_path.clone());
            }
        }
        self.imports.push(source_path);
        Ok(())
    }

    fn on_export_default(
        &mut self,
        export: &'b ExportDefaultDeclaration<'a>,
        ctx: &Ctx<'a, 'b>,
    ) -> Result<()> {
        let span = export.span;
        match &export.declaration {
            ExportDefaultDeclarationKind::ObjectExpression(obj) => {
                self.set_meta_object(obj, span, ctx)
            }
            ExportDefaultDeclarationKind::TSAsExpression(e) => {
                self.capture_meta_expression(&e.expression, span, ctx)
            }
            ExportDefaultDeclarationKind::TSSatisfiesExpression(e) => {
                self.capture_meta_expression(&e.expression, span, ctx)
            }
            ExportDefaultDeclarationKind::ParenthesizedExpression(e) => {
                self.capture_meta_expression(&e.expression, span, ctx)
            }
            ExportDefaultDeclarationKind::Identifier(ident) => {
                self.capture_meta_identifier(&ident.name, span, ctx)
            }
            ExportDefaultDeclarationKind::CallExpression(call) => {
                self.try_meta_call(call, None, ctx)?;
                Ok(())
            }
            // A non-object default export leaves the meta unset; the
            // post-pass reports it as a missing default export.
            _ => Ok(()),
        }
    }

    fn capture_meta_expression(
        &mut self,
        expr: &'b Expression<'a>,
        span: Span,
        ctx: &Ctx<'a, 'b>,
    ) -> Result<()> {
        match unwrap_expression(expr) {
            Expression::ObjectExpression(obj) => self.set_meta_object(obj, span, ctx),
            Expression::Identifier(ident) => self.capture_meta_identifier(&ident.name, span, ctx),
            Expression::CallExpression(call) => {
                self.try_meta_call(call, None, ctx)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn capture_meta_identifier(
        &mut self,
        name: &str,
        span: Span,
        ctx: &Ctx<'a, 'b>,
    ) -> Result<()> {
        if let Some(init) = find_var_initializer(ctx.body, name)
            && let Expression::ObjectExpression(obj) = unwrap_expression(init)
        {
            self.set_meta_object(obj, span, ctx)?;
            self.meta_variable = Some(name.to_string());
            // the binding may already have been collected as a story export
            self.stories.shift_remove(name);
        }
        Ok(())
    }

    fn set_meta_object(
        &mut self,
        obj: &'b ObjectExpression<'a>,
        span: Span,
        ctx: &Ctx<'a, 'b>,
    ) -> Result<()> {
        self.ensure_single_meta(span, ctx)?;
        let mut meta = Meta::default();
        for prop in &obj.properties {
            let ObjectPropertyKind::ObjectProperty(prop) = prop else {
                continue;
            };
            let Some(key) = static_property_name(&prop.key) else {
                continue;
            };
            let value = &prop.value;
            match key.as_str() {
                "title" => {
                    meta.title =
                        Some(annotations::parse_title(value, ctx.body, ctx.source, ctx.lines)?);
                }
                "id" => {
                    if let Expression::StringLiteral(lit) = unwrap_expression(value) {
                        meta.id = Some(lit.value.to_string());
                    }
                }
                "component" => {
                    let (code, path) =
                        annotations::parse_component(value, &self.import_bindings, ctx.source);
                    meta.component = Some(code);
                    meta.component_path = path;
                }
                "includeStories" => {
                    meta.include_stories = Some(annotations::parse_include_exclude(
                        value, ctx.source, ctx.lines,
                    )?);
                }
                "excludeStories" => {
                    meta.exclude_stories = Some(annotations::parse_include_exclude(
                        value, ctx.source, ctx.lines,
                    )?);
                }
                "tags" => {
                    meta.tags = annotations::parse_tags(value, ctx.body, ctx.source, ctx.lines)?;
                }
                _ => {}
            }
            if self.meta_annotations.insert(key.clone(), value).is_some() {
                tracing::warn!(annotation = %key, "duplicate meta annotation, overwriting");
            }
        }
        self.meta = Some(meta);
        Ok(())
    }

    fn ensure_single_meta(&self, span: Span, ctx: &Ctx<'a, 'b>) -> Result<()> {
        if self.meta.is_some() {
            return Err(CsfError::multiple_meta(ctx.location(span)));
        }
        Ok(())
    }

    fn on_export_named(
        &mut self,
        export: &'b ExportNamedDeclaration<'a>,
        ctx: &Ctx<'a, 'b>,
    ) -> Result<()> {
        if let Some(decl) = &export.declaration {
            match decl {
                Declaration::VariableDeclaration(var) => {
                    for declarator in &var.declarations {
                        let BindingPatternKind::BindingIdentifier(ident) = &declarator.id.kind
                        else {
                            continue;
                        };
                        self.on_named_binding(
                            ident.name.as_str(),
                            declarator.init.as_ref(),
                            declarator.span,
                            ctx,
                        )?;
                    }
                }
                Declaration::FunctionDeclaration(func) => {
                    if let Some(id) = &func.id {
                        if self.meta_is_factory {
                            return Err(CsfError::mixed_factory(
                                "plain story export in a factory module",
                                ctx.location(func.span),
                            ));
                        }
                        self.stories.insert(
                            id.name.to_string(),
                            StoryDecl {
                                local_name: None,
                                init: None,
                                fn_param_count: Some(func.params.items.len()),
                                is_factory: false,
                            },
                        );
                    }
                }
                _ => {}
            }
        }

        for spec in &export.specifiers {
            let exported = module_export_name(&spec.exported);
            let local = module_export_name(&spec.local);
            if exported == "default" {
                self.ensure_single_meta(spec.span, ctx)?;
                if export.source.is_none() {
                    self.capture_meta_identifier(&local, spec.span, ctx)?;
                }
                if self.meta.is_none() {
                    // meta re-export: nothing local to inspect
                    self.meta = Some(Meta::default());
                }
            } else if exported == "__namedExportsOrder" {
                if let Some(init) = find_var_initializer(ctx.body, &local) {
                    self.set_order_from(init, ctx)?;
                }
            } else {
                self.stories.insert(
                    exported,
                    StoryDecl {
                        local_name: Some(local),
                        init: None,
                        fn_param_count: None,
                        is_factory: false,
                    },
                );
            }
        }
        Ok(())
    }

    fn on_named_binding(
        &mut self,
        name: &str,
        init: Option<&'b Expression<'a>>,
        span: Span,
        ctx: &Ctx<'a, 'b>,
    ) -> Result<()> {
        if name == "__namedExportsOrder" {
            if let Some(init) = init {
                self.set_order_from(init, ctx)?;
            }
            return Ok(());
        }
        if self.meta_variable.as_deref() == Some(name) {
            return Ok(());
        }
        if let Some(init_expr) = init
            && let Expression::CallExpression(call) = unwrap_expression(init_expr)
            && self.try_meta_call(call, Some(name), ctx)?
        {
            return Ok(());
        }
        self.add_story(name, init, span, ctx)
    }

    fn on_variable(&mut self, var: &'b VariableDeclaration<'a>, ctx: &Ctx<'a, 'b>) -> Result<()> {
        for declarator in &var.declarations {
            let BindingPatternKind::BindingIdentifier(ident) = &declarator.id.kind else {
                continue;
            };
            if let Some(init) = &declarator.init
                && let Expression::CallExpression(call) = unwrap_expression(init)
            {
                self.try_meta_call(call, Some(ident.name.as_str()), ctx)?;
            }
        }
        Ok(())
    }

    fn on_expression(&mut self, expr: &'b Expression<'a>, ctx: &Ctx<'a, 'b>) -> Result<()> {
        match expr {
            Expression::AssignmentExpression(assign) => self.on_assignment(assign, ctx),
            Expression::CallExpression(call) => {
                self.try_meta_call(call, None, ctx)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    // Recognizes `<ident>.meta(...)` where `<ident>` is an import from a
    // valid preview-configuration path. A same-named call on an import from
    // anywhere else is rejected outright rather than silently accepted.
    fn try_meta_call(
        &mut self,
        call: &'b CallExpression<'a>,
        binding: Option<&str>,
        ctx: &Ctx<'a, 'b>,
    ) -> Result<bool> {
        let Expression::StaticMemberExpression(member) = &call.callee else {
            return Ok(false);
        };
        if member.property.name != "meta" {
            return Ok(false);
        }
        let Expression::Identifier(object) = &member.object else {
            return Ok(false);
        };
        let Some(import_source) = self.import_bindings.get(object.name.as_str()) else {
            return Ok(false);
        };
        if !is_valid_preview_path(import_source) {
            return Err(CsfError::bad_meta(
                format!("meta() must be imported from the preview configuration, got '{import_source}'"),
                ctx.location(call.span),
            ));
        }
        self.ensure_single_meta(call.span, ctx)?;
        if self
            .stories
            .values()
            .any(|story| !story.is_factory && (story.init.is_some() || story.fn_param_count.is_some()))
        {
            return Err(CsfError::mixed_factory(
                "plain story exports precede a factory meta",
                ctx.location(call.span),
            ));
        }
        match call.arguments.first() {
            Some(Argument::ObjectExpression(obj)) => self.set_meta_object(obj, call.span, ctx)?,
            _ => self.meta = Some(Meta::default()),
        }
        self.meta_is_factory = true;
        self.meta_variable = binding.map(str::to_string);
        Ok(true)
    }

    fn add_story(
        &mut self,
        name: &str,
        init: Option<&'b Expression<'a>>,
        span: Span,
        ctx: &Ctx<'a, 'b>,
    ) -> Result<()> {
        let mut is_factory = false;
        if let Some(init) = init {
            match unwrap_expression(init) {
                Expression::CallExpression(call) if is_factory_story_call(call) => {
                    if !self.meta_is_factory {
                        return Err(CsfError::mixed_factory(
                            "factory story used without a factory meta",
                            ctx.location(call.span),
                        ));
                    }
                    is_factory = true;
                    if let Some(Argument::ObjectExpression(obj)) = call.arguments.first() {
                        self.record_object_annotations(name, obj);
                    }
                }
                Expression::ObjectExpression(obj) => {
                    if self.meta_is_factory {
                        return Err(CsfError::mixed_factory(
                            "plain story export in a factory module",
                            ctx.location(span),
                        ));
                    }
                    self.record_object_annotations(name, obj);
                }
                _ => {
                    if self.meta_is_factory {
                        return Err(CsfError::mixed_factory(
                            "plain story export in a factory module",
                            ctx.location(span),
                        ));
                    }
                }
            }
        }
        self.stories.insert(
            name.to_string(),
            StoryDecl {
                local_name: None,
                init,
                fn_param_count: None,
                is_factory,
            },
        );
        Ok(())
    }

    fn on_assignment(
        &mut self,
        assign: &'b AssignmentExpression<'a>,
        _ctx: &Ctx<'a, 'b>,
    ) -> Result<()> {
        let AssignmentTarget::StaticMemberExpression(member) = &assign.left else {
            return Ok(());
        };
        let Expression::Identifier(object) = &member.object else {
            return Ok(());
        };
        let story = object.name.to_string();
        match member.property.name.as_str() {
            "storyName" => {
                tracing::warn!(story = %story, "storyName is deprecated, use name");
                self.record_annotation(&story, "storyName", &assign.right);
            }
            "story" => {
                // legacy CSF2 bag: its properties flatten into the same
                // annotation map, not under a `story` key
                if let Expression::ObjectExpression(obj) = unwrap_expression(&assign.right) {
                    self.record_object_annotations(&story, obj);
                }
            }
            prop => self.record_annotation(&story, prop, &assign.right),
        }
        Ok(())
    }

    fn record_object_annotations(&mut self, story: &str, obj: &'b ObjectExpression<'a>) {
        for prop in &obj.properties {
            let ObjectPropertyKind::ObjectProperty(prop) = prop else {
                continue;
            };
            let Some(key) = static_property_name(&prop.key) else {
                continue;
            };
            if key == "storyName" {
                tracing::warn!(story = %story, "storyName is deprecated, use name");
            }
            self.record_annotation(story, &key, &prop.value);
        }
    }

    fn record_annotation(&mut self, story: &str, key: &str, value: &'b Expression<'a>) {
        let entry = self.annotations.entry(story.to_string()).or_default();
        if entry.insert(key.to_string(), value).is_some() {
            tracing::warn!(story = %story, annotation = %key, "duplicate story annotation, overwriting");
        }
    }

    fn set_order_from(&mut self, expr: &'b Expression<'a>, ctx: &Ctx<'a, 'b>) -> Result<()> {
        if let Expression::ArrayExpression(array) = resolve_expression(expr, ctx.body) {
            let mut order = Vec::with_capacity(array.elements.len());
            for element in &array.elements {
                if let ArrayExpressionElement::StringLiteral(lit) = element {
                    order.push(lit.value.to_string());
                }
            }
            self.named_exports_order = Some(order);
            self.order_span = Some(expr.span());
        }
        Ok(())
    }

    fn finish(mut self, options: &CsfOptions, ctx: &Ctx<'a, 'b>) -> Result<BuiltModel> {
        let Some(mut meta) = self.meta.take() else {
            return Err(CsfError::no_meta(None));
        };
        meta.title = (options.make_title)(meta.title.take());
        meta.raw_annotations = self
            .meta_annotations
            .iter()
            .map(|(key, value)| (key.clone(), value.span()))
            .collect();
        if self.meta_annotations.contains_key("play") {
            meta.tags.push("play-fn".to_string());
        }

        if let Some(name) = &self.meta_variable {
            self.stories.shift_remove(name.as_str());
        }

        let module_mock = self.imports.iter().any(|path| is_module_mock(path));

        // include/exclude filter; rejected exports disappear from every map
        let selected: Vec<String> = self
            .stories
            .keys()
            .filter(|key| {
                is_export_story(
                    key,
                    meta.include_stories.as_ref(),
                    meta.exclude_stories.as_ref(),
                )
            })
            .cloned()
            .collect();
        let filtered: FxHashSet<String> = self
            .stories
            .keys()
            .filter(|key| !selected.contains(*key))
            .cloned()
            .collect();
        self.stories.retain(|key, _| selected.contains(key));
        self.annotations.retain(|key, _| selected.contains(key));

        let story_count = self.stories.len();
        let mut stories = Vec::with_capacity(story_count);
        for (export_name, decl) in &self.stories {
            let annotations_map = self.annotations.get(export_name.as_str());
            let get = |key: &str| annotations_map.and_then(|map| map.get(key).copied());

            let name = display_name(export_name, get("name"), get("storyName"));

            let mut parameters: IndexMap<String, ParameterValue> = IndexMap::new();
            let mut explicit_id = None;
            if let Some(params_expr) = get("parameters")
                && let Expression::ObjectExpression(obj) = unwrap_expression(params_expr)
            {
                for prop in &obj.properties {
                    let ObjectPropertyKind::ObjectProperty(prop) = prop else {
                        continue;
                    };
                    let Some(key) = static_property_name(&prop.key) else {
                        continue;
                    };
                    if key == "__id" {
                        if let Expression::StringLiteral(lit) = unwrap_expression(&prop.value) {
                            explicit_id = Some(lit.value.to_string());
                            parameters
                                .insert(key, ParameterValue::String(lit.value.to_string()));
                        }
                    } else {
                        parameters.insert(key, ParameterValue::Raw(prop.value.span()));
                    }
                }
            }

            let id = match explicit_id {
                Some(id) => id,
                None => {
                    let title_or_id = meta
                        .id
                        .as_deref()
                        .or(meta.title.as_deref())
                        .ok_or_else(|| {
                            CsfError::invalid(
                                "cannot compute story id without a title or meta id",
                                None,
                            )
                        })?;
                    to_id(title_or_id, &story_name_from_export(export_name))
                }
            };

            let is_args = is_args_story(
                decl,
                get("render").or_else(|| self.meta_annotations.get("render").copied()),
                ctx,
            );
            parameters.insert("__isArgsStory".to_string(), ParameterValue::Bool(is_args));

            if export_name == "__page" && story_count == 1 {
                parameters.insert("docsOnly".to_string(), ParameterValue::Bool(true));
            }

            // tags: meta tags ++ own tags, never deduplicated; an own play
            // function adds play-fn (a meta play is already in meta.tags)
            let own_tags = match get("tags") {
                Some(expr) => annotations::parse_tags(expr, ctx.body, ctx.source, ctx.lines)?,
                None => Vec::new(),
            };
            let mut tags = meta.tags.clone();
            tags.extend(own_tags);
            if get("play").is_some() {
                tags.push("play-fn".to_string());
            }

            let has = |key: &str| get(key).is_some() || self.meta_annotations.contains_key(key);
            let play_expr = get("play").or_else(|| self.meta_annotations.get("play").copied());
            let stats = IndexInputStats {
                factory: decl.is_factory,
                play: has("play"),
                render: has("render"),
                loaders: has("loaders"),
                before_each: has("beforeEach"),
                globals: has("globals"),
                tags: has("tags"),
                story_fn: decl.fn_param_count.is_some()
                    || matches!(
                        decl.init.map(unwrap_expression),
                        Some(Expression::ArrowFunctionExpression(_))
                            | Some(Expression::FunctionExpression(_))
                    ),
                mount: play_expr.is_some_and(play_destructures_mount),
                module_mock,
            };

            let raw_annotations = annotations_map
                .map(|map| {
                    map.iter()
                        .map(|(key, value)| (key.clone(), value.span()))
                        .collect()
                })
                .unwrap_or_default();

            stories.push(Story {
                export_name: export_name.clone(),
                id,
                name,
                local_name: decl.local_name.clone(),
                parameters,
                tags,
                stats,
                raw_annotations,
            });
        }

        // re-sort to the declared order; the order list and the story set
        // must cover each other exactly
        if let Some(order) = &self.named_exports_order {
            let mut sorted = Vec::with_capacity(stories.len());
            for name in order {
                if let Some(pos) = stories.iter().position(|s| &s.export_name == name) {
                    sorted.push(stories.remove(pos));
                } else if !filtered.contains(name) {
                    return Err(CsfError::invalid(
                        format!("missing export '{name}' referenced by __namedExportsOrder"),
                        self.order_span.and_then(|span| ctx.location(span)),
                    ));
                }
            }
            if let Some(leftover) = stories.first() {
                return Err(CsfError::invalid(
                    format!(
                        "export '{}' is missing from __namedExportsOrder",
                        leftover.export_name
                    ),
                    self.order_span.and_then(|span| ctx.location(span)),
                ));
            }
            stories = sorted;
        }

        Ok(BuiltModel {
            meta,
            stories,
            imports: self.imports,
        })
    }
}

// Replaces `export default {...}` with `const <name> = {...};
// export default <name>;`. The synthesized statements carry empty spans so
// the preserving printer regenerates exactly them; the original statement's
// span is returned so its text is skipped on output.
fn rewrite_inline_meta<'a>(
    allocator: &'a Allocator,
    program: &mut Program<'a>,
) -> Result<Vec<Span>> {
    // Only inline object literals are hoisted; a wrapped identifier such as
    // `export default meta satisfies Meta` already has a binding.
    let target = program.body.iter().position(|stmt| {
        let Statement::ExportDefaultDeclaration(export) = stmt else {
            return false;
        };
        let expr = match &export.declaration {
            ExportDefaultDeclarationKind::ObjectExpression(_) => return true,
            ExportDefaultDeclarationKind::TSAsExpression(e) => &e.expression,
            ExportDefaultDeclarationKind::TSSatisfiesExpression(e) => &e.expression,
            ExportDefaultDeclarationKind::ParenthesizedExpression(e) => &e.expression,
            _ => return false,
        };
        matches!(unwrap_expression(expr), Expression::ObjectExpression(_))
    });
    let Some(index) = target else {
        return Ok(Vec::new());
    };

    let name = generated_meta_name(program);
    let snippet: &str = allocator.alloc_str(&format!("const {name} = 0;\nexport default {name};"));
    let parsed = fable_gen::parse(allocator, snippet, ParseOptions::tsx()).map_err(|err| {
        CsfError::invalid(format!("failed to synthesize meta binding: {err}"), None)
    })?;
    let mut statements = parsed.program.body.into_iter();
    let (Some(mut const_stmt), Some(mut export_stmt)) = (statements.next(), statements.next())
    else {
        return Err(CsfError::invalid("failed to synthesize meta binding", None));
    };
    if let Statement::VariableDeclaration(var) = &mut const_stmt {
        var.span = SPAN;
    }
    if let Statement::ExportDefaultDeclaration(export) = &mut export_stmt {
        export.span = SPAN;
    }

    let old = std::mem::replace(&mut program.body[index], export_stmt);
    let Statement::ExportDefaultDeclaration(old_export) = old else {
        return Err(CsfError::invalid("failed to synthesize meta binding", None));
    };
    let old_span = old_export.span;
    let meta_expr = match old_export.unbox().declaration {
        ExportDefaultDeclarationKind::ObjectExpression(obj) => Expression::ObjectExpression(obj),
        ExportDefaultDeclarationKind::TSAsExpression(e) => Expression::TSAsExpression(e),
        ExportDefaultDeclarationKind::TSSatisfiesExpression(e) => {
            Expression::TSSatisfiesExpression(e)
        }
        ExportDefaultDeclarationKind::ParenthesizedExpression(e) => {
            Expression::ParenthesizedExpression(e)
        }
        _ => return Err(CsfError::invalid("failed to synthesize meta binding", None)),
    };
    if let Statement::VariableDeclaration(var) = &mut const_stmt
        && let Some(declarator) = var.declarations.first_mut()
    {
        declarator.init = Some(meta_expr);
    }
    program.body.insert(index, const_stmt);
    Ok(vec![old_span])
}

fn generated_meta_name(program: &Program<'_>) -> String {
    let mut taken: FxHashSet<&str> = FxHashSet::default();
    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(import) => {
                if let Some(specifiers) = &import.specifiers {
                    for spec in specifiers {
                        let local = match spec {
                            ImportDeclarationSpecifier::ImportSpecifier(named) => &named.local,
                            ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => {
                                &default.local
                            }
                            ImportDeclarationSpecifier::ImportNamespaceSpecifier(ns) => &ns.local,
                        };
                        taken.insert(local.name.as_str());
                    }
                }
            }
            Statement::VariableDeclaration(var) => {
                collect_declared(&mut taken, var);
            }
            Statement::ExportNamedDeclaration(export) => {
                if let Some(Declaration::VariableDeclaration(var)) = &export.declaration {
                    collect_declared(&mut taken, var);
                }
            }
            _ => {}
        }
    }
    if !taken.contains("_meta") {
        return "_meta".to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("_meta{counter}");
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        counter += 1;
    }
}

fn collect_declared<'s>(taken: &mut FxHashSet<&'s str>, var: &'s VariableDeclaration<'_>) {
    for decl in &var.declarations {
        if let BindingPatternKind::BindingIdentifier(ident) = &decl.id.kind {
            taken.insert(ident.name.as_str());
        }
    }
}

#[derive(Default)]
struct StoriesOfDetector {
    span: Option<Span>,
}

impl<'a> Visit<'a> for StoriesOfDetector {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if self.span.is_none()
            && let Expression::Identifier(ident) = &call.callee
            && ident.name == "storiesOf"
        {
            self.span = Some(call.span);
        }
        walk::walk_call_expression(self, call);
    }
}

fn is_factory_story_call(call: &CallExpression<'_>) -> bool {
    matches!(&call.callee, Expression::StaticMemberExpression(member) if member.property.name == "story")
}

fn static_property_name(key: &PropertyKey<'_>) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(ident) => Some(ident.name.to_string()),
        PropertyKey::StringLiteral(lit) => Some(lit.value.to_string()),
        _ => None,
    }
}

fn module_export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

fn display_name(
    export_name: &str,
    name_expr: Option<&Expression<'_>>,
    story_name_expr: Option<&Expression<'_>>,
) -> String {
    for expr in [name_expr, story_name_expr].into_iter().flatten() {
        if let Expression::StringLiteral(lit) = unwrap_expression(expr) {
            return lit.value.to_string();
        }
    }
    story_name_from_export(export_name)
}

// CSF1/2 function stories are args stories when they take at least one
// parameter; CSF3 object and factory stories are args stories unless a
// render function with no parameters says otherwise; template bindings
// resolve to the template function's arity.
fn is_args_story<'a, 'b>(
    decl: &StoryDecl<'a, 'b>,
    render: Option<&'b Expression<'a>>,
    ctx: &Ctx<'a, 'b>,
) -> bool {
    if let Some(count) = decl.fn_param_count {
        return count > 0;
    }
    let Some(init) = decl.init else {
        return false;
    };
    let init = unwrap_expression(init);
    match init {
        Expression::ArrowFunctionExpression(_) | Expression::FunctionExpression(_) => {
            function_arity(init).unwrap_or(0) > 0
        }
        Expression::CallExpression(call) => {
            if let Expression::StaticMemberExpression(member) = &call.callee
                && member.property.name == "bind"
                && let Expression::Identifier(template) = &member.object
                && let Some(template_init) = find_var_initializer(ctx.body, &template.name)
            {
                return function_arity(unwrap_expression(template_init)).unwrap_or(0) > 0;
            }
            render_implies_args(render)
        }
        Expression::ObjectExpression(_) => render_implies_args(render),
        _ => false,
    }
}

fn render_implies_args(render: Option<&Expression<'_>>) -> bool {
    match render {
        Some(render) => function_arity(unwrap_expression(render)).unwrap_or(0) > 0,
        None => true,
    }
}

fn function_arity(expr: &Expression<'_>) -> Option<usize> {
    match expr {
        Expression::ArrowFunctionExpression(func) => Some(func.params.items.len()),
        Expression::FunctionExpression(func) => Some(func.params.items.len()),
        _ => None,
    }
}

fn play_destructures_mount(play: &Expression<'_>) -> bool {
    let params: &FormalParameters<'_> = match unwrap_expression(play) {
        Expression::ArrowFunctionExpression(func) => &func.params,
        Expression::FunctionExpression(func) => &func.params,
        _ => return false,
    };
    let Some(first) = params.items.first() else {
        return false;
    };
    let BindingPatternKind::ObjectPattern(pattern) = &first.pattern.kind else {
        return false;
    };
    pattern
        .properties
        .iter()
        .any(|prop| static_property_name(&prop.key).as_deref() == Some("mount"))
}

fn is_script_extension(ext: &str) -> bool {
    matches!(
        ext,
        "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" | "mts" | "cts"
    )
}

// A preview-configuration path: `#`-, `./`-, `../`- or `/`-prefixed, final
// segment `preview` with an optional script extension.
fn is_valid_preview_path(path: &str) -> bool {
    let prefixed = path.starts_with('#')
        || path.starts_with("./")
        || path.starts_with("../")
        || path.starts_with('/');
    if !prefixed {
        return false;
    }
    let base = path.rsplit('/').next().unwrap_or(path).trim_start_matches('#');
    match base.split_once('.') {
        None => base == "preview",
        Some((stem, ext)) => stem == "preview" && is_script_extension(ext),
    }
}

// A module-mock import: same prefixes, path ending `.mock` or
// `.mock.<script extension>`.
fn is_module_mock(path: &str) -> bool {
    let prefixed = path.starts_with('#')
        || path.starts_with("./")
        || path.starts_with("../")
        || path.starts_with('/');
    if !prefixed {
        return false;
    }
    if path.ends_with(".mock") {
        return true;
    }
    if let Some(idx) = path.rfind(".mock.") {
        let ext = &path[idx + ".mock.".len()..];
        return !ext.contains('/') && is_script_extension(ext);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_paths() {
        assert!(is_valid_preview_path("#.storybook/preview"));
        assert!(is_valid_preview_path("./preview"));
        assert!(is_valid_preview_path("../config/preview.tsx"));
        assert!(is_valid_preview_path("/abs/preview.js"));
        assert!(!is_valid_preview_path("some-package/preview"));
        assert!(!is_valid_preview_path("./config"));
        assert!(!is_valid_preview_path("./preview.css"));
    }

    #[test]
    fn module_mock_paths() {
        assert!(is_module_mock("./api.mock"));
        assert!(is_module_mock("../lib/fetch.mock.ts"));
        assert!(is_module_mock("#utils.mock"));
        assert!(!is_module_mock("lodash.mock"));
        assert!(!is_module_mock("./api"));
        assert!(!is_module_mock("./style.mock.css"));
    }
}
