//! Annotation extractors
//!
//! Pure interpreters for the object-literal properties a meta or story can
//! carry. Each accepts the raw expression node and returns a validated
//! domain value or a typed error pointing at the offending node. Nothing in
//! here mutates builder state.

use oxc_ast::ast::{ArrayExpressionElement, Expression, Statement};
use oxc_span::GetSpan;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::error::{CsfError, LineIndex, Result};
use crate::ids::IncludeExcludeList;
use crate::vars::{resolve_expression, unwrap_expression};

/// Extract a statically-known title: a string literal, a variable reference
/// to one, or a type-wrapped string literal. Anything else is rejected,
/// because titles must be known without executing the module.
pub fn parse_title(
    expr: &Expression<'_>,
    statements: &[Statement<'_>],
    source: &str,
    lines: &LineIndex,
) -> Result<String> {
    match resolve_expression(expr, statements) {
        Expression::StringLiteral(lit) => Ok(lit.value.to_string()),
        _ => Err(CsfError::invalid(
            "unexpected dynamic title",
            Some(lines.location(source, expr.span().start)),
        )),
    }
}

/// Extract an `includeStories` / `excludeStories` value: an array of string
/// literals becomes a name list, a single string or regex literal becomes a
/// compiled pattern.
pub fn parse_include_exclude(
    expr: &Expression<'_>,
    source: &str,
    lines: &LineIndex,
) -> Result<IncludeExcludeList> {
    let location = |span: oxc_span::Span| Some(lines.location(source, span.start));
    match unwrap_expression(expr) {
        Expression::ArrayExpression(array) => {
            let mut names = Vec::with_capacity(array.elements.len());
            for element in &array.elements {
                match element {
                    ArrayExpressionElement::StringLiteral(lit) => {
                        names.push(lit.value.to_string());
                    }
                    other => {
                        return Err(CsfError::invalid(
                            "expected include/exclude entry to be a string literal",
                            location(other.span()),
                        ));
                    }
                }
            }
            Ok(IncludeExcludeList::Names(names))
        }
        Expression::StringLiteral(lit) => {
            let pattern = Regex::new(&lit.value).map_err(|err| {
                CsfError::invalid(
                    format!("invalid include/exclude pattern: {err}"),
                    location(lit.span),
                )
            })?;
            Ok(IncludeExcludeList::Pattern(pattern))
        }
        Expression::RegExpLiteral(lit) => {
            let raw = &source[lit.span.start as usize..lit.span.end as usize];
            let (pattern, flags) = raw
                .strip_prefix('/')
                .and_then(|rest| rest.rfind('/').map(|end| (&rest[..end], &rest[end + 1..])))
                .unwrap_or((raw, ""));
            let mut inline = String::new();
            for flag in flags.chars() {
                match flag {
                    'i' | 'm' | 's' => inline.push(flag),
                    // patterns are Unicode-aware here already
                    'u' | 'v' => {}
                    other => {
                        return Err(CsfError::invalid(
                            format!("unsupported include/exclude regexp flag '{other}'"),
                            location(lit.span),
                        ));
                    }
                }
            }
            let pattern = if inline.is_empty() {
                pattern.to_string()
            } else {
                format!("(?{inline}){pattern}")
            };
            let pattern = Regex::new(&pattern).map_err(|err| {
                CsfError::invalid(
                    format!("invalid include/exclude pattern: {err}"),
                    location(lit.span),
                )
            })?;
            Ok(IncludeExcludeList::Pattern(pattern))
        }
        other => Err(CsfError::invalid(
            "expected include/exclude story array or regexp",
            location(other.span()),
        )),
    }
}

/// Extract a tags list: strictly an array of string literals. The value may
/// be a variable reference to such an array.
pub fn parse_tags(
    expr: &Expression<'_>,
    statements: &[Statement<'_>],
    source: &str,
    lines: &LineIndex,
) -> Result<Vec<String>> {
    let resolved = resolve_expression(expr, statements);
    let Expression::ArrayExpression(array) = resolved else {
        return Err(CsfError::invalid(
            "Expected tags array",
            Some(lines.location(source, expr.span().start)),
        ));
    };
    let mut tags = Vec::with_capacity(array.elements.len());
    for element in &array.elements {
        match element {
            ArrayExpressionElement::StringLiteral(lit) => tags.push(lit.value.to_string()),
            other => {
                return Err(CsfError::invalid(
                    "Expected tag to be string literal",
                    Some(lines.location(source, other.span().start)),
                ));
            }
        }
    }
    Ok(tags)
}

/// Extract a component reference: the expression text is kept verbatim for
/// display, and when it names an imported binding the import's source path
/// is recorded for downstream component discovery.
pub fn parse_component(
    expr: &Expression<'_>,
    import_bindings: &FxHashMap<String, String>,
    source: &str,
) -> (String, Option<String>) {
    let span = expr.span();
    let code = source[span.start as usize..span.end as usize].to_string();
    let path = match unwrap_expression(expr) {
        Expression::Identifier(ident) => import_bindings.get(ident.name.as_str()).cloned(),
        _ => None,
    };
    (code, path)
}
