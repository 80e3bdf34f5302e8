//! Structural merge of one module into another
//!
//! Used when generated configuration has to be folded into an existing
//! user-authored module: imports and top-level variables are appended only
//! when the local binding is not already taken, and default-export objects
//! are merged property by property (arrays concatenate, nested objects
//! recurse, scalars overwrite). A default export wrapped in a single-argument
//! config-builder call, `definePreview({...})` style, is unwrapped to the
//! object argument on both sides.

use std::collections::HashSet;

use oxc_ast::ast::{
    Argument, BindingPatternKind, Expression, ExportDefaultDeclarationKind, ImportDeclaration,
    ImportDeclarationSpecifier, ObjectExpression, ObjectPropertyKind, Program, PropertyKey,
    Statement, VariableDeclaration,
};

/// Merge `addition` into `target`. Both programs must live in the same
/// allocator.
pub fn merge_programs<'a>(target: &mut Program<'a>, addition: Program<'a>) {
    let mut bound = top_level_bindings(target);

    for stmt in addition.body {
        match stmt {
            Statement::ImportDeclaration(import) => {
                let locals = import_locals(&import);
                if locals.iter().any(|name| bound.contains(name.as_str())) {
                    continue;
                }
                bound.extend(locals);
                let idx = import_insert_index(target);
                target.body.insert(idx, Statement::ImportDeclaration(import));
            }
            Statement::VariableDeclaration(var) => {
                let names = declared_names(&var);
                if names.iter().any(|name| bound.contains(name.as_str())) {
                    continue;
                }
                bound.extend(names);
                let idx = statement_insert_index(target);
                target.body.insert(idx, Statement::VariableDeclaration(var));
            }
            Statement::ExportDefaultDeclaration(export) => {
                if !has_default_export(target) {
                    target.body.push(Statement::ExportDefaultDeclaration(export));
                    continue;
                }
                let decl = export.unbox().declaration;
                if let Some(obj) = unwrap_default_object(decl)
                    && let Some(idx) = default_export_index(target)
                    && let Some(slot) = default_object_mut(&mut target.body[idx])
                {
                    merge_objects(slot, obj);
                }
            }
            other => target.body.push(other),
        }
    }
}

fn top_level_bindings(program: &Program<'_>) -> HashSet<String> {
    let mut names = HashSet::new();
    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(import) => {
                names.extend(import_locals(import));
            }
            Statement::VariableDeclaration(var) => {
                names.extend(declared_names(var));
            }
            Statement::ExportNamedDeclaration(export) => {
                if let Some(oxc_ast::ast::Declaration::VariableDeclaration(var)) =
                    &export.declaration
                {
                    names.extend(declared_names(var));
                }
            }
            _ => {}
        }
    }
    names
}

fn import_locals(import: &ImportDeclaration<'_>) -> Vec<String> {
    let mut locals = Vec::new();
    if let Some(specifiers) = &import.specifiers {
        for spec in specifiers {
            let local = match spec {
                ImportDeclarationSpecifier::ImportSpecifier(named) => &named.local,
                ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => &default.local,
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(ns) => &ns.local,
            };
            locals.push(local.name.to_string());
        }
    }
    locals
}

fn declared_names(var: &VariableDeclaration<'_>) -> Vec<String> {
    var.declarations
        .iter()
        .filter_map(|decl| match &decl.id.kind {
            BindingPatternKind::BindingIdentifier(ident) => Some(ident.name.to_string()),
            _ => None,
        })
        .collect()
}

fn import_insert_index(program: &Program<'_>) -> usize {
    program
        .body
        .iter()
        .take_while(|stmt| matches!(stmt, Statement::ImportDeclaration(_)))
        .count()
}

// New statements go right before the default export when there is one.
fn statement_insert_index(program: &Program<'_>) -> usize {
    default_export_index(program).unwrap_or(program.body.len())
}

fn default_export_index(program: &Program<'_>) -> Option<usize> {
    program
        .body
        .iter()
        .position(|stmt| matches!(stmt, Statement::ExportDefaultDeclaration(_)))
}

fn has_default_export(program: &Program<'_>) -> bool {
    default_export_index(program).is_some()
}

fn unwrap_default_object<'a>(
    decl: ExportDefaultDeclarationKind<'a>,
) -> Option<oxc_allocator::Box<'a, ObjectExpression<'a>>> {
    match decl {
        ExportDefaultDeclarationKind::ObjectExpression(obj) => Some(obj),
        ExportDefaultDeclarationKind::CallExpression(call) => {
            let call = call.unbox();
            if call.arguments.len() != 1 {
                return None;
            }
            match call.arguments.into_iter().next()? {
                Argument::ObjectExpression(obj) => Some(obj),
                _ => None,
            }
        }
        _ => None,
    }
}

fn default_object_mut<'a, 'b>(stmt: &'b mut Statement<'a>) -> Option<&'b mut ObjectExpression<'a>> {
    let Statement::ExportDefaultDeclaration(export) = stmt else {
        return None;
    };
    match &mut export.declaration {
        ExportDefaultDeclarationKind::ObjectExpression(obj) => Some(obj),
        ExportDefaultDeclarationKind::CallExpression(call) => {
            call.arguments.iter_mut().find_map(|arg| match arg {
                Argument::ObjectExpression(obj) => Some(&mut **obj),
                _ => None,
            })
        }
        _ => None,
    }
}

fn merge_objects<'a>(
    target: &mut ObjectExpression<'a>,
    addition: oxc_allocator::Box<'a, ObjectExpression<'a>>,
) {
    for prop in addition.unbox().properties {
        let prop = match prop {
            ObjectPropertyKind::ObjectProperty(prop) => prop,
            spread => {
                target.properties.push(spread);
                continue;
            }
        };
        let existing = static_key_name(&prop.key).and_then(|name| {
            target.properties.iter().position(|p| {
                matches!(p, ObjectPropertyKind::ObjectProperty(tp)
                    if static_key_name(&tp.key).as_deref() == Some(name.as_str()))
            })
        });
        match existing {
            Some(idx) => {
                if let ObjectPropertyKind::ObjectProperty(slot) = &mut target.properties[idx] {
                    merge_values(&mut slot.value, prop.unbox().value);
                }
            }
            None => target.properties.push(ObjectPropertyKind::ObjectProperty(prop)),
        }
    }
}

fn merge_values<'a>(target: &mut Expression<'a>, addition: Expression<'a>) {
    match (target, addition) {
        (Expression::ObjectExpression(t), Expression::ObjectExpression(a)) => {
            merge_objects(t, a);
        }
        (Expression::ArrayExpression(t), Expression::ArrayExpression(a)) => {
            for element in a.unbox().elements {
                t.elements.push(element);
            }
        }
        (slot, addition) => *slot = addition,
    }
}

// Static name of a property key, when it has one.
fn static_key_name(key: &PropertyKey<'_>) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(ident) => Some(ident.name.to_string()),
        PropertyKey::StringLiteral(lit) => Some(lit.value.to_string()),
        PropertyKey::NumericLiteral(lit) => Some(lit.value.to_string()),
        _ => None,
    }
}
