//! Top-level variable resolution
//!
//! CSF modules are flat: every binding a meta or story can reference lives
//! in the module's top-level statement list, so resolution is a linear scan
//! with no scope chain.

use oxc_ast::ast::{BindingPatternKind, Declaration, Expression, Statement, VariableDeclaration};

/// Find the initializer of the first `const`/`let`/`var` declarator binding
/// `name`, looking through named exports. Returns `None` when absent.
pub fn find_var_initializer<'a, 'b>(
    statements: &'b [Statement<'a>],
    name: &str,
) -> Option<&'b Expression<'a>> {
    for stmt in statements {
        let var = match stmt {
            Statement::VariableDeclaration(var) => Some(&**var),
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(Declaration::VariableDeclaration(var)) => Some(&**var),
                _ => None,
            },
            _ => None,
        };
        let Some(var) = var else { continue };
        if let Some(init) = declarator_init(var, name) {
            return Some(init);
        }
    }
    None
}

fn declarator_init<'a, 'b>(
    var: &'b VariableDeclaration<'a>,
    name: &str,
) -> Option<&'b Expression<'a>> {
    for decl in &var.declarations {
        if let BindingPatternKind::BindingIdentifier(ident) = &decl.id.kind
            && ident.name == name
        {
            return decl.init.as_ref();
        }
    }
    None
}

/// Strip TS type wrappers and parentheses down to the underlying expression.
pub fn unwrap_expression<'a, 'b>(expr: &'b Expression<'a>) -> &'b Expression<'a> {
    match expr {
        Expression::TSAsExpression(e) => unwrap_expression(&e.expression),
        Expression::TSSatisfiesExpression(e) => unwrap_expression(&e.expression),
        Expression::TSTypeAssertion(e) => unwrap_expression(&e.expression),
        Expression::TSNonNullExpression(e) => unwrap_expression(&e.expression),
        Expression::ParenthesizedExpression(e) => unwrap_expression(&e.expression),
        other => other,
    }
}

/// Resolve an expression that may be an identifier reference to a top-level
/// variable; non-identifiers come back unwrapped but otherwise unchanged.
pub fn resolve_expression<'a, 'b>(
    expr: &'b Expression<'a>,
    statements: &'b [Statement<'a>],
) -> &'b Expression<'a> {
    let expr = unwrap_expression(expr);
    if let Expression::Identifier(ident) = expr
        && let Some(init) = find_var_initializer(statements, &ident.name)
    {
        return unwrap_expression(init);
    }
    expr
}
