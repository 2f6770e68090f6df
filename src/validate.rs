//! Source validator.
//!
//! Structural checks over the parsed program. Undeclared identifiers are
//! deliberately not checked here; they surface later as fatal
//! `UnknownSymbol` errors during condition evaluation.

use crate::ast::{ElseArm, Expr, Item, Param, Program, Stmt, VarDecl};

/// Check a parsed program. An empty result means the precheck passed.
#[must_use]
pub fn check(program: &Program) -> Vec<String> {
    let mut diags = Vec::new();

    let function_count = program
        .items
        .iter()
        .filter(|item| matches!(item, Item::Function(_)))
        .count();
    if function_count > 1 {
        diags.push("multiple top-level function declarations".to_string());
    }

    for item in &program.items {
        match item {
            Item::Function(func) => {
                check_params(&func.params, &mut diags);
                check_stmts(&func.body, &mut diags);
            }
            Item::Class(class) => {
                for member in &class.members {
                    if let Some(init) = &member.init {
                        check_expr(init, &mut diags);
                    }
                }
            }
            Item::VarList(list) => check_decls(&list.decls, &mut diags),
            Item::Stmt(stmt) => check_stmt(stmt, &mut diags),
        }
    }

    diags
}

fn check_params(params: &[Param], diags: &mut Vec<String>) {
    for param in params {
        if param.ty.is_none() {
            diags.push(format!(
                "line {}: parameter `{}` is missing a type annotation",
                param.line, param.name
            ));
        }
    }
}

fn check_decls(decls: &[VarDecl], diags: &mut Vec<String>) {
    for decl in decls {
        if let (Some(ty), Some(init)) = (&decl.ty, &decl.init) {
            if let Some(found) = literal_type(init) {
                let declared = ty.name();
                if found != declared {
                    diags.push(format!(
                        "line {}: type mismatch: `{}` is declared `{}` but initialized with a {} literal",
                        decl.line, decl.name, declared, found
                    ));
                }
            }
        }
        if let Some(init) = &decl.init {
            check_expr(init, diags);
        }
    }
}

fn literal_type(expr: &Expr) -> Option<&'static str> {
    match expr {
        Expr::Num { .. } => Some("number"),
        Expr::Bool { .. } => Some("boolean"),
        Expr::Str { .. } => Some("string"),
        _ => None,
    }
}

fn check_stmts(stmts: &[Stmt], diags: &mut Vec<String>) {
    for stmt in stmts {
        check_stmt(stmt, diags);
    }
}

fn check_stmt(stmt: &Stmt, diags: &mut Vec<String>) {
    match stmt {
        Stmt::VarList(list) => check_decls(&list.decls, diags),
        Stmt::If(if_stmt) => {
            check_expr(&if_stmt.cond, diags);
            check_stmts(&if_stmt.then_branch, diags);
            match &if_stmt.else_branch {
                Some(ElseArm::Block(stmts)) => check_stmts(stmts, diags),
                Some(ElseArm::If(nested)) => {
                    check_stmt(&Stmt::If((**nested).clone()), diags);
                }
                None => {}
            }
        }
        Stmt::Expr { expr, .. } => check_expr(expr, diags),
        Stmt::Return { value, .. } => {
            if let Some(value) = value {
                check_expr(value, diags);
            }
        }
        Stmt::Block { stmts, .. } => check_stmts(stmts, diags),
    }
}

fn check_expr(expr: &Expr, diags: &mut Vec<String>) {
    match expr {
        Expr::Conditional {
            cond,
            then_,
            else_,
            line,
        } => {
            diags.push(format!(
                "line {line}: conditional (ternary) expressions are not supported"
            ));
            check_expr(cond, diags);
            check_expr(then_, diags);
            check_expr(else_, diags);
        }
        Expr::Unary { operand, .. } => check_expr(operand, diags),
        Expr::Binary { lhs, rhs, .. } => {
            check_expr(lhs, diags);
            check_expr(rhs, diags);
        }
        Expr::Property { base, .. } => check_expr(base, diags),
        Expr::Call { callee, args, .. } => {
            check_expr(callee, diags);
            for arg in args {
                check_expr(arg, diags);
            }
        }
        Expr::Arrow(arrow) => {
            check_params(&arrow.params, diags);
            check_stmts(&arrow.body, diags);
        }
        Expr::Num { .. } | Expr::Bool { .. } | Expr::Str { .. } | Expr::Ident { .. } | Expr::This => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn diags(source: &str) -> Vec<String> {
        check(&parse(source).expect("parse"))
    }

    #[test]
    fn accepts_simple_function() {
        assert!(diags("function test(a: number, b: number) { if (a > b) { return 1; } }").is_empty());
    }

    #[test]
    fn flags_missing_parameter_annotation() {
        let diags = diags("function f(a) {}");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].contains("missing a type annotation"));
    }

    #[test]
    fn flags_ternary_expression() {
        let diags = diags("function f(a: number) { const x = a > 0 ? 1 : 2; }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].contains("ternary"));
    }

    #[test]
    fn flags_literal_type_mismatch() {
        let diags = diags("function f(a: number) { let x: number = true; }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].contains("type mismatch"));
    }

    #[test]
    fn flags_multiple_functions() {
        let diags = diags("function f(a: number) {}\nfunction g(b: number) {}");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].contains("multiple top-level function declarations"));
    }

    #[test]
    fn checks_inside_arrow_properties() {
        let diags = diags("class C { run = (a) => { return a; }; }");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].contains("missing a type annotation"));
    }

    #[test]
    fn accepts_untyped_const_with_initializer() {
        assert!(diags("function f(a: number) { const x = 5; if (a == x) {} }").is_empty());
    }
}
