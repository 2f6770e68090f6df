//! Execution context tree.
//!
//! A depth-first visitor over the AST produces a tree of contexts: the root
//! owns the symbol table, conditional contexts carry a branch predicate and
//! the line range of their `if` statement, assignment contexts carry a
//! variable and its right-hand side. Node kinds the visitor does not handle
//! are skipped with a warning; nothing in this stage is fatal.

use crate::ast::{
    BinOp, ElseArm, Expr, IfStmt, Item, LineRange, Param, Program, Stmt, SyntaxKind, TypeAnn,
    UnaryOp, VarDecl,
};
use crate::report::Warnings;
use std::collections::BTreeMap;

/// Declared type of a symbol in the root symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    Int,
    Bool,
    Other(String),
}

impl DeclaredType {
    fn from_annotation(ann: Option<&TypeAnn>) -> Self {
        match ann {
            Some(TypeAnn::Number) => Self::Int,
            Some(TypeAnn::Boolean) => Self::Bool,
            Some(TypeAnn::Other(name)) => Self::Other(name.clone()),
            None => Self::Other("unknown".to_string()),
        }
    }
}

/// The root context and its subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextTree {
    pub root: RootContext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RootContext {
    /// Identifier → declared type, for every typed declaration seen.
    pub symbols: BTreeMap<String, DeclaredType>,
    pub children: Vec<Context>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    Conditional(ConditionalContext),
    Assignment(AssignmentContext),
}

/// One `if` statement. Polarity is not stored here; the path enumerator
/// tags each traversal with the branch it takes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalContext {
    pub predicate: Expr,
    pub line_range: LineRange,
    pub then_children: Vec<Context>,
    pub else_children: Vec<Context>,
    pub has_else: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentContext {
    pub var_name: String,
    pub expression: Expr,
}

impl ContextTree {
    /// Total number of contexts in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        fn count(contexts: &[Context]) -> usize {
            contexts
                .iter()
                .map(|c| match c {
                    Context::Assignment(_) => 1,
                    Context::Conditional(cond) => {
                        1 + count(&cond.then_children) + count(&cond.else_children)
                    }
                })
                .sum()
        }
        count(&self.root.children)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

/// Build the context tree for a parsed program.
pub fn build(program: &Program, warnings: &mut Warnings) -> ContextTree {
    let mut builder = Builder {
        symbols: BTreeMap::new(),
        warnings,
    };
    let mut children = Vec::new();
    for item in &program.items {
        builder.visit_item(item, &mut children);
    }
    ContextTree {
        root: RootContext {
            symbols: builder.symbols,
            children,
        },
    }
}

struct Builder<'w> {
    symbols: BTreeMap<String, DeclaredType>,
    warnings: &'w mut Warnings,
}

impl Builder<'_> {
    fn visit_item(&mut self, item: &Item, out: &mut Vec<Context>) {
        match item {
            Item::Function(func) => {
                self.register_params(&func.params);
                self.visit_stmts(&func.body, out);
            }
            Item::Class(class) => {
                for member in &class.members {
                    if let Some(init) = &member.init {
                        self.visit_expr(init, out);
                    }
                }
            }
            Item::VarList(list) => self.visit_decls(&list.decls, out),
            Item::Stmt(stmt) => self.visit_stmt(stmt, out),
        }
    }

    fn register_params(&mut self, params: &[Param]) {
        for param in params {
            self.symbols.insert(
                param.name.clone(),
                DeclaredType::from_annotation(param.ty.as_ref()),
            );
        }
    }

    fn visit_stmts(&mut self, stmts: &[Stmt], out: &mut Vec<Context>) {
        for stmt in stmts {
            self.visit_stmt(stmt, out);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt, out: &mut Vec<Context>) {
        match stmt {
            Stmt::VarList(list) => self.visit_decls(&list.decls, out),
            Stmt::If(if_stmt) => self.visit_if(if_stmt, out),
            Stmt::Expr { expr, .. } => self.visit_expr_stmt(expr, out),
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.visit_expr(value, out);
                }
            }
            Stmt::Block { stmts, .. } => self.visit_stmts(stmts, out),
        }
    }

    fn visit_decls(&mut self, decls: &[VarDecl], out: &mut Vec<Context>) {
        for decl in decls {
            if decl.ty.is_some() {
                self.symbols.insert(
                    decl.name.clone(),
                    DeclaredType::from_annotation(decl.ty.as_ref()),
                );
            }
            if let Some(init) = &decl.init {
                out.push(Context::Assignment(AssignmentContext {
                    var_name: decl.name.clone(),
                    expression: init.clone(),
                }));
                // The initializer itself may hold nested constructs.
                self.visit_expr(init, out);
            }
        }
    }

    fn visit_if(&mut self, if_stmt: &IfStmt, out: &mut Vec<Context>) {
        let mut then_children = Vec::new();
        self.visit_expr(&if_stmt.cond, &mut then_children);
        self.visit_stmts(&if_stmt.then_branch, &mut then_children);

        let mut else_children = Vec::new();
        let has_else = if_stmt.else_branch.is_some();
        match &if_stmt.else_branch {
            Some(ElseArm::Block(stmts)) => self.visit_stmts(stmts, &mut else_children),
            Some(ElseArm::If(nested)) => self.visit_if(nested, &mut else_children),
            None => {}
        }

        out.push(Context::Conditional(ConditionalContext {
            predicate: if_stmt.cond.clone(),
            line_range: if_stmt.lines,
            then_children,
            else_children,
            has_else,
        }));
    }

    /// An expression in statement position: a `=` assignment becomes an
    /// assignment context, any other binary expression is traversed for
    /// nested effects, everything else is skipped with a warning.
    fn visit_expr_stmt(&mut self, expr: &Expr, out: &mut Vec<Context>) {
        match expr {
            Expr::Binary {
                op: BinOp::Assign,
                lhs,
                rhs,
            } => match lhs.lvalue_name() {
                Some(var_name) => {
                    out.push(Context::Assignment(AssignmentContext {
                        var_name,
                        expression: (**rhs).clone(),
                    }));
                    // Left side and the operator token are not traversed.
                    self.visit_expr(rhs, out);
                }
                None => self.skip(lhs.kind()),
            },
            other => self.visit_expr(other, out),
        }
    }

    /// Recursive traversal of expressions for side effects on inner
    /// contexts. Literals and identifiers are observed only.
    fn visit_expr(&mut self, expr: &Expr, out: &mut Vec<Context>) {
        match expr {
            Expr::Binary {
                op: BinOp::Assign,
                ..
            } => self.visit_expr_stmt(expr, out),
            Expr::Binary { lhs, rhs, .. } => {
                self.visit_expr(lhs, out);
                self.visit_expr(rhs, out);
            }
            Expr::Unary {
                op: UnaryOp::Not | UnaryOp::Neg | UnaryOp::NonNull,
                operand,
            } => self.visit_expr(operand, out),
            Expr::Property { base, .. } => self.visit_expr(base, out),
            Expr::Arrow(arrow) => {
                self.register_params(&arrow.params);
                self.visit_stmts(&arrow.body, out);
            }
            Expr::Num { .. } | Expr::Bool { .. } | Expr::Str { .. } | Expr::Ident { .. }
            | Expr::This => {}
            Expr::Conditional { .. } | Expr::Call { .. } => self.skip(expr.kind()),
        }
    }

    fn skip(&mut self, kind: SyntaxKind) {
        self.warnings
            .push(format!("skipping unhandled syntax kind `{kind}`"));
    }
}
