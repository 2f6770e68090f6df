//! AST for the accepted source subset.
//!
//! Every node carries a [`SyntaxKind`] tag. The context-tree builder
//! dispatches on these tags; kinds it does not handle are skipped with a
//! warning rather than failing the analysis.

use serde::{Deserialize, Serialize};

/// Node kind tags, the dispatch surface of the tree builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    SourceFile,
    SyntaxList,
    FunctionDeclaration,
    ArrowFunction,
    ClassDeclaration,
    PropertyDeclaration,
    Parameter,
    Block,
    ExpressionStatement,
    FirstStatement,
    VariableDeclarationList,
    VariableDeclaration,
    IfStatement,
    ConditionalExpression,
    BinaryExpression,
    PrefixUnaryExpression,
    CallExpression,
    Identifier,
    ThisKeyword,
    PropertyAccessExpression,
    NumericLiteral,
    StringLiteral,
    ReturnStatement,
    TrueKeyword,
    FalseKeyword,
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// An inclusive 1-based source line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
}

/// A top-level item.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Function(FunctionDecl),
    Class(ClassDecl),
    VarList(VarDeclList),
    Stmt(Stmt),
}

impl Item {
    #[must_use]
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Self::Function(_) => SyntaxKind::FunctionDeclaration,
            Self::Class(_) => SyntaxKind::ClassDeclaration,
            Self::VarList(_) => SyntaxKind::FirstStatement,
            Self::Stmt(s) => s.kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub lines: LineRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub members: Vec<PropertyDecl>,
    pub lines: LineRange,
}

/// A class property, optionally initialized (typically an arrow function).
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: Option<TypeAnn>,
    pub init: Option<Expr>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeAnn>,
    pub line: u32,
}

/// A `const`/`let`/`var` statement with one or more declarators.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclList {
    pub decls: Vec<VarDecl>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: Option<TypeAnn>,
    pub init: Option<Expr>,
    pub line: u32,
}

/// Declared scalar type annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeAnn {
    Number,
    Boolean,
    Other(String),
}

impl TypeAnn {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            other => Self::Other(other.to_owned()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarList(VarDeclList),
    If(IfStmt),
    Expr { expr: Expr, line: u32 },
    Return { value: Option<Expr>, line: u32 },
    Block { stmts: Vec<Stmt>, lines: LineRange },
}

impl Stmt {
    #[must_use]
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Self::VarList(_) => SyntaxKind::FirstStatement,
            Self::If(_) => SyntaxKind::IfStatement,
            Self::Expr { .. } => SyntaxKind::ExpressionStatement,
            Self::Return { .. } => SyntaxKind::ReturnStatement,
            Self::Block { .. } => SyntaxKind::Block,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Vec<Stmt>,
    pub else_branch: Option<ElseArm>,
    /// Line range of the whole `if` statement, else branch included.
    pub lines: LineRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseArm {
    Block(Vec<Stmt>),
    If(Box<IfStmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num { value: i64, line: u32 },
    Bool { value: bool },
    Str { value: String },
    Ident { name: String, line: u32 },
    This,
    Property { base: Box<Expr>, name: String },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Conditional { cond: Box<Expr>, then_: Box<Expr>, else_: Box<Expr>, line: u32 },
    Call { callee: Box<Expr>, args: Vec<Expr>, line: u32 },
    Arrow(ArrowFn),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFn {
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub lines: LineRange,
}

impl Expr {
    #[must_use]
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Self::Num { .. } => SyntaxKind::NumericLiteral,
            Self::Bool { value: true } => SyntaxKind::TrueKeyword,
            Self::Bool { value: false } => SyntaxKind::FalseKeyword,
            Self::Str { .. } => SyntaxKind::StringLiteral,
            Self::Ident { .. } => SyntaxKind::Identifier,
            Self::This => SyntaxKind::ThisKeyword,
            Self::Property { .. } => SyntaxKind::PropertyAccessExpression,
            Self::Unary { .. } => SyntaxKind::PrefixUnaryExpression,
            Self::Binary { .. } => SyntaxKind::BinaryExpression,
            Self::Conditional { .. } => SyntaxKind::ConditionalExpression,
            Self::Call { .. } => SyntaxKind::CallExpression,
            Self::Arrow(_) => SyntaxKind::ArrowFunction,
        }
    }

    /// Source-like text of an assignable expression (`x`, `this.x`, `a.b`).
    #[must_use]
    pub fn lvalue_name(&self) -> Option<String> {
        match self {
            Self::Ident { name, .. } => Some(name.clone()),
            Self::This => Some("this".to_owned()),
            Self::Property { base, name } => {
                base.lvalue_name().map(|b| format!("{b}.{name}"))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    /// Postfix `!`, the non-null assertion. Transparent during evaluation.
    NonNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Assign,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    AndAnd,
    OrOr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::EqEq => "==",
            Self::NotEq => "!=",
            Self::EqEqEq => "===",
            Self::NotEqEq => "!==",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
        }
    }
}
