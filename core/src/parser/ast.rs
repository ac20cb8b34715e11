//! The abstract syntax tree.
//!
//! All nodes are allocated in a `bumpalo` arena and referenced as `&'a ...`.
//! Annotations written by later passes (resolved types, bound symbols, the
//! results of compile-time evaluation) live in `Cell`s because the tree is
//! shared once built. A line of −1 marks synthesized nodes.

use core::cell::Cell;

use crate::types::{Symbol, TypeInfo};

pub type TyCell<'a> = Cell<Option<&'a TypeInfo<'a>>>;
pub type SymCell<'a> = Cell<Option<&'a Symbol<'a>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Pointer dereference (parsed, rejected by the analyzer).
    Deref,
    /// Address-of (parsed, rejected by the analyzer).
    AddrOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Shl,
    Shr,
    Eq,
    Neq,
    Less,
    Greater,
    /// Struct or enum member access, `a.b`.
    Member,
    /// Array indexing, `a[i]`.
    Index,
}

#[derive(Debug)]
pub struct Expr<'a> {
    pub line: i64,
    /// Resolved type, set by the analyzer.
    pub ty: TyCell<'a>,
    pub kind: ExprKind<'a>,
}

impl<'a> Expr<'a> {
    pub fn new(line: i64, kind: ExprKind<'a>) -> Self {
        Expr {
            line,
            ty: Cell::new(None),
            kind,
        }
    }
}

#[derive(Debug)]
pub enum ExprKind<'a> {
    Num(i64),
    Str(&'a str),
    Ident {
        name: &'a str,
        /// Bound symbol, set by the analyzer.
        sym: SymCell<'a>,
    },
    Unary {
        op: UnaryOp,
        operand: &'a Expr<'a>,
    },
    Binary {
        op: BinOp,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    },
    Call(CallExpr<'a>),
}

#[derive(Debug)]
pub struct CallExpr<'a> {
    pub name: &'a str,
    pub args: &'a [&'a Expr<'a>],
    /// A `@`-prefixed call whose result must be computed at compile time.
    pub is_comptime: bool,
    /// Bound callee symbol, set by the analyzer.
    pub callee: SymCell<'a>,
    /// Literal substituted by the compile-time driver. Lowering a call with
    /// this set short-circuits to the resolved node.
    pub resolved: Cell<Option<&'a Expr<'a>>>,
}

impl<'a> CallExpr<'a> {
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

#[derive(Debug)]
pub struct Stmt<'a> {
    pub line: i64,
    pub kind: StmtKind<'a>,
}

#[derive(Debug)]
pub enum StmtKind<'a> {
    While {
        condition: &'a Expr<'a>,
        body: &'a Stmt<'a>,
    },
    If {
        condition: &'a Expr<'a>,
        then: &'a Stmt<'a>,
        els: Option<&'a Stmt<'a>>,
    },
    Block(Block<'a>),
    Assign {
        target: &'a Expr<'a>,
        value: &'a Expr<'a>,
    },
    Print {
        args: &'a [&'a Expr<'a>],
    },
    Return {
        value: &'a Expr<'a>,
    },
    /// A call promoted to a statement; its return value is discarded.
    ExprStmt {
        call: &'a Expr<'a>,
    },
    Break,
    Continue,
}

#[derive(Debug)]
pub struct Block<'a> {
    pub declarations: &'a [TypedIdent<'a>],
    pub stmts: &'a [&'a Stmt<'a>],
}

/// An identifier with its syntactic type annotation, used for globals,
/// locals, parameters and struct members.
#[derive(Debug)]
pub struct TypedIdent<'a> {
    pub line: i64,
    pub name: &'a str,
    pub spec: TypeSpec<'a>,
    /// Resolved type, set by the analyzer.
    pub ty: TyCell<'a>,
}

/// The syntactic form of a type annotation; resolution happens in the
/// analyzer against the symbol table.
#[derive(Debug, Clone, Copy)]
pub struct TypeSpec<'a> {
    pub name: &'a str,
    pub pointer: bool,
    pub is_array: bool,
    /// Array element count; −1 for the dynamic form `T[]`.
    pub elements: i64,
}

#[derive(Debug)]
pub struct Func<'a> {
    pub line: i64,
    pub name: &'a str,
    pub params: &'a [TypedIdent<'a>],
    pub return_spec: TypeSpec<'a>,
    pub body: &'a Stmt<'a>,
}

#[derive(Debug)]
pub struct StructDecl<'a> {
    pub line: i64,
    pub name: &'a str,
    pub members: &'a [TypedIdent<'a>],
}

#[derive(Debug)]
pub struct EnumDecl<'a> {
    pub line: i64,
    pub name: &'a str,
    pub members: &'a [&'a str],
}

#[derive(Debug)]
pub struct Root<'a> {
    pub globals: &'a [TypedIdent<'a>],
    pub funcs: &'a [&'a Func<'a>],
    pub structs: &'a [&'a StructDecl<'a>],
    pub enums: &'a [&'a EnumDecl<'a>],
    pub main: Option<&'a Func<'a>>,
}
