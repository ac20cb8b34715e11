//! Recursive descent parser with precedence climbing.
//!
//! Parse errors are collected rather than aborting on the first one; the
//! parser re-synchronizes at statement granularity and reports everything
//! it found. An AST is only returned when no errors occurred.

use bumpalo::Bump;
use core::cell::Cell;
use logos::Logos;

use super::ast::*;
use super::error::{ParseError, MAX_ERRORS};
use super::lexer::{LineMap, Token};

/// Binding power of unary operators; tighter than any binary operator
/// except member access.
const UNARY_PRECEDENCE: u32 = 12;

pub fn parse<'a>(arena: &'a Bump, source: &'a str) -> Result<&'a Root<'a>, Vec<ParseError>> {
    let map = LineMap::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    let mut lexer = Token::lexer(source);
    while let Some(item) = lexer.next() {
        let line = map.line_of(lexer.span().start);
        match item {
            Ok(token) => tokens.push(Lexed { token, line }),
            Err(()) => errors.push(ParseError {
                line,
                message: format!("unrecognized input {:?}", lexer.slice()),
            }),
        }
    }

    let last_line = tokens.last().map_or(1, |t| t.line);
    let mut parser = Parser {
        arena,
        tokens,
        pos: 0,
        errors,
        last_line,
    };
    let root = parser.root();

    if parser.errors.is_empty() {
        Ok(root)
    } else {
        Err(parser.errors)
    }
}

#[derive(Clone, Copy)]
struct Lexed<'a> {
    token: Token<'a>,
    line: i64,
}

struct Parser<'a> {
    arena: &'a Bump,
    tokens: Vec<Lexed<'a>>,
    pos: usize,
    errors: Vec<ParseError>,
    last_line: i64,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).map(|t| t.token)
    }

    fn line(&self) -> i64 {
        self.tokens.get(self.pos).map_or(self.last_line, |t| t.line)
    }

    fn next(&mut self) -> Option<Lexed<'a>> {
        let lexed = self.tokens.get(self.pos).copied();
        if lexed.is_some() {
            self.pos += 1;
        }
        lexed
    }

    fn eat(&mut self, expected: Token<'a>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token<'a>, message: &str) -> Option<()> {
        match self.peek() {
            Some(token) if token == expected => {
                self.pos += 1;
                Some(())
            }
            Some(token) => {
                self.error(format!("{message}, found {token}"));
                None
            }
            None => {
                self.error(format!("{message}, found end of input"));
                None
            }
        }
    }

    fn expect_ident(&mut self, message: &str) -> Option<&'a str> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Some(name)
            }
            Some(token) => {
                self.error(format!("{message}, found {token}"));
                None
            }
            None => {
                self.error(format!("{message}, found end of input"));
                None
            }
        }
    }

    fn error(&mut self, message: String) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(ParseError {
                line: self.line(),
                message,
            });
        }
    }

    fn gave_up(&self) -> bool {
        self.errors.len() >= MAX_ERRORS
    }

    fn alloc_expr(&self, line: i64, kind: ExprKind<'a>) -> &'a Expr<'a> {
        self.arena.alloc(Expr::new(line, kind))
    }

    fn alloc_stmt(&self, line: i64, kind: StmtKind<'a>) -> &'a Stmt<'a> {
        self.arena.alloc(Stmt { line, kind })
    }

    /* Declarations */

    fn root(&mut self) -> &'a Root<'a> {
        let mut globals = Vec::new();
        let mut funcs: Vec<&'a Func<'a>> = Vec::new();
        let mut structs: Vec<&'a StructDecl<'a>> = Vec::new();
        let mut enums: Vec<&'a EnumDecl<'a>> = Vec::new();

        while let Some(token) = self.peek() {
            if self.gave_up() {
                break;
            }
            match token {
                Token::Var => {
                    self.pos += 1;
                    if let Some(vars) = self.variable_list(true) {
                        globals.extend(vars);
                    }
                }
                Token::Func => {
                    let line = self.line();
                    self.pos += 1;
                    if let Some(func) = self.func(line) {
                        funcs.push(self.arena.alloc(func));
                    }
                }
                Token::Struct => {
                    let line = self.line();
                    self.pos += 1;
                    if let Some(decl) = self.struct_decl(line) {
                        structs.push(self.arena.alloc(decl));
                    }
                }
                Token::Enum => {
                    let line = self.line();
                    self.pos += 1;
                    if let Some(decl) = self.enum_decl(line) {
                        enums.push(self.arena.alloc(decl));
                    }
                }
                _ => {
                    self.error(format!(
                        "expected 'var', 'func', 'struct' or 'enum' at top level, found {token}"
                    ));
                    self.pos += 1;
                }
            }
        }

        let main = funcs.iter().copied().find(|f| f.name == "main");
        self.arena.alloc(Root {
            globals: self.arena.alloc_slice_fill_iter(globals),
            funcs: self.arena.alloc_slice_fill_iter(funcs),
            structs: self.arena.alloc_slice_fill_iter(structs),
            enums: self.arena.alloc_slice_fill_iter(enums),
            main,
        })
    }

    fn func(&mut self, line: i64) -> Option<Func<'a>> {
        let name = self.expect_ident("expected function name")?;
        self.expect(Token::LParen, "expected '(' to start function parameter list")?;
        let params = if self.peek() == Some(Token::RParen) {
            Vec::new()
        } else {
            self.variable_list(true)?
        };
        self.expect(Token::RParen, "expected ')' to terminate function parameter list")?;
        let return_spec = self.type_spec(true)?;
        let body = self.stmt()?;
        Some(Func {
            line,
            name,
            params: self.arena.alloc_slice_fill_iter(params),
            return_spec,
            body,
        })
    }

    fn struct_decl(&mut self, line: i64) -> Option<StructDecl<'a>> {
        let name = self.expect_ident("expected struct name")?;
        self.expect(Token::Assign, "expected ':=' after struct name")?;
        let members = self.variable_list(true)?;
        Some(StructDecl {
            line,
            name,
            members: self.arena.alloc_slice_fill_iter(members),
        })
    }

    fn enum_decl(&mut self, line: i64) -> Option<EnumDecl<'a>> {
        let name = self.expect_ident("expected enum name")?;
        self.expect(Token::Assign, "expected ':=' after enum name")?;
        let mut members = Vec::new();
        loop {
            members.push(self.expect_ident("expected enum member name")?);
            if !self.eat(Token::Comma) {
                break;
            }
        }
        Some(EnumDecl {
            line,
            name,
            members: self.arena.alloc_slice_fill_iter(members),
        })
    }

    /// A comma-separated list of `name: type` declarations.
    fn variable_list(&mut self, allow_array: bool) -> Option<Vec<TypedIdent<'a>>> {
        let mut vars = Vec::new();
        loop {
            let line = self.line();
            let name = self.expect_ident("expected variable name")?;
            let spec = self.type_spec(allow_array)?;
            vars.push(TypedIdent {
                line,
                name,
                spec,
                ty: Cell::new(None),
            });
            if !self.eat(Token::Comma) {
                break;
            }
        }
        Some(vars)
    }

    fn type_spec(&mut self, allow_array: bool) -> Option<TypeSpec<'a>> {
        self.expect(Token::Colon, "expected ':' after declaration to denote type")?;
        let pointer = self.eat(Token::Caret);
        let name = self.expect_ident("expected type name after ':'")?;
        if !self.eat(Token::LBracket) {
            return Some(TypeSpec {
                name,
                pointer,
                is_array: false,
                elements: 0,
            });
        }
        if !allow_array {
            self.error("array types are only allowed on global variables".into());
        }
        let mut elements = -1;
        if let Some(Token::Num(n)) = self.peek() {
            self.pos += 1;
            elements = n;
        }
        self.expect(Token::RBracket, "expected ']' to terminate the array type")?;
        Some(TypeSpec {
            name,
            pointer,
            is_array: allow_array,
            elements,
        })
    }

    /* Statements */

    fn stmt(&mut self) -> Option<&'a Stmt<'a>> {
        let Some(Lexed { token, line }) = self.next() else {
            self.error("unexpected end of input, expected a statement".into());
            return None;
        };
        match token {
            Token::While => {
                let condition = self.relation()?;
                self.expect(Token::Do, "expected 'do' keyword to start the while-loop body")?;
                let body = self.stmt()?;
                Some(self.alloc_stmt(line, StmtKind::While { condition, body }))
            }
            Token::If => {
                let condition = self.relation()?;
                self.expect(Token::Then, "expected 'then' keyword after if-statement condition")?;
                let then = self.stmt()?;
                let els = if self.eat(Token::Else) {
                    Some(self.stmt()?)
                } else {
                    None
                };
                Some(self.alloc_stmt(line, StmtKind::If { condition, then, els }))
            }
            Token::Print => {
                let args = self.expr_list()?;
                let args = self.arena.alloc_slice_fill_iter(args);
                Some(self.alloc_stmt(line, StmtKind::Print { args }))
            }
            Token::Return => {
                let value = self.expr(0)?;
                Some(self.alloc_stmt(line, StmtKind::Return { value }))
            }
            Token::Break => Some(self.alloc_stmt(line, StmtKind::Break)),
            Token::Continue => Some(self.alloc_stmt(line, StmtKind::Continue)),
            Token::Begin => self.block(line),
            Token::At => {
                let call = self.comptime_call(line)?;
                Some(self.alloc_stmt(line, StmtKind::ExprStmt { call }))
            }
            Token::Ident(name) => self.ident_stmt(line, name),
            _ => {
                self.error(format!("illegal first token in statement: {token}"));
                None
            }
        }
    }

    /// A statement starting with an identifier: a call promoted to a
    /// statement, or an assignment whose target is an identifier, an array
    /// index or a struct member chain.
    fn ident_stmt(&mut self, line: i64, name: &'a str) -> Option<&'a Stmt<'a>> {
        if self.peek() == Some(Token::LParen) {
            self.pos += 1;
            let call = self.call(line, name, false)?;
            return Some(self.alloc_stmt(line, StmtKind::ExprStmt { call }));
        }

        let mut target = self.alloc_expr(
            line,
            ExprKind::Ident {
                name,
                sym: Cell::new(None),
            },
        );
        if self.peek() == Some(Token::Dot) {
            while self.eat(Token::Dot) {
                let member = self.expect_ident("expected a struct member name")?;
                let member = self.alloc_expr(
                    self.line(),
                    ExprKind::Ident {
                        name: member,
                        sym: Cell::new(None),
                    },
                );
                target = self.alloc_expr(
                    line,
                    ExprKind::Binary {
                        op: BinOp::Member,
                        left: target,
                        right: member,
                    },
                );
            }
        } else if self.eat(Token::LBracket) {
            let index = self.expr(0)?;
            self.expect(Token::RBracket, "expected ']' to terminate array indexing")?;
            target = self.alloc_expr(
                line,
                ExprKind::Binary {
                    op: BinOp::Index,
                    left: target,
                    right: index,
                },
            );
        }

        self.expect(Token::Assign, "expected ':=' in assignment")?;
        let value = self.expr(0)?;
        Some(self.alloc_stmt(line, StmtKind::Assign { target, value }))
    }

    fn block(&mut self, line: i64) -> Option<&'a Stmt<'a>> {
        let mut declarations = Vec::new();
        while self.eat(Token::Var) {
            declarations.extend(self.variable_list(false)?);
        }

        let mut stmts = Vec::new();
        loop {
            match self.peek() {
                None => {
                    self.error("found end of input inside a block, expected 'end'".into());
                    break;
                }
                Some(Token::End) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    if let Some(stmt) = self.stmt() {
                        stmts.push(stmt);
                    }
                    if self.gave_up() {
                        break;
                    }
                }
            }
        }

        let block = Block {
            declarations: self.arena.alloc_slice_fill_iter(declarations),
            stmts: self.arena.alloc_slice_fill_iter(stmts),
        };
        Some(self.alloc_stmt(line, StmtKind::Block(block)))
    }

    /* Expressions */

    /// Conditions are relations: `expr relop expr` with exactly one
    /// relational operator.
    fn relation(&mut self) -> Option<&'a Expr<'a>> {
        let left = self.expr(0)?;
        let op = match self.peek() {
            Some(Token::Eq) => BinOp::Eq,
            Some(Token::Neq) => BinOp::Neq,
            Some(Token::Less) => BinOp::Less,
            Some(Token::Greater) => BinOp::Greater,
            _ => {
                self.error("expected a relation operator ('=', '!=', '<' or '>')".into());
                return None;
            }
        };
        self.pos += 1;
        let right = self.expr(0)?;
        Some(self.alloc_expr(left.line, ExprKind::Binary { op, left, right }))
    }

    fn expr_list(&mut self) -> Option<Vec<&'a Expr<'a>>> {
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.expr(0)?);
            if !self.eat(Token::Comma) {
                break;
            }
        }
        Some(exprs)
    }

    fn binary_precedence(token: Token<'a>) -> Option<(BinOp, u32)> {
        match token {
            Token::Shl => Some((BinOp::Shl, 4)),
            Token::Shr => Some((BinOp::Shr, 4)),
            Token::Plus => Some((BinOp::Add, 5)),
            Token::Minus => Some((BinOp::Sub, 5)),
            Token::Star => Some((BinOp::Mul, 10)),
            Token::Slash => Some((BinOp::Div, 10)),
            Token::Dot => Some((BinOp::Member, 15)),
            _ => None,
        }
    }

    fn expr(&mut self, min_precedence: u32) -> Option<&'a Expr<'a>> {
        let mut left = self.primary()?;
        while let Some(token) = self.peek() {
            let Some((op, precedence)) = Self::binary_precedence(token) else {
                break;
            };
            if precedence <= min_precedence {
                break;
            }
            self.pos += 1;
            // Member access is special: the right-hand side must be an
            // identifier, not a general expression.
            let right = if op == BinOp::Member {
                let name = self.expect_ident("expected a struct member name")?;
                self.alloc_expr(
                    self.line(),
                    ExprKind::Ident {
                        name,
                        sym: Cell::new(None),
                    },
                )
            } else {
                self.expr(precedence)?
            };
            left = self.alloc_expr(left.line, ExprKind::Binary { op, left, right });
        }
        Some(left)
    }

    fn primary(&mut self) -> Option<&'a Expr<'a>> {
        let Some(Lexed { token, line }) = self.next() else {
            self.error("unexpected end of input in expression".into());
            return None;
        };
        match token {
            Token::LParen => {
                let expr = self.expr(0)?;
                self.expect(Token::RParen, "expected ')' to terminate the group expression")?;
                Some(expr)
            }
            Token::Minus => {
                let operand = self.expr(UNARY_PRECEDENCE)?;
                Some(self.alloc_expr(line, ExprKind::Unary { op: UnaryOp::Neg, operand }))
            }
            Token::Star => {
                let operand = self.expr(UNARY_PRECEDENCE)?;
                Some(self.alloc_expr(line, ExprKind::Unary { op: UnaryOp::Deref, operand }))
            }
            Token::Ampersand => {
                let operand = self.expr(UNARY_PRECEDENCE)?;
                Some(self.alloc_expr(line, ExprKind::Unary { op: UnaryOp::AddrOf, operand }))
            }
            Token::Num(value) => Some(self.alloc_expr(line, ExprKind::Num(value))),
            Token::Str(quoted) => {
                let text = &quoted[1..quoted.len() - 1];
                Some(self.alloc_expr(line, ExprKind::Str(text)))
            }
            Token::At => self.comptime_call(line),
            Token::Ident(name) => match self.peek() {
                Some(Token::LParen) => {
                    self.pos += 1;
                    self.call(line, name, false)
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let left = self.alloc_expr(
                        line,
                        ExprKind::Ident {
                            name,
                            sym: Cell::new(None),
                        },
                    );
                    let index = self.expr(0)?;
                    self.expect(Token::RBracket, "expected ']' to terminate array indexing")?;
                    Some(self.alloc_expr(
                        line,
                        ExprKind::Binary {
                            op: BinOp::Index,
                            left,
                            right: index,
                        },
                    ))
                }
                _ => Some(self.alloc_expr(
                    line,
                    ExprKind::Ident {
                        name,
                        sym: Cell::new(None),
                    },
                )),
            },
            _ => {
                self.error(format!("invalid start of a primary expression: {token}"));
                None
            }
        }
    }

    fn comptime_call(&mut self, line: i64) -> Option<&'a Expr<'a>> {
        let name = self.expect_ident("expected a function name after '@'")?;
        self.expect(Token::LParen, "expected '(' to start compile-time call arguments")?;
        self.call(line, name, true)
    }

    /// Arguments of a call; the opening parenthesis is already consumed.
    fn call(&mut self, line: i64, name: &'a str, is_comptime: bool) -> Option<&'a Expr<'a>> {
        let mut args = Vec::new();
        if !self.eat(Token::RParen) {
            loop {
                args.push(self.expr(0)?);
                if !self.eat(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen, "expected ')' to end function call")?;
        }
        Some(self.alloc_expr(
            line,
            ExprKind::Call(CallExpr {
                name,
                args: self.arena.alloc_slice_fill_iter(args),
                is_comptime,
                callee: Cell::new(None),
                resolved: Cell::new(None),
            }),
        ))
    }
}
