//! The typing passes: symbol generation, inference and checking.
//!
//! `analyze` runs the whole pipeline over an AST and either returns the
//! root symbol table plus the unresolved compile-time calls it found, or
//! every error it collected. The compile-time driver re-runs it after each
//! round of resolution until the AST is steady.
//!
//! Type and symbol annotations are written into the AST's `Cell` slots, so
//! re-analysis simply overwrites the previous round's results.

use bumpalo::Bump;
use hashbrown::HashMap;

use crate::parser::ast::*;
use crate::types::{
    ArrayType, EnumType, FuncType, IntegerType, PointerType, StructType, Symbol, SymbolKind,
    SymbolTable, TypeInfo,
};

use super::error::TypeError;

/// Result of a successful analysis round.
pub struct Analysis<'a> {
    pub symbols: SymbolTable<'a>,
    /// Unresolved compile-time calls, in evaluation order: arguments come
    /// before the calls that contain them, so syntactically nested `@`
    /// sites evaluate leaves-first.
    pub comptime_calls: Vec<&'a Expr<'a>>,
}

pub fn analyze<'a>(arena: &'a Bump, root: &'a Root<'a>) -> Result<Analysis<'a>, Vec<TypeError>> {
    let mut analyzer = Analyzer::new(arena);

    analyzer.symbol_generate(root);
    if !analyzer.errors.is_empty() {
        return Err(analyzer.errors);
    }

    analyzer.infer_and_check(root);
    if !analyzer.errors.is_empty() {
        return Err(analyzer.errors);
    }

    tracing::debug!(
        symbols = analyzer.symbols.len(),
        comptime_calls = analyzer.comptime_calls.len(),
        "analysis complete"
    );
    Ok(Analysis {
        symbols: analyzer.symbols,
        comptime_calls: analyzer.comptime_calls,
    })
}

struct Analyzer<'a> {
    arena: &'a Bump,
    symbols: SymbolTable<'a>,
    errors: Vec<TypeError>,

    /// Lexical scopes for locals and parameters, innermost last.
    scopes: Vec<HashMap<&'a str, &'a Symbol<'a>>>,
    loop_depth: u32,
    /// Nesting depth of compile-time call arguments; locals are not
    /// addressable there (there is no frame at compile time).
    comptime_depth: u32,
    current_return: Option<&'a TypeInfo<'a>>,
    comptime_calls: Vec<&'a Expr<'a>>,

    ty_s32: Option<&'a TypeInfo<'a>>,
    ty_bool: Option<&'a TypeInfo<'a>>,
}

impl<'a> Analyzer<'a> {
    fn new(arena: &'a Bump) -> Self {
        Analyzer {
            arena,
            symbols: SymbolTable::new(),
            errors: Vec::new(),
            scopes: Vec::new(),
            loop_depth: 0,
            comptime_depth: 0,
            current_return: None,
            comptime_calls: Vec::new(),
            ty_s32: None,
            ty_bool: None,
        }
    }

    fn error(&mut self, line: i64, message: String) {
        self.errors.push(TypeError { line, message });
    }

    fn ty_s32(&self) -> &'a TypeInfo<'a> {
        self.ty_s32.expect("builtin types are generated first")
    }

    fn ty_bool(&self) -> &'a TypeInfo<'a> {
        self.ty_bool.expect("builtin types are generated first")
    }

    /* Symbol generation */

    fn define(&mut self, line: i64, kind: SymbolKind, name: &'a str, ty: &'a TypeInfo<'a>) {
        let sym = &*self.arena.alloc(Symbol { kind, name, ty });
        if self.symbols.define(sym).is_err() {
            self.error(line, format!("symbol '{name}' already exists"));
        }
    }

    fn symbol_generate(&mut self, root: &'a Root<'a>) {
        self.fill_builtin_types();

        for decl in root.enums {
            let ty = &*self.arena.alloc(TypeInfo::Enum(EnumType {
                name: decl.name,
                members: decl.members,
            }));
            self.define(decl.line, SymbolKind::Type, decl.name, ty);
        }

        self.generate_struct_types(root);

        for func in root.funcs {
            let mut params = Vec::with_capacity(func.params.len());
            for param in func.params {
                let Some(ty) = self.resolve_spec(param.line, &param.spec) else {
                    continue;
                };
                if !ty.is_word_scalar() {
                    self.error(
                        param.line,
                        format!("parameter '{}' must have a word-sized scalar type, not {ty}", param.name),
                    );
                    continue;
                }
                param.ty.set(Some(ty));
                params.push((param.name, ty));
            }
            let Some(ret) = self.resolve_spec(func.line, &func.return_spec) else {
                continue;
            };
            if !ret.is_word_scalar() {
                self.error(
                    func.line,
                    format!("function '{}' must return a word-sized scalar type, not {ret}", func.name),
                );
                continue;
            }
            let ty = &*self.arena.alloc(TypeInfo::Func(FuncType {
                name: func.name,
                params: self.arena.alloc_slice_fill_iter(params),
                ret,
                is_comptime: false,
            }));
            self.define(func.line, SymbolKind::Func, func.name, ty);
        }

        for global in root.globals {
            let Some(ty) = self.resolve_spec(global.line, &global.spec) else {
                continue;
            };
            if matches!(ty, TypeInfo::Pointer(_)) {
                self.error(
                    global.line,
                    "pointers are not supported by the bytecode backend".into(),
                );
                continue;
            }
            global.ty.set(Some(ty));
            self.define(global.line, SymbolKind::GlobalVar, global.name, ty);
        }
    }

    fn fill_builtin_types(&mut self) {
        for (name, bits) in [("s8", 8u32), ("s16", 16), ("s32", 32), ("s64", 64)] {
            let ty = &*self.arena.alloc(TypeInfo::Integer(IntegerType {
                name,
                bits,
                signed: true,
            }));
            if name == "s32" {
                self.ty_s32 = Some(ty);
            }
            self.define(-1, SymbolKind::Type, name, ty);
        }
        let ty = &*self.arena.alloc(TypeInfo::Bool);
        self.ty_bool = Some(ty);
        self.define(-1, SymbolKind::Type, "bool", ty);
    }

    /// Construct struct types in dependency order so member types resolve
    /// immediately; struct cycles are detected by the DFS.
    fn generate_struct_types(&mut self, root: &'a Root<'a>) {
        let by_name: HashMap<&'a str, &'a StructDecl<'a>> =
            root.structs.iter().map(|s| (s.name, *s)).collect();

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }
        let mut marks: HashMap<&'a str, Mark> = HashMap::new();

        // Iterative DFS; a struct seen again while in progress is a cycle.
        for decl in root.structs {
            if marks.contains_key(decl.name) {
                continue;
            }
            let mut stack = vec![(*decl, 0usize)];
            marks.insert(decl.name, Mark::InProgress);
            while let Some((current, member_idx)) = stack.pop() {
                if member_idx >= current.members.len() {
                    marks.insert(current.name, Mark::Done);
                    self.construct_struct_type(current);
                    continue;
                }
                stack.push((current, member_idx + 1));
                let spec = &current.members[member_idx].spec;
                if let Some(dep) = by_name.get(spec.name).copied() {
                    match marks.get(dep.name) {
                        Some(Mark::InProgress) => {
                            self.error(
                                current.line,
                                format!(
                                    "circular struct definition involving '{}'",
                                    current.name
                                ),
                            );
                            return;
                        }
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(dep.name, Mark::InProgress);
                            stack.push((dep, 0));
                        }
                    }
                }
            }
        }
    }

    fn construct_struct_type(&mut self, decl: &'a StructDecl<'a>) {
        let mut members = Vec::with_capacity(decl.members.len());
        for member in decl.members {
            let Some(ty) = self.resolve_spec(member.line, &member.spec) else {
                continue;
            };
            member.ty.set(Some(ty));
            members.push((member.name, ty));
        }
        let ty = &*self.arena.alloc(TypeInfo::Struct(StructType::with_layout(
            self.arena,
            decl.name,
            members,
        )));
        self.define(decl.line, SymbolKind::Type, decl.name, ty);
    }

    /// Resolve a syntactic type annotation against the symbol table.
    fn resolve_spec(&mut self, line: i64, spec: &TypeSpec<'a>) -> Option<&'a TypeInfo<'a>> {
        let Some(sym) = self.symbols.lookup(spec.name) else {
            self.error(line, format!("type '{}' is never declared", spec.name));
            return None;
        };
        if sym.kind != SymbolKind::Type {
            self.error(
                line,
                format!("'{}' is used as a type, but is not one", spec.name),
            );
            return None;
        }
        let mut ty = sym.ty;
        if spec.pointer {
            ty = self
                .arena
                .alloc(TypeInfo::Pointer(PointerType { pointee: ty }));
        }
        if spec.is_array {
            if spec.elements < 0 {
                self.error(line, "dynamic arrays are not supported".into());
                return None;
            }
            ty = self.arena.alloc(TypeInfo::Array(ArrayType {
                element: ty,
                elements: spec.elements,
            }));
        }
        Some(ty)
    }

    /* Inference and checking */

    fn infer_and_check(&mut self, root: &'a Root<'a>) {
        match root.main {
            None => self.error(-1, "no main function found".into()),
            Some(main) => {
                if !main.params.is_empty() {
                    self.error(main.line, "main takes no parameters".into());
                }
                if main.return_spec.name != "s32" || main.return_spec.is_array {
                    self.error(main.line, "main must return s32".into());
                }
            }
        }

        for func in root.funcs {
            self.check_func(func);
        }
    }

    fn check_func(&mut self, func: &'a Func<'a>) {
        let Some(sym) = self.symbols.lookup(func.name) else {
            // Registration failed earlier; the error is already reported.
            return;
        };
        let TypeInfo::Func(func_ty) = sym.ty else {
            return;
        };
        self.current_return = Some(func_ty.ret);

        self.scopes.push(HashMap::new());
        for &(name, ty) in func_ty.params {
            let param = &*self.arena.alloc(Symbol {
                kind: SymbolKind::Param,
                name,
                ty,
            });
            if self.scopes.last_mut().unwrap().insert(name, param).is_some() {
                self.error(func.line, format!("duplicate parameter '{name}'"));
            }
        }
        self.check_stmt(func.body);
        self.scopes.pop();
        self.current_return = None;
    }

    fn check_stmt(&mut self, stmt: &'a Stmt<'a>) {
        match &stmt.kind {
            StmtKind::While { condition, body } => {
                self.check_condition(condition);
                self.loop_depth += 1;
                self.check_stmt(body);
                self.loop_depth -= 1;
            }
            StmtKind::If { condition, then, els } => {
                self.check_condition(condition);
                self.check_stmt(then);
                if let Some(els) = els {
                    self.check_stmt(els);
                }
            }
            StmtKind::Block(block) => {
                self.scopes.push(HashMap::new());
                for decl in block.declarations {
                    self.declare_local(decl);
                }
                for stmt in block.stmts {
                    self.check_stmt(stmt);
                }
                self.scopes.pop();
            }
            StmtKind::Assign { target, value } => {
                let target_ty = self.check_assignment_target(target);
                let value_ty = self.check_expr(value);
                if let (Some(target_ty), Some(value_ty)) = (target_ty, value_ty) {
                    if matches!(target_ty, TypeInfo::Struct(_)) {
                        self.error(
                            stmt.line,
                            "whole-struct assignment is not supported".into(),
                        );
                    } else if !target_ty.assignable_from(value_ty) {
                        self.error(
                            stmt.line,
                            format!("cannot assign {value_ty} to {target_ty}"),
                        );
                    }
                }
            }
            StmtKind::Print { args } => {
                for arg in *args {
                    if let Some(ty) = self.check_expr(arg) {
                        if !ty.is_word_scalar() {
                            self.error(
                                arg.line,
                                format!("print argument must be a word-sized scalar, not {ty}"),
                            );
                        }
                    }
                }
            }
            StmtKind::Return { value } => {
                let value_ty = self.check_expr(value);
                if let (Some(expected), Some(found)) = (self.current_return, value_ty) {
                    if !expected.assignable_from(found) {
                        self.error(
                            stmt.line,
                            format!("return type mismatch: expected {expected}, found {found}"),
                        );
                    }
                }
            }
            StmtKind::ExprStmt { call } => {
                self.check_expr(call);
            }
            StmtKind::Break => {
                if self.loop_depth == 0 {
                    self.error(stmt.line, "break outside of a loop".into());
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.error(stmt.line, "continue outside of a loop".into());
                }
            }
        }
    }

    fn declare_local(&mut self, decl: &'a TypedIdent<'a>) {
        let Some(ty) = self.resolve_spec(decl.line, &decl.spec) else {
            return;
        };
        if matches!(ty, TypeInfo::Pointer(_)) {
            self.error(
                decl.line,
                "pointers are not supported by the bytecode backend".into(),
            );
            return;
        }
        decl.ty.set(Some(ty));
        let sym = &*self.arena.alloc(Symbol {
            kind: SymbolKind::LocalVar,
            name: decl.name,
            ty,
        });
        let scope = self.scopes.last_mut().expect("inside a function scope");
        if scope.insert(decl.name, sym).is_some() {
            self.error(decl.line, format!("symbol '{}' already exists", decl.name));
        }
    }

    fn check_condition(&mut self, condition: &'a Expr<'a>) {
        if let Some(ty) = self.check_expr(condition) {
            if !matches!(ty, TypeInfo::Bool) {
                self.error(condition.line, "condition must be a relation".into());
            }
        }
    }

    /// Resolve an identifier against the scope chain, falling through to
    /// the root symbol table.
    fn lookup(&self, name: &str) -> Option<&'a Symbol<'a>> {
        for scope in self.scopes.iter().rev() {
            if let Some(sym) = scope.get(name) {
                return Some(sym);
            }
        }
        self.symbols.lookup(name)
    }

    fn check_assignment_target(&mut self, target: &'a Expr<'a>) -> Option<&'a TypeInfo<'a>> {
        match &target.kind {
            ExprKind::Ident { .. }
            | ExprKind::Binary { op: BinOp::Member, .. }
            | ExprKind::Binary { op: BinOp::Index, .. } => {
                let ty = self.check_expr(target)?;
                // The base identifier must name a variable; enum members
                // and other non-lvalues are not assignable.
                let base = match &target.kind {
                    ExprKind::Ident { sym, .. } => Some(sym),
                    ExprKind::Binary { left, .. } => match &left.kind {
                        ExprKind::Ident { sym, .. } => Some(sym),
                        _ => None,
                    },
                    _ => None,
                };
                if let Some(sym) = base {
                    let kind = sym.get().expect("checked ident is bound").kind;
                    if !matches!(
                        kind,
                        SymbolKind::LocalVar | SymbolKind::Param | SymbolKind::GlobalVar
                    ) {
                        self.error(target.line, "invalid assignment target".into());
                        return None;
                    }
                }
                Some(ty)
            }
            _ => {
                self.error(target.line, "invalid assignment target".into());
                None
            }
        }
    }

    fn check_expr(&mut self, expr: &'a Expr<'a>) -> Option<&'a TypeInfo<'a>> {
        let ty = self.infer_expr(expr)?;
        expr.ty.set(Some(ty));
        Some(ty)
    }

    fn infer_expr(&mut self, expr: &'a Expr<'a>) -> Option<&'a TypeInfo<'a>> {
        match &expr.kind {
            ExprKind::Num(_) => Some(self.ty_s32()),
            ExprKind::Str(_) => {
                self.error(
                    expr.line,
                    "strings are not supported by the bytecode backend".into(),
                );
                None
            }
            ExprKind::Ident { name, sym } => {
                let Some(resolved) = self.lookup(name) else {
                    self.error(expr.line, format!("undeclared identifier '{name}'"));
                    return None;
                };
                match resolved.kind {
                    SymbolKind::LocalVar | SymbolKind::Param => {
                        if self.comptime_depth > 0 {
                            self.error(
                                expr.line,
                                format!(
                                    "compile-time call may not reference local '{name}'"
                                ),
                            );
                            return None;
                        }
                        sym.set(Some(resolved));
                        Some(resolved.ty)
                    }
                    SymbolKind::GlobalVar => {
                        sym.set(Some(resolved));
                        Some(resolved.ty)
                    }
                    SymbolKind::Func => {
                        self.error(
                            expr.line,
                            format!("function '{name}' used as a value"),
                        );
                        None
                    }
                    SymbolKind::Type => {
                        self.error(expr.line, format!("type '{name}' used as a value"));
                        None
                    }
                }
            }
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Neg => {
                    let ty = self.check_expr(operand)?;
                    if !ty.is_integer() {
                        self.error(expr.line, format!("cannot negate a value of type {ty}"));
                        return None;
                    }
                    Some(ty)
                }
                UnaryOp::Deref | UnaryOp::AddrOf => {
                    self.error(
                        expr.line,
                        "pointers are not supported by the bytecode backend".into(),
                    );
                    None
                }
            },
            ExprKind::Binary { op, left, right } => self.infer_binary(expr, *op, left, right),
            ExprKind::Call(call) => self.infer_call(expr, call),
        }
    }

    fn infer_binary(
        &mut self,
        expr: &'a Expr<'a>,
        op: BinOp,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    ) -> Option<&'a TypeInfo<'a>> {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Shl | BinOp::Shr => {
                let lt = self.check_expr(left)?;
                let rt = self.check_expr(right)?;
                for ty in [lt, rt] {
                    if !(ty.is_integer() || matches!(ty, TypeInfo::Enum(_))) {
                        self.error(
                            expr.line,
                            format!("arithmetic operand must be an integer, not {ty}"),
                        );
                        return None;
                    }
                }
                Some(if lt.is_integer() { lt } else { self.ty_s32() })
            }
            BinOp::Eq | BinOp::Neq | BinOp::Less | BinOp::Greater => {
                let lt = self.check_expr(left)?;
                let rt = self.check_expr(right)?;
                for ty in [lt, rt] {
                    if !ty.is_word_scalar() {
                        self.error(
                            expr.line,
                            format!("comparison operand must be a word-sized scalar, not {ty}"),
                        );
                        return None;
                    }
                }
                Some(self.ty_bool())
            }
            BinOp::Member => self.infer_member(expr, left, right),
            BinOp::Index => self.infer_index(expr, left, right),
        }
    }

    fn infer_member(
        &mut self,
        expr: &'a Expr<'a>,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    ) -> Option<&'a TypeInfo<'a>> {
        let ExprKind::Ident { name, sym } = &left.kind else {
            self.error(
                expr.line,
                "nested struct member access is not supported".into(),
            );
            return None;
        };
        let ExprKind::Ident { name: member_name, .. } = &right.kind else {
            self.error(expr.line, "expected a member name".into());
            return None;
        };

        let Some(resolved) = self.lookup(name) else {
            self.error(expr.line, format!("undeclared identifier '{name}'"));
            return None;
        };

        match (resolved.kind, resolved.ty) {
            // Enum member access: an integer constant.
            (SymbolKind::Type, TypeInfo::Enum(enum_ty)) => {
                if enum_ty.ordinal(member_name).is_none() {
                    self.error(
                        expr.line,
                        format!("enum '{name}' has no member '{member_name}'"),
                    );
                    return None;
                }
                sym.set(Some(resolved));
                left.ty.set(Some(resolved.ty));
                Some(resolved.ty)
            }
            // Struct field access on a variable.
            (
                SymbolKind::LocalVar | SymbolKind::Param | SymbolKind::GlobalVar,
                TypeInfo::Struct(struct_ty),
            ) => {
                if self.comptime_depth > 0 && resolved.kind != SymbolKind::GlobalVar {
                    self.error(
                        expr.line,
                        format!("compile-time call may not reference local '{name}'"),
                    );
                    return None;
                }
                let Some(member) = struct_ty.member(member_name) else {
                    self.error(
                        expr.line,
                        format!("struct '{}' has no member '{member_name}'", struct_ty.name),
                    );
                    return None;
                };
                if matches!(member.ty, TypeInfo::Struct(_)) {
                    self.error(
                        expr.line,
                        "nested struct member access is not supported".into(),
                    );
                    return None;
                }
                sym.set(Some(resolved));
                left.ty.set(Some(resolved.ty));
                Some(member.ty)
            }
            _ => {
                self.error(
                    expr.line,
                    format!("member access on '{name}', which is not a struct or enum"),
                );
                None
            }
        }
    }

    fn infer_index(
        &mut self,
        expr: &'a Expr<'a>,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    ) -> Option<&'a TypeInfo<'a>> {
        let ExprKind::Ident { name, sym } = &left.kind else {
            self.error(expr.line, "indexing is only supported on global arrays".into());
            return None;
        };
        let Some(resolved) = self.lookup(name) else {
            self.error(expr.line, format!("undeclared identifier '{name}'"));
            return None;
        };
        let (SymbolKind::GlobalVar, TypeInfo::Array(array_ty)) = (resolved.kind, resolved.ty)
        else {
            self.error(expr.line, "indexing is only supported on global arrays".into());
            return None;
        };

        let index_ty = self.check_expr(right)?;
        if !index_ty.is_integer() {
            self.error(
                right.line,
                format!("array index must be an integer, not {index_ty}"),
            );
            return None;
        }
        sym.set(Some(resolved));
        left.ty.set(Some(resolved.ty));
        Some(array_ty.element)
    }

    fn infer_call(&mut self, expr: &'a Expr<'a>, call: &'a CallExpr<'a>) -> Option<&'a TypeInfo<'a>> {
        if call.is_comptime {
            return self.infer_comptime_call(expr, call);
        }

        let Some(callee) = self.symbols.lookup(call.name) else {
            self.error(expr.line, format!("undeclared function '{}'", call.name));
            return None;
        };
        let TypeInfo::Func(func_ty) = callee.ty else {
            self.error(expr.line, format!("'{}' is not a function", call.name));
            return None;
        };

        if call.args.len() != func_ty.params.len() {
            self.error(
                expr.line,
                format!(
                    "function '{}' takes {} argument(s), but {} were given",
                    call.name,
                    func_ty.params.len(),
                    call.args.len()
                ),
            );
            return None;
        }
        for (&arg, &(param_name, param_ty)) in call.args.iter().zip(func_ty.params) {
            let Some(arg_ty) = self.check_expr(arg) else {
                continue;
            };
            if !param_ty.assignable_from(arg_ty) {
                self.error(
                    arg.line,
                    format!(
                        "argument for '{param_name}' of '{}' must be {param_ty}, not {arg_ty}",
                        call.name
                    ),
                );
            }
        }
        call.callee.set(Some(callee));
        Some(func_ty.ret)
    }

    /// `@eval(expr)` is the one compile-time function: it computes its
    /// argument during compilation and the call is substituted with the
    /// resulting literal.
    fn infer_comptime_call(
        &mut self,
        expr: &'a Expr<'a>,
        call: &'a CallExpr<'a>,
    ) -> Option<&'a TypeInfo<'a>> {
        if let Some(resolved) = call.resolved.get() {
            return self.check_expr(resolved);
        }

        if call.name != "eval" {
            self.error(
                expr.line,
                format!("unknown compile-time function '@{}'", call.name),
            );
            return None;
        }
        if call.args.len() != 1 {
            self.error(expr.line, "@eval takes exactly one argument".into());
            return None;
        }

        self.comptime_depth += 1;
        let arg_ty = self.check_expr(call.args[0]);
        self.comptime_depth -= 1;

        let arg_ty = arg_ty?;
        if !arg_ty.is_word_scalar() {
            self.error(
                expr.line,
                format!("compile-time call must produce a word-sized value, not {arg_ty}"),
            );
            return None;
        }
        // Collected after the argument walk: nested sites come first.
        self.comptime_calls.push(expr);
        Some(arg_ty)
    }
}
