//! Lowering of the typechecked AST into bytecode.
//!
//! Expressions follow a push-and-leave-one-word discipline: every
//! expression lowers to code that leaves exactly one word on the stack.
//! Binary operands are lowered right-hand side first, so the left operand
//! is on top and `SUB` computes `left - right`; this order is the lowering
//! contract.
//!
//! Identifier loads and stores share one walk: a mode flag on the compiler
//! picks `LDBP`/`LDA`/`LDI` or their store variants, and is flipped only
//! around the target of an assignment.

use hashbrown::HashMap;

use crate::parser::ast::*;
use crate::types::{bytes_to_words, word_align, SymbolKind, SymbolTable, TypeInfo};
use crate::vm::{Bytecode, Op, QUARTER_SIZE};

use super::error::CompileError;
use super::frame::{self, FrameLayout};

const LOOP_MAX_DEPTH: usize = 128;

/// Names of every function transitively callable from `expr`.
fn reachable_functions<'a>(root: &'a Root<'a>, expr: &'a Expr<'a>) -> hashbrown::HashSet<&'a str> {
    let mut reachable = hashbrown::HashSet::new();
    let mut queue = Vec::new();
    collect_calls_expr(expr, &mut queue);
    while let Some(name) = queue.pop() {
        if !reachable.insert(name) {
            continue;
        }
        if let Some(func) = root.funcs.iter().find(|f| f.name == name) {
            collect_calls_stmt(func.body, &mut queue);
        }
    }
    reachable
}

fn collect_calls_expr<'a>(expr: &'a Expr<'a>, out: &mut Vec<&'a str>) {
    match &expr.kind {
        ExprKind::Num(_) | ExprKind::Str(_) | ExprKind::Ident { .. } => {}
        ExprKind::Unary { operand, .. } => collect_calls_expr(operand, out),
        ExprKind::Binary { left, right, .. } => {
            collect_calls_expr(left, out);
            collect_calls_expr(right, out);
        }
        ExprKind::Call(call) => {
            if let Some(resolved) = call.resolved.get() {
                collect_calls_expr(resolved, out);
            } else if call.is_comptime {
                // Lowering will stop on the unresolved site itself; its
                // arguments never run as part of this image.
            } else {
                out.push(call.name);
                for arg in call.args {
                    collect_calls_expr(arg, out);
                }
            }
        }
    }
}

fn collect_calls_stmt<'a>(stmt: &'a Stmt<'a>, out: &mut Vec<&'a str>) {
    match &stmt.kind {
        StmtKind::While { condition, body } => {
            collect_calls_expr(condition, out);
            collect_calls_stmt(body, out);
        }
        StmtKind::If { condition, then, els } => {
            collect_calls_expr(condition, out);
            collect_calls_stmt(then, out);
            if let Some(els) = els {
                collect_calls_stmt(els, out);
            }
        }
        StmtKind::Block(block) => {
            for stmt in block.stmts {
                collect_calls_stmt(stmt, out);
            }
        }
        StmtKind::Assign { target, value } => {
            collect_calls_expr(target, out);
            collect_calls_expr(value, out);
        }
        StmtKind::Print { args } => {
            for arg in *args {
                collect_calls_expr(arg, out);
            }
        }
        StmtKind::Return { value } => collect_calls_expr(value, out),
        StmtKind::ExprStmt { call } => collect_calls_expr(call, out),
        StmtKind::Break | StmtKind::Continue => {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Load,
    Store,
}

/// Where a named value lives: a bp-relative local slot or an absolute
/// stack offset reserved for a global.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Local(i16),
    Global(i64),
}

struct LoopContext {
    /// Code offset of the condition check; `continue` jumps here.
    start: u32,
    /// Word-immediate offsets of pending `break` jumps, patched at loop
    /// exit.
    breaks: Vec<u32>,
}

pub struct BytecodeCompiler<'a, 'ctx> {
    symbols: &'ctx SymbolTable<'a>,
    bytecode: Bytecode,

    /// Lexical scopes mapping locals to bp-relative slots, innermost last.
    scopes: Vec<HashMap<&'a str, i16>>,
    /// Next bp-relative byte offset for a local; rewound when the block
    /// that owns the slots exits.
    bp_offset: i64,

    /// Absolute byte offsets of globals, reserved at image start.
    globals: HashMap<&'a str, i64>,
    /// First-instruction offsets of emitted functions.
    functions: HashMap<&'a str, u32>,
    /// Forward calls waiting for their target to be emitted.
    patches: Vec<(u32, &'a str)>,

    loops: Vec<LoopContext>,
    mode: Mode,
    frame: Option<FrameLayout<'a>>,
    in_main: bool,
    /// Source line attributed to emitted bytes; −1 for synthesized code.
    line: i64,
}

impl<'a, 'ctx> BytecodeCompiler<'a, 'ctx> {
    /// Lower a whole program: global-variable reservation, then main
    /// (ending in `EXIT`), then every other function (ending in `RET`),
    /// then forward-call patching.
    pub fn lower_program(
        symbols: &'ctx SymbolTable<'a>,
        root: &'a Root<'a>,
    ) -> Result<Bytecode, CompileError> {
        let mut compiler = Self::new(symbols);
        compiler.reserve_globals()?;

        let main = root.main.ok_or(CompileError::MissingMain)?;
        compiler.lower_func(main, true)?;
        for func in root.funcs {
            if func.name != "main" {
                compiler.lower_func(func, false)?;
            }
        }
        compiler.patch_calls()?;

        tracing::debug!(
            bytes = compiler.bytecode.len(),
            functions = compiler.functions.len(),
            "lowered program"
        );
        Ok(compiler.bytecode)
    }

    /// Lower a single compile-time call site: code that computes the
    /// call's expression and halts with the result on top of the stack,
    /// followed by every function a contained call might reach.
    pub fn lower_call_site(
        symbols: &'ctx SymbolTable<'a>,
        root: &'a Root<'a>,
        site: &'a Expr<'a>,
    ) -> Result<Bytecode, CompileError> {
        let ExprKind::Call(call) = &site.kind else {
            return Err(CompileError::internal("call site is not a call"));
        };
        let computed = match call.resolved.get() {
            Some(resolved) => resolved,
            None => *call
                .args
                .first()
                .ok_or_else(|| CompileError::internal("compile-time call has no argument"))?,
        };

        let mut compiler = Self::new(symbols);
        // Globals keep their reserved (zeroed) slots so absolute loads and
        // the operand stack cannot overlap.
        compiler.reserve_globals()?;
        compiler.line = site.line;
        compiler.lower_expr(computed)?;
        compiler.line = -1;
        compiler.emit(Op::Exit)?;

        // Only functions reachable from the computed expression are
        // emitted; a function body elsewhere may still contain unresolved
        // compile-time calls of its own.
        let reachable = reachable_functions(root, computed);
        for func in root.funcs {
            if func.name != "main" && reachable.contains(func.name) {
                compiler.lower_func(func, false)?;
            }
        }
        compiler.patch_calls()?;

        tracing::debug!(line = site.line, bytes = compiler.bytecode.len(), "lowered call site");
        Ok(compiler.bytecode)
    }

    fn new(symbols: &'ctx SymbolTable<'a>) -> Self {
        BytecodeCompiler {
            symbols,
            bytecode: Bytecode::new(),
            scopes: Vec::new(),
            bp_offset: 0,
            globals: HashMap::new(),
            functions: HashMap::new(),
            patches: Vec::new(),
            loops: Vec::new(),
            mode: Mode::Load,
            frame: None,
            in_main: false,
            line: -1,
        }
    }

    /* Emission helpers */

    fn emit(&mut self, op: Op) -> Result<u32, CompileError> {
        Ok(self.bytecode.push_op(op, self.line)?)
    }

    fn emit_word(&mut self, value: i64) -> Result<(), CompileError> {
        Ok(self.bytecode.push_word(value, self.line)?)
    }

    fn emit_quarter(&mut self, value: i16) -> Result<(), CompileError> {
        Ok(self.bytecode.push_quarter(value, self.line)?)
    }

    fn quarter(&self, offset: i64) -> Result<i16, CompileError> {
        offset.try_into().map_err(|_| CompileError::OffsetOutOfRange {
            line: self.line,
            offset,
        })
    }

    /// Patch a branch immediate to jump to the current end of code.
    fn patch_branch(&mut self, immediate_at: u32) -> Result<(), CompileError> {
        let displacement =
            self.bytecode.offset() as i64 - immediate_at as i64 - QUARTER_SIZE as i64;
        let displacement = displacement
            .try_into()
            .map_err(|_| CompileError::JumpTooFar { line: self.line })?;
        self.bytecode.patch_quarter(immediate_at, displacement);
        Ok(())
    }

    /* Slot resolution */

    fn var_slot(&self, name: &str) -> Result<Slot, CompileError> {
        for scope in self.scopes.iter().rev() {
            if let Some(&offset) = scope.get(name) {
                return Ok(Slot::Local(offset));
            }
        }
        if let Some(&offset) = self.globals.get(name) {
            return Ok(Slot::Global(offset));
        }
        Err(CompileError::internal(format!(
            "could not resolve variable '{name}'"
        )))
    }

    /// Emit the load or store matching the current mode for a direct slot.
    fn emit_load_store(&mut self, slot: Slot) -> Result<(), CompileError> {
        match (self.mode, slot) {
            (Mode::Load, Slot::Local(offset)) => {
                self.emit(Op::Ldbp)?;
                self.emit_quarter(offset)?;
            }
            (Mode::Store, Slot::Local(offset)) => {
                self.emit(Op::Stbp)?;
                self.emit_quarter(offset)?;
            }
            (Mode::Load, Slot::Global(offset)) => {
                self.emit(Op::Lda)?;
                self.emit_word(offset)?;
            }
            (Mode::Store, Slot::Global(offset)) => {
                self.emit(Op::Sta)?;
                self.emit_word(offset)?;
            }
        }
        Ok(())
    }

    /* Globals */

    fn reserve_globals(&mut self) -> Result<(), CompileError> {
        let mut space = 0i64;
        for sym in self.symbols.iter() {
            if sym.kind != SymbolKind::GlobalVar {
                continue;
            }
            self.globals.insert(sym.name, space);
            // Array sizes already include word-aligned elements.
            space = word_align(space + sym.ty.byte_size());
        }
        self.line = -1;
        self.emit(Op::Pushn)?;
        let words = self.quarter(bytes_to_words(space))?;
        self.emit_quarter(words)?;
        Ok(())
    }

    /* Functions */

    fn lower_func(&mut self, func: &'a Func<'a>, is_main: bool) -> Result<(), CompileError> {
        let sym = self
            .symbols
            .lookup(func.name)
            .ok_or_else(|| CompileError::internal(format!("unresolved function '{}'", func.name)))?;
        let TypeInfo::Func(func_ty) = sym.ty else {
            return Err(CompileError::internal(format!(
                "symbol '{}' is not a function",
                func.name
            )));
        };
        if func_ty.is_comptime {
            return Ok(());
        }

        tracing::trace!(func = func.name, offset = self.bytecode.offset(), "lowering function");
        self.functions.insert(func.name, self.bytecode.offset());

        self.scopes.clear();
        self.scopes.push(HashMap::new());
        self.bp_offset = 0;
        self.in_main = is_main;
        self.frame = if is_main {
            None
        } else {
            let frame = frame::plan(func.line, func_ty)?;
            let scope = self.scopes.last_mut().unwrap();
            for &(name, offset) in &frame.params {
                scope.insert(name, offset);
            }
            Some(frame)
        };

        self.line = -1;
        self.emit(Op::Funcpro)?;
        self.lower_stmt(func.body)?;

        // Fallthrough epilogue; a body ending in `return` already emitted
        // its own.
        self.line = -1;
        if is_main {
            self.emit(Op::Exit)?;
        } else {
            self.emit(Op::Ret)?;
        }

        self.scopes.clear();
        self.frame = None;
        Ok(())
    }

    fn patch_calls(&mut self) -> Result<(), CompileError> {
        for &(offset, name) in &self.patches {
            let target = self
                .functions
                .get(name)
                .ok_or_else(|| CompileError::UnresolvedCall { name: name.into() })?;
            self.bytecode.patch_word(offset, *target as i64);
        }
        self.patches.clear();
        Ok(())
    }

    /* Statements */

    fn lower_stmt(&mut self, stmt: &'a Stmt<'a>) -> Result<(), CompileError> {
        self.line = stmt.line;
        match &stmt.kind {
            StmtKind::Assign { target, value } => {
                self.lower_expr(value)?;
                self.mode = Mode::Store;
                self.lower_expr(target)?;
                self.mode = Mode::Load;
            }
            StmtKind::If { condition, then, els } => {
                self.lower_expr(condition)?;
                // If false, jump to the else branch (or past the then
                // branch when there is none).
                let else_imm = self.emit(Op::Biz)?;
                self.emit_quarter(0)?;
                self.lower_stmt(then)?;
                match els {
                    Some(els) => {
                        self.line = stmt.line;
                        let end_imm = self.emit(Op::Li)?;
                        self.emit_word(0)?;
                        self.emit(Op::Jmp)?;
                        self.patch_branch(else_imm)?;
                        self.lower_stmt(els)?;
                        self.bytecode.patch_word(end_imm, self.bytecode.offset() as i64);
                    }
                    None => {
                        self.patch_branch(else_imm)?;
                    }
                }
            }
            StmtKind::While { condition, body } => {
                if self.loops.len() >= LOOP_MAX_DEPTH {
                    return Err(CompileError::LoopDepthExceeded { line: stmt.line });
                }
                let start = self.bytecode.offset();
                self.loops.push(LoopContext {
                    start,
                    breaks: Vec::new(),
                });

                self.lower_expr(condition)?;
                let end_imm = self.emit(Op::Biz)?;
                self.emit_quarter(0)?;
                self.lower_stmt(body)?;
                // Jump back to the condition check.
                self.line = stmt.line;
                self.emit(Op::Li)?;
                self.emit_word(start as i64)?;
                self.emit(Op::Jmp)?;
                self.patch_branch(end_imm)?;

                let finished = self.loops.pop().expect("loop context pushed above");
                let loop_end = self.bytecode.offset() as i64;
                for break_imm in finished.breaks {
                    self.bytecode.patch_word(break_imm, loop_end);
                }
            }
            StmtKind::Break => {
                if self.loops.is_empty() {
                    return Err(CompileError::internal("break outside of a loop"));
                }
                let imm = self.emit(Op::Li)?;
                // Placeholder, patched at loop exit.
                self.emit_word(-1)?;
                self.emit(Op::Jmp)?;
                self.loops.last_mut().unwrap().breaks.push(imm);
            }
            StmtKind::Continue => {
                let start = self
                    .loops
                    .last()
                    .ok_or_else(|| CompileError::internal("continue outside of a loop"))?
                    .start;
                self.emit(Op::Li)?;
                self.emit_word(start as i64)?;
                self.emit(Op::Jmp)?;
            }
            StmtKind::Block(block) => self.lower_block(stmt.line, block)?,
            StmtKind::Print { args } => {
                for arg in *args {
                    self.lower_expr(arg)?;
                }
                let count: u8 = args.len().try_into().map_err(|_| {
                    CompileError::TooManyPrintArgs {
                        line: stmt.line,
                        count: args.len(),
                    }
                })?;
                self.emit(Op::Print)?;
                self.bytecode.push_byte(count, self.line)?;
            }
            StmtKind::Return { value } => {
                self.lower_expr(value)?;
                if self.in_main {
                    // main is never called, so it has no return slot; the
                    // value on top of the stack becomes the exit word.
                    self.emit(Op::Exit)?;
                } else {
                    let return_slot = self
                        .frame
                        .as_ref()
                        .ok_or_else(|| CompileError::internal("return outside of a function frame"))?
                        .return_slot;
                    self.emit(Op::Stbp)?;
                    self.emit_quarter(return_slot)?;
                    self.line = -1;
                    self.emit(Op::Ret)?;
                }
            }
            StmtKind::ExprStmt { call } => {
                self.lower_expr(call)?;
                // Discard the return slot nothing consumes.
                let words = self.expr_result_words(call)?;
                self.emit(Op::Popn)?;
                let words = self.quarter(words)?;
                self.emit_quarter(words)?;
            }
        }
        Ok(())
    }

    fn expr_result_words(&self, expr: &'a Expr<'a>) -> Result<i64, CompileError> {
        let ty = expr
            .ty
            .get()
            .ok_or_else(|| CompileError::internal("expression was not typed"))?;
        Ok(bytes_to_words(ty.byte_size()))
    }

    fn lower_block(&mut self, line: i64, block: &'a Block<'a>) -> Result<(), CompileError> {
        let reserved = if block.declarations.is_empty() {
            None
        } else {
            self.scopes.push(HashMap::new());
            let before = self.bp_offset;
            for decl in block.declarations {
                let ty = decl
                    .ty
                    .get()
                    .ok_or_else(|| CompileError::internal("local was not typed"))?;
                let slot = self.quarter(self.bp_offset)?;
                self.scopes.last_mut().unwrap().insert(decl.name, slot);
                self.bp_offset = word_align(self.bp_offset + ty.byte_size());
            }
            let words = bytes_to_words(self.bp_offset - before);
            self.line = line;
            self.emit(Op::Pushn)?;
            let words_q = self.quarter(words)?;
            self.emit_quarter(words_q)?;
            Some((words_q, before))
        };

        for stmt in block.stmts {
            self.lower_stmt(stmt)?;
        }

        if let Some((words, before)) = reserved {
            self.line = line;
            self.emit(Op::Popn)?;
            self.emit_quarter(words)?;
            self.scopes.pop();
            // Slots are reusable once the scope is gone.
            self.bp_offset = before;
        }
        Ok(())
    }

    /* Expressions */

    fn lower_expr(&mut self, expr: &'a Expr<'a>) -> Result<(), CompileError> {
        match &expr.kind {
            ExprKind::Num(value) => {
                self.emit(Op::Li)?;
                self.emit_word(*value)?;
            }
            ExprKind::Str(_) => {
                return Err(CompileError::internal("string literal reached lowering"));
            }
            ExprKind::Ident { name, .. } => {
                let slot = self.var_slot(name)?;
                self.emit_load_store(slot)?;
            }
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Neg => {
                    // 0 - operand, with the operand lowered first so the
                    // zero ends up on top.
                    self.lower_expr(operand)?;
                    self.emit(Op::Li)?;
                    self.emit_word(0)?;
                    self.emit(Op::Sub)?;
                }
                UnaryOp::Deref | UnaryOp::AddrOf => {
                    return Err(CompileError::internal("pointer expression reached lowering"));
                }
            },
            ExprKind::Binary { op, left, right } => match op {
                BinOp::Member => self.lower_member(left, right)?,
                BinOp::Index => self.lower_index(left, right)?,
                _ => {
                    // Right first, left second: the left operand is on top.
                    self.lower_expr(right)?;
                    self.lower_expr(left)?;
                    match op {
                        BinOp::Add => {
                            self.emit(Op::Add)?;
                        }
                        BinOp::Sub => {
                            self.emit(Op::Sub)?;
                        }
                        BinOp::Mul => {
                            self.emit(Op::Mul)?;
                        }
                        BinOp::Div => {
                            self.emit(Op::Div)?;
                        }
                        BinOp::Shl => {
                            self.emit(Op::Lshift)?;
                        }
                        BinOp::Shr => {
                            self.emit(Op::Rshift)?;
                        }
                        BinOp::Greater => {
                            self.emit(Op::Gt)?;
                        }
                        BinOp::Less => {
                            self.emit(Op::Lt)?;
                        }
                        // Equality: difference is zero.
                        BinOp::Eq => {
                            self.emit(Op::Sub)?;
                            self.emit(Op::Not)?;
                        }
                        // Inequality, normalized to 0/1.
                        BinOp::Neq => {
                            self.emit(Op::Sub)?;
                            self.emit(Op::Not)?;
                            self.emit(Op::Not)?;
                        }
                        BinOp::Member | BinOp::Index => unreachable!(),
                    }
                }
            },
            ExprKind::Call(call) => self.lower_call(expr, call)?,
        }
        Ok(())
    }

    /// Struct field access `s.f` (direct slot plus member offset) or enum
    /// member access `E.m` (an integer constant).
    fn lower_member(&mut self, left: &'a Expr<'a>, right: &'a Expr<'a>) -> Result<(), CompileError> {
        let ExprKind::Ident { name, sym } = &left.kind else {
            return Err(CompileError::internal("member access on a non-identifier"));
        };
        let ExprKind::Ident { name: member_name, .. } = &right.kind else {
            return Err(CompileError::internal("member name is not an identifier"));
        };
        let symbol = sym
            .get()
            .ok_or_else(|| CompileError::internal(format!("unresolved identifier '{name}'")))?;

        match symbol.ty {
            TypeInfo::Enum(enum_ty) => {
                let ordinal = enum_ty.ordinal(member_name).ok_or_else(|| {
                    CompileError::internal(format!("unresolved enum member '{member_name}'"))
                })?;
                self.emit(Op::Li)?;
                self.emit_word(ordinal)?;
            }
            TypeInfo::Struct(struct_ty) => {
                let member = struct_ty.member(member_name).ok_or_else(|| {
                    CompileError::internal(format!("unresolved struct member '{member_name}'"))
                })?;
                let slot = match self.var_slot(name)? {
                    Slot::Local(offset) => {
                        Slot::Local(self.quarter(offset as i64 + member.offset)?)
                    }
                    Slot::Global(offset) => Slot::Global(offset + member.offset),
                };
                self.emit_load_store(slot)?;
            }
            other => {
                return Err(CompileError::internal(format!(
                    "member access on a value of type {other}"
                )));
            }
        }
        Ok(())
    }

    /// Array indexing `a[i]`: compute the element's absolute byte address
    /// at runtime, then load or store through it.
    fn lower_index(&mut self, left: &'a Expr<'a>, right: &'a Expr<'a>) -> Result<(), CompileError> {
        let ExprKind::Ident { name, sym } = &left.kind else {
            return Err(CompileError::internal("indexing a non-identifier"));
        };
        let symbol = sym
            .get()
            .ok_or_else(|| CompileError::internal(format!("unresolved identifier '{name}'")))?;
        let TypeInfo::Array(array_ty) = symbol.ty else {
            return Err(CompileError::internal("indexing a non-array"));
        };

        // The index and address arithmetic always load, regardless of
        // whether the element itself is being read or written.
        let mode = self.mode;
        self.mode = Mode::Load;
        self.lower_expr(right)?;
        self.emit(Op::Li)?;
        self.emit_word(word_align(array_ty.element.byte_size()))?;
        self.emit(Op::Mul)?;

        let Slot::Global(base) = self.var_slot(name)? else {
            return Err(CompileError::internal("array is not a global"));
        };
        self.emit(Op::Li)?;
        self.emit_word(base)?;
        self.emit(Op::Add)?;
        self.mode = mode;

        match self.mode {
            Mode::Load => self.emit(Op::Ldi)?,
            Mode::Store => self.emit(Op::Sti)?,
        };
        Ok(())
    }

    /// The call convention: reserve the return slot, push arguments in
    /// order, call, reclaim the arguments. The return value stays on the
    /// stack for the surrounding context to consume.
    fn lower_call(&mut self, expr: &'a Expr<'a>, call: &'a CallExpr<'a>) -> Result<(), CompileError> {
        if let Some(resolved) = call.resolved.get() {
            return self.lower_expr(resolved);
        }
        if call.is_comptime {
            return Err(CompileError::UnresolvedComptime { line: expr.line });
        }

        let callee = call
            .callee
            .get()
            .ok_or_else(|| CompileError::internal(format!("unresolved callee '{}'", call.name)))?;
        let TypeInfo::Func(func_ty) = callee.ty else {
            return Err(CompileError::internal(format!(
                "callee '{}' is not a function",
                call.name
            )));
        };

        let return_words = bytes_to_words(func_ty.ret.byte_size());
        let argument_words: i64 = func_ty
            .params
            .iter()
            .map(|(_, ty)| bytes_to_words(ty.byte_size()))
            .sum();

        // Space for the return value.
        self.emit(Op::Pushn)?;
        let return_words_q = self.quarter(return_words)?;
        self.emit_quarter(return_words_q)?;

        for arg in call.args {
            self.lower_expr(arg)?;
        }

        // Target address; zero placeholder when the callee is not emitted
        // yet.
        let imm = self.emit(Op::Li)?;
        match self.functions.get(call.name) {
            Some(&target) => self.emit_word(target as i64)?,
            None => {
                self.patches.push((imm, call.name));
                self.emit_word(0)?;
            }
        }
        self.emit(Op::Call)?;

        // Reclaim the arguments; the return value stays.
        self.emit(Op::Popn)?;
        let argument_words_q = self.quarter(argument_words)?;
        self.emit_quarter(argument_words_q)?;
        Ok(())
    }
}
