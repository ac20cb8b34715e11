use super::*;

/// Small assembler for hand-built images.
struct Asm(Bytecode);

impl Asm {
    fn new() -> Self {
        Asm(Bytecode::new())
    }

    fn op(mut self, op: Op) -> Self {
        self.0.push_op(op, -1).unwrap();
        self
    }

    fn li(mut self, value: Word) -> Self {
        self.0.push_op(Op::Li, -1).unwrap();
        self.0.push_word(value, -1).unwrap();
        self
    }

    fn with_quarter(mut self, op: Op, value: Quarter) -> Self {
        self.0.push_op(op, -1).unwrap();
        self.0.push_quarter(value, -1).unwrap();
        self
    }

    fn print(mut self, n: u8) -> Self {
        self.0.push_op(Op::Print, -1).unwrap();
        self.0.push_byte(n, -1).unwrap();
        self
    }

    fn run(self) -> Result<Word, VmError> {
        let mut out = Vec::new();
        Vm::new(self.0, &mut out).run()
    }

    fn run_capture(self) -> (Result<Word, VmError>, String) {
        let mut out = Vec::new();
        let result = Vm::new(self.0, &mut out).run();
        (result, String::from_utf8(out).unwrap())
    }
}

#[test]
fn arithmetic_is_left_op_right() {
    // Operands are pushed right-to-left, so the top of the stack is the
    // left operand and SUB computes left - right.
    let result = Asm::new().li(2).li(5).op(Op::Sub).op(Op::Exit).run();
    assert_eq!(result.unwrap(), 3);

    let result = Asm::new().li(3).li(12).op(Op::Div).op(Op::Exit).run();
    assert_eq!(result.unwrap(), 4);

    let result = Asm::new().li(2).li(1).op(Op::Lshift).op(Op::Exit).run();
    assert_eq!(result.unwrap(), 4);
}

#[test]
fn arithmetic_wraps_two_complement() {
    let result = Asm::new()
        .li(1)
        .li(Word::MAX)
        .op(Op::Add)
        .op(Op::Exit)
        .run();
    assert_eq!(result.unwrap(), Word::MIN);
}

#[test]
fn comparisons_are_strict() {
    let result = Asm::new().li(3).li(3).op(Op::Gt).op(Op::Exit).run();
    assert_eq!(result.unwrap(), 0);
    let result = Asm::new().li(3).li(4).op(Op::Gt).op(Op::Exit).run();
    assert_eq!(result.unwrap(), 1);
    let result = Asm::new().li(4).li(3).op(Op::Lt).op(Op::Exit).run();
    assert_eq!(result.unwrap(), 1);
}

#[test]
fn biz_skips_when_zero() {
    // LI 0; BIZ +9 (over LI 111); LI 222; EXIT
    let result = Asm::new()
        .li(0)
        .with_quarter(Op::Biz, 9)
        .li(111)
        .li(222)
        .op(Op::Exit)
        .run();
    assert_eq!(result.unwrap(), 222);

    // Non-zero condition falls through.
    let result = Asm::new()
        .li(1)
        .with_quarter(Op::Biz, 9)
        .li(111)
        .op(Op::Exit)
        .run();
    assert_eq!(result.unwrap(), 111);
}

#[test]
fn call_ret_restores_frame() {
    // Caller: reserve a return slot, push the argument, call, pop the
    // argument, exit with the return slot on top.
    //
    // Callee (increment): FUNCPRO; LDBP -24; LI 1; ADD; STBP -32; RET
    let callee_start = 26;
    let result = Asm::new()
        .with_quarter(Op::Pushn, 1) // 0000 return slot
        .li(41) // 0003 argument
        .li(callee_start) // 0012 target
        .op(Op::Call) // 0021
        .with_quarter(Op::Popn, 1) // 0022 reclaim argument
        .op(Op::Exit) // 0025
        .op(Op::Funcpro) // 0026 callee
        .with_quarter(Op::Ldbp, -24)
        .li(1)
        .op(Op::Add)
        .with_quarter(Op::Stbp, -32)
        .op(Op::Ret)
        .run();
    assert_eq!(result.unwrap(), 42);
}

#[test]
fn absolute_and_indirect_memory() {
    // Reserve two words, store 7 through a computed address, read it back
    // both indirectly and absolutely.
    let result = Asm::new()
        .with_quarter(Op::Pushn, 2)
        .li(7)
        .li(8) // byte offset of the second word
        .op(Op::Sti)
        .li(8)
        .op(Op::Ldi)
        .op(Op::Exit)
        .run();
    assert_eq!(result.unwrap(), 7);

    let mut b = Bytecode::new();
    b.push_op(Op::Pushn, -1).unwrap();
    b.push_quarter(1, -1).unwrap();
    b.push_op(Op::Li, -1).unwrap();
    b.push_word(99, -1).unwrap();
    b.push_op(Op::Sta, -1).unwrap();
    b.push_word(0, -1).unwrap();
    b.push_op(Op::Lda, -1).unwrap();
    b.push_word(0, -1).unwrap();
    b.push_op(Op::Exit, -1).unwrap();
    let mut out = Vec::new();
    assert_eq!(Vm::new(b, &mut out).run().unwrap(), 99);
}

#[test]
fn print_outputs_in_push_order() {
    let (result, output) = Asm::new()
        .li(1)
        .li(2)
        .li(3)
        .print(3)
        .li(0)
        .op(Op::Exit)
        .run_capture();
    assert_eq!(result.unwrap(), 0);
    assert_eq!(output, "1 2 3\n");
}

#[test]
fn unknown_opcode_is_a_fault() {
    let mut b = Bytecode::new();
    b.push_byte(0xee, -1).unwrap();
    let mut out = Vec::new();
    let err = Vm::new(b, &mut out).run().unwrap_err();
    assert!(matches!(
        err,
        VmError::UnknownOpcode { opcode: 0xee, offset: 0 }
    ));
}

#[test]
fn division_by_zero_is_a_fault() {
    let err = Asm::new()
        .li(0)
        .li(1)
        .op(Op::Div)
        .op(Op::Exit)
        .run()
        .unwrap_err();
    assert!(matches!(err, VmError::DivisionByZero { .. }));
}

#[test]
fn quota_bounds_runaway_code() {
    // LI 0; JMP -> offset 0: an infinite loop.
    let mut b = Bytecode::new();
    b.push_op(Op::Li, -1).unwrap();
    b.push_word(0, -1).unwrap();
    b.push_op(Op::Jmp, -1).unwrap();
    let mut out = Vec::new();
    let err = Vm::new(b, &mut out).with_quota(1000).run().unwrap_err();
    assert!(matches!(err, VmError::QuotaExceeded { .. }));
}

#[test]
fn pop_from_empty_stack_is_a_fault() {
    let err = Asm::new().op(Op::Add).run().unwrap_err();
    assert!(matches!(err, VmError::StackUnderflow));
}
