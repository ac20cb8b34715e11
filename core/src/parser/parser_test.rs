use bumpalo::Bump;
use indoc::indoc;

use super::ast::*;
use super::parse;

fn parse_ok<'a>(arena: &'a Bump, source: &'a str) -> &'a Root<'a> {
    match parse(arena, source) {
        Ok(root) => root,
        Err(errors) => panic!("unexpected parse errors: {errors:?}"),
    }
}

#[test]
fn parses_a_minimal_program() {
    let arena = Bump::new();
    let root = parse_ok(&arena, "func main(): s32 begin return 0 end");
    assert_eq!(root.funcs.len(), 1);
    let main = root.main.expect("main found");
    assert_eq!(main.name, "main");
    assert!(main.params.is_empty());
    assert_eq!(main.return_spec.name, "s32");

    let StmtKind::Block(block) = &main.body.kind else {
        panic!("function body is a block");
    };
    assert_eq!(block.stmts.len(), 1);
    assert!(matches!(block.stmts[0].kind, StmtKind::Return { .. }));
}

#[test]
fn precedence_binds_multiplication_tighter() {
    let arena = Bump::new();
    let root = parse_ok(&arena, "func main(): s32 begin print 1 + 2 * 3 return 0 end");
    let StmtKind::Block(block) = &root.main.unwrap().body.kind else {
        panic!("body block");
    };
    let StmtKind::Print { args } = &block.stmts[0].kind else {
        panic!("print stmt");
    };
    let ExprKind::Binary { op: BinOp::Add, left, right } = &args[0].kind else {
        panic!("top is addition, got {:?}", args[0].kind);
    };
    assert!(matches!(left.kind, ExprKind::Num(1)));
    assert!(matches!(
        right.kind,
        ExprKind::Binary { op: BinOp::Mul, .. }
    ));
}

#[test]
fn parses_globals_structs_and_enums() {
    let arena = Bump::new();
    let source = indoc! {"
        var xs: s32[3], flag: bool
        struct P := a: s32, b: s32
        enum Color := red, green, blue
        func main(): s32 begin return 0 end
    "};
    let root = parse_ok(&arena, source);

    assert_eq!(root.globals.len(), 2);
    assert!(root.globals[0].spec.is_array);
    assert_eq!(root.globals[0].spec.elements, 3);
    assert!(!root.globals[1].spec.is_array);

    assert_eq!(root.structs.len(), 1);
    assert_eq!(root.structs[0].name, "P");
    assert_eq!(root.structs[0].members.len(), 2);

    assert_eq!(root.enums.len(), 1);
    assert_eq!(root.enums[0].members, &["red", "green", "blue"]);
}

#[test]
fn parses_control_flow_and_assignments() {
    let arena = Bump::new();
    let source = indoc! {"
        func main(): s32
        begin
            var i: s32
            i := 0
            while i < 3 do
            begin
                if i = 1 then
                    print i
                else
                    continue
                i := i + 1
            end
            return 0
        end
    "};
    let root = parse_ok(&arena, source);
    let StmtKind::Block(block) = &root.main.unwrap().body.kind else {
        panic!("body block");
    };
    assert_eq!(block.declarations.len(), 1);
    assert_eq!(block.declarations[0].name, "i");

    let StmtKind::While { condition, body } = &block.stmts[1].kind else {
        panic!("while stmt, got {:?}", block.stmts[1].kind);
    };
    assert!(matches!(
        condition.kind,
        ExprKind::Binary { op: BinOp::Less, .. }
    ));
    let StmtKind::Block(loop_block) = &body.kind else {
        panic!("loop body block");
    };
    let StmtKind::If { els, .. } = &loop_block.stmts[0].kind else {
        panic!("if stmt");
    };
    assert!(els.is_some());
}

#[test]
fn parses_member_and_index_assignment_targets() {
    let arena = Bump::new();
    let source = indoc! {"
        var xs: s32[3]
        struct P := a: s32, b: s32
        func main(): s32
        begin
            var p: P
            p.a := 10
            xs[0] := 7
            return 0
        end
    "};
    let root = parse_ok(&arena, source);
    let StmtKind::Block(block) = &root.main.unwrap().body.kind else {
        panic!("body block");
    };
    let StmtKind::Assign { target, .. } = &block.stmts[0].kind else {
        panic!("member assignment");
    };
    assert!(matches!(
        target.kind,
        ExprKind::Binary { op: BinOp::Member, .. }
    ));
    let StmtKind::Assign { target, .. } = &block.stmts[1].kind else {
        panic!("index assignment");
    };
    assert!(matches!(
        target.kind,
        ExprKind::Binary { op: BinOp::Index, .. }
    ));
}

#[test]
fn parses_comptime_calls() {
    let arena = Bump::new();
    let source = "func main(): s32 begin print @eval(fib(10)) return 0 end";
    let root = parse_ok(&arena, source);
    let StmtKind::Block(block) = &root.main.unwrap().body.kind else {
        panic!("body block");
    };
    let StmtKind::Print { args } = &block.stmts[0].kind else {
        panic!("print stmt");
    };
    let ExprKind::Call(call) = &args[0].kind else {
        panic!("comptime call");
    };
    assert!(call.is_comptime);
    assert_eq!(call.name, "eval");
    assert_eq!(call.args.len(), 1);
    let ExprKind::Call(inner) = &call.args[0].kind else {
        panic!("inner call");
    };
    assert!(!inner.is_comptime);
    assert_eq!(inner.name, "fib");
}

#[test]
fn calls_can_be_statements() {
    let arena = Bump::new();
    let source = "func main(): s32 begin tick() return 0 end";
    let root = parse_ok(&arena, source);
    let StmtKind::Block(block) = &root.main.unwrap().body.kind else {
        panic!("body block");
    };
    assert!(matches!(block.stmts[0].kind, StmtKind::ExprStmt { .. }));
}

#[test]
fn collects_multiple_errors() {
    let arena = Bump::new();
    let source = indoc! {"
        func main() s32
        begin
            i := ,
            return 0
        end
    "};
    let errors = parse(&arena, source).unwrap_err();
    assert!(errors.len() >= 2, "expected several errors, got {errors:?}");
    assert!(errors[0].to_string().contains("line 1"));
}

#[test]
fn rejects_local_array_declarations() {
    let arena = Bump::new();
    let source = "func main(): s32 begin var xs: s32[3] return 0 end";
    let errors = parse(&arena, source).unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| e.message.contains("only allowed on global variables")),
        "got {errors:?}"
    );
}

#[test]
fn source_lines_are_recorded() {
    let arena = Bump::new();
    let source = "func main(): s32\nbegin\n    print 1\n    return 0\nend";
    let root = parse_ok(&arena, source);
    let StmtKind::Block(block) = &root.main.unwrap().body.kind else {
        panic!("body block");
    };
    assert_eq!(root.main.unwrap().line, 1);
    assert_eq!(block.stmts[0].line, 3);
    assert_eq!(block.stmts[1].line, 4);
}
