use bumpalo::Bump;
use indoc::indoc;

use crate::parser::parse;

use super::analyze;

fn errors_of(source: &str) -> Vec<String> {
    let arena = Bump::new();
    let root = parse(&arena, source).expect("parses");
    let result = match analyze(&arena, root) {
        Ok(_) => Vec::new(),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    };
    result
}

fn assert_error(source: &str, needle: &str) {
    let errors = errors_of(source);
    assert!(
        errors.iter().any(|e| e.contains(needle)),
        "expected an error containing {needle:?}, got {errors:?}"
    );
}

fn assert_clean(source: &str) {
    let errors = errors_of(source);
    assert!(errors.is_empty(), "expected no errors, got {errors:?}");
}

#[test]
fn accepts_a_well_typed_program() {
    assert_clean(indoc! {"
        var xs: s32[3]
        struct P := a: s32, b: s32
        func add(a: s32, b: s32): s32 begin return a + b end
        func main(): s32
        begin
            var p: P, i: s32
            p.a := 10
            p.b := 32
            i := add(p.a, p.b)
            xs[0] := i
            print xs[0]
            return 0
        end
    "});
}

#[test]
fn requires_main() {
    assert_error("func helper(): s32 begin return 0 end", "no main function");
}

#[test]
fn checks_main_signature() {
    assert_error(
        "func main(x: s32): s32 begin return 0 end",
        "main takes no parameters",
    );
    assert_error("func main(): bool begin return 0 end", "main must return s32");
}

#[test]
fn rejects_duplicate_symbols() {
    assert_error(
        "var x: s32 var x: s32 func main(): s32 begin return 0 end",
        "'x' already exists",
    );
    assert_error(
        indoc! {"
            func main(): s32
            begin
                var i: s32, i: s32
                return 0
            end
        "},
        "'i' already exists",
    );
}

#[test]
fn rejects_unknown_types_and_symbols() {
    assert_error(
        "func main(): s32 begin var q: Quux return 0 end",
        "type 'Quux' is never declared",
    );
    assert_error(
        "func main(): s32 begin return missing end",
        "undeclared identifier 'missing'",
    );
    assert_error(
        "func main(): s32 begin return missing(1) end",
        "undeclared function 'missing'",
    );
}

#[test]
fn detects_struct_cycles() {
    assert_error(
        indoc! {"
            struct A := b: B
            struct B := a: A
            func main(): s32 begin return 0 end
        "},
        "circular struct definition",
    );
    assert_error(
        indoc! {"
            struct S := next: S
            func main(): s32 begin return 0 end
        "},
        "circular struct definition",
    );
}

#[test]
fn structs_may_reference_earlier_and_later_structs() {
    assert_clean(indoc! {"
        struct Outer := inner: Inner
        struct Inner := value: s32
        func main(): s32
        begin
            var o: Outer
            return 0
        end
    "});
}

#[test]
fn break_and_continue_require_a_loop() {
    assert_error(
        "func main(): s32 begin break return 0 end",
        "break outside of a loop",
    );
    assert_error(
        "func main(): s32 begin continue return 0 end",
        "continue outside of a loop",
    );
    assert_clean(indoc! {"
        func main(): s32
        begin
            var i: s32
            i := 0
            while i < 3 do
            begin
                if i = 1 then break
                i := i + 1
            end
            return 0
        end
    "});
}

#[test]
fn checks_call_arity_and_argument_types() {
    assert_error(
        indoc! {"
            func f(a: s32): s32 begin return a end
            func main(): s32 begin return f(1, 2) end
        "},
        "takes 1 argument(s), but 2 were given",
    );
}

#[test]
fn rejects_strings_and_pointers() {
    assert_error(
        "func main(): s32 begin print \"hi\" return 0 end",
        "strings are not supported",
    );
    assert_error(
        "func main(): s32 begin var p: ^s32 return 0 end",
        "pointers are not supported",
    );
}

#[test]
fn rejects_nested_member_chains() {
    assert_error(
        indoc! {"
            struct Inner := value: s32
            struct Outer := inner: Inner
            func main(): s32
            begin
                var o: Outer
                o.inner.value := 1
                return 0
            end
        "},
        "nested struct member access",
    );
}

#[test]
fn rejects_indexing_locals() {
    assert_error(
        indoc! {"
            func main(): s32
            begin
                var i: s32
                i := 0
                return i[0]
            end
        "},
        "indexing is only supported on global arrays",
    );
}

#[test]
fn collects_comptime_calls_leaves_first() {
    let arena = Bump::new();
    let source = indoc! {"
        func zero(): s32 begin return 0 end
        func main(): s32
        begin
            print @eval(zero() + @eval(zero()))
            return 0
        end
    "};
    let root = parse(&arena, source).expect("parses");
    let analysis = analyze(&arena, root).expect("analyzes");
    assert_eq!(analysis.comptime_calls.len(), 2);
    // The nested site is collected before the one containing it.
    let crate::parser::ast::ExprKind::Call(outer) = &analysis.comptime_calls[1].kind else {
        panic!("expected a call");
    };
    assert!(matches!(
        outer.args[0].kind,
        crate::parser::ast::ExprKind::Binary { .. }
    ));
}

#[test]
fn comptime_calls_may_not_touch_locals() {
    assert_error(
        indoc! {"
            func main(): s32
            begin
                var i: s32
                i := 1
                print @eval(i)
                return 0
            end
        "},
        "may not reference local 'i'",
    );
}

#[test]
fn unknown_comptime_function() {
    assert_error(
        "func main(): s32 begin return @run(1) end",
        "unknown compile-time function '@run'",
    );
}

#[test]
fn enum_members_are_integer_constants() {
    assert_clean(indoc! {"
        enum Color := red, green, blue
        func main(): s32
        begin
            var c: Color
            c := Color.green
            print c + 0
            return 0
        end
    "});
    assert_error(
        indoc! {"
            enum Color := red, green, blue
            func main(): s32
            begin
                print Color.yellow
                return 0
            end
        "},
        "has no member 'yellow'",
    );
}
