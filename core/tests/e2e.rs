//! End-to-end tests: compile source text, execute the produced bytecode,
//! compare captured stdout and the exit word.

use bumpalo::Bump;
use indoc::indoc;

use varde_core::vm::Vm;

fn run(source: &str) -> (i64, String) {
    let arena = Bump::new();
    let bytecode = varde_core::compile(&arena, arena.alloc_str(source))
        .unwrap_or_else(|e| panic!("compilation failed: {e}"));
    let mut out = Vec::new();
    let result = Vm::new(bytecode, &mut out)
        .run()
        .unwrap_or_else(|e| panic!("execution failed: {e}"));
    (result, String::from_utf8(out).unwrap())
}

fn output_of(source: &str) -> String {
    run(source).1
}

#[test]
fn arithmetic_expression() {
    let output = output_of(indoc! {"
        func main(): s32
        begin
            print 1 + 2 * 3
            return 0
        end
    "});
    assert_eq!(output, "7\n");
}

#[test]
fn while_loop_counts() {
    let output = output_of(indoc! {"
        func main(): s32
        begin
            var i: s32
            i := 0
            while i < 3 do
            begin
                print i
                i := i + 1
            end
            return 0
        end
    "});
    assert_eq!(output, "0\n1\n2\n");
}

#[test]
fn recursive_fibonacci() {
    let output = output_of(indoc! {"
        func fib(n: s32): s32
        begin
            if n = 0 then return 0
            if n = 1 then return 1
            return fib(n - 1) + fib(n - 2)
        end
        func main(): s32
        begin
            print fib(10)
            return 0
        end
    "});
    assert_eq!(output, "55\n");
}

#[test]
fn comptime_fibonacci() {
    // Both @eval sites are resolved before main is lowered.
    let output = output_of(indoc! {"
        func zero(): s32
        begin
            return 0
        end
        func fib(n: s32): s32
        begin
            if n = 0 then return @eval(zero())
            if n = 1 then return 1
            return fib(n - 1) + fib(n - 2)
        end
        func main(): s32
        begin
            print @eval(fib(10))
            return 0
        end
    "});
    assert_eq!(output, "55\n");
}

#[test]
fn struct_field_sum() {
    let output = output_of(indoc! {"
        struct P := a: s32, b: s32
        func main(): s32
        begin
            var p: P
            p.a := 10
            p.b := 32
            print p.a + p.b
            return 0
        end
    "});
    assert_eq!(output, "42\n");
}

#[test]
fn global_array_element_sum() {
    let output = output_of(indoc! {"
        var xs: s32[3]
        func main(): s32
        begin
            xs[0] := 7
            xs[1] := 8
            xs[2] := 9
            print xs[0] + xs[1] + xs[2]
            return 0
        end
    "});
    assert_eq!(output, "24\n");
}

#[test]
fn exit_word_is_mains_return_value() {
    let (result, _) = run(indoc! {"
        func main(): s32
        begin
            return 41 + 1
            end
    "});
    assert_eq!(result, 42);
}

#[test]
fn if_else_branches() {
    let output = output_of(indoc! {"
        func pick(flag: s32): s32
        begin
            if flag = 1 then
                return 10
            else
                return 20
            end
        func main(): s32
        begin
            print pick(1), pick(0)
            return 0
        end
    "});
    assert_eq!(output, "10 20\n");
}

#[test]
fn break_and_continue_bind_to_the_innermost_loop() {
    let output = output_of(indoc! {"
        func main(): s32
        begin
            var i: s32, total: s32
            i := 0
            total := 0
            while i < 4 do
            begin
                var j: s32
                i := i + 1
                j := 0
                while j < 10 do
                begin
                    j := j + 1
                    if j = 2 then continue
                    if j > 3 then break
                    total := total + 1
                end
            end
            print total
            return 0
        end
    "});
    // Each outer round counts j = 1 and j = 3.
    assert_eq!(output, "8\n");
}

#[test]
fn print_takes_several_values() {
    let output = output_of(indoc! {"
        func main(): s32
        begin
            print 1, 2 + 3, 4 * 5
            return 0
        end
    "});
    assert_eq!(output, "1 5 20\n");
}

#[test]
fn division_shifts_and_unary_minus() {
    let output = output_of(indoc! {"
        func main(): s32
        begin
            print 84 / 2
            print 1 << 5
            print 256 >> 4
            print -7 + 10
            return 0
        end
    "});
    assert_eq!(output, "42\n32\n16\n3\n");
}

#[test]
fn global_scalars_persist_across_calls() {
    let output = output_of(indoc! {"
        var counter: s32
        func bump(): s32
        begin
            counter := counter + 1
            return counter
        end
        func main(): s32
        begin
            bump()
            bump()
            print bump()
            return 0
        end
    "});
    assert_eq!(output, "3\n");
}

#[test]
fn enum_members_lower_to_their_ordinals() {
    let output = output_of(indoc! {"
        enum Color := red, green, blue
        func main(): s32
        begin
            var c: Color
            c := Color.blue
            print c + 0, Color.red + 0
            return 0
        end
    "});
    assert_eq!(output, "2 0\n");
}

#[test]
fn global_struct_fields() {
    let output = output_of(indoc! {"
        struct Pair := x: s32, y: s32
        var p: Pair
        func main(): s32
        begin
            p.x := 5
            p.y := 6
            print p.x * p.y
            return 0
        end
    "});
    assert_eq!(output, "30\n");
}

#[test]
fn comptime_of_pure_arithmetic() {
    let output = output_of(indoc! {"
        func main(): s32
        begin
            print @eval(2 + 2 * 20)
            return 0
        end
    "});
    assert_eq!(output, "42\n");
}

#[test]
fn comptime_result_feeds_runtime_arithmetic() {
    let output = output_of(indoc! {"
        func square(x: s32): s32
        begin
            return x * x
        end
        func main(): s32
        begin
            print @eval(square(6)) + 6
            return 0
        end
    "});
    assert_eq!(output, "42\n");
}

#[test]
fn functions_defined_after_their_callers() {
    let output = output_of(indoc! {"
        func main(): s32
        begin
            print twice(21)
            return 0
        end
        func twice(x: s32): s32
        begin
            return x * 2
        end
    "});
    assert_eq!(output, "42\n");
}

#[test]
fn deep_argument_passing() {
    let output = output_of(indoc! {"
        func add3(a: s32, b: s32, c: s32): s32
        begin
            return a + b + c
        end
        func main(): s32
        begin
            print add3(add3(1, 2, 3), add3(4, 5, 6), add3(7, 8, 9))
            return 0
        end
    "});
    assert_eq!(output, "45\n");
}
