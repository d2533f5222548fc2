mod common;

#[cfg(test)]
mod interpreter_tests {
    use super::common::{on_large_stack, output_of, run, Session};
    use loxwalk::Outcome;

    fn runtime_error(source: &str) -> (String, String) {
        let (outcome, output, diagnostics) = run(source);
        assert_eq!(outcome, Outcome::RuntimeError, "output: {:?}", output);
        assert_eq!(diagnostics.len(), 1, "diagnostics: {:?}", diagnostics);
        (output, diagnostics[0].clone())
    }

    #[test]
    fn test_interpreter_01_arithmetic() {
        assert_eq!(
            output_of("print 1 + 2 * 3; print (1 + 2) * 3; print 10 - 4 - 3; print -2 * -2;"),
            "7\n9\n3\n4\n"
        );
    }

    #[test]
    fn test_interpreter_02_stringify_numbers() {
        assert_eq!(
            output_of("print 2.5; print 2.0; print 10 / 4; print -0.5; print 1000000;"),
            "2.5\n2\n2.5\n-0.5\n1000000\n"
        );
    }

    #[test]
    fn test_interpreter_03_strings() {
        assert_eq!(
            output_of(r#"print "foo" + "bar"; print "a" < "b"; print "";"#),
            "foobar\ntrue\n\n"
        );
    }

    #[test]
    fn test_interpreter_04_equality_without_coercion() {
        assert_eq!(
            output_of(r#"print nil == nil; print nil == false; print 1 == 1; print 1 == "1"; print "a" != "a";"#),
            "true\nfalse\ntrue\nfalse\nfalse\n"
        );
    }

    #[test]
    fn test_interpreter_05_truthiness() {
        assert_eq!(
            output_of(r#"print !0; print !""; print !nil; print !false;"#),
            "false\nfalse\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_interpreter_06_logical_short_circuit() {
        assert_eq!(
            output_of(r#"print nil or "yes"; print false and undefinedFn(); print 1 and 2;"#),
            "yes\nfalse\n2\n"
        );
    }

    #[test]
    fn test_interpreter_07_ternary_skips_untaken_branch() {
        let source = r#"
            var hits = 0;
            fun bump() { hits = hits + 1; return hits; }
            print true ? 1 : bump();
            print false ? bump() : 2;
            print hits;
        "#;

        assert_eq!(output_of(source), "1\n2\n0\n");
    }

    #[test]
    fn test_interpreter_08_uninitialized_variable_is_nil() {
        assert_eq!(output_of("var a; print a; a = 3; print a;"), "nil\n3\n");
    }

    #[test]
    fn test_interpreter_09_block_scoping() {
        let source = r#"
            var a = "outer";
            {
                var a = "inner";
                print a;
            }
            print a;
        "#;

        assert_eq!(output_of(source), "inner\nouter\n");
    }

    #[test]
    fn test_interpreter_10_control_flow() {
        let source = r#"
            var total = 0;
            for (var i = 1; i <= 4; i = i + 1) {
                if (i == 3) total = total + 100; else total = total + i;
            }
            print total;

            var n = 3;
            while (n > 0) n = n - 1;
            print n;
        "#;

        assert_eq!(output_of(source), "107\n0\n");
    }

    #[test]
    fn test_interpreter_11_functions_and_recursion() {
        let source = r#"
            fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
            print fib(10);

            fun early() { while (true) { return "out"; } }
            print early();

            fun nothing() {}
            print nothing();
        "#;

        assert_eq!(output_of(source), "55\nout\nnil\n");
    }

    #[test]
    fn test_interpreter_12_callable_rendering() {
        assert_eq!(
            output_of("fun add(a, b) { return a + b; } print add; print clock; print fun () {};"),
            "<fn add>\n<native fn>\n<fn>\n"
        );
    }

    #[test]
    fn test_interpreter_13_clock_returns_seconds() {
        assert_eq!(output_of("print clock() > 1000000000;"), "true\n");
    }

    #[test]
    fn test_interpreter_14_closures_share_captured_scope() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() { i = i + 1; return i; }
                return count;
            }
            var c = makeCounter();
            print c();
            print c();
            var d = makeCounter();
            print d();
        "#;

        assert_eq!(output_of(source), "1\n2\n1\n");
    }

    #[test]
    fn test_interpreter_15_closures_in_loop_capture_each_iteration() {
        let source = r#"
            var first;
            var second;
            for (var i = 0; i < 2; i = i + 1) {
                var j = i;
                fun get() { return j; }
                if (first == nil) first = get; else second = get;
            }
            print first();
            print second();
        "#;

        assert_eq!(output_of(source), "0\n1\n");
    }

    #[test]
    fn test_interpreter_16_anonymous_functions() {
        let source = r#"
            fun apply(f, x) { return f(x); }
            print apply(fun (n) { return n * 10; }, 4);
        "#;

        assert_eq!(output_of(source), "40\n");
    }

    #[test]
    fn test_interpreter_17_runtime_error_halts_program() {
        let (output, error) = runtime_error("print 1;\nprint -\"x\";\nprint 2;");

        assert_eq!(output, "1\n");
        assert_eq!(error, "Operand must be a number.\n[line 2]");
    }

    #[test]
    fn test_interpreter_18_operand_errors() {
        assert_eq!(
            runtime_error(r#"print "a" + 1;"#).1,
            "Operands must be two numbers or two strings.\n[line 1]"
        );
        assert_eq!(
            runtime_error(r#"print "a" * 2;"#).1,
            "Operands must be numbers.\n[line 1]"
        );
        assert_eq!(
            runtime_error(r#"print 1 < "2";"#).1,
            "Operands must be two numbers or two strings.\n[line 1]"
        );
        assert_eq!(
            runtime_error("print 1 / 0;").1,
            "Division by zero.\n[line 1]"
        );
    }

    #[test]
    fn test_interpreter_19_call_errors() {
        assert_eq!(
            runtime_error("fun f(a) {}\nf(1, 2);").1,
            "Expected 1 arguments but got 2.\n[line 2]"
        );
        assert_eq!(
            runtime_error(r#""x"();"#).1,
            "Can only call functions and classes.\n[line 1]"
        );
        assert_eq!(
            runtime_error("print y;").1,
            "Undefined variable 'y'.\n[line 1]"
        );
        assert_eq!(
            runtime_error("y = 1;").1,
            "Undefined variable 'y'.\n[line 1]"
        );
    }

    #[test]
    fn test_interpreter_20_static_error_prevents_evaluation() {
        let (outcome, output, diagnostics) = run("print 1;\nprint ;");

        assert_eq!(outcome, Outcome::StaticError);
        assert_eq!(outcome.exit_code(), 65);
        assert!(output.is_empty());
        assert_eq!(diagnostics, ["[line 2] Error at ';': Expected expression"]);
    }

    #[test]
    fn test_interpreter_21_lexical_errors_all_reported() {
        let (outcome, output, diagnostics) = run("print 1; @ # print 2;");

        assert_eq!(outcome, Outcome::StaticError);
        assert!(output.is_empty());
        assert_eq!(
            diagnostics,
            [
                "[line 1] Error: Unexpected character: @",
                "[line 1] Error: Unexpected character: #",
            ]
        );
    }

    #[test]
    fn test_interpreter_21b_lexical_and_syntax_errors_reported_together() {
        let (outcome, output, diagnostics) = run("@ print ;");

        assert_eq!(outcome, Outcome::StaticError);
        assert!(output.is_empty());
        assert_eq!(
            diagnostics,
            [
                "[line 1] Error: Unexpected character: @",
                "[line 1] Error at ';': Expected expression",
            ]
        );
    }

    #[test]
    fn test_interpreter_15b_loop_closure_sees_outer_updates() {
        let source = r#"
            var x = 0;
            var fs;
            for (var i = 0; i < 2; i = i + 1) {
                fs = fun () { return x; };
                x = x + 10;
            }
            print fs();
            x = 99;
            print fs();
        "#;

        assert_eq!(output_of(source), "20\n99\n");
    }

    #[test]
    fn test_interpreter_23_runaway_recursion_is_runtime_error() {
        let source = "fun f(n) { if (n == 0) return 0; return 1 + f(n - 1); }\n\
                      print f(100);\n\
                      print f(5000);\n\
                      print 1;";

        let (outcome, output, diagnostics) = on_large_stack(move || run(source));

        assert_eq!(outcome, Outcome::RuntimeError);
        assert_eq!(outcome.exit_code(), 70);
        assert_eq!(output, "100\n");
        assert_eq!(diagnostics, ["Stack overflow.\n[line 1]"]);
    }

    #[test]
    fn test_interpreter_24_call_depth_recovers_after_overflow() {
        let (deep, shallow, diagnostics) = on_large_stack(|| {
            let mut session = Session::new();
            session
                .lox
                .interpret_line("fun f(n) { if (n == 0) return 0; return 1 + f(n - 1); }");
            let deep = session.lox.interpret_line("f(5000)");
            let shallow = session.lox.interpret_line("f(900)");
            (deep, shallow, session.diagnostics())
        });

        assert_eq!(deep, None);
        assert_eq!(shallow.as_deref(), Some("900"));
        assert_eq!(diagnostics, ["Stack overflow.\n[line 1]"]);
    }

    #[test]
    fn test_interpreter_22_exit_codes() {
        assert_eq!(Outcome::Success.exit_code(), 0);
        assert_eq!(Outcome::RuntimeError.exit_code(), 70);
    }
}
