mod common;

#[cfg(test)]
mod resolver_tests {
    use super::common::{output_of, run};
    use loxwalk::Outcome;

    fn static_errors(source: &str) -> Vec<String> {
        let (outcome, output, diagnostics) = run(source);
        assert_eq!(outcome, Outcome::StaticError);
        assert!(output.is_empty(), "nothing may run: {:?}", output);
        diagnostics
    }

    #[test]
    fn test_resolver_01_return_at_top_level() {
        assert_eq!(
            static_errors("print 1;\nreturn 2;"),
            ["[line 2] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_resolver_02_read_in_own_initializer() {
        assert_eq!(
            static_errors("{ var a = 1; { var a = a; } }"),
            ["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_resolver_03_self_outside_class() {
        assert_eq!(
            static_errors("fun f() { return self; }"),
            ["[line 1] Error at 'self': Can't use 'self' outside of a class."]
        );
    }

    #[test]
    fn test_resolver_04_super_misuse() {
        assert_eq!(
            static_errors("super.x;"),
            ["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
        assert_eq!(
            static_errors("class A { m() { return super.m(); } }"),
            ["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_resolver_05_inherit_from_self() {
        assert_eq!(
            static_errors("class A < A {}"),
            ["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_resolver_06_local_redeclaration() {
        assert_eq!(
            static_errors("{ var a = 1; var a = 2; }"),
            ["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_resolver_07_global_redeclaration_is_allowed() {
        assert_eq!(output_of("var a = 1; var a = 2; print a;"), "2\n");
    }

    #[test]
    fn test_resolver_08_reports_every_error() {
        let errors = static_errors("return 1;\nprint self;\n{ var b = 1; var b = 2; }");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_resolver_09_binding_fixed_at_resolution() {
        let source = r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;

        assert_eq!(output_of(source), "global\nglobal\n");
    }

    #[test]
    fn test_resolver_10_globals_resolve_late() {
        let source = r#"
            fun isEven(n) { return n == 0 ? true : isOdd(n - 1); }
            fun isOdd(n) { return n == 0 ? false : isEven(n - 1); }
            print isEven(10);
        "#;

        assert_eq!(output_of(source), "true\n");
    }
}
