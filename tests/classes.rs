mod common;

#[cfg(test)]
mod class_tests {
    use super::common::{output_of, run};
    use loxwalk::Outcome;

    fn runtime_error(source: &str) -> String {
        let (outcome, _, diagnostics) = run(source);
        assert_eq!(outcome, Outcome::RuntimeError, "diagnostics: {:?}", diagnostics);
        diagnostics.join("\n")
    }

    #[test]
    fn test_classes_01_fields_and_rendering() {
        let source = r#"
            class Box {}
            var b = Box();
            b.v = 3;
            print b.v;
            print b;
            print Box;
        "#;

        assert_eq!(output_of(source), "3\nBox instance\nBox\n");
    }

    #[test]
    fn test_classes_02_getter_runs_on_access() {
        let source = r#"
            class Foo {
                init() { self.x = 1; }
                getX { return self.x; }
            }
            print Foo().getX;
        "#;

        assert_eq!(output_of(source), "1\n");
    }

    #[test]
    fn test_classes_03_bound_method_keeps_receiver() {
        let source = r#"
            class Cat {
                init(name) { self.name = name; }
                speak() { return self.name + " meows"; }
            }
            var speak = Cat("tom").speak;
            print speak();
            print speak;
        "#;

        assert_eq!(output_of(source), "tom meows\n<fn speak>\n");
    }

    #[test]
    fn test_classes_04_initializer_returns_instance() {
        let source = r#"
            class P {
                init() { self.v = 1; return; }
            }
            var p = P();
            print p.init();
            print p.init() == p;
            print p.v;
        "#;

        assert_eq!(output_of(source), "P instance\ntrue\n1\n");
    }

    #[test]
    fn test_classes_05_class_arity_follows_init() {
        assert_eq!(
            runtime_error("class P { init(a, b) {} }\nP(1);"),
            "Expected 2 arguments but got 1.\n[line 2]"
        );
        assert_eq!(
            runtime_error("class Q {}\nQ(1);"),
            "Expected 0 arguments but got 1.\n[line 2]"
        );
    }

    #[test]
    fn test_classes_06_class_methods() {
        let source = r#"
            class Math {
                class square(n) { return n * n; }
            }
            print Math.square(3);
        "#;

        assert_eq!(output_of(source), "9\n");
    }

    #[test]
    fn test_classes_07_instance_methods_not_on_class() {
        assert_eq!(
            runtime_error("class A { m() {} }\nA.m;"),
            "Undefined property 'm'.\n[line 2]"
        );
    }

    #[test]
    fn test_classes_08_inheritance_and_super() {
        let source = r#"
            class A {
                init(n) { self.n = n; }
                greet() { return "A" + self.n; }
            }
            class B < A {
                greet() { return "B+" + super.greet(); }
            }
            class C < B {}
            print C("!").greet();
        "#;

        assert_eq!(output_of(source), "B+A!\n");
    }

    #[test]
    fn test_classes_09_class_methods_inherit_through_metaclass() {
        let source = r#"
            class A {
                class make() { return "A.make"; }
            }
            class B < A {
                class make() { return "B>" + super.make(); }
            }
            class C < A {}
            print B.make();
            print C.make();
        "#;

        assert_eq!(output_of(source), "B>A.make\nA.make\n");
    }

    #[test]
    fn test_classes_10_property_errors() {
        assert_eq!(
            runtime_error("class E {}\nE().nope;"),
            "Undefined property 'nope'.\n[line 2]"
        );
        assert_eq!(
            runtime_error("var n = 1;\nn.x;"),
            "Only instances have properties.\n[line 2]"
        );
        assert_eq!(
            runtime_error("var n = 1;\nn.x = 2;"),
            "Only instances have fields.\n[line 2]"
        );
    }

    #[test]
    fn test_classes_11_superclass_must_be_class() {
        assert_eq!(
            runtime_error("var NotClass = 1;\nclass A < NotClass {}"),
            "Superclass must be a class.\n[line 2]"
        );
    }

    #[test]
    fn test_classes_12_fields_shadow_methods() {
        let source = r#"
            class A { m() { return "method"; } }
            var a = A();
            print a.m();
            a.m = fun () { return "field"; };
            print a.m();
        "#;

        assert_eq!(output_of(source), "method\nfield\n");
    }
}
