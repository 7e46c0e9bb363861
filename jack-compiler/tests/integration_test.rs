use jack_compiler::compile_source;

#[test]
fn method_call_emits_implicit_this_receiver() {
    let source = r#"
        class Square {
            method void run() {
                do draw();
                return;
            }
            method void draw() {
                return;
            }
        }
    "#;
    let vm = compile_source(source).unwrap();
    assert!(vm.contains("push pointer 0\ncall Square.draw 1\npop temp 0"));
}

#[test]
fn array_write_matches_the_literal_scenario_order() {
    let source = r#"
        class Main {
            function void main() {
                var Array a;
                var int i, j;
                let a[i] = a[j] + 1;
                return;
            }
        }
    "#;
    let vm = compile_source(source).unwrap();
    // a, i, j are VAR-kind locals at indices 0, 1, 2.
    let expected = "\
push local 0
push local 1
add
push local 0
push local 2
add
pop pointer 1
push that 0
push constant 1
add
pop temp 0
pop pointer 1
push temp 0
pop that 0
";
    assert!(vm.contains(expected));
}

#[test]
fn constructor_of_zero_field_class_still_allocates() {
    let source = "class Empty { constructor Empty new() { return this; } }";
    let vm = compile_source(source).unwrap();
    assert!(vm.contains("push constant 0\ncall Memory.alloc 1\npop pointer 0"));
    assert!(vm.contains("push pointer 0\nreturn"));
}

#[test]
fn no_else_if_statement_omits_the_end_label_and_goto() {
    let source = "class Main { function void f() { if (true) { } return; } }";
    let vm = compile_source(source).unwrap();
    assert!(!vm.contains("IF_END"));
}

#[test]
fn unknown_method_call_receiver_class_is_treated_as_a_function_call() {
    let source = "class Main { function void f() { do Output.println(); return; } }";
    let vm = compile_source(source).unwrap();
    assert!(vm.contains("call Output.println 0"));
}

#[test]
fn parse_error_in_malformed_source_is_reported() {
    let source = "class Main { function void f() { let = 1; return; } }";
    assert!(compile_source(source).is_err());
}
