use vm_translator::{translate_unit, TranslationUnit};

fn unit(stem: &str, source: &str) -> TranslationUnit {
    TranslationUnit {
        file_stem: stem.to_string(),
        source: source.to_string(),
    }
}

#[test]
fn push_push_add_leaves_the_stack_pointer_one_past_the_sum() {
    let units = vec![unit(
        "Simple",
        "push constant 7\npush constant 8\nadd\n",
    )];
    let asm = translate_unit(&units, false).unwrap();
    // Both operands are popped and their sum is pushed back; no bootstrap
    // is emitted for a single non-Sys file.
    assert!(!asm.contains("Sys.init"));
    assert!(asm.contains("D=D+M"));
}

#[test]
fn call_return_restores_the_frame_and_places_the_result_at_old_arg0() {
    let units = vec![unit(
        "Foo",
        "function Foo.bar 2\npush constant 7\nreturn\n",
    )];
    let asm = translate_unit(&units, false).unwrap();
    assert!(asm.contains("(Foo.bar)"));
    // function pushed two local-zero slots before the body ran.
    assert_eq!(asm.matches("@0\nD=A\n").count(), 2);
    // return sequence restores THAT/THIS/ARG/LCL from the saved frame.
    assert!(asm.contains("@THAT\nM=D"));
    assert!(asm.contains("@THIS\nM=D"));
    assert!(asm.contains("@ARG\nM=D"));
    assert!(asm.contains("@LCL\nM=D"));
}

#[test]
fn static_segment_is_mangled_with_the_file_stem() {
    let units = vec![unit("Foo", "push constant 9\npop static 0\n")];
    let asm = translate_unit(&units, false).unwrap();
    assert!(asm.contains("@Foo.0"));
}

#[test]
fn control_flow_labels_are_scoped_per_function_across_files() {
    let units = vec![
        unit("A", "function A.f 0\nlabel LOOP\ngoto LOOP\n"),
        unit("B", "function B.f 0\nlabel LOOP\ngoto LOOP\n"),
    ];
    let asm = translate_unit(&units, false).unwrap();
    assert!(asm.contains("(A.f$LOOP)"));
    assert!(asm.contains("(B.f$LOOP)"));
}

#[test]
fn directory_style_batch_shares_one_bootstrap_and_distinct_return_labels() {
    let units = vec![
        unit("Main", "function Main.main 0\ncall Sys.init 0\nreturn\n"),
        unit(
            "Sys",
            "function Sys.init 0\ncall Main.main 0\nreturn\n",
        ),
    ];
    let asm = translate_unit(&units, false).unwrap();
    assert_eq!(asm.matches("@256").count(), 1);
    assert!(asm.contains("(RETURN_0)"));
    assert!(asm.contains("(RETURN_1)"));
}

#[test]
fn pop_to_constant_segment_is_rejected() {
    let units = vec![unit("Bad", "push constant 1\npop constant 0\n")];
    assert!(translate_unit(&units, false).is_err());
}
