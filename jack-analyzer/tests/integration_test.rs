use jack_analyzer::analyze_source;

#[test]
fn square_like_class_parses_into_nested_tags() {
    let source = r#"
        class Square {
            field int x, y;
            field int size;

            constructor Square new(int Ax, int Ay, int Asize) {
                let x = Ax;
                let y = Ay;
                let size = Asize;
                return this;
            }

            method void dispose() {
                do Memory.deAlloc(this);
                return;
            }

            method int getSize() {
                return size;
            }
        }
    "#;

    let (tokens_xml, tree_xml) = analyze_source(source).unwrap();
    assert!(tokens_xml.starts_with("<tokens>"));
    assert!(tokens_xml.trim_end().ends_with("</tokens>"));
    assert!(tree_xml.contains("<subroutineDec>"));
    assert!(tree_xml.contains("<keyword> constructor </keyword>"));
    assert!(tree_xml.contains("<keyword> this </keyword>"));
}

#[test]
fn array_and_method_call_terms_parse() {
    let source = r#"
        class Main {
            function void main() {
                var Array a;
                let a[0] = a.length();
                return;
            }
        }
    "#;
    let (_, tree_xml) = analyze_source(source).unwrap();
    assert!(tree_xml.contains("<symbol> [ </symbol>"));
    assert!(tree_xml.contains("<symbol> . </symbol>"));
}

#[test]
fn unterminated_string_surfaces_as_an_error() {
    let source = "class Main { function void f() { do g(\"oops); return; } }";
    assert!(analyze_source(source).is_err());
}
