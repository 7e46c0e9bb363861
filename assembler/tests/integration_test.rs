use assembler::{code, CommandType, ParserLines, SymbolTable};

/// Runs the same two-pass algorithm as the `asm` binary, but entirely
/// in memory, so the scenarios from the specification's end-to-end
/// examples can be checked without touching the filesystem.
fn assemble_in_memory(lines: &[String]) -> Vec<String> {
    let mut symbols = SymbolTable::new();
    let mut rom_address = 0u16;

    let mut first_pass = ParserLines::from_lines(lines);
    while first_pass.advance() {
        match first_pass.command_type().unwrap() {
            CommandType::LCommand => {
                symbols.add_entry(first_pass.symbol().unwrap(), rom_address);
            }
            CommandType::ACommand | CommandType::CCommand => rom_address += 1,
        }
    }

    let mut ram_address = 16u16;
    let mut second_pass = ParserLines::from_lines(lines);
    let mut out = Vec::new();
    while second_pass.advance() {
        match second_pass.command_type().unwrap() {
            CommandType::ACommand => {
                let symbol = second_pass.symbol().unwrap();
                let address = symbol
                    .parse::<u16>()
                    .unwrap_or_else(|_| symbols.get_or_insert(symbol, &mut ram_address));
                out.push(code::encode_a_instruction(address));
            }
            CommandType::CCommand => {
                let dest = second_pass.dest().unwrap().unwrap_or("");
                let comp = second_pass.comp().unwrap().unwrap_or("");
                let jump = second_pass.jump().unwrap().unwrap_or("");
                out.push(code::encode_c_instruction(dest, comp, jump));
            }
            CommandType::LCommand => {}
        }
    }
    out
}

#[test]
fn scenario_at_2_d_equals_a() {
    let lines = vec!["@2".to_string(), "D=A".to_string()];
    let out = assemble_in_memory(&lines);
    assert_eq!(out, vec!["0000000000000010", "1110110000010000"]);
}

#[test]
fn scenario_new_variable() {
    let lines = vec!["@foo".to_string(), "M=1".to_string()];
    let out = assemble_in_memory(&lines);
    assert_eq!(out, vec!["0000000000010000", "1110111111001000"]);
}

#[test]
fn assembling_twice_is_byte_identical_when_label_free() {
    let lines = vec![
        "@0".to_string(),
        "D=M".to_string(),
        "@1".to_string(),
        "D=D+M".to_string(),
        "@2".to_string(),
        "M=D".to_string(),
    ];
    assert_eq!(assemble_in_memory(&lines), assemble_in_memory(&lines));
}

#[test]
fn labels_consume_no_rom_address() {
    let lines = vec![
        "(START)".to_string(),
        "@START".to_string(),
        "0;JMP".to_string(),
    ];
    let out = assemble_in_memory(&lines);
    // (START) resolves to ROM address 0, the address of the instruction
    // immediately following it.
    assert_eq!(out[0], code::encode_a_instruction(0));
}

#[test]
fn every_instruction_word_has_the_right_leading_bits() {
    let lines = vec![
        "@100".to_string(),
        "D=A".to_string(),
        "D=D+1;JGT".to_string(),
    ];
    let out = assemble_in_memory(&lines);
    assert!(out[0].starts_with('0'));
    assert!(out[1].starts_with("111"));
    assert!(out[2].starts_with("111"));
}
