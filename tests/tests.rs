use std::io::Write;

use musys::device_table::DeviceTable;
use musys::paragraphs::DataParagraphs;
use musys::{loader, Interpreter};

fn run(source: &str, data: &str) -> Interpreter {
    let program = loader::load(source).expect("source loads");
    let paragraphs = DataParagraphs::parse(data);
    let devices = DeviceTable::default_catalog();
    let sink: Box<dyn Write> = Box::new(Vec::new());
    let mut interpreter = Interpreter::new(program, paragraphs, devices, 7, sink);
    interpreter.run();
    interpreter
}

#[test]
fn twelve_bit_wrap_matches_the_worked_arithmetic_example() {
    // ":" emits the full 12-bit value as a single word.
    let interpreter = run("2047+5:$", "");
    assert_eq!(interpreter.buses().bus(1).words(), &["0004".to_string()]);
}

#[test]
fn bare_variable_and_device_code_emit_distinct_fragments() {
    // spec scenario 6: "." emits the low 6 bits (2 octal digits, paired up
    // into one word), ":" emits the full 12-bit value directly.
    let interpreter = run("O.K1. 1000:$", "");
    assert_eq!(
        interpreter.buses().bus(1).words(),
        &["0010".to_string(), "1750".to_string()]
    );
}

#[test]
fn repeat_loop_counts_down_using_a_shared_variable() {
    let interpreter = run("N=3(N=N-1:)$", "");
    assert_eq!(interpreter.buses().bus(1).words().len(), 3);
}

#[test]
fn conditional_body_runs_only_when_exp_is_positive() {
    let interpreter = run("A=1[B=9:]A=0[B=8:]$", "");
    assert_eq!(interpreter.buses().bus(1).words(), &["0011".to_string()]);
}

#[test]
fn recursive_macro_computes_a_factorial() {
    let source = "#FAC 4; N:$ FAC%A-1[#FAC %A-1;N=%A*N@]N=1@";
    let interpreter = run(source, "");
    assert_eq!(interpreter.buses().bus(1).words(), &["0030".to_string()]);
}

#[test]
fn data_paragraph_select_then_bare_arrow_consumes_in_order() {
    // "<-A" selects paragraph A as current without consuming; the bare "<-"
    // inside the assignment's expression then consumes its first value.
    let source = "\u{2190}A A=\u{2190}:$";
    let interpreter = run(source, "7, 8, 9\n");
    assert_eq!(interpreter.buses().bus(1).words(), &["0007".to_string()]);
}

#[test]
fn goto_reaches_a_numeric_label_in_the_main_program() {
    let source = "G10 A=9.\n10 A=1:\n$";
    let interpreter = run(source, "");
    assert_eq!(interpreter.buses().bus(1).words(), &["0001".to_string()]);
}

#[test]
fn bus_select_routes_emissions_to_the_chosen_bus() {
    let source = "!3A=5:$";
    let interpreter = run(source, "");
    assert!(interpreter.buses().bus(1).words().is_empty());
    assert_eq!(interpreter.buses().bus(3).words(), &["0005".to_string()]);
}

#[test]
fn unknown_device_code_is_diagnosed_and_substitutes_zero() {
    let interpreter = run("Z9:$", "");
    assert_eq!(interpreter.buses().bus(1).words(), &["0000".to_string()]);
}

#[test]
fn device_catalog_override_file_parses_and_resolves() {
    let table = DeviceTable::parse("X1 5 Custom test device\n").unwrap();
    assert_eq!(table.id_of("X1"), Some(5));
}

#[test]
fn error_display_text_names_the_offending_path() {
    let err = musys::LoadError::SourceUnreadable {
        path: "missing.mus".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
    };
    assert!(err.to_string().contains("missing.mus"));
}
