//! The interpreter proper: a single character-stream dispatch loop over the
//! main program, descending into macro activations and back out again. There
//! is no separate statement parser — each dispatch cycle looks at exactly one
//! character, decides what kind of thing starts there, and consumes as many
//! characters as that construct needs. Grounded in the teacher's `processor.rs`
//! fetch-decode-execute loop, generalized from fixed-width binary opcodes to
//! variable-width textual ones.

use std::io::Write;
use std::rc::Rc;

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use tracing::{debug, warn};

use crate::bus::BusBuffer;
use crate::device_table::DeviceTable;
use crate::error::{LookupError, RuntimeError};
use crate::eval::{self, EvalContext};
use crate::loader::LoadedProgram;
use crate::paragraphs::DataParagraphs;
use crate::signed12::Signed12;
use crate::frame::{ActivationId, Frame, FrameStack, SourceRef};

const MAX_STEPS: u64 = 10_000_000;

pub struct Interpreter {
    vars: [Signed12; 26],
    exp: Signed12,
    data: DataParagraphs,
    current_paragraph: Option<char>,
    bus: BusBuffer,
    current_bus: usize,
    device_table: DeviceTable,
    macros: std::collections::HashMap<String, Rc<[char]>>,
    program: Rc<[char]>,
    labels: std::collections::HashMap<i64, usize>,
    frames: FrameStack,
    rng: Pcg32,
    print_sink: Box<dyn Write>,
    halted: bool,
}

impl Interpreter {
    pub fn new(
        program: LoadedProgram,
        data: DataParagraphs,
        device_table: DeviceTable,
        seed: u64,
        print_sink: Box<dyn Write>,
    ) -> Self {
        let (chars, labels, macros) = program.into_program();
        Interpreter {
            vars: [Signed12::ZERO; 26],
            exp: Signed12::ZERO,
            data,
            current_paragraph: None,
            bus: BusBuffer::new(),
            current_bus: 1,
            device_table,
            macros,
            program: Rc::from(chars),
            labels,
            frames: FrameStack::new(Frame::main_program(0)),
            rng: Pcg32::seed_from_u64(seed),
            print_sink,
            halted: false,
        }
    }

    pub fn buses(&self) -> &BusBuffer {
        &self.bus
    }

    /// Runs to completion: the main program frame pops (an unmatched `@` at
    /// top level) or a `$` sentinel / end of text is reached.
    pub fn run(&mut self) {
        let mut steps = 0u64;
        while !self.halted {
            if !self.step() {
                break;
            }
            steps += 1;
            if steps >= MAX_STEPS {
                warn!("step budget exhausted, halting run defensively");
                break;
            }
        }
    }

    fn current_chars(&self) -> Rc<[char]> {
        match self.frames.top().source {
            SourceRef::MainProgram => self.program.clone(),
            SourceRef::MacroActivation(id) => self.frames.activation(id).body.clone(),
        }
    }

    /// Executes one dispatch cycle. Returns `false` when the run is over.
    fn step(&mut self) -> bool {
        let chars = self.current_chars();
        let pos = self.frames.top().pos;

        if pos >= chars.len() {
            return self.fall_off_end();
        }

        let c = chars[pos];
        debug!(%c, pos, "dispatch");

        if c.is_whitespace() {
            self.frames.top_mut().pos += 1;
            return true;
        }
        match c {
            '\\' => self.dispatch_literal(&chars, pos),
            '[' => self.dispatch_conditional(&chars, pos),
            ']' => {
                self.frames.top_mut().pos += 1;
            }
            '(' => self.dispatch_repeat_open(&chars, pos),
            ')' => self.dispatch_repeat_close(&chars, pos),
            '#' => self.dispatch_macro_call(&chars, pos),
            '@' => return self.dispatch_pop(),
            'G' if chars.get(pos + 1).is_some_and(|c| c.is_ascii_digit()) => {
                self.dispatch_goto(&chars, pos)
            }
            '!' if chars.get(pos + 1).is_some_and(|c| c.is_ascii_digit()) => {
                self.dispatch_bus_select(&chars, pos)
            }
            '\u{2190}' if self.at_statement_start(&chars, pos)
                && chars.get(pos + 1).is_some_and(|c| c.is_ascii_uppercase()) =>
            {
                self.current_paragraph = Some(chars[pos + 1]);
                self.frames.top_mut().pos += 2;
            }
            '.' | ':' => self.dispatch_emit(c),
            letter if letter.is_ascii_uppercase() && chars.get(pos + 1) == Some(&'=') => {
                self.dispatch_assignment(&chars, pos, letter)
            }
            _ => self.dispatch_expression_fallback(&chars, pos),
        }
        true
    }

    /// A `←` selects a paragraph only when it opens a statement; mid-expression
    /// it's a consuming operand, handled inside [`eval::scan_expression`] instead.
    fn at_statement_start(&self, chars: &[char], pos: usize) -> bool {
        pos == 0
            || matches!(chars[pos - 1], '.' | ':' | ';' | '@' | '\n')
    }

    fn fall_off_end(&mut self) -> bool {
        match self.frames.top().source {
            SourceRef::MainProgram => {
                self.halted = true;
                false
            }
            SourceRef::MacroActivation(_) => {
                // implicit return: body ended without an explicit `@`.
                if self.frames.pop().is_none() {
                    self.halted = true;
                    false
                } else {
                    true
                }
            }
        }
    }

    fn dispatch_literal(&mut self, chars: &[char], pos: usize) {
        let mut end = pos + 1;
        while end < chars.len() && chars[end] != '\\' {
            end += 1;
        }
        let text: String = chars[pos + 1..end].iter().collect();
        let _ = write!(self.print_sink, "{text}");
        self.frames.top_mut().pos = (end + 1).min(chars.len());
    }

    fn dispatch_conditional(&mut self, chars: &[char], pos: usize) {
        if self.exp.is_positive() {
            self.frames.top_mut().pos = pos + 1;
        } else {
            let end = matching_close(chars, pos, '[', ']').unwrap_or(chars.len());
            self.frames.top_mut().pos = (end + 1).min(chars.len());
        }
    }

    fn dispatch_repeat_open(&mut self, chars: &[char], pos: usize) {
        let count = self.exp.get();
        if count <= 0 {
            let end = matching_close(chars, pos, '(', ')').unwrap_or(chars.len());
            self.frames.top_mut().pos = (end + 1).min(chars.len());
            return;
        }
        let body_start = pos + 1;
        let source = self.frames.top().source;
        self.frames.push(Frame {
            source,
            pos: body_start,
            loop_start: Some(body_start),
            counter: (count - 1) as u32,
        });
    }

    fn dispatch_repeat_close(&mut self, chars: &[char], pos: usize) {
        let top = *self.frames.top();
        if let Some(loop_start) = top.loop_start {
            if top.counter > 0 {
                let frame = self.frames.top_mut();
                frame.counter -= 1;
                frame.pos = loop_start;
            } else {
                self.frames.pop();
                self.frames.top_mut().pos = (pos + 1).min(chars.len());
            }
        } else {
            // stray `)` with no matching loop frame; skip past it rather than
            // getting stuck, this never occurs on a well-formed program.
            self.frames.top_mut().pos = pos + 1;
        }
    }

    fn dispatch_macro_call(&mut self, chars: &[char], pos: usize) {
        let mut end = pos + 1;
        while end < chars.len() && chars[end].is_ascii_uppercase() {
            end += 1;
        }
        let name: String = chars[pos + 1..end].iter().collect();

        let mut args = Vec::new();
        let mut cursor = end;
        while cursor < chars.len() && chars[cursor] != ';' {
            if chars[cursor] == ',' || chars[cursor].is_whitespace() {
                cursor += 1;
                continue;
            }
            let (value, next) = eval::scan_expression(chars, cursor, self, &mut |msg| warn!(%msg));
            args.push(value);
            cursor = next;
        }
        let after_call = (cursor + 1).min(chars.len());
        self.frames.top_mut().pos = after_call;

        match self.macros.get(&name).cloned() {
            Some(body) => {
                self.frames.begin_activation(name, body, args);
            }
            None => warn!(%name, "{}", LookupError::UnknownMacro(name.clone())),
        }
    }

    fn dispatch_pop(&mut self) -> bool {
        if self.frames.pop().is_none() {
            self.halted = true;
            false
        } else {
            true
        }
    }

    fn dispatch_goto(&mut self, chars: &[char], pos: usize) {
        let mut end = pos + 1;
        while end < chars.len() && chars[end].is_ascii_digit() {
            end += 1;
        }
        let text: String = chars[pos + 1..end].iter().collect();
        let label: i64 = text.parse().unwrap_or(0);
        match self.labels.get(&label).copied() {
            Some(offset) => {
                while self.frames.pop().is_some() {}
                self.frames.top_mut().pos = offset;
            }
            None => {
                warn!("{}", RuntimeError::UndefinedLabel(label));
                self.frames.top_mut().pos = end;
            }
        }
    }

    fn dispatch_bus_select(&mut self, chars: &[char], pos: usize) {
        let digit = chars[pos + 1].to_digit(10).unwrap_or(1) as usize;
        self.current_bus = digit.clamp(1, crate::bus::BUS_COUNT);
        self.frames.top_mut().pos = pos + 2;
    }

    fn dispatch_emit(&mut self, kind: char) {
        // `.` emits the low 6 bits (2 octal digits); `:` emits the full
        // 12-bit value (4 octal digits).
        let octal = if kind == '.' {
            format_octal_masked(self.exp, 6, 2)
        } else {
            format_octal_masked(self.exp, 12, 4)
        };
        self.bus.send(self.current_bus, &octal);
        self.frames.top_mut().pos += 1;
    }

    fn dispatch_assignment(&mut self, chars: &[char], pos: usize, letter: char) {
        let start = pos + 2;
        let (value, next) = eval::scan_expression(chars, start, self, &mut |msg| warn!(%msg));
        self.vars[(letter as u8 - b'A') as usize] = value;
        self.exp = value;
        self.frames.top_mut().pos = next;
    }

    fn dispatch_expression_fallback(&mut self, chars: &[char], pos: usize) {
        let (value, next) = eval::scan_expression(chars, pos, self, &mut |msg| warn!(%msg));
        self.exp = value;
        self.frames.top_mut().pos = next.max(pos + 1);
    }
}

impl EvalContext for Interpreter {
    fn variable(&self, letter: char) -> Signed12 {
        self.vars[(letter as u8 - b'A') as usize]
    }

    fn exp(&self) -> Signed12 {
        self.exp
    }

    fn macro_param(&self, letter: char) -> Option<Signed12> {
        self.frames
            .innermost_activation()
            .map(|activation| activation.param(letter))
    }

    fn device_value(&mut self, code: &str) -> Result<Signed12, LookupError> {
        self.device_table
            .id_of(code)
            .map(|id| Signed12::new(id as i64))
            .ok_or_else(|| LookupError::UnknownDevice(code.to_string()))
    }

    fn consume_paragraph(&mut self, letter: char) -> Result<Signed12, RuntimeError> {
        self.data
            .consume(letter)
            .map(|v| Signed12::new(v as i64))
            .ok_or(RuntimeError::ParagraphExhausted(letter))
    }

    fn consume_current_paragraph(&mut self) -> Result<Signed12, RuntimeError> {
        let letter = self.current_paragraph.unwrap_or('A');
        self.consume_paragraph(letter)
    }

    fn random(&mut self, magnitude: Signed12) -> Signed12 {
        let m = magnitude.get();
        if m == 0 {
            return Signed12::ZERO;
        }
        let bound = m.unsigned_abs() as i64;
        let draw = self.rng.gen_range(1..=bound);
        Signed12::new(if m < 0 { -draw } else { draw })
    }
}

/// Finds the index of the `close` matching the `open` at `pos`, accounting
/// for nesting of the same bracket pair.
fn matching_close(chars: &[char], pos: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0i32;
    let mut i = pos;
    while i < chars.len() {
        if chars[i] == open {
            depth += 1;
        } else if chars[i] == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Renders a [`Signed12`] as a fixed-width octal string for bus emission.
/// The sign-magnitude value's absolute magnitude is what gets encoded; the
/// sign itself has no separate bus representation in the historical wire
/// format. `bits` masks the magnitude down to its low N bits first, so a
/// 6-bit emission always prints exactly the requested `width` octal digits
/// (the last two octal digits of the value) even when the magnitude exceeds
/// what 6 bits can hold.
fn format_octal_masked(value: Signed12, bits: u32, width: usize) -> String {
    let mask = (1u32 << bits) - 1;
    let magnitude = value.get().unsigned_abs() & mask;
    format!("{:0width$o}", magnitude, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;

    fn run_program(source: &str, data: &str) -> Interpreter {
        let loaded = loader::load(source).unwrap();
        let paragraphs = DataParagraphs::parse(data);
        let devices = DeviceTable::default_catalog();
        let sink: Box<dyn Write> = Box::new(Vec::new());
        let mut interp = Interpreter::new(loaded, paragraphs, devices, 1, sink);
        interp.run();
        interp
    }

    #[test]
    fn wrap_worked_example_emits_wrapped_value() {
        // spec scenario 3: "2047+5:" -> EXP==-4, emitted as a full 12-bit word.
        let interp = run_program("2047+5:$", "");
        assert_eq!(interp.exp.get(), -4);
        assert_eq!(interp.bus.bus(1).words().len(), 1);
    }

    #[test]
    fn device_code_and_bare_variable_resolve_differently() {
        // spec scenario 6: "O.K1. 1000:" -> bus 1 == ["0010", "1750"].
        let interp = run_program("O.K1. 1000:$", "");
        assert_eq!(
            interp.bus.bus(1).words(),
            &["0010".to_string(), "1750".to_string()]
        );
    }

    #[test]
    fn assignment_updates_variable_and_exp() {
        let interp = run_program("A=5.$", "");
        assert_eq!(interp.vars[0].get(), 5);
        assert_eq!(interp.exp.get(), 5);
    }

    #[test]
    fn repeat_loop_executes_body_n_times() {
        // N=0 once, then repeat "N=N+1." three times using N itself as counter.
        let interp = run_program("N=3(N=N-1.)$", "");
        assert_eq!(interp.vars[13].get(), 0);
    }

    #[test]
    fn conditional_skips_body_when_exp_not_positive() {
        let interp = run_program("A=0[B=9.]A=1.$", "");
        assert_eq!(interp.vars[1].get(), 0);
        assert_eq!(interp.exp.get(), 1);
    }

    #[test]
    fn factorial_macro_recursion_matches_worked_example() {
        let source = "N=1 #FAC 4; N.$ FAC%A-1[#FAC %A-1;N=%A*N@]N=1@";
        let interp = run_program(source, "");
        assert_eq!(interp.vars[13].get(), 24);
    }
}
