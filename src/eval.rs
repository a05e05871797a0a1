//! Expression scanning and evaluation. An expression is not pre-extracted
//! into its own token buffer the way a conventional compiler would: it's
//! scanned directly out of the character stream the engine is already
//! walking, stopping at the first character that cannot continue it. This
//! mirrors the teacher's `fields.rs` approach of reading fixed-format fields
//! straight out of a shared byte buffer rather than through an intermediate
//! lexer pass.
//!
//! Evaluation is strictly left-to-right — no operator precedence — with one
//! exception: a `*` immediately followed by `/` defers the intermediate
//! product's 12-bit wrap until after the division completes, so `a*b/c`
//! keeps up to 23 bits of precision in the numerator instead of clipping `a*b`
//! to 12 bits first. Every other operator wraps its result immediately.

use crate::error::{LookupError, RuntimeError};
use crate::signed12::Signed12;

/// Everything the evaluator needs to resolve an operand, supplied by the
/// running [`crate::engine::Interpreter`] so this module stays free of
/// engine-wide state.
pub trait EvalContext {
    fn variable(&self, letter: char) -> Signed12;
    fn exp(&self) -> Signed12;
    fn macro_param(&self, letter: char) -> Option<Signed12>;
    fn device_value(&mut self, code: &str) -> Result<Signed12, LookupError>;
    fn consume_paragraph(&mut self, letter: char) -> Result<Signed12, RuntimeError>;
    /// Consumes from whichever paragraph a statement-level `←LETTER` last selected.
    fn consume_current_paragraph(&mut self) -> Result<Signed12, RuntimeError>;
    /// Uniform draw in `[1, |exp|]`, sign of `exp` re-applied, `0` stays `0`.
    fn random(&mut self, magnitude: Signed12) -> Signed12;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    And,
}

/// Characters that can never continue an expression; hitting one ends the
/// scan without consuming it so the caller's own dispatch can act on it.
fn terminates_expression(c: char) -> bool {
    matches!(
        c,
        '.' | ':' | ';' | '@' | '[' | ']' | '(' | ')' | '#' | '!' | '$' | '\n' | '\r'
    ) || c.is_whitespace()
}

fn is_op(c: char) -> Option<Op> {
    match c {
        '+' => Some(Op::Add),
        '-' => Some(Op::Sub),
        '*' => Some(Op::Mul),
        '/' => Some(Op::Div),
        '&' => Some(Op::And),
        _ => None,
    }
}

fn is_random(c: char) -> bool {
    c == '\u{2191}' || c == '^'
}

/// Scans and evaluates one expression starting at `chars[start]`, returning
/// the value and the index just past the last character consumed.
///
/// Lookup and runtime errors (unknown device code, exhausted paragraph) are
/// diagnosed by the caller via the context, which substitutes the documented
/// safe default and lets evaluation continue — they never abort the scan.
pub fn scan_expression(
    chars: &[char],
    start: usize,
    ctx: &mut dyn EvalContext,
    diagnostics: &mut impl FnMut(&str),
) -> (Signed12, usize) {
    let mut pos = start;
    let mut acc = Signed12::ZERO;
    let mut pending_op: Option<Op> = None;
    let mut have_operand = false;

    while pos < chars.len() {
        let c = chars[pos];
        if terminates_expression(c) {
            break;
        }
        if is_random(c) {
            acc = ctx.random(acc);
            pos += 1;
            have_operand = true;
            continue;
        }
        if let Some(op) = is_op(c) {
            pending_op = Some(op);
            pos += 1;
            continue;
        }
        let (value, next) = scan_operand(chars, pos, ctx, diagnostics);
        pos = next;
        match pending_op.take() {
            None => acc = value,
            Some(Op::Add) => acc = acc.add(value),
            Some(Op::Sub) => acc = acc.sub(value),
            Some(Op::And) => acc = acc.and(value),
            Some(Op::Mul) => {
                // 23-bit interior precision: if `/` follows immediately, defer
                // the wrap of this product until the division below applies.
                if chars.get(pos) == Some(&'/') {
                    let product = acc.as_i64() * value.as_i64();
                    pos += 1;
                    let (divisor, next) = scan_operand(chars, pos, ctx, diagnostics);
                    pos = next;
                    if divisor.is_zero() {
                        diagnostics("division by zero");
                        acc = Signed12::ZERO;
                    } else {
                        acc = Signed12::new(product / divisor.as_i64());
                    }
                } else {
                    acc = acc.mul(value);
                }
            }
            Some(Op::Div) => match acc.div(value) {
                Ok(v) => acc = v,
                Err(err) => {
                    diagnostics(&err.to_string());
                    acc = Signed12::ZERO;
                }
            },
        }
        have_operand = true;
    }
    let _ = have_operand;
    (acc, pos)
}

/// One operand: a decimal literal, a macro parameter (`%X`), a paragraph
/// consume (`←X`), a device code (letter + >=1 digit), or a plain variable
/// (bare letter, no trailing digit).
fn scan_operand(
    chars: &[char],
    start: usize,
    ctx: &mut dyn EvalContext,
    diagnostics: &mut impl FnMut(&str),
) -> (Signed12, usize) {
    let c = chars[start];

    if c.is_ascii_digit() {
        let mut end = start;
        while end < chars.len() && chars[end].is_ascii_digit() {
            end += 1;
        }
        let text: String = chars[start..end].iter().collect();
        let value: i64 = text.parse().unwrap_or(0);
        return (Signed12::new(value), end);
    }

    if c == '%' && start + 1 < chars.len() && chars[start + 1].is_ascii_uppercase() {
        let letter = chars[start + 1];
        let value = ctx.macro_param(letter).unwrap_or(Signed12::ZERO);
        return (value, start + 2);
    }

    if c == '\u{2190}' {
        let explicit_letter = chars.get(start + 1).copied().filter(|c| c.is_ascii_uppercase());
        let result = match explicit_letter {
            Some(letter) => ctx.consume_paragraph(letter),
            None => ctx.consume_current_paragraph(),
        };
        let value = match result {
            Ok(v) => v,
            Err(err) => {
                diagnostics(&err.to_string());
                Signed12::ZERO
            }
        };
        let consumed = if explicit_letter.is_some() { 2 } else { 1 };
        return (value, start + consumed);
    }

    if c.is_ascii_uppercase() {
        let mut end = start + 1;
        while end < chars.len() && chars[end].is_ascii_digit() {
            end += 1;
        }
        if end > start + 1 {
            let code: String = chars[start..end].iter().collect();
            let value = match ctx.device_value(&code) {
                Ok(v) => v,
                Err(err) => {
                    diagnostics(&err.to_string());
                    Signed12::ZERO
                }
            };
            return (value, end);
        }
        return (ctx.variable(c), start + 1);
    }

    // Anything else can't start an operand; consume it so the scan makes
    // progress and treat it as a zero so a stray character never loops forever.
    (Signed12::ZERO, start + 1)
}
