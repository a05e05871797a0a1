//! Splits raw source text into the executable main program and the macro
//! table, the way the original simulator's `Compiler.__init__` does: one split
//! on `$`, then per-line label extraction on the left half and per-macro
//! splitting on the right half.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::LoadError;

#[derive(Debug, Clone)]
pub struct MacroDef {
    pub name: String,
    pub body: Rc<str>,
}

#[derive(Debug, Clone)]
pub struct LoadedProgram {
    /// Main-program text, one entry per non-empty source line, labels stripped.
    pub lines: Vec<String>,
    /// label -> index into `lines`.
    pub labels: HashMap<i64, usize>,
    pub macros: HashMap<String, MacroDef>,
}

impl LoadedProgram {
    /// Flattens the line-oriented program into one character buffer (lines
    /// joined by `\n`) plus a label -> char-offset map, and converts each
    /// macro body into the `Rc<[char]>` form the engine indexes by position.
    pub fn into_program(self) -> (Vec<char>, HashMap<i64, usize>, HashMap<String, Rc<[char]>>) {
        let mut text = String::new();
        let mut offsets = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            offsets.push(text.chars().count());
            text.push_str(line);
            text.push('\n');
        }
        let chars: Vec<char> = text.chars().collect();
        let label_offsets = self
            .labels
            .into_iter()
            .map(|(label, line_index)| (label, offsets[line_index]))
            .collect();
        let macros = self
            .macros
            .into_iter()
            .map(|(name, def)| (name, Rc::from(def.body.chars().collect::<Vec<char>>())))
            .collect();
        (chars, label_offsets, macros)
    }
}

pub fn load(source: &str) -> Result<LoadedProgram, LoadError> {
    let (main_text, macro_text) = split_source(source);
    let lines = split_into_lines(main_text);
    let (lines, labels) = extract_labels(lines)?;
    let macros = parse_macros(macro_text)?;
    Ok(LoadedProgram {
        lines,
        labels,
        macros,
    })
}

/// Splits the source exactly once on `$`; everything after the first `$` is
/// the macro area, even if it contains further `$` characters (there should be none).
fn split_source(source: &str) -> (&str, &str) {
    match source.split_once('$') {
        Some((main, macros)) => (main, macros),
        None => (source, ""),
    }
}

fn split_into_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect()
}

/// A line beginning with `digits whitespace` defines a label; the digits and
/// the following whitespace are stripped from the executable text.
fn extract_labels(lines: Vec<String>) -> Result<(Vec<String>, HashMap<i64, usize>), LoadError> {
    let mut labels = HashMap::new();
    let mut stripped = Vec::with_capacity(lines.len());
    for (index, line) in lines.into_iter().enumerate() {
        let digit_count = line.chars().take_while(|c| c.is_ascii_digit()).count();
        if digit_count > 0 {
            let rest = &line[digit_count..];
            if let Some(after_ws) = rest.strip_prefix(char::is_whitespace) {
                let label: i64 =
                    line[..digit_count]
                        .parse()
                        .map_err(|_| LoadError::MalformedLabel {
                            line: index,
                            text: line.clone(),
                        })?;
                labels.insert(label, index);
                stripped.push(after_ws.trim_start().to_string());
                continue;
            }
        }
        stripped.push(line);
    }
    Ok((stripped, labels))
}

/// Splits the macro area into definitions. An `@` is a definition boundary
/// only when what follows it (after whitespace) is a new macro header
/// (2-6 uppercase letters) or end of text; otherwise it's body text — an
/// early-return `@` inside a recursive macro, as in the factorial example.
fn parse_macros(text: &str) -> Result<HashMap<String, MacroDef>, LoadError> {
    let mut macros = HashMap::new();
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut boundaries = vec![0usize];
    for (i, &c) in chars.iter().enumerate() {
        if c != '@' {
            continue;
        }
        let mut j = i + 1;
        while j < len && chars[j].is_whitespace() {
            j += 1;
        }
        if j == len || starts_macro_header(&chars[j..]) {
            boundaries.push(i + 1);
        }
    }
    boundaries.push(len);
    boundaries.dedup();

    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        let fragment: String = chars[start..end].iter().collect();
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }
        let header_len = fragment
            .chars()
            .take_while(|c| c.is_ascii_uppercase())
            .count();
        if header_len == 0 {
            continue;
        }
        if header_len > 6 {
            return Err(LoadError::MacroNameTooLong {
                name: fragment.chars().take(header_len).collect(),
            });
        }
        let name: String = fragment.chars().take(header_len).collect();
        let body: String = fragment.chars().skip(header_len).collect();
        let body = body.trim_start();
        // Re-attach the boundary `@` the window excluded, unless this is the
        // final fragment and the source never had a terminal `@`.
        let body = if end < len { format!("{body} @") } else { body.to_string() };
        macros.insert(
            name.clone(),
            MacroDef {
                name,
                body: Rc::from(body.as_str()),
            },
        );
    }
    Ok(macros)
}

fn starts_macro_header(rest: &[char]) -> bool {
    let header_len = rest.iter().take_while(|c| c.is_ascii_uppercase()).count();
    if !(2..=6).contains(&header_len) {
        return false;
    }
    match rest.get(header_len) {
        None => true,
        Some(c) => c.is_whitespace(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_dollar_only() {
        let (main, macros) = split_source("A=1 $ FOO B=2 @");
        assert_eq!(main.trim(), "A=1");
        assert_eq!(macros.trim(), "FOO B=2 @");
    }

    #[test]
    fn label_prefix_is_extracted_and_stripped() {
        let (lines, labels) = extract_labels(vec!["10 A=1".to_string(), "B=2".to_string()]).unwrap();
        assert_eq!(lines, vec!["A=1".to_string(), "B=2".to_string()]);
        assert_eq!(labels.get(&10), Some(&0));
    }

    #[test]
    fn factorial_macro_body_keeps_embedded_early_return() {
        // from spec.md scenario 5
        let macros = parse_macros(" FAC %A-1[#FAC %A-1; N=%A*N @] N=1 @").unwrap();
        let fac = macros.get("FAC").expect("FAC defined");
        assert_eq!(&*fac.body, "%A-1[#FAC %A-1; N=%A*N @] N=1 @");
    }

    #[test]
    fn multiple_macros_split_on_genuine_boundaries() {
        let macros = parse_macros("FOO A=1 @ BAR B=2 @").unwrap();
        assert_eq!(&*macros.get("FOO").unwrap().body, "A=1 @");
        assert_eq!(&*macros.get("BAR").unwrap().body, "B=2 @");
    }

    #[test]
    fn overlong_macro_name_is_rejected() {
        assert!(parse_macros("TOOLONGNAME A=1 @").is_err());
    }
}
