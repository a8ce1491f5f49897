//! Parser for the AIGER format, both ASCII (`aag`) and binary (`aig`).
//!
//! The format is detected from the header tag, not the file extension: a
//! lot of people do not care about `aig` vs `aag` in practice (cf the
//! official benchmarks), but the tag is always right.
//!
//! Diagnostics carry the file and line number wherever a line number makes
//! sense. Everything the checks below reject is fatal: inputs are static
//! files, so there is nothing to retry.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::aig::{Aig, AigNode, Literal};
use crate::error::ParserError;

/// Detail-only parse result. The [`Source`] wraps details with the file and
/// line context, so the per-line helpers stay easy to test on bare strings.
type Parsed<T> = std::result::Result<T, String>;

fn read_u32(s: &str) -> Parsed<u32> {
    s.parse::<u32>()
        .map_err(|_| format!("invalid token: {} (expected an unsigned integer)", s))
}

fn tokens(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    binary: bool,
    m: u32,
    i: u32,
    l: u32,
    o: u32,
    a: u32,
}

impl Header {
    /// Largest literal any line of the body may mention: `2 * M + 1`.
    fn max_literal(&self) -> Literal {
        2 * self.m + 1
    }
}

fn parse_header(line: &str) -> Parsed<Header> {
    let t = tokens(line);

    if t.len() < 6 {
        return Err("missing header tokens, expected 'aag|aig M I L O A'".to_string());
    }
    if t.len() > 6 {
        return Err(format!(
            "header only supports M I L O A, got extra token {}",
            t[6]
        ));
    }

    let binary = match t[0] {
        "aag" => false,
        "aig" => true,
        other => return Err(format!("expected aag or aig, got {}", other)),
    };

    let m = read_u32(t[1])?;
    let i = read_u32(t[2])?;
    let l = read_u32(t[3])?;
    let o = read_u32(t[4])?;
    let a = read_u32(t[5])?;

    if m != i + l + a {
        return Err(format!(
            "invalid checksum: the maximum variable index ({}) must equal \
             the sum of the number of inputs, latches and and-nodes ({})",
            m,
            i + l + a
        ));
    }

    Ok(Header { binary, m, i, l, o, a })
}

/// A buffered reader together with the file name and current line number,
/// so every error it produces points at the offending line.
struct Source<R> {
    reader: R,
    file: String,
    line: u32,
}

impl<R: BufRead> Source<R> {
    fn new(reader: R, file: &str) -> Self {
        Source {
            reader,
            file: file.to_string(),
            line: 0,
        }
    }

    fn invalid(&self, detail: impl Into<String>) -> ParserError {
        ParserError::Invalid {
            file: self.file.clone(),
            line: self.line,
            detail: detail.into(),
        }
    }

    fn corrupt(&self, detail: impl Into<String>) -> ParserError {
        ParserError::Corrupt {
            file: self.file.clone(),
            detail: detail.into(),
        }
    }

    fn io(&self, err: std::io::Error) -> ParserError {
        ParserError::Io {
            path: self.file.clone(),
            detail: err.to_string(),
        }
    }

    /// Next line of the file; errors on end of file.
    fn next_line(&mut self) -> std::result::Result<String, ParserError> {
        self.line += 1;
        let mut buf = String::new();
        let n = self.reader.read_line(&mut buf).map_err(|e| self.io(e))?;
        if n == 0 {
            return Err(self.invalid("unexpected end of file"));
        }
        Ok(buf)
    }

    /// Next line, or `None` at end of file (for the trailing sections).
    fn next_line_opt(&mut self) -> std::result::Result<Option<String>, ParserError> {
        self.line += 1;
        let mut buf = String::new();
        let n = self.reader.read_line(&mut buf).map_err(|e| self.io(e))?;
        if n == 0 { Ok(None) } else { Ok(Some(buf)) }
    }

    /// Everything left in the reader, as raw bytes (binary and-section).
    fn read_remaining(&mut self) -> std::result::Result<Vec<u8>, ParserError> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf).map_err(|e| self.io(e))?;
        Ok(buf)
    }
}

/// Symbol table and comment section, shared by both formats.
#[derive(Debug, Default)]
struct Symbols {
    inputs: Vec<String>,
    latches: Vec<String>,
    outputs: Vec<String>,
    comments: Vec<String>,
    in_comments: bool,
}

impl Symbols {
    fn feed(&mut self, line: &str) -> Parsed<()> {
        if self.in_comments {
            self.comments.push(line.to_string());
            return Ok(());
        }
        match line.as_bytes().first() {
            // A line starting with 'c' opens the comment section; the line
            // itself is not part of the comments.
            Some(b'c') => self.in_comments = true,
            Some(b'i') => Self::named(&mut self.inputs, line, "input")?,
            Some(b'l') => Self::named(&mut self.latches, line, "latch")?,
            Some(b'o') => Self::named(&mut self.outputs, line, "output")?,
            // Anything else before the comment section is ignored.
            _ => (),
        }
        Ok(())
    }

    fn named(names: &mut Vec<String>, line: &str, kind: &str) -> Parsed<()> {
        let rest = &line[1..];
        let (index, name) = rest
            .split_once(char::is_whitespace)
            .ok_or_else(|| format!("missing name in {} symbol line", kind))?;
        let index = read_u32(index)?;
        if index as usize != names.len() {
            return Err(format!(
                "unexpected {} symbol index {}, symbols must be declared in order",
                kind, index
            ));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing name in {} symbol line", kind));
        }
        names.push(name.to_string());
        Ok(())
    }
}

/// Assemble the [`Aig`] once all sections are read: node vector in index
/// order, fanouts, and the symbol-count consistency checks.
fn build(
    source: String,
    header: Header,
    latches: Vec<Literal>,
    outputs: Vec<Literal>,
    ands: Vec<(Literal, Literal)>,
    symbols: Symbols,
) -> std::result::Result<Aig, ParserError> {
    let corrupt = |detail: String| ParserError::Corrupt {
        file: source.clone(),
        detail,
    };

    if !symbols.inputs.is_empty() && symbols.inputs.len() != header.i as usize {
        return Err(corrupt(format!(
            "incomplete input symbols: the AIG has {} inputs but {} symbols were declared",
            header.i,
            symbols.inputs.len()
        )));
    }
    if !symbols.latches.is_empty() && symbols.latches.len() != header.l as usize {
        return Err(corrupt(format!(
            "incomplete latch symbols: the AIG has {} latches but {} symbols were declared",
            header.l,
            symbols.latches.len()
        )));
    }
    if !symbols.outputs.is_empty() && symbols.outputs.len() != header.o as usize {
        return Err(corrupt(format!(
            "incomplete output symbols: the AIG has {} outputs but {} symbols were declared",
            header.o,
            symbols.outputs.len()
        )));
    }

    let mut nodes = Vec::with_capacity(header.m as usize);
    for _ in 0..header.i {
        nodes.push(AigNode::Input);
    }
    for &next in &latches {
        nodes.push(AigNode::Latch { next });
    }
    for &(rhs0, rhs1) in &ands {
        nodes.push(AigNode::And { rhs0, rhs1 });
    }

    // Fanouts: and-gate children, latch next-states and outputs are the
    // sinks. Constant literals have no node to account to.
    let mut fanouts = vec![0u32; header.m as usize];
    let mut bump = |lit: Literal| {
        if lit >= 2 {
            fanouts[(lit >> 1) as usize - 1] += 1;
        }
    };
    for &(rhs0, rhs1) in &ands {
        bump(rhs0);
        bump(rhs1);
    }
    for &o in &outputs {
        bump(o);
    }
    for &next in &latches {
        bump(next);
    }

    Ok(Aig {
        source,
        max_var: header.m,
        num_inputs: header.i,
        num_latches: header.l,
        num_outputs: header.o,
        num_ands: header.a,
        nodes,
        fanouts,
        outputs,
        input_names: symbols.inputs,
        latch_names: symbols.latches,
        output_names: symbols.outputs,
        comments: symbols.comments,
    })
}

fn read_output(line: &str, max_literal: Literal) -> Parsed<Literal> {
    let t = tokens(line);
    if t.is_empty() {
        return Err("expected an output literal, got nothing".to_string());
    }
    if t.len() > 1 {
        return Err(format!("expected nothing after the output literal, got {}", t[1]));
    }
    let lit = read_u32(t[0])?;
    if lit > max_literal {
        return Err(format!(
            "output literal {} exceeds the maximum literal {}",
            lit, max_literal
        ));
    }
    Ok(lit)
}

fn check_next_state(next: Literal, max_literal: Literal) -> Parsed<()> {
    if next < 2 {
        return Err(
            "latch tied to constant FALSE (0) or TRUE (1), next-state literal must be >= 2"
                .to_string(),
        );
    }
    if next > max_literal {
        return Err(format!(
            "next-state literal {} exceeds the maximum literal {}",
            next, max_literal
        ));
    }
    Ok(())
}

/// Reader for the ASCII AIGER body.
mod ascii {
    use super::*;

    pub(super) fn read_input(line: &str, expected: Literal) -> Parsed<()> {
        let t = tokens(line);
        if t.is_empty() {
            return Err(format!("expected the input literal {}, got nothing", expected));
        }
        if t.len() > 1 {
            return Err(format!("expected nothing after the input literal, got {}", t[1]));
        }
        let lit = read_u32(t[0])?;
        if lit & 1 == 1 {
            return Err(format!("expected input literal to be even, got {}", lit));
        }
        if lit != expected {
            return Err(format!("unexpected input literal {}, expected {}", lit, expected));
        }
        Ok(())
    }

    /// Latch line `latch_lit next_lit`. A third token is the initial-value
    /// slot of the full AIGER format and is accepted but ignored.
    pub(super) fn read_latch(
        line: &str,
        expected: Literal,
        max_literal: Literal,
    ) -> Parsed<Literal> {
        let t = tokens(line);
        if t.len() < 2 {
            return Err("not enough latch tokens, expected 'latch_lit next_lit'".to_string());
        }
        if t.len() > 3 {
            return Err(format!("expected nothing after the latch tokens, got {}", t[3]));
        }
        let lit = read_u32(t[0])?;
        if lit != expected {
            return Err(format!("unexpected latch literal {}, expected {}", lit, expected));
        }
        let next = read_u32(t[1])?;
        check_next_state(next, max_literal)?;
        Ok(next)
    }

    pub(super) fn read_and(line: &str, expected: Literal) -> Parsed<(Literal, Literal)> {
        let t = tokens(line);
        if t.len() < 3 {
            return Err("not enough and tokens, expected 'and_lit rhs0 rhs1'".to_string());
        }
        if t.len() > 3 {
            return Err(format!("expected nothing after the and tokens, got {}", t[3]));
        }
        let lit = read_u32(t[0])?;
        if lit != expected {
            return Err(format!("unexpected and-literal {}, expected {}", lit, expected));
        }
        let rhs0 = read_u32(t[1])?;
        let rhs1 = read_u32(t[2])?;
        // Children may be listed in either order in ASCII files; the binary
        // delta encoding is what forces rhs0 >= rhs1.
        if rhs0 < 2 || rhs1 < 2 {
            return Err(
                "and-gate tied to constant FALSE (0) or TRUE (1), \
                 child literals must be >= 2"
                    .to_string(),
            );
        }
        if lit <= rhs0 || lit <= rhs1 {
            return Err(format!(
                "condition and_lit > rhs must hold for all and-gates, got {} {} {}",
                lit, rhs0, rhs1
            ));
        }
        Ok((rhs0, rhs1))
    }

    pub(super) fn parse<R: BufRead>(
        mut src: Source<R>,
        header: Header,
    ) -> std::result::Result<Aig, ParserError> {
        let max_literal = header.max_literal();

        for i in 1..=header.i {
            let line = src.next_line()?;
            read_input(&line, 2 * i).map_err(|d| src.invalid(d))?;
        }

        let mut latches = Vec::with_capacity(header.l as usize);
        for i in 1..=header.l {
            let line = src.next_line()?;
            let expected = 2 * (header.i + i);
            latches.push(read_latch(&line, expected, max_literal).map_err(|d| src.invalid(d))?);
        }

        let mut outputs = Vec::with_capacity(header.o as usize);
        for _ in 0..header.o {
            let line = src.next_line()?;
            outputs.push(read_output(&line, max_literal).map_err(|d| src.invalid(d))?);
        }

        let mut ands = Vec::with_capacity(header.a as usize);
        for i in 1..=header.a {
            let line = src.next_line()?;
            let expected = 2 * (header.i + header.l + i);
            ands.push(read_and(&line, expected).map_err(|d| src.invalid(d))?);
        }

        let mut symbols = Symbols::default();
        while let Some(line) = src.next_line_opt()? {
            symbols.feed(line.trim_end()).map_err(|d| src.corrupt(d))?;
        }

        build(src.file, header, latches, outputs, ands, symbols)
    }
}

/// Reader for the binary AIGER body.
///
/// The header, latch and output sections are still plain text lines; only
/// the and-section is binary: for each gate, the two deltas
/// `(and_lit - rhs0, rhs0 - rhs1)` are LEB128-encoded (7 bits per byte,
/// most significant bit set on all bytes but the last).
mod bin {
    use super::*;

    /// Latch line of the binary format: the latch literal is implied, only
    /// the next-state literal is listed (plus the optional initial value).
    pub(super) fn read_latch(line: &str, max_literal: Literal) -> Parsed<Literal> {
        let t = tokens(line);
        if t.is_empty() {
            return Err("expected a next-state literal, got nothing".to_string());
        }
        if t.len() > 2 {
            return Err(format!("expected nothing after the latch tokens, got {}", t[2]));
        }
        let next = read_u32(t[0])?;
        check_next_state(next, max_literal)?;
        Ok(next)
    }

    pub(super) fn decode_delta(buf: &[u8], offset: &mut usize) -> Parsed<u32> {
        let mut x: u32 = 0;
        let mut i = 0;
        loop {
            let ch = *buf
                .get(*offset)
                .ok_or("unexpected end of file while decoding the and-section")?;
            *offset += 1;
            if i >= 5 {
                return Err("delta encoding does not fit a 32-bit literal".to_string());
            }
            x |= ((ch & 0x7f) as u32) << (7 * i);
            i += 1;
            if ch & 0x80 == 0 {
                break;
            }
        }
        Ok(x)
    }

    pub(super) fn parse<R: BufRead>(
        mut src: Source<R>,
        header: Header,
    ) -> std::result::Result<Aig, ParserError> {
        let max_literal = header.max_literal();

        // No input lines in the binary format: input literals are implied.
        let mut latches = Vec::with_capacity(header.l as usize);
        for _ in 0..header.l {
            let line = src.next_line()?;
            latches.push(read_latch(&line, max_literal).map_err(|d| src.invalid(d))?);
        }

        let mut outputs = Vec::with_capacity(header.o as usize);
        for _ in 0..header.o {
            let line = src.next_line()?;
            outputs.push(read_output(&line, max_literal).map_err(|d| src.invalid(d))?);
        }

        // The rest of the file is the binary and-section followed by the
        // optional symbol table and comments.
        let buf = src.read_remaining()?;
        let mut offset = 0;

        let mut ands = Vec::with_capacity(header.a as usize);
        let mut lhs = 2 * (header.i + header.l + 1);
        for _ in 0..header.a {
            let delta0 = decode_delta(&buf, &mut offset).map_err(|d| src.corrupt(d))?;
            let delta1 = decode_delta(&buf, &mut offset).map_err(|d| src.corrupt(d))?;

            let rhs0 = lhs.checked_sub(delta0).ok_or_else(|| {
                src.corrupt("delta encoding underflows, condition and_lit > rhs0 cannot hold")
            })?;
            if rhs0 >= lhs {
                return Err(src.corrupt(format!(
                    "condition and_lit > rhs0 must hold for all and-gates, got {} <= {}",
                    lhs, rhs0
                )));
            }
            let rhs1 = rhs0.checked_sub(delta1).ok_or_else(|| {
                src.corrupt("delta encoding underflows, condition rhs0 >= rhs1 cannot hold")
            })?;
            if rhs1 < 2 {
                return Err(src.corrupt(
                    "and-gate tied to constant FALSE (0) or TRUE (1), \
                     condition rhs0 >= rhs1 >= 2 must hold",
                ));
            }

            ands.push((rhs0, rhs1));
            lhs += 2;
        }

        let mut symbols = Symbols::default();
        for line in String::from_utf8_lossy(&buf[offset..]).lines() {
            symbols.feed(line.trim_end()).map_err(|d| src.corrupt(d))?;
        }

        build(src.file, header, latches, outputs, ands, symbols)
    }
}

impl Aig {
    /// Creates an AIG from any buffered reader. `source` names the input in
    /// diagnostics (the file path, or a placeholder for in-memory readers).
    pub fn from_reader<R: BufRead>(reader: R, source: &str) -> crate::error::Result<Self> {
        let mut src = Source::new(reader, source);
        let line = src.next_line()?;
        let header = parse_header(line.trim()).map_err(|d| src.invalid(d))?;
        let aig = if header.binary {
            bin::parse(src, header)?
        } else {
            ascii::parse(src, header)?
        };
        Ok(aig)
    }

    /// Creates an AIG from an AIGER file (`.aag` ASCII or `.aig` binary -
    /// the header tag decides, not the extension).
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let display = path.as_ref().display().to_string();
        let f = File::open(path.as_ref()).map_err(|e| ParserError::Io {
            path: display.clone(),
            detail: e.to_string(),
        })?;
        Aig::from_reader(BufReader::new(f), &display)
    }
}
