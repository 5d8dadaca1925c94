//! Final layout pass over the assembled source

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::iter::Peekable;
use std::process::{Command, Stdio};
use std::str::{Chars, FromStr};

pub trait Formatter {
    fn name(&self) -> &str;

    /// Lay out `source`, or explain why it is not well formed.
    fn format(&self, source: &str) -> Result<String, String>;
}

/// Which formatter to run over generated source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    #[default]
    Builtin,
    Gofmt,
    None,
}

impl FormatterKind {
    pub fn formatter(self) -> Box<dyn Formatter> {
        match self {
            FormatterKind::Builtin => Box::new(BuiltinFormatter),
            FormatterKind::Gofmt => Box::new(CommandFormatter::gofmt()),
            FormatterKind::None => Box::new(NoopFormatter),
        }
    }
}

impl FromStr for FormatterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "builtin" => Ok(FormatterKind::Builtin),
            "gofmt" => Ok(FormatterKind::Gofmt),
            "none" => Ok(FormatterKind::None),
            other => Err(format!(
                "unknown formatter '{}' (expected builtin, gofmt or none)",
                other
            )),
        }
    }
}

impl fmt::Display for FormatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatterKind::Builtin => f.write_str("builtin"),
            FormatterKind::Gofmt => f.write_str("gofmt"),
            FormatterKind::None => f.write_str("none"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn name(&self) -> &str {
        "none"
    }

    fn format(&self, source: &str) -> Result<String, String> {
        Ok(source.to_string())
    }
}

/// Pipes source through an external program such as `gofmt`.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl CommandFormatter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn gofmt() -> Self {
        Self::new("gofmt", Vec::new())
    }
}

impl Formatter for CommandFormatter {
    fn name(&self) -> &str {
        &self.program
    }

    fn format(&self, source: &str) -> Result<String, String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to run {}: {}", self.program, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .map_err(|e| format!("failed to write to {}: {}", self.program, e))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| format!("failed to wait for {}: {}", self.program, e))?;
        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
        }
        String::from_utf8(output.stdout)
            .map_err(|e| format!("{} produced invalid UTF-8: {}", self.program, e))
    }
}

/// Dependency-free layout for generated declarations: one field per line,
/// one tab per struct level, `{}` kept for empty bodies. Text outside braces
/// is copied as is. Literals and comments are copied verbatim and
/// unbalanced delimiters are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFormatter;

impl Formatter for BuiltinFormatter {
    fn name(&self) -> &str {
        "builtin"
    }

    fn format(&self, source: &str) -> Result<String, String> {
        let mut layout = Layout::default();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '"' | '\'' => {
                    layout.write(c);
                    copy_quoted(&mut chars, &mut layout, c)?;
                }
                '`' => {
                    layout.write(c);
                    copy_raw(&mut chars, &mut layout)?;
                }
                '/' if chars.peek() == Some(&'/') => {
                    layout.write(c);
                    while let Some(&next) = chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        layout.write(next);
                        chars.next();
                    }
                }
                '/' if chars.peek() == Some(&'*') => {
                    layout.write(c);
                    copy_block_comment(&mut chars, &mut layout)?;
                }
                '{' => {
                    while chars.peek().is_some_and(|next| *next == ' ' || *next == '\t') {
                        chars.next();
                    }
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        layout.write_str("{}");
                    } else {
                        if layout.out.ends_with(|prev: char| prev.is_alphanumeric()) {
                            layout.write(' ');
                        }
                        layout.write('{');
                        layout.open.push('{');
                        layout.break_line();
                    }
                }
                '}' => {
                    layout.close('{', '}')?;
                    layout.break_line();
                    layout.write('}');
                }
                '(' | '[' => {
                    layout.write(c);
                    layout.open.push(c);
                }
                ')' => {
                    layout.close('(', ')')?;
                    layout.write(c);
                }
                ']' => {
                    layout.close('[', ']')?;
                    layout.write(c);
                }
                ';' | '\n' if layout.depth() > 0 => layout.break_line(),
                '\n' => layout.newline(),
                ' ' | '\t' if layout.at_line_start && layout.depth() > 0 => {}
                c => layout.write(c),
            }
        }

        if let Some(open) = layout.open.last() {
            return Err(format!("unclosed '{}'", open));
        }
        Ok(layout.finish())
    }
}

#[derive(Default)]
struct Layout {
    out: String,
    open: Vec<char>,
    at_line_start: bool,
}

impl Layout {
    fn depth(&self) -> usize {
        self.open.iter().filter(|&&c| c == '{').count()
    }

    fn write(&mut self, c: char) {
        if self.at_line_start {
            let depth = self.depth();
            self.out.extend(std::iter::repeat('\t').take(depth));
            self.at_line_start = false;
        }
        self.out.push(c);
    }

    fn write_str(&mut self, s: &str) {
        for c in s.chars() {
            self.write(c);
        }
    }

    fn trim_trailing(&mut self) {
        let trimmed = self.out.trim_end_matches([' ', '\t']).len();
        self.out.truncate(trimmed);
    }

    /// End the current line unless nothing was written on it yet.
    fn break_line(&mut self) {
        if !self.at_line_start {
            self.trim_trailing();
            self.out.push('\n');
            self.at_line_start = true;
        }
    }

    fn newline(&mut self) {
        self.trim_trailing();
        self.out.push('\n');
        self.at_line_start = true;
    }

    fn close(&mut self, expected: char, closing: char) -> Result<(), String> {
        match self.open.pop() {
            Some(open) if open == expected => Ok(()),
            Some(open) => Err(format!("'{}' closes unmatched '{}'", closing, open)),
            None => Err(format!("unexpected '{}'", closing)),
        }
    }

    fn finish(mut self) -> String {
        let trimmed = self.out.trim_end().len();
        self.out.truncate(trimmed);
        self.out.push('\n');
        self.out
    }
}

fn copy_quoted(chars: &mut Peekable<Chars<'_>>, layout: &mut Layout, quote: char) -> Result<(), String> {
    loop {
        match chars.next() {
            None | Some('\n') => return Err("unterminated string literal".to_string()),
            Some('\\') => {
                layout.write('\\');
                match chars.next() {
                    Some(escaped) => layout.write(escaped),
                    None => return Err("unterminated string literal".to_string()),
                }
            }
            Some(c) if c == quote => {
                layout.write(c);
                return Ok(());
            }
            Some(c) => layout.write(c),
        }
    }
}

fn copy_raw(chars: &mut Peekable<Chars<'_>>, layout: &mut Layout) -> Result<(), String> {
    for c in chars.by_ref() {
        layout.out.push(c);
        if c == '`' {
            return Ok(());
        }
    }
    Err("unterminated raw string literal".to_string())
}

fn copy_block_comment(chars: &mut Peekable<Chars<'_>>, layout: &mut Layout) -> Result<(), String> {
    // Opening `*`; it cannot also close the comment.
    if let Some(star) = chars.next() {
        layout.out.push(star);
    }
    let mut previous = None;
    for c in chars.by_ref() {
        layout.out.push(c);
        if c == '/' && previous == Some('*') {
            return Ok(());
        }
        previous = Some(c);
    }
    Err("unterminated block comment".to_string())
}
