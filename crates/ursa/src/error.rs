//! Diagnostics: compile-time errors, runtime errors, and their rendering.
//!
//! The compiler and type checker accumulate `Diagnostic`s rather than
//! stopping at the first problem; the interpreter aborts with a single
//! `RuntimeError` carrying a traceback assembled from the frame chain.
//! `render_banner` turns a source range into the line/column banner with an
//! extent underline that all user-visible errors share.

use std::fmt;

use crate::parse::CodeRange;

/// Which phase produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DiagnosticKind {
    /// The s-expression reader rejected the input text.
    Parse,
    /// Name resolution or a malformed special form.
    Compile,
    /// A structural type rule failed.
    Type,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Parse => "Parse error",
            Self::Compile => "Compile error",
            Self::Type => "Type error",
        };
        f.write_str(label)
    }
}

/// A compile-time problem with a source range.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: CodeRange,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: CodeRange) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    /// Renders this diagnostic against its source text.
    #[must_use]
    pub fn render(&self, script_name: &str, source: &str) -> String {
        let mut out = String::new();
        out.push_str(&banner_header(script_name, self.span));
        out.push_str(&render_banner(source, self.span));
        out.push_str(&format!("{}: {}\n", self.kind, self.message));
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.kind, self.message, self.span)
    }
}

/// One entry of a runtime traceback: a function (or the top level) plus the
/// call site that entered it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TraceFrame {
    /// Function name, `None` at the top level.
    pub name: Option<String>,
    /// The call-site range (for the top level, the whole program start).
    pub span: CodeRange,
}

/// An error raised while stepping instructions.
///
/// Break/continue/return/yield are instruction opcodes, never errors; this
/// type only carries genuine failures (invalid call, invalid property,
/// assignment guards, deadlock).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RuntimeError {
    pub message: String,
    /// Range of the instruction that raised.
    pub span: CodeRange,
    /// Frame chain, outermost first.
    pub traceback: Vec<TraceFrame>,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, span: CodeRange) -> Self {
        Self {
            message: message.into(),
            span,
            traceback: Vec::new(),
        }
    }

    /// Renders the error with its traceback against the source text.
    #[must_use]
    pub fn render(&self, script_name: &str, source: &str) -> String {
        let mut out = String::new();
        out.push_str("Traceback (innermost last):\n");
        for frame in &self.traceback {
            let location = if frame.span.start.line == 0 {
                String::new()
            } else {
                format!(" ({script_name}:{})", frame.span)
            };
            match &frame.name {
                Some(name) => out.push_str(&format!("  in {name}{location}\n")),
                None => out.push_str(&format!("  at top level{location}\n")),
            }
        }
        out.push_str(&banner_header(script_name, self.span));
        out.push_str(&render_banner(source, self.span));
        out.push_str(&format!("Runtime error: {}\n", self.message));
        out
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {} at {}", self.message, self.span)
    }
}

impl std::error::Error for RuntimeError {}

/// Top-level error type returned by `Runner` and `ReplSession`.
///
/// Carries the fully rendered report so `Display` needs no access to the
/// source text, plus the structured diagnostics for programmatic callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// One or more compile-time diagnostics (reader, resolver, checker).
    Compile {
        diagnostics: Vec<Diagnostic>,
        rendered: String,
    },
    /// A runtime failure with traceback.
    Runtime { error: RuntimeError, rendered: String },
}

impl Error {
    pub(crate) fn compile(diagnostics: Vec<Diagnostic>, script_name: &str, source: &str) -> Self {
        let rendered = diagnostics
            .iter()
            .map(|d| d.render(script_name, source))
            .collect::<Vec<_>>()
            .join("\n");
        Self::Compile { diagnostics, rendered }
    }

    pub(crate) fn runtime(error: RuntimeError, script_name: &str, source: &str) -> Self {
        let rendered = error.render(script_name, source);
        Self::Runtime { error, rendered }
    }

    /// The first diagnostic message (compile) or the runtime message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Compile { diagnostics, .. } => diagnostics.first().map_or("", |d| d.message.as_str()),
            Self::Runtime { error, .. } => &error.message,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile { rendered, .. } | Self::Runtime { rendered, .. } => f.write_str(rendered),
        }
    }
}

impl std::error::Error for Error {}

fn banner_header(script_name: &str, span: CodeRange) -> String {
    format!("{script_name}:{}:{}\n", span.start.line, span.start.column)
}

/// Renders the source line at `span.start` with an underline covering the
/// range's extent on that line.
///
/// A synthetic range (line 0) or one past the end of the source renders
/// nothing, so internally generated code never produces a bogus preview.
#[must_use]
pub fn render_banner(source: &str, span: CodeRange) -> String {
    if span.start.line == 0 {
        return String::new();
    }
    let Some(line_text) = source.lines().nth(span.start.line as usize - 1) else {
        return String::new();
    };
    let gutter = format!("{:>4} | ", span.start.line);
    let mut out = format!("{gutter}{line_text}\n");

    let start_col = span.start.column.max(1) as usize;
    let line_chars = line_text.chars().count().max(1);
    let end_col = if span.end.line == span.start.line && span.end.column as usize > start_col {
        (span.end.column as usize - 1).min(line_chars)
    } else {
        // multi-line range: underline to the end of the first line
        line_chars
    };
    let width = (end_col + 1).saturating_sub(start_col).clamp(1, 200);

    out.push_str(&" ".repeat(gutter.len() + start_col - 1));
    out.push('^');
    out.push_str(&"~".repeat(width.saturating_sub(1)));
    out.push('\n');
    out
}
