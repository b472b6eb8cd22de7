use crate::token::{token_to_string, Span, Token};
use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};

/// Any failure the synthesis → encode pipeline can report.
#[derive(Debug, thiserror::Error)]
pub enum PhaseError {
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),
}

// ── Compilation ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected char '{ch}' at pos {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("Unterminated string at pos {pos}")]
    UnterminatedString { pos: usize },
    #[error("Unterminated block comment at pos {pos}")]
    UnterminatedComment { pos: usize },
    #[error("Invalid number '{text}' at pos {pos}")]
    InvalidNumber { text: String, pos: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Expected {expected}, found '{}' at pos {}", token_to_string(.found), .span.start)]
    UnexpectedToken {
        expected: String,
        found: Token,
        span: Span,
    },
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEOF { expected: String, pos: usize },
    #[error("Expression nests deeper than {limit} levels at pos {}", .span.start)]
    TooDeep { limit: usize, span: Span },
}

/// The expression text could not be turned into a [`SampleFunction`](crate::compiler::SampleFunction).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("'{name}' is not defined")]
    UnknownIdentifier { name: String, span: Span },
    #[error("'{name}' is not a function")]
    UnknownFunction { name: String, span: Span },
    #[error("'{name}' is a function and must be called")]
    FunctionAsValue { name: String, span: Span },
    #[error("'{name}' expects {expected} argument(s), got {found}")]
    WrongArity {
        name: String,
        expected: String,
        found: usize,
        span: Span,
    },
    #[error("Assignment to constant '{name}'")]
    AssignToConstant { name: String, span: Span },
    #[error("'{name}' has already been declared")]
    Redeclared { name: String, span: Span },
    #[error("Expression has no return value")]
    NoReturnValue,
}

impl CompileError {
    /// Source location of the error, when known.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Lex(e) => {
                let pos = match e {
                    LexError::UnexpectedChar { pos, .. }
                    | LexError::UnterminatedString { pos }
                    | LexError::UnterminatedComment { pos }
                    | LexError::InvalidNumber { pos, .. } => *pos,
                };
                Some(Span::new(pos, pos + 1))
            }
            CompileError::Parse(ParseError::UnexpectedToken { span, .. })
            | CompileError::Parse(ParseError::TooDeep { span, .. }) => Some(*span),
            CompileError::Parse(ParseError::UnexpectedEOF { pos, .. }) => Some(Span::new(*pos, *pos)),
            CompileError::UnknownIdentifier { span, .. }
            | CompileError::UnknownFunction { span, .. }
            | CompileError::FunctionAsValue { span, .. }
            | CompileError::WrongArity { span, .. }
            | CompileError::AssignToConstant { span, .. }
            | CompileError::Redeclared { span, .. } => Some(*span),
            CompileError::NoReturnValue => None,
        }
    }

    /// Render a caret diagnostic for `source`, suitable for showing in an editor panel.
    pub fn report(&self, name: &str, source: &str) -> String {
        let span = self
            .span()
            .map(|s| s.start.min(source.len())..s.end.min(source.len()))
            .unwrap_or(source.len()..source.len());
        let message = self.to_string();

        let mut out = Vec::new();
        let written = Report::build(ReportKind::Error, (name, span.clone()))
            .with_config(
                Config::default()
                    .with_color(false)
                    .with_index_type(IndexType::Byte),
            )
            .with_message(&message)
            .with_label(Label::new((name, span)).with_message(&message))
            .finish()
            .write((name, Source::from(source)), &mut out);

        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => message,
        }
    }
}

// ── Evaluation ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum EvalErrorKind {
    /// The expression executed a `throw`.
    Thrown(String),
    /// The returned value was NaN. Infinities are kept as samples.
    NotANumber,
    /// Control reached the end of the body without a `return`.
    NoReturn,
}

/// A compiled function failed for a specific `t`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} at t = {t}", describe_eval(.kind))]
pub struct EvaluationError {
    pub t: f64,
    pub kind: EvalErrorKind,
}

fn describe_eval(kind: &EvalErrorKind) -> String {
    match kind {
        EvalErrorKind::Thrown(msg) => format!("Uncaught {msg}"),
        EvalErrorKind::NotANumber => "Function returned NaN".to_string(),
        EvalErrorKind::NoReturn => "Function returned no value".to_string(),
    }
}

// ── Buffers & configuration ─────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BufferError {
    #[error("Audio buffer needs at least one channel")]
    NoChannels,
    #[error("Sample rate must be greater than zero")]
    ZeroSampleRate,
    #[error("Channel {channel} has {found} samples, expected {expected}")]
    MismatchedChannelLength {
        channel: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Sample rate must be greater than zero")]
    ZeroSampleRate,
    #[error("Channel count must be at least one")]
    NoChannels,
    #[error("Invalid period {0} ms")]
    InvalidPeriod(f64),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Encoding ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("Only 8, 16, 24 and 32 bits per sample are supported, got {0}")]
    UnsupportedBitDepth(u16),
    #[error("Nothing to encode: no channels or no samples")]
    EmptyBuffer,
    #[error("Channel {channel} has {found} samples, expected {expected}")]
    MismatchedChannelLength {
        channel: usize,
        expected: usize,
        found: usize,
    },
    #[error("Sample rate must be greater than zero")]
    ZeroSampleRate,
    #[error("Encoded data would be {bytes} bytes, larger than a WAV file can hold")]
    TooLarge { bytes: u64 },
    #[error("Encode worker failed: {0}")]
    WorkerFailed(String),
}
