//! Stage-tagged error taxonomy.
//!
//! One enum per pipeline stage, a manual `Display` built from `write!`, a
//! manual `std::error::Error` impl, and a manual `From` conversion per
//! sub-error into a single top-level enum callers actually hold.

use std::fmt;

/// Failure while tokenizing source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    Tab { line: u32 },
    UnterminatedString { line: u32 },
    UnexpectedChar { line: u32, ch: char },
    InconsistentIndent { line: u32 },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tab { line } => write!(f, "line {line}: tabs are not permitted for indentation"),
            Self::UnterminatedString { line } => write!(f, "line {line}: unterminated string literal"),
            Self::UnexpectedChar { line, ch } => write!(f, "line {line}: unexpected character {ch:?}"),
            Self::InconsistentIndent { line } => write!(f, "line {line}: indentation does not match any enclosing block"),
        }
    }
}

impl std::error::Error for LexError {}

/// Failure while parsing a token stream into a [`crate::ast::surface::SurfaceAst`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedToken { line: u32, found: String, expected: &'static str },
    UnexpectedEof { expected: &'static str },
    EmptyBlock { line: u32 },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken { line, found, expected } => {
                write!(f, "line {line}: expected {expected}, found {found}")
            }
            Self::UnexpectedEof { expected } => write!(f, "unexpected end of input, expected {expected}"),
            Self::EmptyBlock { line } => write!(f, "line {line}: expected an indented block"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Failure while lowering the surface AST into the back-end's node catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesugarError {
    /// `while` has no counterpart in the back-end's `IfStmt`-only control
    /// flow catalog; rather than drop it silently this is surfaced as a
    /// named, explicit rejection.
    UnsupportedConstruct { what: &'static str },
}

impl fmt::Display for DesugarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedConstruct { what } => write!(f, "unsupported construct: {what}"),
        }
    }
}

impl std::error::Error for DesugarError {}

/// Failure during explicate/flatten/select/regalloc/emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A statement or expression shape had no matching arm in explicate.
    InexhaustivePattern { node: String },
    /// `Box` was asked to tag a value with an unknown tag kind.
    BoxTypeError { tag: String },
    /// `UnBox` was asked to untag a value with an unknown tag kind.
    UnboxTypeError { tag: String },
    /// A `CallFunc` named a builtin that explicate has no boxing rule for.
    UnknownBuiltin { name: String },
    /// Assembly emission was attempted on a `pad_args`/`unpad_args` pair
    /// before the register allocator's final pass resolved its padding.
    UninitializedPadding,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InexhaustivePattern { node } => write!(f, "inexhaustive pattern match on {node}"),
            Self::BoxTypeError { tag } => write!(f, "cannot box a value as tag {tag:?}"),
            Self::UnboxTypeError { tag } => write!(f, "cannot unbox a value tagged {tag:?}"),
            Self::UnknownBuiltin { name } => write!(f, "unknown builtin function {name:?}"),
            Self::UninitializedPadding => write!(f, "pad_args emitted before padding was computed"),
        }
    }
}

impl std::error::Error for CompileError {}

/// The error type returned by [`crate::pipeline::compile_source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    Lex(LexError),
    Parse(ParseError),
    Desugar(DesugarError),
    Compile(CompileError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "lex error: {err}"),
            Self::Parse(err) => write!(f, "parse error: {err}"),
            Self::Desugar(err) => write!(f, "desugar error: {err}"),
            Self::Compile(err) => write!(f, "compile error: {err}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Lex(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Desugar(err) => Some(err),
            Self::Compile(err) => Some(err),
        }
    }
}

impl From<LexError> for PipelineError {
    fn from(err: LexError) -> Self {
        Self::Lex(err)
    }
}

impl From<ParseError> for PipelineError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<DesugarError> for PipelineError {
    fn from(err: DesugarError) -> Self {
        Self::Desugar(err)
    }
}

impl From<CompileError> for PipelineError {
    fn from(err: CompileError) -> Self {
        Self::Compile(err)
    }
}
