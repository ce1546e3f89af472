//! Lexing, parsing, and desugaring: source text to the back-end's
//! [`crate::ast::core::Module`].

pub mod desugar;
pub mod lexer;
pub mod parser;

use crate::{ast::core::Module, error::PipelineError};

/// Runs the full front end: lex, parse, desugar.
pub fn parse_source(source: &str) -> Result<Module, PipelineError> {
    let tokens = lexer::lex(source)?;
    let surface = parser::parse(&tokens)?;
    Ok(desugar::desugar(surface)?)
}
