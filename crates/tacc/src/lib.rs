//! Back-end pipeline lowering a small dynamically-typed language to 32-bit
//! x86 assembly text.
//!
//! The pipeline is a linear sequence of tree-to-tree/tree-to-list passes,
//! plus an iterative register allocator:
//!
//! ```text
//! source text -> Lexer -> Parser -> Desugar -> Explicate -> Flatten
//!             -> Select -> [Liveness -> Interfere -> Color -> Spill?]* -> Peephole -> AsmText
//! ```
//!
//! `frontend` (lexer, parser, desugar) exists only so this crate is
//! runnable end to end from source text; the interesting back-end work
//! starts at [`explicate`] and ends at [`ir::peephole::emit`].

pub mod abi;
pub mod ast;
pub mod atom;
pub mod context;
pub mod error;
pub mod explicate;
pub mod flatten;
pub mod frontend;
pub mod ir;
pub mod pipeline;

pub use crate::{
    abi::{Abi, Platform},
    atom::{Atom, Name},
    context::CompileContext,
    error::{CompileError, PipelineError},
    pipeline::compile_source,
};
