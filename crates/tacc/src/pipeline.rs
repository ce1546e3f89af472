//! Top-level orchestration: source text to assembly text.
//!
//! Front end, explicate, flatten, select, allocate-to-fixed-point,
//! resolve padding, peephole, emit, in that order, with one
//! [`CompileContext`] threaded through the whole run.

use tracing::{debug, info};

use crate::{
    abi::{Abi, Platform},
    context::CompileContext,
    error::PipelineError,
    explicate, flatten,
    frontend,
    ir::{peephole, regalloc, select},
};

/// Compiles one program's source text into AT&T-syntax x86 assembly.
pub fn compile_source(source: &str, platform: Platform, debug: bool) -> Result<String, PipelineError> {
    let abi = Abi::new(platform);
    let mut ctx = CompileContext::new(abi, debug);

    info!(%platform, "compiling");

    let desugared = frontend::parse_source(source)?;
    debug!(statements = desugared.body.len(), "parsed and desugared");

    let explicated = explicate::explicate(&mut ctx, desugared)?;
    let flat = flatten::flatten(&mut ctx, explicated);
    let selected = select::select(&mut ctx, flat)?;
    debug!(instructions = selected.len(), "selected x86 IR");

    let (body, colors, bytes_used) = regalloc::allocate(&mut ctx, selected);
    debug!(bytes_used, "register allocation reached a fixed point");

    peephole::resolve_padding(&body, &abi, bytes_used);
    let cleaned = peephole::peephole(body, &colors);

    let asm = peephole::emit(&mut ctx, &abi, &cleaned, &colors, bytes_used)?;
    Ok(asm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_trivial_program_compiles_to_a_globl_main() {
        let asm = compile_source("print 1 + 2\n", Platform::Linux, false).unwrap();
        assert!(asm.contains(".globl main"));
        assert!(asm.contains("call print_any"));
    }

    #[test]
    fn an_if_statement_compiles_with_a_conditional_jump() {
        let asm = compile_source("x = 1\nif x == 1:\n  print 1\nelse:\n  print 2\n", Platform::Linux, false).unwrap();
        assert!(asm.contains("je "));
        assert!(asm.contains("jmp "));
    }

    #[test]
    fn while_is_rejected_through_the_whole_pipeline() {
        let err = compile_source("while 1:\n  print 1\n", Platform::Linux, false).unwrap_err();
        assert!(matches!(err, PipelineError::Desugar(_)));
    }
}
