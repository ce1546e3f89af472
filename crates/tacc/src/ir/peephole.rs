//! Padding resolution, peephole cleanup, and assembly emission.
//!
//! Three passes over the same instruction list, in order: resolve each
//! `pad_args`/`unpad_args` pair now that the frame size is known, strip
//! now-dead instructions, then render AT&T text.

use ahash::AHashMap;

use crate::{
    abi::Abi,
    context::CompileContext,
    error::CompileError,
    ir::{
        instr::{Instr, Operand},
        operand::{Location, VarKey},
    },
};

/// Computes and stores the padding every `pad_args`/`unpad_args` pair
/// needs, now that `bytes_used` (the final stack frame size) is known.
/// Recurses into `if_instr` branches; both halves of a pair independently
/// resolve to the same value since the formula depends only on
/// `bytes_used` and the pair's own argument-block size.
pub fn resolve_padding(body: &[Instr], abi: &Abi, bytes_used: u32) {
    for instr in body {
        match instr {
            Instr::PadArgs(p) | Instr::UnpadArgs(p) => {
                let padding = abi.padding_before_call(bytes_used + 8, p.bytes_for_params);
                p.resolved.set(Some(padding));
            }
            Instr::If(_, then, or_else) => {
                resolve_padding(then, abi, bytes_used);
                resolve_padding(or_else, abi, bytes_used);
            }
            _ => {}
        }
    }
}

/// Strips no-op instructions a smarter selector would not have emitted in
/// the first place: same-location moves, adding zero, and padding pairs
/// that resolved to zero bytes.
#[must_use]
pub fn peephole(body: Vec<Instr>, colors: &AHashMap<VarKey, Location>) -> Vec<Instr> {
    body.into_iter()
        .filter_map(|instr| strip(instr, colors))
        .collect()
}

fn strip(instr: Instr, colors: &AHashMap<VarKey, Location>) -> Option<Instr> {
    match instr {
        Instr::Movl(ref s, ref t) if resolve(s, colors) == resolve(t, colors) => None,
        Instr::Addl(Operand::Const(0), _) => None,
        Instr::PadArgs(ref p) if p.resolved.get() == Some(0) => None,
        Instr::UnpadArgs(ref p) if p.resolved.get() == Some(0) => None,
        Instr::If(test, then, or_else) => Some(Instr::If(test, peephole(then, colors), peephole(or_else, colors))),
        other => Some(other),
    }
}

fn resolve(op: &Operand, colors: &AHashMap<VarKey, Location>) -> Option<Location> {
    match op {
        Operand::Const(_) => None,
        Operand::Var(v) => colors.get(v).copied(),
    }
}

/// Renders an operand as AT&T-syntax text: `$N` for constants, the
/// resolved register/stack text for anything else.
fn operand_text(op: &Operand, colors: &AHashMap<VarKey, Location>) -> Result<String, CompileError> {
    match op {
        Operand::Const(v) => Ok(format!("${v}")),
        Operand::Var(v) => colors
            .get(v)
            .map(ToString::to_string)
            .ok_or_else(|| CompileError::InexhaustivePattern { node: format!("unresolved operand {v}") }),
    }
}

/// Emits the full assembly text for one program: `.globl` header,
/// prologue, the instruction body, and epilogue.
pub fn emit(
    ctx: &mut CompileContext,
    abi: &Abi,
    body: &[Instr],
    colors: &AHashMap<VarKey, Location>,
    bytes_used: u32,
) -> Result<String, CompileError> {
    let label = abi.label("main");
    let mut lines = Vec::new();
    lines.push(format!(".globl {label}"));
    lines.push(format!("{label}:"));
    lines.push("    pushl %ebp".to_string());
    lines.push("    movl %esp, %ebp".to_string());
    if bytes_used > 0 {
        lines.push(format!("    subl ${bytes_used}, %esp"));
    }

    emit_body(ctx, abi, body, colors, &mut lines)?;

    lines.push("    movl $0, %eax".to_string());
    lines.push("    movl %ebp, %esp".to_string());
    lines.push("    popl %ebp".to_string());
    lines.push("    ret".to_string());
    lines.push(String::new());
    Ok(lines.join("\n"))
}

fn emit_body(
    ctx: &mut CompileContext,
    abi: &Abi,
    body: &[Instr],
    colors: &AHashMap<VarKey, Location>,
    lines: &mut Vec<String>,
) -> Result<(), CompileError> {
    for instr in body {
        emit_instr(ctx, abi, instr, colors, lines)?;
    }
    Ok(())
}

fn emit_instr(
    ctx: &mut CompileContext,
    abi: &Abi,
    instr: &Instr,
    colors: &AHashMap<VarKey, Location>,
    lines: &mut Vec<String>,
) -> Result<(), CompileError> {
    let t = |op: &Operand| operand_text(op, colors);
    match instr {
        Instr::Movl(s, d) | Instr::UnspillableMovl(s, d) => lines.push(format!("    movl {}, {}", t(s)?, t(d)?)),
        Instr::Addl(s, d) => lines.push(format!("    addl {}, {}", t(s)?, t(d)?)),
        Instr::Negl(d) => lines.push(format!("    negl {}", t(d)?)),
        Instr::Cmpl(a, b) => lines.push(format!("    cmpl {}, {}", t(a)?, t(b)?)),
        Instr::SeteCl => lines.push("    sete %cl".to_string()),
        Instr::SetneCl => lines.push("    setne %cl".to_string()),
        Instr::MovzblCl(d) => lines.push(format!("    movzbl %cl, {}", t(d)?)),
        Instr::Sall(n, d) => lines.push(format!("    sall ${n}, {}", t(d)?)),
        Instr::Sarl(n, d) => lines.push(format!("    sarl ${n}, {}", t(d)?)),
        Instr::Andl(n, d) => lines.push(format!("    andl ${n}, {}", t(d)?)),
        Instr::Orl(n, d) => lines.push(format!("    orl ${n}, {}", t(d)?)),
        Instr::Pushl(v) => lines.push(format!("    pushl {}", t(v)?)),
        Instr::Call(f) => lines.push(format!("    call {}", abi.label(f))),
        Instr::PadArgs(p) => {
            let padding = p.resolved.get().ok_or(CompileError::UninitializedPadding)?;
            if padding > 0 {
                lines.push(format!("    subl ${padding}, %esp"));
            }
        }
        Instr::UnpadArgs(p) => {
            let padding = p.resolved.get().ok_or(CompileError::UninitializedPadding)?;
            if padding > 0 {
                lines.push(format!("    addl ${padding}, %esp"));
            }
        }
        Instr::If(test, then, or_else) => {
            let else_label = ctx.allocate_label();
            let end_label = ctx.allocate_label();
            lines.push(format!("    cmpl $0, {}", t(test)?));
            lines.push(format!("    je {else_label}"));
            emit_body(ctx, abi, then, colors, lines)?;
            lines.push(format!("    jmp {end_label}"));
            lines.push(format!("{else_label}:"));
            emit_body(ctx, abi, or_else, colors, lines)?;
            lines.push(format!("{end_label}:"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abi::Platform,
        atom::Name,
        ir::instr::Padding,
    };

    fn colors_with(name: &str, loc: Location) -> AHashMap<VarKey, Location> {
        let mut m = AHashMap::new();
        m.insert(VarKey::Named(Name::from(name)), loc);
        m
    }

    #[test]
    fn same_location_move_is_stripped() {
        use crate::ir::operand::Reg;
        let colors = colors_with("x", Location::Reg(Reg::Eax));
        let body = vec![Instr::Movl(Operand::reg(Reg::Eax), Operand::name("x".into()))];
        let out = peephole(body, &colors);
        assert!(out.is_empty());
    }

    #[test]
    fn add_zero_is_stripped() {
        let colors = AHashMap::new();
        let body = vec![Instr::Addl(Operand::Const(0), Operand::name("x".into()))];
        let out = peephole(body, &colors);
        assert!(out.is_empty());
    }

    #[test]
    fn zero_padding_pair_is_stripped() {
        let colors = AHashMap::new();
        let pad = Padding::new(4);
        pad.resolved.set(Some(0));
        let unpad = Padding::new(4);
        unpad.resolved.set(Some(0));
        let body = vec![Instr::PadArgs(pad), Instr::UnpadArgs(unpad)];
        let out = peephole(body, &colors);
        assert!(out.is_empty());
    }

    #[test]
    fn epilogue_zeroes_the_return_register() {
        let mut ctx = CompileContext::new(Abi::new(Platform::Linux), false);
        let abi = Abi::new(Platform::Linux);
        let colors = AHashMap::new();
        let asm = emit(&mut ctx, &abi, &[], &colors, 0).unwrap();
        assert!(asm.contains("movl $0, %eax"));
    }

    #[test]
    fn linux_padding_resolves_to_zero() {
        let abi = Abi::new(Platform::Linux);
        let pad = Padding::new(8);
        let body = vec![Instr::PadArgs(pad)];
        resolve_padding(&body, &abi, 16);
        if let Instr::PadArgs(p) = &body[0] {
            assert_eq!(p.resolved.get(), Some(0));
        } else {
            unreachable!()
        }
    }
}
