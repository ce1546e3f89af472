//! Instruction selection: flat three-address statements to x86 IR, one
//! arm of `select_expr_into`/`select_stmt` per flattened node shape.

use crate::{
    ast::core::{BinOp, BoxKind, UnboxKind},
    atom::{Atom, Name},
    context::CompileContext,
    error::CompileError,
    ast::flat::{FlatExpr, FlatModule, FlatStmt},
    ir::instr::{Instr, Operand, Padding},
    ir::operand::Reg,
};

/// Runtime (C-ABI) function names the IR calls into for big-number/object
/// paths. Kept as plain `&str`s — the emission pass prints them verbatim
/// as `call` targets.
mod runtime {
    pub const ADD: &str = "add";
    pub const NEGATE: &str = "negate";
    pub const EQUAL: &str = "equal";
    pub const NOT_EQUAL: &str = "not_equal";
    pub const INPUT: &str = "input";
    pub const CREATE_LIST: &str = "create_list";
    pub const CREATE_DICT: &str = "create_dict";
    pub const GET_SUBSCRIPT: &str = "get_subscript";
    pub const SET_SUBSCRIPT: &str = "set_subscript";
    pub const PRINT_ANY: &str = "print_any";
    pub const IS_TRUE: &str = "is_true";
}

/// Selects x86 IR for an entire flattened module.
pub fn select(ctx: &mut CompileContext, module: FlatModule) -> Result<Vec<Instr>, CompileError> {
    select_stmts(ctx, module.body)
}

fn select_stmts(ctx: &mut CompileContext, stmts: Vec<FlatStmt>) -> Result<Vec<Instr>, CompileError> {
    let mut out = Vec::new();
    for stmt in stmts {
        out.extend(select_stmt(ctx, stmt)?);
    }
    Ok(out)
}

fn select_stmt(ctx: &mut CompileContext, stmt: FlatStmt) -> Result<Vec<Instr>, CompileError> {
    match stmt {
        FlatStmt::Assign(n, expr) => select_expr_into(ctx, expr, Operand::name(n)),
        FlatStmt::Discard(expr) => {
            let tmp: Name = ctx.allocate_temp().into();
            select_expr_into(ctx, expr, Operand::name(tmp))
        }
        FlatStmt::Printnl(atom) => Ok(select_call(runtime::PRINT_ANY, &[atom], None)),
        FlatStmt::If(test, then, or_else) => {
            let then_instrs = select_stmts(ctx, then)?;
            let else_instrs = select_stmts(ctx, or_else)?;
            Ok(vec![Instr::If(Operand::from(test), then_instrs, else_instrs)])
        }
    }
}

fn select_expr_into(ctx: &mut CompileContext, expr: FlatExpr, dst: Operand) -> Result<Vec<Instr>, CompileError> {
    let instrs = match expr {
        FlatExpr::Atom(a) => vec![Instr::Movl(Operand::from(a), dst)],
        FlatExpr::Add(a, b) => vec![
            Instr::Movl(Operand::from(a), dst.clone()),
            Instr::Addl(Operand::from(b), dst),
        ],
        FlatExpr::UnarySub(a) => vec![Instr::Movl(Operand::from(a), dst.clone()), Instr::Negl(dst)],
        FlatExpr::Bop(BinOp::Eq, a, b) => select_compare(a, b, dst, true),
        FlatExpr::Bop(BinOp::NEq, a, b) => select_compare(a, b, dst, false),
        FlatExpr::Bop(op @ (BinOp::Is | BinOp::Seq), _, _) => {
            return Err(CompileError::InexhaustivePattern { node: format!("{op:?} in a flattened Bop") });
        }
        FlatExpr::GetTag(a) => vec![Instr::Movl(Operand::from(a), dst.clone()), Instr::Andl(0b11, dst)],
        FlatExpr::Box(BoxKind::Int, a) => vec![Instr::Movl(Operand::from(a), dst.clone()), Instr::Sall(2, dst)],
        FlatExpr::Box(BoxKind::Bool, a) => vec![
            Instr::Movl(Operand::from(a), dst.clone()),
            Instr::Sall(2, dst.clone()),
            Instr::Orl(0b01, dst),
        ],
        FlatExpr::Box(BoxKind::Big, a) => vec![Instr::Movl(Operand::from(a), dst.clone()), Instr::Orl(0b11, dst)],
        FlatExpr::UnBox(UnboxKind::Small, a) => vec![Instr::Movl(Operand::from(a), dst.clone()), Instr::Sarl(2, dst)],
        FlatExpr::UnBox(UnboxKind::Big, a) => vec![Instr::Movl(Operand::from(a), dst.clone()), Instr::Andl(-4, dst)],
        FlatExpr::CallFunc(f, args) => select_call(&runtime_name(&f)?, &args, Some(dst)),
    };
    Ok(instrs)
}

/// `Eq`/`NEq` share one shape: compare, capture the flag in `%cl`, then
/// zero-extend it into the destination.
fn select_compare(a: Atom, b: Atom, dst: Operand, is_eq: bool) -> Vec<Instr> {
    let set = if is_eq { Instr::SeteCl } else { Instr::SetneCl };
    vec![
        Instr::Cmpl(Operand::from(b), Operand::from(a)),
        set,
        Instr::MovzblCl(dst),
    ]
}

/// Maps a surface builtin name to its runtime (C-ABI) symbol. Builtins
/// that need no dispatch (the small/big split already happened at
/// explicate time) pass their name straight through via `add`/`negate`/...
fn runtime_name(name: &str) -> Result<String, CompileError> {
    let resolved = match name {
        "add" => runtime::ADD,
        "negate" => runtime::NEGATE,
        "equal" => runtime::EQUAL,
        "not_equal" => runtime::NOT_EQUAL,
        "input" => runtime::INPUT,
        "create_list" => runtime::CREATE_LIST,
        "create_dict" => runtime::CREATE_DICT,
        "get_subscript" => runtime::GET_SUBSCRIPT,
        "set_subscript" => runtime::SET_SUBSCRIPT,
        "is_true" => runtime::IS_TRUE,
        other => return Err(CompileError::UnknownBuiltin { name: other.to_string() }),
    };
    Ok(resolved.to_string())
}

/// Emits the cdecl call sequence: reserve alignment padding, push
/// arguments right-to-left, `call`, pop the argument block, release the
/// padding, and (if a destination was given) collect `%eax`.
fn select_call(symbol: &str, args: &[Atom], dst: Option<Operand>) -> Vec<Instr> {
    let bytes_for_params = u32::try_from(args.len()).expect("arg count fits in u32") * 4;
    let mut out = vec![Instr::PadArgs(Padding::new(bytes_for_params))];
    for arg in args.iter().rev() {
        out.push(Instr::Pushl(Operand::from(arg.clone())));
    }
    out.push(Instr::Call(symbol.to_string()));
    out.push(Instr::Addl(Operand::Const(i32::try_from(bytes_for_params).unwrap()), Operand::reg(Reg::Esp)));
    out.push(Instr::UnpadArgs(Padding::new(bytes_for_params)));
    if let Some(dst) = dst {
        out.push(Instr::Movl(Operand::reg(Reg::Eax), dst));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{Abi, Platform};

    fn ctx() -> CompileContext {
        CompileContext::new(Abi::new(Platform::Linux), false)
    }

    #[test]
    fn atomic_assign_selects_to_a_single_movl() {
        let n: Name = "x".into();
        let instrs = select_expr_into(&mut ctx(), FlatExpr::Atom(Atom::Const(7)), Operand::name(n)).unwrap();
        assert_eq!(instrs, vec![Instr::Movl(Operand::Const(7), Operand::name("x".into()))]);
    }

    #[test]
    fn add_selects_to_movl_then_addl() {
        let n: Name = "x".into();
        let a = Atom::Const(1);
        let b = Atom::Const(2);
        let instrs = select_expr_into(&mut ctx(), FlatExpr::Add(a, b), Operand::name(n.clone())).unwrap();
        assert_eq!(
            instrs,
            vec![Instr::Movl(Operand::Const(1), Operand::name(n.clone())), Instr::Addl(Operand::Const(2), Operand::name(n))]
        );
    }

    #[test]
    fn call_pads_pushes_in_reverse_and_cleans_up() {
        let args = vec![Atom::Const(1), Atom::Const(2)];
        let out = select_call(runtime::ADD, &args, Some(Operand::name("r".into())));
        assert!(matches!(out[0], Instr::PadArgs(_)));
        assert_eq!(out[1], Instr::Pushl(Operand::Const(2)));
        assert_eq!(out[2], Instr::Pushl(Operand::Const(1)));
        assert!(matches!(out[3], Instr::Call(ref s) if s == runtime::ADD));
        assert!(matches!(out.last(), Some(Instr::Movl(_, _))));
    }

    #[test]
    fn unknown_builtin_is_rejected() {
        let err = runtime_name("not_a_builtin").unwrap_err();
        assert!(matches!(err, CompileError::UnknownBuiltin { .. }));
    }
}
