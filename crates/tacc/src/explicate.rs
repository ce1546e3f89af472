//! Tagging pass: replaces dynamic typing with explicit `Box`/`UnBox`/
//! `GetTag` operations over the uniform 32-bit tagged representation.
//!
//! The nested `IfExp(Eq(tag,int_tag), small, IfExp(Eq(tag,bool_tag),
//! small, big))` shape is generalized into [`small_or_big`] and reused
//! by every operator that shares the small/big dispatch (`Add`,
//! `UnarySub`, `Eq`, `NEq`, and the truth witness used by `if`).

use crate::{
    ast::{BinOp, BoxKind, Expr, Literal, Module, Stmt, UnboxKind},
    atom::Name,
    context::CompileContext,
    error::CompileError,
};

const TAG_INT: i32 = 0;
const TAG_BOOL: i32 = 1;

/// Lowers a desugared module into the fully tag-explicit AST.
pub fn explicate(ctx: &mut CompileContext, module: Module) -> Result<Module, CompileError> {
    Ok(Module { body: explicate_stmts(ctx, module.body)? })
}

fn explicate_stmts(ctx: &mut CompileContext, stmts: Vec<Stmt>) -> Result<Vec<Stmt>, CompileError> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        out.extend(explicate_stmt(ctx, stmt)?);
    }
    Ok(out)
}

fn explicate_stmt(ctx: &mut CompileContext, stmt: Stmt) -> Result<Vec<Stmt>, CompileError> {
    match stmt {
        Stmt::Assign(name, expr) => Ok(vec![Stmt::Assign(name, explicate_expr(ctx, expr)?)]),
        Stmt::Discard(expr) => Ok(vec![Stmt::Discard(explicate_expr(ctx, expr)?)]),
        Stmt::Printnl(expr) => Ok(vec![Stmt::Printnl(explicate_expr(ctx, expr)?)]),
        Stmt::If(test, then, or_else) => {
            let test_e = explicate_expr(ctx, test)?;
            let then_e = explicate_stmts(ctx, then)?;
            let else_e = explicate_stmts(ctx, or_else)?;
            let x: Name = ctx.allocate_temp().into();
            let witness = truth_witness(x.clone());
            Ok(vec![Stmt::Assign(x, test_e), Stmt::If(witness, then_e, else_e)])
        }
    }
}

fn explicate_expr(ctx: &mut CompileContext, expr: Expr) -> Result<Expr, CompileError> {
    match expr {
        Expr::Const(Literal::Int(v)) => Ok(Expr::Box(BoxKind::Int, Box::new(Expr::Const(Literal::Int(v))))),
        Expr::Const(Literal::Bool(b)) => {
            Ok(Expr::Box(BoxKind::Bool, Box::new(Expr::Const(Literal::Int(i32::from(b))))))
        }
        Expr::Const(Literal::None) => Ok(Expr::Box(BoxKind::Big, Box::new(Expr::Const(Literal::Int(0))))),
        Expr::Name(n) => Ok(Expr::Name(n)),
        Expr::Add(l, r) => {
            let le = explicate_expr(ctx, *l)?;
            let re = explicate_expr(ctx, *r)?;
            let lt: Name = ctx.allocate_temp().into();
            let rt: Name = ctx.allocate_temp().into();
            let small = Expr::Box(
                BoxKind::Int,
                Box::new(Expr::Add(
                    Box::new(unbox_small(lt.clone())),
                    Box::new(unbox_small(rt.clone())),
                )),
            );
            let big = Expr::Box(
                BoxKind::Big,
                Box::new(Expr::CallFunc("add".to_owned(), vec![unbox_big(lt.clone()), unbox_big(rt.clone())])),
            );
            Ok(bind(lt.clone(), le, bind(rt, re, small_or_big(tag_of(lt), small, big))))
        }
        Expr::UnarySub(e) => {
            let ee = explicate_expr(ctx, *e)?;
            let t: Name = ctx.allocate_temp().into();
            let small = Expr::Box(BoxKind::Int, Box::new(Expr::UnarySub(Box::new(unbox_small(t.clone())))));
            // `negate` is a well-named stub for the big-path runtime symbol.
            let big = Expr::Box(BoxKind::Big, Box::new(Expr::CallFunc("negate".to_owned(), vec![unbox_big(t.clone())])));
            Ok(bind(t.clone(), ee, small_or_big(tag_of(t), small, big)))
        }
        Expr::Bop(op @ (BinOp::Eq | BinOp::NEq), l, r) => {
            let le = explicate_expr(ctx, *l)?;
            let re = explicate_expr(ctx, *r)?;
            let lt: Name = ctx.allocate_temp().into();
            let rt: Name = ctx.allocate_temp().into();
            let runtime_fn = if op == BinOp::Eq { "equal" } else { "not_equal" };
            let small = Expr::Box(
                BoxKind::Bool,
                Box::new(Expr::Bop(op, Box::new(unbox_small(lt.clone())), Box::new(unbox_small(rt.clone())))),
            );
            let big = Expr::Box(
                BoxKind::Bool,
                Box::new(Expr::CallFunc(runtime_fn.to_owned(), vec![unbox_big(lt.clone()), unbox_big(rt.clone())])),
            );
            Ok(bind(lt.clone(), le, bind(rt, re, small_or_big(tag_of(lt), small, big))))
        }
        Expr::Bop(BinOp::Is, l, r) => {
            let le = explicate_expr(ctx, *l)?;
            let re = explicate_expr(ctx, *r)?;
            let lt: Name = ctx.allocate_temp().into();
            let rt: Name = ctx.allocate_temp().into();
            let raw_eq = Expr::Box(BoxKind::Bool, Box::new(Expr::Bop(BinOp::Eq, Box::new(Expr::Name(lt.clone())), Box::new(Expr::Name(rt.clone())))));
            Ok(bind(lt, le, bind(rt, re, raw_eq)))
        }
        Expr::Bop(BinOp::Seq, l, r) => {
            let le = explicate_expr(ctx, *l)?;
            let re = explicate_expr(ctx, *r)?;
            Ok(Expr::Bop(BinOp::Seq, Box::new(le), Box::new(re)))
        }
        Expr::IfExp(t, a, b) => {
            let te = explicate_expr(ctx, *t)?;
            let ae = explicate_expr(ctx, *a)?;
            let be = explicate_expr(ctx, *b)?;
            let x: Name = ctx.allocate_temp().into();
            Ok(bind(x.clone(), te, Expr::IfExp(Box::new(truth_witness(x)), Box::new(ae), Box::new(be))))
        }
        Expr::Let(x, rhs, body) => {
            let rhs_e = explicate_expr(ctx, *rhs)?;
            let body_e = explicate_expr(ctx, *body)?;
            Ok(bind(x, rhs_e, body_e))
        }
        Expr::CallFunc(f, args) => explicate_call(ctx, &f, args),
        Expr::GetTag(e) => Ok(Expr::GetTag(Box::new(explicate_expr(ctx, *e)?))),
        Expr::Box(kind, e) => Ok(Expr::Box(kind, Box::new(explicate_expr(ctx, *e)?))),
        Expr::UnBox(kind, e) => Ok(Expr::UnBox(kind, Box::new(explicate_expr(ctx, *e)?))),
    }
}

fn explicate_call(ctx: &mut CompileContext, f: &str, args: Vec<Expr>) -> Result<Expr, CompileError> {
    let args_e = args.into_iter().map(|a| explicate_expr(ctx, a)).collect::<Result<Vec<_>, _>>()?;
    let call = Expr::CallFunc(f.to_owned(), args_e);
    match f {
        "input" => Ok(Expr::Box(BoxKind::Int, Box::new(call))),
        "create_list" | "create_dict" => Ok(Expr::Box(BoxKind::Big, Box::new(call))),
        "get_subscript" | "set_subscript" => Ok(call),
        other => Err(CompileError::UnknownBuiltin { name: other.to_owned() }),
    }
}

fn unbox_small(n: Name) -> Expr {
    Expr::UnBox(UnboxKind::Small, Box::new(Expr::Name(n)))
}

fn unbox_big(n: Name) -> Expr {
    Expr::UnBox(UnboxKind::Big, Box::new(Expr::Name(n)))
}

fn tag_of(n: Name) -> Expr {
    Expr::GetTag(Box::new(Expr::Name(n)))
}

fn bind(name: Name, rhs: Expr, body: Expr) -> Expr {
    Expr::Let(name, Box::new(rhs), Box::new(body))
}

/// `T(l) == tag_int || T(l) == tag_bool` picks `small`, else `big`,
/// mirroring `explicate.py`'s `_int_or_bool`.
fn small_or_big(tag_expr: Expr, small: Expr, big: Expr) -> Expr {
    Expr::IfExp(
        Box::new(Expr::Bop(BinOp::Eq, Box::new(tag_expr.clone()), Box::new(Expr::Const(Literal::Int(TAG_INT))))),
        Box::new(small.clone()),
        Box::new(Expr::IfExp(
            Box::new(Expr::Bop(BinOp::Eq, Box::new(tag_expr), Box::new(Expr::Const(Literal::Int(TAG_BOOL))))),
            Box::new(small),
            Box::new(big),
        )),
    )
}

/// The 0/non-zero word used to decide an `if`'s branch: the unboxed small
/// value when `x` is `int`/`bool`-tagged, else the runtime's `is_true`.
fn truth_witness(x: Name) -> Expr {
    small_or_big(
        tag_of(x.clone()),
        unbox_small(x.clone()),
        Expr::CallFunc("is_true".to_owned(), vec![Expr::Name(x)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{Abi, Platform};

    fn ctx() -> CompileContext {
        CompileContext::new(Abi::new(Platform::Linux), false)
    }

    #[test]
    fn const_int_is_boxed() {
        let mut ctx = ctx();
        let out = explicate_expr(&mut ctx, Expr::Const(Literal::Int(5))).unwrap();
        assert_eq!(out, Expr::Box(BoxKind::Int, Box::new(Expr::Const(Literal::Int(5)))));
    }

    #[test]
    fn add_dispatches_small_and_big() {
        let mut ctx = ctx();
        let out = explicate_expr(&mut ctx, Expr::Add(Box::new(Expr::Const(Literal::Int(1))), Box::new(Expr::Const(Literal::Int(2))))).unwrap();
        // top-level shape is Let(lt, .., Let(rt, .., IfExp(..)))
        let Expr::Let(_, _, body) = out else { panic!("expected Let") };
        let Expr::Let(_, _, body) = *body else { panic!("expected nested Let") };
        assert!(matches!(*body, Expr::IfExp(..)));
    }

    #[test]
    fn unknown_builtin_is_rejected() {
        let mut ctx = ctx();
        let err = explicate_expr(&mut ctx, Expr::CallFunc("frobnicate".to_owned(), vec![])).unwrap_err();
        assert_eq!(err, CompileError::UnknownBuiltin { name: "frobnicate".to_owned() });
    }

    /// No `Const(bool|None)` leaf survives explicate.
    fn assert_no_bool_or_none_consts(expr: &Expr) {
        match expr {
            Expr::Const(Literal::Bool(_) | Literal::None) => panic!("bool/None const leaked: {expr:?}"),
            Expr::Const(Literal::Int(_)) | Expr::Name(_) => {}
            Expr::Add(l, r) | Expr::Bop(_, l, r) | Expr::IfExp(l, r, _) | Expr::Let(_, l, r) => {
                assert_no_bool_or_none_consts(l);
                assert_no_bool_or_none_consts(r);
                if let Expr::IfExp(_, _, e) = expr {
                    assert_no_bool_or_none_consts(e);
                }
            }
            Expr::UnarySub(e) | Expr::GetTag(e) | Expr::Box(_, e) | Expr::UnBox(_, e) => {
                assert_no_bool_or_none_consts(e);
            }
            Expr::CallFunc(_, args) => args.iter().for_each(assert_no_bool_or_none_consts),
        }
    }

    #[test]
    fn explicate_totality_removes_bool_and_none_consts() {
        let mut ctx = ctx();
        for input in [
            Expr::Const(Literal::Bool(true)),
            Expr::Const(Literal::None),
            Expr::IfExp(
                Box::new(Expr::Const(Literal::Bool(false))),
                Box::new(Expr::Const(Literal::Int(1))),
                Box::new(Expr::Const(Literal::None)),
            ),
        ] {
            let out = explicate_expr(&mut ctx, input).unwrap();
            assert_no_bool_or_none_consts(&out);
        }
    }
}
