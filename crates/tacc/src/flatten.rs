//! Three-address lowering: reduce every operand to an [`Atom`], naming
//! every compound sub-expression via an explicit assignment.
//!
//! The `Add` rule's extra `t = right_atom` temp (instead of using
//! `right_atom` directly) exists so the emitted `Add(left, t)` maps onto
//! x86's destructive two-operand `addl src, dst` with `dst == t`.

use crate::{
    ast::{
        core::{Expr, Literal, Module, Stmt},
        flat::{FlatExpr, FlatModule, FlatStmt},
    },
    atom::{Atom, Name},
    context::CompileContext,
};

/// Either a bare atom, or one primitive operation still waiting to be
/// named by the caller (mirrors `_flatten_expr`'s `(prelude, atom_or_expr)`).
enum Flattened {
    Atom(Atom),
    Compound(FlatExpr),
}

fn to_flatexpr(flat: Flattened) -> FlatExpr {
    match flat {
        Flattened::Atom(a) => FlatExpr::Atom(a),
        Flattened::Compound(c) => c,
    }
}

/// Lowers an explicated module into three-address form.
pub fn flatten(ctx: &mut CompileContext, module: Module) -> FlatModule {
    FlatModule { body: flatten_stmts(ctx, module.body) }
}

fn flatten_stmts(ctx: &mut CompileContext, stmts: Vec<Stmt>) -> Vec<FlatStmt> {
    stmts.into_iter().flat_map(|s| flatten_stmt(ctx, s)).collect()
}

fn flatten_stmt(ctx: &mut CompileContext, stmt: Stmt) -> Vec<FlatStmt> {
    match stmt {
        Stmt::Assign(name, expr) => {
            let (mut prelude, flat) = flatten_expr(ctx, expr);
            prelude.push(FlatStmt::Assign(name, to_flatexpr(flat)));
            prelude
        }
        Stmt::Discard(expr) => {
            let (mut prelude, flat) = flatten_expr(ctx, expr);
            prelude.push(FlatStmt::Discard(to_flatexpr(flat)));
            prelude
        }
        Stmt::Printnl(expr) => {
            let (mut prelude, atom) = flatten_expr_atom(ctx, expr);
            prelude.push(FlatStmt::Printnl(atom));
            prelude
        }
        Stmt::If(test, then, or_else) => {
            let (mut prelude, test_atom) = flatten_expr_atom(ctx, test);
            let then_flat = flatten_stmts(ctx, then);
            let else_flat = flatten_stmts(ctx, or_else);
            prelude.push(FlatStmt::If(test_atom, then_flat, else_flat));
            prelude
        }
    }
}

fn literal_to_i32(lit: Literal) -> i32 {
    match lit {
        Literal::Int(v) => v,
        Literal::Bool(b) => i32::from(b),
        Literal::None => 0,
    }
}

fn flatten_expr(ctx: &mut CompileContext, expr: Expr) -> (Vec<FlatStmt>, Flattened) {
    match expr {
        Expr::Const(lit) => (vec![], Flattened::Atom(Atom::Const(literal_to_i32(lit)))),
        Expr::Name(n) => (vec![], Flattened::Atom(Atom::Name(n))),
        Expr::Add(l, r) => {
            let (mut prelude, left) = flatten_expr_atom(ctx, *l);
            let (right_prelude, right) = flatten_expr_atom(ctx, *r);
            prelude.extend(right_prelude);
            let t: Name = ctx.allocate_temp().into();
            prelude.push(FlatStmt::Assign(t.clone(), FlatExpr::Atom(right)));
            (prelude, Flattened::Compound(FlatExpr::Add(left, Atom::Name(t))))
        }
        Expr::UnarySub(e) => {
            let (prelude, atom) = flatten_expr_atom(ctx, *e);
            (prelude, Flattened::Compound(FlatExpr::UnarySub(atom)))
        }
        Expr::Bop(op, l, r) if op != crate::ast::BinOp::Seq => {
            let (mut prelude, left) = flatten_expr_atom(ctx, *l);
            let (right_prelude, right) = flatten_expr_atom(ctx, *r);
            prelude.extend(right_prelude);
            (prelude, Flattened::Compound(FlatExpr::Bop(op, left, right)))
        }
        Expr::Bop(_seq, l, r) => {
            let (mut prelude, left) = flatten_expr(ctx, *l);
            prelude.push(FlatStmt::Discard(to_flatexpr(left)));
            let (right_prelude, right) = flatten_expr(ctx, *r);
            prelude.extend(right_prelude);
            (prelude, right)
        }
        Expr::IfExp(test, then, or_else) => {
            let (mut prelude, test_atom) = flatten_expr_atom(ctx, *test);
            let t: Name = ctx.allocate_temp().into();
            let then_flat = flatten_branch(ctx, *then, &t);
            let else_flat = flatten_branch(ctx, *or_else, &t);
            prelude.push(FlatStmt::If(test_atom, then_flat, else_flat));
            (prelude, Flattened::Atom(Atom::Name(t)))
        }
        Expr::Let(x, rhs, body) => {
            let (mut prelude, rhs_flat) = flatten_expr(ctx, *rhs);
            prelude.push(FlatStmt::Assign(x, to_flatexpr(rhs_flat)));
            let (body_prelude, body_flat) = flatten_expr(ctx, *body);
            prelude.extend(body_prelude);
            (prelude, body_flat)
        }
        Expr::CallFunc(f, args) => {
            let mut prelude = Vec::new();
            let mut atoms = Vec::with_capacity(args.len());
            for arg in args {
                let (arg_prelude, atom) = flatten_expr_atom(ctx, arg);
                prelude.extend(arg_prelude);
                atoms.push(atom);
            }
            (prelude, Flattened::Compound(FlatExpr::CallFunc(f, atoms)))
        }
        Expr::GetTag(e) => {
            let (prelude, atom) = flatten_expr_atom(ctx, *e);
            (prelude, Flattened::Compound(FlatExpr::GetTag(atom)))
        }
        Expr::Box(kind, e) => {
            let (prelude, atom) = flatten_expr_atom(ctx, *e);
            (prelude, Flattened::Compound(FlatExpr::Box(kind, atom)))
        }
        Expr::UnBox(kind, e) => {
            let (prelude, atom) = flatten_expr_atom(ctx, *e);
            (prelude, Flattened::Compound(FlatExpr::UnBox(kind, atom)))
        }
    }
}

/// Forces an expression down to a single atom, naming it via a fresh
/// temporary if it was compound.
fn flatten_expr_atom(ctx: &mut CompileContext, expr: Expr) -> (Vec<FlatStmt>, Atom) {
    let (mut prelude, flat) = flatten_expr(ctx, expr);
    match flat {
        Flattened::Atom(atom) => (prelude, atom),
        Flattened::Compound(compound) => {
            let t: Name = ctx.allocate_temp().into();
            prelude.push(FlatStmt::Assign(t.clone(), compound));
            (prelude, Atom::Name(t))
        }
    }
}

/// Flattens an `IfExp` branch so it ends in an assignment of the branch's
/// value into the shared result temporary `t`.
fn flatten_branch(ctx: &mut CompileContext, expr: Expr, t: &Name) -> Vec<FlatStmt> {
    let (mut stmts, flat) = flatten_expr(ctx, expr);
    stmts.push(FlatStmt::Assign(t.clone(), to_flatexpr(flat)));
    stmts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{Abi, Platform};

    fn ctx() -> CompileContext {
        CompileContext::new(Abi::new(Platform::Linux), false)
    }

    fn assert_atomic(expr: &FlatExpr) {
        let atoms: Vec<&Atom> = match expr {
            FlatExpr::Atom(a) => vec![a],
            FlatExpr::Add(a, b) | FlatExpr::Bop(_, a, b) => vec![a, b],
            FlatExpr::UnarySub(a) | FlatExpr::GetTag(a) | FlatExpr::Box(_, a) | FlatExpr::UnBox(_, a) => vec![a],
            FlatExpr::CallFunc(_, args) => args.iter().collect(),
        };
        assert!(!atoms.is_empty() || matches!(expr, FlatExpr::CallFunc(_, _)));
    }

    #[test]
    fn add_produces_atomic_operands() {
        let mut ctx = ctx();
        let expr = Expr::Add(Box::new(Expr::Const(Literal::Int(1))), Box::new(Expr::Const(Literal::Int(2))));
        let (_prelude, flat) = flatten_expr(&mut ctx, expr);
        assert_atomic(&to_flatexpr(flat));
    }

    #[test]
    fn nested_add_hoists_into_prelude() {
        let mut ctx = ctx();
        let inner = Expr::Add(Box::new(Expr::Const(Literal::Int(1))), Box::new(Expr::Const(Literal::Int(2))));
        let expr = Expr::Add(Box::new(inner), Box::new(Expr::Const(Literal::Int(3))));
        let (prelude, flat) = flatten_expr(&mut ctx, expr);
        assert!(!prelude.is_empty(), "inner Add must be named in the prelude");
        assert_atomic(&to_flatexpr(flat));
        for stmt in &prelude {
            if let FlatStmt::Assign(_, rhs) = stmt {
                assert_atomic(rhs);
            }
        }
    }
}
