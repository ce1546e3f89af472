//! Lowers the surface grammar into the back-end's node catalog.
//!
//! `elif` chains flatten into nested `If`, `and`/`or` become ternaries
//! that short-circuit by only evaluating one side, list/dict/subscript
//! literals become builtin calls. `while` has no counterpart in the
//! back-end's `IfStmt`-only control-flow catalog and is rejected rather
//! than silently dropped.

use crate::{
    ast::{
        core::{BinOp, Expr, Literal, Module, Stmt},
        surface::{CompareOp, SurfaceExpr, SurfaceModule, SurfaceStmt},
    },
    error::DesugarError,
};

pub fn desugar(module: SurfaceModule) -> Result<Module, DesugarError> {
    Ok(Module { body: desugar_stmts(module.body)? })
}

fn desugar_stmts(stmts: Vec<SurfaceStmt>) -> Result<Vec<Stmt>, DesugarError> {
    stmts.into_iter().map(desugar_stmt).collect()
}

fn desugar_stmt(stmt: SurfaceStmt) -> Result<Stmt, DesugarError> {
    match stmt {
        SurfaceStmt::Assign(name, expr) => Ok(Stmt::Assign(name.into(), desugar_expr(expr)?)),
        SurfaceStmt::SubscriptAssign(target, index, value) => Ok(Stmt::Discard(Expr::CallFunc(
            "set_subscript".to_owned(),
            vec![desugar_expr(target)?, desugar_expr(index)?, desugar_expr(value)?],
        ))),
        SurfaceStmt::Discard(expr) => Ok(Stmt::Discard(desugar_expr(expr)?)),
        SurfaceStmt::Printnl(expr) => Ok(Stmt::Printnl(desugar_expr(expr)?)),
        SurfaceStmt::If { test, then, elifs, or_else } => {
            let test_e = desugar_expr(test)?;
            let then_s = desugar_stmts(then)?;
            let else_s = desugar_elifs(elifs, or_else)?;
            Ok(Stmt::If(test_e, then_s, else_s))
        }
        SurfaceStmt::While { .. } => Err(DesugarError::UnsupportedConstruct { what: "while" }),
    }
}

/// Flattens `elif` chains into right-nested `If`s: `elif a: X elif b: Y
/// else: Z` becomes `If(a, X, [If(b, Y, Z)])`.
fn desugar_elifs(mut elifs: Vec<(SurfaceExpr, Vec<SurfaceStmt>)>, or_else: Vec<SurfaceStmt>) -> Result<Vec<Stmt>, DesugarError> {
    if elifs.is_empty() {
        return desugar_stmts(or_else);
    }
    let (test, then) = elifs.remove(0);
    let test_e = desugar_expr(test)?;
    let then_s = desugar_stmts(then)?;
    let rest = desugar_elifs(elifs, or_else)?;
    Ok(vec![Stmt::If(test_e, then_s, rest)])
}

fn desugar_expr(expr: SurfaceExpr) -> Result<Expr, DesugarError> {
    match expr {
        SurfaceExpr::ConstInt(v) => Ok(Expr::Const(Literal::Int(v))),
        SurfaceExpr::ConstBool(b) => Ok(Expr::Const(Literal::Bool(b))),
        SurfaceExpr::ConstNone => Ok(Expr::Const(Literal::None)),
        SurfaceExpr::Name(n) => Ok(Expr::Name(n.into())),
        SurfaceExpr::Add(l, r) => Ok(Expr::Add(Box::new(desugar_expr(*l)?), Box::new(desugar_expr(*r)?))),
        SurfaceExpr::UnarySub(e) => Ok(Expr::UnarySub(Box::new(desugar_expr(*e)?))),
        SurfaceExpr::Compare(op, l, r) => {
            let op = match op {
                CompareOp::Eq => BinOp::Eq,
                CompareOp::NotEq => BinOp::NEq,
                CompareOp::Is => BinOp::Is,
            };
            Ok(Expr::Bop(op, Box::new(desugar_expr(*l)?), Box::new(desugar_expr(*r)?)))
        }
        // `a and b` == `b if a else a`. This duplicates the `a` subtree,
        // but explicate's Let-binding makes that safe even for compound
        // expressions, since its Add/Bop rules already bind every operand
        // before use.
        SurfaceExpr::And(l, r) => {
            let le = desugar_expr(*l)?;
            let re = desugar_expr(*r)?;
            Ok(Expr::IfExp(Box::new(le.clone()), Box::new(re), Box::new(le)))
        }
        SurfaceExpr::Or(l, r) => {
            let le = desugar_expr(*l)?;
            let re = desugar_expr(*r)?;
            Ok(Expr::IfExp(Box::new(le.clone()), Box::new(le), Box::new(re)))
        }
        SurfaceExpr::Not(e) => {
            let ee = desugar_expr(*e)?;
            Ok(Expr::IfExp(Box::new(ee), Box::new(Expr::Const(Literal::Bool(false))), Box::new(Expr::Const(Literal::Bool(true)))))
        }
        SurfaceExpr::IfExp(test, then, or_else) => Ok(Expr::IfExp(
            Box::new(desugar_expr(*test)?),
            Box::new(desugar_expr(*then)?),
            Box::new(desugar_expr(*or_else)?),
        )),
        SurfaceExpr::CallFunc(f, args) => {
            Ok(Expr::CallFunc(f, args.into_iter().map(desugar_expr).collect::<Result<_, _>>()?))
        }
        SurfaceExpr::List(items) => {
            Ok(Expr::CallFunc("create_list".to_owned(), items.into_iter().map(desugar_expr).collect::<Result<_, _>>()?))
        }
        SurfaceExpr::Dict(entries) => {
            let mut args = Vec::with_capacity(entries.len() * 2);
            for (k, v) in entries {
                args.push(desugar_expr(k)?);
                args.push(desugar_expr(v)?);
            }
            Ok(Expr::CallFunc("create_dict".to_owned(), args))
        }
        SurfaceExpr::Subscript(target, index) => {
            Ok(Expr::CallFunc("get_subscript".to_owned(), vec![desugar_expr(*target)?, desugar_expr(*index)?]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{lexer::lex, parser::parse};

    fn desugar_src(src: &str) -> Module {
        desugar(parse(&lex(src).unwrap()).unwrap()).unwrap()
    }

    #[test]
    fn while_is_rejected() {
        let surface = parse(&lex("while a:\n  x = 1\n").unwrap()).unwrap();
        let err = desugar(surface).unwrap_err();
        assert_eq!(err, DesugarError::UnsupportedConstruct { what: "while" });
    }

    #[test]
    fn elif_chain_flattens_to_nested_if() {
        let m = desugar_src("if a:\n  x = 1\nelif b:\n  x = 2\nelse:\n  x = 3\n");
        let Stmt::If(_, _, or_else) = &m.body[0] else { panic!("expected If") };
        assert!(matches!(or_else[0], Stmt::If(..)));
    }

    #[test]
    fn list_literal_becomes_create_list() {
        let m = desugar_src("x = [1, 2]\n");
        let Stmt::Assign(_, Expr::CallFunc(name, args)) = &m.body[0] else { panic!("expected CallFunc") };
        assert_eq!(name, "create_list");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn subscript_assignment_becomes_set_subscript_discard() {
        let m = desugar_src("a[0] = 1\n");
        assert!(matches!(&m.body[0], Stmt::Discard(Expr::CallFunc(name, _)) if name == "set_subscript"));
    }
}
