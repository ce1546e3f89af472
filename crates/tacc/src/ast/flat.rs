//! Three-address form: the output of [`crate::flatten`] and the input to
//! [`crate::ir::select`].
//!
//! Every operand below is an [`Atom`] — `flatten` has already hoisted any
//! compound sub-expression into its own `Assign` and replaced it with the
//! temporary it was assigned to.

use crate::{
    ast::core::{BinOp, BoxKind, UnboxKind},
    atom::{Atom, Name},
};

#[derive(Debug, Clone, PartialEq)]
pub struct FlatModule {
    pub body: Vec<FlatStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlatStmt {
    Assign(Name, FlatExpr),
    Discard(FlatExpr),
    Printnl(Atom),
    If(Atom, Vec<FlatStmt>, Vec<FlatStmt>),
}

/// The right-hand side of a flattened `Assign`/`Discard`: either an atom
/// standing alone, or exactly one primitive operation over atoms.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatExpr {
    Atom(Atom),
    Add(Atom, Atom),
    UnarySub(Atom),
    Bop(BinOp, Atom, Atom),
    GetTag(Atom),
    Box(BoxKind, Atom),
    UnBox(UnboxKind, Atom),
    CallFunc(String, Vec<Atom>),
}
