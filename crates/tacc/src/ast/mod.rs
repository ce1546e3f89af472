//! AST node catalogs for the three tree-shaped stages of the pipeline:
//! [`surface`] (parser output), [`core`] (desugar/explicate input+output),
//! and [`flat`] (flatten output, the last tree-shaped stage before
//! instruction selection).

pub mod core;
pub mod flat;
pub mod surface;

pub use core::{BinOp, BoxKind, Expr, Literal, Module, Stmt, UnboxKind};
pub use flat::{FlatExpr, FlatModule, FlatStmt};
pub use surface::{CompareOp, SurfaceExpr, SurfaceModule, SurfaceStmt};
