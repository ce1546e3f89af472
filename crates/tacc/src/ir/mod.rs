//! The x86 IR: instruction model, instruction selection, liveness,
//! interference graph construction, saturation-degree coloring, the spill
//! loop, and the peephole/emission pass.

pub mod color;
pub mod graph;
pub mod instr;
pub mod liveness;
pub mod operand;
pub mod peephole;
pub mod regalloc;
pub mod select;

pub use graph::InterferenceGraph;
pub use instr::{Instr, Operand, Padding};
pub use operand::{Location, Reg, VarKey};
pub use regalloc::allocate;
pub use select::select;
