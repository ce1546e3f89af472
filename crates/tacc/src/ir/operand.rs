//! Physical registers, the graph-node key space, and resolved locations.

use std::fmt;

use crate::atom::Name;

/// A 32-bit general-purpose register. `Esp`/`Ebp` are reserved (stack
/// pointer / frame pointer) and never handed out as colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
pub enum Reg {
    #[strum(serialize = "%eax")]
    Eax,
    #[strum(serialize = "%ecx")]
    Ecx,
    #[strum(serialize = "%edx")]
    Edx,
    #[strum(serialize = "%ebx")]
    Ebx,
    #[strum(serialize = "%edi")]
    Edi,
    #[strum(serialize = "%esi")]
    Esi,
    #[strum(serialize = "%esp")]
    Esp,
    #[strum(serialize = "%ebp")]
    Ebp,
}

impl Reg {
    /// Registers the System V cdecl callee may clobber across a `call`.
    pub const CALLER_SAVED: [Reg; 3] = [Reg::Eax, Reg::Ecx, Reg::Edx];
    /// Registers a callee must preserve.
    pub const CALLEE_SAVED: [Reg; 3] = [Reg::Ebx, Reg::Edi, Reg::Esi];
    /// Never entered into the interference graph as assignable colors.
    pub const RESERVED: [Reg; 2] = [Reg::Esp, Reg::Ebp];

    /// Registers available to the coloring algorithm as initial colors.
    #[must_use]
    pub fn allocatable() -> [Reg; 6] {
        [Reg::Eax, Reg::Ecx, Reg::Edx, Reg::Ebx, Reg::Edi, Reg::Esi]
    }
}

/// A node in the interference graph: either a user/compiler name, or a
/// register used directly by an instruction (e.g. the implicit `%eax`
/// written by `call`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VarKey {
    Named(Name),
    Reg(Reg),
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => write!(f, "{n}"),
            Self::Reg(r) => write!(f, "{r}"),
        }
    }
}

/// Where a name ends up after coloring: a register, or a stack slot
/// `-N(%ebp)`. This is the "color" assigned by the interference graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Reg(Reg),
    /// Byte offset below `%ebp`; always a positive multiple of 4.
    Stack(u32),
}

impl Location {
    #[must_use]
    pub fn is_stack(self) -> bool {
        matches!(self, Self::Stack(_))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reg(r) => write!(f, "{r}"),
            Self::Stack(n) => write!(f, "-{n}(%ebp)"),
        }
    }
}
