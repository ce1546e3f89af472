//! The x86 IR instruction model.
//!
//! Locations are not stored on the instruction: the register allocator
//! keeps a `VarKey -> Location` map (see [`crate::ir::regalloc`]) and
//! instructions are resolved against it on demand, rather than mutating
//! a location onto each instruction in place.

use std::cell::Cell;

use ahash::AHashSet;
use smallvec::{SmallVec, smallvec};

use crate::{
    atom::{Atom, Name},
    ir::operand::{Reg, VarKey},
};

/// An instruction operand: an immediate, or anything that lives in the
/// `VarKey` namespace (a user/compiler name or a fixed physical register).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Const(i32),
    Var(VarKey),
}

impl Operand {
    #[must_use]
    pub fn reg(r: Reg) -> Self {
        Self::Var(VarKey::Reg(r))
    }

    #[must_use]
    pub fn name(n: Name) -> Self {
        Self::Var(VarKey::Named(n))
    }

    #[must_use]
    pub fn as_var(&self) -> Option<&VarKey> {
        match self {
            Self::Var(v) => Some(v),
            Self::Const(_) => None,
        }
    }
}

impl From<Atom> for Operand {
    fn from(atom: Atom) -> Self {
        match atom {
            Atom::Const(v) => Self::Const(v),
            Atom::Name(n) => Self::name(n),
        }
    }
}

/// `pad_args`/`unpad_args` carry the argument-block size they straddle and
/// the padding resolved for it once the final frame size (`bytes_used`) is
/// known. `None` until resolution runs.
#[derive(Debug, Clone)]
pub struct Padding {
    pub bytes_for_params: u32,
    pub resolved: Cell<Option<u32>>,
}

impl Padding {
    #[must_use]
    pub fn new(bytes_for_params: u32) -> Self {
        Self { bytes_for_params, resolved: Cell::new(None) }
    }
}

impl PartialEq for Padding {
    fn eq(&self, other: &Self) -> bool {
        self.bytes_for_params == other.bytes_for_params && self.resolved.get() == other.resolved.get()
    }
}

/// One x86 IR instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Movl(Operand, Operand),
    /// A `movl` whose destination the allocator must put in a register
    /// (used only by the spill loop's scratch moves).
    UnspillableMovl(Operand, Operand),
    Addl(Operand, Operand),
    Negl(Operand),
    Cmpl(Operand, Operand),
    SeteCl,
    SetneCl,
    MovzblCl(Operand),
    /// Shift-left logical by a constant amount.
    Sall(i32, Operand),
    /// Shift-right arithmetic by a constant amount.
    Sarl(i32, Operand),
    Andl(i32, Operand),
    Orl(i32, Operand),
    Pushl(Operand),
    Call(String),
    PadArgs(Padding),
    UnpadArgs(Padding),
    If(Operand, Vec<Instr>, Vec<Instr>),
}

type Vars = SmallVec<[VarKey; 2]>;

impl Instr {
    /// Names/registers read by this instruction alone.
    #[must_use]
    pub fn reads(&self) -> Vars {
        match self {
            Self::Movl(s, _) | Self::UnspillableMovl(s, _) => var_of(s),
            Self::Addl(s, t) => var_of(s).into_iter().chain(var_of(t)).collect(),
            Self::Negl(t) | Self::Sall(_, t) | Self::Sarl(_, t) | Self::Andl(_, t) | Self::Orl(_, t) => var_of(t),
            Self::Cmpl(a, b) => var_of(a).into_iter().chain(var_of(b)).collect(),
            Self::SeteCl | Self::SetneCl => smallvec![],
            Self::MovzblCl(_) => smallvec![VarKey::Reg(Reg::Ecx)],
            Self::Pushl(v) => var_of(v),
            Self::Call(_) | Self::PadArgs(_) | Self::UnpadArgs(_) => smallvec![],
            Self::If(test, _, _) => var_of(test),
        }
    }

    /// Names/registers written by this instruction alone.
    #[must_use]
    pub fn writes(&self) -> Vars {
        match self {
            Self::Movl(_, t) | Self::UnspillableMovl(_, t) => var_of(t),
            Self::Addl(_, t) | Self::Negl(t) | Self::Sall(_, t) | Self::Sarl(_, t) | Self::Andl(_, t) | Self::Orl(_, t) => {
                var_of(t)
            }
            Self::MovzblCl(t) => var_of(t),
            Self::SeteCl | Self::SetneCl => smallvec![VarKey::Reg(Reg::Ecx)],
            Self::Call(_) => smallvec![VarKey::Reg(Reg::Eax)],
            Self::Cmpl(..) | Self::Pushl(_) | Self::PadArgs(_) | Self::UnpadArgs(_) | Self::If(..) => smallvec![],
        }
    }

    /// `true` for `movl`/`addl`/... instructions with exactly two operands
    /// whose resolved locations both turn out to be stack slots — the
    /// condition the spill loop rewrites.
    #[must_use]
    pub fn is_two_operand(&self) -> bool {
        matches!(
            self,
            Self::Movl(..) | Self::UnspillableMovl(..) | Self::Addl(..) | Self::Cmpl(..)
        )
    }

    /// The (first, second) operand pair for a two-operand instruction.
    #[must_use]
    pub fn operand_pair(&self) -> Option<(&Operand, &Operand)> {
        match self {
            Self::Movl(a, b) | Self::UnspillableMovl(a, b) | Self::Addl(a, b) | Self::Cmpl(a, b) => Some((a, b)),
            _ => None,
        }
    }

    /// Rewrites the first operand of a two-operand instruction in place
    /// (used by the spill loop to redirect a stack operand through a
    /// scratch register).
    pub fn set_first_operand(&mut self, new_first: Operand) {
        match self {
            Self::Movl(a, _) | Self::UnspillableMovl(a, _) | Self::Addl(a, _) | Self::Cmpl(a, _) => *a = new_first,
            _ => panic!("set_first_operand on an instruction with no first operand"),
        }
    }
}

fn var_of(op: &Operand) -> Vars {
    match op {
        Operand::Var(v) => smallvec![v.clone()],
        Operand::Const(_) => smallvec![],
    }
}

/// All distinct names/registers this sequence (recursing into nested
/// `if_instr`) reads or writes — used only by the interference builder,
/// never by liveness, since an `if_instr`'s own `writes()` stays empty
/// (its branch writes are already folded into the merged live set before
/// liveness reaches it).
pub fn syntactic_writes(body: &[Instr]) -> AHashSet<VarKey> {
    let mut out = AHashSet::new();
    collect_syntactic_writes(body, &mut out);
    out
}

fn collect_syntactic_writes(body: &[Instr], out: &mut AHashSet<VarKey>) {
    for instr in body {
        out.extend(instr.writes());
        if let Instr::If(_, then, or_else) = instr {
            collect_syntactic_writes(then, out);
            collect_syntactic_writes(or_else, out);
        }
    }
}
