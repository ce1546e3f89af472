//! Per-compile mutable state threaded through every pass.
//!
//! A [`CompileContext`] is created once per [`crate::pipeline::compile_source`]
//! call and threaded explicitly through explicate/flatten/select, rather
//! than kept as process-global state, so two compiles in the same process
//! (or the same compile run twice in tests) never share allocator state.

use std::fmt;

use crate::abi::Abi;

/// A freshly minted temporary name, always internal (see [`crate::ast::Name::is_internal`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TempName(pub(crate) String);

impl fmt::Display for TempName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocator for compiler-internal temporaries (`#TEMP_<k>`) and jump labels.
///
/// Mirrors `allocator.py`'s `allocate`/`free` free-list: a freed temp is
/// recycled by the next `allocate()` call before the counter advances,
/// keeping the live-temp count (and therefore later register pressure)
/// close to what it would be with true stack-discipline reuse.
#[derive(Debug, Default)]
pub struct CompileContext {
    next_temp: u32,
    freed: Vec<TempName>,
    next_label: u32,
    abi: Option<Abi>,
    debug: bool,
}

impl CompileContext {
    #[must_use]
    pub fn new(abi: Abi, debug: bool) -> Self {
        Self { abi: Some(abi), debug, ..Self::default() }
    }

    /// Allocates a fresh internal temporary, reusing a freed one if available.
    pub fn allocate_temp(&mut self) -> TempName {
        if let Some(recycled) = self.freed.pop() {
            return recycled;
        }
        let name = TempName(format!("#TEMP_{}", self.next_temp));
        self.next_temp += 1;
        name
    }

    /// Returns a temporary to the free-list for reuse by a later allocation.
    pub fn free_temp(&mut self, temp: TempName) {
        self.freed.push(temp);
    }

    /// Allocates a fresh control-flow label (`L0`, `L1`, ...).
    pub fn allocate_label(&mut self) -> String {
        let label = format!("L{}", self.next_label);
        self.next_label += 1;
        label
    }

    #[must_use]
    pub fn abi(&self) -> Abi {
        self.abi.expect("CompileContext::abi used before construction finished")
    }

    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::Platform;

    #[test]
    fn temps_count_up_and_recycle_freed_ones() {
        let mut ctx = CompileContext::new(Abi::new(Platform::Linux), false);
        let a = ctx.allocate_temp();
        let b = ctx.allocate_temp();
        assert_eq!(a.to_string(), "#TEMP_0");
        assert_eq!(b.to_string(), "#TEMP_1");
        ctx.free_temp(a);
        let c = ctx.allocate_temp();
        assert_eq!(c.to_string(), "#TEMP_0");
    }

    #[test]
    fn labels_are_distinct() {
        let mut ctx = CompileContext::new(Abi::new(Platform::Linux), false);
        assert_eq!(ctx.allocate_label(), "L0");
        assert_eq!(ctx.allocate_label(), "L1");
    }
}
