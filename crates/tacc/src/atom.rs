//! Names and atoms: the two node kinds every IR operand ultimately reduces to.

use std::{fmt, rc::Rc};

/// A variable name, either user-written or compiler-internal.
///
/// Internal temporaries (allocated by [`crate::context::CompileContext`])
/// are spelled `#TEMP_<k>`; `#` cannot appear in a lexed source identifier,
/// so the two namespaces never collide without a dedicated "is temp" flag,
/// mirroring `allocator.py`'s `InternalName` marker subclass.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Rc<str>);

impl Name {
    #[must_use]
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for compiler-allocated temporaries, `false` for user source names.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.0.starts_with('#')
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<crate::context::TempName> for Name {
    fn from(temp: crate::context::TempName) -> Self {
        Self::new(temp.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A flattened operand: every non-atomic expression is flattened until
/// every remaining operand is one of these two shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Atom {
    Const(i32),
    Name(Name),
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(v) => write!(f, "{v}"),
            Self::Name(n) => write!(f, "{n}"),
        }
    }
}
