//! Platform ABI facts: symbol prefixing and stack-alignment padding.
//!
//! Linux requires no extra alignment before a `call` (`required_offset =
//! 0`) and undecorated symbol names; macOS requires the stack to be
//! 16-byte aligned at the `call` instruction and prefixes every symbol
//! with `_`.

use std::fmt;

/// Target platform selected on the CLI (`--target linux|macos`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Platform {
    Linux,
    Macos,
}

impl Default for Platform {
    fn default() -> Self {
        Self::Linux
    }
}

/// Platform-specific assembly-emission facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abi {
    platform: Platform,
    required_offset: u32,
}

impl Abi {
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        let required_offset = match platform {
            Platform::Linux => 0,
            Platform::Macos => 16,
        };
        Self { platform, required_offset }
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Prefixes a symbol with `_` on macOS, leaves it bare on Linux.
    #[must_use]
    pub fn label(&self, label: &str) -> String {
        match self.platform {
            Platform::Macos => format!("_{label}"),
            Platform::Linux => label.to_owned(),
        }
    }

    /// Bytes of padding to insert before a `call` so that, once the callee
    /// pushes its return address, `%esp` lands on `required_offset`.
    ///
    /// `curr_offset` is the stack depth already committed (locals + saved
    /// registers); `params_bytes` is the size of the arguments about to be
    /// pushed for this call.
    #[must_use]
    pub fn padding_before_call(&self, curr_offset: u32, params_bytes: u32) -> u32 {
        if self.required_offset == 0 {
            return 0;
        }
        let used = (curr_offset + params_bytes) % self.required_offset;
        (self.required_offset - used) % self.required_offset
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_never_pads() {
        let abi = Abi::new(Platform::Linux);
        assert_eq!(abi.padding_before_call(13, 400), 0);
        assert_eq!(abi.label("equal"), "equal");
    }

    #[test]
    fn macos_pads_to_sixteen_bytes() {
        let abi = Abi::new(Platform::Macos);
        assert_eq!(abi.padding_before_call(0, 4), 12);
        assert_eq!(abi.padding_before_call(0, 16), 0);
        assert_eq!(abi.label("equal"), "_equal");
    }
}
