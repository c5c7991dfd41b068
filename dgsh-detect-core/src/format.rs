use std::fmt;

/// Interpreter directive that introduces a script.
pub const SHEBANG: &[u8; 2] = b"#!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Starts with `#!`.
    Script,
    /// Anything else; expected to be an ELF object.
    Binary,
}

impl Format {
    /// Decides how to inspect `data` from its first two bytes.
    ///
    /// Inputs shorter than the directive are treated as binaries and later
    /// fail the ELF header size check.
    pub fn classify(data: &[u8]) -> Self {
        if data.starts_with(SHEBANG) {
            Format::Script
        } else {
            Format::Binary
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Script => "script",
            Format::Binary => "binary",
        };
        write!(f, "{}", name)
    }
}
