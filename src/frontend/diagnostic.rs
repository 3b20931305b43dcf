use std::fmt;

/// Syntax category of a malformed line, picked from its leading word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxCategory {
    Memory,
    LoadImmediate,
    Arithmetic,
    Output,
    Nop,
    MissingOpcode,
}

impl SyntaxCategory {
    pub fn of_line(text: &str) -> Self {
        let word = text
            .trim_start()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .next()
            .unwrap_or("");

        match word {
            "load" | "store" => SyntaxCategory::Memory,
            "loadI" => SyntaxCategory::LoadImmediate,
            "add" | "sub" | "mult" | "lshift" | "rshift" => SyntaxCategory::Arithmetic,
            "output" => SyntaxCategory::Output,
            "nop" => SyntaxCategory::Nop,
            _ => SyntaxCategory::MissingOpcode,
        }
    }
}

impl fmt::Display for SyntaxCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxCategory::Memory => write!(f, "incorrect syntax for load/store"),
            SyntaxCategory::LoadImmediate => write!(f, "incorrect syntax for loadI"),
            SyntaxCategory::Arithmetic => write!(f, "incorrect syntax for arithmetic"),
            SyntaxCategory::Output => write!(f, "incorrect syntax for output"),
            SyntaxCategory::Nop => write!(f, "incorrect syntax for nop"),
            SyntaxCategory::MissingOpcode => write!(f, "statement must start with an opcode"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub category: SyntaxCategory,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.category)
    }
}
