use std::path::Path;

/// Language identification used by the context heuristics
use serde::{Deserialize, Serialize};

/// Languages with dedicated heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    /// TypeScript and JavaScript
    TypeScript,
    Python,
    Go,
    Java,
    Unknown,
}

impl Language {
    /// Detect language from a file extension (without the dot)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "ts" | "tsx" | "js" | "jsx" | "mjs" => Language::TypeScript,
            "py" | "pyi" => Language::Python,
            "go" => Language::Go,
            "java" | "kt" => Language::Java,
            _ => Language::Unknown,
        }
    }

    pub fn from_path(path: &str) -> Self {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Language::from_extension)
            .unwrap_or(Language::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Java => "java",
            Language::Unknown => "unknown",
        }
    }

    /// Whether `#` starts a line comment
    pub fn hash_comments(&self) -> bool {
        matches!(self, Language::Python)
    }

    /// Whether block structure comes from indentation rather than braces
    pub fn indentation_scoped(&self) -> bool {
        matches!(self, Language::Python)
    }

    /// Statement-start keywords offered by keyword completion
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Language::Rust => &[
                "as", "async", "await", "break", "const", "continue", "else", "enum", "fn",
                "for", "if", "impl", "let", "loop", "match", "mod", "move", "mut", "pub",
                "return", "struct", "trait", "type", "unsafe", "use", "where", "while",
            ],
            Language::TypeScript => &[
                "async", "await", "break", "class", "const", "continue", "else", "export",
                "extends", "for", "function", "if", "implements", "import", "interface",
                "let", "new", "return", "switch", "throw", "try", "type", "var", "while",
            ],
            Language::Python => &[
                "async", "await", "break", "class", "continue", "def", "elif", "else",
                "except", "for", "from", "if", "import", "lambda", "pass", "raise",
                "return", "try", "while", "with", "yield",
            ],
            Language::Go => &[
                "break", "const", "continue", "defer", "else", "for", "func", "go", "if",
                "import", "interface", "package", "range", "return", "select", "struct",
                "switch", "type", "var",
            ],
            Language::Java => &[
                "break", "class", "continue", "else", "extends", "final", "for", "if",
                "implements", "import", "interface", "new", "private", "protected",
                "public", "return", "static", "switch", "throw", "try", "void", "while",
            ],
            Language::Unknown => &[
                "class", "const", "else", "for", "function", "if", "import", "let",
                "return", "var", "while",
            ],
        }
    }
}
