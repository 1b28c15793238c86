use codecortex_completion::*;
use codecortex_config::CompletionConfig;

fn extract(text: &str, file: &str) -> CompletionContext {
    let lines: Vec<&str> = text.split('\n').collect();
    let line = (lines.len() - 1) as u32;
    let character = lines[lines.len() - 1].chars().count() as u32;
    HeuristicContextClassifier::default().extract_context(text, Position::new(line, character), file)
}

#[test]
fn test_rust_method_body() {
    let text = "use std::collections::HashMap;\n\nstruct Cache {\n    map: HashMap<String, u32>,\n}\n\nimpl Cache {\n    fn lookup(&self, key: &str) -> Option<u32> {\n        let hits: u32 = 0;\n        self.";
    let ctx = extract(text, "src/cache.rs");

    assert_eq!(ctx.completion_kind, CompletionKind::MemberAccess);
    assert!(ctx.flags.in_function);
    assert!(ctx.flags.in_class);
    assert!(!ctx.flags.in_string);
    assert!(!ctx.flags.in_comment);
    assert_eq!(ctx.flags.indentation_level, 2);
    assert_eq!(ctx.scope_chain, vec!["Cache", "lookup"]);
    assert_eq!(ctx.imports, vec!["std::collections::HashMap"]);
    assert_eq!(ctx.hints.imports, vec!["HashMap"]);
    assert!(ctx.hints.available_types.contains(&"Cache".to_string()));
    assert_eq!(ctx.local_functions, vec!["lookup"]);
    assert_eq!(ctx.local_variables, vec!["hits"]);
    assert_eq!(ctx.prefix, "");
}

#[test]
fn test_prefix_and_keyword_at_statement_start() {
    let ctx = extract("fn main() {\n    re", "main.rs");
    assert_eq!(ctx.prefix, "re");
    assert_eq!(ctx.completion_kind, CompletionKind::Keyword);
    assert!(ctx
        .candidate_symbols
        .iter()
        .any(|s| s.name == "return" && s.kind == SymbolKind::Keyword));
}

#[test]
fn test_string_and_comment_flags() {
    let in_string = extract("fn main() {\n    let s = \"hello wor", "main.rs");
    assert!(in_string.flags.in_string);
    assert!(in_string.suppresses_completion());

    let line_comment = extract("let x = 1; // explain", "main.rs");
    assert!(line_comment.flags.in_comment);

    let block_comment = extract("/*\n * docs for th", "main.rs");
    assert!(block_comment.flags.in_comment);

    let closed = extract("/* note */\nlet value = ", "main.rs");
    assert!(!closed.flags.in_comment);
}

#[test]
fn test_expected_type_from_annotation_and_return() {
    let declared = extract("fn build() {\n    let cfg: Config = ", "lib.rs");
    assert_eq!(declared.expected_type.as_deref(), Some("Config"));
    assert_eq!(declared.completion_kind, CompletionKind::VariableDeclaration);

    let returned = extract("fn size(&self) -> usize {\n    return ", "lib.rs");
    assert_eq!(returned.expected_type.as_deref(), Some("usize"));
}

#[test]
fn test_python_indentation_scopes() {
    let text = "import os\nfrom typing import List\n\nclass Loader:\n    def load(self, path: str) -> List[str]:\n        lines = []\n        return ";
    let ctx = extract(text, "loader.py");

    assert!(ctx.flags.in_function);
    assert!(ctx.flags.in_class);
    assert_eq!(ctx.flags.indentation_level, 2);
    assert_eq!(ctx.scope_chain, vec!["Loader", "load"]);
    assert_eq!(ctx.imports, vec!["os", "typing"]);
    assert_eq!(ctx.hints.imports, vec!["os", "List"]);
    assert_eq!(ctx.expected_type.as_deref(), Some("List[str]"));
    assert!(ctx.local_variables.contains(&"lines".to_string()));
}

#[test]
fn test_python_hash_comment() {
    let ctx = extract("value = 3  # tweak th", "tune.py");
    assert!(ctx.flags.in_comment);
}

#[test]
fn test_typescript_arrow_and_imports() {
    let text = "import { useState } from 'react';\nconst render = (props) => {\n  const [count, setCount] = useState(0);\n  return set";
    let ctx = extract(text, "component.tsx");

    assert!(ctx.flags.in_function);
    assert!(!ctx.flags.in_class);
    assert_eq!(ctx.imports, vec!["react"]);
    assert!(ctx.local_functions.contains(&"render".to_string()));
    assert_eq!(ctx.prefix, "set");
}

#[test]
fn test_top_level_is_not_in_function() {
    let ctx = extract("struct Point { x: i32 }\nlet p = ", "geo.rs");
    assert!(!ctx.flags.in_function);
    assert!(!ctx.flags.in_class);
    assert!(ctx.scope_chain.is_empty());
}

#[test]
fn test_surrounding_code_window() {
    let text: String = (0..30).map(|i| format!("line{}\n", i)).collect::<String>() + "tail";
    let config = CompletionConfig {
        surrounding_lines: 2,
        ..CompletionConfig::default()
    };
    let ctx = HeuristicContextClassifier::new(&config).extract_context(
        &text,
        Position::new(15, 2),
        "notes.txt",
    );

    assert_eq!(ctx.surrounding_code, "line13\nline14\nline15\nline16\nline17");
    assert_eq!(ctx.position, Position::new(15, 2));
    assert_eq!(ctx.prefix, "li");
}

#[test]
fn test_candidates_cover_locals_imports_and_types() {
    let text = "use crate::model::Order;\nfn total(order: &Order) -> f64 {\n    let subtotal = 1.0;\n    ";
    let ctx = extract(text, "billing.rs");

    let find = |name: &str| ctx.candidate_symbols.iter().find(|s| s.name == name);
    assert_eq!(find("total").unwrap().kind, SymbolKind::Function);
    assert_eq!(find("subtotal").unwrap().scope, SymbolScope::Local);
    assert_eq!(find("Order").unwrap().scope, SymbolScope::Imported);
    assert_eq!(find("Order").unwrap().kind, SymbolKind::Type);
}
