//! Heuristic completion-context classifier

use codecortex_config::CompletionConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::utils::{
    extract_prefix, indentation_level, is_identifier_char, line_before_cursor,
    position_to_byte_offset, surrounding_lines,
};
use super::ContextExtractor;
use crate::language::Language;
use crate::types::*;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static completion pattern must compile")
}

static IMPORT_STATEMENT: Lazy<Regex> =
    Lazy::new(|| compile(r"^\s*(?:pub\s+)?(?:use|import|from|#include|extern\s+crate)\b"));
static RUST_USE: Lazy<Regex> = Lazy::new(|| compile(r"^\s*(?:pub\s+)?use\s+([^;]+);?"));
static ES_IMPORT: Lazy<Regex> =
    Lazy::new(|| compile(r#"^\s*import\s+(.+?)\s+from\s+['"]([^'"]+)['"]"#));
static PY_FROM_IMPORT: Lazy<Regex> =
    Lazy::new(|| compile(r"^\s*from\s+([\w.]+)\s+import\s+(.+)$"));
static PLAIN_IMPORT: Lazy<Regex> =
    Lazy::new(|| compile(r#"^\s*import\s+(?:static\s+)?['"]?([\w./]+)['"]?"#));

static FUNCTION_DECL: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:fn|function|def|func)\s+([A-Za-z_]\w*)"));
static ARROW_FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b(?:const|let|var)\s+([A-Za-z_]\w*)\s*=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_]\w*)\s*=>")
});
static VARIABLE_DECL: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b(?:let|const|var|val)\s+(?:mut\s+)?([A-Za-z_]\w*)(?:\s*:\s*([A-Za-z_][\w:<>]*))?")
});
static SHORT_VARIABLE_DECL: Lazy<Regex> = Lazy::new(|| compile(r"\b([A-Za-z_]\w*)\s*:="));
static PY_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?m)^\s*([A-Za-z_]\w*)\s*(?::\s*([A-Za-z_][\w\[\].]*))?\s*=[^=]")
});
static TYPE_DECL: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:struct|class|enum|interface|trait|type)\s+([A-Z]\w*)"));
static TYPE_USE: Lazy<Regex> =
    Lazy::new(|| compile(r"(?::|->)\s*&?(?:mut\s+)?([A-Z]\w*)"));

static DECLARED_TYPE: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b[A-Za-z_]\w*\s*:\s*([A-Za-z_][\w:<>\[\], &']*?)\s*=(?:[^=>][^=]*)?$")
});
static ARROW_RETURN_TYPE: Lazy<Regex> =
    Lazy::new(|| compile(r"->\s*(.+?)\s*(?:\bwhere\b.*)?[{:]?\s*$"));
static COLON_RETURN_TYPE: Lazy<Regex> =
    Lazy::new(|| compile(r"\)\s*:\s*([^{=]+?)\s*\{?\s*$"));

static DECLARATION_NAME: Lazy<Regex> = Lazy::new(|| {
    compile(r"^\s*(?:export\s+)?(?:let|const|var|val)\s+(?:mut\s+)?$")
});
static TYPE_KEYWORD_TAIL: Lazy<Regex> =
    Lazy::new(|| compile(r"(?:^|\W)(?:as|implements|extends|impl|dyn)$|:\s*&(?:mut\s+)?$"));
static BLOCK_HEADER: Lazy<Regex> = Lazy::new(|| {
    compile(r"^\s*(?:if|elif|else|for|while|def|class|try|except|finally|with|case|default|match|loop)\b")
});

static FUNCTION_HEADER: Lazy<Regex> =
    Lazy::new(|| compile(r"\b(?:fn|function|def|func)\s+([A-Za-z_]\w*)"));
static ANONYMOUS_FUNCTION_HEADER: Lazy<Regex> = Lazy::new(|| compile(r"\bfunction\b|=>"));
static METHOD_HEADER: Lazy<Regex> = Lazy::new(|| {
    compile(r"^(?:(?:public|private|protected|static|async|override|final)\s+)*(?:[\w<>\[\]]+\s+)?([A-Za-z_]\w*)\s*\([^)]*\)\s*(?::\s*[^{]+)?$")
});
static CLASS_HEADER: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b(?:class|struct|impl|interface|trait)\b(?:<[^>]*>)?\s+(?:\S+\s+for\s+)?([A-Za-z_]\w*)")
});
static PY_DEF: Lazy<Regex> = Lazy::new(|| compile(r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)"));
static PY_CLASS: Lazy<Regex> = Lazy::new(|| compile(r"^\s*class\s+([A-Za-z_]\w*)"));

const CONTROL_WORDS: &[&str] = &["if", "for", "while", "switch", "catch", "match", "return"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Function,
    Class,
}

#[derive(Debug, Clone)]
struct EnclosingBlock {
    kind: BlockKind,
    name: String,
    header: String,
}

/// Regex and brace-scan classifier
///
/// Flags are approximations: braces inside strings, multi-line strings and
/// unusual formatting can mislead the scan.
#[derive(Debug, Clone)]
pub struct HeuristicContextClassifier {
    surrounding_lines: usize,
}

impl Default for HeuristicContextClassifier {
    fn default() -> Self {
        Self::new(&CompletionConfig::default())
    }
}

impl HeuristicContextClassifier {
    pub fn new(config: &CompletionConfig) -> Self {
        Self {
            surrounding_lines: config.surrounding_lines,
        }
    }

    /// Classify the cursor line
    ///
    /// `line` is the cursor line up to the cursor; `prefix` is the identifier
    /// fragment being typed.
    pub fn classify(&self, line: &str, prefix: &str, language: Language) -> CompletionKind {
        let head = line.strip_suffix(prefix).unwrap_or(line);
        let trimmed = head.trim_end();

        if IMPORT_STATEMENT.is_match(line) {
            return CompletionKind::ImportStatement;
        }
        if is_member_access(head) {
            return CompletionKind::MemberAccess;
        }
        if is_type_position(trimmed) {
            return CompletionKind::TypeAnnotation;
        }
        if paren_depth(head) > 0 {
            return CompletionKind::FunctionCall;
        }
        if DECLARATION_NAME.is_match(head) || is_assignment_rhs(trimmed) {
            return CompletionKind::VariableDeclaration;
        }
        if at_statement_start(trimmed)
            && !prefix.is_empty()
            && language.keywords().iter().any(|k| k.starts_with(prefix))
        {
            return CompletionKind::Keyword;
        }
        CompletionKind::GenericExpression
    }
}

impl ContextExtractor for HeuristicContextClassifier {
    fn extract_context(&self, text: &str, position: Position, file: &str) -> CompletionContext {
        let language = Language::from_path(file);
        let offset = position_to_byte_offset(text, position);
        let before = &text[..offset];
        let line = line_before_cursor(text, offset);
        let prefix = extract_prefix(text, position);

        let completion_kind = self.classify(line, &prefix, language);

        let (in_string, line_comment) = scan_line(line, language);
        let in_comment = line_comment || (!in_string && open_block_comment(before));

        let blocks = if language.indentation_scoped() {
            enclosing_indented_blocks(before, line)
        } else {
            enclosing_braced_blocks(before)
        };

        let flags = SyntacticFlags {
            in_string,
            in_comment,
            in_function: blocks.iter().any(|b| b.kind == BlockKind::Function),
            in_class: blocks.iter().any(|b| b.kind == BlockKind::Class),
            indentation_level: indentation_level(line),
        };

        let (imports, imported_names) = collect_imports(text);
        let local_functions = collect_functions(text);
        let local_variables = collect_variables(before, language, &local_functions);
        let available_types = collect_types(text);
        let expected_type = expected_type(line, &blocks, language);
        let scope_chain = blocks.iter().rev().map(|b| b.name.clone()).collect();

        let mut candidate_symbols = Vec::new();
        for name in &local_functions {
            push_unique(
                &mut candidate_symbols,
                Symbol::new(name.clone(), SymbolKind::Function)
                    .with_scope(SymbolScope::Local)
                    .with_confidence(0.9),
            );
        }
        for (name, type_name) in &local_variables {
            let mut symbol = Symbol::new(name.clone(), SymbolKind::Variable)
                .with_scope(SymbolScope::Local)
                .with_confidence(0.9);
            symbol.type_name = type_name.clone();
            push_unique(&mut candidate_symbols, symbol);
        }
        for name in &imported_names {
            push_unique(
                &mut candidate_symbols,
                Symbol::new(name.clone(), imported_kind(name))
                    .with_scope(SymbolScope::Imported)
                    .with_confidence(0.8),
            );
        }
        for name in &available_types {
            push_unique(
                &mut candidate_symbols,
                Symbol::new(name.clone(), SymbolKind::Type)
                    .with_type(name.clone())
                    .with_scope(SymbolScope::Global)
                    .with_confidence(0.7),
            );
        }
        if completion_kind == CompletionKind::Keyword {
            for keyword in language.keywords() {
                push_unique(
                    &mut candidate_symbols,
                    Symbol::new(*keyword, SymbolKind::Keyword).with_scope(SymbolScope::Global),
                );
            }
        }

        trace!(
            file,
            language = language.as_str(),
            kind = completion_kind.as_str(),
            in_string,
            in_comment,
            candidates = candidate_symbols.len(),
            "Classified completion context"
        );

        CompletionContext {
            file: file.to_string(),
            position,
            surrounding_code: surrounding_lines(text, position.line, self.surrounding_lines),
            prefix,
            imports,
            local_functions,
            local_variables: local_variables.into_iter().map(|(name, _)| name).collect(),
            scope_chain,
            completion_kind,
            expected_type,
            candidate_symbols,
            recent_usage: Vec::new(),
            flags,
            hints: SemanticHints {
                available_types,
                imports: imported_names,
            },
        }
    }
}

fn is_member_access(head: &str) -> bool {
    if head.ends_with("::") {
        return true;
    }
    if let Some(rest) = head.strip_suffix("->") {
        return rest.chars().last().is_some_and(is_identifier_char);
    }
    if let Some(rest) = head.strip_suffix('.') {
        return !rest.ends_with('.')
            && rest
                .chars()
                .last()
                .is_some_and(|c| is_identifier_char(c) || matches!(c, ')' | ']' | '?'));
    }
    false
}

fn is_type_position(trimmed: &str) -> bool {
    if trimmed.ends_with("->") {
        return true;
    }
    if trimmed.ends_with(':') && !trimmed.ends_with("::") {
        // `if x:` / `case 1:` close a block header rather than open a type
        return paren_depth(trimmed) > 0 || !BLOCK_HEADER.is_match(trimmed);
    }
    if let Some(rest) = trimmed.strip_suffix('<') {
        return rest.chars().last().is_some_and(is_identifier_char);
    }
    TYPE_KEYWORD_TAIL.is_match(trimmed)
}

fn is_assignment_rhs(trimmed: &str) -> bool {
    trimmed.ends_with('=')
        && !["==", "!=", "<=", ">="]
            .iter()
            .any(|op| trimmed.ends_with(op))
}

fn at_statement_start(trimmed: &str) -> bool {
    trimmed.trim_start().is_empty() || trimmed.ends_with(['{', '}', ';'])
}

/// Parenthesis depth of the current statement, ignoring quoted text
fn paren_depth(text: &str) -> i32 {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        match quote {
            Some(_) if ch == '\\' => {
                chars.next();
            }
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '"' | '`' => quote = Some(ch),
                '(' => depth += 1,
                ')' => depth -= 1,
                ';' | '{' | '}' => depth = 0,
                _ => {}
            },
        }
    }
    depth
}

/// `(in_string, in_line_comment)` for the cursor line
fn scan_line(line: &str, language: Language) -> (bool, bool) {
    let chars: Vec<char> = line.chars().collect();
    let mut quote: Option<char> = None;
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        match quote {
            Some(_) if ch == '\\' => idx += 1,
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '"' | '`' => quote = Some(ch),
                '\'' if language != Language::Rust || is_char_literal(&chars, idx) => {
                    quote = Some(ch)
                }
                '/' if chars.get(idx + 1) == Some(&'/') => return (false, true),
                '#' if language.hash_comments() => return (false, true),
                _ => {}
            },
        }
        idx += 1;
    }

    (quote.is_some(), false)
}

/// Distinguishes `'x'` / `'\n'` from a lifetime such as `'a`
fn is_char_literal(chars: &[char], quote_idx: usize) -> bool {
    match chars.get(quote_idx + 1) {
        Some('\\') => true,
        Some(_) => chars.get(quote_idx + 2) == Some(&'\''),
        None => true,
    }
}

fn open_block_comment(before: &str) -> bool {
    match (before.rfind("/*"), before.rfind("*/")) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Blocks enclosing the cursor, innermost first
fn enclosing_braced_blocks(before: &str) -> Vec<EnclosingBlock> {
    let bytes = before.as_bytes();
    let mut depth = 0usize;
    let mut blocks = Vec::new();

    for idx in (0..bytes.len()).rev() {
        match bytes[idx] {
            b'}' => depth += 1,
            b'{' if depth > 0 => depth -= 1,
            b'{' => {
                if let Some(block) = classify_header(header_before(before, idx)) {
                    blocks.push(block);
                }
            }
            _ => {}
        }
    }

    blocks
}

/// Text introducing the brace at `brace_idx` (Allman style falls back to the previous line)
fn header_before(before: &str, brace_idx: usize) -> &str {
    let line_start = before[..brace_idx].rfind('\n').map_or(0, |i| i + 1);
    let header = before[line_start..brace_idx].trim();
    let header = match header.rfind(['}', ';', '{']) {
        Some(idx) => header[idx + 1..].trim(),
        None => header,
    };
    if !header.is_empty() || line_start == 0 {
        return header;
    }
    before[..line_start]
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
}

fn classify_header(header: &str) -> Option<EnclosingBlock> {
    let block = |kind, name: &str| EnclosingBlock {
        kind,
        name: name.to_string(),
        header: header.to_string(),
    };

    if let Some(caps) = FUNCTION_HEADER.captures(header) {
        return Some(block(BlockKind::Function, &caps[1]));
    }
    if let Some(caps) = CLASS_HEADER.captures(header) {
        return Some(block(BlockKind::Class, &caps[1]));
    }
    if ANONYMOUS_FUNCTION_HEADER.is_match(header) {
        return Some(block(BlockKind::Function, "<anonymous>"));
    }
    if let Some(caps) = METHOD_HEADER.captures(header) {
        let name = &caps[1];
        if !CONTROL_WORDS.contains(&name) {
            return Some(block(BlockKind::Function, name));
        }
    }
    None
}

fn enclosing_indented_blocks(before: &str, cursor_line: &str) -> Vec<EnclosingBlock> {
    let mut threshold = indent_width(cursor_line);
    let mut blocks = Vec::new();
    // The last entry is the cursor line itself
    let mut lines: Vec<&str> = before.lines().collect();
    if !before.ends_with('\n') {
        lines.pop();
    }

    for line in lines.into_iter().rev() {
        if threshold == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let width = indent_width(line);
        if width >= threshold {
            continue;
        }
        threshold = width;
        if let Some(caps) = PY_DEF.captures(line) {
            blocks.push(EnclosingBlock {
                kind: BlockKind::Function,
                name: caps[1].to_string(),
                header: line.trim().to_string(),
            });
        } else if let Some(caps) = PY_CLASS.captures(line) {
            blocks.push(EnclosingBlock {
                kind: BlockKind::Class,
                name: caps[1].to_string(),
                header: line.trim().to_string(),
            });
        }
    }

    blocks
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn expected_type(line: &str, blocks: &[EnclosingBlock], language: Language) -> Option<String> {
    if let Some(caps) = DECLARED_TYPE.captures(line) {
        return Some(caps[1].trim().to_string());
    }

    let statement = line.trim_start();
    if statement == "return" || statement.starts_with("return ") {
        let function = blocks.iter().find(|b| b.kind == BlockKind::Function)?;
        if let Some(caps) = ARROW_RETURN_TYPE.captures(&function.header) {
            return Some(caps[1].trim().to_string());
        }
        if language != Language::Python {
            if let Some(caps) = COLON_RETURN_TYPE.captures(&function.header) {
                return Some(caps[1].trim().to_string());
            }
        }
    }
    None
}

/// `(module paths, names bound by the imports)`
fn collect_imports(text: &str) -> (Vec<String>, Vec<String>) {
    let mut modules = Vec::new();
    let mut names = Vec::new();

    for line in text.lines() {
        if let Some(caps) = RUST_USE.captures(line) {
            let path = caps[1].trim();
            push_name(&mut modules, path);
            for name in rust_use_names(path) {
                push_name(&mut names, &name);
            }
        } else if let Some(caps) = ES_IMPORT.captures(line) {
            push_name(&mut modules, &caps[2]);
            for name in bound_names(&caps[1]) {
                push_name(&mut names, &name);
            }
        } else if let Some(caps) = PY_FROM_IMPORT.captures(line) {
            push_name(&mut modules, &caps[1]);
            for name in bound_names(&caps[2]) {
                push_name(&mut names, &name);
            }
        } else if let Some(caps) = PLAIN_IMPORT.captures(line) {
            let path = caps[1].trim_end_matches(';');
            push_name(&mut modules, path);
            if let Some(last) = path.rsplit(['.', '/']).next() {
                push_name(&mut names, last);
            }
        }
    }

    (modules, names)
}

fn rust_use_names(path: &str) -> Vec<String> {
    if let (Some(open), Some(close)) = (path.find('{'), path.rfind('}')) {
        let base = path[..open].trim_end_matches("::");
        return path[open + 1..close]
            .split(',')
            .filter_map(|item| {
                let item = item.trim();
                if item == "self" {
                    base.rsplit("::").next().map(str::to_string)
                } else {
                    last_bound_word(item)
                }
            })
            .collect();
    }
    last_bound_word(path).into_iter().collect()
}

/// Names bound by an import list such as `{ a, b as c }` or `x, y`
fn bound_names(list: &str) -> Vec<String> {
    list.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace())
        .split(',')
        .filter_map(|item| last_bound_word(item.trim().trim_matches(['{', '}']).trim()))
        .collect()
}

/// Last identifier of an import item; handles `a as b` and `a::b`
fn last_bound_word(item: &str) -> Option<String> {
    let word = item
        .rsplit(|c: char| c.is_whitespace() || c == ':' || c == '.')
        .find(|w| !w.is_empty())?;
    let word = word.trim_end_matches(';');
    if word.is_empty() || word == "*" || !word.chars().all(is_identifier_char) {
        return None;
    }
    Some(word.to_string())
}

fn collect_functions(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for caps in FUNCTION_DECL.captures_iter(text) {
        push_name(&mut names, &caps[1]);
    }
    for caps in ARROW_FUNCTION_DECL.captures_iter(text) {
        push_name(&mut names, &caps[1]);
    }
    names
}

/// Variables declared before the cursor with their annotated types
fn collect_variables(
    before: &str,
    language: Language,
    functions: &[String],
) -> Vec<(String, Option<String>)> {
    let mut variables: Vec<(String, Option<String>)> = Vec::new();
    let mut push = |name: &str, type_name: Option<&str>| {
        if functions.iter().any(|f| f == name) || variables.iter().any(|(v, _)| v == name) {
            return;
        }
        variables.push((name.to_string(), type_name.map(str::to_string)));
    };

    for caps in VARIABLE_DECL.captures_iter(before) {
        push(&caps[1], caps.get(2).map(|m| m.as_str()));
    }
    for caps in SHORT_VARIABLE_DECL.captures_iter(before) {
        push(&caps[1], None);
    }
    if language == Language::Python {
        for caps in PY_ASSIGNMENT.captures_iter(before) {
            push(&caps[1], caps.get(2).map(|m| m.as_str()));
        }
    }

    variables
}

fn collect_types(text: &str) -> Vec<String> {
    let mut types = Vec::new();
    for caps in TYPE_DECL.captures_iter(text) {
        push_name(&mut types, &caps[1]);
    }
    for caps in TYPE_USE.captures_iter(text) {
        push_name(&mut types, &caps[1]);
    }
    types
}

fn imported_kind(name: &str) -> SymbolKind {
    match name.chars().next() {
        Some(first) if first.is_uppercase() => {
            if name.len() > 1 && name.chars().all(|c| c.is_uppercase() || c == '_' || c.is_numeric()) {
                SymbolKind::Constant
            } else {
                SymbolKind::Type
            }
        }
        _ => SymbolKind::Module,
    }
}

fn push_name(names: &mut Vec<String>, name: &str) {
    if !name.is_empty() && !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

fn push_unique(symbols: &mut Vec<Symbol>, symbol: Symbol) {
    if !symbols.iter().any(|s| s.name == symbol.name) {
        symbols.push(symbol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> CompletionKind {
        let position = Position::new(0, line.chars().count() as u32);
        let prefix = extract_prefix(line, position);
        HeuristicContextClassifier::default().classify(line, &prefix, Language::Rust)
    }

    #[test]
    fn test_classification_table() {
        let cases = [
            ("use std::coll", CompletionKind::ImportStatement),
            ("import { useState } from 'react'", CompletionKind::ImportStatement),
            ("    self.", CompletionKind::MemberAccess),
            ("let v = Vec::wi", CompletionKind::MemberAccess),
            ("ptr->fi", CompletionKind::MemberAccess),
            ("let count: ", CompletionKind::TypeAnnotation),
            ("fn parse(input: &", CompletionKind::TypeAnnotation),
            ("fn parse() -> ", CompletionKind::TypeAnnotation),
            ("let items: Vec<", CompletionKind::TypeAnnotation),
            ("let n = value as u", CompletionKind::TypeAnnotation),
            ("println!(\"{}\", ", CompletionKind::FunctionCall),
            ("compute(a, b", CompletionKind::FunctionCall),
            ("let ", CompletionKind::VariableDeclaration),
            ("let total = ", CompletionKind::VariableDeclaration),
            ("    ret", CompletionKind::Keyword),
            ("if a == b", CompletionKind::GenericExpression),
            ("    xyz", CompletionKind::GenericExpression),
        ];

        for (line, expected) in cases {
            assert_eq!(classify(line), expected, "line: {:?}", line);
        }
    }

    #[test]
    fn test_range_is_not_member_access() {
        assert_eq!(classify("for i in 0.."), CompletionKind::GenericExpression);
    }

    #[test]
    fn test_block_header_colon_is_not_type_position() {
        assert!(!is_type_position("if ready:"));
        assert!(is_type_position("def area(self, shape:"));
        assert!(is_type_position("count:"));
    }

    #[test]
    fn test_scan_line_strings_and_comments() {
        assert_eq!(scan_line(r#"let s = "abc"#, Language::Rust), (true, false));
        assert_eq!(scan_line(r#"let s = "a\"b"#, Language::Rust), (true, false));
        assert_eq!(scan_line(r#"let s = "ab"; x"#, Language::Rust), (false, false));
        assert_eq!(scan_line("let x = 1; // note", Language::Rust), (false, true));
        assert_eq!(scan_line(r#"let url = "http://x"#, Language::Rust), (true, false));
        assert_eq!(scan_line("fn f<'a>(x: &'a str) -> ", Language::Rust), (false, false));
        assert_eq!(scan_line("let c = 'x'; ", Language::Rust), (false, false));
        assert_eq!(scan_line("x = 1  # note", Language::Python), (false, true));
        assert_eq!(scan_line("s = 'abc", Language::Python), (true, false));
    }

    #[test]
    fn test_open_block_comment() {
        assert!(open_block_comment("/* started"));
        assert!(!open_block_comment("/* done */ x"));
        assert!(open_block_comment("/* a */ b /* c"));
        assert!(!open_block_comment("plain"));
    }

    #[test]
    fn test_braced_scope_chain() {
        let before = "struct Parser {}\nimpl Parser {\n    fn parse(&self) -> usize {\n        if true {\n            ";
        let blocks = enclosing_braced_blocks(before);
        let names: Vec<_> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["parse", "Parser"]);
        assert_eq!(blocks[0].kind, BlockKind::Function);
        assert_eq!(blocks[1].kind, BlockKind::Class);
    }

    #[test]
    fn test_allman_header_uses_previous_line() {
        let before = "function render()\n{\n  ";
        let blocks = enclosing_braced_blocks(before);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "render");
    }

    #[test]
    fn test_method_header_without_keyword() {
        let before = "class Greeter {\n  greet(name: string): string {\n    ";
        let names: Vec<_> = enclosing_braced_blocks(before)
            .into_iter()
            .map(|b| (b.kind, b.name))
            .collect();
        assert_eq!(
            names,
            vec![
                (BlockKind::Function, "greet".to_string()),
                (BlockKind::Class, "Greeter".to_string())
            ]
        );
    }

    #[test]
    fn test_control_blocks_are_not_scopes() {
        assert!(classify_header("if (ready)").is_none());
        assert!(classify_header("} else").is_none());
        assert!(classify_header("while (x > 0)").is_none());
    }

    #[test]
    fn test_indented_blocks() {
        let before = "class Shop:\n    def total(self):\n        x = 1\n        ";
        let blocks = enclosing_indented_blocks(before, "        ");
        let names: Vec<_> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["total", "Shop"]);
    }

    #[test]
    fn test_import_names() {
        let text = "use std::collections::{HashMap, HashSet as Set};\nuse crate::io::{self, Read};\nimport React, { useState } from 'react';\nfrom os.path import join, exists\nimport json\n";
        let (modules, names) = collect_imports(text);
        assert_eq!(
            modules,
            vec![
                "std::collections::{HashMap, HashSet as Set}",
                "crate::io::{self, Read}",
                "react",
                "os.path",
                "json",
            ]
        );
        assert_eq!(
            names,
            vec!["HashMap", "Set", "io", "Read", "React", "useState", "join", "exists", "json"]
        );
    }

    #[test]
    fn test_expected_type_from_declaration() {
        assert_eq!(
            expected_type("    let items: Vec<u8> = ", &[], Language::Rust),
            Some("Vec<u8>".to_string())
        );
        assert_eq!(
            expected_type("let n: u32 = compute(", &[], Language::Rust),
            Some("u32".to_string())
        );
        assert_eq!(expected_type("let n = ", &[], Language::Rust), None);
    }

    #[test]
    fn test_expected_type_from_return_position() {
        let rust = enclosing_braced_blocks("fn count(&self) -> usize {\n    ");
        assert_eq!(
            expected_type("    return ", &rust, Language::Rust),
            Some("usize".to_string())
        );

        let ts = enclosing_braced_blocks("function label(id: number): string {\n  ");
        assert_eq!(
            expected_type("  return ", &ts, Language::TypeScript),
            Some("string".to_string())
        );

        let py = enclosing_indented_blocks("def area(r) -> float:\n    ", "    ");
        assert_eq!(
            expected_type("    return ", &py, Language::Python),
            Some("float".to_string())
        );
    }
}
