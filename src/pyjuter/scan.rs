//! Lightweight scan of the names a chunk binds in the global scope.
//!
//! The post-shim of an inlined chunk exports an explicit list of names to
//! its pseudo-module. That list comes from here. Source is joined into
//! logical lines (open brackets, triple-quoted strings and backslash
//! continuations), and indentation decides which block each line sits in.
//! Bodies of `if`/`for`/`while`/`try`/`with`/`match` blocks bind globals
//! and are scanned; bodies of `def` and `class` do not and are skipped.
//!
//! It does not parse Python. Statements it does not recognise contribute
//! no names, and a name may be reported that is unbound when the chunk
//! finishes (a branch not taken, a later `del`); the runtime export skips
//! those.

use crate::shim::RESERVED_PREFIX;

/// Names bound at global scope by `source`, in first-seen order.
pub fn exported_names(source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut blocks: Vec<Block> = Vec::new();
    let mut state = LexState::default();
    let mut logical: Option<(usize, String)> = None;

    for line in source.split('\n') {
        let code = state.code_of(line);

        let (indent, mut text) = match logical.take() {
            Some((indent, mut text)) => {
                text.push(' ');
                text.push_str(code.trim());
                (indent, text)
            }
            None => {
                if code.trim().is_empty() && state.is_closed() {
                    continue;
                }
                (indent_of(line), code.trim().to_string())
            }
        };

        if !state.is_closed() {
            logical = Some((indent, text));
            continue;
        }
        if let Some(stripped) = text.strip_suffix('\\') {
            text = stripped.trim_end().to_string();
            logical = Some((indent, text));
            continue;
        }
        logical_line(indent, &text, &mut blocks, &mut names);
    }

    if let Some((indent, text)) = logical {
        logical_line(indent, &text, &mut blocks, &mut names);
    }
    names
}

/// An open compound statement and the indentation of its header.
#[derive(Debug, Clone, Copy)]
struct Block {
    indent: usize,
    // Body is a function or class scope, not the global one.
    local: bool,
}

fn logical_line(indent: usize, stmt: &str, blocks: &mut Vec<Block>, names: &mut Vec<String>) {
    while blocks.last().is_some_and(|b| indent <= b.indent) {
        blocks.pop();
    }
    if blocks.iter().any(|b| b.local) {
        return;
    }

    push_all(names, walrus_names(stmt));

    match compound_header(stmt) {
        Some(header) => {
            push_all(names, header.names);
            match header.body {
                Some(body) if !header.local => {
                    for part in split_top_level(body, b';') {
                        push_all(names, statement_names(part.trim()));
                    }
                }
                Some(_) => {}
                None => blocks.push(Block {
                    indent,
                    local: header.local,
                }),
            }
        }
        None => {
            for part in split_top_level(stmt, b';') {
                push_all(names, statement_names(part.trim()));
            }
        }
    }
}

fn push_all(names: &mut Vec<String>, found: Vec<String>) {
    for name in found {
        if name.starts_with(RESERVED_PREFIX) || names.contains(&name) {
            continue;
        }
        names.push(name);
    }
}

struct Header<'a> {
    names: Vec<String>,
    local: bool,
    // Statements following the colon on the header line.
    body: Option<&'a str>,
}

fn compound_header(stmt: &str) -> Option<Header<'_>> {
    let stmt = stmt.strip_prefix("async ").map(str::trim_start).unwrap_or(stmt);
    let head = leading_identifier(stmt)?;
    let colon = header_colon(stmt)?;
    let header = &stmt[..colon];
    let body = Some(stmt[colon + 1..].trim()).filter(|b| !b.is_empty());
    let after_head = header[head.len()..].trim();

    let (names, local) = match head {
        "def" | "class" => {
            let name = leading_identifier(after_head).map(|n| vec![n.to_string()]);
            (name.unwrap_or_default(), true)
        }
        "if" | "elif" | "while" | "else" | "try" | "finally" | "except" => (Vec::new(), false),
        "for" => {
            let targets = after_head
                .split_once(" in ")
                .map(|(t, _)| target_names(t))
                .unwrap_or_default();
            (targets, false)
        }
        "with" => (with_names(after_head), false),
        // Soft keywords: only a header when not an assignment to the name.
        "match" | "case"
            if body.is_none()
                && !after_head.is_empty()
                && !after_head.starts_with('=')
                && split_assignment(stmt).len() == 1 =>
        {
            (Vec::new(), false)
        }
        _ => return None,
    };
    Some(Header { names, local, body })
}

/// Byte offset of the colon ending a compound statement header.
fn header_colon(stmt: &str) -> Option<usize> {
    let bytes = stmt.as_bytes();
    top_level_bytes(stmt)
        .into_iter()
        .find(|&(i, b)| b == b':' && bytes.get(i + 1) != Some(&b'='))
        .map(|(i, _)| i)
}

fn with_names(items: &str) -> Vec<String> {
    let items = items
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(items);
    split_top_level(items, b',')
        .into_iter()
        .filter_map(|item| item.split_once(" as ").map(|(_, target)| target_names(target)))
        .flatten()
        .collect()
}

/// `name :=` bindings anywhere in the statement.
fn walrus_names(stmt: &str) -> Vec<String> {
    stmt.match_indices(":=")
        .filter_map(|(i, _)| {
            let before = stmt[..i].trim_end();
            let start = before
                .char_indices()
                .rev()
                .take_while(|&(_, c)| c.is_alphanumeric() || c == '_')
                .last()
                .map(|(j, _)| j)?;
            let name = &before[start..];
            is_identifier(name).then(|| name.to_string())
        })
        .collect()
}

fn statement_names(stmt: &str) -> Vec<String> {
    if let Some(rest) = stmt.strip_prefix("import ") {
        return import_names(rest);
    }
    if stmt.starts_with("from ") {
        return from_import_names(stmt);
    }
    if is_keyword_statement(stmt) {
        return Vec::new();
    }
    assignment_names(stmt)
}

fn import_names(rest: &str) -> Vec<String> {
    rest.split(',')
        .filter_map(|item| {
            let item = item.trim();
            let bound = match item.split_once(" as ") {
                Some((_, alias)) => alias.trim(),
                None => item.split('.').next().unwrap_or("").trim(),
            };
            is_identifier(bound).then(|| bound.to_string())
        })
        .collect()
}

fn from_import_names(stmt: &str) -> Vec<String> {
    let Some((_, list)) = stmt.split_once(" import ") else {
        return Vec::new();
    };
    let list = list.replace(['(', ')'], " ");
    list.split(',')
        .filter_map(|item| {
            let item = item.trim();
            let bound = match item.split_once(" as ") {
                Some((_, alias)) => alias.trim(),
                None => item,
            };
            is_identifier(bound).then(|| bound.to_string())
        })
        .collect()
}

fn assignment_names(stmt: &str) -> Vec<String> {
    let parts = split_assignment(stmt);
    if parts.len() < 2 {
        return Vec::new();
    }

    let mut found = Vec::new();
    for target in &parts[..parts.len() - 1] {
        let target = strip_annotation(target)
            .trim()
            .trim_end_matches(|c: char| "+-*/%@&|^<>".contains(c));
        found.extend(target_names(target));
    }
    found
}

/// Plain names in an assignment or loop target list.
fn target_names(target: &str) -> Vec<String> {
    target
        .replace(['(', ')', '[', ']'], " ")
        .split(',')
        .filter_map(|item| {
            let item = item.trim().trim_start_matches('*').trim();
            is_identifier(item).then(|| item.to_string())
        })
        .collect()
}

/// Split on `=` signs that are assignments: outside brackets and strings,
/// and not part of `==`, `!=`, `<=`, `>=` or `:=`.
fn split_assignment(stmt: &str) -> Vec<&str> {
    let bytes = stmt.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, b) in top_level_bytes(stmt) {
        if b != b'=' {
            continue;
        }
        let prev = if i > 0 { bytes[i - 1] } else { 0 };
        let next = bytes.get(i + 1).copied().unwrap_or(0);
        if next == b'=' || matches!(prev, b'=' | b'!' | b'<' | b'>' | b':') {
            continue;
        }
        parts.push(&stmt[start..i]);
        start = i + 1;
    }
    parts.push(&stmt[start..]);
    parts
}

fn split_top_level(s: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, b) in top_level_bytes(s) {
        if b == sep {
            parts.push(&s[start..i]);
            start = i + 1;
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Offsets and values of the bytes of `s` that sit outside brackets and
/// string literals, up to any comment.
fn top_level_bytes(s: &str) -> Vec<(usize, u8)> {
    let bytes = s.as_bytes();
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' => quote = Some(b),
            b'#' => break,
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ if depth == 0 => found.push((i, b)),
            _ => {}
        }
        i += 1;
    }
    found
}

fn strip_annotation(target: &str) -> &str {
    match target.split_once(':') {
        Some((name, _)) => name,
        None => target,
    }
}

fn is_keyword_statement(stmt: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "return", "assert", "del", "pass", "raise", "global", "nonlocal", "lambda", "yield",
        "break", "continue", "await",
    ];
    let head = stmt
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or("");
    KEYWORDS.contains(&head) || stmt.starts_with('@')
}

fn leading_identifier(s: &str) -> Option<&str> {
    let end = s
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let ident = &s[..end];
    is_identifier(ident).then_some(ident)
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Whether `s` is a plain Python identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Bracket depth and string state carried across lines.
#[derive(Debug, Default)]
struct LexState {
    depth: usize,
    // Delimiter of an open triple-quoted string.
    quote: Option<&'static str>,
}

impl LexState {
    fn is_closed(&self) -> bool {
        self.depth == 0 && self.quote.is_none()
    }

    /// Advance over `line`, returning its code with comments removed and
    /// triple-quoted string contents collapsed to `""`.
    fn code_of(&mut self, line: &str) -> String {
        let mut code = String::with_capacity(line.len());
        let mut rest = line;

        while !rest.is_empty() {
            if let Some(delim) = self.quote {
                match rest.find(delim) {
                    Some(pos) => {
                        rest = &rest[pos + delim.len()..];
                        self.quote = None;
                    }
                    None => return code,
                }
                continue;
            }

            if rest.starts_with("\"\"\"") || rest.starts_with("'''") {
                self.quote = Some(if rest.starts_with('"') { "\"\"\"" } else { "'''" });
                code.push_str("\"\"");
                rest = &rest[3..];
                continue;
            }

            let Some(c) = rest.chars().next() else { break };
            match c {
                '#' => return code,
                '\'' | '"' => {
                    let end = single_quoted_end(rest, c);
                    code.push_str(&rest[..end]);
                    rest = &rest[end..];
                    continue;
                }
                '(' | '[' | '{' => self.depth += 1,
                ')' | ']' | '}' => self.depth = self.depth.saturating_sub(1),
                _ => {}
            }
            code.push(c);
            rest = &rest[c.len_utf8()..];
        }
        code
    }
}

/// Byte offset just past a single-quoted string starting at `s[0]`.
fn single_quoted_end(s: &str, quote: char) -> usize {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return i + c.len_utf8();
        }
    }
    s.len()
}
