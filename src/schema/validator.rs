//! Validation of generated Cypher against the schema catalog
//!
//! Model output is untrusted. Before a generated query is executed it must
//! be read-only and may only mention labels and relationship types that the
//! catalog defines, in the direction the catalog defines them.
//!
//! This is a lexical check, not a Cypher parser: string literals and
//! comments are neutralised first so that their contents cannot hide or fake
//! clauses, and map keys are blanked so that `key:` is not taken for a label.

use super::catalog::SchemaCatalog;
use crate::neo4j::models::{NodeLabel, RelationshipType};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use thiserror::Error;

/// Clauses that write, administer, or call procedures
const FORBIDDEN_KEYWORDS: &[&str] = &[
    "CREATE", "MERGE", "DELETE", "DETACH", "SET", "REMOVE", "DROP", "FOREACH", "LOAD", "CALL",
    "ALTER", "GRANT", "REVOKE", "DENY", "RENAME", "TERMINATE",
];

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("valid word regex"));

/// `[r:TYPE|OTHER*1..3 {..}]`, capturing the type expression
static REL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\s*(?:[A-Za-z_][A-Za-z0-9_]*)?\s*:\s*([^\]\*\{]*)").expect("valid rel regex")
});

/// `:Label`, `:A|B`, `:A&!B`
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":\s*!?\s*([A-Za-z_][A-Za-z0-9_]*(?:[|&]!?[A-Za-z_][A-Za-z0-9_]*)*)")
        .expect("valid label regex")
});

/// One hop `(a:L1 {..})<-[:T]-(b:L2` anchored at a node pattern
static HOP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\(\s*(?:[A-Za-z_][A-Za-z0-9_]*)?\s*(?::\s*([A-Za-z_][A-Za-z0-9_]*))?[^()\[\]]*\)",
        r"\s*(<)?-\s*\[\s*(?:[A-Za-z_][A-Za-z0-9_]*)?\s*:\s*([A-Za-z_][A-Za-z0-9_]*)\s*",
        r"(?:\*[^\]\{]*)?(?:\{[^}]*\})?\s*\]\s*-(>)?",
        r"\s*\(\s*(?:[A-Za-z_][A-Za-z0-9_]*)?\s*(?::\s*([A-Za-z_][A-Za-z0-9_]*))?",
    ))
    .expect("valid hop regex")
});

/// Why a generated query was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("generated query is empty")]
    EmptyQuery,
    #[error("generated query contains a forbidden {0} clause; only read queries are allowed")]
    WriteClause(String),
    #[error("generated query references unknown label '{0}'")]
    UnknownLabel(String),
    #[error("generated query references unknown relationship type '{0}'")]
    UnknownRelationship(String),
    #[error("relationship {rel_type} does not connect {from} to {to}")]
    InvalidEndpoints {
        rel_type: String,
        from: String,
        to: String,
    },
}

/// Catalog terms a query was found to use
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryReferences {
    pub labels: BTreeSet<NodeLabel>,
    pub relationships: BTreeSet<RelationshipType>,
}

/// Checks generated Cypher against a schema catalog
#[derive(Debug, Clone, Default)]
pub struct CypherValidator {
    catalog: SchemaCatalog,
}

impl CypherValidator {
    pub fn new(catalog: SchemaCatalog) -> Self {
        Self { catalog }
    }

    pub fn validate(&self, cypher: &str) -> Result<QueryReferences, SchemaViolation> {
        if cypher.trim().is_empty() {
            return Err(SchemaViolation::EmptyQuery);
        }

        let text = blank_map_keys(&neutralize(cypher));
        check_keywords(&text)?;

        let mut refs = QueryReferences::default();

        // Relationship types first; their brackets are then blanked so the
        // label scan only sees node patterns and label predicates.
        let mut labels_text = text.clone();
        for caps in REL_RE.captures_iter(&text) {
            for name in split_names(&caps[1]) {
                let rel = self
                    .catalog
                    .relationship(name)
                    .ok_or_else(|| SchemaViolation::UnknownRelationship(name.to_string()))?;
                refs.relationships.insert(rel);
            }
            if let Some(whole) = caps.get(0) {
                labels_text.replace_range(whole.range(), &" ".repeat(whole.len()));
            }
        }

        for caps in LABEL_RE.captures_iter(&labels_text) {
            for name in split_names(&caps[1]) {
                let label = self
                    .catalog
                    .label(name)
                    .ok_or_else(|| SchemaViolation::UnknownLabel(name.to_string()))?;
                refs.labels.insert(label);
            }
        }

        self.check_endpoints(&text)?;

        Ok(refs)
    }

    /// Reject directed hops whose labelled endpoints contradict the catalog
    fn check_endpoints(&self, text: &str) -> Result<(), SchemaViolation> {
        for (start, _) in text.match_indices('(') {
            let Some(caps) = HOP_RE.captures(&text[start..]) else {
                continue;
            };
            let (Some(left), Some(right)) = (caps.get(1), caps.get(5)) else {
                continue;
            };
            let (from, to) = match (caps.get(2).is_some(), caps.get(4).is_some()) {
                (false, true) => (left.as_str(), right.as_str()),
                (true, false) => (right.as_str(), left.as_str()),
                _ => continue,
            };
            let (Some(rel), Some(from_label), Some(to_label)) = (
                self.catalog.relationship(&caps[3]),
                self.catalog.label(from),
                self.catalog.label(to),
            ) else {
                continue;
            };
            if rel.from_label() != from_label || rel.to_label() != to_label {
                return Err(SchemaViolation::InvalidEndpoints {
                    rel_type: rel.as_str().to_string(),
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn split_names(expr: &str) -> impl Iterator<Item = &str> {
    expr.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|s| !s.is_empty())
}

fn check_keywords(text: &str) -> Result<(), SchemaViolation> {
    for m in WORD_RE.find_iter(text) {
        let prev = text[..m.start()].chars().next_back();
        if matches!(prev, Some('.') | Some('$') | Some(':')) {
            continue;
        }
        let word = m.as_str().to_ascii_uppercase();
        if FORBIDDEN_KEYWORDS.contains(&word.as_str()) {
            return Err(SchemaViolation::WriteClause(word));
        }
    }
    Ok(())
}

/// Empty string literals, drop comments, unquote backtick identifiers
fn neutralize(cypher: &str) -> String {
    let mut out = String::with_capacity(cypher.len());
    let mut chars = cypher.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let mut escaped = false;
                for next in chars.by_ref() {
                    if escaped {
                        escaped = false;
                    } else if next == '\\' {
                        escaped = true;
                    } else if next == c {
                        break;
                    }
                }
                out.push(c);
                out.push(c);
            }
            '`' => {
                for next in chars.by_ref() {
                    if next == '`' {
                        break;
                    }
                    out.push(next);
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
                out.push('\n');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out
}

/// Blank the keys of map literals and map projections so that `key:` is not
/// read as a label. Values and subquery blocks stay in place and are scanned
/// like the rest of the query.
fn blank_map_keys(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = chars.clone();
    // One entry per open bracket, `true` for braces that open a map
    let mut open: Vec<bool> = Vec::new();

    for (i, c) in chars.iter().enumerate() {
        match *c {
            '{' => {
                let is_map = opens_map(&chars[i + 1..]);
                if is_map {
                    blank_key(&chars, &mut out, i + 1);
                }
                open.push(is_map);
            }
            '(' | '[' => open.push(false),
            '}' | ')' | ']' => {
                open.pop();
            }
            ',' if open.last() == Some(&true) => blank_key(&chars, &mut out, i + 1),
            _ => {}
        }
    }

    out.into_iter().collect()
}

/// Blank an `ident :` map key starting at `start`, if there is one
fn blank_key(chars: &[char], out: &mut [char], start: usize) {
    let mut i = start;
    while chars.get(i).is_some_and(|c| c.is_whitespace()) {
        i += 1;
    }
    let key_start = i;
    while chars.get(i).is_some_and(|c| c.is_alphanumeric() || *c == '_') {
        i += 1;
    }
    if i == key_start {
        return;
    }
    while chars.get(i).is_some_and(|c| c.is_whitespace()) {
        i += 1;
    }
    if chars.get(i) == Some(&':') {
        for c in &mut out[key_start..=i] {
            *c = ' ';
        }
    }
}

/// Whether the text right after a `{` starts a map rather than a subquery
fn opens_map(rest: &[char]) -> bool {
    let mut iter = rest.iter().copied().skip_while(|c| c.is_whitespace());
    match iter.next() {
        None | Some('}') | Some('.') | Some('*') => true,
        Some(c) if c.is_alphabetic() || c == '_' => {
            let mut after = iter.skip_while(|c| c.is_alphanumeric() || *c == '_');
            loop {
                match after.next() {
                    Some(c) if c.is_whitespace() => continue,
                    Some(':') => return true,
                    _ => return false,
                }
            }
        }
        _ => false,
    }
}
