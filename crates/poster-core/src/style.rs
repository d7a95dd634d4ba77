//! CSS declaration and stylesheet handling.
//!
//! Built on `winnow` 0.7 for lenient, streaming parsing. Two layers:
//! [`StyleMap`] holds an ordered `name: value` declaration list (the
//! `style="…"` attribute and rule bodies share it), and [`StyleSheet`]
//! holds `<style>` rules with simple selectors (tag, `.class`, `#id`,
//! comma lists). Malformed input is skipped, never an error.

use crate::model::Fragment;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

// ─── Declarations ───────────────────────────────────────────────────────

/// A single `name: value` CSS declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

/// An ordered list of declarations. Order is preserved so that emitted
/// attributes round-trip byte-for-byte; `set` replaces in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleMap {
    decls: SmallVec<[Declaration; 4]>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the contents of a `style` attribute or rule body.
    /// Declarations that fail to parse are dropped.
    #[must_use]
    pub fn parse(css: &str) -> Self {
        let mut map = StyleMap::new();
        let mut rest = css;
        loop {
            skip_ws_and_comments(&mut rest);
            if rest.is_empty() {
                break;
            }
            if let Some(tail) = rest.strip_prefix(';') {
                rest = tail;
                continue;
            }
            match parse_declaration.parse_next(&mut rest) {
                Ok(decl) if !decl.value.is_empty() => map.set(&decl.name, &decl.value),
                _ => {
                    // Malformed or empty declaration: resync at the next separator
                    match rest.find(';') {
                        Some(pos) => rest = &rest[pos + 1..],
                        None => break,
                    }
                }
            }
        }
        map
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    /// Set a property, replacing an existing declaration in place so the
    /// original ordering survives edits.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        if let Some(decl) = self.decls.iter_mut().find(|d| d.name == name) {
            decl.value = value.to_string();
        } else {
            self.decls.push(Declaration {
                name,
                value: value.to_string(),
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.decls.iter()
    }

    /// Serialize back to `name: value; name: value` form.
    #[must_use]
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for (i, decl) in self.decls.iter().enumerate() {
            if i > 0 {
                out.push_str("; ");
            }
            out.push_str(&decl.name);
            out.push_str(": ");
            out.push_str(&decl.value);
        }
        out
    }
}

// ─── Pixel values ───────────────────────────────────────────────────────

/// Append `px` to bare numeric values; anything already carrying a unit
/// (or not numeric at all) passes through untouched.
#[must_use]
pub fn ensure_px(value: &str) -> String {
    let v = value.trim();
    if !v.is_empty() && v.parse::<f32>().is_ok() {
        format!("{v}px")
    } else {
        v.to_string()
    }
}

/// Extract the number from a `px` length or bare numeric string.
pub fn parse_px(value: &str) -> Option<f32> {
    let v = value.trim();
    let v = v.strip_suffix("px").unwrap_or(v).trim_end();
    v.parse::<f32>().ok()
}

/// Format a pixel length without trailing zeros.
#[must_use]
pub fn format_px(n: f32) -> String {
    if n == n.floor() {
        format!("{}px", n as i32)
    } else {
        let num = format!("{n:.2}");
        let num = num.trim_end_matches('0').trim_end_matches('.');
        format!("{num}px")
    }
}

// ─── Selectors and rules ────────────────────────────────────────────────

/// A simple selector. Compound and descendant selectors are out of scope;
/// unrecognized selectors drop their whole rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    Tag(String),
    Class(String),
    Id(String),
}

impl Selector {
    fn parse(text: &str) -> Option<Selector> {
        let text = text.trim();
        if let Some(class) = text.strip_prefix('.') {
            is_simple_name(class).then(|| Selector::Class(class.to_string()))
        } else if let Some(id) = text.strip_prefix('#') {
            is_simple_name(id).then(|| Selector::Id(id.to_string()))
        } else if text == "*" {
            // Universal selector matches everything at the lowest tier
            Some(Selector::Tag("*".to_string()))
        } else {
            is_simple_name(text).then(|| Selector::Tag(text.to_ascii_lowercase()))
        }
    }

    /// Tiered specificity: id > class > tag.
    pub fn specificity(&self) -> u32 {
        match self {
            Selector::Tag(_) => 1,
            Selector::Class(_) => 2,
            Selector::Id(_) => 3,
        }
    }

    /// Match against an element's tag, literal `id` attribute, and classes.
    pub fn matches(&self, tag: &str, id: Option<&str>, classes: &[&str]) -> bool {
        match self {
            Selector::Tag(t) => t == "*" || t == tag,
            Selector::Class(c) => classes.contains(&c.as_str()),
            Selector::Id(i) => id == Some(i.as_str()),
        }
    }
}

fn is_simple_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub style: StyleMap,
}

/// Parsed `<style>` rules in document order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleSheet {
    rules: Vec<Rule>,
}

impl StyleSheet {
    /// Parse stylesheet text. At-rules and rules with no recognizable
    /// selector are skipped wholesale.
    #[must_use]
    pub fn parse(css: &str) -> Self {
        let mut rules = Vec::new();
        let mut rest = css;
        loop {
            skip_ws_and_comments(&mut rest);
            if rest.is_empty() {
                break;
            }
            if rest.starts_with('@') {
                skip_at_rule(&mut rest);
                continue;
            }
            let Some(open) = rest.find('{') else {
                break;
            };
            let selector_text = &rest[..open];
            rest = &rest[open + 1..];
            let body_end = rest.find('}').unwrap_or(rest.len());
            let body = &rest[..body_end];
            rest = &rest[(body_end + 1).min(rest.len())..];

            let selectors: Vec<Selector> = selector_text
                .split(',')
                .filter_map(Selector::parse)
                .collect();
            if selectors.is_empty() {
                continue;
            }
            rules.push(Rule {
                selectors,
                style: StyleMap::parse(body),
            });
        }
        StyleSheet { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve a property for an element described by tag, `id` attribute
    /// and class list. Higher specificity wins; within a tier, the later
    /// rule wins.
    pub fn cascade_value(
        &self,
        tag: &str,
        id: Option<&str>,
        classes: &[&str],
        property: &str,
    ) -> Option<String> {
        let mut best: Option<(u32, &str)> = None;
        for rule in &self.rules {
            let Some(value) = rule.style.get(property) else {
                continue;
            };
            for selector in &rule.selectors {
                if !selector.matches(tag, id, classes) {
                    continue;
                }
                let spec = selector.specificity();
                if best.is_none_or(|(s, _)| spec >= s) {
                    best = Some((spec, value));
                }
            }
        }
        best.map(|(_, v)| v.to_string())
    }
}

// ─── Computed values ────────────────────────────────────────────────────

fn inherits(property: &str) -> bool {
    matches!(property, "font-size" | "color" | "font-weight")
}

fn ua_default(tag: &str, property: &str) -> Option<&'static str> {
    match (tag, property) {
        ("h1", "font-size") => Some("32px"),
        ("h2", "font-size") => Some("24px"),
        ("h3", "font-size") => Some("18.72px"),
        ("h4", "font-size") => Some("16px"),
        ("h5", "font-size") => Some("13.28px"),
        ("h6", "font-size") => Some("10.72px"),
        ("h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "strong" | "b", "font-weight") => Some("700"),
        _ => None,
    }
}

fn initial_value(property: &str) -> &'static str {
    match property {
        "font-size" => "16px",
        "color" => "#000000",
        "font-weight" => "400",
        _ => "",
    }
}

fn own_value(
    sheet: &StyleSheet,
    fragment: &Fragment,
    ix: NodeIndex,
    property: &str,
) -> Option<String> {
    let el = fragment.element(ix)?;
    if let Some(v) = el.style.get(property) {
        return Some(v.to_string());
    }
    let classes = el.class_list();
    sheet.cascade_value(&el.tag, el.attr("id"), &classes, property)
}

/// Resolve the effective value of a property for `node`: inline style,
/// then the most specific sheet rule, then (for inheritable properties)
/// the nearest ancestor that specifies it, then user-agent defaults for
/// the element's tag, then the global initial value.
#[must_use]
pub fn computed_value(
    fragment: &Fragment,
    sheet: &StyleSheet,
    node: NodeIndex,
    property: &str,
) -> String {
    if let Some(v) = own_value(sheet, fragment, node, property) {
        return v;
    }
    if inherits(property) {
        let mut current = fragment.parent(node);
        while let Some(ix) = current {
            if let Some(v) = own_value(sheet, fragment, ix, property) {
                return v;
            }
            current = fragment.parent(ix);
        }
    }
    if let Some(el) = fragment.element(node) {
        if let Some(v) = ua_default(&el.tag, property) {
            return v.to_string();
        }
    }
    initial_value(property).to_string()
}

// ─── Low-level parsers ──────────────────────────────────────────────────

fn skip_ws_and_comments(input: &mut &str) {
    loop {
        let before = *input;
        *input = input.trim_start();
        if let Some(rest) = input.strip_prefix("/*") {
            match rest.find("*/") {
                Some(pos) => *input = &rest[pos + 2..],
                None => *input = "",
            }
            continue;
        }
        if *input == before {
            break;
        }
    }
}

/// Consume optional whitespace (concrete error type avoids inference issues).
fn skip_space(input: &mut &str) {
    use winnow::ascii::space0;
    let _: Result<&str, winnow::error::ErrMode<ContextError>> = space0.parse_next(input);
}

fn parse_property_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || c == '-' || c == '_'
    })
    .parse_next(input)
}

fn parse_declaration(input: &mut &str) -> ModalResult<Declaration> {
    let name = parse_property_name.parse_next(input)?;
    skip_space(input);
    let _ = ':'.parse_next(input)?;
    let value: &str = take_till(0.., |c: char| c == ';' || c == '}').parse_next(input)?;
    Ok(Declaration {
        name: name.to_ascii_lowercase(),
        value: value.trim().to_string(),
    })
}

/// Skip an at-rule: either up to the statement `;` or over a balanced block.
fn skip_at_rule(input: &mut &str) {
    let mut depth = 0usize;
    let bytes = input.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    *input = &input[i + 1..];
                    return;
                }
            }
            b';' if depth == 0 => {
                *input = &input[i + 1..];
                return;
            }
            _ => {}
        }
    }
    *input = "";
}
