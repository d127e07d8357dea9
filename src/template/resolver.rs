//! Template resolution - expands placeholder tokens into text
//!
//! There is one substitution routine, [`substitute`], used in two modes:
//!
//! - pre-resolution ([`pre_resolve`]) expands `{:name}` references to other
//!   templates, repeating until nothing changes;
//! - context resolution ([`resolve`]) expands `{Key}` placeholders from a
//!   [`Context`] in a single pass.

use std::collections::HashSet;
use std::time::Instant;

use tracing::debug;

use crate::context::Context;

use super::store::{TemplateError, TemplateStore};

/// Marker that distinguishes a template reference `{:name}` from a context key
pub const TEMPLATE_PREFIX: &str = ":";

/// Context key holding the rendered page inside the container template (`{:*}`)
pub const CONTENT_KEY: &str = ":*";

/// A brace-delimited candidate token in template text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder<'a> {
    /// Byte offset of the opening brace
    start: usize,
    /// Byte offset just past the closing brace
    end: usize,
    /// Text between the braces
    inner: &'a str,
}

/// Iterator over candidate tokens: every `{` paired with the next `}`.
///
/// Candidates may overlap (`{{Name}` yields `{{Name}` and `{Name}`).
struct Placeholders<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Placeholders<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos + self.text[self.pos..].find('{')?;
        let inner_start = start + 1;
        // No closing brace after this one means none after any later `{` either
        let close = inner_start + self.text[inner_start..].find('}')?;
        self.pos = inner_start;

        Some(Placeholder {
            start,
            end: close + 1,
            inner: &self.text[inner_start..close],
        })
    }
}

/// Replace tokens `{<prefix><key>}` for which `lookup` returns a value.
///
/// Scans left to right. Inserted values are never rescanned, and tokens with
/// no value are left verbatim. Returns `None` when nothing was replaced.
fn substitute<'v>(
    text: &str,
    prefix: &str,
    mut lookup: impl FnMut(&str) -> Option<&'v str>,
) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut replaced = false;

    for token in Placeholders::new(text) {
        if token.start < copied {
            continue;
        }
        let Some(key) = token.inner.strip_prefix(prefix) else {
            continue;
        };
        if let Some(value) = lookup(key) {
            out.push_str(&text[copied..token.start]);
            out.push_str(value);
            copied = token.end;
            replaced = true;
        }
    }

    if !replaced {
        return None;
    }
    out.push_str(&text[copied..]);
    Some(out)
}

/// Names referenced as `{:name}` in `text`, in order of appearance
fn references(text: &str) -> impl Iterator<Item = &str> {
    Placeholders::new(text).filter_map(|token| token.inner.strip_prefix(TEMPLATE_PREFIX))
}

/// Expand template references inside the template `name` until a fixpoint.
///
/// A reference is substituted with the current text of the referenced
/// template when it exists in the store and is not `name` itself. Unknown
/// references stay as literal text.
///
/// Fails with [`TemplateError::Cycle`] when expansion would never terminate,
/// e.g. `a = "{:b}"` and `b = "{:a}"`.
pub fn pre_resolve(store: &TemplateStore, name: &str) -> Result<String, TemplateError> {
    if let Some(chain) = find_cycle(store, name) {
        return Err(TemplateError::Cycle {
            name: name.to_string(),
            chain,
        });
    }

    let mut text = store.get(name).to_string();
    // An acyclic graph of N templates is at most N - 1 references deep
    let max_passes = store.len() + 1;

    for _ in 0..max_passes {
        let expanded = substitute(&text, TEMPLATE_PREFIX, |reference| {
            if reference == name {
                None
            } else {
                store.lookup(reference)
            }
        });
        match expanded {
            Some(next) if next != text => text = next,
            _ => return Ok(text),
        }
    }

    Err(TemplateError::Cycle {
        name: name.to_string(),
        chain: references(&text)
            .filter(|r| *r != name && store.contains(r))
            .map(str::to_string)
            .collect(),
    })
}

/// Depth-first walk of the reference graph reachable from `root`.
///
/// Only the root's own self-references are skipped during expansion, so any
/// other template reached twice on one path is a cycle.
fn find_cycle(store: &TemplateStore, root: &str) -> Option<Vec<String>> {
    fn visit(
        store: &TemplateStore,
        root: &str,
        current: &str,
        path: &mut Vec<String>,
        finished: &mut HashSet<String>,
    ) -> Option<Vec<String>> {
        for reference in references(store.get(current)) {
            if (current == root && reference == root) || !store.contains(reference) {
                continue;
            }
            if let Some(pos) = path.iter().position(|p| p == reference) {
                let mut chain = path[pos..].to_vec();
                chain.push(reference.to_string());
                return Some(chain);
            }
            if finished.contains(reference) {
                continue;
            }

            path.push(reference.to_string());
            if let Some(chain) = visit(store, root, reference, path, finished) {
                return Some(chain);
            }
            path.pop();
            finished.insert(reference.to_string());
        }
        None
    }

    let mut path = vec![root.to_string()];
    let mut finished = HashSet::new();
    visit(store, root, root, &mut path, &mut finished)
}

/// Fill the template `name` with values from `context`.
///
/// Exactly one pass: every `{key}` whose key is in the context is replaced,
/// and replaced values are not scanned again. Tokens without a matching key
/// stay in the output.
pub fn resolve(
    store: &TemplateStore,
    name: &str,
    context: &Context,
) -> Result<String, TemplateError> {
    let text = store.lookup(name).ok_or_else(|| TemplateError::NotFound {
        name: name.to_string(),
    })?;

    let started = Instant::now();
    let output = substitute(text, "", |key| context.get(key)).unwrap_or_else(|| text.to_string());
    debug!(
        template = name,
        elapsed_ns = started.elapsed().as_nanos() as u64,
        "Rendered template"
    );

    Ok(output)
}

/// Render `page` against `context`, then wrap it in `container`.
///
/// The page output is placed under [`CONTENT_KEY`] in a copy of the context,
/// which is then used to resolve the container.
pub fn render_page(
    store: &TemplateStore,
    page: &str,
    container: &str,
    context: &Context,
) -> Result<String, TemplateError> {
    let content = resolve(store, page, context)?;
    let context = context.clone().with(CONTENT_KEY, content);
    resolve(store, container, &context)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(templates: &[(&str, &str)]) -> TemplateStore {
        let mut store = TemplateStore::new();
        for (name, text) in templates {
            store.load(*name, *text);
        }
        store
    }

    #[test]
    fn test_placeholders_overlapping_braces() {
        let inners: Vec<&str> = Placeholders::new("{{Name} {:a}")
            .map(|p| p.inner)
            .collect();
        assert_eq!(inners, vec!["{Name", "Name", ":a"]);
    }

    #[test]
    fn test_placeholders_unclosed() {
        assert_eq!(Placeholders::new("a { b").count(), 0);
        assert_eq!(Placeholders::new("} {").count(), 0);
    }

    #[test]
    fn test_substitute_nested_braces() {
        let out = substitute("{{Name}}", "", |k| (k == "Name").then_some("Bob"));
        assert_eq!(out.as_deref(), Some("{Bob}"));
    }

    #[test]
    fn test_substitute_no_match() {
        assert_eq!(substitute("Hello {Name}", "", |_| None), None);
    }

    #[test]
    fn test_substitute_prefix_filters_tokens() {
        let out = substitute("{:a} {a}", TEMPLATE_PREFIX, |k| (k == "a").then_some("X"));
        assert_eq!(out.as_deref(), Some("X {a}"));
    }

    #[test]
    fn test_pre_resolve_nested_references() {
        let store = store(&[
            ("page", "[{:header}]"),
            ("header", "<h>{:title}</h>"),
            ("title", "T"),
        ]);
        assert_eq!(pre_resolve(&store, "page").unwrap(), "[<h>T</h>]");
    }

    #[test]
    fn test_pre_resolve_self_reference_left_verbatim() {
        let store = store(&[("a", "x{:a}y")]);
        assert_eq!(pre_resolve(&store, "a").unwrap(), "x{:a}y");
    }

    #[test]
    fn test_pre_resolve_unknown_reference_left_verbatim() {
        let store = store(&[("a", "x{:missing}y")]);
        assert_eq!(pre_resolve(&store, "a").unwrap(), "x{:missing}y");
    }

    #[test]
    fn test_pre_resolve_ignores_context_keys() {
        let store = store(&[("a", "{Wiki.Title}{:b}"), ("b", "{Article.Title}")]);
        assert_eq!(
            pre_resolve(&store, "a").unwrap(),
            "{Wiki.Title}{Article.Title}"
        );
    }

    #[test]
    fn test_pre_resolve_two_cycle() {
        let store = store(&[("a", "{:b}"), ("b", "{:a}")]);
        match pre_resolve(&store, "a") {
            Err(TemplateError::Cycle { name, chain }) => {
                assert_eq!(name, "a");
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("Expected Cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_pre_resolve_through_self_referencing_template() {
        // `b` may keep its own token, but expanding it inside `a` never ends
        let store = store(&[("a", "{:b}"), ("b", "x{:b}")]);
        assert!(pre_resolve(&store, "b").is_ok());
        assert!(matches!(
            pre_resolve(&store, "a"),
            Err(TemplateError::Cycle { .. })
        ));
    }

    #[test]
    fn test_pre_resolve_diamond_is_not_a_cycle() {
        let store = store(&[
            ("top", "{:left}{:right}"),
            ("left", "L{:base}"),
            ("right", "R{:base}"),
            ("base", "B"),
        ]);
        assert_eq!(pre_resolve(&store, "top").unwrap(), "LBRB");
    }

    #[test]
    fn test_resolve_unknown_template() {
        let store = TemplateStore::new();
        let result = resolve(&store, "missing", &Context::new());
        assert!(matches!(result, Err(TemplateError::NotFound { .. })));
    }

    #[test]
    fn test_resolve_does_not_rescan_values() {
        let store = store(&[("page", "{A}|{B}")]);
        let context = Context::new().with("A", "{B}").with("B", "b");
        assert_eq!(resolve(&store, "page", &context).unwrap(), "{B}|b");
    }

    #[test]
    fn test_render_page_does_not_mutate_context() {
        let store = store(&[("main", "<{:*}>"), ("view", "{Name}")]);
        let context = Context::new().with("Name", "Bob");
        let html = render_page(&store, "view", "main", &context).unwrap();
        assert_eq!(html, "<Bob>");
        assert!(context.get(CONTENT_KEY).is_none());
    }

    #[test]
    fn test_render_page_missing_container() {
        let store = store(&[("view", "{Name}")]);
        let result = render_page(&store, "view", "main", &Context::new());
        match result {
            Err(TemplateError::NotFound { name }) => assert_eq!(name, "main"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_pre_resolve_stops_on_oscillating_expansion() {
        // No reference cycle, but substitution keeps assembling new tokens:
        // "{:{:p}}" -> "{:s}" -> "{:{:p}}" -> ...
        let templates = [("r", "{:{:p}}"), ("p", "s"), ("s", "{:{:p}}")];
        let fixture = store(&templates);
        assert_eq!(find_cycle(&fixture, "r"), None);

        match pre_resolve(&fixture, "r") {
            Err(TemplateError::Cycle { name, chain }) => {
                assert_eq!(name, "r");
                assert_eq!(chain, vec!["p"]);
            }
            other => panic!("Expected Cycle, got {:?}", other),
        }

        let mut all = store(&templates);
        match all.pre_resolve_all() {
            Err(TemplateError::Cycle { name, .. }) => assert_eq!(name, "r"),
            other => panic!("Expected Cycle, got {:?}", other),
        }
    }
}
