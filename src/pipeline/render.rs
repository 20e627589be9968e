//! MDX rendering: document tree → text.
//!
//! Rendering is a pure function of the tree and the config. Numeric list
//! markers are rewritten to their position among the numbered siblings of
//! the same group so that noisy source numbering (`5.` then `9.`) still
//! yields a consistent `1.` `2.`; every other marker is printed verbatim.

use super::postprocess::clean_mdx;
use super::structure::{NodeId, StructureNode, StructureTree};
use crate::config::ConversionConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

static RE_NUMERIC_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]?$").unwrap());

/// Render a tree to cleaned-up MDX.
pub fn render_mdx(tree: &StructureTree, config: &ConversionConfig) -> String {
    let mut out = String::new();
    render_nodes(tree, tree.roots(), 0, config, &mut out);
    clean_mdx(&out)
}

/// Render one sibling group at `depth`.
///
/// At the root a sibling group is a contiguous run of list items; a blank
/// line closes each run so the next block starts cleanly.
fn render_nodes(
    tree: &StructureTree,
    ids: &[NodeId],
    depth: usize,
    config: &ConversionConfig,
    out: &mut String,
) {
    let indent = "  ".repeat(depth);
    let mut ordinal = 0usize;
    let mut in_list = false;

    for &id in ids {
        let node = tree.node(id);
        let is_item = matches!(node, StructureNode::ListItem { .. });
        if in_list && !is_item {
            if depth == 0 {
                out.push('\n');
            }
            ordinal = 0;
        }
        in_list = is_item;

        match node {
            StructureNode::Heading { level, text } => {
                let _ = write!(
                    out,
                    "{}{} {}\n\n",
                    indent,
                    "#".repeat(usize::from(*level)),
                    escape(text, config)
                );
            }
            StructureNode::Paragraph { text } => {
                for line in escape(text, config).lines() {
                    let _ = writeln!(out, "{indent}{line}");
                }
                out.push('\n');
            }
            StructureNode::Link { url, text } => {
                let _ = write!(out, "{}[{}]({})\n\n", indent, escape(text, config), url);
            }
            StructureNode::ListItem { marker, text, .. } => {
                let marker = if RE_NUMERIC_MARKER.is_match(marker) {
                    ordinal += 1;
                    format!("{ordinal}.")
                } else {
                    marker.clone()
                };
                let _ = writeln!(out, "{}{} {}", indent, marker, escape(text, config));
                render_nodes(tree, tree.children(id), depth + 1, config, out);
            }
        }
    }

    if in_list && depth == 0 {
        out.push('\n');
    }
}

fn escape(text: &str, config: &ConversionConfig) -> String {
    if !config.escape_mdx {
        return text.to_string();
    }
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '<') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classify::MarkerKind;
    use crate::pipeline::structure::build_structure;
    use crate::pipeline::structure::tests::{bullet, numbered};

    fn item(marker: &str, text: &str) -> StructureNode {
        StructureNode::ListItem {
            marker: marker.into(),
            marker_kind: MarkerKind::Bullet,
            text: text.into(),
            children: Vec::new(),
        }
    }

    #[test]
    fn heading_paragraph_and_link() {
        let mut tree = StructureTree::new();
        tree.push_root(StructureNode::Heading {
            level: 2,
            text: "Intro".into(),
        });
        tree.push_root(StructureNode::Paragraph {
            text: "Hello world".into(),
        });
        tree.push_root(StructureNode::Link {
            url: "https://a.test".into(),
            text: "site".into(),
        });
        assert_eq!(
            render_mdx(&tree, &ConversionConfig::default()),
            "## Intro\n\nHello world\n\n[site](https://a.test)\n"
        );
    }

    #[test]
    fn bullets_render_without_blank_lines_then_one_after() {
        let mut tree = StructureTree::new();
        tree.push_root(item("•", "Item 1"));
        tree.push_root(item("*", "Item 2"));
        tree.push_root(item("-", "Item 3"));
        tree.push_root(StructureNode::Paragraph { text: "After".into() });
        assert_eq!(
            render_mdx(&tree, &ConversionConfig::default()),
            "• Item 1\n* Item 2\n- Item 3\n\nAfter\n"
        );
    }

    #[test]
    fn numeric_markers_are_renumbered() {
        let tree = build_structure(
            vec![
                numbered("5.", "five", 50.0, 100.0),
                numbered("9.", "nine", 50.0, 120.0),
            ],
            &ConversionConfig::default(),
        );
        assert_eq!(
            render_mdx(&tree, &ConversionConfig::default()),
            "1. five\n2. nine\n"
        );
    }

    #[test]
    fn letters_keep_their_marker_and_do_not_count() {
        let tree = build_structure(
            vec![
                numbered("1.", "First item", 50.0, 100.0),
                numbered("a.", "Sub item A", 60.0, 120.0),
                numbered("2.", "Second item", 50.0, 140.0),
            ],
            &ConversionConfig::default(),
        );
        assert_eq!(
            render_mdx(&tree, &ConversionConfig::default()),
            "1. First item\na. Sub item A\n2. Second item\n"
        );
    }

    #[test]
    fn nested_items_indent_two_spaces_per_level() {
        let tree = build_structure(
            vec![
                numbered("3)", "outer", 50.0, 100.0),
                bullet("-", "inner", 70.0, 120.0),
                numbered("7.", "deep", 90.0, 140.0),
                numbered("8.", "outer two", 50.0, 160.0),
            ],
            &ConversionConfig::default(),
        );
        assert_eq!(
            render_mdx(&tree, &ConversionConfig::default()),
            "1. outer\n  - inner\n    1. deep\n2. outer two\n"
        );
    }

    #[test]
    fn numbering_restarts_after_an_interrupting_block() {
        let mut tree = StructureTree::new();
        tree.push_root(StructureNode::ListItem {
            marker: "4.".into(),
            marker_kind: MarkerKind::Ordered,
            text: "a".into(),
            children: Vec::new(),
        });
        tree.push_root(StructureNode::Paragraph { text: "break".into() });
        tree.push_root(StructureNode::ListItem {
            marker: "5.".into(),
            marker_kind: MarkerKind::Ordered,
            text: "b".into(),
            children: Vec::new(),
        });
        assert_eq!(
            render_mdx(&tree, &ConversionConfig::default()),
            "1. a\n\nbreak\n\n1. b\n"
        );
    }

    #[test]
    fn escapes_mdx_specials_but_not_emphasis() {
        let mut tree = StructureTree::new();
        tree.push_root(StructureNode::Paragraph {
            text: "**x** < {y}".into(),
        });
        assert_eq!(
            render_mdx(&tree, &ConversionConfig::default()),
            "**x** \\< \\{y\\}\n"
        );

        let raw = ConversionConfig::builder().escape_mdx(false).build().unwrap();
        assert_eq!(render_mdx(&tree, &raw), "**x** < {y}\n");
    }

    #[test]
    fn rendering_twice_is_identical() {
        let tree = build_structure(
            vec![
                bullet("•", "a", 50.0, 100.0),
                bullet("•", "b", 70.0, 120.0),
            ],
            &ConversionConfig::default(),
        );
        let c = ConversionConfig::default();
        assert_eq!(render_mdx(&tree, &c), render_mdx(&tree, &c));
    }

    #[test]
    fn empty_tree_renders_empty_string() {
        assert_eq!(render_mdx(&StructureTree::new(), &ConversionConfig::default()), "");
    }
}
