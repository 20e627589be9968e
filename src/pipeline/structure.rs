//! Structure building: classified elements → document tree.
//!
//! The tree lives in an arena ([`StructureTree`]): nodes are stored in one
//! `Vec` and refer to their children by [`NodeId`]. Only list items have
//! children, and those children are list items too.
//!
//! The builder is a small state machine over the element stream:
//!
//! * an open paragraph, extended while consecutive paragraph lines sit
//!   closer than `previous.height * paragraph_gap_ratio`;
//! * a pending link, merged with the next link line when the URL matches;
//! * a stack of [`ListContext`]s, one per open list level, each anchored at
//!   the x position of the item that opened it.
//!
//! Headings, links and paragraphs close every open list level. The one
//! exception is a wrapped list item: a paragraph line that directly follows
//! a list item without a soft break and is indented past the item's anchor
//! is appended to that item's text.

use super::classify::{ClassifiedElement, ElementKind, MarkerKind};
use crate::config::ConversionConfig;
use serde::Serialize;
use tracing::debug;

/// Index of a node in its [`StructureTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructureNode {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    Link {
        url: String,
        text: String,
    },
    ListItem {
        marker: String,
        marker_kind: MarkerKind,
        text: String,
        children: Vec<NodeId>,
    },
}

/// Arena-backed document tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructureTree {
    nodes: Vec<StructureNode>,
    roots: Vec<NodeId>,
}

impl StructureTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level nodes in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// # Panics
    /// If `id` was not issued by this tree.
    pub fn node(&self, id: NodeId) -> &StructureNode {
        &self.nodes[id.0]
    }

    /// Children of `id`; empty for everything but list items.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(id.0) {
            Some(StructureNode::ListItem { children, .. }) => children,
            _ => &[],
        }
    }

    /// Total number of nodes, nested ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push_root(&mut self, node: StructureNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.roots.push(id);
        id
    }

    /// Attach `node` under `parent`. A parent that is not a list item
    /// cannot hold children, so the node becomes a root instead.
    pub fn push_child(&mut self, parent: NodeId, node: StructureNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        match self.nodes.get_mut(parent.0) {
            Some(StructureNode::ListItem { children, .. }) => {
                children.push(id);
                self.nodes.push(node);
                id
            }
            _ => self.push_root(node),
        }
    }

    fn append_text(&mut self, id: NodeId, extra: &str) {
        if let Some(
            StructureNode::ListItem { text, .. }
            | StructureNode::Paragraph { text }
            | StructureNode::Link { text, .. }
            | StructureNode::Heading { text, .. },
        ) = self.nodes.get_mut(id.0)
        {
            join_text(text, extra);
        }
    }
}

/// One open list level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListContext {
    pub anchor_x: f32,
    pub node: NodeId,
}

/// Vertical extent of the last line consumed by an open block.
#[derive(Debug, Clone, Copy)]
struct LineBox {
    y: f32,
    height: f32,
}

impl LineBox {
    fn of(e: &ClassifiedElement) -> Self {
        Self {
            y: e.line.y(),
            height: e.line.height(),
        }
    }

    /// True when `next` starts far enough below this line to read as a new
    /// paragraph.
    fn soft_break_before(&self, next: &LineBox, ratio: f32) -> bool {
        next.y - (self.y + self.height) > self.height * ratio
    }
}

struct OpenParagraph {
    text: String,
    last: LineBox,
}

struct PendingLink {
    url: String,
    text: String,
}

struct Builder<'c> {
    config: &'c ConversionConfig,
    tree: StructureTree,
    paragraph: Option<OpenParagraph>,
    link: Option<PendingLink>,
    lists: Vec<ListContext>,
    /// Last line of the list item that is still open for continuation.
    list_line: Option<LineBox>,
}

/// Build the document tree for one page's elements.
pub fn build_structure(elements: Vec<ClassifiedElement>, config: &ConversionConfig) -> StructureTree {
    let mut b = Builder {
        config,
        tree: StructureTree::new(),
        paragraph: None,
        link: None,
        lists: Vec::new(),
        list_line: None,
    };
    for e in elements {
        match e.kind.clone() {
            ElementKind::Heading { level } => b.heading(level, e),
            ElementKind::Link { url } => b.link(url, e),
            ElementKind::ListItem {
                marker,
                marker_kind,
            } => b.list_item(marker, marker_kind, e),
            ElementKind::Paragraph => b.paragraph(e),
        }
    }
    b.flush_paragraph();
    b.flush_link();

    debug!(
        "Built structure: {} roots, {} nodes",
        b.tree.roots().len(),
        b.tree.len()
    );
    b.tree
}

impl Builder<'_> {
    fn heading(&mut self, level: u8, e: ClassifiedElement) {
        self.flush_paragraph();
        self.flush_link();
        self.close_lists();
        self.tree.push_root(StructureNode::Heading {
            level,
            text: e.text,
        });
    }

    fn link(&mut self, url: String, e: ClassifiedElement) {
        self.flush_paragraph();
        self.close_lists();
        match &mut self.link {
            Some(pending) if pending.url == url => join_text(&mut pending.text, &e.text),
            _ => {
                self.flush_link();
                self.link = Some(PendingLink { url, text: e.text });
            }
        }
    }

    fn list_item(&mut self, marker: String, marker_kind: MarkerKind, e: ClassifiedElement) {
        // An open paragraph means the previous element was not a list item.
        self.flush_paragraph();
        self.flush_link();

        let threshold = self.config.indentation_threshold;
        let x = e.indent_x;
        while self
            .lists
            .last()
            .is_some_and(|top| top.anchor_x > x + threshold)
        {
            self.lists.pop();
        }

        let line = LineBox::of(&e);
        let node = StructureNode::ListItem {
            marker,
            marker_kind,
            text: e.text,
            children: Vec::new(),
        };
        let id = match self.lists.last().copied() {
            None => self.tree.push_root(node),
            Some(top) if x > top.anchor_x + threshold => self.tree.push_child(top.node, node),
            Some(_) => {
                self.lists.pop();
                match self.lists.last() {
                    Some(parent) => self.tree.push_child(parent.node, node),
                    None => self.tree.push_root(node),
                }
            }
        };
        self.lists.push(ListContext { anchor_x: x, node: id });
        self.list_line = Some(line);
    }

    fn paragraph(&mut self, e: ClassifiedElement) {
        let line = LineBox::of(&e);
        let ratio = self.config.paragraph_gap_ratio;

        if let (Some(prev), Some(top)) = (self.list_line, self.lists.last().copied()) {
            let wrapped = !prev.soft_break_before(&line, ratio)
                && e.indent_x > top.anchor_x + self.config.indentation_threshold / 2.0;
            if wrapped {
                self.tree.append_text(top.node, &e.text);
                self.list_line = Some(line);
                return;
            }
        }

        self.flush_link();
        self.close_lists();
        match &mut self.paragraph {
            Some(open) if !open.last.soft_break_before(&line, ratio) => {
                join_text(&mut open.text, &e.text);
                open.last = line;
            }
            _ => {
                self.flush_paragraph();
                self.paragraph = Some(OpenParagraph {
                    text: e.text,
                    last: line,
                });
            }
        }
    }

    fn flush_paragraph(&mut self) {
        if let Some(p) = self.paragraph.take() {
            self.tree.push_root(StructureNode::Paragraph { text: p.text });
        }
    }

    fn flush_link(&mut self) {
        if let Some(l) = self.link.take() {
            self.tree.push_root(StructureNode::Link {
                url: l.url,
                text: l.text,
            });
        }
    }

    fn close_lists(&mut self) {
        self.lists.clear();
        self.list_line = None;
    }
}

fn join_text(text: &mut String, extra: &str) {
    if extra.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(extra);
}
