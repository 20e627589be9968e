//! Line grouping: positioned items → visual lines.

use super::extract::PositionedItem;

/// Items judged to share one baseline, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub page: usize,
    pub items: Vec<PositionedItem>,
}

/// A maximal run of consecutive items sharing one style.
#[derive(Debug, Clone, PartialEq)]
struct StyledRun {
    text: String,
    bold: bool,
    italic: bool,
}

impl Line {
    /// Space-joined trimmed item text.
    pub fn text(&self) -> String {
        self.items
            .iter()
            .map(|i| i.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn max_font_size(&self) -> f32 {
        self.items.iter().map(|i| i.font_size).fold(0.0, f32::max)
    }

    /// Leftmost x of the line.
    pub fn left(&self) -> f32 {
        self.items
            .iter()
            .map(|i| i.x)
            .reduce(f32::min)
            .unwrap_or(0.0)
    }

    /// Topmost baseline of the line.
    pub fn y(&self) -> f32 {
        self.items
            .iter()
            .map(|i| i.y)
            .reduce(f32::min)
            .unwrap_or(0.0)
    }

    pub fn height(&self) -> f32 {
        self.items.iter().map(|i| i.height).fold(0.0, f32::max)
    }

    pub fn is_bold(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.is_bold)
    }

    pub fn is_italic(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.is_italic)
    }

    /// The URL every item of the line links to, if they all share one.
    pub fn url(&self) -> Option<&str> {
        let first = self.items.first()?.url.as_deref()?;
        self.items
            .iter()
            .all(|i| i.url.as_deref() == Some(first))
            .then_some(first)
    }

    /// Line text with bold/italic runs wrapped in Markdown emphasis.
    ///
    /// `skip` is a byte offset into [`Line::text`]; everything before it is
    /// dropped first (used to strip a list marker).
    pub fn markup_text(&self, skip: usize) -> String {
        self.styled_runs(skip)
            .iter()
            .map(|run| match (run.bold, run.italic) {
                (true, true) => format!("**_{}_**", run.text),
                (true, false) => format!("**{}**", run.text),
                (false, true) => format!("_{}_", run.text),
                (false, false) => run.text.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Same-style consecutive items merged into runs, after dropping the
    /// first `skip` bytes of the joined line text.
    fn styled_runs(&self, skip: usize) -> Vec<StyledRun> {
        let mut offset = 0usize;
        let mut pieces: Vec<(&str, bool, bool)> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let text = item.text.trim();
            if text.is_empty() {
                continue;
            }
            let start = offset;
            offset += text.len() + 1;

            let rest = if skip <= start {
                text
            } else {
                text.get(skip - start..).unwrap_or("")
            };
            let rest = rest.trim();
            if !rest.is_empty() {
                pieces.push((rest, item.is_bold, item.is_italic));
            }
        }

        pieces
            .chunk_by(|a, b| a.1 == b.1 && a.2 == b.2)
            .map(|group| StyledRun {
                text: group.iter().map(|p| p.0).collect::<Vec<_>>().join(" "),
                bold: group[0].1,
                italic: group[0].2,
            })
            .collect()
    }
}

/// Group items into lines.
///
/// Items are ordered by page, then baseline, then x. A new line starts at
/// a page boundary or when the vertical distance to the previous item
/// reaches `threshold`.
pub fn group_lines(mut items: Vec<PositionedItem>, threshold: f32) -> Vec<Line> {
    items.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(a.y.total_cmp(&b.y))
            .then(a.x.total_cmp(&b.x))
    });

    let mut lines: Vec<Line> = Vec::new();
    let mut prev: Option<(usize, f32)> = None;
    for item in items {
        let joins = matches!(prev, Some((page, y)) if page == item.page && (item.y - y).abs() < threshold);
        prev = Some((item.page, item.y));
        match lines.last_mut() {
            Some(line) if joins => line.items.push(item),
            _ => lines.push(Line {
                page: item.page,
                items: vec![item],
            }),
        }
    }

    for line in &mut lines {
        line.items.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    lines
}
