//! Output document boundary.
//!
//! The parser talks to the document through `DocumentSink`: text insertion at
//! a cursor, cursor movement, paragraph queries, and the commit hook that
//! receives resolved attribute ranges. `TextDocument` is a small in-memory
//! implementation used by tests, benches and the command line tool.

use std::fmt;

use crate::attr::AttrSet;

/// Position in the document: paragraph index plus character offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EditPosition {
    pub node: usize,
    pub offset: usize,
}

impl EditPosition {
    pub const fn new(node: usize, offset: usize) -> Self {
        Self { node, offset }
    }
}

impl fmt::Display for EditPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.offset)
    }
}

pub trait DocumentSink {
    fn insert_text(&mut self, text: &str);

    fn insert_paragraph(&mut self);

    fn position(&self) -> EditPosition;

    /// Moves the cursor one character, crossing paragraph boundaries.
    fn move_position(&mut self, forward: bool);

    fn is_paragraph_end(&self, pos: EditPosition) -> bool;

    /// End of the paragraph preceding the one `pos` is in.
    fn previous_paragraph_end(&self, pos: EditPosition) -> EditPosition;

    /// Commit hook: `attrs` and `style` apply to `[start, end)`.
    fn apply_attributes(
        &mut self,
        start: EditPosition,
        end: EditPosition,
        attrs: &AttrSet,
        style: u16,
    );
}

impl<D: DocumentSink + ?Sized> DocumentSink for &mut D {
    fn insert_text(&mut self, text: &str) {
        (**self).insert_text(text);
    }

    fn insert_paragraph(&mut self) {
        (**self).insert_paragraph();
    }

    fn position(&self) -> EditPosition {
        (**self).position()
    }

    fn move_position(&mut self, forward: bool) {
        (**self).move_position(forward);
    }

    fn is_paragraph_end(&self, pos: EditPosition) -> bool {
        (**self).is_paragraph_end(pos)
    }

    fn previous_paragraph_end(&self, pos: EditPosition) -> EditPosition {
        (**self).previous_paragraph_end(pos)
    }

    fn apply_attributes(
        &mut self,
        start: EditPosition,
        end: EditPosition,
        attrs: &AttrSet,
        style: u16,
    ) {
        (**self).apply_attributes(start, end, attrs, style);
    }
}

/// One call of the commit hook, as recorded by `TextDocument`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeRun {
    pub start: EditPosition,
    pub end: EditPosition,
    pub attrs: AttrSet,
    pub style: u16,
}

/// Maximal stretch of one paragraph with identical resolved formatting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRun {
    pub node: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub attrs: AttrSet,
    pub style: u16,
}

#[derive(Clone, Debug)]
pub struct TextDocument {
    paragraphs: Vec<Vec<char>>,
    cursor: EditPosition,
    runs: Vec<AttributeRun>,
}

impl Default for TextDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDocument {
    pub fn new() -> Self {
        Self {
            paragraphs: vec![Vec::new()],
            cursor: EditPosition::default(),
            runs: Vec::new(),
        }
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn paragraph_len(&self, node: usize) -> usize {
        self.paragraphs.get(node).map_or(0, Vec::len)
    }

    pub fn paragraph_text(&self, node: usize) -> String {
        self.paragraphs
            .get(node)
            .map(|chars| chars.iter().collect())
            .unwrap_or_default()
    }

    /// Whole text with paragraphs joined by `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, chars) in self.paragraphs.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.extend(chars.iter());
        }
        out
    }

    /// Commit log in the order the engine produced it.
    pub fn runs(&self) -> &[AttributeRun] {
        &self.runs
    }

    /// Per-character formatting after replaying every commit in order, merged
    /// into maximal runs per paragraph.
    pub fn resolved_runs(&self) -> Vec<ResolvedRun> {
        let mut cells: Vec<Vec<(AttrSet, u16)>> = self
            .paragraphs
            .iter()
            .map(|chars| vec![(AttrSet::new(), 0); chars.len()])
            .collect();
        for run in &self.runs {
            for node in run.start.node..=run.end.node {
                let Some(row) = cells.get_mut(node) else {
                    break;
                };
                let from = if node == run.start.node { run.start.offset } else { 0 };
                let to = if node == run.end.node {
                    run.end.offset.min(row.len())
                } else {
                    row.len()
                };
                for cell in row.iter_mut().take(to).skip(from) {
                    cell.0.put_all(&run.attrs);
                    if run.style != 0 {
                        cell.1 = run.style;
                    }
                }
            }
        }

        let mut out = Vec::new();
        for (node, row) in cells.into_iter().enumerate() {
            let chars = &self.paragraphs[node];
            let mut start = 0;
            while start < row.len() {
                let mut end = start + 1;
                while end < row.len() && row[end] == row[start] {
                    end += 1;
                }
                out.push(ResolvedRun {
                    node,
                    start,
                    end,
                    text: chars[start..end].iter().collect(),
                    attrs: row[start].0.clone(),
                    style: row[start].1,
                });
                start = end;
            }
        }
        out
    }

    /// Golden-file view: paragraphs, then the commit log.
    pub fn snapshot_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.paragraphs.len() + self.runs.len());
        for node in 0..self.paragraphs.len() {
            lines.push(format!("P{node} {:?}", self.paragraph_text(node)));
        }
        for run in &self.runs {
            let mut line = format!("commit {}..{}", run.start, run.end);
            if run.style != 0 {
                line.push_str(&format!(" s{}", run.style));
            }
            if !run.attrs.is_empty() {
                line.push_str(&format!(" {}", run.attrs));
            }
            lines.push(line);
        }
        lines
    }
}

impl DocumentSink for TextDocument {
    fn insert_text(&mut self, text: &str) {
        let EditPosition { node, offset } = self.cursor;
        let Some(paragraph) = self.paragraphs.get_mut(node) else {
            return;
        };
        let tail = paragraph.split_off(offset);
        paragraph.extend(text.chars());
        self.cursor.offset = paragraph.len();
        paragraph.extend(tail);
    }

    fn insert_paragraph(&mut self) {
        let EditPosition { node, offset } = self.cursor;
        let Some(paragraph) = self.paragraphs.get_mut(node) else {
            return;
        };
        let tail = paragraph.split_off(offset);
        self.paragraphs.insert(node + 1, tail);
        self.cursor = EditPosition::new(node + 1, 0);
    }

    fn position(&self) -> EditPosition {
        self.cursor
    }

    fn move_position(&mut self, forward: bool) {
        let EditPosition { node, offset } = self.cursor;
        if forward {
            if offset < self.paragraph_len(node) {
                self.cursor.offset += 1;
            } else if node + 1 < self.paragraphs.len() {
                self.cursor = EditPosition::new(node + 1, 0);
            }
        } else if offset > 0 {
            self.cursor.offset -= 1;
        } else if node > 0 {
            self.cursor = EditPosition::new(node - 1, self.paragraph_len(node - 1));
        }
    }

    fn is_paragraph_end(&self, pos: EditPosition) -> bool {
        pos.offset >= self.paragraph_len(pos.node)
    }

    fn previous_paragraph_end(&self, pos: EditPosition) -> EditPosition {
        match pos.node.checked_sub(1) {
            Some(prev) => EditPosition::new(prev, self.paragraph_len(prev)),
            None => EditPosition::default(),
        }
    }

    fn apply_attributes(
        &mut self,
        start: EditPosition,
        end: EditPosition,
        attrs: &AttrSet,
        style: u16,
    ) {
        self.runs.push(AttributeRun {
            start,
            end,
            attrs: attrs.clone(),
            style,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{AttrKey, AttrValue};

    #[test]
    fn cursor_steps_across_paragraphs() {
        let mut doc = TextDocument::new();
        doc.insert_text("ab");
        doc.insert_paragraph();
        assert_eq!(doc.position(), EditPosition::new(1, 0));
        doc.move_position(false);
        assert_eq!(doc.position(), EditPosition::new(0, 2));
        assert!(doc.is_paragraph_end(doc.position()));
        doc.move_position(true);
        assert_eq!(doc.position(), EditPosition::new(1, 0));
        doc.move_position(true);
        assert_eq!(doc.position(), EditPosition::new(1, 0));
        assert_eq!(
            doc.previous_paragraph_end(EditPosition::new(1, 0)),
            EditPosition::new(0, 2)
        );
    }

    #[test]
    fn insertion_happens_at_cursor() {
        let mut doc = TextDocument::new();
        doc.insert_text("ad");
        doc.move_position(false);
        doc.insert_text("bc");
        assert_eq!(doc.text(), "abcd");
        assert_eq!(doc.position(), EditPosition::new(0, 3));
    }

    #[test]
    fn resolved_runs_overlay_commits_in_order() {
        let mut doc = TextDocument::new();
        doc.insert_text("one two");
        let bold: AttrSet = [(AttrKey::Weight, AttrValue::Bool(true))].into_iter().collect();
        let italic: AttrSet = [(AttrKey::Posture, AttrValue::Bool(true))].into_iter().collect();
        doc.apply_attributes(EditPosition::new(0, 0), EditPosition::new(0, 7), &bold, 0);
        doc.apply_attributes(EditPosition::new(0, 4), EditPosition::new(0, 7), &italic, 3);
        let runs = doc.resolved_runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "one ");
        assert_eq!(runs[0].attrs.to_string(), "bold=true");
        assert_eq!(runs[1].text, "two");
        assert_eq!(runs[1].attrs.to_string(), "bold=true italic=true");
        assert_eq!(runs[1].style, 3);
        assert_eq!(
            doc.snapshot_lines(),
            vec![
                "P0 \"one two\"".to_string(),
                "commit 0:0..0:7 bold=true".to_string(),
                "commit 0:4..0:7 s3 italic=true".to_string(),
            ]
        );
    }
}
