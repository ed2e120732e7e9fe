use super::compress::compress;
use super::*;
use crate::attr::{Adjust, AttrKey, AttrValue};
use crate::document::TextDocument;
use crate::tables::StyleRecord;

struct Harness {
    stack: ScopeStack,
    doc: TextDocument,
    defaults: AttrSet,
    styles: StyleTable,
    pool: AttrPool,
    stats: ParseStats,
    check_style_attrs: bool,
}

impl Harness {
    fn new() -> Self {
        Self {
            stack: ScopeStack::new(),
            doc: TextDocument::new(),
            defaults: AttrSet::new(),
            styles: StyleTable::new(),
            pool: AttrPool::new(),
            stats: ParseStats::default(),
            check_style_attrs: false,
        }
    }

    fn run<R>(&mut self, f: impl FnOnce(&mut ScopeStack, &mut ResolveContext<'_>) -> R) -> R {
        let mut ctx = ResolveContext {
            doc: &mut self.doc,
            defaults: &self.defaults,
            styles: &self.styles,
            pool: &self.pool,
            check_style_attrs: self.check_style_attrs,
            stats: &mut self.stats,
        };
        f(&mut self.stack, &mut ctx)
    }

    fn open(&mut self) {
        self.run(|stack, ctx| stack.open_group(ctx));
    }

    fn close(&mut self) {
        self.run(|stack, ctx| stack.close_group(ctx));
    }

    fn set(&mut self, key: AttrKey, value: AttrValue) {
        self.run(move |stack, ctx| {
            stack.current_frame(ctx).attrs.insert(key, value);
        });
    }

    fn set_enclosing(&mut self, key: AttrKey, value: AttrValue) {
        self.run(move |stack, ctx| {
            stack.enclosing_frame(ctx).attrs.insert(key, value);
        });
    }

    fn set_style(&mut self, id: u16) {
        self.run(move |stack, ctx| stack.current_frame(ctx).style = id);
    }

    fn text(&mut self, text: &str) {
        self.doc.insert_text(text);
        self.run(|stack, ctx| stack.flush_pending(ctx));
    }

    fn par(&mut self) {
        self.doc.insert_paragraph();
    }

    fn finish(&mut self) {
        self.run(|stack, ctx| stack.flush_all(ctx));
    }

    fn commits(&self) -> Vec<String> {
        self.doc
            .snapshot_lines()
            .into_iter()
            .filter(|line| line.starts_with("commit"))
            .collect()
    }
}

fn bold(on: bool) -> AttrValue {
    AttrValue::Bool(on)
}

#[test]
fn nested_group_commits_only_its_delta() {
    let mut h = Harness::new();
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.text("Bold ");
    h.open();
    h.set(AttrKey::Posture, AttrValue::Bool(true));
    h.text("BoldItalic");
    h.close();
    h.text(" Bold");
    h.close();
    h.finish();

    assert_eq!(
        h.commits(),
        vec!["commit 0:0..0:20 bold=true", "commit 0:5..0:15 italic=true"]
    );
    let runs = h.doc.resolved_runs();
    let view: Vec<(&str, String)> = runs
        .iter()
        .map(|run| (run.text.as_str(), run.attrs.to_string()))
        .collect();
    assert_eq!(
        view,
        vec![
            ("Bold ", "bold=true".to_string()),
            ("BoldItalic", "bold=true italic=true".to_string()),
            (" Bold", "bold=true".to_string()),
        ]
    );
}

#[test]
fn attribute_equal_to_parent_is_dropped_from_child() {
    let mut h = Harness::new();
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.text("a");
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.set(AttrKey::Posture, AttrValue::Bool(true));
    h.text("b");
    h.close();
    h.close();
    h.finish();
    assert_eq!(
        h.commits(),
        vec!["commit 0:0..0:2 bold=true", "commit 0:1..0:2 italic=true"]
    );
}

#[test]
fn child_fully_inherited_is_discarded() {
    let mut h = Harness::new();
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.text("a");
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.text("b");
    h.close();
    h.close();
    h.finish();
    assert_eq!(h.commits(), vec!["commit 0:0..0:2 bold=true"]);
    assert_eq!(h.stats.frames_discarded, 1);
}

#[test]
fn zero_length_group_is_discarded_even_with_attributes() {
    let mut h = Harness::new();
    h.text("x");
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.set_style(4);
    h.close();
    h.finish();
    assert!(h.commits().is_empty());
    assert_eq!(h.stats.frames_discarded, 1);
    assert_eq!(h.stack.pending_len(), 0);
}

#[test]
fn group_without_attributes_never_materializes() {
    let mut h = Harness::new();
    h.open();
    h.close();
    h.open();
    h.text("plain");
    h.close();
    h.finish();
    assert!(h.commits().is_empty());
    assert_eq!(h.stats.frames_pushed, 0);
}

#[test]
fn double_open_materializes_outer_frame() {
    let mut h = Harness::new();
    h.open();
    h.open();
    assert_eq!(h.stack.depth(), 1);
    h.set(AttrKey::Weight, bold(true));
    assert_eq!(h.stack.depth(), 2);
    h.text("x");
    h.close();
    h.close();
    h.finish();
    assert_eq!(h.commits(), vec!["commit 0:0..0:1 bold=true"]);
}

#[test]
fn enclosing_attribute_starts_at_the_cursor() {
    let mut h = Harness::new();
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.text("ab");
    h.open();
    h.set_enclosing(AttrKey::PageDescriptor, AttrValue::Int(3));
    assert_eq!(h.stack.depth(), 1);
    assert_eq!(
        h.stack.current().map(ScopeFrame::start),
        Some(EditPosition::new(0, 2))
    );
    h.close();
    h.text("c");
    h.close();
    h.finish();
    assert_eq!(
        h.commits(),
        vec![
            "commit 0:0..0:2 bold=true",
            "commit 0:2..0:3 bold=true pgdsc=3",
        ]
    );
}

#[test]
fn enclosing_attribute_without_a_group_frame_gets_its_own() {
    let mut h = Harness::new();
    h.open();
    h.text("a");
    h.open();
    h.set_enclosing(AttrKey::PageDescriptor, AttrValue::Int(3));
    h.set_enclosing(AttrKey::PageBreakBefore, AttrValue::Bool(true));
    h.close();
    assert_eq!(h.stack.depth(), 1);
    h.text("b");
    h.close();
    assert_eq!(h.stack.depth(), 0);
    h.finish();
    assert_eq!(h.commits(), vec!["commit 0:1..0:2 pgbrk=true pgdsc=3"]);
}

#[test]
fn close_at_paragraph_start_ends_on_previous_paragraph() {
    let mut h = Harness::new();
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.text("ab");
    h.par();
    h.close();
    assert_eq!(h.doc.position(), EditPosition::new(1, 0));
    h.finish();
    assert_eq!(h.commits(), vec!["commit 0:0..0:2 bold=true"]);
}

#[test]
fn paragraph_keys_stop_at_previous_paragraph_break() {
    let mut h = Harness::new();
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.set(AttrKey::Adjust, AttrValue::Adjust(Adjust::Center));
    h.text("one");
    h.par();
    h.text("two");
    h.close();
    h.finish();

    assert_eq!(h.stats.paragraph_splits, 1);
    // Queue order is reversed at commit: the tail goes first.
    assert_eq!(
        h.commits(),
        vec![
            "commit 1:0..1:3 bold=true",
            "commit 0:0..0:3 bold=true adjust=center",
        ]
    );
    for run in h.doc.resolved_runs() {
        assert_eq!(run.attrs.get(AttrKey::Weight), Some(&bold(true)));
        let centered = run.attrs.get(AttrKey::Adjust).is_some();
        assert_eq!(centered, run.node == 0, "adjust leaked into {run:?}");
    }
}

#[test]
fn split_without_character_keys_drops_the_tail() {
    let mut h = Harness::new();
    h.open();
    h.set(AttrKey::Adjust, AttrValue::Adjust(Adjust::Center));
    h.text("one");
    h.par();
    h.text("two");
    h.close();
    assert_eq!(h.stats.paragraph_splits, 1);
    assert_eq!(h.stats.frames_discarded, 1);
    assert_eq!(h.stack.pending_len(), 1);
    h.finish();
    assert_eq!(h.commits(), vec!["commit 0:0..0:3 adjust=center"]);
}

#[test]
fn character_only_frame_is_not_split() {
    let mut h = Harness::new();
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.text("one");
    h.par();
    h.text("two");
    h.close();
    h.finish();
    assert_eq!(h.stats.paragraph_splits, 0);
    assert_eq!(h.commits(), vec!["commit 0:0..1:3 bold=true"]);
}

#[test]
fn split_inside_parent_attaches_both_halves() {
    let mut h = Harness::new();
    h.open();
    h.set(AttrKey::Posture, AttrValue::Bool(true));
    h.text("a");
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.set(AttrKey::LeftIndent, AttrValue::Int(360));
    h.text("b");
    h.par();
    h.text("c");
    h.close();
    let children = h.stack.current().map(|frame| frame.children().len());
    assert_eq!(children, Some(2));
    h.close();
    h.finish();
    let runs = h.doc.resolved_runs();
    let c = runs.iter().find(|run| run.text == "c");
    assert_eq!(c.and_then(|run| run.attrs.get(AttrKey::Weight)), Some(&bold(true)));
    assert_eq!(c.and_then(|run| run.attrs.get(AttrKey::LeftIndent)), None);
}

#[test]
fn wide_parent_is_split_without_losing_coverage() {
    let children = MAX_CHILDREN + 10;
    let mut h = Harness::new();
    h.open();
    h.set(AttrKey::Weight, bold(true));
    for _ in 0..children {
        h.open();
        h.set(AttrKey::Posture, AttrValue::Bool(true));
        h.text("x");
        h.par();
        h.close();
    }
    h.close();
    h.finish();

    assert_eq!(h.stats.depth_splits, 1);
    let runs = h.doc.resolved_runs();
    assert_eq!(runs.len(), children);
    for (node, run) in runs.iter().enumerate() {
        assert_eq!(run.node, node);
        assert_eq!(run.text, "x");
        assert_eq!(run.attrs.to_string(), "bold=true italic=true", "node {node}");
    }
}

#[test]
fn style_redundancy_is_removed_for_top_level_frames() {
    let mut h = Harness::new();
    h.check_style_attrs = true;
    h.styles.insert(
        2,
        StyleRecord {
            name: "Strong".into(),
            attrs: [(AttrKey::Weight, bold(true))].into_iter().collect(),
            ..StyleRecord::default()
        },
    );
    h.open();
    h.set_style(2);
    h.set(AttrKey::Weight, bold(true));
    h.set(AttrKey::Posture, AttrValue::Bool(false));
    h.set(AttrKey::FontHeight, AttrValue::Int(32));
    h.text("x");
    h.close();
    h.finish();
    assert_eq!(h.commits(), vec!["commit 0:0..0:1 s2 size=32"]);
}

#[test]
fn pool_defaults_are_removed_without_a_style() {
    let mut h = Harness::new();
    h.check_style_attrs = true;
    h.open();
    h.set(AttrKey::Weight, bold(false));
    h.set(AttrKey::Hidden, AttrValue::Bool(true));
    h.text("x");
    h.close();
    h.finish();
    assert_eq!(h.commits(), vec!["commit 0:0..0:1 hidden=true"]);
}

#[test]
fn defaults_are_copied_into_new_frames() {
    let mut h = Harness::new();
    h.defaults.insert(AttrKey::ScriptSpace, AttrValue::Bool(false));
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.text("x");
    h.close();
    h.finish();
    assert_eq!(h.commits(), vec!["commit 0:0..0:1 bold=true scriptspace=false"]);
}

#[test]
fn effective_value_falls_back_to_pool() {
    let mut h = Harness::new();
    h.open();
    h.set(AttrKey::Font, AttrValue::Int(3));
    h.open();
    h.set(AttrKey::Weight, bold(true));
    let pool = AttrPool::new();
    assert_eq!(h.stack.effective(AttrKey::Font, &pool), Some(&AttrValue::Int(3)));
    assert_eq!(h.stack.effective(AttrKey::FontHeight, &pool), Some(&AttrValue::Int(24)));
    assert_eq!(h.stack.effective(AttrKey::OutlineLevel, &pool), None);
}

#[test]
fn clear_drops_everything_uncommitted() {
    let mut h = Harness::new();
    h.open();
    h.set(AttrKey::Weight, bold(true));
    h.text("x");
    h.close();
    assert_eq!(h.stack.pending_len(), 1);
    h.stack.clear();
    h.finish();
    assert!(h.commits().is_empty());
}

#[test]
fn deep_nesting_commits_without_recursion() {
    let depth = 10_000;
    let mut h = Harness::new();
    for i in 0..depth {
        h.open();
        h.set(AttrKey::Weight, bold(i % 2 == 0));
        h.text("x");
    }
    for _ in 0..depth {
        h.close();
    }
    h.finish();
    assert_eq!(h.stats.commits, depth as u64);
    assert_eq!(h.doc.paragraph_len(0), depth);
}

// Compression must not change what each position ends up with.

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

const KEYS: [AttrKey; 3] = [AttrKey::Weight, AttrKey::Posture, AttrKey::Hidden];

fn random_attrs(rng: &mut Lcg) -> AttrSet {
    let mut attrs = AttrSet::new();
    for key in KEYS {
        if rng.below(3) == 0 {
            attrs.insert(key, AttrValue::Bool(rng.below(2) == 0));
        }
    }
    attrs
}

fn random_tiling(rng: &mut Lcg, start: usize, end: usize, depth: usize) -> ScopeFrame {
    let mut frame = ScopeFrame::new(EditPosition::new(0, start), 0);
    frame.end = EditPosition::new(0, end);
    frame.attrs = random_attrs(rng);
    if depth == 0 || end - start < 2 || rng.below(4) == 0 {
        return frame;
    }
    let mut cursor = start;
    while cursor < end {
        let len = 1 + rng.below((end - cursor) as u64) as usize;
        frame
            .children
            .push(random_tiling(rng, cursor, cursor + len, depth - 1));
        cursor += len;
    }
    frame
}

fn apply_uncompressed(frame: &ScopeFrame, doc: &mut TextDocument) {
    let mut work = vec![frame];
    while let Some(next) = work.pop() {
        if !next.attrs.is_empty() {
            doc.apply_attributes(next.start, next.end, &next.attrs, next.style);
        }
        work.extend(next.children.iter().rev());
    }
}

#[test]
fn compression_preserves_resolved_coverage() {
    for seed in 0..128 {
        let mut base = TextDocument::new();
        base.insert_text("abcdefghijklmnop");
        let len = base.paragraph_len(0);

        let mut plain = base.clone();
        let tree = random_tiling(&mut Lcg(seed), 0, len, 3);
        apply_uncompressed(&tree, &mut plain);

        let mut compressed = base.clone();
        let mut tree = random_tiling(&mut Lcg(seed), 0, len, 3);
        compress(&mut tree, &compressed);
        apply_uncompressed(&tree, &mut compressed);

        assert_eq!(
            plain.resolved_runs(),
            compressed.resolved_runs(),
            "seed {seed}"
        );
    }
}

#[test]
fn compression_hoists_common_attributes() {
    let mut doc = TextDocument::new();
    doc.insert_text("abcd");
    let mut root = ScopeFrame::new(EditPosition::new(0, 0), 0);
    root.end = EditPosition::new(0, 4);
    for (start, end, italic) in [(0, 2, true), (2, 4, false)] {
        let mut child = ScopeFrame::new(EditPosition::new(0, start), 0);
        child.end = EditPosition::new(0, end);
        child.attrs.insert(AttrKey::Weight, bold(true));
        if italic {
            child.attrs.insert(AttrKey::Posture, AttrValue::Bool(true));
        }
        root.children.push(child);
    }
    compress(&mut root, &doc);
    assert_eq!(root.attrs.to_string(), "bold=true");
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].attrs.to_string(), "italic=true");
}

#[test]
fn compression_skips_children_with_gaps() {
    let mut doc = TextDocument::new();
    doc.insert_text("abcd");
    let mut root = ScopeFrame::new(EditPosition::new(0, 0), 0);
    root.end = EditPosition::new(0, 4);
    for (start, end) in [(0, 1), (2, 4)] {
        let mut child = ScopeFrame::new(EditPosition::new(0, start), 0);
        child.end = EditPosition::new(0, end);
        child.attrs.insert(AttrKey::Weight, bold(true));
        root.children.push(child);
    }
    compress(&mut root, &doc);
    assert!(root.attrs.is_empty());
    assert_eq!(root.children.len(), 2);
}

#[test]
fn compression_joins_across_paragraph_breaks() {
    let mut doc = TextDocument::new();
    doc.insert_text("ab");
    doc.insert_paragraph();
    doc.insert_text("cd");
    let mut root = ScopeFrame::new(EditPosition::new(0, 0), 0);
    root.end = EditPosition::new(1, 2);
    for (start, end) in [((0, 0), (0, 2)), ((1, 0), (1, 2))] {
        let mut child = ScopeFrame::new(EditPosition::new(start.0, start.1), 0);
        child.end = EditPosition::new(end.0, end.1);
        child.attrs.insert(AttrKey::Posture, AttrValue::Bool(true));
        root.children.push(child);
    }
    compress(&mut root, &doc);
    assert_eq!(root.attrs.to_string(), "italic=true");
    assert!(root.children.is_empty());
}
