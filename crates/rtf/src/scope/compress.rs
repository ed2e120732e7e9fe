//! Compression and commit of closed frame trees.
//!
//! Both walks use explicit work-lists; input nesting depth is attacker
//! controlled.

use std::mem;
use std::vec;

use crate::document::DocumentSink;

use super::{ResolveContext, ScopeFrame};

/// Compresses `frame` and applies it and its subtree to the document,
/// parent before children, children in range order.
pub(crate) fn commit(frame: &mut ScopeFrame, ctx: &mut ResolveContext<'_>) {
    if !frame.children.is_empty() {
        compress(frame, &*ctx.doc);
    }
    #[cfg(feature = "parser_invariants")]
    assert_tree_invariants(frame);

    let mut work: Vec<&ScopeFrame> = vec![&*frame];
    while let Some(next) = work.pop() {
        if !next.attrs.is_empty() || next.style != 0 {
            ctx.doc
                .apply_attributes(next.start, next.end, &next.attrs, next.style);
            ctx.stats.commits += 1;
            #[cfg(any(test, feature = "debug-stats"))]
            log::trace!(
                target: "rtf.scope",
                "commit {}..{} style={} {}",
                next.start,
                next.end,
                next.style,
                next.attrs
            );
        }
        work.extend(next.children.iter().rev());
    }
}

struct Visit {
    frame: ScopeFrame,
    rest: vec::IntoIter<ScopeFrame>,
    done: Vec<ScopeFrame>,
}

impl Visit {
    fn new(mut frame: ScopeFrame) -> Self {
        let children = mem::take(&mut frame.children);
        Self {
            done: Vec::with_capacity(children.len()),
            rest: children.into_iter(),
            frame,
        }
    }
}

/// Hoists attributes shared by all children into their parent, bottom-up
/// over the whole subtree.
pub(crate) fn compress(frame: &mut ScopeFrame, doc: &dyn DocumentSink) {
    if frame.children.is_empty() {
        return;
    }
    let root = mem::take(frame);
    *frame = compress_owned(root, doc);
}

fn compress_owned(root: ScopeFrame, doc: &dyn DocumentSink) -> ScopeFrame {
    let mut stack = vec![Visit::new(root)];
    loop {
        let top = stack.len() - 1;
        if let Some(child) = stack[top].rest.next() {
            if child.children.is_empty() {
                stack[top].done.push(child);
            } else {
                stack.push(Visit::new(child));
            }
            continue;
        }

        let Visit { mut frame, done, .. } = stack.swap_remove(top);
        frame.children = done;
        merge_children(&mut frame, doc);
        match stack.last_mut() {
            Some(parent) => parent.done.push(frame),
            None => return frame,
        }
    }
}

/// Single-level merge. Children must tile the parent's range exactly; a
/// gap anywhere leaves the frame unchanged.
fn merge_children(frame: &mut ScopeFrame, doc: &dyn DocumentSink) {
    let Some((first, rest)) = frame.children.split_first() else {
        return;
    };
    if first.attrs.is_empty() || first.start != frame.start {
        return;
    }

    let mut merge = first.attrs.clone();
    let mut last_end = first.end;
    for child in rest {
        let contiguous = if child.start.offset == 0 {
            last_end.node + 1 == child.start.node && doc.is_paragraph_end(last_end)
        } else {
            child.start == last_end
        };
        if !contiguous {
            return;
        }
        merge.retain_equal(&child.attrs);
        if merge.is_empty() {
            return;
        }
        last_end = child.end;
    }
    if frame.end != last_end {
        return;
    }

    frame.attrs.put_all(&merge);
    for child in &mut frame.children {
        child.attrs.differentiate(&merge);
    }
    frame.children.retain(|child| !child.is_empty_leaf());
    #[cfg(any(test, feature = "debug-stats"))]
    log::trace!(
        target: "rtf.scope",
        "hoisted {merge} into {}..{}",
        frame.start,
        frame.end
    );
}

#[cfg(feature = "parser_invariants")]
fn assert_tree_invariants(root: &ScopeFrame) {
    let mut work = vec![root];
    while let Some(frame) = work.pop() {
        assert!(
            frame.start <= frame.end,
            "frame range inverted: {}..{}",
            frame.start,
            frame.end
        );
        for pair in frame.children.windows(2) {
            assert!(
                pair[0].start <= pair[1].start,
                "children out of order: {} after {}",
                pair[1].start,
                pair[0].start
            );
        }
        work.extend(frame.children.iter());
    }
}
