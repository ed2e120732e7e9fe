//! Scope frame tree nodes.

use crate::attr::AttrSet;
use crate::document::EditPosition;

/// One formatting scope: a brace group, or one half of a group split at a
/// paragraph boundary.
///
/// `attrs` holds this scope's deltas only, not the inherited result. `end`
/// equals `start` until the scope closes. Children are owned and ordered by
/// range. `group` is the brace depth of the group the frame closes with.
#[derive(Debug, Default)]
pub struct ScopeFrame {
    pub(crate) attrs: AttrSet,
    pub(crate) style: u16,
    pub(crate) start: EditPosition,
    pub(crate) end: EditPosition,
    pub(crate) group: usize,
    pub(crate) children: Vec<ScopeFrame>,
}

impl ScopeFrame {
    pub(crate) fn new(start: EditPosition, style: u16) -> Self {
        Self {
            attrs: AttrSet::new(),
            style,
            start,
            end: start,
            group: 0,
            children: Vec::new(),
        }
    }

    /// Childless frame at `start` carrying a copy of `source`'s deltas, style
    /// reference and group.
    pub(crate) fn continuation(source: &ScopeFrame, start: EditPosition) -> Self {
        let mut frame = Self::new(start, source.style);
        frame.attrs = source.attrs.clone();
        frame.group = source.group;
        frame
    }

    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }

    pub fn style(&self) -> u16 {
        self.style
    }

    pub fn start(&self) -> EditPosition {
        self.start
    }

    pub fn end(&self) -> EditPosition {
        self.end
    }

    pub fn children(&self) -> &[ScopeFrame] {
        &self.children
    }

    /// Nothing to commit and nothing below it.
    pub(crate) fn is_empty_leaf(&self) -> bool {
        self.children.is_empty() && self.attrs.is_empty() && self.style == 0
    }
}

impl Drop for ScopeFrame {
    // Flatten the subtree first so dropping a deep tree never recurses.
    fn drop(&mut self) {
        let mut work = std::mem::take(&mut self.children);
        while let Some(mut frame) = work.pop() {
            work.append(&mut frame.children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_deep_tree_does_not_recurse() {
        let depth = 200_000;
        let mut root = ScopeFrame::new(EditPosition::default(), 0);
        let mut chain = ScopeFrame::new(EditPosition::default(), 0);
        for _ in 0..depth {
            let mut parent = ScopeFrame::new(EditPosition::default(), 0);
            parent.children.push(chain);
            chain = parent;
        }
        root.children.push(chain);
        drop(root);
    }

    #[test]
    fn continuation_copies_deltas_not_children() {
        let mut source = ScopeFrame::new(EditPosition::new(0, 0), 7);
        source.attrs.insert(crate::attr::AttrKey::Weight, crate::attr::AttrValue::Bool(true));
        source.group = 2;
        source.children.push(ScopeFrame::new(EditPosition::new(0, 1), 0));
        let next = ScopeFrame::continuation(&source, EditPosition::new(3, 0));
        assert_eq!(next.attrs, source.attrs);
        assert_eq!(next.style, 7);
        assert_eq!(next.group, 2);
        assert_eq!(next.start, EditPosition::new(3, 0));
        assert_eq!(next.end, next.start);
        assert!(next.children.is_empty());
    }
}
