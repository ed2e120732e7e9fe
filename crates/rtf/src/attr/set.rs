//! Sparse attribute set.
//!
//! Storage is a `BTreeMap` so iteration order (and therefore commit output
//! and snapshots) is deterministic. A set holds only its own entries; lookups
//! that should fall through to enclosing scopes walk the scope stack instead
//! of following a stored parent pointer.

use std::collections::BTreeMap;
use std::fmt;

use super::{AttrKey, AttrPool, AttrValue};

/// Result of querying one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrState {
    Unset,
    Set,
    /// Present, and equal to the pool default.
    Default,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttrSet {
    items: BTreeMap<AttrKey, AttrValue>,
}

impl AttrSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: AttrKey) -> Option<&AttrValue> {
        self.items.get(&key)
    }

    pub fn contains_key(&self, key: AttrKey) -> bool {
        self.items.contains_key(&key)
    }

    pub fn insert(&mut self, key: AttrKey, value: AttrValue) -> Option<AttrValue> {
        self.items.insert(key, value)
    }

    pub fn remove(&mut self, key: AttrKey) -> Option<AttrValue> {
        self.items.remove(&key)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttrKey, &AttrValue)> {
        self.items.iter().map(|(key, value)| (*key, value))
    }

    pub fn keys(&self) -> impl Iterator<Item = AttrKey> + '_ {
        self.items.keys().copied()
    }

    pub fn state(&self, key: AttrKey, pool: &AttrPool) -> AttrState {
        match self.items.get(&key) {
            None => AttrState::Unset,
            Some(value) if pool.is_default(key, value) => AttrState::Default,
            Some(_) => AttrState::Set,
        }
    }

    /// Removes every entry whose value equals the entry `other` holds for the
    /// same key.
    pub fn differentiate(&mut self, other: &AttrSet) {
        if other.is_empty() {
            return;
        }
        self.items
            .retain(|key, value| other.items.get(key) != Some(&*value));
    }

    /// Keeps only entries that `other` holds with an equal value.
    pub fn retain_equal(&mut self, other: &AttrSet) {
        self.items
            .retain(|key, value| other.items.get(key) == Some(&*value));
    }

    /// Union where `other` wins on conflicts.
    pub fn put_all(&mut self, other: &AttrSet) {
        for (key, value) in &other.items {
            self.items.insert(*key, value.clone());
        }
    }

    /// Copies entries of `other` whose keys are not yet set here.
    pub fn put_missing(&mut self, other: &AttrSet) {
        for (key, value) in &other.items {
            self.items.entry(*key).or_insert_with(|| value.clone());
        }
    }

    pub fn clear_paragraph_keys(&mut self) {
        self.items.retain(|key, _| !key.is_paragraph());
    }

    pub fn remove_pool_defaults(&mut self, pool: &AttrPool) {
        self.items.retain(|key, value| !pool.is_default(*key, value));
    }

    pub fn retain(&mut self, mut keep: impl FnMut(AttrKey, &AttrValue) -> bool) {
        self.items.retain(|key, value| keep(*key, value));
    }
}

impl FromIterator<(AttrKey, AttrValue)> for AttrSet {
    fn from_iter<I: IntoIterator<Item = (AttrKey, AttrValue)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for AttrSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[(AttrKey, AttrValue)]) -> AttrSet {
        entries.iter().cloned().collect()
    }

    #[test]
    fn differentiate_drops_only_equal_values() {
        let mut child = set(&[
            (AttrKey::Weight, AttrValue::Bool(true)),
            (AttrKey::Posture, AttrValue::Bool(true)),
            (AttrKey::FontHeight, AttrValue::Int(28)),
        ]);
        let parent = set(&[
            (AttrKey::Weight, AttrValue::Bool(true)),
            (AttrKey::FontHeight, AttrValue::Int(24)),
        ]);
        child.differentiate(&parent);
        assert_eq!(child.to_string(), "italic=true size=28");
    }

    #[test]
    fn differentiate_is_idempotent() {
        let parent = set(&[(AttrKey::Weight, AttrValue::Bool(true))]);
        let mut once = set(&[
            (AttrKey::Weight, AttrValue::Bool(true)),
            (AttrKey::Color, AttrValue::Int(2)),
        ]);
        once.differentiate(&parent);
        let mut twice = once.clone();
        twice.differentiate(&parent);
        assert_eq!(once, twice);
    }

    #[test]
    fn retain_equal_is_intersection_with_equality() {
        let mut merged = set(&[
            (AttrKey::Weight, AttrValue::Bool(true)),
            (AttrKey::Color, AttrValue::Int(1)),
            (AttrKey::Posture, AttrValue::Bool(true)),
        ]);
        merged.retain_equal(&set(&[
            (AttrKey::Weight, AttrValue::Bool(true)),
            (AttrKey::Color, AttrValue::Int(2)),
        ]));
        assert_eq!(merged.to_string(), "bold=true");
    }

    #[test]
    fn put_missing_keeps_existing_values() {
        let mut frame = set(&[(AttrKey::ScriptSpace, AttrValue::Bool(true))]);
        frame.put_missing(&set(&[
            (AttrKey::ScriptSpace, AttrValue::Bool(false)),
            (AttrKey::Weight, AttrValue::Bool(false)),
        ]));
        assert_eq!(frame.to_string(), "bold=false scriptspace=true");
    }

    #[test]
    fn state_distinguishes_default_values() {
        let pool = AttrPool::new();
        let frame = set(&[
            (AttrKey::Weight, AttrValue::Bool(false)),
            (AttrKey::Posture, AttrValue::Bool(true)),
        ]);
        assert_eq!(frame.state(AttrKey::Weight, &pool), AttrState::Default);
        assert_eq!(frame.state(AttrKey::Posture, &pool), AttrState::Set);
        assert_eq!(frame.state(AttrKey::Color, &pool), AttrState::Unset);
    }

    #[test]
    fn clear_paragraph_keys_keeps_character_keys() {
        let mut frame = set(&[
            (AttrKey::Weight, AttrValue::Bool(true)),
            (AttrKey::LeftIndent, AttrValue::Int(720)),
            (AttrKey::KeepWithNext, AttrValue::Bool(true)),
        ]);
        frame.clear_paragraph_keys();
        assert_eq!(frame.to_string(), "bold=true");
    }
}
