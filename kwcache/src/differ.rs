// Copyright 2026 kwcache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use hashbrown::HashMap;

use crate::set::OrderedSet;

/// How requested keywords combine with the keywords a key already carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordMode {
    /// The requested keywords fully replace the existing ones.
    #[default]
    Overwrite,
    /// The requested keywords are unioned with the existing ones.
    Merge,
}

/// The keyword transition of one key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordState {
    old: OrderedSet,
    new: OrderedSet,
    obsolete: OrderedSet,
}

impl KeywordState {
    /// Compute the transition from `old` for the requested keywords.
    ///
    /// - `new` is `requested` in overwrite mode, `old ∪ requested` in merge mode.
    /// - `obsolete` is `old - new`.
    pub fn diff(old: OrderedSet, requested: &OrderedSet, mode: KeywordMode) -> Self {
        let new = match mode {
            KeywordMode::Overwrite => requested.clone(),
            KeywordMode::Merge => old.union(requested),
        };
        let obsolete = old.difference(&new);
        Self { old, new, obsolete }
    }

    /// Keywords the key carried before the transition.
    pub fn old(&self) -> &OrderedSet {
        &self.old
    }

    /// Keywords the key carries after the transition.
    pub fn current(&self) -> &OrderedSet {
        &self.new
    }

    /// Keywords the key no longer carries.
    pub fn obsolete(&self) -> &OrderedSet {
        &self.obsolete
    }

    /// Keywords newly associated with the key.
    pub fn added(&self) -> OrderedSet {
        self.new.difference(&self.old)
    }

    /// Every keyword whose forward index may need an update: `new ∪ obsolete`.
    pub fn touched(&self) -> OrderedSet {
        self.new.union(&self.obsolete)
    }

    /// Returns `true` if the transition changes nothing.
    pub fn is_noop(&self) -> bool {
        self.obsolete.is_empty() && self.new.same_items(&self.old)
    }
}

/// Keyword states memoized per key for the lifetime of one logical operation.
#[derive(Debug, Default)]
pub struct Snapshots {
    states: HashMap<String, KeywordState>,
}

impl Snapshots {
    /// Get the memoized state of the key.
    pub fn get(&self, key: &str) -> Option<&KeywordState> {
        self.states.get(key)
    }

    /// Memoize the state of the key, replacing any previous one.
    pub fn insert(&mut self, key: &str, state: KeywordState) {
        self.states.insert(key.to_string(), state);
    }

    /// Drop every memoized state.
    pub fn clear(&mut self) {
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> OrderedSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_overwrite() {
        let state = KeywordState::diff(set(&["a", "b"]), &set(&["b", "c"]), KeywordMode::Overwrite);
        assert_eq!(state.current().as_slice(), &["b", "c"]);
        assert_eq!(state.obsolete().as_slice(), &["a"]);
        assert_eq!(state.added().as_slice(), &["c"]);
        assert_eq!(state.touched().as_slice(), &["b", "c", "a"]);
    }

    #[test]
    fn test_merge() {
        let state = KeywordState::diff(set(&["t2"]), &set(&["extra", "t2"]), KeywordMode::Merge);
        assert_eq!(state.current().as_slice(), &["t2", "extra"]);
        assert!(state.obsolete().is_empty());
        assert_eq!(state.added().as_slice(), &["extra"]);
    }

    #[test]
    fn test_same_keywords_is_noop() {
        for mode in [KeywordMode::Overwrite, KeywordMode::Merge] {
            let state = KeywordState::diff(set(&["a", "b"]), &set(&["b", "a"]), mode);
            assert!(state.is_noop());
            assert!(state.obsolete().is_empty());
        }
    }

    #[test]
    fn test_empty_request() {
        let state = KeywordState::diff(set(&["a", "b"]), &OrderedSet::new(), KeywordMode::Overwrite);
        assert!(state.current().is_empty());
        assert_eq!(state.obsolete().as_slice(), &["a", "b"]);

        let state = KeywordState::diff(set(&["a", "b"]), &OrderedSet::new(), KeywordMode::Merge);
        assert!(state.is_noop());
        assert_eq!(state.current().as_slice(), &["a", "b"]);
    }

    #[test]
    fn test_snapshots_replace() {
        let mut snapshots = Snapshots::default();
        snapshots.insert("k", KeywordState::diff(OrderedSet::new(), &set(&["a"]), KeywordMode::Overwrite));
        snapshots.insert("k", KeywordState::diff(set(&["a"]), &OrderedSet::new(), KeywordMode::Overwrite));
        assert_eq!(snapshots.get("k").unwrap().obsolete().as_slice(), &["a"]);

        snapshots.clear();
        assert!(snapshots.get("k").is_none());
    }
}
