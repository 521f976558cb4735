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

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// An insertion-ordered, duplicate-free list of strings.
///
/// Used both for the keywords of a key and for the member keys of a keyword. Serialized as a plain list, and
/// deduplicated again on deserialization so a hand-written or legacy list can never yield repeated members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct OrderedSet {
    items: Vec<String>,
}

impl From<Vec<String>> for OrderedSet {
    fn from(items: Vec<String>) -> Self {
        items.into_iter().collect()
    }
}

impl From<OrderedSet> for Vec<String> {
    fn from(set: OrderedSet) -> Self {
        set.items
    }
}

impl FromIterator<String> for OrderedSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().unique().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a OrderedSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl OrderedSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the item is in the set.
    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }

    /// Append the item if absent. Returns `true` if the set changed.
    pub fn insert(&mut self, item: impl Into<String>) -> bool {
        let item = item.into();
        if self.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Remove the item if present. Returns `true` if the set changed.
    pub fn remove(&mut self, item: &str) -> bool {
        let len = self.items.len();
        self.items.retain(|i| i != item);
        self.items.len() != len
    }

    /// Items of `self` followed by the items of `other` not in `self`.
    pub fn union(&self, other: &OrderedSet) -> OrderedSet {
        self.items.iter().chain(other.items.iter()).cloned().collect()
    }

    /// Items of `self` not in `other`, in the order of `self`.
    pub fn difference(&self, other: &OrderedSet) -> OrderedSet {
        Self {
            items: self.items.iter().filter(|i| !other.contains(i)).cloned().collect(),
        }
    }

    /// Returns `true` if both sets hold the same items regardless of order.
    pub fn same_items(&self, other: &OrderedSet) -> bool {
        self.len() == other.len() && self.items.iter().all(|i| other.contains(i))
    }

    /// Iterate the items in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.items.iter()
    }

    /// Count of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The items as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    /// Consume the set into its items.
    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}
