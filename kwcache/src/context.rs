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

use crate::{
    differ::{KeywordMode, Snapshots},
    set::OrderedSet,
};

/// Keywords declared for the next dispatched operation.
#[derive(Debug, Clone, Default)]
pub(crate) struct Selection {
    keywords: OrderedSet,
    mode: KeywordMode,
}

impl Selection {
    pub(crate) fn new(keywords: OrderedSet, mode: KeywordMode) -> Self {
        Self { keywords, mode }
    }

    pub(crate) fn keywords(&self) -> &OrderedSet {
        &self.keywords
    }

    pub(crate) fn mode(&self) -> KeywordMode {
        self.mode
    }

    pub(crate) fn extend(&mut self, keywords: OrderedSet) {
        self.keywords = self.keywords.union(&keywords);
    }

    pub(crate) fn set_mode(&mut self, mode: KeywordMode) {
        self.mode = mode;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    fn clear(&mut self) {
        self.keywords = OrderedSet::new();
    }
}

/// Nesting depth of the index operations issued by the engine itself.
///
/// While nested, reserved key checks are skipped and the selection is not reset.
#[derive(Debug, Default)]
pub(crate) struct ReentrancyGuard {
    depth: usize,
}

impl ReentrancyGuard {
    pub(crate) fn enter(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn exit(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced reentrancy guard");
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn is_nested(&self) -> bool {
        self.depth > 0
    }
}

/// State of one logical operation, threaded by `&mut` through every internal call and dropped when the public
/// call returns.
#[derive(Debug, Default)]
pub(crate) struct OpContext {
    pub(crate) selection: Selection,
    pub(crate) snapshots: Snapshots,
    pub(crate) guard: ReentrancyGuard,
}

impl OpContext {
    pub(crate) fn new(selection: Selection) -> Self {
        Self {
            selection,
            snapshots: Snapshots::default(),
            guard: ReentrancyGuard::default(),
        }
    }

    pub(crate) fn is_nested(&self) -> bool {
        self.guard.is_nested()
    }

    /// Consume the selection at the end of a dispatched operation.
    ///
    /// No-op while nested, the outer operation still needs its selection and snapshots.
    pub(crate) fn reset(&mut self) {
        if self.is_nested() {
            return;
        }
        self.selection.clear();
        self.snapshots.clear();
    }
}

/// Evaluate `$body` one level deeper in the reentrancy guard of `$ctx`.
///
/// The guard is left before the result is returned, so `$body` must not use `?` or `return` to escape.
macro_rules! nested {
    ($ctx:expr, $body:expr) => {{
        $ctx.guard.enter();
        let result = $body;
        $ctx.guard.exit();
        result
    }};
}

pub(crate) use nested;
