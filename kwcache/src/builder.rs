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

use std::sync::Arc;

use kwcache_common::store::Store;

use crate::{
    cache::{Inner, KeywordCache},
    differ::KeywordMode,
};

/// Which keywords a group flush strips from the forward indices of every flushed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushScope {
    /// Each flushed key is stripped from the keywords recorded in its own inverse index.
    ///
    /// A key whose inverse index already expired falls back to the union of the keywords of all flushed keys.
    #[default]
    PerKey,
    /// Each flushed key is stripped from the union of the keywords of all flushed keys.
    ///
    /// Reads the forward index of every affected keyword once per flushed key.
    Collective,
}

/// Keyword cache builder.
#[derive(Debug, Clone)]
pub struct KeywordCacheBuilder {
    name: String,
    keyword_mode: KeywordMode,
    flush_scope: FlushScope,
}

impl Default for KeywordCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordCacheBuilder {
    /// Create a new keyword cache builder.
    pub fn new() -> Self {
        Self {
            name: "kwcache".to_string(),
            keyword_mode: KeywordMode::Overwrite,
            flush_scope: FlushScope::PerKey,
        }
    }

    /// Set the name of the keyword cache instance. The name is attached to the logs.
    ///
    /// Default: `kwcache`.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the mode applied by [`KeywordCache::keywords`] and by writes without declared keywords.
    ///
    /// With [`KeywordMode::Overwrite`], a plain write drops every keyword of the key.
    /// With [`KeywordMode::Merge`], a plain write keeps them.
    ///
    /// Default: [`KeywordMode::Overwrite`].
    pub fn with_keyword_mode(mut self, keyword_mode: KeywordMode) -> Self {
        self.keyword_mode = keyword_mode;
        self
    }

    /// Set the flush scope.
    ///
    /// Default: [`FlushScope::PerKey`].
    pub fn with_flush_scope(mut self, flush_scope: FlushScope) -> Self {
        self.flush_scope = flush_scope;
        self
    }

    /// Build the keyword cache over the store.
    pub fn build<S>(self, store: S) -> KeywordCache<S>
    where
        S: Store,
    {
        tracing::debug!(
            "[keyword cache]: build {} with keyword mode {:?}, flush scope {:?}",
            self.name,
            self.keyword_mode,
            self.flush_scope
        );
        KeywordCache {
            inner: Arc::new(Inner {
                name: self.name,
                store,
                keyword_mode: self.keyword_mode,
                flush_scope: self.flush_scope,
            }),
        }
    }
}
