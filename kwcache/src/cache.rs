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

use std::{fmt::Debug, future::Future, sync::Arc, time::Duration};

use futures_util::future::try_join_all;
use kwcache_common::{code::StoreValue, error::Result, store::Store};

use crate::{
    builder::{FlushScope, KeywordCacheBuilder},
    context::{OpContext, Selection},
    differ::KeywordMode,
    keyword::{canonicalize, Keyword},
    scheme::{forward_index_key, inverse_index_key},
    set::OrderedSet,
};

pub(crate) struct Inner<S> {
    pub(crate) name: String,
    pub(crate) store: S,
    pub(crate) keyword_mode: KeywordMode,
    pub(crate) flush_scope: FlushScope,
}

/// A cache whose entries can be tagged with keywords and invalidated by keyword.
///
/// Every write may tag its key with keywords declared through [`KeywordCache::keywords`],
/// [`KeywordCache::merge_keywords`] or [`KeywordCache::overwrite_keywords`]. The keyword indices live in the wrapped
/// store next to the entries:
///
/// - `keyword[<keyword>]` lists the keys tagged with the keyword, and never expires.
/// - `keyword_index[<key>]` lists the keywords of the key, and expires with the entry.
///
/// Keys of these shapes are reserved: writing or deleting them through the cache fails with
/// [`ErrorKind::ReservedKey`](kwcache_common::error::ErrorKind::ReservedKey). Reading them is allowed.
///
/// The handle is cheap to clone. Each call carries its own keyword selection, so a shared handle can be used from
/// concurrent tasks. Concurrent writers sharing a keyword may still race on its forward index, since the index is
/// updated by read-modify-write on the store.
///
/// ```rust
/// # use std::time::Duration;
/// # use kwcache::{KeywordCache, memory::MemoryStore};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> kwcache::common::error::Result<()> {
/// let cache = KeywordCache::new(MemoryStore::new());
///
/// cache.keywords(["users", "team:1"]).put("user:1", &"alice".to_string(), Duration::from_secs(60)).await?;
/// cache.keywords(["users"]).put("user:2", &"bob".to_string(), Duration::from_secs(60)).await?;
///
/// cache.keywords(["team:1"]).flush().await?;
/// assert!(!cache.has("user:1").await?);
/// assert_eq!(cache.keys_of("users").await?, vec!["user:2".to_string()]);
/// # Ok(())
/// # }
/// ```
pub struct KeywordCache<S> {
    pub(crate) inner: Arc<Inner<S>>,
}

impl<S> Debug for KeywordCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordCache")
            .field("name", &self.inner.name)
            .field("keyword_mode", &self.inner.keyword_mode)
            .field("flush_scope", &self.inner.flush_scope)
            .finish()
    }
}

impl<S> Clone for KeywordCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> KeywordCache<S>
where
    S: Store,
{
    /// Create a keyword cache over the store with the default configuration.
    pub fn new(store: S) -> Self {
        KeywordCacheBuilder::new().build(store)
    }

    /// Name of the keyword cache instance.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    fn select(&self, keywords: OrderedSet, mode: KeywordMode) -> Tagged<'_, S> {
        Tagged {
            cache: self,
            selection: Selection::new(keywords, mode),
        }
    }

    fn untagged(&self) -> Tagged<'_, S> {
        self.select(OrderedSet::new(), self.inner.keyword_mode)
    }

    /// Declare the keywords of the next operation, with the configured keyword mode.
    pub fn keywords<I>(&self, keywords: I) -> Tagged<'_, S>
    where
        I: IntoIterator,
        I::Item: Keyword,
    {
        self.select(canonicalize(keywords), self.inner.keyword_mode)
    }

    /// Declare keywords to add to the keywords the written keys already carry.
    pub fn merge_keywords<I>(&self, keywords: I) -> Tagged<'_, S>
    where
        I: IntoIterator,
        I::Item: Keyword,
    {
        self.select(canonicalize(keywords), KeywordMode::Merge)
    }

    /// Declare keywords to replace the keywords the written keys already carry.
    pub fn overwrite_keywords<I>(&self, keywords: I) -> Tagged<'_, S>
    where
        I: IntoIterator,
        I::Item: Keyword,
    {
        self.select(canonicalize(keywords), KeywordMode::Overwrite)
    }

    /// Get the value of the key.
    pub async fn get<V: StoreValue>(&self, key: &str) -> Result<Option<V>> {
        self.untagged().get(key).await
    }

    /// Get the value of the key, or `default` if absent.
    pub async fn get_or<V: StoreValue>(&self, key: &str, default: V) -> Result<V> {
        self.untagged().get_or(key, default).await
    }

    /// Get the values of the keys, in order.
    pub async fn many<V, K>(&self, keys: impl IntoIterator<Item = K>) -> Result<Vec<Option<V>>>
    where
        V: StoreValue,
        K: AsRef<str>,
    {
        self.untagged().many(keys).await
    }

    /// Returns `true` if the key exists.
    pub async fn has(&self, key: &str) -> Result<bool> {
        self.untagged().has(key).await
    }

    /// Get and delete the value of the key.
    pub async fn pull<V: StoreValue>(&self, key: &str) -> Result<Option<V>> {
        self.untagged().pull(key).await
    }

    /// Get and delete the value of the key, or `default` if absent.
    pub async fn pull_or<V: StoreValue>(&self, key: &str, default: V) -> Result<V> {
        self.untagged().pull_or(key, default).await
    }

    /// Put the value with a time to live. A zero `ttl` forgets the key.
    pub async fn put<V: StoreValue>(&self, key: &str, value: &V, ttl: Duration) -> Result<()> {
        self.untagged().put(key, value, ttl).await
    }

    /// Put every entry with the same time to live.
    pub async fn put_many<V, K>(&self, entries: impl IntoIterator<Item = (K, V)>, ttl: Duration) -> Result<()>
    where
        V: StoreValue,
        K: AsRef<str>,
    {
        self.untagged().put_many(entries, ttl).await
    }

    /// Put the value only if the key is absent. Returns `true` if the key was created.
    pub async fn add<V: StoreValue>(&self, key: &str, value: &V, ttl: Duration) -> Result<bool> {
        self.untagged().add(key, value, ttl).await
    }

    /// Put the value without expiry.
    pub async fn forever<V: StoreValue>(&self, key: &str, value: &V) -> Result<()> {
        self.untagged().forever(key, value).await
    }

    /// Get the value of the key, or compute, put and return it if absent.
    pub async fn remember<V, F, FU>(&self, key: &str, ttl: Duration, f: F) -> Result<V>
    where
        V: StoreValue,
        F: FnOnce() -> FU,
        FU: Future<Output = Result<V>>,
    {
        self.untagged().remember(key, ttl, f).await
    }

    /// Get the value of the key, or compute, put without expiry and return it if absent.
    pub async fn remember_forever<V, F, FU>(&self, key: &str, f: F) -> Result<V>
    where
        V: StoreValue,
        F: FnOnce() -> FU,
        FU: Future<Output = Result<V>>,
    {
        self.untagged().remember_forever(key, f).await
    }

    /// Alias of [`KeywordCache::remember_forever`].
    pub async fn sear<V, F, FU>(&self, key: &str, f: F) -> Result<V>
    where
        V: StoreValue,
        F: FnOnce() -> FU,
        FU: Future<Output = Result<V>>,
    {
        self.untagged().sear(key, f).await
    }

    /// Delete the key and untag it. Returns `true` if the key existed.
    pub async fn forget(&self, key: &str) -> Result<bool> {
        self.untagged().forget(key).await
    }

    /// Delete every entry of the store.
    ///
    /// Use [`Tagged::flush`] to delete only the entries tagged with some keywords.
    pub async fn flush(&self) -> Result<()> {
        self.untagged().flush().await
    }

    /// Keys currently tagged with the keyword.
    pub async fn keys_of<K: Keyword>(&self, keyword: K) -> Result<Vec<String>> {
        let mut ctx = OpContext::default();
        let keys = self.read_index(&mut ctx, &forward_index_key(&keyword.to_keyword())).await?;
        Ok(keys.into_vec())
    }

    /// Keywords the key is currently tagged with.
    pub async fn keywords_of(&self, key: &str) -> Result<Vec<String>> {
        let mut ctx = OpContext::default();
        let keywords = self.read_index(&mut ctx, &inverse_index_key(key)).await?;
        Ok(keywords.into_vec())
    }

    pub(crate) async fn get_in<V: StoreValue>(&self, ctx: &mut OpContext, key: &str) -> Result<Option<V>> {
        let value = self.inner.store.get(key).await?;
        ctx.reset();
        Ok(value)
    }

    pub(crate) async fn has_in(&self, ctx: &mut OpContext, key: &str) -> Result<bool> {
        let exists = self.inner.store.has(key).await?;
        ctx.reset();
        Ok(exists)
    }

    pub(crate) async fn pull_in<V: StoreValue>(&self, ctx: &mut OpContext, key: &str) -> Result<Option<V>> {
        let value = self.pull_raw(ctx, key).await?;
        if value.is_some() && !ctx.is_nested() {
            self.untrack(ctx, key).await?;
        }
        ctx.reset();
        Ok(value)
    }

    pub(crate) async fn put_in<V: StoreValue>(
        &self,
        ctx: &mut OpContext,
        key: &str,
        value: &V,
        ttl: Option<Duration>,
    ) -> Result<()> {
        if ttl.is_some_and(|ttl| ttl.is_zero()) {
            return self.forget_in(ctx, key).await.map(|_| ());
        }
        self.ensure_writable(ctx, key)?;
        self.store_keywords(ctx, key, ttl, None).await?;
        self.put_raw(ctx, key, value, ttl).await?;
        ctx.reset();
        Ok(())
    }

    pub(crate) async fn add_in<V: StoreValue>(
        &self,
        ctx: &mut OpContext,
        key: &str,
        value: &V,
        ttl: Option<Duration>,
    ) -> Result<bool> {
        self.ensure_writable(ctx, key)?;
        let keywords = ctx.selection.keywords().clone();
        let created = self.inner.store.add(key, value, ttl).await?;
        if created {
            self.store_keywords(ctx, key, ttl, Some(keywords)).await?;
        }
        ctx.reset();
        Ok(created)
    }

    pub(crate) async fn remember_in<V, F, FU>(
        &self,
        ctx: &mut OpContext,
        key: &str,
        ttl: Option<Duration>,
        f: F,
    ) -> Result<V>
    where
        V: StoreValue,
        F: FnOnce() -> FU,
        FU: Future<Output = Result<V>>,
    {
        if let Some(value) = self.inner.store.get(key).await? {
            ctx.reset();
            return Ok(value);
        }

        self.ensure_writable(ctx, key)?;
        let value = f().await?;
        if ttl.is_some_and(|ttl| ttl.is_zero()) {
            ctx.reset();
            return Ok(value);
        }
        self.store_keywords(ctx, key, ttl, None).await?;
        self.put_raw(ctx, key, &value, ttl).await?;
        ctx.reset();
        Ok(value)
    }

    pub(crate) async fn forget_in(&self, ctx: &mut OpContext, key: &str) -> Result<bool> {
        let existed = self.forget_raw(ctx, key).await?;
        if existed && !ctx.is_nested() {
            self.untrack(ctx, key).await?;
        }
        ctx.reset();
        Ok(existed)
    }

    pub(crate) async fn flush_in(&self, ctx: &mut OpContext) -> Result<()> {
        if ctx.selection.is_empty() {
            self.inner.store.flush().await?;
            tracing::debug!("[keyword cache]: {} flushed the whole store", self.inner.name);
        } else {
            self.flush_keywords(ctx).await?;
        }
        ctx.reset();
        Ok(())
    }
}

/// A keyword selection bound to a keyword cache, consumed by the next operation.
///
/// Created by [`KeywordCache::keywords`], [`KeywordCache::merge_keywords`] and [`KeywordCache::overwrite_keywords`].
#[must_use = "keywords are only applied by a following cache operation"]
pub struct Tagged<'a, S> {
    cache: &'a KeywordCache<S>,
    selection: Selection,
}

impl<S> Debug for Tagged<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tagged")
            .field("cache", &self.cache.inner.name)
            .field("keywords", self.selection.keywords())
            .field("mode", &self.selection.mode())
            .finish()
    }
}

impl<'a, S> Tagged<'a, S>
where
    S: Store,
{
    /// Declare more keywords for the same operation.
    pub fn keywords<I>(mut self, keywords: I) -> Self
    where
        I: IntoIterator,
        I::Item: Keyword,
    {
        self.selection.extend(canonicalize(keywords));
        self
    }

    /// Switch the selection to merge mode.
    pub fn merge(mut self) -> Self {
        self.selection.set_mode(KeywordMode::Merge);
        self
    }

    /// Switch the selection to overwrite mode.
    pub fn overwrite(mut self) -> Self {
        self.selection.set_mode(KeywordMode::Overwrite);
        self
    }

    /// The canonical keywords declared so far.
    pub fn selected(&self) -> &[String] {
        self.selection.keywords().as_slice()
    }

    /// The keyword mode of the selection.
    pub fn mode(&self) -> KeywordMode {
        self.selection.mode()
    }

    fn into_context(self) -> (&'a KeywordCache<S>, OpContext) {
        (self.cache, OpContext::new(self.selection))
    }

    /// Get the value of the key. The selection is discarded.
    pub async fn get<V: StoreValue>(self, key: &str) -> Result<Option<V>> {
        let (cache, mut ctx) = self.into_context();
        cache.get_in(&mut ctx, key).await
    }

    /// Get the value of the key, or `default` if absent. The selection is discarded.
    pub async fn get_or<V: StoreValue>(self, key: &str, default: V) -> Result<V> {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    /// Get the values of the keys, in order. The selection is discarded.
    pub async fn many<V, K>(self, keys: impl IntoIterator<Item = K>) -> Result<Vec<Option<V>>>
    where
        V: StoreValue,
        K: AsRef<str>,
    {
        let (cache, mut ctx) = self.into_context();
        let keys = keys.into_iter().collect::<Vec<_>>();
        let values = try_join_all(keys.iter().map(|key| cache.inner.store.get::<V>(key.as_ref()))).await?;
        ctx.reset();
        Ok(values)
    }

    /// Returns `true` if the key exists. The selection is discarded.
    pub async fn has(self, key: &str) -> Result<bool> {
        let (cache, mut ctx) = self.into_context();
        cache.has_in(&mut ctx, key).await
    }

    /// Get and delete the value of the key, untagging it.
    pub async fn pull<V: StoreValue>(self, key: &str) -> Result<Option<V>> {
        let (cache, mut ctx) = self.into_context();
        cache.pull_in(&mut ctx, key).await
    }

    /// Get and delete the value of the key, or `default` if absent.
    pub async fn pull_or<V: StoreValue>(self, key: &str, default: V) -> Result<V> {
        Ok(self.pull(key).await?.unwrap_or(default))
    }

    /// Put the value with a time to live and tag the key with the selection. A zero `ttl` forgets the key.
    pub async fn put<V: StoreValue>(self, key: &str, value: &V, ttl: Duration) -> Result<()> {
        let (cache, mut ctx) = self.into_context();
        cache.put_in(&mut ctx, key, value, Some(ttl)).await
    }

    /// Put every entry with the same time to live and tag every key with the selection.
    ///
    /// Entries are written in order. Reserved keys fail the call before any later entry is written.
    pub async fn put_many<V, K>(self, entries: impl IntoIterator<Item = (K, V)>, ttl: Duration) -> Result<()>
    where
        V: StoreValue,
        K: AsRef<str>,
    {
        let (cache, mut ctx) = self.into_context();
        let selection = ctx.selection.clone();
        for (key, value) in entries {
            // Every entry consumes the selection, restore it for the next one.
            ctx.selection = selection.clone();
            cache.put_in(&mut ctx, key.as_ref(), &value, Some(ttl)).await?;
        }
        Ok(())
    }

    /// Put the value only if the key is absent, and tag the key only if it was created.
    pub async fn add<V: StoreValue>(self, key: &str, value: &V, ttl: Duration) -> Result<bool> {
        let (cache, mut ctx) = self.into_context();
        cache.add_in(&mut ctx, key, value, Some(ttl)).await
    }

    /// Put the value without expiry and tag the key with the selection.
    pub async fn forever<V: StoreValue>(self, key: &str, value: &V) -> Result<()> {
        let (cache, mut ctx) = self.into_context();
        cache.put_in(&mut ctx, key, value, None).await
    }

    /// Get the value of the key, or compute, put and return it if absent.
    ///
    /// The key is tagged with the selection only if the value is computed. A failed computation writes nothing.
    pub async fn remember<V, F, FU>(self, key: &str, ttl: Duration, f: F) -> Result<V>
    where
        V: StoreValue,
        F: FnOnce() -> FU,
        FU: Future<Output = Result<V>>,
    {
        let (cache, mut ctx) = self.into_context();
        cache.remember_in(&mut ctx, key, Some(ttl), f).await
    }

    /// Get the value of the key, or compute, put without expiry and return it if absent.
    pub async fn remember_forever<V, F, FU>(self, key: &str, f: F) -> Result<V>
    where
        V: StoreValue,
        F: FnOnce() -> FU,
        FU: Future<Output = Result<V>>,
    {
        let (cache, mut ctx) = self.into_context();
        cache.remember_in(&mut ctx, key, None, f).await
    }

    /// Alias of [`Tagged::remember_forever`].
    pub async fn sear<V, F, FU>(self, key: &str, f: F) -> Result<V>
    where
        V: StoreValue,
        F: FnOnce() -> FU,
        FU: Future<Output = Result<V>>,
    {
        self.remember_forever(key, f).await
    }

    /// Delete the key and untag it. The selection is discarded. Returns `true` if the key existed.
    pub async fn forget(self, key: &str) -> Result<bool> {
        let (cache, mut ctx) = self.into_context();
        cache.forget_in(&mut ctx, key).await
    }

    /// Delete every entry tagged with any selected keyword, and untag the deleted keys from every keyword they
    /// carried.
    ///
    /// With an empty selection, every entry of the store is deleted.
    pub async fn flush(self) -> Result<()> {
        let (cache, mut ctx) = self.into_context();
        cache.flush_in(&mut ctx).await
    }
}
