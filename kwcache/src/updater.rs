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

//! Maintenance of the forward (`keyword -> keys`) and inverse (`key -> keywords`) indices.
//!
//! Every index read or write runs nested in the reentrancy guard of the operation context, which lets the engine
//! touch reserved keys that callers cannot.

use std::time::Duration;

use kwcache_common::{
    code::StoreValue,
    error::{Error, Result},
    store::Store,
};

use crate::{
    builder::FlushScope,
    cache::KeywordCache,
    context::{nested, OpContext},
    differ::{KeywordMode, KeywordState},
    scheme::{forward_index_key, inverse_index_key, is_reserved},
    set::OrderedSet,
};

impl<S> KeywordCache<S>
where
    S: Store,
{
    /// Reject writes and deletes of reserved keys, unless issued by the engine itself.
    pub(crate) fn ensure_writable(&self, ctx: &OpContext, key: &str) -> Result<()> {
        if !ctx.is_nested() && is_reserved(key) {
            tracing::warn!("[keyword cache]: {} rejects reserved key {key}", self.inner.name);
            return Err(Error::reserved_key(key));
        }
        Ok(())
    }

    pub(crate) async fn put_raw<V>(&self, ctx: &OpContext, key: &str, value: &V, ttl: Option<Duration>) -> Result<()>
    where
        V: StoreValue,
    {
        self.ensure_writable(ctx, key)?;
        self.inner.store.put(key, value, ttl).await
    }

    pub(crate) async fn forget_raw(&self, ctx: &OpContext, key: &str) -> Result<bool> {
        self.ensure_writable(ctx, key)?;
        self.inner.store.forget(key).await
    }

    pub(crate) async fn pull_raw<V>(&self, ctx: &OpContext, key: &str) -> Result<Option<V>>
    where
        V: StoreValue,
    {
        self.ensure_writable(ctx, key)?;
        self.inner.store.pull(key).await
    }

    pub(crate) async fn read_index(&self, ctx: &mut OpContext, index_key: &str) -> Result<OrderedSet> {
        let members = nested!(ctx, self.inner.store.get::<OrderedSet>(index_key).await)?;
        Ok(members.unwrap_or_default())
    }

    async fn write_index(
        &self,
        ctx: &mut OpContext,
        index_key: &str,
        members: &OrderedSet,
        ttl: Option<Duration>,
    ) -> Result<()> {
        nested!(ctx, self.put_raw(ctx, index_key, members, ttl).await)
    }

    async fn forget_index(&self, ctx: &mut OpContext, index_key: &str) -> Result<bool> {
        nested!(ctx, self.forget_raw(ctx, index_key).await)
    }

    async fn pull_index(&self, ctx: &mut OpContext, index_key: &str) -> Result<OrderedSet> {
        let members = nested!(ctx, self.pull_raw::<OrderedSet>(ctx, index_key).await)?;
        Ok(members.unwrap_or_default())
    }

    /// Keyword state of the key for the requested keywords, memoized for the rest of the operation.
    pub(crate) async fn snapshot(
        &self,
        ctx: &mut OpContext,
        key: &str,
        requested: &OrderedSet,
        mode: KeywordMode,
    ) -> Result<KeywordState> {
        if let Some(state) = ctx.snapshots.get(key) {
            return Ok(state.clone());
        }
        let old = self.read_index(ctx, &inverse_index_key(key)).await?;
        Ok(Self::force_snapshot(ctx, key, old, requested, mode))
    }

    /// Recompute the keyword state of the key from the given `old` keywords, replacing any memoized one.
    pub(crate) fn force_snapshot(
        ctx: &mut OpContext,
        key: &str,
        old: OrderedSet,
        requested: &OrderedSet,
        mode: KeywordMode,
    ) -> KeywordState {
        let state = KeywordState::diff(old, requested, mode);
        tracing::trace!(
            "[keyword cache]: snapshot of {key}: old: {:?}, new: {:?}, obsolete: {:?}",
            state.old(),
            state.current(),
            state.obsolete()
        );
        ctx.snapshots.insert(key, state.clone());
        state
    }

    /// The memoized state of the key, or the state for the selection of the operation.
    async fn current_snapshot(&self, ctx: &mut OpContext, key: &str) -> Result<KeywordState> {
        let requested = ctx.selection.keywords().clone();
        let mode = ctx.selection.mode();
        self.snapshot(ctx, key, &requested, mode).await
    }

    /// Add the key to the forward index of every keyword it now carries, and remove it from the forward index of
    /// every obsolete keyword.
    ///
    /// Forward indices never expire, so later writes can still find and prune references to expired members.
    pub(crate) async fn update_forward_index(&self, ctx: &mut OpContext, key: &str) -> Result<()> {
        let state = self.current_snapshot(ctx, key).await?;

        for keyword in state.touched().iter() {
            let index_key = forward_index_key(keyword);
            let mut members = self.read_index(ctx, &index_key).await?;

            let mut changed = false;
            if state.current().contains(keyword) {
                changed |= members.insert(key);
            }
            if state.obsolete().contains(keyword) {
                changed |= members.remove(key);
            }
            if !changed {
                continue;
            }

            if members.is_empty() {
                self.forget_index(ctx, &index_key).await?;
                tracing::debug!("[keyword cache]: keyword {keyword} has no member left");
            } else {
                self.write_index(ctx, &index_key, &members, None).await?;
                tracing::debug!("[keyword cache]: keyword {keyword} has {} members", members.len());
            }
        }

        Ok(())
    }

    /// Record the keywords the key now carries, with the same time to live as its value.
    pub(crate) async fn update_inverse_index(&self, ctx: &mut OpContext, key: &str, ttl: Option<Duration>) -> Result<()> {
        let state = self.current_snapshot(ctx, key).await?;
        let index_key = inverse_index_key(key);

        if !state.current().is_empty() {
            self.write_index(ctx, &index_key, state.current(), ttl).await
        } else if !state.old().is_empty() {
            self.forget_index(ctx, &index_key).await.map(|_| ())
        } else {
            Ok(())
        }
    }

    /// Apply the keywords to the key: explicit `keywords`, or the selection of the operation.
    pub(crate) async fn store_keywords(
        &self,
        ctx: &mut OpContext,
        key: &str,
        ttl: Option<Duration>,
        keywords: Option<OrderedSet>,
    ) -> Result<()> {
        let requested = keywords.unwrap_or_else(|| ctx.selection.keywords().clone());
        let mode = ctx.selection.mode();
        let state = self.snapshot(ctx, key, &requested, mode).await?;
        if !state.is_noop() {
            tracing::debug!(
                "[keyword cache]: {key} gains keywords {:?}, loses keywords {:?}",
                state.added(),
                state.obsolete()
            );
        }
        self.update_forward_index(ctx, key).await?;
        self.update_inverse_index(ctx, key, ttl).await
    }

    /// Strip a deleted key from the forward index of every keyword it carried, then drop its inverse index.
    pub(crate) async fn untrack(&self, ctx: &mut OpContext, key: &str) -> Result<()> {
        let index_key = inverse_index_key(key);
        let keywords = self.read_index(ctx, &index_key).await?;
        if keywords.is_empty() {
            return Ok(());
        }

        Self::force_snapshot(ctx, key, keywords, &OrderedSet::new(), KeywordMode::Overwrite);
        self.update_forward_index(ctx, key).await?;
        self.forget_index(ctx, &index_key).await?;
        Ok(())
    }

    /// Delete every key listed under the selected keywords, and strip them from every other keyword they carried.
    pub(crate) async fn flush_keywords(&self, ctx: &mut OpContext) -> Result<()> {
        let selected = ctx.selection.keywords().clone();

        let mut keys = OrderedSet::new();
        for keyword in selected.iter() {
            let members = self.pull_index(ctx, &forward_index_key(keyword)).await?;
            keys = keys.union(&members);
        }

        let mut carried = Vec::with_capacity(keys.len());
        let mut affected = OrderedSet::new();
        for key in keys.iter() {
            let keywords = self.pull_index(ctx, &inverse_index_key(key)).await?;
            affected = affected.union(&keywords);
            carried.push(keywords);
        }

        tracing::debug!(
            "[keyword cache]: flush {} keys of keywords {:?}, affected keywords: {:?}",
            keys.len(),
            selected,
            affected
        );

        for (key, own) in keys.iter().zip(carried) {
            // An expired inverse index leaves no own keywords, fall back to the union.
            let old = match self.inner.flush_scope {
                FlushScope::PerKey if !own.is_empty() => own,
                FlushScope::PerKey | FlushScope::Collective => affected.clone(),
            };
            Self::force_snapshot(ctx, key, old, &OrderedSet::new(), KeywordMode::Overwrite);
            self.update_forward_index(ctx, key).await?;
            nested!(ctx, self.forget_in(ctx, key).await)?;
        }

        Ok(())
    }
}
