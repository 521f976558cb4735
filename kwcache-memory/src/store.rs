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

use std::{
    fmt::Debug,
    future::{ready, Future},
    hash::BuildHasher,
    sync::Arc,
    time::Duration,
};

use ahash::RandomState;
use bytes::Bytes;
use hashbrown::HashMap;
use kwcache_common::{
    code::{self, StoreValue},
    error::Result,
    store::Store,
};
use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct Slot {
    value: Bytes,
    expire_at: Option<Instant>,
}

impl Slot {
    fn new(value: Bytes, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expire_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expire_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default)]
struct Shard {
    slots: HashMap<String, Slot>,
}

impl Shard {
    /// Drop the slot of the key if it has expired, so the following lookups only see live slots.
    fn evict_expired(&mut self, key: &str, now: Instant) {
        if self.slots.get(key).is_some_and(|slot| slot.is_expired(now)) {
            self.slots.remove(key);
        }
    }

    fn get(&mut self, key: &str, now: Instant) -> Option<&Slot> {
        self.evict_expired(key, now);
        self.slots.get(key)
    }

    fn remove(&mut self, key: &str, now: Instant) -> Option<Slot> {
        self.evict_expired(key, now);
        self.slots.remove(key)
    }
}

struct Inner<S> {
    name: String,
    shards: Vec<Mutex<Shard>>,
    hash_builder: S,
}

/// In-memory store builder.
pub struct MemoryStoreBuilder<S = RandomState> {
    name: String,
    shards: usize,
    hash_builder: S,
}

impl Default for MemoryStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreBuilder {
    /// Create a new in-memory store builder.
    pub fn new() -> Self {
        Self {
            name: "kwcache-memory".to_string(),
            shards: 8,
            hash_builder: RandomState::default(),
        }
    }
}

impl<S> MemoryStoreBuilder<S>
where
    S: BuildHasher + Send + Sync + 'static,
{
    /// Set the name of the store instance.
    ///
    /// Default: `kwcache-memory`.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set sharding count. Keys are distributed to different shards based on their hash.
    /// Operations on different shards can be parallelized.
    ///
    /// Default: `8`.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Set the hash builder used to pick shards.
    pub fn with_hash_builder<OS>(self, hash_builder: OS) -> MemoryStoreBuilder<OS>
    where
        OS: BuildHasher + Send + Sync + 'static,
    {
        MemoryStoreBuilder {
            name: self.name,
            shards: self.shards,
            hash_builder,
        }
    }

    /// Build the in-memory store.
    pub fn build(self) -> MemoryStore<S> {
        let shards = self.shards.max(1);
        tracing::debug!("[memory store]: build store {} with {shards} shards", self.name);
        MemoryStore {
            inner: Arc::new(Inner {
                name: self.name,
                shards: (0..shards).map(|_| Mutex::new(Shard::default())).collect(),
                hash_builder: self.hash_builder,
            }),
        }
    }
}

/// A sharded in-memory store.
///
/// Values are encoded with the shared codec, so any serde value can be stored and read back as a compatible type.
/// Expired entries are treated as absent and reclaimed lazily on access.
pub struct MemoryStore<S = RandomState> {
    inner: Arc<Inner<S>>,
}

impl<S> Debug for MemoryStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("name", &self.inner.name)
            .field("shards", &self.inner.shards.len())
            .finish()
    }
}

impl<S> Clone for MemoryStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStoreBuilder::new().build()
    }
}

impl MemoryStore {
    /// Create an in-memory store with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> MemoryStore<S>
where
    S: BuildHasher + Send + Sync + 'static,
{
    /// Name of the store instance.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Count of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .shards
            .iter()
            .map(|shard| shard.lock().slots.values().filter(|slot| !slot.is_expired(now)).count())
            .sum()
    }

    /// Returns `true` if the store holds no live entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shard(&self, key: &str) -> &Mutex<Shard> {
        let hash = self.inner.hash_builder.hash_one(key);
        &self.inner.shards[hash as usize % self.inner.shards.len()]
    }

    fn get_sync<V: StoreValue>(&self, key: &str) -> Result<Option<V>> {
        let value = self.shard(key).lock().get(key, Instant::now()).map(|slot| slot.value.clone());
        match value {
            Some(buf) => Ok(Some(code::decode(&buf)?)),
            None => Ok(None),
        }
    }

    fn put_sync<V: StoreValue>(&self, key: &str, value: &V, ttl: Option<Duration>) -> Result<()> {
        if ttl.is_some_and(|ttl| ttl.is_zero()) {
            self.shard(key).lock().slots.remove(key);
            return Ok(());
        }
        let buf = code::encode(value)?;
        self.shard(key).lock().slots.insert(key.to_string(), Slot::new(buf, ttl));
        Ok(())
    }

    fn add_sync<V: StoreValue>(&self, key: &str, value: &V, ttl: Option<Duration>) -> Result<bool> {
        if ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Ok(false);
        }
        let buf = code::encode(value)?;
        let mut shard = self.shard(key).lock();
        if shard.get(key, Instant::now()).is_some() {
            return Ok(false);
        }
        shard.slots.insert(key.to_string(), Slot::new(buf, ttl));
        Ok(true)
    }

    fn pull_sync<V: StoreValue>(&self, key: &str) -> Result<Option<V>> {
        let mut shard = self.shard(key).lock();
        let Some(slot) = shard.get(key, Instant::now()) else {
            return Ok(None);
        };
        // Keep the entry if it cannot be read back as `V`.
        let value = code::decode(&slot.value)?;
        shard.slots.remove(key);
        Ok(Some(value))
    }

    fn forget_sync(&self, key: &str) -> bool {
        self.shard(key).lock().remove(key, Instant::now()).is_some()
    }

    fn flush_sync(&self) {
        for shard in self.inner.shards.iter() {
            shard.lock().slots.clear();
        }
        tracing::debug!("[memory store]: store {} flushed", self.inner.name);
    }

    fn has_sync(&self, key: &str) -> bool {
        self.shard(key).lock().get(key, Instant::now()).is_some()
    }
}

impl<S> Store for MemoryStore<S>
where
    S: BuildHasher + Send + Sync + 'static,
{
    fn get<V>(&self, key: &str) -> impl Future<Output = Result<Option<V>>> + Send
    where
        V: StoreValue,
    {
        ready(self.get_sync(key))
    }

    fn put<V>(&self, key: &str, value: &V, ttl: Option<Duration>) -> impl Future<Output = Result<()>> + Send
    where
        V: StoreValue,
    {
        ready(self.put_sync(key, value, ttl))
    }

    fn add<V>(&self, key: &str, value: &V, ttl: Option<Duration>) -> impl Future<Output = Result<bool>> + Send
    where
        V: StoreValue,
    {
        ready(self.add_sync(key, value, ttl))
    }

    fn pull<V>(&self, key: &str) -> impl Future<Output = Result<Option<V>>> + Send
    where
        V: StoreValue,
    {
        ready(self.pull_sync(key))
    }

    fn forget(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        ready(Ok(self.forget_sync(key)))
    }

    fn flush(&self) -> impl Future<Output = Result<()>> + Send {
        self.flush_sync();
        ready(Ok(()))
    }

    fn has(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        ready(Ok(self.has_sync(key)))
    }
}
