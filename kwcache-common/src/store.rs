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

use std::{future::Future, time::Duration};

use crate::{code::StoreValue, error::Result};

/// The key-value store wrapped by the keyword cache.
///
/// Every operation acts on a single string key. Implementations own expiry, serialization and
/// their own resilience; errors are propagated to the caller unchanged.
///
/// Within one caller, a `put` followed by a `get` on the same key must observe the written value.
pub trait Store: Send + Sync + 'static {
    /// Get the value of the key, or `None` if it is absent or expired.
    fn get<V>(&self, key: &str) -> impl Future<Output = Result<Option<V>>> + Send
    where
        V: StoreValue;

    /// Put the value with an optional time to live. `None` means no expiry.
    fn put<V>(&self, key: &str, value: &V, ttl: Option<Duration>) -> impl Future<Output = Result<()>> + Send
    where
        V: StoreValue;

    /// Put the value without expiry.
    fn forever<V>(&self, key: &str, value: &V) -> impl Future<Output = Result<()>> + Send
    where
        V: StoreValue,
    {
        self.put(key, value, None)
    }

    /// Put the value only if the key is absent.
    ///
    /// Returns `true` iff the key was absent and is now set.
    fn add<V>(&self, key: &str, value: &V, ttl: Option<Duration>) -> impl Future<Output = Result<bool>> + Send
    where
        V: StoreValue;

    /// Atomically get and delete the value of the key.
    fn pull<V>(&self, key: &str) -> impl Future<Output = Result<Option<V>>> + Send
    where
        V: StoreValue;

    /// Delete the key. Returns `true` iff the key existed.
    fn forget(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Delete every entry in the store.
    fn flush(&self) -> impl Future<Output = Result<()>> + Send;

    /// Returns `true` if the key exists.
    fn has(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;
}
