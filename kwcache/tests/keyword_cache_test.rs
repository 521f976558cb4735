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

//! Behavior tests of the keyword cache over the in-memory store.

use std::{
    borrow::Cow,
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use kwcache::{
    Error, ErrorKind, FlushScope, Keyword, KeywordCache, KeywordCacheBuilder, KeywordMode, MemoryStore, Result, Store,
    StoreValue,
};

const TTL: Duration = Duration::from_secs(60);

fn cache() -> KeywordCache<MemoryStore> {
    KeywordCache::new(MemoryStore::new())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

async fn raw(cache: &KeywordCache<impl Store>, key: &str) -> Option<Vec<String>> {
    cache.get::<Vec<String>>(key).await.unwrap()
}

async fn sorted(cache: &KeywordCache<impl Store>, key: &str) -> Option<Vec<String>> {
    raw(cache, key).await.map(|mut v| {
        v.sort();
        v
    })
}

#[test_log::test(tokio::test)]
async fn test_tag_on_put() {
    let cache = cache();
    cache.keywords(["k1", "k2"]).put("a", &1u64, TTL).await.unwrap();

    assert_eq!(cache.get::<u64>("a").await.unwrap(), Some(1));
    assert_eq!(raw(&cache, "keyword[k1]").await, Some(strings(&["a"])));
    assert_eq!(raw(&cache, "keyword[k2]").await, Some(strings(&["a"])));
    assert_eq!(raw(&cache, "keyword_index[a]").await, Some(strings(&["k1", "k2"])));
}

#[test_log::test(tokio::test)]
async fn test_flush_by_shared_keyword() {
    let cache = cache();
    cache.keywords(["k1", "k2"]).put("a", &1u64, TTL).await.unwrap();
    cache.keywords(["k2", "k3"]).put("b", &2u64, TTL).await.unwrap();
    cache.keywords(["k4"]).put("c", &3u64, TTL).await.unwrap();

    cache.keywords(["k2"]).flush().await.unwrap();

    assert!(!cache.has("a").await.unwrap());
    assert!(!cache.has("b").await.unwrap());
    assert!(cache.has("c").await.unwrap());
    for keyword in ["k1", "k2", "k3"] {
        assert_eq!(raw(&cache, &format!("keyword[{keyword}]")).await, None);
    }
    assert_eq!(raw(&cache, "keyword_index[a]").await, None);
    assert_eq!(raw(&cache, "keyword_index[b]").await, None);
    assert_eq!(cache.keys_of("k4").await.unwrap(), strings(&["c"]));
}

#[test_log::test(tokio::test)]
async fn test_flush_only_reaches_members() {
    let cache = cache();
    cache.keywords(["w1", "w2"]).put("k1", &1u64, TTL).await.unwrap();
    cache.keywords(["w2", "w3"]).put("k2", &2u64, TTL).await.unwrap();

    cache.keywords(["w1"]).flush().await.unwrap();

    // `k2` is not listed under `w1`, it survives with its own keywords intact.
    assert!(!cache.has("k1").await.unwrap());
    assert!(cache.has("k2").await.unwrap());
    assert_eq!(cache.keys_of("w2").await.unwrap(), strings(&["k2"]));
    assert_eq!(cache.keys_of("w3").await.unwrap(), strings(&["k2"]));
    assert_eq!(cache.keys_of("w1").await.unwrap(), Vec::<String>::new());
}

#[test_log::test(tokio::test)]
async fn test_overwrite_keywords() {
    let cache = cache();
    cache.keywords(["t"]).put("x", &1u64, TTL).await.unwrap();
    cache.overwrite_keywords(["t2"]).put("x", &2u64, TTL).await.unwrap();

    assert_eq!(raw(&cache, "keyword[t]").await, None);
    assert_eq!(raw(&cache, "keyword[t2]").await, Some(strings(&["x"])));
    assert_eq!(cache.get::<u64>("x").await.unwrap(), Some(2));
}

#[test_log::test(tokio::test)]
async fn test_overwrite_replaces_every_keyword() {
    let cache = cache();
    cache.keywords(["a", "b"]).put("k", &1u64, TTL).await.unwrap();
    cache.overwrite_keywords(["c"]).put("k", &1u64, TTL).await.unwrap();

    assert_eq!(raw(&cache, "keyword[a]").await, None);
    assert_eq!(raw(&cache, "keyword[b]").await, None);
    assert_eq!(raw(&cache, "keyword[c]").await, Some(strings(&["k"])));
    assert_eq!(cache.keywords_of("k").await.unwrap(), strings(&["c"]));
}

#[test_log::test(tokio::test)]
async fn test_merge_keywords() {
    let cache = cache();
    cache.keywords(["t2"]).put("x", &1u64, TTL).await.unwrap();
    cache.merge_keywords(["extra"]).put("x", &2u64, TTL).await.unwrap();

    assert_eq!(sorted(&cache, "keyword_index[x]").await, Some(strings(&["extra", "t2"])));
    assert_eq!(cache.keys_of("t2").await.unwrap(), strings(&["x"]));
    assert_eq!(cache.keys_of("extra").await.unwrap(), strings(&["x"]));
}

#[test_log::test(tokio::test)]
async fn test_merge_is_idempotent() {
    let cache = cache();
    cache.keywords(["a"]).put("k", &1u64, TTL).await.unwrap();
    cache.merge_keywords(["b", "c"]).put("k", &1u64, TTL).await.unwrap();
    let once = (
        sorted(&cache, "keyword_index[k]").await,
        raw(&cache, "keyword[b]").await,
        raw(&cache, "keyword[c]").await,
    );

    cache.merge_keywords(["b", "c"]).put("k", &1u64, TTL).await.unwrap();
    let twice = (
        sorted(&cache, "keyword_index[k]").await,
        raw(&cache, "keyword[b]").await,
        raw(&cache, "keyword[c]").await,
    );

    assert_eq!(once, twice);
    assert_eq!(once.0, Some(strings(&["a", "b", "c"])));
}

#[test_log::test(tokio::test)]
async fn test_plain_write_follows_keyword_mode() {
    let cache = cache();
    cache.keywords(["t"]).put("x", &1u64, TTL).await.unwrap();
    cache.put("x", &2u64, TTL).await.unwrap();
    assert_eq!(cache.keywords_of("x").await.unwrap(), Vec::<String>::new());
    assert_eq!(raw(&cache, "keyword[t]").await, None);

    let cache = KeywordCacheBuilder::new()
        .with_keyword_mode(KeywordMode::Merge)
        .build(MemoryStore::new());
    cache.keywords(["t"]).put("x", &1u64, TTL).await.unwrap();
    cache.put("x", &2u64, TTL).await.unwrap();
    assert_eq!(cache.keywords_of("x").await.unwrap(), strings(&["t"]));
    cache.keywords(["u"]).put("x", &3u64, TTL).await.unwrap();
    assert_eq!(cache.keywords_of("x").await.unwrap(), strings(&["t", "u"]));
}

#[test_log::test(tokio::test)]
async fn test_same_keywords_rewrite_is_noop() {
    let cache = cache();
    cache.keywords(["a", "b"]).put("k", &1u64, TTL).await.unwrap();
    cache.keywords(["b", "a", "b"]).put("k", &2u64, TTL).await.unwrap();

    assert_eq!(raw(&cache, "keyword[a]").await, Some(strings(&["k"])));
    assert_eq!(raw(&cache, "keyword[b]").await, Some(strings(&["k"])));
    assert_eq!(sorted(&cache, "keyword_index[k]").await, Some(strings(&["a", "b"])));
}

#[test_log::test(tokio::test)]
async fn test_forget_untags() {
    let cache = cache();
    cache.keywords(["a", "b"]).put("k1", &1u64, TTL).await.unwrap();
    cache.keywords(["b"]).put("k2", &2u64, TTL).await.unwrap();

    assert!(cache.forget("k1").await.unwrap());
    assert!(!cache.forget("k1").await.unwrap());

    assert_eq!(raw(&cache, "keyword[a]").await, None);
    assert_eq!(raw(&cache, "keyword[b]").await, Some(strings(&["k2"])));
    assert_eq!(raw(&cache, "keyword_index[k1]").await, None);
    assert!(cache.has("k2").await.unwrap());
}

#[test_log::test(tokio::test)]
async fn test_forget_matches_single_key_flush() {
    let forgotten = cache();
    let flushed = cache();
    for cache in [&forgotten, &flushed] {
        cache.keywords(["a", "b"]).put("k1", &1u64, TTL).await.unwrap();
        cache.keywords(["b", "c"]).put("k2", &2u64, TTL).await.unwrap();
    }

    forgotten.forget("k1").await.unwrap();
    // `a` only lists `k1`, so flushing it deletes exactly `k1`.
    flushed.keywords(["a"]).flush().await.unwrap();

    for key in ["keyword[a]", "keyword[b]", "keyword[c]", "keyword_index[k1]", "keyword_index[k2]"] {
        assert_eq!(raw(&forgotten, key).await, raw(&flushed, key).await, "{key}");
    }
    assert_eq!(forgotten.has("k1").await.unwrap(), flushed.has("k1").await.unwrap());
}

#[test_log::test(tokio::test)]
async fn test_pull_untags() {
    let cache = cache();
    cache.keywords(["a"]).put("k", &"v".to_string(), TTL).await.unwrap();

    assert_eq!(cache.pull::<String>("k").await.unwrap(), Some("v".to_string()));
    assert_eq!(cache.pull_or::<String>("k", "default".to_string()).await.unwrap(), "default");
    assert_eq!(raw(&cache, "keyword[a]").await, None);
    assert_eq!(raw(&cache, "keyword_index[k]").await, None);
}

#[test_log::test(tokio::test)]
async fn test_add_tags_only_when_created() {
    let cache = cache();
    assert!(cache.keywords(["a"]).add("k", &1u64, TTL).await.unwrap());
    assert!(!cache.keywords(["b"]).add("k", &2u64, TTL).await.unwrap());

    assert_eq!(cache.get::<u64>("k").await.unwrap(), Some(1));
    assert_eq!(cache.keywords_of("k").await.unwrap(), strings(&["a"]));
    assert_eq!(raw(&cache, "keyword[b]").await, None);
}

#[test_log::test(tokio::test)]
async fn test_remember() {
    let cache = cache();
    let calls = Arc::new(AtomicUsize::new(0));

    let compute = |value: u64| {
        let calls = calls.clone();
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Error>(value)
        }
    };

    let v = cache.keywords(["a"]).remember("k", TTL, compute(1)).await.unwrap();
    assert_eq!(v, 1);
    let v = cache.keywords(["b"]).remember("k", TTL, compute(2)).await.unwrap();
    assert_eq!(v, 1);
    let v = cache.keywords(["c"]).sear("s", compute(3)).await.unwrap();
    assert_eq!(v, 3);
    let v = cache.remember_forever("s", compute(4)).await.unwrap();
    assert_eq!(v, 3);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // A hit leaves the index untouched.
    assert_eq!(cache.keywords_of("k").await.unwrap(), strings(&["a"]));
    assert_eq!(raw(&cache, "keyword[b]").await, None);
    assert_eq!(cache.keys_of("c").await.unwrap(), strings(&["s"]));
}

#[test_log::test(tokio::test)]
async fn test_remember_failure_writes_nothing() {
    let cache = cache();
    let res = cache
        .keywords(["a"])
        .remember("k", TTL, || async { Err::<u64, _>(Error::external(std::io::Error::other("db down"))) })
        .await;

    assert_eq!(res.unwrap_err().kind(), ErrorKind::External);
    assert!(!cache.has("k").await.unwrap());
    assert_eq!(raw(&cache, "keyword[a]").await, None);
    assert!(cache.store().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_reserved_keys_are_rejected() {
    let cache = cache();

    for key in ["keyword[x]", "keyword_index[x]"] {
        let check = |res: Result<()>| {
            let err = res.unwrap_err();
            assert!(err.is_reserved_key());
            assert_eq!(err.context_value("key"), Some(key));
        };

        check(cache.keywords(["t"]).put(key, &1u64, TTL).await);
        check(cache.forever(key, &1u64).await);
        check(cache.add(key, &1u64, TTL).await.map(|_| ()));
        check(cache.pull::<u64>(key).await.map(|_| ()));
        check(cache.forget(key).await.map(|_| ()));
        check(cache.remember(key, TTL, || async { Ok(1u64) }).await.map(|_| ()));
        check(cache.put_many([(key, 1u64)], TTL).await);
    }

    assert!(cache.store().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_reserved_keys_are_readable() {
    let cache = cache();
    cache.store().forever("keyword[x]", &strings(&["a"])).await.unwrap();

    assert!(cache.has("keyword[x]").await.unwrap());
    assert_eq!(raw(&cache, "keyword[x]").await, Some(strings(&["a"])));
    // Present keys are returned without any write.
    let v: Vec<String> = cache.remember("keyword[x]", TTL, || async { Ok(vec![]) }).await.unwrap();
    assert_eq!(v, strings(&["a"]));
}

#[test_log::test(tokio::test)]
async fn test_bracket_keywords() {
    let cache = cache();
    cache.keywords(["a]b", "keyword[c]"]).put("k", &1u64, TTL).await.unwrap();

    assert_eq!(cache.keys_of("a]b").await.unwrap(), strings(&["k"]));
    assert_eq!(cache.keys_of("keyword[c]").await.unwrap(), strings(&["k"]));

    cache.keywords(["keyword[c]"]).flush().await.unwrap();
    assert!(!cache.has("k").await.unwrap());
    assert_eq!(cache.keys_of("a]b").await.unwrap(), Vec::<String>::new());
}

struct Team {
    id: u64,
}

impl Keyword for Team {
    fn to_keyword(&self) -> Cow<'_, str> {
        Cow::Owned(format!("team:{}", self.id))
    }
}

#[test_log::test(tokio::test)]
async fn test_domain_keywords() {
    let cache = cache();
    cache.keywords([Team { id: 1 }]).put("a", &1u64, TTL).await.unwrap();
    // A different instance with the same identifier names the same keyword.
    cache.merge_keywords([&Team { id: 1 }]).put("b", &2u64, TTL).await.unwrap();

    assert_eq!(cache.keys_of(Team { id: 1 }).await.unwrap(), strings(&["a", "b"]));
    cache.keywords([Team { id: 1 }]).flush().await.unwrap();
    assert!(!cache.has("a").await.unwrap());
    assert!(!cache.has("b").await.unwrap());
}

#[test_log::test(tokio::test)]
async fn test_flush_all() {
    let cache = cache();
    cache.keywords(["a"]).put("k1", &1u64, TTL).await.unwrap();
    cache.put("k2", &2u64, TTL).await.unwrap();

    cache.flush().await.unwrap();
    assert!(cache.store().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_batch_operations() {
    let cache = cache();
    cache
        .keywords(["batch"])
        .put_many([("a", 1u64), ("b", 2u64), ("a", 3u64)], TTL)
        .await
        .unwrap();

    assert_eq!(
        cache.many::<u64, _>(["a", "b", "c"]).await.unwrap(),
        vec![Some(3), Some(2), None]
    );
    assert_eq!(cache.keys_of("batch").await.unwrap(), strings(&["a", "b"]));
    assert_eq!(cache.keywords_of("a").await.unwrap(), strings(&["batch"]));
}

#[test_log::test(tokio::test)]
async fn test_zero_ttl_forgets() {
    let cache = cache();
    cache.keywords(["a"]).put("k", &1u64, TTL).await.unwrap();
    cache.keywords(["a"]).put("k", &2u64, Duration::ZERO).await.unwrap();

    assert!(!cache.has("k").await.unwrap());
    assert_eq!(raw(&cache, "keyword[a]").await, None);
    assert!(!cache.add("k", &3u64, Duration::ZERO).await.unwrap());
    assert!(cache.store().is_empty());
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_inverse_index_expires_with_entry() {
    let cache = cache();
    cache.keywords(["t"]).put("k", &1u64, Duration::from_secs(10)).await.unwrap();
    cache.keywords(["t"]).forever("f", &2u64).await.unwrap();

    tokio::time::advance(Duration::from_secs(11)).await;

    assert!(!cache.has("k").await.unwrap());
    assert_eq!(cache.keywords_of("k").await.unwrap(), Vec::<String>::new());
    assert_eq!(cache.keywords_of("f").await.unwrap(), strings(&["t"]));
    // The forward index outlives its members, a group flush prunes the stale reference.
    assert_eq!(cache.keys_of("t").await.unwrap(), strings(&["k", "f"]));

    cache.keywords(["t"]).flush().await.unwrap();
    assert_eq!(raw(&cache, "keyword[t]").await, None);
    assert!(!cache.has("f").await.unwrap());
}

#[test_log::test(tokio::test)]
async fn test_collective_flush_scope() {
    for scope in [FlushScope::PerKey, FlushScope::Collective] {
        let cache = KeywordCacheBuilder::new().with_flush_scope(scope).build(MemoryStore::new());
        cache.keywords(["w1", "w2"]).put("k1", &1u64, TTL).await.unwrap();
        cache.keywords(["w1", "w3"]).put("k2", &2u64, TTL).await.unwrap();
        cache.keywords(["w2"]).put("k3", &3u64, TTL).await.unwrap();
        cache.keywords(["w3"]).put("k4", &4u64, TTL).await.unwrap();

        cache.keywords(["w1"]).flush().await.unwrap();

        assert_eq!(cache.keys_of("w2").await.unwrap(), strings(&["k3"]), "{scope:?}");
        assert_eq!(cache.keys_of("w3").await.unwrap(), strings(&["k4"]), "{scope:?}");
        assert!(cache.has("k3").await.unwrap());
        assert!(cache.has("k4").await.unwrap());
    }
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_flush_strips_expired_members() {
    for scope in [FlushScope::PerKey, FlushScope::Collective] {
        let cache = KeywordCacheBuilder::new().with_flush_scope(scope).build(MemoryStore::new());
        cache.keywords(["w1", "w2"]).put("k1", &1u64, Duration::from_secs(10)).await.unwrap();
        cache.keywords(["w1", "w2"]).forever("k2", &2u64).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        // The forward indices still list the expired key.
        assert_eq!(cache.keys_of("w2").await.unwrap(), strings(&["k1", "k2"]), "{scope:?}");

        cache.keywords(["w1"]).flush().await.unwrap();

        assert!(cache.keys_of("w1").await.unwrap().is_empty(), "{scope:?}");
        assert!(cache.keys_of("w2").await.unwrap().is_empty(), "{scope:?}");
        assert_eq!(raw(&cache, "keyword[w2]").await, None, "{scope:?}");
        assert!(!cache.has("k2").await.unwrap());
    }
}

#[test_log::test(tokio::test)]
async fn test_pull_with_wrong_type_keeps_entry_tagged() {
    let cache = cache();
    cache.keywords(["w"]).put("k", &vec![0xffu8, 0xfe], TTL).await.unwrap();

    let err = cache.pull::<String>("k").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Codec);

    // The entry and its index stay in step.
    assert!(cache.has("k").await.unwrap());
    assert_eq!(cache.keys_of("w").await.unwrap(), strings(&["k"]));
    assert_eq!(cache.keywords_of("k").await.unwrap(), strings(&["w"]));

    assert_eq!(cache.pull::<Vec<u8>>("k").await.unwrap(), Some(vec![0xffu8, 0xfe]));
    assert!(cache.keys_of("w").await.unwrap().is_empty());
    assert!(cache.keywords_of("k").await.unwrap().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_tagged_chaining() {
    let cache = cache();
    let tagged = cache.keywords(["a"]).keywords(["b", "a"]).merge();
    assert_eq!(tagged.selected(), &["a", "b"]);
    assert_eq!(tagged.mode(), KeywordMode::Merge);
    tagged.put("k", &1u64, TTL).await.unwrap();

    // A read consumes the selection without touching the index.
    assert_eq!(cache.keywords(["c"]).get::<u64>("k").await.unwrap(), Some(1));
    assert_eq!(cache.keywords_of("k").await.unwrap(), strings(&["a", "b"]));
}

/// A store that fails every write to one key.
struct FaultyStore {
    inner: MemoryStore,
    failing: String,
}

impl FaultyStore {
    fn check(&self, key: &str) -> Result<()> {
        if key == self.failing {
            return Err(Error::external(std::io::Error::other(format!("write to {key} failed"))));
        }
        Ok(())
    }
}

impl Store for FaultyStore {
    fn get<V: StoreValue>(&self, key: &str) -> impl Future<Output = Result<Option<V>>> + Send {
        self.inner.get(key)
    }

    async fn put<V: StoreValue>(&self, key: &str, value: &V, ttl: Option<Duration>) -> Result<()> {
        self.check(key)?;
        self.inner.put(key, value, ttl).await
    }

    async fn add<V: StoreValue>(&self, key: &str, value: &V, ttl: Option<Duration>) -> Result<bool> {
        self.check(key)?;
        self.inner.add(key, value, ttl).await
    }

    fn pull<V: StoreValue>(&self, key: &str) -> impl Future<Output = Result<Option<V>>> + Send {
        self.inner.pull(key)
    }

    fn forget(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        self.inner.forget(key)
    }

    fn flush(&self) -> impl Future<Output = Result<()>> + Send {
        self.inner.flush()
    }

    fn has(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        self.inner.has(key)
    }
}

#[test_log::test(tokio::test)]
async fn test_store_errors_propagate_before_value_write() {
    let store = FaultyStore {
        inner: MemoryStore::new(),
        failing: "keyword[t]".to_string(),
    };
    let cache = KeywordCache::new(store);

    let err = cache.keywords(["t"]).put("k", &1u64, TTL).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::External);
    assert!(!cache.has("k").await.unwrap());
    assert!(cache.store().inner.is_empty());

    // Keys tagged with other keywords are unaffected.
    cache.keywords(["u"]).put("k", &1u64, TTL).await.unwrap();
    assert_eq!(cache.keys_of("u").await.unwrap(), strings(&["k"]));
}
