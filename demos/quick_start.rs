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

//! Tag entries, inspect both indices and flush a keyword group.

use std::time::Duration;

use kwcache::{memory::MemoryStore, KeywordCache};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    demos::init_logging();

    let cache = KeywordCache::new(MemoryStore::new());
    let ttl = Duration::from_secs(60);

    cache.keywords(["k1", "k2"]).put("a", &"alpha".to_string(), ttl).await?;
    cache.keywords(["k2", "k3"]).put("b", &"beta".to_string(), ttl).await?;

    tracing::info!("keys of k2: {:?}", cache.keys_of("k2").await?);
    tracing::info!("keywords of a: {:?}", cache.keywords_of("a").await?);

    cache.merge_keywords(["k4"]).put("a", &"alpha".to_string(), ttl).await?;
    tracing::info!("keywords of a after merge: {:?}", cache.keywords_of("a").await?);

    cache.keywords(["k2"]).flush().await?;
    assert!(!cache.has("a").await?);
    assert!(!cache.has("b").await?);
    assert!(cache.keys_of("k3").await?.is_empty());

    if let Err(e) = cache.put("keyword[k1]", &"nope".to_string(), ttl).await {
        tracing::info!("rejected: {e}");
    }

    Ok(())
}
