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

//! Tag computed entries with domain keywords and invalidate them by entity.

use std::{borrow::Cow, time::Duration};

use kwcache::{memory::MemoryStore, Keyword, KeywordCache};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Article {
    id: u64,
    author: u64,
    title: String,
}

struct Author(u64);

impl Keyword for Author {
    fn to_keyword(&self) -> Cow<'_, str> {
        Cow::Owned(format!("author:{}", self.0))
    }
}

async fn load_article(id: u64) -> kwcache::Result<Article> {
    tracing::info!("load article {id} from the database");
    Ok(Article {
        id,
        author: id % 2,
        title: format!("article #{id}"),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    demos::init_logging();

    let cache = KeywordCache::new(MemoryStore::new());
    let ttl = Duration::from_secs(300);

    for id in 0..4 {
        let author = Author(id % 2);
        let article = cache
            .keywords([author])
            .remember(&format!("article:{id}"), ttl, || load_article(id))
            .await?;
        tracing::info!("cached {}", serde_json::to_string(&article)?);
    }

    // The author edited their profile, drop every article rendered with it.
    cache.keywords([Author(1)]).flush().await?;

    for id in 0..4 {
        let key = format!("article:{id}");
        tracing::info!("{key} cached: {}", cache.has(&key).await?);
    }

    Ok(())
}
