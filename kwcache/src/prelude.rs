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

pub use crate::{
    builder::{FlushScope, KeywordCacheBuilder},
    cache::{KeywordCache, Tagged},
    common::{
        code::{CodeError, CodeResult, StoreValue},
        error::{Error, ErrorKind, Result},
        store::Store,
    },
    differ::{KeywordMode, KeywordState},
    keyword::Keyword,
    memory::{MemoryStore, MemoryStoreBuilder},
    scheme::{forward_index_key, inverse_index_key, is_reserved},
    set::OrderedSet,
};
