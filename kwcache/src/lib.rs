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

//! kwcache - a keyword-indexed cache for Rust.
//!
//! kwcache wraps a key-value [`Store`](common::store::Store) and lets every write tag its key with keywords. A group
//! of entries can then be invalidated in one call by naming one or more keywords, and the membership is queryable in
//! both directions. Removing the entries of one keyword never leaves dangling index state behind for entries that
//! also carried other keywords.

mod builder;
mod cache;
mod context;
mod differ;
mod keyword;
mod scheme;
mod set;
mod updater;

/// Shared components.
pub use kwcache_common as common;
/// The in-memory store.
pub use kwcache_memory as memory;

mod prelude;
pub use prelude::*;
