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

//! Store keys of the keyword indices.
//!
//! The formats are stable: other processes sharing the same store read and write the same keys.

const FORWARD_PREFIX: &str = "keyword[";
const INVERSE_PREFIX: &str = "keyword_index[";
const SUFFIX: &str = "]";

/// Store key of the forward index (`keyword -> member keys`) of the keyword.
pub fn forward_index_key(keyword: &str) -> String {
    format!("{FORWARD_PREFIX}{keyword}{SUFFIX}")
}

/// Store key of the inverse index (`key -> keywords`) of the cache key.
pub fn inverse_index_key(key: &str) -> String {
    format!("{INVERSE_PREFIX}{key}{SUFFIX}")
}

/// Returns `true` if the key has the shape of a generated index key, and must not be used as a cache key.
pub fn is_reserved(key: &str) -> bool {
    [FORWARD_PREFIX, INVERSE_PREFIX]
        .iter()
        .any(|prefix| key.len() > prefix.len() && key.starts_with(prefix) && key.ends_with(SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_key_format() {
        assert_eq!(forward_index_key("users"), "keyword[users]");
        assert_eq!(inverse_index_key("user:1"), "keyword_index[user:1]");
        // Keywords may contain the bracket characters themselves.
        assert_eq!(forward_index_key("a]b"), "keyword[a]b]");
    }

    #[test]
    fn test_reserved_pattern() {
        assert!(is_reserved("keyword[x]"));
        assert!(is_reserved("keyword_index[x]"));
        assert!(is_reserved("keyword[]"));
        assert!(is_reserved(&forward_index_key("keyword[nested]")));
        assert!(is_reserved(&inverse_index_key("a")));

        assert!(!is_reserved("keyword"));
        assert!(!is_reserved("keyword["));
        assert!(!is_reserved("keyword[x"));
        assert!(!is_reserved("my_keyword[x]"));
        assert!(!is_reserved("keywords[x]"));
        assert!(!is_reserved("x]"));
    }
}
