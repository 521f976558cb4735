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

use std::borrow::Cow;

use crate::set::OrderedSet;

/// A label that can tag cache entries.
///
/// Every keyword is canonicalized to a string identifier before it reaches the index, so two values with the same
/// identifier are the same keyword. Implement it for domain types to tag entries by entity:
///
/// ```rust
/// # use std::borrow::Cow;
/// # use kwcache::Keyword;
/// struct User {
///     id: u64,
/// }
///
/// impl Keyword for User {
///     fn to_keyword(&self) -> Cow<'_, str> {
///         Cow::Owned(format!("user:{}", self.id))
///     }
/// }
///
/// assert_eq!(User { id: 42 }.to_keyword(), "user:42");
/// ```
pub trait Keyword {
    /// The stable string identifier of the keyword.
    fn to_keyword(&self) -> Cow<'_, str>;
}

impl Keyword for str {
    fn to_keyword(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl Keyword for String {
    fn to_keyword(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl Keyword for Cow<'_, str> {
    fn to_keyword(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_ref())
    }
}

impl<T: Keyword + ?Sized> Keyword for &T {
    fn to_keyword(&self) -> Cow<'_, str> {
        (**self).to_keyword()
    }
}

macro_rules! for_all_primitives {
    ($macro:ident) => {
        $macro! {
            u8, u16, u32, u64, u128, usize,
            i8, i16, i32, i64, i128, isize,
        }
    };
}

macro_rules! impl_keyword {
    ($( $type:ty, )*) => {
        $(
            impl Keyword for $type {
                fn to_keyword(&self) -> Cow<'_, str> {
                    Cow::Owned(self.to_string())
                }
            }
        )*
    };
}

for_all_primitives! { impl_keyword }

/// Canonicalize keywords into a duplicate-free set, keeping the first occurrence order.
pub(crate) fn canonicalize<I>(keywords: I) -> OrderedSet
where
    I: IntoIterator,
    I::Item: Keyword,
{
    keywords.into_iter().map(|k| k.to_keyword().into_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post {
        id: u32,
    }

    impl Keyword for Post {
        fn to_keyword(&self) -> Cow<'_, str> {
            Cow::Owned(format!("post:{}", self.id))
        }
    }

    #[test]
    fn test_canonicalize_strings() {
        let set = canonicalize(["a", "b", "a"]);
        assert_eq!(set.as_slice(), &["a", "b"]);

        let set = canonicalize(vec!["x".to_string(), "x".to_string()]);
        assert_eq!(set.as_slice(), &["x"]);
    }

    #[test]
    fn test_canonicalize_primitives() {
        assert_eq!(canonicalize([1u64, 2, 1]).as_slice(), &["1", "2"]);
        assert_eq!(canonicalize([-7i32]).as_slice(), &["-7"]);
    }

    #[test]
    fn test_canonicalize_domain_types_by_identifier() {
        // Two distinct values with the same identifier are the same keyword.
        let posts = [Post { id: 3 }, Post { id: 3 }, Post { id: 4 }];
        assert_eq!(canonicalize(&posts).as_slice(), &["post:3", "post:4"]);
    }
}
