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

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};

/// Value that can be written to a [`Store`](crate::store::Store).
///
/// Blanket implemented for every serde type that can be shared across threads.
pub trait StoreValue: Serialize + DeserializeOwned + Send + Sync + 'static {}
impl<T: Serialize + DeserializeOwned + Send + Sync + 'static> StoreValue for T {}

/// Encode/decode error.
#[derive(Debug, thiserror::Error)]
pub enum CodeError {
    /// The encoded value exceeds the size limit of the codec.
    #[error("exceed size limit")]
    SizeLimit,
    /// I/O error raised while coding.
    #[error("io error: {0}")]
    Io(std::io::Error),
    /// Malformed or unexpected input.
    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl From<bincode::Error> for CodeError {
    fn from(e: bincode::Error) -> Self {
        match *e {
            bincode::ErrorKind::SizeLimit => Self::SizeLimit,
            bincode::ErrorKind::Io(e) => Self::Io(e),
            e => Self::Unexpected(e.to_string()),
        }
    }
}

/// Encode/decode result.
pub type CodeResult<T> = std::result::Result<T, CodeError>;

/// Encode a value with the codec shared by the bundled stores.
pub fn encode<V: Serialize + ?Sized>(value: &V) -> CodeResult<Bytes> {
    let buf = bincode::serialize(value)?;
    Ok(Bytes::from(buf))
}

/// Decode a value previously produced by [`encode`].
pub fn decode<V: DeserializeOwned>(buf: &[u8]) -> CodeResult<V> {
    bincode::deserialize(buf).map_err(CodeError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_wrong_shape() {
        let buf = encode(&7u8).unwrap();
        let res: CodeResult<Vec<String>> = decode(&buf);
        assert!(res.is_err());
    }

    #[test]
    fn test_string_list_layout_is_shared() {
        // Keyword lists are written as `Vec<String>` and read back as plain lists by callers.
        let buf = encode(&vec!["a".to_string(), "b".to_string()]).unwrap();
        let list: Vec<String> = decode(&buf).unwrap();
        assert_eq!(list, vec!["a".to_string(), "b".to_string()]);
    }
}
