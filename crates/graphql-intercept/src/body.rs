//! Replayable body buffering.
//!
//! Servlet-style request bodies can only be consumed once. [`BufferedBody`]
//! reads the full body into an owned buffer up front so the rest of the
//! request-processing chain can read the same bytes any number of times.

use std::borrow::Cow;

use axum::body::{Body, Bytes};

use crate::errors::InterceptError;

/// A body captured fully into memory so it can be read more than once.
///
/// The entire body is buffered eagerly with no size cap, so a very large
/// request body consumes a proportional amount of memory. Callers that accept
/// untrusted traffic should bound body sizes before this wrapper is applied.
#[derive(Clone, Debug)]
pub struct BufferedBody {
    bytes: Bytes,
}

impl BufferedBody {
    /// Read the given body stream to completion, capturing every byte.
    pub async fn capture(body: Body) -> Result<Self, InterceptError> {
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(InterceptError::RequestBodyRead)?;
        Ok(Self { bytes })
    }

    /// The captured bytes. Cloning `Bytes` is cheap and does not copy.
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Decode the captured bytes as UTF-8 text, replacing invalid sequences.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// A fresh [`Body`] replaying the captured bytes.
    ///
    /// Every call yields the identical byte sequence.
    pub fn replay(&self) -> Body {
        Body::from(self.bytes.clone())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Bytes> for BufferedBody {
    fn from(bytes: Bytes) -> Self {
        Self { bytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replay_yields_identical_bytes() {
        let body = Body::from(r#"{"query":"query { a: 1 }"}"#);
        let buffered = BufferedBody::capture(body).await.unwrap();

        let first = axum::body::to_bytes(buffered.replay(), usize::MAX)
            .await
            .unwrap();
        let second = axum::body::to_bytes(buffered.replay(), usize::MAX)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first, buffered.bytes());
    }

    #[tokio::test]
    async fn test_capture_empty_body() {
        let buffered = BufferedBody::capture(Body::empty()).await.unwrap();

        assert!(buffered.is_empty());
        assert_eq!(buffered.len(), 0);
        assert_eq!(buffered.as_text(), "");
    }

    #[tokio::test]
    async fn test_as_text_is_lossy() {
        let buffered = BufferedBody::from(Bytes::from_static(b"query\xff"));

        assert_eq!(buffered.as_text(), "query\u{fffd}");
    }
}
