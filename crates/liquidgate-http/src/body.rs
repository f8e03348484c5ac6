//! Gateway HTTP response body type.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Frame, SizeHint};

/// Fully buffered response body, yielded as a single data frame.
///
/// Every gateway response (JSON errors, acknowledgements, forwarded upstream
/// payloads) is small and already in memory when the response is built.
#[derive(Debug, Default)]
pub struct GatewayBody {
    data: Option<Bytes>,
}

impl GatewayBody {
    /// Create a response body from raw bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data: Bytes = data.into();
        Self {
            data: (!data.is_empty()).then_some(data),
        }
    }

    /// Create a response body from serialized JSON.
    #[must_use]
    pub fn from_json(json: Vec<u8>) -> Self {
        Self::from_bytes(json)
    }

    /// Number of bytes not yet yielded.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.as_ref().map_or(0, Bytes::len)
    }
}

impl http_body::Body for GatewayBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(self.get_mut().data.take().map(|data| Ok(Frame::data(data))))
    }

    fn is_end_stream(&self) -> bool {
        self.data.is_none()
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining() as u64)
    }
}
