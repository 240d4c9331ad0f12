//! Response body relaying.
//!
//! [`RelayBody`] sits between the executor's response body and the client connection.
//! It hands data out in bounded chunks and owns the upstream body until it is drained,
//! fails, or the client goes away, at which point the upstream body is dropped exactly once.

use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll, ready},
};

use hyper::body::{Body, Bytes, Frame, SizeHint};
use tracing::{Dispatch, debug, warn};

use crate::executor::ProxyBody;

/// Largest data frame handed to the client.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

pub struct RelayBody {
    upstream: Option<ProxyBody>,
    /// Unsent remainder of the last upstream data frame
    pending: Bytes,
    chunk_size: usize,
    relayed: u64,
    dispatch: Option<Dispatch>,
}

impl RelayBody {
    pub fn new(upstream: ProxyBody, chunk_size: usize) -> Self {
        Self {
            upstream: Some(upstream),
            pending: Bytes::new(),
            chunk_size: chunk_size.max(1),
            relayed: 0,
            dispatch: None,
        }
    }

    /// A body that is already fully known, e.g. an error message.
    pub fn full(bytes: impl Into<Bytes>) -> Self {
        Self {
            upstream: None,
            pending: bytes.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            relayed: 0,
            dispatch: None,
        }
    }

    pub fn empty() -> Self {
        Self::full(Bytes::new())
    }

    /// Routes the relay's own log lines to `dispatch` instead of the ambient subscriber.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Number of body bytes handed out so far.
    pub fn relayed(&self) -> u64 {
        self.relayed
    }

    /// Whether the upstream body is still held.
    pub fn holds_upstream(&self) -> bool {
        self.upstream.is_some()
    }

    fn log(&self, event: impl FnOnce()) {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, event),
            None => event(),
        }
    }

    fn release(&mut self) {
        if let Some(upstream) = self.upstream.take() {
            drop(upstream);
            let relayed = self.relayed;
            self.log(|| debug!("Released upstream body after {} bytes", relayed));
        }
    }
}

impl Body for RelayBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        loop {
            if !this.pending.is_empty() {
                let len = this.pending.len().min(this.chunk_size);
                let chunk = this.pending.split_to(len);
                this.relayed += len as u64;
                return Poll::Ready(Some(Ok(Frame::data(chunk))));
            }

            let Some(upstream) = this.upstream.as_mut() else {
                return Poll::Ready(None);
            };

            match ready!(Pin::new(upstream).poll_frame(cx)) {
                Some(Ok(frame)) => match frame.into_data() {
                    Ok(data) => this.pending = data,
                    // trailers go through untouched
                    Err(frame) => return Poll::Ready(Some(Ok(frame))),
                },
                Some(Err(err)) => {
                    // status and headers are already on the wire: keep what was sent and stop
                    let relayed = this.relayed;
                    this.log(|| {
                        warn!(
                            "Upstream body failed after {} bytes, truncating response: {}",
                            relayed, err
                        )
                    });
                    this.release();
                    return Poll::Ready(None);
                }
                None => {
                    this.release();
                    return Poll::Ready(None);
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.pending.is_empty()
            && self
                .upstream
                .as_ref()
                .is_none_or(|upstream| upstream.is_end_stream())
    }

    fn size_hint(&self) -> SizeHint {
        let pending = self.pending.len() as u64;
        match &self.upstream {
            None => SizeHint::with_exact(pending),
            Some(upstream) => {
                let inner = upstream.size_hint();
                let mut hint = SizeHint::new();
                hint.set_lower(inner.lower() + pending);
                if let Some(upper) = inner.upper() {
                    hint.set_upper(upper + pending);
                }
                hint
            }
        }
    }
}

impl Drop for RelayBody {
    fn drop(&mut self) {
        // client went away before the upstream body was drained
        self.release();
    }
}
