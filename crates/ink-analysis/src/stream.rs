//! Client-visible byte stream plumbing
//!
//! The response body is the receiving half of an unbounded channel; a
//! driver task owns the sending half. A failed send means the client went
//! away, which the driver treats as cancellation.

use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures::channel::mpsc;

use crate::text;

/// Delay between replayed slices, for a typewriter-like rendering
pub(crate) const REPLAY_DELAY: Duration = Duration::from_millis(10);

/// The response body stream handed to the HTTP layer
pub type BodyStream = mpsc::UnboundedReceiver<Result<Bytes, io::Error>>;

/// The client went away; stop producing and skip side effects
pub(crate) struct Cancelled;

/// Sending half of the response body
pub(crate) struct StreamSender {
    tx: mpsc::UnboundedSender<Result<Bytes, io::Error>>,
}

pub(crate) fn body_channel() -> (StreamSender, BodyStream) {
    let (tx, rx) = mpsc::unbounded();
    (StreamSender { tx }, rx)
}

impl StreamSender {
    /// Ship one chunk of body text
    pub(crate) fn send_text(&self, text: &str) -> Result<(), Cancelled> {
        self.tx
            .unbounded_send(Ok(Bytes::copy_from_slice(text.as_bytes())))
            .map_err(|_| Cancelled)
    }

    /// Surface a mid-stream failure as a body error event
    ///
    /// The client sees a truncated stream; the HTTP status was already
    /// committed.
    pub(crate) fn send_error(&self, message: &str) {
        let _ = self.tx.unbounded_send(Err(io::Error::other(message.to_owned())));
    }

    /// Replay `content` in UTF-8-safe slices with artificial delays
    pub(crate) async fn replay(
        &self,
        content: &str,
        slice_bytes: usize,
    ) -> Result<(), Cancelled> {
        for slice in text::utf8_slices(content, slice_bytes) {
            self.send_text(slice)?;
            tokio::time::sleep(REPLAY_DELAY).await;
        }
        Ok(())
    }
}
