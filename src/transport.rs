use crate::error::TransportError;
use async_trait::async_trait;

/// Asynchronous destination for encoded `_bulk` bodies.
///
/// The handler calls `post_bulk` once per non-empty flush, from the flush
/// timer task or from an explicit `flush`/`close`, never from the thread
/// that produced the log event.
///
/// The handler drops a batch as soon as `post_bulk` returns, whatever the
/// outcome. An implementation wanting stronger delivery (bounded retry, a
/// dead-letter file) wraps another transport and does it here.
#[async_trait]
pub trait BulkTransport: Send + Sync {
    /// Deliver one NDJSON bulk body.
    ///
    /// **Parameters**
    /// - `body`: action/source line pairs, newline-terminated.
    ///
    /// **Returns**
    /// - `Ok(())` if the request was sent and a response received.
    /// - `Err(..)` on connection errors and timeouts.
    async fn post_bulk(&self, body: String) -> Result<(), TransportError>;
}
