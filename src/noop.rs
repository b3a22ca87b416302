use crate::error::TransportError;
use crate::transport::BulkTransport;
use async_trait::async_trait;

/// Accepts every bulk body and sends it nowhere.
///
/// With this transport the handler still normalizes, batches and encodes,
/// so the load demo measures everything but the network.
#[derive(Clone, Default)]
pub struct NoopTransport;

#[async_trait]
impl BulkTransport for NoopTransport {
    async fn post_bulk(&self, _body: String) -> Result<(), TransportError> {
        Ok(())
    }
}
