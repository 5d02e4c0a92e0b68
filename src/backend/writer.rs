use std::sync::Arc;

use tokio::sync::mpsc;

use super::{OrderRequest, TreeBackend};

/// An order write tagged with the ticket that tracks it locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistRequest {
    pub ticket: u64,
    pub request: OrderRequest,
}

/// Completion of one order write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    pub ticket: u64,
    pub parent_path: String,
    pub result: std::result::Result<(), String>,
}

/// Background task that sends order writes one at a time, in issue order.
///
/// Requests are fire-and-forget for the caller. Because the task awaits each
/// write before starting the next, a later write can never reach the backend
/// before an earlier one.
pub struct OrderWriter {
    tx: mpsc::UnboundedSender<PersistRequest>,
}

impl OrderWriter {
    /// Spawn the writer. `on_complete` is called once per request.
    pub fn spawn<F>(backend: Arc<dyn TreeBackend>, on_complete: F) -> Self
    where
        F: Fn(PersistOutcome) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<PersistRequest>();

        tokio::spawn(async move {
            while let Some(PersistRequest { ticket, request }) = rx.recv().await {
                let result = backend.save_order(&request).await;
                match &result {
                    Ok(()) => tracing::info!(
                        ticket,
                        parent = %request.parent_path,
                        "order saved"
                    ),
                    Err(e) => tracing::error!(
                        ticket,
                        parent = %request.parent_path,
                        error = %e,
                        "failed to save order"
                    ),
                }
                on_complete(PersistOutcome {
                    ticket,
                    parent_path: request.parent_path,
                    result: result.map_err(|e| e.to_string()),
                });
            }
        });

        Self { tx }
    }

    /// Queue a write. Returns `false` if the writer task is gone.
    pub fn submit(&self, request: PersistRequest) -> bool {
        if self.tx.send(request).is_err() {
            tracing::warn!("order writer stopped; dropping request");
            return false;
        }
        true
    }
}
