//! Per-endpoint result records and the concurrent fan-out that fills them.

use crate::error::{ChannelError, EndpointError};
use fabsdk_core::protos::ProposalResponse;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of sending a proposal to one endorser.
#[derive(Debug)]
pub struct TransactionProposalResponse {
    pub endorser: String,
    pub result: Result<ProposalResponse, EndpointError>,
}

impl TransactionProposalResponse {
    pub fn proposal_response(&self) -> Option<&ProposalResponse> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&EndpointError> {
        self.result.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcome of broadcasting an envelope to one orderer.
#[derive(Debug)]
pub struct TransactionResponse {
    pub orderer: String,
    pub result: Result<(), EndpointError>,
}

impl TransactionResponse {
    pub fn error(&self) -> Option<&EndpointError> {
        self.result.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Responses that came back from endorsers, ordered by endorser URL.
///
/// Transport failures are skipped; responses with a non-success status are
/// kept so transaction assembly can report them.
pub fn proposal_responses(
    responses: &HashMap<String, TransactionProposalResponse>,
) -> Vec<ProposalResponse> {
    let mut received: Vec<_> = responses
        .values()
        .filter_map(|r| r.proposal_response().map(|p| (r.endorser.as_str(), p)))
        .collect();
    received.sort_by(|a, b| a.0.cmp(b.0));
    received.into_iter().map(|(_, p)| p.clone()).collect()
}

/// Fail with `BroadcastRejected` when no orderer accepted the envelope.
pub(crate) fn ensure_accepted(
    responses: &HashMap<String, TransactionResponse>,
) -> Result<(), ChannelError> {
    let mut failures = Vec::new();
    for response in responses.values() {
        if let Some(e) = response.error() {
            tracing::warn!(orderer = %response.orderer, error = %e, "Broadcast failed at orderer");
            failures.push(format!("{}: {}", response.orderer, e));
        }
    }

    if !responses.is_empty() && failures.len() == responses.len() {
        tracing::error!("Broadcast failed: Received error from all configured orderers");
        failures.sort();
        return Err(ChannelError::BroadcastRejected { failures });
    }
    Ok(())
}

/// Call every endpoint concurrently and gather one result per URL.
///
/// Each endpoint runs on its own task and stores its result under its URL.
/// The call returns once every task has finished; a task that dies is
/// recorded as `TaskFailed` for its URL so the result stays complete.
pub(crate) async fn fan_out<E, T, F, Fut>(
    endpoints: Vec<(String, Arc<E>)>,
    call: F,
) -> HashMap<String, Result<T, EndpointError>>
where
    E: ?Sized + Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(Arc<E>) -> Fut,
    Fut: Future<Output = Result<T, EndpointError>> + Send + 'static,
{
    let results = Arc::new(Mutex::new(HashMap::with_capacity(endpoints.len())));
    let mut handles = Vec::with_capacity(endpoints.len());

    for (url, endpoint) in endpoints {
        let results = Arc::clone(&results);
        let outcome = call(endpoint);
        let key = url.clone();
        let handle = tokio::spawn(async move {
            let outcome = outcome.await;
            results.lock().await.insert(key, outcome);
        });
        handles.push((url, handle));
    }

    for (url, handle) in handles {
        if let Err(e) = handle.await {
            tracing::error!(endpoint = %url, error = %e, "Endpoint task failed");
            results
                .lock()
                .await
                .insert(url, Err(EndpointError::TaskFailed(e.to_string())));
        }
    }

    let mut collected = results.lock().await;
    std::mem::take(&mut *collected)
}
