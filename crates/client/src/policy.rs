//! Client-side checks applied to endorsements before a transaction is built.

use crate::error::ChannelError;
use fabsdk_core::protos::ProposalResponse;
use std::fmt;

/// Decides whether a set of successful proposal responses may be assembled
/// into a transaction.
pub trait EndorsementPolicy: Send + Sync + fmt::Debug {
    fn evaluate(&self, responses: &[ProposalResponse]) -> Result<(), ChannelError>;
}

/// Accepts any non-empty set of successful responses. The ledger's own
/// validation decides whether the endorsements are sufficient.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl EndorsementPolicy for AcceptAll {
    fn evaluate(&self, _responses: &[ProposalResponse]) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Requires every endorser to have produced byte-identical response payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingPayloads;

impl EndorsementPolicy for MatchingPayloads {
    fn evaluate(&self, responses: &[ProposalResponse]) -> Result<(), ChannelError> {
        let Some(first) = responses.first() else {
            return Ok(());
        };
        for (i, response) in responses.iter().enumerate().skip(1) {
            if response.payload != first.payload {
                return Err(ChannelError::EndorsementMismatch(format!(
                    "response {} payload differs from response 0",
                    i
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_payload(payload: &[u8]) -> ProposalResponse {
        ProposalResponse {
            payload: payload.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_accept_all() {
        let responses = [with_payload(b"a"), with_payload(b"b")];
        assert!(AcceptAll.evaluate(&responses).is_ok());
    }

    #[test]
    fn test_matching_payloads() {
        let same = [with_payload(b"a"), with_payload(b"a")];
        assert!(MatchingPayloads.evaluate(&same).is_ok());

        let differ = [with_payload(b"a"), with_payload(b"a"), with_payload(b"b")];
        let err = MatchingPayloads.evaluate(&differ).unwrap_err();
        assert!(
            matches!(err, ChannelError::EndorsementMismatch(ref m) if m.contains("response 2"))
        );
    }
}
