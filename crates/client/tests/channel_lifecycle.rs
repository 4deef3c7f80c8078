//! Proposal, endorsement, assembly and broadcast against in-memory endpoints.

mod common;

use common::client_with_user;
use fabsdk_client::{
    proposal_responses, Channel, ChannelError, EndpointError, MatchingPayloads, MockOrderer,
    MockPeer,
};
use fabsdk_core::protos::utils;
use fabsdk_core::protos::{
    decode, ChaincodeActionPayload, ChaincodeProposalPayload, Payload, Status, Transaction,
};
use fabsdk_core::{HashOpts, Signature};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn channel() -> Channel {
    Channel::new("mychannel", client_with_user()).unwrap()
}

#[tokio::test]
async fn test_every_peer_gets_exactly_one_entry() {
    let mut channel = channel();
    let a = Arc::new(MockPeer::new("A").with_payload("42"));
    let b = Arc::new(MockPeer::new("B").failing("down"));
    channel.add_peer(a.clone());
    channel.add_peer(b.clone());

    let (signed, _, _) = channel
        .create_transaction_proposal("mycc", "mychannel", &["query", "a"], true, BTreeMap::new())
        .unwrap();
    let responses = channel.send_transaction_proposal(&signed, 0).await.unwrap();

    assert_eq!(responses.len(), 2);
    let ok = responses["A"].proposal_response().unwrap();
    assert_eq!(ok.status(), 200);
    assert_eq!(ok.response.payload, b"42");
    assert_eq!(responses["A"].endorser, "A");

    let err = responses["B"].error().unwrap();
    assert!(err.to_string().contains("down"));

    assert_eq!(a.calls(), 1);
    assert_eq!(b.calls(), 1);
}

#[tokio::test]
async fn test_peers_are_called_concurrently() {
    let mut channel = channel();
    for url in ["p1", "p2", "p3", "p4"] {
        channel.add_peer(Arc::new(
            MockPeer::new(url).with_delay(Duration::from_millis(200)),
        ));
    }
    let (signed, _, _) = channel
        .create_transaction_proposal("mycc", "mychannel", &["query"], true, BTreeMap::new())
        .unwrap();

    let started = std::time::Instant::now();
    let responses = channel.send_transaction_proposal(&signed, 0).await.unwrap();
    assert_eq!(responses.len(), 4);
    assert!(started.elapsed() < Duration::from_millis(700));
}

#[tokio::test]
async fn test_retry_recovers_transient_failures() {
    let mut channel = channel();
    let flaky = Arc::new(MockPeer::new("flaky").with_transient_failures(2));
    channel.add_peer(flaky.clone());

    let (signed, _, _) = channel
        .create_transaction_proposal("mycc", "mychannel", &["query"], true, BTreeMap::new())
        .unwrap();
    let responses = channel.send_transaction_proposal(&signed, 3).await.unwrap();

    assert!(responses["flaky"].is_ok());
    assert_eq!(flaky.calls(), 3);
}

#[tokio::test]
async fn test_zero_retry_makes_one_attempt() {
    let mut channel = channel();
    let flaky = Arc::new(MockPeer::new("flaky").with_transient_failures(1));
    channel.add_peer(flaky.clone());

    let (signed, _, _) = channel
        .create_transaction_proposal("mycc", "mychannel", &["query"], true, BTreeMap::new())
        .unwrap();
    let responses = channel.send_transaction_proposal(&signed, 0).await.unwrap();

    assert!(matches!(responses["flaky"].error(), Some(EndpointError::Closed)));
    assert_eq!(flaky.calls(), 1);
}

#[tokio::test]
async fn test_full_lifecycle() {
    let client = client_with_user();
    let mut channel = Channel::new("mychannel", Arc::clone(&client)).unwrap();
    channel.add_peer(Arc::new(MockPeer::new("peer0").with_payload("90")));
    channel.add_peer(Arc::new(MockPeer::new("peer1").with_payload("90")));
    let orderer = Arc::new(MockOrderer::new("orderer0"));
    channel.add_orderer(orderer.clone());

    let mut transient = BTreeMap::new();
    transient.insert("key".to_string(), b"hidden".to_vec());
    let (signed, proposal, tx_id) = channel
        .create_transaction_proposal(
            "mycc",
            "mychannel",
            &["invoke", "a", "b", "10"],
            true,
            transient,
        )
        .unwrap();

    let responses = channel.send_transaction_proposal(&signed, 0).await.unwrap();
    let endorsed = proposal_responses(&responses);
    assert_eq!(endorsed.len(), 2);

    let tx = channel.create_transaction(&proposal, &endorsed).unwrap();
    assert_eq!(tx.actions.len(), 1);
    let header = utils::get_header(&proposal.header).unwrap();
    assert_eq!(tx.actions[0].header, header.signature_header);

    let action: ChaincodeActionPayload =
        decode("chaincode action payload", &tx.actions[0].payload).unwrap();
    assert_eq!(action.action.proposal_response_payload, endorsed[0].payload);
    let endorsements: Vec<_> = endorsed
        .iter()
        .map(|r| r.endorsement.clone().unwrap())
        .collect();
    assert_eq!(action.action.endorsements, endorsements);

    let visible: ChaincodeProposalPayload =
        decode("chaincode proposal payload", &action.chaincode_proposal_payload).unwrap();
    assert!(visible.transient_map.is_empty());

    let results = channel.send_transaction(&proposal, &tx).await.unwrap();
    assert!(results["orderer0"].is_ok());

    let envelopes = orderer.received().await;
    assert_eq!(envelopes.len(), 1);
    let payload: Payload = decode("payload", &envelopes[0].payload).unwrap();
    assert_eq!(payload.header, header);
    let sent: Transaction = decode("transaction", &payload.data).unwrap();
    assert_eq!(sent, tx);
    assert_eq!(
        utils::get_channel_header(&payload.header).unwrap().tx_id,
        tx_id
    );

    let user = client.user_context("").unwrap();
    let digest = client
        .crypto_suite()
        .hash(&envelopes[0].payload, &HashOpts::default())
        .unwrap();
    let signature = Signature::from_slice(&envelopes[0].signature).unwrap();
    assert!(client
        .crypto_suite()
        .verify(&user.keypair().public_key, &digest, &signature)
        .is_ok());
}

#[tokio::test]
async fn test_rejected_endorsement_blocks_assembly() {
    let mut channel = channel();
    channel.add_peer(Arc::new(MockPeer::new("a")));
    channel.add_peer(Arc::new(MockPeer::new("b").with_status(500, "bad")));

    let (signed, proposal, _) = channel
        .create_transaction_proposal("mycc", "mychannel", &["invoke"], true, BTreeMap::new())
        .unwrap();
    let responses = channel.send_transaction_proposal(&signed, 0).await.unwrap();
    let endorsed = proposal_responses(&responses);

    let err = channel.create_transaction(&proposal, &endorsed).unwrap_err();
    assert!(matches!(err, ChannelError::EndorsementRejected { status: 500, .. }));
    let message = err.to_string();
    assert!(message.contains("500"));
    assert!(message.contains("bad"));
}

#[tokio::test]
async fn test_matching_payload_policy() {
    let mut channel = channel();
    channel.set_endorsement_policy(Arc::new(MatchingPayloads));
    channel.add_peer(Arc::new(MockPeer::new("a").with_payload("1")));
    channel.add_peer(Arc::new(MockPeer::new("b").with_payload("2")));

    let (signed, proposal, _) = channel
        .create_transaction_proposal("mycc", "mychannel", &["invoke"], true, BTreeMap::new())
        .unwrap();
    let responses = channel.send_transaction_proposal(&signed, 0).await.unwrap();
    let endorsed = proposal_responses(&responses);

    assert!(matches!(
        channel.create_transaction(&proposal, &endorsed),
        Err(ChannelError::EndorsementMismatch(_))
    ));
}

#[tokio::test]
async fn test_partial_broadcast_failure_succeeds() {
    let mut channel = channel();
    channel.add_peer(Arc::new(MockPeer::new("a")));
    let good = Arc::new(MockOrderer::new("good"));
    let bad = Arc::new(MockOrderer::new("bad").with_status(Status::ServiceUnavailable));
    channel.add_orderer(good.clone());
    channel.add_orderer(bad.clone());

    let (signed, proposal, _) = channel
        .create_transaction_proposal("mycc", "mychannel", &["invoke"], true, BTreeMap::new())
        .unwrap();
    let responses = channel.send_transaction_proposal(&signed, 0).await.unwrap();
    let tx = channel
        .create_transaction(&proposal, &proposal_responses(&responses))
        .unwrap();

    let results = channel.send_transaction(&proposal, &tx).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results["good"].is_ok());
    assert!(matches!(
        results["bad"].error(),
        Some(EndpointError::BroadcastStatus(Status::ServiceUnavailable))
    ));
    assert_eq!(good.calls(), 1);
    assert_eq!(bad.calls(), 1);
}

#[tokio::test]
async fn test_all_orderers_failing_is_an_error() {
    let mut channel = channel();
    channel.add_peer(Arc::new(MockPeer::new("a")));
    channel.add_orderer(Arc::new(MockOrderer::new("o1").failing("down")));
    channel.add_orderer(Arc::new(MockOrderer::new("o2").failing("down")));

    let (signed, proposal, _) = channel
        .create_transaction_proposal("mycc", "mychannel", &["invoke"], true, BTreeMap::new())
        .unwrap();
    let responses = channel.send_transaction_proposal(&signed, 0).await.unwrap();
    let tx = channel
        .create_transaction(&proposal, &proposal_responses(&responses))
        .unwrap();

    let err = channel.send_transaction(&proposal, &tx).await.unwrap_err();
    match err {
        ChannelError::BroadcastRejected { failures } => assert_eq!(failures.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_invocation_transaction_broadcast() {
    let mut channel = channel();
    let orderer = Arc::new(MockOrderer::new("o1"));
    channel.add_orderer(orderer.clone());

    let (envelope, _) = channel
        .create_invocation_transaction("mycc", "mychannel", &["invoke"], BTreeMap::new())
        .unwrap();
    channel.send_invocation_transaction(&envelope).await.unwrap();
    assert_eq!(orderer.received().await, vec![envelope.clone()]);

    let mut rejecting = Channel::new("mychannel", client_with_user()).unwrap();
    rejecting.add_orderer(Arc::new(MockOrderer::new("o1").with_status(Status::Forbidden)));
    assert!(matches!(
        rejecting.send_invocation_transaction(&envelope).await,
        Err(ChannelError::BroadcastRejected { .. })
    ));
}

#[tokio::test]
async fn test_removed_peer_is_not_called() {
    let mut channel = channel();
    let kept = Arc::new(MockPeer::new("kept"));
    let removed = Arc::new(MockPeer::new("removed"));
    channel.add_peer(kept.clone());
    channel.add_peer(removed.clone());
    channel.remove_peer("removed");

    let (signed, _, _) = channel
        .create_transaction_proposal("mycc", "mychannel", &["query"], true, BTreeMap::new())
        .unwrap();
    let responses = channel.send_transaction_proposal(&signed, 0).await.unwrap();

    assert_eq!(responses.len(), 1);
    assert_eq!(kept.calls(), 1);
    assert_eq!(removed.calls(), 0);
}
