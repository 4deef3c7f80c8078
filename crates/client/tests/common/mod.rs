//! In-process peer and orderer servers speaking the framed wire protocol.

use fabsdk_client::{Client, MockPeer, Peer, SdkConfig, User};
use fabsdk_core::protos::{BroadcastResponse, Envelope, SignedProposal};
use fabsdk_core::{read_frame, write_frame, Keypair};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// A client with an in-memory `admin` user.
pub fn client_with_user() -> Arc<Client> {
    let client = Client::new(SdkConfig::default()).unwrap();
    client
        .set_user_context(
            User::new("admin", b"admin-cert".to_vec(), Keypair::generate()),
            true,
        )
        .unwrap();
    Arc::new(client)
}

/// Serve proposals on a random port, answering each with `peer`.
#[allow(dead_code)]
pub async fn start_peer_server(peer: MockPeer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let peer = Arc::new(peer);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let peer = Arc::clone(&peer);
            tokio::spawn(async move {
                let proposal: Option<SignedProposal> = read_frame(&mut socket).await.unwrap();
                if let Some(proposal) = proposal {
                    if let Ok(response) = peer.send_proposal(&proposal).await {
                        let _ = write_frame(&mut socket, &response).await;
                    }
                }
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// Orderer that reads envelopes until the client half-closes, then writes
/// `acks` and closes. Received envelopes are recorded.
#[allow(dead_code)]
pub async fn start_orderer_server(
    acks: Vec<BroadcastResponse>,
) -> (SocketAddr, Arc<Mutex<Vec<Envelope>>>) {
    start_orderer_server_with_delay(acks, Duration::ZERO).await
}

#[allow(dead_code)]
pub async fn start_orderer_server_with_delay(
    acks: Vec<BroadcastResponse>,
    delay: Duration,
) -> (SocketAddr, Arc<Mutex<Vec<Envelope>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&received);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let acks = acks.clone();
            let recorded = Arc::clone(&recorded);
            tokio::spawn(async move {
                while let Ok(Some(envelope)) = read_frame::<_, Envelope>(&mut socket).await {
                    recorded.lock().await.push(envelope);
                }
                tokio::time::sleep(delay).await;
                for ack in &acks {
                    if write_frame(&mut socket, ack).await.is_err() {
                        return;
                    }
                }
                let _ = socket.shutdown().await;
            });
        }
    });
    (addr, received)
}

/// Orderer that answers with a frame whose body is not a valid response,
/// followed by `acks`.
#[allow(dead_code)]
pub async fn start_garbled_orderer(acks: Vec<BroadcastResponse>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let acks = acks.clone();
            tokio::spawn(async move {
                while let Ok(Some(_)) = read_frame::<_, Envelope>(&mut socket).await {}
                let _ = socket.write_all(&[0, 0, 0, 1, 0xff]).await;
                for ack in &acks {
                    let _ = write_frame(&mut socket, ack).await;
                }
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// A local address with nothing listening on it.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
