//! End-to-end tests against a fake node served over WebSocket.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use futures::StreamExt;
use nimiq_rpc::types::BlockType;
use nimiq_rpc::{ClientConfig, ClientError, NimiqClient, RpcError, Scheme};
use serde_json::{json, Value};

// ==============================================================================
// Fake Node
// ==============================================================================

const HEAD_HASH_SUBSCRIPTION: u64 = 11;
const HEAD_BLOCK_SUBSCRIPTION: u64 = 12;

/// Accepts any credentials except user `mallory`.
async fn upgrade(headers: HeaderMap, ws: WebSocketUpgrade) -> Response {
    let rejected = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == "Basic bWFsbG9yeTpwdw==");
    if rejected {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ws.on_upgrade(serve_socket)
}

fn reply(id: &Value, result: Value) -> Message {
    Message::Text(json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string().into())
}

fn notification(method: &str, subscription: u64, result: Value) -> Message {
    Message::Text(
        json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": {"subscription": subscription, "result": result},
        })
        .to_string()
        .into(),
    )
}

fn head_block(number: u32) -> Value {
    json!({
        "hash": format!("{number:064x}"),
        "number": number,
        "batch": number / 60,
        "epoch": 0,
        "parentHash": format!("{:064x}", number - 1),
        "bodyHash": "b0d1",
        "stateHash": "57a7",
        "historyHash": "4157",
        "extraData": "",
        "seed": "5eed",
        "size": 412,
        "version": 1,
        "network": 5,
        "timestamp": 1_700_000_000_000u64,
        "type": "micro",
    })
}

/// `echo [value, batch]` requests are held until `batch` of them arrived and
/// then answered in reverse order.
async fn serve_socket(mut socket: WebSocket) {
    let mut held: Vec<(Value, Value)> = Vec::new();

    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(request) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        let id = request["id"].clone();
        let params = request["params"].as_array().cloned().unwrap_or_default();

        let mut outgoing = Vec::new();
        match request["method"].as_str().unwrap_or_default() {
            "getBlockNumber" => outgoing.push(reply(&id, json!({"data": 77, "metadata": null}))),
            "echo" => {
                let value = params.first().cloned().unwrap_or(Value::Null);
                let batch = params.get(1).and_then(Value::as_u64).unwrap_or(1) as usize;
                held.push((id, value));
                if held.len() == batch {
                    for (id, value) in held.drain(..).rev() {
                        outgoing.push(reply(&id, value));
                    }
                }
            }
            "subscribeForHeadBlockHash" => {
                outgoing.push(reply(&id, json!(HEAD_HASH_SUBSCRIPTION)));
                for i in 0..3 {
                    outgoing.push(notification(
                        "subscribeForHeadBlockHash",
                        HEAD_HASH_SUBSCRIPTION,
                        json!({"data": format!("hash{i}"), "metadata": null}),
                    ));
                }
            }
            "subscribeForHeadBlock" => {
                outgoing.push(reply(&id, json!(HEAD_BLOCK_SUBSCRIPTION)));
                outgoing.push(notification(
                    "subscribeForHeadBlock",
                    HEAD_BLOCK_SUBSCRIPTION,
                    json!({"data": head_block(500), "metadata": null}),
                ));
            }
            "never" => {}
            "hangUp" => {
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
            _ => outgoing.push(Message::Text(
                json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {"code": -32601, "message": "method not found"},
                })
                .to_string()
                .into(),
            )),
        }

        for message in outgoing {
            if socket.send(message).await.is_err() {
                return;
            }
        }
    }
}

async fn spawn_node() -> SocketAddr {
    let app = Router::new().route("/ws", any(upgrade));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind must succeed");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake node must run");
    });
    addr
}

async fn connect(addr: SocketAddr) -> NimiqClient {
    NimiqClient::connect(ClientConfig::new(Scheme::Ws, "127.0.0.1", addr.port()))
        .await
        .expect("websocket connect must succeed")
}

async fn wait_for_pending(client: &NimiqClient, expected: usize) {
    for _ in 0..200 {
        if client.pending_calls() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {expected} pending calls, have {}", client.pending_calls());
}

// ==============================================================================
// Tests
// ==============================================================================

#[tokio::test]
async fn calls_share_one_socket() {
    let addr = spawn_node().await;
    let client = connect(addr).await;

    assert_eq!(client.block_number().await.expect("succeeds"), 77);
    let err = client.call_raw("nope", ()).await.expect_err("unknown method");
    assert_eq!(
        err.rpc().and_then(RpcError::node_error).map(|e| e.code),
        Some(-32601)
    );
    assert_eq!(client.block_number().await.expect("still usable"), 77);
}

#[tokio::test]
async fn replies_in_reverse_order_resolve_the_right_calls() {
    let addr = spawn_node().await;
    let client = connect(addr).await;
    const N: u64 = 6;

    let calls = (0..N).map(|i| {
        let client = client.clone();
        async move {
            client
                .call::<u64>("echo", vec![json!(i), json!(N)])
                .await
                .expect("call succeeds")
        }
    });
    let results = futures::future::join_all(calls).await;
    assert_eq!(results, (0..N).collect::<Vec<_>>());
    assert_eq!(client.pending_calls(), 0);
}

#[tokio::test]
async fn close_fails_every_pending_call() {
    let addr = spawn_node().await;
    let client = connect(addr).await;
    const K: usize = 4;

    let handles: Vec<_> = (0..K)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.call_raw("never", ()).await })
        })
        .collect();
    wait_for_pending(&client, K).await;

    client.close().await;
    for handle in handles {
        let err = handle
            .await
            .expect("task must not panic")
            .expect_err("closed before reply");
        assert!(matches!(err.rpc(), Some(RpcError::Transport(_))), "got {err:?}");
    }
    assert_eq!(client.pending_calls(), 0);
    assert!(client.block_number().await.is_err());
}

#[tokio::test]
async fn node_hang_up_fails_pending_and_later_calls() {
    let addr = spawn_node().await;
    let client = connect(addr).await;

    let err = client.call_raw("hangUp", ()).await.expect_err("node hung up");
    assert!(matches!(err.rpc(), Some(RpcError::Transport(_))), "got {err:?}");
    assert!(err.is_retryable());

    let err = client.block_number().await.expect_err("connection is gone");
    assert!(matches!(err.rpc(), Some(RpcError::Transport(_))), "got {err:?}");
}

#[tokio::test]
async fn head_block_hash_subscription_delivers_notifications() {
    let addr = spawn_node().await;
    let client = connect(addr).await;

    let mut subscription = client
        .subscribe_for_head_block_hash()
        .await
        .expect("subscribe succeeds");
    assert_eq!(subscription.id(), HEAD_HASH_SUBSCRIPTION);

    for i in 0..3 {
        let hash = subscription
            .next()
            .await
            .expect("stream open")
            .expect("decodes");
        assert_eq!(hash, format!("hash{i}"));
    }

    client.close().await;
    assert!(subscription.next().await.is_none());
}

#[tokio::test]
async fn head_block_subscription_is_a_stream() {
    let addr = spawn_node().await;
    let client = connect(addr).await;

    let subscription = client
        .subscribe_for_head_block(Some(false))
        .await
        .expect("subscribe succeeds");
    let blocks: Vec<_> = subscription.take(1).collect().await;
    let block = blocks
        .into_iter()
        .next()
        .expect("one block")
        .expect("decodes");
    assert_eq!(block.number, 500);
    assert_eq!(block.block_type(), BlockType::Micro);
}

#[tokio::test]
async fn rejected_handshake_is_connection_error() {
    let addr = spawn_node().await;
    let err = NimiqClient::connect(
        ClientConfig::new(Scheme::Ws, "127.0.0.1", addr.port()).with_credentials("mallory", "pw"),
    )
    .await
    .expect_err("node rejects credentials");
    assert!(matches!(err.rpc(), Some(RpcError::Connection(_))), "got {err:?}");
}

#[tokio::test]
async fn unreachable_websocket_is_connection_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind must succeed");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let err = NimiqClient::connect(ClientConfig::new(Scheme::Ws, "127.0.0.1", port))
        .await
        .expect_err("nothing listens");
    assert!(matches!(err, ClientError::Rpc(RpcError::Connection(_))), "got {err:?}");
}
