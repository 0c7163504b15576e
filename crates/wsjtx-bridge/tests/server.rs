//! End-to-end tests: a fake WSJT-X on a real UDP socket, real WebSocket
//! browser clients, and the bridge in between.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio_tungstenite::tungstenite::Message;
use wsjtx_bridge::{BridgeRouter, BridgeServer, BridgeServerBuilder};
use wsjtx_transport::WebSocketConnection;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

struct Harness {
    ws_addr: SocketAddr,
    udp_addr: SocketAddr,
    router: Arc<BridgeRouter<WebSocketConnection>>,
}

/// Starts a bridge on random ports.
async fn start_bridge() -> Harness {
    start_bridge_with(BridgeServer::builder()).await
}

async fn start_bridge_with(builder: BridgeServerBuilder) -> Harness {
    let server = builder
        .udp_bind("127.0.0.1:0")
        .ws_bind("127.0.0.1:0")
        .build()
        .await
        .expect("bridge should build");

    let harness = Harness {
        ws_addr: server.ws_local_addr().expect("ws addr"),
        udp_addr: server.udp_local_addr().expect("udp addr"),
        router: server.router(),
    };

    tokio::spawn(async move {
        let _ = server.run().await;
    });
    harness
}

/// Connects a browser and waits until the bridge has registered it.
async fn connect(h: &Harness, expected_sessions: usize) -> ClientWs {
    let (ws, _) =
        tokio_tungstenite::connect_async(format!("ws://{}/ws", h.ws_addr))
            .await
            .expect("should connect");
    wait_for_sessions(h, expected_sessions).await;
    ws
}

async fn wait_for_sessions(h: &Harness, expected: usize) {
    for _ in 0..200 {
        if h.router.session_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session count never reached {expected}");
}

/// A fake WSJT-X instance.
async fn wsjtx() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.expect("bind fake WSJT-X")
}

fn put_string(b: &mut Vec<u8>, s: &str) {
    b.extend_from_slice(&(s.len() as u32).to_be_bytes());
    b.extend_from_slice(s.as_bytes());
}

fn header(ty: u32) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(&0xADBC_CBDAu32.to_be_bytes());
    b.extend_from_slice(&2u32.to_be_bytes());
    b.extend_from_slice(&ty.to_be_bytes());
    put_string(&mut b, "WSJT-X");
    b
}

fn heartbeat_frame() -> Vec<u8> {
    let mut b = header(0);
    b.extend_from_slice(&3u32.to_be_bytes());
    put_string(&mut b, "2.6.1");
    put_string(&mut b, "d9f1a2");
    b
}

fn decode_frame(mode: &str, message: &str, snr: i32, time: u32) -> Vec<u8> {
    let mut b = header(2);
    b.push(1); // New
    b.extend_from_slice(&time.to_be_bytes());
    b.extend_from_slice(&snr.to_be_bytes());
    b.extend_from_slice(&0.2f64.to_be_bytes());
    b.extend_from_slice(&1500u32.to_be_bytes());
    put_string(&mut b, mode);
    put_string(&mut b, message);
    b.push(0); // LowConfidence
    b.push(0); // OffAir
    b
}

async fn next_json(ws: &mut ClientWs) -> serde_json::Value {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("event should arrive")
        .expect("stream open")
        .expect("frame ok");
    let text = msg.into_text().expect("text frame");
    serde_json::from_str(text.as_str()).expect("valid JSON")
}

async fn send_command(ws: &mut ClientWs, json: &str) {
    ws.send(Message::text(json.to_string())).await.expect("send");
}

async fn expect_no_datagram(sock: &UdpSocket) {
    let mut buf = [0u8; 512];
    let got = tokio::time::timeout(
        Duration::from_millis(150),
        sock.recv_from(&mut buf),
    )
    .await;
    assert!(got.is_err(), "no datagram should have been sent");
}

// =========================================================================
// UDP → browser
// =========================================================================

#[tokio::test]
async fn test_decode_reaches_browser() {
    let h = start_bridge().await;
    let mut ws = connect(&h, 1).await;
    let radio = wsjtx().await;

    radio
        .send_to(&decode_frame("FT8", "CQ TEST K1ABC", -10, 43_200_000), h.udp_addr)
        .await
        .unwrap();

    let json = next_json(&mut ws).await;
    assert_eq!(json["type"], "2");
    assert_eq!(json["data"]["Mode"], "FT8");
    assert_eq!(json["data"]["Message"], "CQ TEST K1ABC");
    assert_eq!(json["data"]["SNR"], -10);
    assert_eq!(json["data"]["Time"], 43_200_000);
    assert_eq!(json["data"]["New"], true);
    assert_eq!(json["data"]["DeltaFrequency"], 1500);
    assert_eq!(json["data"]["Id"], "WSJT-X");
}

#[tokio::test]
async fn test_every_browser_gets_the_event() {
    let h = start_bridge().await;
    let mut a = connect(&h, 1).await;
    let mut b = connect(&h, 2).await;
    let radio = wsjtx().await;

    radio.send_to(&heartbeat_frame(), h.udp_addr).await.unwrap();

    for ws in [&mut a, &mut b] {
        let json = next_json(ws).await;
        assert_eq!(json["type"], "0");
        assert_eq!(json["data"]["Version"], "2.6.1");
        assert_eq!(json["data"]["MaxSchema"], 3);
    }
}

#[tokio::test]
async fn test_bad_datagrams_are_dropped_silently() {
    let h = start_bridge().await;
    let mut ws = connect(&h, 1).await;
    let radio = wsjtx().await;

    // Wrong magic, then truncated, then an unsupported type (Clear).
    radio.send_to(b"\x00\x00\x00\x00junk", h.udp_addr).await.unwrap();
    let full = heartbeat_frame();
    radio.send_to(&full[..full.len() - 2], h.udp_addr).await.unwrap();
    radio.send_to(&header(3), h.udp_addr).await.unwrap();
    radio.send_to(&heartbeat_frame(), h.udp_addr).await.unwrap();

    // Only the valid heartbeat comes through.
    let json = next_json(&mut ws).await;
    assert_eq!(json["type"], "0");
}

#[tokio::test]
async fn test_disconnected_browser_is_removed() {
    let h = start_bridge().await;
    let mut stays = connect(&h, 1).await;
    let mut leaves = connect(&h, 2).await;

    leaves.close(None).await.unwrap();
    wait_for_sessions(&h, 1).await;

    let radio = wsjtx().await;
    radio.send_to(&heartbeat_frame(), h.udp_addr).await.unwrap();
    assert_eq!(next_json(&mut stays).await["type"], "0");
}

// =========================================================================
// Browser → UDP
// =========================================================================

#[tokio::test]
async fn test_halt_command_is_sent_to_last_peer() {
    let h = start_bridge().await;
    let mut ws = connect(&h, 1).await;
    let radio = wsjtx().await;

    radio.send_to(&heartbeat_frame(), h.udp_addr).await.unwrap();
    next_json(&mut ws).await;

    send_command(&mut ws, r#"{"type":"halt","data":{"AutoTxOnly":true}}"#)
        .await;

    let mut buf = [0u8; 512];
    let (n, from) = tokio::time::timeout(
        Duration::from_secs(2),
        radio.recv_from(&mut buf),
    )
    .await
    .expect("command should arrive")
    .unwrap();
    assert_eq!(from, h.udp_addr);

    let mut expected = vec![
        0xAD, 0xBC, 0xCB, 0xDA, 0, 0, 0, 2, 0, 0, 0, 8, 0, 0, 0, 9,
    ];
    expected.extend_from_slice(b"WSJTX-WEB");
    expected.push(1);
    assert_eq!(&buf[..n], expected.as_slice());
}

#[tokio::test]
async fn test_reply_command_layout() {
    let h = start_bridge().await;
    let mut ws = connect(&h, 1).await;
    let radio = wsjtx().await;

    radio.send_to(&heartbeat_frame(), h.udp_addr).await.unwrap();
    next_json(&mut ws).await;

    send_command(
        &mut ws,
        r#"{"type":"reply","data":{
            "Time":43200000,"SNR":-10,"DeltaTime":0.2,"DeltaFrequency":1500,
            "Mode":"~","Message":"CQ TEST K1ABC","LowConfidence":false,
            "Modifiers":0}}"#,
    )
    .await;

    let mut buf = [0u8; 512];
    let (n, _) = tokio::time::timeout(
        Duration::from_secs(2),
        radio.recv_from(&mut buf),
    )
    .await
    .expect("command should arrive")
    .unwrap();

    let mut expected = vec![0xAD, 0xBC, 0xCB, 0xDA, 0, 0, 0, 2, 0, 0, 0, 4];
    put_string(&mut expected, "WSJTX-WEB");
    expected.extend_from_slice(&43_200_000u32.to_be_bytes());
    expected.extend_from_slice(&(-10i32).to_be_bytes());
    expected.extend_from_slice(&0.2f64.to_be_bytes());
    expected.extend_from_slice(&1500u32.to_be_bytes());
    put_string(&mut expected, "~");
    put_string(&mut expected, "CQ TEST K1ABC");
    expected.push(0);
    expected.push(0);
    assert_eq!(&buf[..n], expected.as_slice());
}

#[tokio::test]
async fn test_command_before_peer_is_dropped_not_retried() {
    let h = start_bridge().await;
    let mut ws = connect(&h, 1).await;
    let radio = wsjtx().await;

    send_command(&mut ws, r#"{"type":"halt","data":{"AutoTxOnly":false}}"#)
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.router.peer().await, None);

    // Once the peer shows up, the earlier command must not be replayed.
    radio.send_to(&heartbeat_frame(), h.udp_addr).await.unwrap();
    next_json(&mut ws).await;
    expect_no_datagram(&radio).await;
}

#[tokio::test]
async fn test_bad_commands_keep_session_open() {
    let h = start_bridge().await;
    let mut ws = connect(&h, 1).await;
    let radio = wsjtx().await;

    radio.send_to(&heartbeat_frame(), h.udp_addr).await.unwrap();
    next_json(&mut ws).await;

    send_command(&mut ws, "{not json").await;
    send_command(&mut ws, r#"{"type":"launch","data":{}}"#).await;
    expect_no_datagram(&radio).await;

    // The session survived and still gets events.
    assert_eq!(h.router.session_count().await, 1);
    radio.send_to(&heartbeat_frame(), h.udp_addr).await.unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "0");
}

#[tokio::test]
async fn test_wrong_path_is_not_upgraded() {
    let h = start_bridge().await;
    let result =
        tokio_tungstenite::connect_async(format!("ws://{}/", h.ws_addr)).await;
    assert!(result.is_err());
    assert_eq!(h.router.session_count().await, 0);
}

#[tokio::test]
async fn test_silent_client_does_not_block_browsers() {
    let h = start_bridge().await;

    // Opens a TCP connection and never sends an upgrade request.
    let _silent = TcpStream::connect(h.ws_addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let connected = tokio::time::timeout(
        Duration::from_secs(3),
        tokio_tungstenite::connect_async(format!("ws://{}/ws", h.ws_addr)),
    )
    .await;
    let (_ws, _) = connected
        .expect("browser must connect while another client is silent")
        .expect("should connect");
    wait_for_sessions(&h, 1).await;
}

#[tokio::test]
async fn test_silent_client_is_dropped_after_handshake_timeout() {
    let h = start_bridge_with(
        BridgeServer::builder().handshake_timeout(Duration::from_millis(100)),
    )
    .await;

    let mut silent = TcpStream::connect(h.ws_addr).await.unwrap();
    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(2), silent.read(&mut buf))
        .await
        .expect("bridge should hang up on the silent client");
    assert!(matches!(read, Ok(0) | Err(_)));
    assert_eq!(h.router.session_count().await, 0);
}
