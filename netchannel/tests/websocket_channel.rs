//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//


//! Channels over a loopback WebSocket server.

#![cfg(all(feature = "websocket", feature = "json"))]

use futures_util::{SinkExt, StreamExt};
use netchannel::channel::{Channel, ChannelConfig, ChannelOptions};
use netchannel::codec::{CodecConfig, IntervalHeartbeat, JsonCodec, Message};
use netchannel::transport::{AddressFamily, TransportKind, WebSocketConfig, WebSocketConnector};
use netchannel::{ChannelState, ErrorKind, Tick};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Score {
    player: String,
    points: u32,
}

impl Message for Score {
    fn message_id(&self) -> u32 {
        7
    }
}

fn codec() -> CodecConfig<Score> {
    JsonCodec::<Score>::new()
        .register::<Score>(7)
        .into_config()
        .heartbeat(IntervalHeartbeat::new(|| Score {
            player: String::new(),
            points: 0,
        }))
        .build()
        .unwrap()
}

/// Echoes binary messages. With `coalesce`, pairs of messages are echoed as
/// one.
async fn ws_echo_server(coalesce: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("ws://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let mut pending: Vec<u8> = Vec::new();
        while let Some(Ok(message)) = ws.next().await {
            if let WsMessage::Binary(data) = message {
                pending.extend_from_slice(&data);
                if !coalesce || pending.len() >= 2 * data.len() {
                    let echo = std::mem::take(&mut pending);
                    if ws.send(WsMessage::Binary(echo)).await.is_err() {
                        return;
                    }
                }
            }
        }
    });
    address
}

async fn settle(channel: &mut Channel<Score>, done: impl Fn(&Channel<Score>) -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            channel.update(Tick::default()).unwrap();
            if done(&*channel) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("timed out");
}

fn websocket_channel(name: &str, options: ChannelOptions) -> Channel<Score> {
    let connector = WebSocketConnector::new(WebSocketConfig::default());
    let config = ChannelConfig::new(codec(), connector).with_options(options);
    Channel::new(name, config)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_websocket_roundtrip() {
    let address = ws_echo_server(false).await;
    let mut channel = websocket_channel("scores", ChannelOptions::default());
    assert_eq!(channel.config().connector.kind(), TransportKind::Message);

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    channel.subscribe(7, move |packet| sink.lock().unwrap().push(packet.payload));

    channel.connect(&address, None).unwrap();
    settle(&mut channel, Channel::is_active).await;
    assert_eq!(channel.address_family(), Some(AddressFamily::IPv4));
    assert_eq!(
        channel.transport_metadata().map(|m| m.transport_type.as_str()),
        Some("websocket")
    );

    let scores: Vec<Score> = (0..5)
        .map(|i| Score {
            player: format!("p{i}"),
            points: i * 10,
        })
        .collect();
    for score in &scores {
        channel.send(score.clone()).unwrap();
    }

    let check = Arc::clone(&received);
    settle(&mut channel, move |_| check.lock().unwrap().len() == scores.len()).await;
    assert_eq!(received.lock().unwrap()[4].points, 40);
    assert_eq!(received.lock().unwrap()[0].player, "p0");

    channel.close();
    assert_eq!(channel.state(), ChannelState::Closed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_coalesced_messages_yield_every_frame() {
    let address = ws_echo_server(true).await;
    let mut channel = websocket_channel("pairs", ChannelOptions::default());

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    channel.set_default_handler(move |packet| sink.lock().unwrap().push(packet.payload.points));

    channel.connect(&address, None).unwrap();
    settle(&mut channel, Channel::is_active).await;

    for points in [1, 2, 3, 4] {
        channel
            .send(Score {
                player: "same".into(),
                points,
            })
            .unwrap();
    }

    let check = Arc::clone(&received);
    settle(&mut channel, move |_| check.lock().unwrap().len() == 4).await;
    assert_eq!(*received.lock().unwrap(), vec![1, 2, 3, 4]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unanswered_heartbeats_time_out() {
    // Accepts the handshake and then never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("ws://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let options = ChannelOptions::default()
        .with_heartbeat_interval(Duration::from_secs(5))
        .with_miss_threshold(3);
    let mut channel = websocket_channel("silent", options);
    channel.connect(&address, None).unwrap();
    settle(&mut channel, Channel::is_active).await;

    let mut error = None;
    for second in 1..=20 {
        if let Err(e) = channel.update(Tick::fixed(Duration::from_secs(1))) {
            error = Some((second, e));
            break;
        }
    }
    let (second, error) = error.expect("heartbeat never timed out");
    assert_eq!(second, 20);
    assert_eq!(error.kind(), ErrorKind::HeartbeatTimeout);
    assert_eq!(channel.state(), ChannelState::Closed);
}
