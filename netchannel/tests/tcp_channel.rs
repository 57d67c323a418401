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


//! Channels over loopback TCP.

#![cfg(feature = "json")]

use netchannel::channel::{ChannelConfig, ChannelEventHandler, ChannelOptions, ChannelRegistry};
use netchannel::codec::{CodecConfig, IntervalHeartbeat, JsonCodec, Message};
use netchannel::{ChannelError, ChannelState, Tick};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Move {
    x: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Chat {
    text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
enum GameMessage {
    Move(Move),
    Chat(Chat),
    Ping,
}

impl Message for GameMessage {
    fn message_id(&self) -> u32 {
        match self {
            GameMessage::Move(_) => 1,
            GameMessage::Chat(_) => 2,
            GameMessage::Ping => 3,
        }
    }
}

impl From<Move> for GameMessage {
    fn from(value: Move) -> Self {
        GameMessage::Move(value)
    }
}

impl From<Chat> for GameMessage {
    fn from(value: Chat) -> Self {
        GameMessage::Chat(value)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn codec(heartbeat: bool) -> CodecConfig<GameMessage> {
    let builder = JsonCodec::<GameMessage>::new()
        .register::<Move>(1)
        .register::<Chat>(2)
        .register_with(3, |_| Ok(GameMessage::Ping))
        .into_config();
    let builder = if heartbeat {
        builder.heartbeat(IntervalHeartbeat::new(|| GameMessage::Ping))
    } else {
        builder
    };
    builder.build().unwrap()
}

/// Echoes every byte back, `chunk` bytes per write.
async fn echo_server(chunk: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                loop {
                    let n = match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => n,
                    };
                    for piece in buf[..n].chunks(chunk) {
                        if stream.write_all(piece).await.is_err() {
                            return;
                        }
                        let _ = stream.flush().await;
                    }
                }
            });
        }
    });
    address
}

#[derive(Default)]
struct Events {
    log: Mutex<Vec<String>>,
}

impl ChannelEventHandler for Events {
    fn on_connected(&self, channel: &str, _: Option<&netchannel::codec::UserData>) {
        self.log.lock().push(format!("{channel} connected"));
    }

    fn on_closed(&self, channel: &str) {
        self.log.lock().push(format!("{channel} closed"));
    }

    fn on_missed_heartbeat(&self, channel: &str, missed: u32) {
        self.log.lock().push(format!("{channel} missed {missed}"));
    }

    fn on_error(&self, channel: &str, error: &ChannelError) {
        self.log.lock().push(format!("{channel} error {}", error.kind()));
    }
}

async fn tick_until<F>(registry: &mut ChannelRegistry<GameMessage>, tick: Tick, done: F)
where
    F: Fn(&ChannelRegistry<GameMessage>) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        while !done(registry) {
            registry.update(tick).unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("timed out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_messages_roundtrip_in_order() {
    init_tracing();
    let address = echo_server(4096).await;

    let mut registry = ChannelRegistry::new();
    let events = Arc::new(Events::default());
    registry.subscribe(events.clone());

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let channel = registry.create_channel("game", ChannelConfig::tcp(codec(false))).unwrap();
    channel.set_default_handler(move |packet| sink.lock().push(packet.payload));
    channel.connect(&address, None).unwrap();

    tick_until(&mut registry, Tick::default(), |r| {
        r.get_channel("game").unwrap().is_active()
    })
    .await;

    let channel = registry.get_channel("game").unwrap();
    let metadata = channel.transport_metadata().unwrap();
    assert_eq!(metadata.transport_type, "tcp");
    assert_eq!(metadata.peer_addr.map(|a| a.to_string()), Some(address.clone()));

    let sent = vec![
        GameMessage::Move(Move { x: 1 }),
        GameMessage::Chat(Chat {
            text: "hello".into(),
        }),
        GameMessage::Ping,
        GameMessage::Move(Move { x: -7 }),
    ];
    for message in &sent {
        channel.send(message.clone()).unwrap();
    }

    let expected = sent.len();
    let check = Arc::clone(&received);
    tick_until(&mut registry, Tick::default(), move |_| check.lock().len() == expected).await;

    assert_eq!(*received.lock(), sent);
    let channel = registry.get_channel("game").unwrap();
    assert_eq!(channel.sent_count(), 4);
    assert_eq!(channel.received_count(), 4);
    assert_eq!(*events.log.lock(), vec!["game connected"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_byte_by_byte_delivery() {
    init_tracing();
    let address = echo_server(1).await;

    let mut registry = ChannelRegistry::new();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let channel = registry.create_channel("slow", ChannelConfig::tcp(codec(false))).unwrap();
    channel.subscribe(2, move |packet| sink.lock().push(packet.payload));
    channel.connect(&address, None).unwrap();

    tick_until(&mut registry, Tick::default(), |r| {
        r.get_channel("slow").unwrap().is_active()
    })
    .await;

    let channel = registry.get_channel("slow").unwrap();
    for i in 0..10 {
        channel
            .send(GameMessage::Chat(Chat {
                text: format!("message {i}"),
            }))
            .unwrap();
    }

    let check = Arc::clone(&received);
    tick_until(&mut registry, Tick::default(), move |_| check.lock().len() == 10).await;
    let texts: Vec<String> = received
        .lock()
        .iter()
        .map(|m| match m {
            GameMessage::Chat(chat) => chat.text.clone(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(texts, (0..10).map(|i| format!("message {i}")).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_echoed_heartbeats_keep_channel_alive() {
    init_tracing();
    let address = echo_server(4096).await;

    let mut registry = ChannelRegistry::new();
    let events = Arc::new(Events::default());
    registry.subscribe(events.clone());

    let options = ChannelOptions::default()
        .with_heartbeat_interval(Duration::from_secs(5))
        .with_miss_threshold(1);
    let config = ChannelConfig::tcp_with_options(codec(true), options);
    registry.create_channel("hb", config).unwrap().connect(&address, None).unwrap();

    tick_until(&mut registry, Tick::default(), |r| r.get_channel("hb").unwrap().is_active()).await;

    for _ in 0..4 {
        registry.update(Tick::fixed(Duration::from_secs(5))).unwrap();
        tick_until(&mut registry, Tick::default(), |r| {
            r.get_channel("hb").unwrap().missed_heartbeat_count() == 0
        })
        .await;
    }

    tick_until(&mut registry, Tick::default(), |r| {
        r.get_channel("hb").unwrap().sent_count() == 4
    })
    .await;
    let channel = registry.get_channel("hb").unwrap();
    assert_eq!(channel.state(), ChannelState::Connected);
    assert_eq!(channel.received_count(), 4);
    assert_eq!(*events.log.lock(), vec!["hb connected"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_server_disconnect_closes_channel() {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let mut registry = ChannelRegistry::new();
    let events = Arc::new(Events::default());
    registry.subscribe(events.clone());
    registry
        .create_channel("gone", ChannelConfig::tcp(codec(false)))
        .unwrap()
        .connect(&address, None)
        .unwrap();

    tick_until(&mut registry, Tick::default(), |r| {
        r.get_channel("gone").unwrap().state() == ChannelState::Closed
    })
    .await;
    assert_eq!(*events.log.lock(), vec!["gone connected", "gone closed"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_refused_connection_reports_os_error() {
    init_tracing();
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let mut registry = ChannelRegistry::new();
    registry
        .create_channel("refused", ChannelConfig::tcp(codec(false)))
        .unwrap()
        .connect(&address, None)
        .unwrap();

    let error = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Err(error) = registry.update(Tick::default()) {
                return error;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(error.kind(), netchannel::ErrorKind::ConnectError);
    assert!(error.raw_os_error().is_some());
    assert_eq!(
        registry.get_channel("refused").unwrap().state(),
        ChannelState::Idle
    );
}
