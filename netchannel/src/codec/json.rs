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

//! JSON reference codec.
//!
//! Bodies are JSON documents framed with the length-prefixed layout from
//! [`frame`](crate::codec::frame). Outbound messages are serialized with
//! `serde_json`; inbound bodies are decoded by a per-id decoder registered up
//! front, so the wire carries no type tags.

use crate::codec::frame::{self, LengthPrefixedHeader, RawBody};
use crate::codec::{
    CodecConfig, CodecConfigBuilder, DecodedBody, DeserializationError, Message,
    PacketReceiveBodyHandler, PacketSendHeaderHandler, SerializationError,
};
use bytes::{Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::marker::PhantomData;

type Decoder<M> = Box<dyn Fn(&[u8]) -> Result<M, DeserializationError> + Send + Sync>;

/// Registry of JSON body decoders for a message type `M`.
///
/// # Examples
///
/// ```rust
/// use netchannel::codec::{JsonCodec, Message};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Move {
///     x: i32,
/// }
///
/// impl Message for Move {
///     fn message_id(&self) -> u32 {
///         1
///     }
/// }
///
/// let config = JsonCodec::<Move>::new()
///     .register::<Move>(1)
///     .into_config()
///     .build()
///     .unwrap();
/// assert_eq!(config.header_length(), 4);
/// ```
pub struct JsonCodec<M> {
    decoders: HashMap<u32, Decoder<M>>,
}

impl<M> Default for JsonCodec<M> {
    fn default() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }
}

impl<M> JsonCodec<M>
where
    M: Message + Serialize,
{
    /// Creates a codec with no decoders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes bodies with id `id` as JSON `T`, converted into `M`.
    pub fn register<T>(self, id: u32) -> Self
    where
        T: DeserializeOwned + Into<M> + 'static,
    {
        self.register_with(id, |body| {
            let value: T = serde_json::from_slice(body)?;
            Ok(value.into())
        })
    }

    /// Decodes bodies with id `id` using `decoder`.
    ///
    /// Useful for header-only messages, whose body slice is empty.
    pub fn register_with<F>(mut self, id: u32, decoder: F) -> Self
    where
        F: Fn(&[u8]) -> Result<M, DeserializationError> + Send + Sync + 'static,
    {
        self.decoders.insert(id, Box::new(decoder));
        self
    }

    /// Returns a builder with all four frame roles filled in.
    ///
    /// A heartbeat handler can still be added before building.
    pub fn into_config(self) -> CodecConfigBuilder<M> {
        CodecConfig::builder()
            .send_header(JsonSendHeader::default())
            .send_body(RawBody)
            .receive_header(LengthPrefixedHeader)
            .receive_body(JsonReceiveBody {
                decoders: self.decoders,
            })
    }
}

/// Send-header handler serializing the message body as JSON.
pub struct JsonSendHeader<M> {
    _marker: PhantomData<fn() -> M>,
}

impl<M> Default for JsonSendHeader<M> {
    fn default() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<M> PacketSendHeaderHandler<M> for JsonSendHeader<M>
where
    M: Message + Serialize,
{
    fn handle(&self, message: &M, destination: &mut BytesMut) -> Result<Bytes, SerializationError> {
        let body = serde_json::to_vec(message)?;
        frame::write_header(message.message_id(), body.len(), destination)?;
        Ok(Bytes::from(body))
    }
}

/// Receive-body handler dispatching to registered JSON decoders.
pub struct JsonReceiveBody<M> {
    decoders: HashMap<u32, Decoder<M>>,
}

impl<M> PacketReceiveBodyHandler<M> for JsonReceiveBody<M>
where
    M: Message,
{
    fn handle(&self, body: &[u8], message_id: u32) -> Result<DecodedBody<M>, DeserializationError> {
        let decoder = self.decoders.get(&message_id).ok_or_else(|| {
            DeserializationError::new(format!("no decoder registered for message id {message_id}"))
        })?;
        decoder(body).map(DecodedBody::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

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

    fn config() -> CodecConfig<GameMessage> {
        JsonCodec::new()
            .register::<Move>(1)
            .register::<Chat>(2)
            .register_with(3, |_| Ok(GameMessage::Ping))
            .into_config()
            .build()
            .unwrap()
    }

    fn encode(config: &CodecConfig<GameMessage>, message: &GameMessage) -> BytesMut {
        let mut buf = BytesMut::new();
        let body = config.send_header.handle(message, &mut buf).unwrap();
        config.send_body.handle(&body, &mut buf).unwrap();
        buf
    }

    fn decode(config: &CodecConfig<GameMessage>, frame: &[u8]) -> (u32, GameMessage) {
        let header_length = config.receive_header.header_length();
        let header = config.receive_header.handle(&frame[..header_length]).unwrap();
        assert_eq!(header.packet_length, frame.len());
        let body = config
            .receive_body
            .handle(&frame[header_length..], header.id)
            .unwrap();
        (header.id, body.message)
    }

    #[test]
    fn test_example_frame_encoding() {
        let config = config();
        let frame = encode(&config, &GameMessage::Move(Move { x: 1 }));
        assert_eq!(frame.len(), 11);
        assert_eq!(&frame[..4], &[0, 1, 0, 11]);
        assert_eq!(&frame[4..], br#"{"x":1}"#);
    }

    #[test]
    fn test_roundtrip_through_four_handlers() {
        let config = config();
        for message in [
            GameMessage::Move(Move { x: -42 }),
            GameMessage::Chat(Chat {
                text: "hello there".to_string(),
            }),
        ] {
            let frame = encode(&config, &message);
            let (id, decoded) = decode(&config, &frame);
            assert_eq!(id, message.message_id());
            assert_eq!(decoded, message);
        }
    }

    #[test]
    fn test_unknown_id_is_rejected() {
        let config = config();
        let err = config.receive_body.handle(b"{}", 99).err().unwrap();
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        let config = config();
        let err = config.receive_body.handle(b"{\"x\":", 1).err().unwrap();
        assert!(err.to_string().contains("JSON deserialization failed"));
    }
}
