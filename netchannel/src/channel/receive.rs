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

//! Receive pipeline.
//!
//! [`ReceivePipeline`] reassembles frames from chunks of any size. It keeps
//! the unconsumed bytes in a single `BytesMut` and alternates between two
//! stages:
//!
//! 1. **Header**: once `header_length` bytes are buffered they are split off
//!    and parsed into a [`PacketHeader`]. A frame whose total length does not
//!    exceed the header is dispatched immediately with an empty body.
//! 2. **Body**: once `packet_length - header_length` bytes are buffered they
//!    are split off, decoded, and emitted as a [`Packet`].
//!
//! Parsing returns as soon as the awaited stage lacks bytes and resumes at the
//! same point when more arrive, so the result never depends on how the stream
//! was chunked. A header or body failure poisons the pipeline: frame
//! boundaries can no longer be trusted and all further input is rejected.
//!
//! # Examples
//!
//! ```rust
//! use netchannel::channel::ReceivePipeline;
//! use netchannel::codec::{JsonCodec, Message};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize, PartialEq)]
//! struct Move {
//!     x: i32,
//! }
//!
//! impl Message for Move {
//!     fn message_id(&self) -> u32 {
//!         1
//!     }
//! }
//!
//! let codec = JsonCodec::<Move>::new().register::<Move>(1).into_config().build().unwrap();
//! let mut pipeline = ReceivePipeline::new(&codec, 64, 1024);
//! let frame = b"\x00\x01\x00\x0b{\"x\":1}";
//!
//! let mut packets = Vec::new();
//! pipeline.feed(&frame[..4], |packet, _| packets.push(packet)).unwrap();
//! assert!(packets.is_empty());
//! pipeline.feed(&frame[4..], |packet, _| packets.push(packet)).unwrap();
//! assert_eq!(packets.len(), 1);
//! assert_eq!(packets[0].payload, Move { x: 1 });
//! ```

use crate::channel::dispatch::PacketQueue;
use crate::channel::heartbeat::HeartbeatHandle;
use crate::channel::session::{SessionEvent, SessionInbox};
use crate::codec::{
    CodecConfig, CustomErrorData, DeserializationError, Packet, PacketHeader,
    PacketReceiveBodyHandler, PacketReceiveHeaderHandler,
};
use crate::observability::ChannelMetrics;
use crate::transport::TransportReader;
use bytes::BytesMut;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "observability")]
use tracing::{debug, trace, warn};

/// Minimum spare capacity reserved before each transport read.
const READ_RESERVE: usize = 4096;

/// Why the receive pipeline stopped.
#[derive(Debug, Error)]
pub enum ReceiveError {
    /// The receive-header handler rejected a header, or the header announced
    /// a frame larger than the configured limit.
    #[error("header: {0}")]
    Header(#[source] DeserializationError),

    /// The receive-body handler rejected a body.
    #[error("body of message {message_id}: {source}")]
    Body {
        /// Id from the frame header
        message_id: u32,
        /// The codec error
        #[source]
        source: DeserializationError,
    },

    /// An earlier failure poisoned the pipeline.
    #[error("pipeline poisoned by an earlier parse failure")]
    Poisoned,
}

#[derive(Debug, Clone, Copy)]
enum Awaiting {
    Header,
    Body { id: u32, body_length: usize },
}

/// Incremental, chunk independent frame parser.
pub struct ReceivePipeline<M> {
    buffer: BytesMut,
    header_handler: Arc<dyn PacketReceiveHeaderHandler>,
    body_handler: Arc<dyn PacketReceiveBodyHandler<M>>,
    header_length: usize,
    max_frame_size: usize,
    awaiting: Awaiting,
    poisoned: bool,
}

impl<M: 'static> ReceivePipeline<M> {
    /// Creates a pipeline using the codec's receive handlers.
    ///
    /// Frames announcing more than `max_frame_size` bytes are rejected as
    /// header errors, which bounds the accumulation buffer.
    pub fn new(codec: &CodecConfig<M>, capacity: usize, max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            header_handler: Arc::clone(&codec.receive_header),
            body_handler: Arc::clone(&codec.receive_body),
            header_length: codec.receive_header.header_length(),
            max_frame_size,
            awaiting: Awaiting::Header,
            poisoned: false,
        }
    }

    /// Appends `chunk` and parses every complete frame.
    ///
    /// Returns the number of packets emitted through `on_packet`.
    pub fn feed<F>(&mut self, chunk: &[u8], on_packet: F) -> Result<usize, ReceiveError>
    where
        F: FnMut(Packet<M>, Option<CustomErrorData>),
    {
        if self.poisoned {
            return Err(ReceiveError::Poisoned);
        }
        self.buffer.extend_from_slice(chunk);
        self.process(on_packet)
    }

    /// Parses every complete frame already in the buffer.
    ///
    /// Used after a transport appended directly into
    /// [`buffer_mut`](Self::buffer_mut).
    pub fn process<F>(&mut self, mut on_packet: F) -> Result<usize, ReceiveError>
    where
        F: FnMut(Packet<M>, Option<CustomErrorData>),
    {
        if self.poisoned {
            return Err(ReceiveError::Poisoned);
        }

        let mut emitted = 0;
        loop {
            match self.awaiting {
                Awaiting::Header => {
                    if self.buffer.len() < self.header_length {
                        break;
                    }
                    let header = self.buffer.split_to(self.header_length);
                    let PacketHeader { id, packet_length } = self
                        .header_handler
                        .handle(&header)
                        .map_err(|e| self.poison(ReceiveError::Header(e)))?;
                    if packet_length > self.max_frame_size {
                        return Err(self.poison(ReceiveError::Header(DeserializationError::new(
                            format!(
                                "frame length {} exceeds limit of {} bytes",
                                packet_length, self.max_frame_size
                            ),
                        ))));
                    }

                    let body_length = packet_length.saturating_sub(self.header_length);
                    if body_length == 0 {
                        self.decode_body(id, 0, &mut on_packet)?;
                        emitted += 1;
                    } else {
                        self.awaiting = Awaiting::Body { id, body_length };
                    }
                }
                Awaiting::Body { id, body_length } => {
                    if self.buffer.len() < body_length {
                        break;
                    }
                    self.decode_body(id, body_length, &mut on_packet)?;
                    self.awaiting = Awaiting::Header;
                    emitted += 1;
                }
            }
        }
        Ok(emitted)
    }

    fn decode_body<F>(
        &mut self,
        id: u32,
        body_length: usize,
        on_packet: &mut F,
    ) -> Result<(), ReceiveError>
    where
        F: FnMut(Packet<M>, Option<CustomErrorData>),
    {
        let body = self.buffer.split_to(body_length);
        match self.body_handler.handle(&body, id) {
            Ok(decoded) => {
                on_packet(Packet::new(id, decoded.message), decoded.custom_error);
                Ok(())
            }
            Err(source) => Err(self.poison(ReceiveError::Body {
                message_id: id,
                source,
            })),
        }
    }

    fn poison(&mut self, error: ReceiveError) -> ReceiveError {
        self.poisoned = true;
        self.buffer.clear();
        error
    }

    /// Returns the accumulation buffer so a transport can append to it.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    /// Number of buffered bytes not yet consumed by a complete frame stage.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` after a parse failure.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}

/// Everything the reader task owns.
pub(crate) struct Reader<M> {
    pub(crate) channel: String,
    pub(crate) pipeline: ReceivePipeline<M>,
    pub(crate) reader: Box<dyn TransportReader>,
    pub(crate) packets: Arc<PacketQueue<M>>,
    pub(crate) heartbeat: HeartbeatHandle,
    pub(crate) reset_heartbeat_on_receive: bool,
    pub(crate) inbox: Arc<SessionInbox>,
    pub(crate) metrics: Arc<ChannelMetrics>,
    pub(crate) cancel: CancellationToken,
}

impl<M: Send + 'static> Reader<M> {
    /// Reads and parses until the session is cancelled, the peer closes, or
    /// an error occurs.
    pub(crate) async fn run(mut self) {
        loop {
            self.pipeline.buffer_mut().reserve(READ_RESERVE);
            let read = tokio::select! {
                _ = self.cancel.cancelled() => return,
                read = self.reader.read_chunk(self.pipeline.buffer_mut()) => read,
            };

            match read {
                Ok(0) => {
                    #[cfg(feature = "observability")]
                    debug!(channel = %self.channel, "Peer closed the connection");
                    self.inbox.push(SessionEvent::PeerClosed);
                    return;
                }
                Ok(_n) => {
                    #[cfg(feature = "observability")]
                    trace!(channel = %self.channel, bytes = _n, "Chunk received");
                    if let Err(error) = self.process() {
                        #[cfg(feature = "observability")]
                        warn!(channel = %self.channel, %error, "Failed to parse inbound frame");
                        self.metrics.record_error();
                        self.inbox.push(SessionEvent::ReceiveFailed(error));
                        return;
                    }
                }
                Err(error) => {
                    #[cfg(feature = "observability")]
                    warn!(channel = %self.channel, %error, "Transport read failed");
                    self.metrics.record_error();
                    self.inbox.push(SessionEvent::TransportFailed(error));
                    return;
                }
            }
        }
    }

    fn process(&mut self) -> Result<usize, ReceiveError> {
        let packets = &self.packets;
        let heartbeat = &self.heartbeat;
        let inbox = &self.inbox;
        let metrics = &self.metrics;
        let reset_elapsed = self.reset_heartbeat_on_receive;

        self.pipeline.process(|packet, custom_error| {
            heartbeat.on_packet_received(reset_elapsed);
            packets.push(packet);
            if let Some(data) = custom_error {
                inbox.push(SessionEvent::CustomError(data));
            }
            metrics.record_received();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{frame, JsonCodec, Message};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Move {
        x: i32,
    }

    impl Message for Move {
        fn message_id(&self) -> u32 {
            1
        }
    }

    fn codec() -> CodecConfig<Move> {
        JsonCodec::new()
            .register::<Move>(1)
            .register_with(2, |body| {
                assert!(body.is_empty());
                Ok(Move { x: 0 })
            })
            .into_config()
            .build()
            .unwrap()
    }

    fn frame_for(x: i32) -> Vec<u8> {
        let body = serde_json::to_vec(&Move { x }).unwrap();
        let mut buf = BytesMut::new();
        frame::write_header(1, body.len(), &mut buf).unwrap();
        buf.extend_from_slice(&body);
        buf.to_vec()
    }

    fn stream(count: i32) -> Vec<u8> {
        (0..count).flat_map(frame_for).collect()
    }

    fn collect(pipeline: &mut ReceivePipeline<Move>, chunks: &[&[u8]]) -> Vec<(u32, Move)> {
        let mut out = Vec::new();
        for chunk in chunks {
            pipeline
                .feed(chunk, |p, _| out.push((p.message_id, p.payload)))
                .unwrap();
        }
        out
    }

    #[test]
    fn test_example_split_after_header() {
        let codec = codec();
        let mut pipeline = ReceivePipeline::new(&codec, 16, 1024);
        let frame = frame_for(1);
        assert_eq!(frame.len(), 11);

        let mut got = Vec::new();
        let n = pipeline.feed(&frame[..4], |p, _| got.push(p)).unwrap();
        assert_eq!(n, 0);
        assert!(got.is_empty());

        let n = pipeline.feed(&frame[4..], |p, _| got.push(p)).unwrap();
        assert_eq!(n, 1);
        assert_eq!(got, vec![Packet::new(1, Move { x: 1 })]);
        assert_eq!(pipeline.buffered_len(), 0);
    }

    #[test]
    fn test_many_frames_in_one_chunk() {
        let codec = codec();
        let mut pipeline = ReceivePipeline::new(&codec, 16, 1024);
        let data = stream(5);
        let got = collect(&mut pipeline, &[&data]);
        let xs: Vec<i32> = got.iter().map(|(_, m)| m.x).collect();
        assert_eq!(xs, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_single_byte_chunks_match_whole_stream() {
        let codec = codec();
        let data = stream(8);

        let whole = collect(&mut ReceivePipeline::new(&codec, 16, 1024), &[&data]);
        let chunks: Vec<&[u8]> = data.chunks(1).collect();
        let bytewise = collect(&mut ReceivePipeline::new(&codec, 16, 1024), &chunks);
        assert_eq!(whole.len(), 8);
        assert_eq!(whole, bytewise);
    }

    #[test]
    fn test_pseudo_random_partitions_match_whole_stream() {
        let codec = codec();
        let data = stream(20);
        let whole = collect(&mut ReceivePipeline::new(&codec, 16, 1024), &[&data]);

        // Deterministic LCG so failures are reproducible.
        let mut seed: u64 = 0x5eed;
        for _ in 0..50 {
            let mut chunks = Vec::new();
            let mut rest = &data[..];
            while !rest.is_empty() {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let size = ((seed >> 33) as usize % 17 + 1).min(rest.len());
                let (head, tail) = rest.split_at(size);
                chunks.push(head);
                rest = tail;
            }
            let got = collect(&mut ReceivePipeline::new(&codec, 16, 1024), &chunks);
            assert_eq!(got, whole);
        }
    }

    #[test]
    fn test_header_only_frame_dispatches_empty_body() {
        let codec = codec();
        let mut pipeline = ReceivePipeline::new(&codec, 16, 1024);
        let mut data = vec![0x00, 0x02, 0x00, 0x04];
        data.extend(frame_for(7));

        let got = collect(&mut pipeline, &[&data]);
        assert_eq!(got, vec![(2, Move { x: 0 }), (1, Move { x: 7 })]);
    }

    #[test]
    fn test_header_shorter_than_header_length_is_zero_body() {
        let codec = codec();
        let mut pipeline = ReceivePipeline::new(&codec, 16, 1024);
        // Declared length 2 is below the 4 byte header.
        let got = collect(&mut pipeline, &[&[0x00, 0x02, 0x00, 0x02]]);
        assert_eq!(got, vec![(2, Move { x: 0 })]);
    }

    #[test]
    fn test_body_error_poisons_pipeline() {
        let codec = codec();
        let mut pipeline = ReceivePipeline::new(&codec, 16, 1024);
        let mut data = vec![0x00, 0x01, 0x00, 0x07];
        data.extend_from_slice(b"nop");
        data.extend(frame_for(3));

        let mut got = Vec::new();
        let err = pipeline.feed(&data, |p, _| got.push(p)).unwrap_err();
        assert!(matches!(err, ReceiveError::Body { message_id: 1, .. }));
        assert!(got.is_empty());
        assert!(pipeline.is_poisoned());

        let err = pipeline.feed(&frame_for(4), |p, _| got.push(p)).unwrap_err();
        assert!(matches!(err, ReceiveError::Poisoned));
        assert!(got.is_empty());
    }

    #[test]
    fn test_oversized_frame_is_header_error() {
        let codec = codec();
        let mut pipeline = ReceivePipeline::new(&codec, 16, 64);
        let err = pipeline
            .feed(&[0x00, 0x01, 0x01, 0x00], |_, _| {})
            .unwrap_err();
        assert!(matches!(err, ReceiveError::Header(_)));
    }

    #[test]
    fn test_frames_before_error_are_emitted() {
        let codec = codec();
        let mut pipeline = ReceivePipeline::new(&codec, 16, 1024);
        let mut data = frame_for(1);
        data.extend_from_slice(&[0x00, 0x09, 0x00, 0x05, b'x']);

        let mut got = Vec::new();
        let err = pipeline.feed(&data, |p, _| got.push(p.payload)).unwrap_err();
        assert!(matches!(err, ReceiveError::Body { message_id: 9, .. }));
        assert_eq!(got, vec![Move { x: 1 }]);
    }
}
