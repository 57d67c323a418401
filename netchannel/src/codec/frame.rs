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

//! Length-prefixed frame layout.
//!
//! # Protocol
//!
//! ```text
//! +-----------------+---------------------+------------------------+
//! | Id (2 bytes BE) | Length (2 bytes BE) | Body (Length - 4 bytes) |
//! +-----------------+---------------------+------------------------+
//! ```
//!
//! - **Id**: protocol level message id, u16 big-endian
//! - **Length**: total frame length including the 4 header bytes, u16
//!   big-endian
//! - **Body**: encoded message, possibly empty
//!
//! # Examples
//!
//! ```rust
//! use netchannel::codec::{frame, LengthPrefixedHeader, PacketReceiveHeaderHandler};
//! use bytes::BytesMut;
//!
//! let mut buf = BytesMut::new();
//! frame::write_header(7, 3, &mut buf).unwrap();
//! assert_eq!(&buf[..], &[0, 7, 0, 7]);
//!
//! let header = LengthPrefixedHeader.handle(&buf).unwrap();
//! assert_eq!(header.id, 7);
//! assert_eq!(header.packet_length, 7);
//! ```

use crate::codec::{
    DeserializationError, PacketHeader, PacketReceiveHeaderHandler, PacketSendBodyHandler,
    SerializationError,
};
use bytes::{Buf, BufMut, BytesMut};

/// Size of the frame header in bytes.
pub const HEADER_LENGTH: usize = 4;

/// Largest frame the 16-bit length field can describe.
pub const MAX_PACKET_LENGTH: usize = u16::MAX as usize;

/// Writes a header for a frame with `body_length` body bytes.
///
/// # Errors
///
/// Fails if `id` does not fit the 16-bit id field or the frame would exceed
/// [`MAX_PACKET_LENGTH`].
pub fn write_header(
    id: u32,
    body_length: usize,
    destination: &mut BytesMut,
) -> Result<(), SerializationError> {
    let id = u16::try_from(id)
        .map_err(|_| SerializationError::new(format!("message id {id} exceeds 16 bits")))?;
    let total = HEADER_LENGTH + body_length;
    if total > MAX_PACKET_LENGTH {
        return Err(SerializationError::new(format!(
            "frame size {} exceeds maximum allowed size {}",
            total, MAX_PACKET_LENGTH
        )));
    }
    destination.reserve(HEADER_LENGTH);
    destination.put_u16(id);
    destination.put_u16(total as u16);
    Ok(())
}

/// Receive-header handler for the length-prefixed layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthPrefixedHeader;

impl PacketReceiveHeaderHandler for LengthPrefixedHeader {
    fn header_length(&self) -> usize {
        HEADER_LENGTH
    }

    fn handle(&self, header: &[u8]) -> Result<PacketHeader, DeserializationError> {
        if header.len() != HEADER_LENGTH {
            return Err(DeserializationError::new(format!(
                "expected {} header bytes, got {}",
                HEADER_LENGTH,
                header.len()
            )));
        }
        let mut header = header;
        let id = header.get_u16();
        let packet_length = header.get_u16() as usize;
        Ok(PacketHeader {
            id: u32::from(id),
            packet_length,
        })
    }
}

/// Send-body handler that appends the body bytes unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBody;

impl PacketSendBodyHandler for RawBody {
    fn handle(&self, body: &[u8], destination: &mut BytesMut) -> Result<(), SerializationError> {
        destination.extend_from_slice(body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_frame_header() {
        // {"x":1} is 7 bytes, total frame 11.
        let mut buf = BytesMut::new();
        write_header(1, 7, &mut buf).unwrap();
        assert_eq!(&buf[..], &[0x00, 0x01, 0x00, 0x0B]);
    }

    #[test]
    fn test_write_header_rejects_wide_id() {
        let mut buf = BytesMut::new();
        assert!(write_header(70_000, 0, &mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_write_header_rejects_oversized_frame() {
        let mut buf = BytesMut::new();
        assert!(write_header(1, MAX_PACKET_LENGTH, &mut buf).is_err());
        write_header(1, MAX_PACKET_LENGTH - HEADER_LENGTH, &mut buf).unwrap();
        assert_eq!(&buf[2..], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_parse_header() {
        let header = LengthPrefixedHeader.handle(&[0x01, 0x02, 0x00, 0x04]).unwrap();
        assert_eq!(header.id, 0x0102);
        assert_eq!(header.packet_length, 4);
    }

    #[test]
    fn test_parse_header_wrong_length() {
        assert!(LengthPrefixedHeader.handle(&[0x01, 0x02]).is_err());
    }

    #[test]
    fn test_raw_body_appends() {
        let mut buf = BytesMut::from(&b"head"[..]);
        RawBody.handle(b"body", &mut buf).unwrap();
        assert_eq!(&buf[..], b"headbody");
    }
}
