//! Length-prefixed framing for logger connections
//!
//! A producer connection starts with one token frame naming the
//! connection's purpose ("logger" for entry streams), followed by
//! framed entries until the connection closes. Frames are
//! `[4-byte big-endian length][payload]`.
//!
//! The async read functions block until a full frame is available and
//! return an error on a malformed or closed stream; the caller is
//! expected to close the connection on the first error.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::entry::Entry;
use crate::error::{ProtocolError, Result};

/// Maximum frame size (16MB)
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Length prefix size (4 bytes, big-endian u32)
const LENGTH_PREFIX_SIZE: usize = 4;

/// Read one token frame and return its UTF-8 payload
pub async fn read_token<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let frame = read_frame(reader).await?;
    String::from_utf8(frame.to_vec())
        .map_err(|e| ProtocolError::Malformed(format!("invalid UTF-8 in token: {e}")))
}

/// Read one framed entry
pub async fn read_entry<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Entry> {
    let frame = read_frame(reader).await?;
    decode_entry(frame)
}

/// Write a token frame
pub async fn write_token<W: AsyncWrite + Unpin>(writer: &mut W, token: &str) -> Result<()> {
    let bytes = token.as_bytes();
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + bytes.len());
    buf.put_u32(bytes.len() as u32);
    buf.put_slice(bytes);
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Write an entry frame
pub async fn write_entry<W: AsyncWrite + Unpin>(writer: &mut W, entry: &Entry) -> Result<()> {
    writer.write_all(&encode_entry(entry)).await?;
    writer.flush().await?;
    Ok(())
}

/// Write payload bytes verbatim to an output sink
pub async fn write_payload<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Encode an entry to a length-prefixed frame
pub fn encode_entry(entry: &Entry) -> Bytes {
    let source = entry.source().as_bytes();
    let data = entry.data();

    let payload_len = 8 + 4 + source.len() + 4 + data.len();
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload_len);

    buf.put_u32(payload_len as u32);
    buf.put_u64(entry.timestamp());
    buf.put_u32(source.len() as u32);
    buf.put_slice(source);
    buf.put_u32(data.len() as u32);
    buf.put_slice(data);

    buf.freeze()
}

/// Decode an entry from a frame payload (without length prefix)
pub fn decode_entry(mut buf: Bytes) -> Result<Entry> {
    if buf.remaining() < 8 {
        return Err(ProtocolError::Malformed("truncated timestamp".into()));
    }
    let timestamp = buf.get_u64();

    if buf.remaining() < 4 {
        return Err(ProtocolError::Malformed("truncated source length".into()));
    }
    let source_len = buf.get_u32() as usize;
    if buf.remaining() < source_len {
        return Err(ProtocolError::Malformed("truncated source".into()));
    }
    let source = String::from_utf8(buf.split_to(source_len).to_vec())
        .map_err(|e| ProtocolError::Malformed(format!("invalid UTF-8 in source: {e}")))?;

    if buf.remaining() < 4 {
        return Err(ProtocolError::Malformed("truncated data length".into()));
    }
    let data_len = buf.get_u32() as usize;
    if buf.remaining() < data_len {
        return Err(ProtocolError::Malformed("truncated data".into()));
    }
    let data = buf.split_to(data_len);

    if buf.has_remaining() {
        return Err(ProtocolError::Malformed("trailing bytes in entry frame".into()));
    }

    Ok(Entry::with_timestamp(timestamp, source, data))
}

/// Read one length-prefixed frame
async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Bytes> {
    let mut len_buf = [0u8; LENGTH_PREFIX_SIZE];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);

    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            len,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(Bytes::from(payload))
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;
