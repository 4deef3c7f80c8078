//! Length-prefixed framing for messages on a byte stream.
//!
//! Each frame is a big-endian `u32` body length followed by the bincode
//! encoding of one message. End-of-stream at a frame boundary is a normal
//! close; end-of-stream anywhere else is a truncated frame.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame body accepted in either direction.
pub const MAX_FRAME_SIZE: usize = 100 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("stream ended in the middle of a frame")]
    Truncated,

    #[error("frame of {0} bytes exceeds the maximum frame size")]
    FrameTooLarge(usize),

    #[error("could not encode frame: {0}")]
    Encode(#[source] bincode::Error),

    #[error("could not decode frame: {0}")]
    Decode(#[source] bincode::Error),
}

impl WireError {
    /// Whether the stream can still be read after this error.
    ///
    /// A decode failure consumes exactly one frame, so the next frame is
    /// still aligned; everything else leaves the stream unusable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WireError::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, WireError>;

/// Write one message as a frame and flush.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
    T: Serialize,
{
    let body = bincode::serialize(message).map_err(WireError::Encode)?;
    if body.len() > MAX_FRAME_SIZE {
        return Err(WireError::FrameTooLarge(body.len()));
    }
    writer.write_all(&(body.len() as u32).to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame. Returns `Ok(None)` on a clean end-of-stream.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>>
where
    R: AsyncRead + Unpin + ?Sized,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        let n = match reader.read(&mut len_buf[filled..]).await {
            Ok(n) => n,
            // TLS peers that skip close_notify surface as UnexpectedEof.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && filled == 0 => 0,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(WireError::Truncated);
        }
        filled += n;
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(WireError::FrameTooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            WireError::Truncated
        } else {
            WireError::Io(e)
        }
    })?;

    bincode::deserialize(&body)
        .map(Some)
        .map_err(WireError::Decode)
}
