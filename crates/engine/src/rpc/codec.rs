//! `Content-Length` framing of JSON-RPC messages.

use serde_json::Value as JsonValue;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Error, Result};

/// Largest body accepted from the engine.
pub(crate) const MAX_MESSAGE_LEN: usize = 64 * 1024 * 1024;

/// Writes one framed message and flushes.
pub(crate) async fn write_message<W>(writer: &mut W, msg: &JsonValue) -> Result<()>
where
	W: AsyncWrite + Unpin,
{
	let json = serde_json::to_string(msg)?;
	let frame = format!("Content-Length: {}\r\n\r\n{}", json.len(), json);
	writer.write_all(frame.as_bytes()).await?;
	writer.flush().await?;
	Ok(())
}

/// Reads one framed message. Returns `None` on a clean EOF before any header.
pub(crate) async fn read_message<R>(reader: &mut R, buf: &mut String) -> Result<Option<JsonValue>>
where
	R: AsyncBufRead + Unpin,
{
	let mut content_length: Option<usize> = None;
	let mut saw_header = false;
	loop {
		buf.clear();
		let bytes_read = reader.read_line(buf).await?;
		if bytes_read == 0 {
			if saw_header {
				return Err(Error::Protocol("EOF inside message header".into()));
			}
			return Ok(None);
		}

		let line = buf.trim();
		if line.is_empty() {
			if saw_header {
				break;
			}
			continue;
		}
		saw_header = true;

		if let Some((name, value)) = line.split_once(':')
			&& name.trim().eq_ignore_ascii_case("content-length")
		{
			let len = value.trim().parse().map_err(|_| Error::Protocol(format!("invalid Content-Length `{}`", value.trim())))?;
			content_length = Some(len);
		}
	}

	let length = content_length.ok_or_else(|| Error::Protocol("missing Content-Length".into()))?;
	if length > MAX_MESSAGE_LEN {
		return Err(Error::Protocol(format!("Content-Length {length} exceeds {MAX_MESSAGE_LEN}")));
	}
	let mut body = vec![0u8; length];
	reader.read_exact(&mut body).await?;
	Ok(Some(serde_json::from_slice(&body)?))
}
