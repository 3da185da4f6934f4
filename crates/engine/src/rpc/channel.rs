//! Request/notification channel over a framed byte stream.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use sloop_worker::TaskClass;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::{mpsc, oneshot};

use super::codec::{read_message, write_message};
use crate::{Error, Result};

pub type RequestId = i64;

/// Error object of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct ResponseError {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<JsonValue>,
}

impl ResponseError {
	pub const METHOD_NOT_FOUND: i64 = -32601;

	pub fn method_not_found(method: &str) -> Self {
		Self {
			code: Self::METHOD_NOT_FOUND,
			message: format!("method not found: {method}"),
			data: None,
		}
	}
}

enum Outbound {
	Request {
		id: RequestId,
		method: String,
		params: JsonValue,
		reply: oneshot::Sender<Result<JsonValue>>,
	},
	Notify {
		method: String,
		params: JsonValue,
	},
}

/// Cloneable handle to a JSON-RPC peer.
///
/// The I/O loop stops when the peer closes its output, when a read or write
/// fails, or when every handle is dropped. Requests still pending at that
/// point fail with [`Error::ChannelStopped`].
#[derive(Clone)]
pub struct RpcChannel {
	name: Arc<str>,
	outbound: mpsc::UnboundedSender<Outbound>,
	next_id: Arc<AtomicI64>,
}

impl RpcChannel {
	/// Starts the I/O loop for `reader`/`writer`. `name` tags log events.
	pub fn spawn<R, W>(name: impl Into<Arc<str>>, reader: R, writer: W) -> Self
	where
		R: AsyncRead + Unpin + Send + 'static,
		W: AsyncWrite + Unpin + Send + 'static,
	{
		let name = name.into();
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
		sloop_worker::spawn(TaskClass::Supervisor, read_loop(Arc::clone(&name), reader, inbound_tx));
		sloop_worker::spawn(TaskClass::Supervisor, io_loop(Arc::clone(&name), writer, outbound_rx, inbound_rx));
		Self {
			name,
			outbound: outbound_tx,
			next_id: Arc::new(AtomicI64::new(1)),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Sends a request and waits for its result.
	pub async fn request(&self, method: &str, params: JsonValue) -> Result<JsonValue> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let (reply, rx) = oneshot::channel();
		self.outbound
			.send(Outbound::Request {
				id,
				method: method.to_owned(),
				params,
				reply,
			})
			.map_err(|_| Error::ChannelStopped)?;
		rx.await.map_err(|_| Error::ChannelStopped)?
	}

	/// Queues a notification.
	pub fn notify(&self, method: &str, params: JsonValue) -> Result<()> {
		self.outbound
			.send(Outbound::Notify {
				method: method.to_owned(),
				params,
			})
			.map_err(|_| Error::ChannelStopped)
	}

	/// True once the I/O loop has stopped.
	pub fn is_closed(&self) -> bool {
		self.outbound.is_closed()
	}
}

/// Reads frames on a dedicated task so the I/O loop never drops a partial read.
async fn read_loop<R>(name: Arc<str>, reader: R, inbound: mpsc::UnboundedSender<JsonValue>)
where
	R: AsyncRead + Unpin,
{
	let mut reader = BufReader::new(reader);
	let mut buf = String::new();
	loop {
		match read_message(&mut reader, &mut buf).await {
			Ok(Some(msg)) => {
				if inbound.send(msg).is_err() {
					break;
				}
			}
			Ok(None) => {
				tracing::debug!(peer = %name, "engine.rpc.eof");
				break;
			}
			Err(err) => {
				tracing::warn!(peer = %name, error = %err, "engine.rpc.read_failed");
				break;
			}
		}
	}
}

async fn io_loop<W>(
	name: Arc<str>,
	mut writer: W,
	mut outbound_rx: mpsc::UnboundedReceiver<Outbound>,
	mut inbound_rx: mpsc::UnboundedReceiver<JsonValue>,
) where
	W: AsyncWrite + Unpin,
{
	let mut pending: HashMap<RequestId, oneshot::Sender<Result<JsonValue>>> = HashMap::new();

	loop {
		tokio::select! {
			out = outbound_rx.recv() => {
				let Some(out) = out else { break };
				let written = match out {
					Outbound::Request { id, method, params, reply } => {
						let msg = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
						match write_message(&mut writer, &msg).await {
							Ok(()) => {
								pending.insert(id, reply);
								Ok(())
							}
							Err(err) => {
								let _ = reply.send(Err(Error::ChannelStopped));
								Err(err)
							}
						}
					}
					Outbound::Notify { method, params } => {
						let msg = json!({"jsonrpc": "2.0", "method": method, "params": params});
						write_message(&mut writer, &msg).await
					}
				};
				if let Err(err) = written {
					tracing::warn!(peer = %name, error = %err, "engine.rpc.write_failed");
					break;
				}
			}
			msg = inbound_rx.recv() => {
				let Some(msg) = msg else { break };
				if let Some(reply) = handle_inbound(&name, msg, &mut pending)
					&& let Err(err) = write_message(&mut writer, &reply).await
				{
					tracing::warn!(peer = %name, error = %err, "engine.rpc.write_failed");
					break;
				}
			}
		}
	}

	for (_, reply) in pending.drain() {
		let _ = reply.send(Err(Error::ChannelStopped));
	}
	outbound_rx.close();
	while let Ok(out) = outbound_rx.try_recv() {
		if let Outbound::Request { reply, .. } = out {
			let _ = reply.send(Err(Error::ChannelStopped));
		}
	}
	tracing::debug!(peer = %name, "engine.rpc.stopped");
}

/// Routes one inbound message. Returns a reply to write back, if any.
fn handle_inbound(name: &str, msg: JsonValue, pending: &mut HashMap<RequestId, oneshot::Sender<Result<JsonValue>>>) -> Option<JsonValue> {
	let method = msg.get("method").and_then(JsonValue::as_str);
	let id = msg.get("id");

	match (method, id) {
		(None, Some(id)) => {
			let Some(id) = id.as_i64() else {
				tracing::warn!(peer = %name, id = %id, "engine.rpc.unexpected_response_id");
				return None;
			};
			let Some(reply) = pending.remove(&id) else {
				tracing::warn!(peer = %name, id, "engine.rpc.unknown_response");
				return None;
			};
			let outcome = match msg.get("error") {
				Some(error) => match serde_json::from_value::<ResponseError>(error.clone()) {
					Ok(error) => Err(Error::Response(error)),
					Err(err) => Err(Error::Deserialize(err)),
				},
				None => Ok(msg.get("result").cloned().unwrap_or(JsonValue::Null)),
			};
			let _ = reply.send(outcome);
			None
		}
		(Some(method), None) => {
			tracing::debug!(peer = %name, method, "engine.rpc.notification");
			None
		}
		(Some(method), Some(id)) => {
			tracing::debug!(peer = %name, method, "engine.rpc.unhandled_request");
			Some(json!({"jsonrpc": "2.0", "id": id, "error": ResponseError::method_not_found(method)}))
		}
		(None, None) => {
			tracing::warn!(peer = %name, "engine.rpc.malformed_message");
			None
		}
	}
}
