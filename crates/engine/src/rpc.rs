//! JSON-RPC 2.0 plumbing for the engine process.

mod channel;
mod codec;
mod process;

pub use channel::{RequestId, ResponseError, RpcChannel};
pub use process::{ProcessRpc, ProcessRpcFactory, SlCoreRpc, SlCoreRpcFactory};
