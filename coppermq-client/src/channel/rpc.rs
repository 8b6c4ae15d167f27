//! The FIFO of outbound synchronous requests.
//!
//! AMQP 0-9-1 has no correlation id; the protocol guarantees in-order
//! synchronous replies per channel, so replies are matched to the head of
//! this queue positionally. The head is the single request in flight,
//! everything behind it waits its turn.

use std::collections::VecDeque;

use coppermq_proto::content::Content;
use coppermq_proto::method::Method;
use tokio::sync::oneshot;

use super::CallResult;

/// Reply sink of a pending request; `None` for casts and internally
/// originated methods.
pub(crate) type ReplySink = Option<oneshot::Sender<CallResult>>;

pub(crate) struct PendingRpc {
    pub sink: ReplySink,
    pub method: Method,
    pub content: Option<Content>,
}

#[derive(Default)]
pub(crate) struct RpcQueue {
    requests: VecDeque<PendingRpc>,
}

impl RpcQueue {
    pub(crate) fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Enqueues a request, returns whether it became the head.
    pub(crate) fn push(&mut self, rpc: PendingRpc) -> bool {
        self.requests.push_back(rpc);
        self.requests.len() == 1
    }

    /// Puts the in-flight request back to the head while its reply is
    /// outstanding.
    pub(crate) fn requeue_head(&mut self, rpc: PendingRpc) {
        self.requests.push_front(rpc);
    }

    pub(crate) fn head(&self) -> Option<&PendingRpc> {
        self.requests.front()
    }

    pub(crate) fn pop(&mut self) -> Option<PendingRpc> {
        self.requests.pop_front()
    }
}

/// Completes a caller, tolerating callers which gave up waiting.
pub(crate) fn reply(sink: ReplySink, result: CallResult) {
    if let Some(sink) = sink {
        let _ = sink.send(result);
    }
}
