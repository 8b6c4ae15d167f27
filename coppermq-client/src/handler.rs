//! Sinks for server pushed events which are not consumed messages: returned
//! publishes, publisher confirms and flow control notifications.

use coppermq_proto::content::Content;
use coppermq_proto::method::{BasicAckArgs, BasicNackArgs, BasicReturnArgs};
use log::warn;
use tokio::sync::mpsc;

/// Publisher confirm pushed by the server in confirm mode, forwarded verbatim.
#[derive(Debug)]
pub enum ConfirmSignal {
    Ack(BasicAckArgs),
    Nack(BasicNackArgs),
}

/// An unroutable mandatory or immediate message handed back by the server.
#[derive(Debug)]
pub struct ReturnedMessage {
    pub ret: BasicReturnArgs,
    pub content: Content,
}

/// Channel level throttling notification, mirrors `channel.flow`.
#[derive(Debug)]
pub struct FlowSignal {
    pub active: bool,
}

/// Holds at most one sink per event kind. Registering replaces the previous
/// sink, a dead sink clears the slot on the next delivery attempt.
pub(crate) struct HandlerSlot<T> {
    name: &'static str,
    sink: Option<mpsc::UnboundedSender<T>>,
}

impl<T: std::fmt::Debug> HandlerSlot<T> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self { name, sink: None }
    }

    pub(crate) fn register(&mut self, sink: mpsc::UnboundedSender<T>) {
        self.sink.replace(sink);
    }

    pub(crate) fn unregister(&mut self) {
        self.sink = None;
    }

    /// Delivers the event to the registered sink. Events without a live sink
    /// are logged and dropped.
    pub(crate) fn deliver(&mut self, event: T) {
        match &self.sink {
            Some(sink) => {
                if sink.send(event).is_err() {
                    warn!("{} handler went away, clearing the slot", self.name);
                    self.sink = None;
                }
            }
            None => warn!("no {} handler registered, dropping {:?}", self.name, event),
        }
    }
}
