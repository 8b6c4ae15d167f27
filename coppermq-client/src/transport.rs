//! The transport facade of a channel: methods either go to a writer actor
//! serializing frames to the socket, or straight into an in-process broker.

use coppermq_proto::content::Content;
use coppermq_proto::method::Method;
use log::debug;
use tokio::sync::mpsc;

use crate::model::ChannelNumber;

/// A method leaving the channel towards the wire or the in-process broker.
#[derive(Debug)]
pub struct OutgoingMethod {
    pub channel: ChannelNumber,
    pub method: Method,
    pub content: Option<Content>,
}

/// Inbox of a writer actor or of an in-process broker channel routine.
pub type OutgoingSink = mpsc::UnboundedSender<OutgoingMethod>;

/// One-shot factory starting the writer of this channel. Invoked exactly when
/// the channel issues `channel.open`.
pub type StartWriter = Box<dyn FnOnce() -> OutgoingSink + Send>;

/// How a channel reaches the server.
pub enum TransportConfig {
    /// Frames are serialized by a writer which owns its end of the socket.
    /// The writer is created lazily when the channel opens.
    Network { start_writer: StartWriter },
    /// In-process broker bypass, no socket framing involved.
    Direct { broker: OutgoingSink },
}

/// Raised when the sink behind the facade is gone. The channel does not act
/// on it directly, the infrastructure reports the failure out-of-band as a
/// channel exit event.
#[derive(Debug)]
pub(crate) struct TransportFailed;

pub(crate) enum Transport {
    Network {
        writer: Option<OutgoingSink>,
        start_writer: Option<StartWriter>,
    },
    Direct {
        broker: OutgoingSink,
    },
}

impl Transport {
    pub(crate) fn new(config: TransportConfig) -> Self {
        match config {
            TransportConfig::Network { start_writer } => Transport::Network {
                writer: None,
                start_writer: Some(start_writer),
            },
            TransportConfig::Direct { broker } => Transport::Direct { broker },
        }
    }

    /// Creates the writer if this is a network transport without one. Only
    /// the `channel.open` path calls this.
    pub(crate) fn start_writer(&mut self, channel: ChannelNumber) {
        if let Transport::Network { writer, start_writer } = self {
            if writer.is_none() {
                if let Some(start) = start_writer.take() {
                    debug!("starting writer of channel {}", channel);
                    writer.replace(start());
                }
            }
        }
    }

    /// Hands a method and its content over. A dead or missing sink is
    /// reported to the caller but must not take the actor down synchronously.
    pub(crate) fn send(
        &self,
        channel: ChannelNumber,
        method: Method,
        content: Option<Content>,
    ) -> Result<(), TransportFailed> {
        let outgoing = OutgoingMethod {
            channel,
            method,
            content,
        };

        let sink = match self {
            Transport::Network { writer: Some(w), .. } => w,
            Transport::Network { writer: None, .. } => return Err(TransportFailed),
            Transport::Direct { broker } => broker,
        };

        sink.send(outgoing).map_err(|_| TransportFailed)
    }
}
