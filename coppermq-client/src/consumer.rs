//! The pluggable consumer strategy of a channel.
//!
//! The channel owns the strategy value and threads every consume related
//! server event through it, in arrival order and on the actor task. Which
//! semantics consuming has - selective subscriptions, direct forwarding,
//! buffering - is entirely up to the strategy.

use std::any::Any;

use coppermq_proto::content::Content;
use coppermq_proto::method::{BasicCancelArgs, BasicCancelOkArgs, BasicConsumeArgs, BasicConsumeOkArgs, BasicDeliverArgs};
use log::debug;
use tokio::sync::mpsc;

use crate::error::ExitReason;
use crate::model::ChannelNumber;

/// Opaque message passed between an application and its consumer strategy
/// through the channel.
pub type ConsumerMessage = Box<dyn Any + Send>;

/// Callbacks of a consumer strategy. The channel does not interpret consume
/// semantics itself, it routes the consume lifecycle methods here.
pub trait ConsumerStrategy: Send {
    /// A `basic.consume-ok` arrived; `consume` is the request it answers.
    fn handle_consume_ok(&mut self, consume_ok: &BasicConsumeOkArgs, consume: &BasicConsumeArgs);

    /// A `basic.cancel-ok` arrived; `cancel` is the request it answers.
    fn handle_cancel_ok(&mut self, cancel_ok: &BasicCancelOkArgs, cancel: &BasicCancelArgs);

    /// The server cancelled the consumer on its own.
    fn handle_cancel(&mut self, cancel: &BasicCancelArgs);

    /// A message was delivered to one of the consumers of this channel.
    fn handle_deliver(&mut self, deliver: &BasicDeliverArgs, content: Content);

    /// Synchronous call forwarded from the application, see
    /// [`crate::channel::Channel::call_consumer`].
    fn handle_call(&mut self, msg: ConsumerMessage) -> ConsumerMessage;

    /// The channel is going away with the given reason.
    fn terminate(&mut self, reason: &ExitReason);
}

/// A message delivered to a consumer.
#[derive(Debug)]
pub struct DeliveredMessage {
    pub channel: ChannelNumber,
    pub consumer_tag: String,
    pub delivery_tag: u64,
    pub redelivered: bool,
    pub exchange: String,
    pub routing_key: String,
    pub content: Content,
}

/// A signal arriving at a [`SinkConsumer`] sink during consuming.
#[derive(Debug)]
pub enum ConsumerSignal {
    /// The consume request was acknowledged by the server.
    ConsumeOk { consumer_tag: String },
    Delivered(Box<DeliveredMessage>),
    /// The consumer was cancelled, either on client or on server initiative.
    Cancelled { consumer_tag: String },
    /// The channel is going away.
    Closed(ExitReason),
}

/// Consumer strategy forwarding every consume event into an unbounded sink,
/// so applications can consume with a plain `mpsc` receiver.
pub struct SinkConsumer {
    channel: ChannelNumber,
    sink: mpsc::UnboundedSender<ConsumerSignal>,
}

impl SinkConsumer {
    pub fn new(channel: ChannelNumber) -> (Self, mpsc::UnboundedReceiver<ConsumerSignal>) {
        let (sink, stream) = mpsc::unbounded_channel();

        (Self { channel, sink }, stream)
    }

    fn send(&self, signal: ConsumerSignal) {
        // the application dropped the stream, nothing left to notify
        let _ = self.sink.send(signal);
    }
}

impl ConsumerStrategy for SinkConsumer {
    fn handle_consume_ok(&mut self, consume_ok: &BasicConsumeOkArgs, consume: &BasicConsumeArgs) {
        debug!(
            "channel {} consuming queue {} as {}",
            self.channel, consume.queue, consume_ok.consumer_tag
        );

        self.send(ConsumerSignal::ConsumeOk {
            consumer_tag: consume_ok.consumer_tag.clone(),
        });
    }

    fn handle_cancel_ok(&mut self, cancel_ok: &BasicCancelOkArgs, _cancel: &BasicCancelArgs) {
        self.send(ConsumerSignal::Cancelled {
            consumer_tag: cancel_ok.consumer_tag.clone(),
        });
    }

    fn handle_cancel(&mut self, cancel: &BasicCancelArgs) {
        self.send(ConsumerSignal::Cancelled {
            consumer_tag: cancel.consumer_tag.clone(),
        });
    }

    fn handle_deliver(&mut self, deliver: &BasicDeliverArgs, content: Content) {
        debug!(
            "channel {} delivery {} of {} bytes",
            self.channel,
            deliver.delivery_tag,
            content.body_size()
        );

        self.send(ConsumerSignal::Delivered(Box::new(DeliveredMessage {
            channel: self.channel,
            consumer_tag: deliver.consumer_tag.clone(),
            delivery_tag: deliver.delivery_tag,
            redelivered: deliver.redelivered,
            exchange: deliver.exchange_name.clone(),
            routing_key: deliver.routing_key.clone(),
            content,
        })));
    }

    fn handle_call(&mut self, msg: ConsumerMessage) -> ConsumerMessage {
        // no call protocol here, hand the message back untouched
        msg
    }

    fn terminate(&mut self, reason: &ExitReason) {
        self.send(ConsumerSignal::Closed(reason.clone()));
    }
}

/// Generates a consumer tag unique enough for a client process.
pub fn generated_consumer_tag() -> String {
    format!("coppermq-{}", rand::random::<u128>())
}
