//! The client side AMQP channel.
//!
//! Each server side channel is represented by one [`Channel`] actor spawned
//! with [`start_channel`]. The actor owns all channel state and processes one
//! event at a time from its inbox: application requests through the
//! [`Channel`] handle, server methods and lifecycle signals through the
//! [`ChannelControl`] handle held by the connection actor.

pub(crate) mod actor;
pub(crate) mod rpc;

use std::time::Duration;

use anyhow::Result;
use coppermq_proto::content::Content;
use coppermq_proto::method::{
    BasicAckArgs, BasicCancelArgs, BasicConsumeArgs, BasicPublishArgs, BasicQosArgs, ExchangeDeclareArgs,
    ExchangeDeleteArgs, Method, QueueBindArgs, QueueDeclareArgs, QueueDeleteArgs, QueueUnbindArgs,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::client_error;
use crate::consumer::{generated_consumer_tag, ConsumerMessage, ConsumerStrategy};
use crate::error::{ChannelExitReason, ClientError, ExitReason};
use crate::handler::{ConfirmSignal, FlowSignal, ReturnedMessage};
use crate::model::ChannelNumber;
use crate::transport::TransportConfig;

use self::actor::ChannelActor;

/// Result of a [`Channel::call`] or [`Channel::cast`], either the correlated
/// server reply or one of the admission sentinels.
#[derive(Debug)]
pub enum CallResult {
    /// The method was handed to the transport (asynchronous methods), or the
    /// expected untyped acknowledgement arrived.
    Ok,
    /// Rejected, the server throttled the channel with `channel.flow`.
    Blocked,
    /// Rejected, the channel is closing.
    Closing,
    /// The correlated reply method, with content when it carries one.
    Reply(Method, Option<Content>),
    /// The request was invalid and nothing was sent.
    Error(ClientError),
}

/// How the connection actor wants the channel to wind down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseType {
    /// Let in-flight RPCs drain within a budget before stopping.
    Flush,
    /// Stop right away.
    Abrupt,
}

pub(crate) enum ChannelEvent {
    Call {
        method: Method,
        content: Option<Content>,
        reply: oneshot::Sender<CallResult>,
    },
    Cast {
        method: Method,
        content: Option<Content>,
    },
    Close {
        code: u16,
        text: String,
        reply: oneshot::Sender<CallResult>,
    },
    Open {
        reply: oneshot::Sender<CallResult>,
    },
    NextPublishSeqNo {
        reply: oneshot::Sender<u64>,
    },
    WaitForConfirms {
        reply: oneshot::Sender<std::result::Result<bool, ClientError>>,
    },
    RegisterReturnHandler {
        sink: mpsc::UnboundedSender<ReturnedMessage>,
    },
    RegisterConfirmHandler {
        sink: mpsc::UnboundedSender<ConfirmSignal>,
    },
    RegisterFlowHandler {
        sink: mpsc::UnboundedSender<FlowSignal>,
    },
    UnregisterReturnHandler,
    UnregisterConfirmHandler,
    UnregisterFlowHandler,
    CallConsumer {
        msg: ConsumerMessage,
        reply: oneshot::Sender<ConsumerMessage>,
    },
    MethodFromServer {
        method: Method,
        content: Option<Content>,
    },
    ConnectionClosing {
        close_type: CloseType,
        reason: ExitReason,
    },
    Shutdown {
        reason: ExitReason,
    },
    SendCommand {
        method: Method,
        content: Option<Content>,
    },
    SendCommandSync {
        method: Method,
        content: Option<Content>,
        done: oneshot::Sender<()>,
    },
    SendCommandAndNotify {
        method: Method,
        content: Option<Content>,
        notify: oneshot::Sender<()>,
    },
    ChannelExit {
        reason: ChannelExitReason,
    },
}

/// Starts the actor of one channel.
///
/// The [`Channel`] handle goes to the application, the [`ChannelControl`]
/// handle stays with the connection actor which feeds server methods and
/// lifecycle signals into it. The join handle resolves to the structured
/// reason the actor stopped with.
pub fn start_channel(
    number: ChannelNumber,
    transport: TransportConfig,
    consumer: Box<dyn ConsumerStrategy>,
) -> (Channel, ChannelControl, JoinHandle<ExitReason>) {
    let (sink, events) = mpsc::unbounded_channel();

    let actor = ChannelActor::new(number, transport, consumer, events, sink.clone());
    let join = tokio::spawn(actor.run());

    (
        Channel {
            number,
            sink: sink.clone(),
        },
        ChannelControl { number, sink },
        join,
    )
}

/// Application facing handle of a channel.
///
/// All methods are served by the channel actor; synchronous calls suspend the
/// caller until the correlated reply arrives or the actor stops.
///
/// ```no_run
/// use coppermq_client::channel::Channel;
/// use coppermq_proto::method::ExchangeDeclareArgs;
///
/// async fn declare(channel: &Channel) -> anyhow::Result<()> {
///     let args = ExchangeDeclareArgs::default()
///         .exchange_name("logs")
///         .exchange_type("topic");
///
///     channel.exchange_declare(args).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Channel {
    number: ChannelNumber,
    sink: mpsc::UnboundedSender<ChannelEvent>,
}

impl Channel {
    pub fn number(&self) -> ChannelNumber {
        self.number
    }

    /// Sends a method. For synchronous methods the caller is suspended until
    /// the correlated reply arrives; asynchronous methods resolve with
    /// [`CallResult::Ok`] once the method was handed to the transport.
    pub async fn call(&self, method: Method) -> Result<CallResult> {
        self.call_inner(method, None).await
    }

    /// Like [`Channel::call`] for content-bearing methods.
    pub async fn call_with_content(&self, method: Method, content: Content) -> Result<CallResult> {
        self.call_inner(method, Some(content)).await
    }

    /// Sends a method without ever waiting for a reply. Errors are logged by
    /// the actor and dropped.
    pub fn cast(&self, method: Method) -> Result<()> {
        self.send_event(ChannelEvent::Cast { method, content: None })
    }

    /// Like [`Channel::cast`] for content-bearing methods.
    pub fn cast_with_content(&self, method: Method, content: Content) -> Result<()> {
        self.send_event(ChannelEvent::Cast {
            method,
            content: Some(content),
        })
    }

    /// Closes the channel normally and waits for the `channel.close-ok`.
    pub async fn close(&self) -> Result<()> {
        self.close_with(200, "Normal close").await
    }

    /// Closes the channel with an explicit reply code and text.
    pub async fn close_with(&self, code: u16, text: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();

        self.send_event(ChannelEvent::Close {
            code,
            text: text.to_string(),
            reply: tx,
        })?;

        match rx.await {
            Ok(CallResult::Ok) => Ok(()),
            Ok(CallResult::Closing) => {
                client_error!(Some(self.number), 504, "channel is already closing", 0)
            }
            Ok(other) => client_error!(
                Some(self.number),
                503,
                format!("unexpected close outcome {:?}", other),
                0
            ),
            Err(_) => client_error!(Some(self.number), 504, "channel terminated during close", 0),
        }
    }

    /// Sequence number the next `basic.publish` will take, 0 while the
    /// channel is not in confirm mode.
    pub async fn next_publish_seqno(&self) -> Result<u64> {
        let (tx, rx) = oneshot::channel();

        self.send_event(ChannelEvent::NextPublishSeqNo { reply: tx })?;

        match rx.await {
            Ok(seqno) => Ok(seqno),
            Err(_) => client_error!(Some(self.number), 504, "channel is terminated", 0),
        }
    }

    /// Waits until every published message since `confirm.select` got acked
    /// or nacked. Resolves to `Some(true)` when only acks were seen,
    /// `Some(false)` when there was a nack and `None` on timeout.
    pub async fn wait_for_confirms(&self, timeout: Duration) -> Result<Option<bool>> {
        let (tx, rx) = oneshot::channel();

        self.send_event(ChannelEvent::WaitForConfirms { reply: tx })?;

        let sleep = tokio::time::sleep(timeout);
        tokio::pin!(sleep);

        tokio::select! {
            result = rx => match result {
                Ok(Ok(only_acks)) => Ok(Some(only_acks)),
                Ok(Err(e)) => Err(anyhow::Error::new(e)),
                Err(_) => client_error!(Some(self.number), 504, "channel is terminated", 0),
            },
            _ = &mut sleep => Ok(None),
        }
    }

    /// Installs the sink receiving returned messages. One sink at most,
    /// registering replaces the previous one.
    pub fn register_return_handler(&self, sink: mpsc::UnboundedSender<ReturnedMessage>) -> Result<()> {
        self.send_event(ChannelEvent::RegisterReturnHandler { sink })
    }

    pub fn unregister_return_handler(&self) -> Result<()> {
        self.send_event(ChannelEvent::UnregisterReturnHandler)
    }

    /// Installs the sink receiving publisher confirms.
    pub fn register_confirm_handler(&self, sink: mpsc::UnboundedSender<ConfirmSignal>) -> Result<()> {
        self.send_event(ChannelEvent::RegisterConfirmHandler { sink })
    }

    pub fn unregister_confirm_handler(&self) -> Result<()> {
        self.send_event(ChannelEvent::UnregisterConfirmHandler)
    }

    /// Installs the sink receiving flow control notifications.
    pub fn register_flow_handler(&self, sink: mpsc::UnboundedSender<FlowSignal>) -> Result<()> {
        self.send_event(ChannelEvent::RegisterFlowHandler { sink })
    }

    pub fn unregister_flow_handler(&self) -> Result<()> {
        self.send_event(ChannelEvent::UnregisterFlowHandler)
    }

    /// Forwards a synchronous call into the consumer strategy of this channel
    /// and hands its reply back.
    pub async fn call_consumer(&self, msg: ConsumerMessage) -> Result<ConsumerMessage> {
        let (tx, rx) = oneshot::channel();

        self.send_event(ChannelEvent::CallConsumer { msg, reply: tx })?;

        match rx.await {
            Ok(reply) => Ok(reply),
            Err(_) => client_error!(Some(self.number), 504, "channel is terminated", 0),
        }
    }

    /// Declare exchange.
    pub async fn exchange_declare(&self, args: ExchangeDeclareArgs) -> Result<()> {
        self.call_expecting_reply(args.method()).await
    }

    /// Delete exchange.
    pub async fn exchange_delete(&self, args: ExchangeDeleteArgs) -> Result<()> {
        self.call_expecting_reply(args.method()).await
    }

    /// Declare queue.
    pub async fn queue_declare(&self, args: QueueDeclareArgs) -> Result<()> {
        self.call_expecting_reply(args.method()).await
    }

    /// Bind queue to exchange.
    pub async fn queue_bind(&self, args: QueueBindArgs) -> Result<()> {
        self.call_expecting_reply(args.method()).await
    }

    pub async fn queue_unbind(&self, args: QueueUnbindArgs) -> Result<()> {
        self.call_expecting_reply(args.method()).await
    }

    pub async fn queue_delete(&self, args: QueueDeleteArgs) -> Result<()> {
        self.call_expecting_reply(args.method()).await
    }

    pub async fn basic_qos(&self, args: BasicQosArgs) -> Result<()> {
        self.call_expecting_reply(args.method()).await
    }

    /// Puts the channel in confirm mode. From here on every publish takes a
    /// sequence number the server acknowledges.
    pub async fn confirm_select(&self) -> Result<()> {
        self.call_expecting_reply(coppermq_proto::method::confirm_select()).await
    }

    /// Start consuming a queue, returns the consumer tag the server
    /// acknowledged. Deliveries go through the consumer strategy of the
    /// channel.
    pub async fn basic_consume(&self, mut args: BasicConsumeArgs) -> Result<String> {
        if args.consumer_tag.is_empty() {
            args.consumer_tag = generated_consumer_tag();
        }

        match self.call(args.method()).await? {
            CallResult::Reply(Method::BasicConsumeOk(ok), _) => Ok(ok.consumer_tag),
            other => self.rejected(other),
        }
    }

    pub async fn basic_cancel(&self, consumer_tag: &str) -> Result<()> {
        self.call_expecting_reply(BasicCancelArgs::new(consumer_tag).method()).await
    }

    /// Publishes a message. Publishing is asynchronous, failures surface as
    /// returned messages or publisher confirms.
    pub fn basic_publish(&self, args: BasicPublishArgs, content: Content) -> Result<()> {
        self.cast_with_content(args.method(), content)
    }

    pub fn basic_ack(&self, delivery_tag: u64, multiple: bool) -> Result<()> {
        self.cast(BasicAckArgs::default().delivery_tag(delivery_tag).multiple(multiple).method())
    }

    async fn call_inner(&self, method: Method, content: Option<Content>) -> Result<CallResult> {
        let (tx, rx) = oneshot::channel();

        self.send_event(ChannelEvent::Call {
            method,
            content,
            reply: tx,
        })?;

        match rx.await {
            Ok(result) => Ok(result),
            Err(_) => client_error!(Some(self.number), 504, "channel terminated before replying", 0),
        }
    }

    async fn call_expecting_reply(&self, method: Method) -> Result<()> {
        match self.call(method).await? {
            CallResult::Ok | CallResult::Reply(..) => Ok(()),
            other => self.rejected(other),
        }
    }

    fn rejected<T>(&self, result: CallResult) -> Result<T> {
        match result {
            CallResult::Blocked => client_error!(Some(self.number), 504, "blocked by flow control", 0),
            CallResult::Closing => client_error!(Some(self.number), 504, "channel is closing", 0),
            CallResult::Error(e) => Err(anyhow::Error::new(e)),
            other => client_error!(Some(self.number), 503, format!("unexpected reply {:?}", other), 0),
        }
    }

    fn send_event(&self, event: ChannelEvent) -> Result<()> {
        if self.sink.send(event).is_err() {
            return client_error!(Some(self.number), 504, "channel is terminated", 0);
        }

        Ok(())
    }
}

/// Connection actor facing handle of a channel. Server methods, closing
/// signals and infrastructure faults are fed through here so applications
/// cannot forge them.
#[derive(Clone)]
pub struct ChannelControl {
    number: ChannelNumber,
    sink: mpsc::UnboundedSender<ChannelEvent>,
}

impl ChannelControl {
    pub fn number(&self) -> ChannelNumber {
        self.number
    }

    /// Issues `channel.open` and waits for the `channel.open-ok`. On a
    /// network transport this is the moment the writer gets created.
    pub async fn open(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();

        self.send_event(ChannelEvent::Open { reply: tx })?;

        match rx.await {
            Ok(CallResult::Ok) => Ok(()),
            Ok(other) => client_error!(
                Some(self.number),
                503,
                format!("unexpected open outcome {:?}", other),
                0
            ),
            Err(_) => client_error!(Some(self.number), 504, "channel terminated while opening", 0),
        }
    }

    /// A method arrived from the server for this channel, with its content
    /// when it carries one.
    pub fn method_from_server(&self, method: Method, content: Option<Content>) -> Result<()> {
        self.send_event(ChannelEvent::MethodFromServer { method, content })
    }

    /// The connection is closing; with [`CloseType::Flush`] queued RPCs may
    /// still drain within a budget.
    pub fn connection_closing(&self, close_type: CloseType, reason: ExitReason) -> Result<()> {
        self.send_event(ChannelEvent::ConnectionClosing { close_type, reason })
    }

    /// Stops the actor with the given reason.
    pub fn shutdown(&self, reason: ExitReason) -> Result<()> {
        self.send_event(ChannelEvent::Shutdown { reason })
    }

    /// Out-of-band failure report from the transport or the in-process
    /// broker.
    pub fn channel_exit(&self, reason: ChannelExitReason) -> Result<()> {
        self.send_event(ChannelEvent::ChannelExit { reason })
    }

    /// Direct transport path: the broker pushes a method (and content) into
    /// the channel.
    pub fn send_command(&self, method: Method, content: Option<Content>) -> Result<()> {
        self.send_event(ChannelEvent::SendCommand { method, content })
    }

    /// Like [`ChannelControl::send_command`] but acknowledged as soon as the
    /// actor picks it up.
    pub async fn send_command_sync(&self, method: Method, content: Option<Content>) -> Result<()> {
        let (tx, rx) = oneshot::channel();

        self.send_event(ChannelEvent::SendCommandSync {
            method,
            content,
            done: tx,
        })?;

        match rx.await {
            Ok(()) => Ok(()),
            Err(_) => client_error!(Some(self.number), 504, "channel is terminated", 0),
        }
    }

    /// Like [`ChannelControl::send_command`], notifying the producer once the
    /// command got dispatched.
    pub fn send_command_and_notify(
        &self,
        method: Method,
        content: Option<Content>,
        notify: oneshot::Sender<()>,
    ) -> Result<()> {
        self.send_event(ChannelEvent::SendCommandAndNotify {
            method,
            content,
            notify,
        })
    }

    fn send_event(&self, event: ChannelEvent) -> Result<()> {
        if self.sink.send(event).is_err() {
            return client_error!(Some(self.number), 504, "channel is terminated", 0);
        }

        Ok(())
    }
}
