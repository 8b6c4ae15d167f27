//! The channel actor: owns every piece of channel state and mutates it one
//! inbox event at a time.

use std::collections::BTreeSet;
use std::time::Duration;

use coppermq_proto::content::Content;
use coppermq_proto::exception::{AmqpError, ConnectionError};
use coppermq_proto::method::{ChannelFlowOkArgs, Method, MethodClass};
use log::{debug, error, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};

use crate::channel::rpc::{reply, PendingRpc, ReplySink, RpcQueue};
use crate::channel::{CallResult, ChannelEvent, CloseType};
use crate::consumer::ConsumerStrategy;
use crate::error::{ChannelExitReason, ClientError, ExitReason};
use crate::handler::{ConfirmSignal, FlowSignal, HandlerSlot, ReturnedMessage};
use crate::model::ChannelNumber;
use crate::transport::{Transport, TransportConfig};

/// RPC drain budget when the connection closes with flush.
const TIMEOUT_FLUSH: Duration = Duration::from_secs(60);
/// Budget for the `channel.close-ok` once the connection started closing.
const TIMEOUT_CLOSE_OK: Duration = Duration::from_secs(3);

#[derive(Debug)]
enum Closing {
    Open,
    /// The channel committed to closing itself, late server pushes are
    /// discarded.
    JustChannel,
    /// The connection is going down with the wrapped reason.
    Connection(ExitReason),
}

#[derive(Clone, Copy, Debug)]
enum TimerKind {
    Flush,
    CloseOk,
}

enum Gate {
    Admitted,
    Blocked,
    Closing,
}

pub(crate) struct ChannelActor {
    number: ChannelNumber,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    /// Kept for self posts: the drain shutdown and the asynchronous closer.
    self_sink: mpsc::UnboundedSender<ChannelEvent>,
    transport: Transport,
    rpc: RpcQueue,
    closing: Closing,
    return_handler: HandlerSlot<ReturnedMessage>,
    confirm_handler: HandlerSlot<ConfirmSignal>,
    flow_handler: HandlerSlot<FlowSignal>,
    /// 0 while confirms are disabled, otherwise the seqno the next publish
    /// takes.
    next_pub_seqno: u64,
    unconfirmed: BTreeSet<u64>,
    only_acks_received: bool,
    confirm_waiters: Vec<oneshot::Sender<Result<bool, ClientError>>>,
    flow_active: bool,
    consumer: Box<dyn ConsumerStrategy>,
    timer: Option<(TimerKind, Instant)>,
}

impl ChannelActor {
    pub(crate) fn new(
        number: ChannelNumber,
        transport: TransportConfig,
        consumer: Box<dyn ConsumerStrategy>,
        events: mpsc::UnboundedReceiver<ChannelEvent>,
        self_sink: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Self {
        Self {
            number,
            events,
            self_sink,
            transport: Transport::new(transport),
            rpc: RpcQueue::default(),
            closing: Closing::Open,
            return_handler: HandlerSlot::new("return"),
            confirm_handler: HandlerSlot::new("confirm"),
            flow_handler: HandlerSlot::new("flow"),
            next_pub_seqno: 0,
            unconfirmed: BTreeSet::new(),
            only_acks_received: true,
            confirm_waiters: Vec::new(),
            flow_active: true,
            consumer,
            timer: None,
        }
    }

    pub(crate) async fn run(mut self) -> ExitReason {
        let reason = self.event_loop().await.normalize();

        // pending reply sinks and parked confirm waiters drop with the actor,
        // unblocking their callers with an error
        self.consumer.terminate(&reason);

        if reason.is_normal() {
            debug!("channel {} terminated normally", self.number);
        } else {
            error!("channel {} terminated: {}", self.number, reason);
        }

        reason
    }

    async fn event_loop(&mut self) -> ExitReason {
        loop {
            let event = match self.timer {
                Some((kind, deadline)) => {
                    tokio::select! {
                        event = self.events.recv() => event,
                        _ = time::sleep_until(deadline) => {
                            return match kind {
                                TimerKind::Flush => ExitReason::TimedOutFlushingChannel,
                                TimerKind::CloseOk => ExitReason::TimedOutWaitingCloseOk,
                            };
                        }
                    }
                }
                None => self.events.recv().await,
            };

            match event {
                Some(event) => {
                    if let Some(reason) = self.handle_event(event) {
                        return reason;
                    }
                }
                None => {
                    // unreachable while self_sink lives, kept for teardown
                    return ExitReason::Normal;
                }
            }
        }
    }

    /// Processes one inbox event; `Some` stops the actor with that reason.
    fn handle_event(&mut self, event: ChannelEvent) -> Option<ExitReason> {
        match event {
            ChannelEvent::Call { method, content, reply } => {
                self.handle_method_to_server(method, content, Some(reply));
                None
            }
            ChannelEvent::Cast { method, content } => {
                self.handle_cast(method, content);
                None
            }
            ChannelEvent::Close { code, text, reply } => {
                self.handle_close(code, text, reply);
                None
            }
            ChannelEvent::Open { reply } => {
                self.rpc_top_half(Method::ChannelOpen, None, Some(reply));
                None
            }
            ChannelEvent::NextPublishSeqNo { reply } => {
                let _ = reply.send(self.next_pub_seqno);
                None
            }
            ChannelEvent::WaitForConfirms { reply } => {
                self.handle_wait_for_confirms(reply);
                None
            }
            ChannelEvent::RegisterReturnHandler { sink } => {
                self.return_handler.register(sink);
                None
            }
            ChannelEvent::RegisterConfirmHandler { sink } => {
                self.confirm_handler.register(sink);
                None
            }
            ChannelEvent::RegisterFlowHandler { sink } => {
                self.flow_handler.register(sink);
                None
            }
            ChannelEvent::UnregisterReturnHandler => {
                self.return_handler.unregister();
                None
            }
            ChannelEvent::UnregisterConfirmHandler => {
                self.confirm_handler.unregister();
                None
            }
            ChannelEvent::UnregisterFlowHandler => {
                self.flow_handler.unregister();
                None
            }
            ChannelEvent::CallConsumer { msg, reply } => {
                let _ = reply.send(self.consumer.handle_call(msg));
                None
            }
            ChannelEvent::MethodFromServer { method, content } => self.handle_method_from_server(method, content),
            ChannelEvent::ConnectionClosing { close_type, reason } => {
                self.handle_connection_closing(close_type, reason)
            }
            ChannelEvent::Shutdown { reason } => Some(reason),
            ChannelEvent::SendCommand { method, content } => self.handle_method_from_server(method, content),
            ChannelEvent::SendCommandSync { method, content, done } => {
                let _ = done.send(());
                self.handle_method_from_server(method, content)
            }
            ChannelEvent::SendCommandAndNotify { method, content, notify } => {
                let result = self.handle_method_from_server(method, content);
                let _ = notify.send(());
                result
            }
            ChannelEvent::ChannelExit { reason } => self.handle_channel_exit(reason),
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // Outbound pipeline
    ////////////////////////////////////////////////////////////////////////

    fn handle_method_to_server(&mut self, method: Method, content: Option<Content>, sink: ReplySink) {
        if let Some(err) = self.check_invalid_method(&method) {
            reply(sink, CallResult::Error(err));
            return;
        }

        match self.check_block(&content) {
            Gate::Closing => {
                reply(sink, CallResult::Closing);
                return;
            }
            Gate::Blocked => {
                reply(sink, CallResult::Blocked);
                return;
            }
            Gate::Admitted => {}
        }

        self.update_confirm_tracking(&method);
        self.rpc_top_half(method, content, sink);
    }

    fn handle_cast(&mut self, method: Method, content: Option<Content>) {
        if let Some(err) = self.check_invalid_method(&method) {
            error!("channel {} dropping cast: {}", self.number, err);
            return;
        }

        match self.check_block(&content) {
            Gate::Closing => {
                warn!("channel {} is closing, dropping {}", self.number, method.name());
            }
            Gate::Blocked => {
                warn!(
                    "channel {} is blocked by flow control, dropping {}",
                    self.number,
                    method.name()
                );
            }
            Gate::Admitted => {
                self.update_confirm_tracking(&method);
                self.rpc_top_half(method, content, None);
            }
        }
    }

    fn handle_close(&mut self, code: u16, text: String, reply_sink: oneshot::Sender<CallResult>) {
        let close = coppermq_proto::method::ChannelCloseArgs {
            code,
            text,
            class_id: 0,
            method_id: 0,
        }
        .method();

        match self.check_block(&None) {
            Gate::Admitted => self.rpc_top_half(close, None, Some(reply_sink)),
            _ => {
                let _ = reply_sink.send(CallResult::Closing);
            }
        }
    }

    /// An application must not drive the channel lifecycle through plain
    /// calls and connection class methods belong to the connection actor.
    fn check_invalid_method(&self, method: &Method) -> Option<ClientError> {
        let message = match method {
            Method::ChannelOpen => "a channel is opened by its connection, not by call",
            Method::ChannelClose(_) => "use the close operation instead of sending channel.close",
            m if m.info().class == MethodClass::Connection => "connection class methods belong to the connection actor",
            _ => return None,
        };

        Some(ClientError {
            channel: Some(self.number),
            code: ConnectionError::CommandInvalid as u16,
            message: message.to_string(),
            class_method: method.class_method(),
        })
    }

    /// Flow control only rejects content-bearing traffic, closing rejects
    /// everything.
    fn check_block(&self, content: &Option<Content>) -> Gate {
        match self.closing {
            Closing::Open => {
                if content.is_some() && !self.flow_active {
                    Gate::Blocked
                } else {
                    Gate::Admitted
                }
            }
            _ => Gate::Closing,
        }
    }

    fn update_confirm_tracking(&mut self, method: &Method) {
        match method {
            Method::ConfirmSelect(_) if self.next_pub_seqno == 0 => {
                self.next_pub_seqno = 1;
            }
            Method::BasicPublish(_) if self.next_pub_seqno > 0 => {
                self.unconfirmed.insert(self.next_pub_seqno);
                self.next_pub_seqno += 1;
            }
            _ => {}
        }
    }

    fn rpc_top_half(&mut self, method: Method, content: Option<Content>, sink: ReplySink) {
        let first = self.rpc.push(PendingRpc { sink, method, content });

        if first {
            self.do_rpc();
        }
    }

    /// Completes the head request with the correlated reply and keeps the
    /// queue draining.
    fn rpc_bottom_half(&mut self, result: CallResult) {
        if let Some(rpc) = self.rpc.pop() {
            reply(rpc.sink, result);
        }

        self.do_rpc();
    }

    /// Transmits queued requests until a synchronous one is in flight or the
    /// queue drains. Only the head is ever on the wire unanswered.
    fn do_rpc(&mut self) {
        loop {
            let (synchronous, starts_writer, starts_closing) = match self.rpc.head() {
                Some(head) => (
                    head.method.is_synchronous(),
                    matches!(head.method, Method::ChannelOpen),
                    matches!(head.method, Method::ChannelClose(_)),
                ),
                None => {
                    // drained under a closing connection: time to go
                    if let Closing::Connection(reason) = &self.closing {
                        let reason = ExitReason::ConnectionClosing(Box::new(reason.clone()));
                        let _ = self.self_sink.send(ChannelEvent::Shutdown { reason });
                    }
                    return;
                }
            };

            if starts_writer {
                self.transport.start_writer(self.number);
            }

            if starts_closing {
                self.closing = Closing::JustChannel;
            }

            if synchronous {
                // the head stays queued, its reply is produced by the inbound
                // path, or by a channel exit event if the transport failed
                if let Some(head) = self.rpc.head() {
                    if self
                        .transport
                        .send(self.number, head.method.clone(), head.content.clone())
                        .is_err()
                    {
                        error!("channel {} failed to transmit, awaiting channel exit", self.number);
                    }
                }

                return;
            }

            if let Some(rpc) = self.rpc.pop() {
                match self.transport.send(self.number, rpc.method, rpc.content) {
                    Ok(()) => reply(rpc.sink, CallResult::Ok),
                    Err(_) => {
                        error!("channel {} failed to transmit, awaiting channel exit", self.number);
                        return;
                    }
                }
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // Inbound pipeline
    ////////////////////////////////////////////////////////////////////////

    fn handle_method_from_server(&mut self, method: Method, content: Option<Content>) -> Option<ExitReason> {
        if method.info().class == MethodClass::Connection {
            let err = ConnectionError::CommandInvalid
                .into_amqp_error(method.class_method(), "connection class method on a non-zero channel");

            return self.server_misbehaved(err);
        }

        // once the channel committed to closing only the closing handshake
        // methods matter, late deliveries are discarded
        if matches!(self.closing, Closing::JustChannel)
            && !matches!(method, Method::ChannelClose(_) | Method::ChannelCloseOk)
        {
            debug!("channel {} is closing, dropping {}", self.number, method.name());
            return None;
        }

        self.handle_method(method, content)
    }

    fn handle_method(&mut self, method: Method, content: Option<Content>) -> Option<ExitReason> {
        match method {
            Method::ChannelOpenOk => {
                self.rpc_bottom_half(CallResult::Ok);
                None
            }
            Method::ChannelClose(args) => {
                if self.transport.send(self.number, Method::ChannelCloseOk, None).is_err() {
                    error!("channel {} could not acknowledge the server close", self.number);
                }

                Some(ExitReason::ServerInitiatedClose {
                    code: args.code,
                    text: args.text,
                })
            }
            Method::ChannelCloseOk => {
                self.rpc_bottom_half(CallResult::Ok);
                Some(ExitReason::Normal)
            }
            Method::BasicConsumeOk(consume_ok) => match self.rpc.pop() {
                Some(PendingRpc {
                    sink,
                    method: Method::BasicConsume(consume),
                    ..
                }) => {
                    self.consumer.handle_consume_ok(&consume_ok, &consume);
                    reply(sink, CallResult::Reply(Method::BasicConsumeOk(consume_ok), None));
                    self.do_rpc();
                    None
                }
                pending => {
                    if let Some(rpc) = pending {
                        self.rpc.requeue_head(rpc);
                    }

                    self.server_misbehaved(ConnectionError::CommandInvalid.into_amqp_error(
                        coppermq_proto::method::BASIC_CONSUME_OK,
                        "basic.consume-ok without a pending consume",
                    ))
                }
            },
            Method::BasicCancelOk(cancel_ok) => match self.rpc.pop() {
                Some(PendingRpc {
                    sink,
                    method: Method::BasicCancel(cancel),
                    ..
                }) => {
                    self.consumer.handle_cancel_ok(&cancel_ok, &cancel);
                    reply(sink, CallResult::Reply(Method::BasicCancelOk(cancel_ok), None));
                    self.do_rpc();
                    None
                }
                pending => {
                    if let Some(rpc) = pending {
                        self.rpc.requeue_head(rpc);
                    }

                    self.server_misbehaved(ConnectionError::CommandInvalid.into_amqp_error(
                        coppermq_proto::method::BASIC_CANCEL_OK,
                        "basic.cancel-ok without a pending cancel",
                    ))
                }
            },
            Method::BasicCancel(cancel) => {
                self.consumer.handle_cancel(&cancel);
                None
            }
            Method::BasicDeliver(deliver) => {
                let content = content.unwrap_or_else(|| {
                    warn!("channel {} delivery without content", self.number);
                    Content::default()
                });

                self.consumer.handle_deliver(&deliver, content);
                None
            }
            Method::BasicReturn(ret) => {
                let content = content.unwrap_or_default();

                self.return_handler.deliver(ReturnedMessage { ret, content });
                None
            }
            Method::BasicAck(ack) => {
                self.confirm_handler.deliver(ConfirmSignal::Ack(ack.clone()));
                self.update_unconfirmed(ack.delivery_tag, ack.multiple, false);
                None
            }
            Method::BasicNack(nack) => {
                let (delivery_tag, multiple) = (nack.delivery_tag, nack.is_multiple());

                self.confirm_handler.deliver(ConfirmSignal::Nack(nack));
                self.update_unconfirmed(delivery_tag, multiple, true);
                None
            }
            Method::ChannelFlow(flow) => {
                self.flow_handler.deliver(FlowSignal { active: flow.active });
                self.flow_active = flow.active;

                // the flow-ok is queued behind the in-flight requests on
                // purpose: the queue drains before the server sees the
                // acknowledgement, so no further content races out
                self.rpc_top_half(ChannelFlowOkArgs::new(flow.active).method(), None, None);
                None
            }
            other => {
                if self.rpc.is_empty() {
                    return self.server_misbehaved(
                        ConnectionError::CommandInvalid
                            .into_amqp_error(other.class_method(), "reply without a pending request"),
                    );
                }

                self.rpc_bottom_half(CallResult::Reply(other, content));
                None
            }
        }
    }

    fn update_unconfirmed(&mut self, delivery_tag: u64, multiple: bool, nack: bool) {
        if self.next_pub_seqno == 0 {
            return;
        }

        if nack {
            self.only_acks_received = false;
        }

        if multiple {
            self.unconfirmed.retain(|&seqno| seqno > delivery_tag);
        } else {
            self.unconfirmed.remove(&delivery_tag);
        }

        if self.unconfirmed.is_empty() {
            let only_acks = self.only_acks_received;

            for waiter in self.confirm_waiters.drain(..) {
                let _ = waiter.send(Ok(only_acks));
            }

            self.only_acks_received = true;
        }
    }

    fn handle_wait_for_confirms(&mut self, reply: oneshot::Sender<Result<bool, ClientError>>) {
        if self.next_pub_seqno == 0 {
            let _ = reply.send(Err(ClientError {
                channel: Some(self.number),
                code: ConnectionError::CommandInvalid as u16,
                message: "channel is not in confirm mode".to_string(),
                class_method: coppermq_proto::method::CONFIRM_SELECT,
            }));
        } else if self.unconfirmed.is_empty() {
            let _ = reply.send(Ok(self.only_acks_received));
        } else {
            self.confirm_waiters.push(reply);
        }
    }

    ////////////////////////////////////////////////////////////////////////
    // Closing and failures
    ////////////////////////////////////////////////////////////////////////

    fn handle_connection_closing(&mut self, close_type: CloseType, reason: ExitReason) -> Option<ExitReason> {
        let previous = std::mem::replace(&mut self.closing, Closing::Connection(reason.clone()));

        match (close_type, previous, self.rpc.is_empty()) {
            (CloseType::Flush, Closing::Open, false) => {
                self.timer = Some((TimerKind::Flush, Instant::now() + TIMEOUT_FLUSH));
                None
            }
            (CloseType::Flush, Closing::JustChannel, false) => {
                self.timer = Some((TimerKind::CloseOk, Instant::now() + TIMEOUT_CLOSE_OK));
                None
            }
            _ => Some(ExitReason::ConnectionClosing(Box::new(reason))),
        }
    }

    fn handle_channel_exit(&mut self, reason: ChannelExitReason) -> Option<ExitReason> {
        match reason {
            ChannelExitReason::Amqp(err) => {
                error!("channel {} received {}", self.number, err);

                if err.is_hard() {
                    Some(ExitReason::ConnectionClosing(Box::new(
                        ExitReason::ServerInitiatedHardClose {
                            code: err.code,
                            text: err.text,
                        },
                    )))
                } else {
                    self.spawn_closer(err.code, err.text);
                    None
                }
            }
            ChannelExitReason::Died(reason) => {
                error!("channel {} infrastructure died: {}", self.number, reason);
                Some(ExitReason::InfrastructureDied(reason))
            }
        }
    }

    /// A connection class method on this channel, or a reply out of order.
    /// Hard errors stop the actor, soft ones make it close itself carrying
    /// the mapped exception.
    fn server_misbehaved(&mut self, err: AmqpError) -> Option<ExitReason> {
        error!("channel {} server misbehaved: {}", self.number, err);

        if err.is_hard() {
            Some(ExitReason::ServerMisbehaved(err))
        } else {
            self.spawn_closer(err.code, err.text);
            None
        }
    }

    /// Closing inline from the inbound path would re-enter the RPC engine,
    /// so the close goes through the inbox like any application close.
    fn spawn_closer(&self, code: u16, text: String) {
        let sink = self.self_sink.clone();

        tokio::spawn(async move {
            let (tx, rx) = oneshot::channel();

            if sink.send(ChannelEvent::Close { code, text, reply: tx }).is_ok() {
                let _ = rx.await;
            }
        });
    }
}
