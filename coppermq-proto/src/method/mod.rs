mod basic;
mod channel;
mod confirm;
mod connection;
mod exchange;
mod queue;

pub use self::{
    basic::{
        BasicAckArgs, BasicCancelArgs, BasicCancelOkArgs, BasicConsumeArgs, BasicConsumeFlags, BasicConsumeOkArgs,
        BasicDeliverArgs, BasicGetArgs, BasicGetOkArgs, BasicNackArgs, BasicNackFlags, BasicPublishArgs,
        BasicPublishFlags, BasicQosArgs, BasicRecoverArgs, BasicRejectArgs, BasicReturnArgs,
    },
    channel::{channel_close, ChannelCloseArgs, ChannelFlowArgs, ChannelFlowOkArgs},
    confirm::{confirm_select, ConfirmSelectArgs},
    connection::{
        ConnectionCloseArgs, ConnectionOpenArgs, ConnectionStartArgs, ConnectionStartOkArgs, ConnectionTuneArgs,
        ConnectionTuneOkArgs,
    },
    exchange::{ExchangeDeclareArgs, ExchangeDeclareFlags, ExchangeDeleteArgs, ExchangeDeleteFlags},
    queue::{
        QueueBindArgs, QueueDeclareArgs, QueueDeclareFlags, QueueDeclareOkArgs, QueueDeleteArgs, QueueDeleteFlags,
        QueueDeleteOkArgs, QueuePurgeArgs, QueuePurgeOkArgs, QueueUnbindArgs,
    },
};

use std::collections::HashMap;

pub const CONNECTION_START: u32 = 0x000A000A;
pub const CONNECTION_START_OK: u32 = 0x000A000B;
pub const CONNECTION_TUNE: u32 = 0x000A001E;
pub const CONNECTION_TUNE_OK: u32 = 0x000A001F;
pub const CONNECTION_OPEN: u32 = 0x000A0028;
pub const CONNECTION_OPEN_OK: u32 = 0x000A0029;
pub const CONNECTION_CLOSE: u32 = 0x000A0032;
pub const CONNECTION_CLOSE_OK: u32 = 0x000A0033;

pub const CHANNEL_OPEN: u32 = 0x0014000A;
pub const CHANNEL_OPEN_OK: u32 = 0x0014000B;
pub const CHANNEL_FLOW: u32 = 0x00140014;
pub const CHANNEL_FLOW_OK: u32 = 0x00140015;
pub const CHANNEL_CLOSE: u32 = 0x00140028;
pub const CHANNEL_CLOSE_OK: u32 = 0x00140029;

pub const EXCHANGE_DECLARE: u32 = 0x0028000A;
pub const EXCHANGE_DECLARE_OK: u32 = 0x0028000B;
pub const EXCHANGE_DELETE: u32 = 0x00280014;
pub const EXCHANGE_DELETE_OK: u32 = 0x00280015;

pub const QUEUE_DECLARE: u32 = 0x0032000A;
pub const QUEUE_DECLARE_OK: u32 = 0x0032000B;
pub const QUEUE_BIND: u32 = 0x00320014;
pub const QUEUE_BIND_OK: u32 = 0x00320015;
pub const QUEUE_PURGE: u32 = 0x0032001E;
pub const QUEUE_PURGE_OK: u32 = 0x0032001F;
pub const QUEUE_DELETE: u32 = 0x00320028;
pub const QUEUE_DELETE_OK: u32 = 0x00320029;
pub const QUEUE_UNBIND: u32 = 0x00320032;
pub const QUEUE_UNBIND_OK: u32 = 0x00320033;

pub const BASIC_QOS: u32 = 0x003C000A;
pub const BASIC_QOS_OK: u32 = 0x003C000B;
pub const BASIC_CONSUME: u32 = 0x003C0014;
pub const BASIC_CONSUME_OK: u32 = 0x003C0015;
pub const BASIC_CANCEL: u32 = 0x003C001E;
pub const BASIC_CANCEL_OK: u32 = 0x003C001F;
pub const BASIC_PUBLISH: u32 = 0x003C0028;
pub const BASIC_RETURN: u32 = 0x003C0032;
pub const BASIC_DELIVER: u32 = 0x003C003C;
pub const BASIC_GET: u32 = 0x003C0046;
pub const BASIC_GET_OK: u32 = 0x003C0047;
pub const BASIC_GET_EMPTY: u32 = 0x003C0048;
pub const BASIC_ACK: u32 = 0x003C0050;
pub const BASIC_REJECT: u32 = 0x003C005A;
pub const BASIC_RECOVER: u32 = 0x003C006E;
pub const BASIC_RECOVER_OK: u32 = 0x003C006F;
pub const BASIC_NACK: u32 = 0x003C0078;

pub const CONFIRM_SELECT: u32 = 0x0055000A;
pub const CONFIRM_SELECT_OK: u32 = 0x0055000B;

pub const TX_SELECT: u32 = 0x005A000A;
pub const TX_SELECT_OK: u32 = 0x005A000B;
pub const TX_COMMIT: u32 = 0x005A0014;
pub const TX_COMMIT_OK: u32 = 0x005A0015;
pub const TX_ROLLBACK: u32 = 0x005A001E;
pub const TX_ROLLBACK_OK: u32 = 0x005A001F;

/// AMQP channel number
pub type Channel = u16;
/// AMQP class id and method id packed in one number
pub type ClassMethod = u32;
/// AMQP method class id
pub type ClassId = u16;

pub fn split_class_method(cm: ClassMethod) -> (u16, u16) {
    ((cm >> 16) as u16, (cm & 0x0000FFFF) as u16)
}

pub fn unify_class_method(class: u16, method: u16) -> ClassMethod {
    ((class as u32) << 16) | (method as u32)
}

/// Value of a field in an AMQP field table.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    LongInt(i32),
    LongLongInt(i64),
    LongString(String),
    FieldTable(FieldTable),
}

/// Field table of method arguments and message headers.
pub type FieldTable = HashMap<String, FieldValue>;

/// The class a method belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodClass {
    Connection,
    Channel,
    Exchange,
    Queue,
    Basic,
    Confirm,
    Tx,
}

impl MethodClass {
    pub fn class_id(self) -> ClassId {
        match self {
            MethodClass::Connection => 10,
            MethodClass::Channel => 20,
            MethodClass::Exchange => 40,
            MethodClass::Queue => 50,
            MethodClass::Basic => 60,
            MethodClass::Confirm => 85,
            MethodClass::Tx => 90,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MethodClass::Connection => "connection",
            MethodClass::Channel => "channel",
            MethodClass::Exchange => "exchange",
            MethodClass::Queue => "queue",
            MethodClass::Basic => "basic",
            MethodClass::Confirm => "confirm",
            MethodClass::Tx => "tx",
        }
    }
}

/// Classification of a method, see [`Method::info`].
#[derive(Clone, Copy, Debug)]
pub struct MethodInfo {
    pub class: MethodClass,
    pub class_id: ClassId,
    /// A synchronous method expects a matching reply method on the same
    /// channel before another synchronous method can be correlated.
    pub synchronous: bool,
}

/// Represents all AMQP methods the client deals with.
///
/// Method argument structs live in the per-class submodules and follow the
/// builder style, finishing with `method()`. The tx class methods carry no
/// arguments, so they have no args struct.
#[derive(Clone, Debug)]
pub enum Method {
    ConnectionStart(ConnectionStartArgs),
    ConnectionStartOk(ConnectionStartOkArgs),
    ConnectionTune(ConnectionTuneArgs),
    ConnectionTuneOk(ConnectionTuneOkArgs),
    ConnectionOpen(ConnectionOpenArgs),
    ConnectionOpenOk,
    ConnectionClose(ConnectionCloseArgs),
    ConnectionCloseOk,
    ChannelOpen,
    ChannelOpenOk,
    ChannelFlow(ChannelFlowArgs),
    ChannelFlowOk(ChannelFlowOkArgs),
    ChannelClose(ChannelCloseArgs),
    ChannelCloseOk,
    ExchangeDeclare(ExchangeDeclareArgs),
    ExchangeDeclareOk,
    ExchangeDelete(ExchangeDeleteArgs),
    ExchangeDeleteOk,
    QueueDeclare(QueueDeclareArgs),
    QueueDeclareOk(QueueDeclareOkArgs),
    QueueBind(QueueBindArgs),
    QueueBindOk,
    QueuePurge(QueuePurgeArgs),
    QueuePurgeOk(QueuePurgeOkArgs),
    QueueDelete(QueueDeleteArgs),
    QueueDeleteOk(QueueDeleteOkArgs),
    QueueUnbind(QueueUnbindArgs),
    QueueUnbindOk,
    BasicQos(BasicQosArgs),
    BasicQosOk,
    BasicConsume(BasicConsumeArgs),
    BasicConsumeOk(BasicConsumeOkArgs),
    BasicCancel(BasicCancelArgs),
    BasicCancelOk(BasicCancelOkArgs),
    BasicPublish(BasicPublishArgs),
    BasicReturn(BasicReturnArgs),
    BasicDeliver(BasicDeliverArgs),
    BasicGet(BasicGetArgs),
    BasicGetOk(BasicGetOkArgs),
    BasicGetEmpty,
    BasicAck(BasicAckArgs),
    BasicReject(BasicRejectArgs),
    BasicNack(BasicNackArgs),
    BasicRecover(BasicRecoverArgs),
    BasicRecoverOk,
    ConfirmSelect(ConfirmSelectArgs),
    ConfirmSelectOk,
    TxSelect,
    TxSelectOk,
    TxCommit,
    TxCommitOk,
    TxRollback,
    TxRollbackOk,
}

impl Method {
    /// Packed class id and method id of this method.
    pub fn class_method(&self) -> ClassMethod {
        use Method::*;

        match self {
            ConnectionStart(_) => CONNECTION_START,
            ConnectionStartOk(_) => CONNECTION_START_OK,
            ConnectionTune(_) => CONNECTION_TUNE,
            ConnectionTuneOk(_) => CONNECTION_TUNE_OK,
            ConnectionOpen(_) => CONNECTION_OPEN,
            ConnectionOpenOk => CONNECTION_OPEN_OK,
            ConnectionClose(_) => CONNECTION_CLOSE,
            ConnectionCloseOk => CONNECTION_CLOSE_OK,
            ChannelOpen => CHANNEL_OPEN,
            ChannelOpenOk => CHANNEL_OPEN_OK,
            ChannelFlow(_) => CHANNEL_FLOW,
            ChannelFlowOk(_) => CHANNEL_FLOW_OK,
            ChannelClose(_) => CHANNEL_CLOSE,
            ChannelCloseOk => CHANNEL_CLOSE_OK,
            ExchangeDeclare(_) => EXCHANGE_DECLARE,
            ExchangeDeclareOk => EXCHANGE_DECLARE_OK,
            ExchangeDelete(_) => EXCHANGE_DELETE,
            ExchangeDeleteOk => EXCHANGE_DELETE_OK,
            QueueDeclare(_) => QUEUE_DECLARE,
            QueueDeclareOk(_) => QUEUE_DECLARE_OK,
            QueueBind(_) => QUEUE_BIND,
            QueueBindOk => QUEUE_BIND_OK,
            QueuePurge(_) => QUEUE_PURGE,
            QueuePurgeOk(_) => QUEUE_PURGE_OK,
            QueueDelete(_) => QUEUE_DELETE,
            QueueDeleteOk(_) => QUEUE_DELETE_OK,
            QueueUnbind(_) => QUEUE_UNBIND,
            QueueUnbindOk => QUEUE_UNBIND_OK,
            BasicQos(_) => BASIC_QOS,
            BasicQosOk => BASIC_QOS_OK,
            BasicConsume(_) => BASIC_CONSUME,
            BasicConsumeOk(_) => BASIC_CONSUME_OK,
            BasicCancel(_) => BASIC_CANCEL,
            BasicCancelOk(_) => BASIC_CANCEL_OK,
            BasicPublish(_) => BASIC_PUBLISH,
            BasicReturn(_) => BASIC_RETURN,
            BasicDeliver(_) => BASIC_DELIVER,
            BasicGet(_) => BASIC_GET,
            BasicGetOk(_) => BASIC_GET_OK,
            BasicGetEmpty => BASIC_GET_EMPTY,
            BasicAck(_) => BASIC_ACK,
            BasicReject(_) => BASIC_REJECT,
            BasicNack(_) => BASIC_NACK,
            BasicRecover(_) => BASIC_RECOVER,
            BasicRecoverOk => BASIC_RECOVER_OK,
            ConfirmSelect(_) => CONFIRM_SELECT,
            ConfirmSelectOk => CONFIRM_SELECT_OK,
            TxSelect => TX_SELECT,
            TxSelectOk => TX_SELECT_OK,
            TxCommit => TX_COMMIT,
            TxCommitOk => TX_COMMIT_OK,
            TxRollback => TX_ROLLBACK,
            TxRollbackOk => TX_ROLLBACK_OK,
        }
    }

    /// Classifies the method: its class and whether the protocol contract
    /// requires a reply method before the next synchronous method can be
    /// correlated.
    ///
    /// Classification is per method type; a `no_wait` consume still counts as
    /// synchronous.
    pub fn info(&self) -> MethodInfo {
        use Method::*;

        let (class, synchronous) = match self {
            ConnectionStart(_) | ConnectionTune(_) | ConnectionOpen(_) | ConnectionClose(_) => {
                (MethodClass::Connection, true)
            }
            ConnectionStartOk(_) | ConnectionTuneOk(_) | ConnectionOpenOk | ConnectionCloseOk => {
                (MethodClass::Connection, false)
            }
            ChannelOpen | ChannelFlow(_) | ChannelClose(_) => (MethodClass::Channel, true),
            ChannelOpenOk | ChannelFlowOk(_) | ChannelCloseOk => (MethodClass::Channel, false),
            ExchangeDeclare(_) | ExchangeDelete(_) => (MethodClass::Exchange, true),
            ExchangeDeclareOk | ExchangeDeleteOk => (MethodClass::Exchange, false),
            QueueDeclare(_) | QueueBind(_) | QueuePurge(_) | QueueDelete(_) | QueueUnbind(_) => {
                (MethodClass::Queue, true)
            }
            QueueDeclareOk(_) | QueueBindOk | QueuePurgeOk(_) | QueueDeleteOk(_) | QueueUnbindOk => {
                (MethodClass::Queue, false)
            }
            BasicQos(_) | BasicConsume(_) | BasicCancel(_) | BasicGet(_) | BasicRecover(_) => (MethodClass::Basic, true),
            BasicQosOk | BasicConsumeOk(_) | BasicCancelOk(_) | BasicPublish(_) | BasicReturn(_) | BasicDeliver(_)
            | BasicGetOk(_) | BasicGetEmpty | BasicAck(_) | BasicReject(_) | BasicNack(_) | BasicRecoverOk => {
                (MethodClass::Basic, false)
            }
            ConfirmSelect(_) => (MethodClass::Confirm, true),
            ConfirmSelectOk => (MethodClass::Confirm, false),
            TxSelect | TxCommit | TxRollback => (MethodClass::Tx, true),
            TxSelectOk | TxCommitOk | TxRollbackOk => (MethodClass::Tx, false),
        };

        MethodInfo {
            class,
            class_id: class.class_id(),
            synchronous,
        }
    }

    pub fn is_synchronous(&self) -> bool {
        self.info().synchronous
    }

    /// A content-bearing method travels with a (properties, payload) body.
    pub fn has_content(&self) -> bool {
        matches!(
            self,
            Method::BasicPublish(_) | Method::BasicReturn(_) | Method::BasicDeliver(_) | Method::BasicGetOk(_)
        )
    }

    /// Protocol name of the method, for logging.
    pub fn name(&self) -> &'static str {
        use Method::*;

        match self {
            ConnectionStart(_) => "connection.start",
            ConnectionStartOk(_) => "connection.start-ok",
            ConnectionTune(_) => "connection.tune",
            ConnectionTuneOk(_) => "connection.tune-ok",
            ConnectionOpen(_) => "connection.open",
            ConnectionOpenOk => "connection.open-ok",
            ConnectionClose(_) => "connection.close",
            ConnectionCloseOk => "connection.close-ok",
            ChannelOpen => "channel.open",
            ChannelOpenOk => "channel.open-ok",
            ChannelFlow(_) => "channel.flow",
            ChannelFlowOk(_) => "channel.flow-ok",
            ChannelClose(_) => "channel.close",
            ChannelCloseOk => "channel.close-ok",
            ExchangeDeclare(_) => "exchange.declare",
            ExchangeDeclareOk => "exchange.declare-ok",
            ExchangeDelete(_) => "exchange.delete",
            ExchangeDeleteOk => "exchange.delete-ok",
            QueueDeclare(_) => "queue.declare",
            QueueDeclareOk(_) => "queue.declare-ok",
            QueueBind(_) => "queue.bind",
            QueueBindOk => "queue.bind-ok",
            QueuePurge(_) => "queue.purge",
            QueuePurgeOk(_) => "queue.purge-ok",
            QueueDelete(_) => "queue.delete",
            QueueDeleteOk(_) => "queue.delete-ok",
            QueueUnbind(_) => "queue.unbind",
            QueueUnbindOk => "queue.unbind-ok",
            BasicQos(_) => "basic.qos",
            BasicQosOk => "basic.qos-ok",
            BasicConsume(_) => "basic.consume",
            BasicConsumeOk(_) => "basic.consume-ok",
            BasicCancel(_) => "basic.cancel",
            BasicCancelOk(_) => "basic.cancel-ok",
            BasicPublish(_) => "basic.publish",
            BasicReturn(_) => "basic.return",
            BasicDeliver(_) => "basic.deliver",
            BasicGet(_) => "basic.get",
            BasicGetOk(_) => "basic.get-ok",
            BasicGetEmpty => "basic.get-empty",
            BasicAck(_) => "basic.ack",
            BasicReject(_) => "basic.reject",
            BasicNack(_) => "basic.nack",
            BasicRecover(_) => "basic.recover",
            BasicRecoverOk => "basic.recover-ok",
            ConfirmSelect(_) => "confirm.select",
            ConfirmSelectOk => "confirm.select-ok",
            TxSelect => "tx.select",
            TxSelectOk => "tx.select-ok",
            TxCommit => "tx.commit",
            TxCommitOk => "tx.commit-ok",
            TxRollback => "tx.rollback",
            TxRollbackOk => "tx.rollback-ok",
        }
    }
}
