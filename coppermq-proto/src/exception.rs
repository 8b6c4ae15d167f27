//! AMQP exceptions and their mapping to reply codes.
//!
//! Hard errors mandate closing the whole connection, soft errors only the
//! channel on which they happened.

use std::fmt;

use crate::method::ClassMethod;

/// Scope of an AMQP exception. Connection scoped exceptions are hard errors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorScope {
    #[default]
    Connection,
    Channel,
}

/// Error codes in connection scope, the hard errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionError {
    /// The server forced to close the connection.
    ConnectionForced = 320,
    /// The client tried to work with an invalid virtual host.
    InvalidPath = 402,
    /// The client sent an invalid AMQP frame.
    FrameError = 501,
    /// The client sent a frame which contains erroneous data.
    SyntaxError = 502,
    /// The client sent a frame which didn't fit in the normal order.
    CommandInvalid = 503,
    /// The client tried to access a non-existing or not-opened channel.
    ChannelError = 504,
    /// The client sent an unexpected content header or body frame.
    UnexpectedFrame = 505,
    /// The client tried to exceed the limits agreed during connection tune.
    ResourceError = 506,
    /// The client tried to work with an entity in a way which is not allowed.
    NotAllowed = 530,
    /// The client tried to use a not implemented functionality.
    NotImplemented = 540,
    /// The server couldn't fulfill the request because of an internal error.
    InternalError = 541,
}

/// Error codes in channel scope, the soft errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelError {
    /// The client attempted to transfer a message which exceeded the limits.
    ContentTooLarge = 311,
    /// The mandatory message cannot be routed to queues.
    NoRoute = 312,
    /// The immediate message cannot be delivered in the absence of consumers.
    NoConsumers = 313,
    /// The client tried to access a resource it didn't have access to.
    AccessRefused = 403,
    /// Queue or entity cannot be found.
    NotFound = 404,
    /// Another client is working on the resource.
    ResourceLocked = 405,
    /// The work on the resource is refused, mostly validation errors.
    PreconditionFailed = 406,
}

/// A structured AMQP exception: scope decides hard vs soft, `class_method`
/// names the method which triggered it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AmqpError {
    pub scope: ErrorScope,
    pub code: u16,
    pub text: String,
    pub class_method: ClassMethod,
}

impl AmqpError {
    /// Hard errors mandate connection closure, soft errors only channel
    /// closure.
    pub fn is_hard(&self) -> bool {
        self.scope == ErrorScope::Connection
    }
}

impl fmt::Display for AmqpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AmqpError {}

impl ConnectionError {
    pub fn into_amqp_error(self, class_method: ClassMethod, text: &str) -> AmqpError {
        AmqpError {
            scope: ErrorScope::Connection,
            code: self as u16,
            text: text.to_owned(),
            class_method,
        }
    }
}

impl ChannelError {
    pub fn into_amqp_error(self, class_method: ClassMethod, text: &str) -> AmqpError {
        AmqpError {
            scope: ErrorScope::Channel,
            code: self as u16,
            text: text.to_owned(),
            class_method,
        }
    }
}
