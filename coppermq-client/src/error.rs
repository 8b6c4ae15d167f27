use std::fmt;

use coppermq_proto::exception::AmqpError;

use crate::model;

/// Represents a channel usage error reported synchronously to the caller.
#[derive(Clone, Debug)]
pub struct ClientError {
    pub channel: Option<model::ChannelNumber>,
    pub code: u16,
    pub message: String,
    pub class_method: model::ClassMethod,
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientError")
            .field("channel", &self.channel)
            .field("code", &self.code)
            .field("message", &self.message)
            .field("class_method", &format!("{:08X}", &self.class_method))
            .finish()
    }
}

impl std::error::Error for ClientError {}

/// Shorthand for creating errors in async functions.
#[macro_export]
macro_rules! client_error {
    ($channel:expr, $code:expr, $message:expr, $cm:expr) => {
        ::std::result::Result::Err(anyhow::Error::new($crate::error::ClientError {
            channel: $channel,
            code: $code,
            message: ::std::string::String::from($message),
            class_method: $cm,
        }))
    };
}

/// The reason a channel actor stopped. The connection actor and any
/// supervising code observe this through the join handle.
#[derive(Clone, Debug, PartialEq)]
pub enum ExitReason {
    Normal,
    /// The server closed the channel with `channel.close`.
    ServerInitiatedClose { code: u16, text: String },
    /// The server pushed a hard error, the whole connection has to go down.
    ServerInitiatedHardClose { code: u16, text: String },
    /// The connection actor is closing, wrapping the reason it gave.
    ConnectionClosing(Box<ExitReason>),
    /// The server broke the protocol on this channel.
    ServerMisbehaved(AmqpError),
    /// The writer or the broker plumbing died underneath the channel.
    InfrastructureDied(String),
    /// The RPC queue did not drain within the flush budget.
    TimedOutFlushingChannel,
    /// No `channel.close-ok` arrived within the close budget.
    TimedOutWaitingCloseOk,
    /// Opaque reason handed in by the connection actor.
    Other(String),
}

impl ExitReason {
    /// Graceful closes collapse to `Normal`, everything else propagates
    /// verbatim so the supervisor sees the cause. Only close-reply shaped
    /// reasons with code 200 count as graceful.
    pub(crate) fn normalize(self) -> ExitReason {
        match self {
            ExitReason::ServerInitiatedClose { code: 200, .. } => ExitReason::Normal,
            ExitReason::ServerInitiatedHardClose { code: 200, .. } => ExitReason::Normal,
            ExitReason::ConnectionClosing(inner) if *inner == ExitReason::Normal => ExitReason::Normal,
            reason => reason,
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, ExitReason::Normal)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Failure delivered out-of-band after a transport or broker invocation, see
/// the channel exit input of the actor.
#[derive(Clone, Debug)]
pub enum ChannelExitReason {
    /// A structured AMQP error, hard or soft.
    Amqp(AmqpError),
    /// Anything else the infrastructure died with.
    Died(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graceful_close_normalizes() {
        let reason = ExitReason::ServerInitiatedClose {
            code: 200,
            text: "Goodbye".to_string(),
        };

        assert_eq!(reason.normalize(), ExitReason::Normal);
    }

    #[test]
    fn connection_closing_normal_normalizes() {
        let reason = ExitReason::ConnectionClosing(Box::new(ExitReason::Normal));

        assert_eq!(reason.normalize(), ExitReason::Normal);
    }

    #[test]
    fn error_reasons_propagate() {
        let reason = ExitReason::ServerInitiatedClose {
            code: 404,
            text: "NOT_FOUND".to_string(),
        };

        assert_eq!(reason.clone().normalize(), reason);

        let reason = ExitReason::ConnectionClosing(Box::new(ExitReason::Other("shutdown".to_string())));

        assert_eq!(reason.clone().normalize(), reason);
    }
}
