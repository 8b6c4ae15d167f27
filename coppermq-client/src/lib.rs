//! Client side channel of the coppermq AMQP 0-9-1 stack.
//!
//! A connection actor multiplexes many channels onto one socket; this crate
//! implements the per-channel actor which serializes method exchanges with
//! the server, correlates synchronous replies, dispatches server pushed
//! events and walks the closing handshake. The connection actor, the frame
//! codec and the writer owning the socket live outside this crate and are
//! reached through the handles in [`transport`] and [`channel`].
//!
//! # Examples
//!
//! ```no_run
//! use coppermq_client::channel::start_channel;
//! use coppermq_client::consumer::SinkConsumer;
//! use coppermq_client::transport::{OutgoingSink, TransportConfig};
//! use coppermq_proto::content::Content;
//! use coppermq_proto::method::BasicPublishArgs;
//!
//! async fn publish(writer: OutgoingSink) -> anyhow::Result<()> {
//!     let (consumer, _signals) = SinkConsumer::new(1);
//!     let transport = TransportConfig::Network {
//!         start_writer: Box::new(move || writer),
//!     };
//!
//!     let (channel, control, _join) = start_channel(1, transport, Box::new(consumer));
//!
//!     // the connection actor opens the channel once the server allows it
//!     control.open().await?;
//!
//!     channel.basic_publish(
//!         BasicPublishArgs::new("logs").routing_key("info"),
//!         Content::from("Hello"),
//!     )?;
//!     channel.close().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod consumer;
pub mod error;
pub mod handler;
pub mod model;
pub mod transport;

pub use channel::{start_channel, CallResult, Channel, ChannelControl, CloseType};
pub use consumer::{ConsumerSignal, ConsumerStrategy, SinkConsumer};
pub use error::{ChannelExitReason, ClientError, ExitReason};
pub use handler::{ConfirmSignal, FlowSignal, ReturnedMessage};
pub use model::ChannelNumber;

use std::io::Write;

use env_logger::Builder;

/// Convenience function for setting up `env_logger` to see log messages.
pub fn setup_logger() {
    let mut builder = Builder::from_default_env();

    builder
        .format_timestamp_millis()
        .format(|buf, record| {
            let mut lvl = buf.style();
            lvl.set_bold(true);

            match record.level() {
                log::Level::Error => lvl.set_color(env_logger::fmt::Color::Red),
                log::Level::Warn => lvl.set_color(env_logger::fmt::Color::Yellow),
                log::Level::Info => lvl.set_color(env_logger::fmt::Color::Green),
                log::Level::Debug => lvl.set_color(env_logger::fmt::Color::Rgb(160, 160, 160)),
                log::Level::Trace => lvl.set_color(env_logger::fmt::Color::Rgb(96, 96, 96)),
            };

            writeln!(
                buf,
                "{} - [{:5}] {}:{} - {}",
                buf.timestamp_millis(),
                lvl.value(record.level()),
                record.file().unwrap_or_default(),
                record.line().unwrap_or_default(),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Always)
        .init();
}
