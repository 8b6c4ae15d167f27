//! Protocol vocabulary of the coppermq AMQP 0-9-1 client.
//!
//! This crate defines the AMQP method universe as a sum type ([`method::Method`])
//! together with the pure classification every channel needs: which class a
//! method belongs to, whether it expects a synchronous reply and whether it
//! carries content. It also defines message content ([`content::Content`]) and
//! the AMQP exception table ([`exception`]).
//!
//! Wire encoding and decoding is deliberately not part of this crate; the
//! connection layer owning the socket deals with octets.
#[macro_use]
extern crate bitflags;

pub mod content;
pub mod exception;
pub mod method;
