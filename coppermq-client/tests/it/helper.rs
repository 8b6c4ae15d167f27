use std::time::Duration;

use coppermq_client::channel::{start_channel, Channel, ChannelControl};
use coppermq_client::consumer::{ConsumerSignal, SinkConsumer};
use coppermq_client::error::ExitReason;
use coppermq_client::transport::{OutgoingMethod, TransportConfig};
use coppermq_proto::content::Content;
use coppermq_proto::method::Method;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// The connection side of a channel under test: the writer inbox, the
/// control handle and the consumer signal stream, so a test can play both
/// the connection actor and the server.
pub struct TestPeer {
    pub control: ChannelControl,
    pub writer: mpsc::UnboundedReceiver<OutgoingMethod>,
    pub consumer_signals: mpsc::UnboundedReceiver<ConsumerSignal>,
    pub join: JoinHandle<ExitReason>,
}

#[allow(dead_code)]
impl TestPeer {
    /// Next method the channel handed to the writer.
    pub async fn expect_method(&mut self) -> OutgoingMethod {
        tokio::time::timeout(Duration::from_secs(1), self.writer.recv())
            .await
            .expect("timed out waiting for an outgoing method")
            .expect("writer inbox closed")
    }

    pub fn server_sends(&self, method: Method) {
        self.control.method_from_server(method, None).unwrap();
    }

    pub fn server_sends_content(&self, method: Method, content: Content) {
        self.control.method_from_server(method, Some(content)).unwrap();
    }

    /// Waits for the actor to stop and gives back its exit reason.
    pub async fn exit_reason(&mut self) -> ExitReason {
        tokio::time::timeout(Duration::from_secs(1), &mut self.join)
            .await
            .expect("timed out waiting for the channel to stop")
            .expect("channel task panicked")
    }
}

/// Spawns a channel over a fake network writer and walks the open handshake.
pub async fn open_channel(number: u16) -> (Channel, TestPeer) {
    let (writer_tx, writer_rx) = mpsc::unbounded_channel();
    let (consumer, consumer_signals) = SinkConsumer::new(number);

    let (channel, control, join) = start_channel(
        number,
        TransportConfig::Network {
            start_writer: Box::new(move || writer_tx),
        },
        Box::new(consumer),
    );

    let mut peer = TestPeer {
        control,
        writer: writer_rx,
        consumer_signals,
        join,
    };

    let opener = {
        let control = peer.control.clone();
        tokio::spawn(async move { control.open().await })
    };

    let out = peer.expect_method().await;
    assert!(matches!(out.method, Method::ChannelOpen));
    peer.server_sends(Method::ChannelOpenOk);

    opener.await.unwrap().unwrap();

    (channel, peer)
}
