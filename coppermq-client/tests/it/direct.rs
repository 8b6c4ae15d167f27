use std::time::Duration;

use coppermq_client::channel::start_channel;
use coppermq_client::consumer::{ConsumerSignal, SinkConsumer};
use coppermq_client::transport::{OutgoingMethod, TransportConfig};
use coppermq_client::ExitReason;
use coppermq_proto::content::Content;
use coppermq_proto::method::{BasicDeliverArgs, BasicPublishArgs, Method};
use tokio::sync::{mpsc, oneshot};

async fn expect_method(broker: &mut mpsc::UnboundedReceiver<OutgoingMethod>) -> OutgoingMethod {
    tokio::time::timeout(Duration::from_secs(1), broker.recv())
        .await
        .expect("timed out waiting for a broker command")
        .expect("broker inbox closed")
}

#[tokio::test]
async fn direct_transport_bypasses_frames() {
    let (broker_tx, mut broker) = mpsc::unbounded_channel();
    let (consumer, mut signals) = SinkConsumer::new(7);

    let (channel, control, join) = start_channel(
        7,
        TransportConfig::Direct { broker: broker_tx },
        Box::new(consumer),
    );

    let opener = {
        let control = control.clone();
        tokio::spawn(async move { control.open().await })
    };

    let out = expect_method(&mut broker).await;
    assert_eq!(out.channel, 7);
    assert!(matches!(out.method, Method::ChannelOpen));

    // the broker answers through the direct path, no frames involved
    control.send_command(Method::ChannelOpenOk, None).unwrap();
    opener.await.unwrap().unwrap();

    // publishes go straight into the broker routine
    channel
        .basic_publish(BasicPublishArgs::new("logs"), Content::from("direct"))
        .unwrap();

    let out = expect_method(&mut broker).await;
    assert!(matches!(out.method, Method::BasicPublish(_)));
    assert_eq!(out.content.unwrap().body, b"direct");

    // a delivery with a completion notification towards the producer
    let (notify_tx, notify_rx) = oneshot::channel();
    control
        .send_command_and_notify(
            BasicDeliverArgs::new("ctag-1", 1, "logs").method(),
            Some(Content::from("hello")),
            notify_tx,
        )
        .unwrap();
    notify_rx.await.unwrap();

    match signals.recv().await.unwrap() {
        ConsumerSignal::Delivered(m) => assert_eq!(m.content.body, b"hello"),
        other => panic!("unexpected signal {:?}", other),
    }

    // the synchronous variant is acked as soon as the actor picks it up
    control
        .send_command_sync(BasicDeliverArgs::new("ctag-1", 2, "logs").method(), Some(Content::from("again")))
        .await
        .unwrap();

    match signals.recv().await.unwrap() {
        ConsumerSignal::Delivered(m) => assert_eq!(m.delivery_tag, 2),
        other => panic!("unexpected signal {:?}", other),
    }

    control.shutdown(ExitReason::Normal).unwrap();

    let reason = tokio::time::timeout(Duration::from_secs(1), join).await.unwrap().unwrap();
    assert_eq!(reason, ExitReason::Normal);
}
