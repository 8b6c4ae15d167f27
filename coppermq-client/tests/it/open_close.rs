use crate::helper;

use coppermq_client::{ConsumerSignal, ExitReason};
use coppermq_proto::method::{self, ExchangeDeclareArgs, Method};

#[tokio::test]
async fn open_then_close_normally() {
    let (channel, mut peer) = helper::open_channel(1).await;

    assert_eq!(channel.number(), 1);

    let closer = tokio::spawn(async move { channel.close().await });

    let out = peer.expect_method().await;
    match out.method {
        Method::ChannelClose(args) => {
            assert_eq!(args.code, 200);
            assert_eq!(args.text, "Normal close");
        }
        other => panic!("unexpected method {:?}", other),
    }

    peer.server_sends(Method::ChannelCloseOk);

    closer.await.unwrap().unwrap();
    assert_eq!(peer.exit_reason().await, ExitReason::Normal);
}

#[tokio::test]
async fn deliveries_racing_a_local_close_are_dropped() {
    let (channel, mut peer) = helper::open_channel(1).await;

    let closer = tokio::spawn(async move { channel.close_with(200, "Goodbye").await });

    let out = peer.expect_method().await;
    assert!(matches!(out.method, Method::ChannelClose(_)));

    // a delivery sneaking in before the close-ok must not reach the consumer
    peer.server_sends_content(
        method::BasicDeliverArgs::new("ctag-1", 1, "logs").method(),
        "late delivery".into(),
    );

    peer.server_sends(Method::ChannelCloseOk);
    closer.await.unwrap().unwrap();

    assert_eq!(peer.exit_reason().await, ExitReason::Normal);

    // the consumer saw the close but never the delivery
    match peer.consumer_signals.recv().await.unwrap() {
        ConsumerSignal::Closed(reason) => assert_eq!(reason, ExitReason::Normal),
        other => panic!("unexpected signal {:?}", other),
    }
    assert!(peer.consumer_signals.try_recv().is_err());
}

#[tokio::test]
async fn server_initiated_close_fails_the_pending_call() {
    let (channel, mut peer) = helper::open_channel(1).await;

    let declare = tokio::spawn(async move {
        channel
            .exchange_declare(ExchangeDeclareArgs::default().exchange_name("missing"))
            .await
    });

    let out = peer.expect_method().await;
    assert!(matches!(out.method, Method::ExchangeDeclare(_)));

    peer.server_sends(method::channel_close(404, "NOT_FOUND", method::EXCHANGE_DECLARE));

    // the channel acknowledges before going away
    let out = peer.expect_method().await;
    assert!(matches!(out.method, Method::ChannelCloseOk));

    // the pending caller does not get a normal reply
    assert!(declare.await.unwrap().is_err());

    assert_eq!(
        peer.exit_reason().await,
        ExitReason::ServerInitiatedClose {
            code: 404,
            text: "NOT_FOUND".to_string()
        }
    );
}

#[tokio::test]
async fn connection_class_method_is_server_misbehavior() {
    let (_channel, mut peer) = helper::open_channel(1).await;

    peer.server_sends(coppermq_proto::method::ConnectionCloseArgs::default().method());

    assert!(matches!(peer.exit_reason().await, ExitReason::ServerMisbehaved(_)));
}
