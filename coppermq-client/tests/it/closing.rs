use crate::helper;

use coppermq_client::error::ChannelExitReason;
use coppermq_client::{CallResult, CloseType, ExitReason};
use coppermq_proto::exception::{ChannelError, ConnectionError};
use coppermq_proto::method::{self, ExchangeDeclareArgs, Method, QueueDeclareArgs};

#[tokio::test]
async fn connection_closing_with_flush_drains_queued_rpcs() {
    let (channel, mut peer) = helper::open_channel(1).await;

    // casts of synchronous methods queue without blocking the test
    channel
        .cast(ExchangeDeclareArgs::default().exchange_name("logs").method())
        .unwrap();
    channel.cast(QueueDeclareArgs::default().name("inbox").method()).unwrap();
    channel.cast(QueueDeclareArgs::default().name("outbox").method()).unwrap();

    assert!(matches!(peer.expect_method().await.method, Method::ExchangeDeclare(_)));

    peer.control
        .connection_closing(CloseType::Flush, ExitReason::Other("shutdown".to_string()))
        .unwrap();

    // new work is refused while the drain is running
    let result = channel
        .call(QueueDeclareArgs::default().name("rejected").method())
        .await
        .unwrap();
    assert!(matches!(result, CallResult::Closing));

    // in-flight replies still drain the queue
    peer.server_sends(Method::ExchangeDeclareOk);
    assert!(matches!(peer.expect_method().await.method, Method::QueueDeclare(_)));
    peer.server_sends(method::QueueDeclareOkArgs::default().method());
    assert!(matches!(peer.expect_method().await.method, Method::QueueDeclare(_)));
    peer.server_sends(method::QueueDeclareOkArgs::default().method());

    assert_eq!(
        peer.exit_reason().await,
        ExitReason::ConnectionClosing(Box::new(ExitReason::Other("shutdown".to_string())))
    );
}

#[tokio::test]
async fn connection_closing_normal_reason_exits_normally() {
    let (_channel, mut peer) = helper::open_channel(1).await;

    peer.control
        .connection_closing(CloseType::Flush, ExitReason::Normal)
        .unwrap();

    assert_eq!(peer.exit_reason().await, ExitReason::Normal);
}

#[tokio::test]
async fn abrupt_connection_closing_skips_the_drain() {
    let (channel, mut peer) = helper::open_channel(1).await;

    channel
        .cast(ExchangeDeclareArgs::default().exchange_name("logs").method())
        .unwrap();
    peer.expect_method().await;

    peer.control
        .connection_closing(CloseType::Abrupt, ExitReason::Other("halt".to_string()))
        .unwrap();

    assert_eq!(
        peer.exit_reason().await,
        ExitReason::ConnectionClosing(Box::new(ExitReason::Other("halt".to_string())))
    );
}

#[tokio::test(start_paused = true)]
async fn flush_times_out_when_the_queue_never_drains() {
    let (channel, mut peer) = helper::open_channel(1).await;

    channel
        .cast(ExchangeDeclareArgs::default().exchange_name("logs").method())
        .unwrap();
    peer.expect_method().await;

    peer.control
        .connection_closing(CloseType::Flush, ExitReason::Other("shutdown".to_string()))
        .unwrap();

    // no reply ever arrives; the 60 s budget lapses (virtual time)
    let reason = tokio::time::timeout(std::time::Duration::from_secs(120), peer.join)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reason, ExitReason::TimedOutFlushingChannel);
}

#[tokio::test(start_paused = true)]
async fn close_ok_times_out_under_a_closing_connection() {
    let (channel, mut peer) = helper::open_channel(1).await;

    let closer = tokio::spawn(async move { channel.close().await });
    assert!(matches!(peer.expect_method().await.method, Method::ChannelClose(_)));

    peer.control
        .connection_closing(CloseType::Flush, ExitReason::Other("shutdown".to_string()))
        .unwrap();

    let reason = tokio::time::timeout(std::time::Duration::from_secs(10), peer.join)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reason, ExitReason::TimedOutWaitingCloseOk);

    // the close caller observes the terminated channel
    assert!(closer.await.unwrap().is_err());
}

#[tokio::test]
async fn soft_channel_exit_closes_the_channel_itself() {
    let (_channel, mut peer) = helper::open_channel(1).await;

    let err = ChannelError::NotFound.into_amqp_error(method::EXCHANGE_DECLARE, "no exchange 'nope'");
    peer.control.channel_exit(ChannelExitReason::Amqp(err)).unwrap();

    // the channel walks the closing handshake carrying the exception
    match peer.expect_method().await.method {
        Method::ChannelClose(args) => {
            assert_eq!(args.code, 404);
            assert_eq!(args.text, "no exchange 'nope'");
        }
        other => panic!("unexpected method {:?}", other),
    }

    peer.server_sends(Method::ChannelCloseOk);
    assert_eq!(peer.exit_reason().await, ExitReason::Normal);
}

#[tokio::test]
async fn hard_channel_exit_escalates_to_the_connection() {
    let (_channel, mut peer) = helper::open_channel(1).await;

    let err = ConnectionError::UnexpectedFrame.into_amqp_error(method::BASIC_PUBLISH, "content out of band");
    peer.control.channel_exit(ChannelExitReason::Amqp(err)).unwrap();

    match peer.exit_reason().await {
        ExitReason::ConnectionClosing(inner) => {
            assert_eq!(
                *inner,
                ExitReason::ServerInitiatedHardClose {
                    code: 505,
                    text: "content out of band".to_string()
                }
            );
        }
        other => panic!("unexpected exit {:?}", other),
    }
}

#[tokio::test]
async fn infrastructure_death_propagates_verbatim() {
    let (_channel, mut peer) = helper::open_channel(1).await;

    peer.control
        .channel_exit(ChannelExitReason::Died("writer socket reset".to_string()))
        .unwrap();

    assert_eq!(
        peer.exit_reason().await,
        ExitReason::InfrastructureDied("writer socket reset".to_string())
    );
}
