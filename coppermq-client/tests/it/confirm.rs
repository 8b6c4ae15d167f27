use std::time::Duration;

use crate::helper;

use coppermq_client::ConfirmSignal;
use coppermq_proto::content::Content;
use coppermq_proto::method::{BasicAckArgs, BasicNackArgs, BasicPublishArgs, Method};
use tokio::sync::mpsc;

#[tokio::test]
async fn publish_seqnos_and_confirm_handler() {
    let (channel, mut peer) = helper::open_channel(1).await;

    let (confirm_tx, mut confirms) = mpsc::unbounded_channel();
    channel.register_confirm_handler(confirm_tx).unwrap();

    assert_eq!(channel.next_publish_seqno().await.unwrap(), 0);

    let selecting = {
        let channel = channel.clone();
        tokio::spawn(async move { channel.confirm_select().await })
    };

    let out = peer.expect_method().await;
    assert!(matches!(out.method, Method::ConfirmSelect(_)));
    peer.server_sends(Method::ConfirmSelectOk);
    selecting.await.unwrap().unwrap();

    assert_eq!(channel.next_publish_seqno().await.unwrap(), 1);

    for body in ["M1", "M2", "M3"] {
        channel
            .basic_publish(BasicPublishArgs::new("logs"), Content::from(body))
            .unwrap();
    }

    for _ in 0..3 {
        let out = peer.expect_method().await;
        assert!(matches!(out.method, Method::BasicPublish(_)));
        assert!(out.content.is_some());
    }

    assert_eq!(channel.next_publish_seqno().await.unwrap(), 4);

    // the handler receives the ack verbatim
    peer.server_sends(BasicAckArgs::default().delivery_tag(2).multiple(true).method());

    match confirms.recv().await.unwrap() {
        ConfirmSignal::Ack(ack) => {
            assert_eq!(ack.delivery_tag, 2);
            assert!(ack.multiple);
        }
        other => panic!("unexpected confirm {:?}", other),
    }

    // M3 is still unconfirmed
    assert_eq!(channel.wait_for_confirms(Duration::from_millis(50)).await.unwrap(), None);

    peer.server_sends(BasicAckArgs::default().delivery_tag(3).method());

    assert_eq!(
        channel.wait_for_confirms(Duration::from_secs(1)).await.unwrap(),
        Some(true)
    );
}

#[tokio::test]
async fn nack_wakes_waiters_with_false() {
    let (channel, mut peer) = helper::open_channel(1).await;

    let selecting = {
        let channel = channel.clone();
        tokio::spawn(async move { channel.confirm_select().await })
    };
    peer.expect_method().await;
    peer.server_sends(Method::ConfirmSelectOk);
    selecting.await.unwrap().unwrap();

    channel
        .basic_publish(BasicPublishArgs::new("logs"), Content::from("doomed"))
        .unwrap();
    peer.expect_method().await;

    let waiter = {
        let channel = channel.clone();
        tokio::spawn(async move { channel.wait_for_confirms(Duration::from_secs(1)).await })
    };

    // let the waiter park before the nack lands
    tokio::time::sleep(Duration::from_millis(20)).await;

    peer.server_sends(BasicNackArgs::default().delivery_tag(1).method());

    assert_eq!(waiter.await.unwrap().unwrap(), Some(false));
}

#[tokio::test]
async fn wait_for_confirms_needs_confirm_mode() {
    let (channel, _peer) = helper::open_channel(1).await;

    assert!(channel.wait_for_confirms(Duration::from_millis(50)).await.is_err());
}
