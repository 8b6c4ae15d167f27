use crate::helper;

use coppermq_client::CallResult;
use coppermq_proto::content::Content;
use coppermq_proto::method::{BasicPublishArgs, BasicQosArgs, BasicReturnArgs, ChannelFlowArgs, Method};
use tokio::sync::mpsc;

#[tokio::test]
async fn flow_throttles_content_bearing_methods_only() {
    let (channel, mut peer) = helper::open_channel(1).await;

    let (flow_tx, mut flow_signals) = mpsc::unbounded_channel();
    channel.register_flow_handler(flow_tx).unwrap();

    peer.server_sends(ChannelFlowArgs::new(false).method());

    // the event reaches the handler and the flow-ok is acknowledged through
    // the rpc queue
    assert!(!flow_signals.recv().await.unwrap().active);
    match peer.expect_method().await.method {
        Method::ChannelFlowOk(ok) => assert!(!ok.active),
        other => panic!("unexpected method {:?}", other),
    }

    // content is rejected while throttled
    let result = channel
        .call_with_content(BasicPublishArgs::new("logs").method(), Content::from("M"))
        .await
        .unwrap();
    assert!(matches!(result, CallResult::Blocked));

    // a method without content is still admitted
    let qos = {
        let channel = channel.clone();
        tokio::spawn(async move { channel.basic_qos(BasicQosArgs::default().prefetch_count(10)).await })
    };
    assert!(matches!(peer.expect_method().await.method, Method::BasicQos(_)));
    peer.server_sends(Method::BasicQosOk);
    qos.await.unwrap().unwrap();

    // reopening the gate admits publishes again
    peer.server_sends(ChannelFlowArgs::new(true).method());
    assert!(flow_signals.recv().await.unwrap().active);
    peer.expect_method().await; // flow-ok

    let result = channel
        .call_with_content(BasicPublishArgs::new("logs").method(), Content::from("M"))
        .await
        .unwrap();
    assert!(matches!(result, CallResult::Ok));
}

#[tokio::test]
async fn returned_messages_reach_the_return_handler() {
    let (channel, peer) = helper::open_channel(1).await;

    let (return_tx, mut returns) = mpsc::unbounded_channel();
    channel.register_return_handler(return_tx).unwrap();

    let ret = BasicReturnArgs {
        reply_code: 312,
        reply_text: "NO_ROUTE".to_string(),
        exchange_name: "logs".to_string(),
        routing_key: "nowhere".to_string(),
    };

    peer.server_sends_content(ret.method(), Content::from("lost message"));

    let returned = returns.recv().await.unwrap();
    assert_eq!(returned.ret.reply_code, 312);
    assert_eq!(returned.content.body, b"lost message");
}
