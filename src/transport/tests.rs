use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;

use super::client::publish_once;
use super::udp::handle_datagram;
use super::{GatewayClient, Server};
use crate::broker::Broker;
use crate::config::BrokerSettings;
use crate::persistence::MemorySessionStore;
use crate::protocol::packets::*;
use crate::protocol::{Message, MessageType, QoS, ReturnCode, TopicIdType};
use crate::utils::BrokerError;

const QUIET: Duration = Duration::from_millis(300);

fn settings(advertise_interval_secs: u16) -> BrokerSettings {
    BrokerSettings {
        advertise_interval_secs,
        ..BrokerSettings::default()
    }
}

async fn start_gateway(advertise_interval_secs: u16) -> (SocketAddr, Arc<Broker>) {
    let broker = Arc::new(Broker::new(Arc::new(MemorySessionStore::new()), 0));
    let server = Server::bind("127.0.0.1:0", Arc::clone(&broker), &settings(advertise_interval_secs))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    (addr, broker)
}

async fn assert_silent(client: &GatewayClient) {
    match client.recv_within(QUIET).await {
        Err(BrokerError::NoReply(_)) => {}
        other => panic!("expected silence, got {:?}", other),
    }
}

fn publish(topic_id: u16, qos: QoS, message_id: u16) -> Message {
    Message::Publish(Publish {
        qos,
        topic_id_type: TopicIdType::Normal,
        topic_id,
        message_id,
        data: Bytes::from_static(b"21.5"),
        ..Default::default()
    })
}

#[test]
fn test_handle_datagram_drops_malformed_input() {
    let broker = Broker::new(Arc::new(MemorySessionStore::new()), 0);
    let from = SocketAddr::from(([127, 0, 0, 1], 6000));

    assert!(handle_datagram(&broker, Bytes::new(), from).is_empty());
    assert!(handle_datagram(&broker, Bytes::from_static(&[2, 0x19]), from).is_empty());
    assert!(handle_datagram(&broker, Bytes::from_static(&[9, 0x04, 0x04, 0x01]), from).is_empty());
    assert!(broker.clients().is_empty());

    let connect = crate::protocol::encode(&Message::Connect(Connect::new("ok", 10))).unwrap();
    assert_eq!(handle_datagram(&broker, connect, from).len(), 1);
}

#[rstest::rstest]
#[case::unmodelled_flag_bits(&[8, 0x0C, 0x0C, 0, 1, 0, 7, b'x'])]
#[case::extended_header_on_short_frame(&[0x01, 0, 10, 0x0C, 0x0C, 0, 1, 0, 7, b'x'])]
fn test_publish_is_forwarded_byte_for_byte(#[case] frame: &'static [u8]) {
    let broker = Broker::new(Arc::new(MemorySessionStore::new()), 0);
    let publisher = SocketAddr::from(([127, 0, 0, 1], 6000));
    broker.dispatch(Message::Connect(Connect::new("pub", 10)), publisher);
    broker.dispatch(
        Message::Register(Register {
            topic_id: 0,
            message_id: 1,
            topic_name: "room/temp".into(),
        }),
        publisher,
    );
    for port in [6001, 6002] {
        let subscriber = SocketAddr::from(([127, 0, 0, 1], port));
        broker.dispatch(Message::Connect(Connect::new(format!("sub-{}", port), 10)), subscriber);
        broker.dispatch(
            Message::Subscribe(Subscribe {
                dup: false,
                qos: QoS::AtMostOnce,
                message_id: 2,
                topic: TopicRef::Name("room/temp".into()),
            }),
            subscriber,
        );
    }

    let out = handle_datagram(&broker, Bytes::from_static(frame), publisher);

    // publisher plus both subscribers, no PUBACK at QoS 0
    assert_eq!(out.len(), 3);
    for outbound in out {
        assert_eq!(outbound.encoded().unwrap().as_ref(), frame);
    }
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let broker = Arc::new(Broker::new(Arc::new(MemorySessionStore::new()), 0));
    let taken = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    let err = Server::bind(&addr, broker, &settings(0)).await.unwrap_err();
    assert!(matches!(err, BrokerError::Bind { .. }));
}

#[tokio::test]
async fn test_scenarios_connect_register_subscribe_publish() {
    let (gateway, _broker) = start_gateway(0).await;
    let sensor = GatewayClient::bind(gateway).await.unwrap();
    let display = GatewayClient::bind(gateway).await.unwrap();

    // A
    let connack = sensor.connect("sensor-1", 60).await.unwrap();
    assert_eq!(connack.return_code, ReturnCode::Accepted);

    // B
    let regack = sensor.register("room/temp", 1).await.unwrap();
    assert_eq!(
        regack,
        RegAck { topic_id: 1, message_id: 1, return_code: ReturnCode::Accepted }
    );
    let again = sensor.register("room/temp", 2).await.unwrap();
    assert_eq!(again.topic_id, 1);

    // C
    display.connect("display", 60).await.unwrap();
    let suback = display
        .subscribe(TopicRef::Predefined(1), QoS::AtMostOnce, 3)
        .await
        .unwrap();
    assert_eq!(suback.topic_id, 1);
    assert_eq!(suback.return_code, ReturnCode::Accepted);

    // D
    let message = publish(1, QoS::AtMostOnce, 4);
    sensor.send(&message).await.unwrap();
    assert_eq!(display.recv().await.unwrap(), message);

    // the sensor registered the topic, so it gets its own publish, but no PUBACK
    assert_eq!(sensor.recv().await.unwrap(), message);
    assert_silent(&sensor).await;
}

#[tokio::test]
async fn test_scenario_subscribe_before_register_is_rejected() {
    let (gateway, _broker) = start_gateway(0).await;
    let display = GatewayClient::bind(gateway).await.unwrap();
    display.connect("display", 60).await.unwrap();

    let suback = display
        .subscribe(TopicRef::Predefined(1), QoS::AtMostOnce, 3)
        .await
        .unwrap();
    assert_eq!(suback.topic_id, 1);
    assert_eq!(suback.return_code, ReturnCode::RejectedInvalidTopicId);
}

#[tokio::test]
async fn test_qos1_publish_is_acknowledged_to_sender() {
    let (gateway, _broker) = start_gateway(0).await;
    let sensor = GatewayClient::bind(gateway).await.unwrap();
    sensor.connect("sensor-1", 60).await.unwrap();
    let topic_id = sensor.register("room/temp", 1).await.unwrap().topic_id;

    let reply = sensor
        .request(&publish(topic_id, QoS::AtLeastOnce, 7), MessageType::PubAck)
        .await
        .unwrap();
    assert_eq!(
        reply,
        Message::PubAck(PubAck { topic_id, message_id: 7, return_code: ReturnCode::Accepted })
    );
}

#[tokio::test]
async fn test_malformed_and_unknown_traffic_gets_no_reply() {
    let (gateway, broker) = start_gateway(0).await;
    let stranger = GatewayClient::bind(gateway).await.unwrap();

    stranger.send_raw(&[0xFF, 0x00, 0x01]).await.unwrap();
    stranger.send_raw(&[2, 0x03]).await.unwrap();
    stranger.send(&Message::PingReq(PingReq::default())).await.unwrap();
    stranger
        .send(&Message::Connect(Connect::new("a-client-id-that-is-too-long", 60)))
        .await
        .unwrap();
    assert_silent(&stranger).await;
    assert!(broker.clients().is_empty());

    // the listener is still serving
    let connack = stranger.connect("ok", 60).await.unwrap();
    assert_eq!(connack.return_code, ReturnCode::Accepted);
}

#[tokio::test]
async fn test_ping_and_disconnect() {
    let (gateway, broker) = start_gateway(0).await;
    let sensor = GatewayClient::bind(gateway).await.unwrap();
    sensor.connect("sensor-1", 60).await.unwrap();

    let pong = sensor
        .request(&Message::PingReq(PingReq::default()), MessageType::PingResp)
        .await
        .unwrap();
    assert_eq!(pong, Message::PingResp);

    sensor
        .send(&Message::Disconnect(Disconnect { duration: 30 }))
        .await
        .unwrap();
    assert_eq!(
        sensor.recv().await.unwrap(),
        Message::Disconnect(Disconnect { duration: 0 })
    );
    assert_eq!(broker.clients().len(), 1);

    sensor.disconnect().await.unwrap();
    assert!(broker.clients().is_empty());
}

#[tokio::test]
async fn test_concurrent_registers_share_one_id() {
    let (gateway, broker) = start_gateway(0).await;
    let mut clients = Vec::new();
    for i in 0..8 {
        let client = GatewayClient::bind(gateway).await.unwrap();
        client.connect(&format!("c{}", i), 60).await.unwrap();
        clients.push(client);
    }

    let acks = join_all(clients.iter().map(|c| c.register("shared", 1))).await;
    for ack in acks {
        assert_eq!(ack.unwrap().topic_id, 1);
    }
    assert_eq!(broker.topics().len(), 1);
}

#[tokio::test]
async fn test_advertisements_reach_connected_clients() {
    let (gateway, _broker) = start_gateway(1).await;
    let sensor = GatewayClient::bind(gateway).await.unwrap();
    sensor.connect("sensor-1", 60).await.unwrap();

    let advertise = sensor
        .recv_within(Duration::from_secs(3))
        .await
        .unwrap();
    assert_eq!(
        advertise,
        Message::Advertise(Advertise { gateway_id: 0, duration: 1 })
    );
}

#[tokio::test]
async fn test_publish_once_smoke() {
    let (gateway, broker) = start_gateway(0).await;
    let topic_id = publish_once(gateway, "smoke", "smoke/test", b"hello")
        .await
        .unwrap();
    assert_eq!(topic_id, 1);
    assert_eq!(broker.topics().get_topic(1), "smoke/test");
    assert!(broker.clients().is_empty());
}
