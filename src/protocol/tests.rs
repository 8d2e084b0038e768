use bytes::Bytes;
use rstest::rstest;

use super::packets::*;
use super::*;

fn publish(qos: QoS, data: &[u8]) -> Message {
    Message::Publish(Publish {
        dup: false,
        qos,
        retain: false,
        topic_id_type: TopicIdType::Normal,
        topic_id: 1,
        message_id: 7,
        data: Bytes::copy_from_slice(data),
    })
}

#[rstest]
#[case::advertise(Message::Advertise(Advertise { gateway_id: 3, duration: 180 }))]
#[case::searchgw(Message::SearchGw(SearchGw { radius: 1 }))]
#[case::gwinfo_empty(Message::GwInfo(GwInfo { gateway_id: 9, gateway_address: Bytes::new() }))]
#[case::gwinfo_addr(Message::GwInfo(GwInfo { gateway_id: 9, gateway_address: Bytes::from_static(&[10, 0, 0, 1]) }))]
#[case::connect(Message::Connect(Connect { will: true, clean_session: false, protocol_id: PROTOCOL_ID, duration: 60, client_id: "sensor-1".into() }))]
#[case::connack(Message::ConnAck(ConnAck { return_code: ReturnCode::RejectedCongestion }))]
#[case::willtopicreq(Message::WillTopicReq)]
#[case::willtopic_empty(Message::WillTopic(WillTopic { details: None }))]
#[case::willtopic(Message::WillTopic(WillTopic { details: Some(WillTopicDetails { qos: QoS::ExactlyOnce, retain: true, topic: "last/words".into() }) }))]
#[case::willmsgreq(Message::WillMsgReq)]
#[case::willmsg(Message::WillMsg(WillMsg { message: Bytes::from_static(b"bye") }))]
#[case::register(Message::Register(Register { topic_id: 0, message_id: 1, topic_name: "room/temp".into() }))]
#[case::regack(Message::RegAck(RegAck { topic_id: 1, message_id: 1, return_code: ReturnCode::Accepted }))]
#[case::publish_empty(publish(QoS::AtMostOnce, b""))]
#[case::publish_qos2(publish(QoS::ExactlyOnce, b"21.5"))]
#[case::publish_extended(publish(QoS::AtLeastOnce, &[0xAB; 600]))]
#[case::puback(Message::PubAck(PubAck { topic_id: 4, message_id: 5, return_code: ReturnCode::RejectedInvalidTopicId }))]
#[case::pubcomp(Message::PubComp(PubComp { message_id: 11 }))]
#[case::pubrec(Message::PubRec(PubRec { message_id: 12 }))]
#[case::pubrel(Message::PubRel(PubRel { message_id: 13 }))]
#[case::subscribe_name(Message::Subscribe(Subscribe { dup: true, qos: QoS::AtLeastOnce, message_id: 2, topic: TopicRef::Name("room/+".into()) }))]
#[case::subscribe_predefined(Message::Subscribe(Subscribe { dup: false, qos: QoS::AtMostOnce, message_id: 3, topic: TopicRef::Predefined(1) }))]
#[case::subscribe_short(Message::Subscribe(Subscribe { dup: false, qos: QoS::AtMostOnce, message_id: 4, topic: TopicRef::Short("ab".into()) }))]
#[case::suback(Message::SubAck(SubAck { qos: QoS::AtLeastOnce, topic_id: 1, message_id: 2, return_code: ReturnCode::Accepted }))]
#[case::unsubscribe(Message::Unsubscribe(Unsubscribe { message_id: 8, topic: TopicRef::Predefined(42) }))]
#[case::unsuback(Message::UnsubAck(UnsubAck { message_id: 8 }))]
#[case::pingreq_empty(Message::PingReq(PingReq::default()))]
#[case::pingreq_named(Message::PingReq(PingReq { client_id: "sleepy".into() }))]
#[case::pingresp(Message::PingResp)]
#[case::disconnect(Message::Disconnect(Disconnect { duration: 0 }))]
#[case::disconnect_sleep(Message::Disconnect(Disconnect { duration: 300 }))]
#[case::willtopicupd(Message::WillTopicUpd(WillTopic { details: Some(WillTopicDetails { qos: QoS::AtMostOnce, retain: false, topic: "new/will".into() }) }))]
#[case::willtopicresp(Message::WillTopicResp(WillTopicResp { return_code: ReturnCode::RejectedNotSupported }))]
#[case::willmsgupd(Message::WillMsgUpd(WillMsg { message: Bytes::from_static(b"updated") }))]
#[case::willmsgresp(Message::WillMsgResp(WillMsgResp { return_code: ReturnCode::Accepted }))]
fn test_encode_decode_preserves_message(#[case] msg: Message) {
    let bytes = encode(&msg).unwrap();

    let header_len = if bytes[0] == header::EXTENDED_LENGTH_MARKER { 4 } else { 2 };
    assert_eq!(bytes[header_len - 1], msg.message_type().code());

    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded, msg);
}

#[test]
fn test_connack_wire_layout() {
    let msg = Message::ConnAck(ConnAck::default());
    assert_eq!(encode(&msg).unwrap().as_ref(), &[0x03, 0x05, 0x00]);
}

#[test]
fn test_advertise_wire_layout() {
    let msg = Message::Advertise(Advertise {
        gateway_id: 0,
        duration: 180,
    });
    assert_eq!(encode(&msg).unwrap().as_ref(), &[0x05, 0x00, 0x00, 0x00, 0xB4]);
}

#[test]
fn test_publish_flags_use_shared_masks() {
    let msg = Message::Publish(Publish {
        dup: true,
        qos: QoS::ExactlyOnce,
        retain: true,
        topic_id_type: TopicIdType::Short,
        topic_id: 0x0102,
        message_id: 0x0304,
        data: Bytes::from_static(b"x"),
    });
    let bytes = encode(&msg).unwrap();
    assert_eq!(bytes.as_ref(), &[8, 0x0C, 0x80 | 0x40 | 0x10 | 0x02, 1, 2, 3, 4, b'x']);
}

#[test]
fn test_subscribe_predefined_carries_topic_id() {
    let msg = Message::Subscribe(Subscribe {
        dup: false,
        qos: QoS::AtLeastOnce,
        message_id: 1,
        topic: TopicRef::Predefined(0x0203),
    });
    assert_eq!(
        encode(&msg).unwrap().as_ref(),
        &[7, 0x12, 0x20 | 0x01, 0, 1, 2, 3]
    );
}

#[test]
fn test_header_switches_to_extended_form_past_255() {
    // 253 + 2 = 255 still fits one length byte
    let short = encode(&publish(QoS::AtMostOnce, &[0; 248])).unwrap();
    assert_eq!(short.len(), 255);
    assert_eq!(short[0], 255);

    // 254 + 2 = 256 needs the marker, which adds two more bytes
    let extended = encode(&publish(QoS::AtMostOnce, &[0; 249])).unwrap();
    assert_eq!(extended.len(), 258);
    assert_eq!(extended[0], header::EXTENDED_LENGTH_MARKER);
    assert_eq!(u16::from_be_bytes([extended[1], extended[2]]), 258);
    assert_eq!(extended[3], MessageType::Publish.code());
}

#[test]
fn test_header_length_is_derived_not_trusted() {
    let header = Header::for_payload(MessageType::Register.code(), 13).unwrap();
    assert_eq!(header.length, 15);
    assert_eq!(header.payload_len(), 13);
    assert!(!header.is_extended());
}

#[test]
fn test_encode_rejects_oversized_payload() {
    let msg = publish(QoS::AtMostOnce, &vec![0; u16::MAX as usize]);
    assert!(matches!(encode(&msg), Err(EncodeError::FrameTooLarge(_))));
}

#[rstest]
#[case::reserved_03(0x03)]
#[case::reserved_11(0x11)]
#[case::reserved_19(0x19)]
#[case::reserved_1e(0x1E)]
#[case::reserved_ff(0xFF)]
fn test_decode_rejects_reserved_type(#[case] code: u8) {
    assert_eq!(decode(&[2, code]), Err(DecodeError::UnknownMessageType(code)));
}

#[test]
fn test_decode_rejects_encapsulated() {
    assert_eq!(decode(&[2, 0xFE]), Err(DecodeError::Encapsulated));
}

#[test]
fn test_decode_rejects_empty_buffer() {
    assert!(matches!(decode(&[]), Err(DecodeError::Truncated { .. })));
}

#[test]
fn test_decode_rejects_declared_length_longer_than_datagram() {
    // REGACK claims 7 bytes but only 5 arrived
    let err = decode(&[7, 0x0B, 0, 1, 0]).unwrap_err();
    assert_eq!(
        err,
        DecodeError::LengthMismatch {
            declared: 7,
            actual: 5
        }
    );
}

#[test]
fn test_decode_rejects_trailing_garbage() {
    let err = decode(&[3, 0x05, 0, 0xFF]).unwrap_err();
    assert!(matches!(err, DecodeError::LengthMismatch { declared: 3, .. }));
}

#[test]
fn test_decode_rejects_payload_shorter_than_layout() {
    // consistent length, but CONNACK needs a return code
    let err = decode(&[2, 0x05]).unwrap_err();
    assert!(matches!(err, DecodeError::Truncated { .. }));
}

#[test]
fn test_decode_rejects_fixed_layout_with_extra_bytes() {
    // PUBREL with a four-byte payload
    let err = decode(&[6, 0x10, 0, 1, 0, 2]).unwrap_err();
    assert!(matches!(err, DecodeError::LengthMismatch { .. }));
}

#[test]
fn test_decode_rejects_length_below_header() {
    assert_eq!(decode(&[1, 0, 3, 0x05]), Err(DecodeError::InvalidLength(3)));
    assert_eq!(decode(&[0, 0x05]), Err(DecodeError::InvalidLength(0)));
}

#[test]
fn test_decode_rejects_reserved_topic_id_type() {
    let err = decode(&[7, 0x12, 0x03, 0, 1, 0, 1]).unwrap_err();
    assert_eq!(err, DecodeError::ReservedTopicIdType);
}

#[rstest]
#[case::subscribe_three_bytes(&[8, 0x12, 0x02, 0, 1, b'a', b'b', b'c'], 3)]
#[case::subscribe_one_byte(&[6, 0x12, 0x02, 0, 1, b'a'], 1)]
#[case::unsubscribe_empty(&[5, 0x14, 0x02, 0, 1], 0)]
fn test_decode_rejects_short_topic_not_two_bytes(#[case] frame: &[u8], #[case] len: usize) {
    assert_eq!(decode(frame).unwrap_err(), DecodeError::InvalidShortTopic(len));
}

#[test]
fn test_decode_rejects_unknown_return_code() {
    assert_eq!(decode(&[3, 0x05, 0x09]), Err(DecodeError::InvalidReturnCode(0x09)));
}

#[test]
fn test_decode_rejects_invalid_utf8_client_id() {
    let err = decode(&[8, 0x04, 0x04, 0x01, 0, 10, 0xFF, 0xFE]).unwrap_err();
    assert_eq!(err, DecodeError::InvalidUtf8);
}

#[test]
fn test_flags_roundtrip_every_field() {
    let flags = Flags::default()
        .with_dup(true)
        .with_qos(QoS::FireAndForget)
        .with_retain(true)
        .with_will(true)
        .with_clean_session(true)
        .with_topic_id_type(TopicIdType::Predefined);
    assert_eq!(flags.bits(), 0xFD);
    assert!(flags.dup() && flags.retain() && flags.will() && flags.clean_session());
    assert_eq!(flags.qos(), QoS::FireAndForget);
    assert_eq!(flags.topic_id_type(), TopicIdType::Predefined);

    let cleared = flags.with_dup(false).with_will(false).with_qos(QoS::AtMostOnce);
    assert_eq!(cleared.bits(), 0x15);
}

#[test]
fn test_qos_ack_requirement() {
    assert!(!QoS::AtMostOnce.requires_ack());
    assert!(QoS::AtLeastOnce.requires_ack());
    assert!(QoS::ExactlyOnce.requires_ack());
    assert!(!QoS::FireAndForget.requires_ack());
}

#[test]
fn test_message_type_table_is_complete() {
    let known = (0u8..=0xFF).filter_map(MessageType::from_u8).count();
    assert_eq!(known, 27);
    for code in [0x03u8, 0x11, 0x19, 0x1E, 0xFE, 0xFF] {
        assert!(MessageType::from_u8(code).is_none());
    }
    assert_eq!(MessageType::Register.to_string(), "REGISTER");
}
