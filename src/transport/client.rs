//! A minimal gateway client, used by the `client` subcommand and the
//! end-to-end tests.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info};

use crate::protocol::packets::{
    ConnAck, Connect, Disconnect, Publish, RegAck, Register, SubAck, Subscribe, TopicRef,
};
use crate::protocol::{self, MAX_DATAGRAM_SIZE, Message, MessageType, QoS, ReturnCode, TopicIdType};
use crate::utils::BrokerError;

pub const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub struct GatewayClient {
    socket: UdpSocket,
    gateway: SocketAddr,
}

impl GatewayClient {
    /// Binds an ephemeral port on the same family as `gateway`, loopback when
    /// the gateway is local.
    pub async fn bind(gateway: SocketAddr) -> Result<Self, BrokerError> {
        let ip = match gateway.ip() {
            ip if ip.is_loopback() => ip,
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        let local = SocketAddr::new(ip, 0);
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| BrokerError::Bind {
                addr: local.to_string(),
                source,
            })?;
        Ok(Self { socket, gateway })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BrokerError> {
        Ok(self.socket.local_addr()?)
    }

    pub async fn send(&self, message: &Message) -> Result<(), BrokerError> {
        let frame = protocol::encode(message)?;
        self.send_raw(&frame).await
    }

    /// Sends bytes as they are, framed or not.
    pub async fn send_raw(&self, frame: &[u8]) -> Result<(), BrokerError> {
        self.socket
            .send_to(frame, self.gateway)
            .await
            .map_err(|source| BrokerError::Send {
                addr: self.gateway,
                source,
            })?;
        Ok(())
    }

    /// Next message from the gateway, waiting at most `wait`.
    pub async fn recv_within(&self, wait: Duration) -> Result<Message, BrokerError> {
        let deadline = Instant::now() + wait;
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let (len, from) = timeout_at(deadline, self.socket.recv_from(&mut buf))
                .await
                .map_err(|_| BrokerError::NoReply(self.gateway))??;
            if from == self.gateway {
                return Ok(protocol::decode(&buf[..len])?);
            }
            debug!("Ignoring datagram from {}", from);
        }
    }

    pub async fn recv(&self) -> Result<Message, BrokerError> {
        self.recv_within(REPLY_TIMEOUT).await
    }

    /// Sends `message` and waits for a reply of type `expected`, skipping
    /// anything else the gateway sends meanwhile.
    pub async fn request(
        &self,
        message: &Message,
        expected: MessageType,
    ) -> Result<Message, BrokerError> {
        self.send(message).await?;
        let deadline = Instant::now() + REPLY_TIMEOUT;
        loop {
            let reply = self.recv_within(deadline.saturating_duration_since(Instant::now())).await?;
            if reply.message_type() == expected {
                return Ok(reply);
            }
            debug!("Skipping {} while waiting for {}", reply.message_type(), expected);
        }
    }

    pub async fn connect(&self, client_id: &str, duration: u16) -> Result<ConnAck, BrokerError> {
        let message = Message::Connect(Connect::new(client_id, duration));
        match self.request(&message, MessageType::ConnAck).await? {
            Message::ConnAck(ack) => Ok(ack),
            other => Err(unexpected(MessageType::ConnAck, &other)),
        }
    }

    pub async fn register(&self, topic: &str, message_id: u16) -> Result<RegAck, BrokerError> {
        let message = Message::Register(Register {
            topic_id: 0,
            message_id,
            topic_name: topic.to_string(),
        });
        match self.request(&message, MessageType::RegAck).await? {
            Message::RegAck(ack) => Ok(ack),
            other => Err(unexpected(MessageType::RegAck, &other)),
        }
    }

    pub async fn subscribe(
        &self,
        topic: TopicRef,
        qos: QoS,
        message_id: u16,
    ) -> Result<SubAck, BrokerError> {
        let message = Message::Subscribe(Subscribe {
            dup: false,
            qos,
            message_id,
            topic,
        });
        match self.request(&message, MessageType::SubAck).await? {
            Message::SubAck(ack) => Ok(ack),
            other => Err(unexpected(MessageType::SubAck, &other)),
        }
    }

    pub async fn disconnect(&self) -> Result<(), BrokerError> {
        let message = Message::Disconnect(Disconnect::default());
        self.request(&message, MessageType::Disconnect).await?;
        Ok(())
    }
}

fn unexpected(expected: MessageType, got: &Message) -> BrokerError {
    BrokerError::UnexpectedReply {
        expected,
        got: got.message_type(),
    }
}

/// CONNECT, REGISTER, one QoS 0 PUBLISH, DISCONNECT. Returns the topic id the
/// gateway assigned.
pub async fn publish_once(
    gateway: SocketAddr,
    client_id: &str,
    topic: &str,
    payload: &[u8],
) -> Result<u16, BrokerError> {
    let client = GatewayClient::bind(gateway).await?;

    let connack = client.connect(client_id, 60).await?;
    info!("CONNACK {:?}", connack.return_code);

    let regack = client.register(topic, 1).await?;
    if regack.return_code != ReturnCode::Accepted {
        info!("REGISTER {:?} refused: {:?}", topic, regack.return_code);
        return Ok(regack.topic_id);
    }
    info!("Topic {:?} has id {}", topic, regack.topic_id);

    client
        .send(&Message::Publish(Publish {
            qos: QoS::AtMostOnce,
            topic_id_type: TopicIdType::Normal,
            topic_id: regack.topic_id,
            message_id: 2,
            data: Bytes::copy_from_slice(payload),
            ..Default::default()
        }))
        .await?;
    info!("Published {} bytes", payload.len());

    client.disconnect().await?;
    Ok(regack.topic_id)
}
