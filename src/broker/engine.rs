use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::broker::topic::{TopicRegistry, is_registrable};
use crate::client::{Client, ClientRegistry};
use crate::persistence::{
    ConnectInfo, ConnectState, RetainedMessage, Session, SessionError, SessionStore,
};
use crate::protocol::packets::{
    ConnAck, Connect, Disconnect, PubAck, Publish, RegAck, Register, SubAck, Subscribe, TopicRef,
    UnsubAck, Unsubscribe,
};
use crate::protocol::{self, EncodeError, Message, NO_TOPIC_ID, ReturnCode};
use crate::utils::error::validate_client_id;

/// A message the gateway wants written to `to`.
///
/// Forwarded publishes carry the frame they arrived in, which is written out
/// as is instead of being encoded again.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: SocketAddr,
    pub message: Message,
    pub frame: Option<Bytes>,
}

impl Outbound {
    pub fn new(to: SocketAddr, message: Message) -> Self {
        Self {
            to,
            message,
            frame: None,
        }
    }

    pub fn forward(to: SocketAddr, message: Message, frame: Option<Bytes>) -> Self {
        Self { to, message, frame }
    }

    /// The bytes to put on the wire.
    pub fn encoded(&self) -> Result<Bytes, EncodeError> {
        match &self.frame {
            Some(frame) => Ok(frame.clone()),
            None => protocol::encode(&self.message),
        }
    }
}

/// The protocol dispatcher.
///
/// Holds the topic and client registries and the session store. Each call to
/// [`Broker::dispatch`] handles one decoded message and returns the replies
/// and forwards it produced. Nothing is sent from here, so no lock is ever
/// held across socket I/O.
#[derive(Debug)]
pub struct Broker {
    topics: Arc<TopicRegistry>,
    clients: Arc<ClientRegistry>,
    sessions: Arc<dyn SessionStore>,
    gateway_id: u8,
}

impl Broker {
    pub fn new(sessions: Arc<dyn SessionStore>, gateway_id: u8) -> Self {
        Self {
            topics: Arc::new(TopicRegistry::new()),
            clients: Arc::new(ClientRegistry::new()),
            sessions,
            gateway_id,
        }
    }

    pub fn topics(&self) -> &Arc<TopicRegistry> {
        &self.topics
    }

    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn gateway_id(&self) -> u8 {
        self.gateway_id
    }

    /// Runs the state transition for one message from `from`.
    pub fn dispatch(&self, message: Message, from: SocketAddr) -> Vec<Outbound> {
        self.route(message, None, from)
    }

    /// Like [`Broker::dispatch`], with the datagram `message` was decoded
    /// from. Publishes are forwarded as that exact frame.
    pub fn dispatch_frame(&self, message: Message, frame: Bytes, from: SocketAddr) -> Vec<Outbound> {
        self.route(message, Some(frame), from)
    }

    fn route(&self, message: Message, frame: Option<Bytes>, from: SocketAddr) -> Vec<Outbound> {
        debug!("{} from {}", message.message_type(), from);

        match message {
            Message::Connect(connect) => self.handle_connect(connect, from),
            Message::Register(register) => self.handle_register(register, from),
            Message::Publish(publish) => self.handle_publish(publish, frame, from),
            Message::PubAck(ack) => self.handle_puback(ack, from),
            Message::Subscribe(subscribe) => self.handle_subscribe(subscribe, from),
            Message::Unsubscribe(unsubscribe) => self.handle_unsubscribe(unsubscribe, from),
            Message::PingReq(_) => self.handle_pingreq(from),
            Message::Disconnect(disconnect) => self.handle_disconnect(disconnect, from),
            other => {
                debug!("Ignoring {} from {}", other.message_type(), from);
                Vec::new()
            }
        }
    }

    fn known_client(&self, from: SocketAddr, what: &str) -> Option<Arc<Client>> {
        let client = self.clients.get_client(&from);
        if client.is_none() {
            warn!("Dropping {} from unknown address {}", what, from);
        }
        client
    }

    fn handle_connect(&self, connect: Connect, from: SocketAddr) -> Vec<Outbound> {
        if let Err(e) = validate_client_id(&connect.client_id) {
            warn!("Rejecting CONNECT from {}: {}", from, e);
            return Vec::new();
        }

        let client = Client::new(connect.client_id.clone(), from).with_will(connect.will);
        if connect.will {
            debug!("{} announced a will; its contents are not captured", client);
        }

        match self.attach_session(&connect) {
            Ok(session) => self.restore_registrations(&client, &session),
            Err(e) => warn!("Session for {} unavailable: {}", connect.client_id, e),
        }

        if self.clients.add_client(client) {
            info!("Client {} connected from {}", connect.client_id, from);
        } else {
            info!("Client {} reconnected from {}", connect.client_id, from);
        }

        vec![Outbound::new(
            from,
            Message::ConnAck(ConnAck {
                return_code: ReturnCode::Accepted,
            }),
        )]
    }

    /// Starts a fresh session on clean-session, otherwise resumes the stored
    /// one when there is one.
    fn attach_session(&self, connect: &Connect) -> Result<Arc<Session>, SessionError> {
        let info = ConnectInfo::from(connect);
        let id = connect.client_id.as_str();

        if !connect.clean_session {
            match self.sessions.get(id) {
                Ok(session) if session.is_initialized() => {
                    debug!("Resuming session {}", id);
                    session.update(info);
                    return Ok(session);
                }
                Ok(session) => {
                    session.init(info)?;
                    return Ok(session);
                }
                Err(SessionError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let session = self.sessions.create(id)?;
        session.init(info)?;
        Ok(session)
    }

    /// Re-registers the topics a resumed session subscribed to.
    fn restore_registrations(&self, client: &Client, session: &Session) {
        let Ok(topics) = session.topics() else {
            return;
        };
        for (topic, _) in topics {
            let topic_id = self.topics.get_id(&topic);
            if topic_id != NO_TOPIC_ID {
                client.register(topic_id, topic);
            }
        }
    }

    fn session_of(&self, client: &Client) -> Option<Arc<Session>> {
        match self.sessions.get(&client.client_id) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!("No session for {}: {}", client, e);
                None
            }
        }
    }

    fn handle_register(&self, register: Register, from: SocketAddr) -> Vec<Outbound> {
        let Some(client) = self.known_client(from, "REGISTER") else {
            return Vec::new();
        };

        let (topic_id, return_code) = self.resolve_name(&client, &register.topic_name);
        debug!(
            "{} registered {:?} as {} ({:?})",
            client, register.topic_name, topic_id, return_code
        );

        vec![Outbound::new(
            from,
            Message::RegAck(RegAck {
                topic_id,
                message_id: register.message_id,
                return_code,
            }),
        )]
    }

    /// Resolves or allocates the id for `topic` and records it in the
    /// client's table.
    fn resolve_name(&self, client: &Client, topic: &str) -> (u16, ReturnCode) {
        if !is_registrable(topic) {
            return (NO_TOPIC_ID, ReturnCode::RejectedNotSupported);
        }

        match self.topics.get_or_create(topic) {
            NO_TOPIC_ID => {
                warn!("Topic id space exhausted, cannot register {:?}", topic);
                (NO_TOPIC_ID, ReturnCode::RejectedCongestion)
            }
            topic_id => {
                if !client.registered(topic_id) {
                    client.register(topic_id, topic);
                }
                (topic_id, ReturnCode::Accepted)
            }
        }
    }

    fn handle_publish(
        &self,
        publish: Publish,
        frame: Option<Bytes>,
        from: SocketAddr,
    ) -> Vec<Outbound> {
        let mut out = Vec::new();

        let topic = self.topics.get_topic(publish.topic_id);
        if topic.is_empty() {
            debug!("PUBLISH on unknown topic id {} from {}", publish.topic_id, from);
        } else {
            for subscriber in self.clients.subscribers_of(publish.topic_id, &topic) {
                if publish.qos.requires_ack() {
                    subscriber.add_pending_message(publish.clone());
                }
                out.push(Outbound::forward(
                    subscriber.addr,
                    Message::Publish(publish.clone()),
                    frame.clone(),
                ));
            }
            debug!("Forwarded {} to {} subscriber(s)", topic, out.len());
        }

        if publish.retain {
            self.retain(&publish, from);
        }

        if publish.qos.requires_ack() {
            out.push(Outbound::new(
                from,
                Message::PubAck(PubAck {
                    topic_id: publish.topic_id,
                    message_id: publish.message_id,
                    return_code: ReturnCode::Accepted,
                }),
            ));
        }

        out
    }

    fn retain(&self, publish: &Publish, from: SocketAddr) {
        let Some(client) = self.clients.get_client(&from) else {
            return;
        };
        if let Some(session) = self.session_of(&client) {
            session.retain_message(RetainedMessage {
                topic_id: publish.topic_id,
                qos: publish.qos as u8,
                data: publish.data.to_vec(),
            });
        }
    }

    fn handle_puback(&self, ack: PubAck, from: SocketAddr) -> Vec<Outbound> {
        let Some(client) = self.known_client(from, "PUBACK") else {
            return Vec::new();
        };

        match client.fetch_pending_message(ack.topic_id) {
            Some(pending) => debug!(
                "{} acknowledged message {} on topic {}, {} still in flight",
                client,
                pending.message_id,
                ack.topic_id,
                client.pending_count()
            ),
            None => debug!(
                "{} acknowledged topic {} with nothing in flight",
                client, ack.topic_id
            ),
        }
        Vec::new()
    }

    fn handle_subscribe(&self, subscribe: Subscribe, from: SocketAddr) -> Vec<Outbound> {
        let Some(client) = self.known_client(from, "SUBSCRIBE") else {
            return Vec::new();
        };

        let (topic_id, return_code) = match &subscribe.topic {
            TopicRef::Name(name) | TopicRef::Short(name) => {
                let resolved = self.resolve_name(&client, name);
                if resolved.1 == ReturnCode::Accepted {
                    self.record_subscription(&client, name, &subscribe);
                }
                resolved
            }
            TopicRef::Predefined(topic_id) => {
                let name = self.topics.get_topic(*topic_id);
                if name.is_empty() {
                    (*topic_id, ReturnCode::RejectedInvalidTopicId)
                } else {
                    client.register(*topic_id, name.as_str());
                    self.record_subscription(&client, &name, &subscribe);
                    (*topic_id, ReturnCode::Accepted)
                }
            }
        };

        debug!("{} subscribed to {} ({:?})", client, topic_id, return_code);

        vec![Outbound::new(
            from,
            Message::SubAck(SubAck {
                qos: subscribe.qos,
                topic_id,
                message_id: subscribe.message_id,
                return_code,
            }),
        )]
    }

    fn record_subscription(&self, client: &Client, topic: &str, subscribe: &Subscribe) {
        if let Some(session) = self.session_of(client) {
            if let Err(e) = session.add_topic(topic, subscribe.qos) {
                warn!("Could not record subscription of {}: {}", client, e);
            }
        }
    }

    fn handle_unsubscribe(&self, unsubscribe: Unsubscribe, from: SocketAddr) -> Vec<Outbound> {
        let Some(client) = self.known_client(from, "UNSUBSCRIBE") else {
            return Vec::new();
        };

        let removed = match &unsubscribe.topic {
            TopicRef::Name(name) | TopicRef::Short(name) => client
                .registered_id(name)
                .and_then(|topic_id| client.unregister(topic_id)),
            TopicRef::Predefined(topic_id) => client.unregister(*topic_id),
        };

        if let Some(topic) = removed {
            debug!("{} unsubscribed from {}", client, topic);
            if let Some(session) = self.session_of(&client) {
                if let Err(e) = session.remove_topic(&topic) {
                    warn!("Could not drop subscription of {}: {}", client, e);
                }
            }
        }

        vec![Outbound::new(
            from,
            Message::UnsubAck(UnsubAck {
                message_id: unsubscribe.message_id,
            }),
        )]
    }

    fn handle_pingreq(&self, from: SocketAddr) -> Vec<Outbound> {
        match self.known_client(from, "PINGREQ") {
            Some(_) => vec![Outbound::new(from, Message::PingResp)],
            None => Vec::new(),
        }
    }

    fn handle_disconnect(&self, disconnect: Disconnect, from: SocketAddr) -> Vec<Outbound> {
        let Some(client) = self.known_client(from, "DISCONNECT") else {
            return Vec::new();
        };

        if let Some(session) = self.session_of(&client) {
            session.set_state(match disconnect.duration {
                0 => ConnectState::Disconnected,
                duration => ConnectState::Asleep(duration),
            });
            if let Err(e) = self.sessions.save(&client.client_id) {
                warn!("Could not save session of {}: {}", client, e);
            }
        }

        if disconnect.duration == 0 {
            self.clients.remove_client(&client.addr_string());
            info!("Client {} disconnected", client);
        } else {
            info!("Client {} asleep for {}s", client, disconnect.duration);
        }

        vec![Outbound::new(
            from,
            Message::Disconnect(Disconnect { duration: 0 }),
        )]
    }
}
