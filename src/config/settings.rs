use serde::Deserialize;

/// Top-level configuration settings for the gateway.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub log: LogSettings,
    pub session: SessionSettings,
}

/// Where the gateway listens.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Address for a TCP-carried listener. Accepted but not served.
    pub tcp_address: Option<String>,
}

impl ServerSettings {
    /// The UDP listen address as `host:port`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Gateway behaviour.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BrokerSettings {
    /// Receive buffer size in bytes; datagrams longer than this are truncated.
    pub buffer_size: usize,
    /// Seconds between ADVERTISE broadcasts. 0 disables them.
    pub advertise_interval_secs: u16,
    pub gateway_id: u8,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
    pub path: Option<String>,
    pub utc: bool,
    pub debug: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    Sled,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SessionSettings {
    pub backend: SessionBackend,
    pub path: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from the defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub log: Option<PartialLogSettings>,
    pub session: Option<PartialSessionSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tcp_address: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialBrokerSettings {
    pub buffer_size: Option<usize>,
    pub advertise_interval_secs: Option<u16>,
    pub gateway_id: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLogSettings {
    pub level: Option<String>,
    pub path: Option<String>,
    pub utc: Option<bool>,
    pub debug: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialSessionSettings {
    pub backend: Option<SessionBackend>,
    pub path: Option<String>,
}

/// Smallest buffer that can hold a frame header.
pub const MIN_BUFFER_SIZE: usize = 2;

impl PartialSettings {
    /// Fills every missing value from `Settings::default()`.
    pub fn merge(self) -> Settings {
        let server = self.server.unwrap_or_default();
        let broker = self.broker.unwrap_or_default();
        let log = self.log.unwrap_or_default();
        let session = self.session.unwrap_or_default();
        let default = Settings::default();

        Settings {
            server: ServerSettings {
                host: server.host.unwrap_or(default.server.host),
                port: server.port.unwrap_or(default.server.port),
                tcp_address: server
                    .tcp_address
                    .filter(|a| !a.is_empty())
                    .or(default.server.tcp_address),
            },
            broker: BrokerSettings {
                buffer_size: broker
                    .buffer_size
                    .unwrap_or(default.broker.buffer_size)
                    .max(MIN_BUFFER_SIZE),
                advertise_interval_secs: broker
                    .advertise_interval_secs
                    .unwrap_or(default.broker.advertise_interval_secs),
                gateway_id: broker.gateway_id.unwrap_or(default.broker.gateway_id),
            },
            log: LogSettings {
                level: log.level.unwrap_or(default.log.level),
                path: log.path.filter(|p| !p.is_empty()).or(default.log.path),
                utc: log.utc.unwrap_or(default.log.utc),
                debug: log.debug.unwrap_or(default.log.debug),
            },
            session: SessionSettings {
                backend: session.backend.unwrap_or(default.session.backend),
                path: session.path.unwrap_or(default.session.path),
            },
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 1884,
            tcp_address: None,
        }
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            buffer_size: crate::protocol::MAX_DATAGRAM_SIZE,
            advertise_interval_secs: 180,
            gateway_id: 0,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            path: None,
            utc: false,
            debug: false,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Memory,
            path: "sessions_db".to_string(),
        }
    }
}
