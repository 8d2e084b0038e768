//! Periodic ADVERTISE broadcast to every known client.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::broker::engine::Outbound;
use crate::client::ClientRegistry;
use crate::protocol::Message;
use crate::protocol::packets::Advertise;

/// Subtracted from the interval to cover the time spent sending.
pub const SEND_COMPENSATION: Duration = Duration::from_millis(850);

/// Sleep between two rounds for an advertised duration of `interval_secs`.
pub fn advertise_period(interval_secs: u16) -> Duration {
    Duration::from_secs(interval_secs.into()).saturating_sub(SEND_COMPENSATION)
}

#[derive(Debug)]
pub struct Advertiser {
    clients: Arc<ClientRegistry>,
    gateway_id: u8,
    interval_secs: u16,
}

impl Advertiser {
    pub fn new(clients: Arc<ClientRegistry>, gateway_id: u8, interval_secs: u16) -> Self {
        Self {
            clients,
            gateway_id,
            interval_secs,
        }
    }

    /// One ADVERTISE per currently known client.
    pub fn advertisements(&self) -> Vec<Outbound> {
        let advertise = Advertise {
            gateway_id: self.gateway_id,
            duration: self.interval_secs,
        };
        self.clients
            .clients()
            .into_iter()
            .map(|client| Outbound::new(client.addr, Message::Advertise(advertise)))
            .collect()
    }

    /// Sends a round every period until the receiving side goes away. An
    /// interval of 0 returns immediately.
    pub async fn run(self, tx: UnboundedSender<Outbound>) {
        if self.interval_secs == 0 {
            debug!("Advertiser disabled");
            return;
        }

        let period = advertise_period(self.interval_secs);
        info!(
            "Advertising gateway {} every {}s",
            self.gateway_id, self.interval_secs
        );

        loop {
            tokio::time::sleep(period).await;

            let round = self.advertisements();
            debug!("Advertising to {} client(s)", round.len());
            for outbound in round {
                if tx.send(outbound).is_err() {
                    return;
                }
            }
            if tx.is_closed() {
                return;
            }
        }
    }
}
