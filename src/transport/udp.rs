use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::broker::{Advertiser, Broker, Outbound};
use crate::config::BrokerSettings;
use crate::protocol;
use crate::utils::BrokerError;

/// Pause after a failed socket read before trying again.
pub const RECV_BACKOFF: Duration = Duration::from_millis(100);

/// The UDP listener.
///
/// One receive loop reads datagrams and hands each to its own task for
/// decoding and dispatch. Replies, forwards and advertisements all go through
/// one channel to a writer task.
#[derive(Debug)]
pub struct Server {
    socket: Arc<UdpSocket>,
    broker: Arc<Broker>,
    buffer_size: usize,
    advertise_interval_secs: u16,
}

impl Server {
    pub async fn bind(
        addr: &str,
        broker: Arc<Broker>,
        settings: &BrokerSettings,
    ) -> Result<Self, BrokerError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| BrokerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        info!("Gateway listening on udp://{}", socket.local_addr()?);

        Ok(Self {
            socket: Arc::new(socket),
            broker,
            buffer_size: settings.buffer_size,
            advertise_interval_secs: settings.advertise_interval_secs,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BrokerError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    /// Serves until the future is dropped. Read errors are logged and
    /// retried after [`RECV_BACKOFF`].
    pub async fn run(self) {
        let (tx, rx) = mpsc::unbounded_channel::<Outbound>();

        let advertiser = Advertiser::new(
            Arc::clone(self.broker.clients()),
            self.broker.gateway_id(),
            self.advertise_interval_secs,
        );
        let _tasks = TaskGuard(vec![
            tokio::spawn(write_loop(Arc::clone(&self.socket), rx)),
            tokio::spawn(advertiser.run(tx.clone())),
        ]);

        let mut buf = vec![0u8; self.buffer_size];
        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, from)) => {
                    let datagram = Bytes::copy_from_slice(&buf[..len]);
                    let broker = Arc::clone(&self.broker);
                    let tx = tx.clone();

                    tokio::spawn(async move {
                        for outbound in handle_datagram(&broker, datagram, from) {
                            if tx.send(outbound).is_err() {
                                break;
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to read from socket: {}", e);
                    tokio::time::sleep(RECV_BACKOFF).await;
                }
            }
        }
    }
}

/// Aborts the background tasks when the receive loop goes away.
struct TaskGuard(Vec<JoinHandle<()>>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        for task in &self.0 {
            task.abort();
        }
    }
}

/// Decodes and dispatches one datagram. Malformed input yields nothing.
pub fn handle_datagram(broker: &Broker, datagram: Bytes, from: SocketAddr) -> Vec<Outbound> {
    trace!(
        "{} bytes from {}: {}",
        datagram.len(),
        from,
        hex::encode(&datagram)
    );

    match protocol::decode(&datagram) {
        Ok(message) => broker.dispatch_frame(message, datagram, from),
        Err(e) => {
            warn!("Dropping malformed datagram from {}: {}", from, e);
            Vec::new()
        }
    }
}

async fn write_loop(socket: Arc<UdpSocket>, mut rx: UnboundedReceiver<Outbound>) {
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }

        let results = join_all(batch.iter().map(|o| send_outbound(&socket, o))).await;
        for result in results {
            // best effort, like the transport itself
            if let Err(e) = result {
                warn!("{}", e);
            }
        }
    }
    debug!("Writer closed");
}

/// Encodes `outbound` and writes it to its destination.
pub async fn send_outbound(socket: &UdpSocket, outbound: &Outbound) -> Result<(), BrokerError> {
    let frame = outbound.encoded()?;
    socket
        .send_to(&frame, outbound.to)
        .await
        .map_err(|source| BrokerError::Send {
            addr: outbound.to,
            source,
        })?;
    trace!("{} sent to {}", outbound.message.message_type(), outbound.to);
    Ok(())
}
