//! TcpBroker - newline-framed relay over TCP
//!
//! Accepted records go into a local delivery queue and are written to the
//! socket in order. Records the socket has not taken yet are the broker's
//! pending backlog. A broken connection is dropped and re-established on the
//! next publish.

use std::collections::VecDeque;

use bytes::Bytes;
use contracts::{BrokerHandle, ContractError, Message};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, instrument, warn};

use crate::error::BrokerError;

/// Default bound on the local delivery queue
pub const DEFAULT_MAX_PENDING: usize = 100_000;

/// TCP broker configuration
#[derive(Debug, Clone)]
pub struct TcpBrokerConfig {
    pub host: String,
    pub port: u16,
    /// Records held locally before publish starts failing
    pub max_pending: usize,
}

impl TcpBrokerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

/// Broker handle over a TCP stream
#[derive(Debug)]
pub struct TcpBroker {
    name: String,
    config: TcpBrokerConfig,
    stream: Option<TcpStream>,
    pending: VecDeque<Bytes>,
    closed: bool,
}

impl TcpBroker {
    /// Connect to the configured endpoint
    #[instrument(name = "tcp_broker_connect", skip(config), fields(host = %config.host, port = config.port))]
    pub async fn connect(config: TcpBrokerConfig) -> Result<Self, BrokerError> {
        let name = format!("{}:{}", config.host, config.port);
        let stream = open_stream(&name, &config).await?;

        debug!(broker = %name, "TCP broker connected");
        Ok(Self {
            name,
            config,
            stream: Some(stream),
            pending: VecDeque::new(),
            closed: false,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn ensure_connected(&mut self) -> Result<(), BrokerError> {
        if self.stream.is_none() {
            let stream = open_stream(&self.name, &self.config).await?;
            debug!(broker = %self.name, "TCP broker reconnected");
            self.stream = Some(stream);
        }
        Ok(())
    }

    /// Write queued records until the queue is empty or the socket fails
    ///
    /// A record leaves the queue only once fully written.
    async fn flush_pending(&mut self) -> Result<(), BrokerError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };

        while let Some(record) = self.pending.front() {
            if let Err(e) = stream.write_all(record).await {
                warn!(
                    broker = %self.name,
                    pending = self.pending.len(),
                    error = %e,
                    "TCP write failed, dropping connection"
                );
                self.stream = None;
                return Err(BrokerError::io(&self.name, e));
            }
            self.pending.pop_front();
        }

        stream
            .flush()
            .await
            .map_err(|e| BrokerError::io(&self.name, e))
    }
}

async fn open_stream(name: &str, config: &TcpBrokerConfig) -> Result<TcpStream, BrokerError> {
    let stream = TcpStream::connect((config.host.as_str(), config.port))
        .await
        .map_err(|source| BrokerError::Connect {
            endpoint: name.to_string(),
            source,
        })?;
    if let Err(e) = stream.set_nodelay(true) {
        debug!(broker = %name, error = %e, "Cannot disable Nagle, continuing");
    }
    Ok(stream)
}

impl BrokerHandle for TcpBroker {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "tcp_broker_publish", skip(self, topic, message), fields(broker = %self.name))]
    async fn publish(
        &mut self,
        topic: &str,
        partition: u32,
        message: &Message,
    ) -> Result<(), ContractError> {
        let _ = (topic, partition);

        if self.closed {
            return Err(BrokerError::Closed {
                broker: self.name.clone(),
            }
            .into());
        }
        if self.pending.len() >= self.config.max_pending {
            return Err(BrokerError::QueueFull {
                broker: self.name.clone(),
                capacity: self.config.max_pending,
            }
            .into());
        }

        self.ensure_connected().await?;
        self.pending.push_back(message.to_record());

        // the record is accepted once queued; a failed write leaves it pending
        if let Err(e) = self.flush_pending().await {
            debug!(broker = %self.name, error = %e, "Record left pending");
        }
        Ok(())
    }

    fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[instrument(name = "tcp_broker_drain", skip(self), fields(broker = %self.name))]
    async fn drain_pending(&mut self) -> Result<Vec<Message>, ContractError> {
        if !self.pending.is_empty() && !self.closed {
            match self.ensure_connected().await {
                Ok(()) => {
                    if let Err(e) = self.flush_pending().await {
                        warn!(error = %e, pending = self.pending.len(), "Final flush failed");
                    }
                }
                Err(e) => warn!(error = %e, "Cannot reconnect to drain backlog"),
            }
        }

        let drained: Vec<Message> = self.pending.drain(..).map(Message::new).collect();
        if !drained.is_empty() {
            debug!(count = drained.len(), "Returning undelivered backlog");
        }
        Ok(drained)
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.closed = true;
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(broker = %self.name, error = %e, "TCP shutdown error ignored");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    async fn listener() -> (TcpListener, TcpBrokerConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, TcpBrokerConfig::new("127.0.0.1", port))
    }

    #[tokio::test]
    async fn test_loopback_delivery_in_order() {
        let (listener, config) = listener().await;

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(socket).lines();
            let mut received = Vec::new();
            while let Some(line) = lines.next_line().await.unwrap() {
                received.push(line);
            }
            received
        });

        let mut broker = TcpBroker::connect(config).await.unwrap();
        broker.publish("t", 0, &Message::from("alpha\n")).await.unwrap();
        broker.publish("t", 1, &Message::from("beta")).await.unwrap();
        assert_eq!(broker.pending_count(), 0);
        assert!(broker.drain_pending().await.unwrap().is_empty());
        broker.close().await.unwrap();

        let received = server.await.unwrap();
        assert_eq!(received, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let (listener, config) = listener().await;
        drop(listener);

        let err = TcpBroker::connect(config).await.unwrap_err();
        assert!(matches!(err, BrokerError::Connect { .. }));
        assert_eq!(err.fatal_kind(), contracts::FatalKind::BrokerConnect);
    }

    #[tokio::test]
    async fn test_publish_fails_when_reconnect_fails() {
        let (listener, config) = listener().await;
        let accept = tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let mut broker = TcpBroker::connect(config).await.unwrap();
        accept.await.unwrap();
        // simulate a dropped connection to a listener that is gone
        broker.stream = None;

        let err = broker.publish("t", 0, &Message::from("x")).await.unwrap_err();
        assert!(matches!(err, ContractError::BrokerConnection { .. }));
        assert_eq!(broker.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_queue_full_rejects() {
        let (listener, mut config) = listener().await;
        config.max_pending = 1;
        let _accept = tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let mut broker = TcpBroker::connect(config).await.unwrap();
        broker.stream = None;
        broker.pending.push_back(Bytes::from_static(b"stuck\n"));

        let err = broker.publish("t", 0, &Message::from("x")).await.unwrap_err();
        assert!(err.to_string().contains("queue full"));

        // closed handles hand back their backlog without reconnecting
        broker.close().await.unwrap();
        let drained = broker.drain_pending().await.unwrap();
        assert_eq!(drained, vec![Message::from("stuck\n")]);
    }

    #[tokio::test]
    async fn test_stream_disables_nagle() {
        let (listener, config) = listener().await;
        let _accept = tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let stream = open_stream("127.0.0.1", &config).await.unwrap();
        assert!(stream.nodelay().unwrap());
    }

    #[tokio::test]
    async fn test_drain_returns_backlog_when_broker_gone() {
        let (listener, config) = listener().await;
        let accept = tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let mut broker = TcpBroker::connect(config).await.unwrap();
        accept.await.unwrap();
        broker.stream = None;
        broker.pending.push_back(Bytes::from_static(b"late\n"));

        let drained = broker.drain_pending().await.unwrap();
        assert_eq!(drained, vec![Message::from("late\n")]);
        assert_eq!(broker.pending_count(), 0);
    }
}
