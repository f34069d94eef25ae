//! FileBroker - appends every record to a local file
//!
//! Stand-in broker for hosts without Kafka: records land in the file in
//! publish order, one per line. Partition and topic are not recorded.

use std::path::{Path, PathBuf};

use contracts::{BrokerHandle, ContractError, Message};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::error::BrokerError;

/// Broker handle writing to a file
#[derive(Debug)]
pub struct FileBroker {
    name: String,
    path: PathBuf,
    file: Option<File>,
    written: u64,
}

impl FileBroker {
    /// Open `path` for appending, creating it if needed
    #[instrument(name = "file_broker_connect", skip_all)]
    pub async fn connect(path: impl Into<PathBuf>) -> Result<Self, BrokerError> {
        let path = path.into();
        let name = format!("file:{}", path.display());

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| BrokerError::Connect {
                endpoint: name.clone(),
                source,
            })?;

        debug!(broker = %name, "File broker opened");
        Ok(Self {
            name,
            path,
            file: Some(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written so far
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl BrokerHandle for FileBroker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(
        &mut self,
        _topic: &str,
        _partition: u32,
        message: &Message,
    ) -> Result<(), ContractError> {
        let file = self.file.as_mut().ok_or_else(|| BrokerError::Closed {
            broker: self.name.clone(),
        })?;

        file.write_all(&message.to_record())
            .await
            .map_err(|e| BrokerError::io(&self.name, e))?;
        self.written += 1;
        Ok(())
    }

    fn pending_count(&self) -> usize {
        0
    }

    async fn drain_pending(&mut self) -> Result<Vec<Message>, ContractError> {
        if let Some(file) = self.file.as_mut() {
            file.flush()
                .await
                .map_err(|e| ContractError::drain(&self.name, e.to_string()))?;
        }
        Ok(Vec::new())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await.map_err(|e| BrokerError::io(&self.name, e))?;
            debug!(broker = %self.name, written = self.written, "File broker closed");
        }
        Ok(())
    }
}
