//! Engine - spool replay, the live input loop and shutdown
//!
//! Order of work:
//! 1. every spooled record is dispatched, then the spool is removed
//! 2. a reader task fills the [`InputQueue`] from the input stream
//! 3. the main loop dispatches queued records until end of input or shutdown
//! 4. broker backlog and unread input are appended to the spool

use contracts::{BrokerHandle, ForwarderConfig, Message};
use observability::DeliverySummary;
use spool::{InputBuffer, InputQueue, RecordReader};
use tokio::io::{AsyncRead, BufReader};
use tracing::{debug, info, instrument, warn};

use crate::dispatcher::Dispatcher;
use crate::error::DispatcherError;
use crate::metrics::MetricsSnapshot;
use crate::shutdown::ShutdownFlag;

/// Items the input queue holds regardless of the byte budget
const INPUT_QUEUE_CAPACITY: usize = 4096;

/// Engine parameters
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub topic: String,
    /// Log progress every this many messages (0 = never)
    pub progress_interval: u64,
    /// Byte budget of the input queue
    pub input_buffer_bytes: usize,
    pub input_capacity: usize,
}

impl EngineSettings {
    pub fn from_config(config: &ForwarderConfig) -> Self {
        Self {
            topic: config.topic.clone(),
            progress_interval: config.progress_interval,
            input_buffer_bytes: config.input_buffer_bytes,
            input_capacity: INPUT_QUEUE_CAPACITY,
        }
    }
}

/// What a completed run did
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Messages dispatched, replayed ones included
    pub sent: u64,
    /// Messages replayed from the spool
    pub replayed: u64,
    /// Records appended to the spool at shutdown
    pub spooled: usize,
    pub metrics: MetricsSnapshot,
    pub summary: DeliverySummary,
}

/// Forwarding engine
#[derive(Debug)]
pub struct Engine<H> {
    dispatcher: Dispatcher<H>,
    shutdown: ShutdownFlag,
    settings: EngineSettings,
    sent: u64,
    replayed: u64,
}

impl<H: BrokerHandle> Engine<H> {
    pub fn new(dispatcher: Dispatcher<H>, shutdown: ShutdownFlag, settings: EngineSettings) -> Self {
        Self {
            dispatcher,
            shutdown,
            settings,
            sent: 0,
            replayed: 0,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<H> {
        &self.dispatcher
    }

    /// Messages dispatched so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Dispatch every spooled record, then remove the spool
    ///
    /// If the brokers go down part way, the records not yet replayed are
    /// appended after the emergency flush so none are lost.
    #[instrument(name = "engine_replay_spool", skip(self))]
    pub async fn replay_spool(&mut self) -> Result<u64, DispatcherError> {
        let records = self.dispatcher.spool().load()?;
        if records.is_empty() {
            self.remove_spool()?;
            return Ok(0);
        }

        info!(records = records.len(), "Replaying spooled messages");
        let mut replayed = 0;

        for (index, message) in records.iter().enumerate() {
            if let Err(e) = self.dispatch(message.clone()).await {
                self.spool_after_fatal(&e, &records[index + 1..]);
                return Err(e);
            }
            replayed += 1;
            self.replayed += 1;
            self.dispatcher.metrics().inc_replayed();
            observability::record_message_replayed();
        }

        self.remove_spool()?;
        info!(replayed, "Spool replay complete");
        Ok(replayed)
    }

    fn remove_spool(&self) -> Result<(), DispatcherError> {
        self.dispatcher.spool().remove()?;
        Ok(())
    }

    /// Replay the spool, then forward `input` until it ends or shutdown is
    /// requested
    #[instrument(name = "engine_run", skip_all, fields(topic = %self.settings.topic))]
    pub async fn run<R>(mut self, input: R) -> Result<RunReport, DispatcherError>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        self.replay_spool().await?;

        let queue = InputQueue::new(InputBuffer::new(
            self.settings.input_capacity,
            self.settings.input_buffer_bytes,
        ));
        let reader = tokio::spawn(read_input(
            RecordReader::new(BufReader::new(input)),
            queue.clone(),
            self.shutdown.clone(),
        ));

        info!("Forwarding live input");
        let outcome = self.forward(&queue).await;

        // stop the reader whether we hit end of input, a signal or an error
        self.shutdown.trigger();
        match reader.await {
            Ok(Ok(read)) => debug!(read, "Input reader finished"),
            Ok(Err(e)) => warn!(error = %e, "Input read error, treated as end of input"),
            Err(e) => warn!(error = %e, "Input reader task failed"),
        }
        let leftover = queue.drain();

        if let Err(e) = outcome {
            self.spool_after_fatal(&e, &leftover);
            return Err(e);
        }

        let spooled = self.dispatcher.shutdown(leftover).await?;
        info!(sent = self.sent, topic = %self.settings.topic, "sendcnt num {}", self.sent);

        Ok(RunReport {
            sent: self.sent,
            replayed: self.replayed,
            spooled,
            metrics: self.dispatcher.metrics().snapshot(),
            summary: self.dispatcher.summary(),
        })
    }

    async fn forward(&mut self, queue: &InputQueue) -> Result<(), DispatcherError> {
        loop {
            if self.shutdown.is_triggered() {
                info!("Shutdown requested");
                return Ok(());
            }

            let next = tokio::select! {
                biased;
                _ = self.shutdown.wait() => continue,
                next = queue.pop() => next,
            };

            match next {
                Some(message) => self.dispatch(message).await?,
                None => {
                    info!("End of input");
                    return Ok(());
                }
            }
        }
    }

    async fn dispatch(&mut self, message: Message) -> Result<(), DispatcherError> {
        self.sent += 1;
        self.dispatcher.produce_with_retry(message).await?;

        let interval = self.settings.progress_interval;
        if interval > 0 && self.sent.is_multiple_of(interval) {
            info!(
                sent = self.sent,
                topic = %self.settings.topic,
                "Sent {} messages to topic {}",
                self.sent,
                self.settings.topic
            );
        }
        Ok(())
    }

    /// After an emergency flush, keep whatever input is left
    fn spool_after_fatal(&self, error: &DispatcherError, remaining: &[Message]) {
        let flushed = matches!(
            error,
            DispatcherError::AllBrokersDown { .. } | DispatcherError::Monitor(_)
        );
        if !flushed || remaining.is_empty() {
            return;
        }
        if let Err(e) = self.dispatcher.spool_remaining(remaining) {
            warn!(error = %e, lost = remaining.len(), "Could not spool remaining input");
        }
    }
}

/// Fill `queue` from `reader` until end of input or shutdown
///
/// A record read while shutdown arrives is still queued so it reaches the
/// spool.
async fn read_input<R>(
    mut reader: RecordReader<R>,
    queue: InputQueue,
    shutdown: ShutdownFlag,
) -> std::io::Result<u64>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut read = 0;
    let result = loop {
        let record = tokio::select! {
            _ = shutdown.wait() => break Ok(read),
            record = reader.next_record() => record,
        };

        let message = match record {
            Ok(Some(message)) => message,
            Ok(None) => break Ok(read),
            Err(e) => break Err(e),
        };
        read += 1;

        tokio::select! {
            pushed = queue.push(message.clone()) => {
                if pushed.is_err() {
                    break Ok(read);
                }
            }
            _ = shutdown.wait() => {
                if queue.push_now(message).is_err() {
                    warn!("Input queue full at shutdown, record dropped");
                }
                break Ok(read);
            }
        }
        observability::record_input_buffer_bytes(queue.bytes());
    };

    queue.close();
    result
}
