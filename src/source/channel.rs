//! Channel-backed record source.
//!
//! Lets producer threads push records into the pipeline. The stream ends once
//! every [`RecordSender`] has been dropped and the queue is drained.

use crate::error::SourceError;
use crate::source::types::Record;
use crate::source::RecordSource;
use crossbeam_channel::{bounded, Receiver, Sender};

type Item = Result<Record, SourceError>;

/// Producer half handed to feeding threads.
#[derive(Clone)]
pub struct RecordSender {
    sender: Sender<Item>,
}

impl RecordSender {
    /// Queue a record, blocking while the channel is full.
    ///
    /// Returns `false` when the consuming source has been dropped.
    pub fn send(&self, record: Record) -> bool {
        self.sender.send(Ok(record)).is_ok()
    }

    /// Report an unrecoverable upstream failure to the consumer.
    pub fn fail(&self, error: SourceError) -> bool {
        self.sender.send(Err(error)).is_ok()
    }
}

/// Consumer half, pulled by the pipeline driver.
pub struct ChannelSource {
    receiver: Receiver<Item>,
}

impl ChannelSource {
    /// Create a source with a bounded queue of `capacity` records.
    pub fn bounded(capacity: usize) -> (RecordSender, Self) {
        let (sender, receiver) = bounded(capacity);
        (RecordSender { sender }, Self { receiver })
    }

    /// Number of records waiting in the queue.
    pub fn queued(&self) -> usize {
        self.receiver.len()
    }
}

impl RecordSource for ChannelSource {
    fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        match self.receiver.recv() {
            Ok(item) => item.map(Some),
            // All senders gone: end of stream
            Err(_) => Ok(None),
        }
    }
}
