//! Worker-delegated streaming-compression buffer backend.
//!
//! Events are serialized by the caller and streamed to a worker task
//! over a bounded channel; the worker feeds a zlib encoder
//! incrementally, so large sessions never hold an uncompressed copy of
//! the whole recording. Exactly one request is in flight at a time:
//! callers hold `op_lock` across the request/response round trip.

use async_trait::async_trait;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};

use super::{BufferError, EventBuffer, RecordingPayload};
use crate::recording::RecordingEvent;

enum WorkerRequest {
    Add {
        json: String,
        trim: bool,
        ack: oneshot::Sender<Result<(), BufferError>>,
    },
    Finish {
        ack: oneshot::Sender<Result<Vec<u8>, BufferError>>,
    },
    Shutdown,
}

#[derive(Default)]
struct BufferMeta {
    count: usize,
    earliest: Option<f64>,
}

/// Compressing event buffer. `destroy()` terminates the worker; any
/// later operation fails with [`BufferError::WorkerUnavailable`].
pub struct CompressedEventBuffer {
    op_lock: tokio::sync::Mutex<()>,
    tx: mpsc::Sender<WorkerRequest>,
    meta: parking_lot::Mutex<BufferMeta>,
    destroyed: AtomicBool,
}

impl CompressedEventBuffer {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(run_worker(rx));
        Self {
            op_lock: tokio::sync::Mutex::new(()),
            tx,
            meta: parking_lot::Mutex::new(BufferMeta::default()),
            destroyed: AtomicBool::new(false),
        }
    }

    async fn request_add(&self, json: String, trim: bool) -> Result<(), BufferError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(WorkerRequest::Add {
                json,
                trim,
                ack: ack_tx,
            })
            .await
            .map_err(|_| BufferError::WorkerUnavailable)?;
        ack_rx.await.map_err(|_| BufferError::WorkerUnavailable)?
    }

    async fn request_finish(&self) -> Result<Vec<u8>, BufferError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(WorkerRequest::Finish { ack: ack_tx })
            .await
            .map_err(|_| BufferError::WorkerUnavailable)?;
        ack_rx.await.map_err(|_| BufferError::WorkerUnavailable)?
    }
}

impl Default for CompressedEventBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBuffer for CompressedEventBuffer {
    async fn add(&self, event: RecordingEvent, trim_to_checkout: bool) -> Result<(), BufferError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(BufferError::WorkerUnavailable);
        }
        let json = serde_json::to_string(&event)?;

        let _guard = self.op_lock.lock().await;
        self.request_add(json, trim_to_checkout).await?;

        let mut meta = self.meta.lock();
        if trim_to_checkout {
            meta.count = 1;
            meta.earliest = Some(event.timestamp);
        } else {
            meta.count += 1;
            meta.earliest = Some(match meta.earliest {
                Some(current) => current.min(event.timestamp),
                None => event.timestamp,
            });
        }
        Ok(())
    }

    async fn finish(&self) -> Result<RecordingPayload, BufferError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(BufferError::WorkerUnavailable);
        }

        let _guard = self.op_lock.lock().await;
        let bytes = self.request_finish().await?;
        *self.meta.lock() = BufferMeta::default();
        Ok(RecordingPayload::Compressed(bytes))
    }

    fn has_events(&self) -> bool {
        self.meta.lock().count > 0
    }

    fn earliest_timestamp(&self) -> Option<f64> {
        self.meta.lock().earliest
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        let _ = self.tx.try_send(WorkerRequest::Shutdown);
        *self.meta.lock() = BufferMeta::default();
    }

    fn name(&self) -> &str {
        "compressed"
    }
}

/// Worker state: a zlib encoder building a JSON array incrementally.
struct Compressor {
    encoder: Option<ZlibEncoder<Vec<u8>>>,
    count: usize,
}

impl Compressor {
    fn new() -> Self {
        Self {
            encoder: None,
            count: 0,
        }
    }

    fn reset(&mut self) {
        self.encoder = None;
        self.count = 0;
    }

    fn write_event(&mut self, json: &str, trim: bool) -> Result<(), BufferError> {
        if trim {
            self.reset();
        }
        let encoder = self
            .encoder
            .get_or_insert_with(|| ZlibEncoder::new(Vec::new(), Compression::default()));
        if self.count == 0 {
            encoder.write_all(b"[")?;
        } else {
            encoder.write_all(b",")?;
        }
        encoder.write_all(json.as_bytes())?;
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<u8>, BufferError> {
        let mut encoder = self
            .encoder
            .take()
            .unwrap_or_else(|| ZlibEncoder::new(Vec::new(), Compression::default()));
        if self.count == 0 {
            encoder.write_all(b"[")?;
        }
        encoder.write_all(b"]")?;
        self.count = 0;
        Ok(encoder.finish()?)
    }
}

async fn run_worker(mut rx: mpsc::Receiver<WorkerRequest>) {
    let mut compressor = Compressor::new();
    while let Some(request) = rx.recv().await {
        match request {
            WorkerRequest::Add { json, trim, ack } => {
                let result = compressor.write_event(&json, trim);
                let _ = ack.send(result);
            }
            WorkerRequest::Finish { ack } => {
                let result = compressor.finish();
                let _ = ack.send(result);
            }
            WorkerRequest::Shutdown => break,
        }
    }
}
