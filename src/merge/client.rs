use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api::client::ensure_success;
use crate::api::models::MergeResult;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::merge::decoder::{EventDecoder, MergeEvent, MergeProgress};
use crate::merge::request::MergeRequest;

/// Raw response body of a merge, chunk by chunk.
pub type MergeBody = BoxStream<'static, reqwest::Result<Bytes>>;

/// Held by a live [`MergeStream`]; releases the client for the next merge
/// when dropped.
#[derive(Debug)]
struct MergeLease {
    in_flight: Arc<AtomicBool>,
}

impl MergeLease {
    fn acquire(in_flight: &Arc<AtomicBool>) -> Result<Self> {
        in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::MergeInProgress)?;

        Ok(Self {
            in_flight: Arc::clone(in_flight),
        })
    }
}

impl Drop for MergeLease {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Issues merge commands and hands back their progress streams. At most one
/// merge per client is outstanding at a time.
pub struct MergeClient {
    http_client: Client,
    config: Config,
    in_flight: Arc<AtomicBool>,
}

impl MergeClient {
    pub fn new(config: &Config) -> Result<Self> {
        // No overall timeout: the body stays open for as long as the server
        // keeps working. Only the initial request is bounded, in `start`.
        let http_client = Client::builder()
            .connect_timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            config: config.clone(),
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Send the merge command and return its event stream once the server has
    /// accepted it. A non-2xx answer is reported as `AppError::Server` and is
    /// never retried: the server may already have started the job.
    pub async fn start(&self, request: &MergeRequest) -> Result<MergeStream> {
        let lease = MergeLease::acquire(&self.in_flight)?;

        info!(
            sources = request.playlist_ids().len(),
            deep_clean = request.deep_clean(),
            "Starting merge into \"{}\"",
            request.name()
        );

        let send = self
            .http_client
            .post(self.config.endpoint("/api/merge"))
            .json(request)
            .send();

        let response = tokio::time::timeout(self.config.request_timeout, send)
            .await
            .map_err(|_| AppError::Timeout(self.config.request_timeout))??;

        let response = ensure_success(response).await?;
        debug!(status = %response.status(), "Merge accepted, streaming progress");

        let mut stream = MergeStream::new(response.bytes_stream().boxed());
        stream.lease = Some(lease);
        Ok(stream)
    }

    /// Run a merge to completion, reporting progress records to `on_progress`.
    pub async fn merge<F>(&self, request: &MergeRequest, mut on_progress: F) -> Result<MergeResult>
    where
        F: FnMut(&MergeProgress),
    {
        let mut stream = self.start(request).await?;

        while let Some(event) = stream.next_event().await? {
            match event {
                MergeEvent::Progress(progress) => on_progress(&progress),
                MergeEvent::Completed(result) => {
                    info!(
                        tracks = result.track_count,
                        duplicates = result.duplicates_removed,
                        "Merge completed"
                    );
                    return Ok(result);
                }
                MergeEvent::Failed(message) => {
                    warn!("Merge failed on the server: {}", message);
                    return Err(AppError::Merge(message));
                }
            }
        }

        Err(AppError::UnterminatedStream)
    }
}

/// Lazy, finite sequence of events for one merge. After a terminal event it
/// yields `None` and reads nothing further from the body.
pub struct MergeStream {
    body: MergeBody,
    decoder: EventDecoder,
    queued: VecDeque<MergeEvent>,
    finished: bool,
    lease: Option<MergeLease>,
}

impl MergeStream {
    pub fn new(body: MergeBody) -> Self {
        Self {
            body,
            decoder: EventDecoder::new(),
            queued: VecDeque::new(),
            finished: false,
            lease: None,
        }
    }

    /// Next progress, completion or failure record. `Ok(None)` after a
    /// terminal event, or when the body ends without one.
    pub async fn next_event(&mut self) -> Result<Option<MergeEvent>> {
        loop {
            if self.finished {
                return Ok(None);
            }

            if let Some(event) = self.queued.pop_front() {
                if event.is_terminal() {
                    self.finish();
                }
                return Ok(Some(event));
            }

            match self.body.next().await {
                Some(chunk) => {
                    let chunk = chunk.inspect_err(|_| self.finish())?;
                    self.queued.extend(self.decoder.push(&chunk));
                }
                None => {
                    if !self.decoder.remainder().trim().is_empty() {
                        debug!(
                            "Merge stream ended with an unterminated record: {:?}",
                            self.decoder.remainder()
                        );
                    }
                    self.finish();
                    return Ok(None);
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish(&mut self) {
        self.finished = true;
        self.queued.clear();
        self.lease = None;
    }
}
