//! Dispatcher and worker pool.
//!
//! Producers send [`PathEvent`]s into a bounded dispatcher queue. A single
//! dispatcher task handles directory events itself, in order, and forwards
//! file events into a bounded worker queue served by a fixed pool of workers.
//! A full worker queue blocks the dispatcher, which in turn stops draining
//! the dispatcher queue and blocks producers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dirgraph_core::{GraphStore, IngestConfig, PathEvent};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::cache::DirectoryCache;
use crate::error::IngestError;
use crate::progress::{IngestCounters, ProgressReporter, SharedCounters};
use crate::resolver::{ingest_directory, ingest_file};

type SharedReceiver = Arc<Mutex<mpsc::Receiver<PathEvent>>>;

/// State shared by the dispatcher and every worker.
struct Shared<S: ?Sized> {
    store: Arc<S>,
    cache: DirectoryCache,
    counters: SharedCounters,
    in_flight: AtomicUsize,
}

impl<S: ?Sized> Shared<S> {
    fn finish_item(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Concurrent ingestion of path events into a [`GraphStore`].
///
/// The pipeline owns its cache and counters; create as many as needed.
/// [`start`](Self::start) must be called from within a Tokio runtime.
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use dirgraph_core::{GraphStore, IngestConfig, PathEvent};
/// # use dirgraph_ingest::IngestPipeline;
/// # async fn run<S: GraphStore + 'static>(store: Arc<S>) {
/// let mut pipeline = IngestPipeline::new(store, IngestConfig::default());
/// pipeline.start();
///
/// let tx = pipeline.sender();
/// tx.send(PathEvent::directory("/data")).await.unwrap();
/// drop(tx);
///
/// let counters = pipeline.shutdown().await.unwrap();
/// println!("{} directories", counters.directories_processed);
/// # }
/// ```
pub struct IngestPipeline<S: GraphStore + ?Sized + 'static> {
    shared: Arc<Shared<S>>,
    config: IngestConfig,
    event_tx: mpsc::Sender<PathEvent>,
    event_rx: SharedReceiver,
    worker_tx: mpsc::Sender<PathEvent>,
    worker_rx: SharedReceiver,
    stop_tx: Option<oneshot::Sender<usize>>,
    running: bool,
    dispatchers: Vec<JoinHandle<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl<S: GraphStore + ?Sized + 'static> IngestPipeline<S> {
    /// Create a stopped pipeline writing into `store`.
    pub fn new(store: Arc<S>, config: IngestConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.dispatcher_capacity.max(1));
        let (worker_tx, worker_rx) = mpsc::channel(config.worker_queue_capacity());

        let shared = Arc::new(Shared {
            store,
            cache: DirectoryCache::new(config.cache_ttl, config.cache_capacity),
            counters: SharedCounters::default(),
            in_flight: AtomicUsize::new(0),
        });

        Self {
            shared,
            config,
            event_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
            worker_tx,
            worker_rx: Arc::new(Mutex::new(worker_rx)),
            stop_tx: None,
            running: false,
            dispatchers: Vec::new(),
            workers: Vec::new(),
        }
    }

    /// Start the dispatcher and, on first start, the worker pool.
    ///
    /// Does nothing if already running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }

        if self.workers.is_empty() {
            for index in 0..self.config.worker_count.max(1) {
                let shared = Arc::clone(&self.shared);
                let rx = Arc::clone(&self.worker_rx);
                self.workers.push(tokio::spawn(work(index, shared, rx)));
            }
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);
        self.dispatchers.push(tokio::spawn(dispatch(
            Arc::clone(&self.shared),
            Arc::clone(&self.event_rx),
            self.worker_tx.clone(),
            stop_rx,
            ProgressReporter::new(self.config.progress_interval),
        )));
        self.running = true;

        tracing::info!(
            workers = self.workers.len(),
            worker_queue = self.config.worker_queue_capacity(),
            "ingest pipeline started"
        );
    }

    /// Signal the dispatcher to discard its queue and exit.
    ///
    /// Returns immediately. Only the events queued at the time of the call
    /// are discarded; anything sent afterwards is left for the next
    /// [`start`](Self::start). File events already handed to the worker
    /// queue are still processed. Does nothing if not running.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        let queued = self.dispatcher_backlog();
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(queued);
        }
        tracing::info!(queued, "ingest pipeline stopping");
    }

    /// Whether the dispatcher has been started and not stopped.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// A handle producers use to submit events.
    ///
    /// Sends wait while the dispatcher queue is full.
    pub fn sender(&self) -> mpsc::Sender<PathEvent> {
        self.event_tx.clone()
    }

    /// Events waiting in the dispatcher queue.
    pub fn dispatcher_backlog(&self) -> usize {
        backlog(&self.event_tx)
    }

    /// File events waiting in the worker queue.
    pub fn worker_backlog(&self) -> usize {
        backlog(&self.worker_tx)
    }

    /// Events taken off the dispatcher queue but not yet finished.
    ///
    /// A file event counts from the moment the dispatcher receives it until
    /// a worker is done with it, including while it waits in the worker
    /// queue.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// True when both queues are empty and nothing is being processed.
    ///
    /// Best-effort: a producer may submit more at any time, and an event the
    /// dispatcher has dequeued but not yet counted is missed.
    pub fn is_idle(&self) -> bool {
        self.dispatcher_backlog() == 0 && self.worker_backlog() == 0 && self.in_flight() == 0
    }

    /// Current counter values.
    pub fn counters(&self) -> IngestCounters {
        self.shared.counters.snapshot()
    }

    /// The directory cache shared by the dispatcher and workers.
    pub fn cache(&self) -> &DirectoryCache {
        &self.shared.cache
    }

    /// The store events are written into.
    pub fn store(&self) -> &Arc<S> {
        &self.shared.store
    }

    /// Configuration the pipeline was created with.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Process everything still queued, then stop every task.
    ///
    /// Waits for all producer senders to be dropped. If [`stop`](Self::stop)
    /// was called first, the events it discarded and anything sent after it
    /// stay unprocessed, but the worker queue is still drained.
    pub async fn shutdown(self) -> Result<IngestCounters, IngestError> {
        let Self {
            shared,
            event_tx,
            worker_tx,
            stop_tx,
            dispatchers,
            workers,
            ..
        } = self;
        drop(event_tx);
        drop(worker_tx);

        // A dropped stop sender reads as a stop signal, so it outlives the
        // dispatchers.
        for dispatcher in dispatchers {
            dispatcher.await?;
        }
        drop(stop_tx);

        for worker in workers {
            worker.await?;
        }

        let counters = shared.counters.snapshot();
        tracing::info!(
            files = counters.files_processed,
            directories = counters.directories_processed,
            "ingest pipeline shut down"
        );
        Ok(counters)
    }
}

fn backlog(tx: &mpsc::Sender<PathEvent>) -> usize {
    tx.max_capacity() - tx.capacity()
}

async fn dispatch<S: GraphStore + ?Sized + 'static>(
    shared: Arc<Shared<S>>,
    events: SharedReceiver,
    worker_tx: mpsc::Sender<PathEvent>,
    mut stop_rx: oneshot::Receiver<usize>,
    mut reporter: ProgressReporter,
) {
    let mut rx = events.lock().await;

    loop {
        let event = tokio::select! {
            biased;
            stop = &mut stop_rx => {
                // A dropped sender means the pipeline itself is gone.
                let queued = stop.unwrap_or(0);
                let mut discarded = 0usize;
                while discarded < queued && rx.try_recv().is_ok() {
                    discarded += 1;
                }
                tracing::debug!(discarded, "dispatcher stopped");
                return;
            }
            event = rx.recv() => match event {
                Some(event) => {
                    shared.in_flight.fetch_add(1, Ordering::SeqCst);
                    event
                }
                None => break,
            },
        };

        let current = event.path.clone();

        if event.is_dir() {
            shared.counters.record_directory();
            let task_shared = Arc::clone(&shared);
            let result = tokio::task::spawn_blocking(move || {
                ingest_directory(&*task_shared.store, &task_shared.cache, &event.path)
            })
            .await;
            match result {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => tracing::warn!(path = %current, error = %err, "dropping directory"),
                Err(err) => tracing::error!(path = %current, error = %err, "directory task failed"),
            }
            shared.finish_item();
        } else if worker_tx.send(event).await.is_err() {
            shared.finish_item();
            tracing::error!(path = %current, "worker queue closed");
            break;
        }

        reporter.maybe_report(&shared.counters, backlog(&worker_tx), &current);
    }

    tracing::debug!("dispatcher finished");
}

async fn work<S: GraphStore + ?Sized + 'static>(
    index: usize,
    shared: Arc<Shared<S>>,
    queue: SharedReceiver,
) {
    loop {
        let event = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(event) = event else {
            break;
        };

        shared.counters.record_file();
        let path = event.path.clone();
        let task_shared = Arc::clone(&shared);
        let result = tokio::task::spawn_blocking(move || {
            ingest_file(&*task_shared.store, &task_shared.cache, &event)
        })
        .await;

        match result {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => tracing::warn!(worker = index, %path, error = %err, "dropping file"),
            Err(err) => tracing::error!(worker = index, %path, error = %err, "file task failed"),
        }
        // Counted by the dispatcher when it received the event.
        shared.finish_item();
    }

    tracing::debug!(worker = index, "worker finished");
}
