use std::{
    collections::HashMap,
    fmt::Debug,
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, mpsc};
use tracing::{debug, warn};

use crate::{common::error::LedgerError, domain::party::PartyId, worker::cache::LedgerCache};

/// Receives the value that survives a debounce window.
#[async_trait]
pub trait FlushSink<K: Send + 'static, V: Send + 'static>: Send + Sync {
    async fn flush(&self, key: K, value: V);
}

struct Pending<V> {
    seq: u64,
    value: V,
}

struct Queue<K, V> {
    next_seq: u64,
    entries: HashMap<K, Pending<V>>,
}

/// Flushes that left the queue and have not finished yet.
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    async fn wait_idle(&self) {
        loop {
            let idle = self.idle.notified();
            tokio::pin!(idle);
            idle.as_mut().enable();
            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }
}

/// Held by a flush task while it talks to the sink.
struct FlushGuard(Arc<InFlight>);

impl Drop for FlushGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Coalesces bursts of values per key.
///
/// Each `push` restarts the key's window. When a window expires without a
/// newer value, the last value is handed to the sink. `flush_all` hands over
/// everything still pending right away, waits for flushes already under way,
/// and is meant to run on teardown.
pub struct Debouncer<K: Send + 'static, V: Send + 'static> {
    delay: Duration,
    sink: Arc<dyn FlushSink<K, V>>,
    queue: Arc<Mutex<Queue<K, V>>>,
    in_flight: Arc<InFlight>,
}

impl<K, V> Debouncer<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + 'static,
{
    pub fn new(delay: Duration, sink: Arc<dyn FlushSink<K, V>>) -> Self {
        Self {
            delay,
            sink,
            queue: Arc::new(Mutex::new(Queue {
                next_seq: 0,
                entries: HashMap::new(),
            })),
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub async fn push(&self, key: K, value: V) {
        let seq = {
            let mut queue = self.queue.lock().await;
            queue.next_seq += 1;
            let seq = queue.next_seq;
            queue.entries.insert(key.clone(), Pending { seq, value });
            seq
        };
        debug!(key = ?key, delay_ms = self.delay.as_millis() as u64, "debounce scheduled");

        let queue = Arc::clone(&self.queue);
        let sink = Arc::clone(&self.sink);
        let in_flight = Arc::clone(&self.in_flight);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let due = {
                let mut guard = queue.lock().await;
                // a newer push for this key owns the flush
                if guard.entries.get(&key).map(|p| p.seq) == Some(seq) {
                    guard.entries.remove(&key).map(|pending| {
                        in_flight.count.fetch_add(1, Ordering::SeqCst);
                        (pending, FlushGuard(in_flight))
                    })
                } else {
                    None
                }
            };
            if let Some((pending, _flushing)) = due {
                sink.flush(key, pending.value).await;
            }
        });
    }

    /// Flushes every pending value without waiting for its window, then waits
    /// for flushes that had already started.
    pub async fn flush_all(&self) {
        let drained: Vec<(K, Pending<V>)> = self.queue.lock().await.entries.drain().collect();
        for (key, pending) in drained {
            self.sink.flush(key, pending.value).await;
        }
        self.in_flight.wait_idle().await;
    }

    pub async fn pending(&self) -> usize {
        self.queue.lock().await.entries.len()
    }
}

/// A debounced rename the cache refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameFailure {
    pub party: PartyId,
    pub name: String,
    pub error: LedgerError,
}

/// Sends debounced party names to the cache. Refused renames are reported on
/// the `failures` channel.
pub struct RenameSink {
    cache: Arc<LedgerCache>,
    failures: mpsc::UnboundedSender<RenameFailure>,
}

impl RenameSink {
    pub fn new(cache: Arc<LedgerCache>, failures: mpsc::UnboundedSender<RenameFailure>) -> Self {
        Self { cache, failures }
    }
}

#[async_trait]
impl FlushSink<PartyId, String> for RenameSink {
    async fn flush(&self, party: PartyId, name: String) {
        let unchanged = self
            .cache
            .party(party)
            .await
            .is_some_and(|p| p.name == name.trim());
        if unchanged {
            debug!(party = %party, "rename skipped, name unchanged");
            return;
        }
        if let Err(error) = self.cache.rename_party(party, &name).await {
            let failure = RenameFailure { party, name, error };
            if let Err(unsent) = self.failures.send(failure) {
                warn!(party = %party, error = %unsent.0.error, "rename failure had no listener");
            }
        }
    }
}
