use std::{
    fmt::{self, Debug},
    future::Future,
    hash::Hash,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Instant,
};

use dashmap::{mapref::entry::Entry, DashMap};
use tokio::sync::watch::{channel as watch_channel, Receiver, Sender};

use crate::{CoalescionServiceConfig, Error};

type Settled<T, E> = Option<Result<Arc<T>, E>>;

/// Operation currently in flight, or settled and inside its grace window
struct InFlight<T, E> {
    generation: u64,
    created_at: Instant,
    receiver: Receiver<Settled<T, E>>,
}

type Watchers<Id, T, E> = Arc<DashMap<Id, InFlight<T, E>>>;

enum Role<T, E> {
    Leader(Sender<Settled<T, E>>, u64, RunningSlot),
    Follower(Receiver<Settled<T, E>>),
}

/// Keyed in-flight call deduplicator.
///
/// Every caller executing the same `Id` while an operation is in flight
/// receives that operation's result instead of starting a new one.
pub struct CoalescionService<Id: Hash + Eq, T, E = dashboard_result::Error> {
    config: Arc<CoalescionServiceConfig>,
    watchers: Watchers<Id, T, E>,
    generation: Arc<AtomicU64>,
    running: Arc<AtomicUsize>,
}

impl<Id, T, E> CoalescionService<Id, T, E>
where
    Id: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    T: Send + Sync + 'static,
    E: From<Error> + Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: CoalescionServiceConfig) -> Self {
        Self {
            config: Arc::new(config),
            watchers: Arc::new(DashMap::new()),
            generation: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &CoalescionServiceConfig {
        &self.config
    }

    async fn wait_for(&self, mut receiver: Receiver<Settled<T, E>>) -> Result<Arc<T>, E> {
        let ready = receiver.borrow().clone();
        if let Some(settled) = ready {
            return settled;
        }

        let settled = receiver
            .wait_for(Option::is_some)
            .await
            .map(|settled| settled.clone());

        match settled {
            Ok(Some(result)) => result,
            _ => Err(Error::Abandoned.into()),
        }
    }

    async fn insert_and_execute<F: FnOnce() -> Fut, Fut: Future<Output = Result<T, E>>>(
        &self,
        id: Id,
        send: Sender<Settled<T, E>>,
        generation: u64,
        slot: RunningSlot,
        func: F,
    ) -> Result<Arc<T>, E> {
        let mut guard = AbandonGuard {
            watchers: self.watchers.clone(),
            id: Some(id.clone()),
            generation,
        };

        let value = func().await.map(Arc::new);
        guard.disarm();
        drop(slot);

        match &value {
            Ok(_) => {
                send.send_replace(Some(value.clone()));
                self.schedule_eviction(id, generation);
            }
            Err(_) => {
                // Remove before broadcasting so a retry never joins the failure
                self.watchers
                    .remove_if(&id, |_, entry| entry.generation == generation);
                send.send_replace(Some(value.clone()));
            }
        }

        value
    }

    fn schedule_eviction(&self, id: Id, generation: u64) {
        let watchers = self.watchers.clone();
        let grace_window = self.config.grace_window;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(grace_window).await;
                    evict(&watchers, &id, generation);
                });
            }
            Err(_) => evict(&watchers, &id, generation),
        }
    }

    /// Run `func` unless an operation with the same `id` is already in flight,
    /// in which case wait for and share its result.
    pub async fn execute<F: FnOnce() -> Fut, Fut: Future<Output = Result<T, E>>>(
        &self,
        id: Id,
        func: F,
    ) -> Result<Arc<T>, E> {
        let role = match self.watchers.entry(id.clone()) {
            Entry::Occupied(entry) => Role::Follower(entry.get().receiver.clone()),
            Entry::Vacant(entry) => {
                let Some(slot) = RunningSlot::acquire(&self.running, self.config.max_concurrent)
                else {
                    let max = self.config.max_concurrent.unwrap_or_default();
                    warn!("Refusing {id:?}, {max} operations already running");
                    return Err(Error::MaxConcurrent { max }.into());
                };

                let (send, recv) = watch_channel(None);
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);

                entry.insert(InFlight {
                    generation,
                    created_at: Instant::now(),
                    receiver: recv,
                });

                Role::Leader(send, generation, slot)
            }
        };

        match role {
            Role::Follower(receiver) => {
                debug!("Joining in-flight operation {id:?}");
                self.wait_for(receiver).await
            }
            Role::Leader(send, generation, slot) => {
                self.insert_and_execute(id, send, generation, slot, func).await
            }
        }
    }

    /// Forget every entry, used when the session is reset.
    ///
    /// Callers already waiting still receive their result.
    pub fn clear(&self) {
        self.watchers.clear();
    }

    /// Entries in flight or inside their grace window
    pub fn pending_count(&self) -> usize {
        self.watchers.len()
    }

    /// Operations whose leader has not settled yet
    pub fn running_count(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }
}

fn evict<Id: Hash + Eq + Debug, T, E>(watchers: &DashMap<Id, InFlight<T, E>>, id: &Id, generation: u64) {
    if let Some((_, entry)) = watchers.remove_if(id, |_, entry| entry.generation == generation) {
        debug!("Evicted {id:?} after {:?}", entry.created_at.elapsed());
    }
}

/// One running operation counted against `max_concurrent`, released on drop
struct RunningSlot(Arc<AtomicUsize>);

impl RunningSlot {
    fn acquire(running: &Arc<AtomicUsize>, max_concurrent: Option<usize>) -> Option<Self> {
        running
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| match max_concurrent {
                Some(max) if count >= max => None,
                _ => Some(count + 1),
            })
            .ok()
            .map(|_| RunningSlot(running.clone()))
    }
}

impl Drop for RunningSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Removes the leader's entry if it is dropped before the operation settles
struct AbandonGuard<Id: Hash + Eq + Debug, T, E> {
    watchers: Watchers<Id, T, E>,
    id: Option<Id>,
    generation: u64,
}

impl<Id: Hash + Eq + Debug, T, E> AbandonGuard<Id, T, E> {
    fn disarm(&mut self) {
        self.id.take();
    }
}

impl<Id: Hash + Eq + Debug, T, E> Drop for AbandonGuard<Id, T, E> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            warn!("In-flight operation {id:?} was dropped before it settled");
            self.watchers
                .remove_if(&id, |_, entry| entry.generation == self.generation);
        }
    }
}

impl<Id: Hash + Eq, T, E> Clone for CoalescionService<Id, T, E> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            watchers: self.watchers.clone(),
            generation: self.generation.clone(),
            running: self.running.clone(),
        }
    }
}

impl<Id: Hash + Eq, T, E> Debug for CoalescionService<Id, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoalescionService")
            .field("config", &self.config)
            .field("pending", &self.watchers.len())
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish()
    }
}

impl<Id, T, E> Default for CoalescionService<Id, T, E>
where
    Id: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    T: Send + Sync + 'static,
    E: From<Error> + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::from_config(CoalescionServiceConfig::default())
    }
}
