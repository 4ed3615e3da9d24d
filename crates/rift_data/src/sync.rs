//! Persistence synchronizer.
//!
//! Keeps three views of a participant's record consistent: the durable store
//! (via a single open [`DocumentHandle`] per participant), the observer
//! [`MirrorStore`], and the participant's own remote copy (pushed over a
//! [`SyncChannel`]).
//!
//! The synchronizer is a single-task command loop. Opens and closes run in
//! spawned tasks and re-enter the loop as internal events, so one
//! participant's pending I/O never blocks another's processing. Per
//! participant everything is strictly serialized: while a load or close is
//! outstanding no second store operation is issued for that key. A join
//! arriving during the previous session's teardown is remembered and the
//! record reopened once that teardown completes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::mirror::MirrorStore;
use crate::record::{default_record, record_key, validate_record, ParticipantId, PlayerRecord};
use crate::store::{DocumentHandle, DocumentStore, StoreError};

/// User-visible reason attached to a session terminated because its record
/// could not be loaded or failed validation.
pub const TERMINATE_LOAD_FAILED: &str = "Failed to load your data. Please rejoin.";

/// Outbound synchronization channel to a specific participant.
pub trait SyncChannel: Send + Sync + 'static {
    /// Push a full record snapshot to the owning participant.
    fn push(
        &self,
        participant: ParticipantId,
        record: &PlayerRecord,
    ) -> impl std::future::Future<Output = ()> + Send;
}

/// Collaborator that can terminate a participant's session with a
/// user-visible reason.
pub trait SessionControl: Send + Sync + 'static {
    /// Disconnect the participant, showing `reason`.
    fn terminate(&self, participant: ParticipantId, reason: &str);
}

/// A record transformation supplied by an update request.
pub type RecordUpdate = Box<dyn FnOnce(PlayerRecord) -> PlayerRecord + Send>;

/// Commands accepted by a running [`Synchronizer`].
pub enum SyncCommand {
    /// A participant joined; open their record.
    Joined(ParticipantId),
    /// A participant left; close their record and drop the mirror entry.
    Left(ParticipantId),
    /// The participant asked for a re-send of their current snapshot.
    Request(ParticipantId),
    /// Apply a transformation to the open record, persist, re-mirror,
    /// re-push. Replies `false` when no handle is open.
    Update {
        /// The record owner.
        participant: ParticipantId,
        /// The transformation to apply.
        apply: RecordUpdate,
        /// Success indicator.
        reply: oneshot::Sender<bool>,
    },
    /// Read the currently open record, if any.
    Get {
        /// The record owner.
        participant: ParticipantId,
        /// The current record, or `None` without an open handle.
        reply: oneshot::Sender<Option<PlayerRecord>>,
    },
}

/// Create the command channel for a [`Synchronizer`].
#[must_use]
pub fn sync_channel() -> (SyncClient, mpsc::UnboundedReceiver<SyncCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SyncClient { tx }, rx)
}

/// Cheap-to-clone client half of the synchronizer command channel.
#[derive(Debug, Clone)]
pub struct SyncClient {
    tx: mpsc::UnboundedSender<SyncCommand>,
}

impl SyncClient {
    /// Signal a join. Returns `false` once the synchronizer has stopped.
    pub fn joined(&self, participant: ParticipantId) -> bool {
        self.tx.send(SyncCommand::Joined(participant)).is_ok()
    }

    /// Signal a leave.
    pub fn left(&self, participant: ParticipantId) -> bool {
        self.tx.send(SyncCommand::Left(participant)).is_ok()
    }

    /// Forward a participant's re-send request.
    pub fn request(&self, participant: ParticipantId) -> bool {
        self.tx.send(SyncCommand::Request(participant)).is_ok()
    }

    /// Apply `apply` to the participant's open record. Returns `false` when
    /// no handle is open (or the synchronizer has stopped) — never an error.
    pub async fn update<F>(&self, participant: ParticipantId, apply: F) -> bool
    where
        F: FnOnce(PlayerRecord) -> PlayerRecord + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let sent = self.tx.send(SyncCommand::Update {
            participant,
            apply: Box::new(apply),
            reply,
        });
        if sent.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Read the participant's currently open record.
    pub async fn get(&self, participant: ParticipantId) -> Option<PlayerRecord> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SyncCommand::Get { participant, reply })
            .ok()?;
        rx.await.ok().flatten()
    }
}

/// Internal completions re-entering the command loop.
enum SyncEvent<H> {
    Loaded(ParticipantId, Result<H, StoreError>),
    Closed(ParticipantId),
}

/// Per-participant persistence state. At most one entry per participant;
/// at most one open handle system-wide per record key.
///
/// `rejoined` marks a join observed while the previous session is still
/// tearing down; the completion path reopens the record instead of
/// forgetting the participant.
enum DocState<H> {
    /// An open is outstanding. `departed` marks a leave observed mid-load.
    Loading { departed: bool, rejoined: bool },
    /// The record is open and owned by this synchronizer.
    Open(H),
    /// A close is outstanding.
    Closing { rejoined: bool },
}

/// The persistence synchronizer. Drive it with [`Synchronizer::run`].
pub struct Synchronizer<S: DocumentStore, C: SyncChannel, K: SessionControl> {
    store: Arc<S>,
    channel: Arc<C>,
    control: Arc<K>,
    mirror: MirrorStore,
    docs: HashMap<ParticipantId, DocState<S::Handle>>,
    events_tx: mpsc::UnboundedSender<SyncEvent<S::Handle>>,
    events_rx: mpsc::UnboundedReceiver<SyncEvent<S::Handle>>,
}

impl<S: DocumentStore, C: SyncChannel, K: SessionControl> Synchronizer<S, C, K> {
    /// Create a synchronizer over the given collaborators.
    #[must_use]
    pub fn new(store: S, channel: C, control: K, mirror: MirrorStore) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            store: Arc::new(store),
            channel: Arc::new(channel),
            control: Arc::new(control),
            mirror,
            docs: HashMap::new(),
            events_tx,
            events_rx,
        }
    }

    /// The observer mirror this synchronizer maintains.
    #[must_use]
    pub fn mirror(&self) -> &MirrorStore {
        &self.mirror
    }

    /// Process commands until the command channel closes.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SyncCommand>) {
        info!("synchronizer started");
        loop {
            tokio::select! {
                event = self.events_rx.recv() => {
                    // Never closes: we hold a sender.
                    if let Some(event) = event {
                        self.handle_event(event).await;
                    }
                }
                command = commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        None => break,
                    }
                }
            }
        }
        info!("synchronizer stopped");
    }

    async fn handle_command(&mut self, command: SyncCommand) {
        match command {
            SyncCommand::Joined(p) => self.handle_joined(p),
            SyncCommand::Left(p) => self.handle_left(p),
            SyncCommand::Request(p) => self.handle_request(p).await,
            SyncCommand::Update {
                participant,
                apply,
                reply,
            } => self.handle_update(participant, apply, reply).await,
            SyncCommand::Get { participant, reply } => {
                let record = match self.docs.get(&participant) {
                    Some(DocState::Open(handle)) => Some(handle.read()),
                    _ => None,
                };
                let _ = reply.send(record);
            }
        }
    }

    async fn handle_event(&mut self, event: SyncEvent<S::Handle>) {
        match event {
            SyncEvent::Loaded(p, result) => self.handle_loaded(p, result).await,
            SyncEvent::Closed(p) => {
                debug!(participant = %p, "record closed");
                match self.docs.remove(&p) {
                    Some(DocState::Closing { rejoined: true }) => {
                        debug!(participant = %p, "reopening for returning participant");
                        self.start_load(p);
                    }
                    Some(DocState::Closing { rejoined: false }) | None => {}
                    Some(other) => {
                        // A newer session already owns this entry.
                        self.docs.insert(p, other);
                    }
                }
            }
        }
    }

    fn handle_joined(&mut self, p: ParticipantId) {
        if !self.docs.contains_key(&p) {
            self.start_load(p);
            return;
        }
        match self.docs.get_mut(&p) {
            // The previous session is still tearing down; single-flight per
            // key, so the open is deferred to the completion path.
            Some(DocState::Loading {
                departed: true,
                rejoined,
            })
            | Some(DocState::Closing { rejoined }) => {
                *rejoined = true;
                debug!(participant = %p, "rejoin queued behind outstanding teardown");
            }
            _ => {
                warn!(participant = %p, "join ignored: record already open or loading");
            }
        }
    }

    fn start_load(&mut self, p: ParticipantId) {
        self.docs.insert(
            p,
            DocState::Loading {
                departed: false,
                rejoined: false,
            },
        );
        let store = Arc::clone(&self.store);
        let events = self.events_tx.clone();
        let key = record_key(p);
        tokio::spawn(async move {
            let result = store.open(&key, default_record()).await;
            let _ = events.send(SyncEvent::Loaded(p, result));
        });
        debug!(participant = %p, "record load started");
    }

    fn handle_left(&mut self, p: ParticipantId) {
        match self.docs.remove(&p) {
            Some(DocState::Loading { .. }) => {
                // The load result will be discarded and the handle closed as
                // soon as the open completes. A newer leave also cancels any
                // queued rejoin.
                self.docs.insert(
                    p,
                    DocState::Loading {
                        departed: true,
                        rejoined: false,
                    },
                );
                debug!(participant = %p, "leave observed mid-load");
            }
            Some(DocState::Open(handle)) => {
                self.docs.insert(p, DocState::Closing { rejoined: false });
                self.spawn_close(p, handle);
            }
            Some(DocState::Closing { .. }) => {
                self.docs.insert(p, DocState::Closing { rejoined: false });
            }
            None => {
                debug!(participant = %p, "leave for unbound participant");
            }
        }
        self.mirror.remove(p);
    }

    async fn handle_loaded(&mut self, p: ParticipantId, result: Result<S::Handle, StoreError>) {
        let Some(state) = self.docs.remove(&p) else {
            // No bookkeeping left for this participant; release a successful
            // handle immediately.
            if let Ok(handle) = result {
                self.docs.insert(p, DocState::Closing { rejoined: false });
                self.spawn_close(p, handle);
            }
            return;
        };
        let (departed, rejoined) = match state {
            DocState::Loading { departed, rejoined } => (departed, rejoined),
            _ => (false, false),
        };

        let mut handle = match result {
            Ok(handle) => handle,
            Err(e) => {
                warn!(participant = %p, error = %e, "record load failed");
                if rejoined {
                    // The failed load belonged to the departed session; the
                    // returning participant still needs an open attempt.
                    self.start_load(p);
                } else if !departed {
                    self.control.terminate(p, TERMINATE_LOAD_FAILED);
                }
                return;
            }
        };

        if departed {
            debug!(participant = %p, "participant left during load; closing record");
            self.docs.insert(p, DocState::Closing { rejoined });
            self.spawn_close(p, handle);
            return;
        }

        let mut record = handle.read();
        if !validate_record(&record) {
            warn!(participant = %p, "loaded record failed validation");
            self.control.terminate(p, TERMINATE_LOAD_FAILED);
            self.docs.insert(p, DocState::Closing { rejoined: false });
            self.spawn_close(p, handle);
            return;
        }

        if record.joined_at == 0 {
            record.joined_at = unix_now();
            if let Err(e) = handle.write(record.clone()) {
                warn!(participant = %p, error = %e, "first-join stamp failed");
                self.control.terminate(p, TERMINATE_LOAD_FAILED);
                self.docs.insert(p, DocState::Closing { rejoined: false });
                self.spawn_close(p, handle);
                return;
            }
        }

        self.docs.insert(p, DocState::Open(handle));
        self.mirror.set(p, record.clone());
        self.channel.push(p, &record).await;
        info!(participant = %p, "record loaded");
    }

    async fn handle_request(&mut self, p: ParticipantId) {
        // Before the load completes there is nothing to send; the load path
        // pushes the first snapshot itself.
        if let Some(DocState::Open(handle)) = self.docs.get(&p) {
            let record = handle.read();
            self.channel.push(p, &record).await;
        }
    }

    async fn handle_update(&mut self, p: ParticipantId, apply: RecordUpdate, reply: oneshot::Sender<bool>) {
        let updated = match self.docs.get_mut(&p) {
            Some(DocState::Open(handle)) => {
                let record = apply(handle.read());
                match handle.write(record.clone()) {
                    Ok(()) => Some(record),
                    Err(e) => {
                        warn!(participant = %p, error = %e, "record write failed");
                        None
                    }
                }
            }
            _ => None,
        };
        let ok = match updated {
            Some(record) => {
                self.mirror.set(p, record.clone());
                self.channel.push(p, &record).await;
                true
            }
            None => false,
        };
        let _ = reply.send(ok);
    }

    fn spawn_close(&self, p: ParticipantId, handle: S::Handle) {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle.close().await {
                warn!(participant = %p, error = %e, "record close failed");
            }
            let _ = events.send(SyncEvent::Closed(p));
        });
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::store::MemoryStore;

    use super::*;

    #[derive(Debug, Default)]
    struct RecordingChannel {
        pushes: Mutex<Vec<(ParticipantId, PlayerRecord)>>,
    }

    impl SyncChannel for Arc<RecordingChannel> {
        async fn push(&self, participant: ParticipantId, record: &PlayerRecord) {
            self.pushes
                .lock()
                .unwrap()
                .push((participant, record.clone()));
        }
    }

    #[derive(Debug, Default)]
    struct RecordingControl {
        kicks: Mutex<Vec<(ParticipantId, String)>>,
    }

    impl SessionControl for Arc<RecordingControl> {
        fn terminate(&self, participant: ParticipantId, reason: &str) {
            self.kicks
                .lock()
                .unwrap()
                .push((participant, reason.to_string()));
        }
    }

    struct Harness {
        sync: Synchronizer<MemoryStore, Arc<RecordingChannel>, Arc<RecordingControl>>,
        store: MemoryStore,
        channel: Arc<RecordingChannel>,
        control: Arc<RecordingControl>,
    }

    fn harness() -> Harness {
        let store = MemoryStore::new();
        let channel = Arc::new(RecordingChannel::default());
        let control = Arc::new(RecordingControl::default());
        let sync = Synchronizer::new(
            store.clone(),
            Arc::clone(&channel),
            Arc::clone(&control),
            MirrorStore::new(),
        );
        Harness {
            sync,
            store,
            channel,
            control,
        }
    }

    impl Harness {
        /// Wait for the next spawned-task completion and apply it.
        async fn pump(&mut self) {
            if let Some(event) = self.sync.events_rx.recv().await {
                self.sync.handle_event(event).await;
            }
        }

        fn pushes(&self) -> Vec<(ParticipantId, PlayerRecord)> {
            self.channel.pushes.lock().unwrap().clone()
        }

        fn kicks(&self) -> Vec<(ParticipantId, String)> {
            self.control.kicks.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_join_loads_stamps_mirrors_and_pushes() {
        let mut h = harness();
        let p = ParticipantId(1);

        h.sync.handle_command(SyncCommand::Joined(p)).await;
        h.pump().await;

        let pushes = h.pushes();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].0, p);
        // First-ever load: joined_at stamped and persisted.
        assert!(pushes[0].1.joined_at > 0);
        assert_eq!(
            h.store.peek("player_1").map(|r| r.joined_at),
            Some(pushes[0].1.joined_at)
        );
        assert_eq!(h.sync.mirror().get(p), Some(pushes[0].1.clone()));
        assert!(h.kicks().is_empty());
    }

    #[tokio::test]
    async fn test_request_before_load_sends_nothing() {
        let mut h = harness();
        let p = ParticipantId(2);

        h.sync.handle_command(SyncCommand::Joined(p)).await;
        // The open is still outstanding from the loop's point of view.
        h.sync.handle_command(SyncCommand::Request(p)).await;
        assert!(h.pushes().is_empty());

        h.pump().await;
        assert_eq!(h.pushes().len(), 1);

        // After the load, a request re-sends exactly one more snapshot.
        h.sync.handle_command(SyncCommand::Request(p)).await;
        assert_eq!(h.pushes().len(), 2);
    }

    #[tokio::test]
    async fn test_update_persists_remirrors_and_repushes() {
        let mut h = harness();
        let p = ParticipantId(3);
        h.sync.handle_command(SyncCommand::Joined(p)).await;
        h.pump().await;

        let (reply, rx) = oneshot::channel();
        h.sync
            .handle_command(SyncCommand::Update {
                participant: p,
                apply: Box::new(|mut record| {
                    record.coins += 25;
                    record
                }),
                reply,
            })
            .await;
        assert_eq!(rx.await, Ok(true));
        assert_eq!(h.store.peek("player_3").map(|r| r.coins), Some(25));
        assert_eq!(h.sync.mirror().get(p).map(|r| r.coins), Some(25));
        assert_eq!(h.pushes().len(), 2);
    }

    #[tokio::test]
    async fn test_update_without_open_handle_reports_false() {
        let mut h = harness();
        let (reply, rx) = oneshot::channel();
        h.sync
            .handle_command(SyncCommand::Update {
                participant: ParticipantId(4),
                apply: Box::new(|record| record),
                reply,
            })
            .await;
        assert_eq!(rx.await, Ok(false));
        assert!(h.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_leave_closes_handle_and_clears_mirror() {
        let mut h = harness();
        let p = ParticipantId(5);
        h.sync.handle_command(SyncCommand::Joined(p)).await;
        h.pump().await;
        assert!(h.store.is_open("player_5"));

        h.sync.handle_command(SyncCommand::Left(p)).await;
        h.pump().await; // close completion
        assert!(!h.store.is_open("player_5"));
        assert!(h.sync.mirror().get(p).is_none());
        assert!(h.sync.docs.is_empty());
    }

    #[tokio::test]
    async fn test_leave_during_load_closes_completed_handle() {
        let mut h = harness();
        let p = ParticipantId(6);

        h.sync.handle_command(SyncCommand::Joined(p)).await;
        // Leave lands before the open completes.
        h.sync.handle_command(SyncCommand::Left(p)).await;

        h.pump().await; // load completion — must go straight to close
        h.pump().await; // close completion
        assert!(!h.store.is_open("player_6"));
        assert!(h.pushes().is_empty());
        assert!(h.kicks().is_empty());
        assert!(h.sync.docs.is_empty());
    }

    #[tokio::test]
    async fn test_rejoin_during_close_reopens_record() {
        let mut h = harness();
        let p = ParticipantId(11);
        h.sync.handle_command(SyncCommand::Joined(p)).await;
        h.pump().await; // first load
        h.sync.handle_command(SyncCommand::Left(p)).await;
        // The rejoin lands while the close is still in flight; it must be
        // replayed once the close completes.
        h.sync.handle_command(SyncCommand::Joined(p)).await;
        h.pump().await; // close completion queues the reopen
        h.pump().await; // second load
        assert_eq!(h.pushes().len(), 2);
        assert!(h.store.is_open("player_11"));
        assert!(h.sync.mirror().get(p).is_some());
        assert!(h.kicks().is_empty());
    }

    #[tokio::test]
    async fn test_rejoin_during_departed_load_reopens_record() {
        let mut h = harness();
        let p = ParticipantId(12);
        h.sync.handle_command(SyncCommand::Joined(p)).await;
        h.sync.handle_command(SyncCommand::Left(p)).await;
        h.sync.handle_command(SyncCommand::Joined(p)).await;
        h.pump().await; // first load completes, discarded, close spawned
        h.pump().await; // close completion queues the reopen
        h.pump().await; // second load
        // Only the returning session got a snapshot; the departed load's
        // result was never pushed.
        assert_eq!(h.pushes().len(), 1);
        assert!(h.store.is_open("player_12"));
        assert!(h.kicks().is_empty());
    }

    #[tokio::test]
    async fn test_leave_after_queued_rejoin_cancels_reopen() {
        let mut h = harness();
        let p = ParticipantId(13);
        h.sync.handle_command(SyncCommand::Joined(p)).await;
        h.pump().await;
        h.sync.handle_command(SyncCommand::Left(p)).await;
        h.sync.handle_command(SyncCommand::Joined(p)).await;
        h.sync.handle_command(SyncCommand::Left(p)).await;
        h.pump().await; // close completes; the rejoin was cancelled
        assert!(h.sync.docs.is_empty());
        assert!(h.sync.events_rx.try_recv().is_err());
        assert_eq!(h.pushes().len(), 1);
        assert!(!h.store.is_open("player_13"));
    }

    #[tokio::test]
    async fn test_double_join_is_single_flight() {
        let mut h = harness();
        let p = ParticipantId(7);
        h.sync.handle_command(SyncCommand::Joined(p)).await;
        h.sync.handle_command(SyncCommand::Joined(p)).await;
        h.pump().await;
        // Only one load was issued, so only one push happened and no
        // second completion is pending.
        assert_eq!(h.pushes().len(), 1);
        assert!(h.sync.events_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_load_failure_terminates_session() {
        #[derive(Clone)]
        struct FailStore;
        impl DocumentStore for FailStore {
            type Handle = crate::store::MemoryHandle;
            async fn open(
                &self,
                _key: &str,
                _seed: PlayerRecord,
            ) -> Result<Self::Handle, StoreError> {
                Err(StoreError::Io(std::io::Error::other("datastore down")))
            }
        }

        let channel = Arc::new(RecordingChannel::default());
        let control = Arc::new(RecordingControl::default());
        let mut sync = Synchronizer::new(
            FailStore,
            Arc::clone(&channel),
            Arc::clone(&control),
            MirrorStore::new(),
        );

        let p = ParticipantId(8);
        sync.handle_command(SyncCommand::Joined(p)).await;
        if let Some(event) = sync.events_rx.recv().await {
            sync.handle_event(event).await;
        }

        let kicks = control.kicks.lock().unwrap().clone();
        assert_eq!(kicks.len(), 1);
        assert_eq!(kicks[0], (p, TERMINATE_LOAD_FAILED.to_string()));
        assert!(channel.pushes.lock().unwrap().is_empty());
        assert!(sync.mirror().get(p).is_none());
    }

    #[tokio::test]
    async fn test_invalid_record_terminates_session() {
        let mut h = harness();
        let p = ParticipantId(9);

        // Seed the store with a record that fails the schema predicate.
        let mut handle = h
            .store
            .open("player_9", default_record())
            .await
            .unwrap();
        let mut bad = handle.read();
        bad.level = 0;
        handle.write(bad).unwrap();
        handle.close().await.unwrap();

        h.sync.handle_command(SyncCommand::Joined(p)).await;
        h.pump().await; // load completes, validation fails
        h.pump().await; // close completes

        assert_eq!(h.kicks().len(), 1);
        assert!(h.pushes().is_empty());
        assert!(!h.store.is_open("player_9"));
    }

    #[tokio::test]
    async fn test_client_update_roundtrip() {
        let h = harness();
        let (client, commands) = sync_channel();
        let store = h.store.clone();
        let task = tokio::spawn(h.sync.run(commands));

        let p = ParticipantId(10);
        assert!(client.joined(p));
        // Wait until the load has completed and the handle is open.
        let mut opened = false;
        for _ in 0..100 {
            if client.get(p).await.is_some() {
                opened = true;
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(opened, "load never completed");

        let ok = client
            .update(p, |mut record| {
                record.level = 2;
                record
            })
            .await;
        assert!(ok);
        assert_eq!(client.get(p).await.map(|r| r.level), Some(2));
        assert_eq!(store.peek("player_10").map(|r| r.level), Some(2));

        drop(client);
        task.await.unwrap();
    }
}
