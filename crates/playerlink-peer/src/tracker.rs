//! Ready-handshake bookkeeping for embedded peers.
//!
//! The host tells the tracker which frames it expects. Each frame announces
//! itself once with a `ready` event carrying its snapshot. The tracker
//! matches the announcement to a frame, builds the [`Experience`] facade and
//! resolves the peer's [`Deferred`]. When every expected frame has
//! announced (or the host seals the set), every lookup still pending is
//! rejected: those peers are not on the page.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use playerlink_transport::FrameHandle;
use playerlink_wire::{WireConfig, PAGE_CHANGED};

use crate::config::HostConfig;
use crate::deferred::Deferred;
use crate::error::PeerError;
use crate::facade::{Experience, Scope};
use crate::messenger::{Messenger, TransportSlot};
use crate::router::{Event, EventRouter};
use crate::session::{ExperienceSnapshot, PeerSession};

/// Pending or settled lookup of one peer.
pub type PeerDeferred = Deferred<Experience, PeerError>;

/// What the tracker did with one `ready` announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// Frame discovery has not run yet; held for replay.
    Queued,
    /// An expected frame became ready.
    Loaded(String),
    /// A dynamically inserted frame became ready. Not counted.
    Dynamic(String),
    /// The frame had already announced; ignored.
    Repeated(String),
    /// The frame is neither expected nor inserted; the peer was rejected.
    Unexpected(String),
    /// An expected frame announced after the peer set was complete; ignored.
    Late(String),
}

#[derive(Default)]
struct TrackerState {
    initialized: bool,
    expected: Vec<FrameHandle>,
    loaded: HashSet<FrameHandle>,
    dynamic: HashSet<FrameHandle>,
    inserted: HashMap<String, PeerDeferred>,
    deferreds: HashMap<String, PeerDeferred>,
    all_loaded: bool,
    early: VecDeque<(ExperienceSnapshot, FrameHandle)>,
}

impl TrackerState {
    fn is_complete(&self) -> bool {
        self.expected.iter().all(|frame| self.loaded.contains(frame))
    }
}

type Sessions = Rc<RefCell<HashMap<String, Rc<PeerSession>>>>;

struct Shared {
    state: RefCell<TrackerState>,
    sessions: Sessions,
    router: EventRouter,
    transport: TransportSlot,
    wire: Rc<WireConfig>,
    max_early: usize,
}

/// Tracks which peers are expected, loaded, and still awaited.
///
/// Clones share state.
#[derive(Clone)]
pub struct InstanceTracker {
    shared: Rc<Shared>,
}

/// Non-owning tracker handle, held by the router's `ready` handler.
#[derive(Clone)]
pub struct WeakTracker {
    shared: Weak<Shared>,
}

impl WeakTracker {
    pub fn upgrade(&self) -> Option<InstanceTracker> {
        self.shared.upgrade().map(|shared| InstanceTracker { shared })
    }
}

impl InstanceTracker {
    pub fn new(router: EventRouter, transport: TransportSlot, config: &HostConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(TrackerState::default()),
                sessions: Rc::new(RefCell::new(HashMap::new())),
                wire: Rc::new(config.wire.clone()),
                router,
                transport,
                max_early: config.max_early_announcements,
            }),
        }
    }

    pub fn downgrade(&self) -> WeakTracker {
        WeakTracker {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Record the frames expected to announce, then replay announcements
    /// that arrived before this call.
    ///
    /// Calling it again adds frames to the expected set.
    pub fn initialize(&self, frames: impl IntoIterator<Item = FrameHandle>) {
        let early = {
            let mut state = self.shared.state.borrow_mut();
            for frame in frames {
                if !state.expected.contains(&frame) {
                    state.expected.push(frame);
                }
            }
            state.initialized = true;
            std::mem::take(&mut state.early)
        };

        tracing::debug!(
            expected = self.expected_frames().len(),
            replayed = early.len(),
            "tracker initialized"
        );

        for (snapshot, source) in early {
            self.on_ready(snapshot, source);
        }
    }

    /// Handle one `ready` announcement from `source`.
    pub fn on_ready(&self, snapshot: ExperienceSnapshot, source: FrameHandle) -> ReadyOutcome {
        let peer_id = snapshot.experience_id.clone();
        let mut state = self.shared.state.borrow_mut();

        if !state.initialized {
            if self.shared.max_early == 0 {
                tracing::warn!(
                    %peer_id,
                    %source,
                    "ready announcement before initialization dropped"
                );
                return ReadyOutcome::Queued;
            }
            while state.early.len() >= self.shared.max_early {
                if let Some((dropped, frame)) = state.early.pop_front() {
                    tracing::warn!(
                        peer_id = %dropped.experience_id,
                        source = %frame,
                        "early ready queue full, dropping oldest announcement"
                    );
                }
            }
            tracing::debug!(%peer_id, %source, "ready announcement queued until initialization");
            state.early.push_back((snapshot, source));
            return ReadyOutcome::Queued;
        }

        let expected = state.expected.contains(&source);
        let inserted = if expected {
            None
        } else {
            snapshot
                .experience_alias
                .as_ref()
                .and_then(|alias| state.inserted.get(alias).cloned())
        };

        if !expected && inserted.is_none() {
            let deferred = state
                .deferreds
                .entry(peer_id.clone())
                .or_default()
                .clone();
            drop(state);
            tracing::error!(
                %peer_id,
                %source,
                "ready announcement from an untracked frame; register the frame before it loads"
            );
            deferred.reject(PeerError::NotFound(peer_id.clone()));
            return ReadyOutcome::Unexpected(peer_id);
        }

        if state.loaded.contains(&source) || state.dynamic.contains(&source) {
            tracing::debug!(%peer_id, %source, "repeated ready announcement ignored");
            return ReadyOutcome::Repeated(peer_id);
        }

        if state.all_loaded && inserted.is_none() {
            tracing::warn!(
                %peer_id,
                %source,
                "ready announcement after the peer set closed ignored"
            );
            return ReadyOutcome::Late(peer_id);
        }

        // Once closed, lookups by id are settled; only the alias deferred may resolve.
        let deferred = if state.all_loaded {
            None
        } else {
            Some(state.deferreds.entry(peer_id.clone()).or_default().clone())
        };
        if expected {
            state.loaded.insert(source);
        } else {
            state.dynamic.insert(source);
        }
        let complete = expected && state.is_complete();
        drop(state);

        let Some(experience) = self.build_facade(&peer_id, Some((snapshot, source))) else {
            return ReadyOutcome::Unexpected(peer_id);
        };
        tracing::debug!(%peer_id, %source, "successfully loaded experience");

        // Success callbacks are host code; completion must run even if one panics.
        let resolved = panic::catch_unwind(AssertUnwindSafe(|| {
            if let Some(deferred) = &deferred {
                deferred.resolve(experience.clone());
            }
            if let Some(inserted) = &inserted {
                inserted.resolve(experience.clone());
            }
        }));

        if complete && !self.is_all_loaded() {
            self.finish();
        }
        if let Err(panic) = resolved {
            panic::resume_unwind(panic);
        }

        if inserted.is_some() {
            ReadyOutcome::Dynamic(peer_id)
        } else {
            ReadyOutcome::Loaded(peer_id)
        }
    }

    /// The peer's deferred: existing, new and pending, or rejected when
    /// loading has finished without it.
    pub fn lookup(&self, peer_id: &str) -> PeerDeferred {
        let mut state = self.shared.state.borrow_mut();
        if let Some(deferred) = state.deferreds.get(peer_id) {
            return deferred.clone();
        }
        if state.all_loaded {
            drop(state);
            tracing::debug!(peer_id, "lookup after all peers loaded");
            return Deferred::rejected(PeerError::NotFound(peer_id.to_string()));
        }
        let deferred = PeerDeferred::new();
        state
            .deferreds
            .insert(peer_id.to_string(), deferred.clone());
        deferred
    }

    /// Await a frame added after discovery, matched by the alias it
    /// announces. Such frames never count toward the expected total.
    pub fn insert(&self, alias: &str) -> PeerDeferred {
        self.shared
            .state
            .borrow_mut()
            .inserted
            .entry(alias.to_string())
            .or_default()
            .clone()
    }

    /// Declare that no further expected frames will announce.
    pub fn seal(&self) {
        if self.is_all_loaded() {
            return;
        }
        tracing::info!("peer set sealed");
        self.finish();
    }

    /// Build the facade for a peer and register its page tracking handler.
    ///
    /// With `announcement`, a new session is stored from it; without, the
    /// stored session is reused. Returns `None` when there is neither.
    pub fn build_facade(
        &self,
        peer_id: &str,
        announcement: Option<(ExperienceSnapshot, FrameHandle)>,
    ) -> Option<Experience> {
        let session = match announcement {
            Some((snapshot, frame)) => {
                let session = Rc::new(PeerSession::new(frame, snapshot));
                self.shared
                    .sessions
                    .borrow_mut()
                    .insert(peer_id.to_string(), Rc::clone(&session));
                session
            }
            None => {
                let stored = self.shared.sessions.borrow().get(peer_id).cloned();
                let Some(session) = stored else {
                    tracing::error!(
                        peer_id,
                        "experience could not be found, but was supposed to have finished loading"
                    );
                    return None;
                };
                session
            }
        };

        let tracked = Rc::clone(&session);
        self.shared
            .router
            .register_for_peer(peer_id, PAGE_CHANGED, move |event: &Event| {
                if event.source != tracked.frame() {
                    return;
                }
                match event.u32_param("pageNum") {
                    Some(page_number) => tracked.set_current_page_number(page_number),
                    None => tracing::warn!(
                        peer_id = %tracked.peer_id(),
                        "page.changed without a usable pageNum"
                    ),
                }
            });

        let messenger = Messenger::new(
            session.frame(),
            self.shared.transport.clone(),
            Rc::clone(&self.shared.wire),
        );
        let scope = Scope::new(peer_id, messenger, self.shared.router.downgrade());
        Some(Experience::new(session, scope))
    }

    /// Stored session for a ready peer.
    pub fn session(&self, peer_id: &str) -> Option<Rc<PeerSession>> {
        self.shared.sessions.borrow().get(peer_id).cloned()
    }

    pub fn is_all_loaded(&self) -> bool {
        self.shared.state.borrow().all_loaded
    }

    pub fn expected_frames(&self) -> Vec<FrameHandle> {
        self.shared.state.borrow().expected.clone()
    }

    /// Number of expected frames that have announced.
    pub fn loaded_count(&self) -> usize {
        self.shared.state.borrow().loaded.len()
    }

    /// Announcements waiting for `initialize`.
    pub fn queued_count(&self) -> usize {
        self.shared.state.borrow().early.len()
    }

    fn finish(&self) {
        let pending: Vec<(String, PeerDeferred)> = {
            let mut state = self.shared.state.borrow_mut();
            state.all_loaded = true;
            state
                .deferreds
                .iter()
                .filter(|(_, deferred)| deferred.is_pending())
                .map(|(peer_id, deferred)| (peer_id.clone(), deferred.clone()))
                .collect()
        };

        tracing::debug!(rejected = pending.len(), "all expected peers loaded");
        for (peer_id, deferred) in pending {
            deferred.reject(PeerError::NotFound(peer_id));
        }
    }
}

impl fmt::Debug for InstanceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("InstanceTracker")
            .field("initialized", &state.initialized)
            .field("expected", &state.expected.len())
            .field("loaded", &state.loaded.len())
            .field("dynamic", &state.dynamic.len())
            .field("all_loaded", &state.all_loaded)
            .finish()
    }
}
