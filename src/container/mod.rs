//! The replay container: owns the session, the event buffer, the
//! recorder subscription and the flush scheduler, and drives every
//! state transition between them.
//!
//! One container is fully self-contained; multiple containers can
//! coexist (useful in tests). Mutable state lives behind a single
//! `parking_lot::Mutex` that is never held across an await point.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::buffer::{create_event_buffer, EventBuffer};
use crate::config::{ReplayConfig, BUFFER_CHECKOUT_TIME};
use crate::delivery::{send_replay, SegmentContext, SendReplayRequest};
use crate::error::ReplayError;
use crate::flush::{spawn_flush_loop, FlushHandle, FlushTarget};
use crate::handlers::{
    self, blur_breadcrumb, focus_breadcrumb, mutations_breadcrumb, throttled_breadcrumb,
    ActivitySource, AfterSendAction, MutationDecision, NetworkRequestInfo, SdkEvent, Throttle,
    ThrottleResult,
};
use crate::network::performance::{create_performance_spans, PerformanceEntry};
use crate::recording::{EmittedEvent, Recorder, RecorderOptions, RecordingEvent};
use crate::session::{
    get_or_create_session, policy, Sampled, Session, SessionOptions, SessionStore,
};
use crate::transport::Transport;
use crate::util::{now_ms, sec_to_ms};

/// How the container is currently recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingMode {
    /// Continuous recording; segments flush on a debounce cadence.
    Session,
    /// Rolling-window recording; nothing is sent until an explicit
    /// flush or a tagged error promotes the replay.
    Buffer,
}

/// Host SDK callbacks the container reports into.
pub trait CaptureHook: Send + Sync {
    /// Forward an internal replay fault to the host error pipeline.
    fn capture_exception(&self, _message: &str) {}

    /// Account for a replay that was dropped rather than delivered.
    fn record_dropped_event(&self, _reason: &str, _category: &str) {}
}

/// Hook that ignores everything.
pub struct NoopCaptureHook;

impl CaptureHook for NoopCaptureHook {}

/// External collaborators, injected so tests can swap in mocks.
pub struct ReplayDependencies {
    pub recorder: Arc<dyn Recorder>,
    pub transport: Arc<dyn Transport>,
    pub session_store: Arc<dyn SessionStore>,
    pub capture_hook: Arc<dyn CaptureHook>,
}

struct State {
    session: Option<Session>,
    recording_mode: Option<RecordingMode>,
    is_enabled: bool,
    is_paused: bool,
    buffer: Option<Arc<dyn EventBuffer>>,
    context: SegmentContext,
    current_url: String,
    throttle: Throttle,
    performance_entries: Vec<PerformanceEntry>,
    recorder_task: Option<JoinHandle<()>>,
}

impl State {
    fn new() -> Self {
        Self {
            session: None,
            recording_mode: None,
            is_enabled: false,
            is_paused: false,
            buffer: None,
            context: SegmentContext::default(),
            current_url: String::new(),
            throttle: Throttle::default(),
            performance_entries: Vec::new(),
            recorder_task: None,
        }
    }
}

struct Inner {
    config: ReplayConfig,
    deps: ReplayDependencies,
    state: Mutex<State>,
    flush: FlushHandle,
    weak_self: Weak<Inner>,
}

/// Handle to one replay pipeline instance.
#[derive(Clone)]
pub struct ReplayContainer {
    inner: Arc<Inner>,
}

impl ReplayContainer {
    /// Build a container. Must be called inside a tokio runtime; the
    /// flush scheduler task is spawned immediately.
    pub fn new(config: ReplayConfig, deps: ReplayDependencies) -> Self {
        let min = Duration::from_millis(config.flush_min_delay);
        let max = Duration::from_millis(config.flush_max_delay);
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| Inner {
            config,
            deps,
            state: Mutex::new(State::new()),
            flush: spawn_flush_loop(weak.clone(), min, max),
            weak_self: weak.clone(),
        });
        Self { inner }
    }

    /// Apply the configured sample rates: load or create a session and
    /// start recording in the mode it was sampled into. A no-op when
    /// both rates are zero or the draw came up unsampled.
    pub fn initialize_sampling(&self) -> Result<(), ReplayError> {
        let inner = &self.inner;
        if inner.config.session_sample_rate <= 0.0 && inner.config.error_sample_rate <= 0.0 {
            return Ok(());
        }
        if inner.state.lock().is_enabled {
            return Ok(());
        }

        let now = now_ms();
        let options = inner.session_options();
        let (session, _origin) = get_or_create_session(
            inner.deps.session_store.as_ref(),
            &inner.config.timeouts,
            None,
            &options,
            now,
        )?;
        match session.sampled {
            Sampled::No => Ok(()),
            Sampled::Session => inner.start_recording(RecordingMode::Session, session, now),
            Sampled::Buffer => inner.start_recording(RecordingMode::Buffer, session, now),
        }
    }

    /// Begin continuous recording, bypassing the session sample rate.
    pub fn start(&self) -> Result<(), ReplayError> {
        let inner = &self.inner;
        inner.ensure_stopped()?;

        let now = now_ms();
        let mut session = Session::new(Sampled::Session, now);
        session.previous_session_id = inner.previous_session_id();
        if inner.config.sticky_session {
            inner.deps.session_store.save(&session)?;
        }
        inner.start_recording(RecordingMode::Session, session, now)
    }

    /// Begin rolling-buffer recording, bypassing the error sample rate.
    pub fn start_buffering(&self) -> Result<(), ReplayError> {
        let inner = &self.inner;
        inner.ensure_stopped()?;

        let now = now_ms();
        let mut session = Session::new(Sampled::Buffer, now);
        session.previous_session_id = inner.previous_session_id();
        if inner.config.sticky_session {
            inner.deps.session_store.save(&session)?;
        }
        inner.start_recording(RecordingMode::Buffer, session, now)
    }

    /// Stop the replay. In session mode any buffered events are flushed
    /// first; in buffer mode they are discarded. Idempotent.
    pub async fn stop(&self, reason: &str) {
        let mode = {
            let state = self.inner.state.lock();
            if !state.is_enabled {
                return;
            }
            state.recording_mode
        };
        tracing::info!(reason, "stopping replay");

        if let Err(err) = self.inner.deps.recorder.stop() {
            tracing::warn!(error = %err, "recorder failed to stop");
        }
        if mode == Some(RecordingMode::Session) {
            self.inner.flush.flush_immediate(true).await;
        }
        self.inner.stop_no_flush();
    }

    /// Pause recording without rotating the session.
    pub fn pause(&self) {
        self.inner.pause();
    }

    /// Resume a paused recording, refreshing the session first when it
    /// expired while paused.
    pub fn resume(&self) -> Result<(), ReplayError> {
        self.inner.resume(now_ms())
    }

    /// Flush now. In buffer mode this sends the rolling buffer and
    /// promotes the replay to session mode.
    pub async fn flush(&self) {
        let mode = {
            let state = self.inner.state.lock();
            if !state.is_enabled {
                return;
            }
            state.recording_mode
        };
        match mode {
            Some(RecordingMode::Buffer) => self.inner.send_buffered_replay().await,
            Some(RecordingMode::Session) => self.inner.flush.flush_immediate(false).await,
            None => {}
        }
    }

    /// Send the rolling buffer as a segment and promote to session
    /// mode. A no-op outside buffer mode; `flush` covers session mode.
    pub async fn flush_buffer(&self) {
        let buffering = {
            let state = self.inner.state.lock();
            state.is_enabled && state.recording_mode == Some(RecordingMode::Buffer)
        };
        if buffering {
            self.inner.send_buffered_replay().await;
        }
    }

    /// Record an out-of-band custom event (breadcrumb or span). Subject
    /// to throttling.
    pub async fn add_event(&self, event: RecordingEvent) {
        self.inner.add_custom_event(event).await;
    }

    /// Queue raw performance entries; they convert to spans and join
    /// the buffer at the next flush.
    pub fn add_performance_entries(&self, entries: Vec<PerformanceEntry>) {
        let request = {
            let mut state = self.inner.state.lock();
            if !state.is_enabled {
                return;
            }
            state.performance_entries.extend(entries);
            state.recording_mode == Some(RecordingMode::Session)
        };
        if request {
            self.inner.flush.request_flush();
        }
    }

    /// Enrich one observed fetch/XHR exchange into the recording.
    pub async fn capture_network_request(&self, info: &NetworkRequestInfo) {
        let span = handlers::capture_network_request(info, &self.inner.config.network);
        let payload = match serde_json::to_value(&span) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize network span");
                return;
            }
        };
        self.inner
            .add_custom_event(RecordingEvent::performance_span(span.start_timestamp, payload))
            .await;
    }

    /// Note a user interaction, extending the idle deadline and waking
    /// a paused recording.
    pub fn trigger_user_activity(&self, _source: ActivitySource) {
        let now = now_ms();
        let (updated, paused) = {
            let mut state = self.inner.state.lock();
            let updated = state.session.as_mut().map(|session| {
                session.last_activity = now;
                session.clone()
            });
            (updated, state.is_paused)
        };
        if let Some(session) = updated {
            if self.inner.config.sticky_session {
                if let Err(err) = self.inner.deps.session_store.save(&session) {
                    tracing::warn!(error = %err, "failed to persist session activity");
                }
            }
        }
        if paused {
            if let Err(err) = self.inner.resume(now) {
                tracing::warn!(error = %err, "failed to resume recording");
            }
        }
    }

    /// The page went to the background (or came back). Hidden tabs get
    /// a conditional flush in session mode; neither direction counts as
    /// user activity.
    pub async fn handle_visibility_change(&self, visible: bool) {
        let now = now_ms();
        if visible {
            self.inner.check_and_handle_expired_session(now);
            return;
        }
        self.inner.conditional_flush(now).await;
    }

    pub async fn handle_focus(&self) {
        self.inner.add_custom_event(focus_breadcrumb(now_ms())).await;
    }

    /// The window lost focus: breadcrumb it, then flush under the same
    /// conditions as a hidden tab.
    pub async fn handle_blur(&self) {
        let now = now_ms();
        self.inner.add_custom_event(blur_breadcrumb(now)).await;
        self.inner.conditional_flush(now).await;
    }

    /// Track a navigation: the URL joins the segment context and, in
    /// session mode, schedules a flush.
    pub fn handle_navigation(&self, url: &str) {
        let request = {
            let mut state = self.inner.state.lock();
            if !state.is_enabled {
                return;
            }
            state.current_url = url.to_string();
            state.context.urls.push(url.to_string());
            state.recording_mode == Some(RecordingMode::Session)
        };
        if request {
            self.inner.flush.request_flush();
        }
    }

    /// Inspect a delivered SDK event: collect error and trace ids, and
    /// promote a buffered replay when an error was tagged with it.
    pub async fn after_send_event(&self, event: &SdkEvent, status: Option<u16>) {
        let action = {
            let state = self.inner.state.lock();
            if !state.is_enabled {
                return;
            }
            let Some(session) = state.session.as_ref() else {
                return;
            };
            handlers::after_send_event(event, status, &session.id)
        };

        match action {
            AfterSendAction::CollectError { event_id, promote } => {
                let do_promote = {
                    let mut state = self.inner.state.lock();
                    state.context.error_ids.insert(event_id);
                    promote && state.recording_mode == Some(RecordingMode::Buffer)
                };
                if do_promote {
                    self.inner.send_buffered_replay().await;
                }
            }
            AfterSendAction::CollectTrace { trace_id } => {
                self.inner.state.lock().context.trace_ids.insert(trace_id);
            }
            AfterSendAction::Ignore => {}
        }
    }

    /// Gate one batch of DOM mutations. Returns whether the recorder
    /// should keep the incremental diff.
    pub async fn on_mutation(&self, count: usize) -> bool {
        let now = now_ms();
        match handlers::on_mutation(count, &self.inner.config.experiments) {
            MutationDecision::Record => true,
            MutationDecision::RecordWithBreadcrumb => {
                self.inner
                    .add_custom_event(mutations_breadcrumb(now, count))
                    .await;
                true
            }
            MutationDecision::ForceSnapshot => {
                self.inner
                    .add_custom_event(mutations_breadcrumb(now, count))
                    .await;
                if let Err(err) = self.inner.deps.recorder.take_full_snapshot(false) {
                    tracing::warn!(error = %err, "forced snapshot failed");
                }
                false
            }
        }
    }

    // ── Inspection ────────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().is_enabled
    }

    pub fn is_paused(&self) -> bool {
        self.inner.state.lock().is_paused
    }

    pub fn recording_mode(&self) -> Option<RecordingMode> {
        self.inner.state.lock().recording_mode
    }

    pub fn session_id(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .session
            .as_ref()
            .map(|s| s.id.clone())
    }
}

impl Inner {
    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            sticky: self.config.sticky_session,
            session_sample_rate: self.config.session_sample_rate,
            allow_buffering: self.config.error_sample_rate > 0.0,
        }
    }

    fn ensure_stopped(&self) -> Result<(), ReplayError> {
        let state = self.state.lock();
        if !state.is_enabled {
            return Ok(());
        }
        Err(match state.recording_mode {
            Some(RecordingMode::Buffer) => ReplayError::AlreadyBuffering,
            _ => ReplayError::AlreadyRecording,
        })
    }

    fn previous_session_id(&self) -> Option<String> {
        if let Some(session) = self.state.lock().session.as_ref() {
            return Some(session.id.clone());
        }
        match self.deps.session_store.load() {
            Ok(previous) => previous.map(|s| s.id),
            Err(_) => None,
        }
    }

    fn recorder_options(&self, mode: RecordingMode) -> RecorderOptions {
        RecorderOptions {
            checkout_every_ms: match mode {
                RecordingMode::Buffer => Some(BUFFER_CHECKOUT_TIME),
                RecordingMode::Session => None,
            },
        }
    }

    fn start_recording(
        &self,
        mode: RecordingMode,
        session: Session,
        now: u64,
    ) -> Result<(), ReplayError> {
        let buffer = create_event_buffer(self.config.use_compression);
        let rx = self.deps.recorder.start(self.recorder_options(mode))?;
        let task = self.spawn_consumer(rx);

        let mut state = self.state.lock();
        if let Some(old) = state.recorder_task.replace(task) {
            old.abort();
        }
        state.buffer = Some(buffer);
        state.session = Some(session);
        state.recording_mode = Some(mode);
        state.is_enabled = true;
        state.is_paused = false;
        state.throttle = Throttle::default();
        state.performance_entries.clear();
        reset_context(&mut state, now);
        tracing::debug!(mode = ?mode, "replay recording started");
        Ok(())
    }

    fn spawn_consumer(&self, mut rx: mpsc::UnboundedReceiver<EmittedEvent>) -> JoinHandle<()> {
        let weak = self.weak_self.clone();
        tokio::spawn(async move {
            while let Some(emitted) = rx.recv().await {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                inner.handle_recording_emit(emitted).await;
            }
        })
    }

    async fn handle_recording_emit(&self, emitted: EmittedEvent) {
        let now = now_ms();
        if self.is_stale(&emitted.event, now) {
            return;
        }
        let (buffer, trim, request) = {
            let mut state = self.state.lock();
            if !state.is_enabled {
                return;
            }
            let Some(buffer) = state.buffer.clone() else {
                return;
            };
            let trim =
                emitted.is_checkout && state.recording_mode == Some(RecordingMode::Buffer);
            if trim {
                // New rolling window: the segment now starts here.
                state.context.initial_timestamp_ms = sec_to_ms(emitted.event.timestamp);
                state.context.error_ids.clear();
                state.context.trace_ids.clear();
                state.context.urls.clear();
                if !state.current_url.is_empty() {
                    let url = state.current_url.clone();
                    state.context.initial_url = url.clone();
                    state.context.urls.push(url);
                }
            }
            let request = state.recording_mode == Some(RecordingMode::Session);
            (buffer, trim, request)
        };

        if let Err(err) = buffer.add(emitted.event, trim).await {
            tracing::warn!(error = %err, "failed to buffer recording event");
            return;
        }
        if request {
            self.flush.request_flush();
        }
    }

    async fn add_custom_event(&self, event: RecordingEvent) {
        let now = now_ms();
        let verdict = {
            let mut state = self.state.lock();
            if !state.is_enabled {
                return;
            }
            state.throttle.offer(now)
        };
        match verdict {
            ThrottleResult::Accepted => self.add_event_raw(event, now).await,
            ThrottleResult::ThrottledFirst => {
                self.add_event_raw(throttled_breadcrumb(now), now).await;
            }
            ThrottleResult::Throttled => {}
        }
    }

    async fn add_event_raw(&self, event: RecordingEvent, now: u64) {
        if self.is_stale(&event, now) {
            return;
        }
        let (buffer, request) = {
            let state = self.state.lock();
            if !state.is_enabled {
                return;
            }
            let Some(buffer) = state.buffer.clone() else {
                return;
            };
            (buffer, state.recording_mode == Some(RecordingMode::Session))
        };
        if let Err(err) = buffer.add(event, false).await {
            tracing::warn!(error = %err, "failed to buffer event");
            return;
        }
        if request {
            self.flush.request_flush();
        }
    }

    /// Events older than the idle-expire window predate any session
    /// that could legitimately contain them.
    fn is_stale(&self, event: &RecordingEvent, now: u64) -> bool {
        sec_to_ms(event.timestamp) + self.config.timeouts.session_idle_expire < now
    }

    fn pause(&self) {
        let should_stop = {
            let mut state = self.state.lock();
            if !state.is_enabled || state.is_paused {
                false
            } else {
                state.is_paused = true;
                true
            }
        };
        if should_stop {
            if let Err(err) = self.deps.recorder.stop() {
                tracing::warn!(error = %err, "recorder failed to stop for pause");
            }
            tracing::debug!("replay recording paused");
        }
    }

    fn resume(&self, now: u64) -> Result<(), ReplayError> {
        {
            let state = self.state.lock();
            if !state.is_enabled || !state.is_paused {
                return Ok(());
            }
        }
        // A false return can mean the session rotated in place; the
        // recorder still restarts unless the container shut down.
        self.check_and_handle_expired_session(now);
        let mode = {
            let state = self.state.lock();
            if !state.is_enabled {
                return Ok(());
            }
            match state.recording_mode {
                Some(mode) => mode,
                None => return Ok(()),
            }
        };
        let rx = self.deps.recorder.start(self.recorder_options(mode))?;
        let task = self.spawn_consumer(rx);
        let mut state = self.state.lock();
        if let Some(old) = state.recorder_task.replace(task) {
            old.abort();
        }
        state.is_paused = false;
        tracing::debug!("replay recording resumed");
        Ok(())
    }

    /// Validate the current session against the idle and lifetime
    /// policy. Returns true when the existing session is still good;
    /// false means the caller must skip its flush (recording paused,
    /// stopped, or rotated onto a fresh session).
    fn check_and_handle_expired_session(&self, now: u64) -> bool {
        let (expired, pause_only, old_id) = {
            let state = self.state.lock();
            let Some(session) = state.session.as_ref() else {
                return false;
            };
            let expired = policy::is_session_expired(session, &self.config.timeouts, now);
            // Pausing a buffer-mode replay would rotate it into a new
            // session on resume, losing the error linkage; only
            // continuous recordings idle-pause.
            let pause_only = !expired
                && !state.is_paused
                && state.recording_mode == Some(RecordingMode::Session)
                && policy::is_idle_past_pause(session.last_activity, &self.config.timeouts, now);
            (expired, pause_only, session.id.clone())
        };

        if pause_only {
            self.pause();
            return false;
        }
        if !expired {
            return true;
        }

        let current = self.state.lock().session.clone();
        let options = self.session_options();
        let created = get_or_create_session(
            self.deps.session_store.as_ref(),
            &self.config.timeouts,
            current.as_ref(),
            &options,
            now,
        );
        let (mut session, _origin) = match created {
            Ok(created) => created,
            Err(err) => {
                tracing::warn!(error = %err, "failed to refresh expired session");
                return false;
            }
        };

        if !session.sampled.is_sampled() {
            tracing::debug!("expired session is not renewable, stopping replay");
            self.stop_no_flush();
            return false;
        }

        session.previous_session_id = Some(old_id);
        if self.config.sticky_session {
            if let Err(err) = self.deps.session_store.save(&session) {
                tracing::warn!(error = %err, "failed to persist refreshed session");
            }
        }
        let mode = match session.sampled {
            Sampled::Buffer => RecordingMode::Buffer,
            _ => RecordingMode::Session,
        };
        let (paused, old_buffer) = {
            let mut state = self.state.lock();
            state.session = Some(session);
            state.recording_mode = Some(mode);
            reset_context(&mut state, now);
            let old_buffer = state
                .buffer
                .replace(create_event_buffer(self.config.use_compression));
            (state.is_paused, old_buffer)
        };
        // Events recorded under the old session never ship under the
        // new one.
        if let Some(buffer) = old_buffer {
            buffer.destroy();
        }
        // The rotated session needs a fresh replayable base state; the
        // flush that noticed the expiry is skipped.
        if !paused {
            if let Err(err) = self.deps.recorder.take_full_snapshot(true) {
                tracing::warn!(error = %err, "checkout after session rotation failed");
            }
        }
        tracing::debug!("session expired and was refreshed");
        false
    }

    /// Flush when recording continuously and the session is still
    /// valid. Shared by the background transitions (hidden tab, blur).
    async fn conditional_flush(&self, now: u64) {
        let eligible = {
            let state = self.state.lock();
            state.is_enabled && state.recording_mode == Some(RecordingMode::Session)
        };
        if eligible && self.check_and_handle_expired_session(now) {
            self.flush.flush_immediate(false).await;
        }
    }

    /// Promote a buffered replay: flush the rolling window, then keep
    /// recording as a non-renewable session.
    async fn send_buffered_replay(&self) {
        self.flush.flush_immediate(true).await;

        let restart = {
            let mut state = self.state.lock();
            if !state.is_enabled {
                false
            } else {
                state.recording_mode = Some(RecordingMode::Session);
                if let Some(session) = state.session.as_mut() {
                    session.should_refresh = false;
                }
                if self.config.sticky_session {
                    if let Some(session) = state.session.as_ref() {
                        if let Err(err) = self.deps.session_store.save(session) {
                            tracing::warn!(error = %err, "failed to persist promoted session");
                        }
                    }
                }
                true
            }
        };
        if !restart {
            return;
        }

        // Restart without the checkout interval; session mode keeps
        // everything.
        if let Err(err) = self.deps.recorder.stop() {
            tracing::warn!(error = %err, "recorder failed to stop for promotion");
        }
        match self
            .deps
            .recorder
            .start(self.recorder_options(RecordingMode::Session))
        {
            Ok(rx) => {
                let task = self.spawn_consumer(rx);
                let mut state = self.state.lock();
                if let Some(old) = state.recorder_task.replace(task) {
                    old.abort();
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "recorder failed to restart after promotion");
            }
        }
        tracing::debug!("buffered replay promoted to session mode");
    }

    /// Tear down without flushing. Used on every terminal path; the
    /// public `stop` performs its final flush before calling this.
    fn stop_no_flush(&self) {
        let (buffer, task, had_session) = {
            let mut state = self.state.lock();
            if !state.is_enabled && state.session.is_none() {
                return;
            }
            state.is_enabled = false;
            state.is_paused = false;
            state.recording_mode = None;
            let had_session = state.session.take().is_some();
            state.context = SegmentContext::default();
            state.performance_entries.clear();
            (state.buffer.take(), state.recorder_task.take(), had_session)
        };

        if let Err(err) = self.deps.recorder.stop() {
            tracing::warn!(error = %err, "recorder failed to stop");
        }
        if let Some(task) = task {
            task.abort();
        }
        if let Some(buffer) = buffer {
            buffer.destroy();
        }
        if had_session {
            if let Err(err) = self.deps.session_store.clear() {
                tracing::warn!(error = %err, "failed to clear persisted session");
            }
        }
        self.flush.cancel();
    }

    async fn do_flush(&self, now: u64) -> Result<(), ReplayError> {
        let (buffer, entries) = {
            let mut state = self.state.lock();
            let Some(buffer) = state.buffer.clone() else {
                return Ok(());
            };
            (buffer, std::mem::take(&mut state.performance_entries))
        };

        for span in create_performance_spans(&entries) {
            let payload = serde_json::to_value(&span)?;
            buffer
                .add(
                    RecordingEvent::performance_span(span.start_timestamp, payload),
                    false,
                )
                .await?;
        }

        if !buffer.has_events() {
            return Ok(());
        }

        // The first segment starts at the earliest buffered event, not
        // at container start.
        {
            let mut state = self.state.lock();
            let segment_zero = state.session.as_ref().is_some_and(|s| s.segment_id == 0);
            if segment_zero {
                if let Some(earliest) = buffer.earliest_timestamp() {
                    let earliest_ms = sec_to_ms(earliest);
                    if earliest_ms < state.context.initial_timestamp_ms {
                        state.context.initial_timestamp_ms = earliest_ms;
                    }
                }
            }
        }

        let recording_data = buffer.finish().await?;

        let request = {
            let mut state = self.state.lock();
            let context = pop_context(&mut state, now);
            let Some(session) = state.session.as_mut() else {
                return Ok(());
            };
            // The id is consumed at flush start, success or not.
            let segment_id = session.segment_id;
            session.segment_id += 1;
            let replay_id = session.id.clone();
            let replay_type = session.sampled;
            if self.config.sticky_session {
                if let Err(err) = self.deps.session_store.save(session) {
                    tracing::warn!(error = %err, "failed to persist session");
                }
            }
            SendReplayRequest {
                replay_id,
                recording_data,
                segment_id,
                context,
                replay_type,
                timestamp_ms: now,
            }
        };

        send_replay(request, self.deps.transport.as_ref()).await
    }
}

#[async_trait::async_trait]
impl FlushTarget for Inner {
    async fn run_flush(&self, force: bool) {
        let now = now_ms();
        {
            let state = self.state.lock();
            if !state.is_enabled && !force {
                return;
            }
        }
        if !force {
            if !self.check_and_handle_expired_session(now) {
                return;
            }
            let too_short = {
                let state = self.state.lock();
                if state.session.is_none() || state.is_paused {
                    return;
                }
                now.saturating_sub(state.context.initial_timestamp_ms)
                    < self.config.min_replay_duration
            };
            if too_short {
                // Not worth a segment yet; come back after the debounce.
                self.flush.request_flush();
                return;
            }
        }

        if let Err(err) = self.do_flush(now).await {
            tracing::error!(error = %err, "replay flush failed");
            if err.is_terminal_for_replay() {
                self.deps
                    .capture_hook
                    .record_dropped_event("send_error", "replay");
                if self.config.experiments.capture_exceptions {
                    self.deps.capture_hook.capture_exception(&err.to_string());
                }
                self.stop_no_flush();
            }
        }
    }
}

fn reset_context(state: &mut State, now: u64) {
    state.context = SegmentContext {
        initial_timestamp_ms: now,
        initial_url: state.current_url.clone(),
        ..SegmentContext::default()
    };
    if !state.current_url.is_empty() {
        state.context.urls.push(state.current_url.clone());
    }
}

fn pop_context(state: &mut State, now: u64) -> SegmentContext {
    let popped = state.context.clone();
    reset_context(state, now);
    popped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::EventType;
    use crate::session::InMemorySessionStore;
    use crate::transport::{TransportError, TransportResponse};
    use crate::util::ms_to_sec;
    use parking_lot::Mutex as PlMutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockRecorder {
        tx: PlMutex<Option<mpsc::UnboundedSender<EmittedEvent>>>,
        starts: AtomicUsize,
        snapshots: AtomicUsize,
        last_options: PlMutex<Option<RecorderOptions>>,
    }

    impl MockRecorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                tx: PlMutex::new(None),
                starts: AtomicUsize::new(0),
                snapshots: AtomicUsize::new(0),
                last_options: PlMutex::new(None),
            })
        }

        fn emit(&self, event: RecordingEvent, is_checkout: bool) {
            if let Some(tx) = self.tx.lock().as_ref() {
                let _ = tx.send(EmittedEvent { event, is_checkout });
            }
        }
    }

    impl Recorder for MockRecorder {
        fn start(
            &self,
            options: RecorderOptions,
        ) -> Result<mpsc::UnboundedReceiver<EmittedEvent>, ReplayError> {
            let (tx, rx) = mpsc::unbounded_channel();
            *self.tx.lock() = Some(tx);
            *self.last_options.lock() = Some(options);
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(rx)
        }

        fn stop(&self) -> Result<(), ReplayError> {
            self.tx.lock().take();
            Ok(())
        }

        fn take_full_snapshot(&self, _checkout: bool) -> Result<(), ReplayError> {
            self.snapshots.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    struct MockTransport {
        envelopes: PlMutex<Vec<crate::delivery::Envelope>>,
        attempts: AtomicUsize,
        fail_all: bool,
    }

    impl MockTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                envelopes: PlMutex::new(Vec::new()),
                attempts: AtomicUsize::new(0),
                fail_all: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                envelopes: PlMutex::new(Vec::new()),
                attempts: AtomicUsize::new(0),
                fail_all: true,
            })
        }

        fn sent(&self) -> Vec<crate::delivery::Envelope> {
            self.envelopes.lock().clone()
        }
    }

    #[async_trait::async_trait]
    impl Transport for MockTransport {
        async fn send(
            &self,
            envelope: &crate::delivery::Envelope,
        ) -> Result<TransportResponse, TransportError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail_all {
                return Err(TransportError::Network("unreachable".into()));
            }
            self.envelopes.lock().push(envelope.clone());
            Ok(TransportResponse::Success { status: 200 })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    struct CountingHook {
        dropped: AtomicUsize,
        exceptions: AtomicUsize,
    }

    impl CountingHook {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                dropped: AtomicUsize::new(0),
                exceptions: AtomicUsize::new(0),
            })
        }
    }

    impl CaptureHook for CountingHook {
        fn capture_exception(&self, _message: &str) {
            self.exceptions.fetch_add(1, Ordering::SeqCst);
        }

        fn record_dropped_event(&self, _reason: &str, _category: &str) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        container: ReplayContainer,
        recorder: Arc<MockRecorder>,
        transport: Arc<MockTransport>,
        store: Arc<InMemorySessionStore>,
        hook: Arc<CountingHook>,
    }

    fn fixture_with(config: ReplayConfig, transport: Arc<MockTransport>) -> Fixture {
        let recorder = MockRecorder::new();
        let store = Arc::new(InMemorySessionStore::new());
        let hook = CountingHook::new();
        let container = ReplayContainer::new(
            config,
            ReplayDependencies {
                recorder: recorder.clone(),
                transport: transport.clone(),
                session_store: store.clone(),
                capture_hook: hook.clone(),
            },
        );
        Fixture {
            container,
            recorder,
            transport,
            store,
            hook,
        }
    }

    fn test_config() -> ReplayConfig {
        ReplayConfig {
            use_compression: false,
            min_replay_duration: 0,
            ..ReplayConfig::default()
        }
    }

    fn fixture() -> Fixture {
        fixture_with(test_config(), MockTransport::new())
    }

    fn snapshot_event() -> RecordingEvent {
        RecordingEvent {
            event_type: EventType::FullSnapshot,
            timestamp: ms_to_sec(now_ms()),
            data: json!({"node": 1}),
        }
    }

    fn incremental_event() -> RecordingEvent {
        RecordingEvent {
            event_type: EventType::IncrementalSnapshot,
            timestamp: ms_to_sec(now_ms()),
            data: json!({"mutation": 1}),
        }
    }

    async fn settle() {
        // Let the consumer task pick up emitted events.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let f = fixture();
        f.container.start().unwrap();
        assert!(matches!(
            f.container.start(),
            Err(ReplayError::AlreadyRecording)
        ));
        assert!(matches!(
            f.container.start_buffering(),
            Err(ReplayError::AlreadyRecording)
        ));
    }

    #[tokio::test]
    async fn start_while_buffering_is_rejected() {
        let f = fixture();
        f.container.start_buffering().unwrap();
        assert!(matches!(
            f.container.start(),
            Err(ReplayError::AlreadyBuffering)
        ));
        assert_eq!(f.container.recording_mode(), Some(RecordingMode::Buffer));
    }

    #[tokio::test]
    async fn segment_ids_increase_per_flush() {
        let f = fixture();
        f.container.start().unwrap();

        f.recorder.emit(snapshot_event(), true);
        settle().await;
        f.container.flush().await;

        f.recorder.emit(incremental_event(), false);
        settle().await;
        f.container.flush().await;

        let sent = f.transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].event.segment_id, 0);
        assert_eq!(sent[1].event.segment_id, 1);
        assert_eq!(sent[0].event.replay_type, "session");

        let persisted = f.store.load().unwrap().unwrap();
        assert_eq!(persisted.segment_id, 2);
    }

    #[tokio::test]
    async fn empty_buffer_flushes_nothing() {
        let f = fixture();
        f.container.start().unwrap();
        f.container.flush().await;
        assert!(f.transport.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_delivery_failure_stops_the_replay() {
        let f = fixture_with(test_config(), MockTransport::failing());
        f.container.start().unwrap();

        f.recorder.emit(snapshot_event(), true);
        settle().await;
        f.container.flush().await;

        // Initial attempt plus three retries, then give up for good.
        assert_eq!(f.transport.attempts.load(Ordering::SeqCst), 4);
        assert_eq!(f.hook.dropped.load(Ordering::SeqCst), 1);
        assert!(!f.container.is_enabled());
        assert!(f.store.load().unwrap().is_none());

        // No further sends after the terminal failure.
        f.container.flush().await;
        assert_eq!(f.transport.attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn idle_past_pause_pauses_without_rotating_the_session() {
        let f = fixture();
        f.container.start().unwrap();
        let id = f.container.session_id().unwrap();

        let now = now_ms();
        {
            let mut state = f.container.inner.state.lock();
            state.session.as_mut().unwrap().last_activity =
                now - (f.container.inner.config.timeouts.session_idle_pause + 1);
        }
        assert!(!f.container.inner.check_and_handle_expired_session(now));
        assert!(f.container.is_paused());
        assert_eq!(f.container.session_id().unwrap(), id);
    }

    #[tokio::test]
    async fn idle_past_expire_rotates_the_session() {
        let mut config = test_config();
        config.session_sample_rate = 1.0;
        let f = fixture_with(config, MockTransport::new());
        f.container.start().unwrap();
        let id = f.container.session_id().unwrap();

        let now = now_ms();
        {
            let mut state = f.container.inner.state.lock();
            let session = state.session.as_mut().unwrap();
            session.last_activity =
                now - (f.container.inner.config.timeouts.session_idle_expire + 1);
        }
        // Rotation reports false so the caller skips its flush.
        assert!(!f.container.inner.check_and_handle_expired_session(now));

        let new_id = f.container.session_id().unwrap();
        assert_ne!(new_id, id);
        assert!(f.container.is_enabled());
        let state = f.container.inner.state.lock();
        assert_eq!(
            state.session.as_ref().unwrap().previous_session_id,
            Some(id)
        );
    }

    #[tokio::test]
    async fn expired_session_rotation_discards_the_pending_segment() {
        let mut config = test_config();
        config.session_sample_rate = 1.0;
        let f = fixture_with(config, MockTransport::new());
        f.container.start().unwrap();
        let id = f.container.session_id().unwrap();

        f.recorder.emit(snapshot_event(), true);
        f.recorder.emit(incremental_event(), false);
        settle().await;

        let now = now_ms();
        {
            let mut state = f.container.inner.state.lock();
            let session = state.session.as_mut().unwrap();
            session.started_at = now - (f.container.inner.config.timeouts.max_session_life + 1);
            session.last_activity = now;
        }
        f.container.flush().await;

        // Nothing from the old session ships under the new id.
        assert!(f.transport.sent().is_empty());
        assert_ne!(f.container.session_id().unwrap(), id);
        assert!(f.container.is_enabled());
        {
            let state = f.container.inner.state.lock();
            assert!(!state.buffer.as_ref().unwrap().has_events());
        }
        // The new session gets a fresh base snapshot.
        assert_eq!(f.recorder.snapshots.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn buffer_mode_does_not_pause_when_idle() {
        let f = fixture();
        f.container.start_buffering().unwrap();

        let now = now_ms();
        {
            let mut state = f.container.inner.state.lock();
            state.session.as_mut().unwrap().last_activity =
                now - (f.container.inner.config.timeouts.session_idle_pause + 1);
        }
        assert!(f.container.inner.check_and_handle_expired_session(now));
        assert!(!f.container.is_paused());
        assert_eq!(f.container.recording_mode(), Some(RecordingMode::Buffer));
    }

    #[tokio::test]
    async fn expired_non_refreshable_session_stops_the_replay() {
        let f = fixture();
        f.container.start().unwrap();

        let now = now_ms();
        {
            let mut state = f.container.inner.state.lock();
            let session = state.session.as_mut().unwrap();
            session.should_refresh = false;
            session.last_activity =
                now - (f.container.inner.config.timeouts.session_idle_expire + 1);
        }
        assert!(!f.container.inner.check_and_handle_expired_session(now));
        assert!(!f.container.is_enabled());
        assert!(f.store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn user_activity_resumes_a_paused_recording() {
        let f = fixture();
        f.container.start().unwrap();
        f.container.pause();
        assert!(f.container.is_paused());
        let starts_before = f.recorder.starts.load(Ordering::SeqCst);

        f.container.trigger_user_activity(ActivitySource::Click);
        assert!(!f.container.is_paused());
        assert_eq!(f.recorder.starts.load(Ordering::SeqCst), starts_before + 1);
    }

    #[tokio::test]
    async fn tagged_error_promotes_a_buffered_replay() {
        let f = fixture();
        f.container.start_buffering().unwrap();
        let replay_id = f.container.session_id().unwrap();
        assert_eq!(
            f.recorder.last_options.lock().as_ref().unwrap().checkout_every_ms,
            Some(BUFFER_CHECKOUT_TIME)
        );

        f.recorder.emit(snapshot_event(), true);
        f.recorder.emit(incremental_event(), false);
        settle().await;

        let event = SdkEvent::Error {
            event_id: "err-1".into(),
            replay_tag: Some(replay_id.clone()),
        };
        f.container.after_send_event(&event, Some(200)).await;

        let sent = f.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event.replay_type, "buffer");
        assert_eq!(sent[0].event.error_ids, vec!["err-1".to_string()]);

        assert_eq!(f.container.recording_mode(), Some(RecordingMode::Session));
        let persisted = f.store.load().unwrap().unwrap();
        assert!(!persisted.should_refresh);
        // Session mode records without a checkout interval.
        assert_eq!(
            f.recorder.last_options.lock().as_ref().unwrap().checkout_every_ms,
            None
        );
    }

    #[tokio::test]
    async fn untagged_error_collects_id_without_promoting() {
        let f = fixture();
        f.container.start_buffering().unwrap();

        let event = SdkEvent::Error {
            event_id: "err-2".into(),
            replay_tag: None,
        };
        f.container.after_send_event(&event, Some(200)).await;

        assert!(f.transport.sent().is_empty());
        assert_eq!(f.container.recording_mode(), Some(RecordingMode::Buffer));
        let state = f.container.inner.state.lock();
        assert!(state.context.error_ids.contains("err-2"));
    }

    #[tokio::test]
    async fn flush_buffer_promotes_without_an_error() {
        let f = fixture();
        f.container.start_buffering().unwrap();
        f.recorder.emit(snapshot_event(), true);
        settle().await;

        f.container.flush_buffer().await;
        assert_eq!(f.transport.sent().len(), 1);
        assert_eq!(f.container.recording_mode(), Some(RecordingMode::Session));

        // No-op once already promoted.
        f.container.flush_buffer().await;
        assert_eq!(f.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn buffer_mode_stop_discards_everything() {
        let f = fixture();
        f.container.start_buffering().unwrap();
        f.recorder.emit(snapshot_event(), true);
        settle().await;

        f.container.stop("test teardown").await;
        assert!(f.transport.sent().is_empty());
        assert!(!f.container.is_enabled());
        assert!(f.store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn session_mode_stop_flushes_first() {
        let f = fixture();
        f.container.start().unwrap();
        f.recorder.emit(snapshot_event(), true);
        settle().await;

        f.container.stop("test teardown").await;
        assert_eq!(f.transport.sent().len(), 1);
        assert!(!f.container.is_enabled());
        // A second stop is a no-op.
        f.container.stop("again").await;
        assert_eq!(f.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn checkout_trims_the_rolling_window() {
        let f = fixture();
        f.container.start_buffering().unwrap();

        f.recorder.emit(incremental_event(), false);
        settle().await;
        let first_checkout = snapshot_event();
        let window_start = first_checkout.timestamp;
        f.recorder.emit(first_checkout, true);
        settle().await;

        let state_check = {
            let state = f.container.inner.state.lock();
            (
                state.context.initial_timestamp_ms,
                state.buffer.as_ref().unwrap().clone(),
            )
        };
        assert_eq!(state_check.0, sec_to_ms(window_start));
        // Only the checkout survived the trim.
        assert_eq!(state_check.1.earliest_timestamp(), Some(window_start));
    }

    #[tokio::test]
    async fn stale_events_are_dropped() {
        let f = fixture();
        f.container.start().unwrap();

        f.container
            .add_event(RecordingEvent::breadcrumb("ui.click", 1.0, None))
            .await;
        let state = f.container.inner.state.lock();
        assert!(!state.buffer.as_ref().unwrap().has_events());
    }

    #[tokio::test]
    async fn throttled_events_emit_one_marker_breadcrumb() {
        let f = fixture();
        f.container.start().unwrap();

        let now_sec = ms_to_sec(now_ms());
        for _ in 0..(handlers::THROTTLE_LIMIT + 5) {
            f.container
                .add_event(RecordingEvent::breadcrumb("ui.click", now_sec, None))
                .await;
        }
        f.container.flush().await;

        let sent = f.transport.sent();
        assert_eq!(sent.len(), 1);
        let events: Vec<serde_json::Value> =
            serde_json::from_slice(sent[0].recording.as_bytes()).unwrap();
        // The accepted events plus exactly one throttle marker.
        assert_eq!(events.len(), handlers::THROTTLE_LIMIT + 1);
        let markers = events
            .iter()
            .filter(|e| e["data"]["payload"]["category"] == "replay.throttled")
            .count();
        assert_eq!(markers, 1);
    }

    #[tokio::test]
    async fn initialize_sampling_is_a_noop_without_rates() {
        let f = fixture();
        f.container.initialize_sampling().unwrap();
        assert!(!f.container.is_enabled());
    }

    #[tokio::test]
    async fn initialize_sampling_starts_session_mode() {
        let mut config = test_config();
        config.session_sample_rate = 1.0;
        let f = fixture_with(config, MockTransport::new());
        f.container.initialize_sampling().unwrap();
        assert!(f.container.is_enabled());
        assert_eq!(f.container.recording_mode(), Some(RecordingMode::Session));
    }

    #[tokio::test]
    async fn initialize_sampling_falls_back_to_buffer_mode() {
        let mut config = test_config();
        config.error_sample_rate = 1.0;
        let f = fixture_with(config, MockTransport::new());
        f.container.initialize_sampling().unwrap();
        assert!(f.container.is_enabled());
        assert_eq!(f.container.recording_mode(), Some(RecordingMode::Buffer));
    }

    #[tokio::test]
    async fn hidden_tab_flushes_session_mode() {
        let f = fixture();
        f.container.start().unwrap();
        f.recorder.emit(snapshot_event(), true);
        settle().await;

        f.container.handle_visibility_change(false).await;
        assert_eq!(f.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn hidden_tab_does_not_flush_buffer_mode() {
        let f = fixture();
        f.container.start_buffering().unwrap();
        f.recorder.emit(snapshot_event(), true);
        settle().await;

        f.container.handle_visibility_change(false).await;
        assert!(f.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn blur_breadcrumbs_and_flushes_session_mode() {
        let f = fixture();
        f.container.start().unwrap();
        f.recorder.emit(snapshot_event(), true);
        settle().await;

        f.container.handle_blur().await;

        let sent = f.transport.sent();
        assert_eq!(sent.len(), 1);
        let events: Vec<serde_json::Value> =
            serde_json::from_slice(sent[0].recording.as_bytes()).unwrap();
        assert!(events
            .iter()
            .any(|e| e["data"]["payload"]["category"] == "ui.blur"));
    }

    #[tokio::test]
    async fn blur_does_not_flush_buffer_mode() {
        let f = fixture();
        f.container.start_buffering().unwrap();
        f.recorder.emit(snapshot_event(), true);
        settle().await;

        f.container.handle_blur().await;
        assert!(f.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn navigation_joins_the_segment_context() {
        let f = fixture();
        f.container.start().unwrap();
        f.container.handle_navigation("https://example.com/settings");
        f.recorder.emit(snapshot_event(), true);
        settle().await;
        f.container.flush().await;

        let sent = f.transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0]
            .event
            .urls
            .contains(&"https://example.com/settings".to_string()));
    }

    #[tokio::test]
    async fn mutation_burst_forces_a_snapshot() {
        let mut config = test_config();
        config.experiments.mutation_limit = 100;
        config.experiments.mutation_breadcrumb_limit = 50;
        let f = fixture_with(config, MockTransport::new());
        f.container.start().unwrap();

        assert!(f.container.on_mutation(10).await);
        assert!(f.container.on_mutation(60).await);
        assert_eq!(f.recorder.snapshots.load(Ordering::SeqCst), 0);

        assert!(!f.container.on_mutation(200).await);
        assert_eq!(f.recorder.snapshots.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn min_duration_guard_defers_the_first_segment() {
        let mut config = test_config();
        config.min_replay_duration = crate::config::MIN_REPLAY_DURATION;
        let f = fixture_with(config, MockTransport::new());
        f.container.start().unwrap();
        f.recorder.emit(snapshot_event(), true);
        settle().await;

        // The recording just started, so it is shorter than the floor.
        f.container.flush().await;
        assert!(f.transport.sent().is_empty());
        assert!(f.container.is_enabled());
    }

    #[tokio::test]
    async fn performance_entries_join_the_next_segment() {
        let f = fixture();
        f.container.start().unwrap();
        f.recorder.emit(snapshot_event(), true);
        settle().await;

        let now = now_ms() as f64;
        f.container.add_performance_entries(vec![
            PerformanceEntry::Memory {
                at_ms: now,
                used_heap: 1_000,
                total_heap: 2_000,
            },
        ]);
        f.container.flush().await;

        let sent = f.transport.sent();
        assert_eq!(sent.len(), 1);
        let events: Vec<serde_json::Value> =
            serde_json::from_slice(sent[0].recording.as_bytes()).unwrap();
        let memory = events
            .iter()
            .find(|e| e["data"]["payload"]["op"] == "memory")
            .expect("memory span present");
        assert_eq!(
            memory["data"]["payload"]["data"]["memory"]["usedJSHeapSize"],
            1_000
        );
    }
}
