//! Video-consultation session lifecycle.
//!
//! Status only moves forward: `connecting` → `connected` → `disconnected`
//! (`connecting` → `disconnected` when the call is ended before it connects).
//! A one-shot timer connects the session after the configured delay; from
//! then on a repeating ticker adds one second per time unit. Both timers are
//! owned through `TimerGuard`s inside the session state, so ending the call or
//! dropping the session releases them.
//!
//! `CallController` scopes one session to the `video-call` view: entering the
//! view starts a session, leaving it destroys the session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::CallConfig;
use crate::models::{CallStatus, ChatMessage, Sender, View};
use crate::navigation::{Navigator, ViewLifecycle};
use crate::notify::{Notice, Notifier};
use crate::scheduler::{Scheduler, TimerGuard};

/// Zero-padded `MM:SS`. Minutes are not wrapped into hours.
pub fn format_duration(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

// ═══════════════════════════════════════════════════════════
// Read models
// ═══════════════════════════════════════════════════════════

/// Emitted once when a call ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSummary {
    pub session_id: Uuid,
    pub elapsed_seconds: u64,
    pub duration_label: String,
}

impl CallSummary {
    pub fn notice(&self) -> Notice {
        Notice::new(
            "Call Ended",
            format!("Consultation completed. Duration: {}", self.duration_label),
        )
    }
}

/// Everything a renderer needs to draw the call screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSnapshot {
    pub session_id: Uuid,
    pub remote_party: String,
    pub status: CallStatus,
    pub elapsed_seconds: u64,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub messages: Vec<ChatMessage>,
}

// ═══════════════════════════════════════════════════════════
// CallSession
// ═══════════════════════════════════════════════════════════

struct CallState {
    status: CallStatus,
    elapsed_seconds: u64,
    audio_enabled: bool,
    video_enabled: bool,
    messages: Vec<ChatMessage>,
    connect_timer: Option<TimerGuard>,
    ticker: Option<TimerGuard>,
}

type SharedState = Arc<Mutex<CallState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, CallState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One consultation attempt.
pub struct CallSession {
    id: Uuid,
    remote_party: String,
    clock: Arc<dyn Clock>,
    state: SharedState,
}

impl CallSession {
    /// Create a session in `connecting` and arm the connection timer.
    pub fn start(
        config: &CallConfig,
        scheduler: Arc<dyn Scheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let id = Uuid::new_v4();
        let state: SharedState = Arc::new(Mutex::new(CallState {
            status: CallStatus::Connecting,
            elapsed_seconds: 0,
            audio_enabled: true,
            video_enabled: true,
            messages: Vec::new(),
            connect_timer: None,
            ticker: None,
        }));

        {
            // Armed under the state lock so an immediate firing waits for the
            // guard to be stored.
            let mut s = lock(&state);
            let weak = Arc::downgrade(&state);
            let ticker_scheduler = Arc::clone(&scheduler);
            let period = config.time_unit;
            s.connect_timer = Some(TimerGuard::once(
                &scheduler,
                config.connect_delay(),
                move || {
                    if let Some(state) = weak.upgrade() {
                        establish(&state, &ticker_scheduler, period, id);
                    }
                },
            ));
        }

        tracing::info!(session = %id, remote = %config.remote_party, "Call session started");
        let session = Self {
            id,
            remote_party: config.remote_party.clone(),
            clock,
            state,
        };
        for (sender, body) in &config.opening_exchange {
            session.append(sender.clone(), body);
        }
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn remote_party(&self) -> &str {
        &self.remote_party
    }

    pub fn status(&self) -> CallStatus {
        lock(&self.state).status
    }

    /// Connected and counting.
    pub fn is_active(&self) -> bool {
        self.status() == CallStatus::Connected
    }

    pub fn elapsed_seconds(&self) -> u64 {
        lock(&self.state).elapsed_seconds
    }

    pub fn audio_enabled(&self) -> bool {
        lock(&self.state).audio_enabled
    }

    pub fn video_enabled(&self) -> bool {
        lock(&self.state).video_enabled
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.state).messages.clone()
    }

    pub fn snapshot(&self) -> CallSnapshot {
        let s = lock(&self.state);
        CallSnapshot {
            session_id: self.id,
            remote_party: self.remote_party.clone(),
            status: s.status,
            elapsed_seconds: s.elapsed_seconds,
            audio_enabled: s.audio_enabled,
            video_enabled: s.video_enabled,
            messages: s.messages.clone(),
        }
    }

    /// Flip the microphone flag; returns the new value.
    pub fn toggle_audio(&self) -> bool {
        let mut s = lock(&self.state);
        s.audio_enabled = !s.audio_enabled;
        tracing::debug!(session = %self.id, audio = s.audio_enabled, "Audio toggled");
        s.audio_enabled
    }

    /// Flip the camera flag; returns the new value.
    pub fn toggle_video(&self) -> bool {
        let mut s = lock(&self.state);
        s.video_enabled = !s.video_enabled;
        tracing::debug!(session = %self.id, video = s.video_enabled, "Video toggled");
        s.video_enabled
    }

    /// Append a message from the local participant. Blank bodies are ignored.
    pub fn send_message(&self, body: &str) -> Option<ChatMessage> {
        self.append(Sender::Me, body)
    }

    /// Append a message from the remote party. Blank bodies are ignored.
    pub fn receive_message(&self, body: &str) -> Option<ChatMessage> {
        self.append(Sender::Remote(self.remote_party.clone()), body)
    }

    fn append(&self, sender: Sender, body: &str) -> Option<ChatMessage> {
        if body.trim().is_empty() {
            return None;
        }
        let sent_at = self.clock.time_label();
        let mut s = lock(&self.state);
        let message = ChatMessage {
            seq: s.messages.len() as u64 + 1,
            sender,
            body: body.to_string(),
            sent_at,
        };
        s.messages.push(message.clone());
        tracing::debug!(
            session = %self.id,
            seq = message.seq,
            from = message.sender.display_name(),
            "Chat message appended"
        );
        Some(message)
    }

    /// Hang up. Freezes the elapsed counter and releases both timers.
    /// Returns `None` if the session had already ended.
    pub fn end(&self) -> Option<CallSummary> {
        let (summary, released) = {
            let mut s = lock(&self.state);
            if s.status == CallStatus::Disconnected {
                return None;
            }
            let previous = s.status;
            s.status = CallStatus::Disconnected;
            let summary = CallSummary {
                session_id: self.id,
                elapsed_seconds: s.elapsed_seconds,
                duration_label: format_duration(s.elapsed_seconds),
            };
            tracing::info!(
                session = %self.id,
                from = %previous,
                elapsed = s.elapsed_seconds,
                "Call ended"
            );
            (summary, (s.connect_timer.take(), s.ticker.take()))
        };
        drop(released);
        Some(summary)
    }
}

impl Drop for CallSession {
    fn drop(&mut self) {
        let released = {
            let mut s = lock(&self.state);
            (s.connect_timer.take(), s.ticker.take())
        };
        drop(released);
        tracing::debug!(session = %self.id, "Call session destroyed");
    }
}

/// Connection timer fired: move to `connected` and start counting.
fn establish(state: &SharedState, scheduler: &Arc<dyn Scheduler>, period: Duration, id: Uuid) {
    let (fired, ticker_id) = {
        let mut s = lock(state);
        if s.status != CallStatus::Connecting {
            return;
        }
        s.status = CallStatus::Connected;

        let weak = Arc::downgrade(state);
        let ticker = TimerGuard::repeating(scheduler, period, move || {
            if let Some(state) = weak.upgrade() {
                let mut s = lock(&state);
                if s.status == CallStatus::Connected {
                    s.elapsed_seconds += 1;
                    tracing::trace!(session = %id, elapsed = s.elapsed_seconds, "Call tick");
                }
            }
        });
        let ticker_id = ticker.id();
        s.ticker = Some(ticker);
        (s.connect_timer.take(), ticker_id)
    };
    drop(fired);
    tracing::info!(session = %id, ticker = %ticker_id, "Call connected");
}

// ═══════════════════════════════════════════════════════════
// CallController
// ═══════════════════════════════════════════════════════════

/// Owns the session of the `video-call` view.
pub struct CallController {
    navigator: Arc<Navigator>,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    config: CallConfig,
    session: Mutex<Option<CallSession>>,
}

impl CallController {
    pub fn new(
        navigator: Arc<Navigator>,
        scheduler: Arc<dyn Scheduler>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        config: CallConfig,
    ) -> Self {
        Self {
            navigator,
            scheduler,
            clock,
            notifier,
            config,
            session: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<CallSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_session<R>(&self, f: impl FnOnce(&CallSession) -> R) -> Option<R> {
        self.slot().as_ref().map(f)
    }

    pub fn config(&self) -> &CallConfig {
        &self.config
    }

    pub fn has_session(&self) -> bool {
        self.slot().is_some()
    }

    pub fn snapshot(&self) -> Option<CallSnapshot> {
        self.with_session(CallSession::snapshot)
    }

    pub fn status(&self) -> Option<CallStatus> {
        self.with_session(CallSession::status)
    }

    pub fn elapsed_seconds(&self) -> Option<u64> {
        self.with_session(CallSession::elapsed_seconds)
    }

    pub fn toggle_audio(&self) -> Option<bool> {
        self.with_session(CallSession::toggle_audio)
    }

    pub fn toggle_video(&self) -> Option<bool> {
        self.with_session(CallSession::toggle_video)
    }

    pub fn send_message(&self, body: &str) -> Option<ChatMessage> {
        self.with_session(|s| s.send_message(body)).flatten()
    }

    pub fn receive_message(&self, body: &str) -> Option<ChatMessage> {
        self.with_session(|s| s.receive_message(body)).flatten()
    }

    /// End the call, deliver its summary and return to the patient dashboard.
    pub fn end_call(&self) -> Option<CallSummary> {
        let summary = self.with_session(CallSession::end).flatten()?;
        self.notifier.deliver(&summary.notice());
        self.navigator.navigate(View::PatientDashboard);
        Some(summary)
    }

    /// Back out of the call screen without a summary.
    pub fn leave(&self) {
        self.navigator.navigate(View::PatientDashboard);
    }

    fn begin(&self) {
        let session = CallSession::start(
            &self.config,
            Arc::clone(&self.scheduler),
            Arc::clone(&self.clock),
        );
        let previous = self.slot().replace(session);
        drop(previous);
    }

    fn destroy(&self) {
        let previous = self.slot().take();
        drop(previous);
    }
}

impl ViewLifecycle for CallController {
    fn on_enter(&self) {
        self.begin();
    }

    fn on_exit(&self) {
        self.destroy();
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::notify::RecordingNotifier;
    use crate::scheduler::ManualScheduler;
    use chrono::{NaiveDate, NaiveTime};

    const UNIT: Duration = Duration::from_secs(1);

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2024, 12, 16).unwrap(),
            NaiveTime::from_hms_opt(10, 31, 0).unwrap(),
        ))
    }

    fn session() -> (Arc<ManualScheduler>, CallSession) {
        let manual = Arc::new(ManualScheduler::new());
        let session = CallSession::start(&CallConfig::default(), manual.clone(), clock());
        (manual, session)
    }

    fn units(n: u32) -> Duration {
        UNIT * n
    }

    #[test]
    fn starts_connecting_with_zero_elapsed() {
        let (_, s) = session();
        assert_eq!(s.status(), CallStatus::Connecting);
        assert_eq!(s.elapsed_seconds(), 0);
        assert!(!s.is_active());
        assert!(s.audio_enabled());
        assert!(s.video_enabled());
        assert!(s.messages().is_empty());
    }

    #[test]
    fn connects_after_delay() {
        let (clock, s) = session();
        clock.advance(units(1));
        assert_eq!(s.status(), CallStatus::Connecting);
        clock.advance(units(1));
        assert_eq!(s.status(), CallStatus::Connected);
        assert_eq!(s.elapsed_seconds(), 0);
        assert!(s.is_active());
    }

    #[test]
    fn only_connect_timer_armed_before_connection() {
        let (clock, s) = session();
        assert_eq!(clock.pending(), 1);
        clock.advance(units(2));
        // Connect timer consumed, ticker armed.
        assert_eq!(clock.pending(), 1);
        assert_eq!(s.elapsed_seconds(), 0);
    }

    #[test]
    fn elapsed_counts_one_per_unit_while_connected() {
        let (clock, s) = session();
        clock.advance(units(2));
        for expected in 1..=5 {
            clock.advance(units(1));
            assert_eq!(s.elapsed_seconds(), expected);
        }
    }

    #[test]
    fn elapsed_freezes_after_end() {
        let (clock, s) = session();
        clock.advance(units(5));
        assert_eq!(s.elapsed_seconds(), 3);

        let summary = s.end().unwrap();
        assert_eq!(summary.elapsed_seconds, 3);
        assert_eq!(summary.duration_label, "00:03");
        assert_eq!(s.status(), CallStatus::Disconnected);

        clock.advance(units(10));
        assert_eq!(s.elapsed_seconds(), 3);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn ending_while_connecting_never_connects() {
        let (clock, s) = session();
        clock.advance(units(1));
        let summary = s.end().unwrap();
        assert_eq!(summary.elapsed_seconds, 0);
        assert_eq!(clock.pending(), 0);

        clock.advance(units(10));
        assert_eq!(s.status(), CallStatus::Disconnected);
        assert_eq!(s.elapsed_seconds(), 0);
    }

    #[test]
    fn second_end_is_noop() {
        let (clock, s) = session();
        clock.advance(units(3));
        assert!(s.end().is_some());
        assert!(s.end().is_none());
        assert_eq!(s.status(), CallStatus::Disconnected);
    }

    #[test]
    fn dropping_session_releases_timers() {
        let (clock, s) = session();
        drop(s);
        assert_eq!(clock.pending(), 0);

        let (clock, s) = session();
        clock.advance(units(4));
        drop(s);
        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.advance(units(5)), 0);
    }

    #[test]
    fn opening_exchange_seeds_log() {
        let manual = Arc::new(ManualScheduler::new());
        let config = CallConfig::default()
            .with_opening_exchange("Hello! How are you feeling today?", "Some headaches lately.");
        let s = CallSession::start(&config, manual.clone(), clock());

        let log = s.messages();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].sender, Sender::Remote("Dr. Sarah Johnson".into()));
        assert_eq!(log[1].sender, Sender::Me);
        assert_eq!(s.status(), CallStatus::Connecting);

        let next = s.send_message("It started last week").unwrap();
        assert_eq!(next.seq, 3);
    }

    #[test]
    fn blank_messages_are_ignored() {
        let (_, s) = session();
        assert!(s.send_message("").is_none());
        assert!(s.send_message("   ").is_none());
        assert!(s.send_message("\n\t").is_none());
        assert!(s.messages().is_empty());
    }

    #[test]
    fn send_appends_one_message_from_me() {
        let (_, s) = session();
        let sent = s.send_message("hi").unwrap();
        let log = s.messages();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0], sent);
        assert_eq!(sent.sender, Sender::Me);
        assert_eq!(sent.body, "hi");
        assert_eq!(sent.sent_at, "10:31 AM");
    }

    #[test]
    fn log_keeps_conversation_order() {
        let (clock, s) = session();
        s.receive_message("Hello! How are you feeling today?");
        s.send_message("I've been having some headaches lately.");
        clock.advance(units(3));
        s.end();
        s.send_message("Thanks, doctor");

        let log = s.messages();
        let seqs: Vec<_> = log.iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(log[0].sender, Sender::Remote("Dr. Sarah Johnson".into()));
        assert!(log[1].sender.is_me());
        assert_eq!(log[2].body, "Thanks, doctor");
    }

    #[test]
    fn toggles_are_independent_of_status() {
        let (clock, s) = session();
        for advance in [0, 2, 3] {
            clock.advance(units(advance));
            let audio = s.audio_enabled();
            s.toggle_audio();
            s.toggle_audio();
            assert_eq!(s.audio_enabled(), audio);
        }
        s.end();
        let status = s.status();
        assert!(!s.toggle_video());
        assert!(!s.toggle_audio());
        assert!(s.toggle_audio());
        assert_eq!(s.status(), status);
    }

    #[test]
    fn snapshot_serializes_status_tag() {
        let (clock, s) = session();
        clock.advance(units(3));
        let json = serde_json::to_value(s.snapshot()).unwrap();
        assert_eq!(json["status"], "connected");
        assert_eq!(json["elapsed_seconds"], 1);
        assert_eq!(json["remote_party"], "Dr. Sarah Johnson");
    }

    #[test]
    fn format_duration_pads() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(65), "01:05");
        assert_eq!(format_duration(3600), "60:00");
    }

    // ── Controller ──────────────────────────────────────────

    struct Fixture {
        nav: Arc<Navigator>,
        clock: Arc<ManualScheduler>,
        call: Arc<CallController>,
        notices: Arc<RecordingNotifier>,
    }

    fn fixture() -> Fixture {
        let nav = Arc::new(Navigator::new());
        let manual = Arc::new(ManualScheduler::new());
        let notices = Arc::new(RecordingNotifier::new());
        let call = Arc::new(CallController::new(
            Arc::clone(&nav),
            manual.clone(),
            clock(),
            notices.clone(),
            CallConfig::default(),
        ));
        nav.attach(View::VideoCall, &call);
        Fixture {
            nav,
            clock: manual,
            call,
            notices,
        }
    }

    #[test]
    fn no_session_outside_call_view() {
        let f = fixture();
        assert!(!f.call.has_session());
        assert!(f.call.toggle_audio().is_none());
        assert!(f.call.send_message("hi").is_none());
        assert!(f.call.end_call().is_none());
        assert_eq!(f.nav.current_view(), View::Home);
    }

    #[test]
    fn entering_view_starts_session() {
        let f = fixture();
        f.nav.navigate(View::VideoCall);
        assert_eq!(f.call.status(), Some(CallStatus::Connecting));
        f.clock.advance(units(2));
        assert_eq!(f.call.status(), Some(CallStatus::Connected));
    }

    #[test]
    fn end_call_notifies_and_returns_to_dashboard() {
        let f = fixture();
        f.nav.navigate(View::VideoCall);
        f.clock.advance(units(2 + 125));

        let summary = f.call.end_call().unwrap();
        assert_eq!(summary.elapsed_seconds, 125);
        assert_eq!(f.nav.current_view(), View::PatientDashboard);
        assert!(!f.call.has_session());
        assert_eq!(f.clock.pending(), 0);

        let notice = f.notices.last().unwrap();
        assert_eq!(notice.title, "Call Ended");
        assert_eq!(notice.body, "Consultation completed. Duration: 02:05");
    }

    #[test]
    fn navigating_away_mid_call_releases_ticker() {
        let f = fixture();
        f.nav.navigate(View::VideoCall);
        f.clock.advance(units(4));
        assert_eq!(f.clock.pending(), 1);

        f.nav.navigate(View::DoctorDashboard);
        assert!(!f.call.has_session());
        assert_eq!(f.clock.pending(), 0);
        assert!(f.notices.notices().is_empty());
    }

    #[test]
    fn leaving_before_connection_cancels_connect_timer() {
        let f = fixture();
        f.nav.navigate(View::VideoCall);
        f.call.leave();
        assert_eq!(f.nav.current_view(), View::PatientDashboard);
        assert_eq!(f.clock.pending(), 0);
        assert_eq!(f.clock.advance(units(5)), 0);
    }

    #[test]
    fn reentering_creates_fresh_session() {
        let f = fixture();
        f.nav.navigate(View::VideoCall);
        f.clock.advance(units(5));
        f.call.send_message("hello");
        let first = f.call.snapshot().unwrap();

        f.call.leave();
        f.nav.navigate(View::VideoCall);
        let second = f.call.snapshot().unwrap();
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(second.status, CallStatus::Connecting);
        assert_eq!(second.elapsed_seconds, 0);
        assert!(second.messages.is_empty());
        assert!(second.audio_enabled);
    }

    #[test]
    fn controller_toggles_and_messages_reach_session() {
        let f = fixture();
        f.nav.navigate(View::VideoCall);
        assert_eq!(f.call.toggle_video(), Some(false));
        assert!(f.call.send_message("  ").is_none());
        assert!(f.call.receive_message("How are you?").is_some());
        let snap = f.call.snapshot().unwrap();
        assert!(!snap.video_enabled);
        assert_eq!(snap.messages.len(), 1);
    }
}
