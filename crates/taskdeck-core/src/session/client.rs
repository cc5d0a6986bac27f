//! Drives the chat, execute and summarize streams for one session.
//!
//! `SessionClient` owns one transport per stream kind, routes their signals
//! through the reducer, performs the effects the reducer requests, and
//! forwards display updates over a channel. Driving is cooperative: all
//! state mutation happens between awaits on one task.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::api::ApiClient;
use crate::api::types::SessionStatus;
use crate::interrupt::{self, InterruptedError};
use crate::session::busy::BusyLedger;
use crate::session::events::{ChatEvent, ExecutionEvent};
use crate::session::state::{SessionEffect, SessionState, StreamKind};
use crate::session::updates::SessionUpdate;
use crate::stream::{StreamSignal, StreamTransport};

/// How often the execute stream's liveness heartbeat is posted. The server
/// pauses the run when it misses three in a row.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

pub struct SessionClient {
    api: ApiClient,
    busy: BusyLedger,
    state: SessionState,
    chat: StreamTransport<ChatEvent>,
    execute: StreamTransport<ExecutionEvent>,
    summarize: StreamTransport<ExecutionEvent>,
    updates: mpsc::Sender<SessionUpdate>,
}

impl SessionClient {
    /// Loads a session, seeds its timeline from persisted history, and
    /// derives busy flags from the current session list.
    pub async fn load(
        api: ApiClient,
        session_id: &str,
        updates: mpsc::Sender<SessionUpdate>,
    ) -> Result<Self> {
        let detail = api
            .get_session(session_id)
            .await
            .context("Failed to load session")?;
        let logs = match detail.session.status {
            SessionStatus::Executing | SessionStatus::Paused | SessionStatus::Completed => Some(
                api.execution_logs(session_id, None, None)
                    .await
                    .context("Failed to load execution history")?
                    .logs,
            ),
            SessionStatus::Planning => None,
        };
        let state = SessionState::from_detail(detail, logs.as_deref());

        let sessions = api
            .list_sessions(None, None, None)
            .await
            .context("Failed to load session list")?;
        let mut busy = BusyLedger::new();
        busy.reconcile(&sessions.sessions);

        let chat = StreamTransport::new(api.http().clone());
        let execute = StreamTransport::new(api.http().clone());
        let summarize = StreamTransport::new(api.http().clone());

        Ok(SessionClient {
            api,
            busy,
            state,
            chat,
            execute,
            summarize,
            updates,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn busy(&self) -> &BusyLedger {
        &self.busy
    }

    /// Runs one conversational turn to completion.
    pub async fn chat(&mut self, message: &str) -> Result<()> {
        let session_id = self.state.session.id.clone();
        if !self.state.can_chat() {
            anyhow::bail!("Session is already completed");
        }
        if let Some(other) = self.busy.other_busy(&session_id) {
            anyhow::bail!("Another session is busy: {other}");
        }
        // A run left in flight by another client also holds the lock; only
        // execute may take it over, via claim.
        if self.busy.is_busy(&session_id) {
            anyhow::bail!("Session is busy: {session_id}");
        }

        let request = self.api.chat_request(&session_id, message)?;
        self.state.push_user_message(message);
        self.busy.set_busy(&session_id, true);
        self.chat.connect(request).await;
        let result = self.drive_chat().await;
        self.busy.set_busy(&session_id, false);
        result
    }

    /// Runs the session's tasks to completion, then summarizes.
    ///
    /// The busy flag is held from here until the summarize stream finishes,
    /// so nothing else can start mid-handoff.
    pub async fn execute(&mut self) -> Result<()> {
        let session_id = self.state.session.id.clone();
        self.state
            .check_can_execute()
            .map_err(|message| anyhow::anyhow!(message))?;
        if let Some(other) = self.busy.other_busy(&session_id) {
            anyhow::bail!("Another session is busy: {other}");
        }

        if self.state.session.status == SessionStatus::Executing {
            // The server still counts an earlier client as connected; claim
            // the run so our stream supersedes it.
            let claim = self.api.claim_execution(&session_id).await?;
            tracing::info!(
                claimed = claim.claimed,
                status = %claim.status,
                "Claimed running execution"
            );
            if let Ok(status) = claim.status.parse::<SessionStatus>() {
                self.state.session.status = status;
            }
        }

        let request = self.api.execute_request(&session_id)?;
        self.busy.set_busy(&session_id, true);
        self.execute.connect(request).await;
        let start_summarize = match self.drive_execute().await {
            Ok(flag) => flag,
            Err(err) => {
                self.busy.set_busy(&session_id, false);
                return Err(err);
            }
        };

        let result = if start_summarize {
            self.run_summarize().await
        } else {
            Ok(())
        };
        // A stream that closed without its terminal event must not leave
        // the lock held.
        self.busy.set_busy(&session_id, false);
        result
    }

    /// Runs the summarize stream on its own.
    pub async fn summarize(&mut self) -> Result<()> {
        let session_id = self.state.session.id.clone();
        if let Some(other) = self.busy.other_busy(&session_id) {
            anyhow::bail!("Another session is busy: {other}");
        }
        if self.busy.is_busy(&session_id) {
            anyhow::bail!("Session is busy: {session_id}");
        }
        self.busy.set_busy(&session_id, true);
        let result = self.run_summarize().await;
        self.busy.set_busy(&session_id, false);
        result
    }

    async fn run_summarize(&mut self) -> Result<()> {
        let request = self.api.summarize_request(&self.state.session.id)?;
        self.summarize.connect(request).await;
        self.drive_summarize().await
    }

    async fn drive_chat(&mut self) -> Result<()> {
        let session_id = self.state.session.id.clone();
        let mut server_error: Option<String> = None;
        loop {
            tokio::select! {
                biased;
                () = interrupt::wait_for_interrupt() => {
                    self.chat.disconnect();
                    let _ = self.chat.next_signal().await;
                    let _ = self.updates.send(SessionUpdate::Interrupted).await;
                    return Err(InterruptedError.into());
                }
                signal = self.chat.next_signal() => {
                    let Some(signal) = signal else { break };
                    match signal {
                        StreamSignal::Open => {
                            let _ = self
                                .updates
                                .send(SessionUpdate::StreamOpened { kind: StreamKind::Chat })
                                .await;
                        }
                        StreamSignal::Message(event) => {
                            match &event {
                                ChatEvent::Content { content } => {
                                    let _ = self
                                        .updates
                                        .send(SessionUpdate::ChatDelta { text: content.clone() })
                                        .await;
                                }
                                ChatEvent::TasksExtracting => {
                                    let _ =
                                        self.updates.send(SessionUpdate::TasksExtracting).await;
                                }
                                ChatEvent::TasksUpdated { tasks } => {
                                    let _ = self
                                        .updates
                                        .send(SessionUpdate::TasksReplaced {
                                            tasks: tasks.clone(),
                                        })
                                        .await;
                                }
                                ChatEvent::Error { error } => {
                                    server_error = Some(error.clone());
                                }
                                _ => {}
                            }
                            for effect in self.state.apply_chat(event) {
                                match effect {
                                    SessionEffect::SetBusy(busy) => {
                                        self.busy.set_busy(&session_id, busy);
                                    }
                                    SessionEffect::RefreshTitle => self.refresh_title().await,
                                    _ => {}
                                }
                            }
                        }
                        StreamSignal::Error(err) => {
                            for effect in self.state.apply_stream_error(StreamKind::Chat) {
                                if let SessionEffect::SetBusy(busy) = effect {
                                    self.busy.set_busy(&session_id, busy);
                                }
                            }
                            let _ = self
                                .updates
                                .send(SessionUpdate::StreamFailed {
                                    kind: StreamKind::Chat,
                                    message: err.to_string(),
                                })
                                .await;
                            return Err(err.into());
                        }
                        StreamSignal::Closed => {
                            let _ = self
                                .updates
                                .send(SessionUpdate::StreamClosed { kind: StreamKind::Chat })
                                .await;
                            break;
                        }
                    }
                }
            }
        }
        match server_error {
            Some(message) => Err(anyhow::anyhow!(message)),
            None => Ok(()),
        }
    }

    /// Drives the execute stream. Returns whether a summarize stream should
    /// follow.
    async fn drive_execute(&mut self) -> Result<bool> {
        let session_id = self.state.session.id.clone();
        let mut heartbeat: Option<tokio::time::Interval> = None;
        let mut fatal: Option<String> = None;
        let mut start_summarize = false;
        loop {
            tokio::select! {
                biased;
                () = interrupt::wait_for_interrupt() => {
                    // Dropping the stream tells the server we are gone; it
                    // pauses the run on its side.
                    self.execute.disconnect();
                    let _ = self.execute.next_signal().await;
                    let _ = self.updates.send(SessionUpdate::Interrupted).await;
                    return Err(InterruptedError.into());
                }
                () = next_tick(heartbeat.as_mut()) => {
                    if let Some(connection_id) = self.state.connection_id.clone() {
                        let result =
                            self.api.execution_heartbeat(&session_id, &connection_id).await;
                        if !heartbeat_keeps_running(&result) {
                            heartbeat = None;
                        }
                    }
                }
                signal = self.execute.next_signal() => {
                    let Some(signal) = signal else { break };
                    match signal {
                        StreamSignal::Open => {
                            let _ = self
                                .updates
                                .send(SessionUpdate::StreamOpened {
                                    kind: StreamKind::Execution,
                                })
                                .await;
                        }
                        StreamSignal::Message(event) => {
                            if let ExecutionEvent::Error { task_id: None, error } = &event {
                                fatal = Some(error.clone());
                            }
                            let seen = self.state.timeline.len();
                            let effects = self.state.apply_execution(event);
                            for entry in &self.state.timeline[seen..] {
                                let _ = self
                                    .updates
                                    .send(SessionUpdate::EntryAppended {
                                        entry: entry.clone(),
                                    })
                                    .await;
                            }
                            for effect in effects {
                                match effect {
                                    SessionEffect::SetBusy(busy) => {
                                        self.busy.set_busy(&session_id, busy);
                                    }
                                    SessionEffect::StartHeartbeat { .. } => {
                                        let mut interval =
                                            tokio::time::interval(HEARTBEAT_INTERVAL);
                                        interval
                                            .set_missed_tick_behavior(MissedTickBehavior::Delay);
                                        heartbeat = Some(interval);
                                    }
                                    SessionEffect::StopHeartbeat => heartbeat = None,
                                    SessionEffect::StartSummarize => start_summarize = true,
                                    SessionEffect::RefreshTitle => {}
                                }
                            }
                        }
                        StreamSignal::Error(err) => {
                            for effect in self.state.apply_stream_error(StreamKind::Execution) {
                                if let SessionEffect::SetBusy(busy) = effect {
                                    self.busy.set_busy(&session_id, busy);
                                }
                            }
                            let _ = self
                                .updates
                                .send(SessionUpdate::StreamFailed {
                                    kind: StreamKind::Execution,
                                    message: err.to_string(),
                                })
                                .await;
                            return Err(err.into());
                        }
                        StreamSignal::Closed => {
                            let _ = self
                                .updates
                                .send(SessionUpdate::StreamClosed {
                                    kind: StreamKind::Execution,
                                })
                                .await;
                            break;
                        }
                    }
                }
            }
        }
        match fatal {
            Some(message) => Err(anyhow::anyhow!(message)),
            None => Ok(start_summarize),
        }
    }

    async fn drive_summarize(&mut self) -> Result<()> {
        let session_id = self.state.session.id.clone();
        let mut server_error: Option<String> = None;
        loop {
            tokio::select! {
                biased;
                () = interrupt::wait_for_interrupt() => {
                    self.summarize.disconnect();
                    let _ = self.summarize.next_signal().await;
                    let _ = self.updates.send(SessionUpdate::Interrupted).await;
                    return Err(InterruptedError.into());
                }
                signal = self.summarize.next_signal() => {
                    let Some(signal) = signal else { break };
                    match signal {
                        StreamSignal::Open => {
                            let _ = self
                                .updates
                                .send(SessionUpdate::StreamOpened {
                                    kind: StreamKind::Summarize,
                                })
                                .await;
                        }
                        StreamSignal::Message(event) => {
                            match &event {
                                ExecutionEvent::Content { content, .. } => {
                                    let _ = self
                                        .updates
                                        .send(SessionUpdate::SummaryDelta {
                                            text: content.clone(),
                                        })
                                        .await;
                                }
                                ExecutionEvent::Error { error, .. } => {
                                    server_error = Some(error.clone());
                                }
                                _ => {}
                            }
                            let seen = self.state.artifacts.len();
                            for effect in self.state.apply_summarize(event) {
                                if let SessionEffect::SetBusy(busy) = effect {
                                    self.busy.set_busy(&session_id, busy);
                                }
                            }
                            for artifact in &self.state.artifacts[seen..] {
                                let _ = self
                                    .updates
                                    .send(SessionUpdate::ArtifactCreated {
                                        artifact: artifact.clone(),
                                    })
                                    .await;
                            }
                        }
                        StreamSignal::Error(err) => {
                            for effect in self.state.apply_stream_error(StreamKind::Summarize) {
                                if let SessionEffect::SetBusy(busy) = effect {
                                    self.busy.set_busy(&session_id, busy);
                                }
                            }
                            let _ = self
                                .updates
                                .send(SessionUpdate::StreamFailed {
                                    kind: StreamKind::Summarize,
                                    message: err.to_string(),
                                })
                                .await;
                            return Err(err.into());
                        }
                        StreamSignal::Closed => {
                            let _ = self
                                .updates
                                .send(SessionUpdate::StreamClosed {
                                    kind: StreamKind::Summarize,
                                })
                                .await;
                            break;
                        }
                    }
                }
            }
        }
        match server_error {
            Some(message) => Err(anyhow::anyhow!(message)),
            None => Ok(()),
        }
    }

    async fn refresh_title(&mut self) {
        match self.api.get_session(&self.state.session.id).await {
            Ok(detail) if detail.session.title != self.state.session.title => {
                self.state.session.title = detail.session.title.clone();
                let _ = self
                    .updates
                    .send(SessionUpdate::TitleChanged {
                        title: detail.session.title,
                    })
                    .await;
            }
            Ok(_) => {}
            Err(err) => tracing::debug!(error = %err, "Title refresh failed"),
        }
    }
}

/// Resolves on the next heartbeat tick, or never when no heartbeat is due.
async fn next_tick(interval: Option<&mut tokio::time::Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Whether the heartbeat should keep posting after this response.
///
/// `active: false` means another client claimed the run and the server
/// will close this stream shortly; posting stops. A failed request is
/// transient and the heartbeat continues.
fn heartbeat_keeps_running(result: &crate::api::ApiResult<crate::api::HeartbeatResponse>) -> bool {
    match result {
        Ok(response) if !response.active => {
            tracing::info!("Heartbeat connection no longer active");
            false
        }
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(error = %err, "Heartbeat failed");
            true
        }
    }
}
