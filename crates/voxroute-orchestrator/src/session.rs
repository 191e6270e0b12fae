//! Voice session: drives a [`VoicePipeline`] from speech-to-text events.
//!
//! The pipeline runs on its own task behind a channel of capacity one, so
//! each command is processed to completion before the next is accepted.
//! `End` cancels whatever dispatch is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use voxroute_models::{AgentId, BreadcrumbEntry, ConfirmationRequest, VoiceCommand};

use crate::controls::RoutingControls;
use crate::error::{OrchestratorError, Result};
use crate::pipeline::{PipelineResponse, VoicePipeline};

/// Event from a speech-to-text provider.
#[derive(Debug, Clone, PartialEq)]
pub enum SttEvent {
    Start,
    Result {
        transcript: String,
        confidence: f32,
        is_final: bool,
    },
    Error {
        code: String,
    },
    End,
}

/// Point-in-time view of the pipeline task.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub trail: Vec<BreadcrumbEntry>,
    pub summary: String,
    pub pending: Option<ConfirmationRequest>,
}

enum Request {
    Command(VoiceCommand, oneshot::Sender<Result<PipelineResponse>>),
    Confirm(oneshot::Sender<Result<PipelineResponse>>),
    Decline(oneshot::Sender<Result<PipelineResponse>>),
    AcceptSuggestion(oneshot::Sender<Result<AgentId>>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

/// Handle to a running pipeline task.
pub struct VoiceSession {
    requests: mpsc::Sender<Request>,
    cancel: Arc<watch::Sender<bool>>,
    shutdown: watch::Sender<bool>,
    controls: RoutingControls,
    listening: AtomicBool,
    task: JoinHandle<()>,
}

impl VoiceSession {
    /// Moves the pipeline onto a new task.
    pub fn spawn(pipeline: VoicePipeline) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let cancel = Arc::new(cancel_tx);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (requests, rx) = mpsc::channel(1);
        let controls = pipeline.controls().clone();

        let pipeline = pipeline.with_cancel(cancel_rx);
        let task = tokio::spawn(run(pipeline, rx, Arc::clone(&cancel), shutdown_rx));

        Self {
            requests,
            cancel,
            shutdown,
            controls,
            listening: AtomicBool::new(false),
            task,
        }
    }

    pub fn controls(&self) -> &RoutingControls {
        &self.controls
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Applies one STT event. Only final results produce a response.
    pub async fn on_event(&self, event: SttEvent) -> Result<Option<PipelineResponse>> {
        match event {
            SttEvent::Start => {
                let prefs = self.controls.snapshot();
                self.listening.store(true, Ordering::SeqCst);
                self.cancel.send_replace(false);
                info!(
                    mode = %prefs.mode,
                    pinned_agent = prefs.pinned_agent.as_ref().map(|a| a.as_str()),
                    "listening_started"
                );
                Ok(None)
            }
            SttEvent::Result {
                transcript,
                confidence,
                is_final,
            } => {
                if !is_final {
                    debug!(chars = transcript.len(), "interim transcript ignored");
                    return Ok(None);
                }
                let command = VoiceCommand::new(transcript, confidence);
                if command.is_blank() {
                    debug!(command_id = %command.id, "blank transcript ignored");
                    return Ok(None);
                }
                self.submit(command).await.map(Some)
            }
            SttEvent::Error { code } => {
                info!(code = %code, "recognition error");
                Err(OrchestratorError::Recognition { code })
            }
            SttEvent::End => {
                self.listening.store(false, Ordering::SeqCst);
                self.cancel.send_replace(true);
                info!("listening_stopped");
                Ok(None)
            }
        }
    }

    /// Routes a command and waits for its outcome.
    pub async fn submit(&self, command: VoiceCommand) -> Result<PipelineResponse> {
        self.call(|tx| Request::Command(command, tx)).await?
    }

    pub async fn confirm(&self) -> Result<PipelineResponse> {
        self.call(Request::Confirm).await?
    }

    pub async fn decline(&self) -> Result<PipelineResponse> {
        self.call(Request::Decline).await?
    }

    pub async fn accept_suggestion(&self) -> Result<AgentId> {
        self.call(Request::AcceptSuggestion).await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.call(Request::Snapshot).await
    }

    /// Stops the pipeline task after the current command.
    pub async fn shutdown(self) {
        self.cancel.send_replace(true);
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }

    async fn call<T, F>(&self, request: F) -> Result<T>
    where
        F: FnOnce(oneshot::Sender<T>) -> Request,
    {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(request(tx))
            .await
            .map_err(|_| OrchestratorError::SessionClosed)?;
        rx.await.map_err(|_| OrchestratorError::SessionClosed)
    }
}

async fn run(
    mut pipeline: VoicePipeline,
    mut requests: mpsc::Receiver<Request>,
    cancel: Arc<watch::Sender<bool>>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(session_id = %pipeline.session_id(), "voice session started");

    loop {
        let request = tokio::select! {
            _ = shutdown.changed() => break,
            request = requests.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        match request {
            Request::Command(command, reply) => {
                // A command queued after End still runs.
                cancel.send_replace(false);
                let _ = reply.send(pipeline.handle(command).await);
            }
            Request::Confirm(reply) => {
                cancel.send_replace(false);
                let _ = reply.send(pipeline.confirm().await);
            }
            Request::Decline(reply) => {
                let _ = reply.send(pipeline.decline());
            }
            Request::AcceptSuggestion(reply) => {
                let _ = reply.send(pipeline.accept_suggestion());
            }
            Request::Snapshot(reply) => {
                let trail = pipeline.trail();
                let _ = reply.send(SessionSnapshot {
                    trail: trail.entries().cloned().collect(),
                    summary: trail.summary(),
                    pending: pipeline.pending_confirmation().cloned(),
                });
            }
        }
    }

    info!(session_id = %pipeline.session_id(), "voice session stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use voxroute_events::AuditLogger;
    use voxroute_models::{AuditEventType, BackendRequest, BackendResponse, RoutingPreferences};
    use voxroute_persistence::MemoryAuditStore;
    use voxroute_routing::StaticAgentRegistry;
    use voxroute_runtime::{Backend, BackendError, DispatchConfig, Dispatcher};

    use crate::pipeline::PipelineOutcome;
    use crate::{PipelineConfig, SilentSpeech};

    struct SlowBackend(Duration);

    #[async_trait]
    impl Backend for SlowBackend {
        fn name(&self) -> &str {
            "slow"
        }

        async fn send(
            &self,
            request: &BackendRequest,
        ) -> std::result::Result<BackendResponse, BackendError> {
            tokio::time::sleep(self.0).await;
            Ok(BackendResponse {
                text: "done".into(),
                agent_id: request.agent().unwrap_or_else(|| AgentId::new("alden")),
            })
        }
    }

    fn session(delay: Duration) -> (VoiceSession, Arc<AuditLogger>) {
        let controls = RoutingControls::new(
            Arc::new(StaticAgentRegistry::default()),
            RoutingPreferences::default(),
            "alden",
        );
        let audit = Arc::new(AuditLogger::new(Arc::new(MemoryAuditStore::new()), 16));
        let dispatcher = Dispatcher::new(
            Arc::new(SlowBackend(delay)),
            DispatchConfig::new().with_attempt_timeout(Duration::from_secs(30)),
        );
        let pipeline = VoicePipeline::new(
            dispatcher,
            Arc::clone(&audit),
            controls,
            Arc::new(SilentSpeech),
            PipelineConfig::default(),
        )
        .unwrap();
        (VoiceSession::spawn(pipeline), audit)
    }

    fn final_result(transcript: &str) -> SttEvent {
        SttEvent::Result {
            transcript: transcript.to_string(),
            confidence: 0.9,
            is_final: true,
        }
    }

    #[tokio::test]
    async fn test_only_final_results_are_routed() {
        let (session, audit) = session(Duration::ZERO);
        session.on_event(SttEvent::Start).await.unwrap();
        assert!(session.is_listening());

        let interim = session
            .on_event(SttEvent::Result {
                transcript: "hey alden what".into(),
                confidence: 0.4,
                is_final: false,
            })
            .await
            .unwrap();
        assert!(interim.is_none());

        let response = session
            .on_event(final_result("hey alden, what's my schedule"))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(response.outcome, PipelineOutcome::Dispatched(_)));
        assert_eq!(audit.replay(&Default::default()).unwrap().len(), 2);

        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_blank_final_result_is_ignored() {
        let (session, audit) = session(Duration::ZERO);
        assert!(session.on_event(final_result("   ")).await.unwrap().is_none());
        assert!(audit.replay(&Default::default()).unwrap().is_empty());
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_recognition_error_is_not_audited() {
        let (session, audit) = session(Duration::ZERO);
        let err = session
            .on_event(SttEvent::Error {
                code: "no-speech".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Recognition { ref code } if code == "no-speech"));
        assert!(audit.replay(&Default::default()).unwrap().is_empty());
        session.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_cancels_in_flight_dispatch() {
        let (session, audit) = session(Duration::from_secs(20));
        let session = Arc::new(session);
        session.on_event(SttEvent::Start).await.unwrap();

        let in_flight = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.on_event(final_result("hey alice, any analytics")).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        session.on_event(SttEvent::End).await.unwrap();

        let response = in_flight.await.unwrap().unwrap().unwrap();
        assert!(matches!(response.outcome, PipelineOutcome::Cancelled(_)));
        assert!(!session.is_listening());

        let events = audit.replay(&Default::default()).unwrap();
        let failed = events
            .iter()
            .find(|e| e.event_type == AuditEventType::DispatchFailed)
            .unwrap();
        assert_eq!(failed.field_str("reason"), Some("cancelled"));
        assert!(failed.is_terminal());
        assert!(!events
            .iter()
            .any(|e| e.event_type == AuditEventType::DispatchSucceeded));
    }

    #[tokio::test]
    async fn test_snapshot_reports_pending_confirmation() {
        let (session, _audit) = session(Duration::ZERO);
        session
            .on_event(final_result("delete my last session"))
            .await
            .unwrap();

        let snapshot = session.snapshot().await.unwrap();
        assert!(snapshot.pending.is_some());
        assert!(snapshot.summary.ends_with("confirmation_requested(alden)"));

        let response = session.decline().await.unwrap();
        assert!(matches!(response.outcome, PipelineOutcome::Declined));
        assert!(session.snapshot().await.unwrap().pending.is_none());
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_calls_after_shutdown_fail() {
        let (session, _audit) = session(Duration::ZERO);
        let requests = session.requests.clone();
        session.shutdown().await;

        let (tx, _rx) = oneshot::channel();
        assert!(requests.send(Request::Snapshot(tx)).await.is_err());
    }
}
