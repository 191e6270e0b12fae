//! The routing pipeline.
//!
//! One [`VoicePipeline`] turns each final transcript into exactly one
//! outcome:
//!
//! ```text
//! command ─► supersede pending ─► resolve ─► advise ─► gate ─┬─► Blocked
//!                                                            ├─► AwaitingConfirmation
//!                                                            └─► dispatch ─┬─► Dispatched
//!                                                                          ├─► DispatchFailed
//!                                                                          └─► Cancelled
//! ```
//!
//! Every decision and every outcome is audited before the caller sees it.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};
use voxroute_models::{
    AgentId, AgentKind, AuditEvent, AuditEventBuilder, AuditEventType, BreadcrumbStep, CommandId,
    ConfirmationId, ConfirmationRequest, ConfirmationState, DeferenceSuggestion, DispatchResult,
    RoutingDecision, RoutingMode, SessionId, VoiceCommand,
};
use voxroute_events::{AuditLogger, BreadcrumbTrail};
use voxroute_routing::{
    classify_reply, normalize, AgentRegistry, AgentResolver, ConfirmationTracker,
    DeferenceAdvisor, KeywordConfirmationPolicy, ReplyKind, RoutingContext, RoutingError,
    SafetyGate,
};
use voxroute_runtime::{build_request, Dispatcher};

use crate::config::PipelineConfig;
use crate::controls::RoutingControls;
use crate::error::{OrchestratorError, Result};
use crate::speech::{identity_confirmation, SpeechSink};

const DECLINED_REPLY: &str = "Okay, I won't do that.";

/// What happened to a command.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// A backend answered.
    Dispatched(DispatchResult),
    /// The safety gate vetoed the target.
    Blocked { reason: String },
    /// Waiting for an explicit yes or no.
    AwaitingConfirmation {
        confirmation_id: ConfirmationId,
        prompt: String,
    },
    /// The user said no.
    Declined,
    /// Every backend failed; the result carries the apology.
    DispatchFailed(DispatchResult),
    /// The voice interface closed before a backend answered.
    Cancelled(DispatchResult),
}

impl PipelineOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineOutcome::Dispatched(_) => "dispatched",
            PipelineOutcome::Blocked { .. } => "blocked",
            PipelineOutcome::AwaitingConfirmation { .. } => "awaiting_confirmation",
            PipelineOutcome::Declined => "declined",
            PipelineOutcome::DispatchFailed(_) => "dispatch_failed",
            PipelineOutcome::Cancelled(_) => "cancelled",
        }
    }

    /// Text surfaced to the user, if any.
    pub fn reply(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Dispatched(result) | PipelineOutcome::DispatchFailed(result) => {
                Some(result.response.as_str())
            }
            PipelineOutcome::Blocked { reason } => Some(reason.as_str()),
            PipelineOutcome::AwaitingConfirmation { prompt, .. } => Some(prompt.as_str()),
            PipelineOutcome::Declined => Some(DECLINED_REPLY),
            PipelineOutcome::Cancelled(_) => None,
        }
    }
}

/// Result of handling one input.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResponse {
    /// The decision the outcome belongs to.
    pub decision: RoutingDecision,
    pub outcome: PipelineOutcome,
    /// Advice that another agent fits better. Never applied automatically.
    pub suggestion: Option<DeferenceSuggestion>,
}

impl PipelineResponse {
    pub fn command_id(&self) -> &CommandId {
        &self.decision.command().id
    }

    pub fn target(&self) -> &AgentId {
        self.decision.target()
    }
}

/// A gated decision parked behind a confirmation.
#[derive(Debug)]
struct ParkedDispatch {
    decision: RoutingDecision,
    mode: RoutingMode,
    universal: Option<&'static str>,
}

/// Resolves, gates and dispatches voice commands one at a time.
pub struct VoicePipeline {
    resolver: AgentResolver,
    advisor: DeferenceAdvisor,
    gate: SafetyGate,
    tracker: ConfirmationTracker,
    dispatcher: Dispatcher,
    audit: Arc<AuditLogger>,
    trail: BreadcrumbTrail,
    speech: Arc<dyn SpeechSink>,
    registry: Arc<dyn AgentRegistry>,
    controls: RoutingControls,
    config: PipelineConfig,
    session_id: SessionId,
    cancel: watch::Receiver<bool>,
    parked: Option<ParkedDispatch>,
    last_suggestion: Option<DeferenceSuggestion>,
    last_target: Option<AgentId>,
}

impl VoicePipeline {
    /// Creates a pipeline with the default deference table and keyword
    /// confirmation policy.
    pub fn new(
        dispatcher: Dispatcher,
        audit: Arc<AuditLogger>,
        controls: RoutingControls,
        speech: Arc<dyn SpeechSink>,
        config: PipelineConfig,
    ) -> Result<Self> {
        let registry: Arc<dyn AgentRegistry> = controls.registry();
        let session_id = SessionId::new();
        info!(
            session_id = %session_id,
            default_agent = %controls.default_agent(),
            backends = ?dispatcher.labels(),
            "voice pipeline ready"
        );

        Ok(Self {
            resolver: AgentResolver::new(controls.default_agent().clone()),
            advisor: DeferenceAdvisor::with_defaults()?,
            gate: SafetyGate::new(Arc::new(KeywordConfirmationPolicy::with_defaults()?)),
            tracker: ConfirmationTracker::new(),
            dispatcher,
            audit,
            trail: BreadcrumbTrail::new(config.breadcrumb_cap),
            speech,
            registry,
            controls,
            config,
            session_id,
            cancel: watch::channel(false).1,
            parked: None,
            last_suggestion: None,
            last_target: None,
        })
    }

    pub fn with_gate(mut self, gate: SafetyGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_advisor(mut self, advisor: DeferenceAdvisor) -> Self {
        self.advisor = advisor;
        self
    }

    /// Dispatches are cancelled when `cancel` turns true.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn controls(&self) -> &RoutingControls {
        &self.controls
    }

    pub fn trail(&self) -> &BreadcrumbTrail {
        &self.trail
    }

    pub fn pending_confirmation(&self) -> Option<&ConfirmationRequest> {
        self.tracker.pending()
    }

    pub fn last_suggestion(&self) -> Option<&DeferenceSuggestion> {
        self.last_suggestion.as_ref()
    }

    /// Handles one final transcript.
    pub async fn handle(&mut self, command: VoiceCommand) -> Result<PipelineResponse> {
        if self.config.voice_confirmation && self.tracker.has_pending() {
            if let Some(reply) = classify_reply(&command.transcript) {
                debug!(reply = ?reply, command_id = %command.id, "spoken confirmation reply");
                return match reply {
                    ReplyKind::Affirmative => self.confirm().await,
                    ReplyKind::Negative => self.decline(),
                };
            }
        }
        self.supersede_pending();

        let prefs = self.controls.snapshot();
        let ctx = RoutingContext::snapshot(&prefs, self.registry.as_ref());
        let universal = normalize(&command.transcript).universal_command();
        let confidence = command.confidence;
        self.trail.push(BreadcrumbStep::Received, None, confidence);

        let decision = self.resolver.resolve(command, &ctx);
        let suggestion = self
            .advisor
            .suggest(&decision.command().transcript, decision.target());
        let (decision, verdict) = self.gate.finalize(decision, ctx.external_enabled);

        self.record_decision(&decision, &ctx, universal);
        self.trail
            .push(BreadcrumbStep::Resolved, Some(decision.target()), confidence);
        if let Some(s) = &suggestion {
            self.trail.push(
                BreadcrumbStep::DeferenceSuggested,
                Some(&s.suggested_agent),
                s.confidence,
            );
        }
        self.last_suggestion = suggestion.clone();

        if let Some(reason) = verdict.block_reason {
            return Ok(self.block(decision, reason, suggestion));
        }
        if verdict.requires_confirmation {
            return self.request_confirmation(decision, ctx.mode, universal, suggestion);
        }
        self.dispatch(decision, ctx.mode, universal, suggestion).await
    }

    /// Confirms the pending request and dispatches it.
    ///
    /// The parked decision is gated again, so an external agent disabled
    /// while the request was pending is blocked instead of dispatched.
    pub async fn confirm(&mut self) -> Result<PipelineResponse> {
        let request = self.tracker.confirm()?;
        let parked = self
            .parked
            .take()
            .ok_or(RoutingError::NoPendingConfirmation)?;
        self.record_resolution(&request);
        self.trail.push(
            BreadcrumbStep::Confirmed,
            Some(request.proposed_target()),
            request.original_command().confidence,
        );

        let (decision, verdict) = self
            .gate
            .finalize(parked.decision, self.registry.is_external_enabled());
        if let Some(reason) = verdict.block_reason {
            return Ok(self.block(decision, reason, None));
        }
        self.dispatch(decision, parked.mode, parked.universal, None)
            .await
    }

    /// Declines the pending request. Nothing is dispatched.
    pub fn decline(&mut self) -> Result<PipelineResponse> {
        let request = self.tracker.decline()?;
        let parked = self
            .parked
            .take()
            .ok_or(RoutingError::NoPendingConfirmation)?;
        self.record_resolution(&request);
        self.trail.push(
            BreadcrumbStep::Declined,
            Some(request.proposed_target()),
            request.original_command().confidence,
        );
        self.speech.speak(DECLINED_REPLY, request.proposed_target());

        Ok(PipelineResponse {
            decision: parked.decision,
            outcome: PipelineOutcome::Declined,
            suggestion: None,
        })
    }

    /// Makes the last suggested agent the active agent for later commands.
    pub fn accept_suggestion(&mut self) -> Result<AgentId> {
        let suggestion = self
            .last_suggestion
            .take()
            .ok_or(OrchestratorError::NoSuggestion)?;
        self.controls.set_active(suggestion.suggested_agent.clone())?;
        info!(agent = %suggestion.suggested_agent, "deference suggestion accepted");
        Ok(suggestion.suggested_agent)
    }

    fn supersede_pending(&mut self) {
        if let Some(request) = self.tracker.supersede() {
            self.parked = None;
            self.record_resolution(&request);
            self.trail.push(
                BreadcrumbStep::Superseded,
                Some(request.proposed_target()),
                request.original_command().confidence,
            );
        }
    }

    fn block(
        &mut self,
        decision: RoutingDecision,
        reason: String,
        suggestion: Option<DeferenceSuggestion>,
    ) -> PipelineResponse {
        self.audit.record(
            self.event(AuditEventType::Blocked, &decision.command().id)
                .terminal()
                .with_field("agent", decision.target().as_str())
                .with_field("reason", reason.as_str())
                .build(),
        );
        self.trail.push(
            BreadcrumbStep::Blocked,
            Some(decision.target()),
            decision.command().confidence,
        );
        self.speech.speak(&reason, self.resolver.default_agent());

        PipelineResponse {
            decision,
            outcome: PipelineOutcome::Blocked { reason },
            suggestion,
        }
    }

    fn request_confirmation(
        &mut self,
        decision: RoutingDecision,
        mode: RoutingMode,
        universal: Option<&'static str>,
        suggestion: Option<DeferenceSuggestion>,
    ) -> Result<PipelineResponse> {
        let confirmation_id = self
            .tracker
            .open(decision.command().clone(), decision.target().clone())?
            .id()
            .clone();
        let prompt = confirmation_prompt(&decision);

        self.audit.record(
            self.event(AuditEventType::ConfirmationRequested, &decision.command().id)
                .with_field("confirmation_id", confirmation_id.as_str())
                .with_field("agent", decision.target().as_str())
                .with_field("transcript", decision.command().transcript.as_str())
                .build(),
        );
        self.trail.push(
            BreadcrumbStep::ConfirmationRequested,
            Some(decision.target()),
            decision.command().confidence,
        );
        self.speech.speak(&prompt, decision.target());

        self.parked = Some(ParkedDispatch {
            decision: decision.clone(),
            mode,
            universal,
        });
        Ok(PipelineResponse {
            decision,
            outcome: PipelineOutcome::AwaitingConfirmation {
                confirmation_id,
                prompt,
            },
            suggestion,
        })
    }

    async fn dispatch(
        &mut self,
        decision: RoutingDecision,
        mode: RoutingMode,
        universal: Option<&'static str>,
        suggestion: Option<DeferenceSuggestion>,
    ) -> Result<PipelineResponse> {
        let request = build_request(&decision, &self.session_id, mode, universal);
        let result = self
            .dispatcher
            .dispatch(&decision, &request, &mut self.cancel)
            .await?;

        let command_id = decision.command().id.clone();
        let target = decision.target();
        let confidence = decision.command().confidence;

        let outcome = if result.cancelled {
            self.audit.record(
                self.event(AuditEventType::DispatchFailed, &command_id)
                    .terminal()
                    .with_field("agent", target.as_str())
                    .with_field("reason", "cancelled")
                    .with_field("attempts", result.attempts.len())
                    .with_field("duration_ms", result.duration_ms())
                    .build(),
            );
            self.trail
                .push(BreadcrumbStep::DispatchFailed, Some(target), confidence);
            PipelineOutcome::Cancelled(result)
        } else if result.success {
            for attempt in result.failed_attempts() {
                self.audit.record(
                    self.event(AuditEventType::DispatchFailed, &command_id)
                        .with_field("agent", target.as_str())
                        .with_field("backend", attempt.backend.as_str())
                        .with_field("backend_name", attempt.backend_name.as_str())
                        .with_optional_field("reason", attempt.outcome.reason())
                        .with_field("elapsed_ms", attempt.elapsed_ms)
                        .build(),
                );
            }
            self.audit.record(
                self.event(AuditEventType::DispatchSucceeded, &command_id)
                    .terminal()
                    .with_field("agent", target.as_str())
                    .with_optional_field("source_backend", result.source_backend.clone())
                    .with_field("attempts", result.attempts.len())
                    .with_field("duration_ms", result.duration_ms())
                    .build(),
            );
            self.trail
                .push(BreadcrumbStep::Dispatched, Some(target), confidence);
            self.announce(target, decision.target_kind());
            self.speech.speak(&result.response, target);
            PipelineOutcome::Dispatched(result)
        } else {
            let attempts = serde_json::to_value(&result.attempts).unwrap_or_default();
            self.audit.record(
                self.event(AuditEventType::DispatchFailed, &command_id)
                    .terminal()
                    .with_field("agent", target.as_str())
                    .with_optional_field("reason", result.failure_summary())
                    .with_field("attempts", attempts)
                    .with_field("duration_ms", result.duration_ms())
                    .build(),
            );
            self.trail
                .push(BreadcrumbStep::DispatchFailed, Some(target), confidence);
            warn!(command_id = %command_id, agent = %target, "dispatch exhausted");
            self.speech.speak(&result.response, target);
            PipelineOutcome::DispatchFailed(result)
        };

        Ok(PipelineResponse {
            decision,
            outcome,
            suggestion,
        })
    }

    /// Speaks the identity line when the target changed since the last answer.
    fn announce(&mut self, target: &AgentId, kind: AgentKind) {
        if self.last_target.as_ref() == Some(target) {
            return;
        }
        if self.config.identity_confirmation {
            self.speech.speak(&identity_confirmation(target, kind), target);
        }
        self.last_target = Some(target.clone());
    }

    fn record_decision(
        &self,
        decision: &RoutingDecision,
        ctx: &RoutingContext,
        universal: Option<&'static str>,
    ) {
        let command = decision.command();
        info!(
            command_id = %command.id,
            agent = %decision.target(),
            basis = decision.basis().decision_label(),
            blocked = decision.is_blocked(),
            "routing decided"
        );
        self.audit.record(
            self.event(AuditEventType::RoutingDecided, &command.id)
                .with_field("timestamp", decision.decided_at().to_rfc3339())
                .with_field("transcript", command.transcript.as_str())
                .with_field("agent", decision.target().as_str())
                .with_field("agent_kind", decision.target_kind().to_string())
                .with_field("routing_decision", decision.basis().decision_label())
                .with_field("mode", ctx.mode.as_str())
                .with_field("external_enabled", ctx.external_enabled)
                .with_field("session_id", self.session_id.as_str())
                .with_field("confidence", f64::from(command.confidence))
                .with_field("purpose", universal.unwrap_or("user_interaction"))
                .with_field("blocked", decision.is_blocked())
                .build(),
        );
    }

    /// Audits a confirmation transition. Declines end the command.
    fn record_resolution(&self, request: &ConfirmationRequest) {
        let state = request.state();
        let mut event = self
            .event(
                AuditEventType::ConfirmationResolved,
                &request.original_command().id,
            )
            .with_field("confirmation_id", request.id().as_str())
            .with_field("agent", request.proposed_target().as_str())
            .with_field(
                "state",
                match state {
                    ConfirmationState::Pending => "pending",
                    ConfirmationState::Confirmed => "confirmed",
                    ConfirmationState::Declined => "declined",
                },
            )
            .with_optional_field("reason", request.resolution().map(|r| r.as_str()));
        if state == ConfirmationState::Declined {
            event = event.terminal();
        }
        self.audit.record(event.build());
    }

    fn event(&self, event_type: AuditEventType, command_id: &CommandId) -> AuditEventBuilder {
        AuditEvent::builder(event_type)
            .command(command_id.clone())
            .session(self.session_id.clone())
    }
}

fn confirmation_prompt(decision: &RoutingDecision) -> String {
    format!(
        "{} will run \"{}\". Say yes to confirm or no to cancel.",
        decision.target().display_name(),
        decision.command().transcript.trim()
    )
}
