//! Conversation turn orchestration
//!
//! [`ChatEngine`] converts one user submission into exactly one appended
//! assistant reply, driving the remote thread + run protocol in sequence:
//! ensure thread, post message, create run, poll to a terminal status,
//! fetch the newest message. Every failure is caught at one boundary and
//! rendered as a synthetic assistant message; `submit` never returns an
//! error to the presentation layer.
//!
//! # Limits
//!
//! - One turn in flight per session; concurrent submissions are rejected
//! - Polling is bounded by a configurable deadline (default 120 s)
//! - Fixed poll interval (default 1 s)

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::assistant::{AssistantApi, AssistantClient, AssistantError, RunSnapshot, RunStatus};
use crate::config::AssistantConfig;
use crate::secrets::SecretString;
use crate::session::{Message, Session};

/// Assistant reply shown when no API key is configured.
pub const CONFIG_HINT_REPLY: &str =
    "Set the OPENAI_API_KEY environment variable to enable chat.";

/// Assistant reply for transport-level failures.
pub const NETWORK_ERROR_REPLY: &str = "Network error. Please check your connection.";

/// Assistant reply when a response body was missing expected fields.
pub const MALFORMED_REPLY: &str =
    "The assistant returned an unexpected response. Please try again.";

/// Assistant reply when polling hit its deadline.
pub const TIMEOUT_REPLY: &str = "The assistant took too long to reply. Please try again.";

/// Everything that can go wrong inside one turn.
///
/// These never escape [`ChatEngine::submit`]; they exist so the boundary can
/// distinguish network-class failures, remote API failures, failed runs and
/// poll timeouts when rendering the synthetic reply.
#[derive(Debug, thiserror::Error)]
enum TurnError {
    #[error(transparent)]
    Assistant(#[from] AssistantError),

    #[error("run ended with status {status}")]
    RunFailed {
        status: RunStatus,
        detail: Option<String>,
    },

    #[error("run still open after {limit:?}")]
    PollTimeout { limit: Duration },
}

/// Terminal outcome of the polling loop
enum RunOutcome {
    Completed,
    Failed {
        status: RunStatus,
        detail: Option<String>,
    },
    TimedOut,
}

/// Orchestrates chat turns against the remote assistant.
///
/// Holds no per-conversation state; everything session-scoped lives in the
/// [`Session`] passed to [`submit`](ChatEngine::submit). When no credential
/// is configured the engine carries no transport client at all, so the
/// configuration-error path cannot touch the network by construction.
pub struct ChatEngine {
    api: Option<Arc<dyn AssistantApi>>,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl ChatEngine {
    /// Create an engine over an explicit transport client.
    ///
    /// Pass `None` when no credential is configured; submissions then get
    /// the configuration hint instead of a network call.
    pub fn new(
        api: Option<Arc<dyn AssistantApi>>,
        poll_interval: Duration,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            api,
            poll_interval,
            poll_timeout,
        }
    }

    /// Wire up the engine from configuration and an optional API key.
    pub fn from_config(config: &AssistantConfig, api_key: Option<SecretString>) -> Self {
        let api = api_key.map(|key| {
            Arc::new(AssistantClient::new(
                config.base_url.clone(),
                config.assistant_id.clone(),
                key,
            )) as Arc<dyn AssistantApi>
        });
        Self::new(api, config.poll_interval(), config.poll_timeout())
    }

    /// Process one user submission.
    ///
    /// Appends the user message and exactly one assistant message (the reply
    /// or a rendered failure) to the session transcript. Whitespace-only
    /// input is a no-op, and a submission while a turn is already in flight
    /// is rejected without touching the transcript.
    pub async fn submit(&self, session: &mut Session, input: &str) {
        let text = input.trim();
        if text.is_empty() {
            return;
        }

        if session.busy {
            warn!("submission rejected: a turn is already in flight");
            return;
        }

        let Some(api) = self.api.clone() else {
            session.push(Message::user(text));
            session.push(Message::assistant(CONFIG_HINT_REPLY));
            return;
        };

        session.push(Message::user(text));
        session.busy = true;

        let reply = match self.run_turn(api.as_ref(), session, text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("turn failed: {}", e);
                render_failure(&e)
            }
        };

        session.push(Message::assistant(reply));
        session.busy = false;
    }

    /// Drive the remote protocol for one turn and return the reply text.
    async fn run_turn(
        &self,
        api: &dyn AssistantApi,
        session: &mut Session,
        text: &str,
    ) -> Result<String, TurnError> {
        // Thread ensure: created at most once per session lifetime.
        let thread_id = match &session.thread_id {
            Some(id) => id.clone(),
            None => {
                let id = api.create_thread().await?;
                info!("created thread {}", id);
                session.thread_id = Some(id.clone());
                id
            }
        };

        api.post_user_message(&thread_id, text).await?;

        let run = api.create_run(&thread_id).await?;
        debug!("run {} created with status {}", run.id, run.status);

        match self.poll_run(api, &thread_id, run).await? {
            RunOutcome::Completed => Ok(api.latest_assistant_text(&thread_id).await?),
            RunOutcome::Failed { status, detail } => Err(TurnError::RunFailed { status, detail }),
            RunOutcome::TimedOut => Err(TurnError::PollTimeout {
                limit: self.poll_timeout,
            }),
        }
    }

    /// Poll the run until it leaves `{queued, in_progress}` or the deadline
    /// expires. The snapshot is replaced wholesale on every poll.
    async fn poll_run(
        &self,
        api: &dyn AssistantApi,
        thread_id: &str,
        mut run: RunSnapshot,
    ) -> Result<RunOutcome, TurnError> {
        let deadline = Instant::now() + self.poll_timeout;

        while run.status.is_open() {
            if Instant::now() >= deadline {
                warn!(
                    "run {} still {} after {:?}",
                    run.id, run.status, self.poll_timeout
                );
                return Ok(RunOutcome::TimedOut);
            }
            tokio::time::sleep(self.poll_interval).await;
            run = api.get_run(thread_id, &run.id).await?;
            debug!("run {} polled: {}", run.id, run.status);
        }

        Ok(match run.status {
            RunStatus::Completed => RunOutcome::Completed,
            status => RunOutcome::Failed {
                status,
                detail: run.last_error.map(|e| e.message),
            },
        })
    }
}

/// Render a turn failure as the synthetic assistant reply.
///
/// Network-class failures get a distinct message; everything with remote
/// detail keeps that detail, including the literal run status token.
fn render_failure(err: &TurnError) -> String {
    match err {
        TurnError::Assistant(AssistantError::Network { .. }) => NETWORK_ERROR_REPLY.to_string(),
        TurnError::Assistant(AssistantError::Api { message, .. }) => {
            format!("Assistant error: {}. Please try again.", message)
        }
        TurnError::Assistant(AssistantError::Malformed { .. }) => MALFORMED_REPLY.to_string(),
        TurnError::RunFailed { status, detail } => match detail {
            Some(detail) => format!("Assistant error: {} - {}. Please try again.", status, detail),
            None => format!("Assistant error: {}. Please try again.", status),
        },
        TurnError::PollTimeout { .. } => TIMEOUT_REPLY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{Result as ApiResult, RunLastError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted in-process transport fake.
    ///
    /// `create_run` hands out the first snapshot of the script; each
    /// `get_run` pops the next one. Call counts are recorded for assertions.
    struct ScriptedApi {
        create_thread_calls: AtomicUsize,
        post_calls: AtomicUsize,
        get_run_calls: AtomicUsize,
        initial_run: Mutex<Option<RunSnapshot>>,
        poll_script: Mutex<VecDeque<RunSnapshot>>,
        reply: String,
        create_run_error: Mutex<Option<AssistantError>>,
    }

    impl ScriptedApi {
        fn new(initial: RunSnapshot, polls: Vec<RunSnapshot>, reply: &str) -> Self {
            Self {
                create_thread_calls: AtomicUsize::new(0),
                post_calls: AtomicUsize::new(0),
                get_run_calls: AtomicUsize::new(0),
                initial_run: Mutex::new(Some(initial)),
                poll_script: Mutex::new(polls.into()),
                reply: reply.to_string(),
                create_run_error: Mutex::new(None),
            }
        }

        fn snapshot(status: RunStatus) -> RunSnapshot {
            RunSnapshot {
                id: "run_1".to_string(),
                status,
                last_error: None,
            }
        }

        fn failing_create_run(err: AssistantError) -> Self {
            let api = Self::new(Self::snapshot(RunStatus::Queued), vec![], "");
            *api.create_run_error.lock().unwrap() = Some(err);
            api
        }
    }

    #[async_trait]
    impl AssistantApi for ScriptedApi {
        async fn create_thread(&self) -> ApiResult<String> {
            self.create_thread_calls.fetch_add(1, Ordering::SeqCst);
            Ok("t1".to_string())
        }

        async fn post_user_message(&self, _thread_id: &str, _text: &str) -> ApiResult<()> {
            self.post_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn create_run(&self, _thread_id: &str) -> ApiResult<RunSnapshot> {
            if let Some(err) = self.create_run_error.lock().unwrap().take() {
                return Err(err);
            }
            let initial = self.initial_run.lock().unwrap().clone();
            Ok(initial.unwrap_or_else(|| Self::snapshot(RunStatus::Queued)))
        }

        async fn get_run(&self, _thread_id: &str, _run_id: &str) -> ApiResult<RunSnapshot> {
            self.get_run_calls.fetch_add(1, Ordering::SeqCst);
            let next = self.poll_script.lock().unwrap().pop_front();
            Ok(next.unwrap_or_else(|| Self::snapshot(RunStatus::InProgress)))
        }

        async fn latest_assistant_text(&self, _thread_id: &str) -> ApiResult<String> {
            Ok(self.reply.clone())
        }
    }

    fn engine_over(api: Arc<ScriptedApi>) -> ChatEngine {
        ChatEngine::new(
            Some(api),
            Duration::from_millis(1),
            Duration::from_secs(5),
        )
    }

    fn completed_api(reply: &str) -> Arc<ScriptedApi> {
        Arc::new(ScriptedApi::new(
            ScriptedApi::snapshot(RunStatus::Queued),
            vec![ScriptedApi::snapshot(RunStatus::Completed)],
            reply,
        ))
    }

    #[tokio::test]
    async fn test_empty_input_is_a_no_op() {
        let api = completed_api("unused");
        let engine = engine_over(api.clone());
        let mut session = Session::new("hi");

        engine.submit(&mut session, "   \t ").await;

        assert_eq!(session.log().len(), 1);
        assert!(session.thread_id.is_none());
        assert_eq!(api.create_thread_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.post_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_while_busy_is_rejected() {
        let api = completed_api("unused");
        let engine = engine_over(api.clone());
        let mut session = Session::new("hi");
        session.busy = true;

        engine.submit(&mut session, "hello").await;

        assert_eq!(session.log().len(), 1);
        assert_eq!(api.post_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_appends_hint_without_network() {
        let engine = ChatEngine::new(None, Duration::from_millis(1), Duration::from_secs(5));
        let mut session = Session::new("hi");

        engine.submit(&mut session, "hello").await;

        let log = session.log();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1], Message::user("hello"));
        assert_eq!(log[2], Message::assistant(CONFIG_HINT_REPLY));
        assert!(!session.busy);
        assert!(session.thread_id.is_none());
    }

    #[tokio::test]
    async fn test_successful_turn_appends_one_reply() {
        let api = completed_api("14 years.");
        let engine = engine_over(api.clone());
        let mut session = Session::new("hi");

        engine.submit(&mut session, "What is your experience?").await;

        let log = session.log();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1], Message::user("What is your experience?"));
        assert_eq!(log[2], Message::assistant("14 years."));
        assert_eq!(session.thread_id.as_deref(), Some("t1"));
        assert!(!session.busy);
    }

    #[tokio::test]
    async fn test_thread_is_created_at_most_once() {
        let api = Arc::new(ScriptedApi::new(
            ScriptedApi::snapshot(RunStatus::Completed),
            vec![],
            "reply",
        ));
        let engine = engine_over(api.clone());
        let mut session = Session::new("hi");

        engine.submit(&mut session, "first").await;
        engine.submit(&mut session, "second").await;

        assert_eq!(api.create_thread_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.post_calls.load(Ordering::SeqCst), 2);
        assert_eq!(session.thread_id.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_poll_stops_on_first_terminal_status() {
        let api = Arc::new(ScriptedApi::new(
            ScriptedApi::snapshot(RunStatus::Queued),
            vec![
                ScriptedApi::snapshot(RunStatus::Queued),
                ScriptedApi::snapshot(RunStatus::InProgress),
                ScriptedApi::snapshot(RunStatus::Completed),
            ],
            "done",
        ));
        let engine = engine_over(api.clone());
        let mut session = Session::new("hi");

        engine.submit(&mut session, "question").await;

        assert_eq!(api.get_run_calls.load(Ordering::SeqCst), 3);
        assert_eq!(session.last().unwrap().text, "done");
    }

    #[tokio::test]
    async fn test_failed_run_renders_status_and_detail() {
        let failed = RunSnapshot {
            id: "run_1".to_string(),
            status: RunStatus::Failed,
            last_error: Some(RunLastError {
                message: "X".to_string(),
                code: None,
            }),
        };
        let api = Arc::new(ScriptedApi::new(
            ScriptedApi::snapshot(RunStatus::Queued),
            vec![failed],
            "",
        ));
        let engine = engine_over(api);
        let mut session = Session::new("hi");

        engine.submit(&mut session, "question").await;

        let reply = &session.last().unwrap().text;
        assert!(reply.contains("failed"), "missing status token: {}", reply);
        assert!(reply.contains('X'), "missing detail: {}", reply);
        assert!(!session.busy);
    }

    #[tokio::test]
    async fn test_unmodeled_terminal_status_keeps_its_token() {
        let api = Arc::new(ScriptedApi::new(
            ScriptedApi::snapshot(RunStatus::Other("requires_action".to_string())),
            vec![],
            "",
        ));
        let engine = engine_over(api);
        let mut session = Session::new("hi");

        engine.submit(&mut session, "question").await;

        assert!(session.last().unwrap().text.contains("requires_action"));
    }

    #[tokio::test]
    async fn test_run_creation_failure_keeps_remote_detail() {
        let api = Arc::new(ScriptedApi::failing_create_run(AssistantError::Api {
            operation: "create-run",
            status: 400,
            message: "bad request".to_string(),
        }));
        let engine = engine_over(api);
        let mut session = Session::new("hi");

        engine.submit(&mut session, "question").await;

        let log = session.log();
        assert_eq!(log.len(), 3);
        assert!(log[2].text.contains("bad request"));
        assert!(!session.busy);
    }

    #[tokio::test]
    async fn test_network_failure_renders_network_reply() {
        let api = Arc::new(ScriptedApi::failing_create_run(AssistantError::Network {
            operation: "create-run",
            detail: "connection refused".to_string(),
        }));
        let engine = engine_over(api);
        let mut session = Session::new("hi");

        engine.submit(&mut session, "question").await;

        assert_eq!(session.last().unwrap().text, NETWORK_ERROR_REPLY);
        assert!(!session.busy);
    }

    #[tokio::test]
    async fn test_poll_deadline_renders_timeout_and_releases_busy() {
        // Script never leaves in_progress; a zero deadline trips immediately.
        let api = Arc::new(ScriptedApi::new(
            ScriptedApi::snapshot(RunStatus::InProgress),
            vec![],
            "",
        ));
        let engine = ChatEngine::new(Some(api.clone()), Duration::from_millis(1), Duration::ZERO);
        let mut session = Session::new("hi");

        engine.submit(&mut session, "question").await;

        assert_eq!(session.last().unwrap().text, TIMEOUT_REPLY);
        assert!(!session.busy);
        assert_eq!(api.get_run_calls.load(Ordering::SeqCst), 0);
    }
}
