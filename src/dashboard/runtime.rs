//! Async driver for the dashboard controller
//!
//! Each fetch runs as its own tokio task and reports back over a
//! channel. The runtime applies completions one at a time, so the
//! controller stays the single writer of dashboard state.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use super::command::Command;
use super::controller::{DashboardController, FetchTicket};
use crate::credentials::CredentialError;
use crate::models::RiskRecord;
use crate::scoring::{ScoreSource, ScoringError};
use crate::session::AuthError;

/// Errors surfaced to the operator while handling a command
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Credential store error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("No record with id '{0}'")]
    UnknownRecord(String),
}

/// Result of a finished fetch task
#[derive(Debug)]
pub struct FetchCompletion {
    pub token: u64,
    pub result: Result<Vec<RiskRecord>, ScoringError>,
}

/// What the caller should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Render,
    Help,
    Quit,
}

pub struct DashboardRuntime<S: ScoreSource> {
    controller: DashboardController,
    source: Arc<S>,
    tx: mpsc::UnboundedSender<FetchCompletion>,
    rx: mpsc::UnboundedReceiver<FetchCompletion>,
}

impl<S: ScoreSource> DashboardRuntime<S> {
    pub fn new(controller: DashboardController, source: Arc<S>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        DashboardRuntime {
            controller,
            source,
            tx,
            rx,
        }
    }

    pub fn controller(&self) -> &DashboardController {
        &self.controller
    }

    /// Issue the initial fetch for a restored session
    pub fn start(&mut self) {
        if let Some(ticket) = self.controller.start() {
            self.dispatch(ticket);
        }
    }

    fn dispatch(&self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let result = source.fetch_scores(&ticket.model).await;
            if tx
                .send(FetchCompletion {
                    token: ticket.token,
                    result,
                })
                .is_err()
            {
                log::debug!("Runtime gone, dropping fetch #{}", ticket.token);
            }
        });
    }

    fn dispatch_opt(&self, ticket: Option<FetchTicket>) {
        if let Some(ticket) = ticket {
            self.dispatch(ticket);
        }
    }

    /// Apply one operator command
    pub fn handle(&mut self, command: Command) -> Result<Outcome, DashboardError> {
        let gated = !matches!(
            command,
            Command::Login(_) | Command::Logout | Command::Help | Command::Quit
        );
        if gated && !self.controller.is_authorized() {
            return Err(DashboardError::NotLoggedIn);
        }

        match command {
            Command::Login(password) => {
                let ticket = self.controller.login(&password)?;
                self.dispatch_opt(ticket);
            }
            Command::Logout => self.controller.logout()?,
            Command::Filter(filter) => self.controller.set_filter(filter),
            Command::Sort(sort_key) => self.controller.set_sort_key(sort_key),
            Command::Model(model) => {
                let ticket = self.controller.set_model(&model);
                self.dispatch_opt(ticket);
            }
            Command::Refresh => {
                let ticket = self.controller.refresh();
                self.dispatch_opt(ticket);
            }
            Command::Select(id) => {
                if !self.controller.select(&id) {
                    return Err(DashboardError::UnknownRecord(id));
                }
            }
            Command::Deselect => self.controller.deselect(),
            Command::Show => return Ok(Outcome::Render),
            Command::Help => return Ok(Outcome::Help),
            Command::Quit => return Ok(Outcome::Quit),
        }

        Ok(Outcome::Render)
    }

    /// Wait for the next fetch task to finish and apply it
    ///
    /// Returns whether the result was current. Waits forever if no
    /// fetch ever completes.
    pub async fn next_completion(&mut self) -> bool {
        match self.rx.recv().await {
            Some(completion) => self
                .controller
                .complete_fetch(completion.token, completion.result),
            None => false,
        }
    }

    /// Apply completions until the current fetch has landed
    pub async fn settle(&mut self) {
        while self.controller.is_loading() {
            self.next_completion().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialStore, MemoryCredentialStore};
    use crate::dashboard::controller::ViewDefaults;
    use crate::session::{SessionGate, DEFAULT_MARKER_KEY};
    use crate::view::Color;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    type Reply = Result<Vec<RiskRecord>, ScoringError>;

    /// Source whose responses are released by the test, per model
    #[derive(Default)]
    struct GatedSource {
        gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    }

    impl GatedSource {
        fn gate(&self, model: &str) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(model.to_string(), rx);
            tx
        }
    }

    impl ScoreSource for GatedSource {
        fn fetch_scores(&self, model: &str) -> impl Future<Output = Reply> + Send {
            let rx = self.gates.lock().unwrap().remove(model);
            async move {
                match rx {
                    Some(rx) => rx.await.unwrap_or(Err(ScoringError::Status(599))),
                    None => Err(ScoringError::Status(404)),
                }
            }
        }
    }

    fn create_runtime(
        logged_in: bool,
    ) -> (DashboardRuntime<GatedSource>, Arc<GatedSource>, Arc<MemoryCredentialStore>) {
        let store = Arc::new(MemoryCredentialStore::new());
        if logged_in {
            store.set(DEFAULT_MARKER_KEY, "true").unwrap();
        }
        let session = SessionGate::new(store.clone(), DEFAULT_MARKER_KEY);
        let controller = DashboardController::new(session, ViewDefaults::default());
        let source = Arc::new(GatedSource::default());
        (
            DashboardRuntime::new(controller, source.clone()),
            source,
            store,
        )
    }

    fn record(id: &str, score: f64, status: &str) -> RiskRecord {
        RiskRecord::new(id, score, status)
    }

    #[tokio::test]
    async fn test_login_fetches_and_renders() {
        let (mut runtime, source, _) = create_runtime(false);
        let gate = source.gate("iforest");

        runtime.handle(Command::Login("admin123".to_string())).unwrap();
        assert!(runtime.controller().is_loading());

        gate.send(Ok(vec![record("u1", 80.0, "high risk")
            .with_reasons(["odd login time"])]))
            .unwrap();
        runtime.settle().await;

        let view = runtime.controller().view();
        assert!(!view.loading);
        assert_eq!(view.cards.len(), 1);
        assert_eq!(view.cards[0].id, "u1");
        assert_eq!(view.cards[0].color, Color::Red);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let (mut runtime, _, _) = create_runtime(false);

        let err = runtime.handle(Command::Login("wrong".to_string())).unwrap_err();

        assert!(matches!(err, DashboardError::Auth(AuthError::InvalidPassword)));
        assert!(!runtime.controller().is_authorized());
    }

    #[tokio::test]
    async fn test_commands_gated_when_logged_out() {
        let (mut runtime, _, _) = create_runtime(false);

        assert!(matches!(
            runtime.handle(Command::Refresh),
            Err(DashboardError::NotLoggedIn)
        ));
        assert_eq!(runtime.handle(Command::Quit).unwrap(), Outcome::Quit);
    }

    #[tokio::test]
    async fn test_newest_model_wins_when_old_arrives_last() {
        let (mut runtime, source, _) = create_runtime(true);
        let iforest = source.gate("iforest");
        let random = source.gate("random");

        runtime.start();
        runtime.handle(Command::Model("random".to_string())).unwrap();

        random.send(Ok(vec![record("r1", 30.0, "risk")])).unwrap();
        assert!(runtime.next_completion().await);

        iforest.send(Ok(vec![record("i1", 60.0, "suspicious")])).unwrap();
        assert!(!runtime.next_completion().await);

        let ids: Vec<&str> = runtime.controller().records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1"]);
        assert!(!runtime.controller().is_loading());
    }

    #[tokio::test]
    async fn test_newest_model_wins_when_old_arrives_first() {
        let (mut runtime, source, _) = create_runtime(true);
        let iforest = source.gate("iforest");
        let random = source.gate("random");

        runtime.start();
        runtime.handle(Command::Model("random".to_string())).unwrap();

        iforest.send(Ok(vec![record("i1", 60.0, "suspicious")])).unwrap();
        assert!(!runtime.next_completion().await);
        assert!(runtime.controller().is_loading());

        random.send(Ok(vec![record("r1", 30.0, "risk")])).unwrap();
        runtime.settle().await;

        assert_eq!(runtime.controller().records()[0].id, "r1");
    }

    #[tokio::test]
    async fn test_failed_fetch_is_observable() {
        let (mut runtime, source, _) = create_runtime(true);
        let gate = source.gate("iforest");

        runtime.start();
        gate.send(Err(ScoringError::Status(503))).unwrap();
        runtime.settle().await;

        let view = runtime.controller().view();
        assert!(!view.loading);
        assert!(view.cards.is_empty());
        assert!(matches!(view.fetch_status, crate::view::FetchStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn test_unresolved_fetch_stays_loading() {
        let (mut runtime, source, _) = create_runtime(true);
        let _gate = source.gate("iforest");

        runtime.start();
        let waited =
            tokio::time::timeout(Duration::from_millis(50), runtime.next_completion()).await;

        assert!(waited.is_err());
        assert!(runtime.controller().is_loading());
    }

    #[tokio::test]
    async fn test_select_then_logout() {
        let (mut runtime, source, store) = create_runtime(true);
        let gate = source.gate("iforest");
        runtime.start();
        gate.send(Ok(vec![record("u7", 50.0, "risk")])).unwrap();
        runtime.settle().await;

        runtime.handle(Command::Select("u7".to_string())).unwrap();
        let detail = runtime.controller().view().detail.unwrap();
        assert_eq!(detail.color, Color::Amber);
        assert_eq!(detail.trend.len(), 10);

        assert!(matches!(
            runtime.handle(Command::Select("nobody".to_string())),
            Err(DashboardError::UnknownRecord(_))
        ));

        runtime.handle(Command::Logout).unwrap();
        assert!(store.get(DEFAULT_MARKER_KEY).unwrap().is_none());
        let view = runtime.controller().view();
        assert!(!view.authorized);
        assert!(view.cards.is_empty());
        assert!(view.detail.is_none());
    }

    #[test]
    fn test_runtime_outside_async_test() {
        let (mut runtime, source, _) = create_runtime(false);
        let gate = source.gate("iforest");

        tokio_test::block_on(async {
            runtime.handle(Command::Login("admin123".to_string())).unwrap();
            gate.send(Ok(vec![])).unwrap();
            runtime.settle().await;
        });

        assert!(runtime.controller().records().is_empty());
        assert!(!runtime.controller().is_loading());
    }
}
