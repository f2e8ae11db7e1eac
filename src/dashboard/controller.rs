//! Dashboard state machine
//!
//! The controller owns every piece of mutable dashboard state and is
//! the only thing that changes it. It performs no I/O itself: starting
//! a fetch hands out a `FetchTicket`, and whoever runs the request
//! reports back through `complete_fetch`. Only the most recently issued
//! ticket is honored, so a slow response for an old model can never
//! overwrite fresher data.

use chrono::Utc;

use crate::credentials::CredentialError;
use crate::models::{Filter, RiskRecord, SortKey};
use crate::scoring::ScoringError;
use crate::session::{AuthError, SessionGate};
use crate::view::{self, DashboardView, Detail, FetchStatus, TrendPoint};

/// Initial and post-logout selector values
#[derive(Debug, Clone, PartialEq)]
pub struct ViewDefaults {
    pub filter: Filter,
    pub sort_key: SortKey,
    pub model: String,
    /// Models offered in the model selector
    pub models: Vec<String>,
}

impl Default for ViewDefaults {
    fn default() -> Self {
        ViewDefaults {
            filter: Filter::All,
            sort_key: SortKey::Id,
            model: "iforest".to_string(),
            models: vec!["iforest".to_string(), "random".to_string()],
        }
    }
}

/// A fetch the controller wants performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub token: u64,
    pub model: String,
}

#[derive(Debug, Clone)]
struct Selection {
    id: String,
    /// Score the trend was drawn around
    seed: f64,
    trend: Vec<TrendPoint>,
}

/// Session, view and record state for a single operator
pub struct DashboardController {
    session: SessionGate,
    defaults: ViewDefaults,
    password: String,
    filter: Filter,
    sort_key: SortKey,
    model: String,
    records: Vec<RiskRecord>,
    selection: Option<Selection>,
    last_token: u64,
    in_flight: Option<u64>,
    fetch_status: FetchStatus,
}

impl DashboardController {
    pub fn new(session: SessionGate, defaults: ViewDefaults) -> Self {
        DashboardController {
            session,
            filter: defaults.filter.clone(),
            sort_key: defaults.sort_key,
            model: defaults.model.clone(),
            defaults,
            password: String::new(),
            records: Vec::new(),
            selection: None,
            last_token: 0,
            in_flight: None,
            fetch_status: FetchStatus::Idle,
        }
    }

    /// Kick off the initial fetch when the session was restored
    pub fn start(&mut self) -> Option<FetchTicket> {
        self.begin_fetch()
    }

    // =====================
    // Session
    // =====================

    pub fn set_password(&mut self, password: &str) {
        self.password = password.to_string();
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Submit the current password buffer
    ///
    /// On success the first fetch is issued straight away.
    pub fn submit_login(&mut self) -> Result<Option<FetchTicket>, AuthError> {
        self.session.login(&self.password)?;
        Ok(self.begin_fetch())
    }

    pub fn login(&mut self, password: &str) -> Result<Option<FetchTicket>, AuthError> {
        self.set_password(password);
        self.submit_login()
    }

    /// Log out and discard everything tied to the session
    ///
    /// Local state is reset even if the credential store fails.
    pub fn logout(&mut self) -> Result<(), CredentialError> {
        let result = self.session.logout();

        self.password.clear();
        self.records.clear();
        self.selection = None;
        self.in_flight = None;
        self.fetch_status = FetchStatus::Idle;
        self.filter = self.defaults.filter.clone();
        self.sort_key = self.defaults.sort_key;
        self.model = self.defaults.model.clone();

        result
    }

    pub fn is_authorized(&self) -> bool {
        self.session.is_authorized()
    }

    // =====================
    // Fetching
    // =====================

    /// Issue a fetch for the current model
    ///
    /// Any earlier outstanding ticket becomes stale. Returns `None` when
    /// logged out.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if !self.session.is_authorized() {
            return None;
        }

        self.last_token += 1;
        self.in_flight = Some(self.last_token);
        self.fetch_status = FetchStatus::Loading;
        log::debug!("Issuing fetch #{} for model {}", self.last_token, self.model);

        Some(FetchTicket {
            token: self.last_token,
            model: self.model.clone(),
        })
    }

    /// Re-fetch the current model
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        self.begin_fetch()
    }

    /// Apply the outcome of a fetch
    ///
    /// Returns whether the result was applied. Results for anything
    /// but the latest ticket are dropped. A failure keeps the previous
    /// records and is recorded in the fetch status.
    pub fn complete_fetch(
        &mut self,
        token: u64,
        result: Result<Vec<RiskRecord>, ScoringError>,
    ) -> bool {
        if self.in_flight != Some(token) || !self.session.is_authorized() {
            log::debug!("Discarding stale fetch #{}", token);
            return false;
        }
        self.in_flight = None;

        match result {
            Ok(records) => {
                self.records = records;
                self.fetch_status = FetchStatus::Ready { at: Utc::now() };

                if let Some(selection) = self.selection.take() {
                    match self.records.iter().find(|r| r.id == selection.id) {
                        None => {
                            log::debug!("Selected record vanished after refresh, clearing selection");
                        }
                        Some(record) if record.score != selection.seed => {
                            self.selection = Some(Selection {
                                id: selection.id,
                                seed: record.score,
                                trend: view::synthesize(record.score),
                            });
                        }
                        Some(_) => self.selection = Some(selection),
                    }
                }
            }
            Err(e) => {
                log::error!("Failed to fetch risk scores: {}", e);
                self.fetch_status = FetchStatus::Failed {
                    at: Utc::now(),
                    message: e.to_string(),
                };
            }
        }

        true
    }

    /// True exactly while the latest fetch is outstanding
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn fetch_status(&self) -> &FetchStatus {
        &self.fetch_status
    }

    // =====================
    // Selectors
    // =====================

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) {
        self.sort_key = sort_key;
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Configured models, plus the current one if it was entered by hand
    pub fn model_options(&self) -> Vec<String> {
        let mut models = self.defaults.models.clone();
        if !models.iter().any(|m| *m == self.model) {
            models.push(self.model.clone());
        }
        models
    }

    /// Switch scoring model; re-fetches only when the model actually changes
    pub fn set_model(&mut self, model: &str) -> Option<FetchTicket> {
        if self.model == model {
            return None;
        }
        self.model = model.to_string();
        self.begin_fetch()
    }

    // =====================
    // Records and selection
    // =====================

    pub fn records(&self) -> &[RiskRecord] {
        &self.records
    }

    pub fn projected(&self) -> Vec<RiskRecord> {
        view::project(&self.records, &self.filter, self.sort_key)
    }

    /// Select a record by id and synthesize its trend
    ///
    /// Returns false if no such record is currently loaded.
    pub fn select(&mut self, id: &str) -> bool {
        let Some(record) = self.records.iter().find(|r| r.id == id) else {
            return false;
        };

        self.selection = Some(Selection {
            id: record.id.clone(),
            seed: record.score,
            trend: view::synthesize(record.score),
        });
        true
    }

    pub fn deselect(&mut self) {
        self.selection = None;
    }

    pub fn selected(&self) -> Option<&RiskRecord> {
        let selection = self.selection.as_ref()?;
        self.records.iter().find(|r| r.id == selection.id)
    }

    /// Snapshot of everything the presentation layer renders
    pub fn view(&self) -> DashboardView {
        let (cards, bars) = DashboardView::from_projection(&self.projected());

        let detail = self.selection.as_ref().and_then(|selection| {
            self.selected().map(|record| Detail {
                id: record.id.clone(),
                color: view::severity_color(&record.status),
                trend: selection.trend.clone(),
            })
        });

        DashboardView {
            authorized: self.is_authorized(),
            loading: self.is_loading(),
            filter: self.filter.clone(),
            sort_key: self.sort_key,
            model: self.model.clone(),
            filter_options: Filter::options().to_vec(),
            sort_options: SortKey::options().to_vec(),
            model_options: self.model_options(),
            fetch_status: self.fetch_status.clone(),
            cards,
            bars,
            detail,
        }
    }
}
