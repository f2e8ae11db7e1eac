pub mod config;
pub mod credentials;
pub mod dashboard;
pub mod models;
pub mod output;
pub mod scoring;
pub mod session;
pub mod view;

// Re-export commonly used types
pub use models::{Filter, RiskRecord, SortKey, Status};
pub use credentials::{CredentialStore, MemoryCredentialStore, SqliteCredentialStore};
pub use session::{AuthError, SessionGate};
pub use scoring::{ScoreSource, ScoringClient, ScoringError};
pub use view::{project, severity_color, synthesize, Color, DashboardView};
pub use dashboard::{DashboardController, DashboardRuntime};
