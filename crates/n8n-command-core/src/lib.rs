//! Command dispatch and connectivity tracking for an n8n webhook.
//!
//! The host owns a [`Session`] for as long as it is enabled. Text submitted by
//! the user goes through the [`Dispatcher`], which validates it, hands it to a
//! [`Transport`] and records it in the [`HistoryRing`]. A
//! [`ConnectivityMonitor`] polls the backend health endpoint in the
//! background. Everything the UI needs to render arrives as [`CoreEvent`]s.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod monitor;
mod process;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ConfigProvider, MemoryConfig, PayloadField, TransportConfig, TransportKind, UiPreferences};
pub use dispatcher::{Dispatcher, HistoryPolicy};
pub use error::DispatchError;
pub use history::HistoryRing;
pub use monitor::{ConnectivityMonitor, ConnectivityTracker, Observation};
pub use session::{Session, SessionOptions};
pub use transport::{CurlTransport, HttpTransport, SelectingTransport, Transport};
pub use types::{Command, ConnectivityState, CoreEvent, DispatchOutcome, DispatchResult};
