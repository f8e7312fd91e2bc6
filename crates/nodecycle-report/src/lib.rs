//! nodecycle-report — turns a `RunOutcome` into something humans read.
//!
//! Rendering is pure (text and Slack payload builders); only the Slack
//! reporter itself performs I/O. When no Slack credentials are
//! configured the reporter degrades to a no-op, matching the behavior
//! of a run driven purely by logs.
//!
//! # Components
//!
//! - **`render`** — severity mapping and plain-text summary
//! - **`slack`** — `chat.postMessage` payload and delivery
//! - **`error`** — `ReportError`

pub mod error;
pub mod render;
pub mod slack;

pub use error::ReportError;
pub use render::{Severity, render_text, severity};
pub use slack::{Reporter, SlackReporter};
