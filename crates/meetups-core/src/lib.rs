//! Core types: meetup records, observable values, the meetup store, formatting

pub mod error;
pub mod format;
pub mod meetup;
pub mod observable;
pub mod store;
pub mod tracing;

pub use error::{StoreError, StoreResult};
pub use format::{ellipsis, FormatOptions, JsonOutput, OutputFormat, OutputFormatter};
pub use meetup::{Meetup, MeetupPatch};
pub use observable::{Subscription, Writable};
pub use store::MeetupStore;
pub use crate::tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
