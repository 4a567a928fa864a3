#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::doc_markdown,
    clippy::map_unwrap_or,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

pub mod buffer;
pub mod config;
pub mod container;
pub mod delivery;
pub mod error;
pub mod flush;
pub mod handlers;
pub mod network;
pub mod recording;
pub mod session;
pub mod transport;
pub(crate) mod util;

pub use config::ReplayConfig;
pub use container::{
    CaptureHook, NoopCaptureHook, RecordingMode, ReplayContainer, ReplayDependencies,
};
pub use error::ReplayError;
