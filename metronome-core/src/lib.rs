//! # Metronome Core
//!
//! Core library for metronome, a heartbeat that emits one random integer
//! per interval to an output stream.
//!
//! ## Overview
//!
//! Every beat asks the [`selector::FallbackSelector`] for a value. When an
//! API credential is configured the selector first tries the remote
//! RANDOM.ORG service; any failure of that path (network, protocol,
//! validation, timeout) is logged and replaced by a draw from the local
//! pseudo-random generator, so a beat never fails because of the remote
//! service.
//!
//! ## Architecture
//!
//! - [`config`]: validated, read-only run configuration
//! - [`source`]: remote and local bounded integer sources
//! - [`selector`]: remote-first, local-fallback value acquisition
//! - [`sink`]: line-oriented output with per-value flush
//! - [`heartbeat`]: the scheduling loop and its cancellation handling
//! - [`error`]: error types shared by the modules above
//!
//! ## Examples
//!
//! ```no_run
//! use metronome_core::{
//!     config::{Configuration, Interval, Range},
//!     heartbeat::Heartbeat,
//!     selector::FallbackSelector,
//!     sink::LineSink,
//!     source::{LocalIntegerSource, RandomOrgClient},
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! async fn once() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Configuration::new(Range::new(1, 10)?, None, Interval::ZERO);
//!     let remote = RandomOrgClient::new(&config.remote)?;
//!     let selector = FallbackSelector::new(
//!         config.credential.clone(),
//!         remote,
//!         LocalIntegerSource::from_entropy(),
//!     );
//!     let mut heartbeat = Heartbeat::new(
//!         &config,
//!         selector,
//!         LineSink::new(std::io::stdout()),
//!         CancellationToken::new(),
//!     );
//!     heartbeat.run().await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Run configuration: range, credential, interval and remote settings
pub mod config;
/// Error types
pub mod error;
/// Heartbeat scheduler
pub mod heartbeat;
/// Remote-first value acquisition with local fallback
pub mod selector;
/// Output sinks
pub mod sink;
/// Bounded integer sources
pub mod source;

pub use config::{BeatMode, Configuration, Credential, Interval, Range};
pub use error::{ConfigError, HeartbeatError, RemoteError, SinkError};
pub use heartbeat::{Heartbeat, HeartbeatState, RunSummary, StopReason};
pub use selector::{FallbackSelector, GeneratedValue, ValueOrigin};
