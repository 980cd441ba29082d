//! Resource watcher: filesystem changes to dirty bundles.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher
//!         | raw events (bounded, overflow dropped)
//!   event thread ── classify ──> bounded queue
//!                                    |
//!                          processing thread
//!                    waits on RebuildGate, drains queue,
//!                    matches PathRegistry, extends recursive
//!                    mappings over new directories
//!                                    |
//!                          DirtyBundleHandler
//! ```
//!
//! The watcher never rebuilds. It reports dirty bundles and exposes
//! [`ResourceWatcher::has_no_pending_work`] so the orchestrator can pick a
//! quiet moment to rebuild under the gate.

mod error;
mod event;
mod gate;
mod handle;
mod handler;
mod path_registry;
mod processor;
mod quiescence;
mod resource_watcher;

pub use error::WatchError;
pub use event::{WatchEvent, WatchEventKind, classify};
pub use gate::{RebuildGate, RebuildGuard};
pub use handler::DirtyBundleHandler;
pub use path_registry::PathRegistry;
pub use quiescence::Quiescence;
pub use resource_watcher::{ResourceWatcher, ResourceWatcherBuilder};
