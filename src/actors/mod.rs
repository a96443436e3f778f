//! Long-running loops of the agent and the hub
//!
//! Each actor runs as an independent tokio task and is controlled through a
//! cloneable handle that sends commands over an mpsc channel.
//!
//! ## Actor Types
//!
//! - **CollectorActor** (agent): samples the host at a fixed interval and
//!   pushes the reading to the hub
//! - **CleanupActor** (hub): periodic retention pass over the registry
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: each actor has an mpsc command channel for control messages
//! 2. **Request/Response**: oneshot channels for queries
//! 3. **Shutdown**: a process-wide `watch` channel; setting it to `true` (or
//!    dropping the sender) stops every actor at its next wait

use tokio::sync::watch;

pub mod cleanup;
pub mod collector;
pub mod messages;

/// Resolves once shutdown is signalled or the signal sender is gone
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
