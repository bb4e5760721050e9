// SPDX-License-Identifier: Apache-2.0
//! The transfer-dispatch subsystem (spec §1, §4.4): queue, decision
//! engine, completion tracker, and pluggable dispatch policies.

mod completion;
mod dispatcher;
mod error;
/// Pluggable dispatch policies (spec §4.7, §9).
pub mod policy;
mod queue;

pub use completion::{ActiveTransfer, CompletionTracker};
pub use dispatcher::{spawn, spawn_tick_driver, Dispatcher, DispatcherHandle, QUERY_TIMEOUT};
pub use error::DispatchError;
pub use queue::{TransferQueue, BYPASS_BOUND};
