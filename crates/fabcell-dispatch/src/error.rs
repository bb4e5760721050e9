// SPDX-License-Identifier: Apache-2.0
//! Error kinds surfaced across the dispatch API (spec §7).

use fabcell_model::StationName;
use fabcell_registry::RegistryError;
use thiserror::Error;

/// Failures a caller of [`crate::DispatcherHandle`] can observe.
///
/// Every other error kind in spec §7 (`InvalidState`, `MissingEntity`,
/// `StationBusy` on arrival, `CallbackFailure`, `QueryTimeout`) is
/// recovered internally and only logged — the dispatcher process never
/// aborts on them (spec §7, final paragraph). `QueryTimeout` surfaces as
/// a sentinel value from [`crate::DispatcherHandle`] queries rather than
/// an error, per spec §7.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// `RequestTransfer` named a `(from, to)` pair absent from the
    /// route map. The request is not enqueued.
    #[error("no route from {from} to {to}")]
    InvalidRoute {
        /// Requested source station.
        from: StationName,
        /// Requested destination station.
        to: StationName,
    },
    /// A registry operation rejected the call (currently only a
    /// robot re-registered with a conflicting handle).
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The dispatcher's actor task is no longer running.
    #[error("dispatcher is no longer accepting messages")]
    Closed,
}
