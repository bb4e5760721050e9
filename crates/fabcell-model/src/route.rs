// SPDX-License-Identifier: Apache-2.0
//! Route identifiers. The routes themselves (and which robots are
//! eligible for each) are defined in `fabcell-route`; this type just
//! gives the rest of the workspace a stable id to refer to without
//! depending on the route table.

use serde::{Deserialize, Serialize};

/// A route id from the closed route table (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteId(pub u8);
