// TopoPlan: Static Route Synthesis for Emulated Network Topologies
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module defining a router with IP forwarding and a static routing table.
//!
//! The forwarding capability of a router is a scoped resource. It is acquired when the router is
//! configured ([`Router::enable_forwarding`]) and released when the router is terminated
//! ([`Router::terminate`]). The lifecycle is:
//!
//! ```text
//! Unconfigured -> ForwardingEnabled -> RoutesInstalled -> Terminated
//! ```
//!
//! Termination is allowed from every state, and always leaves forwarding disabled.

use crate::routing::{RouteEntry, RoutingTable};
use crate::types::RouterError;
use log::*;
use serde::Serialize;
use std::fmt;

/// Lifecycle state of a router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RouterState {
    /// Freshly created router, forwarding disabled
    Unconfigured,
    /// Forwarding is enabled, the routing table is being filled
    ForwardingEnabled,
    /// All routes are installed, the table is final
    RoutesInstalled,
    /// The router was torn down, forwarding disabled
    Terminated,
}

impl fmt::Display for RouterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "Unconfigured"),
            Self::ForwardingEnabled => write!(f, "ForwardingEnabled"),
            Self::RoutesInstalled => write!(f, "RoutesInstalled"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Router
#[derive(Debug, Clone, PartialEq)]
pub struct Router {
    /// Name of the router
    name: String,
    /// Lifecycle state
    state: RouterState,
    /// IP forwarding flag, that the emulation layer translates into the kernel setting
    forwarding: bool,
    /// Static routing table
    table: RoutingTable,
}

impl Router {
    pub(crate) fn new(name: String) -> Router {
        Router {
            name,
            state: RouterState::Unconfigured,
            forwarding: false,
            table: RoutingTable::new(),
        }
    }

    /// Return the name of the Router
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Return the current lifecycle state
    pub fn state(&self) -> RouterState {
        self.state
    }

    /// Returns true if IP forwarding is enabled
    pub fn forwarding_enabled(&self) -> bool {
        self.forwarding
    }

    /// Returns the routing table
    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Enable IP forwarding. Only possible on an unconfigured router.
    pub fn enable_forwarding(&mut self) -> Result<(), RouterError> {
        self.transition(RouterState::Unconfigured, RouterState::ForwardingEnabled)?;
        self.forwarding = true;
        Ok(())
    }

    /// Freeze the routing table. Only possible while forwarding is enabled.
    pub fn finish_installation(&mut self) -> Result<(), RouterError> {
        self.transition(RouterState::ForwardingEnabled, RouterState::RoutesInstalled)
    }

    /// Terminate the router, disabling forwarding and tearing down the routing table. Terminating
    /// an already terminated router does nothing.
    pub fn terminate(&mut self) -> Result<(), RouterError> {
        if self.state != RouterState::Terminated {
            debug!("Terminating {} (was {})", self.name, self.state);
        }
        self.forwarding = false;
        self.table.clear();
        self.state = RouterState::Terminated;
        Ok(())
    }

    /// Install a route entry, replacing any entry for the same destination.
    pub(crate) fn install(&mut self, entry: RouteEntry) -> Result<Option<RouteEntry>, RouterError> {
        if self.state != RouterState::ForwardingEnabled {
            return Err(RouterError::TableLocked { router: self.name.clone(), state: self.state });
        }
        trace!("{}: install {} ({})", self.name, entry, entry.origin);
        Ok(self.table.insert(entry))
    }

    fn transition(&mut self, from: RouterState, to: RouterState) -> Result<(), RouterError> {
        if self.state != from {
            return Err(RouterError::InvalidTransition {
                router: self.name.clone(),
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}
