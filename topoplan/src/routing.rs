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

//! # Routing Table
//!
//! Static routing table of a router. The table is keyed by the destination prefix, and an insert
//! for an existing prefix replaces the old entry (like `ip route replace`). Entries keep the order
//! in which their prefix was first installed.

use ipnet::Ipv4Net;
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;

/// Next hop of a route entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NextHop {
    /// The destination is on-link
    Direct,
    /// Forward to the gateway with this address
    Via(Ipv4Addr),
}

impl NextHop {
    /// Returns the gateway address, or `None` for direct routes
    pub fn gateway(&self) -> Option<Ipv4Addr> {
        match self {
            Self::Direct => None,
            Self::Via(a) => Some(*a),
        }
    }
}

/// Where a route entry comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteOrigin {
    /// Derived from the address of a local interface
    Connected,
    /// Explicitly installed default route
    Default,
    /// Computed by the route synthesis
    Synthesized,
    /// Explicitly installed static route
    Static,
}

impl fmt::Display for RouteOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Default => write!(f, "default"),
            Self::Synthesized => write!(f, "synthesized"),
            Self::Static => write!(f, "static"),
        }
    }
}

/// Single entry of a routing table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RouteEntry {
    /// Destination prefix
    pub destination: Ipv4Net,
    /// Next hop
    pub next_hop: NextHop,
    /// Name of the egress interface
    pub interface: String,
    /// Origin of the entry
    pub origin: RouteOrigin,
}

impl RouteEntry {
    /// Create a route for a directly connected network
    pub fn connected(destination: Ipv4Net, interface: impl Into<String>) -> Self {
        Self {
            destination: destination.trunc(),
            next_hop: NextHop::Direct,
            interface: interface.into(),
            origin: RouteOrigin::Connected,
        }
    }

    /// Create a route towards a gateway
    pub fn via(
        destination: Ipv4Net,
        gateway: Ipv4Addr,
        interface: impl Into<String>,
        origin: RouteOrigin,
    ) -> Self {
        Self {
            destination: destination.trunc(),
            next_hop: NextHop::Via(gateway),
            interface: interface.into(),
            origin,
        }
    }

    /// Returns true if the entry is a catch-all route (`0.0.0.0/0`)
    pub fn is_default(&self) -> bool {
        self.destination.prefix_len() == 0
    }

    /// Returns true if the entry was installed explicitly, and not derived by the planner.
    pub fn is_explicit(&self) -> bool {
        matches!(self.origin, RouteOrigin::Default | RouteOrigin::Static)
    }
}

impl fmt::Display for RouteEntry {
    /// Formats the entry like the arguments of `ip route`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            write!(f, "default")?;
        } else {
            write!(f, "{}", self.destination)?;
        }
        if let NextHop::Via(gw) = self.next_hop {
            write!(f, " via {}", gw)?;
        }
        write!(f, " dev {}", self.interface)
    }
}

/// Routing table, as an ordered list of entries with unique destinations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoutingTable {
    entries: Vec<RouteEntry>,
}

impl RoutingTable {
    /// Create an empty routing table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. If an entry for the same destination exists, it is replaced at its
    /// position, and the old entry is returned.
    pub fn insert(&mut self, entry: RouteEntry) -> Option<RouteEntry> {
        match self.entries.iter_mut().find(|e| e.destination == entry.destination) {
            Some(old) => Some(std::mem::replace(old, entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    /// Remove the entry for the destination
    pub fn remove(&mut self, destination: &Ipv4Net) -> Option<RouteEntry> {
        let pos = self.entries.iter().position(|e| &e.destination == destination)?;
        Some(self.entries.remove(pos))
    }

    /// Get the entry for exactly this destination
    pub fn get(&self, destination: &Ipv4Net) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| &e.destination == destination)
    }

    /// Returns the default route, if one is installed
    pub fn default_route(&self) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| e.is_default())
    }

    /// Find the best matching entry for an address, using longest prefix matching
    pub fn lookup(&self, addr: Ipv4Addr) -> Option<&RouteEntry> {
        self.entries
            .iter()
            .filter(|e| e.destination.contains(&addr))
            .max_by_key(|e| e.destination.prefix_len())
    }

    /// Returns the most specific explicit entry whose destination strictly contains `prefix`.
    pub fn covering_explicit(&self, prefix: &Ipv4Net) -> Option<&RouteEntry> {
        self.entries
            .iter()
            .filter(|e| e.is_explicit())
            .filter(|e| e.destination.prefix_len() < prefix.prefix_len())
            .filter(|e| e.destination.contains(prefix))
            .max_by_key(|e| e.destination.prefix_len())
    }

    /// Iterate over all entries, in installation order
    pub fn iter(&self) -> std::slice::Iter<'_, RouteEntry> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.entries.clear()
    }
}

impl<'a> IntoIterator for &'a RoutingTable {
    type Item = &'a RouteEntry;
    type IntoIter = std::slice::Iter<'a, RouteEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
