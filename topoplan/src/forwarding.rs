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

//! # Forwarding Checker
//!
//! Follows a packet hop by hop through the planned topology. Hosts send packets either directly
//! (if the destination is on-link) or to their default gateway. Routers pick the egress using a
//! longest prefix match on their routing table. On every hop, the next node is the owner of the
//! next-hop address on the layer-2 segment of the egress interface, crossing any number of
//! switches.

use crate::graph::{NodeKind, TopologyGraph};
use crate::routing::NextHop;
use crate::types::{ForwardingError, NodeId};
use crate::Error;

use log::*;
use std::net::Ipv4Addr;

/// # Forwarding Checker
#[derive(Debug, Clone, Copy)]
pub struct ForwardingChecker<'a> {
    graph: &'a TopologyGraph,
}

impl<'a> ForwardingChecker<'a> {
    /// Create a checker for the graph
    pub fn new(graph: &'a TopologyGraph) -> Self {
        Self { graph }
    }

    /// Returns the path from `source` to the node owning `dest`. The path contains every host and
    /// router that was traversed, starting with `source`. Switches are not part of the path.
    pub fn get_route(&self, source: NodeId, dest: Ipv4Addr) -> Result<Vec<NodeId>, Error> {
        let mut path = vec![source];
        let mut current = source;
        loop {
            let node = self.graph.node(current)?;
            if node.owns(dest) {
                return Ok(path);
            }

            let (iface, next_addr) = match node.kind() {
                NodeKind::Host { gateway } => {
                    if current != source {
                        return Err(ForwardingError::BlackHole(self.names(&path)).into());
                    }
                    let on_link = |addr: Ipv4Addr| {
                        node.interfaces()
                            .iter()
                            .position(|i| i.network().map(|n| n.contains(&addr)).unwrap_or(false))
                    };
                    match (on_link(dest), gateway) {
                        (Some(i), _) => (i, dest),
                        (None, Some(gw)) => match on_link(*gw) {
                            Some(i) => (i, *gw),
                            None => {
                                return Err(ForwardingError::BlackHole(self.names(&path)).into())
                            }
                        },
                        (None, None) => {
                            return Err(ForwardingError::BlackHole(self.names(&path)).into())
                        }
                    }
                }
                NodeKind::Router(r) => {
                    if current != source && !r.forwarding_enabled() {
                        let name = r.name().to_string();
                        return Err(ForwardingError::ForwardingDisabled(name).into());
                    }
                    let entry = match r.table().lookup(dest) {
                        Some(entry) => entry,
                        None => return Err(ForwardingError::BlackHole(self.names(&path)).into()),
                    };
                    let iface = match node.find_interface(&entry.interface) {
                        Some(iface) => iface,
                        None => return Err(ForwardingError::BlackHole(self.names(&path)).into()),
                    };
                    match entry.next_hop {
                        NextHop::Direct => (iface, dest),
                        NextHop::Via(gw) => (iface, gw),
                    }
                }
                NodeKind::Switch => {
                    return Err(ForwardingError::BlackHole(self.names(&path)).into());
                }
            };

            let next = match self.graph.owner_in_segment(current, iface, next_addr) {
                Some((next, _)) => next,
                None => {
                    return Err(ForwardingError::NoAddressOwner {
                        addr: next_addr,
                        path: self.names(&path),
                    }
                    .into())
                }
            };
            let is_loop = path.contains(&next);
            path.push(next);
            if is_loop {
                return Err(ForwardingError::ForwardingLoop(self.names(&path)).into());
            }
            current = next;
        }
    }

    /// Check that every host can reach every address of every other host. Returns the number of
    /// checked (source, destination) pairs.
    pub fn check_all_hosts(&self) -> Result<usize, Error> {
        let hosts = self.graph.hosts();
        let mut num = 0;
        for src in hosts.iter() {
            for dst in hosts.iter().filter(|h| *h != src) {
                let addrs = self.graph.node(*dst)?.interfaces().iter().filter_map(|i| i.addr());
                for addr in addrs {
                    let path = self.get_route(*src, addr.addr())?;
                    trace!("{:?} -> {}: {:?}", src, addr.addr(), self.names(&path));
                    num += 1;
                }
            }
        }
        debug!("Checked {} host pairs", num);
        Ok(num)
    }

    fn names(&self, path: &[NodeId]) -> Vec<String> {
        path.iter()
            .map(|n| self.graph.node_name(*n).unwrap_or("?").to_string())
            .collect()
    }
}
