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

//! # Route Synthesis
//!
//! Computes the static routes every router needs to reach every subnet that is not directly
//! attached to it. Only router-router links carry transit traffic, so the shortest paths are
//! computed with a breadth-first search on the router-only subgraph.
//!
//! For a router `r` and a subnet `s` that `r` cannot reach on layer 2, the synthesis picks the
//! closest gateway of `s` (see [`TopologyGraph::gateways`]) and installs the entry
//! `s via <address of the neighbor> dev <local interface>` for the first hop of the path. When
//! multiple paths have the same length, the neighbor that was discovered first (in link
//! insertion order) wins.
//!
//! Entries that were installed explicitly are respected:
//!
//! - An explicit entry for exactly `s` is never replaced.
//! - If an explicit entry covers `s` (for instance the default route), and its gateway is a
//!   neighbor that lies on a shortest path towards `s`, then no specific entry is necessary and
//!   none is installed. Otherwise, the specific entry is installed anyway, since the covering entry
//!   would lead away from `s`.
//! - A subnet without any gateway is only reachable through a covering explicit entry. If there
//!   is none, the synthesis fails with [`SynthesisError::UnreachableSubnet`].

use crate::graph::{Adjacency, TopologyGraph};
use crate::routing::{NextHop, RouteEntry, RouteOrigin};
use crate::types::{NodeId, SynthesisError};
use crate::Error;

use ipnet::Ipv4Net;
use log::*;
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;

/// First hop of a shortest path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstHop {
    /// The neighboring router
    pub neighbor: NodeId,
    /// Position of the local interface towards the neighbor
    pub local_iface: usize,
    /// Address of the neighbor on the link
    pub gateway: Ipv4Addr,
}

/// Result of a breadth-first search from a single router.
#[derive(Debug, Clone, Default)]
pub struct ShortestPaths {
    /// Distance (in hops) to every reachable router
    dist: HashMap<NodeId, usize>,
    /// First hop towards every reachable router (except the source)
    first_hop: HashMap<NodeId, FirstHop>,
    /// Position in which each router was discovered
    discovered: HashMap<NodeId, usize>,
}

impl ShortestPaths {
    /// Distance to the router, or `None` if it is not reachable
    pub fn dist(&self, target: NodeId) -> Option<usize> {
        self.dist.get(&target).copied()
    }

    /// First hop towards the router. `None` for the source itself and unreachable routers.
    pub fn first_hop(&self, target: NodeId) -> Option<FirstHop> {
        self.first_hop.get(&target).copied()
    }

    /// Among `targets`, return the closest reachable one, together with its distance. Ties are
    /// broken by discovery order.
    pub fn closest<'a, I>(&self, targets: I) -> Option<(NodeId, usize)>
    where
        I: IntoIterator<Item = &'a NodeId>,
    {
        targets
            .into_iter()
            .filter_map(|t| self.dist(*t).map(|d| (*t, d)))
            .min_by_key(|(t, d)| (*d, self.discovered.get(t).copied().unwrap_or(usize::MAX)))
    }
}

/// # Route Synthesizer
///
/// The synthesizer only reads the graph. [`RouteSynthesizer::compute`] returns the entries that
/// need to be installed, and [`synthesize`] installs them on the routers.
#[derive(Debug)]
pub struct RouteSynthesizer<'a> {
    graph: &'a TopologyGraph,
}

impl<'a> RouteSynthesizer<'a> {
    /// Create a new synthesizer for the graph
    pub fn new(graph: &'a TopologyGraph) -> Self {
        Self { graph }
    }

    /// Breadth-first search over the router-only subgraph, starting at `source`. Neighbors are
    /// visited in link insertion order.
    pub fn shortest_paths(&self, source: NodeId) -> ShortestPaths {
        let mut sp = ShortestPaths::default();
        sp.dist.insert(source, 0);
        sp.discovered.insert(source, 0);
        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();
        queue.push_back((source, 0));
        while let Some((current, d)) = queue.pop_front() {
            let hop_of_current = sp.first_hop.get(&current).copied();
            for adj in self.graph.transit_adjacency(current) {
                if sp.dist.contains_key(&adj.neighbor) {
                    continue;
                }
                let hop = match hop_of_current {
                    Some(hop) => hop,
                    None => match self.first_hop_of(&adj) {
                        Some(hop) => hop,
                        None => continue,
                    },
                };
                let pos = sp.discovered.len();
                sp.dist.insert(adj.neighbor, d + 1);
                sp.discovered.insert(adj.neighbor, pos);
                sp.first_hop.insert(adj.neighbor, hop);
                queue.push_back((adj.neighbor, d + 1));
            }
        }
        sp
    }

    /// Turn the adjacency of the source into a first hop.
    fn first_hop_of(&self, adj: &Adjacency) -> Option<FirstHop> {
        let gateway = self.graph.node(adj.neighbor).ok()?.interface(adj.remote_iface)?.addr()?;
        Some(FirstHop {
            neighbor: adj.neighbor,
            local_iface: adj.local_iface,
            gateway: gateway.addr(),
        })
    }

    /// Compute all entries that need to be installed, per router. Routers are ordered by their id,
    /// and the entries of each router follow the order of the subnets in the graph. The
    /// computation is deterministic, and already installed entries are taken into account (see the
    /// module documentation).
    pub fn compute(&self) -> Result<Vec<(NodeId, Vec<RouteEntry>)>, SynthesisError> {
        let routers = self.graph.routers();
        let subnets = self.graph.subnets();
        let paths: HashMap<NodeId, ShortestPaths> =
            routers.iter().map(|r| (*r, self.shortest_paths(*r))).collect();

        let mut result = Vec::with_capacity(routers.len());
        for r in routers.iter() {
            let node = match self.graph.node(*r) {
                Ok(node) => node,
                Err(_) => continue,
            };
            let router = match node.router() {
                Some(router) => router,
                None => continue,
            };
            let sp = &paths[r];
            let mut entries = Vec::new();

            for (subnet, _) in subnets.iter() {
                let gateways = self.graph.gateways(subnet);
                if gateways.contains(r) {
                    continue;
                }
                if let Some(e) = router.table().get(subnet) {
                    if e.origin != RouteOrigin::Synthesized {
                        debug!("{}: keep {} entry for {}", router.name(), e.origin, subnet);
                        continue;
                    }
                }

                let (target, d) = match sp.closest(gateways.iter()) {
                    Some(x) => x,
                    None if gateways.is_empty() => {
                        if let Some(cover) = router.table().covering_explicit(subnet) {
                            debug!(
                                "{}: {} has no router, left to {}",
                                router.name(),
                                subnet,
                                cover.destination
                            );
                            continue;
                        }
                        return Err(self.unreachable(*r, *subnet));
                    }
                    None => return Err(self.unreachable(*r, *subnet)),
                };
                let hop = match sp.first_hop(target) {
                    Some(hop) => hop,
                    None => return Err(self.unreachable(*r, *subnet)),
                };

                if let Some(cover) = router.table().covering_explicit(subnet) {
                    if self.leads_towards(*r, cover.next_hop, &gateways, d, &paths) {
                        debug!(
                            "{}: {} is covered by {} ({})",
                            router.name(),
                            subnet,
                            cover.destination,
                            cover.origin
                        );
                        continue;
                    }
                }

                let iface = node
                    .interface(hop.local_iface)
                    .map(|i| i.name().to_string())
                    .ok_or_else(|| self.unreachable(*r, *subnet))?;
                entries.push(RouteEntry::via(
                    *subnet,
                    hop.gateway,
                    iface,
                    RouteOrigin::Synthesized,
                ));
            }
            result.push((*r, entries));
        }
        Ok(result)
    }

    /// Check if the gateway of a covering entry is a neighbor of `router` that is one hop closer
    /// to the subnet (attached to `targets`, at distance `d` from `router`).
    fn leads_towards(
        &self,
        router: NodeId,
        next_hop: NextHop,
        targets: &[NodeId],
        d: usize,
        paths: &HashMap<NodeId, ShortestPaths>,
    ) -> bool {
        let gateway = match next_hop {
            NextHop::Via(gw) => gw,
            NextHop::Direct => return false,
        };
        self.graph
            .transit_adjacency(router)
            .into_iter()
            .filter(|adj| self.first_hop_of(adj).map(|h| h.gateway) == Some(gateway))
            .filter_map(|adj| paths.get(&adj.neighbor))
            .filter_map(|sp| sp.closest(targets.iter()))
            .any(|(_, nd)| nd + 1 == d)
    }

    fn unreachable(&self, router: NodeId, subnet: Ipv4Net) -> SynthesisError {
        SynthesisError::UnreachableSubnet {
            router: self.graph.node_name(router).unwrap_or("?").to_string(),
            subnet,
        }
    }
}

/// Run the route synthesis on the graph and install all computed entries. Returns the number of
/// installed entries. All routers must have forwarding enabled.
pub fn synthesize(graph: &mut TopologyGraph) -> Result<usize, Error> {
    let computed = RouteSynthesizer::new(graph).compute()?;
    let mut num = 0;
    for (r, entries) in computed {
        let router = graph.router_mut(r)?;
        for entry in entries {
            router.install(entry)?;
            num += 1;
        }
    }
    info!("Synthesized {} static routes", num);
    Ok(num)
}
