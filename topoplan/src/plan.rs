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

//! # Topology Plan
//!
//! The finished result of a [`TopologyBuilder`](crate::builder::TopologyBuilder): the graph with
//! all addresses assigned, the address plan, and the final routing table of every router. The
//! emulation layer consumes the plan to create the nodes and links, to set the forwarding flag and
//! to install the routes.

use crate::address::AddressPlanner;
use crate::forwarding::ForwardingChecker;
use crate::graph::TopologyGraph;
use crate::router::{Router, RouterState};
use crate::routing::{RouteEntry, RoutingTable};
use crate::types::{NodeId, Role};
use crate::Error;

use ipnet::Ipv4Net;
use log::*;
use serde::Serialize;
use std::net::Ipv4Addr;

/// # Topology Plan
#[derive(Debug, Clone)]
pub struct TopologyPlan {
    graph: TopologyGraph,
    planner: AddressPlanner,
}

impl TopologyPlan {
    pub(crate) fn new(graph: TopologyGraph, planner: AddressPlanner) -> Self {
        Self { graph, planner }
    }

    /// Returns the topology graph
    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    /// Returns the address plan
    pub fn planner(&self) -> &AddressPlanner {
        &self.planner
    }

    /// Get the id of the node with the given name
    pub fn node_id(&self, name: impl AsRef<str>) -> Result<NodeId, Error> {
        Ok(self.graph.node_id(name)?)
    }

    /// Get the router with the given name
    pub fn router(&self, name: impl AsRef<str>) -> Result<&Router, Error> {
        let id = self.graph.node_id(name)?;
        Ok(self.graph.router(id)?)
    }

    /// Get the routing table of the router with the given name
    pub fn routing_table(&self, name: impl AsRef<str>) -> Result<&RoutingTable, Error> {
        Ok(self.router(name)?.table())
    }

    /// Iterate over all routers, in insertion order
    pub fn routers(&self) -> impl Iterator<Item = &Router> {
        self.graph.nodes().filter_map(|(_, n)| n.router())
    }

    /// Returns a forwarding checker for the plan
    pub fn forwarding(&self) -> ForwardingChecker<'_> {
        ForwardingChecker::new(&self.graph)
    }

    /// Check that every host can reach every other host. Returns the number of checked pairs.
    pub fn check_reachability(&self) -> Result<usize, Error> {
        self.forwarding().check_all_hosts()
    }

    /// Terminate every router: forwarding is disabled and the routing tables are torn down.
    pub fn terminate(&mut self) -> Result<(), Error> {
        for r in self.graph.routers() {
            self.graph.router_mut(r)?.terminate()?;
        }
        info!("Terminated all routers");
        Ok(())
    }

    /// Export the plan into a serializable structure, where all nodes are referenced by their
    /// name.
    pub fn export(&self) -> Result<PlanExport, Error> {
        let nodes = self
            .graph
            .nodes()
            .map(|(_, n)| NodeExport {
                name: n.name().to_string(),
                role: n.role(),
                interfaces: n
                    .interfaces()
                    .iter()
                    .map(|i| InterfaceExport { name: i.name().to_string(), addr: i.addr() })
                    .collect(),
                gateway: n.gateway(),
                forwarding: n.router().map(|r| r.forwarding_enabled()),
                state: n.router().map(|r| r.state()),
                routes: n.router().map(|r| r.table().iter().cloned().collect()).unwrap_or_default(),
            })
            .collect();

        let mut links = Vec::with_capacity(self.graph.num_links());
        for (_, link) in self.graph.links() {
            let [a, b] = link.endpoints();
            links.push(LinkExport { a: self.endpoint(a)?, b: self.endpoint(b)? });
        }

        let mut subnets = Vec::new();
        for subnet in self.planner.subnets() {
            let mut members = Vec::new();
            for (addr, node) in subnet.members() {
                members.push(MemberExport { addr, node: self.graph.node_name(node)?.to_string() });
            }
            subnets.push(SubnetExport { prefix: subnet.prefix(), members });
        }

        Ok(PlanExport { nodes, links, subnets })
    }

    fn endpoint(&self, (node, iface): (NodeId, usize)) -> Result<EndpointExport, Error> {
        let n = self.graph.node(node)?;
        Ok(EndpointExport {
            node: n.name().to_string(),
            iface: n.interface(iface).map(|i| i.name().to_string()).unwrap_or_default(),
        })
    }
}

/// Serializable view of a [`TopologyPlan`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanExport {
    /// All nodes, in insertion order
    pub nodes: Vec<NodeExport>,
    /// All links, in insertion order
    pub links: Vec<LinkExport>,
    /// All subnets of the address plan
    pub subnets: Vec<SubnetExport>,
}

/// Serializable node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeExport {
    /// Name of the node
    pub name: String,
    /// Role of the node
    pub role: Role,
    /// Interfaces of the node
    pub interfaces: Vec<InterfaceExport>,
    /// Default gateway (hosts only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<Ipv4Addr>,
    /// Forwarding flag (routers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarding: Option<bool>,
    /// Lifecycle state (routers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<RouterState>,
    /// Routing table, empty for hosts and switches
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteEntry>,
}

/// Serializable interface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceExport {
    /// Interface name
    pub name: String,
    /// Address of the interface
    pub addr: Option<Ipv4Net>,
}

/// Serializable link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkExport {
    /// First endpoint
    pub a: EndpointExport,
    /// Second endpoint
    pub b: EndpointExport,
}

/// Serializable link endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointExport {
    /// Name of the node
    pub node: String,
    /// Name of the interface
    pub iface: String,
}

/// Serializable subnet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubnetExport {
    /// Prefix of the subnet
    pub prefix: Ipv4Net,
    /// All assigned addresses
    pub members: Vec<MemberExport>,
}

/// Serializable subnet member
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberExport {
    /// Assigned address
    pub addr: Ipv4Addr,
    /// Name of the owner
    pub node: String,
}
