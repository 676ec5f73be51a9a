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

//! # Topology Graph
//!
//! Undirected multigraph of hosts, switches and routers. Every link connects two interfaces on
//! two distinct nodes, and multiple links between the same pair of nodes are allowed. Links are
//! numbered in insertion order, and every ordered view of the graph (adjacency, subnets) follows
//! this order, such that everything computed from the graph is reproducible.

use crate::router::Router;
use crate::routing::RouteEntry;
use crate::types::{LinkId, NodeId, Role, RouterError, TopologyError};

use ipnet::Ipv4Net;
use itertools::Itertools;
use log::*;
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};
use std::net::Ipv4Addr;

/// Interface of a node, terminating exactly one link.
#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub(crate) name: String,
    pub(crate) addr: Option<Ipv4Net>,
    pub(crate) link: LinkId,
}

impl Interface {
    /// Name of the interface
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address and prefix length of the interface, `None` for unaddressed ports.
    pub fn addr(&self) -> Option<Ipv4Net> {
        self.addr
    }

    /// Network the interface is attached to
    pub fn network(&self) -> Option<Ipv4Net> {
        self.addr.map(|a| a.trunc())
    }

    /// Link terminated by this interface
    pub fn link(&self) -> LinkId {
        self.link
    }
}

/// Role-specific part of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// End host with an optional default gateway
    Host {
        /// Default gateway of the host
        gateway: Option<Ipv4Addr>,
    },
    /// Layer-2 switch
    Switch,
    /// Router, carrying the routing table and the forwarding flag
    Router(Router),
}

/// Node of the topology
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    kind: NodeKind,
    interfaces: Vec<Interface>,
}

impl Node {
    /// Name of the node
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role of the node
    pub fn role(&self) -> Role {
        match self.kind {
            NodeKind::Host { .. } => Role::Host,
            NodeKind::Switch => Role::Switch,
            NodeKind::Router(_) => Role::Router,
        }
    }

    /// Role-specific part of the node
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// All interfaces, in the order in which their links were added
    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    /// Get the interface at the given position
    pub fn interface(&self, idx: usize) -> Option<&Interface> {
        self.interfaces.get(idx)
    }

    /// Find the position of the interface with the given name
    pub fn find_interface(&self, name: &str) -> Option<usize> {
        self.interfaces.iter().position(|i| i.name == name)
    }

    /// Returns true if any interface holds the address
    pub fn owns(&self, addr: Ipv4Addr) -> bool {
        self.interfaces.iter().any(|i| i.addr.map(|a| a.addr()) == Some(addr))
    }

    /// Default gateway (only for hosts)
    pub fn gateway(&self) -> Option<Ipv4Addr> {
        match self.kind {
            NodeKind::Host { gateway } => gateway,
            _ => None,
        }
    }

    /// Returns the router, if the node is one
    pub fn router(&self) -> Option<&Router> {
        match &self.kind {
            NodeKind::Router(r) => Some(r),
            _ => None,
        }
    }

    pub(crate) fn router_mut(&mut self) -> Option<&mut Router> {
        match &mut self.kind {
            NodeKind::Router(r) => Some(r),
            _ => None,
        }
    }

    /// Install a direct route for the network of every addressed interface.
    pub(crate) fn install_connected_routes(&mut self) -> Result<usize, RouterError> {
        let Node { interfaces, kind, .. } = self;
        let mut num = 0;
        if let NodeKind::Router(r) = kind {
            for iface in interfaces.iter() {
                if let Some(net) = iface.network() {
                    r.install(RouteEntry::connected(net, iface.name.clone()))?;
                    num += 1;
                }
            }
        }
        Ok(num)
    }
}

/// Link between two interfaces. Each endpoint is the node and the position of the interface on
/// that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    endpoints: [(NodeId, usize); 2],
}

impl Link {
    /// Both endpoints of the link
    pub fn endpoints(&self) -> [(NodeId, usize); 2] {
        self.endpoints
    }

    /// Returns the (local, remote) endpoints as seen from `node`.
    fn oriented(&self, node: NodeId) -> ((NodeId, usize), (NodeId, usize)) {
        if self.endpoints[0].0 == node {
            (self.endpoints[0], self.endpoints[1])
        } else {
            (self.endpoints[1], self.endpoints[0])
        }
    }
}

/// Entry of the adjacency view of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacency {
    /// Neighboring node
    pub neighbor: NodeId,
    /// Position of the local interface
    pub local_iface: usize,
    /// Position of the interface on the neighbor
    pub remote_iface: usize,
    /// Link connecting both
    pub link: LinkId,
}

/// # Topology Graph
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    graph: UnGraph<Node, Link>,
    names: HashMap<String, NodeId>,
}

impl TopologyGraph {
    /// Create an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new node to the topology, and return its id. Routers start unconfigured, and hosts
    /// without a default gateway.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        role: Role,
    ) -> Result<NodeId, TopologyError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(TopologyError::DuplicateNode(name));
        }
        let kind = match role {
            Role::Host => NodeKind::Host { gateway: None },
            Role::Switch => NodeKind::Switch,
            Role::Router => NodeKind::Router(Router::new(name.clone())),
        };
        let id = self.graph.add_node(Node { name: name.clone(), kind, interfaces: Vec::new() });
        debug!("Add {} {} as {:?}", role, name, id);
        self.names.insert(name, id);
        Ok(id)
    }

    /// Add a link between two interfaces on two distinct nodes. The interface names must not be
    /// used yet on their node. Addresses are optional, and the prefix length of both ends is not
    /// required to match.
    pub fn add_link(
        &mut self,
        a: NodeId,
        iface_a: impl Into<String>,
        addr_a: Option<Ipv4Net>,
        b: NodeId,
        iface_b: impl Into<String>,
        addr_b: Option<Ipv4Net>,
    ) -> Result<LinkId, TopologyError> {
        let (iface_a, iface_b) = (iface_a.into(), iface_b.into());
        let idx_a = self.check_new_interface(a, &iface_a)?;
        let idx_b = self.check_new_interface(b, &iface_b)?;
        if a == b {
            return Err(TopologyError::SelfLink(self.node(a)?.name.clone()));
        }
        if let (Some(x), Some(y)) = (addr_a, addr_b) {
            if x.prefix_len() != y.prefix_len() {
                warn!(
                    "Link {}:{} -- {}:{} has mismatched prefix lengths ({} vs {})",
                    self.graph[a].name, iface_a, self.graph[b].name, iface_b, x, y
                );
            }
        }

        let link = self.graph.add_edge(a, b, Link { endpoints: [(a, idx_a), (b, idx_b)] });
        self.graph[a].interfaces.push(Interface { name: iface_a, addr: addr_a, link });
        self.graph[b].interfaces.push(Interface { name: iface_b, addr: addr_b, link });
        Ok(link)
    }

    /// Check that the node exists and that the interface name is free, returning the position the
    /// new interface will get.
    fn check_new_interface(&self, node: NodeId, iface: &str) -> Result<usize, TopologyError> {
        let n = self.node(node)?;
        if n.find_interface(iface).is_some() {
            return Err(TopologyError::DuplicateInterface {
                node: n.name.clone(),
                iface: iface.to_string(),
            });
        }
        Ok(n.interfaces.len())
    }

    /// Set the address of an interface. Only used while the topology is built.
    pub(crate) fn set_address(
        &mut self,
        node: NodeId,
        iface: usize,
        addr: Ipv4Net,
    ) -> Result<(), TopologyError> {
        let n = self.node_mut(node)?;
        let name = n.name.clone();
        let i = n.interfaces.get_mut(iface).ok_or_else(|| TopologyError::InterfaceNotFound {
            node: name,
            iface: format!("#{}", iface),
        })?;
        i.addr = Some(addr);
        Ok(())
    }

    /// Set the default gateway of a host
    pub fn set_gateway(&mut self, host: NodeId, gateway: Ipv4Addr) -> Result<(), TopologyError> {
        let n = self.node_mut(host)?;
        match &mut n.kind {
            NodeKind::Host { gateway: gw } => {
                *gw = Some(gateway);
                Ok(())
            }
            _ => Err(TopologyError::NotAHost(n.name.clone())),
        }
    }

    /// Get a reference to the node
    pub fn node(&self, id: NodeId) -> Result<&Node, TopologyError> {
        self.graph.node_weight(id).ok_or(TopologyError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TopologyError> {
        self.graph.node_weight_mut(id).ok_or(TopologyError::NodeNotFound(id))
    }

    /// Get the id of the node with the given name
    pub fn node_id(&self, name: impl AsRef<str>) -> Result<NodeId, TopologyError> {
        self.names
            .get(name.as_ref())
            .copied()
            .ok_or_else(|| TopologyError::NodeNameNotFound(name.as_ref().to_string()))
    }

    /// Get the name of the node
    pub fn node_name(&self, id: NodeId) -> Result<&str, TopologyError> {
        Ok(self.node(id)?.name())
    }

    /// Get a reference to the router
    pub fn router(&self, id: NodeId) -> Result<&Router, TopologyError> {
        let n = self.node(id)?;
        n.router().ok_or_else(|| TopologyError::NotARouter(n.name.clone()))
    }

    pub(crate) fn router_mut(&mut self, id: NodeId) -> Result<&mut Router, TopologyError> {
        let n = self.node_mut(id)?;
        let name = n.name.clone();
        n.router_mut().ok_or(TopologyError::NotARouter(name))
    }

    /// Iterate over all nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.graph.node_indices().map(move |id| (id, &self.graph[id]))
    }

    /// Ids of all nodes with the given role, in insertion order
    pub fn nodes_with_role(&self, role: Role) -> Vec<NodeId> {
        self.nodes().filter(|(_, n)| n.role() == role).map(|(id, _)| id).collect()
    }

    /// Ids of all routers, in insertion order
    pub fn routers(&self) -> Vec<NodeId> {
        self.nodes_with_role(Role::Router)
    }

    /// Ids of all hosts, in insertion order
    pub fn hosts(&self) -> Vec<NodeId> {
        self.nodes_with_role(Role::Host)
    }

    /// Iterate over all links, in insertion order
    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.graph.edge_indices().map(move |id| (id, &self.graph[id]))
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of links
    pub fn num_links(&self) -> usize {
        self.graph.edge_count()
    }

    /// Adjacency view of a node: every neighbor together with the local interface and the link,
    /// ordered by link insertion. A neighbor appears once per parallel link.
    pub fn adjacency(&self, node: NodeId) -> Vec<Adjacency> {
        self.graph
            .edges(node)
            .map(|e| {
                let ((_, local), (neighbor, remote)) = e.weight().oriented(node);
                Adjacency { neighbor, local_iface: local, remote_iface: remote, link: e.id() }
            })
            .sorted_by_key(|a| a.link)
            .collect()
    }

    /// Adjacency restricted to links that can carry routed traffic: both ends are routers, and
    /// both interfaces are addressed.
    pub fn transit_adjacency(&self, node: NodeId) -> Vec<Adjacency> {
        if self.graph.node_weight(node).and_then(|n| n.router()).is_none() {
            return Vec::new();
        }
        self.adjacency(node)
            .into_iter()
            .filter(|a| self.graph[a.neighbor].router().is_some())
            .filter(|a| self.graph[node].interfaces[a.local_iface].addr.is_some())
            .filter(|a| self.graph[a.neighbor].interfaces[a.remote_iface].addr.is_some())
            .collect()
    }

    /// All subnets of the topology, each with the nodes attached to it. A node is attached to a
    /// subnet if one of its interfaces has an address whose network is the subnet. Subnets are
    /// ordered by the first node (and interface) attached to them.
    pub fn subnets(&self) -> Vec<(Ipv4Net, Vec<NodeId>)> {
        let mut result: Vec<(Ipv4Net, Vec<NodeId>)> = Vec::new();
        for (id, node) in self.nodes() {
            for net in node.interfaces.iter().filter_map(|i| i.network()) {
                match result.iter_mut().find(|(n, _)| *n == net) {
                    Some((_, attached)) if !attached.contains(&id) => attached.push(id),
                    Some(_) => {}
                    None => result.push((net, vec![id])),
                }
            }
        }
        result
    }

    /// Routers that deliver packets into the subnet. These are the routers attached to the
    /// subnet, plus every router sharing a layer 2 segment with a member of the subnet if the
    /// router's network on that segment overlaps the subnet. The two ends of a link may use
    /// different prefix lengths.
    pub fn gateways(&self, subnet: &Ipv4Net) -> Vec<NodeId> {
        let overlaps = |net: Ipv4Net| net.contains(subnet) || subnet.contains(&net);
        let mut result: Vec<NodeId> = Vec::new();
        for (id, node) in self.nodes() {
            for (idx, iface) in node.interfaces.iter().enumerate() {
                if iface.network() != Some(*subnet) {
                    continue;
                }
                if node.router().is_some() && !result.contains(&id) {
                    result.push(id);
                }
                for (remote, remote_iface) in self.l2_segment(id, idx) {
                    let remote_node = &self.graph[remote];
                    let on_segment = remote_node
                        .interfaces
                        .get(remote_iface)
                        .and_then(|i| i.network())
                        .map(overlaps)
                        .unwrap_or(false);
                    if on_segment && remote_node.router().is_some() && !result.contains(&remote) {
                        result.push(remote);
                    }
                }
            }
        }
        result
    }

    /// Returns all non-switch endpoints reachable on layer 2 from the interface, crossing any
    /// number of switches. The interface itself is not part of the result.
    pub fn l2_segment(&self, node: NodeId, iface: usize) -> Vec<(NodeId, usize)> {
        let mut result = Vec::new();
        let link = match self.graph.node_weight(node).and_then(|n| n.interfaces.get(iface)) {
            Some(i) => i.link,
            None => return result,
        };
        let mut visited_links: HashSet<LinkId> = HashSet::new();
        let mut visited_switches: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<(LinkId, NodeId)> = VecDeque::new();
        queue.push_back((link, node));
        visited_links.insert(link);
        while let Some((link, from)) = queue.pop_front() {
            let (_, (remote, remote_iface)) = self.graph[link].oriented(from);
            if self.graph[remote].role() == Role::Switch {
                if visited_switches.insert(remote) {
                    for adj in self.adjacency(remote) {
                        if visited_links.insert(adj.link) {
                            queue.push_back((adj.link, remote));
                        }
                    }
                }
            } else if (remote, remote_iface) != (node, iface) {
                result.push((remote, remote_iface));
            }
        }
        result
    }

    /// Find the endpoint on the layer 2 segment of the interface that holds the address.
    pub fn owner_in_segment(
        &self,
        node: NodeId,
        iface: usize,
        addr: Ipv4Addr,
    ) -> Option<(NodeId, usize)> {
        self.l2_segment(node, iface).into_iter().find(|(n, i)| {
            self.graph[*n].interfaces[*i].addr.map(|a| a.addr()) == Some(addr)
        })
    }
}
