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

//! Module containing all type definitions

use crate::router::RouterState;
use ipnet::Ipv4Net;
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

type IndexType = u32;
/// Node Identification (and index into the graph)
pub type NodeId = NodeIndex<IndexType>;
/// Link Identification (and index into the graph)
pub type LinkId = EdgeIndex<IndexType>;

/// Role of a node in the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End host, sends traffic to its default gateway
    Host,
    /// Layer-2 switch, carries no addresses
    Switch,
    /// Router with IP forwarding and a routing table
    Router,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Switch => write!(f, "switch"),
            Self::Router => write!(f, "router"),
        }
    }
}

/// Address planning errors
#[derive(Error, Debug, PartialEq)]
pub enum AddressError {
    /// Every address in the host range of the subnet is taken
    #[error("Subnet {0} has no free host address left")]
    AddressExhausted(Ipv4Net),
    /// The address is not part of the subnet
    #[error("Address {addr} does not lie within subnet {subnet}")]
    AddressOutOfSubnet {
        /// Requested address
        addr: Ipv4Addr,
        /// Subnet in which the address was requested
        subnet: Ipv4Net,
    },
    /// The address is already held by a different node
    #[error("Address {addr} is already assigned to {owner:?}")]
    AddressInUse {
        /// Requested address
        addr: Ipv4Addr,
        /// Node currently holding the address
        owner: NodeId,
    },
    /// The subnet was never registered
    #[error("Subnet {0} is not known to the address planner")]
    UnknownSubnet(Ipv4Net),
}

/// Topology construction errors
#[derive(Error, Debug, PartialEq)]
pub enum TopologyError {
    /// A node with the same name already exists
    #[error("Node {0} does already exist")]
    DuplicateNode(String),
    /// The interface name is already used on this node
    #[error("Interface {iface} does already exist on {node}")]
    DuplicateInterface {
        /// Name of the node
        node: String,
        /// Name of the interface
        iface: String,
    },
    /// Node is not present in the topology
    #[error("Node was not found in topology: {0:?}")]
    NodeNotFound(NodeId),
    /// Node name is not present in the topology
    #[error("Node name was not found in topology: {0}")]
    NodeNameNotFound(String),
    /// Both ends of a link are on the same node
    #[error("Cannot connect {0} to itself")]
    SelfLink(String),
    /// The node must be a router
    #[error("Node {0} is not a router")]
    NotARouter(String),
    /// The node must be a host
    #[error("Node {0} is not a host")]
    NotAHost(String),
    /// The interface does not exist on the node
    #[error("Interface {iface} does not exist on {node}")]
    InterfaceNotFound {
        /// Name of the node
        node: String,
        /// Name of the interface
        iface: String,
    },
    /// None of the interfaces of the router is on-link with the next hop
    #[error("Next hop {next_hop} is not on-link for any interface of {router}")]
    UnresolvableNextHop {
        /// Name of the router
        router: String,
        /// Next hop address
        next_hop: Ipv4Addr,
    },
}

/// Router lifecycle errors
#[derive(Error, Debug, PartialEq)]
pub enum RouterError {
    /// The requested state transition is not allowed
    #[error("Router {router} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Name of the router
        router: String,
        /// Current state
        from: RouterState,
        /// Requested state
        to: RouterState,
    },
    /// The routing table can only be changed while forwarding is enabled and routes are not yet
    /// installed.
    #[error("Routing table of {router} cannot be changed in state {state}")]
    TableLocked {
        /// Name of the router
        router: String,
        /// Current state
        state: RouterState,
    },
}

/// Route synthesis errors
#[derive(Error, Debug, PartialEq)]
pub enum SynthesisError {
    /// A subnet cannot be reached from a router. The topology is disconnected.
    #[error("Subnet {subnet} is unreachable from router {router}")]
    UnreachableSubnet {
        /// Name of the router
        router: String,
        /// Subnet without any route
        subnet: Ipv4Net,
    },
}

/// Errors found while following packets through the planned network. Paths contain the names of
/// all hosts and routers that were traversed.
#[derive(Error, Debug, PartialEq)]
pub enum ForwardingError {
    /// Forwarding loop detected
    #[error("Forwarding Loop occurred! path: {0:?}")]
    ForwardingLoop(Vec<String>),
    /// Black hole detected
    #[error("Black hole occurred! path: {0:?}")]
    BlackHole(Vec<String>),
    /// A router on the path has forwarding disabled
    #[error("Router {0} does not forward packets")]
    ForwardingDisabled(String),
    /// No node on the layer-2 segment holds the address of the next hop
    #[error("Nobody on the segment holds {addr}! path: {path:?}")]
    NoAddressOwner {
        /// Address that was resolved
        addr: Ipv4Addr,
        /// Path up to the failing node
        path: Vec<String>,
    },
}
