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

#![deny(missing_docs)]

//! # TopoPlan: Static Route Synthesis for Emulated Network Topologies
//! This is a library for describing network topologies of hosts, switches and routers, planning
//! their addresses, and computing the static routes every router needs, such that every host can
//! reach every other host. The result is a [`TopologyPlan`], which an emulation layer (see the
//! `topoplan_runtime` crate) translates into the commands to execute on every node.
//!
//! ## Structure
//!
//! This library is structured in the following way:
//!
//! - **[`AddressPlanner`](address::AddressPlanner)**: Keeps track of all subnets and hands out
//!   addresses, either explicitly reserved or automatically assigned from the host range.
//!
//! - **[`TopologyGraph`](graph::TopologyGraph)**: Undirected multigraph of nodes and links. Every
//!   link connects two named interfaces. The graph provides ordered adjacency views, such that
//!   everything computed from it is deterministic.
//!
//! - **[`Router`](router::Router)**: Router with IP forwarding and a static
//!   [`RoutingTable`](routing::RoutingTable). Routers follow the lifecycle
//!   `Unconfigured -> ForwardingEnabled -> RoutesInstalled -> Terminated`.
//!
//! - **[`RouteSynthesizer`](synthesis::RouteSynthesizer)**: Computes the routes towards every
//!   subnet that is not directly attached, using shortest paths on the router-only subgraph.
//!
//! - **[`TopologyBuilder`](builder::TopologyBuilder)**: Orchestrates the build, from the topology
//!   definition to the [`TopologyPlan`](plan::TopologyPlan).
//!
//! - **[`ForwardingChecker`](forwarding::ForwardingChecker)**: Follows packets through the plan to
//!   check that all hosts can reach each other, detecting forwarding loops and black holes.
//!
//! - **[`Printer`](printer)**: Helper functions to format routing tables and plans.
//!
//! - **[`ExampleTopologies`](example_topologies)**: Collection of topologies for testing.
//!
//! ## Example
//!
//! ```
//! use topoplan::{Port, TopologyBuilder};
//! use topoplan::routing::NextHop;
//!
//! # fn main() -> Result<(), topoplan::Error> {
//! let mut b = TopologyBuilder::new();
//! let r1 = b.add_router("r1")?;
//! let r2 = b.add_router("r2")?;
//! let h1 = b.add_host("h1")?;
//! let h2 = b.add_host("h2")?;
//!
//! b.add_link(
//!     Port::new(h1).addr("192.168.1.100/24".parse().unwrap()),
//!     Port::new(r1).addr("192.168.1.1/24".parse().unwrap()),
//! )?;
//! b.add_link(
//!     Port::new(r1).addr("10.0.0.1/30".parse().unwrap()),
//!     Port::new(r2).addr("10.0.0.2/30".parse().unwrap()),
//! )?;
//! b.add_link(
//!     Port::new(r2).addr("172.16.0.1/24".parse().unwrap()),
//!     Port::new(h2).addr("172.16.0.100/24".parse().unwrap()),
//! )?;
//! b.set_default_gateway(h1, "192.168.1.1".parse().unwrap())?;
//! b.set_default_gateway(h2, "172.16.0.1".parse().unwrap())?;
//!
//! let plan = b.build()?;
//!
//! let entry = plan.routing_table("r1")?.get(&"172.16.0.0/24".parse().unwrap()).unwrap();
//! assert_eq!(entry.next_hop, NextHop::Via("10.0.0.2".parse().unwrap()));
//! assert_eq!(entry.interface, "r1-eth1");
//! assert_eq!(plan.check_reachability()?, 2);
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod builder;
pub mod error;
pub mod example_topologies;
pub mod forwarding;
pub mod graph;
pub mod plan;
pub mod printer;
pub mod router;
pub mod routing;
pub mod synthesis;
pub mod types;

pub use builder::{Port, TopologyBuilder};
pub use error::Error;
pub use plan::TopologyPlan;

mod test;
