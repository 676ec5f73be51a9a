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

//! # Topology Builder
//!
//! The [`TopologyBuilder`] collects the definition of a topology (nodes, links, addresses and
//! explicit routes) and turns it into a [`TopologyPlan`]. The build runs the following phases, in
//! this order:
//!
//! 1. Reserve all statically configured addresses, then assign the automatic ones.
//! 2. Enable forwarding on every router and install the directly connected routes.
//! 3. Install the explicit default routes (and the stub default routes, if enabled).
//! 4. Run the [route synthesis](crate::synthesis).
//! 5. Apply the explicit static routes. They replace any entry for the same destination.
//! 6. Freeze every routing table.

use crate::address::AddressPlanner;
use crate::graph::TopologyGraph;
use crate::plan::TopologyPlan;
use crate::routing::{NextHop, RouteEntry, RouteOrigin};
use crate::synthesis::synthesize;
use crate::types::{LinkId, NodeId, Role, TopologyError};
use crate::Error;

use ipnet::Ipv4Net;
use log::*;
use std::net::Ipv4Addr;

/// How the address of a port is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortAddr {
    /// The port has no address (switch ports, or unnumbered interfaces)
    None,
    /// Statically configured address and prefix length
    Static(Ipv4Net),
    /// Next free address of the subnet, assigned during the build
    Auto(Ipv4Net),
}

/// One end of a link to be added to the topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    node: NodeId,
    name: Option<String>,
    addr: PortAddr,
}

impl Port {
    /// Create an unnamed port without address on the node
    pub fn new(node: NodeId) -> Self {
        Self { node, name: None, addr: PortAddr::None }
    }

    /// Set the name of the interface. Without a name, the interface is called `<node>-eth<N>`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Configure a static address
    pub fn addr(mut self, addr: Ipv4Net) -> Self {
        self.addr = PortAddr::Static(addr);
        self
    }

    /// Pick the next free address of the subnet while building
    pub fn auto(mut self, subnet: Ipv4Net) -> Self {
        self.addr = PortAddr::Auto(subnet);
        self
    }
}

impl From<NodeId> for Port {
    fn from(node: NodeId) -> Self {
        Self::new(node)
    }
}

/// Explicit route, with the egress interface resolved during the build.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RouteRule {
    router: NodeId,
    destination: Ipv4Net,
    next_hop: NextHop,
    iface: Option<String>,
}

/// # Topology Builder
///
/// ```
/// use topoplan::builder::{Port, TopologyBuilder};
/// # fn main() -> Result<(), topoplan::Error> {
/// let mut builder = TopologyBuilder::new();
/// let r1 = builder.add_router("r1")?;
/// let r2 = builder.add_router("r2")?;
/// builder.add_link(
///     Port::new(r1).addr("10.0.0.1/24".parse().unwrap()),
///     Port::new(r2).addr("10.0.0.2/24".parse().unwrap()),
/// )?;
/// let plan = builder.build()?;
/// assert_eq!(plan.routing_table("r1")?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder {
    graph: TopologyGraph,
    planner: AddressPlanner,
    pending: Vec<(NodeId, usize, PortAddr)>,
    default_routes: Vec<RouteRule>,
    static_routes: Vec<RouteRule>,
    stub_default_routes: bool,
}

impl TopologyBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host
    pub fn add_host(&mut self, name: impl Into<String>) -> Result<NodeId, Error> {
        Ok(self.graph.add_node(name, Role::Host)?)
    }

    /// Add a switch
    pub fn add_switch(&mut self, name: impl Into<String>) -> Result<NodeId, Error> {
        Ok(self.graph.add_node(name, Role::Switch)?)
    }

    /// Add a router
    pub fn add_router(&mut self, name: impl Into<String>) -> Result<NodeId, Error> {
        Ok(self.graph.add_node(name, Role::Router)?)
    }

    /// Set the default gateway of a host
    pub fn set_default_gateway(&mut self, host: NodeId, gateway: Ipv4Addr) -> Result<(), Error> {
        Ok(self.graph.set_gateway(host, gateway)?)
    }

    /// Connect two ports. Unnamed ports get the next free `<node>-eth<N>` name, where `N` counts
    /// from 0 on hosts and routers, and from 1 on switches.
    pub fn add_link(&mut self, a: impl Into<Port>, b: impl Into<Port>) -> Result<LinkId, Error> {
        let (a, b) = (a.into(), b.into());
        let (name_a, idx_a) = self.port_name(&a)?;
        let (name_b, idx_b) = self.port_name(&b)?;
        let link = self.graph.add_link(
            a.node,
            name_a,
            static_addr(a.addr),
            b.node,
            name_b,
            static_addr(b.addr),
        )?;
        for (port, idx) in vec![(a, idx_a), (b, idx_b)] {
            if port.addr != PortAddr::None {
                self.pending.push((port.node, idx, port.addr));
            }
        }
        Ok(link)
    }

    /// Returns the interface name of the port, and the position the interface will get.
    fn port_name(&self, port: &Port) -> Result<(String, usize), Error> {
        let node = self.graph.node(port.node)?;
        let idx = node.interfaces().len();
        let name = match &port.name {
            Some(name) => name.clone(),
            None if node.role() == Role::Switch => format!("{}-eth{}", node.name(), idx + 1),
            None => format!("{}-eth{}", node.name(), idx),
        };
        Ok((name, idx))
    }

    /// Install a default route on the router. The egress interface is the one on-link with the
    /// gateway.
    pub fn default_route(&mut self, router: NodeId, via: Ipv4Addr) -> Result<(), Error> {
        self.push_default(router, via, None)
    }

    /// Install a default route on the router through the named interface.
    pub fn default_route_dev(
        &mut self,
        router: NodeId,
        via: Ipv4Addr,
        iface: impl Into<String>,
    ) -> Result<(), Error> {
        self.push_default(router, via, Some(iface.into()))
    }

    fn push_default(
        &mut self,
        router: NodeId,
        via: Ipv4Addr,
        iface: Option<String>,
    ) -> Result<(), Error> {
        self.graph.router(router)?;
        self.default_routes.push(RouteRule {
            router,
            destination: default_prefix(),
            next_hop: NextHop::Via(via),
            iface,
        });
        Ok(())
    }

    /// Install a static route on the router, after the synthesis. The route replaces any entry for
    /// the same destination.
    pub fn static_route(
        &mut self,
        router: NodeId,
        destination: Ipv4Net,
        via: Ipv4Addr,
    ) -> Result<(), Error> {
        self.push_static(router, destination, NextHop::Via(via), None)
    }

    /// Install a static route on the router through the named interface.
    pub fn static_route_dev(
        &mut self,
        router: NodeId,
        destination: Ipv4Net,
        via: Ipv4Addr,
        iface: impl Into<String>,
    ) -> Result<(), Error> {
        self.push_static(router, destination, NextHop::Via(via), Some(iface.into()))
    }

    /// Install a static route on the router without a gateway. The destination is on-link with
    /// the named interface.
    pub fn static_route_dev_only(
        &mut self,
        router: NodeId,
        destination: Ipv4Net,
        iface: impl Into<String>,
    ) -> Result<(), Error> {
        self.push_static(router, destination, NextHop::Direct, Some(iface.into()))
    }

    fn push_static(
        &mut self,
        router: NodeId,
        destination: Ipv4Net,
        next_hop: NextHop,
        iface: Option<String>,
    ) -> Result<(), Error> {
        self.graph.router(router)?;
        self.static_routes.push(RouteRule {
            router,
            destination: destination.trunc(),
            next_hop,
            iface,
        });
        Ok(())
    }

    /// If enabled, every router with exactly one neighboring router gets a default route towards
    /// it, unless it has an explicit default route already. Disabled by default.
    pub fn stub_default_routes(&mut self, enable: bool) -> &mut Self {
        self.stub_default_routes = enable;
        self
    }

    /// Returns the graph built so far. Automatic addresses are not yet assigned.
    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    /// Build the topology plan.
    pub fn build(mut self) -> Result<TopologyPlan, Error> {
        self.assign_addresses()?;
        self.check_gateways();

        let routers = self.graph.routers();
        for r in routers.iter() {
            self.graph.router_mut(*r)?.enable_forwarding()?;
            self.graph.node_mut(*r)?.install_connected_routes()?;
        }
        info!("Enabled forwarding on {} routers", routers.len());

        for rule in self.default_routes.iter() {
            install_rule(&mut self.graph, rule, RouteOrigin::Default)?;
        }
        if self.stub_default_routes {
            self.install_stub_defaults()?;
        }

        synthesize(&mut self.graph)?;

        for rule in self.static_routes.iter() {
            if let Some(old) = install_rule(&mut self.graph, rule, RouteOrigin::Static)? {
                if old.origin == RouteOrigin::Connected {
                    warn!(
                        "{}: static route replaces the connected route {}",
                        self.graph.node_name(rule.router)?,
                        old
                    );
                }
            }
        }

        for r in routers.iter() {
            self.graph.router_mut(*r)?.finish_installation()?;
        }
        info!(
            "Built topology with {} nodes and {} links",
            self.graph.num_nodes(),
            self.graph.num_links()
        );

        Ok(TopologyPlan::new(self.graph, self.planner))
    }

    /// Reserve all static addresses first, such that automatic addresses never collide with them.
    fn assign_addresses(&mut self) -> Result<(), Error> {
        for (node, _, addr) in self.pending.iter() {
            if let PortAddr::Static(net) = addr {
                let subnet = self.planner.add_subnet(*net);
                self.planner.reserve(*node, subnet, net.addr())?;
            }
        }
        for (node, idx, addr) in self.pending.iter() {
            if let PortAddr::Auto(net) = addr {
                let subnet = self.planner.add_subnet(*net);
                let host = self.planner.assign(*node, subnet)?;
                self.graph.set_address(*node, *idx, Ipv4Net::new(host, subnet.prefix_len())?)?;
            }
        }
        Ok(())
    }

    /// Warn about hosts whose gateway is not on-link with any of their interfaces.
    fn check_gateways(&self) {
        for h in self.graph.hosts() {
            if let Ok(node) = self.graph.node(h) {
                if let Some(gw) = node.gateway() {
                    let on_link = node
                        .interfaces()
                        .iter()
                        .filter_map(|i| i.network())
                        .any(|n| n.contains(&gw));
                    if !on_link {
                        warn!("Gateway {} of {} is not on-link", gw, node.name());
                    }
                }
            }
        }
    }

    fn install_stub_defaults(&mut self) -> Result<(), Error> {
        for r in self.graph.routers() {
            if self.graph.router(r)?.table().default_route().is_some() {
                continue;
            }
            let adj = self.graph.transit_adjacency(r);
            let first = match adj.first() {
                Some(first) if adj.iter().all(|a| a.neighbor == first.neighbor) => *first,
                _ => continue,
            };
            let gateway = self
                .graph
                .node(first.neighbor)?
                .interface(first.remote_iface)
                .and_then(|i| i.addr())
                .map(|a| a.addr());
            let iface =
                self.graph.node(r)?.interface(first.local_iface).map(|i| i.name().to_string());
            if let (Some(gateway), Some(iface)) = (gateway, iface) {
                debug!("{}: stub default route via {}", self.graph.node_name(r)?, gateway);
                self.graph.router_mut(r)?.install(RouteEntry::via(
                    default_prefix(),
                    gateway,
                    iface,
                    RouteOrigin::Default,
                ))?;
            }
        }
        Ok(())
    }
}

fn static_addr(addr: PortAddr) -> Option<Ipv4Net> {
    match addr {
        PortAddr::Static(net) => Some(net),
        _ => None,
    }
}

fn default_prefix() -> Ipv4Net {
    Ipv4Net::default()
}

/// Install an explicit route, resolving its egress interface.
fn install_rule(
    graph: &mut TopologyGraph,
    rule: &RouteRule,
    origin: RouteOrigin,
) -> Result<Option<RouteEntry>, Error> {
    // a direct route is on-link with its destination
    let target = match rule.next_hop {
        NextHop::Via(via) => via,
        NextHop::Direct => rule.destination.network(),
    };
    let iface = resolve_egress(graph, rule.router, target, rule.iface.as_deref())?;
    let entry = RouteEntry {
        destination: rule.destination,
        next_hop: rule.next_hop,
        interface: iface,
        origin,
    };
    Ok(graph.router_mut(rule.router)?.install(entry)?)
}

/// Find the egress interface for a next hop. A named interface must exist on the router. Without
/// a name, the interface with the most specific network containing the next hop is used.
fn resolve_egress(
    graph: &TopologyGraph,
    router: NodeId,
    via: Ipv4Addr,
    iface: Option<&str>,
) -> Result<String, TopologyError> {
    let node = graph.node(router)?;
    if let Some(name) = iface {
        return match node.find_interface(name) {
            Some(_) => Ok(name.to_string()),
            None => Err(TopologyError::InterfaceNotFound {
                node: node.name().to_string(),
                iface: name.to_string(),
            }),
        };
    }
    node.interfaces()
        .iter()
        .rev()
        .filter(|i| i.network().map(|n| n.contains(&via)).unwrap_or(false))
        .max_by_key(|i| i.network().map(|n| n.prefix_len()))
        .map(|i| i.name().to_string())
        .ok_or_else(|| TopologyError::UnresolvableNextHop {
            router: node.name().to_string(),
            next_hop: via,
        })
}
