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

//! # Node Commands
//!
//! Renders the shell commands that bring a planned node into its configured state, and that tear
//! it down again. Connected routes are never rendered, since the kernel installs them as soon as
//! the interface address is assigned.

use topoplan::graph::{Node, NodeKind};
use topoplan::routing::{RouteEntry, RouteOrigin};

use std::net::Ipv4Addr;

/// Command printing the routing table in the format of the planner's printer
pub const PRINT_ROUTING_TABLE: &str = "route -n";

/// Command listing the kernel routing table, parsed by
/// [`KernelRoutingTable`](crate::kernel_routes::KernelRoutingTable)
pub const SHOW_ROUTES: &str = "ip route show";

/// Command setting the IP forwarding flag
pub fn forwarding(enabled: bool) -> String {
    format!("sysctl net.ipv4.ip_forward={}", if enabled { 1 } else { 0 })
}

/// Command installing (or replacing) a route
pub fn install_route(entry: &RouteEntry) -> String {
    format!("ip route replace {}", entry)
}

/// Command removing the route towards the destination of the entry
pub fn remove_route(entry: &RouteEntry) -> String {
    if entry.is_default() {
        String::from("ip route del default")
    } else {
        format!("ip route del {}", entry.destination)
    }
}

/// Command setting the default gateway of a host
pub fn default_gateway(gateway: Ipv4Addr) -> String {
    format!("ip route add default via {}", gateway)
}

/// Command executed on a host to trace the path towards `dest`
pub fn traceroute(dest: Ipv4Addr) -> String {
    format!("traceroute -n -q 1 -w 1 {}", dest)
}

/// Returns all commands to configure the node, in execution order:
///
/// 1. Assign the address of every numbered interface, and bring every interface up.
/// 2. Routers: enable IP forwarding (if enabled in the plan) and install all routes that are not
///    connected routes, in table order.
/// 3. Hosts: set the default gateway.
pub fn setup(node: &Node) -> Vec<String> {
    let mut cmds = Vec::new();
    for iface in node.interfaces() {
        if let Some(addr) = iface.addr() {
            cmds.push(format!("ip addr add {} dev {}", addr, iface.name()));
        }
        cmds.push(format!("ip link set {} up", iface.name()));
    }
    match node.kind() {
        NodeKind::Router(r) => {
            if r.forwarding_enabled() {
                cmds.push(forwarding(true));
            }
            cmds.extend(
                r.table().iter().filter(|e| e.origin != RouteOrigin::Connected).map(install_route),
            );
        }
        NodeKind::Host { gateway: Some(gw) } => cmds.push(default_gateway(*gw)),
        NodeKind::Host { gateway: None } | NodeKind::Switch => {}
    }
    cmds
}

/// Returns all commands to tear down the router configuration of the node: every installed route
/// is removed (in reverse order), and forwarding is disabled. Hosts and switches need no teardown.
pub fn teardown(node: &Node) -> Vec<String> {
    match node.router() {
        Some(r) => r
            .table()
            .iter()
            .rev()
            .filter(|e| e.origin != RouteOrigin::Connected)
            .map(remove_route)
            .chain(std::iter::once(forwarding(false)))
            .collect(),
        None => Vec::new(),
    }
}
