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

//! # Helper (printer) functions for the topology plan
//! Module containing helper functions to get formatted strings and print information about the
//! planned topology. Routing tables are formatted like the output of `route -n`.

use crate::graph::{Node, TopologyGraph};
use crate::plan::TopologyPlan;
use crate::router::Router;
use crate::routing::{NextHop, RouteEntry};
use crate::types::NodeId;
use crate::Error;

/// Header line of the routing table
pub const ROUTE_HEADER: &str =
    "Destination     Gateway         Genmask         Flags Metric Ref    Use Iface";

/// Get a vector of strings, which represent the routing table of the router. The first line is the
/// header, followed by one line per entry, in installation order.
pub fn routing_table(router: &Router) -> Vec<String> {
    let mut result = vec![String::from(ROUTE_HEADER)];
    result.extend(router.table().iter().map(route_entry));
    result
}

/// Returns the formatted line of a single route entry. The flags are `U` (up), `G` (via a gateway)
/// and `H` (host route).
pub fn route_entry(entry: &RouteEntry) -> String {
    let mut flags = String::from("U");
    let gateway = match entry.next_hop {
        NextHop::Via(gw) => {
            flags.push('G');
            gw.to_string()
        }
        NextHop::Direct => String::from("0.0.0.0"),
    };
    if entry.destination.prefix_len() == 32 {
        flags.push('H');
    }
    format!(
        "{:<15} {:<15} {:<15} {:<5} {:<6} {:<6} {:>3} {}",
        entry.destination.network(),
        gateway,
        entry.destination.netmask(),
        flags,
        0,
        0,
        0,
        entry.interface
    )
}

/// Print the routing table of a given router.
pub fn print_routing_table(router: &Router) {
    println!("Kernel IP routing table of {} [{}]", router.name(), router.state());
    for line in routing_table(router) {
        println!("{}", line);
    }
}

/// Returns one line per interface of the node, with its name and address.
pub fn interfaces(node: &Node) -> Vec<String> {
    node.interfaces()
        .iter()
        .map(|i| match i.addr() {
            Some(addr) => format!("{}: {}", i.name(), addr),
            None => format!("{}: unnumbered", i.name()),
        })
        .collect()
}

/// Returns a formatted string for a path, where all node names are inserted.
pub fn path(graph: &TopologyGraph, path: &[NodeId]) -> Result<String, Error> {
    let names = path.iter().map(|n| graph.node_name(*n)).collect::<Result<Vec<_>, _>>()?;
    Ok(names.join(" -> "))
}

/// Print the complete plan to stdout: all nodes with their interfaces, and the routing table of
/// every router.
pub fn print_plan(plan: &TopologyPlan) {
    println!("Topology {{");
    for (_, node) in plan.graph().nodes() {
        match node.gateway() {
            Some(gw) => println!("    {} ({}, gateway {})", node.name(), node.role(), gw),
            None => println!("    {} ({})", node.name(), node.role()),
        }
        for line in interfaces(node) {
            println!("        {}", line);
        }
    }
    println!("}}");
    for router in plan.routers() {
        println!();
        print_routing_table(router);
    }
}
