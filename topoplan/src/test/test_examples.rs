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

//! Build all example topologies and check them

use crate::example_topologies::*;
use crate::routing::{NextHop, RouteEntry, RouteOrigin};
use ipnet::Ipv4Net;
use maplit::hashmap;
use std::collections::HashMap;
use std::net::Ipv4Addr;

fn net(s: &str) -> Ipv4Net {
    s.parse().unwrap()
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

#[test]
fn test_reachability() {
    assert_eq!(MeshNet::plan(0).check_reachability(), Ok(30));
    assert_eq!(MeshNet::plan(1).check_reachability(), Ok(30));
    assert_eq!(TriangleNet::plan(0).check_reachability(), Ok(30));
    assert_eq!(TriangleNet::plan(1).check_reachability(), Ok(30));
    assert_eq!(ChainNet::plan(0).check_reachability(), Ok(6));
    assert_eq!(ChainNet::plan(1).check_reachability(), Ok(6));
    assert_eq!(StarNet::plan(0).check_reachability(), Ok(12));
    assert_eq!(StarNet::plan(1).check_reachability(), Ok(12));
    assert_eq!(SwitchNet::plan(0).check_reachability(), Ok(12));
}

/// The synthesized routes for the LANs of the mesh with the /8 and /12 subnets are exactly the
/// routes one would configure by hand.
#[test]
fn test_mesh_nested_subnets() {
    let plan = MeshNet::plan(1);
    let expected: HashMap<&str, Vec<(&str, &str)>> = hashmap! {
        "r1" => vec![("172.16.0.0/12", "10.100.0.2"), ("10.0.0.0/8", "10.102.0.1")],
        "r2" => vec![("192.168.1.0/24", "10.100.0.1"), ("10.0.0.0/8", "10.101.0.2")],
        "r3" => vec![("192.168.1.0/24", "10.102.0.2"), ("172.16.0.0/12", "10.101.0.1")],
    };
    for (router, routes) in expected {
        let t = plan.routing_table(router).unwrap();
        for (dest, via) in routes {
            let e = t.get(&net(dest)).unwrap();
            assert_eq!(e.next_hop, NextHop::Via(ip(via)));
            assert_eq!(e.origin, RouteOrigin::Synthesized);
        }
    }

    // the link subnets are nested in 10.0.0.0/8, but are still routed towards their own routers
    let t = plan.routing_table("r3").unwrap();
    assert_eq!(t.get(&net("10.100.0.0/24")).unwrap().next_hop, NextHop::Via(ip("10.101.0.1")));
    assert_eq!(t.get(&net("10.0.0.0/8")).unwrap().next_hop, NextHop::Direct);
}

#[test]
fn test_triangle_explicit() {
    let plan = TriangleNet::plan(1);
    let t = plan.routing_table("ra").unwrap();
    assert_eq!(t.len(), 8);
    assert_eq!(
        t.default_route(),
        Some(&RouteEntry::via(
            Ipv4Net::default(),
            ip("192.168.2.2"),
            "x",
            RouteOrigin::Default
        ))
    );
    assert_eq!(
        t.get(&net("10.0.0.0/24")),
        Some(&RouteEntry::via(net("10.0.0.0/24"), ip("192.168.2.2"), "x", RouteOrigin::Static))
    );
    assert_eq!(
        t.get(&net("172.16.0.0/24")),
        Some(&RouteEntry::via(net("172.16.0.0/24"), ip("172.16.2.2"), "u", RouteOrigin::Static))
    );
    assert!(t.get(&net("10.0.2.0/24")).is_none());

    // rb and rc are not configured explicitly
    let t = plan.routing_table("rb").unwrap();
    assert!(t.default_route().is_none());
    assert_eq!(
        t.get(&net("192.168.1.0/24")),
        Some(&RouteEntry::via(
            net("192.168.1.0/24"),
            ip("192.168.2.1"),
            "y",
            RouteOrigin::Synthesized
        ))
    );
}

#[test]
fn test_triangle_synthesized() {
    let plan = TriangleNet::plan(0);
    let t = plan.routing_table("ra").unwrap();
    assert_eq!(t.len(), 9);
    let via = |dest: &str| {
        let e = t.get(&net(dest)).unwrap();
        (e.next_hop.gateway().unwrap().to_string(), e.interface.clone())
    };
    assert_eq!(via("10.0.0.0/24"), ("192.168.2.2".to_string(), "x".to_string()));
    assert_eq!(via("172.16.0.0/24"), ("172.16.2.2".to_string(), "u".to_string()));
    assert_eq!(via("10.0.2.0/24"), ("192.168.2.2".to_string(), "x".to_string()));
    assert_eq!(via("172.16.1.0/24"), ("192.168.2.2".to_string(), "x".to_string()));

    let t = plan.routing_table("rc").unwrap();
    assert_eq!(t.get(&net("192.168.1.0/24")).unwrap().interface, "w");
    assert_eq!(t.get(&net("10.0.0.0/24")).unwrap().interface, "v");
}

#[test]
fn test_star() {
    let plan = StarNet::plan(1);
    let hub = plan.routing_table("r0").unwrap();
    assert_eq!(hub.len(), 7);
    assert_eq!(hub.get(&net("10.2.0.0/24")).unwrap().next_hop, NextHop::Via(ip("192.168.2.2")));

    let spoke = plan.routing_table("r1").unwrap();
    assert_eq!(spoke.len(), 7);
    assert!(spoke.iter().all(|e| e.next_hop == NextHop::Direct
        || e.next_hop == NextHop::Via(ip("192.168.1.1"))));
}

#[test]
fn test_switch_net() {
    let plan = SwitchNet::plan(0);
    assert_eq!(plan.routers().count(), 0);
    assert_eq!(plan.graph().num_links(), 5);
}
