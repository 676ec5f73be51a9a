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

//! Test the router lifecycle and the routing table

use crate::router::{Router, RouterState::*};
use crate::routing::{NextHop, RouteEntry, RouteOrigin, RoutingTable};
use crate::types::RouterError;
use ipnet::Ipv4Net;
use std::net::Ipv4Addr;

fn net(s: &str) -> Ipv4Net {
    s.parse().unwrap()
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

#[test]
fn test_lifecycle() {
    let mut r = Router::new("r1".to_string());
    assert_eq!(r.state(), Unconfigured);
    assert!(!r.forwarding_enabled());

    r.enable_forwarding().unwrap();
    assert_eq!(r.state(), ForwardingEnabled);
    assert!(r.forwarding_enabled());
    assert_eq!(
        r.enable_forwarding(),
        Err(RouterError::InvalidTransition {
            router: "r1".to_string(),
            from: ForwardingEnabled,
            to: ForwardingEnabled
        })
    );

    r.install(RouteEntry::connected(net("10.0.0.1/24"), "r1-eth0")).unwrap();
    r.finish_installation().unwrap();
    assert_eq!(r.state(), RoutesInstalled);
    assert_eq!(
        r.install(RouteEntry::connected(net("10.1.0.1/24"), "r1-eth1")),
        Err(RouterError::TableLocked { router: "r1".to_string(), state: RoutesInstalled })
    );
    assert_eq!(r.table().len(), 1);

    r.terminate().unwrap();
    assert_eq!(r.state(), Terminated);
    assert!(!r.forwarding_enabled());
    assert!(r.table().is_empty());
    // terminating twice is fine
    r.terminate().unwrap();
    assert_eq!(r.state(), Terminated);
    assert!(r.enable_forwarding().is_err());
}

#[test]
fn test_install_requires_forwarding() {
    let mut r = Router::new("r1".to_string());
    assert_eq!(
        r.install(RouteEntry::connected(net("10.0.0.1/24"), "r1-eth0")),
        Err(RouterError::TableLocked { router: "r1".to_string(), state: Unconfigured })
    );
    assert_eq!(
        r.finish_installation(),
        Err(RouterError::InvalidTransition {
            router: "r1".to_string(),
            from: Unconfigured,
            to: RoutesInstalled
        })
    );
}

#[test]
fn test_terminate_restores_forwarding_flag() {
    let fresh = Router::new("r1".to_string());
    let mut r = fresh.clone();
    r.enable_forwarding().unwrap();
    r.install(RouteEntry::connected(net("10.0.0.1/24"), "r1-eth0")).unwrap();
    r.terminate().unwrap();
    assert_eq!(r.forwarding_enabled(), fresh.forwarding_enabled());
    assert_eq!(r.table(), fresh.table());
}

#[test]
fn test_table_replace() {
    let mut t = RoutingTable::new();
    assert_eq!(t.insert(RouteEntry::connected(net("10.0.0.1/24"), "eth0")), None);
    let origin = RouteOrigin::Synthesized;
    let entry = RouteEntry::via(net("10.1.0.0/24"), ip("10.0.0.2"), "eth0", origin);
    assert_eq!(t.insert(entry), None);
    assert_eq!(t.insert(RouteEntry::connected(net("10.2.0.0/24"), "eth1")), None);

    // last write wins, and the entry keeps its position
    let entry = RouteEntry::via(net("10.1.0.0/24"), ip("10.2.0.2"), "eth1", RouteOrigin::Static);
    let old = t.insert(entry);
    assert_eq!(old.map(|e| e.next_hop), Some(NextHop::Via(ip("10.0.0.2"))));
    assert_eq!(t.len(), 3);
    let dests = t.iter().map(|e| e.destination).collect::<Vec<_>>();
    assert_eq!(dests, vec![net("10.0.0.0/24"), net("10.1.0.0/24"), net("10.2.0.0/24")]);
    assert_eq!(t.get(&net("10.1.0.0/24")).unwrap().origin, RouteOrigin::Static);

    assert!(t.remove(&net("10.1.0.0/24")).is_some());
    assert_eq!(t.len(), 2);
}

#[test]
fn test_table_lookup() {
    let mut t = RoutingTable::new();
    t.insert(RouteEntry::via(Ipv4Net::default(), ip("10.0.0.2"), "eth0", RouteOrigin::Default));
    t.insert(RouteEntry::connected(net("10.0.0.1/24"), "eth0"));
    t.insert(RouteEntry::via(net("172.16.0.0/12"), ip("10.0.0.3"), "eth0", RouteOrigin::Static));
    t.insert(RouteEntry::via(net("172.16.1.0/24"), ip("10.0.0.4"), "eth0", RouteOrigin::Static));

    assert_eq!(t.lookup(ip("10.0.0.77")).unwrap().next_hop, NextHop::Direct);
    assert_eq!(t.lookup(ip("172.16.1.1")).unwrap().next_hop, NextHop::Via(ip("10.0.0.4")));
    assert_eq!(t.lookup(ip("172.16.2.1")).unwrap().next_hop, NextHop::Via(ip("10.0.0.3")));
    assert_eq!(t.lookup(ip("8.8.8.8")).unwrap().next_hop, NextHop::Via(ip("10.0.0.2")));
    assert!(t.default_route().unwrap().is_default());

    assert_eq!(
        t.covering_explicit(&net("172.16.1.0/24")).unwrap().destination,
        net("172.16.0.0/12")
    );
    let default = Ipv4Net::default();
    assert_eq!(t.covering_explicit(&net("192.168.0.0/24")).unwrap().destination, default);
    // connected entries are not explicit
    assert_eq!(t.covering_explicit(&net("10.0.0.0/25")).unwrap().destination, default);
}

#[test]
fn test_entry_display() {
    let e = RouteEntry::via(Ipv4Net::default(), ip("192.168.2.2"), "x", RouteOrigin::Default);
    assert_eq!(e.to_string(), "default via 192.168.2.2 dev x");
    let e = RouteEntry::via(net("172.16.0.0/24"), ip("172.16.2.2"), "u", RouteOrigin::Static);
    assert_eq!(e.to_string(), "172.16.0.0/24 via 172.16.2.2 dev u");
    let e = RouteEntry::connected(net("192.168.1.1/24"), "custom-eth1");
    assert_eq!(e.to_string(), "192.168.1.0/24 dev custom-eth1");
}
