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

//! Test the topology graph

use crate::builder::{Port, TopologyBuilder};
use crate::graph::TopologyGraph;
use crate::types::{NodeId, Role, TopologyError};
use crate::Error;
use ipnet::Ipv4Net;
use lazy_static::lazy_static;

lazy_static! {
    static ref R1: NodeId = 0.into();
    static ref R2: NodeId = 1.into();
    static ref R3: NodeId = 2.into();
    static ref S1: NodeId = 3.into();
    static ref S2: NodeId = 4.into();
    static ref H1: NodeId = 5.into();
    static ref H2: NodeId = 6.into();
}

fn net(s: &str) -> Option<Ipv4Net> {
    Some(s.parse().unwrap())
}

/// # Test topology
///
/// ```text
/// H1 --- S1 --- S2 --- H2
///        |
///        R1 ==== R2 --- R3
/// ```
///
/// R1 and R2 are connected by two parallel links. The link between R2 and R3 has no address on R3.
fn get_test_graph() -> TopologyGraph {
    let mut g = TopologyGraph::new();
    assert_eq!(*R1, g.add_node("R1", Role::Router).unwrap());
    assert_eq!(*R2, g.add_node("R2", Role::Router).unwrap());
    assert_eq!(*R3, g.add_node("R3", Role::Router).unwrap());
    assert_eq!(*S1, g.add_node("S1", Role::Switch).unwrap());
    assert_eq!(*S2, g.add_node("S2", Role::Switch).unwrap());
    assert_eq!(*H1, g.add_node("H1", Role::Host).unwrap());
    assert_eq!(*H2, g.add_node("H2", Role::Host).unwrap());

    g.add_link(*H1, "h1-eth0", net("10.0.0.100/24"), *S1, "s1-eth1", None).unwrap();
    g.add_link(*S1, "s1-eth2", None, *S2, "s2-eth1", None).unwrap();
    g.add_link(*H2, "h2-eth0", net("10.0.0.101/24"), *S2, "s2-eth2", None).unwrap();
    g.add_link(*R1, "r1-eth0", net("10.0.0.1/24"), *S1, "s1-eth3", None).unwrap();
    g.add_link(*R1, "r1-eth1", net("10.1.0.1/30"), *R2, "r2-eth0", net("10.1.0.2/30")).unwrap();
    g.add_link(*R2, "r2-eth1", net("10.2.0.1/30"), *R1, "r1-eth2", net("10.2.0.2/30")).unwrap();
    g.add_link(*R2, "r2-eth2", net("10.3.0.1/30"), *R3, "r3-eth0", None).unwrap();
    g
}

#[test]
fn test_duplicate_node() {
    let mut g = get_test_graph();
    assert_eq!(g.add_node("R1", Role::Host), Err(TopologyError::DuplicateNode("R1".to_string())));
    assert_eq!(g.num_nodes(), 7);
}

#[test]
fn test_duplicate_interface() {
    let mut g = get_test_graph();
    assert_eq!(
        g.add_link(*R1, "r1-eth1", None, *R3, "r3-eth1", None),
        Err(TopologyError::DuplicateInterface {
            node: "R1".to_string(),
            iface: "r1-eth1".to_string()
        })
    );
    // the failed link leaves no trace
    assert_eq!(g.num_links(), 7);
    assert_eq!(g.node(*R3).unwrap().interfaces().len(), 1);
}

/// The interface `t` is used twice on the same router, once towards `rc` and once towards `ra`.
#[test]
fn test_duplicate_interface_triangle() {
    let mut b = TopologyBuilder::new();
    let ra = b.add_router("custom_ra").unwrap();
    let rb = b.add_router("custom_rb").unwrap();
    let rc = b.add_router("custom_rc").unwrap();
    let link = |a, ia: &str, aa: &str, b, ib: &str, ab: &str| {
        (
            Port::new(a).name(ia).addr(aa.parse().unwrap()),
            Port::new(b).name(ib).addr(ab.parse().unwrap()),
        )
    };

    let (x, y) = link(ra, "x", "192.168.2.1/24", rb, "y", "192.168.2.2/24");
    b.add_link(x, y).unwrap();
    let (x, y) = link(rb, "t", "10.0.2.1/24", rc, "v", "10.0.2.2/24");
    b.add_link(x, y).unwrap();
    let (x, y) = link(ra, "z", "10.0.1.1/24", rb, "t", "10.0.1.2/24");
    assert_eq!(
        b.add_link(x, y),
        Err(Error::TopologyError(TopologyError::DuplicateInterface {
            node: "custom_rb".to_string(),
            iface: "t".to_string()
        }))
    );
}

#[test]
fn test_invalid_links() {
    let mut g = get_test_graph();
    assert_eq!(
        g.add_link(*R3, "r3-eth1", None, *R3, "r3-eth2", None),
        Err(TopologyError::SelfLink("R3".to_string()))
    );
    let missing: NodeId = 42.into();
    assert_eq!(
        g.add_link(*R3, "r3-eth1", None, missing, "eth0", None),
        Err(TopologyError::NodeNotFound(missing))
    );
    assert_eq!(g.node_id("R4"), Err(TopologyError::NodeNameNotFound("R4".to_string())));
}

#[test]
fn test_mismatched_prefix_length() {
    let mut g = TopologyGraph::new();
    let a = g.add_node("a", Role::Router).unwrap();
    let b = g.add_node("b", Role::Router).unwrap();
    g.add_link(a, "a-eth0", net("10.0.0.1/8"), b, "b-eth0", net("10.0.0.2/24")).unwrap();
    assert_eq!(
        g.subnets(),
        vec![
            ("10.0.0.0/8".parse().unwrap(), vec![a]),
            ("10.0.0.0/24".parse().unwrap(), vec![b])
        ]
    );
}

#[test]
fn test_gateways() {
    let g = get_test_graph();
    assert_eq!(g.gateways(&"10.0.0.0/24".parse().unwrap()), vec![*R1]);
    assert_eq!(g.gateways(&"10.1.0.0/30".parse().unwrap()), vec![*R1, *R2]);
    assert!(g.gateways(&"10.9.0.0/24".parse().unwrap()).is_empty());

    // the host uses a wider mask than the router on the same segment
    let mut g = TopologyGraph::new();
    let h = g.add_node("h", Role::Host).unwrap();
    let s = g.add_node("s", Role::Switch).unwrap();
    let r = g.add_node("r", Role::Router).unwrap();
    let other = g.add_node("o", Role::Router).unwrap();
    g.add_link(h, "h-eth0", net("192.168.1.100/16"), s, "s-eth1", None).unwrap();
    g.add_link(r, "r-eth0", net("192.168.1.1/24"), s, "s-eth2", None).unwrap();
    g.add_link(other, "o-eth0", net("172.16.0.1/24"), s, "s-eth3", None).unwrap();
    assert_eq!(g.gateways(&"192.168.0.0/16".parse().unwrap()), vec![r]);
    assert_eq!(g.gateways(&"192.168.1.0/24".parse().unwrap()), vec![r]);
}

#[test]
fn test_adjacency_order() {
    let g = get_test_graph();
    let adj = g.adjacency(*R1);
    assert_eq!(adj.iter().map(|a| a.neighbor).collect::<Vec<_>>(), vec![*S1, *R2, *R2]);
    assert_eq!(adj.iter().map(|a| a.local_iface).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(adj.iter().map(|a| a.remote_iface).collect::<Vec<_>>(), vec![2, 0, 1]);

    let adj = g.adjacency(*R2);
    assert_eq!(adj.iter().map(|a| a.neighbor).collect::<Vec<_>>(), vec![*R1, *R1, *R3]);
}

#[test]
fn test_transit_adjacency() {
    let g = get_test_graph();
    let neighbors = |n| g.transit_adjacency(n).iter().map(|a| a.neighbor).collect::<Vec<_>>();
    assert_eq!(neighbors(*R1), vec![*R2, *R2]);
    // the link towards R3 is not addressed on R3
    assert_eq!(neighbors(*R2), vec![*R1, *R1]);
    assert_eq!(neighbors(*R3), vec![]);
    assert_eq!(neighbors(*H1), vec![]);
}

#[test]
fn test_subnets() {
    let g = get_test_graph();
    let subnets = g.subnets();
    assert_eq!(subnets.len(), 4);
    assert_eq!(subnets[0], ("10.0.0.0/24".parse().unwrap(), vec![*R1, *H1, *H2]));
    assert_eq!(subnets[1], ("10.1.0.0/30".parse().unwrap(), vec![*R1, *R2]));
    assert_eq!(subnets[2], ("10.2.0.0/30".parse().unwrap(), vec![*R1, *R2]));
    assert_eq!(subnets[3], ("10.3.0.0/30".parse().unwrap(), vec![*R2]));
}

#[test]
fn test_l2_segment() {
    let g = get_test_graph();
    assert_eq!(g.l2_segment(*H1, 0), vec![(*R1, 0), (*H2, 0)]);
    assert_eq!(g.l2_segment(*R1, 0), vec![(*H1, 0), (*H2, 0)]);
    assert_eq!(g.l2_segment(*R1, 1), vec![(*R2, 0)]);
    assert_eq!(g.owner_in_segment(*H2, 0, "10.0.0.1".parse().unwrap()), Some((*R1, 0)));
    assert_eq!(g.owner_in_segment(*H2, 0, "10.0.0.2".parse().unwrap()), None);
}
