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

//! # Mesh Network

use super::{ip, net, ExampleTopology};
use crate::builder::{Port, TopologyBuilder};

/// # Mesh Network
///
/// Three routers connected in a full mesh, each with a LAN of two hosts behind a switch. Every
/// router-router link is its own /24 subnet.
///
/// ```text
///  h1, h2 --- s1 --- r1 ------- r2 --- s2 --- h3, h4
///                     \        /
///                      \      /
///                        r3 --- s3 --- h5, h6
/// ```
pub struct MeshNet {}

impl ExampleTopology for MeshNet {
    /// Get the topology definition
    ///
    /// # Variant 0
    /// - LAN of r1: 192.168.1.0/24
    /// - LAN of r2: 172.16.0.0/24
    /// - LAN of r3: 10.0.0.0/24
    ///
    /// # Variant 1
    /// - LAN of r1: 192.168.1.0/24
    /// - LAN of r2: 172.16.0.0/12
    /// - LAN of r3: 10.0.0.0/8, which contains all router-router link subnets.
    ///
    /// In both variants, the router-router links are 10.100.0.0/24 (r1-r2), 10.101.0.0/24 (r2-r3)
    /// and 10.102.0.0/24 (r3-r1).
    fn builder(variant: usize) -> TopologyBuilder {
        let (lan2, lan3) = match variant {
            0 => ("/24", "/24"),
            1 => ("/12", "/8"),
            _ => panic!("Variant {} is not defined", variant),
        };
        let lan = |addr: &str, len: &str| net(&format!("{}{}", addr, len));

        let mut b = TopologyBuilder::new();

        let r1 = b.add_router("r1").unwrap();
        let r2 = b.add_router("r2").unwrap();
        let r3 = b.add_router("r3").unwrap();
        let s1 = b.add_switch("s1").unwrap();
        let s2 = b.add_switch("s2").unwrap();
        let s3 = b.add_switch("s3").unwrap();

        b.add_link(s1, Port::new(r1).name("r1-eth1").addr(net("192.168.1.1/24"))).unwrap();
        b.add_link(s2, Port::new(r2).name("r2-eth1").addr(lan("172.16.0.1", lan2))).unwrap();
        b.add_link(s3, Port::new(r3).name("r3-eth1").addr(lan("10.0.0.1", lan3))).unwrap();

        let hosts = vec![
            ("h1", s1, net("192.168.1.100/24"), ip("192.168.1.1")),
            ("h2", s1, net("192.168.1.101/24"), ip("192.168.1.1")),
            ("h3", s2, lan("172.16.0.100", lan2), ip("172.16.0.1")),
            ("h4", s2, lan("172.16.0.101", lan2), ip("172.16.0.1")),
            ("h5", s3, lan("10.0.0.100", lan3), ip("10.0.0.1")),
            ("h6", s3, lan("10.0.0.101", lan3), ip("10.0.0.1")),
        ];
        for (name, switch, addr, gateway) in hosts {
            let h = b.add_host(name).unwrap();
            b.add_link(Port::new(h).addr(addr), switch).unwrap();
            b.set_default_gateway(h, gateway).unwrap();
        }

        b.add_link(
            Port::new(r1).name("r1-eth2").addr(net("10.100.0.1/24")),
            Port::new(r2).name("r2-eth2").addr(net("10.100.0.2/24")),
        )
        .unwrap();
        b.add_link(
            Port::new(r2).name("r2-eth3").addr(net("10.101.0.1/24")),
            Port::new(r3).name("r3-eth2").addr(net("10.101.0.2/24")),
        )
        .unwrap();
        b.add_link(
            Port::new(r3).name("r3-eth3").addr(net("10.102.0.1/24")),
            Port::new(r1).name("r1-eth3").addr(net("10.102.0.2/24")),
        )
        .unwrap();

        b
    }
}
