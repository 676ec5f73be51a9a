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

//! # Triangle Network

use super::{ip, net, ExampleTopology};
use crate::builder::{Port, TopologyBuilder};

/// # Triangle Network
///
/// Three routers `ra`, `rb` and `rc`, each with a LAN of two hosts behind a switch. Every pair of
/// routers is connected by two parallel links, each in its own /24 subnet.
///
/// | Link    | Interfaces | Subnet          |
/// |---------|------------|-----------------|
/// | ra - rb | x - y      | 192.168.2.0/24  |
/// | rb - rc | t - v      | 10.0.2.0/24     |
/// | ra - rc | u - w      | 172.16.2.0/24   |
/// | ra - rb | z - r      | 10.0.1.0/24     |
/// | rb - rc | s - u      | 172.16.1.0/24   |
/// | ra - rc | v - z      | 192.168.3.0/24  |
pub struct TriangleNet {}

impl ExampleTopology for TriangleNet {
    /// Get the topology definition
    ///
    /// # Variant 0
    /// All routes of all routers are synthesized.
    ///
    /// # Variant 1
    /// `ra` is configured explicitly with the following routes:
    /// - `default via 192.168.2.2 dev x`
    /// - `10.0.0.0/24 via 192.168.2.2 dev x`
    /// - `172.16.0.0/24 via 172.16.2.2 dev u`
    fn builder(variant: usize) -> TopologyBuilder {
        let mut b = TopologyBuilder::new();

        let lans = vec![
            ("ra", "s1", ["h1", "h2"], "192.168.1"),
            ("rb", "s2", ["h3", "h4"], "10.0.0"),
            ("rc", "s3", ["h5", "h6"], "172.16.0"),
        ];
        let mut routers = Vec::new();
        for (router, switch, hosts, lan) in lans {
            let r = b.add_router(router).unwrap();
            let s = b.add_switch(switch).unwrap();
            let gateway = format!("{}.1", lan);
            b.add_link(s, Port::new(r).name("custom-eth1").addr(net(&format!("{}/24", gateway))))
                .unwrap();
            for (i, host) in hosts.iter().enumerate() {
                let h = b.add_host(*host).unwrap();
                b.add_link(Port::new(h).addr(net(&format!("{}.{}/24", lan, 100 + i))), s).unwrap();
                b.set_default_gateway(h, ip(&gateway)).unwrap();
            }
            routers.push(r);
        }
        let (ra, rb, rc) = (routers[0], routers[1], routers[2]);

        let links = vec![
            (ra, "x", "192.168.2.1/24", rb, "y", "192.168.2.2/24"),
            (rb, "t", "10.0.2.1/24", rc, "v", "10.0.2.2/24"),
            (ra, "u", "172.16.2.1/24", rc, "w", "172.16.2.2/24"),
            (ra, "z", "10.0.1.1/24", rb, "r", "10.0.1.2/24"),
            (rb, "s", "172.16.1.1/24", rc, "u", "172.16.1.2/24"),
            (ra, "v", "192.168.3.1/24", rc, "z", "192.168.3.2/24"),
        ];
        for (x, ix, ax, y, iy, ay) in links {
            b.add_link(Port::new(x).name(ix).addr(net(ax)), Port::new(y).name(iy).addr(net(ay)))
                .unwrap();
        }

        match variant {
            0 => {}
            1 => {
                b.default_route_dev(ra, ip("192.168.2.2"), "x").unwrap();
                b.static_route_dev(ra, net("10.0.0.0/24"), ip("192.168.2.2"), "x").unwrap();
                b.static_route_dev(ra, net("172.16.0.0/24"), ip("172.16.2.2"), "u").unwrap();
            }
            _ => panic!("Variant {} is not defined", variant),
        }

        b
    }
}
