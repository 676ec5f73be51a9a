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

//! # Chain Network

use super::{ip, net, ExampleTopology};
use crate::builder::{Port, TopologyBuilder};

/// # Chain Network
///
/// Three routers in a line, each with a single directly connected host. All interface names are
/// chosen automatically.
///
/// ```text
/// h1 --- r1 --- r2 --- r3 --- h3
///               |
///               h2
/// ```
///
/// | Link    | Subnet          |
/// |---------|-----------------|
/// | h1 - r1 | 192.168.1.0/24  |
/// | r1 - r2 | 10.0.12.0/24    |
/// | r2 - h2 | 10.2.0.0/24     |
/// | r2 - r3 | 10.0.23.0/24    |
/// | r3 - h3 | 172.16.3.0/24   |
pub struct ChainNet {}

impl ExampleTopology for ChainNet {
    /// Get the topology definition
    ///
    /// # Variant 0
    /// - r1: `default via 10.0.12.2`
    /// - r3: `default via 10.0.23.1`
    /// - r1: `172.16.3.0/24 via 10.0.12.2`, installed as explicit override
    ///
    /// # Variant 1
    /// No explicit routes. The default routes of r1 and r3 are installed as stub default routes.
    fn builder(variant: usize) -> TopologyBuilder {
        let mut b = TopologyBuilder::new();

        let h1 = b.add_host("h1").unwrap();
        let r1 = b.add_router("r1").unwrap();
        let r2 = b.add_router("r2").unwrap();
        let h2 = b.add_host("h2").unwrap();
        let r3 = b.add_router("r3").unwrap();
        let h3 = b.add_host("h3").unwrap();

        let links = vec![
            (h1, "192.168.1.100/24", r1, "192.168.1.1/24"),
            (r1, "10.0.12.1/24", r2, "10.0.12.2/24"),
            (r2, "10.2.0.1/24", h2, "10.2.0.100/24"),
            (r2, "10.0.23.1/24", r3, "10.0.23.2/24"),
            (r3, "172.16.3.1/24", h3, "172.16.3.100/24"),
        ];
        for (x, ax, y, ay) in links {
            b.add_link(Port::new(x).addr(net(ax)), Port::new(y).addr(net(ay))).unwrap();
        }

        b.set_default_gateway(h1, ip("192.168.1.1")).unwrap();
        b.set_default_gateway(h2, ip("10.2.0.1")).unwrap();
        b.set_default_gateway(h3, ip("172.16.3.1")).unwrap();

        match variant {
            0 => {
                b.default_route(r1, ip("10.0.12.2")).unwrap();
                b.default_route(r3, ip("10.0.23.1")).unwrap();
                b.static_route(r1, net("172.16.3.0/24"), ip("10.0.12.2")).unwrap();
            }
            1 => {
                b.stub_default_routes(true);
            }
            _ => panic!("Variant {} is not defined", variant),
        }

        b
    }
}
