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

//! # Star Network

use super::{ip, net, ExampleTopology};
use crate::builder::{Port, TopologyBuilder};

/// # Star Network
///
/// Four routers: the hub `r0` and the three spokes `r1`, `r2` and `r3`. Every router has a LAN
/// `10.<i>.0.0/24` with a single host, and the spoke `ri` connects to the hub over
/// `192.168.<i>.0/30`, where the hub takes the first address.
///
/// ```text
///        r1
///        |
/// r2 --- r0 --- r3
/// ```
pub struct StarNet {}

impl ExampleTopology for StarNet {
    /// Get the topology definition
    ///
    /// # Variant 0
    /// The spokes get a default route towards the hub, installed as stub default routes.
    ///
    /// # Variant 1
    /// All routes are synthesized.
    fn builder(variant: usize) -> TopologyBuilder {
        let mut b = TopologyBuilder::new();

        let mut routers = Vec::new();
        for i in 0..4 {
            let r = b.add_router(format!("r{}", i)).unwrap();
            let h = b.add_host(format!("h{}", i)).unwrap();
            b.add_link(
                Port::new(r).addr(net(&format!("10.{}.0.1/24", i))),
                Port::new(h).addr(net(&format!("10.{}.0.100/24", i))),
            )
            .unwrap();
            b.set_default_gateway(h, ip(&format!("10.{}.0.1", i))).unwrap();
            routers.push(r);
        }

        for i in 1..4 {
            b.add_link(
                Port::new(routers[0]).addr(net(&format!("192.168.{}.1/30", i))),
                Port::new(routers[i]).addr(net(&format!("192.168.{}.2/30", i))),
            )
            .unwrap();
        }

        match variant {
            0 => {
                b.stub_default_routes(true);
            }
            1 => {}
            _ => panic!("Variant {} is not defined", variant),
        }

        b
    }
}
