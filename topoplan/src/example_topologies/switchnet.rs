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

//! # Switch Network

use super::{net, ExampleTopology};
use crate::builder::{Port, TopologyBuilder};

/// # Switch Network
///
/// Four hosts on two connected switches, without any router. All hosts are in the same subnet,
/// and their addresses are assigned automatically.
///
/// ```text
/// h1, h2 --- s1 --- s2 --- h3, h4
/// ```
pub struct SwitchNet {}

impl ExampleTopology for SwitchNet {
    /// Get the topology definition
    ///
    /// # Variant 0
    /// Hosts are addressed from 10.0.0.0/8, in the order in which they are linked.
    fn builder(variant: usize) -> TopologyBuilder {
        if variant != 0 {
            panic!("Variant {} is not defined", variant);
        }

        let mut b = TopologyBuilder::new();
        let subnet = net("10.0.0.0/8");

        let hosts: Vec<_> = (1..=4).map(|i| b.add_host(format!("h{}", i)).unwrap()).collect();
        let s1 = b.add_switch("s1").unwrap();
        let s2 = b.add_switch("s2").unwrap();

        b.add_link(Port::new(hosts[0]).auto(subnet), s1).unwrap();
        b.add_link(Port::new(hosts[1]).auto(subnet), s1).unwrap();
        b.add_link(Port::new(hosts[2]).auto(subnet), s2).unwrap();
        b.add_link(Port::new(hosts[3]).auto(subnet), s2).unwrap();
        b.add_link(s1, s2).unwrap();

        b
    }
}
