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

//! Topologies for testing

use crate::builder::TopologyBuilder;
use crate::plan::TopologyPlan;

use ipnet::Ipv4Net;
use std::net::Ipv4Addr;

mod meshnet;
pub use meshnet::MeshNet;

mod trianglenet;
pub use trianglenet::TriangleNet;

mod chainnet;
pub use chainnet::ChainNet;

mod starnet;
pub use starnet::StarNet;

mod switchnet;
pub use switchnet::SwitchNet;

/// Trait for easier access to example topologies.
pub trait ExampleTopology {
    /// Get the builder with the complete definition of the chosen variant.
    fn builder(variant: usize) -> TopologyBuilder;

    /// Build the plan of the chosen variant.
    fn plan(variant: usize) -> TopologyPlan {
        Self::builder(variant).build().unwrap()
    }
}

fn net(s: &str) -> Ipv4Net {
    s.parse().unwrap()
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}
