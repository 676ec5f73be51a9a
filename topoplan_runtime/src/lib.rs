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

//! # Runtime System
//!
//! This system deploys a [`TopologyPlan`](topoplan::TopologyPlan) on an emulation backend. Every
//! node is reached through a [`NodeShell`](shell::NodeShell), on which the configuration commands
//! are executed. After configuration, the kernel routing tables and the paths between hosts can be
//! compared with the plan. For simplified usage, check the function [`deploy`].

#![deny(missing_docs, missing_debug_implementations)]

pub mod commands;
pub mod emulated_network;
pub mod kernel_routes;
pub mod shell;
pub mod traceroute;

use emulated_network::EmulatedNetwork;
use shell::NodeShell;
use topoplan::TopologyPlan;

use log::*;
use std::error::Error;

/// # Deploy the plan
///
/// Check that every host can reach every other host on the plan, and configure all nodes of the
/// emulated network. If `verify` is set, the kernel routing tables of all routers are compared
/// with the plan afterwards. A mismatch is only reported as a warning, and the running network is
/// returned in any case.
pub fn deploy<S: NodeShell>(
    plan: TopologyPlan,
    shell: S,
    verify: bool,
) -> Result<EmulatedNetwork<S>, Box<dyn Error>> {
    let num_pairs = plan.check_reachability()?;
    info!("All {} host pairs are reachable on the plan", num_pairs);

    let mut net = EmulatedNetwork::new(plan, shell);
    net.start()?;

    if verify {
        if net.verify_all_routes()? {
            info!("All routing tables match the plan");
        } else {
            warn!("Some routing tables differ from the plan!");
        }
    }

    Ok(net)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shell::RecordingShell;
    use topoplan::example_topologies::{ExampleTopology, MeshNet};

    #[test]
    fn deploy_mesh() {
        let net = deploy(MeshNet::plan(0), RecordingShell::new(), false).unwrap();
        assert!(net.is_running());
        let shell = net.into_shell();
        assert!(shell.commands_of("r1").contains(&"sysctl net.ipv4.ip_forward=1"));
        assert!(shell.commands_of("h1").iter().any(|c| c.starts_with("ip route add default via")));
        assert!(shell.commands_of("r1").iter().all(|c| *c != "ip route show"));
    }

    #[test]
    fn deploy_verify() {
        let net = deploy(MeshNet::plan(0), RecordingShell::new(), true).unwrap();
        assert_eq!(net.shell().commands_of("r2").last(), Some(&"ip route show"));
    }
}
