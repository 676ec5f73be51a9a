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

//! # Emulated Network
//!
//! Brings a [`TopologyPlan`] to life on an emulation backend, reachable through a [`NodeShell`].
//! The network configures every node, checks the kernel routing tables against the plan, traces
//! paths between hosts, and finally tears the router configuration down again.

use crate::commands;
use crate::kernel_routes::{KernelRoutingTable, RouteMismatch};
use crate::shell::NodeShell;
use crate::traceroute::TracerouteParser;

use topoplan::TopologyPlan;

use log::*;
use std::error::Error;
use std::net::Ipv4Addr;

/// # Emulated Network
/// Owns the plan and the shell to the emulated nodes. The network is either running (after
/// [`EmulatedNetwork::start`]) or stopped.
#[derive(Debug)]
pub struct EmulatedNetwork<S> {
    plan: TopologyPlan,
    shell: S,
    traceroute: TracerouteParser,
    running: bool,
}

impl<S: NodeShell> EmulatedNetwork<S> {
    /// Create a new network, which is not yet started.
    pub fn new(plan: TopologyPlan, shell: S) -> Self {
        Self { plan, shell, traceroute: TracerouteParser::new(), running: false }
    }

    /// Returns the plan of the network
    pub fn plan(&self) -> &TopologyPlan {
        &self.plan
    }

    /// Returns a reference to the shell
    pub fn shell(&self) -> &S {
        &self.shell
    }

    /// Consume the network and return the shell
    pub fn into_shell(self) -> S {
        self.shell
    }

    /// Returns `true` if the network is running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Configure every node, in the order in which they were added to the topology. See
    /// [`commands::setup`] for the executed commands.
    pub fn start(&mut self) -> Result<(), Box<dyn Error>> {
        if self.running {
            return Err("The network is already running".into());
        }
        for (_, node) in self.plan.graph().nodes() {
            debug!("Configuring {} ({})", node.name(), node.role());
            for cmd in commands::setup(node) {
                self.shell.cmd(node.name(), &cmd)?;
            }
        }
        self.running = true;
        info!("Network started with {} nodes", self.plan.graph().num_nodes());
        Ok(())
    }

    /// Tear down the configuration of every router and terminate the routers of the plan. Calling
    /// this function on a stopped network does nothing.
    pub fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        if !self.running {
            return Ok(());
        }
        for (_, node) in self.plan.graph().nodes() {
            for cmd in commands::teardown(node) {
                self.shell.cmd(node.name(), &cmd)?;
            }
        }
        self.plan.terminate()?;
        self.running = false;
        info!("Network stopped");
        Ok(())
    }

    /// Returns the output of `route -n` on the router.
    pub fn print_routing_table(&mut self, router: &str) -> Result<String, Box<dyn Error>> {
        self.plan.router(router)?;
        self.shell.cmd(router, commands::PRINT_ROUTING_TABLE)
    }

    /// Read and parse the kernel routing table of the router.
    pub fn kernel_table(&mut self, router: &str) -> Result<KernelRoutingTable, Box<dyn Error>> {
        self.plan.router(router)?;
        let output = self.shell.cmd(router, commands::SHOW_ROUTES)?;
        KernelRoutingTable::from(output)
    }

    /// Compare the kernel routing table of the router with its planned routing table.
    pub fn verify_routes(&mut self, router: &str) -> Result<Vec<RouteMismatch>, Box<dyn Error>> {
        let kernel = self.kernel_table(router)?;
        let mismatches = kernel.compare(self.plan.routing_table(router)?);
        for m in mismatches.iter() {
            warn!("[{}] {}", router, m);
        }
        Ok(mismatches)
    }

    /// Verify the routing tables of all routers. Returns `true` if every kernel table matches the
    /// plan.
    pub fn verify_all_routes(&mut self) -> Result<bool, Box<dyn Error>> {
        let routers: Vec<String> = self.plan.routers().map(|r| r.name().to_string()).collect();
        let mut correct = true;
        for router in routers {
            if !self.verify_routes(&router)?.is_empty() {
                correct = false;
            }
        }
        Ok(correct)
    }

    /// Run traceroute on the host towards `dest`, and return the traversed path as node names,
    /// starting with the host itself. Hops which did not answer, or which answered with an address
    /// unknown to the plan, are represented as `*`.
    pub fn trace(&mut self, host: &str, dest: Ipv4Addr) -> Result<Vec<String>, Box<dyn Error>> {
        self.plan.node_id(host)?;
        let output = self.shell.cmd(host, &commands::traceroute(dest))?;
        let mut path = vec![host.to_string()];
        for hop in self.traceroute.parse(output) {
            let name = hop
                .and_then(|addr| self.plan.planner().owner(addr))
                .and_then(|id| self.plan.graph().node_name(id).ok())
                .unwrap_or("*");
            path.push(name.to_string());
        }
        Ok(path)
    }

    /// Trace the path between every pair of hosts (towards every address of the destination), and
    /// compare it with the path computed on the plan. Returns `true` if all paths are as expected.
    pub fn check_paths(&mut self) -> Result<bool, Box<dyn Error>> {
        let graph = self.plan.graph();
        let hosts = graph.hosts();
        let mut pairs = Vec::new();
        for src in hosts.iter() {
            for dst in hosts.iter().filter(|h| *h != src) {
                for iface in graph.node(*dst)?.interfaces() {
                    if let Some(addr) = iface.addr() {
                        pairs.push((*src, addr.addr()));
                    }
                }
            }
        }

        let mut correct = true;
        for (src, dest) in pairs {
            let expected = self.plan.forwarding().get_route(src, dest)?;
            let expected = topoplan::printer::path(self.plan.graph(), &expected)?;
            let host = self.plan.graph().node_name(src)?.to_string();
            let actual = self.trace(&host, dest)?.join(" -> ");
            let ok = actual == expected;
            info!("[{}] (correct: {})", actual, ok);
            correct &= ok;
        }
        Ok(correct)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shell::RecordingShell;
    use topoplan::example_topologies::{ChainNet, ExampleTopology};
    use topoplan::router::RouterState;

    fn chain_net() -> EmulatedNetwork<RecordingShell> {
        EmulatedNetwork::new(ChainNet::plan(0), RecordingShell::new())
    }

    #[test]
    fn start_configures_all_nodes() {
        let mut net = chain_net();
        net.start().unwrap();
        assert!(net.is_running());
        assert!(net.start().is_err());

        let shell = net.shell();
        assert_eq!(shell.commands()[0].0, "h1");
        assert_eq!(
            shell.commands_of("h1"),
            vec![
                "ip addr add 192.168.1.100/24 dev h1-eth0",
                "ip link set h1-eth0 up",
                "ip route add default via 192.168.1.1",
            ]
        );
        let r1 = shell.commands_of("r1");
        assert_eq!(r1.len(), 7);
        assert_eq!(r1[4], "sysctl net.ipv4.ip_forward=1");
        assert_eq!(r1[6], "ip route replace 172.16.3.0/24 via 10.0.12.2 dev r1-eth1");
        // connected routes are installed by the kernel
        assert_eq!(shell.commands_of("r2").len(), 9);
    }

    #[test]
    fn stop_terminates_routers() {
        let mut net = chain_net();
        net.stop().unwrap();
        assert!(net.shell().commands().is_empty());

        net.start().unwrap();
        net.stop().unwrap();
        assert!(!net.is_running());
        assert!(net.plan().routers().all(|r| r.state() == RouterState::Terminated));
        assert!(net.plan().routing_table("r1").unwrap().is_empty());

        let r1 = net.shell().commands_of("r1");
        assert_eq!(
            r1[7..].to_vec(),
            vec![
                "ip route del 172.16.3.0/24",
                "ip route del default",
                "sysctl net.ipv4.ip_forward=0"
            ]
        );
        let num = net.shell().commands().len();
        net.stop().unwrap();
        assert_eq!(net.shell().commands().len(), num);
    }

    #[test]
    fn verify_routes() {
        let mut shell = RecordingShell::new();
        shell.respond(
            "r1",
            "ip route show",
            "default via 10.0.12.2 dev r1-eth1
10.0.12.0/24 dev r1-eth1 proto kernel scope link src 10.0.12.1
172.16.3.0/24 via 10.0.12.2 dev r1-eth1
192.168.1.0/24 dev r1-eth0 proto kernel scope link src 192.168.1.1",
        );
        let mut net = EmulatedNetwork::new(ChainNet::plan(0), shell);
        net.start().unwrap();
        assert!(net.verify_routes("r1").unwrap().is_empty());
        // r2 returns an empty table
        assert_eq!(net.verify_routes("r2").unwrap().len(), 5);
        assert!(!net.verify_all_routes().unwrap());
        assert!(net.verify_routes("h1").is_err());
        assert!(net.verify_routes("r9").is_err());
    }

    #[test]
    fn trace_path() {
        let mut shell = RecordingShell::new();
        shell.respond(
            "h1",
            "traceroute -n -q 1 -w 1 172.16.3.100",
            "traceroute to 172.16.3.100 (172.16.3.100), 30 hops max, 60 byte packets
 1  192.168.1.1  0.061 ms
 2  10.0.12.2  0.042 ms
 3  *
 4  172.16.3.100  0.102 ms",
        );
        let mut net = EmulatedNetwork::new(ChainNet::plan(0), shell);
        assert_eq!(
            net.trace("h1", "172.16.3.100".parse().unwrap()).unwrap(),
            vec!["h1", "r1", "r2", "*", "h3"]
        );
        assert!(net.trace("h9", "172.16.3.100".parse().unwrap()).is_err());
        // no response is registered for the other pairs
        assert!(!net.check_paths().unwrap());
    }
}
