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

use topoplan::example_topologies::*;
use topoplan::{printer, TopologyBuilder};
use topoplan_runtime::shell::RecordingShell;
use topoplan_runtime::{commands, deploy};

use clap::{Parser, Subcommand};
use log::*;
use std::error::Error;

mod topology_file;
use topology_file::TopologyFile;

fn main() -> Result<(), Box<dyn Error>> {
    // initialize the env logger
    pretty_env_logger::init();

    // run clap
    let args = CommandLineArguments::parse();

    match args.cmd {
        MainCommand::Plan { network, json_filename } => {
            let plan = get_topo(network)?.build()?;
            printer::print_plan(&plan);
            let num_pairs = plan.check_reachability()?;
            info!("All {} host pairs can reach each other", num_pairs);

            if let Some(json_filename) = json_filename {
                let data = serde_json::to_string_pretty(&plan.export()?)?;
                std::fs::write(&json_filename, data)?;
                info!("Plan written to {}", json_filename);
            }
        }
        MainCommand::Commands { network } => {
            let plan = get_topo(network)?.build()?;
            for (_, node) in plan.graph().nodes() {
                println!("# {} ({})", node.name(), node.role());
                for cmd in commands::setup(node) {
                    println!("{}", cmd);
                }
            }
        }
        MainCommand::Run { network, verify } => {
            let plan = get_topo(network)?.build()?;
            let mut net = deploy(plan, RecordingShell::new(), verify)?;
            net.stop()?;
            for (node, cmd) in net.shell().commands() {
                println!("[{}] {}", node, cmd);
            }
        }
    }

    Ok(())
}

fn get_topo(args: NetworkSelection) -> Result<TopologyBuilder, Box<dyn Error>> {
    Ok(match args {
        NetworkSelection::Mesh { variant } => MeshNet::builder(variant),
        NetworkSelection::Triangle { variant } => TriangleNet::builder(variant),
        NetworkSelection::Chain { variant } => ChainNet::builder(variant),
        NetworkSelection::Star { variant } => StarNet::builder(variant),
        NetworkSelection::Switch => SwitchNet::builder(0),
        NetworkSelection::File { filename } => TopologyFile::load(filename)?.builder()?,
    })
}

#[derive(Parser, Debug)]
#[command(name = "TopoPlan (Binary)", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Action to perform
    #[command(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Compute the plan and print the routing table of every router
    #[command(name = "plan")]
    Plan {
        /// Topology to plan
        #[command(subcommand)]
        network: NetworkSelection,
        /// Store the plan in a json file
        #[arg(long = "json")]
        json_filename: Option<String>,
    },
    /// Print the commands that configure every node
    #[command(name = "commands")]
    Commands {
        /// Topology to plan
        #[command(subcommand)]
        network: NetworkSelection,
    },
    /// Deploy the plan without executing any command (dry run), then stop it again, and print
    /// every command in execution order
    #[command(name = "run")]
    Run {
        /// Topology to plan
        #[command(subcommand)]
        network: NetworkSelection,
        /// Read back the kernel routing tables after deployment
        #[arg(short = 'c', long)]
        verify: bool,
    },
}

#[derive(Subcommand, Debug)]
enum NetworkSelection {
    /// Three routers in a triangle, each with a switched LAN
    #[command(name = "mesh")]
    Mesh {
        /// Variant of the topology
        #[arg(short = 'v', long, default_value = "0")]
        variant: usize,
    },
    /// Three routers in a triangle, with custom interface names
    #[command(name = "triangle")]
    Triangle {
        /// Variant of the topology
        #[arg(short = 'v', long, default_value = "0")]
        variant: usize,
    },
    /// Three routers in a line
    #[command(name = "chain")]
    Chain {
        /// Variant of the topology
        #[arg(short = 'v', long, default_value = "0")]
        variant: usize,
    },
    /// Hub router with three stub routers
    #[command(name = "star")]
    Star {
        /// Variant of the topology
        #[arg(short = 'v', long, default_value = "0")]
        variant: usize,
    },
    /// Four hosts on two switches
    #[command(name = "switch")]
    Switch,
    /// Topology read from a json file
    #[command(name = "file")]
    File {
        /// Json file to read
        filename: String,
    },
}
