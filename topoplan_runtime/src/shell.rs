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

//! # Node Shell
//!
//! Abstraction over the command line of an emulated node. The emulation backend (for instance a
//! network namespace per node) implements [`NodeShell`]. The [`RecordingShell`] only records the
//! commands, which is used for dry runs and for testing.

use log::*;
use std::collections::HashMap;
use std::error::Error;

/// Execute commands on the emulated nodes
pub trait NodeShell {
    /// Execute a command on the node with the given name, and return its output.
    fn cmd(&mut self, node: &str, cmd: &str) -> Result<String, Box<dyn Error>>;
}

/// # Recording Shell
/// Records every command without executing it. Responses can be registered up front, for instance
/// the output of `ip route show` on a specific router. Commands without a registered response
/// return an empty string.
#[derive(Debug, Clone, Default)]
pub struct RecordingShell {
    log: Vec<(String, String)>,
    responses: HashMap<(String, String), String>,
}

impl RecordingShell {
    /// Create an empty recording shell
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the output of a command on a node.
    pub fn respond(
        &mut self,
        node: impl Into<String>,
        cmd: impl Into<String>,
        output: impl Into<String>,
    ) -> &mut Self {
        self.responses.insert((node.into(), cmd.into()), output.into());
        self
    }

    /// Returns all recorded (node, command) pairs, in execution order
    pub fn commands(&self) -> &[(String, String)] {
        &self.log
    }

    /// Returns all commands executed on the given node, in execution order
    pub fn commands_of(&self, node: &str) -> Vec<&str> {
        self.log.iter().filter(|(n, _)| n == node).map(|(_, c)| c.as_str()).collect()
    }

    /// Forget all recorded commands. Registered responses are kept.
    pub fn clear(&mut self) {
        self.log.clear();
    }
}

impl NodeShell for RecordingShell {
    fn cmd(&mut self, node: &str, cmd: &str) -> Result<String, Box<dyn Error>> {
        debug!("[{}] {}", node, cmd);
        self.log.push((node.to_string(), cmd.to_string()));
        Ok(self.responses.get(&(node.to_string(), cmd.to_string())).cloned().unwrap_or_default())
    }
}
