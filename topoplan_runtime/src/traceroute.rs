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

//! # Traceroute
//!
//! Parser for the output of `traceroute -n -q 1`, used to check the path that packets actually
//! take through the emulated network.

use regex::Regex;
use std::net::Ipv4Addr;

/// Parser for the output of traceroute
#[derive(Debug, Clone)]
pub struct TracerouteParser {
    hop_re: Regex,
    timeout_re: Regex,
}

impl TracerouteParser {
    /// Create a new parser
    pub fn new() -> Self {
        let hop_re =
            Regex::new(r"^ ?\d{1,2} +(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}) +\d+\.\d+ ms$").unwrap();
        let timeout_re = Regex::new(r"^ ?\d{1,2} +\*$").unwrap();
        Self { hop_re, timeout_re }
    }

    /// Parse the output of traceroute. Every hop is returned in order, where `None` marks a hop
    /// that did not answer. Lines which are neither a hop nor a timeout (like the header) are
    /// skipped.
    pub fn parse(&self, output: impl AsRef<str>) -> Vec<Option<Ipv4Addr>> {
        output
            .as_ref()
            .lines()
            .map(|l| l.trim_end())
            .filter_map(|l| {
                if let Some(caps) = self.hop_re.captures(l) {
                    Some(caps.get(1).and_then(|m| m.as_str().parse().ok()))
                } else if self.timeout_re.is_match(l) {
                    Some(None)
                } else {
                    None
                }
            })
            .collect()
    }
}

impl Default for TracerouteParser {
    fn default() -> Self {
        Self::new()
    }
}
