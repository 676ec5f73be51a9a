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

//! # Kernel Routing Table
//!
//! Parser for the output of `ip route show`, and a comparison of the parsed kernel table against
//! the planned [`RoutingTable`] of a router.

use topoplan::routing::{RouteEntry, RoutingTable};

use ipnet::Ipv4Net;
use std::error::Error;
use std::fmt;
use std::net::Ipv4Addr;

/// Attributes which are printed without a value
const FLAGS: [&str; 4] = ["onlink", "linkdown", "dead", "offload"];
/// Attributes which are followed by a value, and which are ignored
const IGNORED: [&str; 8] = ["scope", "src", "metric", "table", "realm", "mtu", "expires", "pref"];

/// Routing table of the kernel, as returned by `ip route show`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KernelRoutingTable {
    /// Every entry from the routing table
    pub entries: Vec<KernelRoute>,
}

impl KernelRoutingTable {
    /// Parses the output of `ip route show`. Empty lines are skipped, and every other line must
    /// contain exactly one route.
    pub fn from(s: impl AsRef<str>) -> Result<Self, Box<dyn Error>> {
        let mut entries = Vec::new();
        for l in s.as_ref().lines().map(|l| l.trim()).filter(|l| !l.is_empty()) {
            let err = |p| format!("Cannot parse entry at pos {}: {}", p, l);
            entries.push(KernelRoute::from(l).map_err(err)?);
        }
        Ok(Self { entries })
    }

    /// Get the entry towards the given destination
    pub fn get(&self, destination: &Ipv4Net) -> Option<&KernelRoute> {
        let destination = destination.trunc();
        self.entries.iter().find(|e| e.destination == destination)
    }

    /// Compare the kernel table with the planned table. The result contains every planned entry
    /// which is missing or different in the kernel table (in the order of the planned table),
    /// followed by every kernel entry which was not planned (in the order of the kernel table).
    pub fn compare(&self, planned: &RoutingTable) -> Vec<RouteMismatch> {
        let mut result = Vec::new();
        for entry in planned.iter() {
            match self.get(&entry.destination) {
                None => result.push(RouteMismatch::Missing(entry.clone())),
                Some(k) if !k.matches(entry) => result.push(RouteMismatch::Different {
                    expected: entry.clone(),
                    found: k.clone(),
                }),
                Some(_) => {}
            }
        }
        result.extend(
            self.entries
                .iter()
                .filter(|k| planned.get(&k.destination).is_none())
                .cloned()
                .map(RouteMismatch::Unexpected),
        );
        result
    }
}

/// Single route of the kernel routing table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelRoute {
    /// Destination prefix. `default` is parsed as `0.0.0.0/0`, and a plain address as a host
    /// route.
    pub destination: Ipv4Net,
    /// Gateway of the route, `None` for routes which are directly connected
    pub via: Option<Ipv4Addr>,
    /// Outgoing interface
    pub dev: Option<String>,
    /// Protocol which installed the route, like `kernel` for connected routes
    pub proto: Option<String>,
}

impl KernelRoute {
    /// Parse a single line of `ip route show`. On error, the byte position at which the parser
    /// failed is returned.
    pub fn from(s: impl AsRef<str>) -> Result<Self, usize> {
        let s = s.as_ref();
        let mut tokens = tokenize(s).into_iter();

        let destination = match tokens.next() {
            Some((_, "default")) => Ipv4Net::default(),
            Some((pos, t)) if t.contains('/') => t.parse::<Ipv4Net>().map_err(|_| pos)?.trunc(),
            Some((pos, t)) => Ipv4Net::new(t.parse().map_err(|_| pos)?, 32).map_err(|_| pos)?,
            None => return Err(0),
        };

        let mut route = KernelRoute { destination, via: None, dev: None, proto: None };

        while let Some((pos, keyword)) = tokens.next() {
            if FLAGS.contains(&keyword) {
                continue;
            }
            let (value_pos, value) = tokens.next().ok_or(s.len())?;
            match keyword {
                "via" => route.via = Some(value.parse().map_err(|_| value_pos)?),
                "dev" => route.dev = Some(value.to_string()),
                "proto" => route.proto = Some(value.to_string()),
                k if IGNORED.contains(&k) => {}
                _ => return Err(pos),
            }
        }

        Ok(route)
    }

    /// Returns `true` if the kernel route implements the planned entry: same destination, same
    /// gateway, and the same interface (if the kernel reports an interface).
    pub fn matches(&self, entry: &RouteEntry) -> bool {
        self.destination == entry.destination.trunc()
            && self.via == entry.next_hop.gateway()
            && self.dev.as_deref().map(|d| d == entry.interface).unwrap_or(true)
    }
}

/// Split the string at whitespace, keeping the byte position of every token
fn tokenize(s: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in s.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(st)) => {
                tokens.push((st, &s[st..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(st) = start {
        tokens.push((st, &s[st..]));
    }
    tokens
}

/// Difference between the planned and the kernel routing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMismatch {
    /// The planned entry is not present in the kernel
    Missing(RouteEntry),
    /// The kernel contains a route that was not planned
    Unexpected(KernelRoute),
    /// The kernel route towards the destination differs from the planned entry
    Different {
        /// Planned entry
        expected: RouteEntry,
        /// Route found in the kernel
        found: KernelRoute,
    },
}

impl fmt::Display for RouteMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(e) => write!(f, "missing: {}", e),
            Self::Unexpected(k) => write!(f, "unexpected: {}", k.destination),
            Self::Different { expected, found } => write!(
                f,
                "different: expected {}, found via {} dev {}",
                expected,
                found.via.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
                found.dev.as_deref().unwrap_or("-")
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use topoplan::example_topologies::{ChainNet, ExampleTopology};
    use topoplan::routing::{NextHop, RouteOrigin};

    fn parse(s: &str) -> KernelRoute {
        match KernelRoute::from(s) {
            Ok(r) => r,
            Err(pos) => panic!(
                "Error\n{}\n{}^\n",
                s,
                std::iter::repeat(' ').take(pos).collect::<String>()
            ),
        }
    }

    const R1_ROUTES: &str = "default via 10.0.12.2 dev r1-eth1
10.0.12.0/24 dev r1-eth1 proto kernel scope link src 10.0.12.1
172.16.3.0/24 via 10.0.12.2 dev r1-eth1
192.168.1.0/24 dev r1-eth0 proto kernel scope link src 192.168.1.1
";

    #[test]
    fn default_route() {
        assert_eq!(
            parse("default via 10.0.12.2 dev r1-eth1 onlink"),
            KernelRoute {
                destination: Ipv4Net::default(),
                via: Some("10.0.12.2".parse().unwrap()),
                dev: Some("r1-eth1".into()),
                proto: None,
            }
        );
    }

    #[test]
    fn connected_route() {
        assert_eq!(
            parse("10.0.12.0/24 dev r1-eth1 proto kernel scope link src 10.0.12.1"),
            KernelRoute {
                destination: "10.0.12.0/24".parse().unwrap(),
                via: None,
                dev: Some("r1-eth1".into()),
                proto: Some("kernel".into()),
            }
        );
    }

    #[test]
    fn host_route() {
        let route = parse("10.0.0.5 via 10.0.12.2 dev eth0 metric 20");
        assert_eq!(route.destination, "10.0.0.5/32".parse().unwrap());
        assert_eq!(route.via, Some("10.0.12.2".parse().unwrap()));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(KernelRoute::from(""), Err(0));
        assert_eq!(KernelRoute::from("10.0.0/24 dev eth0"), Err(0));
        assert_eq!(KernelRoute::from("10.0.0.0/24 via 10.0.0.300"), Err(16));
        assert_eq!(KernelRoute::from("10.0.0.0/24 dev"), Err(15));
        assert_eq!(KernelRoute::from("10.0.0.0/24 nexthop x"), Err(12));
    }

    #[test]
    fn table() {
        let t = KernelRoutingTable::from(R1_ROUTES).unwrap();
        assert_eq!(t.entries.len(), 4);
        assert!(t.get(&"172.16.3.0/24".parse().unwrap()).is_some());
        assert!(t.get(&"172.16.4.0/24".parse().unwrap()).is_none());
        assert!(KernelRoutingTable::from("default via 10.0.0.1\nfoo bar").is_err());
    }

    #[test]
    fn compare_equal() {
        let plan = ChainNet::plan(0);
        let t = KernelRoutingTable::from(R1_ROUTES).unwrap();
        assert!(t.compare(plan.routing_table("r1").unwrap()).is_empty());
    }

    #[test]
    fn compare_mismatch() {
        let plan = ChainNet::plan(0);
        let t = KernelRoutingTable::from(
            "default via 10.0.12.3 dev r1-eth1
10.0.12.0/24 dev r1-eth1 proto kernel scope link src 10.0.12.1
192.168.1.0/24 dev r1-eth0 proto kernel scope link src 192.168.1.1
10.9.0.0/16 via 10.0.12.2 dev r1-eth1",
        )
        .unwrap();
        let expected = vec![
            RouteMismatch::Different {
                expected: RouteEntry::via(
                    Ipv4Net::default(),
                    "10.0.12.2".parse().unwrap(),
                    "r1-eth1",
                    RouteOrigin::Default,
                ),
                found: t.entries[0].clone(),
            },
            RouteMismatch::Missing(RouteEntry::via(
                "172.16.3.0/24".parse().unwrap(),
                "10.0.12.2".parse().unwrap(),
                "r1-eth1",
                RouteOrigin::Static,
            )),
            RouteMismatch::Unexpected(t.entries[3].clone()),
        ];
        assert_eq!(t.compare(plan.routing_table("r1").unwrap()), expected);
    }

    #[test]
    fn matches_planned_entry() {
        let entry = RouteEntry::connected("10.0.12.0/24".parse().unwrap(), "r1-eth1");
        assert_eq!(entry.next_hop, NextHop::Direct);
        let mut k = parse("10.0.12.0/24 proto kernel");
        assert!(k.matches(&entry));
        k.dev = Some("r1-eth0".into());
        assert!(!k.matches(&entry));
    }
}
