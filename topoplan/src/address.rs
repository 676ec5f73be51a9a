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

//! # Address Planner
//!
//! The [`AddressPlanner`] keeps track of all subnets of the topology and of the addresses that
//! were handed out in each of them. Addresses are either reserved explicitly (when the topology
//! names them), or assigned automatically from the host range of the subnet.
//!
//! The planner is permissive on purpose: subnets may be nested in each other (a router may carry
//! `10.0.0.1/8` on one interface and `10.101.0.2/24` on another), and the two ends of a link may
//! be configured with a different prefix length. Both situations are only logged.

use crate::types::{AddressError, NodeId};

use ipnet::Ipv4Net;
use log::*;
use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

/// Subnet with all addresses that are currently assigned inside.
#[derive(Debug, Clone, PartialEq)]
pub struct Subnet {
    prefix: Ipv4Net,
    members: BTreeMap<Ipv4Addr, NodeId>,
}

impl Subnet {
    fn new(prefix: Ipv4Net) -> Self {
        Self { prefix, members: BTreeMap::new() }
    }

    /// Return the prefix of the subnet
    pub fn prefix(&self) -> Ipv4Net {
        self.prefix
    }

    /// Iterate over all assigned addresses and their owners, ordered by address.
    pub fn members(&self) -> impl Iterator<Item = (Ipv4Addr, NodeId)> + '_ {
        self.members.iter().map(|(a, n)| (*a, *n))
    }

    /// Returns the address assigned to `node` in this subnet, if any.
    pub fn address_of(&self, node: NodeId) -> Option<Ipv4Addr> {
        self.members.iter().find(|(_, n)| **n == node).map(|(a, _)| *a)
    }

    /// Number of addresses in the host range of the subnet. For `/31` and `/32`, every address is
    /// usable. Otherwise, the network and the broadcast address are excluded.
    pub fn capacity(&self) -> u64 {
        let range = host_range(&self.prefix);
        (*range.end() as u64) - (*range.start() as u64) + 1
    }

    /// Number of free addresses left in the host range
    pub fn free(&self) -> u64 {
        let range = host_range(&self.prefix);
        let used = self.members.keys().filter(|a| range.contains(&u32::from(**a))).count();
        self.capacity() - used as u64
    }
}

/// Host range of a prefix, as integers.
fn host_range(prefix: &Ipv4Net) -> RangeInclusive<u32> {
    let network = u32::from(prefix.network());
    let broadcast = u32::from(prefix.broadcast());
    match prefix.prefix_len() {
        31 | 32 => network..=broadcast,
        _ => (network + 1)..=(broadcast - 1),
    }
}

/// # Address Planner
///
/// Subnets are kept in the order in which they are registered. Every address is owned by at most
/// one node in the entire topology.
#[derive(Debug, Clone, Default)]
pub struct AddressPlanner {
    subnets: Vec<Subnet>,
    lookup: HashMap<Ipv4Net, usize>,
    owners: HashMap<Ipv4Addr, NodeId>,
}

impl AddressPlanner {
    /// Create an empty address planner
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subnet and return its normalized prefix (host bits cleared). Registering the
    /// same prefix twice returns the existing subnet.
    pub fn add_subnet(&mut self, prefix: Ipv4Net) -> Ipv4Net {
        let prefix = prefix.trunc();
        if self.lookup.contains_key(&prefix) {
            return prefix;
        }
        for other in self.subnets.iter() {
            if other.prefix.contains(&prefix) || prefix.contains(&other.prefix) {
                warn!("Subnet {} is nested with subnet {}", prefix, other.prefix);
            }
        }
        self.lookup.insert(prefix, self.subnets.len());
        self.subnets.push(Subnet::new(prefix));
        prefix
    }

    /// Returns the subnet with exactly this prefix.
    pub fn subnet(&self, prefix: Ipv4Net) -> Option<&Subnet> {
        self.lookup.get(&prefix.trunc()).map(|i| &self.subnets[*i])
    }

    /// Iterate over all registered subnets, in registration order.
    pub fn subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter()
    }

    /// Returns the node that holds the address.
    pub fn owner(&self, addr: Ipv4Addr) -> Option<NodeId> {
        self.owners.get(&addr).copied()
    }

    /// Return the next unused address in the host range of the subnet. If `node` already holds an
    /// address in this subnet, the same address is returned again.
    pub fn assign(&mut self, node: NodeId, subnet: Ipv4Net) -> Result<Ipv4Addr, AddressError> {
        let idx = *self.lookup.get(&subnet.trunc()).ok_or(AddressError::UnknownSubnet(subnet))?;
        if let Some(addr) = self.subnets[idx].address_of(node) {
            return Ok(addr);
        }
        let prefix = self.subnets[idx].prefix;
        let addr = host_range(&prefix)
            .map(Ipv4Addr::from)
            .find(|a| !self.owners.contains_key(a))
            .ok_or(AddressError::AddressExhausted(prefix))?;
        debug!("Assign {} in {} to {:?}", addr, prefix, node);
        self.subnets[idx].members.insert(addr, node);
        self.owners.insert(addr, node);
        Ok(addr)
    }

    /// Reserve an explicit address for `node` in the subnet. The subnet must be registered. The
    /// call succeeds if the address is already reserved by the same node.
    pub fn reserve(
        &mut self,
        node: NodeId,
        subnet: Ipv4Net,
        addr: Ipv4Addr,
    ) -> Result<(), AddressError> {
        let idx = *self.lookup.get(&subnet.trunc()).ok_or(AddressError::UnknownSubnet(subnet))?;
        let prefix = self.subnets[idx].prefix;
        if !prefix.contains(&addr) {
            return Err(AddressError::AddressOutOfSubnet { addr, subnet: prefix });
        }
        match self.owners.get(&addr) {
            Some(owner) if *owner != node => {
                return Err(AddressError::AddressInUse { addr, owner: *owner })
            }
            _ => {}
        }
        self.subnets[idx].members.insert(addr, node);
        self.owners.insert(addr, node);
        Ok(())
    }

    /// Release the address of `node` in the subnet, and return it. The address may be assigned to
    /// a different node afterwards.
    pub fn release(&mut self, node: NodeId, subnet: Ipv4Net) -> Option<Ipv4Addr> {
        let idx = *self.lookup.get(&subnet.trunc())?;
        let addr = self.subnets[idx].address_of(node)?;
        self.subnets[idx].members.remove(&addr);
        // the same address may still be held in a nested subnet
        if !self.subnets.iter().any(|s| s.members.contains_key(&addr)) {
            self.owners.remove(&addr);
        }
        Some(addr)
    }
}
