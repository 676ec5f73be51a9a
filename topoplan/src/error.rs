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

//! Module containing all error types

use crate::types::{AddressError, ForwardingError, RouterError, SynthesisError, TopologyError};
use ipnet::PrefixLenError;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Error propagated from the address planner
    #[error("Address Error: {0}")]
    AddressError(#[from] AddressError),
    /// Error propagated from the topology graph
    #[error("Topology Error: {0}")]
    TopologyError(#[from] TopologyError),
    /// Error propagated from the router lifecycle
    #[error("Router Error: {0}")]
    RouterError(#[from] RouterError),
    /// Error propagated from the route synthesis
    #[error("Synthesis Error: {0}")]
    SynthesisError(#[from] SynthesisError),
    /// Error propagated from the forwarding checker
    #[error("Forwarding Error: {0}")]
    ForwardingError(#[from] ForwardingError),
    /// Invalid prefix length
    #[error("Invalid prefix length: {0}")]
    PrefixLenError(#[from] PrefixLenError),
}
