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

//! Topology definition, read from a json file.

use topoplan::types::Role;
use topoplan::{Port, TopologyBuilder};

use ipnet::Ipv4Net;
use serde::Deserialize;
use std::error::Error;
use std::net::Ipv4Addr;
use std::path::Path;

/// Complete topology definition. Nodes are referenced by their name.
#[derive(Debug, Clone, Deserialize)]
pub struct TopologyFile {
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub links: Vec<LinkDef>,
    #[serde(default)]
    pub default_routes: Vec<RouteDef>,
    #[serde(default)]
    pub static_routes: Vec<RouteDef>,
    #[serde(default)]
    pub stub_default_routes: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeDef {
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub gateway: Option<Ipv4Addr>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkDef {
    pub a: PortDef,
    pub b: PortDef,
}

/// Endpoint of a link. `addr` is a static address, while `auto` names the subnet from which the
/// address is assigned automatically.
#[derive(Debug, Clone, Deserialize)]
pub struct PortDef {
    pub node: String,
    #[serde(default)]
    pub iface: Option<String>,
    #[serde(default)]
    pub addr: Option<Ipv4Net>,
    #[serde(default)]
    pub auto: Option<Ipv4Net>,
}

/// Default route (if `destination` is missing) or static route. A static route without `via` is
/// on-link with its interface.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteDef {
    pub router: String,
    #[serde(default)]
    pub destination: Option<Ipv4Net>,
    #[serde(default)]
    pub via: Option<Ipv4Addr>,
    #[serde(default)]
    pub iface: Option<String>,
}

impl TopologyFile {
    /// Read the topology from a json file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse the topology from a json string
    pub fn parse(s: &str) -> Result<Self, Box<dyn Error>> {
        Ok(serde_json::from_str(s)?)
    }

    /// Generate the topology builder from the definition
    pub fn builder(&self) -> Result<TopologyBuilder, Box<dyn Error>> {
        let mut b = TopologyBuilder::new();

        for node in self.nodes.iter() {
            match node.role {
                Role::Host => b.add_host(&node.name)?,
                Role::Switch => b.add_switch(&node.name)?,
                Role::Router => b.add_router(&node.name)?,
            };
        }

        for node in self.nodes.iter() {
            if let Some(gw) = node.gateway {
                let id = b.graph().node_id(&node.name)?;
                b.set_default_gateway(id, gw)?;
            }
        }

        for link in self.links.iter() {
            let (port_a, port_b) = (port(&b, &link.a)?, port(&b, &link.b)?);
            b.add_link(port_a, port_b)?;
        }

        for route in self.default_routes.iter().chain(self.static_routes.iter()) {
            let router = b.graph().node_id(&route.router)?;
            match (route.destination, route.via, route.iface.as_ref()) {
                (None, Some(via), None) => b.default_route(router, via)?,
                (None, Some(via), Some(iface)) => b.default_route_dev(router, via, iface)?,
                (Some(dest), Some(via), None) => b.static_route(router, dest, via)?,
                (Some(dest), Some(via), Some(iface)) => {
                    b.static_route_dev(router, dest, via, iface)?
                }
                (Some(dest), None, Some(iface)) => b.static_route_dev_only(router, dest, iface)?,
                (_, None, _) => {
                    return Err(format!("Route of {} needs a gateway", route.router).into())
                }
            }
        }

        b.stub_default_routes(self.stub_default_routes);
        Ok(b)
    }
}

fn port(b: &TopologyBuilder, def: &PortDef) -> Result<Port, Box<dyn Error>> {
    let mut port = Port::new(b.graph().node_id(&def.node)?);
    if let Some(iface) = def.iface.as_ref() {
        port = port.name(iface);
    }
    port = match (def.addr, def.auto) {
        (Some(_), Some(_)) => {
            return Err(format!("Port of {} has both a static and an automatic address", def.node)
                .into())
        }
        (Some(addr), None) => port.addr(addr),
        (None, Some(subnet)) => port.auto(subnet),
        (None, None) => port,
    };
    Ok(port)
}
