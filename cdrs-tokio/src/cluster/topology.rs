//! Cluster topology as discovered from `system.local`/`system.peers` and kept current by the
//! control connection's TOPOLOGY_CHANGE/STATUS_CHANGE event handling (§4.6).

use std::net::SocketAddr;

use cassandra_protocol::token::Token;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostState {
    Up,
    Down,
}

/// One node's identity and placement as known to the driver. Cheap to clone; held behind an
/// `Arc` everywhere it's shared (control connection, token map, load balancing policies).
#[derive(Debug, Clone)]
pub struct Host {
    pub addr: SocketAddr,
    pub host_id: Uuid,
    pub datacenter: Option<String>,
    pub rack: Option<String>,
    pub tokens: Vec<Token>,
    pub release_version: Option<String>,
    pub state: HostState,
}

impl Host {
    pub fn is_up(&self) -> bool {
        self.state == HostState::Up
    }
}

/// Snapshot of every node the control connection currently knows about.
#[derive(Debug, Clone, Default)]
pub struct HostMap {
    hosts: Vec<Host>,
}

impl HostMap {
    pub fn new(hosts: Vec<Host>) -> Self {
        HostMap { hosts }
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn find(&self, addr: &SocketAddr) -> Option<&Host> {
        self.hosts.iter().find(|host| &host.addr == addr)
    }

    pub fn upsert(&mut self, host: Host) {
        if let Some(existing) = self.hosts.iter_mut().find(|h| h.addr == host.addr) {
            *existing = host;
        } else {
            self.hosts.push(host);
        }
    }

    pub fn remove(&mut self, addr: &SocketAddr) {
        self.hosts.retain(|h| &h.addr != addr);
    }

    pub fn set_state(&mut self, addr: &SocketAddr, state: HostState) {
        if let Some(host) = self.hosts.iter_mut().find(|h| &h.addr == addr) {
            host.state = state;
        }
    }
}
