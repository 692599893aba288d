//! Network allow-list for the kiosk clock routes
//!
//! Clock in/out writes are only accepted from the warehouse network. The
//! client address is always the socket peer, headers are ignored.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::{AppError, ErrorCode};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::core::ServerState;
use crate::security_log;

/// One CIDR block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpBlock {
    network: IpAddr,
    prefix: u8,
}

impl IpBlock {
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, canonical(ip)) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = prefix_mask_u32(self.prefix);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = prefix_mask_u128(self.prefix);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

impl FromStr for IpBlock {
    type Err = String;

    /// `a.b.c.d/n`, `x::y/n`, or a bare address
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s, None),
        };
        let network: IpAddr = addr
            .trim()
            .parse()
            .map_err(|e| format!("invalid address {addr:?}: {e}"))?;
        let max = if network.is_ipv4() { 32 } else { 128 };
        let prefix = match prefix {
            Some(p) => p
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|p| *p <= max)
                .ok_or_else(|| format!("invalid prefix length {p:?}"))?,
            None => max,
        };
        Ok(Self { network, prefix })
    }
}

impl fmt::Display for IpBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

/// Set of allowed blocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpAllowList {
    blocks: Vec<IpBlock>,
}

impl IpAllowList {
    /// Parse a comma separated list. Invalid entries are logged and skipped.
    pub fn parse(raw: &str) -> Self {
        let blocks = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match entry.parse::<IpBlock>() {
                Ok(block) => Some(block),
                Err(e) => {
                    tracing::warn!(entry, error = %e, "Ignoring invalid clock CIDR");
                    None
                }
            })
            .collect();
        Self { blocks }
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.blocks.iter().any(|b| b.contains(ip))
    }

    pub fn blocks(&self) -> &[IpBlock] {
        &self.blocks
    }
}

/// IPv4-mapped IPv6 peers are compared as IPv4
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}

fn prefix_mask_u32(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

fn prefix_mask_u128(prefix: u8) -> u128 {
    if prefix == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(prefix))
    }
}

/// Reject clock writes from outside the allowed networks
pub async fn require_clock_network(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip());

    match peer {
        Some(ip) if state.clock_allowlist.contains(ip) => Ok(next.run(request).await),
        Some(ip) => {
            security_log!(
                "WARN",
                "clock_network_blocked",
                ip = ip.to_string(),
                uri = request.uri().path().to_string()
            );
            Err(AppError::new(ErrorCode::NetworkNotAllowed))
        }
        None => {
            security_log!(
                "WARN",
                "clock_network_unknown",
                uri = request.uri().path().to_string()
            );
            Err(AppError::with_message(
                ErrorCode::NetworkNotAllowed,
                "Unable to determine client address",
            ))
        }
    }
}
