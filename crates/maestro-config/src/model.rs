use std::net::SocketAddr;

use maestro_types::{Actor, Registry};

pub const DEFAULT_BIND: &str = "127.0.0.1:4100";

/// Fully validated daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub version: u32,
    pub server: ServerConfig,
    pub tokens: Vec<TokenGrant>,
    pub registry: Registry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

/// A bearer token and the actor it authenticates as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub token: String,
    pub actor: Actor,
}
