use std::{
    collections::{BTreeMap, HashSet},
    net::SocketAddr,
    path::{Path, PathBuf},
};

use maestro_types::{Actor, Registry, ServiceDefinition};

use crate::{
    model::{Config, ServerConfig, TokenGrant, DEFAULT_BIND},
    raw::{RawConfig, RawServer, RawService, RawToken},
    ConfigError,
};

const SUPPORTED_VERSION: u32 = 1;

impl RawConfig {
    /// Validate the raw file contents. Relative `cwd` values are resolved
    /// against `base_dir`.
    pub fn into_config(self, base_dir: &Path) -> Result<Config, ConfigError> {
        if self.version != SUPPORTED_VERSION {
            return Err(ConfigError::Validation(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        if self.services.is_empty() {
            return Err(ConfigError::Validation("no services defined".into()));
        }

        let services = self
            .services
            .into_iter()
            .map(|(name, raw_service)| {
                let service = raw_service.into_definition(&name, base_dir)?;
                Ok((name, service))
            })
            .collect::<Result<BTreeMap<String, ServiceDefinition>, ConfigError>>()?;

        Ok(Config {
            version: self.version,
            server: self.server.into_server()?,
            tokens: into_grants(self.tokens)?,
            registry: Registry { services },
        })
    }
}

impl RawService {
    fn into_definition(self, name: &str, base_dir: &Path) -> Result<ServiceDefinition, ConfigError> {
        if self.cmd.is_empty() {
            return Err(ConfigError::Validation(format!(
                "service `{name}`: cmd is empty"
            )));
        }
        if self.cmd.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "service `{name}`: cmd contains empty element"
            )));
        }

        let cwd = self.cwd.map(|cwd| {
            let cwd = PathBuf::from(cwd);
            if cwd.is_relative() {
                base_dir.join(cwd)
            } else {
                cwd
            }
        });

        Ok(ServiceDefinition {
            name: name.to_owned(),
            cmd: self.cmd,
            cwd,
            env: self.env.unwrap_or_default().into_iter().collect(),
        })
    }
}

impl RawServer {
    fn into_server(self) -> Result<ServerConfig, ConfigError> {
        let bind = self.bind.unwrap_or_else(|| DEFAULT_BIND.to_owned());
        let bind = bind.parse::<SocketAddr>().map_err(|err| {
            ConfigError::Validation(format!("server.bind `{bind}` is not a socket address: {err}"))
        })?;

        Ok(ServerConfig { bind })
    }
}

fn into_grants(tokens: Vec<RawToken>) -> Result<Vec<TokenGrant>, ConfigError> {
    let mut seen = HashSet::with_capacity(tokens.len());

    tokens
        .into_iter()
        .map(|raw| {
            if raw.token.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "token for `{}` is empty",
                    raw.id
                )));
            }
            if !seen.insert(raw.token.clone()) {
                return Err(ConfigError::Validation(format!(
                    "token for `{}` is already assigned",
                    raw.id
                )));
            }

            Ok(TokenGrant {
                token: raw.token,
                actor: Actor::new(raw.id, raw.name),
            })
        })
        .collect()
}
