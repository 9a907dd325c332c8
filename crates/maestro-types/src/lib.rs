use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    path::PathBuf,
};

/// A service the orchestrator knows how to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub name: String,
    pub cmd: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

/// Fixed set of services, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    pub services: BTreeMap<String, ServiceDefinition>,
}

impl Registry {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

impl FromIterator<ServiceDefinition> for Registry {
    fn from_iter<T: IntoIterator<Item = ServiceDefinition>>(iter: T) -> Self {
        Self {
            services: iter
                .into_iter()
                .map(|service| (service.name.clone(), service))
                .collect(),
        }
    }
}

/// Identity of whoever asked for an action. Only used in audit messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
