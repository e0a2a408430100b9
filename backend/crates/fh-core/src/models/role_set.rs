use crate::{CoreError, Result as CoreErrorResult, Role};

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const ROLE_SEPARATOR: char = ',';

/// Ordered, duplicate-free set of roles.
///
/// Persisted as a comma separated list (`USER,ADMIN`). An empty set is never
/// stored: parsing an empty column yields `{USER}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn user() -> Self {
        Self(BTreeSet::from([Role::User]))
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.contains(Role::Admin)
    }

    /// Returns true if the role was not already present
    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    /// Copy of this set with `role` added
    pub fn with(&self, role: Role) -> Self {
        let mut roles = self.clone();
        roles.insert(role);
        roles
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Authority strings (`ROLE_USER`, `ROLE_ADMIN`) in stable order
    pub fn authorities(&self) -> Vec<String> {
        self.iter().map(|role| role.authority()).collect()
    }

    /// Database representation
    pub fn to_db_string(&self) -> String {
        self.iter()
            .map(|role| role.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for RoleSet {
    fn default() -> Self {
        Self::user()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for RoleSet {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> CoreErrorResult<Self> {
        let roles = s
            .split(ROLE_SEPARATOR)
            .filter(|part| !part.trim().is_empty())
            .map(Role::from_str)
            .collect::<CoreErrorResult<BTreeSet<_>>>()?;

        if roles.is_empty() {
            return Ok(Self::user());
        }

        Ok(Self(roles))
    }
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.to_db_string())
    }
}
