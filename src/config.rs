//! Retention policy configuration.
//!
//! Policies are configured per host role, then narrowed per project, per
//! snapshot kind and per instance or volume name. The most specific
//! non-empty policy wins.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigIssue, PolicyError};
use crate::retention::parse_schedule;

/// Host roles every configured target is pruned on.
pub const ROLES: [&str; 2] = ["source", "target"];

/// Which snapshot stream a policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionKind {
    Instances,
    Volumes,
}

impl RetentionKind {
    /// Singular label, suitable as a [`SnapshotOps::kind`](crate::SnapshotOps::kind).
    pub fn label(self) -> &'static str {
        match self {
            RetentionKind::Instances => "instance",
            RetentionKind::Volumes => "volume",
        }
    }
}

impl fmt::Display for RetentionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Policies for one snapshot kind inside a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionGroup {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_name: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRetention {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,
    #[serde(default)]
    pub instances: RetentionGroup,
    #[serde(default)]
    pub volumes: RetentionGroup,
}

impl ProjectRetention {
    fn group(&self, kind: RetentionKind) -> &RetentionGroup {
        match kind {
            RetentionKind::Instances => &self.instances,
            RetentionKind::Volumes => &self.volumes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRetention {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub projects: BTreeMap<String, ProjectRetention>,
}

/// Retention policies keyed by host role (`source`, `target`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hosts: BTreeMap<String, HostRetention>,
}

impl RetentionConfig {
    /// The policy for one snapshot stream, or `""` when none is configured.
    ///
    /// Precedence, lowest first: host default, project default, kind
    /// default, entry by name. Empty strings never override.
    pub fn resolve(&self, role: &str, project: &str, kind: RetentionKind, name: &str) -> &str {
        let Some(host) = self.hosts.get(role) else {
            return "";
        };
        let mut policy = host.default.as_str();

        let Some(proj) = host.projects.get(project) else {
            return policy;
        };
        for candidate in [
            proj.default.as_str(),
            proj.group(kind).default.as_str(),
            proj.group(kind)
                .by_name
                .get(name)
                .map(String::as_str)
                .unwrap_or(""),
        ] {
            if !candidate.is_empty() {
                policy = candidate;
            }
        }
        policy
    }

    /// Parse every configured policy, then every policy resolved for
    /// `targets` (`(project, kind, name)`) on each role in [`ROLES`].
    ///
    /// All problems are collected; nothing stops at the first one.
    pub fn validate<'a, I>(&self, targets: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (&'a str, RetentionKind, &'a str)>,
    {
        let mut issues = Vec::new();
        let mut check = |path: String, policy: &str| {
            if policy.is_empty() {
                return;
            }
            if let Err(error) = parse_schedule(policy) {
                issues.push(ConfigIssue { path, error });
            }
        };

        for (role, host) in &self.hosts {
            let base = format!("retention.hosts.{role}");
            check(format!("{base}.default"), &host.default);
            for (project, proj) in &host.projects {
                let base = format!("{base}.projects.{project}");
                check(format!("{base}.default"), &proj.default);
                for kind in [RetentionKind::Instances, RetentionKind::Volumes] {
                    let group = proj.group(kind);
                    let kind_key = serde_key(kind);
                    check(format!("{base}.{kind_key}.default"), &group.default);
                    for (name, policy) in &group.by_name {
                        check(format!("{base}.{kind_key}.byName.{name}"), policy);
                    }
                }
            }
        }

        for (project, kind, name) in targets {
            for role in ROLES {
                let policy = self.resolve(role, project, kind, name);
                check(
                    format!("resolved retention ({role}/{project} {kind} {name})"),
                    policy,
                );
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError { issues })
        }
    }

    /// First invalid policy configured anywhere, if any.
    pub fn first_error(&self) -> Option<PolicyError> {
        self.validate(std::iter::empty())
            .err()
            .and_then(|err| err.issues.into_iter().next())
            .map(|issue| issue.error)
    }
}

fn serde_key(kind: RetentionKind) -> &'static str {
    match kind {
        RetentionKind::Instances => "instances",
        RetentionKind::Volumes => "volumes",
    }
}
