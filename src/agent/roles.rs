//! Agent role identities.
//!
//! Roles are a closed set: adding one means adding a variant here plus a
//! default prompt, so call sites never compare raw strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Functional identity of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Manager,
    Researcher,
    Coder,
    Critic,
}

impl AgentRole {
    pub const ALL: [AgentRole; 4] = [
        AgentRole::Manager,
        AgentRole::Researcher,
        AgentRole::Coder,
        AgentRole::Critic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Manager => "manager",
            AgentRole::Researcher => "researcher",
            AgentRole::Coder => "coder",
            AgentRole::Critic => "critic",
        }
    }

    /// The bus channel this role owns.
    pub fn channel(&self) -> String {
        format!("agent:{}", self.as_str())
    }

    /// Fallback system prompt used when the role has no `AGENT.md`.
    pub fn default_prompt(&self) -> &'static str {
        match self {
            AgentRole::Manager => {
                "You are the manager agent. You coordinate the team: break work \
                 into tasks on the shared task board, delegate to other agents \
                 with send_message or spawn, and review their results."
            }
            AgentRole::Researcher => {
                "You are the researcher agent. You gather information with the \
                 web tools, summarize findings, and report back to whoever asked."
            }
            AgentRole::Coder => {
                "You are the coder agent. You implement changes in the workspace \
                 with the file and shell tools and report what you changed."
            }
            AgentRole::Critic => {
                "You are the critic agent. You review work produced by the team, \
                 point out problems, and suggest concrete improvements."
            }
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown agent role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for AgentRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager" => Ok(AgentRole::Manager),
            "researcher" => Ok(AgentRole::Researcher),
            "coder" => Ok(AgentRole::Coder),
            "critic" => Ok(AgentRole::Critic),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_naming() {
        assert_eq!(AgentRole::Manager.channel(), "agent:manager");
        assert_eq!(AgentRole::Researcher.channel(), "agent:researcher");
    }

    #[test]
    fn test_round_trip_parse() {
        for role in AgentRole::ALL {
            assert_eq!(role.as_str().parse::<AgentRole>().unwrap(), role);
        }
        assert!("intern".parse::<AgentRole>().is_err());
    }
}
