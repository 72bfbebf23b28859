//! The fixed set of specialist personas.
//!
//! There is exactly one persona per [`AgentRole`]. The table is built into the
//! binary and never changes at runtime.
use std::str::FromStr;

use indoc::indoc;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::errors::{MinicodeError, Result};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AgentRole {
    Architect,
    Developer,
    Reviewer,
    Tester,
    Debugger,
    Documenter,
}

impl AgentRole {
    /// Parse a role name, failing with [`MinicodeError::UnknownAgent`]
    pub fn parse(role: &str) -> Result<Self> {
        AgentRole::from_str(role.trim()).map_err(|_| MinicodeError::UnknownAgent(role.to_string()))
    }

    pub fn agent(self) -> &'static Agent {
        Agent::for_role(self)
    }
}

/// A persona: system prompt plus declared capabilities
#[derive(Debug, PartialEq, Eq)]
pub struct Agent {
    pub role: AgentRole,
    pub name: &'static str,
    pub system_prompt: &'static str,
    pub capabilities: &'static [&'static str],
}

static ARCHITECT: Agent = Agent {
    role: AgentRole::Architect,
    name: "System Architect",
    system_prompt: indoc! {"
        You are a System Architect AI. Your role is to:
        - Design high-level system architecture
        - Plan component structure and relationships
        - Define interfaces and data flow
        - Make technology stack decisions
        - Create implementation roadmaps
        Be concise and focus on clear, practical designs."},
    capabilities: &[
        "System design",
        "Architecture planning",
        "Component design",
        "Technology selection",
    ],
};

static DEVELOPER: Agent = Agent {
    role: AgentRole::Developer,
    name: "Code Developer",
    system_prompt: indoc! {"
        You are a Code Developer AI. Your role is to:
        - Write clean, efficient code
        - Implement features based on specifications
        - Follow best practices and patterns
        - Create modular, reusable components
        - Handle edge cases and errors
        Write production-ready code with proper error handling."},
    capabilities: &[
        "Code implementation",
        "Feature development",
        "Bug fixing",
        "Code optimization",
    ],
};

static REVIEWER: Agent = Agent {
    role: AgentRole::Reviewer,
    name: "Code Reviewer",
    system_prompt: indoc! {"
        You are a Code Reviewer AI. Your role is to:
        - Review code for quality and correctness
        - Identify bugs and potential issues
        - Suggest improvements and optimizations
        - Check for security vulnerabilities
        - Ensure best practices are followed
        Be thorough but constructive in your feedback."},
    capabilities: &[
        "Code review",
        "Quality assurance",
        "Security analysis",
        "Performance review",
    ],
};

static TESTER: Agent = Agent {
    role: AgentRole::Tester,
    name: "Test Engineer",
    system_prompt: indoc! {"
        You are a Test Engineer AI. Your role is to:
        - Write comprehensive test cases
        - Create unit and integration tests
        - Identify edge cases and scenarios
        - Ensure test coverage
        - Validate functionality
        Write thorough tests that catch potential issues."},
    capabilities: &[
        "Test writing",
        "Test planning",
        "Coverage analysis",
        "Test automation",
    ],
};

static DEBUGGER: Agent = Agent {
    role: AgentRole::Debugger,
    name: "Debug Specialist",
    system_prompt: indoc! {"
        You are a Debug Specialist AI. Your role is to:
        - Analyze error messages and stack traces
        - Identify root causes of bugs
        - Suggest specific fixes
        - Trace execution flow
        - Reproduce and isolate issues
        Be systematic and precise in debugging."},
    capabilities: &[
        "Error analysis",
        "Bug diagnosis",
        "Root cause analysis",
        "Fix suggestions",
    ],
};

static DOCUMENTER: Agent = Agent {
    role: AgentRole::Documenter,
    name: "Documentation Writer",
    system_prompt: indoc! {"
        You are a Documentation Writer AI. Your role is to:
        - Write clear, comprehensive documentation
        - Create API documentation
        - Write usage examples
        - Document architecture and design decisions
        - Keep documentation up-to-date
        Write documentation that developers will actually read and use."},
    capabilities: &[
        "API documentation",
        "User guides",
        "Code comments",
        "Architecture docs",
    ],
};

impl Agent {
    pub fn for_role(role: AgentRole) -> &'static Agent {
        match role {
            AgentRole::Architect => &ARCHITECT,
            AgentRole::Developer => &DEVELOPER,
            AgentRole::Reviewer => &REVIEWER,
            AgentRole::Tester => &TESTER,
            AgentRole::Debugger => &DEBUGGER,
            AgentRole::Documenter => &DOCUMENTER,
        }
    }
}

/// Look up a persona by role name
pub fn get(role: &str) -> Result<&'static Agent> {
    AgentRole::parse(role).map(Agent::for_role)
}

/// Every persona, in declaration order
pub fn agents() -> impl Iterator<Item = &'static Agent> {
    AgentRole::iter().map(Agent::for_role)
}

/// One `- role: Name` line per persona
pub fn list_agents() -> String {
    agents()
        .map(|agent| format!("- {}: {}", agent.role, agent.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Name followed by the capability list of the persona behind `role`
pub fn get_agent_info(role: &str) -> Result<String> {
    let agent = get(role)?;
    let capabilities = agent
        .capabilities
        .iter()
        .map(|capability| format!("- {}", capability))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(format!("{}\nCapabilities:\n{}", agent.name, capabilities))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_persona_per_role() {
        let roles: Vec<AgentRole> = agents().map(|agent| agent.role).collect();
        assert_eq!(roles, AgentRole::iter().collect::<Vec<_>>());
        assert_eq!(roles.len(), 6);
    }

    #[test]
    fn test_role_round_trips_through_name() {
        for role in AgentRole::iter() {
            assert_eq!(AgentRole::parse(role.as_ref()).unwrap(), role);
        }
        assert_eq!(AgentRole::parse(" tester ").unwrap(), AgentRole::Tester);
    }

    #[test]
    fn test_get_agent_info_lists_capabilities() {
        let info = get_agent_info("architect").unwrap();
        assert!(info.starts_with("System Architect\nCapabilities:\n"));
        for capability in ARCHITECT.capabilities {
            assert!(info.contains(&format!("- {}", capability)));
        }
    }

    #[test]
    fn test_unknown_role_is_an_error() {
        let err = get_agent_info("unknown-role").unwrap_err();
        assert!(matches!(err, MinicodeError::UnknownAgent(ref role) if role == "unknown-role"));
    }

    #[test]
    fn test_list_agents() {
        let listing = list_agents();
        assert_eq!(listing.lines().count(), 6);
        assert_eq!(listing.lines().next(), Some("- architect: System Architect"));
        assert!(listing.contains("- documenter: Documentation Writer"));
    }

    #[test]
    fn test_system_prompt_has_no_leading_indent() {
        assert!(DEBUGGER.system_prompt.starts_with("You are a Debug Specialist AI."));
        assert!(DEBUGGER.system_prompt.contains("\n- Trace execution flow\n"));
    }
}
