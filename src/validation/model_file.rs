//! Parser and limit checks for model description files.
//!
//! Three line shapes carry countable content:
//!
//! * agent declarations, `Agent <name>[<count>]:`
//! * transitions, `[shared] <name>: <left>[ <extra>] -> <right>[ <extra>]`
//! * array properties, `<COALITION|GOAL|PERSISTENT|REDUCTION>: [v1, v2, ...]`
//!
//! Every other significant line is declarative content the gateway does not
//! count, and is ignored. Parsing builds a [`ModelSummary`] in one pass; the
//! limits are then checked against the summary, so the outcome does not depend
//! on line order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{SourceFile, check_count, check_quantity};
use crate::{
    config::ModelFileLimits,
    error::{Metric, StructuredError, saturating_i64},
};

const AGENT_PREFIX: &str = "Agent ";
const SHARED_PREFIX: &str = "shared";
const TRANSITION_ARROW: &str = "->";

/// Names of the list-valued model properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArrayPropertyName {
    /// Agents forming the coalition under analysis.
    Coalition,
    /// Variables making up the goal.
    Goal,
    /// Variables kept by every state.
    Persistent,
    /// Variables used by the partial-order reduction.
    Reduction,
}

impl ArrayPropertyName {
    /// Every property, in the order the limits are checked.
    pub const ALL: [Self; 4] = [Self::Coalition, Self::Persistent, Self::Reduction, Self::Goal];

    /// Keyword as written in model files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coalition => "COALITION",
            Self::Goal => "GOAL",
            Self::Persistent => "PERSISTENT",
            Self::Reduction => "REDUCTION",
        }
    }

    /// Metric reported when the property list is too long.
    #[must_use]
    pub const fn metric(self) -> Metric {
        match self {
            Self::Coalition => Metric::CoalitionSize,
            Self::Goal => Metric::NumberOfGoalVariables,
            Self::Persistent => Metric::NumberOfPersistentVariables,
            Self::Reduction => Metric::NumberOfReductionVariables,
        }
    }

    /// Configured maximum list length.
    #[must_use]
    pub const fn limit(self, limits: &ModelFileLimits) -> i64 {
        match self {
            Self::Coalition => limits.max_coalition_size,
            Self::Goal => limits.max_number_of_goal_variables,
            Self::Persistent => limits.max_number_of_persistent_variables,
            Self::Reduction => limits.max_number_of_reduction_variables,
        }
    }
}

impl std::fmt::Display for ArrayPropertyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// One agent type and its instance count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentDeclaration<'a> {
    /// Agent type name.
    pub name: &'a str,
    /// Number of instances.
    pub count: i64,
}

/// An edge between two local states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionDeclaration<'a> {
    /// Action name.
    pub name: &'a str,
    /// Whether the action synchronizes several agents.
    pub shared: bool,
    /// Source state.
    pub left_state: &'a str,
    /// Target state.
    pub right_state: &'a str,
}

/// A named list property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayProperty<'a> {
    /// Property keyword.
    pub name: ArrayPropertyName,
    /// List entries, trimmed, empty entries dropped.
    pub values: Vec<&'a str>,
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Agent(AgentDeclaration<'a>),
    Transition(TransitionDeclaration<'a>),
    Property(ArrayProperty<'a>),
    Other,
}

fn parse_line<'a>(line: &'a str, file_id: &str) -> Result<Line<'a>, StructuredError> {
    if let Some(agent) = parse_agent(line, file_id)? {
        return Ok(Line::Agent(agent));
    }
    if let Some(property) = parse_property(line) {
        return Ok(Line::Property(property));
    }
    if line.contains(TRANSITION_ARROW) {
        return parse_transition(line, file_id).map(Line::Transition);
    }
    Ok(Line::Other)
}

fn parse_agent<'a>(line: &'a str, file_id: &str) -> Result<Option<AgentDeclaration<'a>>, StructuredError> {
    let Some(body) = line
        .strip_prefix(AGENT_PREFIX)
        .and_then(|rest| rest.strip_suffix(':'))
    else {
        return Ok(None);
    };
    let malformed = || StructuredError::file_format(file_id);
    let (name, count) = match body.split_once('[') {
        Some((name, rest)) => {
            let digits = rest.strip_suffix(']').ok_or_else(malformed)?.trim();
            (name.trim(), parse_count(digits).ok_or_else(malformed)?)
        }
        None => (body.trim(), 1),
    };
    if name.is_empty() {
        return Err(malformed());
    }
    Ok(Some(AgentDeclaration { name, count }))
}

/// Decimal instance count; values beyond `i64` saturate so the per-type
/// limit reports them.
fn parse_count(digits: &str) -> Option<i64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse::<i64>().unwrap_or(i64::MAX))
}

/// A property keyword without a single-line `[...]` list is not a property
/// line; multi-line lists are left to the engine.
fn parse_property(line: &str) -> Option<ArrayProperty<'_>> {
    let (name, rest) = ArrayPropertyName::ALL.iter().find_map(|name| {
        line.strip_prefix(name.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|rest| (*name, rest.trim()))
    })?;
    let inner = rest.strip_prefix('[')?.strip_suffix(']')?;
    let values = inner
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect();
    Some(ArrayProperty { name, values })
}

fn parse_transition<'a>(line: &'a str, file_id: &str) -> Result<TransitionDeclaration<'a>, StructuredError> {
    let malformed = || StructuredError::file_format(file_id);
    let (head, states) = line.split_once(':').ok_or_else(malformed)?;
    let definition = head.trim();
    let (shared, name) = match definition.strip_prefix(SHARED_PREFIX) {
        Some(rest) if rest.starts_with(|c: char| c.is_whitespace() || c == '[') => (true, rest.trim()),
        _ => (false, definition),
    };
    let (left, right) = states.split_once(TRANSITION_ARROW).ok_or_else(malformed)?;
    let left_state = state_name(left).ok_or_else(malformed)?;
    let right_state = state_name(right).ok_or_else(malformed)?;
    if name.is_empty() {
        return Err(malformed());
    }
    Ok(TransitionDeclaration {
        name,
        shared,
        left_state,
        right_state,
    })
}

/// The state name is the first word; anything after it is extra state data.
fn state_name(side: &str) -> Option<&str> { side.split_whitespace().next() }

/// Countable content of a model file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    /// Instance count per agent declaration, in file order.
    pub agents: Vec<(String, i64)>,
    /// Distinct state names referenced by transitions.
    pub states: BTreeSet<String>,
    /// Number of transition declarations.
    pub transitions: usize,
    /// Number of shared transition declarations.
    pub shared_transitions: usize,
    /// List length per declared array property.
    pub properties: BTreeMap<ArrayPropertyName, usize>,
}

impl ModelSummary {
    /// Collect the countable content of `file`.
    ///
    /// # Errors
    ///
    /// Returns [`StructuredError::DuplicateProperty`] when an array property is
    /// declared twice and [`StructuredError::FileFormat`] when a recognized
    /// line is malformed.
    pub fn parse(file: &SourceFile<'_>) -> Result<Self, StructuredError> {
        let mut summary = Self::default();
        for line in file.significant_lines() {
            match parse_line(line, file.id())? {
                Line::Agent(agent) => summary.agents.push((agent.name.to_owned(), agent.count)),
                Line::Transition(transition) => {
                    summary.states.insert(transition.left_state.to_owned());
                    summary.states.insert(transition.right_state.to_owned());
                    summary.transitions += 1;
                    if transition.shared {
                        summary.shared_transitions += 1;
                    }
                }
                Line::Property(property) => {
                    if summary
                        .properties
                        .insert(property.name, property.values.len())
                        .is_some()
                    {
                        return Err(StructuredError::DuplicateProperty {
                            property_name: property.name,
                        });
                    }
                }
                Line::Other => {}
            }
        }
        Ok(summary)
    }

    /// Total instance count over all agent declarations.
    #[must_use]
    pub fn total_agents(&self) -> i64 {
        self.agents
            .iter()
            .fold(0_i64, |total, (_, count)| total.saturating_add(*count))
    }

    /// Check the summary against `limits`.
    ///
    /// Checks run in a fixed order (agent types, agents per type, total
    /// agents, states, transitions, coalition, persistent, reduction, goal)
    /// and the first violation is returned.
    ///
    /// # Errors
    ///
    /// Returns [`StructuredError::MaxNumberExceeded`] naming the metric.
    pub fn check(&self, limits: &ModelFileLimits) -> Result<(), StructuredError> {
        check_count(
            Metric::NumberOfAgentTypes,
            self.agents.len(),
            limits.max_number_of_agent_types,
        )?;
        for (_, count) in &self.agents {
            check_quantity(
                Metric::NumberOfAgentsPerType,
                *count,
                limits.max_number_of_agents_per_type,
            )?;
        }
        check_quantity(
            Metric::NumberOfAgentsTotal,
            self.total_agents(),
            limits.max_number_of_agents_total,
        )?;
        check_count(
            Metric::NumberOfStates,
            self.states.len(),
            limits.max_number_of_states,
        )?;
        check_count(
            Metric::NumberOfTransitions,
            self.transitions,
            limits.max_number_of_transitions,
        )?;
        for name in ArrayPropertyName::ALL {
            if let Some(len) = self.properties.get(&name) {
                check_quantity(name.metric(), saturating_i64(*len), name.limit(limits))?;
            }
        }
        Ok(())
    }
}

/// Validate a model file end to end: size, structure, then limits.
///
/// # Errors
///
/// Returns the first violated constraint.
pub fn validate_model_file(
    file_id: &str,
    content: &str,
    limits: &ModelFileLimits,
) -> Result<ModelSummary, StructuredError> {
    let file = SourceFile::open(file_id, content, limits.max_file_size_bytes)?;
    let summary = ModelSummary::parse(&file)?;
    summary.check(limits)?;
    Ok(summary)
}
