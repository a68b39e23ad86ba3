//! Status of one step inside a job flow.
//!
//! XML: `/DescribeJobFlowsResponse/DescribeJobFlowsResult/JobFlows/member/Steps/member`
//! Map: `JobFlows[i]["Steps"][j]`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::source::{MapSource, StatusSource, XmlSource};
use crate::xml::XmlElement;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepState {
    Pending,
    Running,
    Completed,
    Cancelled,
    Failed,
    Interrupted,
    Other(String),
}

impl From<&str> for StepState {
    fn from(s: &str) -> Self {
        match s {
            "PENDING" => Self::Pending,
            "RUNNING" => Self::Running,
            "COMPLETED" => Self::Completed,
            "CANCELLED" => Self::Cancelled,
            "FAILED" => Self::Failed,
            "INTERRUPTED" => Self::Interrupted,
            other => Self::Other(other.to_string()),
        }
    }
}

impl StepState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
            Self::Interrupted => "INTERRUPTED",
            Self::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFlowStatusStep {
    pub name: String,
    pub state: StepState,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl JobFlowStatusStep {
    pub fn from_source<S: StatusSource>(source: &S) -> Self {
        Self {
            name: source.text("StepConfig/Name"),
            state: StepState::from(source.text("ExecutionStatusDetail/State").as_str()),
            created_at: source.timestamp("ExecutionStatusDetail/CreationDateTime"),
            started_at: source.timestamp("ExecutionStatusDetail/StartDateTime"),
            ended_at: source.timestamp("ExecutionStatusDetail/EndDateTime"),
        }
    }

    /// From a `Steps/member` element.
    pub fn from_xml(element: &XmlElement) -> Self {
        Self::from_source(&XmlSource(element))
    }

    pub fn from_xml_members(members: &[&XmlElement]) -> Vec<Self> {
        members.iter().map(|m| Self::from_xml(m)).collect()
    }

    /// From one decoded `Steps` entry.
    pub fn from_map(step: &Value) -> Self {
        Self::from_source(&MapSource(step))
    }

    pub fn from_maps(steps: &[Value]) -> Vec<Self> {
        steps.iter().map(Self::from_map).collect()
    }
}
