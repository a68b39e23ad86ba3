//! Job flow status parsed from DescribeJobFlows responses.
//!
//! Both wire encodings go through [`JobFlowStatus::from_source`]:
//!
//! | Encoding | Entry point                          | Absent timestamp |
//! |----------|--------------------------------------|------------------|
//! | XML      | [`JobFlowStatus::from_xml`]          | empty text       |
//! | Map      | [`JobFlowStatus::from_map`]          | epoch `0`        |
//!
//! State is never computed locally; it is the snapshot the service returned.

pub mod source;
pub mod step;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EmrError, EmrResult};
use crate::steps::{installed_steps, InstallationStep};
use crate::xml::XmlElement;

pub use source::{InstanceGroup, MapSource, StatusSource, XmlSource};
pub use step::{JobFlowStatusStep, StepState};

/// Path from the response root to each job flow `<member>`.
pub const JOB_FLOW_MEMBERS_PATH: &str = "DescribeJobFlowsResult/JobFlows/member";

// ── State ───────────────────────────────────────────────────────────────

/// Job flow lifecycle state.
///
/// See <http://docs.aws.amazon.com/ElasticMapReduce/latest/DeveloperGuide/ProcessingCycle.html>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobFlowState {
    Starting,
    Bootstrapping,
    Running,
    Waiting,
    ShuttingDown,
    Completed,
    Failed,
    Terminated,
    Other(String),
}

impl From<&str> for JobFlowState {
    fn from(s: &str) -> Self {
        match s {
            "STARTING" => Self::Starting,
            "BOOTSTRAPPING" => Self::Bootstrapping,
            "RUNNING" => Self::Running,
            "WAITING" => Self::Waiting,
            "SHUTTING_DOWN" => Self::ShuttingDown,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            "TERMINATED" => Self::Terminated,
            other => Self::Other(other.to_string()),
        }
    }
}

impl JobFlowState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Starting => "STARTING",
            Self::Bootstrapping => "BOOTSTRAPPING",
            Self::Running => "RUNNING",
            Self::Waiting => "WAITING",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Terminated => "TERMINATED",
            Self::Other(s) => s,
        }
    }

    /// Whether the job flow is still alive. Every other state is terminal here.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Starting | Self::Bootstrapping | Self::Running | Self::Waiting | Self::ShuttingDown
        )
    }
}

impl std::fmt::Display for JobFlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Job flow ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFlowStatus {
    pub name: String,
    pub jobflow_id: String,
    pub state: JobFlowState,
    pub last_state_change_reason: String,
    pub steps: Vec<JobFlowStatusStep>,
    /// Registry entries whose installation step is among `steps`.
    pub installed_steps: Vec<InstallationStep>,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Whole minutes from `started_at` to `ended_at`, when both are known.
    pub duration: Option<i64>,
    pub instance_count: String,
    pub master_instance_type: String,
    pub master_instance_id: Option<String>,
    pub slave_instance_type: String,
    pub master_public_dns_name: Option<String>,
    pub normalized_instance_hours: String,
    pub instance_groups: Vec<InstanceGroup>,
}

impl JobFlowStatus {
    /// Build a status from any encoding. `registry` lists the step types whose
    /// installation steps should be reported in `installed_steps`.
    pub fn from_source<S: StatusSource>(source: &S, registry: &[InstallationStep]) -> Self {
        let steps: Vec<JobFlowStatusStep> = source
            .items("Steps")
            .iter()
            .map(JobFlowStatusStep::from_source)
            .collect();
        let step_names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        let installed = installed_steps(registry, &step_names);

        let started_at = source.timestamp("ExecutionStatusDetail/StartDateTime");
        let ended_at = source.timestamp("ExecutionStatusDetail/EndDateTime");
        let duration = match (started_at, ended_at) {
            (Some(start), Some(end)) => Some((end - start).num_minutes()),
            _ => None,
        };

        let status = Self {
            name: source.text("Name"),
            jobflow_id: source.text("JobFlowId"),
            state: JobFlowState::from(source.text("ExecutionStatusDetail/State").as_str()),
            last_state_change_reason: source.text("ExecutionStatusDetail/LastStateChangeReason"),
            installed_steps: installed,
            created_at: source.timestamp("ExecutionStatusDetail/CreationDateTime"),
            started_at,
            ready_at: source.timestamp("ExecutionStatusDetail/ReadyDateTime"),
            ended_at,
            duration,
            instance_count: source.text("Instances/InstanceCount"),
            master_instance_type: source.text("Instances/MasterInstanceType"),
            master_instance_id: source.optional_text("Instances/MasterInstanceId"),
            slave_instance_type: source.text("Instances/SlaveInstanceType"),
            master_public_dns_name: source.optional_text("Instances/MasterPublicDnsName"),
            normalized_instance_hours: source.text("Instances/NormalizedInstanceHours"),
            instance_groups: source.instance_groups(),
            steps,
        };
        log::debug!(
            "Parsed job flow {} ({}) with {} steps",
            status.jobflow_id,
            status.state,
            status.steps.len()
        );
        status
    }

    /// From a `JobFlows/member` element.
    pub fn from_xml(element: &XmlElement, registry: &[InstallationStep]) -> Self {
        Self::from_source(&XmlSource(element), registry)
    }

    pub fn from_xml_members(members: &[&XmlElement], registry: &[InstallationStep]) -> Vec<Self> {
        members.iter().map(|m| Self::from_xml(m, registry)).collect()
    }

    /// From one decoded `JobFlows` entry.
    pub fn from_map(job_flow: &Value, registry: &[InstallationStep]) -> Self {
        Self::from_source(&MapSource(job_flow), registry)
    }

    pub fn from_maps(job_flows: &[Value], registry: &[InstallationStep]) -> Vec<Self> {
        job_flows.iter().map(|j| Self::from_map(j, registry)).collect()
    }

    /// Every job flow in a DescribeJobFlows XML response body.
    pub fn from_describe_response(
        body: &str,
        registry: &[InstallationStep],
    ) -> EmrResult<Vec<Self>> {
        let root = XmlElement::parse(body)?;
        if root.name != "DescribeJobFlowsResponse" {
            return Err(EmrError::xml(format!(
                "Expected DescribeJobFlowsResponse, got <{}>",
                root.name
            )));
        }
        Ok(Self::from_xml_members(&root.find_all(JOB_FLOW_MEMBERS_PATH), registry))
    }

    /// Every job flow in a JSON DescribeJobFlows response
    /// (`{"JobFlows": [...]}`) or a bare array of job flows.
    pub fn from_json(body: &str, registry: &[InstallationStep]) -> EmrResult<Vec<Self>> {
        let value: Value = serde_json::from_str(body)?;
        let flows = match value {
            Value::Array(flows) => flows,
            Value::Object(mut obj) => match obj.remove("JobFlows") {
                Some(Value::Array(flows)) => flows,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(Self::from_maps(&flows, registry))
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}
