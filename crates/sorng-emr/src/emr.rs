//! Typed EMR operations over [`EmrSession::submit`].
//!
//! Each operation builds a snake_case parameter tree, lets the session
//! marshal and sign it, and parses the XML reply where there is one.

use crate::client::EmrSession;
use crate::error::EmrResult;
use crate::params::{ParamMap, ParamValue};
use crate::status::JobFlowStatus;
use crate::steps::{default_installation_steps, CustomJarStep, InstallationStep};

pub const API_VERSION: &str = "2009-03-31";

/// Base tree for an action: `Action` and `Version`.
pub fn action_params(action: &str) -> ParamMap {
    let mut params = ParamMap::new();
    params.insert("action".to_string(), action.into());
    params.insert("version".to_string(), API_VERSION.into());
    params
}

#[derive(Debug, Clone)]
pub struct EmrClient {
    session: EmrSession,
    registry: Vec<InstallationStep>,
}

impl EmrClient {
    /// Client reporting the default Hive and Pig installation steps.
    pub fn new(session: EmrSession) -> Self {
        Self::with_registry(session, default_installation_steps())
    }

    pub fn with_registry(session: EmrSession, registry: Vec<InstallationStep>) -> Self {
        Self { session, registry }
    }

    pub fn session(&self) -> &EmrSession {
        &self.session
    }

    pub fn registry(&self) -> &[InstallationStep] {
        &self.registry
    }

    /// Status of the given job flows; all visible job flows when `ids` is empty.
    pub async fn describe_job_flows(&self, ids: &[&str]) -> EmrResult<Vec<JobFlowStatus>> {
        let mut params = action_params("DescribeJobFlows");
        if !ids.is_empty() {
            params.insert("job_flow_ids".to_string(), ParamValue::list(ids.iter().copied()));
        }
        let body = self.session.submit(&params).await?;
        JobFlowStatus::from_describe_response(&body, &self.registry)
    }

    pub async fn describe_job_flow(&self, id: &str) -> EmrResult<Option<JobFlowStatus>> {
        Ok(self.describe_job_flows(&[id]).await?.into_iter().next())
    }

    pub async fn add_job_flow_steps(&self, id: &str, steps: &[CustomJarStep]) -> EmrResult<()> {
        let mut params = action_params("AddJobFlowSteps");
        params.insert("job_flow_id".to_string(), id.into());
        params.insert(
            "steps".to_string(),
            ParamValue::List(steps.iter().map(CustomJarStep::to_step_config).collect()),
        );
        self.session.submit(&params).await?;
        log::debug!("Added {} steps to {}", steps.len(), id);
        Ok(())
    }

    pub async fn terminate_job_flows(&self, ids: &[&str]) -> EmrResult<()> {
        let mut params = action_params("TerminateJobFlows");
        params.insert("job_flow_ids".to_string(), ParamValue::list(ids.iter().copied()));
        self.session.submit(&params).await?;
        Ok(())
    }

    pub async fn set_termination_protection(&self, ids: &[&str], protected: bool) -> EmrResult<()> {
        let mut params = action_params("SetTerminationProtection");
        params.insert("job_flow_ids".to_string(), ParamValue::list(ids.iter().copied()));
        params.insert("termination_protected".to_string(), protected.into());
        self.session.submit(&params).await?;
        Ok(())
    }
}
