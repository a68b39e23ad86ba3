//! Job step definitions submitted to a job flow, and the registry of steps
//! that install software on the cluster before they can run.

use serde::{Deserialize, Serialize};

use crate::params::ParamValue;

pub const ACTION_TERMINATE_JOB_FLOW: &str = "TERMINATE_JOB_FLOW";
pub const ACTION_CANCEL_AND_WAIT: &str = "CANCEL_AND_WAIT";
pub const ACTION_CONTINUE: &str = "CONTINUE";

// ── Installation registry ───────────────────────────────────────────────

/// A step type that needs a setup step on the cluster, identified in job
/// flow status by the name of that setup step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationStep {
    /// Name of the step type on our side (e.g. "HiveStep").
    pub registry_name: String,
    /// Name the setup step carries in the job flow (e.g. "Elasticity - Install Hive").
    pub aws_installation_step_name: String,
}

impl InstallationStep {
    pub fn new(registry_name: &str, aws_installation_step_name: &str) -> Self {
        Self {
            registry_name: registry_name.to_string(),
            aws_installation_step_name: aws_installation_step_name.to_string(),
        }
    }
}

/// The Hive and Pig installers, in registry order.
pub fn default_installation_steps() -> Vec<InstallationStep> {
    vec![
        InstallationStep::new("HiveStep", "Elasticity - Install Hive"),
        InstallationStep::new("PigStep", "Elasticity - Install Pig"),
    ]
}

/// Registry entries whose installation step name appears in `step_names`,
/// in registry order.
pub fn installed_steps(registry: &[InstallationStep], step_names: &[&str]) -> Vec<InstallationStep> {
    registry
        .iter()
        .filter(|entry| step_names.contains(&entry.aws_installation_step_name.as_str()))
        .cloned()
        .collect()
}

// ── Step builders ───────────────────────────────────────────────────────

/// A step that runs a JAR with arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomJarStep {
    pub name: String,
    pub jar: String,
    pub arguments: Vec<String>,
    pub action_on_failure: String,
}

impl CustomJarStep {
    pub fn new(jar: &str) -> Self {
        Self {
            name: "Elasticity Custom Jar Step".to_string(),
            jar: jar.to_string(),
            arguments: Vec::new(),
            action_on_failure: ACTION_TERMINATE_JOB_FLOW.to_string(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn action_on_failure(mut self, action: &str) -> Self {
        self.action_on_failure = action.to_string();
        self
    }

    /// The `StepConfig` parameter tree; `Args` is omitted when there are none.
    pub fn to_step_config(&self) -> ParamValue {
        let mut jar_step = vec![("jar", ParamValue::from(&self.jar))];
        if !self.arguments.is_empty() {
            jar_step.push(("args", ParamValue::from(self.arguments.clone())));
        }
        ParamValue::map([
            ("name", ParamValue::from(&self.name)),
            ("action_on_failure", ParamValue::from(&self.action_on_failure)),
            ("hadoop_jar_step", ParamValue::map(jar_step)),
        ])
    }
}

/// Copies data between S3 and HDFS with the S3DistCp tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3DistCpStep {
    pub step: CustomJarStep,
}

impl S3DistCpStep {
    pub const NAME: &'static str = "Elasticity S3DistCp Step";
    pub const JAR: &'static str = "/home/hadoop/lib/emr-s3distcp-1.0.jar";

    /// Each `(option, value)` pair becomes `--arg option --arg value`.
    pub fn new(options: &[(&str, &str)]) -> Self {
        let mut arguments = Vec::with_capacity(options.len() * 4);
        for (option, value) in options {
            arguments.push("--arg".to_string());
            arguments.push(option.to_string());
            arguments.push("--arg".to_string());
            arguments.push(value.to_string());
        }
        Self {
            step: CustomJarStep::new(Self::JAR).name(Self::NAME).arguments(arguments),
        }
    }

    pub fn to_step_config(&self) -> ParamValue {
        self.step.to_step_config()
    }
}

impl From<S3DistCpStep> for CustomJarStep {
    fn from(step: S3DistCpStep) -> Self {
        step.step
    }
}
