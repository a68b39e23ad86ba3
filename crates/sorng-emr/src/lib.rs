//! # sorng-emr – Amazon EMR (Elastic MapReduce) client
//!
//! Signs Query-protocol requests with AWS Signature Version 2, flattens
//! nested parameter trees into EMR's dotted wire names, and maps
//! DescribeJobFlows responses (XML or decoded JSON) onto one status model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  EmrClient  (emr.rs)                             │
//! │  └── DescribeJobFlows · AddJobFlowSteps          │
//! │      TerminateJobFlows · SetTerminationProtection│
//! ├──────────────────────────────────────────────────┤
//! │  EmrSession  (client.rs)                         │
//! │  ├── marshal   (params.rs)                       │
//! │  ├── sign      (signing.rs, SigV2 HmacSHA256)    │
//! │  ├── HttpTransport::post_form                    │
//! │  └── 4xx/5xx → EmrError  (xml.rs error docs)     │
//! ├──────────────────────────────────────────────────┤
//! │  JobFlowStatus / JobFlowStatusStep  (status/)    │
//! │  └── StatusSource: XmlSource · MapSource         │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Response encodings
//!
//! | Encoding | Timestamps          | Absent value |
//! |----------|---------------------|--------------|
//! | XML      | ISO-8601 strings    | empty text   |
//! | Map      | epoch seconds       | `0`          |

// ── Sub-modules ─────────────────────────────────────────────────────────

pub mod error;
pub mod config;
pub mod params;
pub mod signing;
pub mod xml;
pub mod client;

pub mod status;
pub mod steps;
pub mod emr;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use client::{EmrSession, HttpResponse, HttpTransport, ReqwestTransport};
pub use config::{
    CredentialSource, Credentials, EnvCredentialSource, SessionConfig, StaticCredentialSource,
};
pub use emr::EmrClient;
pub use error::{EmrError, EmrErrorKind, EmrResult};
pub use params::{camelize, marshal, FlatParams, ParamMap, ParamValue};
pub use signing::{aws_escape, SigV2Signer};
pub use status::{JobFlowState, JobFlowStatus, JobFlowStatusStep, StepState};
pub use steps::{default_installation_steps, CustomJarStep, InstallationStep, S3DistCpStep};
