//! # featcheck kernel
//!
//! Static wiring analysis for a composed deployable: given the scanned
//! descriptors of every module, decide whether each import and requirement
//! would find exactly one provider once the modules activate in level order.
//!
//! ## Architecture
//!
//! ```text
//! DescriptorSet         ← scanned modules, artifacts, region declaration
//!     │
//! VisibilitySieve       ← regions and the packages they expose
//! OriginIndex           ← module → units → regions
//!     │
//! LevelGroup            ← participants grouped by activation level
//!     │
//! check_api_regions     ← every declared export is backed
//! check_packages        ← package imports resolve, level and region aware
//! check_capabilities    ← generic requirements resolve, level aware
//!     │
//! ReportSink            ← errors and warnings, deterministic ids
//! ```

pub mod analyser;
pub mod capabilities;
pub mod completeness;
pub mod config;
pub mod error;
pub mod finding_id;
pub mod levels;
pub mod origins;
pub mod packages;
pub mod report;
pub mod sieve;

pub use analyser::{
    Analyser, AnalyserTask, ApiRegionsTask, BundlePackagesTask, RequirementsCapabilitiesTask,
    TaskContext, all_tasks, select_tasks,
};
pub use capabilities::{REQUIREMENTS_CAPABILITIES_TASK, check_capabilities};
pub use completeness::{API_REGIONS_TASK, check_api_regions};
pub use config::{AnalyserConfig, DEFAULT_CONFIG_FILE};
pub use error::AnalysisError;
pub use finding_id::{compute_finding_id, compute_report_digest};
pub use levels::{LevelGroup, Participant, group_by_level, module_groups, participant_groups};
pub use origins::{MODULE_ORIGINS_FILE, OriginIndex, OriginTable, REGION_ORIGINS_FILE};
pub use packages::{BUNDLE_PACKAGES_TASK, check_packages};
pub use report::{
    ANALYSIS_REPORT_KIND, AnalysisReport, AnalysisSummary, CollectingSink, Finding, FindingClass,
    ReportSink,
};
pub use sieve::{GLOBAL_REGION, Region, VisibilitySieve};
