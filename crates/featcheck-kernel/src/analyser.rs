//! Task registry and the analysis driver.

use crate::capabilities::{REQUIREMENTS_CAPABILITIES_TASK, check_capabilities};
use crate::completeness::{API_REGIONS_TASK, check_api_regions};
use crate::config::AnalyserConfig;
use crate::error::AnalysisError;
use crate::origins::OriginIndex;
use crate::packages::{BUNDLE_PACKAGES_TASK, check_packages};
use crate::report::{AnalysisReport, CollectingSink, ReportSink};
use crate::sieve::VisibilitySieve;
use featcheck_model::DescriptorSet;

/// What a task sees of the run.
pub struct TaskContext<'a> {
    pub set: &'a DescriptorSet,
    pub origins: &'a OriginIndex,
}

impl TaskContext<'_> {
    /// A fresh sieve over the deployable's region declaration, if it has one.
    pub fn region_declaration(&self) -> Result<Option<VisibilitySieve>, AnalysisError> {
        self.set
            .api_regions
            .as_ref()
            .map(VisibilitySieve::from_value)
            .transpose()
    }
}

pub trait AnalyserTask {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn execute(&self, ctx: &TaskContext<'_>, sink: &mut dyn ReportSink)
    -> Result<(), AnalysisError>;
}

pub struct ApiRegionsTask;

impl AnalyserTask for ApiRegionsTask {
    fn id(&self) -> &'static str {
        API_REGIONS_TASK
    }

    fn name(&self) -> &'static str {
        "API regions completeness"
    }

    fn execute(
        &self,
        ctx: &TaskContext<'_>,
        sink: &mut dyn ReportSink,
    ) -> Result<(), AnalysisError> {
        let Some(mut sieve) = ctx.region_declaration()? else {
            tracing::debug!("deployable declares no regions");
            return Ok(());
        };
        check_api_regions(&mut sieve, &ctx.set.deployable.id, &ctx.set.modules, sink);
        Ok(())
    }
}

pub struct BundlePackagesTask;

impl AnalyserTask for BundlePackagesTask {
    fn id(&self) -> &'static str {
        BUNDLE_PACKAGES_TASK
    }

    fn name(&self) -> &'static str {
        "Module package imports"
    }

    fn execute(
        &self,
        ctx: &TaskContext<'_>,
        sink: &mut dyn ReportSink,
    ) -> Result<(), AnalysisError> {
        let sieve = ctx.region_declaration()?;
        check_packages(ctx.set, sieve.as_ref(), ctx.origins, sink);
        Ok(())
    }
}

pub struct RequirementsCapabilitiesTask;

impl AnalyserTask for RequirementsCapabilitiesTask {
    fn id(&self) -> &'static str {
        REQUIREMENTS_CAPABILITIES_TASK
    }

    fn name(&self) -> &'static str {
        "Requirements and capabilities"
    }

    fn execute(
        &self,
        ctx: &TaskContext<'_>,
        sink: &mut dyn ReportSink,
    ) -> Result<(), AnalysisError> {
        check_capabilities(ctx.set, sink);
        Ok(())
    }
}

/// Every known task, in default run order.
pub fn all_tasks() -> Vec<Box<dyn AnalyserTask>> {
    vec![
        Box::new(ApiRegionsTask),
        Box::new(BundlePackagesTask),
        Box::new(RequirementsCapabilitiesTask),
    ]
}

/// Tasks named by `ids`, in that order. No ids selects every task.
pub fn select_tasks(ids: &[String]) -> Result<Vec<Box<dyn AnalyserTask>>, AnalysisError> {
    if ids.is_empty() {
        return Ok(all_tasks());
    }
    let mut selected = Vec::with_capacity(ids.len());
    for id in ids {
        let task = all_tasks()
            .into_iter()
            .find(|task| task.id() == id)
            .ok_or_else(|| AnalysisError::UnknownTask(id.clone()))?;
        selected.push(task);
    }
    Ok(selected)
}

pub struct Analyser {
    tasks: Vec<Box<dyn AnalyserTask>>,
    origins: OriginIndex,
}

impl Analyser {
    pub fn new(tasks: Vec<Box<dyn AnalyserTask>>, origins: OriginIndex) -> Self {
        Self { tasks, origins }
    }

    pub fn from_config(config: &AnalyserConfig) -> Result<Self, AnalysisError> {
        let tasks = select_tasks(&config.tasks)?;
        let origins = OriginIndex::load(config.file_storage.as_deref())?;
        Ok(Self::new(tasks, origins))
    }

    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|task| task.id().to_string()).collect()
    }

    /// Runs every task over `set` into one report.
    pub fn run(&self, set: &DescriptorSet) -> Result<AnalysisReport, AnalysisError> {
        let ctx = TaskContext {
            set,
            origins: &self.origins,
        };
        let mut sink = CollectingSink::new();
        for task in &self.tasks {
            let (errors_before, warnings_before) = (sink.errors.len(), sink.warnings.len());
            tracing::debug!(task = task.id(), "running task");
            task.execute(&ctx, &mut sink)?;
            tracing::info!(
                task = task.id(),
                errors = sink.errors.len() - errors_before,
                warnings = sink.warnings.len() - warnings_before,
                "{} finished",
                task.name()
            );
        }
        Ok(AnalysisReport::new(
            set.deployable.id.clone(),
            self.task_ids(),
            set.modules.len(),
            sink,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::FindingClass;
    use featcheck_model::{ModuleDescriptor, PackageExport, Version};
    use serde_json::json;

    fn ids(tasks: &[Box<dyn AnalyserTask>]) -> Vec<&'static str> {
        tasks.iter().map(|task| task.id()).collect()
    }

    #[test]
    fn empty_selection_is_every_task() {
        let tasks = select_tasks(&[]).expect("select");
        assert_eq!(
            ids(&tasks),
            vec!["api-regions", "bundle-packages", "requirements-capabilities"]
        );
    }

    #[test]
    fn selection_keeps_requested_order() {
        let tasks = select_tasks(&[
            "requirements-capabilities".to_string(),
            "api-regions".to_string(),
        ])
        .expect("select");
        assert_eq!(ids(&tasks), vec!["requirements-capabilities", "api-regions"]);
    }

    #[test]
    fn unknown_task_is_rejected() {
        let Err(err) = select_tasks(&["feature-equivalence".to_string()]) else {
            panic!("unknown task should be rejected");
        };
        assert_eq!(err.to_string(), "unknown analyser task `feature-equivalence`");
    }

    #[test]
    fn run_without_regions_skips_completeness() {
        let mut set = DescriptorSet::new("g:f:1");
        set.modules = vec![ModuleDescriptor::new("b1", Version::new(1, 0, 0), 1)];
        let analyser = Analyser::new(all_tasks(), OriginIndex::default());
        let report = analyser.run(&set).expect("run");
        assert!(report.accepted());
        assert_eq!(report.summary.task_count, 3);
        assert_eq!(report.summary.module_count, 1);
    }

    #[test]
    fn unbacked_region_export_rejects() {
        let mut module = ModuleDescriptor::new("b1", Version::new(1, 0, 0), 1);
        module.exports.push(PackageExport {
            name: "org.a".to_string(),
            version: Version::new(1, 0, 0),
        });
        let mut set = DescriptorSet::new("g:f:1");
        set.modules = vec![module];
        set.api_regions = Some(json!([{"name": "global", "exports": ["org.a", "org.b"]}]));

        let analyser = Analyser::new(all_tasks(), OriginIndex::default());
        let report = analyser.run(&set).expect("run");
        assert!(!report.accepted());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].class, FindingClass::UnbackedExport);
        assert_eq!(report.errors[0].task, "api-regions");
    }

    #[test]
    fn malformed_declaration_aborts_the_run() {
        let mut set = DescriptorSet::new("g:f:1");
        set.api_regions = Some(json!({"name": "global"}));
        let analyser = Analyser::new(all_tasks(), OriginIndex::default());
        let err = analyser.run(&set).expect_err("malformed");
        assert!(matches!(err, AnalysisError::MalformedDeclaration { .. }));
    }

    #[test]
    fn repeated_runs_share_a_digest() {
        let mut set = DescriptorSet::new("g:f:1");
        set.api_regions = Some(json!([{"name": "global", "exports": ["org.missing"]}]));
        let analyser = Analyser::new(all_tasks(), OriginIndex::default());
        let first = analyser.run(&set).expect("first run");
        let second = analyser.run(&set).expect("second run");
        assert_eq!(first.digest, second.digest);
        assert_eq!(first, second);
    }
}
