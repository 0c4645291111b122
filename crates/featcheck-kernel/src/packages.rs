//! Package import resolution.
//!
//! Modules are walked one start level at a time, lowest first. Before the
//! imports of a level are checked, every module of that level exporting
//! something joins the set of visible exporters, so modules at the same
//! level see each other while later levels stay invisible. The framework
//! is visible from the start.
//!
//! For each import the visible exporters offering the package name are the
//! candidates. Candidates outside the import's version range are dropped,
//! then region rules apply:
//!
//! - no origin information for the exporter: visible
//! - the export is declared in the `global` region: visible
//! - otherwise the exporter's regions must intersect the importer's regions
//!
//! No visible candidate is a missing import, one is a resolved import,
//! more than one is ambiguous.
//!
//! Findings are reported per module, level ascending, input order within a
//! level.

use crate::levels::group_by_level;
use crate::origins::OriginIndex;
use crate::report::{Finding, FindingClass, ReportSink};
use crate::sieve::{GLOBAL_REGION, VisibilitySieve};
use featcheck_model::{DescriptorSet, ModuleDescriptor, PackageExport, PackageImport};
use std::collections::BTreeSet;
use std::fmt::Display;

pub const BUNDLE_PACKAGES_TASK: &str = "bundle-packages";

/// Packages whose unversioned imports are not worth a warning.
const UNVERSIONED_IMPORT_PREFIXES: &[&str] = &["javax.", "org.w3c."];

#[derive(Debug, Default)]
struct ModuleReport<'a> {
    exports_without_version: Vec<&'a PackageExport>,
    imports_without_version: Vec<&'a PackageImport>,
    missing: Vec<&'a PackageImport>,
    missing_with_version: Vec<Unresolved<'a>>,
    missing_optional: Vec<&'a PackageImport>,
    ambiguous: Vec<Ambiguity<'a>>,
}

impl ModuleReport<'_> {
    fn is_empty(&self) -> bool {
        self.exports_without_version.is_empty()
            && self.imports_without_version.is_empty()
            && self.missing.is_empty()
            && self.missing_with_version.is_empty()
            && self.missing_optional.is_empty()
            && self.ambiguous.is_empty()
    }
}

#[derive(Debug)]
struct Unresolved<'a> {
    import: &'a PackageImport,
    /// Candidates that matched name and range but were hidden by regions.
    hidden: Vec<RegionExclusion>,
}

#[derive(Debug)]
struct RegionExclusion {
    exporter: String,
    exporter_regions: BTreeSet<String>,
    importer_regions: BTreeSet<String>,
}

#[derive(Debug)]
struct Ambiguity<'a> {
    import: &'a PackageImport,
    candidates: Vec<String>,
}

/// Exporting modules visible so far, framework first, then by level.
#[derive(Debug, Default)]
struct ExportingModules<'a> {
    modules: Vec<&'a ModuleDescriptor>,
}

impl<'a> ExportingModules<'a> {
    fn seeded(framework: Option<&'a ModuleDescriptor>) -> Self {
        Self {
            modules: framework.into_iter().collect(),
        }
    }

    fn admit(&mut self, module: &'a ModuleDescriptor) {
        if !module.exports.is_empty() {
            self.modules.push(module);
        }
    }

    fn offering(&self, package: &str) -> Vec<&'a ModuleDescriptor> {
        self.modules
            .iter()
            .copied()
            .filter(|module| module.exports_package_named(package))
            .collect()
    }
}

/// Regions through which an exporter's package can be seen.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reach {
    Unrestricted,
    Regions(BTreeSet<String>),
}

struct RegionVisibility<'a> {
    sieve: Option<&'a VisibilitySieve>,
    origins: &'a OriginIndex,
}

impl RegionVisibility<'_> {
    /// Regions contributed by the exporter's units that declare `package`.
    fn reach(&self, exporter: &ModuleDescriptor, package: &str) -> Reach {
        let Some(sieve) = self.sieve else {
            return Reach::Unrestricted;
        };
        let Some(units) = self.origins.units_of(&exporter.symbolic_name) else {
            return Reach::Unrestricted;
        };
        let mut regions = BTreeSet::new();
        for unit in units {
            let Some(unit_regions) = self.origins.regions_of_unit(unit) else {
                return Reach::Unrestricted;
            };
            regions.extend(
                unit_regions
                    .iter()
                    .filter(|region| sieve.declares(region, package))
                    .cloned(),
            );
        }
        Reach::Regions(regions)
    }

    fn importer_regions(&self, importer: &ModuleDescriptor) -> BTreeSet<String> {
        self.origins.regions_of_module(&importer.symbolic_name)
    }
}

/// Resolves every package import of `set` and reports the outcome.
///
/// `sieve` is the region declaration as declared; `None` disables region
/// filtering altogether.
pub fn check_packages(
    set: &DescriptorSet,
    sieve: Option<&VisibilitySieve>,
    origins: &OriginIndex,
    sink: &mut dyn ReportSink,
) {
    let mut reports: Vec<ModuleReport<'_>> =
        set.modules.iter().map(|_| ModuleReport::default()).collect();

    check_versions(set, &mut reports);

    let visibility = RegionVisibility { sieve, origins };
    let mut exporting = ExportingModules::seeded(set.framework.as_ref());
    let groups = group_by_level(set.modules.iter().enumerate(), |(_, module)| {
        i64::from(module.start_level)
    });

    for group in &groups {
        for &(_, module) in &group.members {
            exporting.admit(module);
        }
        tracing::debug!(
            level = group.level,
            modules = group.members.len(),
            exporters = exporting.modules.len(),
            "resolving package imports"
        );
        for &(idx, module) in &group.members {
            resolve_imports(module, &exporting, &visibility, &mut reports[idx]);
        }
    }

    for group in &groups {
        for &(idx, module) in &group.members {
            if !reports[idx].is_empty() {
                render(module, &reports[idx], sink);
            }
        }
    }
}

fn check_versions<'a>(set: &'a DescriptorSet, reports: &mut [ModuleReport<'a>]) {
    for (module, report) in set.modules.iter().zip(reports.iter_mut()) {
        report.exports_without_version = module
            .exports
            .iter()
            .filter(|export| export.version.is_empty())
            .collect();
        report.imports_without_version = module
            .imports
            .iter()
            .filter(|import| import.version.is_none())
            .filter(|import| {
                !UNVERSIONED_IMPORT_PREFIXES
                    .iter()
                    .any(|prefix| import.name.starts_with(prefix))
            })
            .collect();
    }
}

fn resolve_imports<'a>(
    module: &'a ModuleDescriptor,
    exporting: &ExportingModules<'a>,
    visibility: &RegionVisibility<'_>,
    report: &mut ModuleReport<'a>,
) {
    let mut importer_regions: Option<BTreeSet<String>> = None;

    for import in &module.imports {
        let named = exporting.offering(&import.name);
        if named.is_empty() {
            if import.optional {
                report.missing_optional.push(import);
            } else {
                report.missing.push(import);
            }
            continue;
        }

        let mut visible = Vec::new();
        let mut hidden = Vec::new();
        for candidate in named {
            if !candidate.is_exporting_package(import) {
                continue;
            }
            match visibility.reach(candidate, &import.name) {
                Reach::Unrestricted => visible.push(candidate),
                Reach::Regions(regions) if regions.contains(GLOBAL_REGION) => {
                    visible.push(candidate)
                }
                Reach::Regions(regions) => {
                    let own = importer_regions
                        .get_or_insert_with(|| visibility.importer_regions(module));
                    if regions.is_disjoint(own) {
                        hidden.push(RegionExclusion {
                            exporter: candidate.identity(),
                            exporter_regions: regions,
                            importer_regions: own.clone(),
                        });
                    } else {
                        visible.push(candidate);
                    }
                }
            }
        }

        match visible.len() {
            0 if import.optional => report.missing_optional.push(import),
            0 => report.missing_with_version.push(Unresolved { import, hidden }),
            1 => {}
            _ => report.ambiguous.push(Ambiguity {
                import,
                candidates: visible.iter().map(|m| m.identity()).collect(),
            }),
        }
    }
}

fn render(module: &ModuleDescriptor, report: &ModuleReport<'_>, sink: &mut dyn ReportSink) {
    let key = format!("Module {}", module.identity());
    let level = module.start_level;
    let finding = |class: FindingClass, message: String| {
        Finding::new(BUNDLE_PACKAGES_TASK, class, module.identity(), message)
    };

    if !report.imports_without_version.is_empty() {
        let names = package_list(report.imports_without_version.iter().map(|i| &i.name));
        sink.report_warning(finding(
            FindingClass::UndeclaredVersion,
            format!("{key} is importing package(s) {names} without specifying a version range."),
        ));
    }
    if !report.exports_without_version.is_empty() {
        let names = package_list(report.exports_without_version.iter().map(|e| &e.name));
        sink.report_warning(finding(
            FindingClass::UndeclaredVersion,
            format!("{key} is exporting package(s) {names} without a version."),
        ));
    }
    if !report.missing.is_empty() {
        let names = package_list(report.missing.iter().map(|i| &i.name));
        sink.report_error(finding(
            FindingClass::MissingMandatory,
            format!(
                "{key} is importing package(s) {names} in start level {level} but no module is exporting these for that start level."
            ),
        ));
    }
    if !report.missing_with_version.is_empty() {
        let names = package_list(report.missing_with_version.iter().map(|u| u.import));
        let mut message = format!(
            "{key} is importing package(s) {names} in start level {level} but no module is exporting these for that start level in the required version range."
        );
        for unresolved in &report.missing_with_version {
            for exclusion in &unresolved.hidden {
                message.push_str(&format!(
                    " Package {} is exported by {} in region(s) {} which {} not visible from {}.",
                    unresolved.import.name,
                    exclusion.exporter,
                    region_list(&exclusion.exporter_regions),
                    if exclusion.exporter_regions.len() > 1 {
                        "are"
                    } else {
                        "is"
                    },
                    importer_scope(&exclusion.importer_regions),
                ));
            }
        }
        sink.report_error(finding(FindingClass::MissingMandatory, message));
    }
    if !report.missing_optional.is_empty() {
        let names = package_list(report.missing_optional.iter().map(|i| &i.name));
        sink.report_warning(finding(
            FindingClass::MissingOptional,
            format!(
                "{key} is optionally importing package(s) {names} in start level {level} but no module is exporting these for that start level."
            ),
        ));
    }
    if !report.ambiguous.is_empty() {
        let names = package_list(report.ambiguous.iter().map(|a| &a.import.name));
        let detail: Vec<String> = report
            .ambiguous
            .iter()
            .map(|a| format!("{} from [{}]", a.import.name, a.candidates.join(", ")))
            .collect();
        sink.report_warning(finding(
            FindingClass::AmbiguousMatch,
            format!(
                "{key} is importing package(s) {names} in start level {level} but more than one module is exporting these for that start level: {}.",
                detail.join("; ")
            ),
        ));
    }
}

/// A single package renders bare, several render as `[a, b]`.
fn package_list<T: Display>(items: impl Iterator<Item = T>) -> String {
    let rendered: Vec<String> = items.map(|item| item.to_string()).collect();
    if rendered.len() == 1 {
        return rendered.into_iter().collect();
    }
    format!("[{}]", rendered.join(", "))
}

fn region_list(regions: &BTreeSet<String>) -> String {
    let names: Vec<&str> = regions.iter().map(String::as_str).collect();
    format!("[{}]", names.join(", "))
}

fn importer_scope(regions: &BTreeSet<String>) -> String {
    if regions.is_empty() {
        "an importer outside every region".to_string()
    } else {
        format!("importer region(s) {}", region_list(regions))
    }
}
