//! Region completeness: every package a region declares must be exported by
//! some module of the deployable.

use crate::report::{Finding, FindingClass, ReportSink};
use crate::sieve::VisibilitySieve;
use featcheck_model::ModuleDescriptor;
use std::fmt::Write as _;

pub const API_REGIONS_TASK: &str = "api-regions";

/// Sieves the real exports out of `sieve` and reports what is left.
///
/// Removal is by name only: a module exporting a package backs it in every
/// region that declares it. One error is reported per region still holding
/// packages.
pub fn check_api_regions(
    sieve: &mut VisibilitySieve,
    deployable: &str,
    modules: &[ModuleDescriptor],
    sink: &mut dyn ReportSink,
) {
    for module in modules {
        for export in &module.exports {
            sieve.remove(&export.name);
        }
    }

    if sieve.is_exhausted() {
        return;
    }

    for region in sieve.regions() {
        let unbacked = sieve.exports_of(region);
        if unbacked.is_empty() {
            continue;
        }
        let plural = unbacked.len() > 1;
        let mut message = format!(
            "Region '{region}' defined in '{deployable}' declares {} package{} which {} not exported by any module:\n",
            unbacked.len(),
            if plural { "s" } else { "" },
            if plural { "are" } else { "is" },
        );
        for name in unbacked {
            let _ = writeln!(message, " * {name}");
        }
        sink.report_error(Finding::new(
            API_REGIONS_TASK,
            FindingClass::UnbackedExport,
            region,
            message,
        ));
    }
}
