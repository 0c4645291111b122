use crate::support::{load_config_or_exit, load_descriptors_or_exit, print_json_or_exit};
use featcheck_kernel::{AnalysisReport, Analyser, Finding};
use std::path::PathBuf;

pub struct Args {
    pub descriptors: String,
    pub config: Option<String>,
    pub file_storage: Option<String>,
    pub tasks: Vec<String>,
    pub json: bool,
}

pub fn run(args: Args) {
    let mut config = load_config_or_exit(args.config.as_deref());
    if let Some(dir) = args.file_storage {
        config.file_storage = Some(PathBuf::from(dir));
    }
    if !args.tasks.is_empty() {
        config.tasks = args.tasks;
    }

    let set = load_descriptors_or_exit(&args.descriptors);
    tracing::debug!(
        deployable = %set.deployable.id,
        modules = set.modules.len(),
        "descriptors loaded"
    );

    let report = Analyser::from_config(&config)
        .and_then(|analyser| analyser.run(&set))
        .unwrap_or_else(|e| {
            eprintln!("error: analyse failed: {e}");
            std::process::exit(2);
        });

    if args.json {
        print_json_or_exit(&report, "analysis report");
    } else {
        print_human_summary(&report);
    }

    if !report.accepted() {
        std::process::exit(1);
    }
}

fn print_human_summary(report: &AnalysisReport) {
    println!("featcheck analyse");
    println!("  Deployable: {}", report.deployable);
    println!("  Tasks: {}", report.tasks.join(", "));
    println!("  Modules: {}", report.summary.module_count);
    println!("  Result: {}", report.result);
    print_findings("Errors", &report.errors);
    print_findings("Warnings", &report.warnings);
    println!("  Digest: {}", report.digest);
}

fn print_findings(heading: &str, findings: &[Finding]) {
    if findings.is_empty() {
        return;
    }
    println!("  {heading}:");
    for finding in findings {
        let mut lines = finding.message.lines();
        if let Some(first) = lines.next() {
            println!("    - [{}] {first}", finding.task);
        }
        for line in lines {
            println!("      {line}");
        }
    }
}
