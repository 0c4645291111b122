//! Generic requirement resolution.
//!
//! Walks the same level groups as package resolution, but over every
//! participant: modules, then plain artifacts, then the deployable itself.
//! A requirement is satisfied by any visible participant holding a
//! capability in its namespace that passes its filter.

use crate::levels::{Participant, framework_seed, participant_groups};
use crate::report::{Finding, FindingClass, ReportSink};
use featcheck_model::{DescriptorSet, PACKAGE_NAMESPACE, Requirement, SERVICE_NAMESPACE};

pub const REQUIREMENTS_CAPABILITIES_TASK: &str = "requirements-capabilities";

pub fn check_capabilities(set: &DescriptorSet, sink: &mut dyn ReportSink) {
    let mut providers: Vec<Participant<'_>> = framework_seed(set).into_iter().collect();

    for group in participant_groups(set) {
        providers.extend(
            group
                .members
                .iter()
                .copied()
                .filter(|member| !member.capabilities().is_empty()),
        );
        tracing::debug!(
            level = group.level,
            participants = group.members.len(),
            providers = providers.len(),
            "resolving requirements"
        );

        for member in &group.members {
            for requirement in member.requirements() {
                if requirement.namespace == PACKAGE_NAMESPACE
                    || requirement.namespace == SERVICE_NAMESPACE
                {
                    continue;
                }
                let matching = matching_providers(&providers, requirement);
                report(member, requirement, group.level, &matching, sink);
            }
        }
    }
}

fn matching_providers<'a>(
    providers: &[Participant<'a>],
    requirement: &Requirement,
) -> Vec<Participant<'a>> {
    providers
        .iter()
        .copied()
        .filter(|provider| {
            provider
                .capabilities()
                .iter()
                .any(|capability| requirement.is_satisfied_by(capability))
        })
        .collect()
}

fn report(
    requirer: &Participant<'_>,
    requirement: &Requirement,
    level: i64,
    matching: &[Participant<'_>],
    sink: &mut dyn ReportSink,
) {
    let name = requirer.name();
    let prefix = format!("Artifact {name} requires {requirement} in start level {level} but");
    match matching {
        [] => {
            let message =
                format!("{prefix} no artifact is providing a matching capability in this start level.");
            if requirement.optional {
                sink.report_warning(Finding::new(
                    REQUIREMENTS_CAPABILITIES_TASK,
                    FindingClass::MissingOptional,
                    name,
                    message,
                ));
            } else {
                sink.report_error(Finding::new(
                    REQUIREMENTS_CAPABILITIES_TASK,
                    FindingClass::MissingMandatory,
                    name,
                    message,
                ));
            }
        }
        [_] => {}
        many => {
            let names: Vec<String> = many.iter().map(Participant::name).collect();
            sink.report_warning(Finding::new(
                REQUIREMENTS_CAPABILITIES_TASK,
                FindingClass::AmbiguousMatch,
                name,
                format!(
                    "{prefix} more than one artifact is providing a matching capability in this start level: [{}].",
                    names.join(", ")
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingSink;
    use featcheck_model::{
        ArtifactDescriptor, AttributeValue, Capability, ModuleDescriptor, Version,
    };
    use std::collections::BTreeMap;

    fn module(name: &str, level: i32) -> ModuleDescriptor {
        ModuleDescriptor::new(name, Version::new(1, 0, 0), level)
    }

    fn capability(namespace: &str, attrs: &[(&str, AttributeValue)]) -> Capability {
        Capability {
            namespace: namespace.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn requirement(namespace: &str, filter: Option<&str>, optional: bool) -> Requirement {
        Requirement {
            namespace: namespace.to_string(),
            filter: filter.map(|f| f.parse().expect("filter should parse")),
            optional,
        }
    }

    fn text(value: &str) -> AttributeValue {
        AttributeValue::Text(value.to_string())
    }

    fn run(set: &DescriptorSet) -> CollectingSink {
        let mut sink = CollectingSink::new();
        check_capabilities(set, &mut sink);
        sink
    }

    #[test]
    fn framework_capability_satisfies_every_level() {
        let mut framework = module("system.bundle", 0);
        framework.capabilities.push(capability(
            "osgi.ee",
            &[("osgi.ee", text("JavaSE")), ("version", text("11"))],
        ));
        let mut b1 = module("b1", -5);
        b1.requirements.push(requirement(
            "osgi.ee",
            Some("(&(osgi.ee=JavaSE)(version>=1.8))"),
            false,
        ));
        let mut set = DescriptorSet::new("f");
        set.framework = Some(framework);
        set.modules = vec![b1];

        assert!(run(&set).is_empty());
    }

    #[test]
    fn unmet_requirement_names_level_and_filter() {
        let mut b1 = module("b1", 7);
        b1.requirements
            .push(requirement("osgi.extender", Some("(osgi.extender=osgi.cdi)"), false));
        b1.requirements
            .push(requirement("osgi.contract", Some("(osgi.contract=JavaJAXRS)"), true));
        let mut set = DescriptorSet::new("f");
        set.modules = vec![b1];

        let sink = run(&set);
        assert_eq!(sink.errors.len(), 1);
        assert_eq!(
            sink.errors[0].message,
            "Artifact b1:1.0.0 requires osgi.extender; filter:=\"(osgi.extender=osgi.cdi)\" in start level 7 but no artifact is providing a matching capability in this start level."
        );
        assert_eq!(sink.warnings.len(), 1);
        assert_eq!(sink.warnings[0].class, FindingClass::MissingOptional);
    }

    #[test]
    fn later_provider_is_invisible() {
        let mut early = module("early", 1);
        early.requirements.push(requirement("x.ns", None, false));
        let mut late = module("late", 2);
        late.capabilities.push(capability("x.ns", &[]));
        let mut set = DescriptorSet::new("f");
        set.modules = vec![early, late];

        let sink = run(&set);
        assert_eq!(sink.errors.len(), 1);
        assert_eq!(sink.errors[0].subject, "early:1.0.0");
    }

    #[test]
    fn package_and_service_namespaces_are_skipped() {
        let mut b1 = module("b1", 1);
        b1.requirements
            .push(requirement(PACKAGE_NAMESPACE, Some("(osgi.wiring.package=org.x)"), false));
        b1.requirements
            .push(requirement(SERVICE_NAMESPACE, Some("(objectClass=org.x.S)"), false));
        let mut set = DescriptorSet::new("f");
        set.modules = vec![b1];

        assert!(run(&set).is_empty());
    }

    #[test]
    fn two_providers_are_ambiguous() {
        let mut a = module("a", 1);
        a.capabilities.push(capability("x.ns", &[("x.ns", text("impl"))]));
        let mut b = module("b", 1);
        b.capabilities.push(capability("x.ns", &[("x.ns", text("impl"))]));
        let mut c = module("c", 2);
        c.requirements.push(requirement("x.ns", Some("(x.ns=impl)"), false));
        let mut set = DescriptorSet::new("f");
        set.modules = vec![a, b, c];

        let sink = run(&set);
        assert!(sink.errors.is_empty());
        assert_eq!(sink.warnings.len(), 1);
        assert!(sink.warnings[0].message.ends_with("[a:1.0.0, b:1.0.0]."));
    }

    #[test]
    fn deployable_sees_artifacts_and_modules() {
        let mut set = DescriptorSet::new("g:f:1");
        set.artifacts = vec![ArtifactDescriptor {
            id: "g:config:1".to_string(),
            capabilities: vec![capability("x.config", &[])],
            requirements: vec![requirement("x.missing", None, false)],
        }];
        set.deployable
            .requirements
            .push(requirement("x.config", None, false));

        let sink = run(&set);
        assert_eq!(sink.errors.len(), 1);
        assert_eq!(sink.errors[0].subject, "g:config:1");
        assert!(sink.errors[0].message.contains("in start level 1 but"));
    }
}
