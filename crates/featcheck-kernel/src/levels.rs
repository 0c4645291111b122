//! Activation-level grouping.
//!
//! Both resolution engines walk the deployable one activation level at a
//! time, lowest first. The framework is not part of any group: it is always
//! visible and seeds the engines before the first level. Artifacts that are
//! not modules form a group after the last module level, and the
//! deployable's own capabilities and requirements come last of all.

use featcheck_model::{
    ArtifactDescriptor, Capability, DeployableDescriptor, DescriptorSet, ModuleDescriptor,
    Requirement,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelGroup<T> {
    pub level: i64,
    pub members: Vec<T>,
}

/// Groups `items` by level, ascending. Members of one level keep input order.
pub fn group_by_level<T>(
    items: impl IntoIterator<Item = T>,
    level_of: impl Fn(&T) -> i64,
) -> Vec<LevelGroup<T>> {
    let mut by_level: BTreeMap<i64, Vec<T>> = BTreeMap::new();
    for item in items {
        by_level.entry(level_of(&item)).or_default().push(item);
    }
    by_level
        .into_iter()
        .map(|(level, members)| LevelGroup { level, members })
        .collect()
}

/// Module groups of a descriptor set, by start level.
pub fn module_groups(set: &DescriptorSet) -> Vec<LevelGroup<&ModuleDescriptor>> {
    group_by_level(&set.modules, |module| i64::from(module.start_level))
}

/// Anything that can provide capabilities or declare requirements.
#[derive(Debug, Clone, Copy)]
pub enum Participant<'a> {
    Framework(&'a ModuleDescriptor),
    Module(&'a ModuleDescriptor),
    Artifact(&'a ArtifactDescriptor),
    Deployable(&'a DeployableDescriptor),
}

impl<'a> Participant<'a> {
    pub fn name(&self) -> String {
        match self {
            Participant::Framework(module) | Participant::Module(module) => module.identity(),
            Participant::Artifact(artifact) => artifact.id.clone(),
            Participant::Deployable(deployable) => deployable.id.clone(),
        }
    }

    pub fn capabilities(&self) -> &'a [Capability] {
        match self {
            Participant::Framework(module) | Participant::Module(module) => &module.capabilities,
            Participant::Artifact(artifact) => &artifact.capabilities,
            Participant::Deployable(deployable) => &deployable.capabilities,
        }
    }

    pub fn requirements(&self) -> &'a [Requirement] {
        match self {
            Participant::Framework(module) | Participant::Module(module) => &module.requirements,
            Participant::Artifact(artifact) => &artifact.requirements,
            Participant::Deployable(deployable) => &deployable.requirements,
        }
    }
}

/// The always-visible framework participant, if the set has one.
pub fn framework_seed(set: &DescriptorSet) -> Option<Participant<'_>> {
    set.framework.as_ref().map(Participant::Framework)
}

/// All participants grouped by level, with the artifact group and the
/// terminal deployable group appended above every module level.
pub fn participant_groups(set: &DescriptorSet) -> Vec<LevelGroup<Participant<'_>>> {
    let mut groups: Vec<LevelGroup<Participant<'_>>> = module_groups(set)
        .into_iter()
        .map(|group| LevelGroup {
            level: group.level,
            members: group.members.into_iter().map(Participant::Module).collect(),
        })
        .collect();

    if !set.artifacts.is_empty() {
        let level = next_level(&groups);
        groups.push(LevelGroup {
            level,
            members: set.artifacts.iter().map(Participant::Artifact).collect(),
        });
    }

    let level = next_level(&groups);
    groups.push(LevelGroup {
        level,
        members: vec![Participant::Deployable(&set.deployable)],
    });
    groups
}

fn next_level<T>(groups: &[LevelGroup<T>]) -> i64 {
    groups.last().map_or(1, |group| group.level + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use featcheck_model::Version;

    fn module(name: &str, level: i32) -> ModuleDescriptor {
        ModuleDescriptor::new(name, Version::new(1, 0, 0), level)
    }

    #[test]
    fn groups_ascend_and_ties_keep_input_order() {
        let mut set = DescriptorSet::new("f");
        set.modules = vec![
            module("c", 20),
            module("a", 5),
            module("d", 20),
            module("b", 5),
            module("e", -1),
        ];
        let groups = module_groups(&set);
        let shape: Vec<(i64, Vec<&str>)> = groups
            .iter()
            .map(|g| {
                (
                    g.level,
                    g.members.iter().map(|m| m.symbolic_name.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            shape,
            vec![
                (-1, vec!["e"]),
                (5, vec!["a", "b"]),
                (20, vec!["c", "d"]),
            ]
        );
    }

    #[test]
    fn artifacts_and_deployable_follow_the_last_module_level() {
        let mut set = DescriptorSet::new("g:f:1");
        set.modules = vec![module("a", 3), module("b", 7)];
        set.artifacts = vec![ArtifactDescriptor {
            id: "g:content:1".to_string(),
            capabilities: Vec::new(),
            requirements: Vec::new(),
        }];
        let groups = participant_groups(&set);
        let levels: Vec<i64> = groups.iter().map(|g| g.level).collect();
        assert_eq!(levels, vec![3, 7, 8, 9]);
        assert!(matches!(groups[2].members[0], Participant::Artifact(_)));
        assert!(matches!(groups[3].members[0], Participant::Deployable(_)));
        assert_eq!(groups[3].members[0].name(), "g:f:1");
    }

    #[test]
    fn empty_set_still_has_a_deployable_group() {
        let set = DescriptorSet::new("f");
        let groups = participant_groups(&set);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].level, 1);
        assert!(framework_seed(&set).is_none());
    }

    #[test]
    fn framework_is_kept_out_of_the_groups() {
        let mut set = DescriptorSet::new("f");
        set.framework = Some(module("system.bundle", 0));
        set.modules = vec![module("a", 0)];
        let groups = participant_groups(&set);
        assert_eq!(groups[0].members.len(), 1);
        assert_eq!(
            framework_seed(&set).map(|p| p.name()),
            Some("system.bundle:1.0.0".to_string())
        );
    }
}
