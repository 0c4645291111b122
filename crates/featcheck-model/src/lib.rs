//! # featcheck-model
//!
//! Data layer for deployable analysis.
//!
//! This crate provides:
//! - descriptor types for modules, artifacts and the deployable itself
//! - versions and version ranges with containment checks
//! - the requirement filter language and its evaluator
//! - JSON loading of a scanned descriptor set
//!
//! It performs no analysis. The resolution engines live in
//! `featcheck-kernel`.

pub mod descriptor;
pub mod error;
pub mod filter;
pub mod version;

pub use descriptor::{
    ArtifactDescriptor, AttributeValue, Capability, DESCRIPTOR_SET_SCHEMA, DeployableDescriptor,
    DescriptorSet, ModuleDescriptor, PACKAGE_NAMESPACE, PackageExport, PackageImport, Requirement,
    SERVICE_NAMESPACE,
};
pub use error::ModelError;
pub use filter::{Filter, FilterNode, FilterOp};
pub use version::{Version, VersionRange};
