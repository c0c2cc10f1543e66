//! strata-lib: attribute composition and dependency resolution for
//! multi-environment C/C++ builds.
//!
//! This crate resolves, for every (target, environment) pair, the complete set
//! of defines, include paths, options and sources a generator needs:
//! - `ValueSet` / `Facet`: ordered token sets and the named bags composed from them
//! - `Policy` / `Decorator`: owners of facets plus deferred customizations
//! - `Project`: the namespace tree, targets, registries and dependency graph
//! - `Environment`: a (platform, configuration, compiler) triple that expands targets

pub mod cache;
pub mod compiler;
pub mod configuration;
pub mod consts;
pub mod environment;
pub mod error;
pub mod facet;
mod graph;
pub mod namespace;
pub mod platform;
pub mod policy;
pub mod project;
pub mod selector;
pub mod settings;
pub mod target;
pub mod util;
pub mod value_set;
pub mod vars;

pub use compiler::{Compiler, Syntax};
pub use configuration::Configuration;
pub use environment::{Environment, OutputKind};
pub use error::{Error, Result};
pub use facet::{Category, Facet};
pub use namespace::{Namespace, NamespaceId};
pub use platform::Platform;
pub use policy::{AsPolicy, Decorator, Policy};
pub use project::{Entry, Project};
pub use selector::Selector;
pub use settings::Settings;
pub use target::{LinkMode, Target, TargetBuilder, TargetId, TargetKind, Visibility};
pub use value_set::{Value, ValueSet};
