//! Switchboard Core Library
//!
//! This crate provides the provider catalog for Switchboard:
//! - Provider descriptor types
//! - `{{.name}}` placeholder templates and structural substitution
//! - Variable sources and the substitution registry
//! - The provider registry and catalog resolution
//! - Catalog project configuration and loading
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  Registry   │────▶│ Substitution │────▶│  Resolved   │
//! │ (templates) │     │   (walk)     │     │ descriptor  │
//! └─────────────┘     └──────────────┘     └─────────────┘
//!                            ▲
//!                     variable sources
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use switchboard_core::{Resolver, Workspace, registry, select_module};
//!
//! let resolver = Resolver::new(registry::global()?);
//! let info = resolver.resolve("salesforce", [Workspace::new("acme")])?;
//! let module = select_module(&info, "");
//! println!("{}", module.info.base_url);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtin;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod substitution;
pub mod template;
pub mod variables;

pub use config::{CatalogConfig, Config};
pub use descriptor::{AuthType, ModuleId, ModuleInfo, ProviderId, ProviderInfo, ROOT_MODULE};
pub use error::{Error, Result};
pub use registry::Registry;
pub use resolver::{Resolver, SelectedModule, select_module};
pub use substitution::{Substitute, substitute_struct, substituted};
pub use template::{Bindings, substitute};
pub use variables::{
    MetadataVariable, ModuleVariable, SubstitutionPlan, SubstitutionRegistry, VariableSource,
    Workspace, metadata_variables,
};
