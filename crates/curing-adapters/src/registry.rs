// ============================================================================
// Module: Source & Sink Registries
// Description: Name-keyed registries of adapter implementations, each
//              guarded by an allowlist/denylist access policy.
// Purpose: Let a deployment restrict which concrete sources and sinks a
//          workflow may invoke without recompiling, the same way evidence
//          provider access was policed in this codebase's prior form.
// Dependencies: curing-core
// ============================================================================

//! ## Overview
//! [`AccessPolicy`] mirrors the allowlist/denylist shape used elsewhere in
//! this codebase for gating registered implementations by name: an absent
//! allowlist permits everything not explicitly denied; a present allowlist
//! restricts to its members, still subject to the denylist. [`SourceRegistry`]
//! and [`SinkRegistry`] each hold one policy and a name-keyed map of boxed
//! trait objects, and refuse to resolve a name the policy rejects.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::SinkError;
use crate::error::SourceError;
use crate::sink::Sink;
use crate::source::Source;

/// An allowlist/denylist gate over implementation names.
///
/// A `None` allowlist permits any name not in the denylist; a `Some`
/// allowlist restricts to its members, still subject to the denylist.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allowlist: Option<BTreeSet<String>>,
    denylist: BTreeSet<String>,
}

impl AccessPolicy {
    /// A policy permitting every name.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// A policy permitting only the named implementations.
    #[must_use]
    pub fn allowlist(names: impl IntoIterator<Item = String>) -> Self {
        Self { allowlist: Some(names.into_iter().collect()), denylist: BTreeSet::new() }
    }

    /// Adds `name` to the denylist, overriding any allowlist membership.
    #[must_use]
    pub fn deny(mut self, name: impl Into<String>) -> Self {
        self.denylist.insert(name.into());
        self
    }

    /// Returns true when `name` is permitted by this policy.
    #[must_use]
    pub fn is_allowed(&self, name: &str) -> bool {
        if self.denylist.contains(name) {
            return false;
        }
        self.allowlist.as_ref().is_none_or(|allowed| allowed.contains(name))
    }
}

/// A name-keyed registry of [`Source`] implementations.
#[derive(Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, Arc<dyn Source + Send + Sync>>,
    policy: AccessPolicy,
}

impl SourceRegistry {
    /// Creates an empty registry with `policy`.
    #[must_use]
    pub fn new(policy: AccessPolicy) -> Self {
        Self { sources: BTreeMap::new(), policy }
    }

    /// Registers `source` under `name`, regardless of policy; policy is
    /// enforced at [`Self::resolve`], not at registration.
    pub fn register(&mut self, name: impl Into<String>, source: impl Source + Send + Sync + 'static) {
        self.sources.insert(name.into(), Arc::new(source));
    }

    /// Resolves `name` to a registered, policy-permitted source.
    ///
    /// # Errors
    /// Returns [`SourceError::Denied`] if the policy rejects `name`, or
    /// [`SourceError::UnknownImplementation`] if nothing is registered
    /// under it.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Source + Send + Sync>, SourceError> {
        if !self.policy.is_allowed(name) {
            return Err(SourceError::Denied(name.to_string()));
        }
        self.sources.get(name).cloned().ok_or_else(|| SourceError::UnknownImplementation(name.to_string()))
    }

    /// The active access policy.
    #[must_use]
    pub const fn policy(&self) -> &AccessPolicy {
        &self.policy
    }
}

/// A name-keyed registry of [`Sink`] implementations.
#[derive(Default)]
pub struct SinkRegistry {
    sinks: BTreeMap<String, Arc<dyn Sink + Send + Sync>>,
    policy: AccessPolicy,
}

impl SinkRegistry {
    /// Creates an empty registry with `policy`.
    #[must_use]
    pub fn new(policy: AccessPolicy) -> Self {
        Self { sinks: BTreeMap::new(), policy }
    }

    /// Registers `sink` under `name`, regardless of policy; policy is
    /// enforced at [`Self::resolve`], not at registration.
    pub fn register(&mut self, name: impl Into<String>, sink: impl Sink + Send + Sync + 'static) {
        self.sinks.insert(name.into(), Arc::new(sink));
    }

    /// Resolves `name` to a registered, policy-permitted sink.
    ///
    /// # Errors
    /// Returns [`SinkError::Denied`] if the policy rejects `name`, or
    /// [`SinkError::UnknownImplementation`] if nothing is registered under
    /// it.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Sink + Send + Sync>, SinkError> {
        if !self.policy.is_allowed(name) {
            return Err(SinkError::Denied(name.to_string()));
        }
        self.sinks.get(name).cloned().ok_or_else(|| SinkError::UnknownImplementation(name.to_string()))
    }

    /// The active access policy.
    #[must_use]
    pub const fn policy(&self) -> &AccessPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, reason = "Test fixtures use explicit asserts and unwraps for clarity.")]

    use super::*;
    use crate::source::SourceMetadata;
    use crate::source::SourcePayload;
    use curing_core::model::RawData;

    struct Empty;
    impl Source for Empty {
        fn read(&self) -> Result<SourcePayload, SourceError> {
            Ok(SourcePayload {
                data: RawData::default(),
                metadata: SourceMetadata { row_count: 0, column_count: 0, columns: vec![], timestamp_column: String::new() },
            })
        }
    }

    #[test]
    fn denylist_overrides_allowlist_membership() {
        let policy = AccessPolicy::allowlist(["csv".to_string()]).deny("csv");
        assert!(!policy.is_allowed("csv"));
    }

    #[test]
    fn absent_allowlist_permits_anything_not_denied() {
        let policy = AccessPolicy::allow_all().deny("http");
        assert!(policy.is_allowed("csv"));
        assert!(!policy.is_allowed("http"));
    }

    #[test]
    fn resolve_rejects_a_denied_registered_source() {
        let mut registry = SourceRegistry::new(AccessPolicy::allow_all().deny("csv"));
        registry.register("csv", Empty);
        assert!(matches!(registry.resolve("csv"), Err(SourceError::Denied(name)) if name == "csv"));
    }

    #[test]
    fn resolve_reports_unregistered_implementation() {
        let registry = SourceRegistry::new(AccessPolicy::allow_all());
        assert!(matches!(registry.resolve("csv"), Err(SourceError::UnknownImplementation(name)) if name == "csv"));
    }
}
