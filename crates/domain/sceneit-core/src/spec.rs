use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::outcome::LoadFailure;
use crate::resource::Resource;

pub type SpecKey = String;

/// Resources derived from an upstream spec's success payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Derived {
    One(Resource),
    /// Issued concurrently; the request succeeds with the successful payloads only.
    Each(Vec<Resource>),
}

pub type DeriveFn = Arc<dyn Fn(&Value) -> Result<Derived, LoadFailure> + Send + Sync>;

#[derive(Clone)]
pub enum RequestPlan {
    Fetch(Resource),
    Derive(DeriveFn),
}

impl fmt::Debug for RequestPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestPlan::Fetch(r) => f.debug_tuple("Fetch").field(&r.describe()).finish(),
            RequestPlan::Derive(_) => f.write_str("Derive(..)"),
        }
    }
}

/// One named request definition fed to the loader.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub key: SpecKey,
    pub plan: RequestPlan,
    pub depends_on: Option<SpecKey>,
    /// Settles `Success(default)` instead of failing when the backend answers 404.
    pub not_found_default: Option<Value>,
}

impl RequestSpec {
    pub fn fetch(key: impl Into<SpecKey>, resource: Resource) -> Self {
        Self {
            key: key.into(),
            plan: RequestPlan::Fetch(resource),
            depends_on: None,
            not_found_default: None,
        }
    }

    pub fn derive<F>(key: impl Into<SpecKey>, upstream: impl Into<SpecKey>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Derived, LoadFailure> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            plan: RequestPlan::Derive(Arc::new(f)),
            depends_on: Some(upstream.into()),
            not_found_default: None,
        }
    }

    pub fn after(mut self, upstream: impl Into<SpecKey>) -> Self {
        self.depends_on = Some(upstream.into());
        self
    }

    pub fn or_on_not_found(mut self, default: Value) -> Self {
        self.not_found_default = Some(default);
        self
    }
}

/// A caller bug in the spec list. Rejects the whole load before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    #[error("duplicate spec key '{0}'")]
    DuplicateKey(SpecKey),
    #[error("spec '{key}' depends on unknown key '{upstream}'")]
    UnknownDependency { key: SpecKey, upstream: SpecKey },
    #[error("dependency cycle through '{0}'")]
    Cycle(SpecKey),
    #[error("spec '{0}' derives its request but declares no dependency")]
    MissingDependency(SpecKey),
}

pub fn validate(specs: &[RequestSpec]) -> Result<(), SpecError> {
    let mut keys = HashSet::with_capacity(specs.len());
    for spec in specs {
        if !keys.insert(spec.key.as_str()) {
            return Err(SpecError::DuplicateKey(spec.key.clone()));
        }
    }

    let mut upstream_of: HashMap<&str, &str> = HashMap::new();
    for spec in specs {
        match (&spec.plan, &spec.depends_on) {
            (RequestPlan::Derive(_), None) => {
                return Err(SpecError::MissingDependency(spec.key.clone()));
            }
            (_, Some(up)) if !keys.contains(up.as_str()) => {
                return Err(SpecError::UnknownDependency {
                    key: spec.key.clone(),
                    upstream: up.clone(),
                });
            }
            (_, Some(up)) => {
                upstream_of.insert(spec.key.as_str(), up.as_str());
            }
            (_, None) => {}
        }
    }

    // Each spec has at most one upstream, so a cycle is a walk that revisits a key.
    let mut acyclic: HashSet<&str> = HashSet::new();
    for spec in specs {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut cur = spec.key.as_str();
        loop {
            if acyclic.contains(cur) {
                break;
            }
            if !seen.insert(cur) {
                return Err(SpecError::Cycle(cur.to_string()));
            }
            match upstream_of.get(cur) {
                Some(&up) => cur = up,
                None => break,
            }
        }
        acyclic.extend(seen);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(key: &str) -> RequestSpec {
        RequestSpec::fetch(key, Resource::get(format!("/{key}")))
    }

    #[test]
    fn accepts_independent_and_chained_specs() {
        let specs = vec![get("a"), get("b").after("a"), get("c").after("b")];
        assert_eq!(validate(&specs), Ok(()));
    }

    #[test]
    fn rejects_duplicate_key() {
        let specs = vec![get("a"), get("a")];
        assert_eq!(validate(&specs), Err(SpecError::DuplicateKey("a".into())));
    }

    #[test]
    fn rejects_self_dependency() {
        let specs = vec![get("a").after("a")];
        assert_eq!(validate(&specs), Err(SpecError::Cycle("a".into())));
    }

    #[test]
    fn rejects_longer_cycle() {
        let specs = vec![get("a").after("c"), get("b").after("a"), get("c").after("b")];
        assert!(matches!(validate(&specs), Err(SpecError::Cycle(_))));
    }

    #[test]
    fn rejects_unknown_dependency() {
        let specs = vec![get("a").after("missing")];
        assert_eq!(
            validate(&specs),
            Err(SpecError::UnknownDependency {
                key: "a".into(),
                upstream: "missing".into()
            })
        );
    }

    #[test]
    fn rejects_derived_plan_without_dependency() {
        let mut spec = RequestSpec::derive("b", "a", |_| Ok(Derived::Each(Vec::new())));
        spec.depends_on = None;
        assert_eq!(
            validate(&[get("a"), spec]),
            Err(SpecError::MissingDependency("b".into()))
        );
    }
}
