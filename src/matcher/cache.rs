//! Caller-owned memoization of augmented trees.
//!
//! A [`CacheReceptacle`] remembers the trees built for one object while the
//! caller matches it against many policies. Each slot is tagged with the
//! identity of the object it was built from and rebuilt when a different
//! object comes in, so reusing a receptacle for the next object is safe as
//! long as identities are distinct. Mutating an object in place while keeping
//! its identity is not detected.
//!
//! The receptacle is handed to matchers as `&mut`, so it is only ever used by
//! one caller at a time. Passing `None` disables caching.

use crate::augment::AugmentedObj;
use crate::error::Result;
use crate::objects::{
    EnhancedDeployment, Image, KubernetesEvent, NetworkFlowDetails, ProcessIndicator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Deployment,
    Image,
    Process,
    KubeEvent,
    AuditLogEvent,
    NetworkFlow,
}

impl Slot {
    fn name(self) -> &'static str {
        match self {
            Slot::Deployment => "deployment",
            Slot::Image => "image",
            Slot::Process => "process",
            Slot::KubeEvent => "kubernetes event",
            Slot::AuditLogEvent => "audit log event",
            Slot::NetworkFlow => "network flow",
        }
    }
}

#[derive(Debug, Clone)]
struct CachedObj {
    identity: String,
    obj: AugmentedObj,
}

/// Lookup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub builds: usize,
    /// Builds that replaced a tree of another object.
    pub rebuilds: usize,
}

#[derive(Debug, Default)]
pub struct CacheReceptacle {
    deployment: Option<CachedObj>,
    image: Option<CachedObj>,
    process: Option<CachedObj>,
    kube_event: Option<CachedObj>,
    audit_log_event: Option<CachedObj>,
    network_flow: Option<CachedObj>,
    stats: CacheStats,
}

impl CacheReceptacle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drops every cached tree. Counters are kept.
    pub fn clear(&mut self) {
        self.deployment = None;
        self.image = None;
        self.process = None;
        self.kube_event = None;
        self.audit_log_event = None;
        self.network_flow = None;
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<CachedObj> {
        match slot {
            Slot::Deployment => &mut self.deployment,
            Slot::Image => &mut self.image,
            Slot::Process => &mut self.process,
            Slot::KubeEvent => &mut self.kube_event,
            Slot::AuditLogEvent => &mut self.audit_log_event,
            Slot::NetworkFlow => &mut self.network_flow,
        }
    }

    /// Tree cached for `identity`, building it on a miss.
    pub(crate) fn get_or_build<F>(
        &mut self,
        slot: Slot,
        identity: &str,
        build: F,
    ) -> Result<AugmentedObj>
    where
        F: FnOnce() -> Result<AugmentedObj>,
    {
        let previous = match self.slot_mut(slot).take() {
            Some(entry) if entry.identity == identity => {
                self.stats.hits += 1;
                *self.slot_mut(slot) = Some(entry.clone());
                return Ok(entry.obj);
            }
            Some(entry) => Some(entry.identity),
            None => None,
        };

        // a failed build leaves the slot empty
        let obj = build()?;
        *self.slot_mut(slot) = Some(CachedObj {
            identity: identity.to_string(),
            obj: obj.clone(),
        });

        self.stats.builds += 1;
        if let Some(previous) = previous {
            self.stats.rebuilds += 1;
            log::debug!(
                "rebuilding cached {} tree: {previous:?} replaced by {identity:?}",
                slot.name()
            );
        }
        Ok(obj)
    }
}

/// Resolves a tree through the cache when one is given.
pub(crate) fn augmented<F>(
    cache: Option<&mut CacheReceptacle>,
    slot: Slot,
    identity: &str,
    build: F,
) -> Result<AugmentedObj>
where
    F: FnOnce() -> Result<AugmentedObj>,
{
    match cache {
        Some(cache) => cache.get_or_build(slot, identity, build),
        None => build(),
    }
}

pub(crate) fn deployment_identity(enhanced: &EnhancedDeployment) -> String {
    let images: Vec<&str> = enhanced.images.iter().map(image_key).collect();
    format!("{}[{}]", enhanced.deployment.id, images.join(","))
}

pub(crate) fn image_identity(image: &Image) -> String {
    image_key(image).to_string()
}

fn image_key(image: &Image) -> &str {
    if image.id.is_empty() {
        &image.name.full_name
    } else {
        &image.id
    }
}

pub(crate) fn process_identity(indicator: &ProcessIndicator) -> String {
    indicator.id.clone()
}

pub(crate) fn kube_event_identity(event: &KubernetesEvent) -> String {
    event.id.clone()
}

pub(crate) fn network_flow_identity(flow: &NetworkFlowDetails) -> String {
    flow.flow_key()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::{FieldLabel, ObjectBuilder, ObjectKind};
    use crate::error::PolicyError;
    use std::cell::Cell;

    fn tree(tag: &str) -> Result<AugmentedObj> {
        Ok(AugmentedObj::new(
            ObjectKind::Image,
            ObjectBuilder::new().string(FieldLabel::ImageTag, tag).build(),
        ))
    }

    #[test]
    fn test_hit_skips_build() {
        let mut cache = CacheReceptacle::new();
        let builds = Cell::new(0);
        for _ in 0..3 {
            cache
                .get_or_build(Slot::Image, "img-1", || {
                    builds.set(builds.get() + 1);
                    tree("latest")
                })
                .unwrap();
        }
        assert_eq!(builds.get(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 2,
                builds: 1,
                rebuilds: 0
            }
        );
    }

    #[test]
    fn test_identity_change_rebuilds() {
        let mut cache = CacheReceptacle::new();
        let first = cache.get_or_build(Slot::Image, "a", || tree("1.0")).unwrap();
        let second = cache.get_or_build(Slot::Image, "b", || tree("2.0")).unwrap();
        assert_ne!(first, second);
        assert_eq!(cache.stats().rebuilds, 1);

        // slots are independent
        cache.get_or_build(Slot::Process, "a", || tree("x")).unwrap();
        assert_eq!(cache.stats().rebuilds, 1);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let mut cache = CacheReceptacle::new();
        cache.get_or_build(Slot::Deployment, "d", || tree("1.0")).unwrap();
        let err = cache.get_or_build(Slot::Deployment, "e", || {
            Err(PolicyError::Augmentation("broken".to_string()))
        });
        assert!(err.is_err());
        let retried = cache.get_or_build(Slot::Deployment, "d", || tree("1.0")).unwrap();
        assert_eq!(retried, tree("1.0").unwrap());
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_no_cache_always_builds() {
        let builds = Cell::new(0);
        for _ in 0..2 {
            augmented(None, Slot::Image, "x", || {
                builds.set(builds.get() + 1);
                tree("latest")
            })
            .unwrap();
        }
        assert_eq!(builds.get(), 2);
    }
}
