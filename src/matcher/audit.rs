use super::cache::{augmented, kube_event_identity, CacheReceptacle, Slot};
use super::SectionSet;
use crate::augment::{build_kube_event, ObjectKind};
use crate::error::Result;
use crate::objects::KubernetesEvent;
use crate::policy::Policy;
use crate::violations::{RuntimeEvent, Violations};

/// Matches Kubernetes API requests read from the audit log. There is no
/// deployment to join, so the event tree is evaluated directly.
#[derive(Debug)]
pub struct AuditLogEventMatcher {
    sections: SectionSet,
}

impl AuditLogEventMatcher {
    pub(crate) fn new(sections: SectionSet) -> Self {
        Self { sections }
    }

    pub fn policy(&self) -> &Policy {
        self.sections.policy()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn match_audit_log_event(
        &self,
        cache: Option<&mut CacheReceptacle>,
        event: &KubernetesEvent,
    ) -> Result<Violations> {
        let obj = augmented(cache, Slot::AuditLogEvent, &kube_event_identity(event), || {
            build_kube_event(event, ObjectKind::AuditLogEvent)
        })?;
        self.sections.evaluate(&obj, Some(RuntimeEvent::KubeEvent(event)))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EvaluatorMode;
    use crate::evaluator::EvaluatorFactory;
    use crate::fields::names;
    use crate::matcher::{CacheReceptacle, MatcherBuilder};
    use crate::objects::{
        ApiVerb, Container, Deployment, EnhancedDeployment, KubeResource, KubernetesEvent,
    };
    use crate::policy::{EventSource, LifecycleStage, Policy, PolicyGroup, PolicySection};

    fn secret_read(user: &str) -> KubernetesEvent {
        let mut event = KubernetesEvent::default();
        event.id = format!("audit-{user}");
        event.object.name = "db-password".to_string();
        event.object.namespace = "prod".to_string();
        event.object.resource = KubeResource::Secrets;
        event.api_verb = ApiVerb::Get;
        event.user.username = user.to_string();
        event
    }

    #[test]
    fn test_secret_access_by_user() {
        let policy = Policy::new(
            "secret access",
            vec![
                PolicySection::new(
                    "",
                    vec![
                        PolicyGroup::new(names::KUBE_RESOURCE, ["SECRETS"]),
                        PolicyGroup::new(names::KUBE_API_VERB, ["GET"]),
                        PolicyGroup::new(names::KUBE_USER_NAME, ["r/.*admin.*"]),
                    ],
                ),
                PolicySection::new("deploy", vec![PolicyGroup::new(names::NAMESPACE, ["prod"])]),
            ],
        )
        .with_stages(&[LifecycleStage::Runtime])
        .with_event_source(EventSource::AuditLogEvent);

        let matcher = MatcherBuilder::new(EvaluatorFactory::new(EvaluatorMode::Baseline))
            .build_audit_log_event_matcher(&policy)
            .unwrap();
        assert_eq!(matcher.section_count(), 1);

        let violations = matcher
            .match_audit_log_event(None, &secret_read("cluster-admin"))
            .unwrap();
        assert_eq!(
            violations.alert_violations[0].message,
            "Kubernetes API received GET request for secret 'db-password' in namespace 'prod' by user 'cluster-admin'"
        );
        assert!(matcher
            .match_audit_log_event(None, &secret_read("developer"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_shared_receptacle_keeps_event_kinds_apart() {
        let policy = Policy::new(
            "secret reads",
            vec![PolicySection::new(
                "",
                vec![
                    PolicyGroup::new(names::KUBE_RESOURCE, ["SECRETS"]),
                    PolicyGroup::new(names::KUBE_API_VERB, ["GET"]),
                ],
            )],
        )
        .with_stages(&[LifecycleStage::Runtime]);
        let builder = MatcherBuilder::new(EvaluatorFactory::new(EvaluatorMode::Baseline));
        let audit = builder.build_audit_log_event_matcher(&policy).unwrap();
        let kube = builder.build_kube_event_matcher(&policy).unwrap();
        let deployment = EnhancedDeployment::new(
            Deployment {
                id: "d".to_string(),
                containers: vec![Container::new("web", "nginx")],
                ..Default::default()
            },
            vec![],
        );
        let event = secret_read("alice");

        let mut cache = CacheReceptacle::new();
        let kube_first = kube.match_kube_event(Some(&mut cache), &event, &deployment).unwrap();
        let audit_second = audit.match_audit_log_event(Some(&mut cache), &event).unwrap();
        assert_eq!(kube_first.alert_violations.len(), 1);
        assert_eq!(audit_second.alert_violations.len(), 1);

        let mut cache = CacheReceptacle::new();
        let audit_first = audit.match_audit_log_event(Some(&mut cache), &event).unwrap();
        let kube_second = kube.match_kube_event(Some(&mut cache), &event, &deployment).unwrap();
        assert_eq!(audit_first, audit_second);
        assert_eq!(kube_second, kube_first);
        assert_eq!(cache.stats().hits, 0);
    }
}
