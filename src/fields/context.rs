//! Context fields pulled into every query so violation messages can name
//! the container, vulnerability, volume or port that matched.

use crate::augment::FieldLabel;
use crate::policy::LifecycleStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFields {
    None,
    Container,
    Image,
    Vuln,
    Resource,
    EnvVar,
    Volume,
    Port,
    ProcessBaseline,
}

const CONTAINER: &[FieldLabel] = &[FieldLabel::ContainerName];

const VULN_BUILD: &[FieldLabel] = &[
    FieldLabel::Cve,
    FieldLabel::Cvss,
    FieldLabel::Severity,
    FieldLabel::ComponentName,
    FieldLabel::ComponentVersion,
    FieldLabel::FixedBy,
];

const VULN: &[FieldLabel] = &[
    FieldLabel::Cve,
    FieldLabel::Cvss,
    FieldLabel::Severity,
    FieldLabel::ComponentName,
    FieldLabel::ComponentVersion,
    FieldLabel::FixedBy,
    FieldLabel::ContainerName,
];

const VOLUME: &[FieldLabel] = &[
    FieldLabel::VolumeName,
    FieldLabel::VolumeSource,
    FieldLabel::VolumeDestination,
    FieldLabel::VolumeReadonly,
    FieldLabel::VolumeType,
];

const PORT: &[FieldLabel] = &[FieldLabel::Port, FieldLabel::PortProtocol];

const PROCESS_BASELINE: &[FieldLabel] = &[FieldLabel::ProcessName, FieldLabel::ContainerName];

impl ContextFields {
    /// Labels to add as match-all queries for a policy evaluated at `stage`.
    pub fn for_stage(self, stage: LifecycleStage) -> &'static [FieldLabel] {
        let deployed = stage != LifecycleStage::Build;
        match self {
            ContextFields::None => &[],
            ContextFields::Container
            | ContextFields::Image
            | ContextFields::Resource
            | ContextFields::EnvVar => {
                if deployed {
                    CONTAINER
                } else {
                    &[]
                }
            }
            ContextFields::Vuln => {
                if deployed {
                    VULN
                } else {
                    VULN_BUILD
                }
            }
            ContextFields::Volume => VOLUME,
            ContextFields::Port => PORT,
            ContextFields::ProcessBaseline => PROCESS_BASELINE,
        }
    }
}
