use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_REGISTRY: &str = "docker.io";
const DEFAULT_TAG: &str = "latest";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageName {
    pub registry: String,
    pub remote: String,
    pub tag: String,
    pub full_name: String,
}

impl ImageName {
    /// Splits a reference such as `quay.io/org/app:1.2` into its parts.
    ///
    /// References without a registry host default to Docker Hub, single
    /// component remotes gain the `library/` prefix, and a missing tag is
    /// `latest`. Digest references keep an empty tag.
    pub fn parse(reference: &str) -> Self {
        let (name, tag) = match reference.rsplit_once('@') {
            Some((name, _digest)) => (name, String::new()),
            None => match reference.rsplit_once(':') {
                Some((name, tag)) if !tag.contains('/') => (name, tag.to_string()),
                _ => (reference, DEFAULT_TAG.to_string()),
            },
        };

        let (registry, remote) = match name.split_once('/') {
            Some((host, rest))
                if host.contains('.') || host.contains(':') || host == "localhost" =>
            {
                (host.to_string(), rest.to_string())
            }
            Some(_) => (DEFAULT_REGISTRY.to_string(), name.to_string()),
            None => (DEFAULT_REGISTRY.to_string(), format!("library/{name}")),
        };

        Self {
            registry,
            remote,
            tag,
            full_name: reference.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub name: ImageName,
    pub metadata: Option<ImageMetadata>,
    pub scan: Option<ImageScan>,
}

impl Image {
    pub fn new(reference: &str) -> Self {
        Self {
            id: String::new(),
            name: ImageName::parse(reference),
            metadata: None,
            scan: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageMetadata {
    pub created: Option<DateTime<Utc>>,
    pub user: String,
    pub labels: BTreeMap<String, String>,
    pub layers: Vec<ImageLayer>,
}

/// One Dockerfile instruction that produced an image layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageLayer {
    pub instruction: String,
    pub value: String,
}

impl ImageLayer {
    pub fn new(instruction: &str, value: &str) -> Self {
        Self {
            instruction: instruction.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageScan {
    pub scan_time: Option<DateTime<Utc>>,
    pub operating_system: String,
    pub components: Vec<EmbeddedComponent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddedComponent {
    pub name: String,
    pub version: String,
    pub vulns: Vec<Vulnerability>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Unknown,
    Low,
    Moderate,
    Important,
    Critical,
}

impl Severity {
    /// Severity names in ascending order.
    pub const ORDERED_NAMES: &'static [&'static str] =
        &["UNKNOWN", "LOW", "MODERATE", "IMPORTANT", "CRITICAL"];

    pub fn as_str(&self) -> &'static str {
        Self::ORDERED_NAMES[*self as usize]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Vulnerability {
    pub cve: String,
    pub cvss: f32,
    pub severity: Severity,
    pub fixed_by: String,
}
