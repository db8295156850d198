//! Policy field names as they appear in policy groups.

pub const ADD_CAPS: &str = "Add Capabilities";
pub const APP_ARMOR_PROFILE: &str = "AppArmor Profile";
pub const CVE: &str = "CVE";
pub const CVSS: &str = "CVSS";
pub const CONTAINER_CPU_LIMIT: &str = "Container CPU Limit";
pub const CONTAINER_CPU_REQUEST: &str = "Container CPU Request";
pub const CONTAINER_MEM_LIMIT: &str = "Container Memory Limit";
pub const CONTAINER_MEM_REQUEST: &str = "Container Memory Request";
pub const CONTAINER_NAME: &str = "Container Name";
pub const DISALLOWED_ANNOTATION: &str = "Disallowed Annotation";
pub const DISALLOWED_IMAGE_LABEL: &str = "Disallowed Image Label";
pub const DOCKERFILE_LINE: &str = "Dockerfile Line";
pub const DROP_CAPS: &str = "Drop Capabilities";
pub const ENVIRONMENT_VARIABLE: &str = "Environment Variable";
pub const FIXED_BY: &str = "Fixed By";
pub const HOST_IPC: &str = "Host IPC";
pub const HOST_NETWORK: &str = "Host Network";
pub const HOST_PID: &str = "Host PID";
pub const IMAGE_AGE: &str = "Image Age";
pub const IMAGE_COMPONENT: &str = "Image Component";
pub const IMAGE_OS: &str = "Image OS";
pub const IMAGE_REGISTRY: &str = "Image Registry";
pub const IMAGE_REMOTE: &str = "Image Remote";
pub const IMAGE_SCAN_AGE: &str = "Image Scan Age";
pub const IMAGE_TAG: &str = "Image Tag";
pub const IMAGE_USER: &str = "Image User";
pub const MINIMUM_RBAC_PERMISSIONS: &str = "Minimum RBAC Permissions";
pub const MOUNT_PROPAGATION: &str = "Mount Propagation";
pub const NAMESPACE: &str = "Namespace";
pub const EXPOSED_NODE_PORT: &str = "Exposed Node Port";
pub const EXPOSED_PORT: &str = "Port";
pub const PORT_EXPOSURE: &str = "Port Exposure Method";
pub const PRIVILEGED_CONTAINER: &str = "Privileged Container";
pub const PROCESS_ANCESTOR: &str = "Process Ancestor";
pub const PROCESS_ARGUMENTS: &str = "Process Arguments";
pub const PROCESS_NAME: &str = "Process Name";
pub const PROCESS_UID: &str = "Process UID";
pub const EXPOSED_PORT_PROTOCOL: &str = "Protocol";
pub const READ_ONLY_ROOT_FS: &str = "Read-Only Root Filesystem";
pub const REQUIRED_ANNOTATION: &str = "Required Annotation";
pub const REQUIRED_IMAGE_LABEL: &str = "Required Image Label";
pub const REQUIRED_LABEL: &str = "Required Label";
pub const SECCOMP_PROFILE_TYPE: &str = "Seccomp Profile Type";
pub const SERVICE_ACCOUNT: &str = "Service Account";
pub const SEVERITY: &str = "Severity";
pub const UNSCANNED_IMAGE: &str = "Unscanned Image";
pub const VOLUME_DESTINATION: &str = "Volume Destination";
pub const VOLUME_NAME: &str = "Volume Name";
pub const VOLUME_SOURCE: &str = "Volume Source";
pub const VOLUME_TYPE: &str = "Volume Type";
pub const UNEXPECTED_NETWORK_FLOW_DETECTED: &str = "Unexpected Network Flow Detected";
pub const UNEXPECTED_PROCESS_EXECUTED: &str = "Unexpected Process Executed";
pub const WRITABLE_HOST_MOUNT: &str = "Writable Host Mount";
pub const WRITABLE_MOUNTED_VOLUME: &str = "Writable Mounted Volume";
pub const HAS_INGRESS_NETWORK_POLICY: &str = "Has Ingress Network Policy";
pub const HAS_EGRESS_NETWORK_POLICY: &str = "Has Egress Network Policy";

pub const KUBE_API_VERB: &str = "Kubernetes API Verb";
pub const KUBE_RESOURCE: &str = "Kubernetes Resource";
pub const KUBE_RESOURCE_NAME: &str = "Kubernetes Resource Name";
pub const KUBE_USER_NAME: &str = "Kubernetes User Name";
pub const KUBE_USER_GROUPS: &str = "Kubernetes User Groups";
pub const SOURCE_IP_ADDRESS: &str = "Source IP Address";
pub const USER_AGENT: &str = "User Agent";
pub const IS_IMPERSONATED_USER: &str = "Is Impersonated User";
