//! Value grammars for policy field values.

use once_cell::sync::Lazy;
use regex::Regex;

/// Compiles a built-in pattern. A failure here is a defect in this file.
fn must_compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => panic!("invalid built-in value pattern {pattern:?}: {err}"),
    }
}

const CAPABILITIES: &str = "AUDIT_CONTROL|AUDIT_READ|AUDIT_WRITE|BLOCK_SUSPEND|BPF|\
CHECKPOINT_RESTORE|CHOWN|DAC_OVERRIDE|DAC_READ_SEARCH|FOWNER|FSETID|IPC_LOCK|IPC_OWNER|\
KILL|LEASE|LINUX_IMMUTABLE|MAC_ADMIN|MAC_OVERRIDE|MKNOD|NET_ADMIN|NET_BIND_SERVICE|\
NET_BROADCAST|NET_RAW|PERFMON|SETGID|SETFCAP|SETPCAP|SETUID|SYS_ADMIN|SYS_BOOT|SYS_CHROOT|\
SYS_MODULE|SYS_NICE|SYS_PACCT|SYS_PTRACE|SYS_RAWIO|SYS_RESOURCE|SYS_TIME|SYS_TTY_CONFIG|\
SYSLOG|WAKE_ALARM";

pub static COMPARATOR_DECIMAL: Lazy<Regex> = Lazy::new(|| {
    must_compile(r"^(<|>|<=|>=)?[[:space:]]*[[:digit:]]*\.?[[:digit:]]+$")
});

pub static INTEGER: Lazy<Regex> = Lazy::new(|| must_compile(r"^[[:digit:]]+$"));

pub static BOOLEAN: Lazy<Regex> = Lazy::new(|| must_compile(r"^(?i:true|false)$"));

pub static DOCKERFILE_LINE: Lazy<Regex> = Lazy::new(|| {
    must_compile(
        r"^(?i:(ADD|ARG|CMD|COPY|ENTRYPOINT|ENV|EXPOSE|FROM|LABEL|MAINTAINER|ONBUILD|RUN|STOPSIGNAL|USER|VOLUME|WORKDIR)?)=.*$",
    )
});

pub static KEY_VALUE: Lazy<Regex> = Lazy::new(|| must_compile(r"^[^=]+=.*$"));

pub static ENVIRONMENT_VARIABLE_WITH_SOURCE: Lazy<Regex> = Lazy::new(|| {
    must_compile(
        r"^(?i:(UNSET|RAW|SECRET_KEY|CONFIG_MAP_KEY|FIELD|RESOURCE_FIELD|UNKNOWN)?)=[^=]*=.*$",
    )
});

/// Sources other than raw values carry no value of their own.
pub static ENVIRONMENT_VARIABLE_WITH_SOURCE_STRICT: Lazy<Regex> = Lazy::new(|| {
    must_compile(
        r"^((?i:UNSET|RAW|UNKNOWN)?=[^=]*=.*|(?i:SECRET_KEY|CONFIG_MAP_KEY|FIELD|RESOURCE_FIELD)=[^=]*=)$",
    )
});

pub static STRING: Lazy<Regex> = Lazy::new(|| must_compile(r"^(?s:.*\S.*)$"));

pub static CAPABILITIES_VALUE: Lazy<Regex> =
    Lazy::new(|| must_compile(&format!("^(?i:{CAPABILITIES})$")));

pub static DROP_CAPABILITIES_VALUE: Lazy<Regex> =
    Lazy::new(|| must_compile(&format!("^(?i:ALL|{CAPABILITIES})$")));

pub static RBAC_PERMISSION: Lazy<Regex> = Lazy::new(|| {
    must_compile(r"^(?i:DEFAULT|ELEVATED_IN_NAMESPACE|ELEVATED_CLUSTER_WIDE|CLUSTER_ADMIN|NONE)$")
});

pub static PORT_EXPOSURE: Lazy<Regex> =
    Lazy::new(|| must_compile(r"^(?i:UNSET|EXTERNAL|NODE|HOST|INTERNAL|ROUTE)$"));

pub static MOUNT_PROPAGATION: Lazy<Regex> =
    Lazy::new(|| must_compile(r"^(?i:NONE|HOSTTOCONTAINER|BIDIRECTIONAL)$"));

pub static SECCOMP_PROFILE_TYPE: Lazy<Regex> =
    Lazy::new(|| must_compile(r"^(?i:UNCONFINED|RUNTIME_DEFAULT|LOCALHOST)$"));

pub static SEVERITY: Lazy<Regex> = Lazy::new(|| {
    must_compile(r"^(<|>|<=|>=)?[[:space:]]*(?i:UNKNOWN|LOW|MODERATE|IMPORTANT|CRITICAL)$")
});

pub static KUBERNETES_API_VERB: Lazy<Regex> = Lazy::new(|| must_compile(r"^(?i:CREATE)$"));

pub static KUBERNETES_RESOURCE: Lazy<Regex> =
    Lazy::new(|| must_compile(r"^(?i:PODS_EXEC|PODS_PORTFORWARD)$"));

pub static AUDIT_EVENT_API_VERB: Lazy<Regex> =
    Lazy::new(|| must_compile(r"^(?i:CREATE|DELETE|GET|PATCH|UPDATE)$"));

pub static AUDIT_EVENT_RESOURCE: Lazy<Regex> = Lazy::new(|| {
    must_compile(
        r"^(?i:SECRETS|CONFIGMAPS|CLUSTER_ROLES|CLUSTER_ROLE_BINDINGS|NETWORK_POLICIES|SECURITY_CONTEXT_CONSTRAINTS|EGRESS_FIREWALLS)$",
    )
});

pub static KUBERNETES_NAME: Lazy<Regex> =
    Lazy::new(|| must_compile(r"^(?i:[a-z0-9:._/\- ]+)$"));

pub static IP_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    must_compile(r"^((\d{1,3}\.){3}\d{1,3}|([0-9a-fA-F]{0,4}:){2,7}[0-9a-fA-F]{0,4})$")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparator_decimal() {
        for ok in ["7", ">= 7.0", "<.5", ">1"] {
            assert!(COMPARATOR_DECIMAL.is_match(ok), "{ok}");
        }
        for bad in ["=7", "seven", ">= ", "7."] {
            assert!(!COMPARATOR_DECIMAL.is_match(bad), "{bad}");
        }
    }

    #[test]
    fn test_environment_variable_regexes() {
        assert!(ENVIRONMENT_VARIABLE_WITH_SOURCE.is_match("=FOO=bar"));
        assert!(ENVIRONMENT_VARIABLE_WITH_SOURCE.is_match("secret_key=TOKEN="));
        assert!(!ENVIRONMENT_VARIABLE_WITH_SOURCE.is_match("FOO=bar"));

        assert!(ENVIRONMENT_VARIABLE_WITH_SOURCE_STRICT.is_match("RAW=FOO=bar"));
        assert!(ENVIRONMENT_VARIABLE_WITH_SOURCE_STRICT.is_match("SECRET_KEY=TOKEN="));
        assert!(!ENVIRONMENT_VARIABLE_WITH_SOURCE_STRICT.is_match("SECRET_KEY=TOKEN=abc"));
    }

    #[test]
    fn test_enumerated_values() {
        assert!(CAPABILITIES_VALUE.is_match("sys_admin"));
        assert!(!CAPABILITIES_VALUE.is_match("CAP_SYS_ADMIN"));
        assert!(!CAPABILITIES_VALUE.is_match("ALL"));
        assert!(DROP_CAPABILITIES_VALUE.is_match("ALL"));
        assert!(SEVERITY.is_match(">= important"));
        assert!(DOCKERFILE_LINE.is_match("add=deploy.sh"));
        assert!(DOCKERFILE_LINE.is_match("=anything"));
        assert!(!DOCKERFILE_LINE.is_match("BUILD=x"));
        assert!(IP_ADDRESS.is_match("10.0.0.1"));
        assert!(IP_ADDRESS.is_match("fe80::1"));
        assert!(!STRING.is_match("   "));
        assert!(!KUBERNETES_NAME.is_match("bad;name"));
    }
}
