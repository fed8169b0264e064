//! Canonical traffic-record feature schema (NSL-KDD field set).
//!
//! The classifier is trained against this fixed, ordered field list; every
//! inference-time vector must be reducible to it. Categorical fields carry
//! small integer codes from the fixed tables below. Code 0 is reserved for
//! unseen values, and absent fields default to 0.

use serde::{Deserialize, Serialize};

/// Field names in training order: basic connection features, content
/// features, then time- and host-based aggregates.
pub const CANONICAL_FIELDS: [&str; 41] = [
    "duration",
    "protocol_type",
    "service",
    "flag",
    "src_bytes",
    "dst_bytes",
    "land",
    "wrong_fragment",
    "urgent",
    "hot",
    "num_failed_logins",
    "logged_in",
    "num_compromised",
    "root_shell",
    "su_attempted",
    "num_root",
    "num_file_creations",
    "num_shells",
    "num_access_files",
    "num_outbound_cmds",
    "is_host_login",
    "is_guest_login",
    "count",
    "srv_count",
    "serror_rate",
    "srv_serror_rate",
    "rerror_rate",
    "srv_rerror_rate",
    "same_srv_rate",
    "diff_srv_rate",
    "srv_diff_host_rate",
    "dst_host_count",
    "dst_host_srv_count",
    "dst_host_same_srv_rate",
    "dst_host_diff_srv_rate",
    "dst_host_same_src_port_rate",
    "dst_host_srv_diff_host_rate",
    "dst_host_serror_rate",
    "dst_host_srv_serror_rate",
    "dst_host_rerror_rate",
    "dst_host_srv_rerror_rate",
];

pub const FIELD_COUNT: usize = CANONICAL_FIELDS.len();

/// Service vocabulary, alphabetical, codes 1..=70. Unseen services code to 0.
const SERVICES: [&str; 70] = [
    "aol", "auth", "bgp", "courier", "csnet_ns", "ctf", "daytime", "discard",
    "domain", "domain_u", "echo", "eco_i", "ecr_i", "efs", "exec", "finger",
    "ftp", "ftp_data", "gopher", "harvest", "hostnames", "http", "http_2784",
    "http_443", "http_8001", "imap4", "irc", "iso_tsap", "klogin", "kshell",
    "ldap", "link", "login", "mtp", "name", "netbios_dgm", "netbios_ns",
    "netbios_ssn", "netstat", "nnsp", "nntp", "ntp_u", "other", "pm_dump",
    "pop_2", "pop_3", "printer", "private", "red_i", "remote_job", "rje",
    "shell", "smtp", "sql_net", "ssh", "sunrpc", "supdup", "systat", "telnet",
    "tftp_u", "tim_i", "time", "urh_i", "urp_i", "uucp", "uucp_path", "vmnet",
    "whois", "x11", "z39_50",
];

/// Connection status flags, alphabetical, codes 1..=11. Unseen flags code to 0.
const FLAGS: [&str; 11] = [
    "OTH", "REJ", "RSTO", "RSTOS0", "RSTR", "S0", "S1", "S2", "S3", "SF", "SH",
];

const CATEGORICAL_FIELDS: [&str; 3] = ["protocol_type", "service", "flag"];

pub fn is_categorical(field: &str) -> bool {
    CATEGORICAL_FIELDS.contains(&field)
}

/// tcp -> 1, udp -> 2, everything else (icmp included) -> 3 ("other").
pub fn protocol_code(value: &str) -> f32 {
    match value.trim().to_ascii_lowercase().as_str() {
        "tcp" => 1.0,
        "udp" => 2.0,
        _ => 3.0,
    }
}

pub fn service_code(value: &str) -> f32 {
    let v = value.trim().to_ascii_lowercase();
    match SERVICES.iter().position(|s| *s == v) {
        Some(i) => (i + 1) as f32,
        None => 0.0,
    }
}

pub fn flag_code(value: &str) -> f32 {
    let v = value.trim().to_ascii_uppercase();
    match FLAGS.iter().position(|f| *f == v) {
        Some(i) => (i + 1) as f32,
        None => 0.0,
    }
}

/// Code for a categorical field value; `None` when the field is not
/// categorical. Cells that already carry a numeric code pass through.
pub fn categorical_code(field: &str, value: &str) -> Option<f32> {
    if !is_categorical(field) {
        return None;
    }
    if value.trim().is_empty() {
        return Some(0.0);
    }
    if let Ok(v) = value.trim().parse::<f32>() {
        return Some(v);
    }
    Some(match field {
        "protocol_type" => protocol_code(value),
        "service" => service_code(value),
        _ => flag_code(value),
    })
}

pub fn field_index(field: &str) -> Option<usize> {
    CANONICAL_FIELDS.iter().position(|f| *f == field)
}

/// One traffic record in canonical field order. Values for fields never set
/// stay at the schema default of 0. Immutable once handed to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    pub fn zeroed() -> Self {
        Self {
            values: vec![0.0; FIELD_COUNT],
        }
    }

    /// Set a field by name; returns false for names outside the schema.
    pub fn set(&mut self, field: &str, value: f32) -> bool {
        match field_index(field) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, field: &str) -> Option<f32> {
        field_index(field).map(|i| self.values[i])
    }

    /// Values aligned to [`CANONICAL_FIELDS`].
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeroed()
    }
}
