use super::types::CleanupMode;
use crate::codec::MAX_CHUNK_CHARS;
use crate::prefix::DEFAULT_NAMESPACE_ROOT;

pub(super) fn default_namespace_root() -> String {
    DEFAULT_NAMESPACE_ROOT.to_string()
}

pub(super) fn default_max_chunk_chars() -> usize {
    MAX_CHUNK_CHARS
}

pub(super) fn default_secure() -> bool {
    true
}

pub(super) fn default_final_path() -> String {
    "/etc/secret-userdata.txt".to_string()
}

pub(super) fn default_apply_command() -> String {
    "systemctl restart cloud-init".to_string()
}

pub(super) fn default_apply_timeout_seconds() -> u64 {
    600
}

pub(super) fn default_cleanup() -> CleanupMode {
    CleanupMode::BeforeDecode
}

pub(super) fn default_binary() -> String {
    "/usr/local/bin/sealboot".to_string()
}
