//! Write-path checks: the script-tag denylist and the admin allowlist.
//!
//! Both are deliberately crude. The injection guard is a substring search on
//! the serialized payload, not an HTML sanitizer.

use serde_json::Value;
use std::net::IpAddr;

const SCRIPT_MARKER: &str = "<script";

/// True when `payload` contains `<script` in any letter case and the caller
/// has not opted out with `allow_scripts`.
pub fn is_script_injection(payload: &Value, allow_scripts: bool) -> bool {
    if allow_scripts {
        return false;
    }
    payload.to_string().to_lowercase().contains(SCRIPT_MARKER)
}

/// Admin access needs both an allowlisted remote address and an explicit
/// `admin=1` on the request.
pub fn is_admin(remote: Option<IpAddr>, admin_flag: bool, allowlist: &[IpAddr]) -> bool {
    let Some(ip) = remote else {
        tracing::info!("admin check without a remote address");
        return false;
    };
    tracing::info!(%ip, "checking admin access");
    let granted = admin_flag && allowlist.contains(&ip);
    if granted {
        tracing::info!(%ip, "granting edit permission");
    }
    granted
}
