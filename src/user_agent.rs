//! Identifying User-Agent for every request the installer makes.

/// Product token sent in the User-Agent header.
const PRODUCT: &str = "server-installer";

/// Default User-Agent (`server-installer/<crate version>`).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version}")
}
