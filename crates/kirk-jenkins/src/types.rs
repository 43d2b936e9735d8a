//! API response types for Jenkins API

use kirk_core::PluginInfo;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct WhoAmI {
    #[serde(rename = "fullName")]
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PluginsResponse {
    #[serde(default)]
    pub plugins: Vec<PluginInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Crumb {
    pub crumb: String,
    #[serde(rename = "crumbRequestField")]
    pub crumb_request_field: String,
}
