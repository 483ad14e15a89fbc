use serde::{Deserialize, Serialize};

/// Top level document served by the upstream plugin list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginsResponse {
    pub plugins: Vec<Plugin>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Plugin {
    pub name: String,
    /// `owner/repo`, unique across the list.
    pub repo: String,
    pub description: String,
    pub creator: Creator,
    pub latest_release_tag: String,
    pub screenshots: Vec<Screenshot>,
    pub is_core: bool,
    /// Free-form version range text, or `N/A`.
    pub mc_versions: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Creator {
    pub name: String,
    pub url: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Screenshot {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}
