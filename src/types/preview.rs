use serde::{Deserialize, Serialize};

/// Response of the preview collaborator for one URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewPayload {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub fallback_image_urls: Option<Vec<String>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PreviewPayload {
    /// Candidate image urls in the order they should be tried.
    pub fn candidates(&self) -> Vec<String> {
        self.image_url
            .iter()
            .chain(self.fallback_image_urls.iter().flatten())
            .filter(|u| !u.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// Observable state of the preview pane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewState {
    pub url: String,
    pub image_url: String,
    pub loading: bool,
    pub error: String,
}
