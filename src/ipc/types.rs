use serde::Deserialize;

use crate::api::ApiClient;
use crate::config::Settings;
use crate::prefs::PrefsStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub settings: Settings,
    pub api: Option<ApiClient>,
    pub prefs: PrefsStore,
}
