use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EngineInfo {
    pub(crate) engine_name: String,
    pub(crate) engine_version: String,
    pub(crate) language_name: String,
    pub(crate) language_version: String,
    pub(crate) extensions: Vec<String>,
    pub(crate) mime_types: Vec<String>,
    pub(crate) names: Vec<String>,
    pub(crate) runtime: String,
}
