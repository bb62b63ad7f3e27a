use serde::{Deserialize, Serialize};

use crate::domain::ProcessingResult;

pub const PROCESS_ROUTE: &str = "/process";
pub const DOWNLOAD_ROUTE: &str = "/download";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub image_data: String,
    pub output_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl From<ProcessResponse> for ProcessingResult {
    fn from(value: ProcessResponse) -> Self {
        Self {
            image_data: value.image_data,
            output_path: value.output_path,
        }
    }
}
