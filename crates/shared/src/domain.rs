use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(CycleId);

impl CycleId {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Processed artifact returned by the processing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Displayable image, normally a `data:image/...;base64,` URL.
    pub image_data: String,
    /// Opaque token for `/download/<output_path>`.
    pub output_path: String,
}
