//! `data:<mime>;base64,<payload>` strings used for previews and the request body.

use std::{fmt, path::Path};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::error::{DataUrlError, ProcessError};

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";
const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl(String);

impl DataUrl {
    pub fn encode(mime_type: &str, bytes: &[u8]) -> Self {
        let mime_type = if mime_type.trim().is_empty() {
            FALLBACK_MIME
        } else {
            mime_type.trim()
        };
        Self(format!("{SCHEME}{mime_type}{BASE64_MARKER},{}", STANDARD.encode(bytes)))
    }

    /// Accepts only base64 data URLs; the payload is decoded lazily by [`DataUrl::decode`].
    pub fn parse(raw: impl Into<String>) -> Result<Self, DataUrlError> {
        let raw = raw.into();
        split(&raw)?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn mime_type(&self) -> &str {
        split(&self.0).map(|(mime, _)| mime).unwrap_or(FALLBACK_MIME)
    }

    pub fn is_image(&self) -> bool {
        self.mime_type().starts_with("image/")
    }

    pub fn decode(&self) -> Result<Vec<u8>, DataUrlError> {
        let (_, payload) = split(&self.0)?;
        Ok(STANDARD.decode(payload)?)
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn split(raw: &str) -> Result<(&str, &str), DataUrlError> {
    let rest = raw.strip_prefix(SCHEME).ok_or(DataUrlError::MissingScheme)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingPayload)?;
    let header = header
        .strip_suffix(BASE64_MARKER)
        .ok_or(DataUrlError::NotBase64)?;
    // Drop parameters such as `;charset=...`.
    let mime = header.split(';').next().unwrap_or_default();
    let mime = if mime.is_empty() { FALLBACK_MIME } else { mime };
    Ok((mime, payload))
}

/// Reads the whole file and encodes it with a MIME type guessed from its extension.
pub async fn read_data_url(path: &Path) -> Result<DataUrl, ProcessError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ProcessError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    debug!(
        path = %path.display(),
        mime = %mime,
        size_bytes = bytes.len(),
        "read file into data url"
    );
    Ok(DataUrl::encode(mime.essence_str(), &bytes))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn encodes_with_mime_prefix() {
        let url = DataUrl::encode("image/png", b"png-bytes");
        assert_eq!(url.as_str(), "data:image/png;base64,cG5nLWJ5dGVz");
        assert_eq!(url.mime_type(), "image/png");
        assert!(url.is_image());
    }

    #[test]
    fn empty_mime_falls_back_to_octet_stream() {
        let url = DataUrl::encode("", b"x");
        assert!(url.as_str().starts_with("data:application/octet-stream;base64,"));
        assert!(!url.is_image());
    }

    #[test]
    fn decode_returns_original_bytes() {
        let url = DataUrl::parse("data:image/jpeg;base64,aGVsbG8=").expect("parse");
        assert_eq!(url.decode().expect("decode"), b"hello");
        assert_eq!(url.mime_type(), "image/jpeg");
    }

    #[test]
    fn parse_ignores_mime_parameters() {
        let url = DataUrl::parse("data:image/svg+xml;charset=utf-8;base64,PHN2Zy8+").expect("parse");
        assert_eq!(url.mime_type(), "image/svg+xml");
    }

    #[test]
    fn parse_rejects_non_data_urls() {
        assert_eq!(
            DataUrl::parse("https://example.com/a.png"),
            Err(DataUrlError::MissingScheme)
        );
        assert_eq!(
            DataUrl::parse("data:image/png;base64"),
            Err(DataUrlError::MissingPayload)
        );
        assert_eq!(
            DataUrl::parse("data:text/plain,hello"),
            Err(DataUrlError::NotBase64)
        );
    }

    #[test]
    fn decode_reports_bad_payload() {
        let url = DataUrl::parse("data:image/png;base64,***").expect("parse");
        assert!(matches!(url.decode(), Err(DataUrlError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn read_data_url_matches_file_content() {
        let mut file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("tempfile");
        file.write_all(b"\x89PNG fake image").expect("write");

        let url = read_data_url(file.path()).await.expect("read");
        assert_eq!(url.mime_type(), "image/png");
        assert_eq!(url.decode().expect("decode"), b"\x89PNG fake image");
    }

    #[tokio::test]
    async fn read_data_url_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.jpg");

        let err = read_data_url(&path).await.expect_err("must fail");
        assert!(matches!(err, ProcessError::Read { .. }));
        assert!(err.to_string().starts_with("Failed to read "));
    }
}
