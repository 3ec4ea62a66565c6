use anyhow::Context;
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use super::repo_types::CampaignMetadata;
use crate::storage::StorageClient;

const PRESIGN_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("Image exceeds the {max} byte limit")]
    TooLarge { max: usize },
    #[error("Image is not valid base64")]
    InvalidBase64,
    #[error("Image must be an http(s) URL or a base64 image")]
    Unsupported,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ImagePayload {
    /// Externally hosted image, stored as given.
    Url(String),
    /// Decoded base64 image to be uploaded.
    Inline { body: Bytes, content_type: String },
}

/// Accepts an http(s) URL, a `data:image/...;base64,` URL or bare base64.
///
/// Payloads whose decoded size is over `max_bytes` are rejected before and
/// after decoding.
pub fn parse_image(raw: &str, max_bytes: usize) -> Result<Option<ImagePayload>, ImageError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if raw.starts_with("https://") || raw.starts_with("http://") {
        return Ok(Some(ImagePayload::Url(raw.to_string())));
    }

    let (content_type, b64) = match raw.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest.split_once(',').ok_or(ImageError::Unsupported)?;
            let mime = header
                .strip_suffix(";base64")
                .ok_or(ImageError::Unsupported)?;
            if !mime.starts_with("image/") {
                return Err(ImageError::Unsupported);
            }
            (mime.to_string(), data)
        }
        None => ("application/octet-stream".to_string(), raw),
    };

    let padding = b64.bytes().rev().take_while(|b| *b == b'=').count();
    let estimated = (b64.len() / 4 * 3).saturating_sub(padding);
    if estimated > max_bytes {
        return Err(ImageError::TooLarge { max: max_bytes });
    }

    let decoded = Base64::decode_vec(b64).map_err(|_| ImageError::InvalidBase64)?;
    if decoded.len() > max_bytes {
        return Err(ImageError::TooLarge { max: max_bytes });
    }

    Ok(Some(ImagePayload::Inline {
        body: Bytes::from(decoded),
        content_type,
    }))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}

/// Uploads an inline image and returns its object key.
pub async fn upload_image(
    storage: &dyn StorageClient,
    onchain_id: i64,
    body: Bytes,
    content_type: &str,
) -> anyhow::Result<String> {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    let key = format!("campaigns/{}/{}.{}", onchain_id, Uuid::new_v4(), ext);
    storage
        .put_object(&key, body, content_type)
        .await
        .with_context(|| format!("put_object {key}"))?;
    Ok(key)
}

/// Presigned URL for uploaded images, the stored URL otherwise.
pub async fn resolve_image_url(
    storage: &dyn StorageClient,
    metadata: &CampaignMetadata,
) -> Option<String> {
    let Some(key) = metadata.image_key.as_deref() else {
        return metadata.image_url.clone();
    };
    match storage.presign_get(key, PRESIGN_TTL_SECS).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(error = %e, %key, "presign failed");
            metadata.image_url.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeStorage;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn urls_pass_through() {
        assert_eq!(
            parse_image(" https://cdn.example/a.png ", 10).unwrap(),
            Some(ImagePayload::Url("https://cdn.example/a.png".into()))
        );
        assert_eq!(parse_image("   ", 10).unwrap(), None);
    }

    #[test]
    fn data_urls_are_decoded() {
        // "hello" in base64
        let parsed = parse_image("data:image/png;base64,aGVsbG8=", 1024).unwrap();
        assert_eq!(
            parsed,
            Some(ImagePayload::Inline {
                body: Bytes::from_static(b"hello"),
                content_type: "image/png".into(),
            })
        );
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let err = parse_image("data:image/png;base64,aGVsbG8=", 4).unwrap_err();
        assert_eq!(err, ImageError::TooLarge { max: 4 });
    }

    #[test]
    fn non_image_and_garbage_payloads_are_rejected() {
        assert_eq!(
            parse_image("data:text/plain;base64,aGVsbG8=", 1024).unwrap_err(),
            ImageError::Unsupported
        );
        assert_eq!(
            parse_image("data:image/png,rawbytes", 1024).unwrap_err(),
            ImageError::Unsupported
        );
        assert_eq!(
            parse_image("!!!not base64!!!", 1024).unwrap_err(),
            ImageError::InvalidBase64
        );
    }

    #[tokio::test]
    async fn upload_uses_campaign_scoped_key() {
        let storage = FakeStorage::default();
        let key = upload_image(&storage, 7, Bytes::from_static(b"img"), "image/webp")
            .await
            .unwrap();
        assert!(key.starts_with("campaigns/7/"));
        assert!(key.ends_with(".webp"));
        assert_eq!(storage.keys(), vec![key]);
    }
}
