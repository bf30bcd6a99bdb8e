use uuid::Uuid;

use mentorhub_common::AppError;

use crate::config::UploadConfig;
use crate::models::UploadResponse;
use crate::services::AppState;

/// Stores profile images on local disk under a generated name and hands
/// back the public URL. Uploaded names are never trusted for the file path.
pub struct UploadService {
    config: UploadConfig,
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

impl UploadService {
    pub fn new(state: &AppState) -> Self {
        Self {
            config: state.config.uploads.clone(),
        }
    }

    pub async fn save_image(
        &self,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<UploadResponse, AppError> {
        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        if data.len() > self.config.max_bytes {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {} bytes",
                self.config.max_bytes
            )));
        }

        let extension = content_type
            .and_then(extension_for)
            .ok_or_else(|| {
                AppError::Validation(
                    "Unsupported file type, expected one of: image/png, image/jpeg, image/webp, image/gif"
                        .to_string(),
                )
            })?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = std::path::Path::new(&self.config.dir).join(&file_name);

        tokio::fs::create_dir_all(&self.config.dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {}", e)))?;

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

        let url = format!(
            "{}/{}",
            self.config.public_base_url.trim_end_matches('/'),
            file_name
        );

        tracing::info!("Stored upload {} ({} bytes)", file_name, data.len());

        Ok(UploadResponse {
            url,
            size_bytes: data.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_image_types_to_extensions() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("image/gif"), Some("gif"));
    }

    #[test]
    fn rejects_non_image_types() {
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for("text/html"), None);
        assert_eq!(extension_for(""), None);
    }

    fn service_with_dir(dir: &std::path::Path, max_bytes: usize) -> UploadService {
        UploadService {
            config: UploadConfig {
                dir: dir.to_string_lossy().into_owned(),
                public_base_url: "/uploads".to_string(),
                max_bytes,
            },
        }
    }

    #[tokio::test]
    async fn stores_file_and_returns_public_url() {
        let dir = std::env::temp_dir().join(format!("mentorhub-uploads-{}", Uuid::new_v4()));
        let service = service_with_dir(&dir, 1024);

        let response = service.save_image(Some("image/png"), b"fakepng").await.unwrap();
        assert!(response.url.starts_with("/uploads/"));
        assert!(response.url.ends_with(".png"));
        assert_eq!(response.size_bytes, 7);

        let stored = dir.join(response.url.trim_start_matches("/uploads/"));
        assert!(tokio::fs::metadata(&stored).await.is_ok());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn rejects_oversized_and_empty_uploads() {
        let dir = std::env::temp_dir().join(format!("mentorhub-uploads-{}", Uuid::new_v4()));
        let service = service_with_dir(&dir, 4);

        assert!(service.save_image(Some("image/png"), b"").await.is_err());
        assert!(service.save_image(Some("image/png"), b"toolarge").await.is_err());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
