/// Image scan endpoint
///
/// Sends a photo to the vision model and returns the detected items.
///
/// # Endpoint
///
/// ```text
/// POST /api/scan
/// Content-Type: application/json
///
/// {
///   "imageUrl": "https://example.com/shelf.jpg",
///   "inventoryType": "retail"
/// }
/// ```
///
/// `imageBase64` (with optional `mimeType`, default `image/jpeg`) may be sent
/// instead of `imageUrl`.
///
/// # Response
///
/// ```json
/// { "items": [{ "label": "shirt", "count": 5, "confidence": 0.9 }] }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use stocktake_shared::{
    auth::middleware::AuthContext,
    models::detected_item::DetectedItem,
    vision::{self, ImageSource, InventoryKind},
};
use tracing::info;
use validator::Validate;

const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Scan request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[validate(url(message = "imageUrl must be a valid URL"))]
    pub image_url: Option<String>,

    #[validate(length(min = 1, message = "imageBase64 must not be empty"))]
    pub image_base64: Option<String>,

    pub mime_type: Option<String>,

    #[serde(default)]
    pub inventory_type: InventoryKind,
}

impl ScanRequest {
    /// Resolves the image, requiring exactly one source
    fn image_source(self) -> ApiResult<ImageSource> {
        match (self.image_url, self.image_base64) {
            (Some(url), None) => Ok(ImageSource::Url(url)),
            (None, Some(data)) => {
                let mime_type = self
                    .mime_type
                    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
                if !mime_type.starts_with("image/") {
                    return Err(ApiError::BadRequest(
                        "mimeType must be an image type".to_string(),
                    ));
                }
                Ok(ImageSource::Base64 { data, mime_type })
            }
            (Some(_), Some(_)) => Err(ApiError::BadRequest(
                "Provide either imageUrl or imageBase64, not both".to_string(),
            )),
            (None, None) => Err(ApiError::BadRequest(
                "imageUrl or imageBase64 is required".to_string(),
            )),
        }
    }
}

/// Scan response
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanResponse {
    pub items: Vec<DetectedItem>,
}

/// Scan an image for inventory items
///
/// # Errors
///
/// - `400 Bad Request`: Missing or conflicting image, invalid inventory type
/// - `502 Bad Gateway`: Vision API failed or returned unusable output
/// - `503 Service Unavailable`: Vision API is not configured
pub async fn scan_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> ApiResult<Json<ScanResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let model = state
        .vision
        .clone()
        .ok_or_else(|| ApiError::ServiceUnavailable("Image scanning is not configured".to_string()))?;

    let kind = req.inventory_type;
    let image = req.image_source()?;
    let items = vision::scan_image(model.as_ref(), &image, kind).await?;

    info!(
        user_id = %auth.user_id,
        kind = %kind,
        items = items.len(),
        "Scan completed"
    );
    Ok(Json(ScanResponse { items }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> ScanRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_inventory_type_defaults_to_retail() {
        let req = request(r#"{"imageUrl":"https://example.com/a.jpg"}"#);
        assert_eq!(req.inventory_type, InventoryKind::Retail);
        assert_eq!(
            req.image_source().unwrap(),
            ImageSource::Url("https://example.com/a.jpg".to_string())
        );
    }

    #[test]
    fn test_base64_uses_default_mime_type() {
        let req = request(r#"{"imageBase64":"aGVsbG8=","inventoryType":"restaurant"}"#);
        assert_eq!(
            req.image_source().unwrap(),
            ImageSource::Base64 {
                data: "aGVsbG8=".to_string(),
                mime_type: DEFAULT_MIME_TYPE.to_string(),
            }
        );
    }

    #[test]
    fn test_image_source_requires_exactly_one() {
        assert!(request("{}").image_source().is_err());
        assert!(request(r#"{"imageUrl":"https://example.com/a.jpg","imageBase64":"aGVsbG8="}"#)
            .image_source()
            .is_err());
    }

    #[test]
    fn test_non_image_mime_type_rejected() {
        let req = request(r#"{"imageBase64":"aGVsbG8=","mimeType":"text/plain"}"#);
        assert!(req.image_source().is_err());
    }

    #[test]
    fn test_invalid_url_fails_validation() {
        let req = request(r#"{"imageUrl":"not a url"}"#);
        assert!(req.validate().is_err());
    }
}
