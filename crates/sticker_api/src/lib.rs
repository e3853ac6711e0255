use std::borrow::Cow;

use axum::http::StatusCode;
use axum::Json;
use axum::response::{IntoResponse, Response};

use bytes::Bytes;
use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    Unknown,
    Cancelled,
    InvalidArgument,
    FailedPrecondition,
    NotFound,
    PermissionDenied,
    Unimplemented,
}

impl ErrorCategory {
    pub fn to_status_code(self) -> StatusCode {
        match self {
            ErrorCategory::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCategory::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCategory::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCategory::FailedPrecondition => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCategory::Unimplemented => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub category: ErrorCategory,
    pub error_code: Cow<'static, str>,
    pub instance_id: String,
    pub message: Cow<'static, str>,
}

impl ApiError {
    pub fn with_message(
        category: ErrorCategory,
        code: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            category,
            error_code: code.into(),
            instance_id: nanoid::nanoid!(),
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<Cow<'static, str>>) -> Self {
        Self::with_message(ErrorCategory::Unknown, "unknown", message)
    }

    pub fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::with_message(ErrorCategory::InvalidArgument, "invalid_argument", message)
    }

    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::with_message(ErrorCategory::NotFound, "not_found", message)
    }

    pub fn unavailable() -> Self {
        Self::with_message(ErrorCategory::Cancelled, "unavailable", "service unavailable")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.category.to_status_code();
        (status_code, Json(self)).into_response()
    }
}

/// How the landmark coordinates of a [`FaceDto`] are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Coordinates {
    /// Already in normalized device coordinates, `[-1, 1]` with y up.
    Normalized,
    /// Pixel coordinates with a top-left origin in an image of the given size.
    #[serde(rename_all = "camelCase")]
    Pixels {
        width: u32,
        height: u32,
        #[serde(default)]
        back_camera: bool,
    },
}

impl Default for Coordinates {
    fn default() -> Self {
        Coordinates::Normalized
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDto {
    pub landmarks: Vec<Vec2>,
    /// Head pitch in radians.
    pub pitch: f32,
    /// Head yaw in radians.
    pub yaw: f32,
    /// Head roll in radians.
    pub roll: f32,
    #[serde(default)]
    pub mouth_open: bool,
    #[serde(default)]
    pub mouth_big_open: bool,
    #[serde(default)]
    pub mouth_closed: bool,
    #[serde(default)]
    pub eyes_closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFacesRequest {
    /// Device rotation, 0 to 3.
    #[serde(default)]
    pub orientation: u8,
    #[serde(default)]
    pub need_flip: bool,
    #[serde(default)]
    pub coordinates: Coordinates,
    pub faces: Vec<FaceDto>,
}

#[derive(Debug, Clone)]
pub struct SetCameraRequest {
    pub width: u32,
    pub height: u32,
    pub payload: Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPackRequest {
    /// Directory holding the pack manifest and frame folders.
    pub path: String,
}

/// The latest composited frame, raw RGBA8.
#[derive(Debug, Clone)]
pub struct FrameResponse {
    pub width: u32,
    pub height: u32,
    pub payload: Bytes,
}

impl IntoResponse for FrameResponse {
    fn into_response(self) -> Response {
        let headers = [
            ("width", self.width.to_string()),
            ("height", self.height.to_string()),
            ("content-type", "application/octet-stream".to_string()),
        ];
        (headers, self.payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faces_request_defaults() {
        let request: SetFacesRequest = serde_json::from_str(
            r#"{"faces": [{"landmarks": [[0.5, -0.5]], "pitch": 0.1, "yaw": 0.2, "roll": 0.3}]}"#,
        ).unwrap();

        assert_eq!(request.orientation, 0);
        assert!(!request.need_flip);
        assert_eq!(request.coordinates, Coordinates::Normalized);
        assert_eq!(request.faces[0].landmarks[0], Vec2::new(0.5, -0.5));
        assert!(!request.faces[0].mouth_open);
    }

    #[test]
    fn pixel_coordinates() {
        let request: SetFacesRequest = serde_json::from_str(
            r#"{"orientation": 2, "needFlip": true,
                "coordinates": {"pixels": {"width": 720, "height": 1280, "backCamera": true}},
                "faces": []}"#,
        ).unwrap();

        assert_eq!(request.orientation, 2);
        assert!(request.need_flip);
        assert_eq!(request.coordinates, Coordinates::Pixels { width: 720, height: 1280, back_camera: true });
    }

    #[test]
    fn frame_response_headers() {
        let response = FrameResponse {
            width: 2,
            height: 1,
            payload: Bytes::from_static(&[0; 8]),
        }.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["width"], "2");
        assert_eq!(response.headers()["height"], "1");
    }

    #[test]
    fn error_status() {
        let error = ApiError::invalid_argument("bad");
        assert_eq!(error.category.to_status_code(), StatusCode::BAD_REQUEST);
        assert!(!error.instance_id.is_empty());
        assert_eq!(ApiError::not_found("x").category.to_status_code(), StatusCode::NOT_FOUND);
    }
}
