use std::sync::Arc;

use axum::{Json, Router};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum_extra::TypedHeader;
use bytes::Bytes;
use face_sticker::{
    publish_detection, Expression, FsStickerPack, LandmarkSpace, LandmarkStore, Orientation, RawFace,
    StickerAssetProvider,
};
use headers::ContentLength;
use image::RgbaImage;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use sticker_api::{ApiError, Coordinates, FaceDto, FrameResponse, SetCameraRequest, SetFacesRequest, SetPackRequest};

/// Latest composited frame, written by the render thread.
pub type FrameSlot = Mutex<Option<FrameResponse>>;

/// Work for the render thread.
pub enum Command {
    SetCamera(SetCameraRequest),
    ClearCamera,
    SetPack(Box<dyn StickerAssetProvider>),
}

pub struct ApiState {
    store: Arc<LandmarkStore>,
    frames: Arc<FrameSlot>,
    tx: mpsc::UnboundedSender<Command>,
}

impl ApiState {
    pub fn new(store: Arc<LandmarkStore>, frames: Arc<FrameSlot>) -> (Arc<Self>, CommandQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self {
            store,
            frames,
            tx,
        }), CommandQueue {
            rx,
        })
    }

    pub(crate) fn send(&self, command: Command) -> Result<(), ApiError> {
        self.tx.send(command).map_err(|_| ApiError::unavailable())
    }
}

fn header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers.get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u32>().ok())
}

async fn put_camera(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    TypedHeader(ContentLength(content_length)): TypedHeader<ContentLength>,
    payload: Bytes,
) -> Result<StatusCode, ApiError> {
    let Some(width) = header_u32(&headers, "width") else {
        return Err(ApiError::invalid_argument("missing width"));
    };

    let Some(height) = header_u32(&headers, "height") else {
        return Err(ApiError::invalid_argument("missing height"));
    };

    if width == 0 || height == 0 {
        return Err(ApiError::invalid_argument("empty camera frame"));
    }

    let payload_size = u64::from(width) * u64::from(height) * 4;
    if content_length != payload_size || payload.len() as u64 != payload_size {
        return Err(ApiError::invalid_argument("invalid payload size"));
    }

    state.send(Command::SetCamera(SetCameraRequest {
        width,
        height,
        payload,
    }))?;
    Ok(StatusCode::OK)
}

fn landmark_space(coordinates: Coordinates) -> LandmarkSpace {
    match coordinates {
        Coordinates::Normalized => LandmarkSpace::Normalized,
        Coordinates::Pixels { width, height, back_camera } =>
            LandmarkSpace::Pixels { width, height, back_camera },
    }
}

fn raw_face(face: FaceDto) -> RawFace {
    let mut expression = Expression::empty();
    expression.set(Expression::MOUTH_OPEN, face.mouth_open);
    expression.set(Expression::MOUTH_BIG_OPEN, face.mouth_big_open);
    expression.set(Expression::MOUTH_CLOSED, face.mouth_closed);
    expression.set(Expression::EYES_CLOSED, face.eyes_closed);
    RawFace {
        landmarks: face.landmarks,
        pitch: face.pitch,
        yaw: face.yaw,
        roll: face.roll,
        expression,
    }
}

async fn put_faces(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SetFacesRequest>,
) -> Result<StatusCode, ApiError> {
    let Some(orientation) = Orientation::from_index(request.orientation) else {
        return Err(ApiError::invalid_argument(format!("invalid orientation {}", request.orientation)));
    };

    let space = landmark_space(request.coordinates);
    let faces = request.faces.into_iter().map(raw_face).collect();
    publish_detection(&state.store, orientation, request.need_flip, space, faces)
        .map_err(|err| ApiError::invalid_argument(err.to_string()))?;
    Ok(StatusCode::OK)
}

async fn delete_faces(State(state): State<Arc<ApiState>>) -> Result<StatusCode, ApiError> {
    state.store.clear_all();
    state.send(Command::ClearCamera)?;
    Ok(StatusCode::OK)
}

async fn get_frame(State(state): State<Arc<ApiState>>) -> Result<FrameResponse, ApiError> {
    let frame = state.frames.lock().clone();
    frame.ok_or_else(|| ApiError::not_found("no frame rendered yet"))
}

async fn put_pack(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SetPackRequest>,
) -> Result<StatusCode, ApiError> {
    let pack = tokio::task::spawn_blocking(move || FsStickerPack::open(request.path))
        .await
        .map_err(|err| ApiError::unknown(err.to_string()))?
        .map_err(|err| ApiError::invalid_argument(err.to_string()))?;
    state.send(Command::SetPack(Box::new(pack)))?;
    Ok(StatusCode::OK)
}

pub fn new_api() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/v1/camera", put(put_camera))
        .route("/v1/faces", put(put_faces).delete(delete_faces))
        .route("/v1/frame", get(get_frame))
        .route("/v1/pack", put(put_pack))
        .layer(DefaultBodyLimit::disable())
}

/// Receiving end of the command channel, drained by the render thread.
pub struct CommandQueue {
    rx: mpsc::UnboundedReceiver<Command>,
}

impl CommandQueue {
    pub fn try_recv(&mut self) -> Option<Command> {
        self.rx.try_recv().ok()
    }
}

pub fn camera_image(request: SetCameraRequest) -> Option<RgbaImage> {
    RgbaImage::from_raw(request.width, request.height, request.payload.to_vec())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use face_sticker::landmarks::DETECTED_POINTS;
    use glam::Vec2;
    use sticker_api::ErrorCategory;

    use super::*;

    fn state(max_faces: usize) -> (Arc<ApiState>, CommandQueue, Arc<LandmarkStore>) {
        let store = Arc::new(LandmarkStore::new(max_faces));
        let (state, queue) = ApiState::new(store.clone(), Arc::new(FrameSlot::default()));
        (state, queue, store)
    }

    fn face(count: usize) -> FaceDto {
        FaceDto {
            landmarks: vec![Vec2::new(360.0, 640.0); count],
            pitch: 0.0,
            yaw: 0.1,
            roll: 0.0,
            mouth_open: true,
            mouth_big_open: false,
            mouth_closed: false,
            eyes_closed: false,
        }
    }

    fn faces_request(orientation: u8, faces: Vec<FaceDto>) -> SetFacesRequest {
        SetFacesRequest {
            orientation,
            need_flip: true,
            coordinates: Coordinates::Pixels { width: 720, height: 1280, back_camera: false },
            faces,
        }
    }

    fn camera_headers(width: &'static str, height: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("width", HeaderValue::from_static(width));
        headers.insert("height", HeaderValue::from_static(height));
        headers
    }

    #[tokio::test]
    async fn faces_are_published() {
        let (state, _queue, store) = state(2);
        let status = put_faces(State(state), Json(faces_request(1, vec![face(DETECTED_POINTS)]))).await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.face_count(), 1);
        assert_eq!(store.orientation(), Orientation::LandscapeLeft);
        assert!(store.need_flip());

        let stored = store.get_face(0);
        assert_eq!(stored.landmarks[0], Vec2::ZERO);
        assert!(stored.expression.contains(Expression::MOUTH_OPEN));
    }

    #[tokio::test]
    async fn faces_reject_bad_input() {
        let (state, _queue, store) = state(1);

        let err = put_faces(State(state.clone()), Json(faces_request(4, vec![]))).await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::InvalidArgument);

        let err = put_faces(State(state), Json(faces_request(0, vec![face(10)]))).await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::InvalidArgument);
        assert_eq!(store.face_count(), 0);
    }

    #[tokio::test]
    async fn camera_payload_size_is_checked() {
        let (state, mut queue, _store) = state(1);

        let err = put_camera(
            State(state.clone()),
            camera_headers("2", "2"),
            TypedHeader(ContentLength(15)),
            Bytes::from_static(&[0; 15]),
        ).await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::InvalidArgument);
        assert!(queue.try_recv().is_none());

        let status = put_camera(
            State(state),
            camera_headers("2", "2"),
            TypedHeader(ContentLength(16)),
            Bytes::from_static(&[7; 16]),
        ).await.unwrap();
        assert_eq!(status, StatusCode::OK);

        let Some(Command::SetCamera(request)) = queue.try_recv() else {
            panic!("expected camera command");
        };
        let image = camera_image(request).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
    }

    #[tokio::test]
    async fn camera_requires_size_headers() {
        let (state, _queue, _store) = state(1);
        let err = put_camera(
            State(state),
            HeaderMap::new(),
            TypedHeader(ContentLength(16)),
            Bytes::from_static(&[0; 16]),
        ).await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::InvalidArgument);
    }

    #[tokio::test]
    async fn delete_clears_store_and_camera() {
        let (state, mut queue, store) = state(1);
        put_faces(State(state.clone()), Json(faces_request(0, vec![face(DETECTED_POINTS)]))).await.unwrap();

        delete_faces(State(state)).await.unwrap();
        assert!(!store.has_face());
        assert!(matches!(queue.try_recv(), Some(Command::ClearCamera)));
    }

    #[tokio::test]
    async fn frame_not_found_until_rendered() {
        let (state, _queue, _store) = state(1);
        let err = get_frame(State(state.clone())).await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::NotFound);

        *state.frames.lock() = Some(FrameResponse {
            width: 1,
            height: 1,
            payload: Bytes::from_static(&[1, 2, 3, 4]),
        });
        let frame = get_frame(State(state)).await.unwrap();
        assert_eq!(frame.payload.as_ref(), &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn bad_pack_is_rejected() {
        let (state, mut queue, _store) = state(1);
        let err = put_pack(State(state), Json(SetPackRequest { path: "/nonexistent/pack".into() })).await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::InvalidArgument);
        assert!(queue.try_recv().is_none());
    }
}
