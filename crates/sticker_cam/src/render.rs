use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use bytes::Bytes;
use face_sticker::{CapturedFrame, FrameCompositor};
use image::RgbaImage;
use sticker_api::FrameResponse;

use crate::api::{camera_image, Command, CommandQueue, FrameSlot};
use crate::software::SoftwareBackend;

#[derive(Default)]
struct RenderState {
    quit: AtomicBool,
}

/// Everything the render thread owns.
pub struct RenderLoop {
    compositor: FrameCompositor,
    backend: SoftwareBackend,
    queue: CommandQueue,
    frames: Arc<FrameSlot>,
    camera: Option<RgbaImage>,
}

fn frame_response(frame: CapturedFrame) -> FrameResponse {
    let (width, height) = frame.image.dimensions();
    FrameResponse {
        width,
        height,
        payload: Bytes::from(frame.image.into_raw()),
    }
}

impl RenderLoop {
    pub fn new(
        compositor: FrameCompositor,
        backend: SoftwareBackend,
        queue: CommandQueue,
        frames: Arc<FrameSlot>,
    ) -> Self {
        Self {
            compositor,
            backend,
            queue,
            frames,
            camera: None,
        }
    }

    fn apply_commands(&mut self) {
        while let Some(command) = self.queue.try_recv() {
            match command {
                Command::SetCamera(request) => {
                    let (width, height) = (request.width, request.height);
                    match camera_image(request) {
                        Some(image) => {
                            self.compositor.resize(width, height);
                            self.camera = Some(image);
                        }
                        None => tracing::warn!(width, height, "discarding malformed camera frame"),
                    }
                }
                Command::ClearCamera => {
                    self.camera = None;
                }
                Command::SetPack(pack) => {
                    self.compositor.set_pack(pack, &mut self.backend);
                }
            }
        }
    }

    /// Render one frame from the latest camera image and detection.
    pub fn render(&mut self, now: Instant) {
        self.apply_commands();

        let report = self.compositor.render_frame(&mut self.backend, self.camera.as_ref(), now);
        if report.fresh {
            tracing::trace!(
                sequence = report.sequence,
                faces = report.faces,
                stickers = report.stickers_drawn,
                "rendered new detection",
            );
        }

        if let Some(captured) = report.captured {
            *self.frames.lock() = Some(frame_response(captured));
        }
    }

    fn shutdown(&mut self) {
        self.compositor.release(&mut self.backend);
    }
}

pub struct RenderThread {
    state: Arc<RenderState>,
    handle: JoinHandle<()>,
}

impl RenderThread {
    fn update_thread(state: Arc<RenderState>, mut render_loop: RenderLoop, interval: Duration) {
        let mut deadline = Instant::now();
        while !state.quit.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now < deadline {
                thread::sleep(deadline - now);
                continue;
            }

            render_loop.render(now);

            deadline += interval;
            if deadline < now {
                // Fell behind; skip the missed frames.
                deadline = now + interval;
            }
        }
        render_loop.shutdown();
    }

    pub fn spawn(render_loop: RenderLoop, fps: u32) -> anyhow::Result<RenderThread> {
        let interval = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
        tracing::info!(fps, "starting render thread");

        let state = Arc::new(RenderState::default());
        let state_clone = state.clone();
        let handle = thread::Builder::new()
            .name("render".to_string())
            .spawn(move || Self::update_thread(state_clone, render_loop, interval))?;

        Ok(RenderThread {
            state,
            handle,
        })
    }

    pub fn stop(self) -> anyhow::Result<()> {
        self.state.quit.store(true, Ordering::Relaxed);
        self.handle.join().map_err(|_| anyhow!("render thread panicked"))
    }
}

#[cfg(test)]
mod tests {
    use face_sticker::{CompositorConfig, LandmarkStore, PoseConfig, StaticStickerPack, Viewport};
    use sticker_api::SetCameraRequest;

    use super::*;
    use crate::api::ApiState;

    fn render_loop(frames: &Arc<FrameSlot>) -> (Arc<ApiState>, RenderLoop) {
        let store = Arc::new(LandmarkStore::new(1));
        let (api_state, queue) = ApiState::new(store.clone(), frames.clone());
        let compositor = FrameCompositor::new(
            store,
            Box::new(StaticStickerPack::default()),
            Viewport::new(4, 4),
            PoseConfig::default(),
            CompositorConfig::default(),
        );
        (api_state, RenderLoop::new(compositor, SoftwareBackend::new(4, 4), queue, frames.clone()))
    }

    #[test]
    fn camera_frame_is_captured() {
        let frames = Arc::new(FrameSlot::default());
        let (api_state, mut render_loop) = render_loop(&frames);

        api_state.send(Command::SetCamera(SetCameraRequest {
            width: 2,
            height: 3,
            payload: Bytes::from(vec![200; 2 * 3 * 4]),
        })).unwrap();
        render_loop.render(Instant::now());

        let frame = frames.lock().clone().unwrap();
        assert_eq!((frame.width, frame.height), (2, 3));
        assert!(frame.payload.iter().all(|&b| b == 200));
    }

    #[test]
    fn cleared_camera_renders_black() {
        let frames = Arc::new(FrameSlot::default());
        let (api_state, mut render_loop) = render_loop(&frames);

        api_state.send(Command::SetCamera(SetCameraRequest {
            width: 4,
            height: 4,
            payload: Bytes::from(vec![255; 4 * 4 * 4]),
        })).unwrap();
        api_state.send(Command::ClearCamera).unwrap();
        render_loop.render(Instant::now());

        let frame = frames.lock().clone().unwrap();
        assert_eq!(&frame.payload[..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn thread_renders_until_stopped() {
        let frames = Arc::new(FrameSlot::default());
        let (_api_state, render_loop) = render_loop(&frames);

        let thread = RenderThread::spawn(render_loop, 200).unwrap();
        let started = Instant::now();
        while frames.lock().is_none() && started.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
        }
        thread.stop().unwrap();
        assert!(frames.lock().is_some());
    }
}
