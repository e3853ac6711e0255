use face_sticker::{RenderBackend, StickerQuad, TextureHandle, Viewport};
use glam::{Mat4, Vec2, Vec4};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// CPU render target standing in for a GPU framebuffer.
pub struct SoftwareBackend {
    target: RgbaImage,
    textures: Vec<Option<RgbaImage>>,
    free: Vec<u32>,
}

fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let alpha = src[3] as u32;
    if alpha == 0 {
        return;
    }
    for i in 0..3 {
        dst[i] = ((src[i] as u32 * alpha + dst[i] as u32 * (255 - alpha) + 127) / 255) as u8;
    }
    dst[3] = (alpha + dst[3] as u32 * (255 - alpha) / 255).min(255) as u8;
}

/// Twice the signed area of `(a, b, p)`.
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl SoftwareBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: RgbaImage::new(width, height),
            textures: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.target.dimensions() != (width, height) {
            self.target = RgbaImage::new(width, height);
        }
    }

    /// Normalized device coordinates to a target pixel, top-left origin.
    fn to_target(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            (ndc.x * 0.5 + 0.5) * self.target.width() as f32,
            (0.5 - ndc.y * 0.5) * self.target.height() as f32,
        )
    }

    fn texture(&self, handle: TextureHandle) -> Option<&RgbaImage> {
        self.textures.get(handle.0 as usize).and_then(|t| t.as_ref())
    }

    fn fill_triangle(&mut self, positions: [Vec2; 3], uvs: [Vec2; 3], texture: &RgbaImage) {
        let [a, b, c] = positions;
        let area = edge(a, b, c);
        if area.abs() < f32::EPSILON {
            return;
        }

        let (width, height) = self.target.dimensions();
        let min = a.min(b).min(c).max(Vec2::ZERO);
        let max = a.max(b).max(c).min(Vec2::new(width as f32, height as f32));
        if min.x >= max.x || min.y >= max.y {
            return;
        }

        let (tw, th) = texture.dimensions();
        for y in (min.y as u32)..(max.y.ceil() as u32).min(height) {
            for x in (min.x as u32)..(max.x.ceil() as u32).min(width) {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b, c, p) / area;
                let w1 = edge(c, a, p) / area;
                let w2 = edge(a, b, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                // Texture row 0 is v = 0.
                let uv = uvs[0] * w0 + uvs[1] * w1 + uvs[2] * w2;
                let tx = ((uv.x * tw as f32) as u32).min(tw - 1);
                let ty = ((uv.y * th as f32) as u32).min(th - 1);
                blend(self.target.get_pixel_mut(x, y), *texture.get_pixel(tx, ty));
            }
        }
    }
}

impl RenderBackend for SoftwareBackend {
    fn begin_frame(&mut self, viewport: &Viewport) {
        self.resize(viewport.width, viewport.height);
        for pixel in self.target.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 255]);
        }
    }

    fn draw_camera(&mut self, frame: Option<&RgbaImage>) {
        let Some(frame) = frame else {
            return;
        };

        if frame.dimensions() == self.target.dimensions() {
            self.target.copy_from_slice(frame.as_raw());
        } else {
            let (width, height) = self.target.dimensions();
            self.target = imageops::resize(frame, width, height, FilterType::Nearest);
        }
    }

    fn upload_texture(&mut self, image: &RgbaImage, reuse: Option<TextureHandle>) -> TextureHandle {
        if let Some(handle) = reuse {
            match self.textures.get_mut(handle.0 as usize) {
                Some(slot) if slot.is_some() => {
                    *slot = Some(image.clone());
                    return handle;
                }
                _ => {}
            }
        }

        let handle = match self.free.pop() {
            Some(index) => TextureHandle(index),
            None => {
                self.textures.push(None);
                TextureHandle((self.textures.len() - 1) as u32)
            }
        };
        self.textures[handle.0 as usize] = Some(image.clone());
        handle
    }

    fn draw_sticker(&mut self, quad: &StickerQuad, mvp: &Mat4, texture: TextureHandle) {
        if self.texture(texture).map_or(true, |image| image.width() == 0 || image.height() == 0) {
            tracing::warn!(?texture, "drawing with missing texture");
            return;
        }

        let mut projected = [Vec2::ZERO; 4];
        for (out, position) in projected.iter_mut().zip(quad.positions) {
            let clip = *mvp * Vec4::new(position.x, position.y, 0.0, 1.0);
            if clip.w <= f32::EPSILON {
                return;
            }
            *out = self.to_target(Vec2::new(clip.x, clip.y) / clip.w);
        }

        // Take the texture out of its slot while drawing into the target.
        let slot = texture.0 as usize;
        let Some(image) = self.textures[slot].take() else {
            return;
        };
        let uvs = quad.texture_coordinates;
        for [i, j, k] in [[0, 1, 2], [2, 1, 3]] {
            self.fill_triangle([projected[i], projected[j], projected[k]], [uvs[i], uvs[j], uvs[k]], &image);
        }
        self.textures[slot] = Some(image);
    }

    fn draw_points(&mut self, points: &[Vec2], size: f32, color: [u8; 4]) {
        let (width, height) = self.target.dimensions();
        let half = (size * 0.5).max(0.5);
        for point in points {
            let center = self.to_target(*point);
            let x0 = (center.x - half).max(0.0) as u32;
            let y0 = (center.y - half).max(0.0) as u32;
            let x1 = ((center.x + half).max(0.0) as u32).min(width);
            let y1 = ((center.y + half).max(0.0) as u32).min(height);
            for y in y0..y1 {
                for x in x0..x1 {
                    blend(self.target.get_pixel_mut(x, y), Rgba(color));
                }
            }
        }
    }

    fn capture(&mut self) -> Option<RgbaImage> {
        Some(self.target.clone())
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if let Some(slot) = self.textures.get_mut(handle.0 as usize) {
            if slot.take().is_some() {
                self.free.push(handle.0);
            }
        }
    }
}
