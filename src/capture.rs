//! Capture & Annotation Engine.
//!
//! Turns a live video frame plus a tap point into a downscaled, annotated,
//! JPEG-encoded still suitable for transmission:
//!
//! 1. Guard — the source must have a decoded frame, otherwise fail fast.
//! 2. Downscale to at most [`MAX_CAPTURE_DIM`] on the longer side,
//!    preserving aspect ratio. Never upscale.
//! 3. Map the tap point from on-screen container coordinates into raster
//!    coordinates, independently per axis.
//! 4. Stroke a translucent white ring centered on the mapped point. The
//!    ring is drawn *into* the transmitted image so a general-purpose
//!    vision service keeps full-image context while still seeing the exact
//!    region of interest.
//! 5. Encode as JPEG; the raw bytes are the transmission payload.

use crate::error::{PointLensError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, Rgba, RgbaImage};

/// Longest raster side of a transmitted capture.
pub const MAX_CAPTURE_DIM: u32 = 512;

/// On-screen ring radius around the tap point, in container pixels.
pub const RING_SCREEN_RADIUS: f32 = 32.0;

/// Minimum ring stroke width in raster pixels.
const MIN_RING_STROKE: f32 = 2.0;

/// Ring stroke alpha (translucent white).
const RING_ALPHA: f32 = 0.8;

/// JPEG encode quality (0-100).
const JPEG_QUALITY: u8 = 80;

/// A point in container (on-screen) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// On-screen size of the rendered video container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Fixed on-screen diameter of the tap marker.
pub const MARKER_DIAMETER: f32 = 2.0 * RING_SCREEN_RADIUS;

/// Screen position of the last tap, kept visible across an identification
/// cycle to show the last point examined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureMarker {
    /// Top-left anchor of the marker.
    pub x: f32,
    pub y: f32,
}

impl CaptureMarker {
    /// Anchor a fixed-diameter marker so it is centered on the tap point.
    pub fn centered_on(tap: Point) -> Self {
        Self {
            x: tap.x - MARKER_DIAMETER / 2.0,
            y: tap.y - MARKER_DIAMETER / 2.0,
        }
    }
}

/// Encoded capture payload handed to the reasoning service.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    /// Raw compressed image bytes (no data-URL framing).
    pub data: Vec<u8>,
    /// MIME type of `data`.
    pub mime_type: &'static str,
}

/// A source of decoded video frames. Shared by reference with in-flight
/// identification attempts, hence `Sync`.
pub trait FrameSource: Sync {
    /// Whether the source has at least one decoded frame.
    fn is_ready(&self) -> bool;

    /// The current frame, if one is decoded.
    fn frame(&self) -> Option<RgbaImage>;
}

/// Compute the transmitted raster size for a source frame.
///
/// Bounded by [`MAX_CAPTURE_DIM`] on the longer side; downscale only.
pub fn target_size(src_width: u32, src_height: u32) -> (u32, u32) {
    let longer = src_width.max(src_height);
    if longer <= MAX_CAPTURE_DIM || longer == 0 {
        return (src_width, src_height);
    }
    let scale = MAX_CAPTURE_DIM as f32 / longer as f32;
    let w = ((src_width as f32 * scale).round() as u32).max(1);
    let h = ((src_height as f32 * scale).round() as u32).max(1);
    (w, h)
}

/// Map a tap point from container coordinates into raster coordinates.
///
/// Ratios are applied independently per axis: letterboxing or non-uniform
/// scaling can differ between x and y.
pub fn map_point(tap: Point, container: Size, raster_w: u32, raster_h: u32) -> Point {
    let rx = raster_w as f32 / container.width;
    let ry = raster_h as f32 / container.height;
    Point::new(tap.x * rx, tap.y * ry)
}

/// Ring radius in raster pixels for a given container→raster mapping.
///
/// Scaled by the *minimum* of the per-axis ratios so the ring stays
/// circular under non-uniform scaling.
pub fn ring_radius(container: Size, raster_w: u32, raster_h: u32) -> f32 {
    let rx = raster_w as f32 / container.width;
    let ry = raster_h as f32 / container.height;
    RING_SCREEN_RADIUS * rx.min(ry)
}

fn ring_stroke(container: Size, raster_w: u32, raster_h: u32) -> f32 {
    let rx = raster_w as f32 / container.width;
    let ry = raster_h as f32 / container.height;
    (MIN_RING_STROKE * rx.min(ry)).max(MIN_RING_STROKE)
}

/// Stroke a translucent white ring onto the raster.
fn draw_ring(img: &mut RgbaImage, center: Point, radius: f32, stroke: f32) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let half = stroke / 2.0;
    let x_min = ((center.x - radius - half).floor() as i64).max(0);
    let x_max = ((center.x + radius + half).ceil() as i64).min(w - 1);
    let y_min = ((center.y - radius - half).floor() as i64).max(0);
    let y_max = ((center.y + radius + half).ceil() as i64).min(h - 1);

    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let dist = Point::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
            if (dist - radius).abs() > half {
                continue;
            }
            let px = img.get_pixel_mut(x as u32, y as u32);
            blend_white(px, RING_ALPHA);
        }
    }
}

fn blend_white(px: &mut Rgba<u8>, alpha: f32) {
    for channel in px.0.iter_mut().take(3) {
        let src = 255.0 * alpha + f32::from(*channel) * (1.0 - alpha);
        *channel = src.round().clamp(0.0, 255.0) as u8;
    }
    px.0[3] = 255;
}

/// Freeze, annotate, downscale and encode the current frame.
///
/// `tap` and `container` are in on-screen coordinates. Fails fast with
/// [`PointLensError::CaptureNotReady`] when no frame is decoded; any raster
/// or encoder failure is non-recoverable for the attempt.
pub fn capture(source: &dyn FrameSource, tap: Point, container: Size) -> Result<CapturedImage> {
    if !source.is_ready() {
        return Err(PointLensError::CaptureNotReady);
    }
    let frame = source.frame().ok_or(PointLensError::CaptureNotReady)?;
    if container.width <= 0.0 || container.height <= 0.0 {
        return Err(PointLensError::Capture("container has zero size".into()));
    }

    let (tw, th) = target_size(frame.width(), frame.height());
    let mut raster = if (tw, th) == (frame.width(), frame.height()) {
        frame
    } else {
        imageops::resize(&frame, tw, th, imageops::FilterType::Triangle)
    };

    let center = map_point(tap, container, tw, th);
    let radius = ring_radius(container, tw, th);
    let stroke = ring_stroke(container, tw, th);
    draw_ring(&mut raster, center, radius, stroke);

    let rgb = DynamicImage::ImageRgba8(raster).to_rgb8();
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| PointLensError::Capture(e.to_string()))?;

    tracing::debug!(
        width = tw,
        height = th,
        bytes = data.len(),
        "encoded annotated capture"
    );

    Ok(CapturedImage {
        data,
        mime_type: "image/jpeg",
    })
}

// ── Tests ────────────────────────────────────────────────────────
