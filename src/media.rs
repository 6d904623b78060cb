//! Media Capability Adapter.
//!
//! Wraps device camera acquisition behind a narrow trait seam and owns the
//! live track's lifecycle:
//! - `start` tears down any previous stream first (idempotent restart),
//!   then probes the track for zoom capability and applies a neutral zoom.
//! - `stop` releases the track and resets zoom bounds; safe when already
//!   stopped.
//! - Switching facing is a full stop+restart cycle — most platforms cannot
//!   change facing on a live track.
//! - `apply_zoom` is best-effort; failure is logged and never fatal.

use crate::capture::FrameSource;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Default ideal resolution requested at acquisition.
const IDEAL_WIDTH: u32 = 1280;
const IDEAL_HEIGHT: u32 = 720;

/// Neutral zoom factor applied right after acquisition.
pub const NEUTRAL_ZOOM: f64 = 1.0;

/// Camera selection between outward- and inward-facing sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Outward-facing (rear) camera.
    Environment,
    /// Inward-facing (selfie) camera.
    User,
}

impl Facing {
    /// Constraint string understood by device APIs.
    pub fn as_constraint(self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::User => "user",
        }
    }

    /// The other sensor.
    pub fn flipped(self) -> Self {
        match self {
            Self::Environment => Self::User,
            Self::User => Self::Environment,
        }
    }
}

/// Acquisition constraints for a video stream.
#[derive(Debug, Clone, Copy)]
pub struct StreamConstraints {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

/// Hardware zoom bounds, when the track exposes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomCapability {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ZoomCapability {
    /// Clamp a requested factor into the supported range.
    pub fn clamp(&self, factor: f64) -> f64 {
        factor.clamp(self.min, self.max)
    }
}

/// A live video track. Frames are read through [`FrameSource`];
/// constraint application and teardown happen here.
pub trait VideoTrack: FrameSource + Send {
    /// Zoom bounds, or `None` when the hardware exposes none.
    fn zoom_capability(&self) -> Option<ZoomCapability>;

    /// Apply a zoom constraint to the live track.
    fn apply_zoom(&mut self, factor: f64) -> Result<()>;

    /// Release the track's hardware resources.
    fn stop(&mut self);
}

/// Device camera API: capability-constrained stream acquisition.
#[async_trait]
pub trait MediaDevice: Send + Sync {
    /// Acquire a video track. Suspension point: the platform may prompt
    /// the user for permission here.
    async fn acquire(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoTrack>>;
}

/// Owns the single live camera track and its zoom negotiation.
pub struct MediaAdapter {
    device: Arc<dyn MediaDevice>,
    track: Option<Box<dyn VideoTrack>>,
    facing: Facing,
    zoom_bounds: Option<ZoomCapability>,
}

impl MediaAdapter {
    pub fn new(device: Arc<dyn MediaDevice>) -> Self {
        Self {
            device,
            track: None,
            facing: Facing::Environment,
            zoom_bounds: None,
        }
    }

    /// Start (or restart) the camera with the given facing.
    ///
    /// Any previously active stream is torn down first. On success the
    /// track is probed for zoom capability; absence disables zoom silently.
    pub async fn start(&mut self, facing: Facing) -> Result<()> {
        self.stop();

        let constraints = StreamConstraints {
            facing,
            ideal_width: IDEAL_WIDTH,
            ideal_height: IDEAL_HEIGHT,
        };
        let mut track = self.device.acquire(&constraints).await?;

        self.zoom_bounds = track.zoom_capability();
        match self.zoom_bounds {
            Some(bounds) => {
                if let Err(e) = track.apply_zoom(bounds.clamp(NEUTRAL_ZOOM)) {
                    tracing::warn!(error = %e, "neutral zoom constraint rejected");
                }
                tracing::info!(
                    facing = facing.as_constraint(),
                    min = bounds.min,
                    max = bounds.max,
                    "camera started with zoom support"
                );
            }
            None => {
                tracing::info!(facing = facing.as_constraint(), "camera started, no zoom");
            }
        }

        self.facing = facing;
        self.track = Some(track);
        Ok(())
    }

    /// Release all tracks and reset zoom bounds. No-op when already stopped.
    pub fn stop(&mut self) {
        if let Some(mut track) = self.track.take() {
            track.stop();
            tracing::info!("camera stopped");
        }
        self.zoom_bounds = None;
    }

    /// Stop and restart with the opposite facing.
    pub async fn switch_facing(&mut self) -> Result<()> {
        let next = self.facing.flipped();
        self.start(next).await
    }

    /// Best-effort zoom application. Returns whether the constraint was
    /// accepted; failure is non-fatal and logged. Inert when the track
    /// exposes no zoom capability.
    pub fn apply_zoom(&mut self, factor: f64) -> bool {
        if self.zoom_bounds.is_none() {
            return false;
        }
        let Some(track) = self.track.as_mut() else {
            return false;
        };
        match track.apply_zoom(factor) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(factor, error = %e, "zoom constraint rejected");
                false
            }
        }
    }

    pub fn zoom_bounds(&self) -> Option<ZoomCapability> {
        self.zoom_bounds
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_active(&self) -> bool {
        self.track.is_some()
    }

    /// The live track as a frame source, while active.
    pub fn frame_source(&self) -> Option<&dyn FrameSource> {
        self.track.as_deref().map(|t| t as &dyn FrameSource)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PointLensError;
    use image::RgbaImage;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeTrackLog {
        stops: usize,
        zooms: Vec<f64>,
    }

    struct FakeTrack {
        log: Arc<Mutex<FakeTrackLog>>,
        capability: Option<ZoomCapability>,
        reject_zoom: bool,
    }

    impl FrameSource for FakeTrack {
        fn is_ready(&self) -> bool {
            true
        }

        fn frame(&self) -> Option<RgbaImage> {
            Some(RgbaImage::new(4, 4))
        }
    }

    impl VideoTrack for FakeTrack {
        fn zoom_capability(&self) -> Option<ZoomCapability> {
            self.capability
        }

        fn apply_zoom(&mut self, factor: f64) -> Result<()> {
            if self.reject_zoom {
                return Err(PointLensError::DeviceUnavailable("zoom rejected".into()));
            }
            self.log.lock().zooms.push(factor);
            Ok(())
        }

        fn stop(&mut self) {
            self.log.lock().stops += 1;
        }
    }

    struct FakeDevice {
        log: Arc<Mutex<FakeTrackLog>>,
        capability: Option<ZoomCapability>,
        reject_zoom: bool,
        fail_with: Option<fn() -> PointLensError>,
        acquisitions: Mutex<Vec<Facing>>,
    }

    impl FakeDevice {
        fn working(capability: Option<ZoomCapability>) -> Self {
            Self {
                log: Arc::new(Mutex::new(FakeTrackLog::default())),
                capability,
                reject_zoom: false,
                fail_with: None,
                acquisitions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MediaDevice for FakeDevice {
        async fn acquire(&self, constraints: &StreamConstraints) -> Result<Box<dyn VideoTrack>> {
            if let Some(make_err) = self.fail_with {
                return Err(make_err());
            }
            self.acquisitions.lock().push(constraints.facing);
            Ok(Box::new(FakeTrack {
                log: self.log.clone(),
                capability: self.capability,
                reject_zoom: self.reject_zoom,
            }))
        }
    }

    fn bounds() -> ZoomCapability {
        ZoomCapability {
            min: 1.0,
            max: 5.0,
            step: 0.1,
        }
    }

    #[tokio::test]
    async fn start_probes_zoom_and_applies_neutral() {
        let device = Arc::new(FakeDevice::working(Some(bounds())));
        let mut adapter = MediaAdapter::new(device.clone());
        adapter.start(Facing::Environment).await.unwrap();

        assert!(adapter.is_active());
        assert_eq!(adapter.zoom_bounds(), Some(bounds()));
        assert_eq!(device.log.lock().zooms, vec![NEUTRAL_ZOOM]);
    }

    #[tokio::test]
    async fn missing_capability_disables_zoom_silently() {
        let device = Arc::new(FakeDevice::working(None));
        let mut adapter = MediaAdapter::new(device);
        adapter.start(Facing::Environment).await.unwrap();

        assert!(adapter.is_active());
        assert!(adapter.zoom_bounds().is_none());
        assert!(!adapter.apply_zoom(2.0));
    }

    #[tokio::test]
    async fn restart_tears_down_previous_stream() {
        let device = Arc::new(FakeDevice::working(Some(bounds())));
        let mut adapter = MediaAdapter::new(device.clone());
        adapter.start(Facing::Environment).await.unwrap();
        adapter.start(Facing::Environment).await.unwrap();

        assert_eq!(device.log.lock().stops, 1);
        assert!(adapter.is_active());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let device = Arc::new(FakeDevice::working(Some(bounds())));
        let mut adapter = MediaAdapter::new(device.clone());
        adapter.start(Facing::Environment).await.unwrap();

        adapter.stop();
        adapter.stop();

        assert_eq!(device.log.lock().stops, 1);
        assert!(!adapter.is_active());
        assert!(adapter.zoom_bounds().is_none());
        assert!(adapter.frame_source().is_none());
    }

    #[tokio::test]
    async fn switch_facing_is_stop_plus_restart() {
        let device = Arc::new(FakeDevice::working(None));
        let mut adapter = MediaAdapter::new(device.clone());
        adapter.start(Facing::Environment).await.unwrap();
        adapter.switch_facing().await.unwrap();

        assert_eq!(adapter.facing(), Facing::User);
        assert_eq!(device.log.lock().stops, 1);
        assert_eq!(
            *device.acquisitions.lock(),
            vec![Facing::Environment, Facing::User]
        );
    }

    #[tokio::test]
    async fn acquisition_failure_propagates() {
        let mut device = FakeDevice::working(None);
        device.fail_with = Some(|| PointLensError::PermissionDenied);
        let mut adapter = MediaAdapter::new(Arc::new(device));

        let err = adapter.start(Facing::Environment).await.unwrap_err();
        assert!(matches!(err, PointLensError::PermissionDenied));
        assert!(!adapter.is_active());
    }

    #[tokio::test]
    async fn zoom_rejection_is_non_fatal() {
        let mut device = FakeDevice::working(Some(bounds()));
        device.reject_zoom = true;
        let mut adapter = MediaAdapter::new(Arc::new(device));

        adapter.start(Facing::Environment).await.unwrap();
        assert!(adapter.is_active());
        assert!(!adapter.apply_zoom(3.0));
    }

    #[test]
    fn clamp_respects_bounds() {
        let b = bounds();
        assert_eq!(b.clamp(8.0), 5.0);
        assert_eq!(b.clamp(0.2), 1.0);
        assert_eq!(b.clamp(3.0), 3.0);
    }
}
