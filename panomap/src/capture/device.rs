//! Renderer and content-readiness collaborator traits.
//!
//! The renderer is external; the core only knows this protocol:
//!
//! ```text
//! begin_capture ──► render fence ──► begin_readback ──► readback fence ──► take_pixels
//! ```
//!
//! Pixels are valid only after BOTH fences have signaled. Reading earlier
//! returns a partial or garbage frame, so the sequencer never calls
//! `take_pixels` before `readback_complete` reports true.

use crate::bounds::WorldPoint;
use crate::settings::{CameraRotation, QualityOverrides};
use crate::store::TileBuffer;

/// Where and how the virtual camera photographs one tile.
///
/// Produced by the grid planner, consumed opaquely by the renderer. The
/// quality block, when present, is forwarded without interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPlacement {
    /// Camera position in world space (already at camera height).
    pub center: WorldPoint,
    /// Camera orientation in degrees.
    pub rotation: CameraRotation,
    /// World-space width the orthographic frustum must span.
    pub ortho_width: f64,
    /// Vertical field of view in degrees (perspective only).
    pub field_of_view: f32,
    /// Orthographic (true) or perspective (false) projection.
    pub orthographic: bool,
    /// Opaque render-quality overrides.
    pub quality: Option<QualityOverrides>,
}

/// Error from the renderer collaborator.
///
/// Carried as data across the async boundary; the sequencer absorbs these
/// per tile instead of unwinding.
#[derive(Debug, Clone)]
pub struct DeviceError {
    pub message: String,
}

impl DeviceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DeviceError {}

/// The external renderer, reduced to a capture-and-fence protocol.
///
/// The sequencer owns the device exclusively for the duration of a run and
/// repositions the same camera/render-target pair for every tile, so all
/// methods take `&mut self`. Implementations decide what the tokens mean
/// (a GPU fence, a frame counter, a completed future); the sequencer only
/// polls them.
pub trait CaptureDevice: Send + 'static {
    /// Proof that a render was submitted; polled until the frame is done.
    type RenderToken: Send;
    /// Proof that a readback was started; polled until pixels arrived.
    type ReadbackToken: Send;

    /// Positions the camera and submits an asynchronous render of a
    /// `width` x `height` image.
    fn begin_capture(
        &mut self,
        placement: &CameraPlacement,
        width: u32,
        height: u32,
    ) -> Result<Self::RenderToken, DeviceError>;

    /// Returns true once the submitted render has completed on the
    /// renderer's side.
    fn render_complete(&mut self, token: &Self::RenderToken) -> bool;

    /// Starts the asynchronous transfer of the rendered pixels into
    /// CPU-visible memory.
    fn begin_readback(&mut self, token: Self::RenderToken)
        -> Result<Self::ReadbackToken, DeviceError>;

    /// Returns true once the pixel transfer has completed.
    fn readback_complete(&mut self, token: &Self::ReadbackToken) -> bool;

    /// Consumes the readback and yields the pixels.
    ///
    /// An empty (zero-dimension) buffer is a valid return and means the
    /// capture produced nothing; the caller decides how to recover.
    fn take_pixels(&mut self, token: Self::ReadbackToken) -> Result<TileBuffer, DeviceError>;

    /// Releases renderer-side resources (camera, render target).
    ///
    /// Called once per run on every exit path, including cancellation.
    /// Must be safe to call when nothing was ever captured.
    fn release(&mut self);

    /// Renderer name for logging.
    fn name(&self) -> &str;
}

/// World-content readiness gate.
///
/// Some renderers stream world content in around points of interest; a
/// capture taken before streaming finishes photographs half-loaded
/// geometry. The sequencer registers interest in each tile's area and
/// polls until the gate reports ready.
pub trait ContentGate: Send + 'static {
    /// Registers interest in the area within `radius` of `center`.
    fn request_ready(&mut self, center: WorldPoint, radius: f64);

    /// Returns true once the requested area is fully loaded.
    fn is_ready(&self) -> bool;

    /// Withdraws the current interest registration.
    ///
    /// Called after each tile and at teardown; must be idempotent.
    fn release(&mut self);
}

/// Gate for renderers with no streaming concept: always ready.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysReady;

impl ContentGate for AlwaysReady {
    fn request_ready(&mut self, _center: WorldPoint, _radius: f64) {}

    fn is_ready(&self) -> bool {
        true
    }

    fn release(&mut self) {}
}
