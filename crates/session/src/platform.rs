//! Seams to the host AR runtime.
//!
//! The controller never touches browser objects. It asks an [`XrPlatform`]
//! for asynchronous work and is told about the results through
//! [`HostEvent`]s; per-frame queries go through [`XrFrameAccess`], which is
//! only valid for the duration of one frame callback.

use foundation::math::{Mat4, Quat, Viewport};
use gpu::RenderFrame;
use serde::Serialize;

use crate::config::{GeolocationOptions, SensorOptions, SessionFeatures};
use crate::error::SessionError;
use crate::geolocation::{GeoCoordinates, GeolocationError};

/// Body classes the page styles against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum UiState {
    Unsupported,
    ArActive,
}

impl UiState {
    pub fn css_class(self) -> &'static str {
        match self {
            UiState::Unsupported => "unsupported",
            UiState::ArActive => "ar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub mode: String,
    pub required_features: Vec<String>,
    pub optional_features: Vec<String>,
    pub dom_overlay: bool,
}

impl From<&SessionFeatures> for SessionRequest {
    fn from(features: &SessionFeatures) -> Self {
        Self {
            mode: features.mode.clone(),
            required_features: features.required_features.clone(),
            optional_features: features.optional_features.clone(),
            dom_overlay: features.dom_overlay,
        }
    }
}

/// Token the controller assigns to an anchor request; the platform keys its
/// native anchor object by it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AnchorId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AnchorRequest {
    pub id: AnchorId,
    /// Pose in the floor-relative reference space.
    pub pose: Mat4,
}

/// First view of the viewer pose for this frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewerPose {
    pub world_from_view: Mat4,
    pub projection: Mat4,
    pub viewport: Viewport,
}

/// Completion of host-side asynchronous work, delivered in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    SupportChecked { supported: bool },
    /// Render surface and both reference spaces are ready.
    SessionStarted,
    SessionFailed(SessionError),
    SessionEnded,
    OrientationReading(Quat),
    GeolocationResolved(GeoCoordinates),
    GeolocationFailed(GeolocationError),
    AnchorCreated(AnchorId),
    AnchorFailed { id: AnchorId, error: SessionError },
}

pub trait XrPlatform {
    /// Starts the session request. Completion arrives as
    /// [`HostEvent::SessionStarted`] or [`HostEvent::SessionFailed`].
    fn request_session(&mut self, request: &SessionRequest);

    fn start_orientation_sensor(&mut self, options: &SensorOptions) -> Result<(), SessionError>;

    fn stop_orientation_sensor(&mut self);

    /// One-shot position request; completion arrives as a geolocation event.
    fn request_geolocation(&mut self, options: &GeolocationOptions);

    fn request_animation_frame(&mut self);

    fn set_ui_state(&mut self, state: UiState);
}

pub trait XrFrameAccess {
    /// Binds the session layer's framebuffer as the render target.
    fn bind_output(&mut self);

    /// `None` while tracking is being established.
    fn viewer_pose(&self) -> Option<ViewerPose>;

    /// Whether the anchor's pose resolves in the floor space this frame.
    fn anchor_tracked(&self, anchor: AnchorId) -> bool;

    /// Completion arrives as [`HostEvent::AnchorCreated`] or
    /// [`HostEvent::AnchorFailed`].
    fn create_anchor(&mut self, request: AnchorRequest);

    fn render(&mut self, frame: &RenderFrame);
}


#[cfg(test)]
mod tests {
    use super::{SessionRequest, UiState};
    use crate::config::SessionFeatures;

    #[test]
    fn ui_states_map_to_body_classes() {
        assert_eq!(UiState::Unsupported.css_class(), "unsupported");
        assert_eq!(UiState::ArActive.css_class(), "ar");
    }

    #[test]
    fn session_request_carries_feature_lists() {
        let request = SessionRequest::from(&SessionFeatures::default());
        assert_eq!(request.mode, "immersive-ar");
        assert_eq!(
            request.required_features,
            vec!["hit-test", "dom-overlay", "anchors", "local-floor"]
        );
        assert_eq!(request.optional_features, vec!["bounded-floor"]);
        assert!(request.dom_overlay);
    }
}
