//! AR session state machine.
//!
//! ```text
//! Idle -> SessionRequested -> Active -> Ended
//!   \            \
//!    `------------`--> Unsupported (terminal)
//! ```
//!
//! Inside `Active`, every frame renders and may run the placement step
//! (`AnchorPending -> AnchorPlaced`). Placement is one-shot: once a compass
//! is anchored it stays, and only its visibility follows anchor tracking.

use foundation::math::{Mat4, local_waypoints};
use gpu::{Camera, Renderer};
use runtime::FrameClock;
use scene::World;
use scene::components::Visibility;
use scene::prefabs::CompassModel;
use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use crate::config::ArConfig;
use crate::geolocation::GeolocationProbe;
use crate::placement::{AnchorState, PendingPlacement, PlacementGate};
use crate::platform::{
    AnchorId, AnchorRequest, HostEvent, SessionRequest, UiState, XrFrameAccess, XrPlatform,
};
use crate::sampler::OrientationSampler;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    SessionRequested,
    Active,
    Unsupported,
    Ended,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub frames: u64,
    pub rendered_frames: u64,
    pub sensor_readings: u64,
    pub placement_evaluations: u64,
    pub anchor_requests: u64,
    pub anchor_failures: u64,
    pub geolocation_failures: u64,
}

/// Everything the session mutates, each field with a single writer:
/// readings feed `sampler`, position fixes feed `geolocation`, and only the
/// frame step touches the gate, anchor, scene and camera.
#[derive(Debug)]
pub struct SessionContext {
    pub sampler: OrientationSampler,
    pub geolocation: GeolocationProbe,
    pub gate: PlacementGate,
    pub pending: Option<PendingPlacement>,
    pub anchor: Option<AnchorState>,
    pub world: World,
    pub camera: Camera,
    pub clock: FrameClock,
    pub stats: SessionStats,
}

impl SessionContext {
    fn new(config: &ArConfig) -> Self {
        Self {
            sampler: OrientationSampler::new(config.sensor, config.history_capacity),
            geolocation: GeolocationProbe::new(config.geolocation),
            gate: PlacementGate::new(config.placement.cooldown_ms),
            pending: None,
            anchor: None,
            world: World::new(),
            camera: Camera::default(),
            clock: FrameClock::new(),
            stats: SessionStats::default(),
        }
    }
}

#[derive(Debug)]
pub struct SessionController {
    config: ArConfig,
    state: SessionState,
    ctx: SessionContext,
    next_anchor_id: u64,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(ArConfig::default())
    }
}

impl SessionController {
    pub fn new(config: ArConfig) -> Self {
        let ctx = SessionContext::new(&config);
        Self {
            config,
            state: SessionState::Idle,
            ctx,
            next_anchor_id: 0,
        }
    }

    pub fn config(&self) -> &ArConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            sensor_readings: self.ctx.sampler.readings(),
            ..self.ctx.stats
        }
    }

    pub fn anchor(&self) -> Option<&AnchorState> {
        self.ctx.anchor.as_ref()
    }

    /// User-initiated entry into AR.
    pub fn activate<P: XrPlatform + ?Sized>(&mut self, platform: &mut P) {
        if self.state != SessionState::Idle {
            warn!(state = ?self.state, "activation ignored");
            return;
        }
        let request = SessionRequest::from(&self.config.session);
        info!(
            mode = %request.mode,
            required = ?request.required_features,
            optional = ?request.optional_features,
            "requesting XR session"
        );
        self.state = SessionState::SessionRequested;
        platform.request_session(&request);
    }

    pub fn handle_event<P: XrPlatform + ?Sized>(&mut self, event: HostEvent, platform: &mut P) {
        match event {
            HostEvent::SupportChecked { supported } => self.on_support_checked(supported, platform),
            HostEvent::SessionStarted => self.on_session_started(platform),
            HostEvent::SessionFailed(err) => {
                if self.state != SessionState::SessionRequested {
                    warn!(state = ?self.state, error = %err, "unexpected session failure");
                    return;
                }
                error!(error = %err, "XR session could not be started");
                self.enter_unsupported(platform);
            }
            HostEvent::SessionEnded => self.on_session_ended(platform),
            HostEvent::OrientationReading(q) => self.ctx.sampler.on_reading(q),
            HostEvent::GeolocationResolved(coords) => self.ctx.geolocation.on_success(coords),
            HostEvent::GeolocationFailed(err) => {
                self.ctx.stats.geolocation_failures += 1;
                self.ctx.geolocation.on_failure(err);
            }
            HostEvent::AnchorCreated(id) => self.on_anchor_created(id),
            HostEvent::AnchorFailed { id, error } => {
                match self.ctx.pending.take_if(|p| p.id == id) {
                    Some(_) => {
                        self.ctx.stats.anchor_failures += 1;
                        warn!(anchor = id.0, error = %error, "could not create anchor");
                    }
                    None => debug!(anchor = id.0, "failure for unknown anchor request"),
                }
            }
        }
    }

    /// One compositor frame. Ignored unless the session is active.
    pub fn on_frame<P, F>(&mut self, time_ms: f64, platform: &mut P, frame: &mut F)
    where
        P: XrPlatform + ?Sized,
        F: XrFrameAccess + ?Sized,
    {
        if self.state != SessionState::Active {
            trace!(state = ?self.state, "frame outside active session");
            return;
        }
        platform.request_animation_frame();

        let tick = match self.ctx.clock.tick(time_ms) {
            Ok(tick) => tick,
            Err(err) => {
                warn!(
                    previous_ms = err.previous_ms,
                    received_ms = err.received_ms,
                    "frame timestamp went backwards; skipped"
                );
                return;
            }
        };
        self.ctx.stats.frames += 1;
        if tick.is_first() {
            debug!(time_ms = tick.time_ms, "first frame of session");
        } else {
            trace!(index = tick.index, delta_ms = tick.delta_ms, "frame");
        }

        frame.bind_output();
        if let Some(pose) = frame.viewer_pose() {
            self.ctx
                .camera
                .update_from_pose(pose.world_from_view, pose.projection);
            let render = Renderer::collect(&self.ctx.world, &self.ctx.camera, pose.viewport);
            frame.render(&render);
            self.ctx.stats.rendered_frames += 1;
        }

        if let Some(anchor) = self.ctx.anchor.as_mut() {
            let tracked = frame.anchor_tracked(anchor.id);
            if tracked != anchor.tracked {
                debug!(anchor = anchor.id.0, tracked, "anchor tracking changed");
            }
            anchor.tracked = tracked;
            self.ctx
                .world
                .set_visibility(anchor.root, Visibility::from_visible(tracked));
        }

        let eligible = self.ctx.anchor.is_none() && self.ctx.pending.is_none();
        if self.ctx.gate.should_evaluate(tick.time_ms, eligible) {
            self.evaluate_placement(frame);
        }
    }

    fn on_support_checked<P: XrPlatform + ?Sized>(&mut self, supported: bool, platform: &mut P) {
        if supported {
            debug!("immersive-ar supported");
            return;
        }
        if self.state == SessionState::Idle {
            info!("immersive-ar not supported");
            self.enter_unsupported(platform);
        }
    }

    fn on_session_started<P: XrPlatform + ?Sized>(&mut self, platform: &mut P) {
        if self.state != SessionState::SessionRequested {
            warn!(state = ?self.state, "session start ignored");
            return;
        }
        self.state = SessionState::Active;
        info!("XR session active");
        platform.set_ui_state(UiState::ArActive);
        self.ctx.sampler.start(platform);
        self.ctx.geolocation.request(platform);
        platform.request_animation_frame();
    }

    fn on_session_ended<P: XrPlatform + ?Sized>(&mut self, platform: &mut P) {
        if self.state != SessionState::Active {
            debug!(state = ?self.state, "session end outside active session");
            return;
        }
        self.state = SessionState::Ended;
        self.ctx.sampler.stop(platform);
        info!(frames = self.ctx.stats.frames, "XR session ended");
    }

    fn enter_unsupported<P: XrPlatform + ?Sized>(&mut self, platform: &mut P) {
        self.state = SessionState::Unsupported;
        platform.set_ui_state(UiState::Unsupported);
    }

    fn evaluate_placement<F: XrFrameAccess + ?Sized>(&mut self, frame: &mut F) {
        self.ctx.stats.placement_evaluations += 1;
        let placement = &self.config.placement;

        let heading = self
            .ctx
            .sampler
            .history()
            .and_then(|h| h.estimate(placement.heading_estimator));
        let Some(heading_rad) = heading else {
            debug!(
                samples = self.ctx.sampler.history().map_or(0, |h| h.len()),
                "placement skipped: heading not ready"
            );
            return;
        };
        let Some(coords) = self.ctx.geolocation.coordinates().copied() else {
            debug!("placement skipped: no geolocation yet");
            return;
        };

        let points = local_waypoints(
            &placement.waypoints(),
            coords.lat_lng(),
            placement.ground_offset_m,
        );
        let id = AnchorId(self.next_anchor_id);
        self.next_anchor_id += 1;

        info!(
            anchor = id.0,
            latitude = coords.latitude,
            longitude = coords.longitude,
            heading_deg = heading_rad.to_degrees(),
            "requesting compass anchor"
        );
        self.ctx.pending = Some(PendingPlacement {
            id,
            heading_rad,
            points,
        });
        self.ctx.stats.anchor_requests += 1;
        frame.create_anchor(AnchorRequest {
            id,
            pose: Mat4::IDENTITY,
        });
    }

    fn on_anchor_created(&mut self, id: AnchorId) {
        let Some(pending) = self.ctx.pending.take_if(|p| p.id == id) else {
            warn!(anchor = id.0, "anchor created without a matching request");
            return;
        };
        let compass = CompassModel::new(pending.points);
        let root = compass.spawn(&mut self.ctx.world, -pending.heading_rad);
        self.ctx.anchor = Some(AnchorState {
            id,
            root,
            heading_rad: pending.heading_rad,
            tracked: true,
        });
        info!(anchor = id.0, "compass anchored");
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionController, SessionState};
    use crate::config::{ArConfig, GeolocationOptions, HeadingEstimator, SensorOptions};
    use crate::error::SessionError;
    use crate::geolocation::{GeoCoordinates, GeolocationError};
    use crate::platform::testing::{MockFrame, MockPlatform, PlatformCall};
    use crate::platform::{AnchorId, HostEvent, UiState, ViewerPose};
    use foundation::math::{Mat4, Quat, Vec3, Viewport};
    use pretty_assertions::assert_eq;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn active_controller(config: ArConfig) -> (SessionController, MockPlatform) {
        let mut platform = MockPlatform::default();
        let mut controller = SessionController::new(config);
        controller.activate(&mut platform);
        controller.handle_event(HostEvent::SessionStarted, &mut platform);
        platform.calls.clear();
        (controller, platform)
    }

    /// 120 readings whose heading is `i * 0.001` rad; index 60 is 0.06 rad.
    fn feed_headings(controller: &mut SessionController, platform: &mut MockPlatform) {
        for i in 0..120 {
            let q = Quat::from_rotation_z(i as f64 * 0.001);
            controller.handle_event(HostEvent::OrientationReading(q), platform);
        }
    }

    fn feed_position(controller: &mut SessionController, platform: &mut MockPlatform) {
        controller.handle_event(
            HostEvent::GeolocationResolved(GeoCoordinates::new(45.2079, 19.7462)),
            platform,
        );
    }

    fn posed_frame() -> MockFrame {
        MockFrame {
            pose: Some(ViewerPose {
                world_from_view: Mat4::translation(Vec3::new(0.0, 1.6, 0.0)),
                projection: Mat4::perspective_rh_gl(1.0, 0.5, 0.1, 1000.0),
                viewport: Viewport::sized(1080.0, 2160.0),
            }),
            ..MockFrame::default()
        }
    }

    #[test]
    fn activation_requests_immersive_ar_once() {
        let mut platform = MockPlatform::default();
        let mut controller = SessionController::default();
        controller.activate(&mut platform);
        controller.activate(&mut platform);

        assert_eq!(controller.state(), SessionState::SessionRequested);
        assert_eq!(platform.calls.len(), 1);
        let PlatformCall::RequestSession(request) = &platform.calls[0] else {
            panic!("expected a session request, got {:?}", platform.calls);
        };
        assert_eq!(request.mode, "immersive-ar");
        assert!(request.required_features.iter().any(|f| f == "anchors"));
        assert_eq!(request.optional_features, vec!["bounded-floor".to_string()]);
    }

    #[test]
    fn session_failure_routes_to_unsupported() {
        let mut platform = MockPlatform::default();
        let mut controller = SessionController::default();
        controller.activate(&mut platform);
        controller.handle_event(
            HostEvent::SessionFailed(SessionError::SessionRequest("NotSupportedError".into())),
            &mut platform,
        );

        assert_eq!(controller.state(), SessionState::Unsupported);
        assert_eq!(
            platform.calls.last(),
            Some(&PlatformCall::SetUi(UiState::Unsupported))
        );

        // Terminal: no retry on a second click.
        controller.activate(&mut platform);
        assert_eq!(platform.count(&PlatformCall::SetUi(UiState::Unsupported)), 1);
        assert_eq!(controller.state(), SessionState::Unsupported);
    }

    #[test]
    fn missing_capability_routes_to_unsupported() {
        let mut platform = MockPlatform::default();
        let mut controller = SessionController::default();
        controller.handle_event(HostEvent::SupportChecked { supported: true }, &mut platform);
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(platform.calls.is_empty());

        controller.handle_event(HostEvent::SupportChecked { supported: false }, &mut platform);
        assert_eq!(controller.state(), SessionState::Unsupported);
        assert_eq!(platform.calls, vec![PlatformCall::SetUi(UiState::Unsupported)]);
    }

    #[test]
    fn session_start_wires_sensor_geolocation_and_frame_loop() {
        let mut platform = MockPlatform::default();
        let mut controller = SessionController::default();
        controller.activate(&mut platform);
        platform.calls.clear();
        controller.handle_event(HostEvent::SessionStarted, &mut platform);

        assert_eq!(controller.state(), SessionState::Active);
        assert_eq!(
            platform.calls,
            vec![
                PlatformCall::SetUi(UiState::ArActive),
                PlatformCall::StartSensor(SensorOptions::default()),
                PlatformCall::RequestGeolocation(GeolocationOptions::default()),
                PlatformCall::RequestAnimationFrame,
            ]
        );
        assert_eq!(controller.context().sampler.history().unwrap().len(), 0);
    }

    #[test]
    fn frames_reschedule_and_render_only_with_pose() {
        let (mut controller, mut platform) = active_controller(ArConfig::default());

        let mut no_pose = MockFrame::default();
        controller.on_frame(0.0, &mut platform, &mut no_pose);
        assert_eq!(no_pose.bound, 1);
        assert!(no_pose.rendered.is_empty());

        let mut frame = posed_frame();
        controller.on_frame(16.0, &mut platform, &mut frame);
        assert_eq!(frame.rendered.len(), 1);
        assert_eq!(frame.rendered[0].viewport, Viewport::sized(1080.0, 2160.0));
        assert_eq!(
            controller.context().camera.position(),
            Vec3::new(0.0, 1.6, 0.0)
        );

        assert_eq!(platform.count(&PlatformCall::RequestAnimationFrame), 2);
        let stats = controller.stats();
        assert_eq!((stats.frames, stats.rendered_frames), (2, 1));
    }

    #[test]
    fn placement_waits_for_heading_and_position() {
        let (mut controller, mut platform) = active_controller(ArConfig::default());
        let mut frame = posed_frame();

        // Evaluations at 0, 2000 and 4000 ms all lack inputs.
        for i in 0..50 {
            controller.on_frame(i as f64 * 100.0, &mut platform, &mut frame);
        }
        assert_eq!(controller.stats().placement_evaluations, 3);
        assert!(frame.anchor_requests.is_empty());

        feed_headings(&mut controller, &mut platform);
        for i in 50..61 {
            controller.on_frame(i as f64 * 100.0, &mut platform, &mut frame);
        }
        assert_eq!(controller.stats().placement_evaluations, 4);
        assert!(frame.anchor_requests.is_empty());

        feed_position(&mut controller, &mut platform);
        for i in 61..85 {
            controller.on_frame(i as f64 * 100.0, &mut platform, &mut frame);
        }
        assert_eq!(controller.stats().placement_evaluations, 5);
        assert_eq!(frame.anchor_requests.len(), 1);
        assert_eq!(frame.anchor_requests[0].pose, Mat4::IDENTITY);
    }

    #[test]
    fn anchor_success_places_compass_once() {
        let (mut controller, mut platform) = active_controller(ArConfig::default());
        feed_headings(&mut controller, &mut platform);
        feed_position(&mut controller, &mut platform);

        let mut frame = posed_frame();
        controller.on_frame(0.0, &mut platform, &mut frame);
        let id = frame.anchor_requests[0].id;

        // In-flight request blocks further evaluation.
        controller.on_frame(2500.0, &mut platform, &mut frame);
        assert_eq!(controller.stats().placement_evaluations, 1);

        controller.handle_event(HostEvent::AnchorCreated(id), &mut platform);
        let anchor = *controller.anchor().unwrap();
        assert_close(anchor.heading_rad, 0.06, 1e-9);

        let world = &controller.context().world;
        let yaw = world.transform(anchor.root).unwrap().yaw_rad;
        assert_close(yaw, -0.06, 1e-9);
        assert_eq!(world.children(anchor.root).len(), 5);

        frame.tracked.insert(id);
        for i in 1..100 {
            controller.on_frame(2500.0 + i as f64 * 1000.0, &mut platform, &mut frame);
        }
        assert_eq!(controller.stats().placement_evaluations, 1);
        assert_eq!(frame.anchor_requests.len(), 1);
        assert_eq!(controller.stats().anchor_requests, 1);
    }

    #[test]
    fn placed_boundary_is_closed_loop_around_viewer() {
        let (mut controller, mut platform) = active_controller(ArConfig::default());
        feed_headings(&mut controller, &mut platform);
        feed_position(&mut controller, &mut platform);

        let mut frame = posed_frame();
        controller.on_frame(0.0, &mut platform, &mut frame);
        let points = controller.context().pending.as_ref().unwrap().points.clone();
        assert_eq!(points.len(), 8);
        assert!(points[0].distance(points[7]) < 1e-6);
        assert!(points.iter().all(|p| p.y == -1.5));
        // The boundary is a few tens of meters from the viewer.
        assert!(points.iter().all(|p| p.length() < 100.0));
    }

    #[test]
    fn anchor_failure_reopens_gate_after_cooldown() {
        let (mut controller, mut platform) = active_controller(ArConfig::default());
        feed_headings(&mut controller, &mut platform);
        feed_position(&mut controller, &mut platform);

        let mut frame = posed_frame();
        controller.on_frame(100.0, &mut platform, &mut frame);
        let id = frame.anchor_requests[0].id;
        controller.handle_event(
            HostEvent::AnchorFailed {
                id,
                error: SessionError::AnchorCreation("tracking lost".into()),
            },
            &mut platform,
        );
        assert!(controller.anchor().is_none());
        assert!(controller.context().pending.is_none());

        controller.on_frame(2099.0, &mut platform, &mut frame);
        assert_eq!(frame.anchor_requests.len(), 1);
        controller.on_frame(2100.0, &mut platform, &mut frame);
        assert_eq!(frame.anchor_requests.len(), 2);
        assert_ne!(frame.anchor_requests[1].id, id);

        let stats = controller.stats();
        assert_eq!((stats.anchor_requests, stats.anchor_failures), (2, 1));
    }

    #[test]
    fn stale_anchor_results_are_ignored() {
        let (mut controller, mut platform) = active_controller(ArConfig::default());
        controller.handle_event(HostEvent::AnchorCreated(AnchorId(42)), &mut platform);
        assert!(controller.anchor().is_none());
        assert_eq!(controller.context().world.entity_count(), 0);
    }

    #[test]
    fn compass_visibility_follows_anchor_tracking() {
        let (mut controller, mut platform) = active_controller(ArConfig::default());
        feed_headings(&mut controller, &mut platform);
        feed_position(&mut controller, &mut platform);

        let mut frame = posed_frame();
        controller.on_frame(0.0, &mut platform, &mut frame);
        let id = frame.anchor_requests[0].id;
        controller.handle_event(HostEvent::AnchorCreated(id), &mut platform);
        let root = controller.anchor().unwrap().root;

        controller.on_frame(16.0, &mut platform, &mut frame);
        assert!(!controller.context().world.is_visible(root));
        assert!(!controller.anchor().unwrap().tracked);

        frame.tracked.insert(id);
        controller.on_frame(32.0, &mut platform, &mut frame);
        assert!(controller.context().world.is_visible(root));

        // Visible compass shows up in the next render pass.
        controller.on_frame(48.0, &mut platform, &mut frame);
        let last = frame.rendered.last().unwrap();
        assert_eq!(last.commands.len(), 5);
    }

    #[test]
    fn median_estimator_is_configurable() {
        let mut config = ArConfig::default();
        config.placement.heading_estimator = HeadingEstimator::Median;
        let (mut controller, mut platform) = active_controller(config);
        for h in [0.1, 0.4, 0.2] {
            controller.handle_event(
                HostEvent::OrientationReading(Quat::from_rotation_z(h)),
                &mut platform,
            );
        }
        feed_position(&mut controller, &mut platform);

        let mut frame = posed_frame();
        controller.on_frame(0.0, &mut platform, &mut frame);
        let pending = controller.context().pending.as_ref().unwrap();
        assert_close(pending.heading_rad, 0.2, 1e-9);
    }

    #[test]
    fn geolocation_failure_is_not_fatal() {
        let (mut controller, mut platform) = active_controller(ArConfig::default());
        controller.handle_event(
            HostEvent::GeolocationFailed(GeolocationError::from_code(1, "denied")),
            &mut platform,
        );
        assert_eq!(controller.state(), SessionState::Active);
        assert_eq!(controller.stats().geolocation_failures, 1);
        assert!(controller.context().geolocation.coordinates().is_none());
        // No retry.
        assert_eq!(
            platform.count(&PlatformCall::RequestGeolocation(GeolocationOptions::default())),
            0
        );
    }

    #[test]
    fn session_end_stops_sensor_and_frame_loop() {
        let (mut controller, mut platform) = active_controller(ArConfig::default());
        let mut frame = posed_frame();
        controller.on_frame(0.0, &mut platform, &mut frame);
        controller.handle_event(HostEvent::SessionEnded, &mut platform);

        assert_eq!(controller.state(), SessionState::Ended);
        assert_eq!(platform.count(&PlatformCall::StopSensor), 1);

        let before = platform.count(&PlatformCall::RequestAnimationFrame);
        controller.on_frame(16.0, &mut platform, &mut frame);
        assert_eq!(platform.count(&PlatformCall::RequestAnimationFrame), before);
        assert_eq!(controller.stats().frames, 1);
    }

    #[test]
    fn backwards_frame_time_is_skipped() {
        let (mut controller, mut platform) = active_controller(ArConfig::default());
        let mut frame = posed_frame();
        controller.on_frame(100.0, &mut platform, &mut frame);
        controller.on_frame(50.0, &mut platform, &mut frame);
        assert_eq!(controller.stats().frames, 1);
        assert_eq!(frame.rendered.len(), 1);
    }

    #[test]
    fn readings_are_counted() {
        let (mut controller, mut platform) = active_controller(ArConfig::default());
        feed_headings(&mut controller, &mut platform);
        feed_headings(&mut controller, &mut platform);
        assert_eq!(controller.stats().sensor_readings, 240);
        assert_eq!(controller.context().sampler.history().unwrap().len(), 120);
    }
}
