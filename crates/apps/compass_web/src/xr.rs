//! WebXR implementations of the session platform traits.

use std::collections::HashMap;

use foundation::math::{Mat4, Viewport};
use gpu::RenderFrame;
use js_sys::{Array, Object, Promise, Reflect};
use session::config::{GeolocationOptions, SensorOptions};
use session::{
    AnchorId, AnchorRequest, HostEvent, SessionError, SessionRequest, UiState, ViewerPose,
    XrFrameAccess, XrPlatform,
};
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Document, DomPointInit, Event, HtmlCanvasElement, WebGlRenderingContext as Gl, XrFrame,
    XrReferenceSpace, XrReferenceSpaceType, XrRenderStateInit, XrRigidTransform, XrSession,
    XrSessionInit, XrSessionMode, XrSpace, XrView, XrWebGlLayer,
};

use crate::app::{AppEvent, dispatch, dispatch_host, schedule_frame};
use crate::geolocation::request_position;
use crate::sensor::{OrientationSensor, js_message};
use crate::ui;
use crate::webgl::WebGlRenderer;

#[wasm_bindgen]
extern "C" {
    /// `XRFrame` as seen by the anchors module.
    #[wasm_bindgen(js_name = XRFrame)]
    type AnchorFrame;

    #[wasm_bindgen(method, catch, js_name = createAnchor)]
    fn create_anchor(
        this: &AnchorFrame,
        pose: &XrRigidTransform,
        space: &XrSpace,
    ) -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_name = XRAnchor)]
    #[derive(Debug, Clone)]
    pub type XrAnchor;

    #[wasm_bindgen(method, getter, js_name = anchorSpace)]
    fn anchor_space(this: &XrAnchor) -> XrSpace;

    #[wasm_bindgen(method)]
    fn delete(this: &XrAnchor);
}

/// Asks the user agent whether `immersive-ar` sessions can be created.
pub async fn immersive_ar_supported() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let navigator = window.navigator();
    if !Reflect::has(&navigator, &JsValue::from_str("xr")).unwrap_or(false) {
        return false;
    }
    let promise = navigator.xr().is_session_supported(XrSessionMode::ImmersiveAr);
    match JsFuture::from(promise).await {
        Ok(value) => value.as_bool().unwrap_or(false),
        Err(err) => {
            warn!(error = %js_message(&err), "isSessionSupported rejected");
            false
        }
    }
}

/// Everything a running session draws with and resolves poses against.
pub struct XrResources {
    pub session: XrSession,
    layer: XrWebGlLayer,
    local_floor: XrReferenceSpace,
    renderer: WebGlRenderer,
    anchors: HashMap<AnchorId, XrAnchor>,
    /// Handed to [`BrowserHost`] when the session is attached.
    pub on_end: Option<Closure<dyn FnMut(Event)>>,
}

impl XrResources {
    pub fn insert_anchor(&mut self, id: AnchorId, anchor: XrAnchor) {
        self.anchors.insert(id, anchor);
    }
}

impl Drop for XrResources {
    fn drop(&mut self) {
        for anchor in self.anchors.values() {
            anchor.delete();
        }
    }
}

fn string_array(values: &[String]) -> Array {
    values.iter().map(|v| JsValue::from_str(v)).collect()
}

async fn reference_space(
    session: &XrSession,
    kind: XrReferenceSpaceType,
    name: &'static str,
) -> Result<XrReferenceSpace, SessionError> {
    JsFuture::from(session.request_reference_space(kind))
        .await
        .map(|space| space.unchecked_into())
        .map_err(|err| SessionError::ReferenceSpace {
            space: name,
            reason: js_message(&err),
        })
}

/// Requests the session, builds an XR-compatible WebGL surface for it and
/// acquires the `local-floor` and `viewer` reference spaces.
pub async fn start_session(request: SessionRequest) -> Result<XrResources, SessionError> {
    let request_error = |err: JsValue| SessionError::SessionRequest(js_message(&err));
    let window = web_sys::window().ok_or(SessionError::Unsupported)?;
    let document = window
        .document()
        .ok_or_else(|| SessionError::SessionRequest("no document".into()))?;
    let mode = XrSessionMode::from_js_value(&JsValue::from_str(&request.mode))
        .ok_or_else(|| SessionError::SessionRequest(format!("unknown mode {}", request.mode)))?;

    let init = XrSessionInit::new();
    init.set_required_features(&string_array(&request.required_features));
    init.set_optional_features(&string_array(&request.optional_features));
    if request.dom_overlay
        && let Some(body) = document.body()
    {
        let overlay = Object::new();
        Reflect::set(&overlay, &JsValue::from_str("root"), &body).map_err(request_error)?;
        Reflect::set(&init, &JsValue::from_str("domOverlay"), &overlay).map_err(request_error)?;
    }

    let session: XrSession =
        JsFuture::from(window.navigator().xr().request_session_with_options(mode, &init))
            .await
            .map_err(request_error)?
            .unchecked_into();

    match build_resources(session.clone(), &document).await {
        Ok(resources) => {
            info!(mode = %request.mode, "XR session created");
            Ok(resources)
        }
        Err(err) => {
            // The session itself exists; end it so the device leaves AR.
            let ended = JsFuture::from(session.end());
            spawn_local(async move {
                if let Err(end_err) = ended.await {
                    warn!(
                        error = %js_message(&end_err),
                        "could not end half-initialised session"
                    );
                }
            });
            Err(err)
        }
    }
}

async fn build_resources(
    session: XrSession,
    document: &Document,
) -> Result<XrResources, SessionError> {
    let surface_error = |err: JsValue| SessionError::RenderSurface(js_message(&err));
    let canvas: HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(surface_error)?
        .dyn_into()
        .map_err(|_| SessionError::RenderSurface("canvas element expected".into()))?;
    if let Some(body) = document.body() {
        body.append_child(&canvas).map_err(surface_error)?;
    }
    let resources = attach_surface(session, &canvas).await;
    if resources.is_err() {
        canvas.remove();
    }
    resources
}

async fn attach_surface(
    session: XrSession,
    canvas: &HtmlCanvasElement,
) -> Result<XrResources, SessionError> {
    let surface_error = |err: JsValue| SessionError::RenderSurface(js_message(&err));
    let context_options = Object::new();
    Reflect::set(
        &context_options,
        &JsValue::from_str("xrCompatible"),
        &JsValue::TRUE,
    )
    .map_err(surface_error)?;
    let gl: Gl = canvas
        .get_context_with_context_options("webgl", &context_options)
        .map_err(surface_error)?
        .ok_or_else(|| SessionError::RenderSurface("webgl unavailable".into()))?
        .dyn_into()
        .map_err(|_| SessionError::RenderSurface("webgl context expected".into()))?;

    let layer = XrWebGlLayer::new_with_web_gl_rendering_context(&session, &gl)
        .map_err(surface_error)?;
    let render_state = XrRenderStateInit::new();
    render_state.set_base_layer(Some(&layer));
    session.update_render_state_with_state(&render_state);
    let renderer = WebGlRenderer::new(gl).map_err(surface_error)?;

    let local_floor =
        reference_space(&session, XrReferenceSpaceType::LocalFloor, "local-floor").await?;
    // Not used for drawing; requesting it fails early on runtimes without it.
    reference_space(&session, XrReferenceSpaceType::Viewer, "viewer").await?;

    let on_end = Closure::<dyn FnMut(Event)>::new(|_event: Event| {
        dispatch_host(HostEvent::SessionEnded);
    });
    session.set_onend(Some(on_end.as_ref().unchecked_ref()));

    Ok(XrResources {
        session,
        layer,
        local_floor,
        renderer,
        anchors: HashMap::new(),
        on_end: Some(on_end),
    })
}

/// Page-level side of the platform: session lifetime, sensor, position, DOM.
#[derive(Default)]
pub struct BrowserHost {
    document: Option<Document>,
    session: Option<XrSession>,
    sensor: Option<OrientationSensor>,
    _on_end: Option<Closure<dyn FnMut(Event)>>,
}

impl BrowserHost {
    pub fn new(document: Option<Document>) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }

    pub fn attach(&mut self, session: XrSession, on_end: Option<Closure<dyn FnMut(Event)>>) {
        self.session = Some(session);
        self._on_end = on_end;
    }

    pub fn detach(&mut self) {
        self.session = None;
    }
}

impl XrPlatform for BrowserHost {
    fn request_session(&mut self, request: &SessionRequest) {
        let request = request.clone();
        spawn_local(async move {
            match start_session(request).await {
                Ok(resources) => dispatch(AppEvent::SessionReady(Box::new(resources))),
                Err(err) => dispatch_host(HostEvent::SessionFailed(err)),
            }
        });
    }

    fn start_orientation_sensor(&mut self, options: &SensorOptions) -> Result<(), SessionError> {
        let sensor = OrientationSensor::start(options, |q| {
            dispatch_host(HostEvent::OrientationReading(q));
        })?;
        self.sensor = Some(sensor);
        Ok(())
    }

    fn stop_orientation_sensor(&mut self) {
        self.sensor = None;
    }

    fn request_geolocation(&mut self, options: &GeolocationOptions) {
        request_position(options, dispatch_host);
    }

    fn request_animation_frame(&mut self) {
        match &self.session {
            Some(session) => schedule_frame(session),
            None => debug!("no session to schedule a frame on"),
        }
    }

    fn set_ui_state(&mut self, state: UiState) {
        let Some(document) = &self.document else {
            return;
        };
        if let Err(err) = ui::apply(document, state) {
            warn!(error = %js_message(&err), class = state.css_class(), "could not update body class");
        }
    }
}

/// Per-frame view of the session; only valid inside the frame callback.
pub struct BrowserFrame<'a> {
    frame: &'a XrFrame,
    xr: &'a mut XrResources,
}

impl<'a> BrowserFrame<'a> {
    pub fn new(frame: &'a XrFrame, xr: &'a mut XrResources) -> Self {
        Self { frame, xr }
    }

    fn anchor_pose(&self, pose: &Mat4) -> Result<XrRigidTransform, JsValue> {
        // Anchors are placed upright; only the translation is carried over.
        let [x, y, z, _] = pose.cols[3];
        let position = DomPointInit::new();
        position.set_x(x);
        position.set_y(y);
        position.set_z(z);
        position.set_w(1.0);
        XrRigidTransform::new_with_position(&position)
    }
}

impl XrFrameAccess for BrowserFrame<'_> {
    fn bind_output(&mut self) {
        let framebuffer = self.xr.layer.framebuffer();
        self.xr
            .renderer
            .gl()
            .bind_framebuffer(Gl::FRAMEBUFFER, framebuffer.as_ref());
    }

    fn viewer_pose(&self) -> Option<ViewerPose> {
        let pose = self.frame.get_viewer_pose(&self.xr.local_floor)?;
        let view: XrView = pose.views().get(0).dyn_into().ok()?;
        let world_from_view = Mat4::from_col_major(&view.transform().matrix())?;
        let projection = Mat4::from_col_major(&view.projection_matrix())?;
        let vp = self.xr.layer.get_viewport(&view)?;
        Some(ViewerPose {
            world_from_view,
            projection,
            viewport: Viewport::new(
                f64::from(vp.x()),
                f64::from(vp.y()),
                f64::from(vp.width()),
                f64::from(vp.height()),
            ),
        })
    }

    fn anchor_tracked(&self, anchor: AnchorId) -> bool {
        self.xr.anchors.get(&anchor).is_some_and(|a| {
            self.frame
                .get_pose(&a.anchor_space(), &self.xr.local_floor)
                .is_some()
        })
    }

    fn create_anchor(&mut self, request: AnchorRequest) {
        let id = request.id;
        let promise = self.anchor_pose(&request.pose).and_then(|pose| {
            self.frame
                .unchecked_ref::<AnchorFrame>()
                .create_anchor(&pose, &self.xr.local_floor)
        });
        let promise = match promise {
            Ok(promise) => promise,
            Err(err) => {
                dispatch_host(HostEvent::AnchorFailed {
                    id,
                    error: SessionError::AnchorCreation(js_message(&err)),
                });
                return;
            }
        };
        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(anchor) => dispatch(AppEvent::AnchorReady(id, anchor.unchecked_into())),
                Err(err) => dispatch_host(HostEvent::AnchorFailed {
                    id,
                    error: SessionError::AnchorCreation(js_message(&err)),
                }),
            }
        });
    }

    fn render(&mut self, frame: &RenderFrame) {
        self.xr.renderer.draw(frame);
    }
}
