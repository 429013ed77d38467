use std::cell::RefCell;

use console_error_panic_hook::set_once;
use foundation::math::{Vec3, Viewport};
use runtime::TaskQueue;
use session::{AnchorId, ArConfig, HostEvent, SessionController, SessionState};
use tracing::{debug, error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, XrFrame, XrSession};

use crate::logging;
use crate::ui::ENTER_BUTTON_ID;
use crate::xr::{BrowserFrame, BrowserHost, XrAnchor, XrResources, immersive_ar_supported};

/// Host callbacks are queued here and applied in arrival order.
const MAX_PENDING_EVENTS: usize = 4096;

pub(crate) enum AppEvent {
    Host(HostEvent),
    SessionReady(Box<XrResources>),
    AnchorReady(AnchorId, XrAnchor),
}

struct App {
    controller: SessionController,
    host: BrowserHost,
    xr: Option<XrResources>,
}

thread_local! {
    static STATE: RefCell<Option<App>> = const { RefCell::new(None) };
    static QUEUE: RefCell<TaskQueue<AppEvent>> =
        RefCell::new(TaskQueue::with_max_len(MAX_PENDING_EVENTS));
    static FRAME_CALLBACK: RefCell<Option<Closure<dyn FnMut(f64, XrFrame)>>> =
        const { RefCell::new(None) };
    static ENTER_CALLBACK: RefCell<Option<Closure<dyn FnMut(Event)>>> =
        const { RefCell::new(None) };
}

/// Queues `event` and pumps. Events raised while the app is borrowed, such
/// as a synchronous `AnchorFailed` from inside `on_frame`, stay queued and
/// are applied at the start of the next frame.
pub(crate) fn dispatch(event: AppEvent) {
    let pushed = QUEUE.with(|q| q.borrow_mut().try_push(event));
    if let Err(full) = pushed {
        warn!(max_len = full.max_len, "host event queue full; event dropped");
    }
    pump();
}

pub(crate) fn dispatch_host(event: HostEvent) {
    dispatch(AppEvent::Host(event));
}

/// Applies queued events unless the app is already borrowed further up the
/// stack; in that case they wait for the next pump.
fn pump() {
    STATE.with(|state| {
        let Ok(mut state) = state.try_borrow_mut() else {
            return;
        };
        let Some(app) = state.as_mut() else {
            return;
        };
        while let Some((_, event)) = QUEUE.with(|q| q.borrow_mut().pop_next()) {
            app.apply(event);
        }
    });
}

impl App {
    fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::Host(HostEvent::SessionEnded) => {
                self.controller
                    .handle_event(HostEvent::SessionEnded, &mut self.host);
                self.host.detach();
                self.xr = None;
            }
            AppEvent::Host(event) => self.controller.handle_event(event, &mut self.host),
            AppEvent::SessionReady(mut resources) => {
                let on_end = resources.on_end.take();
                self.host.attach(resources.session.clone(), on_end);
                self.xr = Some(*resources);
                self.controller
                    .handle_event(HostEvent::SessionStarted, &mut self.host);
            }
            AppEvent::AnchorReady(id, anchor) => match self.xr.as_mut() {
                Some(xr) => {
                    xr.insert_anchor(id, anchor);
                    self.controller
                        .handle_event(HostEvent::AnchorCreated(id), &mut self.host);
                }
                None => debug!(anchor = id.0, "anchor resolved after session end"),
            },
        }
    }

    fn on_frame(&mut self, time_ms: f64, frame: &XrFrame) {
        let Some(xr) = self.xr.as_mut() else {
            return;
        };
        let mut access = BrowserFrame::new(frame, xr);
        self.controller.on_frame(time_ms, &mut self.host, &mut access);
    }
}

pub(crate) fn schedule_frame(session: &XrSession) {
    FRAME_CALLBACK.with(|cb| match cb.borrow().as_ref() {
        Some(callback) => {
            session.request_animation_frame(callback.as_ref().unchecked_ref());
        }
        None => error!("frame callback not installed"),
    });
}

fn on_xr_frame(time_ms: f64, frame: XrFrame) {
    pump();
    STATE.with(|state| match state.try_borrow_mut() {
        Ok(mut state) => {
            if let Some(app) = state.as_mut() {
                app.on_frame(time_ms, &frame);
            }
        }
        Err(_) => warn!("frame callback re-entered; frame skipped"),
    });
}

fn install_enter_button(document: &web_sys::Document) -> Result<(), JsValue> {
    let Some(button) = document.get_element_by_id(ENTER_BUTTON_ID) else {
        warn!(id = ENTER_BUTTON_ID, "enter button not found; call activate_xr() directly");
        return Ok(());
    };
    let on_click = Closure::<dyn FnMut(Event)>::new(|_event: Event| {
        if let Err(err) = activate_xr() {
            error!(error = ?err, "activation failed");
        }
    });
    button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    ENTER_CALLBACK.with(|cb| *cb.borrow_mut() = Some(on_click));
    Ok(())
}

fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Result<R, JsValue> {
    STATE.with(|state| {
        let mut state = state
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("app busy"))?;
        let app = state
            .as_mut()
            .ok_or_else(|| JsValue::from_str("app not started"))?;
        Ok(f(app))
    })
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    logging::init(logging::DEFAULT_FILTER);

    let document = web_sys::window().and_then(|w| w.document());
    STATE.with(|state| {
        *state.borrow_mut() = Some(App {
            controller: SessionController::default(),
            host: BrowserHost::new(document.clone()),
            xr: None,
        });
    });
    FRAME_CALLBACK.with(|cb| {
        *cb.borrow_mut() = Some(Closure::<dyn FnMut(f64, XrFrame)>::new(on_xr_frame));
    });
    if let Some(document) = &document {
        install_enter_button(document)?;
    }

    spawn_local(async {
        let supported = immersive_ar_supported().await;
        dispatch_host(HostEvent::SupportChecked { supported });
    });
    info!("compass ready");
    Ok(())
}

/// Requests the AR session. Bound to the enter button, callable from JS.
#[wasm_bindgen]
pub fn activate_xr() -> Result<(), JsValue> {
    with_app(|app| app.controller.activate(&mut app.host))
}

/// Replaces the configuration. Only allowed before activation.
#[wasm_bindgen]
pub fn configure(json: &str) -> Result<(), JsValue> {
    let config = ArConfig::from_json(json).map_err(|err| JsValue::from_str(&err.to_string()))?;
    with_app(|app| {
        if app.controller.state() != SessionState::Idle {
            return Err(JsValue::from_str("configure must be called before activation"));
        }
        info!(?config, "configuration applied");
        app.controller = SessionController::new(config);
        Ok(())
    })?
}

/// Projects a local point to pixels against the current window size.
#[wasm_bindgen]
pub fn to_screen_position(x: f64, y: f64, z: f64) -> Result<Vec<f64>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let width = window.inner_width()?.as_f64().unwrap_or(0.0);
    let height = window.inner_height()?.as_f64().unwrap_or(0.0);
    with_app(|app| {
        let p = app
            .controller
            .context()
            .camera
            .to_screen_position(Vec3::new(x, y, z), Viewport::sized(width, height));
        vec![p.x, p.y, p.z]
    })
}

/// Session counters as JSON.
#[wasm_bindgen]
pub fn session_stats() -> Result<String, JsValue> {
    let stats = with_app(|app| app.controller.stats())?;
    serde_json::to_string(&stats).map_err(|err| JsValue::from_str(&err.to_string()))
}
