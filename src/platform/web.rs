//! Browser binding
//!
//! Mounts a [`RevealCard`] on a `<canvas>`: mouse/touch listeners feed the
//! card, a `requestAnimationFrame` loop drives its clock, and the overlay
//! raster is pushed with `putImageData`.
//!
//! Host callbacks never run while the card is borrowed, so they may call back
//! into the returned handle.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{
    CanvasRenderingContext2d, Event, HtmlCanvasElement, ImageData, MouseEvent, TouchEvent,
};

use crate::card::{MountProps, QueuedCelebration, RevealCard, RevealObserver};
use crate::settings::{Environment, Settings};
use crate::surface::{InputSource, PointerInput, SurfaceRect};

/// Distinguishes cards mounted within the same millisecond
static MOUNT_COUNT: AtomicU64 = AtomicU64::new(0);

type Listener = Closure<dyn FnMut(Event)>;

/// Calls the host's `onRevealed` on a fresh task, so the host may unmount
/// or remount from inside the callback. The pending timeout is shared with
/// [`WebCard`] so unmount can cancel it.
struct JsObserver {
    callback: js_sys::Function,
    pending: Rc<Cell<Option<i32>>>,
}

impl RevealObserver for JsObserver {
    fn on_revealed(&mut self) {
        let scheduled = web_sys::window().map(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(&self.callback, 0)
        });
        match scheduled {
            Some(Ok(handle)) => self.pending.set(Some(handle)),
            Some(Err(e)) => log::error!("Failed to schedule onRevealed: {:?}", e),
            None => log::error!("No window; onRevealed dropped"),
        }
    }
}

struct WebCard {
    card: RevealCard,
    canvas: HtmlCanvasElement,
    ctx: Option<CanvasRenderingContext2d>,
    /// Host `celebrate(intensity)`; bursts are queued and run after the borrow ends
    celebrate: Option<(js_sys::Function, QueuedCelebration)>,
    pending_notify: Rc<Cell<Option<i32>>>,
    drawn_revision: Option<u64>,
    drawn_opacity: f32,
    confetti_drawn: bool,
    frame_handle: Option<i32>,
}

impl WebCard {
    /// Refresh the surface placement from layout (scrolling moves it)
    fn sync_rect(&mut self) {
        let rect = self.canvas.get_bounding_client_rect();
        self.card.set_surface_rect(SurfaceRect::new(
            rect.left() as f32,
            rect.top() as f32,
            rect.width() as f32,
            rect.height() as f32,
        ));
    }

    fn input(&mut self, input: PointerInput) {
        if matches!(input, PointerInput::Down { .. }) {
            self.sync_rect();
        }
        self.card.handle_input(input);
    }

    /// Upload the raster if it changed, draw built-in confetti, apply the fade opacity
    fn present(&mut self) {
        let confetti = self.celebrate.is_none() && self.card.confetti().is_active();
        // The cleared canvas doubles as the confetti layer
        let opacity = if confetti {
            1.0
        } else {
            self.card.progress().overlay_opacity
        };
        if (opacity - self.drawn_opacity).abs() > f32::EPSILON {
            let _ = self
                .canvas
                .style()
                .set_property("opacity", &format!("{:.3}", opacity));
            self.drawn_opacity = opacity;
        }

        let (Some(ctx), Some(raster)) = (self.ctx.as_ref(), self.card.surface().raster()) else {
            return;
        };
        let stale = self.drawn_revision != Some(raster.revision());
        if !stale && !confetti && !self.confetti_drawn {
            return;
        }

        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(raster.as_bytes()),
            raster.width(),
            raster.height(),
        );
        match image.and_then(|image| ctx.put_image_data(&image, 0.0, 0.0)) {
            Ok(()) => self.drawn_revision = Some(raster.revision()),
            Err(e) => log::warn!("putImageData failed: {:?}", e),
        }

        if confetti {
            let scale = self.card.surface().pixel_ratio() as f64;
            for p in self.card.confetti().particles() {
                // Spin shown as a width flip
                let w = p.size * p.angle.cos().abs().max(0.2);
                ctx.set_global_alpha(p.life.clamp(0.0, 1.0) as f64);
                ctx.set_fill_style_str(&format!("rgb({},{},{})", p.color.r, p.color.g, p.color.b));
                ctx.fill_rect(
                    (p.pos.x - w / 2.0) as f64 * scale,
                    (p.pos.y - p.size / 2.0) as f64 * scale,
                    w as f64 * scale,
                    p.size as f64 * scale,
                );
            }
            ctx.set_global_alpha(1.0);
        }
        self.confetti_drawn = confetti;
    }

    /// Stop frames and cancel the pending host notification
    fn shutdown(&mut self) {
        self.card.unmount();
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(handle) = self.frame_handle.take() {
            let _ = window.cancel_animation_frame(handle);
        }
        if let Some(handle) = self.pending_notify.take() {
            window.clear_timeout_with_handle(handle);
        }
    }
}

/// Handle returned to JS
#[wasm_bindgen]
pub struct ScratchCardHandle {
    inner: Rc<RefCell<WebCard>>,
    listeners: Vec<(&'static str, Listener)>,
}

#[wasm_bindgen]
impl ScratchCardHandle {
    /// Press the reveal/skip control
    pub fn skip(&self) -> bool {
        self.inner.borrow_mut().card.skip()
    }

    #[wasm_bindgen(js_name = skipVisible)]
    pub fn skip_visible(&self) -> bool {
        self.inner.borrow().card.skip_visible()
    }

    /// Last sampled erased fraction
    pub fn progress(&self) -> f32 {
        self.inner.borrow().card.progress().erased_fraction
    }

    /// Stop the frame loop and all pending timers, and detach the listeners
    pub fn unmount(&mut self) {
        self.inner.borrow_mut().shutdown();

        let canvas = self.inner.borrow().canvas.clone();
        for (name, listener) in self.listeners.drain(..) {
            let _ = canvas.remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
    }
}

impl Drop for ScratchCardHandle {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Mount a scratch card on the canvas with id `canvas_id`.
///
/// `props_json` is `{"prizeResult": {...} | null, "geometry": {"width", "height"}}`.
/// Without `celebrate`, winning cards shower the built-in confetti over the canvas.
#[wasm_bindgen(js_name = mountScratchCard)]
pub fn mount_scratch_card(
    canvas_id: &str,
    props_json: &str,
    on_revealed: js_sys::Function,
    celebrate: Option<js_sys::Function>,
) -> Result<ScratchCardHandle, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas: HtmlCanvasElement = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| JsValue::from_str("canvas not found"))?
        .dyn_into()?;

    let props: MountProps = serde_json::from_str(props_json)
        .map_err(|e| JsValue::from_str(&format!("invalid props: {}", e)))?;
    let settings = Settings::load();

    // A missing 2D context is a capability failure, not a mount failure
    let ctx = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
    let environment = Environment {
        device_pixel_ratio: window.device_pixel_ratio() as f32,
        viewport_width: window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(1024.0) as f32,
        raster_supported: ctx.is_some(),
        seed: js_sys::Date::now() as u64 ^ MOUNT_COUNT.fetch_add(1, Ordering::Relaxed).rotate_left(32),
    };

    let geometry = props.geometry;
    let pending_notify = Rc::new(Cell::new(None));
    let observer = JsObserver {
        callback: on_revealed,
        pending: pending_notify.clone(),
    };
    let mut card = RevealCard::mount(props, environment, &settings, Box::new(observer));
    let celebrate = celebrate.map(|f| (f, QueuedCelebration::new()));
    if let Some((_, queue)) = &celebrate {
        card = card.with_celebration(Box::new(queue.clone()));
    }

    // Raster at device resolution, displayed at logical size
    if let Some(raster) = card.surface().raster() {
        canvas.set_width(raster.width());
        canvas.set_height(raster.height());
    }
    let style = canvas.style();
    let _ = style.set_property("width", &format!("{}px", geometry.width));
    let _ = style.set_property("height", &format!("{}px", geometry.height));
    let _ = style.set_property("touch-action", "none");

    let web = Rc::new(RefCell::new(WebCard {
        card,
        canvas: canvas.clone(),
        ctx,
        celebrate,
        pending_notify,
        drawn_revision: None,
        drawn_opacity: 1.0,
        confetti_drawn: false,
        frame_handle: None,
    }));
    web.borrow_mut().sync_rect();

    let listeners = setup_input_handlers(&canvas, &web);
    request_animation_frame(Rc::downgrade(&web));

    log::info!("Scratch card mounted on #{}", canvas_id);
    Ok(ScratchCardHandle {
        inner: web,
        listeners,
    })
}

fn setup_input_handlers(
    canvas: &HtmlCanvasElement,
    web: &Rc<RefCell<WebCard>>,
) -> Vec<(&'static str, Listener)> {
    fn listen(
        canvas: &HtmlCanvasElement,
        web: &Rc<RefCell<WebCard>>,
        name: &'static str,
        map: fn(&Event) -> Option<PointerInput>,
    ) -> (&'static str, Listener) {
        let web = Rc::downgrade(web);
        let closure = Closure::<dyn FnMut(_)>::new(move |event: Event| {
            if event.is_instance_of::<TouchEvent>() {
                event.prevent_default();
            }
            if let (Some(input), Some(web)) = (map(&event), web.upgrade()) {
                web.borrow_mut().input(input);
            }
        });
        if let Err(e) = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref()) {
            log::warn!("Failed to listen for {}: {:?}", name, e);
        }
        (name, closure)
    }

    fn client(event: &Event) -> Option<(f32, f32)> {
        if let Some(e) = event.dyn_ref::<MouseEvent>() {
            return Some((e.client_x() as f32, e.client_y() as f32));
        }
        event
            .dyn_ref::<TouchEvent>()?
            .touches()
            .get(0)
            .map(|t| (t.client_x() as f32, t.client_y() as f32))
    }

    vec![
        listen(canvas, web, "mousedown", |e| {
            client(e).map(|(x, y)| PointerInput::down(InputSource::Mouse, x, y))
        }),
        listen(canvas, web, "mousemove", |e| {
            client(e).map(|(x, y)| PointerInput::moved(InputSource::Mouse, x, y))
        }),
        listen(canvas, web, "mouseup", |_| Some(PointerInput::up(InputSource::Mouse))),
        listen(canvas, web, "mouseleave", |_| Some(PointerInput::Cancel)),
        listen(canvas, web, "touchstart", |e| {
            client(e).map(|(x, y)| PointerInput::down(InputSource::Touch, x, y))
        }),
        listen(canvas, web, "touchmove", |e| {
            client(e).map(|(x, y)| PointerInput::moved(InputSource::Touch, x, y))
        }),
        listen(canvas, web, "touchend", |_| Some(PointerInput::up(InputSource::Touch))),
        listen(canvas, web, "touchcancel", |_| Some(PointerInput::Cancel)),
    ]
}

/// Schedule the next frame. The callback only holds a weak reference, so a
/// dropped handle releases the card.
fn request_animation_frame(web: Weak<RefCell<WebCard>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let handle_slot = web.clone();
    let callback = Closure::once_into_js(move |time: f64| {
        frame_loop(web, time);
    });
    match window.request_animation_frame(callback.unchecked_ref()) {
        Ok(handle) => {
            if let Some(web) = handle_slot.upgrade() {
                web.borrow_mut().frame_handle = Some(handle);
            }
        }
        Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
    }
}

fn frame_loop(web: Weak<RefCell<WebCard>>, time: f64) {
    let Some(strong) = web.upgrade() else {
        return;
    };
    let bursts = {
        let mut w = strong.borrow_mut();
        w.frame_handle = None;
        w.card.frame(time);
        w.present();
        w.celebrate
            .as_ref()
            .map(|(f, queue)| (f.clone(), queue.take()))
    };
    drop(strong);

    // Card released: the effect may call back into the handle
    if let Some((celebrate, intensities)) = bursts {
        for intensity in intensities {
            match celebrate.call1(&JsValue::NULL, &JsValue::from_f64(intensity as f64)) {
                Ok(_) => log::info!("Host celebration ran (intensity {:.2})", intensity),
                Err(e) => log::warn!("Celebration failed, continuing reveal: {:?}", e),
            }
        }
    }

    // Re-checked: the effect may have unmounted the card
    let mounted = web.upgrade().is_some_and(|w| w.borrow().card.is_mounted());
    if mounted {
        request_animation_frame(web);
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("logger init failed: {}", e)));
    }
    log::info!("Scratch reveal engine loaded");
}
