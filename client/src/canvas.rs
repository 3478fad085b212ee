use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};

use parcelmap_core::{
    CellBuffer, Effect as InputEffect, InteractionController, PointerInput, TimerToken, Viewport,
    pick,
};

use crate::app::{
    BaseGen, HoverTooltip, MapStore, OverlayGen, TooltipInfo, open_parcel_record, tooltip_lines,
};
use crate::render_loop::RenderScheduler;

const BACKGROUND: &str = "#0c0e17";
/// Pointer movement under this many pixels between down and up still counts
/// as a click rather than a drag.
const CLICK_DRAG_TOLERANCE_PX: f64 = 5.0;

struct ResizeBinding {
    window: web_sys::Window,
    _handler: wasm_bindgen::closure::Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

/// One-pixel-per-cell rasters blitted under the viewport transform. The base
/// raster changes only when a data load completes; the glow raster only when
/// a highlight query resolves.
struct RasterLayers {
    base: HtmlCanvasElement,
    glow: HtmlCanvasElement,
}

fn raster_canvas(cols: u32, rows: u32) -> Option<HtmlCanvasElement> {
    let document = web_sys::window()?.document()?;
    let canvas = document
        .create_element("canvas")
        .ok()?
        .dyn_into::<HtmlCanvasElement>()
        .ok()?;
    canvas.set_width(cols);
    canvas.set_height(rows);
    Some(canvas)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
}

fn paint_base_raster(canvas: &HtmlCanvasElement, cells: &CellBuffer) -> Result<(), JsValue> {
    let cols = cells.geometry().cols;
    let mut buf = vec![0u8; cells.len() * 4];
    for slot in 0..cells.len() {
        let c = cells.base_color(slot);
        let off = slot * 4;
        buf[off] = c.r;
        buf[off + 1] = c.g;
        buf[off + 2] = c.b;
        buf[off + 3] = 255;
    }
    blit_pixels(canvas, &buf, cols)
}

/// Glow layer: lit cells get their overlay color, everything else stays
/// fully transparent so the additive composite is a no-op there.
fn paint_glow_raster(canvas: &HtmlCanvasElement, cells: &CellBuffer) -> Result<(), JsValue> {
    let cols = cells.geometry().cols;
    let mut buf = vec![0u8; cells.len() * 4];
    for slot in 0..cells.len() {
        if let Some(c) = cells.overlay(slot) {
            let off = slot * 4;
            buf[off] = c.r;
            buf[off + 1] = c.g;
            buf[off + 2] = c.b;
            buf[off + 3] = 255;
        }
    }
    blit_pixels(canvas, &buf, cols)
}

fn blit_pixels(canvas: &HtmlCanvasElement, buf: &[u8], cols: u32) -> Result<(), JsValue> {
    let image = web_sys::ImageData::new_with_u8_clamped_array(wasm_bindgen::Clamped(buf), cols)?;
    let ctx = context_2d(canvas).ok_or_else(|| JsValue::from_str("no 2d context"))?;
    ctx.put_image_data(&image, 0.0, 0.0)
}

/// Resolve a pointer position (client coordinates) to the slot of a listed
/// parcel, or `None` over bare lattice or off the grid entirely.
fn pick_parcel(
    store: &MapStore,
    viewport: &Viewport,
    canvas_ref: NodeRef<leptos::html::Canvas>,
    client_x: f64,
    client_y: f64,
) -> Option<usize> {
    let canvas = canvas_ref.get_untracked()?;
    let rect = canvas.get_bounding_client_rect();
    let local_x = client_x - rect.left();
    let local_y = client_y - rect.top();

    let guard = store.0.borrow();
    let state = guard.as_ref()?;
    let slot = pick(local_x, local_y, viewport, state.cells.geometry())?;
    state.cells.parcel_at_slot(slot).map(|_| slot)
}

/// Bridges the pointer state machine to the DOM: runs its effects, owns the
/// single pending long-press timer.
struct InteractionHost {
    controller: RefCell<InteractionController>,
    pending_timer: RefCell<Option<(TimerToken, Timeout)>>,
    store: MapStore,
    tooltip: RwSignal<Option<TooltipInfo>>,
}

impl InteractionHost {
    fn new(store: MapStore, tooltip: RwSignal<Option<TooltipInfo>>) -> Rc<Self> {
        Rc::new(Self {
            controller: RefCell::new(InteractionController::new()),
            pending_timer: RefCell::new(None),
            store,
            tooltip,
        })
    }

    fn dispatch(self: &Rc<Self>, input: PointerInput) {
        if let PointerInput::LongPressFired(token) = input {
            // The firing timer is spent; drop our handle to it.
            let mut pending = self.pending_timer.borrow_mut();
            if pending.as_ref().is_some_and(|(t, _)| *t == token) {
                pending.take();
            }
        }

        let effects = self.controller.borrow_mut().handle(input);
        for effect in effects {
            match effect {
                InputEffect::ShowTooltip { slot, x, y } => {
                    let guard = self.store.0.borrow();
                    if let Some(state) = guard.as_ref()
                        && let Some(lines) = tooltip_lines(state, slot)
                    {
                        self.tooltip.set(Some(TooltipInfo { lines, x, y }));
                    }
                }
                InputEffect::HideTooltip => {
                    if self.tooltip.get_untracked().is_some() {
                        self.tooltip.set(None);
                    }
                }
                InputEffect::Navigate { slot } => {
                    let guard = self.store.0.borrow();
                    if let Some(state) = guard.as_ref() {
                        open_parcel_record(state, slot);
                    }
                }
                InputEffect::ArmTimer { token, duration_ms } => {
                    let host = Rc::clone(self);
                    let timeout = Timeout::new(duration_ms, move || {
                        host.dispatch(PointerInput::LongPressFired(token));
                    });
                    if let Some((_, old)) = self.pending_timer.borrow_mut().replace((token, timeout))
                    {
                        old.cancel();
                    }
                }
                InputEffect::CancelTimer { token } => {
                    let mut pending = self.pending_timer.borrow_mut();
                    if pending.as_ref().is_some_and(|(t, _)| *t == token)
                        && let Some((_, timeout)) = pending.take()
                    {
                        timeout.cancel();
                    }
                }
            }
        }
    }
}

/// The map surface: blits the cell rasters under the pan/zoom transform and
/// feeds pointer/touch input to the interaction state machine.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let store: MapStore = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();
    let BaseGen(base_gen) = expect_context();
    let OverlayGen(overlay_gen) = expect_context();
    let HoverTooltip(tooltip) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    // Drag state
    let is_dragging = Rc::new(Cell::new(false));
    let drag_start_x = Rc::new(Cell::new(0.0f64));
    let drag_start_y = Rc::new(Cell::new(0.0f64));
    let last_x = Rc::new(Cell::new(0.0f64));
    let last_y = Rc::new(Cell::new(0.0f64));

    // Pinch state
    let pinch_dist = Rc::new(Cell::new(0.0f64));

    let host = InteractionHost::new(store.clone(), tooltip);

    let rasters: Rc<RefCell<Option<RasterLayers>>> = Rc::new(RefCell::new(None));
    let painted_base_gen: Rc<Cell<u64>> = Rc::new(Cell::new(0));
    let painted_overlay_gen: Rc<Cell<u64>> = Rc::new(Cell::new(0));

    let store_render = store.clone();
    let rasters_render = rasters.clone();
    let painted_base_render = painted_base_gen.clone();
    let painted_overlay_render = painted_overlay_gen.clone();
    let scheduler = Rc::new(RenderScheduler::new(move || {
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let canvas: &HtmlCanvasElement = &canvas;
        let Some(parent) = canvas.parent_element() else {
            return;
        };
        let css_w = parent.client_width() as f64;
        let css_h = parent.client_height() as f64;
        if css_w <= 0.0 || css_h <= 0.0 {
            return;
        }
        let dpr = web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0);
        let px_w = (css_w * dpr).round().max(1.0) as u32;
        let px_h = (css_h * dpr).round().max(1.0) as u32;
        if canvas.width() != px_w || canvas.height() != px_h {
            canvas.set_width(px_w);
            canvas.set_height(px_h);
        }

        let Some(ctx) = context_2d(canvas) else {
            return;
        };
        ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).ok();
        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(0.0, 0.0, px_w as f64, px_h as f64);

        let guard = store_render.0.borrow();
        let Some(state) = guard.as_ref() else {
            return;
        };
        let geometry = *state.cells.geometry();

        let mut layers = rasters_render.borrow_mut();
        if layers.is_none() {
            let (Some(base), Some(glow)) = (
                raster_canvas(geometry.cols, geometry.rows),
                raster_canvas(geometry.cols, geometry.rows),
            ) else {
                return;
            };
            *layers = Some(RasterLayers { base, glow });
        }
        let Some(layers) = layers.as_mut() else {
            return;
        };
        if painted_base_render.get() != base_gen.get_untracked() {
            if paint_base_raster(&layers.base, &state.cells).is_err() {
                return;
            }
            painted_base_render.set(base_gen.get_untracked());
        }
        if painted_overlay_render.get() != overlay_gen.get_untracked() {
            if paint_glow_raster(&layers.glow, &state.cells).is_err() {
                return;
            }
            painted_overlay_render.set(overlay_gen.get_untracked());
        }

        let vp = viewport.get_untracked();
        let (min_x, min_y, max_x, max_y) = geometry.world_bounds();
        let world_w = max_x - min_x;
        let world_h = max_y - min_y;

        // World→device transform; the rasters are drawn in world units so
        // each raster pixel covers exactly one cell.
        ctx.set_image_smoothing_enabled(false);
        ctx.set_transform(
            dpr * vp.scale,
            0.0,
            0.0,
            dpr * vp.scale,
            dpr * vp.offset_x,
            dpr * vp.offset_y,
        )
        .ok();
        ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
            &layers.base,
            min_x,
            min_y,
            world_w,
            world_h,
        )
        .ok();
        ctx.set_global_composite_operation("lighter").ok();
        ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
            &layers.glow,
            min_x,
            min_y,
            world_w,
            world_h,
        )
        .ok();
        ctx.set_global_composite_operation("source-over").ok();
        ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).ok();
    }));

    // Repaint on pan/zoom and whenever either raster generation advances.
    let sched_vp = scheduler.clone();
    Effect::new(move || {
        viewport.track();
        base_gen.track();
        overlay_gen.track();
        sched_vp.mark_dirty();
    });

    // Window resizes change the backing-store size; repaint then too.
    let sched_resize = scheduler.clone();
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };
        RESIZE_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old
                    .window
                    .remove_event_listener_with_callback("resize", old._handler.as_ref().unchecked_ref());
            }
        });
        let sched = sched_resize.clone();
        let handler = Closure::<dyn Fn()>::new(move || {
            sched.mark_dirty();
        });
        if window
            .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            RESIZE_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(ResizeBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    // --- Input handlers ---

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let delta = e.delta_y();
        let x = e.offset_x() as f64;
        let y = e.offset_y() as f64;
        viewport.update(|vp| vp.zoom_at(delta, x, y));
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        let host = host.clone();
        move |e: PointerEvent| {
            is_dragging.set(true);
            // Touch pointers go through the long-press path instead; hiding
            // here would cancel a timer the touchstart handler just armed.
            if e.pointer_type() == "mouse" {
                host.dispatch(PointerInput::PointerLeave);
            }
            drag_start_x.set(e.client_x() as f64);
            drag_start_y.set(e.client_y() as f64);
            last_x.set(e.client_x() as f64);
            last_y.set(e.client_y() as f64);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        let store = store.clone();
        let host = host.clone();
        move |e: PointerEvent| {
            if is_dragging.get() {
                let dx = e.client_x() as f64 - last_x.get();
                let dy = e.client_y() as f64 - last_y.get();
                last_x.set(e.client_x() as f64);
                last_y.set(e.client_y() as f64);
                viewport.update(|vp| vp.pan(dx, dy));
            } else {
                let cx = e.client_x() as f64;
                let cy = e.client_y() as f64;
                let vp = viewport.get_untracked();
                let hit = pick_parcel(&store, &vp, canvas_ref, cx, cy);
                host.dispatch(PointerInput::PointerMove { x: cx, y: cy, hit });
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |e: PointerEvent| {
            is_dragging.set(false);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    let on_click = {
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let store = store.clone();
        let host = host.clone();
        move |e: MouseEvent| {
            let dx = (e.client_x() as f64 - drag_start_x.get()).abs();
            let dy = (e.client_y() as f64 - drag_start_y.get()).abs();
            if dx < CLICK_DRAG_TOLERANCE_PX && dy < CLICK_DRAG_TOLERANCE_PX {
                let vp = viewport.get_untracked();
                let hit = pick_parcel(
                    &store,
                    &vp,
                    canvas_ref,
                    e.client_x() as f64,
                    e.client_y() as f64,
                );
                host.dispatch(PointerInput::Click { hit });
            }
        }
    };

    let on_pointer_leave = {
        let host = host.clone();
        move |_: PointerEvent| {
            host.dispatch(PointerInput::PointerLeave);
        }
    };

    let on_touch_start = {
        let pinch_dist = pinch_dist.clone();
        let store = store.clone();
        let host = host.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() == 1 {
                let Some(t0) = touches.get(0) else {
                    return;
                };
                let cx = t0.client_x() as f64;
                let cy = t0.client_y() as f64;
                let vp = viewport.get_untracked();
                let hit = pick_parcel(&store, &vp, canvas_ref, cx, cy);
                host.dispatch(PointerInput::TouchStart { x: cx, y: cy, hit });
            } else if touches.length() == 2 {
                e.prevent_default();
                // A second finger means pinch, not long-press.
                host.dispatch(PointerInput::TouchCancel);
                let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                    return;
                };
                let dx = (t1.client_x() - t0.client_x()) as f64;
                let dy = (t1.client_y() - t0.client_y()) as f64;
                pinch_dist.set((dx * dx + dy * dy).sqrt());
            }
        }
    };

    let on_touch_move = {
        let pinch_dist = pinch_dist.clone();
        let store = store.clone();
        let host = host.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() == 1 {
                let Some(t0) = touches.get(0) else {
                    return;
                };
                let cx = t0.client_x() as f64;
                let cy = t0.client_y() as f64;
                let vp = viewport.get_untracked();
                let hit = pick_parcel(&store, &vp, canvas_ref, cx, cy);
                host.dispatch(PointerInput::TouchMove { x: cx, y: cy, hit });
            } else if touches.length() == 2 {
                e.prevent_default();
                let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                    return;
                };
                let dx = (t1.client_x() - t0.client_x()) as f64;
                let dy = (t1.client_y() - t0.client_y()) as f64;
                let new_dist = (dx * dx + dy * dy).sqrt();
                let old_dist = pinch_dist.get();

                if old_dist > 0.0 {
                    let mid_x = (t0.client_x() + t1.client_x()) as f64 / 2.0;
                    let mid_y = (t0.client_y() + t1.client_y()) as f64 / 2.0;
                    let delta = -(new_dist - old_dist) * 2.0;
                    viewport.update(|vp| vp.zoom_at(delta, mid_x, mid_y));
                }

                pinch_dist.set(new_dist);
            }
        }
    };

    let on_touch_end = {
        let pinch_dist = pinch_dist.clone();
        let host = host.clone();
        move |e: web_sys::TouchEvent| {
            pinch_dist.set(0.0);
            if e.touches().length() == 0 {
                host.dispatch(PointerInput::TouchEnd);
            }
        }
    };

    let on_touch_cancel = {
        let pinch_dist = pinch_dist.clone();
        let host = host.clone();
        move |_: web_sys::TouchEvent| {
            pinch_dist.set(0.0);
            host.dispatch(PointerInput::TouchCancel);
        }
    };

    view! {
        <div
            style="position: absolute; inset: 0; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
            on:click=on_click
            on:touchstart=on_touch_start
            on:touchmove=on_touch_move
            on:touchend=on_touch_end
            on:touchcancel=on_touch_cancel
        >
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; image-rendering: pixelated; cursor: grab;"
            />
        </div>
    }
}
