use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use gloo_storage::Storage;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use parcelmap_core::{CellBuffer, GroupRegistry, Highlighter, ParcelRecord, Viewport};

use crate::api;
use crate::canvas::MapCanvas;
use crate::loader;

/// Grid dimensions of the production data set: 99,900 one-unit parcels.
pub(crate) const GRID_COLS: u32 = 370;
pub(crate) const GRID_ROWS: u32 = 270;
pub(crate) const CELL_SIZE: f64 = 1.0;

const EXTERNAL_RECORD_BASE: &str = "https://allo.info/asset";
const ACCOUNT_STORAGE_KEY: &str = "parcelmap_account";

/// Everything built from one data load. Immutable after construction except
/// for the overlay layer (highlight queries) and the per-parcel slot
/// assignments written during the build itself.
pub(crate) struct MapState {
    pub parcels: Vec<ParcelRecord>,
    pub registry: GroupRegistry,
    pub cells: CellBuffer,
    pub highlighter: Highlighter,
}

/// Shared non-reactive handle to the loaded map. Repaints are driven by the
/// generation signals instead of deep reactivity over the cell buffers.
#[derive(Clone)]
pub(crate) struct MapStore(pub send_wrapper::SendWrapper<Rc<RefCell<Option<MapState>>>>);

/// Bumped when base colors change (i.e. a data load completed).
#[derive(Clone, Copy)]
pub(crate) struct BaseGen(pub RwSignal<u64>);
/// Bumped when the highlight overlay changes.
#[derive(Clone, Copy)]
pub(crate) struct OverlayGen(pub RwSignal<u64>);

#[derive(Clone, PartialEq)]
pub(crate) enum LoadStatus {
    Loading,
    Ready { listed: usize },
    Failed(String),
}

#[derive(Clone, PartialEq)]
pub(crate) struct TooltipInfo {
    pub lines: Vec<String>,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy)]
pub(crate) struct HoverTooltip(pub RwSignal<Option<TooltipInfo>>);
#[derive(Clone, Copy)]
pub(crate) struct HighlightStatus(pub RwSignal<Option<String>>);

pub(crate) fn canvas_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

/// Tooltip body for the parcel rendered at `slot`: the original row fields
/// verbatim, then the registry's partner/name labels when the group is known.
pub(crate) fn tooltip_lines(state: &MapState, slot: usize) -> Option<Vec<String>> {
    let parcel = &state.parcels[state.cells.parcel_at_slot(slot)?];
    let mut lines = parcel.raw_fields.clone();
    if let Some(group) = state.registry.get(&parcel.group_id) {
        lines.push(format!("Partner: {}", group.partner));
        lines.push(format!("Name: {}", group.name));
    }
    Some(lines)
}

/// Open the external record for the parcel at `slot` in a new browsing
/// context. Uses the parcel's asset identifier, never its grid slot.
pub(crate) fn open_parcel_record(state: &MapState, slot: usize) {
    let Some(idx) = state.cells.parcel_at_slot(slot) else {
        return;
    };
    let url = format!("{EXTERNAL_RECORD_BASE}/{}/nft/", state.parcels[idx].id);
    if let Some(window) = web_sys::window() {
        let _ = window.open_with_url_and_target(&url, "_blank");
    }
}

/// Kick off an account-holdings highlight query. The request token is issued
/// before the fetch, so a slower earlier query can never overwrite the
/// overlay state of a later one. A failed lookup degrades to an empty set,
/// which clears all highlights.
pub(crate) fn run_account_query(
    store: MapStore,
    overlay_gen: OverlayGen,
    status: HighlightStatus,
    address: String,
) {
    let address = address.trim().to_string();
    if address.is_empty() {
        return;
    }

    let token = {
        let mut guard = store.0.borrow_mut();
        let Some(state) = guard.as_mut() else {
            return;
        };
        state.highlighter.begin_request()
    };
    let _ = gloo_storage::LocalStorage::set(ACCOUNT_STORAGE_KEY, &address);
    status.0.set(Some("Looking up account\u{2026}".to_string()));

    spawn_local(async move {
        let (ids, failed) = match api::fetch_account_assets(&address).await {
            Ok(ids) => (ids, false),
            Err(e) => {
                web_sys::console::warn_1(
                    &format!("Account asset lookup failed for {address}: {e}").into(),
                );
                (HashSet::new(), true)
            }
        };

        let mut guard = store.0.borrow_mut();
        let Some(state) = guard.as_mut() else {
            return;
        };
        let MapState {
            ref parcels,
            ref mut cells,
            ref mut highlighter,
            ..
        } = *state;
        if !highlighter.apply(token, cells, parcels, &ids) {
            // A newer query already resolved; keep its result.
            return;
        }
        overlay_gen.0.update(|g| *g += 1);
        let message = match (failed, highlighter.active_count()) {
            (true, _) => "Lookup failed; highlights cleared".to_string(),
            (false, 0) => "No matching parcels".to_string(),
            (false, 1) => "1 matching parcel highlighted".to_string(),
            (false, n) => format!("{n} matching parcels highlighted"),
        };
        status.0.set(Some(message));
    });
}

/// Root application component. Provides shared state via context.
#[component]
pub fn App() -> impl IntoView {
    let store = MapStore(send_wrapper::SendWrapper::new(Rc::new(RefCell::new(None))));
    let viewport: RwSignal<Viewport> = RwSignal::new(Viewport::default());
    let load_status: RwSignal<LoadStatus> = RwSignal::new(LoadStatus::Loading);
    let base_gen = BaseGen(RwSignal::new(0));
    let overlay_gen = OverlayGen(RwSignal::new(0));
    let tooltip = HoverTooltip(RwSignal::new(None));
    let highlight_status = HighlightStatus(RwSignal::new(None));

    provide_context(store.clone());
    provide_context(viewport);
    provide_context(load_status);
    provide_context(base_gen);
    provide_context(overlay_gen);
    provide_context(tooltip);
    provide_context(highlight_status);

    // Load both tables once on mount; the grid is only built after both
    // arrive, and any failure aborts the whole load (no partial grid).
    let store_for_load = store.clone();
    Effect::new(move || {
        loader::start_load(store_for_load.clone(), load_status, base_gen, viewport);
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative; overflow: hidden; background: #0c0e17;">
            <MapCanvas />
            <SearchPanel />
            <LoadOverlay />
        </div>
        <Tooltip />
    }
}

/// Account address input + button driving the highlight query.
#[component]
fn SearchPanel() -> impl IntoView {
    let store: MapStore = expect_context();
    let OverlayGen(overlay_gen) = expect_context();
    let HighlightStatus(status) = expect_context();

    let saved: String = gloo_storage::LocalStorage::get(ACCOUNT_STORAGE_KEY).unwrap_or_default();
    let address: RwSignal<String> = RwSignal::new(saved);

    let submit = move || {
        run_account_query(
            store.clone(),
            OverlayGen(overlay_gen),
            HighlightStatus(status),
            address.get_untracked(),
        );
    };
    let submit_click = submit.clone();

    view! {
        <div style="position: absolute; top: 12px; left: 12px; z-index: 10; display: flex; flex-direction: column; gap: 4px;">
            <div style="display: flex; gap: 6px;">
                <input
                    type="text"
                    placeholder="Account address"
                    prop:value=move || address.get()
                    on:input=move |e| address.set(event_target_value(&e))
                    on:keydown=move |e: web_sys::KeyboardEvent| {
                        if e.key() == "Enter" {
                            submit();
                        }
                    }
                    style="width: 320px; padding: 5px 8px; background: #13161f; border: 1px solid #282c3e; border-radius: 4px; color: #e2e0d8; font-family: 'JetBrains Mono', monospace; font-size: 0.75rem;"
                />
                <button
                    on:click=move |_| submit_click()
                    style="padding: 5px 10px; background: #1a1d2a; border: 1px solid #282c3e; border-radius: 4px; color: #e2e0d8; cursor: pointer; font-size: 0.75rem;"
                >
                    "Highlight holdings"
                </button>
            </div>
            {move || {
                status.get().map(|message| view! {
                    <div style="font-size: 0.7rem; color: #9a9590; font-family: 'JetBrains Mono', monospace;">
                        {message}
                    </div>
                })
            }}
        </div>
    }
}

/// Loading/failure banner shown until the grid is built.
#[component]
fn LoadOverlay() -> impl IntoView {
    let load_status: RwSignal<LoadStatus> = expect_context();

    view! {
        {move || match load_status.get() {
            LoadStatus::Ready { .. } => None,
            LoadStatus::Loading => Some(view! {
                <div style="position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; color: #9a9590; font-family: 'JetBrains Mono', monospace; pointer-events: none;">
                    "Loading parcel data\u{2026}"
                </div>
            }.into_any()),
            LoadStatus::Failed(message) => Some(view! {
                <div style="position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; color: #d06060; font-family: 'JetBrains Mono', monospace;">
                    {format!("Map data failed to load: {message}")}
                </div>
            }.into_any()),
        }}
    }
}

/// Tooltip that follows the pointer (or long-press touch point) over a
/// listed parcel.
#[component]
fn Tooltip() -> impl IntoView {
    let HoverTooltip(tooltip) = expect_context();

    view! {
        {move || {
            tooltip.get().map(|info| view! {
                <div
                    style:left=format!("{}px", info.x + 16.0)
                    style:top=format!("{}px", info.y - 8.0)
                    style="position: fixed; pointer-events: none; z-index: 100; background: #161921; border: 1px solid #282c3e; border-radius: 6px; padding: 8px 10px; box-shadow: 0 4px 16px rgba(0,0,0,0.5); max-width: 260px; font-size: 0.72rem; color: #e2e0d8; font-family: 'JetBrains Mono', monospace;"
                >
                    {info
                        .lines
                        .into_iter()
                        .map(|line| view! { <div>{line}</div> })
                        .collect_view()}
                </div>
            })
        }}
    }
}
