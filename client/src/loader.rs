use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use parcelmap_core::{
    CellBuffer, GridGeometry, Highlighter, SpatialIndex, Viewport, parse_groups, parse_parcels,
};

use crate::app::{
    BaseGen, CELL_SIZE, GRID_COLS, GRID_ROWS, LoadStatus, MapState, MapStore, canvas_dimensions,
};

const PARCELS_URL: &str = "/realm_locations_sold.csv";
const GROUPS_URL: &str = "/rxelms.csv";

async fn fetch_text(url: &str) -> Result<String, String> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;
    if !resp.ok() {
        return Err(format!("{url}: HTTP {}", resp.status()));
    }
    resp.text().await.map_err(|e| format!("read error: {e}"))
}

/// Fetch and parse both tables. Neither side of the grid build starts until
/// both downloads have completed; any failure aborts the whole load.
async fn load_tables() -> Result<MapState, String> {
    let parcels_text = fetch_text(PARCELS_URL).await?;
    let groups_text = fetch_text(GROUPS_URL).await?;

    let mut parcels = parse_parcels(&parcels_text).map_err(|e| format!("parcel table: {e}"))?;
    let registry = parse_groups(&groups_text).map_err(|e| format!("group table: {e}"))?;

    let geometry = GridGeometry::new(GRID_COLS, GRID_ROWS, CELL_SIZE);
    let (index, warnings) = SpatialIndex::build(&parcels, &geometry);
    for warning in &warnings {
        web_sys::console::warn_1(&format!("parcel data: {warning}").into());
    }

    let cells = CellBuffer::build(geometry, &mut parcels, &index, &registry);

    Ok(MapState {
        parcels,
        registry,
        cells,
        highlighter: Highlighter::new(),
    })
}

/// Start the one-shot data load. On success the shared store is populated,
/// the viewport is fit to the full grid, and the base generation is bumped
/// so the canvas repaints.
pub fn start_load(
    store: MapStore,
    status: RwSignal<LoadStatus>,
    base_gen: BaseGen,
    viewport: RwSignal<Viewport>,
) {
    spawn_local(async move {
        match load_tables().await {
            Ok(state) => {
                let listed = state.cells.listed_count();
                web_sys::console::info_1(
                    &format!(
                        "Loaded {} parcels ({} placed on the grid)",
                        state.parcels.len(),
                        listed
                    )
                    .into(),
                );
                let bounds = state.cells.geometry().world_bounds();
                *store.0.borrow_mut() = Some(state);

                let (width, height) = canvas_dimensions();
                viewport.update(|vp| vp.fit_bounds(bounds, width, height));
                status.set(LoadStatus::Ready { listed });
                base_gen.0.update(|g| *g += 1);
            }
            Err(e) => {
                web_sys::console::error_1(&format!("map data load failed: {e}").into());
                status.set(LoadStatus::Failed(e));
            }
        }
    });
}
