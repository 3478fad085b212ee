pub mod cells;
pub mod color;
pub mod grid;
pub mod highlight;
pub mod interaction;
pub mod picking;
pub mod record;
pub mod spatial;
pub mod table;
pub mod viewport;

pub use cells::CellBuffer;
pub use color::Rgb;
pub use grid::GridGeometry;
pub use highlight::Highlighter;
pub use interaction::{Effect, InteractionController, PointerInput, TimerToken};
pub use picking::pick;
pub use record::{GroupAttributes, GroupRegistry, ParcelRecord};
pub use spatial::{DataWarning, SpatialIndex};
pub use table::{TableError, parse_groups, parse_parcels};
pub use viewport::Viewport;
