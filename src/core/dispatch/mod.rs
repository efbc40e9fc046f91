pub mod placement;
pub mod selection;

pub use placement::{Placement, PlacementDispatcher, PlacementStats};
pub use selection::{DispatchResult, SelectionDispatcher, SelectionStats};
