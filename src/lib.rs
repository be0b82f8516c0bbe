#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod wire;
pub mod worker;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{LayoutConfig, load_config};
pub use error::{LayoutError, Result};
pub use layout::{compute_layout, compute_layout_with};
pub use model::{
    Bounds, EdgeInput, LayoutRequest, LayoutResult, NodeIndex, NodeInput, Point, PositionedEdge,
    PositionedNode,
};
pub use wire::LayoutResponse;
pub use worker::{LayoutTicket, LayoutWorker};
