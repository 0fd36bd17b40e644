//! Link-analysis graph component.
//!
//! Connects an interactive graph view to a shared reactive store:
//! - The initializer builds the single graph instance, binds debounced
//!   `select`/`unselect` handling and the host's declared listeners
//! - The selection filter turns selection events into the shared
//!   [`Selection`], keeping only the data keys the host allows
//! - Reactive callbacks push highlight, layout and style changes from the
//!   store back into the graph
//!
//! # Example
//!
//! ```ignore
//! use link_graph::{GraphProps, LinkGraphCanvas, StateStore};
//!
//! let props: GraphProps = serde_json::from_str(json)?;
//! let store = StateStore::default();
//!
//! view! { <LinkGraphCanvas props=props store=store /> }
//! ```

/// Reactive callbacks.
pub mod callbacks;
mod component;
/// Host configuration.
pub mod config;
/// Timers and debouncing.
pub mod debounce;
/// Error types.
pub mod error;
/// Events and the instance handle.
pub mod events;
/// Graph instance.
pub mod graph;
/// Instance initialization.
pub mod init;
/// Layout algorithms.
pub mod layout;
/// Host listeners and reports.
pub mod listeners;
mod render;
/// Selection filtering.
pub mod selection;
/// Element selectors.
pub mod selector;
/// Shared state store.
pub mod state;
/// Style sheets.
pub mod style;
/// Colors and themes.
pub mod theme;
/// Element types.
pub mod types;

pub use callbacks::{BrowserDocument, HostDocument, NoopDocument, bind_callbacks};
pub use component::{InfoPanel, LinkGraphCanvas, PanelData};
pub use config::{GraphProps, VisibleProps};
pub use debounce::{BrowserScheduler, ManualScheduler, Scheduler};
pub use error::{GraphError, InitError, SelectorError};
pub use events::{EventType, GraphEvent, GraphHandle};
pub use init::{Container, Initializer};
pub use layout::LayoutConfig;
pub use listeners::{ActionReport, ListenerSpec, ParentFrameSink, ReportSink};
pub use selection::{LastSelected, Selection, SelectionFilter};
pub use state::{StateKey, StateStore};
pub use style::{StyleRule, StyleState};
pub use theme::ThemeName;
pub use types::{Element, ElementGroup, GraphElements};
