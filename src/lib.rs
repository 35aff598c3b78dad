//! Ctrling - declarative control panels bound to object graphs
//!
//! Controls are described in JSON, bound to members of a root object through
//! string paths like `$['a']['b']`, written back on user input and refreshed
//! from the object on demand or on a timer.

pub mod binding;
pub mod config;
pub mod control;
pub mod descriptor;
pub mod error;
pub mod generate;
pub mod node;
pub mod panel;
pub mod path;
pub mod present;
pub mod scope;
pub mod surface;
pub mod ticker;

pub use binding::{coerce, Binding, Change};
pub use config::PanelConfig;
pub use control::{ControlHandle, ControlView, Listener, Outcome, UserEvent};
pub use descriptor::{ControlKind, Descriptor, PathSpec, SelectOptions};
pub use error::{CtrlError, FixSuggestion};
pub use node::{Action, Node};
pub use panel::{Notification, Panel, SharedPanel};
pub use path::PathResolver;
pub use present::DisplayValue;
pub use scope::Scope;
pub use surface::{MemorySurface, NullSurface, Surface};
pub use ticker::AutoRefresh;
