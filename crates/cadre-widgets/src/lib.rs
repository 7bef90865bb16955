#![forbid(unsafe_code)]

//! Container modules for cadre.
//!
//! # Role in cadre
//! A [`Module`] owns one container node in a host document and up to three
//! content regions inside it (header, body, footer). It wires its
//! configuration (`visible`, `effect`, `monitorresize`) to behavior and
//! announces every step of its life through named events.
//!
//! # Lifecycle
//!
//! | Call | Events fired |
//! |------|--------------|
//! | [`Module::new`] | `beforeInit`, `init` |
//! | [`Module::set_header`] and friends | `changeHeader`/`changeBody`/`changeFooter`, `changeContent` |
//! | [`Module::render`] | `beforeRender`, `append` (with a target), queued config handlers, `render` |
//! | [`Module::show`] / [`Module::hide`] | `beforeShow`, `show` / `beforeHide`, `hide` |
//! | [`Module::destroy`] | `destroy` |

pub mod error;
pub mod lifecycle;
pub mod module;
pub mod options;

pub use error::ModuleError;
pub use lifecycle::{LifecycleEvent, LifecycleState, Notice, Transition};
pub use module::{EFFECT, MONITOR_RESIZE, Module, ModuleCore, RESIZE_HANDLER_KEY, VISIBLE};
pub use options::{ModuleOptions, NoticeCallback};
