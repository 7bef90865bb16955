#![forbid(unsafe_code)]

//! Declarative, validated configuration for cadre components.
//!
//! # Role in cadre
//! A component declares its properties once ([`ConfigStore::add_property`])
//! and from then on every write goes through validation and lands in exactly
//! one change-handler invocation, ordered by the properties' `supersedes`
//! relations.
//!
//! # Example
//!
//! ```
//! use cadre_config::{ConfigBatch, ConfigStore, PropertySpec, validators};
//!
//! #[derive(Default)]
//! struct Panel { log: Vec<String> }
//!
//! let mut store: ConfigStore<Panel> = ConfigStore::new(None);
//! let mut panel = Panel::default();
//! store.add_property("visible", PropertySpec::new()
//!     .validator(validators::is_boolean)
//!     .handler(|p: &mut Panel, c| p.log.push(format!("visible={}", c.value)))).unwrap();
//! store.add_property("effect", PropertySpec::new()
//!     .supersedes(["visible"])
//!     .handler(|p: &mut Panel, _| p.log.push("effect".into()))).unwrap();
//!
//! let batch = ConfigBatch::from_json_str(r#"{"effect": "fade", "visible": false}"#).unwrap();
//! store.apply_config(&batch, true).unwrap();
//! store.fire_queue(&mut panel);
//! assert_eq!(panel.log, ["visible=false", "effect"]);
//! ```

pub mod batch;
pub mod error;
pub mod graph;
pub mod property;
pub mod store;
pub mod validators;

pub use batch::ConfigBatch;
pub use error::ConfigError;
pub use graph::SupersedesGraph;
pub use property::{Handler, PropertyChange, PropertySpec, Validator};
pub use store::{CONFIG_CHANGED_EVENT, ConfigStore};
