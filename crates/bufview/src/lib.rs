#![warn(missing_docs)]
//! bufview - Declarative Views in a Live Text Buffer
//!
//! # Overview
//!
//! `bufview` renders a declarative UI tree into a region of a live, line-oriented text document
//! and, on every model change, patches that region with the minimal edits needed to match the
//! new tree. The target is not a GUI but a shared, externally owned text buffer addressed by
//! `(row, byte column)`, so most of the work is position bookkeeping: every mounted node knows
//! exactly which document range it occupies, through every edit.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  App Loop (model / update / dispatch)       │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Binding Resolver (cursor → key handlers)   │
//! ├─────────────────────────────────────────────┤
//! │  Reconciler (patch with minimal edits)      │
//! ├─────────────────────────────────────────────┤
//! │  Renderer (atomic write + mounted mirror)   │
//! ├─────────────────────────────────────────────┤
//! │  View Tree (text / component / array)       │
//! ├─────────────────────────────────────────────┤
//! │  Position Arithmetic (byte columns)         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use bufview::{MountPoint, Position, RopeDocument, ViewNode, patch, render, view};
//!
//! fn list(items: &[&str]) -> ViewNode {
//!     let rows = items.iter().map(|item| view!("- {}\n", *item)).collect::<Vec<_>>();
//!     view!("Items ({}):\n{}", items.len(), rows)
//! }
//!
//! let mut doc = RopeDocument::new("above\n\nbelow");
//! let mount = MountPoint::point(Position::new(1, 0));
//!
//! let tree = render(&mut doc, &list(&["a"]), mount).unwrap();
//! assert_eq!(doc.text(), "above\nItems (1):\n- a\n\nbelow");
//!
//! doc.take_edits();
//! let tree = patch(&mut doc, &tree, &list(&["a", "b"]), tree.range()).unwrap();
//! assert_eq!(doc.text(), "above\nItems (2):\n- a\n- b\n\nbelow");
//! // one edit for the count, one for the appended item
//! assert_eq!(doc.edits().len(), 2);
//! assert_eq!(tree.end(), Position::new(4, 0));
//! ```
//!
//! # Module Description
//!
//! - [`position`] - byte widths, position translation, mount points
//! - [`view`](mod@view) - the immutable view tree and the [`view!`] template macro
//! - [`mounted`] - the position-annotated mirror of a rendered tree
//! - [`render`](mod@render) - full, atomic render of a tree into a range
//! - [`reconcile`] - incremental patching with an accumulated position shift
//! - [`bindings`] - key bindings and cursor-based resolution
//! - [`surface`] - the [`TextSurface`] interface to the host document
//! - [`document`] - [`RopeDocument`], an in-memory rope-backed surface
//! - [`app`] - the message-driven app loop
//!
//! # Unicode Support
//!
//! - Columns are UTF-8 byte offsets, matching the host document
//! - Multi-byte characters and multi-codepoint grapheme clusters are measured by their encoded
//!   length
//! - Rows split on `'\n'` only; `'\r'` is ordinary line content

pub mod app;
pub mod bindings;
pub mod document;
pub mod error;
pub mod mounted;
pub mod position;
pub mod reconcile;
pub mod render;
pub mod surface;
pub mod view;

pub use app::{App, AppHandle, AppOptions, AppStatus, Dispatch, Program, Thunk};
pub use bindings::{Bindings, Handler, resolve};
pub use document::RopeDocument;
pub use error::{AppError, PositionError, RenderError, SurfaceError};
pub use mounted::{DecorationSpan, MountedKind, MountedNode};
pub use position::{MountPoint, Position, advance, byte_width};
pub use reconcile::{AccumulatedEdit, patch};
pub use render::render;
pub use surface::{SurfaceEdit, TextSurface};
pub use view::{Decoration, Template, TemplateId, ViewKind, ViewNode};
