//! Core of an embeddable UML diagram editor.
//!
//! This crate owns everything about a diagram that is not drawing it: the
//! serializable document, the compact transport encoding, dirty tracking of
//! the live graph, debounced change notification to the owner, toolbox
//! placement, clipboard copy/paste, and double-click panel routing. The
//! rendering layer, panel UI, and notification UI are external collaborators
//! reached through [`panel::PanelHost`] and [`notify::Notifier`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`editor`] | The editor component and its surface load/reset state machine |
//! | [`doc`] | Diagram document model and structural validation |
//! | [`codec`] | Encode/decode documents to and from transport strings |
//! | [`graph`] | The owned mutable graph and its mutation listeners |
//! | [`tracker`] | Tracked value, dirty flag, and the graph-to-field tracker |
//! | [`emitter`] | Debounced outbound change events |
//! | [`toolbox`] | Element prototypes and random placement |
//! | [`panel`] | Double-click dispatch to property/link panels |
//! | [`clipboard`] | Clipboard events and the copy/paste bridge |
//! | [`notify`] | Transient acknowledgments |
//! | [`config`] | Environment-driven editor configuration |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`consts`] | Shared constants (debounce window, bounds, limits) |

pub mod clipboard;
pub mod codec;
pub mod config;
pub mod consts;
pub mod doc;
pub mod editor;
pub mod emitter;
pub mod graph;
pub mod logging;
pub mod notify;
pub mod panel;
pub mod toolbox;
pub mod tracker;

pub use codec::{CodecError, EncodedDiagram, decode, encode};
pub use config::EditorConfig;
pub use doc::{Cell, CellId, Document};
pub use editor::{Editor, EditorError, LoadOptions, SurfaceState};
pub use emitter::DiagramChanged;
pub use toolbox::Toolbox;
