pub mod emitter;
pub mod error;
pub mod export;
pub mod geometry;
pub mod id;
pub mod model;
pub mod parser;
pub mod sanitize;
pub mod style;

pub use emitter::serialize_fragment;
pub use error::{PosterError, PosterResult};
pub use export::{GENERATED_BY, compose_document, image_data_url, read_html_file, write_html_file};
pub use geometry::{Bounds, Canvas, DEFAULT_IMAGE_SIZE, hit_test, resolve_geometry};
pub use id::{ElementId, IdAllocator};
pub use model::*;
pub use parser::{Document, parse_document_html, parse_fragment_html};
pub use sanitize::sanitize_html;
pub use style::{StyleMap, StyleSheet, computed_value, ensure_px, format_px, parse_px};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
