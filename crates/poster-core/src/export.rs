//! Export pipeline: compose the live fragment and style text into a
//! complete standalone document, plus the file I/O around it.

use crate::emitter::serialize_fragment;
use crate::error::{PosterError, PosterResult};
use crate::model::Fragment;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use std::fs;
use std::path::Path;

/// Marker stamped into exported documents so re-imports can be
/// recognized as our own output.
pub const GENERATED_BY: &str = "editable-html-poster";

/// Compose a complete standalone document around the fragment markup
/// and the collected style text.
#[must_use]
pub fn compose_document(fragment: &Fragment, styles: &str) -> String {
    let body = serialize_fragment(fragment);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta data-generated-by="{GENERATED_BY}" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Editable Poster</title>
  <style>
{styles}
  </style>
</head>
<body>
{body}
</body>
</html>"#
    )
}

/// Read a poster document from disk.
pub fn read_html_file(path: &Path) -> PosterResult<String> {
    fs::read_to_string(path).map_err(|source| PosterError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Write an exported document to disk.
pub fn write_html_file(path: &Path, html: &str) -> PosterResult<()> {
    fs::write(path, html).map_err(|source| PosterError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

const IMAGE_MIME: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("bmp", "image/bmp"),
];

/// Load an image file as a `data:` URL suitable for an `src` attribute.
pub fn image_data_url(path: &Path) -> PosterResult<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let mime = IMAGE_MIME
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, m)| *m)
        .ok_or_else(|| PosterError::UnsupportedImage(ext.clone()))?;
    let bytes = fs::read(path).map_err(|source| PosterError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format!(
        "data:{mime};base64,{}",
        BASE64_STANDARD.encode(bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_fragment_html;
    use pretty_assertions::assert_eq;

    #[test]
    fn compose_wraps_fragment_and_styles_exactly() {
        let fragment = parse_fragment_html("<p data-element-id=\"element-0\">hi</p>");
        let html = compose_document(&fragment, ".poster { width: 720px }");
        assert_eq!(
            html,
            "<!DOCTYPE html>\n\
             <html lang=\"en\">\n\
             <head>\n\
             \u{20} <meta charset=\"UTF-8\" />\n\
             \u{20} <meta data-generated-by=\"editable-html-poster\" />\n\
             \u{20} <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n\
             \u{20} <title>Editable Poster</title>\n\
             \u{20} <style>\n\
             .poster { width: 720px }\n\
             \u{20} </style>\n\
             </head>\n\
             <body>\n\
             <p data-element-id=\"element-0\">hi</p>\n\
             </body>\n\
             </html>"
        );
    }

    #[test]
    fn exported_documents_reimport_cleanly() {
        let fragment =
            parse_fragment_html("<div data-element-id=\"element-0\"><p data-element-id=\"element-1\">x</p></div>");
        let html = compose_document(&fragment, "p { color: red }");

        let doc = crate::parser::parse_document_html(&html);
        assert_eq!(doc.styles, "p { color: red }");
        let top = doc.fragment.children(doc.fragment.root);
        assert_eq!(top.len(), 1);
        assert_eq!(
            crate::emitter::serialize_fragment(&doc.fragment),
            crate::emitter::serialize_fragment(&fragment)
        );
    }

    #[test]
    fn unsupported_image_extensions_are_rejected() {
        let err = image_data_url(Path::new("movie.mp4")).unwrap_err();
        assert!(matches!(err, PosterError::UnsupportedImage(ext) if ext == "mp4"));
    }

    #[test]
    fn missing_image_files_surface_the_path() {
        let err = image_data_url(Path::new("/nonexistent/pic.png")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pic.png"));
    }
}
