//! Editor overlay injection
//!
//! Edited page elements live outside the converted HTML. Before a download
//! is rendered, a self-executing script is appended to the document that
//! recreates each element at its absolute position inside its page
//! container, the same way the editor displays them.

use std::collections::HashMap;

use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use serde::{Deserialize, Serialize};

/// Elements grouped by the id of the page container they belong to
pub type ElementsByPage = HashMap<String, Vec<PageElement>>;

/// One element placed on a page by the editor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    pub id: String,
    /// "text", "image", "shape" or "drawing"
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    /// Free-form CSS property map, applied as-is
    #[serde(default)]
    pub style: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub class_name: String,
    pub page_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Errors during overlay injection
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("HTML rewrite failed: {0}")]
    Rewrite(String),

    #[error("Overlay serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append the overlay script before `</body>`.
///
/// Documents without a `<body>` (converter output is sometimes a bare
/// fragment) get the script appended at the end instead. An empty element
/// map returns the HTML unchanged.
pub fn inject_overlays(html: &str, elements: &ElementsByPage) -> Result<String, OverlayError> {
    if elements.values().all(|page| page.is_empty()) {
        return Ok(html.to_string());
    }

    let script = overlay_script(elements)?;
    let mut matched = false;

    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("body", |el| {
                matched = true;
                el.append(&script, ContentType::Html);
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| OverlayError::Rewrite(e.to_string()))?;

    if matched {
        Ok(result)
    } else {
        Ok(format!("{html}{script}"))
    }
}

fn overlay_script(elements: &ElementsByPage) -> Result<String, OverlayError> {
    let data = serde_json::to_string(elements)?;

    Ok(format!(
        r#"<script>
(function() {{
  const overlaysByPage = {data};

  function renderOverlay(page, overlay) {{
    const el = document.createElement('div');
    el.id = overlay.id;
    el.className = overlay.className || '';
    el.setAttribute('data-overlay', 'true');

    Object.assign(el.style, overlay.style || {{}});
    el.style.position = 'absolute';

    const pos = overlay.position || {{ x: 0, y: 0 }};
    el.style.transform = 'translate(' + pos.x + 'px, ' + pos.y + 'px)';

    if (overlay.size) {{
      el.style.width = overlay.size.width + 'px';
      el.style.height = overlay.size.height + 'px';
    }}

    switch (overlay.type) {{
      case 'drawing':
        el.innerHTML = overlay.content;
        break;
      case 'image': {{
        const img = document.createElement('img');
        img.src = overlay.content;
        img.alt = '';
        img.style.width = '100%';
        img.style.height = '100%';
        img.style.objectFit = 'contain';
        el.appendChild(img);
        break;
      }}
      case 'shape': {{
        const shape = document.createElement('div');
        shape.innerHTML = overlay.content;
        shape.style.position = 'absolute';
        shape.style.width = '100%';
        shape.style.height = '100%';
        el.appendChild(shape);
        break;
      }}
      default:
        el.textContent = overlay.content;
        break;
    }}

    page.appendChild(el);
  }}

  Object.keys(overlaysByPage).forEach(function(pageId) {{
    const page = document.getElementById(pageId);
    if (!page) return;

    if (getComputedStyle(page).position === 'static') {{
      page.style.position = 'relative';
    }}

    overlaysByPage[pageId].forEach(function(overlay) {{
      renderOverlay(page, overlay);
    }});
  }});
}})();
</script>"#
    ))
}
