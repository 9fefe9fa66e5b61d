//! Self-contained HTML page: sections, inline SVG map, legend and info overlays.

use crate::map::{InfoPanel, Legend, Marker};

use super::dom::Element;

const CSS: &str = r#"
body { font-family: sans-serif; margin: 2em; color: #222; }
table { border-collapse: collapse; margin: 1em 0; }
td, th { border: 1px solid #ccc; padding: 4px 8px; }
.selector button { margin-right: 4px; padding: 4px 10px; border: 1px solid #888; background: #fff; }
.selector button.active { background: #FD8D3C; color: #fff; }
.map { position: relative; display: inline-block; }
.info { padding: 6px 8px; background: rgba(255,255,255,0.8); box-shadow: 0 0 15px rgba(0,0,0,0.2); border-radius: 5px; }
.info h4 { margin: 0 0 5px; color: #777; }
.map .info { position: absolute; top: 10px; right: 10px; }
.legend { position: absolute; bottom: 10px; right: 10px; line-height: 18px; color: #555; }
.legend i { width: 18px; height: 18px; float: left; margin-right: 8px; opacity: 0.7; }
.attribution { font-size: 11px; color: #555; }
"#;

/// HTML page assembled from elements.
#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub body: Element,
}

impl Document {
    pub fn new(title: &str) -> Self {
        let mut body = Element::new("body");
        body.push(Element::new("h1").with_text(title));
        Self {
            title: title.to_string(),
            body,
        }
    }

    pub fn push(&mut self, section: Element) {
        self.body.push(section);
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="UTF-8">
<title>{title}</title>
<style>{css}</style>
</head>
{body}
</html>
"#,
            title = super::dom::escape_html(&self.title),
            css = CSS,
            body = self.body.to_html(),
        )
    }
}

/// Info overlay: title, then `label: text` lines.
pub fn info_element(info: &InfoPanel) -> Element {
    let mut div = Element::new("div").with_class("info");
    div.push(Element::new("h4").with_text(&info.title));
    for (label, text) in info.lines() {
        if let Some(label) = label {
            div.push(Element::new("b").with_text(&label));
            div.push_text(&format!(": {}", text));
        } else {
            div.push_text(&text);
        }
        div.push(Element::new("br"));
    }
    div
}

/// Legend overlay: one swatch plus `start – end` per bucket, 2 decimals.
pub fn legend_element(legend: &Legend) -> Element {
    let mut div = Element::new("div").with_class("info").with_class("legend");
    if !legend.title.is_empty() {
        div.push(Element::new("h4").with_text(&legend.title));
    }
    for entry in &legend.entries {
        div.push(Element::new("i").with_attr("style", &format!("background:{}", entry.color)));
        div.push_text(&format!(" {:.2} – {:.2}", entry.start, entry.end));
        div.push(Element::new("br"));
    }
    div
}

/// Open popups, listed under the map since the canvas carries no text.
pub fn popups_element(markers: &[Marker]) -> Option<Element> {
    let open: Vec<&Marker> = markers.iter().filter(|m| m.popup_open).collect();
    if open.is_empty() {
        return None;
    }
    let mut ul = Element::new("ul").with_class("popups");
    for m in open {
        ul.push(Element::new("li").with_text(&m.short_info));
    }
    Some(ul)
}

/// Map figure: inline SVG with the overlays positioned on top.
pub fn map_element(
    id: &str,
    svg: &str,
    info: Option<&InfoPanel>,
    legend: Option<&Legend>,
    attribution: Option<&str>,
) -> Element {
    let mut div = Element::new("div").with_id(id).with_class("map");
    div.push_raw(svg);
    if let Some(info) = info {
        div.push(info_element(info));
    }
    if let Some(legend) = legend {
        div.push(legend_element(legend));
    }
    let mut figure = Element::new("figure").with_child(div);
    if let Some(text) = attribution {
        figure.push(
            Element::new("figcaption")
                .with_class("attribution")
                .with_text(text),
        );
    }
    figure
}
