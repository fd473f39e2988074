//! SVG export of a [`World`].
//!
//! Each group becomes a `<g>` (with its zoom transform and optional clip
//! rectangle), each visible element one shape element. Pure string building,
//! no I/O.

use std::fmt::Write;

use foundation::math::Vec2;

use crate::World;
use crate::element::{Element, Shape, Style};

/// Escapes the five XML special characters for text content and attributes.
pub fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Coordinates are written with at most 3 decimals.
fn num(v: f64) -> String {
    let r = (v * 1000.0).round() / 1000.0;
    if r == 0.0 { "0".to_string() } else { format!("{r}") }
}

/// SVG `d` attribute for a set of polylines; parts with fewer than two
/// points are skipped.
pub fn path_data(parts: &[Vec<Vec2>], closed: bool) -> String {
    let mut d = String::new();
    for part in parts.iter().filter(|p| p.len() >= 2) {
        for (i, p) in part.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{},{}", num(p.x), num(p.y));
        }
        if closed {
            d.push('Z');
        }
    }
    d
}

fn style_attrs(style: &Style) -> String {
    let mut attrs = String::new();
    if let Some(class) = &style.class {
        let _ = write!(attrs, r#" class="{}""#, xml_escape(class));
    }
    match &style.fill {
        Some(fill) => {
            let _ = write!(attrs, r#" fill="{}""#, xml_escape(fill));
        }
        None => attrs.push_str(r#" fill="none""#),
    }
    if let Some(stroke) = &style.stroke {
        let _ = write!(
            attrs,
            r#" stroke="{}" stroke-width="{}""#,
            xml_escape(stroke),
            num(style.stroke_width)
        );
    }
    if style.opacity != 1.0 {
        let _ = write!(attrs, r#" opacity="{}""#, num(style.opacity));
    }
    if let Some(size) = style.font_size {
        let _ = write!(attrs, r#" font-size="{}""#, num(size));
    }
    attrs
}

fn write_element(out: &mut String, element: &Element, indent: &str) {
    let attrs = style_attrs(&element.style);
    match &element.shape {
        Shape::Path { parts, closed } => {
            let d = path_data(parts, *closed);
            if !d.is_empty() {
                let _ = writeln!(out, r#"{indent}<path d="{d}"{attrs}/>"#);
            }
        }
        Shape::Circle { center, r } => {
            let _ = writeln!(
                out,
                r#"{indent}<circle cx="{}" cy="{}" r="{}"{attrs}/>"#,
                num(center.x),
                num(center.y),
                num(*r)
            );
        }
        Shape::Rect {
            origin,
            width,
            height,
        } => {
            let _ = writeln!(
                out,
                r#"{indent}<rect x="{}" y="{}" width="{}" height="{}"{attrs}/>"#,
                num(origin.x),
                num(origin.y),
                num(*width),
                num(*height)
            );
        }
        Shape::Line { from, to } => {
            let _ = writeln!(
                out,
                r#"{indent}<line x1="{}" y1="{}" x2="{}" y2="{}"{attrs}/>"#,
                num(from.x),
                num(from.y),
                num(to.x),
                num(to.y)
            );
        }
        Shape::Text { at, text, anchor } => {
            let _ = writeln!(
                out,
                r#"{indent}<text x="{}" y="{}" text-anchor="{}"{attrs}>{}</text>"#,
                num(at.x),
                num(at.y),
                anchor.as_str(),
                xml_escape(text)
            );
        }
    }
}

/// Serializes the whole scene into a standalone SVG document.
pub fn to_svg(world: &World, width: f64, height: f64, title: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(width),
        h = num(height),
    );
    if let Some(title) = title {
        let _ = writeln!(out, "  <title>{}</title>", xml_escape(title));
    }

    let clipped: Vec<_> = world
        .groups()
        .filter_map(|(id, g)| g.clip.map(|c| (id, c)))
        .collect();
    if !clipped.is_empty() {
        let _ = writeln!(out, "  <defs>");
        for (id, c) in &clipped {
            let _ = writeln!(
                out,
                r#"    <clipPath id="clip-{}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath>"#,
                id.0,
                num(c.min[0]),
                num(c.min[1]),
                num(c.width()),
                num(c.height())
            );
        }
        let _ = writeln!(out, "  </defs>");
    }

    for (id, group) in world.groups() {
        if !group.visible {
            continue;
        }
        let mut open = format!(r#"  <g id="{}""#, xml_escape(&group.name));
        if group.clip.is_some() {
            let _ = write!(open, r#" clip-path="url(#clip-{})""#, id.0);
        }
        let _ = writeln!(out, "{open}>");
        // The clip stays in screen space; the zoom applies to an inner group.
        let inner = match group.transform {
            Some(t) => {
                let _ = writeln!(out, r#"    <g transform="{}">"#, t.to_svg());
                true
            }
            None => false,
        };
        let indent = if inner { "      " } else { "    " };
        for &member in group.members() {
            if let Some(element) = world.get(member)
                && element.visible
            {
                write_element(&mut out, element, indent);
            }
        }
        if inner {
            let _ = writeln!(out, "    </g>");
        }
        let _ = writeln!(out, "  </g>");
    }
    let _ = writeln!(out, "</svg>");
    out
}
