// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::layout::graph::Position;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn around(center: Position, r: f64) -> Self {
        Rect {
            top: center.y - r,
            left: center.x - r,
            right: center.x + r,
            bottom: center.y + r,
        }
    }
}

/// Escape text content for XML (inside elements)
pub fn escape_xml_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape attribute values for XML (inside double-quoted attributes)
pub fn escape_xml_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("&quot;"),
            _ => result.push_str(&escape_xml_text(c.encode_utf8(&mut [0; 4]))),
        }
    }
    result
}

/// Format a number the way a browser prints it: integers carry no
/// trailing `.0`, and non-finite values are spelled out.
pub fn js_format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }

    if n == n.trunc() && n.abs() < 1e21 {
        return format!("{}", n as i64);
    }

    format!("{}", n)
}

/// Coordinates are written with at most two decimals.
pub fn format_coord(n: f64) -> String {
    js_format_number((n * 100.0).round() / 100.0)
}

pub fn merge_bounds(a: Rect, b: Rect) -> Rect {
    Rect {
        top: a.top.min(b.top),
        left: a.left.min(b.left),
        right: a.right.max(b.right),
        bottom: a.bottom.max(b.bottom),
    }
}

pub fn calc_view_box(bounds: &[Rect]) -> Option<Rect> {
    let (first, rest) = bounds.split_first()?;
    Some(rest.iter().fold(*first, |view, b| merge_bounds(view, *b)))
}
