// SPDX-License-Identifier: GPL-3.0-only

//! SVG serialization of a rendered symbol

use super::{Color, RenderedSymbol};
use std::fmt::Write;

/// One `<path>` with a unit square per dark module, in module coordinates
///
/// The viewBox is sized in modules so the document scales cleanly to any
/// pixel size; `width`/`height` carry the requested size.
pub(super) fn render(symbol: &RenderedSymbol) -> String {
    let params = symbol.params();
    let total = symbol.total_modules();
    let mut out = String::with_capacity(256 + total * total * 8);

    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {total} {total}" shape-rendering="crispEdges">"#,
        size = params.size,
        total = total,
    );

    if !params.background.is_transparent() {
        let _ = write!(
            out,
            r#"<rect width="{total}" height="{total}" fill="{}"{}/>"#,
            params.background.to_hex(),
            opacity_attr(&params.background),
        );
    }

    let _ = write!(
        out,
        r#"<path fill="{}"{} d=""#,
        params.foreground.to_hex(),
        opacity_attr(&params.foreground),
    );
    for y in 0..total {
        let mut x = 0;
        while x < total {
            if !symbol.is_dark_at(x, y) {
                x += 1;
                continue;
            }
            // Horizontal runs keep the path short
            let start = x;
            while x < total && symbol.is_dark_at(x, y) {
                x += 1;
            }
            let _ = write!(out, "M{start} {y}h{}v1h-{}z", x - start, x - start);
        }
    }
    out.push_str(r#""/></svg>"#);
    out
}

fn opacity_attr(color: &Color) -> String {
    if color.is_opaque() {
        String::new()
    } else {
        format!(r#" fill-opacity="{:.3}""#, color.a as f32 / 255.0)
    }
}
