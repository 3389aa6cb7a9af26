//! Draws the category pie chart as inline SVG.
//!
//! The first wedge starts at twelve o'clock and wedges follow counter-clockwise. Each wedge shows
//! its amount label inside and its category label outside.

use crate::model::Category;
use crate::report::PieSlice;
use crate::utils::html_escape;
use rust_decimal::prelude::ToPrimitive;
use std::f64::consts::PI;
use std::fmt::Write;

const SIZE: f64 = 360.0;
const CENTER: f64 = SIZE / 2.0;
const RADIUS: f64 = 120.0;
const START_DEGREES: f64 = 90.0;

fn color(category: Category) -> &'static str {
    match category {
        Category::Food => "#f4a6c6",
        Category::Shopping => "#a6c8f4",
        Category::Travel => "#f9d58b",
        Category::Fun => "#b8e6b0",
        Category::Other => "#d3b8f0",
    }
}

/// A point at `radius` from the center, `degrees` counter-clockwise from three o'clock.
fn point(radius: f64, degrees: f64) -> (f64, f64) {
    let rad = degrees * PI / 180.0;
    (CENTER + radius * rad.cos(), CENTER - radius * rad.sin())
}

/// Renders `slices` as an `<svg>` element. Returns an empty string when there are no slices.
pub(crate) fn pie_svg(slices: &[PieSlice]) -> String {
    if slices.is_empty() {
        return String::new();
    }
    let mut svg = format!(
        r#"<svg class="pie" viewBox="0 0 {SIZE} {SIZE}" width="{SIZE}" height="{SIZE}" role="img">"#
    );
    let mut start = START_DEGREES;
    for slice in slices {
        let sweep = slice.percent.to_f64().unwrap_or(0.0) * 3.6;
        let end = start + sweep;
        let fill = color(slice.category);
        if sweep >= 359.999 {
            let _ = write!(
                svg,
                r#"<circle cx="{CENTER}" cy="{CENTER}" r="{RADIUS}" fill="{fill}"/>"#
            );
        } else {
            let (x0, y0) = point(RADIUS, start);
            let (x1, y1) = point(RADIUS, end);
            let large = if sweep > 180.0 { 1 } else { 0 };
            let _ = write!(
                svg,
                r#"<path d="M{CENTER},{CENTER} L{x0:.2},{y0:.2} A{RADIUS},{RADIUS} 0 {large} 0 {x1:.2},{y1:.2} Z" fill="{fill}"/>"#
            );
        }

        let middle = start + sweep / 2.0;
        let (lx, ly) = point(RADIUS * 0.6, middle);
        let _ = write!(
            svg,
            r#"<text x="{lx:.2}" y="{ly:.2}" text-anchor="middle">{}</text>"#,
            html_escape(&slice.label)
        );
        let (cx, cy) = point(RADIUS * 1.2, middle);
        let anchor = if cx < CENTER - 1.0 {
            "end"
        } else if cx > CENTER + 1.0 {
            "start"
        } else {
            "middle"
        };
        let _ = write!(
            svg,
            r#"<text x="{cx:.2}" y="{cy:.2}" text-anchor="{anchor}">{}</text>"#,
            html_escape(&slice.category.to_string())
        );
        start = end;
    }
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn slice(category: Category, amount: i64, percent: i64) -> PieSlice {
        PieSlice {
            category,
            amount: Decimal::from(amount),
            percent: Decimal::from(percent),
            label: format!("₹{amount}"),
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(pie_svg(&[]), "");
    }

    #[test]
    fn test_single_slice_is_a_circle() {
        let svg = pie_svg(&[slice(Category::Fun, 42, 100)]);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<circle"));
        assert!(!svg.contains("<path"));
        assert!(svg.contains(">₹42</text>"));
        assert!(svg.contains(">🎉 Fun</text>"));
    }

    #[test]
    fn test_wedges() {
        let svg = pie_svg(&[slice(Category::Food, 75, 75), slice(Category::Travel, 25, 25)]);
        assert_eq!(svg.matches("<path").count(), 2);
        // The first wedge starts at the top of the circle and is the large one
        assert!(svg.contains("L180.00,60.00 A120,120 0 1 0"));
        assert!(svg.contains(">₹75</text>"));
        assert!(svg.contains(">🚕 Travel</text>"));
    }
}
