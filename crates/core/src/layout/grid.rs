//! Grid layout (`spec.md` §4.6), grounded on the teacher's
//! `layouts/grid.rs` Tetris-style occupancy placement, retargeted from
//! `GridStyle`/`ComputedStyle` to this crate's `GridSpec`/`Style` and from
//! floating-point track sizing to [`crate::fraction::Fraction`] so that `fr`
//! track distribution is exact (`spec.md` §4.6 "Layout determinism").

use super::{Child, ChildLayout, Rect};
use crate::fraction::Fraction;
use crate::vnode::{GridSpec, TrackSpec, Unit};

pub struct GridLayout<'a> {
    spec: &'a GridSpec,
}

impl<'a> GridLayout<'a> {
    pub fn new(spec: &'a GridSpec) -> Self {
        Self { spec }
    }
}

/// Distributes `available` cells across `tracks`, giving `fr` tracks a
/// share proportional to their fraction and fixed/percent tracks their
/// resolved size. Any integer remainder from rounding lands on the last
/// track, matching the teacher's `Fraction`-based remainder handling.
fn resolve_tracks(tracks: &[TrackSpec], available: i32) -> Vec<(i32, i32)> {
    if tracks.is_empty() {
        return Vec::new();
    }

    let mut fixed_total = 0i32;
    let mut fr_total = 0i32;
    for t in tracks {
        match t.unit {
            Unit::Cells(n) => fixed_total += n,
            Unit::Percent(p) => fixed_total += (p as i64 * available as i64 / 100) as i32,
            Unit::Fraction(n) => fr_total += n.max(0),
            Unit::Auto => {}
        }
    }
    let fr_space = (available - fixed_total).max(0);
    let per_fr = if fr_total > 0 {
        Fraction::new(fr_space as i64, fr_total as i64)
    } else {
        Fraction::ZERO
    };

    let mut offset = 0i32;
    let mut remainder = Fraction::ZERO;
    let mut out = Vec::with_capacity(tracks.len());
    for (i, t) in tracks.iter().enumerate() {
        let size = match t.unit {
            Unit::Cells(n) => n,
            Unit::Percent(p) => (p as i64 * available as i64 / 100) as i32,
            Unit::Fraction(n) => {
                let raw = per_fr * Fraction::from(n.max(0)) + remainder;
                let floored = raw.floor() as i32;
                remainder = if i == tracks.len() - 1 { Fraction::ZERO } else { raw.fract() };
                floored
            }
            Unit::Auto => 0,
        };
        out.push((offset, size));
        offset += size;
    }
    out
}

impl<'a> ChildLayout for GridLayout<'a> {
    fn arrange(&self, children: &[Child], available: Rect) -> Vec<Rect> {
        let cols = resolve_tracks(&self.spec.columns, available.width);
        let rows = resolve_tracks(&self.spec.rows, available.height);
        let n_cols = cols.len().max(1);
        let n_rows = rows.len().max(1);

        let mut occupied = vec![vec![false; n_cols]; n_rows];
        let mut rects = Vec::with_capacity(children.len());
        let mut cursor = (0usize, 0usize);

        for child in children {
            let col_span = (child.style.grid_placement.column_span.max(1) as usize).min(n_cols);
            let row_span = (child.style.grid_placement.row_span.max(1) as usize).min(n_rows);

            let placement = find_slot(&occupied, cursor, n_rows, n_cols, row_span, col_span);
            let (row, col) = placement.unwrap_or(cursor);
            occupy(&mut occupied, row, col, row_span, col_span, n_rows, n_cols);
            cursor = (row, col + 1);
            if cursor.1 >= n_cols {
                cursor = (row + 1, 0);
            }

            let (x0, w_first) = cols.get(col).copied().unwrap_or((0, available.width));
            let (y0, h_first) = rows.get(row).copied().unwrap_or((0, available.height));
            let w: i32 = (col..(col + col_span).min(n_cols)).map(|c| cols.get(c).map(|t| t.1).unwrap_or(0)).sum();
            let h: i32 = (row..(row + row_span).min(n_rows)).map(|r| rows.get(r).map(|t| t.1).unwrap_or(0)).sum();
            let gutters_w = self.spec.gutter_h * (col_span.saturating_sub(1) as i32);
            let gutters_h = self.spec.gutter_v * (row_span.saturating_sub(1) as i32);

            rects.push(Rect {
                x: available.x + x0,
                y: available.y + y0,
                width: if col_span > 1 { w + gutters_w } else { w_first },
                height: if row_span > 1 { h + gutters_h } else { h_first },
            });
        }

        rects
    }
}

fn find_slot(
    occupied: &[Vec<bool>],
    start: (usize, usize),
    n_rows: usize,
    n_cols: usize,
    row_span: usize,
    col_span: usize,
) -> Option<(usize, usize)> {
    let (mut row, mut col) = start;
    loop {
        if row >= n_rows {
            return Some((row, col));
        }
        if col >= n_cols {
            row += 1;
            col = 0;
            continue;
        }
        if can_fit(occupied, row, col, row_span, col_span, n_rows, n_cols) {
            return Some((row, col));
        }
        col += 1;
    }
}

fn can_fit(
    occupied: &[Vec<bool>],
    row: usize,
    col: usize,
    row_span: usize,
    col_span: usize,
    n_rows: usize,
    n_cols: usize,
) -> bool {
    if row + row_span > n_rows || col + col_span > n_cols {
        return false;
    }
    (row..row + row_span).all(|r| (col..col + col_span).all(|c| !occupied[r][c]))
}

fn occupy(
    occupied: &mut [Vec<bool>],
    row: usize,
    col: usize,
    row_span: usize,
    col_span: usize,
    n_rows: usize,
    n_cols: usize,
) {
    for r in row..(row + row_span).min(n_rows) {
        for c in col..(col + col_span).min(n_cols) {
            occupied[r][c] = true;
        }
    }
}

/// Splits `available` into two rects for a `split-pane` container along its
/// axis, at `ratio` of the total (`spec.md` §3 "containers... split-pane").
pub fn split_pane(children: &[Child], available: Rect, vertical: bool, ratio: Fraction) -> Vec<Rect> {
    if children.len() != 2 {
        return children.iter().map(|_| available).collect();
    }
    if vertical {
        let total = available.height;
        let first = (ratio * Fraction::from(total)).floor() as i32;
        vec![
            Rect { x: available.x, y: available.y, width: available.width, height: first },
            Rect {
                x: available.x,
                y: available.y + first,
                width: available.width,
                height: available.height - first,
            },
        ]
    } else {
        let total = available.width;
        let first = (ratio * Fraction::from(total)).floor() as i32;
        vec![
            Rect { x: available.x, y: available.y, width: first, height: available.height },
            Rect {
                x: available.x + first,
                y: available.y,
                width: available.width - first,
                height: available.height,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceId;
    use crate::vnode::Style;

    fn child(id: u64) -> Child {
        Child { id: InstanceId(id), style: Style::default() }
    }

    #[test]
    fn fr_tracks_split_evenly() {
        let spec = GridSpec {
            columns: vec![TrackSpec { unit: Unit::Fraction(1) }, TrackSpec { unit: Unit::Fraction(1) }],
            rows: vec![TrackSpec { unit: Unit::Fraction(1) }],
            gutter_h: 0,
            gutter_v: 0,
        };
        let available = Rect { x: 0, y: 0, width: 100, height: 10 };
        let rects = GridLayout::new(&spec).arrange(&[child(1), child(2)], available);
        assert_eq!(rects[0].width, 50);
        assert_eq!(rects[1].width, 50);
        assert_eq!(rects[1].x, 50);
    }

    #[test]
    fn odd_remainder_lands_on_the_last_track() {
        let spec = GridSpec {
            columns: vec![
                TrackSpec { unit: Unit::Fraction(1) },
                TrackSpec { unit: Unit::Fraction(1) },
                TrackSpec { unit: Unit::Fraction(1) },
            ],
            rows: vec![TrackSpec { unit: Unit::Fraction(1) }],
            gutter_h: 0,
            gutter_v: 0,
        };
        let available = Rect { x: 0, y: 0, width: 10, height: 1 };
        let rects = GridLayout::new(&spec).arrange(&[child(1), child(2), child(3)], available);
        let total: i32 = rects.iter().map(|r| r.width).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn split_pane_divides_by_ratio() {
        let available = Rect { x: 0, y: 0, width: 100, height: 10 };
        let rects = split_pane(&[child(1), child(2)], available, false, Fraction::new(3, 10));
        assert_eq!(rects[0].width, 30);
        assert_eq!(rects[1].width, 70);
    }
}
