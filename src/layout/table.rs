//! Table measurement and placement.
//!
//! A table is measured once: column widths, every origin cell's composed
//! paragraphs and natural height, row heights after the height rules and
//! merge-down growth, and the row groups that must stay on one page. Rows
//! are then placed group by group. Cells that merge down are held in a
//! pending map until their last spanned row is placed, then emitted with
//! the accumulated height.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::{QuireError, TableLocation};
use crate::model::{Column, Table};
use crate::style::resolve::{resolve_borders, resolve_shading};
use crate::style::{RowHeightRule, VerticalAlignment};

use super::plan::{ContentRef, Drawable, Rect};
use super::{ComposedParagraph, Flow, EPSILON};

struct CellLayout<'t> {
    paragraphs: Vec<ComposedParagraph<'t>>,
    /// Width of the (possibly merged) box.
    width: f64,
    /// Paragraph heights, without paddings.
    content_height: f64,
    natural_height: f64,
}

struct TableGeometry<'t> {
    col_x: Vec<f64>,
    row_heights: Vec<f64>,
    /// Origin cells only; absorbed positions are `None`.
    cells: Vec<Vec<Option<CellLayout<'t>>>>,
    groups: Vec<Range<usize>>,
    heading_rows: usize,
}

impl TableGeometry<'_> {
    fn span_height(&self, rows: Range<usize>) -> f64 {
        self.row_heights[rows].iter().sum()
    }

    fn heading_height(&self) -> f64 {
        self.span_height(0..self.heading_rows)
    }

    fn body_groups(&self) -> impl Iterator<Item = &Range<usize>> {
        let headings = self.heading_rows;
        self.groups.iter().filter(move |g| g.start >= headings)
    }

    /// Row and column of the tallest origin cell in `rows`.
    fn tallest_origin(&self, rows: Range<usize>) -> (usize, usize) {
        let mut best = (rows.start, 0);
        let mut tallest = f64::NEG_INFINITY;
        for r in rows {
            for (c, layout) in self.cells[r].iter().enumerate() {
                if let Some(layout) = layout {
                    if layout.natural_height > tallest {
                        tallest = layout.natural_height;
                        best = (r, c);
                    }
                }
            }
        }
        best
    }

    /// Headings plus the first body group.
    fn leading_height(&self) -> f64 {
        self.heading_height()
            + self
                .body_groups()
                .next()
                .map_or(0.0, |g| self.span_height(g.clone()))
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingCell {
    page: usize,
    y: f64,
    height: f64,
    last_row: usize,
}

/// Explicit widths are kept; unset columns share what is left equally.
fn resolve_column_widths(columns: &[Column], available: f64) -> Vec<f64> {
    let fixed: f64 = columns.iter().filter_map(|c| c.width).map(|w| w.points()).sum();
    let auto_count = columns.iter().filter(|c| c.width.is_none()).count();
    let auto_width = if auto_count > 0 {
        (available - fixed).max(0.0) / auto_count as f64
    } else {
        0.0
    };
    columns
        .iter()
        .map(|c| c.width.map_or(auto_width, |w| w.points()))
        .collect()
}

/// Consecutive rows linked by merge-down spans.
fn row_groups(table: &Table, origins: &[Vec<bool>]) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut start = 0;
    while start < table.rows.len() {
        let mut end = start;
        let mut r = start;
        while r <= end {
            for (c, cell) in table.rows[r].cells.iter().enumerate() {
                if origins[r][c] {
                    end = end.max(r + cell.merge_down);
                }
            }
            r += 1;
        }
        groups.push(start..end + 1);
        start = end + 1;
    }
    groups
}

impl<'a> Flow<'a> {
    fn measure_table<'t>(&self, table: &'t Table) -> Result<TableGeometry<'t>, QuireError> {
        let format = &table.format;
        let rows = table.rows.len();
        let cols = table.columns.len();

        let left_indent = format.left_indent.points();
        let col_widths =
            resolve_column_widths(&table.columns, self.alloc.content_width() - left_indent);
        let mut col_x = Vec::with_capacity(cols);
        let mut x = self.alloc.left() + left_indent;
        for w in &col_widths {
            col_x.push(x);
            x += w;
        }

        let font = format.font.apply(&self.document.defaults.font);
        let empty_cell = self.metrics.font_metrics(&font)?.line_height;
        let h_pad = format.left_padding.points() + format.right_padding.points();
        let v_pad = format.top_padding.points() + format.bottom_padding.points();

        let mut origins = vec![vec![true; cols]; rows];
        let mut cells: Vec<Vec<Option<CellLayout>>> = Vec::with_capacity(rows);
        for r in 0..rows {
            let mut row_cells = Vec::with_capacity(cols);
            for c in 0..cols {
                if !origins[r][c] {
                    row_cells.push(None);
                    continue;
                }
                let cell = &table.rows[r].cells[c];
                for rr in r..=r + cell.merge_down {
                    for cc in c..=c + cell.merge_right {
                        if (rr, cc) != (r, c) {
                            origins[rr][cc] = false;
                        }
                    }
                }

                let width: f64 = col_widths[c..=c + cell.merge_right].iter().sum();
                let inner = (width - h_pad).max(0.0);
                let paragraphs = cell
                    .paragraphs
                    .iter()
                    .map(|p| self.compose(p, &font, inner))
                    .collect::<Result<Vec<_>, _>>()?;
                let content_height = if paragraphs.is_empty() {
                    empty_cell
                } else {
                    paragraphs.iter().map(|p| p.height()).sum()
                };
                row_cells.push(Some(CellLayout {
                    paragraphs,
                    width,
                    content_height,
                    natural_height: content_height + v_pad,
                }));
            }
            cells.push(row_cells);
        }

        let mut rules = Vec::with_capacity(rows);
        let mut row_heights = Vec::with_capacity(rows);
        for (r, row) in table.rows.iter().enumerate() {
            let rule = row.format.height_rule.unwrap_or(format.height_rule);
            let height = row.format.height.unwrap_or(format.height).points();
            let tallest = cells[r]
                .iter()
                .zip(&row.cells)
                .filter(|(_, cell)| cell.merge_down == 0)
                .filter_map(|(layout, _)| layout.as_ref())
                .map(|l| l.natural_height)
                .fold(0.0, f64::max);
            rules.push(rule);
            row_heights.push(match rule {
                RowHeightRule::Exactly => height,
                RowHeightRule::AtLeast => height.max(tallest),
                RowHeightRule::Auto => tallest,
            });
        }

        // A merge-down cell taller than its rows grows the last one.
        for r in 0..rows {
            for c in 0..cols {
                let (Some(layout), cell) = (&cells[r][c], &table.rows[r].cells[c]) else {
                    continue;
                };
                if cell.merge_down == 0 {
                    continue;
                }
                let last = r + cell.merge_down;
                let spanned: f64 = row_heights[r..=last].iter().sum();
                let deficit = layout.natural_height - spanned;
                if deficit > EPSILON && rules[last] != RowHeightRule::Exactly {
                    row_heights[last] += deficit;
                }
            }
        }

        let groups = row_groups(table, &origins);
        let heading_rows = table
            .rows
            .iter()
            .take_while(|row| row.format.heading)
            .count();

        Ok(TableGeometry {
            col_x,
            row_heights,
            cells,
            groups,
            heading_rows,
        })
    }

    pub(super) fn table_leading_height(&self, table: &Table) -> Result<f64, QuireError> {
        Ok(self.measure_table(table)?.leading_height())
    }

    pub(super) fn layout_table(
        &mut self,
        table: &Table,
        loc: TableLocation,
    ) -> Result<(), QuireError> {
        if table.rows.is_empty() {
            return Ok(());
        }
        let geo = self.measure_table(table)?;
        let mut pending = BTreeMap::new();

        self.alloc.reserve(0.0, geo.leading_height());
        self.place_rows(table, &geo, 0..geo.heading_rows, loc, &mut pending);

        let mut body_on_page = false;
        for group in geo.body_groups() {
            let height = geo.span_height(group.clone());
            if body_on_page && !self.alloc.fits(height) {
                self.alloc.create_page();
                self.place_rows(table, &geo, 0..geo.heading_rows, loc, &mut pending);
                body_on_page = false;
            }

            let page = self.alloc.page_index();
            log::debug!(
                "table {:?}: rows {}..{} on page {} at y {:.2}",
                loc,
                group.start,
                group.end,
                page,
                self.alloc.cursor()
            );
            self.place_rows(table, &geo, group.clone(), loc, &mut pending);
            body_on_page = true;

            let overflow = self.alloc.cursor() - self.alloc.bottom();
            if overflow > EPSILON {
                let (row, column) = geo.tallest_origin(group.clone());
                self.record_overflow(
                    page,
                    ContentRef::Cell {
                        section: loc.section,
                        block: loc.block,
                        row,
                        column,
                    },
                    overflow,
                );
            }
        }
        Ok(())
    }

    fn place_rows(
        &mut self,
        table: &Table,
        geo: &TableGeometry,
        rows: Range<usize>,
        loc: TableLocation,
        pending: &mut BTreeMap<(usize, usize), PendingCell>,
    ) {
        for r in rows {
            let page = self.alloc.page_index();
            let y = self.alloc.cursor();
            for (c, layout) in geo.cells[r].iter().enumerate() {
                let Some(layout) = layout else { continue };
                let merge_down = table.rows[r].cells[c].merge_down;
                if merge_down == 0 {
                    let rect = Rect::new(geo.col_x[c], y, layout.width, geo.row_heights[r]);
                    self.emit_cell(table, geo, (r, c), page, rect, loc);
                } else {
                    pending.insert(
                        (r, c),
                        PendingCell {
                            page,
                            y,
                            height: 0.0,
                            last_row: r + merge_down,
                        },
                    );
                }
            }
            self.alloc.advance(geo.row_heights[r]);

            for p in pending.values_mut() {
                p.height += geo.row_heights[r];
            }
            let done: Vec<((usize, usize), PendingCell)> = pending
                .iter()
                .filter(|(_, p)| p.last_row == r)
                .map(|(k, p)| (*k, *p))
                .collect();
            for ((or, oc), p) in done {
                pending.remove(&(or, oc));
                let width = geo.cells[or][oc].as_ref().map_or(0.0, |l| l.width);
                let rect = Rect::new(geo.col_x[oc], p.y, width, p.height);
                self.emit_cell(table, geo, (or, oc), p.page, rect, loc);
            }
        }
    }

    /// Region, shading, borders and text of one cell box.
    fn emit_cell(
        &mut self,
        table: &Table,
        geo: &TableGeometry,
        (r, c): (usize, usize),
        page: usize,
        rect: Rect,
        loc: TableLocation,
    ) {
        let Some(layout) = geo.cells[r][c].as_ref() else {
            return;
        };
        let format = &table.format;
        let row = &table.rows[r];
        let cell = &row.cells[c];
        let source = ContentRef::Cell {
            section: loc.section,
            block: loc.block,
            row: r,
            column: c,
        };

        self.plan.push(page, rect, Drawable::Region, source);

        if let Some(color) =
            resolve_shading(&[&cell.format.shading, &row.format.shading, &format.shading])
        {
            self.plan.push(page, rect, Drawable::Fill { color }, source);
        }

        let borders = resolve_borders(
            &[&cell.format.borders, &row.format.borders, &format.borders],
            self.default_border,
        );
        for (edge, resolved) in borders.drawn_edges() {
            self.plan.push(
                page,
                rect,
                Drawable::Stroke {
                    edge,
                    width: resolved.width,
                    color: resolved.color,
                },
                source,
            );
        }

        let inner_top = rect.y + format.top_padding.points();
        let inner_bottom = rect.bottom() - format.bottom_padding.points();
        let slack = (inner_bottom - inner_top - layout.content_height).max(0.0);
        let valign = cell
            .format
            .vertical_alignment
            .or(row.format.vertical_alignment)
            .unwrap_or(format.vertical_alignment);
        let mut y = inner_top
            + match valign {
                VerticalAlignment::Top => 0.0,
                VerticalAlignment::Center => slack / 2.0,
                VerticalAlignment::Bottom => slack,
            };

        let x = rect.x + format.left_padding.points();
        let mut clipped = 0;
        for comp in &layout.paragraphs {
            y += comp.format.space_before.points();
            let top = y;
            for (i, line) in comp.lines.iter().enumerate() {
                if y + line.height > inner_bottom + EPSILON {
                    clipped += 1;
                } else {
                    self.emit_line(page, x, comp, i, y, source);
                }
                y += line.height;
            }
            let bottom = y.min(inner_bottom);
            if bottom > top {
                self.emit_decoration(
                    page,
                    Rect::new(x + comp.format.left_indent.points(), top, comp.width, bottom - top),
                    comp.format,
                    true,
                    true,
                    source,
                );
            }
            y += comp.format.space_after.points();
        }

        if clipped > 0 {
            log::warn!(
                "table {:?}: cell ({}, {}) clipped {} line(s) that do not fit its {:.2}pt box",
                loc,
                r,
                c,
                clipped,
                rect.height
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Length;

    #[test]
    fn unset_columns_share_remaining_width() {
        let columns = vec![
            Column {
                width: Some(Length(100.0)),
            },
            Column { width: None },
            Column { width: None },
        ];
        assert_eq!(resolve_column_widths(&columns, 400.0), vec![100.0, 150.0, 150.0]);
    }

    #[test]
    fn explicit_widths_are_kept_even_when_too_wide() {
        let columns = vec![
            Column {
                width: Some(Length(300.0)),
            },
            Column { width: None },
        ];
        assert_eq!(resolve_column_widths(&columns, 200.0), vec![300.0, 0.0]);
    }

    #[test]
    fn merge_down_links_rows_into_groups() {
        let mut t = Table::default();
        t.add_column(None);
        t.add_column(None);
        for _ in 0..4 {
            t.add_row();
        }
        t.rows[1][0].merge_down = 1;
        let mut origins = vec![vec![true; 2]; 4];
        origins[2][0] = false;
        assert_eq!(row_groups(&t, &origins), vec![0..1, 1..3, 3..4]);
    }

    #[test]
    fn chained_merges_extend_the_group() {
        let mut t = Table::default();
        t.add_column(None);
        t.add_column(None);
        for _ in 0..4 {
            t.add_row();
        }
        t.rows[0][0].merge_down = 1;
        t.rows[1][1].merge_down = 2;
        let mut origins = vec![vec![true; 2]; 4];
        origins[1][0] = false;
        origins[2][1] = false;
        origins[3][1] = false;
        assert_eq!(row_groups(&t, &origins), vec![0..4]);
    }
}
