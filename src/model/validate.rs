//! Structural validation, run before any layout work.
//!
//! Tables must be dense (one cell per column in every row), merge spans must
//! stay inside the table and never overlap, absorbed cells must be empty
//! placeholders, and heading rows must form a leading block that no heading
//! merge leaves.

use crate::error::{StructuralError, TableLocation};

use super::{Block, Document, Table};

/// Validate every table in the document.
pub fn validate_document(document: &Document) -> Result<(), StructuralError> {
    for (si, section) in document.sections.iter().enumerate() {
        for (bi, block) in section.blocks.iter().enumerate() {
            if let Block::Table(table) = block {
                validate_table(
                    table,
                    TableLocation {
                        section: si,
                        block: bi,
                    },
                )?;
            }
        }
    }
    Ok(())
}

/// Validate one table's shape and merge spans.
pub fn validate_table(table: &Table, loc: TableLocation) -> Result<(), StructuralError> {
    let cols = table.columns.len();
    let rows = table.rows.len();

    if cols == 0 && rows > 0 {
        return Err(StructuralError::NoColumns { loc, rows });
    }

    for (r, row) in table.rows.iter().enumerate() {
        if row.cells.len() != cols {
            return Err(StructuralError::ColumnCountMismatch {
                loc,
                row: r,
                expected: cols,
                found: row.cells.len(),
            });
        }
    }

    let heading_rows = table
        .rows
        .iter()
        .take_while(|row| row.format.heading)
        .count();
    if let Some(r) = table.rows[heading_rows..]
        .iter()
        .position(|row| row.format.heading)
    {
        return Err(StructuralError::MisplacedHeadingRow {
            loc,
            row: heading_rows + r,
        });
    }

    // owner[r * cols + c] = origin cell that covers (r, c)
    let mut owner: Vec<Option<(usize, usize)>> = vec![None; rows * cols];

    for r in 0..rows {
        for c in 0..cols {
            let cell = &table.rows[r].cells[c];

            if let Some((or, oc)) = owner[r * cols + c] {
                if cell.is_declared() {
                    return Err(StructuralError::AbsorbedCellDeclared {
                        loc,
                        row: r,
                        column: c,
                        origin_row: or,
                        origin_column: oc,
                    });
                }
                continue;
            }

            if cell.merge_right >= cols - c || cell.merge_down >= rows - r {
                return Err(StructuralError::MergeOutOfBounds {
                    loc,
                    row: r,
                    column: c,
                    merge_right: cell.merge_right,
                    merge_down: cell.merge_down,
                });
            }

            if r < heading_rows && r + cell.merge_down >= heading_rows {
                return Err(StructuralError::HeadingMergeIntoBody {
                    loc,
                    row: r,
                    column: c,
                });
            }

            for rr in r..=r + cell.merge_down {
                for cc in c..=c + cell.merge_right {
                    let slot = &mut owner[rr * cols + cc];
                    if let Some((fr, fc)) = *slot {
                        return Err(StructuralError::OverlappingMerge {
                            loc,
                            row: rr,
                            column: cc,
                            first_row: fr,
                            first_column: fc,
                            second_row: r,
                            second_column: c,
                        });
                    }
                    *slot = Some((r, c));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, Length};

    const LOC: TableLocation = TableLocation {
        section: 0,
        block: 0,
    };

    fn table(cols: usize, rows: usize) -> Table {
        let mut t = Table::default();
        for _ in 0..cols {
            t.add_column(None);
        }
        for _ in 0..rows {
            t.add_row();
        }
        t
    }

    #[test]
    fn valid_merges_pass() {
        let mut t = table(2, 3);
        t.rows[0][0].merge_right = 1;
        t.rows[1][1].merge_down = 1;
        assert_eq!(validate_table(&t, LOC), Ok(()));
    }

    #[test]
    fn rows_without_columns() {
        let t = table(0, 2);
        assert_eq!(
            validate_table(&t, LOC),
            Err(StructuralError::NoColumns { loc: LOC, rows: 2 })
        );
    }

    #[test]
    fn missing_cell_is_reported() {
        let mut t = table(2, 2);
        t.rows[1].cells.pop();
        assert_eq!(
            validate_table(&t, LOC),
            Err(StructuralError::ColumnCountMismatch {
                loc: LOC,
                row: 1,
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn rows_added_before_columns_mismatch() {
        let mut t = Table::default();
        t.add_column(None);
        t.add_row();
        t.add_column(Some(Length(20.0)));
        assert!(matches!(
            validate_table(&t, LOC),
            Err(StructuralError::ColumnCountMismatch { .. })
        ));
    }

    #[test]
    fn merge_past_right_edge() {
        let mut t = table(2, 1);
        t.rows[0][1].merge_right = 1;
        assert!(matches!(
            validate_table(&t, LOC),
            Err(StructuralError::MergeOutOfBounds { row: 0, column: 1, .. })
        ));
    }

    #[test]
    fn merge_past_last_row() {
        let mut t = table(2, 2);
        t.rows[1][0].merge_down = 1;
        assert!(matches!(
            validate_table(&t, LOC),
            Err(StructuralError::MergeOutOfBounds { row: 1, column: 0, .. })
        ));
    }

    #[test]
    fn huge_spans_are_out_of_bounds() {
        let mut t = table(2, 2);
        t.rows[0][1].merge_right = usize::MAX;
        assert!(matches!(
            validate_table(&t, LOC),
            Err(StructuralError::MergeOutOfBounds { row: 0, column: 1, .. })
        ));

        let mut t = table(2, 2);
        t.rows[1][0].merge_down = usize::MAX;
        assert!(matches!(
            validate_table(&t, LOC),
            Err(StructuralError::MergeOutOfBounds { row: 1, column: 0, .. })
        ));
    }

    #[test]
    fn overlapping_origins() {
        let mut t = table(2, 2);
        t.rows[0][1].merge_down = 1;
        t.rows[1][0].merge_right = 1;
        assert_eq!(
            validate_table(&t, LOC),
            Err(StructuralError::OverlappingMerge {
                loc: LOC,
                row: 1,
                column: 1,
                first_row: 0,
                first_column: 1,
                second_row: 1,
                second_column: 0,
            })
        );
    }

    #[test]
    fn absorbed_cell_with_content() {
        let mut t = table(2, 1);
        t.rows[0][0].merge_right = 1;
        t.rows[0][1] = Cell::default();
        t.rows[0][1].add_paragraph("should not be here");
        assert!(matches!(
            validate_table(&t, LOC),
            Err(StructuralError::AbsorbedCellDeclared {
                row: 0,
                column: 1,
                origin_row: 0,
                origin_column: 0,
                ..
            })
        ));
    }

    #[test]
    fn heading_rows_must_lead() {
        let mut t = table(1, 3);
        t.rows[0].format.heading = true;
        t.rows[2].format.heading = true;
        assert_eq!(
            validate_table(&t, LOC),
            Err(StructuralError::MisplacedHeadingRow { loc: LOC, row: 2 })
        );
    }

    #[test]
    fn heading_merge_cannot_reach_body() {
        let mut t = table(1, 2);
        t.rows[0].format.heading = true;
        t.rows[0][0].merge_down = 1;
        assert!(matches!(
            validate_table(&t, LOC),
            Err(StructuralError::HeadingMergeIntoBody { .. })
        ));
    }
}
