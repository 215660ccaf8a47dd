use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet, XlsxError};

use super::{Cell, ReportTable};

const SHEET_NAME: &str = "Devices";
const HEADER_FILL: u32 = 0x00_40_80;

/// Render `table` as a single-sheet workbook: styled header row, frozen
/// header, autofilter and fitted column widths.
pub fn render_xlsx(table: &ReportTable) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin);

    for (col, name) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, column(col)?, name, &header)?;
    }

    for (idx, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, cell) in row.iter().enumerate() {
            write_cell(sheet, row_num, column(col)?, cell)?;
        }
    }

    if let Some(last_col) = table.headers.len().checked_sub(1) {
        let last_row =
            u32::try_from(table.rows.len()).map_err(|_| XlsxError::RowColumnLimitError)?;
        sheet.set_freeze_panes(1, 0)?;
        sheet.autofilter(0, 0, last_row, column(last_col)?)?;
    }
    sheet.autofit();

    workbook.save_to_buffer()
}

fn column(idx: usize) -> Result<u16, XlsxError> {
    u16::try_from(idx).map_err(|_| XlsxError::RowColumnLimitError)
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<(), XlsxError> {
    match cell {
        Cell::Empty => {}
        Cell::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
        Cell::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        // Integers beyond f64 precision stay text so the CSV and the
        // spreadsheet show the same digits.
        Cell::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() || f.to_string() == n.to_string() => {
                sheet.write_number(row, col, f)?;
            }
            _ => {
                sheet.write_string(row, col, n.to_string())?;
            }
        },
    }
    Ok(())
}
