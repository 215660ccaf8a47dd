use super::ReportTable;

/// Render `table` as RFC 4180 CSV. An empty table still gets its header row.
pub fn render_csv(table: &ReportTable) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.as_text().into_owned()))?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::report::Cell;

    fn table(rows: Vec<Vec<Cell>>) -> ReportTable {
        ReportTable {
            headers: vec!["device_id".into(), "note".into()],
            rows,
        }
    }

    #[test]
    fn empty_table_writes_header_only() {
        let bytes = render_csv(&table(Vec::new())).expect("render");
        assert_eq!(String::from_utf8(bytes).expect("utf8"), "device_id,note\r\n");
    }

    #[test]
    fn fields_are_quoted_when_needed() {
        let bytes = render_csv(&table(vec![vec![
            Cell::Text("a,1".into()),
            Cell::Text("said \"hi\"\nbye".into()),
        ]]))
        .expect("render");

        assert_eq!(
            String::from_utf8(bytes).expect("utf8"),
            "device_id,note\r\n\"a,1\",\"said \"\"hi\"\"\nbye\"\r\n"
        );
    }

    #[test]
    fn empty_cells_render_blank() {
        let bytes = render_csv(&table(vec![vec![Cell::Text("x".into()), Cell::Empty]]))
            .expect("render");
        assert_eq!(String::from_utf8(bytes).expect("utf8"), "device_id,note\r\nx,\r\n");
    }
}
