//! Text/JSON → Excel and Excel → CSV text.

use super::{converted, require_content};
use crate::error::ConvertError;
use crate::format::Format;
use crate::ingest::SourceFile;
use crate::output::{ConversionStats, ConvertedFile};
use crate::pipeline::sheet::{first_sheet_csv, parse_grid, write_xlsx};
use crate::progress::ProgressReporter;
use tracing::debug;

/// Build a one-sheet workbook from delimited text or a JSON array.
///
/// Progress: 90 once the workbook is written.
pub fn text_to_excel(
    source: &SourceFile,
    from: Format,
    progress: &ProgressReporter,
) -> Result<ConvertedFile, ConvertError> {
    let input = String::from_utf8_lossy(&source.bytes);
    let grid = parse_grid(&input);
    debug!("Parsed {} rows from {}", grid.len(), source.name);

    let bytes = write_xlsx(&grid).map_err(|e| ConvertError::encode(Format::Excel, e))?;
    progress.report(90);
    Ok(converted(source, from, Format::Excel, bytes, ConversionStats::default()))
}

/// First worksheet as CSV. A first sheet with no cells is an `Encode`
/// error rather than an empty text file.
///
/// Progress: 90 once the CSV is produced.
pub fn excel_to_text(source: &SourceFile, progress: &ProgressReporter) -> Result<ConvertedFile, ConvertError> {
    let csv = first_sheet_csv(&source.bytes).map_err(|e| ConvertError::decode(Format::Excel, e))?;
    let bytes = require_content(csv.into_bytes(), Format::Text, "first worksheet")?;
    progress.report(90);
    Ok(converted(
        source,
        Format::Excel,
        Format::Text,
        bytes,
        ConversionStats::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_to_excel_and_back() {
        let source = SourceFile::new("rows.json", br#"[{"a": 1, "b": "x"}, {"a": 2, "b": "y"}]"#.to_vec());
        let progress = ProgressReporter::silent();
        let xlsx = text_to_excel(&source, Format::Json, &progress).unwrap();
        assert_eq!(xlsx.file_name, "rows.xlsx");
        assert_eq!(progress.current(), 90);

        let back = excel_to_text(&SourceFile::new(xlsx.file_name.clone(), xlsx.bytes), &progress).unwrap();
        assert_eq!(back.file_name, "rows.txt");
        assert_eq!(String::from_utf8(back.bytes).unwrap(), "1,x\n2,y\n");
    }

    #[test]
    fn empty_first_sheet_is_encode_error() {
        let bytes = write_xlsx(&parse_grid("[]")).unwrap();
        let progress = ProgressReporter::silent();
        let err = excel_to_text(&SourceFile::new("empty.xlsx", bytes), &progress).unwrap_err();
        assert!(matches!(err, ConvertError::Encode { format: Format::Text, .. }));
        assert_eq!(progress.current(), 0);
    }

    #[test]
    fn not_a_workbook_is_decode_error() {
        let err = excel_to_text(&SourceFile::new("x.xlsx", b"nope".to_vec()), &ProgressReporter::silent())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Decode { format: Format::Excel, .. }));
    }
}
