//! Mapping from a `(from, to)` format pair to its converter.
//!
//! The table is closed: pairs not listed in [`Converter::resolve`] are
//! rejected with [`ConvertError::UnsupportedConversion`] before any work.

use crate::config::ConversionConfig;
use crate::converters::{pdf, raster, sheet, word};
use crate::error::ConvertError;
use crate::format::Format;
use crate::ingest::SourceFile;
use crate::output::ConvertedFile;
use crate::progress::ProgressReporter;

/// One supported conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    PdfToWord,
    PdfToText,
    PdfToImages,
    WordToPdf,
    ImageToImage,
    ImageToPdf,
    TextToPdf,
    TextToExcel,
    ExcelToText,
}

impl Converter {
    /// Look up the converter for `from` → `to`.
    pub fn resolve(from: Format, to: Format) -> Result<Self, ConvertError> {
        use Format::*;
        let converter = match (from, to) {
            (Pdf, Word) => Converter::PdfToWord,
            (Pdf, Text) => Converter::PdfToText,
            (Pdf, Jpg) | (Pdf, Png) => Converter::PdfToImages,
            (Word, Pdf) => Converter::WordToPdf,
            (Png, Jpg) | (Jpg, Png) => Converter::ImageToImage,
            (Jpg, Pdf) | (Png, Pdf) => Converter::ImageToPdf,
            (Text, Pdf) => Converter::TextToPdf,
            (Text, Excel) | (Json, Excel) => Converter::TextToExcel,
            (Excel, Text) => Converter::ExcelToText,
            _ => return Err(ConvertError::UnsupportedConversion { from, to }),
        };
        Ok(converter)
    }

    pub fn is_supported(from: Format, to: Format) -> bool {
        Self::resolve(from, to).is_ok()
    }

    /// Every supported pair, in registry order.
    pub fn supported_pairs() -> Vec<(Format, Format)> {
        Format::ALL
            .into_iter()
            .flat_map(|from| Format::ALL.into_iter().map(move |to| (from, to)))
            .filter(|&(from, to)| Self::is_supported(from, to))
            .collect()
    }

    /// Targets reachable from `from`.
    pub fn targets(from: Format) -> Vec<Format> {
        Format::ALL
            .into_iter()
            .filter(|&to| Self::is_supported(from, to))
            .collect()
    }

    /// Run the conversion. CPU-bound; call from a blocking context.
    pub fn run(
        self,
        source: &SourceFile,
        from: Format,
        to: Format,
        config: &ConversionConfig,
        progress: &ProgressReporter,
    ) -> Result<ConvertedFile, ConvertError> {
        match self {
            Converter::PdfToWord => pdf::pdf_to_word(source, progress),
            Converter::PdfToText => pdf::pdf_to_text(source, progress),
            Converter::PdfToImages => pdf::pdf_to_images(source, to, config, progress),
            Converter::WordToPdf => word::word_to_pdf(source, config, progress),
            Converter::ImageToImage => raster::image_to_image(source, from, to, config, progress),
            Converter::ImageToPdf => raster::image_to_pdf(source, from, progress),
            Converter::TextToPdf => word::text_to_pdf(source, config, progress),
            Converter::TextToExcel => sheet::text_to_excel(source, from, progress),
            Converter::ExcelToText => sheet::excel_to_text(source, progress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_supported_pairs() {
        let pairs = Converter::supported_pairs();
        assert_eq!(pairs.len(), 13);
        assert!(pairs.contains(&(Format::Json, Format::Excel)));
        assert!(!pairs.iter().any(|(f, _)| *f == Format::Powerpoint));
    }

    #[test]
    fn unsupported_pair_names_both_formats() {
        let err = Converter::resolve(Format::Excel, Format::Pdf).unwrap_err();
        assert_eq!(err.to_string(), "Conversion from excel to pdf is not supported.");
        assert!(Converter::resolve(Format::Png, Format::Png).is_err());
    }

    #[test]
    fn pdf_targets() {
        assert_eq!(
            Converter::targets(Format::Pdf),
            vec![Format::Word, Format::Jpg, Format::Png, Format::Text]
        );
    }
}
