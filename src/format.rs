//! Format registry: the closed set of file formats and their static metadata.
//!
//! Every format the tool knows about has exactly one [`FormatDescriptor`],
//! defined at compile time and looked up by [`Format`]. The registry is pure
//! data; nothing here touches file contents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A file format identifier, as used in conversion routes (`pdf`, `word`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Pdf,
    Word,
    Excel,
    /// Listed in the registry for upload hints; no converter accepts it.
    Powerpoint,
    Jpg,
    Png,
    Text,
    Json,
}

/// Icon shown next to a format in a file picker or listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatIcon {
    Document,
    Image,
    Spreadsheet,
    File,
}

/// Static display metadata for one [`Format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    pub id: Format,
    pub display_name: &'static str,
    /// Lower-case extensions including the leading dot, e.g. `".docx"`.
    pub accepted_extensions: &'static [&'static str],
    pub icon: FormatIcon,
    /// Accent colour reference for UIs.
    pub color: &'static str,
    /// MIME type of files *produced* in this format.
    pub mime_type: &'static str,
    /// Extension (without dot) given to files produced in this format.
    pub output_extension: &'static str,
}

static REGISTRY: [FormatDescriptor; 8] = [
    FormatDescriptor {
        id: Format::Pdf,
        display_name: "PDF",
        accepted_extensions: &[".pdf"],
        icon: FormatIcon::Document,
        color: "red",
        mime_type: "application/pdf",
        output_extension: "pdf",
    },
    FormatDescriptor {
        id: Format::Word,
        display_name: "Word",
        accepted_extensions: &[".doc", ".docx"],
        icon: FormatIcon::Document,
        color: "blue",
        mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        output_extension: "docx",
    },
    FormatDescriptor {
        id: Format::Excel,
        display_name: "Excel",
        accepted_extensions: &[".xls", ".xlsx"],
        icon: FormatIcon::Spreadsheet,
        color: "green",
        mime_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        output_extension: "xlsx",
    },
    FormatDescriptor {
        id: Format::Powerpoint,
        display_name: "PowerPoint",
        accepted_extensions: &[".ppt", ".pptx"],
        icon: FormatIcon::Document,
        color: "orange",
        mime_type: "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        output_extension: "pptx",
    },
    FormatDescriptor {
        id: Format::Jpg,
        display_name: "JPG",
        accepted_extensions: &[".jpg", ".jpeg"],
        icon: FormatIcon::Image,
        color: "purple",
        mime_type: "image/jpeg",
        output_extension: "jpg",
    },
    FormatDescriptor {
        id: Format::Png,
        display_name: "PNG",
        accepted_extensions: &[".png"],
        icon: FormatIcon::Image,
        color: "indigo",
        mime_type: "image/png",
        output_extension: "png",
    },
    FormatDescriptor {
        id: Format::Text,
        display_name: "Text",
        accepted_extensions: &[".txt"],
        icon: FormatIcon::File,
        color: "gray",
        mime_type: "text/plain",
        output_extension: "txt",
    },
    FormatDescriptor {
        id: Format::Json,
        display_name: "JSON",
        accepted_extensions: &[".json"],
        icon: FormatIcon::File,
        color: "yellow",
        mime_type: "application/json",
        output_extension: "json",
    },
];

/// MIME type of the page-image archive produced by PDF→JPG/PNG.
pub const ZIP_MIME: &str = "application/zip";

impl Format {
    /// Every format, in registry order.
    pub const ALL: [Format; 8] = [
        Format::Pdf,
        Format::Word,
        Format::Excel,
        Format::Powerpoint,
        Format::Jpg,
        Format::Png,
        Format::Text,
        Format::Json,
    ];

    /// Static metadata for this format.
    pub fn descriptor(self) -> &'static FormatDescriptor {
        // REGISTRY is laid out in `ALL` order.
        &REGISTRY[self as usize]
    }

    /// Route identifier (`"pdf"`, `"word"`, …).
    pub fn id(self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Word => "word",
            Format::Excel => "excel",
            Format::Powerpoint => "powerpoint",
            Format::Jpg => "jpg",
            Format::Png => "png",
            Format::Text => "text",
            Format::Json => "json",
        }
    }

    /// Guess the format of a file from its extension (case-insensitive).
    pub fn from_path(path: impl AsRef<Path>) -> Option<Format> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        let dotted = format!(".{ext}");
        Format::ALL
            .into_iter()
            .find(|f| f.descriptor().accepted_extensions.contains(&dotted.as_str()))
    }

    /// Whether a file name carries one of this format's accepted extensions.
    ///
    /// Advisory only: nothing in the library refuses a file because of it.
    pub fn accepts_name(self, file_name: &str) -> bool {
        let lower = file_name.to_ascii_lowercase();
        self.descriptor()
            .accepted_extensions
            .iter()
            .any(|ext| lower.ends_with(ext))
    }

    pub fn is_raster(self) -> bool {
        matches!(self, Format::Jpg | Format::Png)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Format::Pdf),
            "word" | "docx" | "doc" => Ok(Format::Word),
            "excel" | "xlsx" | "xls" => Ok(Format::Excel),
            "powerpoint" | "pptx" | "ppt" => Ok(Format::Powerpoint),
            "jpg" | "jpeg" => Ok(Format::Jpg),
            "png" => Ok(Format::Png),
            "text" | "txt" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => Err(format!(
                "unknown format '{other}' (expected one of: pdf, word, excel, powerpoint, jpg, png, text, json)"
            )),
        }
    }
}

/// All registry entries, in a stable order.
pub fn registry() -> &'static [FormatDescriptor] {
    &REGISTRY
}

/// Name for a converted file: the source stem plus the target's extension.
///
/// PDF→JPG/PNG always produces a zip archive of page images.
pub fn output_file_name(source_name: &str, from: Format, to: Format) -> String {
    let ext = download_extension(from, to);
    format!("{}.{}", file_stem(source_name), ext)
}

/// Extension (without dot) of the file produced by converting `from` → `to`.
pub fn download_extension(from: Format, to: Format) -> &'static str {
    if from == Format::Pdf && to.is_raster() {
        "zip"
    } else {
        to.descriptor().output_extension
    }
}

/// File name without its final extension; names without one are returned whole.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_indexed_by_format() {
        for f in Format::ALL {
            assert_eq!(f.descriptor().id, f, "registry slot for {f}");
        }
    }

    #[test]
    fn parse_and_display_round_trip() {
        for f in Format::ALL {
            assert_eq!(f.to_string().parse::<Format>().unwrap(), f);
        }
        assert_eq!("JPEG".parse::<Format>().unwrap(), Format::Jpg);
        assert!("gif".parse::<Format>().is_err());
    }

    #[test]
    fn from_path_uses_accepted_extensions() {
        assert_eq!(Format::from_path("a/b/Report.DOCX"), Some(Format::Word));
        assert_eq!(Format::from_path("photo.jpeg"), Some(Format::Jpg));
        assert_eq!(Format::from_path("data.json"), Some(Format::Json));
        assert_eq!(Format::from_path("archive.tar"), None);
        assert_eq!(Format::from_path("noext"), None);
    }

    #[test]
    fn accepts_name_is_case_insensitive() {
        assert!(Format::Excel.accepts_name("Budget.XLS"));
        assert!(!Format::Excel.accepts_name("budget.csv"));
    }

    #[test]
    fn output_names() {
        assert_eq!(output_file_name("report.pdf", Format::Pdf, Format::Word), "report.docx");
        assert_eq!(output_file_name("scan.pdf", Format::Pdf, Format::Png), "scan.zip");
        assert_eq!(output_file_name("pic.png", Format::Png, Format::Jpg), "pic.jpg");
        assert_eq!(output_file_name("notes", Format::Text, Format::Pdf), "notes.pdf");
        assert_eq!(output_file_name("a.b.txt", Format::Text, Format::Excel), "a.b.xlsx");
        assert_eq!(output_file_name("sheet.xlsx", Format::Excel, Format::Text), "sheet.txt");
    }

    #[test]
    fn stem_keeps_dotfiles() {
        assert_eq!(file_stem(".hidden"), ".hidden");
        assert_eq!(file_stem("x.pdf"), "x");
    }
}
