use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which recognizer the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    /// Only the legacy recognizer.
    TesseractOnly = 0,
    /// Only the LSTM recognizer.
    LstmOnly = 1,
    /// Legacy and LSTM combined.
    Combined = 2,
    /// Whatever the loaded language data supports.
    #[default]
    Default = 3,
}

impl EngineMode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::TesseractOnly,
            1 => Self::LstmOnly,
            2 => Self::Combined,
            3 => Self::Default,
            _ => return None,
        })
    }
}

/// How the engine splits the page into blocks, lines and words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSegmentation {
    /// Orientation and script detection only.
    Osd = 0,
    /// Automatic segmentation with OSD.
    SegmentationOsd = 1,
    /// Automatic segmentation, no OSD and no OCR.
    Segmentation = 2,
    /// Fully automatic segmentation without OSD.
    #[default]
    SegmentationOcr = 3,
    /// A single column of text of variable sizes.
    Column = 4,
    /// A single uniform block of vertically aligned text.
    VerticalBlock = 5,
    /// A single uniform block of text.
    Block = 6,
    /// A single text line.
    Line = 7,
    /// A single word.
    Word = 8,
    /// A single word in a circle.
    WordCircle = 9,
    /// A single character.
    Character = 10,
    /// As much text as possible, in no particular order.
    Sparse = 11,
    /// Sparse text with OSD.
    SparseOsd = 12,
    /// A single text line, bypassing engine-specific heuristics.
    Raw = 13,
}

impl PageSegmentation {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        use PageSegmentation::*;
        const ALL: [PageSegmentation; 14] = [
            Osd,
            SegmentationOsd,
            Segmentation,
            SegmentationOcr,
            Column,
            VerticalBlock,
            Block,
            Line,
            Word,
            WordCircle,
            Character,
            Sparse,
            SparseOsd,
            Raw,
        ];
        usize::try_from(code).ok().and_then(|i| ALL.get(i).copied())
    }
}

/// Engine configuration applied to a worker before it reads an image.
///
/// Equality is structural: a worker whose last applied options compare equal
/// to a request's snapshot skips re-initialisation entirely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrOptions {
    pub language: String,
    /// Directory holding `<language>.traineddata`; `None` lets the engine search.
    pub data_path: Option<PathBuf>,
    pub engine_mode: EngineMode,
    pub pixels_per_inch: u32,
    pub page_segmentation: PageSegmentation,
    /// Only these characters may be recognised.
    pub whitelist: Option<String>,
    /// These characters are never recognised.
    pub blacklist: Option<String>,
    pub numeric: bool,
    /// Extra engine config file read after initialisation.
    pub config_path: Option<PathBuf>,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            data_path: std::env::var_os("TESSDATA_PREFIX").map(PathBuf::from),
            engine_mode: EngineMode::Default,
            pixels_per_inch: 70,
            page_segmentation: PageSegmentation::SegmentationOcr,
            whitelist: None,
            blacklist: None,
            numeric: false,
            config_path: None,
        }
    }
}

impl OcrOptions {
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    pub fn with_engine_mode(mut self, mode: EngineMode) -> Self {
        self.engine_mode = mode;
        self
    }

    pub fn with_pixels_per_inch(mut self, ppi: u32) -> Self {
        self.pixels_per_inch = ppi;
        self
    }

    pub fn with_page_segmentation(mut self, mode: PageSegmentation) -> Self {
        self.page_segmentation = mode;
        self
    }

    pub fn with_whitelist(mut self, chars: impl Into<String>) -> Self {
        self.whitelist = Some(chars.into());
        self
    }

    pub fn with_blacklist(mut self, chars: impl Into<String>) -> Self {
        self.blacklist = Some(chars.into());
        self
    }

    pub fn with_numeric(mut self, numeric: bool) -> Self {
        self.numeric = numeric;
        self
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = OcrOptions::default();
        assert_eq!(opts.language, "eng");
        assert_eq!(opts.pixels_per_inch, 70);
        assert_eq!(opts.engine_mode, EngineMode::Default);
        assert_eq!(opts.page_segmentation, PageSegmentation::SegmentationOcr);
        assert!(!opts.numeric);
    }

    #[test]
    fn test_structural_equality() {
        let a = OcrOptions::default().with_whitelist("0123456789");
        let b = OcrOptions::default().with_whitelist("0123456789");
        assert_eq!(a, b);
        assert_ne!(a, b.with_numeric(true));
    }

    #[test]
    fn test_mode_codes() {
        assert_eq!(EngineMode::from_code(1), Some(EngineMode::LstmOnly));
        assert_eq!(EngineMode::from_code(4), None);
        assert_eq!(PageSegmentation::from_code(7), Some(PageSegmentation::Line));
        assert_eq!(PageSegmentation::from_code(13).map(|m| m.code()), Some(13));
        assert_eq!(PageSegmentation::from_code(-1), None);
        assert_eq!(PageSegmentation::from_code(14), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let opts: OcrOptions =
            serde_json::from_str(r#"{"language":"deu","page_segmentation":"line"}"#).unwrap();
        assert_eq!(opts.language, "deu");
        assert_eq!(opts.page_segmentation, PageSegmentation::Line);
        assert_eq!(opts.pixels_per_inch, 70);
    }
}
