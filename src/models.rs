use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candidate barcode region in source-image pixel space.
///
/// `x2`/`y2` are exclusive. Rectangles come from an external localization
/// step and are never mutated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Rectangle {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// The vertical lower half, where the printed digits usually sit.
    pub fn lower_half(&self) -> Rectangle {
        Rectangle {
            x1: self.x1,
            y1: self.y1 + self.height() / 2,
            x2: self.x2,
            y2: self.y2,
        }
    }

    /// Crop this rectangle out of `img`, clamping the far edges to the image.
    ///
    /// Returns `None` when the clamped crop has zero area.
    pub fn extract_roi(&self, img: &DynamicImage) -> Option<DynamicImage> {
        let x2 = self.x2.min(img.width());
        let y2 = self.y2.min(img.height());
        if self.x1 >= x2 || self.y1 >= y2 {
            return None;
        }

        Some(img.crop_imm(self.x1, self.y1, x2 - self.x1, y2 - self.y1))
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})-({}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

impl FromStr for Rectangle {
    type Err = anyhow::Error;

    /// Parses `x1,y1,x2,y2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid rectangle '{}': {}", s, e))?;

        match parts.as_slice() {
            [x1, y1, x2, y2] => Ok(Rectangle::new(*x1, *y1, *x2, *y2)),
            _ => anyhow::bail!("Invalid rectangle '{}': expected x1,y1,x2,y2", s),
        }
    }
}

/// Which crop of a rectangle produced its winner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingSource {
    FullArea,
    LowerHalf,
}

/// Outcome for a single input rectangle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionReading {
    pub index: usize,
    pub rect: Rectangle,
    /// Winning digit string, `None` when neither crop produced a candidate
    pub digits: Option<String>,
    pub source: Option<ReadingSource>,
}

impl RegionReading {
    pub fn unrecognized(index: usize, rect: Rectangle) -> Self {
        Self {
            index,
            rect,
            digits: None,
            source: None,
        }
    }
}

/// Per-image result, one reading per input rectangle in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecognitionResult {
    pub regions: Vec<RegionReading>,
}

impl RecognitionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Winners in rectangle order; rectangles without a winner are skipped.
    pub fn winners(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().filter_map(|r| r.digits.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.winners().next().is_none()
    }

    /// Space-joined winners
    pub fn text(&self) -> String {
        self.winners().collect::<Vec<_>>().join(" ")
    }

    /// Console report, one `Barcode: <digits>` line per winner.
    pub fn report_lines(&self) -> Vec<String> {
        if self.is_empty() {
            return vec!["Barcode: not recognized".to_string()];
        }
        self.winners().map(|d| format!("Barcode: {}", d)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn test_image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 0])))
    }

    #[test]
    fn test_lower_half_floors_height() {
        let rect = Rectangle::new(10, 20, 50, 41);
        let lower = rect.lower_half();
        assert_eq!(lower, Rectangle::new(10, 30, 50, 41));
    }

    #[test]
    fn test_extract_roi_offsets() {
        let img = test_image(100, 80);
        let roi = Rectangle::new(10, 5, 30, 25).extract_roi(&img).unwrap();
        assert_eq!((roi.width(), roi.height()), (20, 20));
        assert_eq!(roi.to_rgb8().get_pixel(0, 0)[0], 10);
        assert_eq!(roi.to_rgb8().get_pixel(0, 0)[1], 5);
    }

    #[test]
    fn test_extract_roi_clamps_to_image() {
        let img = test_image(100, 80);
        let roi = Rectangle::new(90, 70, 200, 200).extract_roi(&img).unwrap();
        assert_eq!((roi.width(), roi.height()), (10, 10));
    }

    #[test]
    fn test_extract_roi_zero_area() {
        let img = test_image(100, 80);
        assert!(Rectangle::new(10, 10, 10, 40).extract_roi(&img).is_none());
        assert!(Rectangle::new(10, 10, 40, 10).extract_roi(&img).is_none());
        assert!(Rectangle::new(120, 10, 140, 40).extract_roi(&img).is_none());
        assert!(Rectangle::new(40, 10, 20, 40).extract_roi(&img).is_none());
    }

    #[test]
    fn test_parse_rectangle() {
        let rect: Rectangle = "1, 2,30,40".parse().unwrap();
        assert_eq!(rect, Rectangle::new(1, 2, 30, 40));
        assert!("1,2,3".parse::<Rectangle>().is_err());
        assert!("a,b,c,d".parse::<Rectangle>().is_err());
    }

    #[test]
    fn test_report_lines() {
        let rect = Rectangle::new(0, 0, 10, 10);
        let mut result = RecognitionResult::empty();
        assert_eq!(result.report_lines(), vec!["Barcode: not recognized"]);
        assert_eq!(result.text(), "");

        result.regions.push(RegionReading {
            index: 0,
            rect,
            digits: Some("12345678".to_string()),
            source: Some(ReadingSource::FullArea),
        });
        result.regions.push(RegionReading::unrecognized(1, rect));
        result.regions.push(RegionReading {
            index: 2,
            rect,
            digits: Some("987".to_string()),
            source: Some(ReadingSource::LowerHalf),
        });

        assert_eq!(result.text(), "12345678 987");
        assert_eq!(result.report_lines(), vec!["Barcode: 12345678", "Barcode: 987"]);
    }
}
