//! Chart export: capture the chart content as pixels, encode to PNG or PDF
//! and hand the result to a download sink.
//!
//! The capture itself is abstracted behind [`Rasterizer`] so the controller
//! stays renderer-agnostic; the embedder supplies whatever can turn the
//! chart into an RGBA snapshot. Delivery goes through [`DownloadSink`],
//! preferring a data-URL save and falling back to raw-bytes ("blob") saving
//! for sinks that cannot take data URLs.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::ImageEncoder;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default basename when the embedder does not name the file.
pub const DEFAULT_BASENAME: &str = "OrgChart";

/// RGBA8 pixel capture of the chart content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl Snapshot {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    fn check(&self) -> Result<(), ExportError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.width == 0 || self.height == 0 || self.rgba.len() != expected {
            return Err(ExportError::Capture(format!(
                "snapshot geometry mismatch: {}x{} with {} bytes",
                self.width,
                self.height,
                self.rgba.len()
            )));
        }
        Ok(())
    }
}

/// Capture request passed to the [`Rasterizer`]. The chart is captured at
/// its full content extent with a neutral background and, briefly, an
/// identity transform so pan/zoom never crops the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    pub width: u32,
    pub height: u32,
    pub neutral_background: bool,
    pub neutral_transform: bool,
}

impl CaptureOptions {
    pub fn full_content(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            neutral_background: true,
            neutral_transform: true,
        }
    }
}

/// Turns the current chart content into pixels. Supplied by the embedder.
pub trait Rasterizer {
    fn capture(&self, options: &CaptureOptions) -> Result<Snapshot, ExportError>;
}

/// Receives the finished document. Implementations advertise which delivery
/// paths they support; [`deliver`] prefers the data-URL path and falls back
/// to raw bytes.
pub trait DownloadSink {
    fn supports_data_url(&self) -> bool {
        false
    }
    fn save_data_url(&self, _filename: &str, _data_url: &str) -> Result<(), ExportError> {
        Err(ExportError::NoDownloadPath)
    }
    fn supports_blob(&self) -> bool {
        false
    }
    fn save_blob(&self, _filename: &str, _bytes: &[u8]) -> Result<(), ExportError> {
        Err(ExportError::NoDownloadPath)
    }
}

/// Sink writing into a directory on disk. Blob-only; a data URL would just
/// be decoded again.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for FileSink {
    fn supports_blob(&self) -> bool {
        true
    }

    fn save_blob(&self, filename: &str, bytes: &[u8]) -> Result<(), ExportError> {
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote export");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Pdf,
}

impl ExportFormat {
    /// Case-insensitive parse; anything that is not "pdf" is PNG, matching
    /// the image-by-default contract.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("pdf") {
            Self::Pdf
        } else {
            Self::Png
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    /// A second export was requested while one is in flight.
    #[error("an export is already in progress")]
    AlreadyExporting,
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("encoding failed: {0}")]
    Encode(String),
    /// The sink supports neither delivery path.
    #[error("no download path available")]
    NoDownloadPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// PDF page geometry: landscape when the capture is wider than tall, with
/// the page sized to the pixel dimensions.
pub fn page_setup(width: u32, height: u32) -> (u32, u32, bool) {
    (width, height, width > height)
}

/// `"Name"` + format extension; empty or missing names use the default.
pub fn export_filename(basename: Option<&str>, format: ExportFormat) -> String {
    let base = match basename {
        Some(name) if !name.trim().is_empty() => name,
        _ => DEFAULT_BASENAME,
    };
    format!("{base}.{}", format.extension())
}

pub fn encode_png(snapshot: &Snapshot) -> Result<Vec<u8>, ExportError> {
    snapshot.check()?;
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            &snapshot.rgba,
            snapshot.width,
            snapshot.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(out)
}

/// Build the single-page PDF: the snapshot is JPEG-compressed at maximum
/// quality, embedded as a data URL in an SVG sized to the page, and the SVG
/// converted to PDF.
pub fn encode_pdf(snapshot: &Snapshot) -> Result<Vec<u8>, ExportError> {
    snapshot.check()?;
    let jpeg = encode_jpeg(snapshot)?;
    let (page_w, page_h, _landscape) = page_setup(snapshot.width, snapshot.height);

    let svg = format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" "#,
            r#"xmlns:xlink="http://www.w3.org/1999/xlink" "#,
            r#"width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<image x="0" y="0" width="{w}" height="{h}" "#,
            r#"xlink:href="data:image/jpeg;base64,{data}"/></svg>"#
        ),
        w = page_w,
        h = page_h,
        data = BASE64.encode(&jpeg),
    );

    let opt = svg2pdf::usvg::Options::default();
    let tree = svg2pdf::usvg::Tree::from_str(&svg, &opt)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| ExportError::Encode(e.to_string()))
}

/// Opaque JPEG intermediate for the PDF path. The capture background is
/// solid, so alpha is constant and can be dropped.
fn encode_jpeg(snapshot: &Snapshot) -> Result<Vec<u8>, ExportError> {
    let mut rgb = vec![0u8; snapshot.width as usize * snapshot.height as usize * 3];
    for (src, dst) in snapshot.rgba.chunks_exact(4).zip(rgb.chunks_exact_mut(3)) {
        dst[0] = src[0];
        dst[1] = src[1];
        dst[2] = src[2];
    }
    let mut out = Vec::new();
    let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 100);
    enc.encode(
        &rgb,
        snapshot.width,
        snapshot.height,
        image::ExtendedColorType::Rgb8,
    )
    .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(out)
}

/// Encode the snapshot in the requested format and hand it to the sink,
/// preferring the data-URL path, then raw bytes.
pub fn deliver(
    snapshot: &Snapshot,
    basename: Option<&str>,
    format: ExportFormat,
    sink: &dyn DownloadSink,
) -> Result<String, ExportError> {
    let bytes = match format {
        ExportFormat::Png => encode_png(snapshot)?,
        ExportFormat::Pdf => encode_pdf(snapshot)?,
    };
    let filename = export_filename(basename, format);

    if sink.supports_data_url() {
        let data_url = format!("data:{};base64,{}", format.mime(), BASE64.encode(&bytes));
        sink.save_data_url(&filename, &data_url)?;
    } else if sink.supports_blob() {
        sink.save_blob(&filename, &bytes)?;
    } else {
        return Err(ExportError::NoDownloadPath);
    }
    Ok(filename)
}
