//! PDF preview rendering for document uploads.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;
use shareprep_core::PixelDimensions;

use crate::image::fit_image;
use crate::process::{run_tool, validate_binary};
use crate::traits::PdfThumbnailer;

/// Leading bytes of a PDF file.
pub const PDF_MAGIC: &[u8] = b"%PDF";

/// Renders the first page with poppler's `pdftoppm`.
pub struct PdftoppmThumbnailer {
    binary: String,
}

impl PdftoppmThumbnailer {
    pub fn new(binary: String) -> Result<Self> {
        validate_binary(&binary).context("Invalid pdftoppm_path")?;
        Ok(Self { binary })
    }

    async fn render_first_page(&self, data: &[u8], bounds: PixelDimensions) -> Result<DynamicImage> {
        if !data.starts_with(PDF_MAGIC) {
            return Err(anyhow!("Missing PDF header"));
        }

        let workdir = tempfile::Builder::new().prefix("shareprep-pdf-").tempdir()?;
        let input = workdir.path().join("input.pdf");
        let prefix = workdir.path().join("page");
        tokio::fs::write(&input, data).await?;

        let scale_to = bounds.width.max(bounds.height).to_string();
        let input_arg = input.to_string_lossy().to_string();
        let prefix_arg = prefix.to_string_lossy().to_string();
        run_tool(
            &self.binary,
            [
                "-png",
                "-f",
                "1",
                "-l",
                "1",
                "-singlefile",
                "-scale-to",
                scale_to.as_str(),
                input_arg.as_str(),
                prefix_arg.as_str(),
            ],
        )
        .await?;

        let png = tokio::fs::read(prefix.with_extension("png")).await?;
        let page = image::load_from_memory(&png).context("Failed to decode rendered page")?;
        Ok(fit_image(&page, bounds))
    }
}

#[async_trait]
impl PdfThumbnailer for PdftoppmThumbnailer {
    async fn render(&self, data: Bytes, bounds: PixelDimensions) -> Option<DynamicImage> {
        match self.render_first_page(&data, bounds).await {
            Ok(page) => Some(page),
            Err(e) => {
                tracing::warn!(error = %e, "PDF preview unavailable");
                None
            }
        }
    }
}

/// Thumbnailer for hosts without a PDF renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPdfPreview;

#[async_trait]
impl PdfThumbnailer for NoPdfPreview {
    async fn render(&self, _data: Bytes, _bounds: PixelDimensions) -> Option<DynamicImage> {
        None
    }
}
