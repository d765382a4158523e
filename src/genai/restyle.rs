//! Colour clean-up of downloaded images with an image-capable model.
//!
//! Each local image is sent with an editing prompt; the first image in the
//! reply replaces the original (after an optional `_backup` copy) or is
//! written next to the other outputs as `<name>_edited.<ext>`. Replies that
//! do not carry a recognisable PNG, JPEG, GIF or WEBP payload are discarded.

use super::pages::mime_for_path;
use super::{GenerateAsync, GenerateRequest, Generated, Part};
use crate::models::NewsRecord;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Pause between two images to stay under rate limits.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(5);

const EDIT_PROMPT: &str = "Modify this image by:
1. Adjust the color style to make it more vibrant and professional
2. Remove all logos and watermarks from the image
Keep all other aspects of the image intact. Return just the modified image.";

static DATA_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"data:(image/[A-Za-z0-9.+-]+);base64,([A-Za-z0-9+/=\s]+)").expect("valid regex")
});

/// How restyled images are stored.
#[derive(Debug, Clone)]
pub struct RestyleOptions {
    /// Folder for `_edited` copies and `processing_results.json`.
    pub output_dir: PathBuf,
    /// Copy each original to `<name>_backup.<ext>` first.
    pub backup: bool,
    /// Write the result over the original instead of into `output_dir`.
    pub overwrite: bool,
    /// Pause between images.
    pub pause: Duration,
}

impl Default for RestyleOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            backup: true,
            overwrite: true,
            pause: DEFAULT_PAUSE,
        }
    }
}

/// One processed image, as listed in `processing_results.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestyleResult {
    pub original: PathBuf,
    pub backup: Option<PathBuf>,
    pub edited: PathBuf,
}

/// Downloaded image files of `records` that still exist on disk.
pub fn local_image_paths(records: &[NewsRecord]) -> Vec<PathBuf> {
    records
        .iter()
        .flat_map(|record| &record.local_images)
        .map(|local| local.local_path.as_str())
        .filter(|path| !path.starts_with("http://") && !path.starts_with("https://"))
        .map(PathBuf::from)
        .filter(|path| {
            let exists = path.is_file();
            if !exists {
                warn!(path = %path.display(), "Image file not found");
            }
            exists
        })
        .collect()
}

/// Mime type implied by the leading bytes, for the formats we accept.
pub fn image_signature(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(b"\xFF\xD8\xFF") {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

fn extension_for(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// `<dir>/<stem>_backup.<ext>`.
pub fn backup_path(original: &Path) -> PathBuf {
    sibling_with_suffix(original, original.parent().unwrap_or(Path::new("")), "_backup", None)
}

/// `<output_dir>/<stem>_edited.<ext>`, the extension following the new format.
pub fn edited_path(original: &Path, output_dir: &Path, mime_type: &str) -> PathBuf {
    sibling_with_suffix(original, output_dir, "_edited", extension_for(mime_type))
}

fn sibling_with_suffix(original: &Path, dir: &Path, suffix: &str, ext: Option<&str>) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = ext
        .map(str::to_string)
        .or_else(|| original.extension().map(|e| e.to_string_lossy().into_owned()));
    match ext {
        Some(ext) => dir.join(format!("{stem}{suffix}.{ext}")),
        None => dir.join(format!("{stem}{suffix}")),
    }
}

/// The edited image carried by a reply: an inline image part, or a
/// `data:image/...;base64,` URI inside the text.
pub fn reply_image(generated: &Generated) -> Option<Vec<u8>> {
    if let Some((_, data)) = generated.first_image() {
        return Some(data.to_vec());
    }
    let text = generated.text();
    let caps = DATA_URI.captures(&text)?;
    let payload: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(payload).ok()
}

/// Restyle one image file.
///
/// Returns `Ok(None)` when the model replied without a usable image.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn restyle_image<G: GenerateAsync>(
    model: &G,
    path: &Path,
    options: &RestyleOptions,
) -> Result<Option<RestyleResult>, Box<dyn Error>> {
    let original = fs::read(path).await?;

    let backup = if options.backup {
        let backup = backup_path(path);
        fs::copy(path, &backup).await?;
        info!(backup = %backup.display(), "Created backup");
        Some(backup)
    } else {
        None
    };

    let mime_type = image_signature(&original).unwrap_or_else(|| mime_for_path(path));
    let request = GenerateRequest {
        parts: vec![
            Part::Text(EDIT_PROMPT.to_string()),
            Part::Image {
                mime_type: mime_type.to_string(),
                data: original,
            },
        ],
        want_images: true,
    };
    let generated = model.generate(&request).await?;

    let Some(bytes) = reply_image(&generated) else {
        warn!(reply = %generated.text(), "No image in model reply");
        return Ok(None);
    };
    let Some(new_mime) = image_signature(&bytes) else {
        warn!(bytes = bytes.len(), "Model reply is not a valid image; keeping original");
        return Ok(None);
    };

    let edited = if options.overwrite {
        path.to_path_buf()
    } else {
        fs::create_dir_all(&options.output_dir).await?;
        edited_path(path, &options.output_dir, new_mime)
    };
    fs::write(&edited, &bytes).await?;
    info!(edited = %edited.display(), "Saved edited image");

    Ok(Some(RestyleResult {
        original: path.to_path_buf(),
        backup,
        edited,
    }))
}

/// Restyle every downloaded image of `records`, one at a time.
///
/// Per-image failures are logged and skipped. A summary is written to
/// `<output_dir>/processing_results.json`.
#[instrument(level = "info", skip_all, fields(output_dir = %options.output_dir.display()))]
pub async fn restyle_images<G: GenerateAsync>(
    model: &G,
    records: &[NewsRecord],
    options: &RestyleOptions,
) -> Result<Vec<RestyleResult>, Box<dyn Error>> {
    let paths = local_image_paths(records);
    if paths.is_empty() {
        info!("No downloaded images to restyle");
        return Ok(Vec::new());
    }
    info!(count = paths.len(), "Found images to process");

    let mut results = Vec::new();
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            sleep(options.pause).await;
        }
        match restyle_image(model, path, options).await {
            Ok(Some(result)) => results.push(result),
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to process image"),
        }
    }

    fs::create_dir_all(&options.output_dir).await?;
    let summary = options.output_dir.join("processing_results.json");
    fs::write(&summary, serde_json::to_vec_pretty(&results)?).await?;
    info!(processed = results.len(), path = %summary.display(), "Processing complete");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::ScriptedModel;
    use crate::genai::pages::data_uri;
    use crate::models::{ImageRef, LocalImageRef, sample_record};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF";

    fn image_reply(data: &[u8]) -> Result<Generated, String> {
        Ok(Generated {
            parts: vec![Part::Image {
                mime_type: "image/png".to_string(),
                data: data.to_vec(),
            }],
        })
    }

    fn options(dir: &Path, overwrite: bool) -> RestyleOptions {
        RestyleOptions {
            output_dir: dir.join("output"),
            backup: true,
            overwrite,
            pause: Duration::ZERO,
        }
    }

    #[test]
    fn test_image_signature() {
        assert_eq!(image_signature(PNG), Some("image/png"));
        assert_eq!(image_signature(JPEG), Some("image/jpeg"));
        assert_eq!(image_signature(b"GIF89a..."), Some("image/gif"));
        assert_eq!(image_signature(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(image_signature(b"<html>"), None);
        assert_eq!(image_signature(b""), None);
    }

    #[test]
    fn test_backup_and_edited_paths() {
        let original = Path::new("imgs/article_1/image_1_chart.jpg");
        assert_eq!(
            backup_path(original),
            Path::new("imgs/article_1/image_1_chart_backup.jpg")
        );
        assert_eq!(
            edited_path(original, Path::new("output"), "image/png"),
            Path::new("output/image_1_chart_edited.png")
        );
        assert_eq!(
            edited_path(original, Path::new("output"), "application/octet-stream"),
            Path::new("output/image_1_chart_edited.jpg")
        );
    }

    #[test]
    fn test_reply_image_from_text_data_uri() {
        let generated = Generated {
            parts: vec![Part::Text(format!(
                "Here it is: {}",
                data_uri("image/png", PNG)
            ))],
        };
        assert_eq!(reply_image(&generated).as_deref(), Some(PNG));
        assert_eq!(reply_image(&Generated::default()), None);
    }

    #[tokio::test]
    async fn test_restyle_overwrites_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image_1_a.jpg");
        std::fs::write(&path, JPEG).unwrap();
        let model = ScriptedModel::new(vec![image_reply(PNG)]);

        let result = restyle_image(&model, &path, &options(dir.path(), true))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.edited, path);
        assert_eq!(std::fs::read(&path).unwrap(), PNG);
        let backup = result.backup.unwrap();
        assert_eq!(std::fs::read(backup).unwrap(), JPEG);

        let request = &model.requests.borrow()[0];
        assert!(request.want_images);
        assert!(matches!(&request.parts[1], Part::Image { mime_type, .. } if mime_type == "image/jpeg"));
    }

    #[tokio::test]
    async fn test_restyle_rejects_invalid_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, JPEG).unwrap();
        let model = ScriptedModel::new(vec![image_reply(b"not an image")]);

        let result = restyle_image(&model, &path, &options(dir.path(), true))
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(std::fs::read(&path).unwrap(), JPEG);
    }

    #[tokio::test]
    async fn test_restyle_images_writes_edited_copies_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("b.jpg");
        std::fs::write(&a, JPEG).unwrap();
        std::fs::write(&b, JPEG).unwrap();

        let mut record = sample_record("A", None);
        record.local_images = [&a, &b, &dir.path().join("missing.jpg")]
            .iter()
            .map(|p| LocalImageRef {
                image: ImageRef::new("https://x/i.jpg", "", ""),
                local_path: p.to_string_lossy().into_owned(),
            })
            .collect();
        let model = ScriptedModel::new(vec![image_reply(PNG), Err("quota".to_string())]);
        let opts = RestyleOptions {
            backup: false,
            ..options(dir.path(), false)
        };

        let results = restyle_images(&model, &[record], &opts).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].edited, opts.output_dir.join("a_edited.png"));
        assert_eq!(std::fs::read(&a).unwrap(), JPEG);
        assert!(opts.output_dir.join("processing_results.json").exists());
        assert_eq!(model.requests.borrow().len(), 2);
    }
}
