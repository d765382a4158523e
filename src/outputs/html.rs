//! Self-contained HTML report.
//!
//! Downloaded images are linked by their path relative to the report file so
//! the report and the image folder can be moved together. Remote images are
//! used only when nothing was downloaded for a record. All text is escaped.

use super::retrieved_at;
use crate::models::{NewsRecord, ScrapeOutcome};
use std::error::Error;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

const STYLE: &str = r#"        body { font-family: Arial, sans-serif; margin: 20px; line-height: 1.6; }
        .container { max-width: 1200px; margin: 0 auto; }
        h1 { color: #333; border-bottom: 2px solid #eee; padding-bottom: 10px; }
        .article { margin: 30px 0; border: 1px solid #ddd; padding: 20px; border-radius: 5px; }
        .article h2 { margin-top: 0; color: #2c3e50; }
        .article-meta { font-size: 0.9em; color: #7f8c8d; margin-bottom: 15px; }
        .tag { display: inline-block; background: #eee; padding: 2px 8px; margin-right: 5px; border-radius: 3px; font-size: 0.8em; }
        .summary { font-style: italic; background: #f9f9f9; padding: 10px; border-left: 3px solid #ddd; }
        .images { display: flex; flex-wrap: wrap; gap: 10px; margin: 15px 0; }
        .image-container { margin: 10px 0; }
        .image-container img { max-width: 100%; max-height: 400px; border: 1px solid #ddd; }
        .image-caption { font-size: 0.8em; color: #666; margin-top: 5px; }
        .content { line-height: 1.7; }
"#;

/// Write the report for `outcome` to `path`.
///
/// # Returns
///
/// `Ok(false)` for the error shape or an empty run, `Ok(true)` once written.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_html_report(
    outcome: &ScrapeOutcome,
    path: &Path,
) -> Result<bool, Box<dyn Error>> {
    let Some(records) = outcome.records().filter(|r| !r.is_empty()) else {
        return Ok(false);
    };

    let report_dir = path.parent().unwrap_or(Path::new(""));
    fs::write(path, render_html(records, report_dir, &retrieved_at())).await?;
    info!(records = records.len(), "Wrote HTML report");
    Ok(true)
}

/// Render the report; local image paths are made relative to `report_dir`.
pub fn render_html(records: &[NewsRecord], report_dir: &Path, retrieved_at: &str) -> String {
    let mut out = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Cryptocurrency News Report</title>
    <style>
{STYLE}    </style>
</head>
<body>
    <div class="container">
        <h1>Cryptocurrency News Report</h1>
        <p>Retrieved at: {}</p>
"#,
        escape_html(retrieved_at)
    );

    for record in records {
        render_article(&mut out, record, report_dir);
    }

    out.push_str("    </div>\n</body>\n</html>\n");
    out
}

fn render_article(out: &mut String, record: &NewsRecord, report_dir: &Path) {
    let title = escape_html(&record.title);
    out.push_str("<div class=\"article\">\n");
    match &record.url {
        Some(url) => {
            out.push_str(&format!(
                "<h2><a href=\"{}\" target=\"_blank\">{title}</a></h2>\n",
                escape_html(url)
            ));
        }
        None => {
            out.push_str(&format!("<h2>{title}</h2>\n"));
        }
    }

    out.push_str("<div class=\"article-meta\">\n");
    out.push_str(&format!("<span>Time: {}</span>\n", escape_html(&record.timestamp)));
    if !record.tags.is_empty() {
        out.push_str("<div class=\"tags\">\n");
        for tag in &record.tags {
            out.push_str(&format!("<span class=\"tag\">{}</span>\n", escape_html(tag)));
        }
        out.push_str("</div>\n");
    }
    out.push_str("</div>\n");

    if !record.summary.is_empty() {
        out.push_str(&format!("<div class=\"summary\">{}</div>\n", escape_html(&record.summary)));
    }

    let images = record.display_images();
    if !images.is_empty() {
        out.push_str("<div class=\"images\">\n");
        for (image, local_path) in images {
            let src = match local_path {
                Some(local) => relative_path(Path::new(local), report_dir),
                None => image.url.clone(),
            };
            out.push_str("<div class=\"image-container\">\n");
            out.push_str(&format!(
                "<img src=\"{}\" alt=\"{}\">\n",
                escape_html(&src),
                escape_html(&image.alt)
            ));
            let caption = if image.alt.is_empty() { &image.title } else { &image.alt };
            if !caption.is_empty() {
                out.push_str(&format!("<p class=\"image-caption\">{}</p>\n", escape_html(caption)));
            }
            out.push_str("</div>\n");
        }
        out.push_str("</div>\n");
    }

    if !record.content.is_empty() {
        out.push_str("<div class=\"content\">\n");
        for paragraph in record.content.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            out.push_str(&format!("<p>{}</p>\n", escape_html(paragraph)));
        }
        out.push_str("</div>\n");
    }

    out.push_str("</div>\n");
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// `target` relative to `base`, with `/` separators.
///
/// Both paths are taken lexically; `.` components are ignored. If one is
/// absolute and the other is not, the relative one is anchored at the
/// current directory first.
pub fn relative_path(target: &Path, base: &Path) -> String {
    let anchor = |p: &Path| -> PathBuf {
        if p.is_absolute() || target.is_absolute() == base.is_absolute() {
            p.to_path_buf()
        } else {
            std::env::current_dir().unwrap_or_default().join(p)
        }
    };
    let target = anchor(target);
    let base = anchor(base);

    let components = |p: &Path| -> Vec<String> {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect()
    };
    let target = components(&target);
    let base = components(&base);

    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();
    let parts: Vec<&str> = std::iter::repeat_n("..", base.len() - common)
        .chain(target[common..].iter().map(String::as_str))
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageRef, LocalImageRef, sample_record};

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("imgs/article_1/a.jpg"), Path::new("")),
            "imgs/article_1/a.jpg"
        );
        assert_eq!(
            relative_path(Path::new("./imgs/a.jpg"), Path::new(".")),
            "imgs/a.jpg"
        );
        assert_eq!(
            relative_path(Path::new("imgs/a.jpg"), Path::new("reports")),
            "../imgs/a.jpg"
        );
        assert_eq!(
            relative_path(Path::new("/data/out/imgs/a.jpg"), Path::new("/data/out")),
            "imgs/a.jpg"
        );
    }

    #[test]
    fn test_render_escapes_and_links() {
        let record = sample_record("<script>alert(1)</script>", Some("https://crypto.news/a?x=1&y=2"));
        let html = render_html(&[record], Path::new(""), "2025-05-06 14:30:00");

        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"href="https://crypto.news/a?x=1&amp;y=2""#));
        assert!(html.contains("<p>First paragraph.</p>\n<p>Second paragraph.</p>"));
        assert!(html.contains(r#"<span class="tag">Bitcoin</span>"#));
    }

    #[test]
    fn test_render_prefers_local_images() {
        let mut record = sample_record("A", None);
        record.images = vec![
            ImageRef::new("https://crypto.news/a.jpg", "", "Caption"),
            ImageRef::new("https://crypto.news/b.jpg", "", ""),
        ];
        record.local_images = vec![LocalImageRef {
            image: record.images[0].clone(),
            local_path: "out/imgs/article_1/image_1_a.jpg".to_string(),
        }];

        let html = render_html(&[record], Path::new("out"), "now");

        assert!(html.contains(r#"<img src="imgs/article_1/image_1_a.jpg" alt="">"#));
        assert!(html.contains(r#"<p class="image-caption">Caption</p>"#));
        assert!(!html.contains("b.jpg"));
    }

    #[test]
    fn test_render_remote_images_without_downloads() {
        let mut record = sample_record("A", None);
        record.images = vec![ImageRef::new("https://crypto.news/a.jpg", "Alt", "")];
        let html = render_html(&[record], Path::new(""), "now");
        assert!(html.contains(r#"<img src="https://crypto.news/a.jpg" alt="Alt">"#));
    }

    #[tokio::test]
    async fn test_write_html_skips_error_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.html");
        let failed = ScrapeOutcome::Failed {
            error: "x".to_string(),
        };
        assert!(!write_html_report(&failed, &path).await.unwrap());
        assert!(!path.exists());
    }
}
