use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::debug;

/// Plain text of a submitted document. Page breaks are kept as form feeds.
pub fn extract_text(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let text = match extension.as_str() {
        "txt" | "text" | "md" => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        "pdf" => extract_with_pdftotext(path)?,
        "docx" => extract_docx_text(path)?,
        other => bail!(
            "unsupported document format '{}' for {}",
            if other.is_empty() { "(none)" } else { other },
            path.display()
        ),
    };

    debug!(
        path = %path.display(),
        chars = text.chars().count(),
        "extracted document text"
    );
    Ok(text)
}

fn extract_with_pdftotext(pdf_path: &Path) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).replace('\u{0000}', ""))
}

fn extract_docx_text(docx_path: &Path) -> Result<String> {
    let output = Command::new("unzip")
        .arg("-p")
        .arg(docx_path)
        .arg("word/document.xml")
        .output()
        .with_context(|| format!("failed to execute unzip for {}", docx_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "unzip could not read word/document.xml from {}: {}",
            docx_path.display(),
            stderr.trim()
        );
    }

    wordprocessing_xml_to_text(&String::from_utf8_lossy(&output.stdout))
}

/// Flattens WordprocessingML body markup into newline-separated paragraphs.
fn wordprocessing_xml_to_text(xml: &str) -> Result<String> {
    let page_break = Regex::new(r#"<w:br\s+w:type="page"\s*/>"#)
        .context("failed to compile docx page break regex")?;
    let paragraph_end =
        Regex::new(r"</w:p>|<w:br\s*/>").context("failed to compile docx paragraph regex")?;
    let tab = Regex::new(r"<w:tab\s*/>").context("failed to compile docx tab regex")?;
    let tag = Regex::new(r"<[^>]+>").context("failed to compile docx tag regex")?;

    let text = page_break.replace_all(xml, "\n\u{000C}");
    let text = paragraph_end.replace_all(&text, "\n");
    let text = tab.replace_all(&text, "\t");
    let text = tag.replace_all(&text, "");

    Ok(decode_xml_entities(&text))
}

fn decode_xml_entities(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
