//! Async file reads used for imports and embedded cover art.

use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::fs;

/// Read a UTF-8 text file.
pub async fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Read a file and encode it as a `data:` URI suitable for the `image` field.
pub async fn read_data_uri(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }
    Ok(encode_data_uri(mime_for(path), &bytes))
}

/// Build a base64 `data:` URI from raw bytes.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Guess a MIME type from the file extension.
pub fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn embeds_image_as_data_uri() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("Cover.PNG");
        std::fs::write(&path, [0x89, b'P', b'N', b'G'])?;

        let uri = read_data_uri(&path).await?;
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_fails() -> Result<()> {
        let dir = tempdir()?;
        assert!(read_text(dir.path().join("nope.json")).await.is_err());
        assert!(read_data_uri(dir.path().join("nope.png")).await.is_err());
        Ok(())
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(mime_for(Path::new("cover")), "application/octet-stream");
        assert_eq!(mime_for(Path::new("cover.jpeg")), "image/jpeg");
    }
}
