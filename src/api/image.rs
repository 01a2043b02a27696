// Image loading for the misinformation analyzer

use base64::prelude::{Engine as _, BASE64_STANDARD};
use std::path::Path;
use tokio::fs;

use crate::error::{ChatError, Result};

/// Uploads above this size are refused before any request is made.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Read an image file into a `data:` URL the gateway can forward.
pub async fn image_data_url(path: &Path) -> Result<String> {
    let mime = image_mime_type(path)
        .ok_or_else(|| ChatError::UnsupportedImage(path.display().to_string()))?;

    let read_error = |source: std::io::Error| ChatError::ImageRead {
        path: path.display().to_string(),
        source,
    };

    let size = fs::metadata(path).await.map_err(read_error)?.len();
    if size > MAX_IMAGE_BYTES {
        return Err(ChatError::ImageTooLarge {
            size,
            limit: MAX_IMAGE_BYTES,
        });
    }

    let bytes = fs::read(path).await.map_err(read_error)?;
    Ok(format!("data:{mime};base64,{}", BASE64_STANDARD.encode(bytes)))
}

fn image_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => return None,
    };
    Some(mime)
}
