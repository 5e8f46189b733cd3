use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::errors::InternalError;

pub const MAX_AVATAR_BYTES: usize = 2048 * 1024;
pub const MAX_AVATAR_DIMENSION: u32 = 2000;

const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/gif"];
const TYPE_MESSAGE: &str = "The avatar must be a file of type: jpeg, jpg, png, gif.";

/// Uploaded avatar that passed every constraint
#[derive(Debug)]
pub struct ValidatedAvatar {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub width: u32,
    pub height: u32,
}

fn invalid(message: impl Into<String>) -> InternalError {
    InternalError::validation("avatar", message)
}

/// Check size, declared type, decoded format and pixel dimensions
pub fn validate_avatar(
    content_type: Option<&str>,
    bytes: Vec<u8>,
) -> Result<ValidatedAvatar, InternalError> {
    if bytes.is_empty() {
        return Err(invalid("The avatar field is required."));
    }
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(invalid("The avatar may not be greater than 2048 kilobytes."));
    }
    if let Some(content_type) = content_type {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        if !ALLOWED_CONTENT_TYPES.contains(&essence.to_ascii_lowercase().as_str()) {
            return Err(invalid(TYPE_MESSAGE));
        }
    }

    let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(|_| invalid(TYPE_MESSAGE))?;

    let extension = match reader.format() {
        Some(ImageFormat::Png) => "png",
        Some(ImageFormat::Jpeg) => "jpg",
        Some(ImageFormat::Gif) => "gif",
        _ => return Err(invalid(TYPE_MESSAGE)),
    };

    let (width, height) = reader
        .into_dimensions()
        .map_err(|_| invalid("The avatar must be an image."))?;

    if width > MAX_AVATAR_DIMENSION || height > MAX_AVATAR_DIMENSION {
        return Err(invalid(
            "The avatar has invalid image dimensions (max 2000x2000).",
        ));
    }

    Ok(ValidatedAvatar {
        bytes,
        extension,
        width,
        height,
    })
}

/// Storage key for a user's avatar; unique per upload
pub fn avatar_path(user_id: &str, extension: &str) -> String {
    format!("avatars/{}-{}.{}", user_id, uuid::Uuid::new_v4(), extension)
}
