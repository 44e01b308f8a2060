//! Media staging helpers.

use chrono::Utc;
use database::MediaFile;

/// File extension for a MIME type, for scratch filenames and storage keys.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "video/mp4" => ".mp4",
        "video/quicktime" => ".mov",
        "audio/mpeg" => ".mp3",
        "audio/ogg" => ".ogg",
        "audio/wav" => ".wav",
        "application/pdf" => ".pdf",
        "text/plain" => ".txt",
        _ => ".bin",
    }
}

/// Storage key for a newly seen asset: date-partitioned under `media/`.
pub fn storage_key(unique_id: &str, extension: &str) -> String {
    format!(
        "media/{}/{}{}",
        Utc::now().format("%Y/%m/%d"),
        unique_id,
        extension
    )
}

/// Description line injected into the prompt for one attached asset.
pub fn description_line(media: &MediaFile) -> String {
    format!(
        "MEDIA FILE: {} {}\nDESCRIPTION: {}",
        media.media_sid.as_deref().unwrap_or("unknown"),
        media.content_type.as_deref().unwrap_or("unknown"),
        media.description.as_deref().unwrap_or("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for_content_type("image/jpeg"), ".jpg");
        assert_eq!(extension_for_content_type("audio/ogg"), ".ogg");
        assert_eq!(extension_for_content_type("application/x-unknown"), ".bin");
    }

    #[test]
    fn test_storage_key_layout() {
        let key = storage_key("abc-123", ".jpg");
        assert!(key.starts_with("media/"));
        assert!(key.ends_with("/abc-123.jpg"));
        // media/YYYY/MM/DD/<id>.jpg
        assert_eq!(key.split('/').count(), 5);
    }

    #[test]
    fn test_description_line() {
        let media = MediaFile {
            id: 1,
            media_sid: Some("ME1".to_string()),
            content_type: Some("image/jpeg".to_string()),
            file_size: Some(10),
            file_hash: "h".to_string(),
            storage_key: "k".to_string(),
            storage_url: "u".to_string(),
            description: Some("a cat".to_string()),
            forwarded_count: 0,
            created_at: String::new(),
        };
        assert_eq!(
            description_line(&media),
            "MEDIA FILE: ME1 image/jpeg\nDESCRIPTION: a cat"
        );
    }
}
