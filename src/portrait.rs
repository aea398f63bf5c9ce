// Character portraits: display settings, upload processing and URL checks.
// Portrait data lives next to, not inside, the character file to keep saves small.
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use strum_macros::Display;

use crate::error::{PortraitError, StorageError};
use crate::save::StorageQuota;

pub const PORTRAITS_DIR: &str = "portraits";
pub const MAX_DIMENSION: u32 = 800;
pub const JPEG_QUALITY: u8 = 80;
pub const JPEG_FALLBACK_QUALITY: u8 = 50;
pub const MAX_ENCODED_BYTES: usize = 500 * 1024;

pub const UPLOAD_FAILED: &str = "Failed to process image. Please try a different file.";
pub const URL_FAILED: &str = "Could not load image from URL. Please check the URL and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum PortraitSource {
    Upload,
    Url,
    #[default]
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum PortraitPosition {
    Top,
    #[default]
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum PortraitBorder {
    None,
    Frame,
    #[default]
    Vignette,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortraitSettings {
    pub source: PortraitSource,
    pub image_data: Option<String>, // data:image/jpeg;base64,... for uploads
    pub image_url: Option<String>,
    pub opacity: f32, // 0.05 to 0.5
    pub position: PortraitPosition,
    pub scale: f32, // 0.5 to 2.0
    pub grayscale: bool,
    pub border: PortraitBorder,
}

impl Default for PortraitSettings {
    fn default() -> Self {
        PortraitSettings {
            source: PortraitSource::Default,
            image_data: None,
            image_url: None,
            opacity: 0.15,
            position: PortraitPosition::Center,
            scale: 1.0,
            grayscale: true,
            border: PortraitBorder::Vignette,
        }
    }
}

impl PortraitSettings {
    pub fn has_portrait(&self) -> bool {
        match self.source {
            PortraitSource::Upload => self.image_data.is_some(),
            PortraitSource::Url => self.image_url.is_some(),
            PortraitSource::Default => false,
        }
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.05, 0.5);
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(0.5, 2.0);
    }

    pub fn with_upload(mut self, data_url: String) -> Self {
        self.source = PortraitSource::Upload;
        self.image_data = Some(data_url);
        self.image_url = None;
        self
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.source = PortraitSource::Url;
        self.image_url = Some(url);
        self.image_data = None;
        self
    }

    /// Drops the image but keeps how the user likes it displayed.
    pub fn without_image(&self) -> Self {
        PortraitSettings {
            source: PortraitSource::Default,
            image_data: None,
            image_url: None,
            ..self.clone()
        }
    }
}

/// Per-character portrait files under `<data>/portraits/<id>.json`.
#[derive(Debug, Clone)]
pub struct PortraitStore {
    dir: PathBuf,
    quota: StorageQuota,
}

impl PortraitStore {
    pub fn new(quota: StorageQuota) -> Self {
        PortraitStore {
            dir: quota.root().join(PORTRAITS_DIR),
            quota,
        }
    }

    fn path(&self, hero_id: &str) -> PathBuf {
        self.dir.join(format!("{hero_id}.json"))
    }

    // Unreadable or corrupt files fall back to the default portrait.
    pub fn load(&self, hero_id: &str) -> PortraitSettings {
        let Ok(data) = fs::read_to_string(self.path(hero_id)) else {
            return PortraitSettings::default();
        };
        serde_json::from_str(&data).unwrap_or_else(|e| {
            log::error!("Failed to load portrait settings for {}: {}", hero_id, e);
            PortraitSettings::default()
        })
    }

    pub fn save(&self, hero_id: &str, settings: &PortraitSettings) -> Result<(), StorageError> {
        let data = serde_json::to_string(settings)?;
        self.quota.write(&self.path(hero_id), &data)
    }

    pub fn delete(&self, hero_id: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(hero_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, PortraitError> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| PortraitError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// Decodes an uploaded image, shrinks it to fit 800x800, and returns a
/// base64 JPEG data URL. Quality drops to 50 when the result is over 500KB.
pub fn process_upload(bytes: &[u8]) -> Result<String, PortraitError> {
    let mut image = image::load_from_memory(bytes)?;
    if image.width() > MAX_DIMENSION || image.height() > MAX_DIMENSION {
        image = image.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3);
    }

    let mut encoded = encode_jpeg(&image, JPEG_QUALITY)?;
    if encoded.len() > MAX_ENCODED_BYTES {
        log::debug!("Portrait is {} bytes, re-encoding at lower quality", encoded.len());
        encoded = encode_jpeg(&image, JPEG_FALLBACK_QUALITY)?;
    }

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(encoded)))
}

/// Checks that a URL serves an image. Only http and https are accepted.
pub async fn validate_url(url: &str, limit: Duration) -> Result<(), PortraitError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| PortraitError::InvalidUrl(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(PortraitError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    let client = reqwest::Client::new();
    let response = tokio::time::timeout(limit, client.get(parsed).send()).await??;

    let status = response.status();
    if !status.is_success() {
        return Err(PortraitError::BadStatus(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.starts_with("image/") {
        return Err(PortraitError::NotAnImage(content_type));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    const QUOTA: u64 = 1 << 20;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 90])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn decode_data_url(data_url: &str) -> DynamicImage {
        let encoded = data_url.strip_prefix("data:image/jpeg;base64,").unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        image::load_from_memory(&bytes).unwrap()
    }

    #[test]
    fn uploads_shrink_to_fit() {
        let data_url = process_upload(&png(1600, 400)).unwrap();
        let image = decode_data_url(&data_url);
        assert_eq!(image.width(), 800);
        assert_eq!(image.height(), 200);
    }

    #[test]
    fn small_uploads_keep_their_size() {
        let image = decode_data_url(&process_upload(&png(64, 32)).unwrap());
        assert_eq!((image.width(), image.height()), (64, 32));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(process_upload(b"not an image"), Err(PortraitError::Decode(_))));
    }

    #[test]
    fn settings_round_trip_per_character() {
        let dir = tempdir().unwrap();
        let store = PortraitStore::new(StorageQuota::new(dir.path(), QUOTA));
        assert_eq!(store.load("hero-1"), PortraitSettings::default());

        let mut settings = PortraitSettings::default().with_url("https://example.com/a.png".into());
        settings.set_opacity(0.9);
        settings.set_scale(0.1);
        assert_eq!(settings.opacity, 0.5);
        assert_eq!(settings.scale, 0.5);
        store.save("hero-1", &settings).unwrap();

        assert_eq!(store.load("hero-1"), settings);
        assert_eq!(store.load("hero-2"), PortraitSettings::default());

        store.delete("hero-1").unwrap();
        store.delete("hero-1").unwrap();
        assert_eq!(store.load("hero-1"), PortraitSettings::default());
    }

    #[test]
    fn portraits_count_against_the_quota() {
        let dir = tempdir().unwrap();
        let store = PortraitStore::new(StorageQuota::new(dir.path(), 4096));
        let big = PortraitSettings::default()
            .with_upload(format!("data:image/jpeg;base64,{}", "A".repeat(100_000)));
        assert!(matches!(
            store.save("hero-1", &big),
            Err(StorageError::QuotaExceeded { limit: 4096, .. })
        ));
        assert_eq!(store.load("hero-1"), PortraitSettings::default());

        let small = PortraitSettings::default().with_url("https://example.com/a.png".into());
        store.save("hero-1", &small).unwrap();
        let quota = StorageQuota::new(dir.path(), 4096);
        assert!(quota.used_bytes() > 0);
        assert!(!dir.path().join(PORTRAITS_DIR).join("hero-1.json.tmp").exists());
    }

    #[test]
    fn corrupt_settings_fall_back() {
        let dir = tempdir().unwrap();
        let store = PortraitStore::new(StorageQuota::new(dir.path(), QUOTA));
        fs::create_dir_all(dir.path().join(PORTRAITS_DIR)).unwrap();
        fs::write(dir.path().join(PORTRAITS_DIR).join("x.json"), "{oops").unwrap();
        assert_eq!(store.load("x"), PortraitSettings::default());
    }

    #[test]
    fn removing_keeps_display_preferences() {
        let mut settings =
            PortraitSettings::default().with_upload("data:image/jpeg;base64,AA==".into());
        settings.grayscale = false;
        settings.border = PortraitBorder::Frame;
        assert!(settings.has_portrait());

        let removed = settings.without_image();
        assert!(!removed.has_portrait());
        assert_eq!(removed.source, PortraitSource::Default);
        assert!(!removed.grayscale);
        assert_eq!(removed.border, PortraitBorder::Frame);
    }

    #[tokio::test]
    async fn only_http_urls_are_checked() {
        let result = validate_url("ftp://example.com/a.png", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(PortraitError::InvalidUrl(_))));
        let result = validate_url("not a url", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(PortraitError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn silent_servers_time_out() {
        // Accepts connections through the backlog but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/portrait.png", listener.local_addr().unwrap());
        let result = validate_url(&url, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(PortraitError::Timeout)));
        drop(listener);
    }
}
