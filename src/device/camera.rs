use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    User,
    Environment,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CameraError {
    #[error("Camera access denied: {0}")]
    Denied(String),
    #[error("No camera available")]
    NotFound,
    #[error("Camera stream already stopped")]
    Stopped,
    #[error("Frame capture failed: {0}")]
    Capture(String),
    #[error("Invalid image data URL")]
    InvalidDataUrl,
}

/// An encoded still image grabbed from a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl CapturedFrame {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Parses `data:<mime>;base64,<payload>`. Dimensions are unknown on this path.
    pub fn from_data_url(url: &str) -> Result<Self, CameraError> {
        let rest = url.strip_prefix("data:").ok_or(CameraError::InvalidDataUrl)?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or(CameraError::InvalidDataUrl)?;
        if !mime.starts_with("image/") {
            return Err(CameraError::InvalidDataUrl);
        }
        let bytes = STANDARD
            .decode(payload)
            .map_err(|_| CameraError::InvalidDataUrl)?;
        if bytes.is_empty() {
            return Err(CameraError::InvalidDataUrl);
        }

        Ok(Self {
            mime: mime.to_string(),
            width: 0,
            height: 0,
            bytes,
        })
    }
}

/// A live video stream. Implementations release the device in `stop` and on drop.
#[async_trait]
pub trait VideoStream: Send {
    async fn capture_frame(&mut self) -> Result<CapturedFrame, CameraError>;

    /// Stops every track. Idempotent.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

#[async_trait]
pub trait Camera: Send + Sync {
    async fn open(&self, facing: Facing) -> Result<Box<dyn VideoStream>, CameraError>;
}
