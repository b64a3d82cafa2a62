// One error type for the whole app.
// Every variant states *where* things went wrong.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed

    #[cfg(feature = "camera")]
    #[error("Camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed
    #[cfg(feature = "camera")]
    #[error("Camera frame error: {0}")]
    CameraFrame(String), // Grabbing/decoding a frame failed

    #[error("Backdrop error: {0}")]
    Backdrop(String), // Building/loading the background failed
    #[error("Config error: {0}")]
    Config(String), // Config file could not be parsed

    // The lens could not build its displacement map or remap pixels.
    // Caught inside the lens, which falls back to a static overlay.
    #[error("Unsupported render context: {0}")]
    Unsupported(String),
    #[error("Composite error: {0}")]
    Composite(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
