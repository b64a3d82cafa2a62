// Live webcam backdrop (only built with `--features camera`).
// Every call to `next_frame()` blocks until the camera delivers a new frame and
// reports it as changed, so the lens is recomposed over live video.

use crate::backdrop::Backdrop;
use crate::error::{Error, Result};
use crate::types::{pack_rgb, FrameBuffer};

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};
use tracing::info;

pub struct CameraBackdrop {
    cam: Camera,
    frame: FrameBuffer,
}

impl CameraBackdrop {
    /// Open camera `index` near the requested resolution (the device may pick another).
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self> {
        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(CameraIndex::Index(index), req)
            .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;
        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        let actual = cam.resolution();
        info!(index, w = actual.width(), h = actual.height(), "camera stream open");

        Ok(Self {
            cam,
            frame: FrameBuffer::new(actual.width() as usize, actual.height() as usize),
        })
    }
}

impl Backdrop for CameraBackdrop {
    fn size(&self) -> (usize, usize) {
        (self.frame.width, self.frame.height)
    }

    fn next_frame(&mut self) -> Result<(&FrameBuffer, bool)> {
        let raw = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;
        let rgb = raw
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        // Repack in place; the stream can renegotiate its size, follow it.
        let (w, h) = rgb.dimensions();
        self.frame.width = w as usize;
        self.frame.height = h as usize;
        self.frame.pixels.clear();
        self.frame
            .pixels
            .extend(rgb.pixels().map(|p| pack_rgb(p[0], p[1], p[2])));

        Ok((&self.frame, true))
    }
}
