// Camera affordance: permission gate plus an idle <-> capturing toggle
use chrono::Utc;
use log::{info, warn};
use std::fs;
use std::path::PathBuf;

use crate::app::error::{CaptureDenied, ProviderError};
use crate::app::models::{Permission, PhotoRef};

pub trait CaptureProvider {
    fn request_permission(&mut self) -> Result<Permission, ProviderError>;
    fn capture(&mut self) -> Result<PhotoRef, ProviderError>;
}

#[derive(Debug, Default)]
pub struct CameraState {
    pub permission: Permission,
    capturing: bool,
    photo: Option<PhotoRef>,
}

impl CameraState {
    // Ask the provider once; any error counts as a denial
    pub fn request(provider: &mut dyn CaptureProvider) -> CameraState {
        let permission = match provider.request_permission() {
            Ok(permission) => permission,
            Err(err) => {
                warn!("event=camera_permission module=capture status=error error={err}");
                Permission::Denied
            }
        };
        info!("event=camera_permission module=capture status={:?}", permission);
        CameraState {
            permission,
            ..CameraState::default()
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn photo(&self) -> Option<&PhotoRef> {
        self.photo.as_ref()
    }

    pub fn open(&mut self) -> Result<(), CaptureDenied> {
        if !self.permission.is_granted() {
            return Err(CaptureDenied);
        }
        self.capturing = true;
        Ok(())
    }

    pub fn close(&mut self) {
        self.capturing = false;
    }

    // Take a picture; a successful capture ends the session
    pub fn snap(&mut self, provider: &mut dyn CaptureProvider) -> Result<PhotoRef, ProviderError> {
        if !self.capturing {
            return Err(ProviderError::Unavailable("camera is not open".into()));
        }
        let photo = provider.capture()?;
        info!("event=camera_capture module=capture status=ok");
        self.photo = Some(photo.clone());
        self.capturing = false;
        Ok(photo)
    }
}

// "Captures" by copying a source image into the photo directory
pub struct FileCapture {
    pub source: PathBuf,
    pub photo_dir: PathBuf,
}

impl CaptureProvider for FileCapture {
    fn request_permission(&mut self) -> Result<Permission, ProviderError> {
        if self.source.is_file() {
            Ok(Permission::Granted)
        } else {
            Ok(Permission::Denied)
        }
    }

    fn capture(&mut self) -> Result<PhotoRef, ProviderError> {
        fs::create_dir_all(&self.photo_dir)?;
        let extension = self
            .source
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("jpg");
        let name = format!("photo-{}.{extension}", Utc::now().format("%Y%m%d-%H%M%S%3f"));
        let target = self.photo_dir.join(name);
        fs::copy(&self.source, &target)?;

        let absolute = fs::canonicalize(&target)?;
        Ok(PhotoRef {
            uri: format!("file://{}", absolute.display()),
        })
    }
}

// Device without a camera
pub struct NoCamera;

impl CaptureProvider for NoCamera {
    fn request_permission(&mut self) -> Result<Permission, ProviderError> {
        Ok(Permission::Denied)
    }

    fn capture(&mut self) -> Result<PhotoRef, ProviderError> {
        Err(ProviderError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyCamera {
        fail: bool,
    }

    impl CaptureProvider for FlakyCamera {
        fn request_permission(&mut self) -> Result<Permission, ProviderError> {
            Ok(Permission::Granted)
        }

        fn capture(&mut self) -> Result<PhotoRef, ProviderError> {
            if self.fail {
                return Err(ProviderError::Unavailable("shutter stuck".into()));
            }
            Ok(PhotoRef {
                uri: "file:///tmp/photo.jpg".into(),
            })
        }
    }

    #[test]
    fn open_without_permission_is_refused() {
        let mut camera = CameraState::request(&mut NoCamera);
        assert_eq!(camera.open(), Err(CaptureDenied));
        assert!(!camera.is_capturing());
    }

    #[test]
    fn snap_stores_photo_and_returns_to_idle() {
        let mut provider = FlakyCamera { fail: false };
        let mut camera = CameraState::request(&mut provider);
        camera.open().unwrap();
        assert!(camera.is_capturing());

        let photo = camera.snap(&mut provider).unwrap();
        assert_eq!(photo.uri, "file:///tmp/photo.jpg");
        assert_eq!(camera.photo(), Some(&photo));
        assert!(!camera.is_capturing());
    }

    #[test]
    fn failed_snap_keeps_session_open() {
        let mut provider = FlakyCamera { fail: true };
        let mut camera = CameraState::request(&mut provider);
        camera.open().unwrap();
        assert!(camera.snap(&mut provider).is_err());
        assert!(camera.is_capturing());
        assert!(camera.photo().is_none());

        camera.close();
        assert!(!camera.is_capturing());
    }

    #[test]
    fn snap_while_idle_is_an_error() {
        let mut provider = FlakyCamera { fail: false };
        let mut camera = CameraState::request(&mut provider);
        assert!(camera.snap(&mut provider).is_err());
        assert!(camera.photo().is_none());
    }

    #[test]
    fn file_capture_copies_source_into_photo_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("frame.png");
        fs::write(&source, b"png bytes").unwrap();
        let mut provider = FileCapture {
            source,
            photo_dir: dir.path().join("photos"),
        };

        assert_eq!(provider.request_permission().unwrap(), Permission::Granted);
        let photo = provider.capture().unwrap();
        assert!(photo.uri.starts_with("file://"));
        assert!(photo.uri.ends_with(".png"));

        let copied = fs::read_dir(dir.path().join("photos")).unwrap().count();
        assert_eq!(copied, 1);
    }

    #[test]
    fn file_capture_without_source_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = FileCapture {
            source: dir.path().join("missing.jpg"),
            photo_dir: dir.path().join("photos"),
        };
        assert_eq!(provider.request_permission().unwrap(), Permission::Denied);
    }
}
