// One-shot location read behind a permission gate
use log::{info, warn};

use crate::app::error::ProviderError;
use crate::app::models::{Coordinates, Permission};

pub trait LocationProvider {
    fn request_permission(&mut self) -> Result<Permission, ProviderError>;
    fn current_position(&mut self) -> Result<Coordinates, ProviderError>;
}

/// Asks for permission and reads the position once.
///
/// Returns `None` when permission is denied or the read fails; the readout is
/// simply hidden in that case.
pub fn get_current_coordinates(provider: &mut dyn LocationProvider) -> Option<Coordinates> {
    match provider.request_permission() {
        Ok(Permission::Granted) => {}
        Ok(Permission::Denied) => {
            info!("event=location_permission module=location status=denied");
            return None;
        }
        Err(err) => {
            warn!("event=location_permission module=location status=error error={err}");
            return None;
        }
    }

    match provider.current_position() {
        Ok(coordinates) => {
            info!("event=location_read module=location status=ok");
            Some(coordinates)
        }
        Err(err) => {
            warn!("event=location_read module=location status=error error={err}");
            None
        }
    }
}

// Position supplied on the command line
pub struct FixedLocation {
    pub coordinates: Coordinates,
}

impl LocationProvider for FixedLocation {
    fn request_permission(&mut self) -> Result<Permission, ProviderError> {
        Ok(Permission::Granted)
    }

    fn current_position(&mut self) -> Result<Coordinates, ProviderError> {
        Ok(self.coordinates)
    }
}

// No positioning on this device
pub struct NoLocation;

impl LocationProvider for NoLocation {
    fn request_permission(&mut self) -> Result<Permission, ProviderError> {
        Ok(Permission::Denied)
    }

    fn current_position(&mut self) -> Result<Coordinates, ProviderError> {
        Err(ProviderError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenGps;

    impl LocationProvider for BrokenGps {
        fn request_permission(&mut self) -> Result<Permission, ProviderError> {
            Ok(Permission::Granted)
        }

        fn current_position(&mut self) -> Result<Coordinates, ProviderError> {
            Err(ProviderError::Unavailable("no fix".into()))
        }
    }

    #[test]
    fn granted_location_is_returned() {
        let coordinates = Coordinates {
            latitude: 48.8566,
            longitude: 2.3522,
        };
        let mut provider = FixedLocation { coordinates };
        assert_eq!(get_current_coordinates(&mut provider), Some(coordinates));
    }

    #[test]
    fn denied_permission_hides_location() {
        assert_eq!(get_current_coordinates(&mut NoLocation), None);
    }

    #[test]
    fn failed_read_hides_location() {
        assert_eq!(get_current_coordinates(&mut BrokenGps), None);
    }
}
