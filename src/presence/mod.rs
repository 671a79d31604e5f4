//! Presence module - Is the watched HID device attached?
//!
//! The device list comes from a platform [`HidEnumerator`]:
//! - hidapi on Windows and macOS
//! - sysfs hidraw nodes on Linux
//!
//! Detection fails open. If the device list cannot be read, the device is
//! reported as present so the monitors stay on the input used for normal
//! operation.

use thiserror::Error;

#[cfg(not(target_os = "linux"))]
mod native;

#[cfg(target_os = "linux")]
mod sysfs;

#[cfg(not(target_os = "linux"))]
pub use native::HidApiEnumerator as PlatformHidEnumerator;

#[cfg(target_os = "linux")]
pub use sysfs::SysfsHidEnumerator as PlatformHidEnumerator;

/// Errors that can occur while listing HID devices
#[derive(Error, Debug)]
pub enum PresenceError {
    #[cfg(not(target_os = "linux"))]
    #[error("HID backend error: {0}")]
    Backend(String),

    #[error("Malformed device entry: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PresenceResult<T> = Result<T, PresenceError>;

/// An attached HID device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidDevice {
    /// Human-readable product name, if the device reports one
    pub product_name: Option<String>,
    pub vendor_id: u16,
    pub product_id: u16,
}

impl HidDevice {
    /// Exact product name match
    pub fn is_named(&self, name: &str) -> bool {
        self.product_name.as_deref() == Some(name)
    }
}

/// Lists the HID devices currently attached to the system
pub trait HidEnumerator: Send {
    fn list_hid_devices(&self) -> PresenceResult<Vec<HidDevice>>;
}

/// Result of a single presence check
#[derive(Debug)]
pub enum Detection {
    Present,
    Absent,
    /// The device list could not be read
    Inconclusive(PresenceError),
}

impl Detection {
    /// Presence as acted upon. Inconclusive counts as present.
    pub fn is_present(&self) -> bool {
        !matches!(self, Detection::Absent)
    }
}

/// Source of presence observations for the switch loop
pub trait PresenceSource: Send {
    fn detect(&self, target_name: &str) -> Detection;
}

/// Checks a [`HidEnumerator`]'s device list for a product name
pub struct PresenceDetector<E> {
    enumerator: E,
}

impl<E: HidEnumerator> PresenceDetector<E> {
    pub fn new(enumerator: E) -> Self {
        Self { enumerator }
    }

    /// Is a device with exactly this product name attached?
    ///
    /// Returns `true` when the device list cannot be read.
    pub fn is_target_present(&self, target_name: &str) -> bool {
        self.detect(target_name).is_present()
    }

    /// Full device list, for diagnostics
    pub fn devices(&self) -> PresenceResult<Vec<HidDevice>> {
        self.enumerator.list_hid_devices()
    }
}

impl<E: HidEnumerator> PresenceSource for PresenceDetector<E> {
    fn detect(&self, target_name: &str) -> Detection {
        match self.enumerator.list_hid_devices() {
            Ok(devices) if devices.iter().any(|d| d.is_named(target_name)) => Detection::Present,
            Ok(_) => Detection::Absent,
            Err(e) => Detection::Inconclusive(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEnumerator(Vec<HidDevice>);

    impl HidEnumerator for FixedEnumerator {
        fn list_hid_devices(&self) -> PresenceResult<Vec<HidDevice>> {
            Ok(self.0.clone())
        }
    }

    struct FailingEnumerator;

    impl HidEnumerator for FailingEnumerator {
        fn list_hid_devices(&self) -> PresenceResult<Vec<HidDevice>> {
            Err(PresenceError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "driver unavailable",
            )))
        }
    }

    fn named(name: &str, vendor_id: u16, product_id: u16) -> HidDevice {
        HidDevice {
            product_name: Some(name.to_string()),
            vendor_id,
            product_id,
        }
    }

    fn keyboard() -> HidDevice {
        named("Corsair K70R Gaming Keyboard", 0x1b1c, 0x1b09)
    }

    #[test]
    fn test_present_on_exact_name() {
        let detector = PresenceDetector::new(FixedEnumerator(vec![
            named("USB Receiver", 0x046d, 0xc52b),
            keyboard(),
        ]));

        assert!(detector.is_target_present("Corsair K70R Gaming Keyboard"));
        assert!(matches!(
            detector.detect("Corsair K70R Gaming Keyboard"),
            Detection::Present
        ));
    }

    #[test]
    fn test_name_match_is_exact() {
        let detector = PresenceDetector::new(FixedEnumerator(vec![keyboard()]));

        assert!(!detector.is_target_present("Corsair K70R"));
        assert!(!detector.is_target_present("corsair k70r gaming keyboard"));
    }

    #[test]
    fn test_absent_with_unnamed_devices() {
        let detector = PresenceDetector::new(FixedEnumerator(vec![HidDevice {
            product_name: None,
            vendor_id: 0x1234,
            product_id: 0x5678,
        }]));

        assert!(matches!(detector.detect("Anything"), Detection::Absent));
        assert!(!detector.is_target_present("Anything"));
    }

    #[test]
    fn test_enumeration_failure_fails_open() {
        let detector = PresenceDetector::new(FailingEnumerator);

        let detection = detector.detect("Corsair K70R Gaming Keyboard");
        assert!(matches!(detection, Detection::Inconclusive(PresenceError::Io(_))));
        assert!(detection.is_present());
        assert!(detector.is_target_present("Corsair K70R Gaming Keyboard"));
    }
}
