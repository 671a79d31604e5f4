//! Linux HID device listing via sysfs
//!
//! Every hidraw node links back to its HID device, whose `uevent` carries
//! `HID_ID` and `HID_NAME`. The USB product string, when the device sits on
//! USB, lives two levels up (interface, then device) and is preferred so names
//! match what hidapi reports on other platforms.
//!
//! Reading sysfs needs no special permissions.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{HidDevice, HidEnumerator, PresenceError, PresenceResult};

const HIDRAW_CLASS_DIR: &str = "/sys/class/hidraw";

/// Lists HID devices from `/sys/class/hidraw`
#[derive(Debug, Clone)]
pub struct SysfsHidEnumerator {
    root: PathBuf,
}

impl SysfsHidEnumerator {
    pub fn new() -> Self {
        Self::with_root(HIDRAW_CLASS_DIR)
    }

    /// Read from a different class directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_device(node: &Path) -> PresenceResult<HidDevice> {
        let device_dir = node.join("device");
        let uevent = std::fs::read_to_string(device_dir.join("uevent"))?;

        let mut hid_id = None;
        let mut hid_name = None;
        for line in uevent.lines() {
            if let Some(value) = line.strip_prefix("HID_ID=") {
                hid_id = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("HID_NAME=") {
                hid_name = Some(value.trim().to_string());
            }
        }

        let hid_id = hid_id.ok_or_else(|| {
            PresenceError::Malformed(format!("{}: no HID_ID in uevent", node.display()))
        })?;
        let (vendor_id, product_id) = parse_hid_id(&hid_id).ok_or_else(|| {
            PresenceError::Malformed(format!("{}: bad HID_ID '{}'", node.display(), hid_id))
        })?;

        let product_name = usb_product_name(&device_dir)
            .or(hid_name)
            .filter(|name| !name.is_empty());

        Ok(HidDevice {
            product_name,
            vendor_id,
            product_id,
        })
    }
}

impl Default for SysfsHidEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl HidEnumerator for SysfsHidEnumerator {
    fn list_hid_devices(&self) -> PresenceResult<Vec<HidDevice>> {
        let mut devices = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let node = entry?.path();
            // Only an unreadable class directory fails the listing. A single
            // bad node must not hide the state of every other device.
            match Self::read_device(&node) {
                Ok(device) => devices.push(device),
                Err(PresenceError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("HID node vanished: {}", node.display());
                }
                Err(e) => tracing::debug!("Skipping HID node {}: {}", node.display(), e),
            }
        }

        Ok(devices)
    }
}

/// Parse `BUS:VENDOR:PRODUCT`, e.g. `0003:00001B1C:00001B13`
fn parse_hid_id(value: &str) -> Option<(u16, u16)> {
    let mut parts = value.split(':');
    let _bus = parts.next()?;
    let vendor = u32::from_str_radix(parts.next()?, 16).ok()?;
    let product = u32::from_str_radix(parts.next()?, 16).ok()?;
    Some((vendor as u16, product as u16))
}

fn usb_product_name(device_dir: &Path) -> Option<String> {
    let hid_dir = std::fs::canonicalize(device_dir).ok()?;
    let usb_device = hid_dir.parent()?.parent()?;
    std::fs::read_to_string(usb_device.join("product"))
        .ok()
        .map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::{Detection, PresenceDetector, PresenceSource};
    use std::fs;
    use tempfile::TempDir;

    /// Lay out class/hidrawN -> usb/<dev>/<intf>/<hid> like the kernel does
    fn add_node(root: &Path, node: &str, uevent: &str, usb_product: Option<&str>) {
        let usb_dev = root.join("usb").join(format!("1-{}", node));
        let hid_dir = usb_dev.join("1-1:1.0").join(format!("0003:{}", node));
        fs::create_dir_all(&hid_dir).unwrap();
        fs::write(hid_dir.join("uevent"), uevent).unwrap();
        if let Some(product) = usb_product {
            fs::write(usb_dev.join("product"), format!("{}\n", product)).unwrap();
        }

        let class_node = root.join("class").join(node);
        fs::create_dir_all(&class_node).unwrap();
        std::os::unix::fs::symlink(&hid_dir, class_node.join("device")).unwrap();
    }

    #[test]
    fn test_parse_hid_id() {
        assert_eq!(parse_hid_id("0003:00001B1C:00001B13"), Some((0x1b1c, 0x1b13)));
        assert_eq!(parse_hid_id("0003:zz:00001B13"), None);
        assert_eq!(parse_hid_id("0003"), None);
    }

    #[test]
    fn test_prefers_usb_product_string() {
        let dir = TempDir::new().unwrap();
        add_node(
            dir.path(),
            "hidraw0",
            "DRIVER=hid-generic\nHID_ID=0003:00001B1C:00001B13\nHID_NAME=Corsair Corsair K70R Gaming Keyboard\n",
            Some("Corsair K70R Gaming Keyboard"),
        );

        let enumerator = SysfsHidEnumerator::with_root(dir.path().join("class"));
        let devices = enumerator.list_hid_devices().unwrap();

        assert_eq!(devices.len(), 1);
        assert!(devices[0].is_named("Corsair K70R Gaming Keyboard"));
        assert_eq!(devices[0].vendor_id, 0x1b1c);
        assert_eq!(devices[0].product_id, 0x1b13);
    }

    #[test]
    fn test_falls_back_to_hid_name() {
        let dir = TempDir::new().unwrap();
        add_node(
            dir.path(),
            "hidraw1",
            "HID_ID=0005:0000046D:0000B019\nHID_NAME=MX Keys\n",
            None,
        );

        let enumerator = SysfsHidEnumerator::with_root(dir.path().join("class"));
        let devices = enumerator.list_hid_devices().unwrap();

        assert_eq!(devices[0].product_name.as_deref(), Some("MX Keys"));
    }

    #[test]
    fn test_missing_class_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let enumerator = SysfsHidEnumerator::with_root(dir.path().join("nope"));
        assert!(enumerator.list_hid_devices().is_err());
    }

    #[test]
    fn test_missing_hid_id_is_malformed() {
        let dir = TempDir::new().unwrap();
        add_node(dir.path(), "hidraw2", "HID_NAME=Broken\n", None);

        let node = dir.path().join("class").join("hidraw2");
        assert!(matches!(
            SysfsHidEnumerator::read_device(&node),
            Err(PresenceError::Malformed(_))
        ));
    }

    #[test]
    fn test_bad_node_is_skipped() {
        let dir = TempDir::new().unwrap();
        add_node(
            dir.path(),
            "hidraw0",
            "HID_ID=0003:0000046D:0000C52B\nHID_NAME=USB Receiver\n",
            None,
        );
        add_node(dir.path(), "hidraw1", "HID_ID=0003:garbage\nHID_NAME=Broken\n", None);
        add_node(dir.path(), "hidraw2", "HID_NAME=No Id\n", None);

        let enumerator = SysfsHidEnumerator::with_root(dir.path().join("class"));
        let devices = enumerator.list_hid_devices().unwrap();
        assert_eq!(devices.len(), 1);
        assert!(devices[0].is_named("USB Receiver"));

        // The keyboard is not among the readable nodes, so it is absent
        let detector = PresenceDetector::new(enumerator);
        assert!(matches!(
            detector.detect("Corsair K70R Gaming Keyboard"),
            Detection::Absent
        ));
    }
}
