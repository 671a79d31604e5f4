//! hidapi device listing (Windows, macOS)

use hidapi::HidApi;

use super::{HidDevice, HidEnumerator, PresenceError, PresenceResult};

/// Lists HID devices through hidapi.
///
/// A fresh `HidApi` context is created per call so every poll sees the
/// current device set.
#[derive(Debug, Default)]
pub struct HidApiEnumerator;

impl HidApiEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl HidEnumerator for HidApiEnumerator {
    fn list_hid_devices(&self) -> PresenceResult<Vec<HidDevice>> {
        let api = HidApi::new().map_err(|e| PresenceError::Backend(e.to_string()))?;

        Ok(api
            .device_list()
            .map(|d| HidDevice {
                product_name: d.product_string().map(str::to_string),
                vendor_id: d.vendor_id(),
                product_id: d.product_id(),
            })
            .collect())
    }
}
