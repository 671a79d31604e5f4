//! Windows monitor control
//!
//! Uses the Monitor Configuration API (dxva2): every `HMONITOR` from
//! `EnumDisplayMonitors` is expanded into its physical monitors, and VCP
//! features are written with `SetVCPFeature`.

#![cfg(target_os = "windows")]

use windows::Win32::Devices::Display::{
    DestroyPhysicalMonitor, GetNumberOfPhysicalMonitorsFromHMONITOR,
    GetPhysicalMonitorsFromHMONITOR, SetVCPFeature, PHYSICAL_MONITOR,
};
use windows::Win32::Foundation::{BOOL, HANDLE, LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{EnumDisplayMonitors, HDC, HMONITOR};

use super::{decode_wide, DisplayBackend, MonitorError, MonitorResult};

/// A physical monitor handle, destroyed on drop
pub struct PhysicalMonitor {
    handle: HANDLE,
    description: String,
}

impl Drop for PhysicalMonitor {
    fn drop(&mut self) {
        // SAFETY: the handle came from GetPhysicalMonitorsFromHMONITOR and is
        // destroyed exactly once, here.
        if let Err(e) = unsafe { DestroyPhysicalMonitor(self.handle) } {
            tracing::warn!("Failed to release monitor '{}': {}", self.description, e);
        }
    }
}

/// Monitor control through dxva2
#[derive(Debug, Default)]
pub struct WindowsDisplayBackend;

impl WindowsDisplayBackend {
    pub fn new() -> Self {
        Self
    }

    fn display_monitors() -> MonitorResult<Vec<HMONITOR>> {
        let mut monitors: Vec<HMONITOR> = Vec::new();

        // SAFETY: the callback runs synchronously inside EnumDisplayMonitors and
        // `monitors` outlives the call.
        let ok = unsafe {
            EnumDisplayMonitors(
                HDC::default(),
                None,
                Some(monitor_enum_proc),
                LPARAM(&mut monitors as *mut Vec<HMONITOR> as isize),
            )
        };

        if !ok.as_bool() {
            return Err(MonitorError::Enumeration(
                "EnumDisplayMonitors failed".to_string(),
            ));
        }

        Ok(monitors)
    }

    fn physical_monitors(hmonitor: HMONITOR) -> MonitorResult<Vec<PhysicalMonitor>> {
        let mut count: u32 = 0;

        // SAFETY: `hmonitor` was just produced by EnumDisplayMonitors.
        unsafe { GetNumberOfPhysicalMonitorsFromHMONITOR(hmonitor, &mut count) }
            .map_err(|e| MonitorError::Enumeration(e.to_string()))?;

        let mut raw = vec![PHYSICAL_MONITOR::default(); count as usize];
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        // SAFETY: `raw` has exactly `count` elements.
        unsafe { GetPhysicalMonitorsFromHMONITOR(hmonitor, &mut raw) }
            .map_err(|e| MonitorError::Enumeration(e.to_string()))?;

        Ok(raw
            .iter()
            .map(|m| {
                // PHYSICAL_MONITOR is packed; copy fields out before borrowing
                let handle = m.hPhysicalMonitor;
                let description = m.szPhysicalMonitorDescription;
                PhysicalMonitor {
                    handle,
                    description: decode_wide(&description),
                }
            })
            .collect())
    }
}

impl DisplayBackend for WindowsDisplayBackend {
    type Handle = PhysicalMonitor;

    fn list_controllable_monitors(&self) -> MonitorResult<Vec<PhysicalMonitor>> {
        let mut handles = Vec::new();

        // Handles collected so far are dropped (and destroyed) if a later
        // monitor fails to enumerate.
        for hmonitor in Self::display_monitors()? {
            handles.extend(Self::physical_monitors(hmonitor)?);
        }

        Ok(handles)
    }

    fn send_feature_command(
        &self,
        monitor: &PhysicalMonitor,
        feature: u8,
        value: u32,
    ) -> MonitorResult<()> {
        // SAFETY: the handle is live for as long as `monitor` is borrowed.
        let ok = unsafe { SetVCPFeature(monitor.handle, feature, value) };
        if ok == 0 {
            let e = windows::core::Error::from_win32();
            return Err(MonitorError::Command(format!("{}: {}", monitor.description, e)));
        }
        Ok(())
    }
}

/// Win32 monitor enumeration callback.
///
/// # Safety
///
/// `lparam` must point to a live `Vec<HMONITOR>` for the duration of the
/// enumeration.
unsafe extern "system" fn monitor_enum_proc(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _lprc_clip: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let monitors = &mut *(lparam.0 as *mut Vec<HMONITOR>);
    monitors.push(hmonitor);
    BOOL(1)
}
