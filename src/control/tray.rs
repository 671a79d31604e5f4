//! Windows tray icon
//!
//! tray-icon needs a Win32 message pump on the thread that created the icon,
//! so the pump runs here on the main thread. Menu clicks arrive on the
//! `MenuEvent` channel and are drained after every dispatched message.

#![cfg(target_os = "windows")]

use tray_icon::menu::{CheckMenuItem, Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIconBuilder};
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, PostQuitMessage, TranslateMessage, MSG,
};

use super::{ControlSurface, Flow, IconImage, MenuAction, SurfaceError, SurfaceResult, TOOLTIP};

pub fn run(surface: &ControlSurface, image: IconImage) -> SurfaceResult<()> {
    let icon = Icon::from_rgba(image.rgba, image.width, image.height)
        .map_err(|e| SurfaceError::Icon(e.to_string()))?;

    let pause_item = CheckMenuItem::new("Paused", true, surface.flags().is_paused(), None);
    let exit_item = MenuItem::new("Exit", true, None);

    let menu = Menu::new();
    menu.append_items(&[&pause_item, &PredefinedMenuItem::separator(), &exit_item])
        .map_err(|e| SurfaceError::Menu(e.to_string()))?;

    let _tray = TrayIconBuilder::new()
        .with_menu(Box::new(menu))
        .with_tooltip(TOOLTIP)
        .with_icon(icon)
        .build()
        .map_err(|e| SurfaceError::Tray(e.to_string()))?;

    tracing::info!("Tray icon ready");

    let menu_events = MenuEvent::receiver();
    let mut msg = MSG::default();

    // SAFETY: standard message pump on the thread that owns the tray window.
    // GetMessageW returns 0 on WM_QUIT and -1 on error; both end the loop.
    unsafe {
        while GetMessageW(&mut msg, HWND::default(), 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);

            while let Ok(event) = menu_events.try_recv() {
                let action = if event.id == *pause_item.id() {
                    MenuAction::TogglePause
                } else if event.id == *exit_item.id() {
                    MenuAction::Exit
                } else {
                    continue;
                };

                match surface.handle(action) {
                    Flow::Continue => pause_item.set_checked(surface.flags().is_paused()),
                    Flow::Quit => PostQuitMessage(0),
                }
            }
        }
    }

    Ok(())
}
