//! Console control surface for platforms without the tray icon
//!
//! Ctrl+C exits. `kill -USR1 <pid>` toggles pause.

use tokio::signal::unix::{signal, SignalKind};

use super::{ControlSurface, Flow, MenuAction, SurfaceResult};

pub fn run(surface: &ControlSurface) -> SurfaceResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(listen(surface))
}

async fn listen(surface: &ControlSurface) -> SurfaceResult<()> {
    let mut toggle = signal(SignalKind::user_defined1())?;

    println!("hidswitch running (pid {}).", std::process::id());
    println!("Press Ctrl+C to exit, send SIGUSR1 to toggle pause.\n");

    loop {
        let action = tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                MenuAction::Exit
            }
            _ = toggle.recv() => MenuAction::TogglePause,
        };

        if surface.handle(action) == Flow::Quit {
            break;
        }
    }

    Ok(())
}
