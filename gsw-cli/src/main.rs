//! Graphics Mux Switcher Shell
//!
//! Applies a switch mode, or reports mux state, against a simulated graphics
//! control driver whose state persists between runs.

mod settings;

use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use gsw_mux::{Settle, SwitchEvent, SwitchMode, SwitchModeController};
use gsw_protocol::{ChannelHandle, MuxChannel};
use gsw_sim::{DriverState, SimulatedDriver};
use settings::Settings;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// One shell command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Apply a switch mode
    Mode(SwitchMode),
    /// Print the active GPU and switching state
    Status,
    /// Print every driver feature
    Features,
    /// Restore the simulated driver to its power-on state
    Reset,
    /// Print usage
    Help,
}

impl Command {
    fn parse(arg: Option<&str>) -> Result<Self> {
        let Some(arg) = arg else {
            return Ok(Self::Help);
        };
        match arg {
            "status" => Ok(Self::Status),
            "features" => Ok(Self::Features),
            "reset" => Ok(Self::Reset),
            "help" | "-h" | "--help" => Ok(Self::Help),
            other => match other.parse::<SwitchMode>() {
                Ok(mode) => Ok(Self::Mode(mode)),
                Err(e) => bail!("{e}\n\n{}", usage()),
            },
        }
    }
}

fn usage() -> String {
    let mut out = String::from("usage: gswitch <command>\n\ncommands:\n");
    for mode in SwitchMode::ALL {
        let _ = writeln!(out, "  {:<10} {}", mode.command(), mode.description());
    }
    out.push_str("  status     Show the active GPU and whether dynamic switching is on\n");
    out.push_str("  features   List driver features\n");
    out.push_str("  reset      Restore the simulated driver to its initial state\n");
    out
}

/// Run one command, returning the text to print
fn execute<C: MuxChannel, S: Settle>(
    ctl: &mut SwitchModeController<C, S>,
    handle: ChannelHandle,
    command: Command,
) -> Result<String> {
    let mut out = String::new();
    match command {
        Command::Mode(mode) => {
            let result = ctl.set_mode(handle, mode);
            for event in ctl.drain_events() {
                if event.is_failure() {
                    warn!("{:?}", event);
                } else {
                    debug!("{:?}", event);
                }
                if let SwitchEvent::AlreadyActive { card } = event {
                    let _ = writeln!(out, "{card} GPU already active");
                }
            }
            let report = result.with_context(|| format!("failed to apply {mode}"))?;
            let _ = writeln!(
                out,
                "{}: {} steps completed{}",
                report.mode,
                report.completed_steps.len(),
                if report.force_switched {
                    ", GPU switched"
                } else {
                    ""
                }
            );
            let _ = writeln!(out, "active GPU: {}", ctl.active_gpu(handle)?);
        }
        Command::Status => {
            let _ = writeln!(out, "active GPU: {}", ctl.active_gpu(handle)?);
            let dynamic = ctl.is_using_dynamic_switching(handle)?;
            let _ = writeln!(
                out,
                "dynamic switching: {}",
                if dynamic { "on" } else { "off" }
            );
        }
        Command::Features => {
            let mask = ctl.feature_report(handle)?;
            let _ = writeln!(out, "feature mask: 0x{:016x}", mask.raw());
            out.push_str(&mask.to_string());
        }
        Command::Reset | Command::Help => {}
    }
    Ok(out)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gswitch=info,gsw_protocol=info,gsw_mux=info,gsw_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = Command::parse(std::env::args().nth(1).as_deref())?;
    let mut settings = Settings::load();

    match command {
        Command::Help => {
            print!("{}", usage());
            return Ok(());
        }
        Command::Reset => {
            settings.driver = DriverState::default();
            settings.save()?;
            info!("simulated driver reset");
            return Ok(());
        }
        _ => {}
    }

    let mut driver = SimulatedDriver::with_state(settings.driver.clone());
    let handle = driver.open();
    let mut ctl = SwitchModeController::with_config(driver, settings.controller.clone());

    let outcome = execute(&mut ctl, handle, command);

    // Persist whatever the driver ended up in, even after a partial transition
    let mut driver = ctl.into_channel();
    driver.close(handle);
    settings.driver = driver.state().clone();
    settings.save()?;

    print!("{}", outcome?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use gsw_mux::ControllerConfig;
    use gsw_protocol::{MuxStateKey, KERN_FAILURE};
    use gsw_sim::Fault;

    use super::*;

    fn controller() -> (SwitchModeController<SimulatedDriver>, ChannelHandle) {
        let mut driver = SimulatedDriver::new();
        let handle = driver.open();
        (
            SwitchModeController::with_config(driver, ControllerConfig::without_settle()),
            handle,
        )
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(None).unwrap(), Command::Help);
        assert_eq!(Command::parse(Some("status")).unwrap(), Command::Status);
        assert_eq!(
            Command::parse(Some("discrete")).unwrap(),
            Command::Mode(SwitchMode::ForceDiscrete)
        );
        assert!(Command::parse(Some("turbo")).is_err());
    }

    #[test]
    fn test_usage_lists_every_mode() {
        let text = usage();
        for mode in SwitchMode::ALL {
            assert!(text.contains(mode.command()));
        }
    }

    #[test]
    fn test_execute_mode() {
        let (mut ctl, h) = controller();

        let out = execute(&mut ctl, h, Command::Mode(SwitchMode::ForceDiscrete)).unwrap();

        assert!(out.contains("GPU switched"));
        assert!(out.contains("active GPU: discrete"));
    }

    #[test]
    fn test_execute_already_active() {
        let (mut ctl, h) = controller();

        let out = execute(&mut ctl, h, Command::Mode(SwitchMode::ForceIntegrated)).unwrap();

        assert!(out.contains("integrated GPU already active"));
    }

    #[test]
    fn test_execute_status_and_features() {
        let (mut ctl, h) = controller();

        let status = execute(&mut ctl, h, Command::Status).unwrap();
        assert!(status.contains("dynamic switching: on"));

        let features = execute(&mut ctl, h, Command::Features).unwrap();
        assert!(features.contains("Policy: ON"));
    }

    #[test]
    fn test_execute_failure_names_mode() {
        let (mut ctl, h) = controller();
        ctl.channel_mut()
            .inject_fault(Fault::Set(MuxStateKey::GpuSelect), KERN_FAILURE);

        let err = execute(&mut ctl, h, Command::Mode(SwitchMode::ForceDiscrete)).unwrap_err();

        assert!(err.to_string().contains("Force Discrete"));
    }
}
