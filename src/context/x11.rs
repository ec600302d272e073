use anyhow::{anyhow, bail, Context, Result};
use std::process::Command;
use std::sync::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};

use super::probe::ContextProbe;
use super::sample::{ActiveWindow, Bounds};

/// X11 probe backed by `xprintidle`, `xdotool` and `xrandr`, with process
/// names resolved through sysinfo.
pub struct SystemProbe {
    system: Mutex<System>,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let pid = Pid::from_u32(pid);
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
        system
            .process(pid)
            .map(|process| process.name().to_string_lossy().into_owned())
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextProbe for SystemProbe {
    fn idle_seconds(&self) -> Result<u64> {
        let output = run_tool("xprintidle", &[])?;
        parse_idle_millis(&output).map(|millis| millis / 1000)
    }

    fn active_window(&self) -> Result<Option<ActiveWindow>> {
        let output = Command::new("xdotool")
            .args([
                "getactivewindow",
                "getwindowgeometry",
                "--shell",
                "getwindowname",
                "getwindowpid",
            ])
            .output()
            .context("failed to launch xdotool")?;

        // `getwindowpid` fails for windows without _NET_WM_PID; the geometry
        // and title printed before it are still usable.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(window) = parse_xdotool_window(&stdout)? else {
            if output.status.success() {
                return Ok(None);
            }
            bail!(
                "xdotool exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        };

        let process_name = window
            .pid
            .and_then(|pid| self.process_name(pid))
            .unwrap_or_default();

        Ok(Some(ActiveWindow {
            process_name,
            title: window.title,
            bounds: window.bounds,
        }))
    }

    fn displays(&self) -> Result<Vec<Bounds>> {
        let output = run_tool("xrandr", &["--listmonitors"])?;
        Ok(parse_xrandr_monitors(&output))
    }
}

fn run_tool(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to launch {program}"))?;

    if !output.status.success() {
        bail!(
            "{program} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[derive(Debug, PartialEq)]
struct XdotoolWindow {
    bounds: Bounds,
    title: String,
    pid: Option<u32>,
}

fn parse_idle_millis(output: &str) -> Result<u64> {
    output
        .trim()
        .parse::<u64>()
        .map_err(|err| anyhow!("unexpected xprintidle output {:?}: {err}", output.trim()))
}

/// Parses the chained `getwindowgeometry --shell`, `getwindowname`,
/// `getwindowpid` output. The geometry block ends with `SCREEN=`; the next
/// line is the title and the optional one after it the pid.
fn parse_xdotool_window(output: &str) -> Result<Option<XdotoolWindow>> {
    let mut lines = output.lines();
    let (mut x, mut y, mut width, mut height) = (None, None, None, None);
    let mut saw_screen = false;

    for line in lines.by_ref() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let parsed = value.trim().parse::<f64>().ok();
        match key {
            "X" => x = parsed,
            "Y" => y = parsed,
            "WIDTH" => width = parsed,
            "HEIGHT" => height = parsed,
            "SCREEN" => {
                saw_screen = true;
                break;
            }
            _ => {}
        }
    }

    if !saw_screen {
        return Ok(None);
    }

    let bounds = match (x, y, width, height) {
        (Some(x), Some(y), Some(width), Some(height)) => Bounds::new(x, y, width, height),
        _ => bail!("incomplete xdotool geometry: {:?}", output.trim()),
    };
    let title = lines.next().unwrap_or_default().to_string();
    let pid = lines.next().and_then(|line| line.trim().parse::<u32>().ok());

    Ok(Some(XdotoolWindow { bounds, title, pid }))
}

/// `xrandr --listmonitors` rows look like
/// ` 0: +*eDP-1 1920/344x1080/193+0+0  eDP-1`.
fn parse_xrandr_monitors(output: &str) -> Vec<Bounds> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().find_map(parse_monitor_geometry))
        .collect()
}

fn parse_monitor_geometry(token: &str) -> Option<Bounds> {
    let (width_part, rest) = token.split_once('x')?;
    let width = width_part.split('/').next()?.parse::<f64>().ok()?;

    let mut parts = rest.split('+');
    let height = parts.next()?.split('/').next()?.parse::<f64>().ok()?;
    let x = parts.next()?.parse::<f64>().ok()?;
    let y = parts.next()?.parse::<f64>().ok()?;

    Some(Bounds::new(x, y, width, height))
}
