//! # Controller Devices
//!
//! Discovery of physical gamepads under `/dev/input` and the reader
//! tasks that turn their raw evdev events into [`ControllerEvent`]s.
//!
//! ## Detection
//!
//! A device qualifies when it reports `BTN_SOUTH` and its name does not
//! start with [`VIRTUAL_DEVICE_PREFIX`]. Every qualifying device is
//! opened; their events are merged into one channel.
//!
//! ## Exclusive Mode
//!
//! Each reader watches a shared `bool`. While it is `true` the device is
//! grabbed so no other client sees its events. Readers always ungrab
//! before exiting.

use evdev::{Device, Key};
use std::path::Path;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::events::{AxisRanges, ControllerEvent, EventMapper};
use crate::error::{PadmapError, Result};
use crate::output::VIRTUAL_DEVICE_PREFIX;

/// Directory scanned for event devices.
const INPUT_DIR: &str = "/dev/input";

/// Open gamepad handle
pub struct Controller {
    device: Device,
    device_path: String,
}

/// Returns true if a device with this name and button support should be
/// read as a controller.
#[must_use]
pub fn is_candidate(name: Option<&str>, has_gamepad_buttons: bool) -> bool {
    if !has_gamepad_buttons {
        return false;
    }
    !name.is_some_and(|name| name.starts_with(VIRTUAL_DEVICE_PREFIX))
}

impl Controller {
    /// Open every available gamepad
    ///
    /// Scans `/dev/input/event*` in sorted order.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: no device qualified
    /// - `Controller`: `/dev/input` is missing or unreadable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padmap::controller::device::Controller;
    ///
    /// for controller in Controller::open_all()? {
    ///     println!("Controller at: {}", controller.device_path());
    /// }
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open_all() -> Result<Vec<Self>> {
        let input_dir = Path::new(INPUT_DIR);

        if !input_dir.exists() {
            return Err(PadmapError::Controller(format!(
                "{} directory not found",
                INPUT_DIR
            )));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| PadmapError::Controller(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PadmapError::Controller(format!("Failed to read directory entry: {}", e)))?;

        entries.sort_by_key(|entry| entry.path());

        let mut controllers = Vec::new();

        for entry in entries {
            let path = entry.path();

            match path.file_name() {
                Some(filename) if filename.to_string_lossy().starts_with("event") => {}
                _ => continue,
            }

            match Device::open(&path) {
                Ok(device) => {
                    let has_buttons = device
                        .supported_keys()
                        .is_some_and(|keys| keys.contains(Key::BTN_SOUTH));
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if is_candidate(device.name(), has_buttons) {
                        let device_path = path.to_string_lossy().to_string();
                        info!(
                            "Found controller '{}' at: {}",
                            device.name().unwrap_or("unnamed"),
                            device_path
                        );
                        controllers.push(Controller {
                            device,
                            device_path,
                        });
                    }
                }
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        if controllers.is_empty() {
            return Err(PadmapError::ControllerNotFound);
        }

        Ok(controllers)
    }

    /// Path of the `/dev/input/eventX` node this controller was opened from.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Device name reported by the kernel.
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Starts the reader task.
    ///
    /// Mapped events go to `events`; the task ends when the device
    /// disconnects, the receiver is dropped or `grab` is closed.
    pub fn spawn(
        self,
        events: mpsc::Sender<ControllerEvent>,
        mut grab: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let device_path = self.device_path;
        let mut mapper = EventMapper::new(AxisRanges::from_device(&self.device));

        tokio::spawn(async move {
            let mut stream = match self.device.into_event_stream() {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("Failed to read controller {}: {}", device_path, e);
                    return;
                }
            };

            let mut grabbed = false;
            if *grab.borrow_and_update() {
                grabbed = set_grab(stream.device_mut(), true, &device_path);
            }

            'read: loop {
                tokio::select! {
                    changed = grab.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let wanted = *grab.borrow_and_update();
                        if wanted != grabbed {
                            grabbed = set_grab(stream.device_mut(), wanted, &device_path);
                        }
                    }
                    event = stream.next_event() => {
                        match event {
                            Ok(event) => {
                                for mapped in mapper.process_event(&event) {
                                    if events.send(mapped).await.is_err() {
                                        break 'read;
                                    }
                                }
                            }
                            Err(e) => {
                                warn!("Controller {} disconnected: {}", device_path, e);
                                break;
                            }
                        }
                    }
                }
            }

            if grabbed {
                set_grab(stream.device_mut(), false, &device_path);
            }
            debug!("Reader for {} stopped", device_path);
        })
    }
}

/// Grabs or ungrabs `device`, returning the resulting grab state.
fn set_grab(device: &mut Device, grab: bool, path: &str) -> bool {
    let result = if grab { device.grab() } else { device.ungrab() };
    match result {
        Ok(()) => {
            debug!("{} {}", if grab { "Grabbed" } else { "Released" }, path);
            grab
        }
        Err(e) => {
            warn!("Failed to {} {}: {}", if grab { "grab" } else { "ungrab" }, path, e);
            !grab
        }
    }
}
