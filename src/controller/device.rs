//! # DualSense Device Module
//!
//! Detects and opens a PS5 DualSense controller through the Linux evdev
//! interface, and runs a reader thread that keeps the latest [`RawSample`]
//! available to the polling loop without ever blocking it.
//!
//! ## Controller Detection
//!
//! The DualSense controller is identified by:
//! - Vendor ID: 0x054c (Sony)
//! - Product ID: 0x0ce6 (DualSense, both wired and Bluetooth)
//!
//! An explicit device path in the configuration skips detection.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use evdev::Device;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::mapper::EventMapper;
use super::sample::{RawSample, SampleProvider};
use crate::error::{PadBridgeError, Result};

/// PS5 DualSense vendor ID (Sony)
const DUALSENSE_VENDOR_ID: u16 = 0x054c;

/// PS5 DualSense product ID (wired and Bluetooth)
const DUALSENSE_PRODUCT_ID: u16 = 0x0ce6;

/// Directory scanned for event devices during detection.
const INPUT_DIR: &str = "/dev/input";

/// PS5 DualSense controller handle
pub struct DualSenseController {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for DualSenseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualSenseController")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl DualSenseController {
    /// Detect and open the first available PS5 DualSense controller
    ///
    /// Scans `/dev/input/event*` in sorted order and matches vendor and
    /// product IDs.
    ///
    /// # Errors
    ///
    /// - `DeviceNotFound`: No DualSense controller found on the system
    /// - `Device`: `/dev/input` is missing or unreadable
    pub fn open() -> Result<Self> {
        let input_dir = Path::new(INPUT_DIR);

        if !input_dir.exists() {
            return Err(PadBridgeError::Device(format!("{} directory not found", INPUT_DIR)));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| PadBridgeError::Device(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PadBridgeError::Device(format!("Failed to read directory entry: {}", e)))?;

        // Deterministic selection when several controllers are connected
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false);
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    let id = device.input_id();
                    debug!(
                        "Found input device: {} (vendor: 0x{:04x}, product: 0x{:04x})",
                        path.display(),
                        id.vendor(),
                        id.product()
                    );

                    if is_dualsense(id.vendor(), id.product()) {
                        let device_path = path.to_string_lossy().to_string();
                        info!("Found PS5 DualSense controller at: {}", device_path);
                        return Ok(Self { device, device_path });
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(PadBridgeError::DeviceNotFound)
    }

    /// Open a controller at an explicit event device path
    ///
    /// # Errors
    ///
    /// Returns `Device` if the node cannot be opened.
    pub fn open_path(path: &str) -> Result<Self> {
        let device = Device::open(path)
            .map_err(|e| PadBridgeError::Device(format!("Failed to open {}: {}", path, e)))?;
        info!("Opened controller at: {}", path);
        Ok(Self {
            device,
            device_path: path.to_string(),
        })
    }

    /// Get the device path of this controller
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Get controller name from evdev
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Fetch events from the controller. Blocks until events are available.
    ///
    /// # Errors
    ///
    /// Returns `Device` if reading fails (typically a disconnect).
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = evdev::InputEvent> + '_> {
        self.device
            .fetch_events()
            .map_err(|e| PadBridgeError::Device(format!("Failed to fetch events: {}", e)))
    }
}

fn is_dualsense(vendor: u16, product: u16) -> bool {
    vendor == DUALSENSE_VENDOR_ID && product == DUALSENSE_PRODUCT_ID
}

/// [`SampleProvider`] backed by an evdev reader thread.
///
/// The thread blocks on the device and publishes every update through a
/// watch channel; [`SampleProvider::sample`] only reads the latest value. If
/// the controller disappears the published sample flips to disconnected and
/// the thread retries every `reconnect_interval`.
///
/// Dropping the source raises a stop flag but cannot interrupt a blocking
/// read. The thread exits once its current read returns, on the next event
/// from the controller or on disconnect, or after the current reconnect
/// sleep. Until then it only holds the device handle and keeps publishing
/// into a channel nobody reads.
pub struct EvdevSource {
    latest: watch::Receiver<RawSample>,
    shutdown: Arc<AtomicBool>,
}

impl std::fmt::Debug for EvdevSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevSource")
            .field("connected", &self.latest.borrow().connected)
            .finish_non_exhaustive()
    }
}

impl EvdevSource {
    /// Starts the reader thread.
    ///
    /// An empty `device_path` selects automatic DualSense detection.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the thread cannot be spawned.
    pub fn spawn(device_path: &str, reconnect_interval: Duration) -> Result<Self> {
        let (tx, latest) = watch::channel(RawSample::disconnected());
        let shutdown = Arc::new(AtomicBool::new(false));
        let path = device_path.to_string();
        let stop = Arc::clone(&shutdown);

        thread::Builder::new()
            .name("evdev-reader".into())
            .spawn(move || reader_loop(&path, reconnect_interval, &tx, &stop))?;

        Ok(Self { latest, shutdown })
    }
}

impl SampleProvider for EvdevSource {
    fn sample(&mut self) -> RawSample {
        self.latest.borrow().clone()
    }
}

impl Drop for EvdevSource {
    /// Signals the reader thread without joining it.
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

fn open_controller(device_path: &str) -> Result<DualSenseController> {
    if device_path.is_empty() {
        DualSenseController::open()
    } else {
        DualSenseController::open_path(device_path)
    }
}

fn reader_loop(
    device_path: &str,
    reconnect_interval: Duration,
    tx: &watch::Sender<RawSample>,
    shutdown: &AtomicBool,
) {
    while !shutdown.load(Ordering::Relaxed) {
        let mut controller = match open_controller(device_path) {
            Ok(controller) => controller,
            Err(e) => {
                debug!("Controller unavailable: {}", e);
                tx.send_replace(RawSample::disconnected());
                thread::sleep(reconnect_interval);
                continue;
            }
        };

        info!(
            "Reading controller input from {} ({})",
            controller.device_path(),
            controller.name().unwrap_or("unknown")
        );
        let mut mapper = EventMapper::new(Some(Arc::from(controller.device_path())));
        tx.send_replace(mapper.sample().clone());

        while !shutdown.load(Ordering::Relaxed) {
            match controller.fetch_events() {
                Ok(events) => {
                    for event in events {
                        mapper.process_event(&event);
                    }
                    tx.send_replace(mapper.sample().clone());
                }
                Err(e) => {
                    warn!("Controller disconnected: {}", e);
                    tx.send_replace(RawSample::disconnected());
                    break;
                }
            }
        }
    }
    debug!("evdev reader stopped");
}
