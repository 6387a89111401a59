//! Mock sensor SDK
//!
//! Implements the `SensorSdk` boundary without hardware: configured sensors are
//! "discovered" on initialize and emit batches from background threads once a
//! points callback is registered. Failures can be injected per call.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use contracts::{
    EventCallback, ImagePoint, PointsCallback, SdkErrorCode, SdkEvent, SdkOptions, SdkResult,
    SensorHandle, SensorInformation, SensorSdk, SerialNumber, SimulatedSensorConfig,
};
use tracing::{debug, info, instrument, warn};

use crate::simulator::{emit_interval, spawn_emitter};
use crate::slots::CallbackSlots;

/// First handle handed out, so handles are easy to tell apart from serials
const FIRST_HANDLE: u64 = 0x1000;

/// Mock SDK configuration
#[derive(Debug, Clone)]
pub struct MockSdkConfig {
    /// Sensors discovered on initialize
    pub sensors: Vec<SimulatedSensorConfig>,
    /// Start emitter threads as soon as the points slot is registered
    pub emit_on_listen: bool,
    pub fail_initialize: Option<SdkErrorCode>,
    pub fail_listen: Option<SdkErrorCode>,
    pub fail_deinitialize: Option<SdkErrorCode>,
    pub fail_capture_open: Option<SdkErrorCode>,
    pub fail_capture_loop: Option<SdkErrorCode>,
    pub fail_capture_resume: Option<SdkErrorCode>,
}

impl Default for MockSdkConfig {
    fn default() -> Self {
        Self {
            sensors: Vec::new(),
            emit_on_listen: true,
            fail_initialize: None,
            fail_listen: None,
            fail_deinitialize: None,
            fail_capture_open: None,
            fail_capture_loop: None,
            fail_capture_resume: None,
        }
    }
}

/// Capture replay state as seen by the mock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureState {
    pub path: Option<PathBuf>,
    pub loop_enabled: bool,
    pub playing: bool,
}

/// Mock SDK
pub struct MockSdk {
    config: MockSdkConfig,
    /// Handle assigned to each configured sensor
    simulated: Vec<(SensorHandle, SimulatedSensorConfig)>,
    slots: Arc<CallbackSlots>,
    initialized: AtomicBool,
    options: Mutex<Option<SdkOptions>>,
    /// Sensors visible in the current session
    sensors: Mutex<BTreeMap<SensorHandle, SensorInformation>>,
    capture: Mutex<CaptureState>,
    next_handle: AtomicU64,
    running: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    delivered: Arc<AtomicU64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockSdk {
    /// Create a mock SDK with no sensors
    pub fn new() -> Self {
        Self::with_config(MockSdkConfig::default())
    }

    /// Create a mock SDK from configuration
    pub fn with_config(config: MockSdkConfig) -> Self {
        let simulated: Vec<_> = config
            .sensors
            .iter()
            .enumerate()
            .map(|(i, sensor)| (SensorHandle(FIRST_HANDLE + i as u64), sensor.clone()))
            .collect();
        let next_handle = FIRST_HANDLE + simulated.len() as u64;

        Self {
            config,
            simulated,
            slots: Arc::new(CallbackSlots::default()),
            initialized: AtomicBool::new(false),
            options: Mutex::new(None),
            sensors: Mutex::new(BTreeMap::new()),
            capture: Mutex::new(CaptureState::default()),
            next_handle: AtomicU64::new(next_handle),
            running: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(Vec::new()),
            delivered: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a mock SDK simulating `sensors`
    pub fn with_sensors(sensors: Vec<SimulatedSensorConfig>) -> Self {
        Self::with_config(MockSdkConfig {
            sensors,
            ..Default::default()
        })
    }

    /// Handle the mock assigned to a configured serial number
    pub fn handle_for(&self, serial_number: SerialNumber) -> Option<SensorHandle> {
        self.simulated
            .iter()
            .find(|(_, s)| s.serial_number == serial_number)
            .map(|(handle, _)| *handle)
            .or_else(|| {
                lock(&self.sensors)
                    .values()
                    .find(|info| info.serial_number == serial_number)
                    .map(|info| info.handle)
            })
    }

    /// Make a sensor visible to metadata lookups in this session
    pub fn add_sensor(&self, serial_number: SerialNumber, model_name: &str) -> SensorHandle {
        let handle = SensorHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        lock(&self.sensors).insert(
            handle,
            SensorInformation {
                handle,
                serial_number,
                model_name: model_name.to_string(),
                model: 0,
                firmware_version: 0,
            },
        );
        handle
    }

    /// Forget a sensor; later metadata lookups fail with `ERROR_SENSOR_NOT_FOUND`
    pub fn remove_sensor(&self, handle: SensorHandle) -> Option<SensorInformation> {
        lock(&self.sensors).remove(&handle)
    }

    /// Deliver `points` through the registered slot on the calling thread.
    ///
    /// Returns false when no points callback is registered.
    pub fn emit_points(&self, handle: SensorHandle, points: &[ImagePoint]) -> bool {
        match self.slots.points() {
            Some(on_points) => {
                on_points(handle, points);
                self.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Deliver a runtime event through the registered slot.
    pub fn emit_event(&self, handle: SensorHandle, code: SdkErrorCode, message: &str) -> bool {
        match self.slots.event() {
            Some(on_event) => {
                on_event(&SdkEvent {
                    handle,
                    code,
                    message,
                    data: &[],
                });
                true
            }
            None => false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn is_listening(&self) -> bool {
        self.slots.points().is_some()
    }

    /// Options passed to the last successful initialize
    pub fn options(&self) -> Option<SdkOptions> {
        *lock(&self.options)
    }

    pub fn capture_state(&self) -> CaptureState {
        lock(&self.capture).clone()
    }

    /// Batches handed to the points slot so far
    pub fn batches_delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    fn ensure_initialized(&self) -> SdkResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(SdkErrorCode::ERROR_NOT_INITIALIZED)
        }
    }

    fn discover_sensors(&self) {
        let mut sensors = lock(&self.sensors);
        for (handle, sensor) in &self.simulated {
            sensors.insert(
                *handle,
                SensorInformation {
                    handle: *handle,
                    serial_number: sensor.serial_number,
                    model_name: sensor.model_name.clone(),
                    model: sensor.model,
                    firmware_version: sensor.firmware_version,
                },
            );
        }
        debug!(sensors = sensors.len(), "mock sensors discovered");
    }

    fn start_emitters(&self) -> SdkResult<()> {
        let mut intervals = Vec::with_capacity(self.simulated.len());
        for (_, sensor) in &self.simulated {
            match emit_interval(sensor.frequency_hz) {
                Some(interval) => intervals.push(interval),
                None => {
                    warn!(
                        serial_number = %sensor.serial_number,
                        frequency_hz = sensor.frequency_hz,
                        "unusable simulated sensor frequency"
                    );
                    return Err(SdkErrorCode::ERROR_INVALID_ARGUMENTS);
                }
            }
        }

        if self.simulated.is_empty() || self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut workers = lock(&self.workers);
        for ((handle, sensor), interval) in self.simulated.iter().zip(intervals) {
            workers.push(spawn_emitter(
                *handle,
                sensor.clone(),
                interval,
                Arc::clone(&self.slots),
                Arc::clone(&self.running),
                Arc::clone(&self.delivered),
            ));
        }
        info!(sensors = workers.len(), "mock emitters started");
        Ok(())
    }

    fn stop_emitters(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        let workers = std::mem::take(&mut *lock(&self.workers));
        for worker in workers {
            if worker.join().is_err() {
                warn!("mock emitter thread panicked");
            }
        }
        debug!("mock emitters stopped");
    }
}

impl Default for MockSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MockSdk {
    fn drop(&mut self) {
        self.stop_emitters();
    }
}

impl SensorSdk for MockSdk {
    #[instrument(name = "mock_sdk_initialize", skip(self, on_event), fields(control_flags = options.control_flags))]
    fn initialize(&self, options: &SdkOptions, on_event: EventCallback) -> SdkResult<()> {
        if let Some(code) = self.config.fail_initialize {
            return Err(code);
        }
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(SdkErrorCode::ERROR_ALREADY_INITIALIZED);
        }

        *lock(&self.options) = Some(*options);
        self.slots.set_event(on_event);
        self.discover_sensors();
        Ok(())
    }

    #[instrument(name = "mock_sdk_deinitialize", skip(self))]
    fn deinitialize(&self) -> SdkResult<()> {
        self.ensure_initialized()?;

        // Join emitters before clearing slots so no batch observes a half-torn session
        self.stop_emitters();
        self.slots.clear_all();
        lock(&self.sensors).clear();
        *lock(&self.capture) = CaptureState::default();
        *lock(&self.options) = None;
        self.initialized.store(false, Ordering::SeqCst);

        match self.config.fail_deinitialize {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    fn listen_image_frames(&self, on_points: PointsCallback) -> SdkResult<()> {
        self.ensure_initialized()?;
        if let Some(code) = self.config.fail_listen {
            return Err(code);
        }
        if !self.slots.set_points(on_points) {
            return Err(SdkErrorCode::ERROR_TOO_MANY_CALLBACKS);
        }

        if self.config.emit_on_listen {
            if let Err(code) = self.start_emitters() {
                self.slots.clear_points();
                return Err(code);
            }
        }
        Ok(())
    }

    fn unlisten_image_frames(&self) -> SdkResult<()> {
        self.ensure_initialized()?;
        self.slots.clear_points();
        Ok(())
    }

    fn sensor_information(&self, handle: SensorHandle) -> SdkResult<SensorInformation> {
        self.ensure_initialized()?;
        lock(&self.sensors)
            .get(&handle)
            .cloned()
            .ok_or(SdkErrorCode::ERROR_SENSOR_NOT_FOUND)
    }

    #[instrument(name = "mock_sdk_capture_open", skip(self), fields(path = %path.display()))]
    fn capture_replay_open(&self, path: &Path) -> SdkResult<()> {
        self.ensure_initialized()?;
        if let Some(code) = self.config.fail_capture_open {
            return Err(code);
        }
        if !path.is_file() {
            return Err(SdkErrorCode::ERROR_FILE_IO);
        }

        let mut capture = lock(&self.capture);
        capture.path = Some(path.to_path_buf());
        capture.playing = false;
        Ok(())
    }

    fn capture_replay_set_enable_loop(&self, enable: bool) -> SdkResult<()> {
        self.ensure_initialized()?;
        if let Some(code) = self.config.fail_capture_loop {
            return Err(code);
        }

        let mut capture = lock(&self.capture);
        if capture.path.is_none() {
            return Err(SdkErrorCode::ERROR_NOT_OPEN);
        }
        capture.loop_enabled = enable;
        Ok(())
    }

    fn capture_replay_resume(&self) -> SdkResult<()> {
        self.ensure_initialized()?;
        if let Some(code) = self.config.fail_capture_resume {
            return Err(code);
        }

        {
            let mut capture = lock(&self.capture);
            if capture.path.is_none() {
                return Err(SdkErrorCode::ERROR_NOT_OPEN);
            }
            capture.playing = true;
        }

        // Replay drives the simulated sensors
        if self.is_listening() {
            self.start_emitters()?;
        }
        Ok(())
    }
}
