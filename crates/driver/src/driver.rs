//! Driver singleton and SDK trampolines

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use contracts::{
    ImagePoint, SdkEvent, SdkOptions, SensorHandle, SensorInformation, SensorSdk,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{DriverError, Result};
use crate::state::DriverState;

/// Closure receiving each image-space batch. `points` is valid only during the call.
pub type OnReceiveCallback = Arc<dyn Fn(SensorHandle, &[ImagePoint]) + Send + Sync>;

/// Closure receiving SDK runtime events.
pub type OnEventCallback = Arc<dyn Fn(&SdkEvent<'_>) + Send + Sync>;

static INSTANCE: OnceLock<Driver> = OnceLock::new();

#[derive(Default)]
struct Inner {
    state: DriverState,
    sdk: Option<Arc<dyn SensorSdk>>,
    on_receive: Option<OnReceiveCallback>,
    on_event: Option<OnEventCallback>,
}

/// Lifecycle wrapper around the SDK's global callback registration
///
/// State and closures live behind one mutex. The mutex is never held across a
/// call into the SDK, so an SDK thread delivering a callback while another
/// thread tears the driver down cannot deadlock.
pub struct Driver {
    inner: Mutex<Inner>,
}

impl Driver {
    /// The process-wide driver, created on first access
    pub fn get_instance() -> &'static Driver {
        INSTANCE.get_or_init(Driver::new)
    }

    fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> DriverState {
        self.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == DriverState::Active
    }

    /// Register with the SDK and start forwarding batches and events.
    ///
    /// # Errors
    /// - `AlreadyInitialized` unless the driver is Uninitialized; the existing
    ///   registration is left intact
    /// - `SdkInitFailed` / `SdkListenFailed` with the SDK's code; the driver
    ///   rolls back to Uninitialized
    #[instrument(name = "driver_initialize", skip_all, fields(control_flags = options.control_flags))]
    pub fn initialize(
        &self,
        sdk: Arc<dyn SensorSdk>,
        options: &SdkOptions,
        on_receive: OnReceiveCallback,
        on_event: OnEventCallback,
    ) -> Result<()> {
        {
            let mut inner = self.lock();
            if inner.state != DriverState::Uninitialized {
                warn!(state = %inner.state, "driver initialize rejected");
                return Err(DriverError::AlreadyInitialized);
            }
            inner.state = DriverState::Initializing;
            inner.sdk = Some(Arc::clone(&sdk));
            inner.on_receive = Some(on_receive);
            inner.on_event = Some(on_event);
        }

        if let Err(code) = sdk.initialize(options, event_trampoline) {
            self.reset();
            return Err(DriverError::SdkInitFailed(code));
        }

        if let Err(code) = sdk.listen_image_frames(points_trampoline) {
            if let Err(deinit) = sdk.deinitialize() {
                warn!(error = %deinit, "SDK deinitialize after listen failure failed");
            }
            self.reset();
            return Err(DriverError::SdkListenFailed(code));
        }

        // A deinitialize that arrived meanwhile left the state at Deinitializing
        let cancelled = {
            let mut inner = self.lock();
            match inner.state {
                DriverState::Initializing => {
                    inner.state = DriverState::Active;
                    false
                }
                _ => true,
            }
        };
        if cancelled {
            unregister(sdk.as_ref());
            self.reset();
            info!("driver initialize cancelled by deinitialize");
            return Err(DriverError::InitializeCancelled);
        }

        info!("driver active");
        Ok(())
    }

    /// Unregister from the SDK. No-op when Uninitialized.
    ///
    /// SDK failures are logged; the driver always ends Uninitialized. During
    /// an in-flight `initialize` the request is recorded and that call
    /// unregisters before returning. A callback already running keeps its
    /// closure until it returns.
    #[instrument(name = "driver_deinitialize", skip(self))]
    pub fn deinitialize(&self) {
        let sdk = {
            let mut inner = self.lock();
            match inner.state {
                DriverState::Uninitialized => {
                    debug!("driver deinitialize skipped, not initialized");
                    return;
                }
                DriverState::Deinitializing => {
                    debug!("driver deinitialize already in progress");
                    return;
                }
                DriverState::Initializing => {
                    inner.state = DriverState::Deinitializing;
                    info!("driver deinitialize deferred to in-flight initialize");
                    return;
                }
                DriverState::Active => {
                    inner.state = DriverState::Deinitializing;
                    inner.sdk.clone()
                }
            }
        };

        if let Some(sdk) = sdk {
            unregister(sdk.as_ref());
        }

        self.reset();
        info!("driver deinitialized");
    }

    /// Look up the latest metadata snapshot for `handle`.
    pub fn sensor_information(&self, handle: SensorHandle) -> Result<SensorInformation> {
        self.active_sdk()?
            .sensor_information(handle)
            .map_err(|code| DriverError::SensorLookupFailed { handle, code })
    }

    /// Open a capture file and start replaying it.
    ///
    /// # Errors
    /// `SdkCaptureFailed` naming the first call that failed.
    #[instrument(name = "driver_capture_replay", skip(self), fields(path = %path.display()))]
    pub fn start_capture_replay(&self, path: &Path, enable_loop: bool) -> Result<()> {
        let sdk = self.active_sdk()?;

        sdk.capture_replay_open(path)
            .map_err(|code| DriverError::capture("capture_replay_open", code))?;
        sdk.capture_replay_set_enable_loop(enable_loop)
            .map_err(|code| DriverError::capture("capture_replay_set_enable_loop", code))?;
        sdk.capture_replay_resume()
            .map_err(|code| DriverError::capture("capture_replay_resume", code))?;

        info!(enable_loop, "capture replay started");
        Ok(())
    }

    fn active_sdk(&self) -> Result<Arc<dyn SensorSdk>> {
        let inner = self.lock();
        match (&inner.state, &inner.sdk) {
            (DriverState::Active, Some(sdk)) => Ok(Arc::clone(sdk)),
            _ => Err(DriverError::NotInitialized),
        }
    }

    fn reset(&self) {
        let mut inner = self.lock();
        inner.on_receive = None;
        inner.on_event = None;
        inner.sdk = None;
        inner.state = DriverState::Uninitialized;
    }

    fn receive_callback(&self) -> Option<OnReceiveCallback> {
        let inner = self.lock();
        match inner.state {
            DriverState::Active => inner.on_receive.clone(),
            _ => None,
        }
    }

    fn event_callback(&self) -> Option<OnEventCallback> {
        let inner = self.lock();
        match inner.state {
            DriverState::Active => inner.on_event.clone(),
            _ => None,
        }
    }
}

/// Best-effort SDK teardown; failures are logged
fn unregister(sdk: &dyn SensorSdk) {
    if let Err(code) = sdk.unlisten_image_frames() {
        warn!(error = %code, "SDK unlisten_image_frames failed");
    }
    if let Err(code) = sdk.deinitialize() {
        warn!(error = %code, "SDK deinitialize failed");
    }
}

fn points_trampoline(handle: SensorHandle, points: &[ImagePoint]) {
    let Some(driver) = INSTANCE.get() else {
        return;
    };
    match driver.receive_callback() {
        Some(on_receive) => on_receive(handle, points),
        None => trace!(handle = %handle, "batch dropped, driver not active"),
    }
}

fn event_trampoline(event: &SdkEvent<'_>) {
    let Some(driver) = INSTANCE.get() else {
        return;
    };
    match driver.event_callback() {
        Some(on_event) => on_event(event),
        None => trace!(handle = %event.handle, code = %event.code, "event dropped, driver not active"),
    }
}
