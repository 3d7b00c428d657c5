//! Orientation fusion and heading calibration engine
//!
//! Turns raw, platform-divergent motion sensor data into one stable compass
//! heading, lets the user correct it against a landmark with a known
//! bearing, and smooths the result for display.
//!
//! # Modules
//!
//! - [`math`]: Heading conversions and wraparound-aware angle helpers
//! - [`session`]: Sensor session state machine (permission, timeout, fallback)
//! - [`smoother`]: Per-frame heading interpolation with snap on large jumps
//! - [`calibration`]: Landmark-based heading correction
//! - [`landmark`]: Landmark catalog and scene coordinate frame
//! - [`direction`]: Landmark direction strip data
//! - [`navigation`]: Coordinator producing the displayed heading
//! - [`config`]: TOML-backed tunables
//! - [`error`]: Error types
//!
//! # Feature Flags
//!
//! - `wasm`: JavaScript facade ([`wasm::WasmNavigator`])
//!
//! # Example
//!
//! ```
//! use devices::{ManualClock, PlatformCapabilities, ScriptedBackend};
//! use heading::{LandmarkCatalog, NavigationConfig, Navigator, PermissionState};
//!
//! let backend = ScriptedBackend::new(PlatformCapabilities {
//!     device_orientation: true,
//!     ..Default::default()
//! });
//! let mut navigator = Navigator::new(
//!     backend,
//!     ManualClock::new(),
//!     LandmarkCatalog::new(),
//!     NavigationConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(navigator.permission_state(), PermissionState::Granted);
//! assert_eq!(navigator.tick(), 0.0);
//! ```

pub mod calibration;
pub mod config;
pub mod direction;
pub mod error;
pub mod landmark;
pub mod math;
pub mod navigation;
pub mod session;
pub mod smoother;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types at crate root
pub use calibration::{Calibration, CalibrationRecord, CalibrationService};
pub use config::{NavigationConfig, SessionConfig, ViewConfig};
pub use direction::{direction_strip, landmark_angles, DirectionStrip, LandmarkAngle, StripQuery, VisibleLandmark};
pub use error::{CalibrationError, CatalogError, ConfigError, ConfigResult};
pub use landmark::{Axis, CoordMap, LandmarkCatalog, LandmarkEntry, LandmarkFrame, PlanarScale};
pub use navigation::Navigator;
pub use session::{HeadingSample, PermissionState, SensorInfo, SensorSession, SessionState};
pub use smoother::{HeadingSmoother, SmoothingConfig};

#[cfg(feature = "wasm")]
pub use wasm::WasmNavigator;
