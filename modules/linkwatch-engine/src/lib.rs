pub mod classifier;
pub mod driver;
pub mod error;
pub mod observation;
pub mod orchestrator;
pub mod platform;
pub mod probe;
pub mod profiles;
pub mod rules;
pub mod secondary;
pub mod signals;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod types;

pub use classifier::Classifier;
pub use driver::{BrowserEngine, BrowserLauncher, BrowserPage, DriverError, WaitCondition};
pub use error::{EngineError, Result};
pub use observation::PageObservation;
pub use orchestrator::{LinkClassifier, Orchestrator};
pub use platform::identify_platform;
pub use probe::{NavigationProbe, ProbeTimings};
pub use profiles::{PlatformProfile, Profiles};
pub use secondary::{EngineFallbackProbe, Identities, SecondaryProbe};
pub use types::{ClassificationResult, LinkRecord, LoginWallPolicy, Platform, Verdict};
