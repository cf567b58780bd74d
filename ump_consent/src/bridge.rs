//! Abstraction over the native UMP SDKs.
//!
//! Implementations wrap the Android and iOS SDKs. On other platforms [`platform_bridge`] returns a
//! [`StubBridge`] whose operations fail with [`BridgeError::PlatformUnavailable`].
use crate::config::{ConsentConfig, DebugSettings};
use crate::status::Platform;
use thiserror::Error;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("consent SDK is not available on this platform")]
    PlatformUnavailable,
    #[error("consent info update failed: {0}")]
    RequestFailed(String),
    #[error("no consent form available")]
    FormUnavailable,
    #[error("consent form failed: {0}")]
    FormFailed(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Parameters of a consent information update request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequestParameters {
    pub tag_for_under_age_of_consent: bool,
    pub debug: Option<DebugSettings>,
}

impl From<&ConsentConfig> for RequestParameters {
    fn from(config: &ConsentConfig) -> Self {
        Self {
            tag_for_under_age_of_consent: config.tag_for_under_age_of_consent,
            debug: config.debug.clone(),
        }
    }
}

/// Operations of the native consent SDK used by the orchestrator.
pub trait NativeConsentBridge {
    fn platform(&self) -> Platform;

    /// Requests an update of the consent information, which may change the status.
    fn request_consent_info_update(&mut self, params: &RequestParameters) -> Result<()>;

    fn is_consent_form_available(&self) -> bool;

    /// Current status, as the platform's numeric code.
    fn consent_status_code(&self) -> Result<i64>;

    /// Loads the consent form and shows it. Returns once the form is dismissed.
    fn show_consent_form(&mut self) -> Result<()>;

    fn can_request_ads(&self) -> bool;

    /// Clears the consent state kept by the SDK.
    fn reset(&mut self) -> Result<()>;
}

impl<B: NativeConsentBridge + ?Sized> NativeConsentBridge for Box<B> {
    fn platform(&self) -> Platform {
        (**self).platform()
    }

    fn request_consent_info_update(&mut self, params: &RequestParameters) -> Result<()> {
        (**self).request_consent_info_update(params)
    }

    fn is_consent_form_available(&self) -> bool {
        (**self).is_consent_form_available()
    }

    fn consent_status_code(&self) -> Result<i64> {
        (**self).consent_status_code()
    }

    fn show_consent_form(&mut self) -> Result<()> {
        (**self).show_consent_form()
    }

    fn can_request_ads(&self) -> bool {
        (**self).can_request_ads()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }
}

/// Bridge used where no native SDK is linked.
#[derive(Clone, Copy, Debug)]
pub struct StubBridge {
    platform: Platform,
}

impl StubBridge {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

impl NativeConsentBridge for StubBridge {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn request_consent_info_update(&mut self, _params: &RequestParameters) -> Result<()> {
        tracing::warn!("request_consent_info_update called on stub bridge");
        Err(BridgeError::PlatformUnavailable)
    }

    fn is_consent_form_available(&self) -> bool {
        false
    }

    fn consent_status_code(&self) -> Result<i64> {
        Err(BridgeError::PlatformUnavailable)
    }

    fn show_consent_form(&mut self) -> Result<()> {
        tracing::warn!("show_consent_form called on stub bridge");
        Err(BridgeError::PlatformUnavailable)
    }

    fn can_request_ads(&self) -> bool {
        false
    }

    fn reset(&mut self) -> Result<()> {
        tracing::warn!("reset called on stub bridge");
        Err(BridgeError::PlatformUnavailable)
    }
}

/// The bridge for the target operating system.
pub fn platform_bridge() -> Box<dyn NativeConsentBridge + Send> {
    #[cfg(target_os = "ios")]
    let platform = Platform::Ios;
    #[cfg(not(target_os = "ios"))]
    let platform = Platform::Android;

    Box::new(StubBridge::new(platform))
}
