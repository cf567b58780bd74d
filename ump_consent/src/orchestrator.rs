//! The consent flow: requesting consent information, showing the form and publishing the status.
//!
//! ```
//! use ump_consent::bridge::StubBridge;
//! use ump_consent::config::ConsentConfig;
//! use ump_consent::orchestrator::ConsentOrchestrator;
//! use ump_consent::status::{ConsentEvent, ConsentStatus, Platform, StatusTransition};
//! use ump_consent::storage::MemoryStorage;
//!
//! let mut orchestrator = ConsentOrchestrator::new(
//!     StubBridge::new(Platform::Android),
//!     MemoryStorage::new(),
//!     ConsentConfig::default(),
//! );
//! let events = orchestrator.subscribe();
//!
//! orchestrator.initialize();
//!
//! assert_eq!(
//!     events.try_recv(),
//!     Ok(ConsentEvent::StatusChanged(StatusTransition {
//!         from: ConsentStatus::Unknown,
//!         to: ConsentStatus::Unknown,
//!     }))
//! );
//! // GDPR does not apply without consent signals
//! assert!(orchestrator.can_show_ads());
//! ```
use crate::bridge::{NativeConsentBridge, RequestParameters};
use crate::config::ConsentConfig;
use crate::expiry::now_millis;
use crate::signals::{ConsentDecisions, ConsentSignals, FirebaseConsent};
use crate::status::{ConsentEvent, ConsentStatus, StatusTransition};
use crate::storage::{ConsentStorage, ConsentStorageMut, TC_STRING};
use num_traits::ToPrimitive;
use std::sync::mpsc::{Receiver, Sender, channel};

/// Holds the consent state of the application and drives the native consent SDK.
#[derive(Debug)]
pub struct ConsentOrchestrator<B, S> {
    bridge: B,
    storage: S,
    config: ConsentConfig,
    status: ConsentStatus,
    form_available: bool,
    initialized: bool,
    subscribers: Vec<Sender<ConsentEvent>>,
}

impl<B, S> ConsentOrchestrator<B, S>
where
    B: NativeConsentBridge,
    S: ConsentStorage,
{
    pub fn new(bridge: B, storage: S, config: ConsentConfig) -> Self {
        Self {
            bridge,
            storage,
            config,
            status: ConsentStatus::Unknown,
            form_available: false,
            initialized: false,
            subscribers: Vec::new(),
        }
    }

    /// Returns a channel receiving every event published from now on.
    pub fn subscribe(&mut self) -> Receiver<ConsentEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn config(&self) -> &ConsentConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The status as of the last refresh.
    pub fn status(&self) -> ConsentStatus {
        self.status
    }

    pub fn is_form_required(&self) -> bool {
        self.status.is_form_required()
    }

    pub fn is_form_available(&self) -> bool {
        self.form_available
    }

    /// Whether the SDK allows requesting ads. Always false before initialization.
    pub fn can_request_ads(&self) -> bool {
        self.initialized && self.bridge.can_request_ads()
    }

    /// Reads the current consent signals from storage.
    pub fn signals(&self) -> ConsentSignals {
        ConsentSignals::load(&self.storage)
    }

    pub fn is_gdpr_required(&self) -> bool {
        self.signals().is_gdpr_applicable()
    }

    pub fn can_show_ads(&self) -> bool {
        let signals = self.signals();
        signals.gdpr_gated(signals.can_show_ads())
    }

    pub fn can_show_personalized_ads(&self) -> bool {
        let signals = self.signals();
        signals.gdpr_gated(signals.can_show_personalized_ads())
    }

    pub fn firebase_consent(&self) -> FirebaseConsent {
        let signals = self.signals();
        signals.firebase_consent().gated(signals.is_gdpr_applicable())
    }

    /// Whether the TCF vendor has consent.
    pub fn consent_for_vendor<I: ToPrimitive>(&self, vendor_id: I) -> bool {
        self.signals().is_vendor_authorized(vendor_id)
    }

    /// Whether the Google ATP provider has consent in the Additional Consent string.
    pub fn consent_for_additional<I: ToPrimitive>(&self, external_id: I) -> bool {
        self.signals().is_external_authorized(external_id)
    }

    /// Every decision for the configured Google vendor id.
    pub fn decisions(&self, now_millis: i64) -> ConsentDecisions {
        self.signals()
            .decisions(self.config.google_vendor_id, &self.config.expiry, now_millis)
    }

    /// Refreshes the status, optionally shows the consent form and publishes the outcome.
    ///
    /// With `force_show`, the form is shown if available and [`ConsentEvent::FormClosed`] is
    /// published once it is dismissed, or right away if there is no form to show. The status is
    /// published when `dispatch` is set, and always after the form was shown or could not be.
    pub fn load_form(&mut self, force_show: bool, dispatch: bool) {
        if !self.form_available {
            tracing::error!("consent form not available");
            self.refresh_status(dispatch || force_show);
            if force_show {
                self.publish(ConsentEvent::FormClosed);
            }
            return;
        }

        if !force_show {
            self.refresh_status(dispatch);
            return;
        }

        match self.bridge.show_consent_form() {
            Ok(()) => tracing::debug!("consent form dismissed"),
            Err(e) => tracing::error!(error = %e, "consent form dismissed with error"),
        }

        self.refresh_status(true);
        self.publish(ConsentEvent::FormClosed);
    }

    pub fn show_form(&mut self) {
        self.load_form(true, false);
    }

    /// Shows the form if consent is required. Otherwise [`ConsentEvent::FormClosed`] is published
    /// right away.
    pub fn show_form_if_required(&mut self) {
        if self.is_form_required() {
            self.show_form();
        } else {
            tracing::debug!(status = %self.status, "consent form not required");
            self.publish(ConsentEvent::FormClosed);
        }
    }

    /// Reads the status from the SDK. On error the previous status is kept.
    fn refresh_status(&mut self, dispatch: bool) {
        let from = self.status;

        match self.bridge.consent_status_code() {
            Ok(code) => {
                self.status = ConsentStatus::from_code(self.bridge.platform(), code);
            }
            Err(e) => {
                tracing::error!(error = %e, "could not get consent status, keeping previous one");
            }
        }

        let transition = StatusTransition {
            from,
            to: self.status,
        };
        tracing::debug!(from = %transition.from, to = %transition.to, "refreshed consent status");

        if dispatch {
            self.publish(ConsentEvent::StatusChanged(transition));
        }
    }

    fn publish(&mut self, event: ConsentEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

impl<B, S> ConsentOrchestrator<B, S>
where
    B: NativeConsentBridge,
    S: ConsentStorageMut,
{
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Requests up-to-date consent information and publishes the resulting status.
    ///
    /// Calling it again has no effect.
    pub fn initialize(&mut self) {
        self.initialize_at(now_millis());
    }

    /// Same as [`initialize`](Self::initialize), checking TC string expiry at `now_millis`.
    pub fn initialize_at(&mut self, now_millis: i64) {
        if self.initialized {
            tracing::debug!("consent already initialized");
            return;
        }

        if self.config.delete_outdated_tc_string {
            self.delete_outdated_tc_string(now_millis);
        }

        let params = RequestParameters::from(&self.config);

        if params.debug.as_ref().is_some_and(|d| d.force_reset) {
            tracing::info!("resetting consent information");
            if let Err(e) = self.bridge.reset() {
                tracing::error!(error = %e, "could not reset consent information");
            }
        }

        match self.bridge.request_consent_info_update(&params) {
            Ok(()) => {
                self.form_available = self.bridge.is_consent_form_available();
                tracing::debug!(form_available = self.form_available, "consent info updated");
            }
            Err(e) => {
                tracing::error!(error = %e, "consent info update failed");
            }
        }

        self.initialized = true;
        self.load_form(false, true);
    }

    /// Removes the stored TC string if it is older than the configured maximum age.
    ///
    /// Returns whether the TC string was removed.
    pub fn delete_outdated_tc_string(&mut self, now_millis: i64) -> bool {
        let tc_string = self.storage.get_string(TC_STRING).unwrap_or_default();

        if self.config.expiry.is_expired(&tc_string, now_millis) {
            tracing::info!("removing outdated TC string");
            self.storage.remove(TC_STRING);
            true
        } else {
            false
        }
    }

    /// Clears the SDK's consent state and starts over.
    pub fn reset(&mut self) -> crate::bridge::Result<()> {
        self.bridge.reset()?;
        self.status = ConsentStatus::Unknown;
        self.form_available = false;
        self.initialized = false;
        Ok(())
    }
}
