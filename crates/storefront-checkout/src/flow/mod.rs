//! Payment Flow Controller
//!
//! Drives one checkout from the contact form to a confirmed PIX payment.
//!
//! ## Lifecycle
//!
//! ```text
//! open ─▶ Form ─submit─▶ Loading ─▶ Pix ─poll…─▶ Success ─delay─▶ redirect
//!                           │
//!                           └─▶ Error ─retry─▶ Form
//! ```
//!
//! Background work (the status poll and the redirect timer) runs in tokio
//! tasks whose handles live next to the state. Every exit from `Pix` aborts
//! the poll; closing aborts both. Each open gets a new generation number and
//! async completions apply only when their generation is still current, so a
//! response that lands after a close is dropped.

mod session;
mod state;

pub use session::{CheckoutSession, CheckoutSnapshot};
pub use state::FlowState;

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storefront_core::{
    AttributionParams, CreateOutcome, CreateTransactionRequest, Customer, PaymentGateway,
    PaymentStatus, Plan,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::analytics::{AnalyticsEvent, AnalyticsSink, TracingAnalytics};
use crate::attribution::AttributionStore;
use crate::config::CheckoutConfig;
use crate::document::generate_document;
use crate::error::{CheckoutError, Result};
use crate::navigator::{LoggingNavigator, Navigator};
use crate::validation::{FormErrors, validate_form};

/// Shown when the gateway rejects without a message
pub const CREATE_FAILED: &str = "Could not create payment";

/// Shown when the gateway accepts but returns no PIX code
pub const MISSING_PIX_CODE: &str = "PIX code was not generated";

/// Checkout state machine
pub struct CheckoutController {
    shared: Arc<Shared>,
}

struct Shared {
    gateway: Arc<dyn PaymentGateway>,
    attribution: Arc<AttributionStore>,
    analytics: Arc<dyn AnalyticsSink>,
    navigator: Arc<dyn Navigator>,
    config: CheckoutConfig,
    slot: Mutex<Slot>,
    state_tx: watch::Sender<FlowState>,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    state: FlowState,
    session: Option<CheckoutSession>,
    poll: Option<JoinHandle<()>>,
    redirect: Option<JoinHandle<()>>,
}

impl Slot {
    /// The one place state changes, apart from `reset`
    fn transition(&mut self, next: FlowState, state_tx: &watch::Sender<FlowState>) -> Result<()> {
        let from = self.state;
        if !from.can_transition_to(next) {
            return Err(CheckoutError::InvalidTransition { from, to: next });
        }
        if from == FlowState::Pix {
            abort(&mut self.poll);
        }
        self.state = next;
        state_tx.send_replace(next);
        tracing::debug!(%from, to = %next, generation = self.generation, "Checkout transition");
        Ok(())
    }

    /// Drop the session and every task it owns
    fn reset(&mut self, state_tx: &watch::Sender<FlowState>) {
        abort(&mut self.poll);
        abort(&mut self.redirect);
        self.generation = self.generation.wrapping_add(1);
        self.session = None;
        self.state = FlowState::Form;
        state_tx.send_replace(FlowState::Form);
    }

    fn is_current(&self, generation: u64, state: FlowState) -> bool {
        self.generation == generation && self.state == state && self.session.is_some()
    }
}

fn abort(task: &mut Option<JoinHandle<()>>) {
    if let Some(task) = task.take() {
        task.abort();
    }
}

impl CheckoutController {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        attribution: Arc<AttributionStore>,
        analytics: Arc<dyn AnalyticsSink>,
        navigator: Arc<dyn Navigator>,
        config: CheckoutConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(FlowState::Form);
        Self {
            shared: Arc::new(Shared {
                gateway,
                attribution,
                analytics,
                navigator,
                config,
                slot: Mutex::new(Slot::default()),
                state_tx,
            }),
        }
    }

    /// Controller with log-only analytics and navigation
    pub fn with_defaults(gateway: Arc<dyn PaymentGateway>, attribution: Arc<AttributionStore>) -> Self {
        Self::new(
            gateway,
            attribution,
            Arc::new(TracingAnalytics),
            Arc::new(LoggingNavigator),
            CheckoutConfig::default(),
        )
    }

    /// Start a checkout for `plan`, replacing any open one
    pub fn open(&self, plan: Arc<Plan>) {
        let attribution = self.shared.attribution.get_all();
        let mut slot = self.shared.lock();
        slot.reset(&self.shared.state_tx);

        tracing::info!(
            plan = %plan.id,
            tags = attribution.len(),
            generation = slot.generation,
            "Checkout opened"
        );
        slot.session = Some(CheckoutSession::new(plan, attribution));
    }

    pub fn set_name(&self, name: impl Into<String>) -> Result<()> {
        self.edit(|session| {
            session.name = name.into();
            session.form_errors.name = None;
        })
    }

    pub fn set_email(&self, email: impl Into<String>) -> Result<()> {
        self.edit(|session| {
            session.email = email.into();
            session.form_errors.email = None;
        })
    }

    fn edit(&self, apply: impl FnOnce(&mut CheckoutSession)) -> Result<()> {
        let mut slot = self.shared.lock();
        let state = slot.state;
        let session = slot.session.as_mut().ok_or(CheckoutError::NotOpen)?;
        if state != FlowState::Form {
            return Err(CheckoutError::NotEditable(state));
        }
        apply(session);
        Ok(())
    }

    /// Validate the form and create the PIX charge.
    ///
    /// Returns the state the flow settled in. Gateway failures end in
    /// `FlowState::Error` rather than an `Err`; `Err` is reserved for
    /// validation failures and calls made in the wrong state.
    pub async fn submit(&self) -> Result<FlowState> {
        let (generation, plan, customer, captured) = {
            let mut slot = self.shared.lock();
            let state = slot.state;
            let session = slot.session.as_mut().ok_or(CheckoutError::NotOpen)?;
            if state != FlowState::Form {
                return Err(CheckoutError::InvalidTransition {
                    from: state,
                    to: FlowState::Loading,
                });
            }
            if let Err(errors) = validate_form(&session.name, &session.email) {
                tracing::debug!(%errors, "Checkout form rejected");
                session.form_errors = errors.clone();
                return Err(CheckoutError::Validation(errors));
            }

            let document = generate_document();
            session.form_errors = FormErrors::default();
            session.last_error = None;
            session.document = Some(document.clone());

            let customer = Customer {
                name: session.name.trim().to_string(),
                email: session.email.trim().to_string(),
                document,
            };
            let plan = Arc::clone(&session.plan);
            let captured = session.attribution.clone();

            slot.transition(FlowState::Loading, &self.shared.state_tx)?;
            (slot.generation, plan, customer, captured)
        };

        let attribution = if captured.is_empty() {
            self.shared.attribution.get_all()
        } else {
            captured
        };
        let request = CreateTransactionRequest::new(&plan, customer, &attribution);

        tracing::info!(
            plan = %plan.id,
            amount = %plan.price,
            gateway = self.shared.gateway.name(),
            "Creating PIX transaction"
        );
        let result = self.shared.gateway.create_transaction(&request).await;

        Ok(self.shared.finish_create(generation, &plan, attribution, result))
    }

    /// Leave `Error` for the form, keeping the entered fields
    pub fn retry(&self) -> Result<()> {
        let mut slot = self.shared.lock();
        if slot.session.is_none() {
            return Err(CheckoutError::NotOpen);
        }
        slot.transition(FlowState::Form, &self.shared.state_tx)?;
        if let Some(session) = slot.session.as_mut() {
            session.last_error = None;
        }
        Ok(())
    }

    /// Tear down the checkout from any state
    pub fn close(&self) {
        let mut slot = self.shared.lock();
        if slot.session.is_some() {
            tracing::info!(state = %slot.state, generation = slot.generation, "Checkout closed");
        }
        slot.reset(&self.shared.state_tx);
    }

    pub fn state(&self) -> FlowState {
        self.shared.lock().state
    }

    pub fn snapshot(&self) -> Option<CheckoutSnapshot> {
        let slot = self.shared.lock();
        slot.session.as_ref().map(|session| CheckoutSnapshot {
            state: slot.state,
            session: session.clone(),
        })
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<FlowState> {
        self.shared.state_tx.subscribe()
    }
}

impl Drop for CheckoutController {
    fn drop(&mut self) {
        self.shared.lock().reset(&self.shared.state_tx);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_create(
        self: &Arc<Self>,
        generation: u64,
        plan: &Plan,
        attribution: AttributionParams,
        result: storefront_core::Result<CreateOutcome>,
    ) -> FlowState {
        let mut slot = self.lock();
        if !slot.is_current(generation, FlowState::Loading) {
            tracing::debug!(generation, "Discarding create response for a closed checkout");
            return slot.state;
        }

        let charge = match result {
            Ok(CreateOutcome::Created(charge)) if !charge.payment_code.trim().is_empty() => charge,
            Ok(CreateOutcome::Created(charge)) => {
                tracing::warn!(transaction_id = %charge.transaction_id, "Gateway returned no PIX code");
                return self.fail(&mut slot, MISSING_PIX_CODE.into());
            }
            Ok(CreateOutcome::Rejected { message }) => {
                tracing::warn!(?message, "Gateway rejected the transaction");
                return self.fail(&mut slot, message.unwrap_or_else(|| CREATE_FAILED.into()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Create transaction failed");
                return self.fail(&mut slot, e.user_message());
            }
        };

        if let Some(session) = slot.session.as_mut() {
            session.transaction_id = Some(charge.transaction_id.clone()).filter(|id| !id.is_empty());
            session.payment_code = Some(charge.payment_code.clone());
            session.qr_target_url.clone_from(&charge.qr_target_url);
            session.attribution = attribution.clone();
        }
        if let Err(e) = slot.transition(FlowState::Pix, &self.state_tx) {
            tracing::warn!(error = %e, "Could not show PIX code");
            return slot.state;
        }
        tracing::info!(
            transaction_id = %charge.transaction_id,
            status = %charge.status,
            "PIX code issued"
        );

        if charge.transaction_id.is_empty() {
            tracing::warn!("Charge has no transaction id; payment status will not be checked");
        } else {
            slot.poll = Some(tokio::spawn(poll_payment(
                Arc::clone(self),
                generation,
                charge.transaction_id,
            )));
        }

        self.emit(AnalyticsEvent::initiate_checkout(plan.price, &plan.id, attribution));
        FlowState::Pix
    }

    fn fail(&self, slot: &mut Slot, message: String) -> FlowState {
        if let Some(session) = slot.session.as_mut() {
            session.last_error = Some(message);
        }
        match slot.transition(FlowState::Error, &self.state_tx) {
            Ok(()) => FlowState::Error,
            Err(e) => {
                tracing::warn!(error = %e, "Could not record checkout error");
                slot.state
            }
        }
    }

    /// Apply one poll result; `Break` stops the poll
    fn apply_status(
        self: &Arc<Self>,
        generation: u64,
        transaction_id: &str,
        status: PaymentStatus,
    ) -> ControlFlow<()> {
        let mut slot = self.lock();
        if !slot.is_current(generation, FlowState::Pix) {
            return ControlFlow::Break(());
        }
        if !status.is_paid() {
            tracing::trace!(transaction_id, %status, "Payment not confirmed yet");
            return ControlFlow::Continue(());
        }

        let purchase = slot.session.as_ref().map(|session| {
            AnalyticsEvent::purchase(session.plan.price, transaction_id, session.attribution.clone())
        });
        if let Err(e) = slot.transition(FlowState::Success, &self.state_tx) {
            tracing::warn!(error = %e, "Could not confirm payment");
            return ControlFlow::Break(());
        }
        tracing::info!(transaction_id, "Payment confirmed");

        slot.redirect = Some(tokio::spawn(redirect_after_delay(Arc::clone(self), generation)));
        if let Some(event) = purchase {
            self.emit(event);
        }
        ControlFlow::Break(())
    }

    /// Fire and forget
    fn emit(&self, event: AnalyticsEvent) {
        let analytics = Arc::clone(&self.analytics);
        tokio::spawn(async move {
            if let Err(e) = analytics.track(&event).await {
                tracing::warn!(event = event.name(), error = %e, "Analytics event failed");
            }
        });
    }
}

async fn poll_payment(shared: Arc<Shared>, generation: u64, transaction_id: String) {
    loop {
        tokio::time::sleep(shared.config.poll_interval).await;

        let current = shared.lock().is_current(generation, FlowState::Pix);
        if !current {
            break;
        }

        match shared.gateway.transaction_status(&transaction_id).await {
            Ok(status) => {
                if shared.apply_status(generation, &transaction_id, status).is_break() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(%transaction_id, error = %e, "Status check failed; retrying next tick");
            }
        }
    }
}

async fn redirect_after_delay(shared: Arc<Shared>, generation: u64) {
    tokio::time::sleep(shared.config.redirect_delay).await;

    let slot = shared.lock();
    if slot.is_current(generation, FlowState::Success) {
        shared.navigator.redirect(&shared.config.redirect_url);
    }
}
