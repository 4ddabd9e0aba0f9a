//! Test harness for the conversation controller

use super::{ConversationController, Notice, Notifier, SessionContext};
use crate::deal::{DealContext, StaticDealSource};
use crate::session::{QuickOption, SessionView};
use crate::state_machine::{ConversationState, StateValidator, TrustServer};
use crate::transport::testing::MockTransport;
use std::sync::{Arc, Mutex};

// ============================================================================
// Recording Notifier
// ============================================================================

/// Keeps every notice and session update it receives
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
    updates: Mutex<Vec<SessionView>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<SessionView> {
        self.updates.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn session_updated(&self, view: &SessionView) {
        self.updates.lock().unwrap().push(view.clone());
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn nda_option() -> QuickOption {
    QuickOption::new("NDA", "nda").with_description("Non-Disclosure Agreement")
}

pub fn select_type_state() -> ConversationState {
    ConversationState::default()
}

fn sample_deal() -> DealContext {
    DealContext {
        title: Some("Acme acquisition".into()),
        business_name: Some("Acme Ltd".into()),
        asking_price: Some(1_250_000.0),
        ..DealContext::default()
    }
}

// ============================================================================
// Test Controller
// ============================================================================

pub type MockController = ConversationController<Arc<MockTransport>, StaticDealSource>;

/// Controller wired to a scripted transport and a recording notifier
pub struct TestController {
    pub controller: MockController,
    pub transport: Arc<MockTransport>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestController {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> TestControllerBuilder {
        TestControllerBuilder::default()
    }
}

pub struct TestControllerBuilder {
    user_id: Option<String>,
    deal_id: String,
    deals: StaticDealSource,
    validator: Arc<dyn StateValidator>,
}

impl Default for TestControllerBuilder {
    fn default() -> Self {
        Self {
            user_id: Some("user-1".into()),
            deal_id: "deal-1".into(),
            deals: StaticDealSource::new().with_deal("deal-1", sample_deal()),
            validator: Arc::new(TrustServer),
        }
    }
}

#[allow(dead_code)]
impl TestControllerBuilder {
    pub fn user(mut self, user_id: Option<&str>) -> Self {
        self.user_id = user_id.map(str::to_string);
        self
    }

    pub fn deal_id(mut self, deal_id: impl Into<String>) -> Self {
        self.deal_id = deal_id.into();
        self
    }

    pub fn deals(mut self, deals: StaticDealSource) -> Self {
        self.deals = deals;
        self
    }

    pub fn validator(mut self, validator: Arc<dyn StateValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn build(self) -> TestController {
        let transport = Arc::new(MockTransport::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = ConversationController::new(
            SessionContext::new(self.user_id, self.deal_id),
            transport.clone(),
            self.deals,
        )
        .with_validator(self.validator)
        .with_notifier(notifier.clone());

        TestController {
            controller,
            transport,
            notifier,
        }
    }
}
