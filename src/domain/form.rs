//! Per-entry call forms for the read and write panels

use alloy_primitives::U256;
use thiserror::Error;

use super::abi::{
    coerce_arguments, decode_outputs, parse_numeric, CoercedArg, DecodedOutput, InterfaceEntry,
    ValidationError,
};
use super::contract::{BoundContract, PreparedCall};
use super::pending::PendingList;

/// Label of the optional wei field on payable entries
pub const VALUE_FIELD_LABEL: &str = "value (wei)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Read,
    Write,
}

/// Identifies a form across an interface reload.
///
/// `generation` is bumped every time the displayed interface list changes, so
/// results addressed to an older generation are recognisably stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormKey {
    pub generation: u64,
    pub panel: Panel,
    pub index: usize,
}

/// Why a form refused to start a call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("please connect a wallet first")]
    NotConnected,
    #[error("waiting for {0} pending transaction(s) to confirm")]
    Busy(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: String,
    pub ty: String,
    pub value: String,
    pub required: bool,
}

/// Input state shared by both panels
#[derive(Debug, Clone)]
pub struct FormState {
    pub key: FormKey,
    pub entry: InterfaceEntry,
    pub fields: Vec<FormField>,
    pub expanded: bool,
    pub active_field: usize,
}

impl FormState {
    pub fn new(key: FormKey, entry: InterfaceEntry) -> Self {
        let mut fields: Vec<FormField> = entry
            .inputs
            .iter()
            .enumerate()
            .map(|(index, param)| FormField {
                label: param.label(index),
                ty: param.ty.clone(),
                value: String::new(),
                required: true,
            })
            .collect();
        if entry.is_payable() {
            fields.push(FormField {
                label: VALUE_FIELD_LABEL.to_string(),
                ty: "uint256".to_string(),
                value: String::new(),
                required: false,
            });
        }
        Self {
            key,
            entry,
            fields,
            expanded: false,
            active_field: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.active_field = (self.active_field + 1) % self.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.active_field = self
                .active_field
                .checked_sub(1)
                .unwrap_or(self.fields.len() - 1);
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.active_field) {
            field.value.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.fields.get_mut(self.active_field) {
            field.value.pop();
        }
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(index) {
            field.value = value.into();
        }
    }

    /// Values of the entry's arguments, without the payable value field
    pub fn argument_values(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.value.clone())
            .collect()
    }

    /// Run client-side validation and coercion
    pub fn validate(&self) -> Result<(Vec<CoercedArg>, U256), ValidationError> {
        let args = coerce_arguments(&self.entry.inputs, &self.argument_values())?;
        let value = match self.fields.iter().find(|field| !field.required) {
            Some(field) if !field.value.trim().is_empty() => {
                parse_numeric(&field.value).ok_or_else(|| ValidationError::NotNumeric {
                    name: field.label.clone(),
                    value: field.value.clone(),
                })?
            }
            _ => U256::ZERO,
        };
        Ok((args, value))
    }

    /// Validate, then encode against the bound contract. Validation runs first
    /// so a missing field is reported even without a wallet.
    fn prepare(&self, contract: Option<&BoundContract>) -> Result<PreparedCall, SubmitError> {
        let (args, value) = self.validate()?;
        let contract = contract.ok_or(SubmitError::NotConnected)?;
        Ok(contract.prepare(&self.entry, &args, value)?)
    }
}

/// Lifecycle of the latest call made from a form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CallPhase {
    #[default]
    Idle,
    Validating,
    Submitted,
    Confirmed,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ReadForm {
    pub form: FormState,
    pub phase: CallPhase,
    pub result: Option<Vec<DecodedOutput>>,
    pub error: Option<String>,
}

impl ReadForm {
    pub fn new(key: FormKey, entry: InterfaceEntry) -> Self {
        Self {
            form: FormState::new(key, entry),
            phase: CallPhase::Idle,
            result: None,
            error: None,
        }
    }

    /// Start a query. On error the form records the message and nothing is sent.
    pub fn begin_query(
        &mut self,
        contract: Option<&BoundContract>,
    ) -> Result<PreparedCall, SubmitError> {
        self.phase = CallPhase::Validating;
        match self.form.prepare(contract) {
            Ok(call) => {
                self.phase = CallPhase::Submitted;
                self.error = None;
                Ok(call)
            }
            Err(err) => {
                self.fail(err.to_string());
                Err(err)
            }
        }
    }

    pub fn on_returned(&mut self, data: &[u8]) {
        match decode_outputs(&self.form.entry, data) {
            Ok(outputs) => {
                self.result = Some(outputs);
                self.error = None;
                self.phase = CallPhase::Confirmed;
            }
            Err(err) => self.fail(format!("{err:#}")),
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.error = Some(message.clone());
        self.phase = CallPhase::Failed(message);
    }
}

#[derive(Debug, Clone)]
pub struct WriteForm {
    pub form: FormState,
    pub phase: CallPhase,
    pub pending: PendingList,
    pub error: Option<String>,
}

impl WriteForm {
    pub fn new(key: FormKey, entry: InterfaceEntry) -> Self {
        Self {
            form: FormState::new(key, entry),
            phase: CallPhase::Idle,
            pending: PendingList::new(),
            error: None,
        }
    }

    /// Submit is disabled while any tracked transaction is unconfirmed
    pub fn submit_enabled(&self) -> bool {
        !self.pending.has_unconfirmed()
    }

    /// Start a transaction. Nothing is sent when this returns an error.
    pub fn begin_submit(
        &mut self,
        contract: Option<&BoundContract>,
    ) -> Result<PreparedCall, SubmitError> {
        if !self.submit_enabled() {
            return Err(SubmitError::Busy(self.pending.unconfirmed_count()));
        }
        self.phase = CallPhase::Validating;
        match self.form.prepare(contract) {
            Ok(call) => {
                self.phase = CallPhase::Submitted;
                self.error = None;
                Ok(call)
            }
            Err(err) => {
                self.fail(err.to_string());
                Err(err)
            }
        }
    }

    /// The signer accepted the transaction
    pub fn on_submitted(&mut self, hash: &str) {
        self.pending.push_submitted(hash);
        self.phase = CallPhase::Submitted;
    }

    pub fn on_confirmed(&mut self, hash: &str, block_number: Option<u64>) -> bool {
        let matched = self.pending.confirm(hash, block_number);
        if matched && !self.pending.has_unconfirmed() {
            self.phase = CallPhase::Confirmed;
        }
        matched
    }

    /// Confirmation wait failed; the entry stays unconfirmed
    pub fn on_confirmation_failed(&mut self, hash: &str, reason: &str) -> bool {
        let matched = self.pending.mark_failed(hash, reason);
        if matched {
            self.fail(reason);
        }
        matched
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.error = Some(message.clone());
        self.phase = CallPhase::Failed(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::Interface;
    use alloy_primitives::Address;

    const ABI: &str = r#"[
        {"type":"function","name":"transfer","stateMutability":"nonpayable",
         "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"type":"function","name":"deposit","stateMutability":"payable","inputs":[],"outputs":[]},
        {"type":"function","name":"balanceOf","stateMutability":"view",
         "inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"","type":"uint256"}]}
    ]"#;

    fn key(index: usize) -> FormKey {
        FormKey {
            generation: 1,
            panel: Panel::Write,
            index,
        }
    }

    fn contract() -> BoundContract {
        BoundContract::bind(Address::repeat_byte(0x11), 1, Address::repeat_byte(0x22))
    }

    fn transfer_form() -> WriteForm {
        let interface = Interface::parse(ABI);
        let mut form = WriteForm::new(key(0), interface.entries()[0].clone());
        form.form
            .set_value(0, "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0");
        form.form.set_value(1, "1000");
        form
    }

    #[test]
    fn test_empty_field_blocks_submission() {
        let mut form = transfer_form();
        form.form.set_value(1, "  ");
        let err = form.begin_submit(Some(&contract())).unwrap_err();
        assert_eq!(
            err,
            SubmitError::Validation(ValidationError::MissingField {
                name: "amount".into()
            })
        );
        assert!(form.pending.is_empty());
        assert!(matches!(form.phase, CallPhase::Failed(_)));
    }

    #[test]
    fn test_validation_runs_before_wallet_check() {
        let mut form = transfer_form();
        form.form.set_value(0, "");
        assert!(matches!(
            form.begin_submit(None),
            Err(SubmitError::Validation(_))
        ));

        let mut form = transfer_form();
        assert_eq!(form.begin_submit(None), Err(SubmitError::NotConnected));
    }

    #[test]
    fn test_submit_disabled_until_confirmed() {
        let mut form = transfer_form();
        let call = form.begin_submit(Some(&contract())).unwrap();
        assert_eq!(&call.calldata[..4], &[0xa9, 0x05, 0x9c, 0xbb]);

        form.on_submitted("0xaa");
        assert_eq!(form.pending.len(), 1);
        assert!(!form.submit_enabled());
        assert_eq!(
            form.begin_submit(Some(&contract())),
            Err(SubmitError::Busy(1))
        );

        assert!(form.on_confirmed("0xaa", Some(12)));
        assert!(form.submit_enabled());
        assert_eq!(form.phase, CallPhase::Confirmed);
    }

    #[test]
    fn test_confirmation_failure_keeps_entry_pending() {
        let mut form = transfer_form();
        form.begin_submit(Some(&contract())).unwrap();
        form.on_submitted("0xaa");
        assert!(form.on_confirmation_failed("0xaa", "transaction reverted"));
        assert!(!form.submit_enabled());
        assert_eq!(form.error.as_deref(), Some("transaction reverted"));
    }

    #[test]
    fn test_payable_value_field() {
        let interface = Interface::parse(ABI);
        let mut form = WriteForm::new(key(1), interface.entries()[1].clone());
        assert_eq!(form.form.fields.len(), 1);
        assert_eq!(form.form.fields[0].label, VALUE_FIELD_LABEL);

        let call = form.begin_submit(Some(&contract())).unwrap();
        assert_eq!(call.value, U256::ZERO);

        let mut form = WriteForm::new(key(1), interface.entries()[1].clone());
        form.form.set_value(0, "0x10");
        let call = form.begin_submit(Some(&contract())).unwrap();
        assert_eq!(call.value, U256::from(16u64));

        let mut form = WriteForm::new(key(1), interface.entries()[1].clone());
        form.form.set_value(0, "lots");
        assert!(form.begin_submit(Some(&contract())).is_err());
    }

    #[test]
    fn test_read_form_decodes_result() {
        let interface = Interface::parse(ABI);
        let mut form = ReadForm::new(
            FormKey {
                generation: 1,
                panel: Panel::Read,
                index: 0,
            },
            interface.entries()[2].clone(),
        );
        form.form
            .set_value(0, "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0");
        form.begin_query(Some(&contract())).unwrap();

        let mut word = [0u8; 32];
        word[31] = 42;
        form.on_returned(&word);
        let result = form.result.as_ref().unwrap();
        assert_eq!(result[0].value, "42");
        assert_eq!(form.phase, CallPhase::Confirmed);
    }

    #[test]
    fn test_field_navigation_wraps() {
        let mut form = transfer_form();
        assert_eq!(form.form.active_field, 0);
        form.form.prev_field();
        assert_eq!(form.form.active_field, 1);
        form.form.next_field();
        assert_eq!(form.form.active_field, 0);
        form.form.push_char('x');
        assert!(form.form.fields[0].value.ends_with('x'));
        form.form.pop_char();
        assert!(form.form.fields[0].value.ends_with('0'));
    }
}
