use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use alloy::primitives::{Address, Bytes};
use chrono::{DateTime, Local};

use crate::core::{Action, Command, ExportTarget, NotifyLevel};
use crate::domain::abi::{format_interface, Interface, InterfaceEntry, Partitions};
use crate::domain::contract::{parse_address, BoundContract, WalletSession};
use crate::domain::form::{FormKey, Panel, ReadForm, WriteForm};
use crate::domain::network::{builtin_networks, find_network, Network};
use crate::infrastructure::lookup::LookupError;
use crate::infrastructure::runtime::RuntimeCommand;
use crate::infrastructure::wallet::WalletError;

/// Main tabs in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Read,
    Write,
    Code,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Read, Tab::Write, Tab::Code];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Read => "Read",
            Tab::Write => "Write",
            Tab::Code => "Code",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            Tab::Read => '1',
            Tab::Write => '2',
            Tab::Code => '3',
        }
    }

    fn next(self) -> Tab {
        match self {
            Tab::Read => Tab::Write,
            Tab::Write => Tab::Code,
            Tab::Code => Tab::Read,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
    /// Typing into the fields of the selected form
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Default, Clone)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

/// Where the loaded interface came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractSource {
    Lookup { from_cache: bool },
    File(PathBuf),
}

/// The contract whose forms are on screen
#[derive(Debug, Clone)]
pub struct LoadedContract {
    pub address: Address,
    pub network: Network,
    pub interface: Interface,
    /// Every callable entry, before the settings selection is applied
    pub partitions: Partitions,
    /// Signatures unchecked in the settings popup
    pub hidden: BTreeSet<String>,
    pub source: ContractSource,
}

impl LoadedContract {
    pub fn visible_read(&self) -> Vec<&InterfaceEntry> {
        self.partitions
            .read
            .iter()
            .filter(|entry| !self.hidden.contains(&entry.signature))
            .collect()
    }

    pub fn visible_write(&self) -> Vec<&InterfaceEntry> {
        self.partitions
            .write
            .iter()
            .filter(|entry| !self.hidden.contains(&entry.signature))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletState {
    Disconnected,
    Connecting { session_id: u64 },
    Connected(WalletSession),
}

/// A lookup waiting for its answer
#[derive(Debug, Clone)]
pub struct LookupRequest {
    pub request_id: u64,
    pub address: Address,
    pub network: Network,
}

/// Settings popup: one checkbox per read and write entry
#[derive(Debug, Clone, Default)]
pub struct SettingsState {
    pub open: bool,
    pub cursor: usize,
    /// Selection being edited; applied when the popup closes
    pub hidden: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Pending,
    Confirmed,
    Failed,
}

/// A transaction submitted this session, kept across contract reloads
#[derive(Debug, Clone)]
pub struct TxRecord {
    pub submitted_at: DateTime<Local>,
    pub network: String,
    pub contract: String,
    pub signature: String,
    pub hash: String,
    pub state: TxState,
    pub block_number: Option<u64>,
    pub failure: Option<String>,
    pub explorer_url: String,
}

impl TxRecord {
    pub fn status_label(&self) -> &'static str {
        match self.state {
            TxState::Pending => "pending",
            TxState::Confirmed => "confirmed",
            TxState::Failed => "failed",
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub current_tab: Tab,
    pub input_mode: InputMode,
    pub networks: Vec<Network>,
    /// Network used by the next lookup
    pub network: Network,
    pub contract: Option<LoadedContract>,
    /// Bumped whenever the displayed interface list changes
    pub generation: u64,
    pub read_forms: Vec<ReadForm>,
    pub write_forms: Vec<WriteForm>,
    pub selected_read: usize,
    pub selected_write: usize,
    pub code_scroll: u16,
    pub wallet: WalletState,
    pub lookup: Option<LookupRequest>,
    pub settings: SettingsState,
    pub tx_log: Vec<TxRecord>,
    pub command: CommandBar,
    pub status: Option<StatusMessage>,
    pub help_open: bool,
    pub should_quit: bool,
    pending_commands: Vec<RuntimeCommand>,
    next_request_id: u64,
    next_session_id: u64,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        let networks = builtin_networks();
        let network = networks[0].clone();
        Self::with_networks(networks, network)
    }

    pub fn with_networks(networks: Vec<Network>, network: Network) -> Self {
        Self {
            current_tab: Tab::Read,
            input_mode: InputMode::Normal,
            networks,
            network,
            contract: None,
            generation: 0,
            read_forms: Vec::new(),
            write_forms: Vec::new(),
            selected_read: 0,
            selected_write: 0,
            code_scroll: 0,
            wallet: WalletState::Disconnected,
            lookup: None,
            settings: SettingsState::default(),
            tx_log: Vec::new(),
            command: CommandBar::default(),
            status: None,
            help_open: false,
            should_quit: false,
            pending_commands: Vec::new(),
            next_request_id: 1,
            next_session_id: 1,
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            let ttl = match status.level {
                StatusLevel::Error => Duration::from_secs(8),
                _ => Duration::from_secs(4),
            };
            if status.since.elapsed() > ttl {
                self.status = None;
            }
        }
    }

    /// Commands for the runtime worker, in the order they were issued
    pub fn take_commands(&mut self) -> Vec<RuntimeCommand> {
        std::mem::take(&mut self.pending_commands)
    }

    // ---------------------------------------------------------------------
    // Resolver

    /// Select the network for the next lookup
    pub fn select_network(&mut self, name: &str) -> bool {
        match find_network(&self.networks, name) {
            Some(network) => {
                self.network = network.clone();
                self.set_status(
                    format!("Network: {} (chain {})", network.name, network.chain_id),
                    StatusLevel::Info,
                );
                true
            }
            None => {
                self.set_status(
                    LookupError::UnknownNetwork(name.to_string()).to_string(),
                    StatusLevel::Error,
                );
                false
            }
        }
    }

    /// Start a lookup of `address` on the selected network
    pub fn request_lookup(&mut self, address: &str, refresh: bool) -> bool {
        let Some(parsed) = parse_address(address) else {
            self.set_status(
                format!("Invalid contract address: {}", address.trim()),
                StatusLevel::Error,
            );
            return false;
        };
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        let network = self.network.clone();
        self.lookup = Some(LookupRequest {
            request_id,
            address: parsed,
            network: network.clone(),
        });
        self.pending_commands.push(RuntimeCommand::LookupInterface {
            request_id,
            network: network.clone(),
            address: parsed.to_checksum(None),
            refresh,
        });
        self.set_status(
            format!("Looking up {} on {}…", short_addr(&parsed), network.name),
            StatusLevel::Info,
        );
        true
    }

    pub fn reload(&mut self) {
        let Some(contract) = self.contract.as_ref() else {
            self.set_status("No contract loaded", StatusLevel::Warn);
            return;
        };
        let address = contract.address.to_checksum(None);
        self.network = contract.network.clone();
        self.request_lookup(&address, true);
    }

    pub fn apply_interface_loaded(
        &mut self,
        request_id: u64,
        abi_json: &str,
        from_cache: bool,
    ) {
        let Some(request) = self
            .lookup
            .take_if(|request| request.request_id == request_id)
        else {
            tracing::debug!(request_id, "dropping stale lookup result");
            return;
        };
        let interface = Interface::parse(abi_json);
        self.install_contract(
            request.address,
            request.network,
            interface,
            ContractSource::Lookup { from_cache },
        );
    }

    /// A failed lookup leaves the displayed contract untouched
    pub fn apply_lookup_failed(&mut self, request_id: u64, error: &LookupError) {
        if self
            .lookup
            .take_if(|request| request.request_id == request_id)
            .is_none()
        {
            tracing::debug!(request_id, "dropping stale lookup failure");
            return;
        }
        self.set_status(format!("Lookup failed: {error}"), StatusLevel::Error);
    }

    /// Load an ABI file from disk for `address` (or the loaded address)
    pub fn open_local_abi(&mut self, path: &str, address: Option<&str>) {
        let address = match address {
            Some(raw) => match parse_address(raw) {
                Some(address) => address,
                None => {
                    self.set_status(
                        format!("Invalid contract address: {raw}"),
                        StatusLevel::Error,
                    );
                    return;
                }
            },
            None => match self.contract.as_ref() {
                Some(contract) => contract.address,
                None => {
                    self.set_status("Usage: :open <path> <address>", StatusLevel::Warn);
                    return;
                }
            },
        };
        let path = PathBuf::from(path);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                self.set_status(
                    format!("Failed to read {}: {err}", path.display()),
                    StatusLevel::Error,
                );
                return;
            }
        };
        self.install_contract(
            address,
            self.network.clone(),
            Interface::parse(&raw),
            ContractSource::File(path),
        );
    }

    fn install_contract(
        &mut self,
        address: Address,
        network: Network,
        interface: Interface,
        source: ContractSource,
    ) {
        let partitions = format_interface(&interface);
        let (reads, writes) = (partitions.read.len(), partitions.write.len());
        let origin = match &source {
            ContractSource::Lookup { from_cache: true } => " (cached)",
            ContractSource::Lookup { from_cache: false } => "",
            ContractSource::File(_) => " (file)",
        };
        tracing::info!(%address, network = %network.name, reads, writes, "contract loaded");

        self.contract = Some(LoadedContract {
            address,
            network,
            interface,
            partitions,
            hidden: BTreeSet::new(),
            source,
        });
        self.rebuild_forms();

        if reads + writes == 0 {
            self.set_status(
                format!("{} has no callable entries{origin}", short_addr(&address)),
                StatusLevel::Warn,
            );
        } else {
            self.set_status(
                format!(
                    "Loaded {} · {reads} read / {writes} write{origin}",
                    short_addr(&address)
                ),
                StatusLevel::Info,
            );
        }
    }

    /// New generation of forms for the current interface list. Any wallet
    /// binding is dropped first.
    fn rebuild_forms(&mut self) {
        self.invalidate_wallet();
        self.generation += 1;
        let generation = self.generation;
        let Some(contract) = self.contract.as_ref() else {
            self.read_forms.clear();
            self.write_forms.clear();
            return;
        };
        self.read_forms = contract
            .visible_read()
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                ReadForm::new(
                    FormKey {
                        generation,
                        panel: Panel::Read,
                        index,
                    },
                    entry.clone(),
                )
            })
            .collect();
        self.write_forms = contract
            .visible_write()
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                WriteForm::new(
                    FormKey {
                        generation,
                        panel: Panel::Write,
                        index,
                    },
                    entry.clone(),
                )
            })
            .collect();
        self.selected_read = 0;
        self.selected_write = 0;
        if self.input_mode == InputMode::Form {
            self.input_mode = InputMode::Normal;
        }
    }

    // ---------------------------------------------------------------------
    // Wallet

    pub fn connect_wallet(&mut self) {
        if self.contract.is_none() {
            self.set_status("Load a contract first", StatusLevel::Warn);
            return;
        }
        if matches!(self.wallet, WalletState::Connecting { .. }) {
            self.set_status("Already connecting…", StatusLevel::Info);
            return;
        }
        self.invalidate_wallet();
        let session_id = self.next_session_id;
        self.next_session_id += 1;
        self.wallet = WalletState::Connecting { session_id };
        self.pending_commands
            .push(RuntimeCommand::ConnectWallet { session_id });
        self.set_status("Requesting account access…", StatusLevel::Info);
    }

    /// Forget the session; the worker drops its signer
    fn invalidate_wallet(&mut self) {
        let session_id = match &self.wallet {
            WalletState::Disconnected => return,
            WalletState::Connecting { session_id } => *session_id,
            WalletState::Connected(session) => session.session_id,
        };
        self.pending_commands
            .push(RuntimeCommand::DropSession { session_id });
        self.wallet = WalletState::Disconnected;
    }

    pub fn apply_wallet_connected(
        &mut self,
        session_id: u64,
        account: Address,
        chain_id: u64,
        label: &str,
    ) {
        let current = matches!(
            self.wallet,
            WalletState::Connecting { session_id: id } if id == session_id
        );
        let Some(contract) = self.contract.as_ref().filter(|_| current) else {
            tracing::debug!(session_id, "dropping stale wallet session");
            self.pending_commands
                .push(RuntimeCommand::DropSession { session_id });
            return;
        };

        let bound = BoundContract::bind(contract.address, self.generation, account);
        let expected_chain = contract.network.chain_id;
        let network_name = contract.network.name.clone();
        self.wallet = WalletState::Connected(WalletSession {
            session_id,
            account,
            chain_id,
            contract: bound,
        });

        if expected_chain != 0 && chain_id != expected_chain {
            self.set_status(
                format!(
                    "Connected {} on chain {chain_id}, but {network_name} is chain {expected_chain}",
                    short_addr(&account)
                ),
                StatusLevel::Warn,
            );
        } else {
            self.set_status(
                format!("Connected {} via {label}", short_addr(&account)),
                StatusLevel::Info,
            );
        }
    }

    pub fn apply_wallet_failed(&mut self, session_id: u64, error: &WalletError) {
        if matches!(self.wallet, WalletState::Connecting { session_id: id } if id == session_id) {
            self.wallet = WalletState::Disconnected;
            self.set_status(format!("Wallet: {error}"), StatusLevel::Error);
        }
    }

    /// The session, if it is bound to what is on screen
    pub fn session(&self) -> Option<&WalletSession> {
        let WalletState::Connected(session) = &self.wallet else {
            return None;
        };
        let contract = self.contract.as_ref()?;
        session
            .contract
            .is_bound_to(contract.address, self.generation)
            .then_some(session)
    }

    pub fn account(&self) -> Option<Address> {
        self.session().map(|session| session.account)
    }

    // ---------------------------------------------------------------------
    // Forms

    pub fn selected_read_form(&self) -> Option<&ReadForm> {
        self.read_forms.get(self.selected_read)
    }

    pub fn selected_write_form(&self) -> Option<&WriteForm> {
        self.write_forms.get(self.selected_write)
    }

    pub fn move_selection(&mut self, down: bool) {
        let (selected, len) = match self.current_tab {
            Tab::Read => (&mut self.selected_read, self.read_forms.len()),
            Tab::Write => (&mut self.selected_write, self.write_forms.len()),
            Tab::Code => {
                self.code_scroll = if down {
                    self.code_scroll.saturating_add(1)
                } else {
                    self.code_scroll.saturating_sub(1)
                };
                return;
            }
        };
        if len == 0 {
            *selected = 0;
        } else if down {
            *selected = (*selected + 1).min(len - 1);
        } else {
            *selected = selected.saturating_sub(1);
        }
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        if self.input_mode == InputMode::Form {
            self.input_mode = InputMode::Normal;
        }
    }

    pub fn cycle_tab(&mut self) {
        self.set_tab(self.current_tab.next());
    }

    fn selected_form_state(&mut self) -> Option<&mut crate::domain::form::FormState> {
        match self.current_tab {
            Tab::Read => self
                .read_forms
                .get_mut(self.selected_read)
                .map(|form| &mut form.form),
            Tab::Write => self
                .write_forms
                .get_mut(self.selected_write)
                .map(|form| &mut form.form),
            Tab::Code => None,
        }
    }

    pub fn toggle_selected(&mut self) {
        if let Some(form) = self.selected_form_state() {
            form.toggle();
        }
    }

    /// Enter on a form: expand it, then focus its fields, or submit when it
    /// has none
    pub fn activate_selected(&mut self) {
        let Some(form) = self.selected_form_state() else {
            return;
        };
        if !form.expanded {
            form.expanded = true;
            return;
        }
        if form.fields.is_empty() {
            self.submit_selected();
        } else {
            form.active_field = 0;
            self.input_mode = InputMode::Form;
        }
    }

    pub fn exit_form(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn form_next_field(&mut self) {
        if let Some(form) = self.selected_form_state() {
            form.next_field();
        }
    }

    pub fn form_prev_field(&mut self) {
        if let Some(form) = self.selected_form_state() {
            form.prev_field();
        }
    }

    pub fn form_push_char(&mut self, c: char) {
        if let Some(form) = self.selected_form_state() {
            form.push_char(c);
        }
    }

    pub fn form_pop_char(&mut self) {
        if let Some(form) = self.selected_form_state() {
            form.pop_char();
        }
    }

    /// Validate the selected form and hand its call to the runtime
    pub fn submit_selected(&mut self) {
        let session = self.session().cloned();
        let contract = session.as_ref().map(|session| &session.contract);
        let network = self
            .contract
            .as_ref()
            .map(|loaded| loaded.network.clone())
            .unwrap_or_else(|| self.network.clone());
        match self.current_tab {
            Tab::Read => {
                let Some(form) = self.read_forms.get_mut(self.selected_read) else {
                    return;
                };
                match form.begin_query(contract) {
                    Ok(call) => {
                        let key = form.form.key;
                        if let Some(session) = session.as_ref() {
                            self.pending_commands.push(RuntimeCommand::Query {
                                session_id: session.session_id,
                                form: key,
                                call,
                            });
                        }
                    }
                    Err(err) => self.set_status(err.to_string(), StatusLevel::Error),
                }
            }
            Tab::Write => {
                let Some(form) = self.write_forms.get_mut(self.selected_write) else {
                    return;
                };
                match form.begin_submit(contract) {
                    Ok(call) => {
                        let key = form.form.key;
                        if let Some(session) = session.as_ref() {
                            self.set_status(
                                format!("Sending {}…", call.signature),
                                StatusLevel::Info,
                            );
                            self.pending_commands.push(RuntimeCommand::Submit {
                                session_id: session.session_id,
                                form: key,
                                call,
                                network,
                            });
                        }
                    }
                    Err(err) => self.set_status(err.to_string(), StatusLevel::Error),
                }
            }
            Tab::Code => {}
        }
    }

    fn is_current(&self, key: &FormKey) -> bool {
        if key.generation == self.generation {
            return true;
        }
        tracing::debug!(
            generation = key.generation,
            current = self.generation,
            "dropping result for a stale form"
        );
        false
    }

    pub fn apply_query_returned(&mut self, key: FormKey, data: &Bytes) {
        if !self.is_current(&key) {
            return;
        }
        if let Some(form) = self.read_forms.get_mut(key.index) {
            form.on_returned(data);
            if let Some(error) = form.error.clone() {
                self.set_status(error, StatusLevel::Error);
            }
        }
    }

    pub fn apply_query_failed(&mut self, key: FormKey, error: &WalletError) {
        if !self.is_current(&key) {
            return;
        }
        if let Some(form) = self.read_forms.get_mut(key.index) {
            let signature = form.form.entry.signature.clone();
            form.fail(error.to_string());
            self.set_status(format!("{signature}: {error}"), StatusLevel::Error);
        }
    }

    /// Log an accepted transaction against the network it was sent on
    pub fn apply_tx_submitted(
        &mut self,
        key: FormKey,
        hash: &str,
        signature: &str,
        to: Address,
        network: &Network,
    ) {
        let explorer_url = network.tx_url(hash);
        self.tx_log.push(TxRecord {
            submitted_at: Local::now(),
            network: network.name.clone(),
            contract: to.to_checksum(None),
            signature: signature.to_string(),
            hash: hash.to_string(),
            state: TxState::Pending,
            block_number: None,
            failure: None,
            explorer_url: explorer_url.clone(),
        });
        if !self.is_current(&key) {
            return;
        }
        if let Some(form) = self.write_forms.get_mut(key.index) {
            form.on_submitted(hash);
        }
        self.set_status(format!("Submitted {explorer_url}"), StatusLevel::Info);
    }

    pub fn apply_tx_failed(&mut self, key: FormKey, error: &WalletError) {
        if !self.is_current(&key) {
            return;
        }
        if let Some(form) = self.write_forms.get_mut(key.index) {
            let signature = form.form.entry.signature.clone();
            form.fail(error.to_string());
            self.set_status(format!("{signature}: {error}"), StatusLevel::Error);
        }
    }

    pub fn apply_tx_confirmed(&mut self, key: FormKey, hash: &str, block_number: Option<u64>) {
        if let Some(record) = self.tx_record_mut(hash) {
            record.state = TxState::Confirmed;
            record.block_number = block_number;
        }
        if !self.is_current(&key) {
            return;
        }
        if let Some(form) = self.write_forms.get_mut(key.index) {
            form.on_confirmed(hash, block_number);
        }
        let block = block_number
            .map(|number| format!(" in block {number}"))
            .unwrap_or_default();
        self.set_status(
            format!("Confirmed {}{block}", short_hash(hash)),
            StatusLevel::Info,
        );
    }

    pub fn apply_tx_confirmation_failed(&mut self, key: FormKey, hash: &str, error: &WalletError) {
        if let Some(record) = self.tx_record_mut(hash) {
            record.state = TxState::Failed;
            record.failure = Some(error.to_string());
        }
        if !self.is_current(&key) {
            return;
        }
        if let Some(form) = self.write_forms.get_mut(key.index) {
            form.on_confirmation_failed(hash, &error.to_string());
        }
        self.set_status(error.to_string(), StatusLevel::Error);
    }

    fn tx_record_mut(&mut self, hash: &str) -> Option<&mut TxRecord> {
        self.tx_log
            .iter_mut()
            .find(|record| record.hash.eq_ignore_ascii_case(hash))
    }

    pub fn apply_runtime_error(&mut self, message: String) {
        self.set_status(message, StatusLevel::Error);
    }

    // ---------------------------------------------------------------------
    // Settings

    /// All entries listed in the settings popup: reads first, then writes
    pub fn settings_entries(&self) -> Vec<&InterfaceEntry> {
        self.contract
            .as_ref()
            .map(|contract| {
                contract
                    .partitions
                    .read
                    .iter()
                    .chain(contract.partitions.write.iter())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn open_settings(&mut self) {
        let Some(contract) = self.contract.as_ref() else {
            self.set_status("Load a contract first", StatusLevel::Warn);
            return;
        };
        self.settings = SettingsState {
            open: true,
            cursor: 0,
            hidden: contract.hidden.clone(),
        };
    }

    pub fn settings_move(&mut self, down: bool) {
        let len = self.settings_entries().len();
        if len == 0 {
            return;
        }
        self.settings.cursor = if down {
            (self.settings.cursor + 1).min(len - 1)
        } else {
            self.settings.cursor.saturating_sub(1)
        };
    }

    /// Flip the checkbox under the cursor
    pub fn settings_toggle(&mut self) {
        let Some(signature) = self
            .settings_entries()
            .get(self.settings.cursor)
            .map(|entry| entry.signature.clone())
        else {
            return;
        };
        if !self.settings.hidden.remove(&signature) {
            self.settings.hidden.insert(signature);
        }
    }

    /// Close the popup and apply the selection. A changed selection is a
    /// new interface list: forms are rebuilt and the wallet is dropped.
    pub fn close_settings(&mut self) {
        self.settings.open = false;
        let hidden = std::mem::take(&mut self.settings.hidden);
        let Some(contract) = self.contract.as_mut() else {
            return;
        };
        if contract.hidden == hidden {
            return;
        }
        contract.hidden = hidden;
        let shown = contract.partitions.len().saturating_sub(contract.hidden.len());
        self.rebuild_forms();
        self.set_status(
            format!("Showing {shown} entries · reconnect the wallet"),
            StatusLevel::Info,
        );
    }

    // ---------------------------------------------------------------------
    // Code tab

    /// Visible entries in panel order
    pub fn visible_entries(&self) -> Vec<&InterfaceEntry> {
        self.read_forms
            .iter()
            .map(|form| &form.form.entry)
            .chain(self.write_forms.iter().map(|form| &form.form.entry))
            .collect()
    }

    pub fn snippet(&self) -> Option<String> {
        let contract = self.contract.as_ref()?;
        Some(crate::modules::export::render_snippet(
            &contract.network,
            &contract.address.to_checksum(None),
            &self.visible_entries(),
        ))
    }

    // ---------------------------------------------------------------------
    // Commands

    pub fn enter_command(&mut self) {
        self.input_mode = InputMode::Command;
        self.command.input.clear();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        if input.is_empty() {
            self.exit_command();
            return;
        }
        let cmd = crate::core::parse_command(&input);
        self.exit_command();
        let action = self.execute_command(&cmd);
        self.apply_action(action);
        self.command.last = Some(input);
    }

    /// Execute a parsed command
    pub fn execute_command(&mut self, cmd: &Command) -> Action {
        match cmd {
            Command::Load { address, network } => {
                if let Some(name) = network {
                    if !self.select_network(name) {
                        return Action::None;
                    }
                }
                self.request_lookup(address, false);
                Action::None
            }
            Command::Reload => {
                self.reload();
                Action::None
            }
            Command::Network(None) => Action::Notify(
                format!(
                    "Network: {} · available: {}",
                    self.network.name,
                    self.networks
                        .iter()
                        .map(|network| network.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                NotifyLevel::Info,
            ),
            Command::Network(Some(name)) => {
                self.select_network(name);
                Action::None
            }
            Command::Open { path, address } => {
                self.open_local_abi(path, address.as_deref());
                Action::None
            }
            Command::Connect => {
                self.connect_wallet();
                Action::None
            }
            Command::Export(ExportTarget::Snippet) => crate::modules::export::export_snippet(self),
            Command::Export(ExportTarget::Transactions) => {
                crate::modules::export::export_transactions(self)
            }
            Command::Export(ExportTarget::Abi) => crate::modules::export::export_abi(self),
            Command::Copy => crate::modules::export::copy_snippet(self),
            Command::Settings => {
                self.open_settings();
                Action::None
            }
            Command::Help => {
                self.help_open = true;
                Action::None
            }
            Command::Quit => Action::Quit,
            Command::Unknown(s) => {
                Action::Notify(format!("Unknown command: {}", s), NotifyLevel::Warn)
            }
        }
    }

    /// Apply an action returned by a command or module
    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Copy(text) => {
                let action = crate::modules::export::copy_to_clipboard(&text);
                self.apply_action(action);
            }
            Action::Notify(msg, level) => {
                let level = match level {
                    NotifyLevel::Info => StatusLevel::Info,
                    NotifyLevel::Warn => StatusLevel::Warn,
                    NotifyLevel::Error => StatusLevel::Error,
                };
                self.set_status(msg, level);
            }
            Action::Quit => self.should_quit = true,
        }
    }
}

pub fn short_addr(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

pub fn short_hash(hash: &str) -> String {
    if hash.len() <= 14 {
        return hash.to_string();
    }
    format!("{}…{}", &hash[..10], &hash[hash.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0x1234"), "0x1234");
        let hash = format!("0x{}", "ab".repeat(32));
        assert_eq!(short_hash(&hash), "0xabababab…abab");
    }

    #[test]
    fn test_short_addr() {
        let address: Address = "0x6b175474e89094c44da98b954eedeac495271d0f"
            .parse()
            .unwrap();
        assert_eq!(short_addr(&address), "0x6B17…1d0F");
    }

    #[test]
    fn test_tab_cycle_and_code_scroll() {
        let mut app = App::new();
        app.cycle_tab();
        assert_eq!(app.current_tab, Tab::Write);
        app.cycle_tab();
        assert_eq!(app.current_tab, Tab::Code);
        app.move_selection(true);
        app.move_selection(true);
        app.move_selection(false);
        assert_eq!(app.code_scroll, 1);
        app.cycle_tab();
        assert_eq!(app.current_tab, Tab::Read);
    }

    #[test]
    fn test_status_expires() {
        let mut app = App::new();
        app.set_status("hello", StatusLevel::Info);
        app.on_tick();
        assert!(app.status.is_some());
        if let Some(status) = app.status.as_mut() {
            status.since = Instant::now() - Duration::from_secs(10);
        }
        app.on_tick();
        assert!(app.status.is_none());
    }
}
