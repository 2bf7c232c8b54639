//! Drive the app state machine without the TUI or the runtime

use alloy::primitives::{Address, Bytes, U256};

use callpad::app::{App, InputMode, StatusLevel, Tab, TxState, WalletState};
use callpad::domain::form::{CallPhase, FormKey};
use callpad::domain::network::Network;
use callpad::infrastructure::lookup::LookupError;
use callpad::infrastructure::runtime::RuntimeCommand;
use callpad::infrastructure::wallet::WalletError;

const TOKEN: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
const OTHER: &str = "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984";
const ACCOUNT: &str = "0x00000000000000000000000000000000000000aa";
const HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

const ABI: &str = r#"[
    {"type":"function","name":"balanceOf","stateMutability":"view",
     "inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"","type":"uint256"}]},
    {"type":"function","name":"name","stateMutability":"view",
     "inputs":[],"outputs":[{"name":"","type":"string"}]},
    {"type":"function","name":"transfer","stateMutability":"nonpayable",
     "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
     "outputs":[{"name":"","type":"bool"}]},
    {"type":"function","name":"deposit","stateMutability":"payable","inputs":[],"outputs":[]},
    {"type":"event","name":"Transfer","inputs":[]}
]"#;

fn account() -> Address {
    ACCOUNT.parse().unwrap()
}

/// Issue a lookup and answer it with `abi`
fn load(app: &mut App, address: &str, abi: &str) {
    assert!(app.request_lookup(address, false));
    let request_id = match app.take_commands().as_slice() {
        [RuntimeCommand::LookupInterface { request_id, .. }] => *request_id,
        other => panic!("unexpected commands: {other:?}"),
    };
    app.apply_interface_loaded(request_id, abi, false);
}

fn connect(app: &mut App, chain_id: u64) -> u64 {
    app.connect_wallet();
    let session_id = app
        .take_commands()
        .into_iter()
        .find_map(|cmd| match cmd {
            RuntimeCommand::ConnectWallet { session_id } => Some(session_id),
            _ => None,
        })
        .expect("connect command");
    app.apply_wallet_connected(session_id, account(), chain_id, "test");
    session_id
}

fn loaded_and_connected() -> App {
    let mut app = App::new();
    load(&mut app, TOKEN, ABI);
    connect(&mut app, 1);
    app
}

fn fill_transfer(app: &mut App) {
    app.set_tab(Tab::Write);
    app.selected_write = 0;
    let form = &mut app.write_forms[0].form;
    form.set_value(0, ACCOUNT);
    form.set_value(1, "100");
}

fn submitted(app: &mut App) -> (FormKey, Network) {
    match app.take_commands().as_slice() {
        [RuntimeCommand::Submit {
            form,
            call,
            network,
            ..
        }] => {
            assert_eq!(call.signature, "transfer(address,uint256)");
            (*form, network.clone())
        }
        other => panic!("unexpected commands: {other:?}"),
    }
}

fn submitted_key(app: &mut App) -> FormKey {
    submitted(app).0
}

#[test]
fn test_lookup_installs_partitions() {
    let mut app = App::new();
    load(&mut app, TOKEN, ABI);

    let contract = app.contract.as_ref().unwrap();
    assert_eq!(contract.address, TOKEN.parse::<Address>().unwrap());
    assert_eq!(app.read_forms.len(), 2);
    assert_eq!(app.write_forms.len(), 2);
    assert!(app.lookup.is_none());
    assert_eq!(app.generation, 1);
}

#[test]
fn test_invalid_address_sends_nothing() {
    let mut app = App::new();
    assert!(!app.request_lookup("0x1234", false));
    assert!(app.take_commands().is_empty());
    assert_eq!(app.status_text().map(|(_, level)| level), Some(StatusLevel::Error));
}

#[test]
fn test_failed_lookup_keeps_displayed_contract() {
    let mut app = App::new();
    load(&mut app, TOKEN, ABI);
    let generation = app.generation;

    assert!(app.request_lookup(OTHER, false));
    let request_id = match app.take_commands().as_slice() {
        [RuntimeCommand::LookupInterface { request_id, .. }] => *request_id,
        other => panic!("unexpected commands: {other:?}"),
    };
    app.apply_lookup_failed(
        request_id,
        &LookupError::Rejected("Contract source code not verified".to_string()),
    );

    let contract = app.contract.as_ref().unwrap();
    assert_eq!(contract.address, TOKEN.parse::<Address>().unwrap());
    assert_eq!(contract.partitions.len(), 4);
    assert_eq!(app.generation, generation);
    let (text, level) = app.status_text().unwrap();
    assert_eq!(level, StatusLevel::Error);
    assert!(text.contains("not verified"));

    // Connecting still binds to the old address
    connect(&mut app, 1);
    let session = app.session().unwrap();
    assert_eq!(session.contract.address(), TOKEN.parse::<Address>().unwrap());
}

#[test]
fn test_stale_lookup_result_is_ignored() {
    let mut app = App::new();
    assert!(app.request_lookup(TOKEN, false));
    assert!(app.request_lookup(OTHER, false));
    let ids: Vec<u64> = app
        .take_commands()
        .into_iter()
        .filter_map(|cmd| match cmd {
            RuntimeCommand::LookupInterface { request_id, .. } => Some(request_id),
            _ => None,
        })
        .collect();
    assert_eq!(ids.len(), 2);

    app.apply_interface_loaded(ids[0], ABI, false);
    assert!(app.contract.is_none());
    app.apply_interface_loaded(ids[1], ABI, true);
    assert_eq!(
        app.contract.as_ref().unwrap().address,
        OTHER.parse::<Address>().unwrap()
    );
}

#[test]
fn test_connect_requires_contract() {
    let mut app = App::new();
    app.connect_wallet();
    assert!(app.take_commands().is_empty());
    assert_eq!(app.wallet, WalletState::Disconnected);
}

#[test]
fn test_chain_mismatch_warns() {
    let mut app = App::new();
    load(&mut app, TOKEN, ABI);
    connect(&mut app, 11155111);
    assert!(app.session().is_some());
    let (text, level) = app.status_text().unwrap();
    assert_eq!(level, StatusLevel::Warn);
    assert!(text.contains("11155111"));
}

#[test]
fn test_wallet_connected_after_reload_is_dropped() {
    let mut app = App::new();
    load(&mut app, TOKEN, ABI);
    app.connect_wallet();
    let session_id = match app.take_commands().as_slice() {
        [RuntimeCommand::ConnectWallet { session_id }] => *session_id,
        other => panic!("unexpected commands: {other:?}"),
    };

    load(&mut app, OTHER, ABI);
    app.apply_wallet_connected(session_id, account(), 1, "test");

    assert_eq!(app.wallet, WalletState::Disconnected);
    assert!(app
        .take_commands()
        .iter()
        .any(|cmd| matches!(cmd, RuntimeCommand::DropSession { session_id: id } if *id == session_id)));
}

#[test]
fn test_empty_required_field_sends_nothing() {
    let mut app = loaded_and_connected();
    app.set_tab(Tab::Write);
    app.write_forms[0].form.set_value(1, "100");

    app.submit_selected();

    assert!(app.take_commands().is_empty());
    assert!(app.write_forms[0].pending.is_empty());
    let (text, level) = app.status_text().unwrap();
    assert_eq!(level, StatusLevel::Error);
    assert!(text.contains("to"));
}

#[test]
fn test_non_numeric_uint_sends_nothing() {
    let mut app = loaded_and_connected();
    fill_transfer(&mut app);
    app.write_forms[0].form.set_value(1, "lots");

    app.submit_selected();

    assert!(app.take_commands().is_empty());
    assert!(matches!(app.write_forms[0].phase, CallPhase::Failed(_)));
}

#[test]
fn test_read_requires_wallet() {
    let mut app = App::new();
    load(&mut app, TOKEN, ABI);
    app.set_tab(Tab::Read);
    app.selected_read = 1;

    app.submit_selected();

    assert!(app.take_commands().is_empty());
    assert_eq!(
        app.status_text().map(|(text, _)| text.to_string()),
        Some("please connect a wallet first".to_string())
    );
}

#[test]
fn test_read_result_is_decoded() {
    let mut app = loaded_and_connected();
    app.set_tab(Tab::Read);
    app.read_forms[0].form.set_value(0, ACCOUNT);

    app.submit_selected();
    let key = match app.take_commands().as_slice() {
        [RuntimeCommand::Query { form, call, .. }] => {
            assert_eq!(call.calldata.len(), 4 + 32);
            *form
        }
        other => panic!("unexpected commands: {other:?}"),
    };

    let data = Bytes::from(U256::from(42u64).to_be_bytes::<32>().to_vec());
    app.apply_query_returned(key, &data);

    let form = &app.read_forms[0];
    assert_eq!(form.phase, CallPhase::Confirmed);
    let outputs = form.result.as_ref().unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].value, "42");
}

#[test]
fn test_pending_list_gates_submit() {
    let mut app = loaded_and_connected();
    fill_transfer(&mut app);

    app.submit_selected();
    let (key, network) = submitted(&mut app);
    let to = TOKEN.parse().unwrap();
    app.apply_tx_submitted(key, HASH, "transfer(address,uint256)", to, &network);

    let form = &app.write_forms[0];
    assert_eq!(form.pending.len(), 1);
    assert!(!form.pending.iter().next().unwrap().confirmed);
    assert!(!form.submit_enabled());
    assert_eq!(app.tx_log.len(), 1);
    assert_eq!(app.tx_log[0].state, TxState::Pending);

    // Disabled while unconfirmed
    app.submit_selected();
    assert!(app.take_commands().is_empty());
    assert_eq!(app.write_forms[0].pending.len(), 1);

    app.apply_tx_confirmed(key, &HASH.to_uppercase().replace("0X", "0x"), Some(19));
    let form = &app.write_forms[0];
    let tx = form.pending.iter().next().unwrap();
    assert!(tx.confirmed);
    assert_eq!(tx.block_number, Some(19));
    assert!(form.submit_enabled());
    assert_eq!(app.tx_log[0].state, TxState::Confirmed);

    app.submit_selected();
    assert_eq!(submitted_key(&mut app), key);
}

#[test]
fn test_tx_log_keeps_the_network_it_was_sent_on() {
    let mut app = loaded_and_connected();
    fill_transfer(&mut app);
    app.submit_selected();
    let (key, network) = submitted(&mut app);
    assert_eq!(network.name, "mainnet");

    // Another contract on another network loads before the signer answers
    assert!(app.select_network("sepolia"));
    load(&mut app, OTHER, ABI);
    assert_eq!(app.contract.as_ref().unwrap().network.name, "sepolia");

    app.apply_tx_submitted(
        key,
        HASH,
        "transfer(address,uint256)",
        TOKEN.parse().unwrap(),
        &network,
    );
    let record = &app.tx_log[0];
    assert_eq!(record.network, "mainnet");
    assert_eq!(record.explorer_url, format!("https://etherscan.io/tx/{HASH}"));
    assert!(app.write_forms[0].pending.is_empty());
}

#[test]
fn test_confirmation_failure_keeps_entry_unconfirmed() {
    let mut app = loaded_and_connected();
    fill_transfer(&mut app);
    app.submit_selected();
    let (key, network) = submitted(&mut app);
    app.apply_tx_submitted(
        key,
        HASH,
        "transfer(address,uint256)",
        TOKEN.parse().unwrap(),
        &network,
    );

    app.apply_tx_confirmation_failed(
        key,
        HASH,
        &WalletError::Reverted {
            hash: HASH.to_string(),
        },
    );

    let form = &app.write_forms[0];
    let tx = form.pending.iter().next().unwrap();
    assert!(!tx.confirmed);
    assert!(tx.failure.is_some());
    assert!(!form.submit_enabled());
    assert_eq!(app.tx_log[0].state, TxState::Failed);
}

#[test]
fn test_payable_value_is_attached() {
    let mut app = loaded_and_connected();
    app.set_tab(Tab::Write);
    app.selected_write = 1;
    app.write_forms[1].form.set_value(0, "1000");

    app.submit_selected();
    match app.take_commands().as_slice() {
        [RuntimeCommand::Submit { call, .. }] => assert_eq!(call.value, U256::from(1000u64)),
        other => panic!("unexpected commands: {other:?}"),
    }
}

#[test]
fn test_settings_change_rebuilds_forms_and_drops_wallet() {
    let mut app = loaded_and_connected();
    let old_generation = app.generation;
    let stale_key = app.read_forms[1].form.key;

    app.open_settings();
    assert!(app.settings.open);
    app.settings_toggle(); // hide balanceOf
    app.close_settings();

    assert_eq!(app.read_forms.len(), 1);
    assert_eq!(app.read_forms[0].form.entry.name, "name");
    assert!(app.generation > old_generation);
    assert_eq!(app.wallet, WalletState::Disconnected);
    assert!(app
        .take_commands()
        .iter()
        .any(|cmd| matches!(cmd, RuntimeCommand::DropSession { .. })));
    assert!(!app.snippet().unwrap().contains("balanceOf"));

    // Results for the previous generation are dropped
    let data = Bytes::from(vec![0u8; 32]);
    app.apply_query_returned(stale_key, &data);
    assert!(app.read_forms[0].result.is_none());
}

#[test]
fn test_unchanged_settings_keep_session() {
    let mut app = loaded_and_connected();
    app.open_settings();
    app.settings_toggle();
    app.settings_toggle();
    app.close_settings();

    assert!(app.session().is_some());
    assert!(app.take_commands().is_empty());
}

#[test]
fn test_command_line_flow() {
    let mut app = App::new();
    app.enter_command();
    assert_eq!(app.input_mode, InputMode::Command);
    app.command.input = format!("load {TOKEN} sepolia");
    app.apply_command();

    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(app.network.name, "sepolia");
    match app.take_commands().as_slice() {
        [RuntimeCommand::LookupInterface { network, .. }] => assert_eq!(network.chain_id, 11155111),
        other => panic!("unexpected commands: {other:?}"),
    }

    app.enter_command();
    app.command.input = "network atlantis".to_string();
    app.apply_command();
    assert_eq!(app.network.name, "sepolia");

    app.enter_command();
    app.command.input = "q".to_string();
    app.apply_command();
    assert!(app.should_quit);
}

#[test]
fn test_form_keys_edit_active_field() {
    let mut app = loaded_and_connected();
    app.set_tab(Tab::Write);
    app.activate_selected(); // expand
    app.activate_selected(); // focus fields
    assert_eq!(app.input_mode, InputMode::Form);

    for c in "0xab".chars() {
        app.form_push_char(c);
    }
    app.form_pop_char();
    app.form_next_field();
    app.form_push_char('7');

    let form = &app.write_forms[0].form;
    assert_eq!(form.fields[0].value, "0xa");
    assert_eq!(form.fields[1].value, "7");

    app.set_tab(Tab::Read);
    assert_eq!(app.input_mode, InputMode::Normal);
}
