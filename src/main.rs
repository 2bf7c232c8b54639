use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use callpad::app::{App, InputMode, StatusLevel, Tab};
use callpad::config::{self, Config};
use callpad::domain::network::find_network;
use callpad::infrastructure::ethereum::ProviderConfig;
use callpad::infrastructure::lookup::{CachedInterfaceSource, ExplorerResolver, LookupMode};
use callpad::infrastructure::runtime::{
    RuntimeBridge, RuntimeCommand, RuntimeEvent, RuntimeServices,
};
use callpad::infrastructure::wallet::{ReceiptPolicy, RpcWalletConnector};
use callpad::modules::export;
use callpad::store::AbiCache;
use callpad::ui;

/// Cached interfaces older than this are purged at startup
const CACHE_MAX_AGE_DAYS: u32 = 30;

#[derive(Debug, Parser)]
#[command(
    name = "callpad",
    version,
    about = "Callpad: look up a contract's interface and call it from the terminal"
)]
struct Args {
    /// HTTP JSON-RPC endpoint of the wallet provider (e.g. http://localhost:8545)
    #[arg(long)]
    rpc: Option<String>,

    /// WebSocket endpoint (e.g. ws://localhost:8546)
    #[arg(long)]
    ws: Option<String>,

    /// IPC path (e.g. ~/.ethereum/geth.ipc). Unix only.
    #[arg(long)]
    ipc: Option<PathBuf>,

    /// Network for lookups (name, alias or chain id)
    #[arg(long)]
    network: Option<String>,

    /// Contract to load on startup
    #[arg(long)]
    address: Option<String>,

    /// Proxy lookup endpoint answering `?address=&network=`
    #[arg(long)]
    lookup_url: Option<String>,

    /// Do not read or write the ABI cache
    #[arg(long)]
    no_cache: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();
    let config = config::load();

    let endpoint = endpoint_from_args_and_config(&args, &config)?;
    let (source, cache_warning) = interface_source(&args, &config);
    let provider_label = endpoint
        .as_ref()
        .map(ProviderConfig::display)
        .unwrap_or_else(|| "not configured".to_string());
    let connector = RpcWalletConnector::new(
        endpoint,
        std::env::var("CALLPAD_PRIVATE_KEY").ok(),
        ReceiptPolicy {
            poll_interval: Duration::from_millis(config.receipt_poll_ms.max(100)),
            timeout: Duration::from_secs(config.receipt_timeout_secs),
        },
    );
    tracing::info!(endpoint = %provider_label, "starting");

    let networks = config.networks();
    let requested = args
        .network
        .clone()
        .unwrap_or_else(|| config.default_network_name().to_string());
    let (network, network_warning) = match find_network(&networks, &requested) {
        Some(network) => (network.clone(), None),
        None => (
            networks[0].clone(),
            Some(format!("Unknown network: {requested}")),
        ),
    };

    let mut app = App::with_networks(networks, network);
    app.set_status(
        format!("Wallet provider {provider_label} · :load <address>"),
        StatusLevel::Info,
    );
    if let Some(warning) = cache_warning.or(network_warning) {
        app.set_status(warning, StatusLevel::Warn);
    }
    if let Some(address) = args.address.as_deref() {
        app.request_lookup(address, false);
    }

    let runtime = RuntimeBridge::new(RuntimeServices {
        source: Arc::new(source),
        connector: Arc::new(connector),
    })?;

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
    }

    Ok(())
}

/// Log to a file; the terminal belongs to the TUI
fn init_logging() {
    let Some(path) = config::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = fs::OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("callpad=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn interface_source(
    args: &Args,
    config: &Config,
) -> (CachedInterfaceSource<ExplorerResolver>, Option<String>) {
    let lookup_url = args
        .lookup_url
        .clone()
        .or_else(|| config.lookup_url.clone())
        .filter(|url| !url.trim().is_empty());
    let mode = match lookup_url {
        Some(url) => LookupMode::Proxy { url },
        None => LookupMode::Explorer {
            api_key: std::env::var("ETHERSCAN_API_KEY")
                .ok()
                .or_else(|| config.etherscan_api_key.clone())
                .filter(|key| !key.trim().is_empty()),
        },
    };

    let mut warning = None;
    let cache = if config.cache && !args.no_cache {
        match open_cache() {
            Ok(cache) => cache,
            Err(err) => {
                tracing::warn!(error = %err, "ABI cache disabled");
                warning = Some(format!("ABI cache disabled: {err}"));
                None
            }
        }
    } else {
        None
    };

    (
        CachedInterfaceSource::new(ExplorerResolver::new(mode), cache),
        warning,
    )
}

fn open_cache() -> Result<Option<AbiCache>> {
    let Some(path) = config::abi_cache_path() else {
        return Ok(None);
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let cache = AbiCache::open(&path)?;
    let purged = cache.cleanup_old_entries(CACHE_MAX_AGE_DAYS)?;
    if purged > 0 {
        tracing::info!(purged, "purged old cached interfaces");
    }
    tracing::debug!(entries = cache.count()?, path = %path.display(), "interface cache opened");
    Ok(Some(cache))
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, &runtime);
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }

        pump_background(&mut app, &runtime);
    }
}

fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        match event {
            RuntimeEvent::InterfaceLoaded {
                request_id,
                abi_json,
                from_cache,
                ..
            } => app.apply_interface_loaded(request_id, &abi_json, from_cache),
            RuntimeEvent::LookupFailed {
                request_id, error, ..
            } => app.apply_lookup_failed(request_id, &error),
            RuntimeEvent::WalletConnected {
                session_id,
                account,
                chain_id,
                label,
            } => app.apply_wallet_connected(session_id, account, chain_id, &label),
            RuntimeEvent::WalletFailed { session_id, error } => {
                app.apply_wallet_failed(session_id, &error)
            }
            RuntimeEvent::QueryReturned { form, data } => app.apply_query_returned(form, &data),
            RuntimeEvent::QueryFailed { form, error } => app.apply_query_failed(form, &error),
            RuntimeEvent::TxSubmitted {
                form,
                hash,
                signature,
                to,
                network,
            } => app.apply_tx_submitted(form, &hash, &signature, to, &network),
            RuntimeEvent::TxFailed { form, error } => app.apply_tx_failed(form, &error),
            RuntimeEvent::TxConfirmed {
                form,
                hash,
                block_number,
            } => app.apply_tx_confirmed(form, &hash, block_number),
            RuntimeEvent::TxConfirmationFailed { form, hash, error } => {
                app.apply_tx_confirmation_failed(form, &hash, &error)
            }
            RuntimeEvent::Error { message } => app.apply_runtime_error(message),
        }
    }

    for cmd in app.take_commands() {
        if let Err(err) = runtime.send(cmd) {
            app.set_status(err.to_string(), StatusLevel::Error);
        }
    }
}

/// Wallet provider endpoint. `None` when neither the CLI nor the config names one.
fn endpoint_from_args_and_config(args: &Args, config: &Config) -> Result<Option<ProviderConfig>> {
    // CLI arguments take precedence
    if let Some(ipc) = args.ipc.clone() {
        return ipc_endpoint(ipc).map(Some);
    }
    if let Some(ws) = non_empty(args.ws.as_deref()) {
        return Ok(Some(ProviderConfig::WebSocket(ws.to_string())));
    }
    if let Some(rpc) = non_empty(args.rpc.as_deref()) {
        return Ok(Some(ProviderConfig::Http(normalize_http_endpoint(rpc))));
    }

    // Config file
    if let Some(ipc) = non_empty(config.ipc.as_deref()).and_then(expand_path) {
        return ipc_endpoint(ipc).map(Some);
    }
    if let Some(ws) = non_empty(config.ws.as_deref()) {
        return Ok(Some(ProviderConfig::WebSocket(ws.to_string())));
    }
    if let Some(rpc) = non_empty(config.rpc.as_deref()) {
        return Ok(Some(ProviderConfig::Http(normalize_http_endpoint(rpc))));
    }

    Ok(None)
}

#[cfg(unix)]
fn ipc_endpoint(path: PathBuf) -> Result<ProviderConfig> {
    Ok(ProviderConfig::Ipc(path))
}

#[cfg(not(unix))]
fn ipc_endpoint(_path: PathBuf) -> Result<ProviderConfig> {
    Err(anyhow::anyhow!("IPC is not supported on this platform"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn normalize_http_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn expand_path(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            return Some(home.join(rest));
        }
    }

    let mut buf = PathBuf::from(trimmed);
    if buf.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            buf = cwd.join(buf);
        }
    }
    Some(buf)
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.help_open = false;
        }
        return;
    }

    if app.settings.open {
        match key.code {
            KeyCode::Esc | KeyCode::Char('s') | KeyCode::Enter => app.close_settings(),
            KeyCode::Char('j') | KeyCode::Down => app.settings_move(true),
            KeyCode::Char('k') | KeyCode::Up => app.settings_move(false),
            KeyCode::Char(' ') | KeyCode::Char('x') => app.settings_toggle(),
            _ => {}
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
        InputMode::Form => handle_form_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.help_open = true,
        KeyCode::Char(':') | KeyCode::Char('/') => app.enter_command(),
        KeyCode::Char('s') => app.open_settings(),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('c') => app.connect_wallet(),
        KeyCode::Char('1') => app.set_tab(Tab::Read),
        KeyCode::Char('2') => app.set_tab(Tab::Write),
        KeyCode::Char('3') => app.set_tab(Tab::Code),
        KeyCode::Tab => app.cycle_tab(),
        KeyCode::Char('j') | KeyCode::Down => app.move_selection(true),
        KeyCode::Char('k') | KeyCode::Up => app.move_selection(false),
        KeyCode::Enter => app.activate_selected(),
        KeyCode::Char(' ') => app.toggle_selected(),
        KeyCode::Char('y') => {
            let action = export::copy_snippet(app);
            app.apply_action(action);
        }
        KeyCode::Char('x') => {
            let action = export::export_snippet(app);
            app.apply_action(action);
        }
        _ => {}
    }
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => app.apply_command(),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(c) => app.command.input.push(c),
        _ => {}
    }
}

fn handle_form_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_form(),
        KeyCode::Enter => app.submit_selected(),
        KeyCode::Tab | KeyCode::Down => app.form_next_field(),
        KeyCode::BackTab | KeyCode::Up => app.form_prev_field(),
        KeyCode::Backspace => app.form_pop_char(),
        KeyCode::Char(c) => app.form_push_char(c),
        _ => {}
    }
}
