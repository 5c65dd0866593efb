//! Prompt state and command execution.

use std::io::IsTerminal;

use anyhow::{bail, Context, Result};
use covidz_core::{
    query, transform, ApiClient, CancellationToken, Catalog, SyncEngine, SyncEvent,
    KNOWN_VARIABLES,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::commands::{help_text, Command, ListTarget};
use crate::render::render;

/// Capacity of the sync progress channel
const CHANNEL_BUFFER_SIZE: usize = 256;

pub struct App {
    engine: SyncEngine<ApiClient>,
    catalog: Catalog,
    /// Token of the sync in progress, if any.
    active_sync: watch::Sender<Option<CancellationToken>>,
    /// Interrupts received while no sync was running.
    idle_interrupts: mpsc::UnboundedReceiver<()>,
}

impl App {
    /// Wire the engine to a progress printer, install the Ctrl+C listener and
    /// load the known countries. A catalog that can be neither read nor
    /// fetched starts empty; `sync` fills it in later.
    pub async fn new(engine: SyncEngine<ApiClient>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        tokio::spawn(print_progress(rx));
        let engine = engine.with_events(tx);

        let (active_sync, active_rx) = watch::channel(None);
        let (idle_tx, idle_interrupts) = mpsc::unbounded_channel();
        tokio::spawn(listen_for_interrupts(active_rx, idle_tx));

        let catalog = match Catalog::load_or_fetch(engine.cache(), engine.fetcher()).await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(error = %e, "Could not load country catalog");
                eprintln!("warning: no country list available yet ({}); run 'sync'.", e);
                Catalog::default()
            }
        };

        Self {
            engine,
            catalog,
            active_sync,
            idle_interrupts,
        }
    }

    /// Resolves when Ctrl+C is pressed at the prompt.
    pub async fn interrupted(&mut self) {
        if self.idle_interrupts.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    /// Run one command. Returns true when the user asked to quit.
    pub async fn execute(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Quit => return Ok(true),
            Command::Empty => {}
            Command::Help => print!("{}", help_text()),
            Command::Sync => self.sync().await?,
            Command::List(targets) => self.list(&targets),
            Command::Plot { variables, entities } => self.plot(&variables, &entities)?,
            Command::Invalid(reason) => bail!(reason),
        }
        Ok(false)
    }

    async fn sync(&mut self) -> Result<()> {
        let cancel = CancellationToken::new();
        self.active_sync.send_replace(Some(cancel.clone()));
        let result = self.engine.synchronize(&cancel).await;
        self.active_sync.send_replace(None);
        let report = result.context("sync failed")?;

        self.catalog = Catalog::new(self.engine.cache().read_catalog()?);

        println!(
            "synced {} countries ({} already current, {} failed){}",
            report.fetched.len(),
            report.up_to_date,
            report.failed.len(),
            if report.cancelled { ", interrupted" } else { "" }
        );
        Ok(())
    }

    fn list(&self, targets: &[ListTarget]) {
        for target in targets {
            match target {
                ListTarget::Variables => {
                    println!("AVAILABLE VARIABLES: {}", KNOWN_VARIABLES.join(", "));
                }
                ListTarget::Countries => {
                    println!("AVAILABLE COUNTRIES:");
                    for entity in self.catalog.sorted_by_slug() {
                        println!("{}", entity.key());
                    }
                }
            }
        }
    }

    fn plot(&self, variables: &[String], entities: &[String]) -> Result<()> {
        let selection = query::resolve(variables, entities, &self.catalog);
        if !selection.dropped.is_empty() {
            println!("ignoring unknown names: {}", selection.dropped.join(", "));
        }
        if selection.is_empty() {
            bail!("nothing to plot: no known variable or no known country requested");
        }

        let rows = query::load_rows(self.engine.cache(), &selection)
            .context("cached data missing, run 'sync' first")?;
        let keys = selection.entity_keys();
        let tidy = transform(rows, &keys, &selection.variables);

        print!("{}", render(&tidy, &selection.variables, &keys));
        Ok(())
    }
}

/// Route every Ctrl+C for the life of the process: cancel the running sync,
/// or tell the prompt when none is running.
async fn listen_for_interrupts(
    active_sync: watch::Receiver<Option<CancellationToken>>,
    idle: mpsc::UnboundedSender<()>,
) {
    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl+C");
            return;
        }
        if !route_interrupt(&active_sync, &idle) {
            return;
        }
    }
}

/// Deliver one interrupt. Returns false once the prompt is gone.
fn route_interrupt(
    active_sync: &watch::Receiver<Option<CancellationToken>>,
    idle: &mpsc::UnboundedSender<()>,
) -> bool {
    let current = active_sync.borrow().clone();
    match current {
        Some(cancel) => {
            info!("Interrupt received, stopping sync after the current country");
            cancel.cancel();
            true
        }
        None => idle.send(()).is_ok(),
    }
}

/// Progress bar on stderr, hidden when stderr is not a terminal.
fn create_progress_bar(total: u64) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template("syncing data [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    pb.set_style(style);
    pb
}

async fn print_progress(mut rx: mpsc::Receiver<SyncEvent>) {
    let mut bar: Option<ProgressBar> = None;
    while let Some(event) = rx.recv().await {
        match event {
            SyncEvent::Progress { processed, total } => {
                let pb = bar.get_or_insert_with(|| create_progress_bar(total as u64));
                pb.set_position(processed as u64);
            }
            SyncEvent::EntityFailed { slug, error } => {
                let line = format!("  . {}: {}.", slug, error);
                match &bar {
                    Some(pb) => pb.suspend(|| eprintln!("{}", line)),
                    None => eprintln!("{}", line),
                }
            }
            SyncEvent::Complete(_) => {
                if let Some(pb) = bar.take() {
                    pb.finish();
                }
            }
        }
    }
}
