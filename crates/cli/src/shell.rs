//! Interactive shell.
//!
//! Owns the location, the cache handle and the controllers. Commands become
//! `Intent`s; intents are applied to `UrlSync`; every location change is fed
//! back into the controllers, which decide what to fetch. Fetches run as
//! detached tasks and report their key on a channel when they settle.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use animedex_client::{DetailController, ListController, ListView, QueryCache};
use animedex_core::{Debouncer, Intent, QueryKey, Route, UrlSync};
use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::command::{Command, HELP};
use crate::render;

enum Flow {
    Continue,
    Quit,
}

struct DetailScreen {
    controller: DetailController,
    full: bool,
}

pub struct Shell<W> {
    sync: UrlSync,
    cache: Arc<QueryCache>,
    list: ListController,
    detail: Option<DetailScreen>,
    debouncer: Debouncer<String>,
    debounced: mpsc::UnboundedReceiver<String>,
    resolved_tx: mpsc::UnboundedSender<QueryKey>,
    resolved_rx: mpsc::UnboundedReceiver<QueryKey>,
    pending_full: bool,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(sync: UrlSync, cache: Arc<QueryCache>, debounce: Duration, out: W) -> Self {
        let list = ListController::new(Arc::clone(&cache), sync.read_from_url());
        let (debouncer, debounced) = Debouncer::new(debounce);
        let (resolved_tx, resolved_rx) = mpsc::unbounded_channel();
        Self {
            sync,
            cache,
            list,
            detail: None,
            debouncer,
            debounced,
            resolved_tx,
            resolved_rx,
            pending_full: false,
            out,
        }
    }

    /// Read commands until `quit` or end of input.
    pub async fn run<R: AsyncBufRead + Unpin>(mut self, input: R) -> Result<()> {
        let mut lines = input.lines();
        self.location_changed()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if let Flow::Quit = self.handle_line(&line)? {
                        break;
                    }
                }
                Some(search) = self.debounced.recv() => self.search_settled(search)?,
                Some(key) = self.resolved_rx.recv() => self.resolved(&key)?,
            }
        }

        self.debouncer.cancel();
        self.cache.shutdown();
        tracing::info!("shell closed");
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(err) => {
                writeln!(self.out, "{err}")?;
                return Ok(Flow::Continue);
            }
        };
        tracing::debug!(?command, "command");

        match command {
            Command::Search(text) => self.apply(self.list.on_search_change(text))?,
            Command::Clear => self.apply(self.list.on_reset_search())?,
            Command::Page(page) => self.apply(self.list.on_page_change(page))?,
            Command::Next => match self.list.view() {
                ListView::Populated { controls, .. } if controls.has_next => {
                    self.apply(self.list.on_page_change(controls.current + 1))?
                }
                _ => writeln!(self.out, "No next page.")?,
            },
            Command::Prev => {
                let page = self.list.state().page();
                if page > 1 {
                    self.apply(self.list.on_page_change(page - 1))?;
                } else {
                    writeln!(self.out, "Already on the first page.")?;
                }
            }
            Command::Retry => {
                let intent = match &self.detail {
                    Some(screen) => screen.controller.on_retry(),
                    None => self.list.on_retry(),
                };
                self.apply(intent)?;
            }
            Command::Detail { id, full } => {
                self.pending_full = full;
                self.apply(self.list.on_open(id))?;
            }
            Command::Back => {
                let intent = match &self.detail {
                    Some(screen) => screen.controller.on_go_back(),
                    None => Intent::GoBack,
                };
                self.apply(intent)?;
            }
            Command::Forward => {
                if self.sync.forward() {
                    self.location_changed()?;
                } else {
                    writeln!(self.out, "Nothing to go forward to.")?;
                }
            }
            Command::List => self.redraw()?,
            Command::Url => writeln!(self.out, "{}", self.sync.location())?,
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn apply(&mut self, intent: Intent) -> Result<()> {
        if let Intent::Retry(key) = &intent {
            tracing::debug!(key = %key, "retrying");
            self.spawn_fetch(key.clone());
            writeln!(self.out, "Retrying...")?;
            return Ok(());
        }

        if self.sync.apply(&intent)? {
            self.location_changed()?;
        } else if matches!(intent, Intent::GoBack) {
            writeln!(self.out, "Nothing to go back to.")?;
        }
        Ok(())
    }

    /// Bring the controllers in line with the current location.
    fn location_changed(&mut self) -> Result<()> {
        self.sync.normalize_route();

        match self.sync.route() {
            Route::AnimeDetail(id) => {
                // Leaving the list. Coming back re-arms the search from the location.
                self.debouncer.cancel();
                let full = std::mem::take(&mut self.pending_full);
                let controller = DetailController::new(Arc::clone(&self.cache), id);
                self.detail = Some(DetailScreen { controller, full });
            }
            Route::AnimeList | Route::NotFound => {
                self.detail = None;
                if self.list.sync_from_url(self.sync.read_from_url()) {
                    self.debouncer.push(self.list.state().search.clone());
                } else {
                    self.debouncer.cancel();
                }
            }
        }
        self.redraw()
    }

    /// A debounced search term arrived. Terms that outlived their screen or
    /// were overtaken by a newer location are dropped.
    fn search_settled(&mut self, search: String) -> Result<()> {
        if self.detail.is_some() || search != self.list.state().search {
            tracing::debug!(search = %search, "dropping stale search");
            return Ok(());
        }
        self.list.commit_search(search);
        self.show_list()
    }

    fn redraw(&mut self) -> Result<()> {
        if self.detail.is_some() {
            self.show_detail()
        } else {
            self.show_list()
        }
    }

    fn show_list(&mut self) -> Result<()> {
        let key = self.list.active_key().clone();
        if self.list.needs_fetch() {
            self.spawn_fetch(key);
        } else {
            // Served from cache, e.g. a prefetched page; it still gets its own next-page prefetch.
            self.list.on_resolved(&key);
        }
        let updated_at = self.cache.peek(self.list.active_key()).and_then(|entry| entry.updated_at);
        write!(self.out, "{}", render::list(&self.list.view(), updated_at))?;
        Ok(())
    }

    fn show_detail(&mut self) -> Result<()> {
        let Some(screen) = &self.detail else {
            return Ok(());
        };
        if screen.controller.needs_fetch() {
            self.spawn_fetch(screen.controller.key().clone());
        }
        write!(self.out, "{}", render::detail(&screen.controller.view(), screen.full))?;
        Ok(())
    }

    fn resolved(&mut self, key: &QueryKey) -> Result<()> {
        match self.detail.as_ref().map(|screen| screen.controller.on_resolved(key)) {
            Some(true) => self.show_detail(),
            Some(false) => Ok(()),
            None if self.list.on_resolved(key) => self.show_list(),
            None => Ok(()),
        }
    }

    fn spawn_fetch(&self, key: QueryKey) {
        let cache = Arc::clone(&self.cache);
        let tx = self.resolved_tx.clone();
        tokio::spawn(async move {
            cache.fetch(key.clone()).await;
            // The shell may already be gone.
            let _ = tx.send(key);
        });
    }
}
