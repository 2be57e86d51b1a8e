//! Scripted in-memory browser for tests.
//!
//! Browsers are numbered in launch order, pages per browser in open order, so
//! page `b/p` is the `p`-th page of the `b`-th browser. Every call is logged.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::browser::{Browser, Launcher, Page};

#[derive(Default)]
struct Script {
    launches: usize,
    pages_opened: usize,
    hold_launch: HashMap<usize, Arc<Notify>>,
    fail_launch: HashSet<usize>,
    fail_page_open: HashSet<usize>,
    panic_page_open: HashSet<usize>,
    fail_page_close: HashSet<usize>,
    fail_browser_close: HashSet<usize>,
    page_closes: HashMap<usize, usize>,
    browser_closes: HashMap<usize, usize>,
    log: Vec<String>,
}

#[derive(Clone, Default)]
pub(crate) struct MockLauncher {
    script: Arc<Mutex<Script>>,
    changed: Arc<Notify>,
}

impl MockLauncher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        f(&mut self.script.lock().unwrap())
    }

    /// Launch number `n` waits until the returned gate is notified.
    pub(crate) fn hold_launch(&self, n: usize) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.with(|s| s.hold_launch.insert(n, Arc::clone(&gate)));
        gate
    }

    pub(crate) fn fail_launch(&self, n: usize) {
        self.with(|s| s.fail_launch.insert(n));
    }

    pub(crate) fn fail_page_open(&self, browser: usize) {
        self.with(|s| s.fail_page_open.insert(browser));
    }

    pub(crate) fn allow_page_open(&self, browser: usize) {
        self.with(|s| s.fail_page_open.remove(&browser));
    }

    pub(crate) fn panic_page_open(&self, browser: usize) {
        self.with(|s| s.panic_page_open.insert(browser));
    }

    pub(crate) fn fail_page_close(&self, browser: usize) {
        self.with(|s| s.fail_page_close.insert(browser));
    }

    pub(crate) fn fail_browser_close(&self, browser: usize) {
        self.with(|s| s.fail_browser_close.insert(browser));
    }

    pub(crate) fn pages_opened(&self) -> usize {
        self.with(|s| s.pages_opened)
    }

    pub(crate) fn page_closes(&self, browser: usize) -> usize {
        self.with(|s| s.page_closes.get(&browser).copied().unwrap_or(0))
    }

    pub(crate) fn browser_closes(&self, browser: usize) -> usize {
        self.with(|s| s.browser_closes.get(&browser).copied().unwrap_or(0))
    }

    pub(crate) fn log(&self) -> Vec<String> {
        self.with(|s| s.log.clone())
    }

    /// Waits until `browser` has closed at least `count` pages.
    pub(crate) async fn wait_page_closes(&self, browser: usize, count: usize) {
        loop {
            let changed = self.changed.notified();
            if self.page_closes(browser) >= count {
                return;
            }
            changed.await;
        }
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    type Browser = MockBrowser;

    async fn launch(&self) -> anyhow::Result<MockBrowser> {
        let (id, gate, fail) = self.with(|s| {
            let id = s.launches;
            s.launches += 1;
            s.log.push(format!("launch {id}"));
            (id, s.hold_launch.get(&id).cloned(), s.fail_launch.contains(&id))
        });
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if fail {
            anyhow::bail!("launch {id} refused");
        }
        Ok(MockBrowser {
            id,
            next_page: AtomicUsize::new(0),
            mock: self.clone(),
        })
    }
}

pub(crate) struct MockBrowser {
    id: usize,
    next_page: AtomicUsize,
    mock: MockLauncher,
}

#[async_trait]
impl Browser for MockBrowser {
    type Page = MockPage;

    async fn new_page(&self) -> anyhow::Result<MockPage> {
        let (fail, explode) = self.mock.with(|s| {
            (
                s.fail_page_open.contains(&self.id),
                s.panic_page_open.contains(&self.id),
            )
        });
        if explode {
            panic!("new_page on browser {} exploded", self.id);
        }
        if fail {
            anyhow::bail!("browser {} refused to open a page", self.id);
        }

        let id = self.next_page.fetch_add(1, Ordering::Relaxed);
        let browser = self.id;
        self.mock.with(|s| {
            s.pages_opened += 1;
            s.log.push(format!("open page {browser}/{id}"));
        });
        Ok(MockPage {
            browser,
            id,
            mock: self.mock.clone(),
        })
    }

    async fn close(&self) -> anyhow::Result<()> {
        let id = self.id;
        let fail = self.mock.with(|s| {
            *s.browser_closes.entry(id).or_default() += 1;
            s.log.push(format!("close browser {id}"));
            s.fail_browser_close.contains(&id)
        });
        self.mock.changed.notify_waiters();
        if fail {
            anyhow::bail!("browser {id} close refused");
        }
        Ok(())
    }
}

pub(crate) struct MockPage {
    browser: usize,
    id: usize,
    mock: MockLauncher,
}

impl MockPage {
    /// `browser/page`, e.g. `"0/1"`.
    pub(crate) fn label(&self) -> String {
        format!("{}/{}", self.browser, self.id)
    }
}

#[async_trait]
impl Page for MockPage {
    async fn close(&self) -> anyhow::Result<()> {
        let label = self.label();
        let browser = self.browser;
        let fail = self.mock.with(|s| {
            *s.page_closes.entry(browser).or_default() += 1;
            s.log.push(format!("close page {label}"));
            s.fail_page_close.contains(&browser)
        });
        self.mock.changed.notify_waiters();
        if fail {
            anyhow::bail!("page {label} close refused");
        }
        Ok(())
    }
}
