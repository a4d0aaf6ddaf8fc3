mod tui_app;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Sparkline, Table, Tabs},
    Frame, Terminal,
};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use onchain_pulse::api::routes::{HealthResponse, LiveResponse};
use onchain_pulse::cache::{cached_fetch, CacheOptions, Poller};
use onchain_pulse::config::{Config, CHANNEL_CAPACITY, HEALTH_POLL_SECS};
use onchain_pulse::error::Result;
use onchain_pulse::sim::Clock;
use onchain_pulse::state::metrics_store::rank_by_volume;
use onchain_pulse::storage::writer::{load_items, open_pool};
use onchain_pulse::storage::{MemoryStorage, StorageWriter};
use onchain_pulse::types::{Accent, Badge, LinkStatus, Snapshot, Tier};
use onchain_pulse::ws::{stream_url, FeedHandle, FeedStatus, SnapshotFeed};
use tui_app::{
    format_age, format_change, format_count, format_usd, progress_bar, truncate, AppState, Tab,
    BADGES_CACHE_KEY,
};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("failed to build HTTP client");

    let mut app = AppState::new(cfg.api_url.trim_end_matches('/').to_string());

    let (storage, storage_notice) = open_storage(&cfg.cache_db_path).await;
    app.notice = storage_notice;

    // Initial badge load before rendering
    load_badges(&mut app, &storage, &client).await;

    let health_url = format!("{}/health", app.base_url);
    let health_client = client.clone();
    let health_poller = Poller::spawn(
        move || {
            let client = health_client.clone();
            let url = health_url.clone();
            async move { fetch_json::<HealthResponse>(&client, &url).await }
        },
        Duration::from_secs(HEALTH_POLL_SECS),
    );

    let (mut feed, mut feed_task) = spawn_feed(&app.base_url);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(
        &mut terminal,
        &mut app,
        &client,
        &storage,
        &health_poller,
        &mut feed,
        &mut feed_task,
    )
    .await;

    feed_task.abort();
    health_poller.stop();

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Local storage backed by SQLite; falls back to memory only if the file cannot be opened.
async fn open_storage(path: &str) -> (MemoryStorage, Option<String>) {
    match open_pool(path).await {
        Ok(pool) => {
            let items = load_items(&pool).await.unwrap_or_default();
            let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
            let writer = StorageWriter::new(pool, rx);
            tokio::spawn(async move { writer.run().await });
            let storage = MemoryStorage::with_write_behind(tx);
            storage.hydrate(items);
            (storage, None)
        }
        Err(e) => (MemoryStorage::new(), Some(format!("cache not persisted: {e}"))),
    }
}

fn spawn_feed(base_url: &str) -> (FeedHandle, JoinHandle<()>) {
    let (feed, handle) = SnapshotFeed::new(stream_url(base_url));
    let task = tokio::spawn(feed.run());
    (handle, task)
}

async fn fetch_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T> {
    Ok(client.get(url).send().await?.error_for_status()?.json::<T>().await?)
}

async fn load_badges(app: &mut AppState, storage: &MemoryStorage, client: &reqwest::Client) {
    let url = format!("{}/badges", app.base_url);
    let opts = CacheOptions::new(BADGES_CACHE_KEY);
    let cached = cached_fetch(storage, &app.clock, &opts, || {
        fetch_json::<Vec<Badge>>(client, &url)
    })
    .await;
    app.apply_badges(cached);
}

async fn post_toggle(client: &reqwest::Client, url: &str) -> Result<LiveResponse> {
    Ok(client.post(url).send().await?.error_for_status()?.json::<LiveResponse>().await?)
}

async fn toggle_live(app: &mut AppState, client: &reqwest::Client) {
    let url = format!("{}/live/toggle", app.base_url);
    app.notice = Some(match post_toggle(client, &url).await {
        Ok(r) if r.live => "live updates resumed".to_string(),
        Ok(_) => "live updates paused".to_string(),
        Err(e) => format!("toggle failed: {e}"),
    });
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    client: &reqwest::Client,
    storage: &MemoryStorage,
    health: &Poller<HealthResponse>,
    feed: &mut FeedHandle,
    feed_task: &mut JoinHandle<()>,
) -> io::Result<()> {
    let frame_interval = Duration::from_millis(250);

    loop {
        app.snapshot = feed.snapshots.borrow().clone();
        app.feed_status = feed.status.borrow().clone();
        app.health = health.state();

        terminal.draw(|f| render(f, app))?;

        if event::poll(frame_interval)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Tab => app.tab = app.tab.next(),
                        KeyCode::Char('1') => app.tab = Tab::Overview,
                        KeyCode::Char('2') => app.tab = Tab::Volume,
                        KeyCode::Char('3') => app.tab = Tab::Badges,
                        KeyCode::Char('p') | KeyCode::Char('P') => toggle_live(app, client).await,
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            feed_task.abort();
                            let (handle, task) = spawn_feed(&app.base_url);
                            *feed = handle;
                            *feed_task = task;
                            load_badges(app, storage, client).await;
                            app.notice = Some("reconnecting".to_string());
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState) {
    let area = f.area();

    // Outer vertical split: header | tabs | body | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(1), // tabs
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_tabs(f, app, chunks[1]);
    match app.tab {
        Tab::Overview => render_overview(f, app, chunks[2]),
        Tab::Volume => render_volume(f, app, chunks[2]),
        Tab::Badges => render_badges(f, app, chunks[2]),
    }
    render_footer(f, app, chunks[3]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.feed_status {
        FeedStatus::Connected => ("● connected".to_string(), Color::Green),
        FeedStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        FeedStatus::Reconnecting { delay_ms, error } => (
            match error {
                Some(e) => format!("✗ {} (retry {delay_ms}ms)", truncate(e, 30)),
                None => format!("◌ retry in {delay_ms}ms"),
            },
            Color::Red,
        ),
    };

    let (live_text, live_color) = match app.live() {
        Some(true) => ("LIVE", Color::Green),
        Some(false) => ("PAUSED", Color::Yellow),
        None => ("—", Color::DarkGray),
    };

    let (link_text, link_color) = match app.snapshot.as_ref().map(|s| &s.link) {
        Some(LinkStatus::Up) => ("link up".to_string(), Color::Green),
        Some(LinkStatus::Down { error }) => (format!("link down: {error}"), Color::Red),
        None => ("link —".to_string(), Color::DarkGray),
    };

    let version = app
        .snapshot
        .as_ref()
        .map_or("—".to_string(), |s| format!("v{}", s.version));

    let health = app.health.data.as_ref();
    let viewers = health.map_or("—".to_string(), |h| format!("{} viewers", h.stream_clients));
    let p99 = health
        .and_then(|h| h.advance_p99_us)
        .map_or("—".to_string(), |us| format!("p99 {us}µs"));

    let title_spans = vec![
        Span::styled(
            " Onchain Pulse  ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(live_text, Style::default().fg(live_color).add_modifier(Modifier::BOLD)),
        Span::raw("  │  "),
        Span::styled(link_text, Style::default().fg(link_color)),
        Span::raw("  │  "),
        Span::styled(version, Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(viewers, Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(p99, Style::default().fg(Color::White)),
    ];

    let paragraph = Paragraph::new(Line::from(title_spans))
        .block(Block::default().borders(Borders::ALL).border_style(
            Style::default().fg(Color::DarkGray),
        ));

    f.render_widget(paragraph, area);
}

fn render_tabs(f: &mut Frame, app: &AppState, area: Rect) {
    let titles: Vec<String> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{} {}", i + 1, t.title()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn titled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn waiting(f: &mut Frame, area: Rect, what: &str) {
    let paragraph = Paragraph::new(Span::styled(
        format!("waiting for {what}…"),
        Style::default().fg(Color::DarkGray),
    ))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    f.render_widget(paragraph, area);
}

// --- Overview ---------------------------------------------------------------

fn render_overview(f: &mut Frame, app: &AppState, area: Rect) {
    let Some(snapshot) = app.snapshot.as_ref() else {
        waiting(f, area, "first snapshot");
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    // Stat tiles
    let tile_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[0]);
    for (tile, tile_area) in snapshot.stats.iter().zip(tile_areas.iter()) {
        let color = accent_color(tile.accent);
        let lines = vec![
            Line::from(Span::styled(
                tile.value.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(tile.change.clone(), Style::default().fg(Color::Green))),
        ];
        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(format!(" {} ", tile.label)),
        );
        f.render_widget(paragraph, *tile_area);
    }

    // Leaderboard (60%) | activity (40%)
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    render_leaderboard(f, snapshot, halves[0]);
    render_activity(f, snapshot, app.clock.now_ms(), halves[1]);
}

fn render_leaderboard(f: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let header_cells = ["#", "App", "Tx/h", "New users", "Volume", "Change"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = snapshot
        .apps
        .iter()
        .map(|a| {
            let change_color = if a.change >= 20.0 {
                Color::Green
            } else if a.change >= 10.0 {
                Color::LightGreen
            } else {
                Color::Yellow
            };
            Row::new(vec![
                Cell::from(a.rank.to_string()).style(Style::default().fg(Color::DarkGray)),
                Cell::from(format!("{} {}", a.icon, truncate(&a.name, 14))),
                Cell::from(format_count(a.tx_per_hour)),
                Cell::from(format_count(a.new_users)),
                Cell::from(format_usd(a.volume)).style(Style::default().fg(Color::Cyan)),
                Cell::from(format_change(a.change)).style(Style::default().fg(change_color)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(7),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Length(7),
        ],
    )
    .header(header)
    .block(titled_block(" LEADERBOARD "));

    f.render_widget(table, area);
}

fn render_activity(f: &mut Frame, snapshot: &Snapshot, now_ms: u64, area: Rect) {
    let items: Vec<ListItem> = snapshot
        .activity
        .iter()
        .map(|e| {
            let mut spans = vec![
                Span::styled(
                    format!("{:>8} ", format_age(e.age_secs(now_ms))),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(format!("{} ", e.icon)),
                Span::styled(
                    format!("{} ", e.app),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::raw(truncate(&e.description, 26)),
            ];
            if let Some(value) = &e.value {
                spans.push(Span::styled(format!(" {value}"), Style::default().fg(Color::Cyan)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    f.render_widget(List::new(items).block(titled_block(" ACTIVITY ")), area);
}

// --- Volume -----------------------------------------------------------------

fn render_volume(f: &mut Frame, app: &AppState, area: Rect) {
    let Some(snapshot) = app.snapshot.as_ref() else {
        waiting(f, area, "first snapshot");
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(6)])
        .split(area);

    let totals: Vec<u64> = snapshot.volume.iter().map(|s| s.total).collect();
    let sparkline = Sparkline::default()
        .block(titled_block(" 24H VOLUME "))
        .data(&totals)
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(sparkline, rows[0]);

    let peak = snapshot.volume.iter().max_by_key(|s| s.total);
    let latest = snapshot.volume.last();
    let mut lines = vec![Line::from(vec![
        Span::styled("Total  ", Style::default().fg(Color::Yellow)),
        Span::styled(
            format_usd(snapshot.total_volume),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ])];
    if let Some(p) = peak {
        lines.push(Line::from(vec![
            Span::styled("Peak   ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{} at {}", format_usd(p.total), p.hour)),
        ]));
    }
    if let Some(l) = latest {
        lines.push(Line::from(vec![
            Span::styled("Latest ", Style::default().fg(Color::Yellow)),
            Span::raw(format!(
                "{}  RevU {}  Noice {}  Farville {}",
                format_usd(l.total),
                format_usd(l.rev_u),
                format_usd(l.noice),
                format_usd(l.farville),
            )),
        ]));
    }
    let top: Vec<String> = rank_by_volume(&snapshot.apps)
        .iter()
        .take(3)
        .map(|a| format!("{} {}", a.name, format_usd(a.volume)))
        .collect();
    lines.push(Line::from(vec![
        Span::styled("Top    ", Style::default().fg(Color::Yellow)),
        Span::raw(top.join("  ·  ")),
    ]));
    f.render_widget(Paragraph::new(lines).block(titled_block(" SUMMARY ")), rows[1]);
}

// --- Badges -----------------------------------------------------------------

fn render_badges(f: &mut Frame, app: &AppState, area: Rect) {
    let Some(badges) = app.badges.as_ref() else {
        match &app.badges_error {
            Some(e) => {
                let paragraph = Paragraph::new(Span::styled(
                    format!("badges unavailable: {e}"),
                    Style::default().fg(Color::Red),
                ))
                .block(titled_block(" BADGES "));
                f.render_widget(paragraph, area);
            }
            None => waiting(f, area, "badges"),
        }
        return;
    };

    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let source = if app.badges_from_cache { "cached" } else { "fresh" };
    render_badge_table(f, &badges.earned(), &format!(" EARNED ({source}) "), halves[0]);
    render_badge_table(f, &badges.in_progress(), " IN PROGRESS ", halves[1]);
}

fn render_badge_table(f: &mut Frame, badges: &[&Badge], title: &str, area: Rect) {
    let rows: Vec<Row> = badges
        .iter()
        .map(|b| {
            Row::new(vec![
                Cell::from(b.icon.clone()),
                Cell::from(b.title.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(b.tier.to_string()).style(Style::default().fg(tier_color(b.tier))),
                Cell::from(format!("{} {:>3}%", progress_bar(b.progress, 10), b.progress)),
                Cell::from(truncate(&b.description, 48)).style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(18),
            Constraint::Length(9),
            Constraint::Length(16),
            Constraint::Min(10),
        ],
    )
    .block(titled_block(title));

    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let mut spans = vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[tab/1-3] ", Style::default().fg(Color::Yellow)),
        Span::raw("switch  "),
        Span::styled("[p] ", Style::default().fg(Color::Yellow)),
        Span::raw("pause/resume  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("reconnect  "),
    ];
    if let Some(notice) = &app.notice {
        spans.push(Span::styled(notice.clone(), Style::default().fg(Color::DarkGray)));
    }
    if let Some(e) = &app.health.error {
        spans.push(Span::styled(
            format!("  health: {}", truncate(e, 40)),
            Style::default().fg(Color::Red),
        ));
    }
    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn accent_color(accent: Accent) -> Color {
    match accent {
        Accent::Cyan => Color::Cyan,
        Accent::Purple => Color::Magenta,
        Accent::Emerald => Color::Green,
        Accent::Orange => Color::LightRed,
    }
}

fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::Bronze => Color::LightRed,
        Tier::Silver => Color::Gray,
        Tier::Gold => Color::Yellow,
        Tier::Platinum => Color::Cyan,
    }
}
