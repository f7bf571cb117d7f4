mod render;

use std::sync::Arc;

use smart_nest_common::feed::{
    time_labels, AcquisitionLoop, Clock, DisplayState, DummyFeedClient, FeedClientPointer,
    LocalClock, ThingSpeakFeedClient,
};
use smart_nest_common::{DashboardConfig, ValueStore};
use tokio::sync::mpsc;

/// A line typed on the dashboard's standard input.
#[derive(Clone, Debug, PartialEq)]
enum Command {
    Refresh,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" | "r" | "refresh" => Command::Refresh,
            "q" | "quit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Reads commands on a thread of its own, so a pending read never holds up shutdown.
/// The channel closes when standard input does.
fn spawn_command_reader() -> mpsc::UnboundedReceiver<Command> {
    let (sender, receiver) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        use std::io::BufRead;

        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if sender.send(Command::parse(&line)).is_err() {
                break;
            }
        }
    });

    receiver
}

/// Our App struct that holds the display state and the acquisition loop feeding it.
///
/// The loop refreshes the display state on a timer, and a refresh can also be requested
/// from standard input. Every new display state is rendered to standard output.
struct App {
    store: ValueStore<DisplayState>,
    acquisition: AcquisitionLoop,
}

impl App {
    /// Create a new App struct.
    ///
    /// If a feed channel is configured, the live feed is polled, otherwise the bundled recording
    /// is shown.
    fn new() -> anyhow::Result<Self> {
        let config = DashboardConfig::load()?;
        log::debug!("Configuration: {config:?}");

        let client: FeedClientPointer = match &config.feed.channel_id {
            Some(channel_id) => {
                log::info!("Polling feed of channel {channel_id} at {}", config.feed.base_url);
                Arc::new(ThingSpeakFeedClient::new(&config.feed, channel_id)?)
            }
            None => {
                log::info!("No feed channel configured, showing the bundled recording");
                Arc::new(DummyFeedClient::new()?)
            }
        };

        // Show placeholder values until the first cycle succeeds.
        let store = ValueStore::new(DisplayState::placeholder(time_labels(&LocalClock.now())));
        let acquisition = AcquisitionLoop::new(client, store.clone(), config.refresh_interval());

        Ok(Self { store, acquisition })
    }

    /// Run the App until asked to quit.
    async fn run(&mut self) -> anyhow::Result<()> {
        let mut states = self.store.subscribe();
        let mut commands = spawn_command_reader();

        println!("{}\n", render::render(&states.borrow_and_update()));

        self.acquisition.start();
        let _ = self.acquisition.refresh();

        loop {
            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = states.borrow_and_update().clone();
                    println!("{}\n", render::render(&state));
                }
                command = commands.recv() => match command {
                    Some(Command::Refresh) => {
                        log::info!("Manual refresh");
                        let _ = self.acquisition.refresh();
                    }
                    Some(Command::Quit) | None => break,
                    Some(Command::Unknown(command)) => {
                        log::warn!("Unknown command {command:?}, use r to refresh or q to quit");
                    }
                },
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        self.acquisition.stop().await;
        log::info!("Cycles: {:?}", self.acquisition.stats());

        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut app = App::new()?;

    app.run().await
}

#[test]
fn test_command_parse() {
    assert_eq!(Command::parse(""), Command::Refresh);
    assert_eq!(Command::parse(" r \n"), Command::Refresh);
    assert_eq!(Command::parse("q"), Command::Quit);
    assert_eq!(Command::parse("fan on"), Command::Unknown("fan on".into()));
}
