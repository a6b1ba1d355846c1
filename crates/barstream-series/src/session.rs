//! Single-writer session driving one coordinator from a command channel.

use std::time::Duration;

use barstream_ingest::RawObservation;
use barstream_resolutions::{ResolutionRegistry, ResolutionSpec};
use barstream_transform::BrickSizing;
use barstream_types::{BarstreamError, DEFAULT_LOOKBACK, DisplayMode, HistoryRequest, Resolution};
use chrono::{DateTime, TimeDelta, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::coordinator::{
    DisplayDelta, DisplaySeries, SeriesConfig, SeriesCoordinator, validate_brick_sizing,
};
use crate::source::{HistorySource, LiveFeed};

/// Default bound on a historical fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a [`SeriesSession`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Per-series settings.
    pub series: SeriesConfig,
    /// History window length ending now.
    pub lookback: TimeDelta,
    /// Upper bound on a historical fetch.
    pub fetch_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            series: SeriesConfig::default(),
            lookback: DEFAULT_LOOKBACK,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Sets the per-series settings.
    #[must_use]
    pub const fn with_series(mut self, series: SeriesConfig) -> Self {
        self.series = series;
        self
    }

    /// Sets the fetch timeout.
    #[must_use]
    pub const fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

/// An event processed by the session, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesCommand {
    /// A live push tagged with the resolution it belongs to.
    Live {
        /// Resolution the push was produced for.
        resolution: Resolution,
        /// The raw payload.
        observation: RawObservation,
    },
    /// Switch to a resolution identifier.
    ChangeResolution(String),
    /// Switch display mode.
    ChangeDisplayMode(DisplayMode),
    /// Change Renko sizing.
    ChangeBrickSize(BrickSizing),
}

/// Feed health reported to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FeedStatus {
    /// A historical load is in flight.
    Loading {
        /// Resolution being loaded.
        resolution: Resolution,
    },
    /// History loaded and live pushes subscribed.
    Ready {
        /// Active resolution.
        resolution: Resolution,
        /// Raw bars loaded.
        bars: usize,
    },
    /// History could not be fetched or was empty.
    NoData {
        /// Active resolution.
        resolution: Resolution,
    },
    /// The live subscription failed.
    Disconnected {
        /// Active resolution.
        resolution: Resolution,
    },
    /// The requested resolution has no table entry.
    Unconfigured {
        /// The rejected identifier.
        id: String,
    },
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading { resolution } => write!(f, "loading {resolution}"),
            Self::Ready { resolution, bars } => write!(f, "ready: {bars} bars at {resolution}"),
            Self::NoData { resolution } => write!(f, "no data for {resolution}"),
            Self::Disconnected { resolution } => write!(f, "live feed disconnected for {resolution}"),
            Self::Unconfigured { id } => write!(f, "unconfigured resolution {id}"),
        }
    }
}

/// Output of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesEvent {
    /// Replace the displayed series.
    Replace(DisplaySeries),
    /// Apply an incremental change.
    Delta(DisplayDelta),
    /// Feed status changed.
    Status(FeedStatus),
}

/// Owns one [`SeriesCoordinator`] and applies commands strictly in order.
///
/// Suspension only happens inside collaborator calls, so no command is
/// ever interleaved with another against the same series state.
#[derive(Debug)]
pub struct SeriesSession<'a, H, L> {
    registry: &'a ResolutionRegistry,
    history: H,
    live: L,
    config: SessionConfig,
    events: mpsc::Sender<SeriesEvent>,
    active: Option<ResolutionSpec>,
    coordinator: Option<SeriesCoordinator>,
    clock: fn() -> DateTime<Utc>,
}

impl<'a, H, L> SeriesSession<'a, H, L>
where
    H: HistorySource,
    L: LiveFeed,
{
    /// Creates an idle session; nothing is loaded until a resolution is chosen.
    pub fn new(
        registry: &'a ResolutionRegistry,
        history: H,
        live: L,
        config: SessionConfig,
        events: mpsc::Sender<SeriesEvent>,
    ) -> Self {
        Self {
            registry,
            history,
            live,
            config,
            events,
            active: None,
            coordinator: None,
            clock: Utc::now,
        }
    }

    /// Overrides the clock used to end history windows.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the active table entry.
    #[must_use]
    pub const fn active(&self) -> Option<&ResolutionSpec> {
        self.active.as_ref()
    }

    /// Returns the coordinator for the active resolution.
    #[must_use]
    pub const fn coordinator(&self) -> Option<&SeriesCoordinator> {
        self.coordinator.as_ref()
    }

    /// Returns the live feed.
    #[must_use]
    pub const fn live_feed(&self) -> &L {
        &self.live
    }

    /// Processes commands until the channel closes, then unsubscribes.
    ///
    /// # Errors
    ///
    /// Returns [`BarstreamError::Disconnected`] if the event receiver is dropped.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SeriesCommand>,
    ) -> Result<(), BarstreamError> {
        while let Some(command) = commands.recv().await {
            self.handle(command).await?;
        }
        self.shutdown().await;
        Ok(())
    }

    /// Processes every command from a stream in order.
    ///
    /// # Errors
    ///
    /// Returns [`BarstreamError::Disconnected`] if the event receiver is dropped.
    pub async fn drive<S>(&mut self, commands: S) -> Result<(), BarstreamError>
    where
        S: Stream<Item = SeriesCommand>,
    {
        let mut commands = std::pin::pin!(commands);
        while let Some(command) = commands.next().await {
            self.handle(command).await?;
        }
        Ok(())
    }

    /// Unsubscribes from the active resolution.
    pub async fn shutdown(&mut self) {
        if let Some(active) = self.active.take()
            && let Err(err) = self
                .live
                .unsubscribe(active.symbol(), active.resolution())
                .await
        {
            warn!(error = %err, "unsubscribe on shutdown failed");
        }
    }

    /// Processes one command.
    ///
    /// # Errors
    ///
    /// Returns [`BarstreamError::Disconnected`] if the event receiver is dropped.
    /// Per-observation and collaborator failures are reported as events.
    pub async fn handle(&mut self, command: SeriesCommand) -> Result<(), BarstreamError> {
        match command {
            SeriesCommand::Live {
                resolution,
                observation,
            } => self.on_live(resolution, &observation).await,
            SeriesCommand::ChangeResolution(id) => self.change_resolution(&id).await,
            SeriesCommand::ChangeDisplayMode(mode) => {
                self.config.series.display_mode = mode;
                match self.coordinator.as_mut() {
                    Some(coordinator) => {
                        let series = coordinator.set_display_mode(mode);
                        self.emit(SeriesEvent::Replace(series)).await
                    }
                    None => Ok(()),
                }
            }
            SeriesCommand::ChangeBrickSize(sizing) => self.change_brick_size(sizing).await,
        }
    }

    async fn emit(&self, event: SeriesEvent) -> Result<(), BarstreamError> {
        self.events
            .send(event)
            .await
            .map_err(|_| BarstreamError::Disconnected("event receiver dropped".to_string()))
    }

    async fn status(&self, status: FeedStatus) -> Result<(), BarstreamError> {
        self.emit(SeriesEvent::Status(status)).await
    }

    async fn on_live(
        &mut self,
        resolution: Resolution,
        observation: &RawObservation,
    ) -> Result<(), BarstreamError> {
        let Some(coordinator) = self.coordinator.as_mut() else {
            debug!(%resolution, "push before any resolution was loaded");
            return Ok(());
        };
        if coordinator.resolution() != resolution {
            debug!(%resolution, active = %coordinator.resolution(), "push for inactive resolution");
            return Ok(());
        }
        // Rejections are logged by the coordinator and leave state untouched.
        match coordinator.apply_live_observation(observation) {
            Ok(DisplayDelta::Unchanged) | Err(_) => Ok(()),
            Ok(delta) => self.emit(SeriesEvent::Delta(delta)).await,
        }
    }

    async fn change_brick_size(&mut self, sizing: BrickSizing) -> Result<(), BarstreamError> {
        let sizing = match validate_brick_sizing(sizing) {
            Ok(sizing) => sizing,
            Err(err) => {
                warn!(error = %err, "brick size rejected");
                return Ok(());
            }
        };
        self.config.series.renko.sizing = sizing;
        let Some(coordinator) = self.coordinator.as_mut() else {
            return Ok(());
        };
        match coordinator.set_brick_sizing(sizing) {
            Ok(Some(series)) => self.emit(SeriesEvent::Replace(series)).await,
            Ok(None) => Ok(()),
            Err(err) => {
                warn!(error = %err, "brick size rejected");
                Ok(())
            }
        }
    }

    async fn change_resolution(&mut self, id: &str) -> Result<(), BarstreamError> {
        let spec = match self.registry.get(id) {
            Ok(spec) => spec.clone(),
            Err(err) => {
                warn!(error = %err, "resolution change rejected");
                return self
                    .status(FeedStatus::Unconfigured { id: id.to_string() })
                    .await;
            }
        };
        let resolution = spec.resolution();
        info!(%resolution, symbol = spec.symbol(), "loading resolution");
        self.status(FeedStatus::Loading { resolution }).await?;

        if let Some(previous) = self.active.take()
            && let Err(err) = self
                .live
                .unsubscribe(previous.symbol(), previous.resolution())
                .await
        {
            warn!(error = %err, resolution = %previous.resolution(), "unsubscribe failed");
        }

        match self.coordinator.as_mut() {
            Some(coordinator) => coordinator.change_resolution(resolution),
            None => {
                self.coordinator = Some(SeriesCoordinator::new(resolution, self.config.series));
            }
        }
        self.active = Some(spec.clone());

        let bars = match self.fetch_history(&spec).await {
            Ok(raw) => {
                let Some(coordinator) = self.coordinator.as_mut() else {
                    return Ok(());
                };
                let series = coordinator.apply_historical_batch(&raw);
                let bars = coordinator.history().len();
                self.emit(SeriesEvent::Replace(series)).await?;
                bars
            }
            Err(err) => {
                warn!(error = %err, %resolution, "historical load failed");
                0
            }
        };

        if let Err(err) = self.live.subscribe(spec.symbol(), resolution).await {
            warn!(error = %err, %resolution, "subscribe failed");
            return self.status(FeedStatus::Disconnected { resolution }).await;
        }

        let status = if bars == 0 {
            FeedStatus::NoData { resolution }
        } else {
            FeedStatus::Ready { resolution, bars }
        };
        self.status(status).await
    }

    async fn fetch_history(
        &self,
        spec: &ResolutionSpec,
    ) -> Result<Vec<RawObservation>, BarstreamError> {
        let request = HistoryRequest::lookback(
            spec.symbol(),
            spec.resolution(),
            spec.history_depth(),
            (self.clock)(),
            self.config.lookback,
        )?;
        debug!(%request, "fetching history");

        tokio::time::timeout(self.config.fetch_timeout, self.history.fetch(&request))
            .await
            .map_err(|_| {
                BarstreamError::HistoryUnavailable(format!(
                    "timed out after {:?}",
                    self.config.fetch_timeout
                ))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FeedCall, RecordingFeed, StaticHistory};
    use async_trait::async_trait;

    const T0: i64 = 1_700_000_000;

    fn minute_bars(n: i64) -> Vec<RawObservation> {
        (0..n)
            .map(|i| {
                let p = 100.0 + i as f64;
                RawObservation::ohlc(T0 + 60 * i, p, p + 1.0, p - 1.0, p)
            })
            .collect()
    }

    fn session(
        history: StaticHistory,
        events: mpsc::Sender<SeriesEvent>,
    ) -> SeriesSession<'static, StaticHistory, RecordingFeed> {
        SeriesSession::new(
            ResolutionRegistry::global(),
            history,
            RecordingFeed::new(),
            SessionConfig::default(),
            events,
        )
    }

    fn drain(rx: &mut mpsc::Receiver<SeriesEvent>) -> Vec<SeriesEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_resolution_load_and_subscribe() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut session = session(StaticHistory::new(minute_bars(3)), tx);

        session
            .handle(SeriesCommand::ChangeResolution("1".into()))
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(
            events.first(),
            Some(&SeriesEvent::Status(FeedStatus::Loading {
                resolution: Resolution::Minutes(1)
            }))
        );
        assert!(matches!(&events[1], SeriesEvent::Replace(series) if series.len() == 3));
        assert_eq!(
            events.last(),
            Some(&SeriesEvent::Status(FeedStatus::Ready {
                resolution: Resolution::Minutes(1),
                bars: 3
            }))
        );
        assert_eq!(
            session.live_feed().calls(),
            vec![FeedCall::Subscribe("F.US.MNQ".into(), Resolution::Minutes(1))]
        );
    }

    #[tokio::test]
    async fn test_unconfigured_resolution_changes_nothing() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut session = session(StaticHistory::new(minute_bars(3)), tx);
        session
            .handle(SeriesCommand::ChangeResolution("1".into()))
            .await
            .unwrap();
        drain(&mut rx);

        session
            .handle(SeriesCommand::ChangeResolution("7T".into()))
            .await
            .unwrap();
        assert_eq!(
            drain(&mut rx),
            vec![SeriesEvent::Status(FeedStatus::Unconfigured { id: "7T".into() })]
        );
        assert_eq!(session.coordinator().unwrap().history().len(), 3);
        assert_eq!(session.active().unwrap().resolution(), Resolution::Minutes(1));
    }

    #[tokio::test]
    async fn test_push_for_other_resolution_dropped() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut session = session(StaticHistory::new(minute_bars(3)), tx);
        session
            .handle(SeriesCommand::ChangeResolution("1".into()))
            .await
            .unwrap();
        drain(&mut rx);

        let observation = RawObservation::ohlc(T0 + 180, 1.0, 1.0, 1.0, 1.0);
        session
            .handle(SeriesCommand::Live {
                resolution: Resolution::Minutes(5),
                observation: observation.clone(),
            })
            .await
            .unwrap();
        assert!(drain(&mut rx).is_empty());

        session
            .handle(SeriesCommand::Live {
                resolution: Resolution::Minutes(1),
                observation,
            })
            .await
            .unwrap();
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [SeriesEvent::Delta(DisplayDelta::Upsert(_))]
        ));
    }

    struct FailingHistory;

    #[async_trait]
    impl HistorySource for FailingHistory {
        async fn fetch(&self, _: &HistoryRequest) -> Result<Vec<RawObservation>, BarstreamError> {
            Err(BarstreamError::HistoryUnavailable("offline".into()))
        }
    }

    struct SlowHistory;

    #[async_trait]
    impl HistorySource for SlowHistory {
        async fn fetch(&self, _: &HistoryRequest) -> Result<Vec<RawObservation>, BarstreamError> {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            Ok(Vec::new())
        }
    }

    struct RefusingFeed;

    #[async_trait]
    impl LiveFeed for RefusingFeed {
        async fn subscribe(&self, _: &str, _: Resolution) -> Result<(), BarstreamError> {
            Err(BarstreamError::Disconnected("refused".into()))
        }

        async fn unsubscribe(&self, _: &str, _: Resolution) -> Result<(), BarstreamError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_reports_no_data() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut session = SeriesSession::new(
            ResolutionRegistry::global(),
            FailingHistory,
            RecordingFeed::new(),
            SessionConfig::default(),
            tx,
        );
        session
            .handle(SeriesCommand::ChangeResolution("500T".into()))
            .await
            .unwrap();
        assert_eq!(
            drain(&mut rx).last(),
            Some(&SeriesEvent::Status(FeedStatus::NoData {
                resolution: Resolution::Ticks(500)
            }))
        );
        assert!(session.coordinator().unwrap().history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_reports_no_data() {
        let (tx, mut rx) = mpsc::channel(64);
        let config = SessionConfig::default().with_fetch_timeout(Duration::from_millis(50));
        let mut session = SeriesSession::new(
            ResolutionRegistry::global(),
            SlowHistory,
            RecordingFeed::new(),
            config,
            tx,
        );
        session
            .handle(SeriesCommand::ChangeResolution("15".into()))
            .await
            .unwrap();
        assert!(matches!(
            drain(&mut rx).last(),
            Some(SeriesEvent::Status(FeedStatus::NoData { .. }))
        ));
    }

    #[tokio::test]
    async fn test_subscribe_failure_reports_disconnected() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut session = SeriesSession::new(
            ResolutionRegistry::global(),
            StaticHistory::new(minute_bars(2)),
            RefusingFeed,
            SessionConfig::default(),
            tx,
        );
        session
            .handle(SeriesCommand::ChangeResolution("1".into()))
            .await
            .unwrap();
        assert_eq!(
            drain(&mut rx).last(),
            Some(&SeriesEvent::Status(FeedStatus::Disconnected {
                resolution: Resolution::Minutes(1)
            }))
        );
        assert_eq!(session.coordinator().unwrap().history().len(), 2);
    }

    #[tokio::test]
    async fn test_switch_unsubscribes_previous() {
        let (tx, _rx) = mpsc::channel(64);
        let mut session = session(StaticHistory::new(minute_bars(2)), tx);
        session
            .drive(futures::stream::iter([
                SeriesCommand::ChangeResolution("1".into()),
                SeriesCommand::ChangeResolution("5".into()),
            ]))
            .await
            .unwrap();
        assert_eq!(
            session.live_feed().calls(),
            vec![
                FeedCall::Subscribe("F.US.MNQ".into(), Resolution::Minutes(1)),
                FeedCall::Unsubscribe("F.US.MNQ".into(), Resolution::Minutes(1)),
                FeedCall::Subscribe("F.US.MNQ".into(), Resolution::Minutes(5)),
            ]
        );
    }

    #[tokio::test]
    async fn test_display_mode_and_brick_size_commands() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut session = session(StaticHistory::new(minute_bars(5)), tx);
        session
            .handle(SeriesCommand::ChangeResolution("1".into()))
            .await
            .unwrap();
        drain(&mut rx);

        session
            .handle(SeriesCommand::ChangeDisplayMode(DisplayMode::Renko))
            .await
            .unwrap();
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [SeriesEvent::Replace(DisplaySeries::Renko(bricks))] if bricks.is_empty()
        ));

        session
            .handle(SeriesCommand::ChangeBrickSize(BrickSizing::Fixed(2_000.0)))
            .await
            .unwrap();
        assert!(drain(&mut rx).is_empty());

        session
            .handle(SeriesCommand::ChangeBrickSize(BrickSizing::Fixed(1.0)))
            .await
            .unwrap();
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [SeriesEvent::Replace(DisplaySeries::Renko(bricks))] if bricks.len() == 4
        ));
    }

    #[tokio::test]
    async fn test_run_drains_commands_until_close() {
        let (event_tx, mut event_rx) = mpsc::channel(64);
        let (command_tx, command_rx) = mpsc::channel(8);
        let session = session(StaticHistory::new(minute_bars(1)), event_tx);

        command_tx
            .send(SeriesCommand::ChangeResolution("1D".into()))
            .await
            .unwrap();
        drop(command_tx);
        session.run(command_rx).await.unwrap();

        let events = drain(&mut event_rx);
        assert!(events.contains(&SeriesEvent::Status(FeedStatus::Ready {
            resolution: Resolution::Days(1),
            bars: 1
        })));
    }
}
