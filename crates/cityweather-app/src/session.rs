//! Weather screen state.
//! Fetches run on the tokio runtime; results come back over an mpsc channel
//! and only `WeatherSession::apply` touches state.

use std::sync::Arc;

use cityweather_core::{AppError, InputError};
use cityweather_weather::display::{format_temperature, share_text};
use cityweather_weather::{
    validate_city_input, CurrentConditions, FetchError, Forecast, ForecastWindow, WeatherReport,
    WeatherSource,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No tokio runtime available")]
    NoRuntime,
    #[error("Session is closed")]
    Closed,
    #[error(transparent)]
    Input(#[from] InputError),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Input(e) => AppError::Input(e),
            other => AppError::Other(anyhow::anyhow!(other)),
        }
    }
}

/// Messages sent from fetch tasks back to the session owner
#[derive(Debug)]
pub enum SessionMessage {
    FetchDone {
        generation: u64,
        city: String,
        result: Result<WeatherReport, FetchError>,
    },
}

/// What `apply` did with a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// New report is now displayed
    Updated,
    /// Latest fetch failed; previous report (if any) stays, `last_error` is set
    Failed,
    /// Result of a superseded request, ignored
    Stale,
    /// Session was closed before the result arrived
    Closed,
}

/// Receiving half of a session's channel
#[derive(Debug)]
pub struct SessionInbox {
    rx: mpsc::UnboundedReceiver<SessionMessage>,
}

impl SessionInbox {
    pub async fn recv(&mut self) -> Option<SessionMessage> {
        self.rx.recv().await
    }
}

pub struct WeatherSession {
    source: Arc<dyn WeatherSource>,
    runtime: Handle,
    tx: mpsc::UnboundedSender<SessionMessage>,
    cancel: CancellationToken,
    generation: u64,
    pending: Option<u64>,
    closed: bool,
    report: Option<WeatherReport>,
    window: ForecastWindow,
    last_error: Option<AppError>,
}

impl std::fmt::Debug for WeatherSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherSession")
            .field("generation", &self.generation)
            .field("pending", &self.pending)
            .field("closed", &self.closed)
            .field("city", &self.city())
            .field("window", &self.window)
            .finish()
    }
}

impl WeatherSession {
    /// Create a session on the current tokio runtime
    pub fn new(
        source: Arc<dyn WeatherSource>,
        window: ForecastWindow,
    ) -> Result<(Self, SessionInbox), SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        Ok(Self::with_runtime(source, window, runtime))
    }

    pub fn with_runtime(
        source: Arc<dyn WeatherSource>,
        window: ForecastWindow,
        runtime: Handle,
    ) -> (Self, SessionInbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            source,
            runtime,
            tx,
            cancel: CancellationToken::new(),
            generation: 0,
            pending: None,
            closed: false,
            report: None,
            window,
            last_error: None,
        };
        (session, SessionInbox { rx })
    }

    /// Validate typed input, then fetch. Blank input issues no request.
    pub fn submit_city(&mut self, input: &str) -> Result<u64, SessionError> {
        let city = validate_city_input(input)?;
        self.request_fetch(&city)
    }

    /// Start fetching `city` in the background. Returns the request's generation.
    ///
    /// Any earlier request still in flight is superseded: its result will be
    /// dropped as stale when it arrives.
    pub fn request_fetch(&mut self, city: &str) -> Result<u64, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }

        self.generation += 1;
        let generation = self.generation;
        self.pending = Some(generation);

        let source = self.source.clone();
        let tx = self.tx.clone();
        let token = self.cancel.clone();
        let city = city.to_string();

        tracing::debug!("Requesting weather for {} (generation {})", city, generation);

        self.runtime.spawn(async move {
            let fetch_city = city.clone();
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Fetch for {} cancelled (generation {})", city, generation);
                }
                result = source.fetch(&fetch_city) => {
                    let msg = SessionMessage::FetchDone { generation, city, result };
                    if tx.send(msg).is_err() {
                        tracing::debug!("Session gone, dropping fetch result");
                    }
                }
            }
        });

        Ok(generation)
    }

    /// Apply one message. The only place report state changes.
    pub fn apply(&mut self, msg: SessionMessage) -> ApplyOutcome {
        if self.closed {
            tracing::debug!("Ignoring message for closed session");
            return ApplyOutcome::Closed;
        }

        match msg {
            SessionMessage::FetchDone {
                generation,
                city,
                result,
            } => {
                if generation != self.generation {
                    tracing::debug!(
                        "Dropping stale result for {} (generation {}, latest {})",
                        city,
                        generation,
                        self.generation
                    );
                    return ApplyOutcome::Stale;
                }

                self.pending = None;
                match result {
                    Ok(report) => {
                        tracing::info!("Showing weather for {}", city);
                        self.report = Some(report);
                        self.last_error = None;
                        ApplyOutcome::Updated
                    }
                    Err(e) => {
                        tracing::warn!("Weather fetch for {} failed: {}", city, e);
                        self.last_error = Some(e.into());
                        ApplyOutcome::Failed
                    }
                }
            }
        }
    }

    /// Apply messages until the latest request is answered.
    ///
    /// Returns `None` when nothing is pending or the channel closed.
    pub async fn settle(&mut self, inbox: &mut SessionInbox) -> Option<ApplyOutcome> {
        while self.is_loading() {
            let msg = inbox.recv().await?;
            match self.apply(msg) {
                ApplyOutcome::Stale => continue,
                outcome => return Some(outcome),
            }
        }
        None
    }

    pub fn select_window(&mut self, window: ForecastWindow) {
        self.window = window;
    }

    pub fn window(&self) -> ForecastWindow {
        self.window
    }

    /// Forecast rows for the selected window
    pub fn visible(&self) -> &[Forecast] {
        self.report
            .as_ref()
            .map(|r| self.window.project(&r.days))
            .unwrap_or(&[])
    }

    pub fn all_days(&self) -> &[Forecast] {
        self.report.as_ref().map(|r| r.days.as_slice()).unwrap_or(&[])
    }

    pub fn current(&self) -> Option<&CurrentConditions> {
        self.report.as_ref().and_then(|r| r.current.as_ref())
    }

    /// City of the report on display
    pub fn city(&self) -> Option<&str> {
        self.report.as_ref().map(|r| r.city.as_str())
    }

    pub fn report(&self) -> Option<&WeatherReport> {
        self.report.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Error from the latest completed request, cleared by the next success
    pub fn last_error(&self) -> Option<&AppError> {
        self.last_error.as_ref()
    }

    /// True if a failed refresh left an older report on display
    pub fn is_stale(&self) -> bool {
        self.report.is_some() && self.last_error.is_some()
    }

    /// One-line summary for sharing; needs current conditions
    pub fn share_text(&self) -> Option<String> {
        let report = self.report.as_ref()?;
        let current = report.current.as_ref()?;
        Some(share_text(&report.city, &format_temperature(current.temperature)))
    }

    /// Cancel in-flight fetches and stop accepting results
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.pending = None;
            self.cancel.cancel();
            tracing::debug!("Weather session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for WeatherSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
