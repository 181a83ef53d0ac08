//! Health-check web server and keep-alive pinger.
//!
//! Hosting platforms put idle services to sleep; the pinger requests the public
//! URL on a fixed period so the process keeps running. Neither task shares state
//! with the scheduler beyond reading its status.
use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{extract::State, http::StatusCode, response::Html, routing::get, Json, Router};
use chrono_tz::Tz;
use log::{error, info};
use serde::Serialize;

use crate::{Clock, Result, SharedSchedulerStatus};

#[derive(Clone)]
pub struct WebState {
    pub clock: Arc<dyn Clock>,
    pub timezone: Tz,
    pub check_interval: Duration,
    pub scheduler: SharedSchedulerStatus,
}

/// Body of `GET /status`
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub time: String,
    pub timezone: String,
    pub check_interval_secs: u64,
    pub scheduler_running: bool,
    pub ticks: u64,
}

impl StatusReport {
    fn collect(state: &WebState) -> Self {
        let (scheduler_running, ticks) = state
            .scheduler
            .lock()
            .map(|status| (status.is_running, status.ticks))
            .unwrap_or((false, 0));
        Self {
            time: state.clock.now().format("%Y-%m-%d %H:%M:%S").to_string(),
            timezone: state.timezone.name().to_string(),
            check_interval_secs: state.check_interval.as_secs(),
            scheduler_running,
            ticks,
        }
    }
}

async fn home(State(state): State<WebState>) -> Html<String> {
    let report = StatusReport::collect(&state);
    Html(format!(
        "<h1>🤖 Telegram Bot Active</h1>\n\
         <p><strong>Статус:</strong> ✅ Работает нормально</p>\n\
         <p><strong>Время сервера:</strong> {}</p>\n\
         <p><strong>Часовой пояс:</strong> {}</p>\n\
         <p><strong>Проверка:</strong> каждые {} минут</p>",
        report.time,
        report.timezone,
        report.check_interval_secs / 60
    ))
}

async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

async fn status(State(state): State<WebState>) -> Json<StatusReport> {
    Json(StatusReport::collect(&state))
}

pub fn router(state: WebState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/status", get(status))
        .with_state(state)
}

/// Serves the health endpoints on all interfaces until the process exits
pub async fn serve(port: u16, state: WebState) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Web server listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Requests `url` every `period`, logging the outcome. Never returns.
pub async fn keep_alive(url: String, period: Duration) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    info!("Keep-alive pinger started for {}", url);

    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        match client.get(&url).send().await {
            Ok(response) => info!("Keep-alive ping sent, status {}", response.status()),
            Err(e) => error!("Keep-alive ping failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, SchedulerStatus};
    use chrono::TimeZone;
    use chrono_tz::Asia::Yekaterinburg;
    use std::sync::Mutex;

    fn state() -> WebState {
        let now = Yekaterinburg.with_ymd_and_hms(2024, 5, 10, 9, 30, 0).unwrap();
        WebState {
            clock: Arc::new(ManualClock::new(now)),
            timezone: Yekaterinburg,
            check_interval: Duration::from_secs(300),
            scheduler: Arc::new(Mutex::new(SchedulerStatus {
                is_running: true,
                ticks: 3,
                ..Default::default()
            })),
        }
    }

    #[test]
    fn status_report_serializes_scheduler_state() {
        let value = serde_json::to_value(StatusReport::collect(&state())).unwrap();
        assert_eq!(value["time"], "2024-05-10 09:30:00");
        assert_eq!(value["timezone"], "Asia/Yekaterinburg");
        assert_eq!(value["check_interval_secs"], 300);
        assert_eq!(value["scheduler_running"], true);
        assert_eq!(value["ticks"], 3);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (code, body) = health().await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn home_page_shows_local_time() {
        let Html(page) = home(State(state())).await;
        assert!(page.contains("2024-05-10 09:30:00"));
        assert!(page.contains("каждые 5 минут"));
    }
}
