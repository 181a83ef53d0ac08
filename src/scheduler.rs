// src/scheduler.rs - Notification scheduler module
use std::sync::{Arc, Mutex};

use chrono::DateTime;
use chrono_tz::Tz;
use log::{debug, error, info};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::{
    content, deliver_all, is_due, BotError, BotStorage, BroadcastKind, Clock, DeliveryReport,
    Notifier, Result, TickReport, TimeOfDay,
};

#[derive(Debug, Clone, Default)]
pub struct SchedulerStatus {
    /// Whether the scheduler loop is running
    pub is_running: bool,
    /// Number of ticks evaluated since start, failed ones included
    pub ticks: u64,
    /// Clock reading of the most recent tick
    pub last_tick_time: Option<DateTime<Tz>>,
    /// Report of the most recent successful tick
    pub last_report: Option<TickReport>,
}

/// Status shared between the loop and its observers
pub type SharedSchedulerStatus = Arc<Mutex<SchedulerStatus>>;

#[derive(Debug)]
pub enum SchedulerCommand {
    /// Evaluate a tick immediately and acknowledge when it is done
    TickNow(oneshot::Sender<()>),
    /// Stop the scheduler loop
    Stop,
}

/// Evaluates one tick: both daily broadcasts, then every user's reminders.
#[derive(Clone)]
pub struct TickRunner {
    storage: BotStorage,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    tolerance_minutes: u32,
}

impl TickRunner {
    pub fn new(
        storage: BotStorage,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        tolerance_minutes: u32,
    ) -> Self {
        Self {
            storage,
            notifier,
            clock,
            tolerance_minutes,
        }
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.clock.now()
    }

    /// Runs a tick against the current clock reading
    pub async fn tick(&self) -> Result<TickReport> {
        self.tick_at(self.clock.now()).await
    }

    pub async fn tick_at(&self, now: DateTime<Tz>) -> Result<TickReport> {
        debug!("Checking time: {}", now.format("%H:%M:%S"));
        let schedule = self.storage.schedule.current()?;

        let morning = self
            .evaluate_broadcast(BroadcastKind::Morning, schedule.morning, &now)
            .await?;
        let evening = self
            .evaluate_broadcast(BroadcastKind::Evening, schedule.evening, &now)
            .await?;
        let reminders = self.evaluate_reminders(&now).await?;

        Ok(TickReport {
            morning,
            evening,
            reminders,
        })
    }

    /// Sends the `kind` broadcast if it is due and has not been attempted today.
    ///
    /// Returns `None` when nothing was sent. The date is recorded after the
    /// attempt even if some or all recipients failed.
    pub async fn evaluate_broadcast(
        &self,
        kind: BroadcastKind,
        target: TimeOfDay,
        now: &DateTime<Tz>,
    ) -> Result<Option<DeliveryReport>> {
        let Some(recipients) = self.storage.broadcast.recipients()? else {
            debug!("Skipping {} broadcast: disabled or no subscribers", kind);
            return Ok(None);
        };

        if !is_due(now, target, self.tolerance_minutes) {
            debug!(
                "{} broadcast not due: now {}, target {}",
                kind,
                now.format("%H:%M"),
                target
            );
            return Ok(None);
        }

        let today = now.date_naive();
        if self.storage.broadcast.already_sent(kind, today)? {
            debug!("{} broadcast already sent on {}", kind, today);
            return Ok(None);
        }

        info!(
            "{} broadcast is due, sending to {} subscribers",
            kind,
            recipients.len()
        );
        let message = {
            let mut rng = rand::thread_rng();
            content::broadcast_message(kind, &mut rng)
        };
        let report = deliver_all(self.notifier.as_ref(), &recipients, &message).await;

        self.storage.broadcast.mark_sent(kind, today)?;
        info!(
            "{} broadcast delivered to {}/{} subscribers",
            kind,
            report.delivered(),
            report.attempted()
        );
        Ok(Some(report))
    }

    /// Sends every reminder whose time lies inside the tolerance window.
    ///
    /// Nothing records that a reminder already fired, so one reminder can be sent
    /// on each tick that falls inside its window.
    pub async fn evaluate_reminders(&self, now: &DateTime<Tz>) -> Result<DeliveryReport> {
        let mut report = DeliveryReport::default();

        for (user, entries) in self.storage.reminders.snapshot()? {
            for (position, entry) in entries.iter().enumerate() {
                if !is_due(now, entry.time, self.tolerance_minutes) {
                    continue;
                }
                let occurrence = entries[..position].iter().filter(|e| *e == entry).count();
                // deleted since the snapshot was taken
                if !self
                    .storage
                    .reminders
                    .is_still_scheduled(user, occurrence, entry)
                {
                    debug!("Reminder for chat {} was removed, skipping", user);
                    continue;
                }

                let message = content::reminder_message(&entry.text);
                report.extend(deliver_all(self.notifier.as_ref(), &[user], &message).await);
            }
        }

        if report.attempted() > 0 {
            info!(
                "Reminders sent: {}/{}",
                report.delivered(),
                report.attempted()
            );
        }
        Ok(report)
    }
}

/// Drives [`TickRunner`] on a fixed interval until stopped.
pub struct NotificationScheduler {
    /// Time between two ticks
    check_interval: Duration,

    /// Tick evaluation shared with the background task
    runner: TickRunner,

    /// Channel to send commands to the scheduler task
    command_tx: Option<mpsc::Sender<SchedulerCommand>>,

    /// Handle to the scheduler task
    scheduler_task: Option<JoinHandle<()>>,

    /// Current status of the scheduler
    status: SharedSchedulerStatus,
}

impl NotificationScheduler {
    pub fn new(runner: TickRunner, check_interval: Duration) -> Self {
        info!(
            "Initializing notification scheduler with interval {}s",
            check_interval.as_secs()
        );
        Self {
            check_interval,
            runner,
            command_tx: None,
            scheduler_task: None,
            status: Arc::new(Mutex::new(SchedulerStatus::default())),
        }
    }

    /// Start the scheduler loop. The first tick runs one interval after start and
    /// every later one a full interval after the previous tick finished.
    pub fn start(&mut self) -> Result<()> {
        if self.scheduler_task.is_some() {
            debug!("Notification scheduler is already running");
            return Ok(());
        }
        info!("Starting notification scheduler...");

        let (command_tx, mut command_rx) = mpsc::channel(10);
        let runner = self.runner.clone();
        let status = Arc::clone(&self.status);
        let period = self.check_interval;

        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // Initial tick

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        run_guarded_tick(&runner, &status).await;
                        // a slow tick must not eat into the next sleep
                        interval.reset();
                    }
                    cmd = command_rx.recv() => match cmd {
                        Some(SchedulerCommand::TickNow(done)) => {
                            run_guarded_tick(&runner, &status).await;
                            let _ = done.send(());
                        }
                        Some(SchedulerCommand::Stop) | None => {
                            info!("Notification scheduler stopping...");
                            break;
                        }
                    }
                }
            }
        });

        self.command_tx = Some(command_tx);
        self.scheduler_task = Some(task);
        self.set_running(true);
        Ok(())
    }

    /// Stop the scheduler if it's running
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.scheduler_task.take() {
            if let Some(command_tx) = self.command_tx.take() {
                if let Err(e) = command_tx.send(SchedulerCommand::Stop).await {
                    error!("Failed to send stop command to scheduler: {}", e);
                }
            }

            if let Err(e) = task.await {
                let error_mgs = format!("Failed to stop notification scheduler: {}", e);
                error!("{}", error_mgs);
                return Err(BotError::ApplicationError { message: error_mgs });
            }

            self.set_running(false);
            info!("Notification scheduler stopped");
        } else {
            debug!("Notification scheduler is not running");
        }

        Ok(())
    }

    /// Run a tick immediately, regardless of the interval, and wait for it
    pub async fn tick_now(&self) -> Result<()> {
        let command_tx = self
            .command_tx
            .as_ref()
            .ok_or_else(|| BotError::ApplicationError {
                message: "Notification scheduler is not running".to_string(),
            })?;

        let (done_tx, done_rx) = oneshot::channel();
        command_tx
            .send(SchedulerCommand::TickNow(done_tx))
            .await
            .map_err(|e| BotError::ApplicationError {
                message: format!("Failed to send tick command: {}", e),
            })?;
        done_rx.await.map_err(|e| BotError::ApplicationError {
            message: format!("Scheduler dropped tick acknowledgement: {}", e),
        })
    }

    /// Get the current status of the scheduler
    pub fn get_status(&self) -> SchedulerStatus {
        self.status
            .lock()
            .map(|status| status.clone())
            .unwrap_or_default()
    }

    pub fn status_handle(&self) -> SharedSchedulerStatus {
        Arc::clone(&self.status)
    }

    fn set_running(&self, running: bool) {
        if let Ok(mut status) = self.status.lock() {
            status.is_running = running;
        }
    }
}

/// Runs one tick in its own task so that an error or a panic is contained
/// and the loop keeps its cadence.
async fn run_guarded_tick(runner: &TickRunner, status: &SharedSchedulerStatus) {
    let now = runner.now();
    let tick_runner = runner.clone();
    let outcome = tokio::spawn(async move { tick_runner.tick_at(now).await }).await;

    let report = match outcome {
        Ok(Ok(report)) => {
            debug!("All checks finished at {}", now.format("%H:%M:%S"));
            Some(report)
        }
        Ok(Err(e)) => {
            error!("Scheduler tick failed: {}", e);
            None
        }
        Err(e) => {
            error!("Scheduler tick aborted: {}", e);
            None
        }
    };

    if let Ok(mut status) = status.lock() {
        status.ticks += 1;
        status.last_tick_time = Some(now);
        if report.is_some() {
            status.last_report = report;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatId, ManualClock, ScheduleConfig};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, NaiveDate, TimeZone};
    use chrono_tz::Asia::Yekaterinburg;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct RecordingNotifier {
        failing: Vec<ChatId>,
        sent: Mutex<Vec<(ChatId, String)>>,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<(ChatId, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, chat: ChatId, text: &str) -> Result<()> {
            if self.failing.contains(&chat) {
                return Err(BotError::Delivery {
                    chat,
                    message: "chat not found".to_string(),
                });
            }
            self.sent.lock().unwrap().push((chat, text.to_string()));
            Ok(())
        }
    }

    const A: ChatId = ChatId(100);
    const B: ChatId = ChatId(200);

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Tz> {
        Yekaterinburg
            .with_ymd_and_hms(2024, 5, day, hour, minute, 0)
            .unwrap()
    }

    fn setup(
        notifier: RecordingNotifier,
        start: DateTime<Tz>,
    ) -> (TickRunner, BotStorage, Arc<RecordingNotifier>, Arc<ManualClock>) {
        let storage = BotStorage::new(ScheduleConfig::default());
        let notifier = Arc::new(notifier);
        let clock = Arc::new(ManualClock::new(start));
        let runner = TickRunner::new(storage.clone(), notifier.clone(), clock.clone(), 5);
        (runner, storage, notifier, clock)
    }

    #[tokio::test]
    async fn morning_broadcast_fires_once_per_day() {
        let (runner, storage, notifier, clock) = setup(RecordingNotifier::default(), at(10, 9, 0));
        storage.broadcast.subscribe(A).unwrap();
        storage.broadcast.subscribe(B).unwrap();

        let first = runner.tick().await.unwrap();
        assert_eq!(first.morning.unwrap().delivered(), 2);
        assert!(first.evening.is_none());

        clock.advance(ChronoDuration::minutes(5));
        let second = runner.tick().await.unwrap();
        assert!(second.morning.is_none());

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(_, text)| text.starts_with("🌅")));
        assert_eq!(
            storage.broadcast.last_sent(BroadcastKind::Morning).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 10)
        );

        clock.set(at(11, 9, 2));
        let next_day = runner.tick().await.unwrap();
        assert_eq!(next_day.morning.unwrap().attempted(), 2);
    }

    #[tokio::test]
    async fn partial_failure_still_marks_the_day() {
        let notifier = RecordingNotifier {
            failing: vec![A],
            ..Default::default()
        };
        let (runner, storage, notifier, _clock) = setup(notifier, at(10, 9, 0));
        storage.broadcast.subscribe(A).unwrap();
        storage.broadcast.subscribe(B).unwrap();

        let report = runner.tick().await.unwrap().morning.unwrap();

        assert_eq!(report.delivered_to(), vec![B]);
        assert_eq!(report.failed(), 1);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(notifier.sent()[0].0, B);
        assert!(storage
            .broadcast
            .already_sent(BroadcastKind::Morning, at(10, 9, 0).date_naive())
            .unwrap());
    }

    #[tokio::test]
    async fn disabled_broadcast_leaves_state_untouched() {
        let (runner, storage, notifier, _clock) = setup(RecordingNotifier::default(), at(10, 18, 0));
        storage.broadcast.subscribe(A).unwrap();
        storage.broadcast.toggle(A).unwrap();

        let report = runner.tick().await.unwrap();

        assert!(report.evening.is_none());
        assert!(notifier.sent().is_empty());
        assert_eq!(storage.broadcast.last_sent(BroadcastKind::Evening).unwrap(), None);
    }

    #[tokio::test]
    async fn evening_broadcast_follows_replaced_schedule() {
        let (runner, storage, notifier, _clock) = setup(RecordingNotifier::default(), at(10, 21, 30));
        storage.broadcast.subscribe(A).unwrap();
        storage
            .schedule
            .replace(ScheduleConfig {
                morning: TimeOfDay::new(7, 0).unwrap(),
                evening: TimeOfDay::new(21, 30).unwrap(),
            })
            .unwrap();

        let report = runner.tick().await.unwrap();

        assert!(report.morning.is_none());
        assert_eq!(report.evening.unwrap().delivered(), 1);
        assert!(notifier.sent()[0].1.contains("Добрый вечер"));
    }

    #[tokio::test]
    async fn reminder_fires_on_every_tick_inside_window() {
        let (runner, storage, notifier, clock) = setup(RecordingNotifier::default(), at(10, 12, 0));
        storage.reminders.create(A, 12, 2, "stretch").unwrap();

        runner.tick().await.unwrap();
        clock.advance(ChronoDuration::minutes(5));
        runner.tick().await.unwrap();
        clock.advance(ChronoDuration::minutes(5));
        runner.tick().await.unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent
            .iter()
            .all(|(chat, text)| *chat == A && text == "🔔 Напоминание!\n\nstretch"));
    }

    #[tokio::test]
    async fn reminders_are_private_and_time_bound() {
        let (runner, storage, notifier, _clock) = setup(RecordingNotifier::default(), at(10, 8, 0));
        storage.reminders.create(A, 8, 0, "a-now").unwrap();
        storage.reminders.create(A, 20, 0, "a-later").unwrap();
        storage.reminders.create(B, 7, 57, "b-now").unwrap();

        let report = runner.tick().await.unwrap();

        assert_eq!(report.reminders.attempted(), 2);
        let sent = notifier.sent();
        assert!(sent.contains(&(A, "🔔 Напоминание!\n\na-now".to_string())));
        assert!(sent.contains(&(B, "🔔 Напоминание!\n\nb-now".to_string())));
    }

    #[tokio::test]
    async fn identical_reminders_each_fire_while_scheduled() {
        let (runner, storage, notifier, _clock) = setup(RecordingNotifier::default(), at(10, 9, 0));
        storage.reminders.create(A, 9, 0, "x").unwrap();
        storage.reminders.create(A, 9, 0, "x").unwrap();

        let report = runner.tick().await.unwrap();
        assert_eq!(report.reminders.delivered(), 2);

        storage.reminders.delete_at(A, 2).unwrap();
        let report = runner.tick().await.unwrap();
        assert_eq!(report.reminders.delivered(), 1);
        assert_eq!(notifier.sent().len(), 3);
    }

    struct SlowNotifier {
        delay: Duration,
        started: Mutex<Vec<time::Instant>>,
    }

    #[async_trait]
    impl Notifier for SlowNotifier {
        async fn send(&self, _chat: ChatId, _text: &str) -> Result<()> {
            self.started.lock().unwrap().push(time::Instant::now());
            time::sleep(self.delay).await;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_ticks_keep_a_full_sleep_between_runs() {
        let storage = BotStorage::new(ScheduleConfig::default());
        storage.reminders.create(A, 9, 0, "water").unwrap();
        let notifier = Arc::new(SlowNotifier {
            delay: Duration::from_secs(400),
            started: Mutex::new(Vec::new()),
        });
        let clock = Arc::new(ManualClock::new(at(10, 9, 0)));
        let runner = TickRunner::new(storage, notifier.clone(), clock, 5);

        let begin = time::Instant::now();
        let mut scheduler = NotificationScheduler::new(runner, Duration::from_secs(300));
        scheduler.start().unwrap();
        time::sleep(Duration::from_secs(2000)).await;

        let started: Vec<Duration> = notifier
            .started
            .lock()
            .unwrap()
            .iter()
            .map(|instant| instant.duration_since(begin))
            .collect();
        assert_eq!(started.len(), 3, "sends started at {:?}", started);
        assert!(started[0] >= Duration::from_secs(300));
        for pair in started.windows(2) {
            assert!(
                pair[1] - pair[0] >= Duration::from_secs(700),
                "sends started at {:?}",
                started
            );
        }
        // the third tick is still waiting on its send
        assert_eq!(scheduler.get_status().ticks, 2);

        scheduler.stop().await.unwrap();
    }

    struct PanicOnceNotifier {
        panicked: AtomicBool,
        inner: RecordingNotifier,
    }

    #[async_trait]
    impl Notifier for PanicOnceNotifier {
        async fn send(&self, chat: ChatId, text: &str) -> Result<()> {
            if !self.panicked.swap(true, Ordering::SeqCst) {
                panic!("transport exploded");
            }
            self.inner.send(chat, text).await
        }
    }

    #[tokio::test]
    async fn loop_survives_a_failing_tick_and_stops_on_command() {
        let storage = BotStorage::new(ScheduleConfig::default());
        storage.reminders.create(A, 15, 0, "tea").unwrap();
        let notifier = Arc::new(PanicOnceNotifier {
            panicked: AtomicBool::new(false),
            inner: RecordingNotifier::default(),
        });
        let clock = Arc::new(ManualClock::new(at(10, 15, 0)));
        let runner = TickRunner::new(storage, notifier.clone(), clock, 5);

        let mut scheduler = NotificationScheduler::new(runner, Duration::from_secs(3600));
        scheduler.start().unwrap();
        assert!(scheduler.get_status().is_running);

        scheduler.tick_now().await.unwrap();
        let status = scheduler.get_status();
        assert_eq!(status.ticks, 1);
        assert!(status.last_report.is_none());

        scheduler.tick_now().await.unwrap();
        let status = scheduler.get_status();
        assert_eq!(status.ticks, 2);
        assert_eq!(status.last_report.unwrap().reminders.delivered(), 1);
        assert_eq!(notifier.inner.sent().len(), 1);

        scheduler.stop().await.unwrap();
        assert!(!scheduler.get_status().is_running);
        assert!(scheduler.tick_now().await.is_err());
    }
}
