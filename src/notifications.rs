// 🔔 Notifications - local reminders and threshold alerts
//
// Time-based notifications (daily reminder, weekly report) and event-based
// ones (budget alert, goal achieved, welcome, large transaction, goal
// deadline). Nothing leaves the process: `tick` moves due notifications
// into an in-memory inbox that the Notifications screen renders.

use crate::config::{AppConfig, BudgetConfig, NotificationConfig};
use crate::format::CurrencyFormat;
use crate::models::{Goal, Transaction};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Oldest delivered notifications are dropped past this size
pub const INBOX_CAPACITY: usize = 50;

// ============================================================================
// TRIGGER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trigger {
    /// Delivered on the next tick
    Immediate,
    Daily { hour: u32, minute: u32 },
    Weekly { weekday: Weekday, hour: u32, minute: u32 },
}

impl Trigger {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Trigger::Immediate)
    }

    /// Next occurrence strictly after `after` (local wall-clock time).
    ///
    /// `None` for `Immediate` and for an hour/minute that is not a valid time.
    pub fn next_fire_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        match *self {
            Trigger::Immediate => None,
            Trigger::Daily { hour, minute } => {
                let today = after.date().and_hms_opt(hour, minute, 0)?;
                if today > after {
                    Some(today)
                } else {
                    Some(today + Duration::days(1))
                }
            }
            Trigger::Weekly { weekday, hour, minute } => {
                let days_ahead = (7 + weekday.num_days_from_monday()
                    - after.weekday().num_days_from_monday())
                    % 7;
                let candidate = (after.date() + Duration::days(days_ahead as i64))
                    .and_hms_opt(hour, minute, 0)?;
                if candidate > after {
                    Some(candidate)
                } else {
                    Some(candidate + Duration::days(7))
                }
            }
        }
    }
}

// ============================================================================
// NOTIFICATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NotificationKind {
    DailyReminder,
    BudgetAlert,
    GoalAchieved,
    WeeklyReport,
    Welcome,
    LargeTransaction,
    GoalDeadline,
}

impl NotificationKind {
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationKind::DailyReminder => "📝",
            NotificationKind::BudgetAlert => "⚠️",
            NotificationKind::GoalAchieved => "🎉",
            NotificationKind::WeeklyReport => "📊",
            NotificationKind::Welcome => "👋",
            NotificationKind::LargeTransaction => "💸",
            NotificationKind::GoalDeadline => "⏰",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub trigger: Trigger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivered {
    pub notification: Notification,
    pub at: NaiveDateTime,
}

#[derive(Debug, Clone)]
struct Scheduled {
    notification: Notification,
    next_fire: Option<NaiveDateTime>,
}

// ============================================================================
// SCHEDULER
// ============================================================================

pub struct NotificationScheduler {
    config: NotificationConfig,
    budget: BudgetConfig,
    currency: CurrencyFormat,
    permission: Option<bool>,
    pending: Vec<Scheduled>,
    inbox: VecDeque<Delivered>,
    unread: usize,
    last_tick: Option<NaiveDateTime>,
    budget_alerted: Option<(i32, u32)>,
    next_id: u64,
}

impl NotificationScheduler {
    pub fn new(config: &AppConfig) -> Self {
        NotificationScheduler {
            config: config.notifications.clone(),
            budget: config.budget.clone(),
            currency: config.currency.clone(),
            permission: None,
            pending: Vec::new(),
            inbox: VecDeque::new(),
            unread: 0,
            last_tick: None,
            budget_alerted: None,
            next_id: 1,
        }
    }

    /// Ask once; the answer comes from `notifications.enabled`
    pub fn request_permission(&mut self) -> bool {
        if let Some(granted) = self.permission {
            return granted;
        }

        let granted = self.config.enabled;
        if granted {
            info!("Notification permission granted");
        } else {
            warn!("Notification permission denied; notifications will be dropped");
        }
        self.permission = Some(granted);
        granted
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Settings toggle. Turning notifications off cancels everything pending.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        self.permission = Some(enabled);
        if enabled {
            info!("Notifications enabled");
        } else {
            self.cancel_all();
            info!("Notifications disabled");
        }
    }

    pub fn daily_reminder_enabled(&self) -> bool {
        self.config.daily_reminder.enabled
    }

    /// Settings toggle for the daily reminder
    pub fn set_daily_reminder(&mut self, enabled: bool) {
        self.config.daily_reminder.enabled = enabled;
        if enabled {
            self.schedule_daily_reminder();
        } else {
            self.cancel_kind(NotificationKind::DailyReminder);
        }
    }

    /// Queue a notification. Returns its id, or `None` if permission is denied.
    pub fn schedule(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        trigger: Trigger,
    ) -> Option<u64> {
        let title = title.into();
        if !self.request_permission() {
            warn!(?kind, %title, "Dropping notification without permission");
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;

        debug!(id, ?kind, ?trigger, %title, "Notification scheduled");
        self.pending.push(Scheduled {
            notification: Notification {
                id,
                kind,
                title,
                body: body.into(),
                trigger,
            },
            next_fire: None,
        });
        Some(id)
    }

    pub fn cancel_all(&mut self) {
        let count = self.pending.len();
        self.pending.clear();
        info!(count, "Cancelled all scheduled notifications");
    }

    pub fn cancel_kind(&mut self, kind: NotificationKind) {
        let before = self.pending.len();
        self.pending.retain(|s| s.notification.kind != kind);
        debug!(?kind, cancelled = before - self.pending.len(), "Cancelled notifications");
    }

    pub fn pending(&self) -> impl Iterator<Item = &Notification> {
        self.pending.iter().map(|s| &s.notification)
    }

    // ------------------------------------------------------------------------
    // Built-in notifications
    // ------------------------------------------------------------------------

    /// Replaces any existing daily reminder
    pub fn schedule_daily_reminder(&mut self) -> Option<u64> {
        self.cancel_kind(NotificationKind::DailyReminder);
        if !self.config.daily_reminder.enabled {
            return None;
        }

        let reminder = &self.config.daily_reminder;
        let trigger = Trigger::Daily {
            hour: reminder.hour,
            minute: reminder.minute,
        };
        self.schedule(
            NotificationKind::DailyReminder,
            "Don't forget to log your spending",
            "Take a minute to record today's transactions.",
            trigger,
        )
    }

    pub fn schedule_weekly_report(&mut self) -> Option<u64> {
        self.cancel_kind(NotificationKind::WeeklyReport);
        if !self.config.weekly_report.enabled {
            return None;
        }

        let report = &self.config.weekly_report;
        let trigger = Trigger::Weekly {
            weekday: report.weekday,
            hour: report.hour,
            minute: report.minute,
        };
        self.schedule(
            NotificationKind::WeeklyReport,
            "Your weekly report is ready",
            "See how your spending went this week.",
            trigger,
        )
    }

    /// Fires when monthly expenses pass `limit × alert_ratio`, at most once
    /// per calendar month of `today`
    pub fn check_budget_alert(&mut self, monthly_expenses: f64, today: NaiveDate) -> Option<u64> {
        let threshold = self.budget.limit * self.budget.alert_ratio;
        if monthly_expenses <= threshold {
            return None;
        }

        let month = (today.year(), today.month());
        if self.budget_alerted == Some(month) {
            debug!(monthly_expenses, "Budget alert already raised this month");
            return None;
        }

        let percentage = (monthly_expenses / self.budget.limit * 100.0).round();
        let body = format!(
            "You have spent {:.0}% of your monthly budget ({} of {}).",
            percentage,
            self.currency.format(monthly_expenses),
            self.currency.format(self.budget.limit)
        );
        info!(monthly_expenses, threshold, "Budget alert");
        let id = self.schedule(NotificationKind::BudgetAlert, "Budget alert", body, Trigger::Immediate)?;
        self.budget_alerted = Some(month);
        Some(id)
    }

    pub fn notify_goal_achieved(&mut self, goal: &Goal) -> Option<u64> {
        let body = format!("Congratulations! You reached your goal \"{}\".", goal.title);
        self.schedule(NotificationKind::GoalAchieved, "Goal achieved!", body, Trigger::Immediate)
    }

    pub fn notify_welcome(&mut self, name: &str) -> Option<u64> {
        self.schedule(
            NotificationKind::Welcome,
            format!("Welcome, {}!", name),
            "Start by recording your first transaction.",
            Trigger::Immediate,
        )
    }

    /// Only for amounts at or above the configured threshold
    pub fn notify_large_transaction(&mut self, tx: &Transaction) -> Option<u64> {
        if tx.amount < self.budget.large_transaction_threshold {
            return None;
        }

        let body = format!(
            "{} of {} recorded: {}",
            tx.kind.label(),
            self.currency.format(tx.amount),
            tx.title
        );
        self.schedule(
            NotificationKind::LargeTransaction,
            "Large transaction",
            body,
            Trigger::Immediate,
        )
    }

    /// Only for open goals inside the warning window
    pub fn notify_goal_deadline(&mut self, goal: &Goal, days_left: i64) -> Option<u64> {
        if goal.is_achieved()
            || days_left < 0
            || days_left > self.config.goal_deadline_warning_days
        {
            return None;
        }

        let body = match days_left {
            0 => format!("\"{}\" is due today.", goal.title),
            1 => format!("1 day left to reach \"{}\".", goal.title),
            n => format!("{} days left to reach \"{}\".", n, goal.title),
        };
        self.schedule(NotificationKind::GoalDeadline, "Goal deadline", body, Trigger::Immediate)
    }

    /// Deadline notices for every goal, e.g. once at startup
    pub fn check_goal_deadlines(&mut self, goals: &[Goal], today: NaiveDate) -> usize {
        goals
            .iter()
            .filter_map(|goal| {
                let days = crate::analytics::days_until_deadline(&goal.deadline, today)?;
                self.notify_goal_deadline(goal, days)
            })
            .count()
    }

    // ------------------------------------------------------------------------
    // Delivery
    // ------------------------------------------------------------------------

    /// Deliver everything due at `now`.
    ///
    /// Immediate notifications are delivered and removed. A recurring one
    /// fires at most once per tick, when its next occurrence after the
    /// previous tick has been reached. The first tick only arms recurring
    /// triggers.
    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<Delivered> {
        let baseline = self.last_tick.unwrap_or(now);
        let mut delivered = Vec::new();

        self.pending.retain_mut(|scheduled| {
            let trigger = scheduled.notification.trigger;
            if !trigger.is_recurring() {
                delivered.push(Delivered {
                    notification: scheduled.notification.clone(),
                    at: now,
                });
                return false;
            }

            let next = match scheduled.next_fire.or_else(|| trigger.next_fire_after(baseline)) {
                Some(next) => next,
                None => return false,
            };
            if next <= now {
                delivered.push(Delivered {
                    notification: scheduled.notification.clone(),
                    at: now,
                });
                scheduled.next_fire = trigger.next_fire_after(now);
            } else {
                scheduled.next_fire = Some(next);
            }
            true
        });

        self.last_tick = Some(now);

        for item in &delivered {
            info!(
                id = item.notification.id,
                kind = ?item.notification.kind,
                title = %item.notification.title,
                "Notification delivered"
            );
            self.inbox.push_front(item.clone());
        }
        self.inbox.truncate(INBOX_CAPACITY);
        self.unread = (self.unread + delivered.len()).min(self.inbox.len());

        delivered
    }

    /// Newest first
    pub fn inbox(&self) -> impl Iterator<Item = &Delivered> {
        self.inbox.iter()
    }

    pub fn inbox_len(&self) -> usize {
        self.inbox.len()
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    pub fn mark_read(&mut self) {
        self.unread = 0;
    }

    pub fn clear_inbox(&mut self) {
        self.inbox.clear();
        self.unread = 0;
    }
}
