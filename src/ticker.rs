//! Periodic refresh (v0.1)
//!
//! When a panel's `autoupdate` is on, a tokio task calls
//! [`Panel::refresh_all`] at the configured rate. The task only reads bound
//! values and writes displays. It holds a weak reference, so dropping the
//! panel ends it. Each tick re-reads the config: turning `autoupdate` off
//! ends the timer and a new tick rate takes effect on the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::panel::SharedPanel;

#[derive(Debug)]
struct Running {
    task: JoinHandle<()>,
    period: Duration,
}

/// Owner of the refresh task; stopping or dropping it cancels the timer
#[derive(Debug, Default)]
pub struct AutoRefresh {
    running: Option<Running>,
}

impl AutoRefresh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start according to the panel's config (must be called inside a tokio
    /// runtime)
    pub fn start(panel: &SharedPanel) -> Self {
        let mut refresh = Self::new();
        refresh.sync(panel);
        refresh
    }

    /// Start, restart or stop to match the panel's current config
    pub fn sync(&mut self, panel: &SharedPanel) {
        let (enabled, period) = {
            let panel = panel.lock();
            (panel.config().auto_update, panel.config().tick_interval())
        };

        match (&self.running, enabled) {
            (Some(running), true) if running.period == period => {}
            (_, true) => {
                self.stop();
                self.running = Some(Running {
                    task: spawn_refresh(panel, period),
                    period,
                });
                debug!(?period, "auto refresh started");
            }
            (_, false) => self.stop(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    pub fn period(&self) -> Option<Duration> {
        self.running.as_ref().map(|running| running.period)
    }

    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.task.abort();
            debug!("auto refresh stopped");
        }
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_refresh(panel: &SharedPanel, period: Duration) -> JoinHandle<()> {
    let panel = Arc::downgrade(panel);
    tokio::spawn(async move {
        let mut period = period;
        let mut interval = ticker(Instant::now(), period);
        loop {
            interval.tick().await;
            let Some(shared) = panel.upgrade() else {
                break;
            };
            let mut guard = shared.lock();
            if !guard.config().auto_update {
                debug!("auto refresh disabled, timer ended");
                break;
            }
            let wanted = guard.config().tick_interval();
            if wanted != period {
                period = wanted;
                interval = ticker(Instant::now() + period, period);
                debug!(?period, "auto refresh rate changed");
            }
            let changed = guard.refresh_all();
            if changed > 0 {
                trace!(changed, "displays refreshed");
            }
        }
    })
}

fn ticker(start: Instant, period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelConfig;
    use crate::descriptor::{ControlKind, Descriptor};
    use crate::node::Node;
    use crate::panel::Panel;
    use crate::present::DisplayValue;
    use crate::scope::Scope;
    use crate::surface::MemorySurface;
    use serde_json::json;

    fn shared(auto_update: bool) -> (Scope, SharedPanel) {
        let scope = Scope::new().with_root("model", json!({"t": 0}));
        let mut config = PanelConfig::new("model");
        config.auto_update = auto_update;
        config.ticks_per_second = 20;
        let mut panel = Panel::new(scope.clone(), config, MemorySurface::new());
        panel.add(Descriptor::new(ControlKind::Output).with_path("$['t']"));
        (scope, panel.into_shared())
    }

    fn bump(scope: &Scope, value: f64) {
        scope.write(|g| {
            g.get_mut("model").unwrap().set("t", Node::from(value));
        });
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_on_tick() {
        let (scope, panel) = shared(true);
        let refresh = AutoRefresh::start(&panel);
        assert!(refresh.is_running());
        assert_eq!(refresh.period(), Some(Duration::from_millis(50)));

        bump(&scope, 42.0);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(panel.lock().display(0), Some(&DisplayValue::Text("42".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_does_not_start() {
        let (scope, panel) = shared(false);
        let refresh = AutoRefresh::start(&panel);
        assert!(!refresh.is_running());

        bump(&scope, 7.0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(panel.lock().display(0), Some(&DisplayValue::Text("0".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn sync_stops_when_disabled() {
        let (scope, panel) = shared(true);
        let mut refresh = AutoRefresh::start(&panel);

        panel.lock().set_auto_update(false);
        refresh.sync(&panel);
        assert!(!refresh.is_running());

        bump(&scope, 9.0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(panel.lock().display(0), Some(&DisplayValue::Text("0".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_auto_update_ends_timer() {
        let (scope, panel) = shared(true);
        let refresh = AutoRefresh::start(&panel);
        tokio::time::sleep(Duration::from_millis(10)).await;

        panel.lock().set_auto_update(false);
        bump(&scope, 9.0);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(panel.lock().display(0), Some(&DisplayValue::Text("0".into())));
        assert!(!refresh.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_change_applies_without_sync() {
        let (scope, panel) = shared(true);
        let _refresh = AutoRefresh::start(&panel);
        tokio::time::sleep(Duration::from_millis(10)).await;

        // next tick (t=50ms) notices the slower rate, then ticks every second
        panel.lock().set_ticks_per_second(1);
        tokio::time::sleep(Duration::from_millis(100)).await;
        bump(&scope, 5.0);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(panel.lock().display(0), Some(&DisplayValue::Text("0".into())));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(panel.lock().display(0), Some(&DisplayValue::Text("5".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn sync_restarts_on_rate_change() {
        let (_scope, panel) = shared(true);
        let mut refresh = AutoRefresh::start(&panel);
        panel.lock().set_ticks_per_second(1000);
        refresh.sync(&panel);
        assert_eq!(refresh.period(), Some(Duration::from_secs_f64(1.0 / 60.0)));
    }
}
