// Step timers only; the service reports no progress. Dropping the handle stops them.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub number: u8,
    pub name: &'static str,
    pub description: &'static str,
    pub at: Duration,
}

pub const STEPS: [Step; 5] = [
    Step {
        number: 1,
        name: "Repository Clone",
        description: "Cloning repository from Git",
        at: Duration::from_millis(500),
    },
    Step {
        number: 2,
        name: "File Discovery",
        description: "Finding all code files",
        at: Duration::from_millis(1000),
    },
    Step {
        number: 3,
        name: "Code Analysis",
        description: "Analyzing code quality and complexity",
        at: Duration::from_millis(1500),
    },
    Step {
        number: 4,
        name: "AI Insights",
        description: "Generating AI-powered insights",
        at: Duration::from_millis(2000),
    },
    Step {
        number: 5,
        name: "Report Generation",
        description: "Preparing final results",
        at: Duration::from_millis(2500),
    },
];

pub fn percent(step: u8) -> u8 {
    let total = STEPS.len() as u32;
    ((u32::from(step.min(STEPS.len() as u8)) * 100) / total) as u8
}

pub struct SyntheticProgress {
    rx: watch::Receiver<u8>,
    task: JoinHandle<()>,
}

impl SyntheticProgress {
    /// Starts the timers. `scale` shrinks or stretches every delay.
    pub fn start(scale: f64) -> Self {
        let (tx, rx) = watch::channel(0u8);
        let task = tokio::spawn(async move {
            let mut elapsed = Duration::ZERO;
            for step in STEPS {
                let at = step.at.mul_f64(scale);
                tokio::time::sleep(at.saturating_sub(elapsed)).await;
                elapsed = at;
                info!(
                    "[{}/{} {:>3}%] {}...",
                    step.number,
                    STEPS.len(),
                    percent(step.number),
                    step.description
                );
                if tx.send(step.number).is_err() {
                    break;
                }
            }
        });
        Self { rx, task }
    }

    pub fn current_step(&self) -> u8 {
        *self.rx.borrow()
    }
}

impl Drop for SyntheticProgress {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_proportional_and_capped() {
        assert_eq!(percent(0), 0);
        assert_eq!(percent(1), 20);
        assert_eq!(percent(5), 100);
        assert_eq!(percent(9), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn steps_advance_on_their_timers() {
        let progress = SyntheticProgress::start(1.0);
        assert_eq!(progress.current_step(), 0);
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(progress.current_step(), 2);
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(progress.current_step(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_halts_the_steps() {
        let progress = SyntheticProgress::start(1.0);
        let mut rx = progress.rx.clone();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*rx.borrow_and_update(), 1);
        drop(progress);
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(*rx.borrow(), 1);
        assert!(rx.changed().await.is_err());
    }
}
