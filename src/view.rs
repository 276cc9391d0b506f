use crate::client::AnalysisError;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewStatus<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// `Idle -> Loading -> {Loaded | Failed}`. Only the newest ticket of a
/// still-mounted view may settle it.
#[derive(Debug)]
pub struct AnalysisView<T> {
    status: ViewStatus<T>,
    generation: u64,
    mounted: bool,
}

impl<T> Default for AnalysisView<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AnalysisView<T> {
    pub fn new() -> Self {
        Self {
            status: ViewStatus::Idle,
            generation: 0,
            mounted: true,
        }
    }

    pub fn status(&self) -> &ViewStatus<T> {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, ViewStatus::Loading)
    }

    /// Enters `Loading`. Returns `None` while loading or once unmounted.
    pub fn begin(&mut self) -> Option<Ticket> {
        if !self.mounted {
            return None;
        }
        if self.is_loading() {
            debug!("submit ignored, request {} still in flight", self.generation);
            return None;
        }
        self.generation += 1;
        self.status = ViewStatus::Loading;
        Some(Ticket(self.generation))
    }

    /// Applies a finished request. Returns whether it was applied.
    pub fn settle(&mut self, ticket: Ticket, outcome: Result<T, AnalysisError>) -> bool {
        if !self.mounted || ticket.0 != self.generation || !self.is_loading() {
            debug!("dropping stale response for request {}", ticket.0);
            return false;
        }
        self.status = match outcome {
            Ok(value) => ViewStatus::Loaded(value),
            Err(e) => ViewStatus::Failed(e.user_message()),
        };
        true
    }

    /// Stops accepting outcomes; a late response is discarded.
    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    pub fn into_status(self) -> ViewStatus<T> {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_after_successful_request() {
        let mut view = AnalysisView::new();
        let ticket = view.begin().unwrap();
        assert!(view.is_loading());
        assert!(view.settle(ticket, Ok("src/main.py")));
        assert_eq!(view.status(), &ViewStatus::Loaded("src/main.py"));
    }

    #[test]
    fn server_detail_becomes_failure_message() {
        let mut view: AnalysisView<()> = AnalysisView::new();
        let ticket = view.begin().unwrap();
        view.settle(
            ticket,
            Err(AnalysisError::Server {
                status: 500,
                message: "repo not found".to_string(),
            }),
        );
        assert_eq!(view.status(), &ViewStatus::Failed("repo not found".to_string()));
    }

    #[test]
    fn second_submit_while_loading_is_ignored() {
        let mut view: AnalysisView<u8> = AnalysisView::new();
        let first = view.begin().unwrap();
        assert!(view.begin().is_none());
        assert!(view.settle(first, Ok(1)));
    }

    #[test]
    fn resubmit_from_failed_or_loaded_restarts_loading() {
        let mut view: AnalysisView<u8> = AnalysisView::new();
        let first = view.begin().unwrap();
        view.settle(first, Err(AnalysisError::Transport("down".to_string())));
        let second = view.begin().unwrap();
        assert!(view.is_loading());
        assert!(view.settle(second, Ok(2)));
        assert!(view.begin().is_some());
    }

    #[test]
    fn superseded_ticket_is_discarded() {
        let mut view: AnalysisView<u8> = AnalysisView::new();
        let old = view.begin().unwrap();
        view.settle(old, Ok(1));
        let newer = view.begin().unwrap();
        assert!(!view.settle(old, Ok(9)));
        assert!(view.settle(newer, Ok(2)));
        assert_eq!(view.status(), &ViewStatus::Loaded(2));
    }

    #[test]
    fn response_after_unmount_is_discarded() {
        let mut view: AnalysisView<u8> = AnalysisView::new();
        let ticket = view.begin().unwrap();
        view.unmount();
        assert!(!view.settle(ticket, Ok(1)));
        assert_eq!(view.status(), &ViewStatus::Loading);
        assert!(view.begin().is_none());
    }
}
