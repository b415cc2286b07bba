//! Architecture checks
//!
//! Compile-time guarantees that the AI-facing components stay thread-safe
//! and that the public surface stays usable from async contexts.

#[cfg(test)]
mod architecture_tests {
    use eightd_assist::{AiGateway, AuditPipeline, ReportState, ReportStore};

    #[test]
    fn test_ai_components_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<AiGateway>();
        assert_send_sync::<ReportStore>();
        assert_send_sync::<AuditPipeline>();
        assert_send_sync::<ReportState>();
    }

    // The report state must survive crossing .await points by value.
    #[test]
    fn test_report_state_is_clonable_and_comparable() {
        let state = ReportState::new();
        let copy = state.clone();
        assert_eq!(state, copy);
    }
}
