//! The single top-level entry point a host calls to drive one full
//! change-detection tick end to end: [`detect_changes`].
//!
//! Everything below this point in the crate runs as a recursive descent
//! reachable only from here (or from a test harness calling
//! [`crate::passes::run_refresh_pass`] directly). What this module adds on
//! top of a bare refresh pass is the failure-handling contract a host
//! actually depends on: an uncaught error is handed to an injected
//! [`ErrorHandler`] before it propagates, and the renderer's optional
//! `begin`/`end` hooks bracket the cycle on every exit path, including an
//! error.

use vr_foundation::{Result, ViewHandle, ViewRuntimeError};

use crate::engine::ViewEngine;
use crate::external::Renderer;
use crate::passes::run_refresh_pass;

/// A host-provided sink for errors that escape a refresh pass.
///
/// [`detect_changes`] hands the error to this sink first — so the host can
/// log it, report it, or surface it in its own UI — and then rethrows it
/// to its own caller regardless of what the sink does with it. A host with
/// no interest in this hook can simply not provide one.
pub trait ErrorHandler {
    /// Observe an error that escaped the root refresh pass.
    fn handle_error(&mut self, error: &ViewRuntimeError);
}

/// Run one full change-detection tick over `root`: a refresh pass, bracketed
/// by the renderer's `begin`/`end` hooks, with an optional dev-mode
/// check-no-changes re-run immediately after.
///
/// `error_handler` receives any error the refresh pass raises before it is
/// rethrown to the caller; pass `None` for a host with no error-reporting
/// hook installed. `check_no_changes` additionally re-runs the pass in
/// assertion-only mode once the ordinary pass succeeds, surfacing
/// [`ViewRuntimeError::ExpressionChangedAfterCheck`] if a binding changed
/// without anything marking its view dirty.
///
/// `renderer.end()` runs on every exit path, including an error from either
/// pass, mirroring the try/finally the renderer's `begin`/`end` bracket
/// forms around a top-level invocation.
///
/// # Errors
///
/// Returns whatever the refresh pass (ordinary or check-no-changes)
/// returned, after handing it to `error_handler` if one was given.
pub fn detect_changes(
    engine: &mut ViewEngine,
    renderer: &mut dyn Renderer,
    root: ViewHandle,
    error_handler: Option<&mut dyn ErrorHandler>,
    check_no_changes: bool,
) -> Result<()> {
    renderer.begin();
    let result = run_tick(engine, renderer, root, check_no_changes);
    renderer.end();

    if let Err(err) = &result {
        tracing::error!(?root, error = %err, "change-detection tick failed");
        if let Some(handler) = error_handler {
            handler.handle_error(err);
        }
    }
    result
}

fn run_tick(engine: &mut ViewEngine, renderer: &mut dyn Renderer, root: ViewHandle, check_no_changes: bool) -> Result<()> {
    run_refresh_pass(engine, renderer, root, false)?;
    if check_no_changes {
        run_refresh_pass(engine, renderer, root, true)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::ViewFactory;
    use std::any::Any;

    struct NullRenderer {
        begin_calls: u32,
        end_calls: u32,
    }

    impl NullRenderer {
        fn new() -> Self {
            Self {
                begin_calls: 0,
                end_calls: 0,
            }
        }
    }

    impl Renderer for NullRenderer {
        fn create_element(&mut self, _tag: &str) -> Box<dyn Any> {
            Box::new(())
        }
        fn create_text(&mut self, _content: &str) -> Box<dyn Any> {
            Box::new(())
        }
        fn set_property(&mut self, _node: &dyn Any, _name: &str, _value: &str) {}
        fn set_text(&mut self, _node: &dyn Any, _content: &str) {}
        fn append_child(&mut self, _parent: &dyn Any, _child: &dyn Any) {}
        fn remove_child(&mut self, _parent: &dyn Any, _child: &dyn Any) {}
        fn begin(&mut self) {
            self.begin_calls += 1;
        }
        fn end(&mut self) {
            self.end_calls += 1;
        }
    }

    struct RecordingErrorHandler {
        seen: Vec<String>,
    }

    impl ErrorHandler for RecordingErrorHandler {
        fn handle_error(&mut self, error: &ViewRuntimeError) {
            self.seen.push(error.to_string());
        }
    }

    #[test]
    fn renderer_begin_and_end_bracket_a_successful_tick() {
        let mut engine = ViewEngine::new();
        let mut factory = ViewFactory::new();
        let root = factory.create_root_view(&mut engine, 0, 0);

        let mut renderer = NullRenderer::new();
        detect_changes(&mut engine, &mut renderer, root, None, false).unwrap();

        assert_eq!(renderer.begin_calls, 1);
        assert_eq!(renderer.end_calls, 1);
    }

    #[test]
    fn renderer_end_runs_even_when_the_refresh_pass_fails() {
        let mut engine = ViewEngine::new();
        let stale = {
            let mut factory = ViewFactory::new();
            let view = factory.create_root_view(&mut engine, 0, 0);
            engine.destroy_view(view).unwrap();
            view
        };

        let mut renderer = NullRenderer::new();
        let mut handler = RecordingErrorHandler { seen: Vec::new() };
        let result = detect_changes(&mut engine, &mut renderer, stale, Some(&mut handler), false);

        assert!(result.is_err());
        assert_eq!(renderer.end_calls, 1);
        assert_eq!(handler.seen.len(), 1);
    }
}
