//! Headless test harness for driving an [`App`] without a real [`Backend`]
//! or event loop.
//!
//! Grounded on the teacher's `testing::render_to_canvas`, which skips
//! `App::run` entirely and renders a `Compose` straight to a `Canvas` for
//! snapshot assertions. There is no `Canvas` here — the unit of inspection
//! is the committed instance tree, the layout tree, and the drawlist bytes
//! `render_frame` would have submitted — so [`TestApp`] wraps a real
//! `App<S>` over a [`HeadlessBackend`] stub, and [`drive_turn`] feeds it a
//! batch of already-decoded [`Event`]s and runs exactly one turn to
//! completion.
//!
//! Driving turns through already-decoded `Event`s rather than round-tripping
//! through the wire format is deliberate: `event::parser` already has its
//! own decode tests, and a test harness whose job is to exercise
//! routing/commit/layout/damage shouldn't also have to hand-encode bytes
//! for every scenario.

use crate::app::App;
use crate::backend::{Backend, BackendCapabilities, EventBatch, FrameAck};
use crate::config::Config;
use crate::error::Result;
use crate::event::Event;
use crate::instance::InstanceTree;
use crate::layout::LayoutTree;
use crate::vnode::RenderFn;

/// A [`Backend`] that never produces a spontaneous event and acks every
/// submitted frame immediately. [`TestApp`] feeds events directly through
/// [`drive_turn`] instead of waiting on `poll_events`.
struct HeadlessBackend {
    caps: BackendCapabilities,
}

#[async_trait::async_trait]
impl Backend for HeadlessBackend {
    async fn start(&mut self) -> Result<()> {
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    async fn dispose(&mut self) -> Result<()> {
        Ok(())
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.caps.clone()
    }

    async fn poll_events(&mut self) -> Result<EventBatch> {
        std::future::pending().await
    }

    async fn request_frame(&mut self, _bytes: Vec<u8>) -> Result<FrameAck> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let _ = tx.send(Ok(()));
        Ok(FrameAck { accepted: None, completed: rx })
    }
}

/// Builds an `App<S>` with the given view and configuration, wired to a
/// [`HeadlessBackend`] that always accepts `start()`/`capabilities()`
/// checks against `Config::default()`.
pub fn headless_app<S: Default + 'static>(view: RenderFn, config: Config, initial_state: S) -> App<S> {
    let backend = Box::new(HeadlessBackend { caps: BackendCapabilities::default() });
    App::new(backend, config, initial_state).with_view(view)
}

/// Wraps a started `App<S>` for turn-by-turn inspection in tests.
pub struct TestApp<S: Default + 'static> {
    app: App<S>,
}

impl<S: Default + 'static> TestApp<S> {
    /// Starts `app` against its backend and wraps it. Panics if `start()`
    /// fails — a harness misconfiguration (no view, mismatched config), not
    /// a condition a headless test should be asserting on.
    pub async fn start(mut app: App<S>) -> Self {
        app.start().await.expect("TestApp: start() must succeed for a headless test");
        Self { app }
    }

    pub fn state(&self) -> &S {
        self.app.state()
    }

    pub fn lifecycle_state(&self) -> crate::lifecycle::LifecycleState {
        self.app.lifecycle_state()
    }

    pub fn tree(&self) -> &InstanceTree {
        self.app.tree()
    }

    pub fn layout(&self) -> &LayoutTree {
        self.app.layout()
    }

    /// The drawlist bytes from the last turn that rendered, if any.
    pub fn last_drawlist(&self) -> Option<&[u8]> {
        self.app.last_drawlist()
    }

    pub fn context(&self) -> crate::context::AppContext<S> {
        self.app.context()
    }

    /// Runs one full turn (`spec.md` §4.2 ordering) against `events`, then
    /// drains anything a spawned `AppContext` continuation enqueued in the
    /// meantime. Panics on a fatal turn — headless tests assert on state/
    /// tree/drawlist, not on crash recovery (use [`App`] directly for
    /// fatal-path tests, as `app.rs`'s own test module does).
    pub async fn drive_turn(&mut self, events: &[Event]) {
        if let Some(err) = self.app.test_drive_turn(events).await {
            panic!("TestApp::drive_turn hit a fatal error: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::composite::CompositeCtx;
    use crate::event::{EventKind, KeyCode, KeyEvent, Mods};
    use crate::vnode::{LeafPayload, TextOverflow, VNode};
    use std::any::Any;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Counter {
        value: u32,
    }

    fn counter_view() -> RenderFn {
        Rc::new(|ctx: &CompositeCtx| {
            let value = ctx.select(|s: &dyn Any| s.downcast_ref::<Counter>().unwrap().value);
            VNode::leaf(
                crate::vnode::LeafKind::Text,
                LeafPayload::Text {
                    content: format!("{value}"),
                    overflow: TextOverflow::Clip,
                    max_width: None,
                },
            )
        })
    }

    #[tokio::test]
    async fn drive_turn_with_no_events_still_renders_the_first_frame() {
        let app = headless_app(counter_view(), Config::default(), Counter::default());
        let mut test_app = TestApp::start(app).await;
        test_app.drive_turn(&[]).await;
        assert!(test_app.tree().root.is_some());
        assert!(test_app.last_drawlist().is_some());
    }

    #[tokio::test]
    async fn drive_turn_routes_a_key_event_and_commits_updated_state() {
        let app = headless_app(counter_view(), Config::default(), Counter::default())
            .with_reducer(Rc::new(|s: &Counter, _action| Counter { value: s.value + 1 }));
        let mut test_app = TestApp::start(app).await;
        test_app.drive_turn(&[]).await;

        let enter = Event { kind: EventKind::Key(KeyEvent { code: KeyCode::Enter, mods: Mods::empty() }), time_ms: 1 };
        test_app.drive_turn(std::slice::from_ref(&enter)).await;

        // No focused interactive widget exists in this view, so the router
        // has nothing to consume the key and no action reaches the reducer.
        assert_eq!(test_app.state().value, 0);
    }

    #[tokio::test]
    async fn context_updates_are_visible_after_the_next_drive_turn() {
        let app = headless_app(counter_view(), Config::default(), Counter::default());
        let mut test_app = TestApp::start(app).await;
        test_app.drive_turn(&[]).await;
        assert_eq!(test_app.state().value, 0);

        test_app.context().update(|s| Counter { value: s.value + 5 });
        test_app.drive_turn(&[]).await;
        assert_eq!(test_app.state().value, 5);
    }
}
