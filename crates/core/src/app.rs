//! The top-level application loop (`spec.md` §4.1, §4.2).
//!
//! `App<S>` wires every other module into one cooperative turn: it owns the
//! backend, the committed [`InstanceTree`], the [`layout::LayoutTree`], the
//! [`RouterState`], the [`CommitEngine`], and the application's own state
//! `S`. Nothing here talks to a concrete terminal library; everything goes
//! through [`Backend`].
//!
//! Grounded on the teacher's top-level `run`/`run_async`/`event_loop_async`
//! shape: a `tokio::select!` loop over the backend's event stream plus an
//! internal message channel, rebuilding the widget tree and repainting once
//! per iteration. The shape survives; the payload does not — there is no
//! widget-tree diff here, only `commit`, `compute_layout`, and
//! `DamageTracker::decide`.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use tokio::sync::mpsc;

use crate::backend::{Backend, FrameAck};
use crate::commit::CommitEngine;
use crate::config::Config;
use crate::context::AppContext;
use crate::drawlist::DrawlistBuilder;
use crate::error::{CoreError, Result};
use crate::event::{is_truncated, parse_batch, Event, EventKind, TimeUnwrap};
use crate::instance::{InstanceId, InstanceTree};
use crate::layout::damage::{DamageTracker, RenderContext, RenderDecision};
use crate::layout::{self, LayoutTree, Rect};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::router::{RouteContext, RouterAction, RouterState};
use crate::scheduler::{Scheduler, TurnPlan, WorkItem};
use crate::vnode::{ContainerPayload, InteractivePayload, LeafPayload, RenderFn, VNode, VNodePayload};

/// A single-step reduction turning a [`RouterAction`] into a new application
/// state. `VNode`'s interactive payloads carry no per-widget callback
/// closures (there is no widget visual library in scope here), so this is
/// the one seam an application installs to interpret what the router
/// decided — the analogue of a dispatched action hitting a reducer.
pub type Reducer<S> = Rc<dyn Fn(&S, &RouterAction) -> S>;

/// A predicate checked once per `run()` iteration; when it returns `true`
/// the run loop stops itself. Lets application code encode "the user asked
/// to quit" as ordinary state instead of needing a side channel back into
/// the loop that owns `&mut App`.
pub type QuitPredicate<S> = Rc<dyn Fn(&S) -> bool>;

/// Owns one running application: backend, committed tree, layout, router,
/// and the application's own state `S`. `S: Default` lets the update queue
/// be drained by taking the current value (`std::mem::take`) rather than
/// requiring state to live behind an `Option`.
pub struct App<S: Default + 'static> {
    backend: Box<dyn Backend>,
    config: Config,
    lifecycle: Lifecycle,
    scheduler: Scheduler,
    state: S,
    view: Option<RenderFn>,
    reducer: Option<Reducer<S>>,
    quit_when: Option<QuitPredicate<S>>,
    fatal_handlers: Vec<Box<dyn FnMut(&CoreError)>>,
    update_queue: crate::update_queue::UpdateQueue<S>,
    context_tx: mpsc::UnboundedSender<crate::update_queue::Updater<S>>,
    context_rx: mpsc::UnboundedReceiver<crate::update_queue::Updater<S>>,
    work_tx: mpsc::UnboundedSender<WorkItem>,
    work_rx: mpsc::UnboundedReceiver<WorkItem>,
    commit_engine: CommitEngine,
    tree: InstanceTree,
    router: RouterState,
    layout: LayoutTree,
    prev_layout: Option<LayoutTree>,
    layout_signatures: HashMap<InstanceId, u64>,
    damage: DamageTracker,
    viewport: Rect,
    time: TimeUnwrap,
    last_focus_public_id: Option<String>,
    rendered_once: bool,
    now_ms: u64,
    /// Last drawlist built by `render_frame`, kept for `testing::TestApp`
    /// introspection. Not otherwise consulted by the runtime — the teacher's
    /// `render_cache.rs` keeps the previous frame's buffer for a similar
    /// reason (inspecting what was actually last painted).
    last_drawlist: Option<Vec<u8>>,
}

impl<S: Default + 'static> App<S> {
    pub fn new(backend: Box<dyn Backend>, config: Config, initial_state: S) -> Self {
        let (context_tx, context_rx) = mpsc::unbounded_channel();
        let (work_tx, work_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            config,
            lifecycle: Lifecycle::new(),
            scheduler: Scheduler::new(),
            state: initial_state,
            view: None,
            reducer: None,
            quit_when: None,
            fatal_handlers: Vec::new(),
            update_queue: crate::update_queue::UpdateQueue::new(),
            context_tx,
            context_rx,
            work_tx,
            work_rx,
            commit_engine: CommitEngine::new(),
            tree: InstanceTree::new(),
            router: RouterState::new(),
            layout: LayoutTree::default(),
            prev_layout: None,
            layout_signatures: HashMap::new(),
            damage: DamageTracker::new(),
            viewport: Rect { x: 0, y: 0, width: 80, height: 24 },
            time: TimeUnwrap::new(),
            last_focus_public_id: None,
            rendered_once: false,
            now_ms: 0,
            last_drawlist: None,
        }
    }

    /// Crate-internal introspection for `testing::TestApp`: the committed
    /// instance tree as of the last `render_frame`.
    pub(crate) fn tree(&self) -> &InstanceTree {
        &self.tree
    }

    /// Crate-internal introspection: the layout tree as of the last
    /// relayout (may be older than `tree()` if the last frame didn't need
    /// one).
    pub(crate) fn layout(&self) -> &LayoutTree {
        &self.layout
    }

    /// Crate-internal introspection: the drawlist bytes submitted by the
    /// last `render_frame`, if any turn has rendered yet.
    pub(crate) fn last_drawlist(&self) -> Option<&[u8]> {
        self.last_drawlist.as_deref()
    }

    /// Test-only turn driver: runs the `spec.md` §4.2 ordering (events,
    /// then update-queue drain, then at most one render) against events
    /// supplied directly, bypassing the wire-format parser and the
    /// scheduler's batch plumbing — `event::parser`'s own tests already
    /// cover decoding, so the headless harness exercises routing/commit/
    /// layout/damage directly instead of round-tripping through bytes.
    pub(crate) async fn test_drive_turn(&mut self, events: &[Event]) -> Option<CoreError> {
        // `run()` only drains `context_rx` inside its `select!`; a headless
        // turn has no such loop, so pull in anything an `AppContext` posted
        // since the last turn before applying events.
        while let Ok(updater) = self.context_rx.try_recv() {
            self.update_queue.enqueue(updater);
        }

        for evt in events {
            self.now_ms = evt.time_ms;
            self.handle_event(evt).await;
        }
        self.drain_updates();

        let should_render = !events.is_empty() || self.damage.dirty_flags().render_dirty();
        if should_render {
            if let Err(e) = self.render_frame().await {
                return Some(e);
            }
        }
        None
    }

    /// Installs the root composite's render function. Each turn the root
    /// `VNode` is `VNode::composite("__root__", view)` — the same
    /// `RenderFn` shape every other composite uses, so `select`/`use_state`/
    /// `use_effect` already give the root everything it needs to read
    /// `S` out of `CompositeCtx`.
    pub fn with_view(mut self, view: RenderFn) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_reducer(mut self, reducer: Reducer<S>) -> Self {
        self.reducer = Some(reducer);
        self
    }

    pub fn with_quit_when(mut self, predicate: QuitPredicate<S>) -> Self {
        self.quit_when = Some(predicate);
        self
    }

    pub fn with_viewport(mut self, width: u16, height: u16) -> Self {
        self.viewport = Rect { x: 0, y: 0, width: width as i32, height: height as i32 };
        self
    }

    /// Registers a fatal-error handler. `spec.md` §5: "emit one fatal event
    /// to all active handlers (best-effort, swallow handler exceptions)".
    pub fn on_fatal(&mut self, handler: impl FnMut(&CoreError) + 'static) {
        self.fatal_handlers.push(Box::new(handler));
    }

    pub fn context(&self) -> AppContext<S> {
        AppContext::new(self.context_tx.clone())
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Replaces the state outright, enqueued for the next drain.
    pub fn update(&mut self, value: S) -> Result<()> {
        self.enqueue_updater(crate::update_queue::Updater::value(value))
    }

    fn enqueue_updater(&mut self, updater: crate::update_queue::Updater<S>) -> Result<()> {
        self.lifecycle.assert_operational("update")?;
        self.lifecycle.is_reentrant_update_allowed(self.update_queue.is_draining())?;
        if self.update_queue.enqueue(updater) {
            self.scheduler.push(WorkItem::UserCommit);
        }
        Ok(())
    }

    /// Brings the backend up and schedules the first turn. Reverts cleanly
    /// (lifecycle stays `Created`/`Stopped`) if no view is installed or the
    /// backend's capabilities disagree with the configured limits —
    /// `spec.md` scenario 1.
    pub async fn start(&mut self) -> Result<()> {
        self.lifecycle.begin_start()?;

        if self.view.is_none() {
            self.lifecycle.cancel_start();
            return Err(CoreError::NoRenderMode);
        }

        let caps = self.backend.capabilities();
        if let Err(e) = self.config.validate_against(&caps) {
            self.lifecycle.cancel_start();
            return Err(e);
        }

        if let Err(e) = self.backend.start().await {
            self.lifecycle.cancel_start();
            return Err(e);
        }

        self.lifecycle.commit_start();
        self.damage.reset_rendered();
        self.rendered_once = false;
        self.scheduler.push(WorkItem::Kick);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.lifecycle.begin_stop()?;
        let result = self.backend.stop().await;
        self.lifecycle.commit_stop();
        result
    }

    /// Idempotent: calling `dispose` more than once has no additional
    /// observable effect (`spec.md` §8).
    pub async fn dispose(&mut self) -> Result<()> {
        if self.lifecycle.state() == LifecycleState::Disposed {
            return Ok(());
        }
        let result = self.backend.dispose().await;
        self.lifecycle.dispose();
        result
    }

    /// Drives the cooperative scheduler until the lifecycle leaves
    /// `Running` (via `stop()`, a quit predicate, or a fatal fault).
    pub async fn run(&mut self) -> Result<()> {
        loop {
            // Drain whatever is already pending first — in particular the
            // `Kick` that `start()` pushes directly into the scheduler,
            // which never arrives over a channel the `select!` below would
            // wait on.
            while let Some(plan) = self.scheduler.begin_turn() {
                let fatal = self.run_turn(plan).await;
                self.scheduler.end_turn();
                if let Some(err) = fatal {
                    self.handle_fatal(err).await;
                    return Ok(());
                }
            }

            if self.lifecycle.state() != LifecycleState::Running {
                return Ok(());
            }

            if let Some(predicate) = self.quit_when.clone() {
                if predicate(&self.state) {
                    self.stop().await?;
                    return Ok(());
                }
            }

            tokio::select! {
                batch = self.backend.poll_events() => {
                    match batch {
                        Ok(b) => self.scheduler.push(WorkItem::EventBatch(b)),
                        Err(e) => self.scheduler.push(WorkItem::Fatal(e)),
                    }
                }
                maybe_updater = self.context_rx.recv() => {
                    if let Some(updater) = maybe_updater {
                        if self.update_queue.enqueue(updater) {
                            self.scheduler.push(WorkItem::UserCommit);
                        }
                    }
                }
                maybe_work = self.work_rx.recv() => {
                    if let Some(work) = maybe_work {
                        self.scheduler.push(work);
                    }
                }
            }
        }
    }

    /// Runs the ordered steps of one turn (`spec.md` §4.2): event batches
    /// first, then update-queue drains, then at most one render attempt.
    async fn run_turn(&mut self, plan: TurnPlan) -> Option<CoreError> {
        if let Some(fatal) = plan.fatal {
            return Some(fatal);
        }

        for mut batch in plan.event_batches {
            let parsed = match parse_batch(&batch.bytes, self.config.max_event_bytes, &mut self.time) {
                Ok(p) => p,
                Err(e) => {
                    batch.release();
                    return Some(e);
                }
            };
            if is_truncated(parsed.flags) || batch.dropped_batches > 0 {
                log::warn!(
                    "event batch overrun: truncated={} dropped_batches={}",
                    is_truncated(parsed.flags),
                    batch.dropped_batches
                );
            }
            for evt in &parsed.events {
                self.now_ms = evt.time_ms;
                self.handle_event(evt).await;
            }
            batch.release();
        }

        self.drain_updates();
        if plan.saw_kick {
            self.drain_updates();
        }

        for _ in 0..plan.frame_done_count {
            self.lifecycle.note_frame_acked();
        }
        for err in &plan.frame_errors {
            self.lifecycle.note_frame_acked();
            log::warn!("frame submission rejected by backend: {err}");
        }

        let should_render = plan.saw_kick || plan.render_requests > 0 || self.damage.dirty_flags().render_dirty();
        if should_render {
            if let Err(e) = self.render_frame().await {
                return Some(e);
            }
        }

        None
    }

    fn drain_updates(&mut self) {
        if self.update_queue.is_empty() {
            return;
        }
        let current = std::mem::take(&mut self.state);
        self.state = self.update_queue.drain_and_apply(current);
    }

    async fn handle_event(&mut self, evt: &Event) {
        match evt.kind {
            EventKind::Resize { width, height } => {
                self.viewport = Rect { x: 0, y: 0, width: width as i32, height: height as i32 };
                self.damage.dirty_flags().mark_layout();
            }
            _ => {
                self.damage.dirty_flags().mark_render();
            }
        }

        let ctx = RouteContext { tree: &self.tree, layout: &self.layout, now_ms: self.now_ms };
        let result = self.router.route(evt, &ctx);
        if result.consumed {
            self.damage.dirty_flags().mark_render();
        }

        for action in &result.actions {
            match action {
                RouterAction::ClipboardWrite(text) | RouterAction::ClipboardCut(text) => {
                    let _ = self.backend.raw_write(text.as_bytes()).await;
                }
                _ => {}
            }
            self.apply_router_action(action);
        }
    }

    fn apply_router_action(&mut self, action: &RouterAction) {
        match self.reducer.clone() {
            Some(reducer) => self.state = reducer(&self.state, action),
            None => log::debug!("router action {action:?} has no reducer installed; dropped"),
        }
    }

    /// Commits the current view, relays out if warranted, decides the
    /// render strategy, builds and submits one drawlist, and spawns a task
    /// that folds the ack back into the scheduler as a work item.
    async fn render_frame(&mut self) -> Result<()> {
        let snapshot = self.damage.dirty_flags().snapshot();

        let view = self.view.clone().expect("start() already rejected a view-less app");
        let root_vnode = VNode::composite("__root__", view);
        let outcome = self.commit_engine.commit(&mut self.tree, &self.state as &dyn Any, self.now_ms, root_vnode)?;

        let mut current_signatures = HashMap::new();
        collect_signatures(&self.tree, outcome.root, &mut current_signatures);
        let signatures_changed = current_signatures != self.layout_signatures;
        self.layout_signatures = current_signatures;

        let layout_dirty_this_turn = self.damage.should_relayout();
        let need_relayout = !self.rendered_once || layout_dirty_this_turn || signatures_changed;

        if need_relayout {
            let previous = std::mem::replace(&mut self.layout, layout::compute_layout(&self.tree, outcome.root, self.viewport));
            self.prev_layout = Some(previous);
        } else {
            self.prev_layout = None;
        }

        let overlay_open = tree_has_overlay(&self.tree);
        let next_focus_public_id = self
            .router
            .focus
            .focused()
            .and_then(|id| self.tree.get(id))
            .and_then(|inst| inst.vnode.id.clone());

        let render_ctx = RenderContext {
            tree: &self.tree,
            outcome: &outcome,
            layout: &self.layout,
            prev_layout: self.prev_layout.as_ref(),
            viewport: self.viewport,
            theme_id: 0,
            explicit_layout_requested: layout_dirty_this_turn,
            transitions_active: !self.commit_engine.exit_animations().is_empty(),
            overlay_open,
            prev_focus_public_id: self.last_focus_public_id.as_deref(),
            next_focus_public_id: next_focus_public_id.as_deref(),
        };
        let decision = self.damage.decide(&render_ctx);
        self.damage.dirty_flags().clear_since(&snapshot);
        self.last_focus_public_id = next_focus_public_id;

        let rects = match &decision {
            RenderDecision::Full => vec![self.viewport],
            RenderDecision::Incremental(rects) => rects.clone(),
        };

        let mut builder = DrawlistBuilder::new();
        self.build_drawlist(&mut builder, &rects)?;
        let bytes = builder.finish()?;
        if bytes.len() > self.config.max_drawlist_bytes {
            return Err(CoreError::DrawlistBuildError(format!(
                "drawlist of {} bytes exceeds configured max_drawlist_bytes {}",
                bytes.len(),
                self.config.max_drawlist_bytes
            )));
        }
        self.last_drawlist = Some(bytes.clone());

        self.lifecycle.note_frame_submitted();
        let ack = self.backend.request_frame(bytes).await?;
        if let Some(hook) = self.config.internal_on_render {
            hook();
        }
        self.spawn_frame_ack_watcher(ack);

        for anim in self.commit_engine.retire_exit_animations(self.now_ms) {
            drop(anim);
        }

        self.rendered_once = true;
        if need_relayout {
            if let Some(hook) = self.config.internal_on_layout {
                hook();
            }
        }

        Ok(())
    }

    fn spawn_frame_ack_watcher(&self, mut ack: FrameAck) {
        let tx = self.work_tx.clone();
        tokio::spawn(async move {
            if let Some(accepted) = ack.accepted.take() {
                let _ = accepted.await;
            }
            match ack.completed.await {
                Ok(Ok(())) => {
                    let _ = tx.send(WorkItem::FrameDone);
                }
                Ok(Err(e)) => {
                    let _ = tx.send(WorkItem::FrameError(e));
                }
                Err(_) => {
                    let _ = tx.send(WorkItem::FrameError(CoreError::BackendError(
                        "frame ack channel dropped before completion".into(),
                    )));
                }
            }
        });
    }

    /// Walks the committed tree, clipped to `rects`, emitting drawlist
    /// opcodes. Colors are fixed numeric placeholders: there is no
    /// CSS/theme cascade engine here (`vnode::Style` carries no color
    /// fields), so resolving `markup::Color` beyond a direct RGB pass-through
    /// is out of scope.
    fn build_drawlist(&self, builder: &mut DrawlistBuilder, rects: &[Rect]) -> Result<()> {
        for rect in rects {
            builder.push_clip(*rect);
            builder.fill_rect(*rect, 0);
            if let Some(root) = self.tree.root {
                self.draw_node(builder, root, rect);
            }
            builder.pop_clip()?;
        }

        if self.config.use_v2_cursor {
            let cursor_rect = self
                .router
                .focus
                .focused()
                .and_then(|id| self.tree.get(id))
                .and_then(|inst| inst.vnode.id.as_deref())
                .and_then(|public_id| self.layout.rect_by_public_id.get(public_id));
            match cursor_rect {
                Some(rect) => builder.set_cursor(rect.x, rect.y)?,
                None => builder.hide_cursor(),
            }
        }

        Ok(())
    }

    fn draw_node(&self, builder: &mut DrawlistBuilder, id: InstanceId, clip: &Rect) {
        let Some(inst) = self.tree.get(id) else { return };
        if !inst.vnode.style.visible {
            return;
        }
        let Some(rect) = self.layout.rect_by_instance_id.get(&id) else { return };
        if !rect.intersects(clip) {
            return;
        }

        match &inst.vnode.payload {
            VNodePayload::Leaf(LeafPayload::Text { content, .. }) => {
                builder.draw_text_slice(rect.x, rect.y, content, 0xFFFFFF, 0);
            }
            VNodePayload::Leaf(LeafPayload::RichText { content, spans }) => {
                let segments: Vec<(String, u32, u32)> = spans
                    .iter()
                    .filter_map(|span| {
                        content.get(span.start..span.end).map(|slice| {
                            (slice.to_string(), color_to_u32(span.style.fg.as_ref()), color_to_u32(span.style.bg.as_ref()))
                        })
                    })
                    .collect();
                builder.draw_text_run(rect.x, rect.y, &segments);
            }
            VNodePayload::Leaf(LeafPayload::Icon { glyph }) => {
                builder.draw_text_slice(rect.x, rect.y, &glyph.to_string(), 0xFFFFFF, 0);
            }
            VNodePayload::Leaf(LeafPayload::Divider) => {
                builder.fill_rect(*rect, 0);
            }
            VNodePayload::Leaf(LeafPayload::Spacer) => {}
            _ => {}
        }

        for &child in &inst.children {
            self.draw_node(builder, child, clip);
        }
    }

    async fn handle_fatal(&mut self, err: CoreError) {
        log::error!("fatal error, transitioning to Faulted: {err}");
        let mut handlers = std::mem::take(&mut self.fatal_handlers);
        for handler in handlers.iter_mut() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(&err)));
            if result.is_err() {
                log::warn!("fatal handler panicked; swallowed per tier-3 error handling");
            }
        }
        self.fatal_handlers = handlers;
        self.lifecycle.do_fatal();
        let _ = self.backend.stop().await;
        let _ = self.backend.dispose().await;
    }
}

fn collect_signatures(tree: &InstanceTree, id: InstanceId, out: &mut HashMap<InstanceId, u64>) {
    let Some(inst) = tree.get(id) else { return };
    out.insert(id, inst.vnode.layout_signature());
    for &child in &inst.children {
        collect_signatures(tree, child, out);
    }
}

/// A frame with an open modal, dropdown, or non-empty toast stack is never
/// incremental-eligible (`spec.md` §4.6): any of those can paint over
/// arbitrary prior content, so the damage set from identity-diff alone
/// cannot be trusted to cover it.
fn tree_has_overlay(tree: &InstanceTree) -> bool {
    match tree.root {
        Some(root) => overlay_walk(tree, root),
        None => false,
    }
}

fn overlay_walk(tree: &InstanceTree, id: InstanceId) -> bool {
    let Some(inst) = tree.get(id) else { return false };
    let is_overlay = match &inst.vnode.payload {
        VNodePayload::Container(ContainerPayload::Modal { .. }) => true,
        VNodePayload::Interactive(InteractivePayload::Dropdown { open, .. }) => *open,
        VNodePayload::Interactive(InteractivePayload::ToastContainer { toasts }) => !toasts.is_empty(),
        VNodePayload::Interactive(InteractivePayload::ToolApprovalDialog { .. }) => true,
        _ => false,
    };
    if is_overlay {
        return true;
    }
    inst.children.iter().any(|&child| overlay_walk(tree, child))
}

fn color_to_u32(color: Option<&markup::Color>) -> u32 {
    match color {
        Some(markup::Color::Rgb(r, g, b)) => ((*r as u32) << 16) | ((*g as u32) << 8) | (*b as u32),
        _ => 0xFFFFFF,
    }
}
