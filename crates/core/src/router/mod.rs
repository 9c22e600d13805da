//! The event router (`spec.md` §4.7).
//!
//! A fixed fifteen-level precedence chain run per event: each level gets a
//! chance to consume the event before the next is tried. Rather than one
//! giant `match`, each level lives in its own submodule (mirroring how the
//! teacher splits routing concerns across one file per widget) and returns
//! `Option<RouteResult>` — `None` means "fell through, try the next level."
//!
//! The router mutates its own focus/widget-local state directly (the
//! committed tree and layout are read-only inputs) and hands back
//! [`RouterAction`]s describing what an application-level callback should
//! run; `app.rs` drains those against the composite callbacks recorded at
//! commit time and enqueues any resulting state updates.

pub mod default_mouse;
pub mod dropdown;
pub mod focus;
pub mod input_editing;
pub mod list_routing;
pub mod modal;
pub mod overlay_shortcuts;
pub mod split_pane;

use crate::event::Event;
use crate::instance::{InstanceId, InstanceTree};
use crate::layout::LayoutTree;

/// Side effects the router decided on (`spec.md` §4.7's "mutates
/// focus/widget-local state, emits actions, enqueues state updates").
#[derive(Debug, Clone, PartialEq)]
pub enum RouterAction {
    Press(InstanceId),
    ValueChanged(InstanceId, String),
    SelectionChanged(InstanceId, usize),
    ScrollBy(InstanceId, i32, i32),
    FocusChanged { previous: Option<InstanceId>, next: Option<InstanceId> },
    RequestClose(InstanceId),
    ClipboardWrite(String),
    ClipboardCut(String),
    ShortcutMatched(String),
    ContextMenuOpened { target: InstanceId, x: i32, y: i32 },
    DoubleClick(InstanceId),
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RouteResult {
    pub consumed: bool,
    pub actions: Vec<RouterAction>,
}

impl RouteResult {
    pub fn consumed(actions: Vec<RouterAction>) -> Self {
        Self { consumed: true, actions }
    }

    pub fn consumed_no_action() -> Self {
        Self { consumed: true, actions: Vec::new() }
    }
}

/// Read-only inputs a routing level needs: the committed tree for
/// hit-testing/zone discovery and the layout tree for mouse geometry.
pub struct RouteContext<'a> {
    pub tree: &'a InstanceTree,
    pub layout: &'a LayoutTree,
    pub now_ms: u64,
}

/// All per-session router state, threaded across turns.
#[derive(Default)]
pub struct RouterState {
    pub shortcuts: overlay_shortcuts::ShortcutTrie,
    pub focus: focus::FocusState,
    pub dropdown: dropdown::DropdownState,
    pub split_pane: split_pane::SplitPaneState,
    pub lists: list_routing::ListRoutingState,
    pub inputs: input_editing::InputEditingState,
}

impl RouterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one event through the precedence chain, rebuilding focus zones
    /// from the current tree first (`spec.md` §4.7 "Focus zones & traps").
    pub fn route(&mut self, event: &Event, ctx: &RouteContext) -> RouteResult {
        self.focus.rebuild_zones(ctx.tree);

        if let Some(r) = overlay_shortcuts::route(&mut self.shortcuts, event) {
            return r;
        }
        if let Some(r) = dropdown::route_navigation(&mut self.dropdown, event, ctx) {
            return r;
        }
        if let Some(r) = modal::route_escape(event, ctx) {
            return r;
        }
        if let Some(r) = dropdown::route_mouse(&mut self.dropdown, event, ctx) {
            return r;
        }
        if let Some(r) = modal::route_backdrop_mouse(event, ctx) {
            return r;
        }
        if let Some(r) = split_pane::route_mouse(&mut self.split_pane, event, ctx) {
            return r;
        }
        if let Some(r) = list_routing::route_toast_mouse(&mut self.lists, event, ctx) {
            return r;
        }
        if let Some(r) = list_routing::route_focused_widget_keys(event, ctx, self.focus.focused()) {
            return r;
        }
        if let Some(r) = list_routing::route_wheel(&mut self.lists, event, ctx) {
            return r;
        }
        if let Some(r) = input_editing::route_text_or_paste(&mut self.inputs, event, ctx, self.focus.focused()) {
            return r;
        }
        if let Some(r) = list_routing::route_click(&mut self.lists, event, ctx) {
            return r;
        }
        if let Some(r) = list_routing::route_context_menu(event, ctx) {
            return r;
        }
        if let Some(r) = self.focus.route_traversal(event) {
            return r;
        }
        if let Some(r) = default_mouse::route(&mut self.lists, event, ctx) {
            return r;
        }
        if let Some(r) = input_editing::route_editing(&mut self.inputs, event, ctx, self.focus.focused()) {
            return r;
        }

        RouteResult::default()
    }
}
