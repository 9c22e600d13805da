//! The commit/reconciliation engine (`spec.md` §4.5).
//!
//! `CommitEngine::commit` walks a fresh `VNode` tree against the previous
//! `InstanceTree`, matching children by key first and by position second,
//! and decides for each node whether to fully reuse, mutate in place, or
//! allocate a new runtime instance — the three-way branch spelled out in
//! §4.5's "Reconciliation rule".

pub mod composite;
pub mod error_boundary;
pub mod exit_anim;

use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::{CoreError, Result};
use crate::instance::{InstanceId, InstanceIdAllocator, InstanceTree, RuntimeInstance};
use crate::vnode::{
    ContainerKind, ContainerPayload, ErrorInfo, RetryHandle, VNode, VNodePayload, VNodeTag,
};

use composite::CompositeState;
use error_boundary::{BoundaryPath, ErrorBoundaryRegistry};
use exit_anim::{ExitAnimationRegistry, PendingExitAnimation};

/// `spec.md` §9: "Maximum layout nesting depth is 500; 200 logs a
/// development warning."
const MAX_NESTING_DEPTH: u32 = 500;
const WARN_NESTING_DEPTH: u32 = 200;
/// `spec.md` §9: composite render recursion is capped separately from
/// layout nesting, at 100.
const MAX_COMPOSITE_DEPTH: u32 = 100;

pub struct CommitOutcome {
    pub root: InstanceId,
    pub mounted: Vec<InstanceId>,
    pub reused: Vec<InstanceId>,
    pub unmounted: Vec<InstanceId>,
}

#[derive(Default)]
struct CommitScratch {
    id_scratch: HashMap<String, &'static str>,
    mounted: Vec<InstanceId>,
    reused: Vec<InstanceId>,
    unmounted: Vec<InstanceId>,
}

pub struct CommitEngine {
    id_alloc: InstanceIdAllocator,
    composites: HashMap<InstanceId, CompositeState>,
    /// Shared so that `RetryHandle` closures handed to error-boundary
    /// fallbacks can request a retry from outside the commit call that
    /// created them (`spec.md` §5's single-threaded `Rc` cooperative model).
    error_boundaries: Rc<RefCell<ErrorBoundaryRegistry>>,
    exit_animations: ExitAnimationRegistry,
}

impl Default for CommitEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitEngine {
    pub fn new() -> Self {
        Self {
            id_alloc: InstanceIdAllocator::new(),
            composites: HashMap::new(),
            error_boundaries: Rc::new(RefCell::new(ErrorBoundaryRegistry::new())),
            exit_animations: ExitAnimationRegistry::new(),
        }
    }

    pub fn exit_animations(&self) -> &ExitAnimationRegistry {
        &self.exit_animations
    }

    pub fn retire_exit_animations(&mut self, now_ms: u64) -> Vec<PendingExitAnimation> {
        self.exit_animations.retire_completed(now_ms)
    }

    pub fn commit(
        &mut self,
        tree: &mut InstanceTree,
        app_state: &dyn Any,
        now_ms: u64,
        next_root: VNode,
    ) -> Result<CommitOutcome> {
        let mut scratch = CommitScratch::default();
        let mut boundary_path = BoundaryPath::new();
        let prev_root = tree.root;
        let (root_id, _changed) = self.reconcile_node(
            tree,
            prev_root,
            next_root,
            InstanceId::ROOT_PARENT,
            0,
            0,
            &mut boundary_path,
            app_state,
            now_ms,
            &mut scratch,
        )?;
        tree.root = Some(root_id);
        tree.recompute_dirty_bit(root_id);
        Ok(CommitOutcome {
            root: root_id,
            mounted: scratch.mounted,
            reused: scratch.reused,
            unmounted: scratch.unmounted,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn reconcile_node(
        &mut self,
        tree: &mut InstanceTree,
        prev: Option<InstanceId>,
        next: VNode,
        parent: InstanceId,
        depth: u32,
        composite_depth: u32,
        boundary_path: &mut BoundaryPath,
        app_state: &dyn Any,
        now_ms: u64,
        scratch: &mut CommitScratch,
    ) -> Result<(InstanceId, bool)> {
        if depth > MAX_NESTING_DEPTH {
            return Err(CoreError::MaxDepth(format!(
                "layout nesting exceeded {MAX_NESTING_DEPTH}"
            )));
        }
        if depth == WARN_NESTING_DEPTH {
            log::warn!("layout nesting depth reached {WARN_NESTING_DEPTH}; consider flattening this subtree");
        }

        if let Some(id) = &next.id {
            if let Some(&first_kind) = scratch.id_scratch.get(id) {
                return Err(CoreError::DuplicateId {
                    id: id.clone(),
                    first_kind,
                    second_kind: next.tag.name(),
                });
            }
            scratch.id_scratch.insert(id.clone(), next.tag.name());
        }

        self.exit_animations
            .cancel_if_reentrant(parent, next.tag, next.key.as_ref());

        match next.tag {
            VNodeTag::Composite => self.handle_composite(
                tree,
                prev,
                next,
                parent,
                depth,
                composite_depth,
                boundary_path,
                app_state,
                now_ms,
                scratch,
            ),
            VNodeTag::Container(ContainerKind::ErrorBoundary) => self.handle_error_boundary(
                tree,
                prev,
                next,
                parent,
                depth,
                composite_depth,
                boundary_path,
                app_state,
                now_ms,
                scratch,
            ),
            VNodeTag::Container(_) => self.handle_container(
                tree,
                prev,
                next,
                parent,
                depth,
                composite_depth,
                boundary_path,
                app_state,
                now_ms,
                scratch,
            ),
            VNodeTag::Leaf(_) | VNodeTag::Interactive(_) => {
                self.handle_leafy(tree, prev, next, parent, now_ms, scratch)
            }
        }
    }

    /// Leaves and interactive widgets never have VNode children of their
    /// own (interactive payloads carry counts/strings, not child VNodes),
    /// so they share one fast path: reuse on shallow prop equality, else
    /// allocate.
    fn handle_leafy(
        &mut self,
        tree: &mut InstanceTree,
        prev: Option<InstanceId>,
        next: VNode,
        parent: InstanceId,
        now_ms: u64,
        scratch: &mut CommitScratch,
    ) -> Result<(InstanceId, bool)> {
        if let Some(pid) = prev {
            if let Some(inst) = tree.get(pid) {
                if inst.vnode.tag == next.tag && props_eq(&inst.vnode, &next) {
                    tree.reuse_in_place(pid, next);
                    scratch.reused.push(pid);
                    return Ok((pid, false));
                }
            }
        }
        let id = self.id_alloc.alloc();
        if let Some(pid) = prev {
            self.unmount_instance(tree, pid, parent, now_ms, scratch);
        }
        tree.insert(RuntimeInstance {
            id,
            parent: Some(parent),
            vnode: next,
            children: Vec::new(),
            self_dirty: true,
            dirty: true,
            widget_key: None,
            generation: 0,
        });
        scratch.mounted.push(id);
        Ok((id, true))
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_container(
        &mut self,
        tree: &mut InstanceTree,
        prev: Option<InstanceId>,
        mut next: VNode,
        parent: InstanceId,
        depth: u32,
        composite_depth: u32,
        boundary_path: &mut BoundaryPath,
        app_state: &dyn Any,
        now_ms: u64,
        scratch: &mut CommitScratch,
    ) -> Result<(InstanceId, bool)> {
        let props_same = prev
            .and_then(|p| tree.get(p))
            .map(|inst| props_eq(&inst.vnode, &next))
            .unwrap_or(false);
        let self_id = if props_same {
            prev.expect("props_same implies prev is Some")
        } else {
            self.id_alloc.alloc()
        };

        let prev_children_ids: Vec<InstanceId> = prev
            .and_then(|p| tree.get(p))
            .map(|inst| inst.children.clone())
            .unwrap_or_default();

        let next_children = std::mem::take(&mut next.children);
        let (new_children_ids, children_changed) = self.reconcile_children(
            tree,
            &prev_children_ids,
            next_children,
            self_id,
            depth + 1,
            composite_depth,
            boundary_path,
            app_state,
            now_ms,
            scratch,
        )?;

        if props_same {
            if children_changed {
                tree.mutate_children_in_place(self_id, new_children_ids, next);
            } else {
                tree.reuse_in_place(self_id, next);
                scratch.reused.push(self_id);
            }
            Ok((self_id, children_changed))
        } else {
            if let Some(pid) = prev {
                tree.remove(pid);
            }
            tree.insert(RuntimeInstance {
                id: self_id,
                parent: Some(parent),
                vnode: next,
                children: new_children_ids,
                self_dirty: true,
                dirty: true,
                widget_key: None,
                generation: 0,
            });
            scratch.mounted.push(self_id);
            Ok((self_id, true))
        }
    }

    /// Keyed-match pass, then positional-match pass, per §4.5's
    /// reconciliation rule: "children with the same key and kind are
    /// paired first; remaining children are paired positionally."
    #[allow(clippy::too_many_arguments)]
    fn reconcile_children(
        &mut self,
        tree: &mut InstanceTree,
        prev_children_ids: &[InstanceId],
        next_children: Vec<VNode>,
        parent: InstanceId,
        depth: u32,
        composite_depth: u32,
        boundary_path: &mut BoundaryPath,
        app_state: &dyn Any,
        now_ms: u64,
        scratch: &mut CommitScratch,
    ) -> Result<(Vec<InstanceId>, bool)> {
        let mut keyed_prev: HashMap<(&'static str, String), InstanceId> = HashMap::new();
        let mut positional_prev: std::collections::VecDeque<InstanceId> = std::collections::VecDeque::new();
        for &pid in prev_children_ids {
            if let Some(inst) = tree.get(pid) {
                if let Some(key) = &inst.vnode.key {
                    keyed_prev.insert((inst.vnode.tag.name(), key.clone()), pid);
                } else {
                    positional_prev.push_back(pid);
                }
            }
        }

        let mut seen_keys: HashSet<(&'static str, String)> = HashSet::new();
        let next_count = next_children.len();
        let mut new_ids = Vec::with_capacity(next_count);
        let mut any_changed = next_count != prev_children_ids.len();

        for (index, child) in next_children.into_iter().enumerate() {
            let matched = if let Some(key) = &child.key {
                let lookup = (child.tag.name(), key.clone());
                if !seen_keys.insert(lookup.clone()) {
                    return Err(CoreError::DuplicateKey {
                        key: key.clone(),
                        kind: child.tag.name(),
                    });
                }
                keyed_prev.remove(&lookup)
            } else {
                positional_prev.pop_front()
            };

            boundary_path.push(index);
            let (child_id, changed) = self.reconcile_node(
                tree,
                matched,
                child,
                parent,
                depth,
                composite_depth,
                boundary_path,
                app_state,
                now_ms,
                scratch,
            )?;
            boundary_path.pop();

            if changed || matched.is_none() {
                any_changed = true;
            }
            new_ids.push(child_id);
        }

        for (_, leftover) in keyed_prev {
            self.unmount_instance(tree, leftover, parent, now_ms, scratch);
            any_changed = true;
        }
        for leftover in positional_prev {
            self.unmount_instance(tree, leftover, parent, now_ms, scratch);
            any_changed = true;
        }

        Ok((new_ids, any_changed))
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_composite(
        &mut self,
        tree: &mut InstanceTree,
        prev: Option<InstanceId>,
        next: VNode,
        parent: InstanceId,
        depth: u32,
        composite_depth: u32,
        boundary_path: &mut BoundaryPath,
        app_state: &dyn Any,
        now_ms: u64,
        scratch: &mut CommitScratch,
    ) -> Result<(InstanceId, bool)> {
        if composite_depth >= MAX_COMPOSITE_DEPTH {
            return Err(CoreError::MaxDepth(format!(
                "composite render recursion exceeded {MAX_COMPOSITE_DEPTH}"
            )));
        }

        let (widget_key, render_fn) = match &next.payload {
            VNodePayload::Composite(payload) => (payload.widget_key.clone(), payload.render.clone()),
            _ => unreachable!("dispatched only for VNodeTag::Composite"),
        };

        let is_new = prev.is_none();
        let self_id = prev.unwrap_or_else(|| self.id_alloc.alloc());

        {
            let state = self
                .composites
                .entry(self_id)
                .or_insert_with(|| CompositeState::new(widget_key.clone()));
            if state.widget_key != widget_key {
                state.invalidate(widget_key.clone());
            }
            state.run_pending_cleanups();
        }

        let render_result = {
            let state = self.composites.get(&self_id).expect("just inserted above");
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let ctx = composite::CompositeCtx::new(
                    self_id,
                    app_state,
                    state.hooks_cell(),
                    state.pending_effects_cell(),
                );
                render_fn(&ctx)
            }))
        };

        let rendered = match render_result {
            Ok(vnode) => vnode,
            Err(_) => {
                self.composites.remove(&self_id);
                return Err(CoreError::UserCodeThrow(format!(
                    "composite {widget_key:?} panicked during render"
                )));
            }
        };

        if let Some(state) = self.composites.get(&self_id) {
            state.commit_effects();
        }

        let prev_children_ids: Vec<InstanceId> = prev
            .and_then(|p| tree.get(p))
            .map(|inst| inst.children.clone())
            .unwrap_or_default();
        let prev_single_child = prev_children_ids.first().copied();

        boundary_path.push(0);
        let child_result = self.reconcile_node(
            tree,
            prev_single_child,
            rendered,
            self_id,
            depth + 1,
            composite_depth + 1,
            boundary_path,
            app_state,
            now_ms,
            scratch,
        );
        boundary_path.pop();
        let (child_id, child_changed) = child_result?;

        for &stray in prev_children_ids.iter().skip(1) {
            self.unmount_instance(tree, stray, self_id, now_ms, scratch);
        }

        let vnode_for_storage = VNode {
            children: Vec::new(),
            ..next
        };

        if is_new {
            tree.insert(RuntimeInstance {
                id: self_id,
                parent: Some(parent),
                vnode: vnode_for_storage,
                children: vec![child_id],
                self_dirty: true,
                dirty: true,
                widget_key: Some(widget_key),
                generation: 0,
            });
            scratch.mounted.push(self_id);
            Ok((self_id, true))
        } else if child_changed {
            tree.mutate_children_in_place(self_id, vec![child_id], vnode_for_storage);
            Ok((self_id, true))
        } else {
            tree.reuse_in_place(self_id, vnode_for_storage);
            scratch.reused.push(self_id);
            Ok((self_id, false))
        }
    }

    /// Error boundary containers carry exactly one protected child. If
    /// reconciling it returns `UserCodeThrow`, the error is recorded under
    /// this boundary's structural path and `fallback(error, retry)` is
    /// committed in its place (`spec.md` §4.5 "Error boundaries").
    #[allow(clippy::too_many_arguments)]
    fn handle_error_boundary(
        &mut self,
        tree: &mut InstanceTree,
        prev: Option<InstanceId>,
        mut next: VNode,
        parent: InstanceId,
        depth: u32,
        composite_depth: u32,
        boundary_path: &mut BoundaryPath,
        app_state: &dyn Any,
        now_ms: u64,
        scratch: &mut CommitScratch,
    ) -> Result<(InstanceId, bool)> {
        let fallback = match &next.payload {
            VNodePayload::Container(ContainerPayload::ErrorBoundary { fallback }) => fallback.clone(),
            _ => unreachable!("dispatched only for error-boundary containers"),
        };

        if next.children.len() > 1 {
            log::warn!(
                "error-boundary container has {} children; only the first is protected",
                next.children.len()
            );
        }
        let protected_child = std::mem::take(&mut next.children).into_iter().next();

        let props_same = prev
            .and_then(|p| tree.get(p))
            .map(|inst| props_eq(&inst.vnode, &next))
            .unwrap_or(false);
        let self_id = if props_same {
            prev.expect("props_same implies prev is Some")
        } else {
            self.id_alloc.alloc()
        };

        let prev_children_ids: Vec<InstanceId> = prev
            .and_then(|p| tree.get(p))
            .map(|inst| inst.children.clone())
            .unwrap_or_default();
        let prev_child = prev_children_ids.first().copied();

        boundary_path.push(0);
        let my_path = boundary_path.clone();

        let retry = self.error_boundaries.borrow_mut().take_retry(&my_path);
        let had_error = self.error_boundaries.borrow().error_at(&my_path).is_some();

        let mut attempt_result = None;
        if !had_error || retry {
            if let Some(child_vnode) = protected_child {
                match self.reconcile_node(
                    tree,
                    prev_child,
                    child_vnode,
                    self_id,
                    depth + 1,
                    composite_depth,
                    boundary_path,
                    app_state,
                    now_ms,
                    scratch,
                ) {
                    Ok(ok) => attempt_result = Some(ok),
                    Err(CoreError::UserCodeThrow(message)) => {
                        self.error_boundaries
                            .borrow_mut()
                            .record_error(my_path.clone(), ErrorInfo { message });
                    }
                    Err(other) => {
                        boundary_path.pop();
                        return Err(other);
                    }
                }
            }
        }

        let (child_id, child_changed) = match attempt_result {
            Some(ok) => ok,
            None => {
                let error_info = self
                    .error_boundaries
                    .borrow()
                    .error_at(&my_path)
                    .cloned()
                    .unwrap_or(ErrorInfo {
                        message: "error boundary has no protected child".to_string(),
                    });
                let registry = self.error_boundaries.clone();
                let retry_path = my_path.clone();
                let retry_handle = RetryHandle {
                    retry: Rc::new(move || {
                        registry.borrow_mut().request_retry(retry_path.clone());
                    }),
                };
                let fallback_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    fallback(&error_info, retry_handle)
                }));
                let fallback_vnode = match fallback_result {
                    Ok(vnode) => vnode,
                    Err(_) => {
                        boundary_path.pop();
                        return Err(CoreError::UserCodeThrow(
                            "error-boundary fallback panicked while rendering".to_string(),
                        ));
                    }
                };
                let reconciled = self.reconcile_node(
                    tree,
                    prev_child,
                    fallback_vnode,
                    self_id,
                    depth + 1,
                    composite_depth,
                    boundary_path,
                    app_state,
                    now_ms,
                    scratch,
                );
                match reconciled {
                    Ok(ok) => ok,
                    Err(other) => {
                        boundary_path.pop();
                        return Err(other);
                    }
                }
            }
        };
        boundary_path.pop();

        for &stray in prev_children_ids.iter().skip(1) {
            self.unmount_instance(tree, stray, self_id, now_ms, scratch);
        }

        let vnode_for_storage = VNode {
            children: Vec::new(),
            ..next
        };

        if props_same {
            if child_changed {
                tree.mutate_children_in_place(self_id, vec![child_id], vnode_for_storage);
            } else {
                tree.reuse_in_place(self_id, vnode_for_storage);
                scratch.reused.push(self_id);
            }
            Ok((self_id, child_changed))
        } else {
            if let Some(pid) = prev {
                tree.remove(pid);
            }
            tree.insert(RuntimeInstance {
                id: self_id,
                parent: Some(parent),
                vnode: vnode_for_storage,
                children: vec![child_id],
                self_dirty: true,
                dirty: true,
                widget_key: None,
                generation: 0,
            });
            scratch.mounted.push(self_id);
            Ok((self_id, true))
        }
    }

    /// Removes `id` from the live tree. If its vnode declared an
    /// `exit_transition`, the subtree is kept alive inside the exit-animation
    /// registry instead of being recursively torn down (`spec.md` §4.5
    /// "Exit animations"); otherwise it's dropped immediately and its
    /// children are unmounted recursively so nested composites run their
    /// cleanups and nested exit transitions still get a chance to play.
    fn unmount_instance(
        &mut self,
        tree: &mut InstanceTree,
        id: InstanceId,
        parent_id: InstanceId,
        now_ms: u64,
        scratch: &mut CommitScratch,
    ) {
        let Some(instance) = tree.remove(id) else {
            return;
        };
        scratch.unmounted.push(id);

        if let Some(state) = self.composites.remove(&id) {
            state.run_pending_cleanups();
        }

        if let Some(exit) = instance.vnode.exit_transition.clone() {
            let kind = instance.vnode.tag;
            let key = instance.vnode.key.clone();
            self.exit_animations.schedule(PendingExitAnimation {
                parent_id,
                kind,
                key,
                start_time_ms: now_ms,
                duration_ms: exit.duration_ms,
                easing: exit.easing,
                // Composite cleanups for this node already ran above; state
                // teardown happens immediately even though the visual lingers.
                cleanup: None,
                snapshot: instance,
            });
        } else {
            for child_id in instance.children {
                self.unmount_instance(tree, child_id, id, now_ms, scratch);
            }
        }
    }
}

/// Shallow structural equality used by the fast-equality checks in §4.5:
/// id, key, style, exit transition, and payload — but not children, which
/// the caller reconciles separately.
fn props_eq(a: &VNode, b: &VNode) -> bool {
    a.id == b.id
        && a.key == b.key
        && a.style == b.style
        && a.exit_transition == b.exit_transition
        && payload_eq(&a.payload, &b.payload)
}

fn payload_eq(a: &VNodePayload, b: &VNodePayload) -> bool {
    match (a, b) {
        (VNodePayload::Container(x), VNodePayload::Container(y)) => x == y,
        (VNodePayload::Leaf(x), VNodePayload::Leaf(y)) => x == y,
        (VNodePayload::Interactive(x), VNodePayload::Interactive(y)) => x == y,
        (VNodePayload::Composite(x), VNodePayload::Composite(y)) => x.widget_key == y.widget_key,
        _ => false,
    }
}
