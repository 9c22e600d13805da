//! The VNode value model (`spec.md` §3).
//!
//! `spec.md` §9 calls out that the source language models VNode props as
//! structurally typed records, and that a systems language should model
//! each widget kind as a tagged variant with a fixed record, with
//! polymorphism over the capability set expressed via a per-kind protocol
//! table looked up by the tag. That is exactly the shape below: `VNodeTag`
//! is the tag, `VNodePayload` is the fixed-record-per-kind, and
//! `Capabilities`/`capabilities_for` is the protocol table.

use std::rc::Rc;

use bitflags::bitflags;

use crate::fraction::Fraction;

pub type Key = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Box,
    Row,
    Column,
    Grid,
    Layers,
    Field,
    Tabs,
    Modal,
    Layer,
    FocusZone,
    FocusTrap,
    SplitPane,
    PanelGroup,
    Themed,
    ErrorBoundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Text,
    Spacer,
    Divider,
    RichText,
    Icon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractiveKind {
    Button,
    Link,
    Input,
    Slider,
    Select,
    Checkbox,
    RadioGroup,
    Dropdown,
    VirtualList,
    Table,
    Tree,
    FilePicker,
    FileTreeExplorer,
    CommandPalette,
    DiffViewer,
    CodeEditor,
    LogsConsole,
    ToolApprovalDialog,
    ToastContainer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VNodeTag {
    Container(ContainerKind),
    Leaf(LeafKind),
    Interactive(InteractiveKind),
    Composite,
}

impl VNodeTag {
    pub fn name(&self) -> &'static str {
        match self {
            VNodeTag::Container(ContainerKind::Box) => "box",
            VNodeTag::Container(ContainerKind::Row) => "row",
            VNodeTag::Container(ContainerKind::Column) => "column",
            VNodeTag::Container(ContainerKind::Grid) => "grid",
            VNodeTag::Container(ContainerKind::Layers) => "layers",
            VNodeTag::Container(ContainerKind::Field) => "field",
            VNodeTag::Container(ContainerKind::Tabs) => "tabs",
            VNodeTag::Container(ContainerKind::Modal) => "modal",
            VNodeTag::Container(ContainerKind::Layer) => "layer",
            VNodeTag::Container(ContainerKind::FocusZone) => "focus-zone",
            VNodeTag::Container(ContainerKind::FocusTrap) => "focus-trap",
            VNodeTag::Container(ContainerKind::SplitPane) => "split-pane",
            VNodeTag::Container(ContainerKind::PanelGroup) => "panel-group",
            VNodeTag::Container(ContainerKind::Themed) => "themed",
            VNodeTag::Container(ContainerKind::ErrorBoundary) => "error-boundary",
            VNodeTag::Leaf(LeafKind::Text) => "text",
            VNodeTag::Leaf(LeafKind::Spacer) => "spacer",
            VNodeTag::Leaf(LeafKind::Divider) => "divider",
            VNodeTag::Leaf(LeafKind::RichText) => "rich-text",
            VNodeTag::Leaf(LeafKind::Icon) => "icon",
            VNodeTag::Interactive(InteractiveKind::Button) => "button",
            VNodeTag::Interactive(InteractiveKind::Link) => "link",
            VNodeTag::Interactive(InteractiveKind::Input) => "input",
            VNodeTag::Interactive(InteractiveKind::Slider) => "slider",
            VNodeTag::Interactive(InteractiveKind::Select) => "select",
            VNodeTag::Interactive(InteractiveKind::Checkbox) => "checkbox",
            VNodeTag::Interactive(InteractiveKind::RadioGroup) => "radio-group",
            VNodeTag::Interactive(InteractiveKind::Dropdown) => "dropdown",
            VNodeTag::Interactive(InteractiveKind::VirtualList) => "virtual-list",
            VNodeTag::Interactive(InteractiveKind::Table) => "table",
            VNodeTag::Interactive(InteractiveKind::Tree) => "tree",
            VNodeTag::Interactive(InteractiveKind::FilePicker) => "file-picker",
            VNodeTag::Interactive(InteractiveKind::FileTreeExplorer) => "file-tree-explorer",
            VNodeTag::Interactive(InteractiveKind::CommandPalette) => "command-palette",
            VNodeTag::Interactive(InteractiveKind::DiffViewer) => "diff-viewer",
            VNodeTag::Interactive(InteractiveKind::CodeEditor) => "code-editor",
            VNodeTag::Interactive(InteractiveKind::LogsConsole) => "logs-console",
            VNodeTag::Interactive(InteractiveKind::ToolApprovalDialog) => "tool-approval-dialog",
            VNodeTag::Interactive(InteractiveKind::ToastContainer) => "toast-container",
            VNodeTag::Composite => "composite",
        }
    }
}

bitflags! {
    /// Per-kind protocol table (`spec.md` §9), looked up once by tag rather
    /// than tested ad hoc at every call site.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        const FOCUSABLE               = 0b0001;
        const PRESSABLE                = 0b0010;
        const REQUIRES_ID              = 0b0100;
        const REQUIRES_ROUTING_REBUILD = 0b1000;
    }
}

pub fn capabilities_for(tag: VNodeTag) -> Capabilities {
    use Capabilities as C;
    match tag {
        VNodeTag::Interactive(kind) => {
            let mut caps = C::REQUIRES_ID | C::FOCUSABLE;
            if matches!(kind, InteractiveKind::Button | InteractiveKind::Link) {
                caps |= C::PRESSABLE;
            }
            if matches!(
                kind,
                InteractiveKind::Dropdown
                    | InteractiveKind::Select
                    | InteractiveKind::CommandPalette
                    | InteractiveKind::ToastContainer
            ) {
                caps |= C::REQUIRES_ROUTING_REBUILD;
            }
            caps
        }
        VNodeTag::Container(
            ContainerKind::Modal
            | ContainerKind::Layer
            | ContainerKind::FocusZone
            | ContainerKind::FocusTrap
            | ContainerKind::SplitPane,
        ) => C::REQUIRES_ROUTING_REBUILD,
        _ => C::empty(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Cells(i32),
    Percent(i32),
    Fraction(i32),
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edges {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    Visible,
    Hidden,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridPlacement {
    pub column_span: u16,
    pub row_span: u16,
}

/// Layout-relevant style shared by every VNode kind. Equality on this
/// struct is the "structural equality on style, layout constraints,
/// padding/margin" fast-equality check from `spec.md` §4.5.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub width: Unit,
    pub height: Unit,
    pub margin: Edges,
    pub padding: Edges,
    pub overflow: Overflow,
    pub visible: bool,
    pub grid_placement: GridPlacement,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            width: Unit::Auto,
            height: Unit::Auto,
            margin: Edges::default(),
            padding: Edges::default(),
            overflow: Overflow::Visible,
            visible: true,
            grid_placement: GridPlacement::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSpec {
    pub unit: Unit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitTransition {
    pub duration_ms: u64,
    pub easing: Easing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    pub columns: Vec<TrackSpec>,
    pub rows: Vec<TrackSpec>,
    pub gutter_h: i32,
    pub gutter_v: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Linear,
    Grid { columns: u16 },
    None,
}

#[derive(Debug, Clone)]
pub enum ContainerPayload {
    Plain,
    Grid(GridSpec),
    Modal {
        close_on_escape: bool,
        close_on_backdrop: bool,
    },
    Layer {
        z_index: i32,
    },
    FocusZone {
        navigation: Navigation,
        wrap_around: bool,
    },
    FocusTrap,
    SplitPane {
        vertical: bool,
        ratio: Fraction,
    },
    ErrorBoundary {
        fallback: ErrorBoundaryFallback,
    },
}

/// Information handed to an error boundary's fallback renderer.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub message: String,
}

/// Invoking this marks the boundary's path for one-shot clearing on the
/// next commit attempt (`spec.md` §4.5 "Error boundaries").
#[derive(Clone)]
pub struct RetryHandle {
    pub(crate) retry: Rc<dyn Fn()>,
}

impl RetryHandle {
    pub fn retry(&self) {
        (self.retry)()
    }
}

impl std::fmt::Debug for RetryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryHandle").finish_non_exhaustive()
    }
}

pub type ErrorBoundaryFallback = Rc<dyn Fn(&ErrorInfo, RetryHandle) -> VNode>;

impl PartialEq for ContainerPayload {
    /// Fast structural equality for the commit engine's in-place-mutation
    /// check (`spec.md` §4.5). Closures (fallback renderers) compare by
    /// `Rc` pointer identity rather than by value.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ContainerPayload::Plain, ContainerPayload::Plain) => true,
            (ContainerPayload::Grid(a), ContainerPayload::Grid(b)) => a == b,
            (
                ContainerPayload::Modal {
                    close_on_escape: a1,
                    close_on_backdrop: a2,
                },
                ContainerPayload::Modal {
                    close_on_escape: b1,
                    close_on_backdrop: b2,
                },
            ) => a1 == b1 && a2 == b2,
            (ContainerPayload::Layer { z_index: a }, ContainerPayload::Layer { z_index: b }) => a == b,
            (
                ContainerPayload::FocusZone {
                    navigation: a1,
                    wrap_around: a2,
                },
                ContainerPayload::FocusZone {
                    navigation: b1,
                    wrap_around: b2,
                },
            ) => a1 == b1 && a2 == b2,
            (ContainerPayload::FocusTrap, ContainerPayload::FocusTrap) => true,
            (
                ContainerPayload::SplitPane {
                    vertical: a1,
                    ratio: a2,
                },
                ContainerPayload::SplitPane {
                    vertical: b1,
                    ratio: b2,
                },
            ) => a1 == b1 && a2 == b2,
            (
                ContainerPayload::ErrorBoundary { fallback: a },
                ContainerPayload::ErrorBoundary { fallback: b },
            ) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextOverflow {
    Clip,
    Ellipsis,
    Wrap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeafPayload {
    Text {
        content: String,
        overflow: TextOverflow,
        max_width: Option<u16>,
    },
    Spacer,
    Divider,
    RichText {
        content: String,
        spans: Vec<markup::Span>,
    },
    Icon {
        glyph: char,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractivePayload {
    Button {
        label: String,
    },
    Link {
        label: String,
        href: String,
    },
    Input {
        value: String,
        multiline: bool,
        read_only: bool,
    },
    Slider {
        min: i32,
        max: i32,
        value: i32,
        step: i32,
    },
    Select {
        options: Vec<String>,
        selected: Option<usize>,
    },
    Checkbox {
        checked: bool,
    },
    RadioGroup {
        options: Vec<String>,
        selected: Option<usize>,
    },
    Dropdown {
        items: Vec<String>,
        open: bool,
    },
    VirtualList {
        item_count: usize,
    },
    Table {
        columns: Vec<String>,
        row_count: usize,
    },
    Tree {
        node_count: usize,
    },
    FilePicker {
        root: String,
    },
    FileTreeExplorer {
        root: String,
    },
    CommandPalette {
        query: String,
        items: Vec<String>,
    },
    DiffViewer {
        old_text: String,
        new_text: String,
    },
    CodeEditor {
        value: String,
        read_only: bool,
    },
    LogsConsole {
        lines: Vec<String>,
    },
    ToolApprovalDialog {
        prompt: String,
    },
    ToastContainer {
        toasts: Vec<String>,
    },
}

/// A composite VNode's render function. `Rc` (not `Send`) matches the
/// single-threaded cooperative model (`spec.md` §5): nothing here ever
/// crosses an executor boundary.
pub type RenderFn = Rc<dyn Fn(&crate::commit::composite::CompositeCtx) -> VNode>;

#[derive(Clone)]
pub struct CompositePayload {
    pub widget_key: Key,
    pub render: RenderFn,
}

impl std::fmt::Debug for CompositePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositePayload")
            .field("widget_key", &self.widget_key)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum VNodePayload {
    Container(ContainerPayload),
    Leaf(LeafPayload),
    Interactive(InteractivePayload),
    Composite(CompositePayload),
}

#[derive(Debug, Clone)]
pub struct VNode {
    pub tag: VNodeTag,
    pub id: Option<String>,
    pub key: Option<Key>,
    pub style: Style,
    pub payload: VNodePayload,
    pub exit_transition: Option<ExitTransition>,
    pub children: Vec<VNode>,
}

impl VNode {
    pub fn container(kind: ContainerKind, payload: ContainerPayload, children: Vec<VNode>) -> Self {
        Self {
            tag: VNodeTag::Container(kind),
            id: None,
            key: None,
            style: Style::default(),
            payload: VNodePayload::Container(payload),
            exit_transition: None,
            children,
        }
    }

    pub fn leaf(kind: LeafKind, payload: LeafPayload) -> Self {
        Self {
            tag: VNodeTag::Leaf(kind),
            id: None,
            key: None,
            style: Style::default(),
            payload: VNodePayload::Leaf(payload),
            exit_transition: None,
            children: Vec::new(),
        }
    }

    pub fn interactive(kind: InteractiveKind, id: impl Into<String>, payload: InteractivePayload) -> Self {
        Self {
            tag: VNodeTag::Interactive(kind),
            id: Some(id.into()),
            key: None,
            style: Style::default(),
            payload: VNodePayload::Interactive(payload),
            exit_transition: None,
            children: Vec::new(),
        }
    }

    pub fn composite(widget_key: impl Into<String>, render: RenderFn) -> Self {
        Self {
            tag: VNodeTag::Composite,
            id: None,
            key: None,
            style: Style::default(),
            payload: VNodePayload::Composite(CompositePayload {
                widget_key: widget_key.into(),
                render,
            }),
            exit_transition: None,
            children: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_exit_transition(mut self, exit: ExitTransition) -> Self {
        self.exit_transition = Some(exit);
        self
    }

    pub fn with_children(mut self, children: Vec<VNode>) -> Self {
        self.children = children;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        capabilities_for(self.tag)
    }

    /// A per-instance hash of kind plus layout-relevant props, used by the
    /// layout engine's stability signature (`spec.md` §4.6).
    pub fn layout_signature(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.tag.name().hash(&mut hasher);
        hash_unit(&self.style.width, &mut hasher);
        hash_unit(&self.style.height, &mut hasher);
        hash_edges(&self.style.margin, &mut hasher);
        hash_edges(&self.style.padding, &mut hasher);
        self.style.grid_placement.column_span.hash(&mut hasher);
        self.style.grid_placement.row_span.hash(&mut hasher);
        for child in &self.children {
            child.tag.name().hash(&mut hasher);
        }
        hasher.finish()
    }
}

fn hash_unit(unit: &Unit, hasher: &mut impl std::hash::Hasher) {
    use std::hash::Hash;
    match unit {
        Unit::Cells(n) => (0u8, n).hash(hasher),
        Unit::Percent(n) => (1u8, n).hash(hasher),
        Unit::Fraction(n) => (2u8, n).hash(hasher),
        Unit::Auto => 3u8.hash(hasher),
    }
}

fn hash_edges(edges: &Edges, hasher: &mut impl std::hash::Hasher) {
    use std::hash::Hash;
    (edges.top, edges.right, edges.bottom, edges.left).hash(hasher);
}
