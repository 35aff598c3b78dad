//! Controls - materialized descriptors (v0.1)
//!
//! Materialization turns a descriptor into a [`Control`]: its current display,
//! the bindings behind it and the listeners it subscribes. One materializer per
//! [`ControlKind`], looked up in a fixed table.

use std::fmt;

use tracing::debug;

use crate::binding::{parse_finite, Binding, Change};
use crate::descriptor::{ControlKind, Descriptor};
use crate::node::Node;
use crate::path::PathResolver;
use crate::present::{format_fixed, format_number, round_to, stringify, DisplayValue};
use crate::scope::Scope;

/// Identity of one materialization; a new handle is issued every time a
/// descriptor is (re)materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlHandle(pub(crate) u64);

impl ControlHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Event subscriptions a control holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listener {
    /// Continuous input (typing, dragging, toggling)
    Input,
    /// Committed value (numeric fields)
    Change,
    /// Input on one field of a vector
    Field(usize),
    /// Activation (buttons)
    Click,
}

/// User interaction delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub enum UserEvent {
    Input(Node),
    Change(Node),
    Field { index: usize, value: Node },
    Click,
}

impl UserEvent {
    pub fn listener(&self) -> Listener {
        match self {
            UserEvent::Input(_) => Listener::Input,
            UserEvent::Change(_) => Listener::Change,
            UserEvent::Field { index, .. } => Listener::Field(*index),
            UserEvent::Click => Listener::Click,
        }
    }
}

/// What handling an event did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No subscribed listener, or nothing writable
    Ignored,
    Wrote(Change),
    Invoked,
}

#[derive(Debug, Clone)]
pub enum Wiring {
    /// Header / separator
    Static,
    Value(Binding),
    Fields(Vec<Binding>),
    Action(Binding),
}

/// Snapshot of a control for surfaces
#[derive(Debug, Clone, PartialEq)]
pub struct ControlView {
    pub handle: ControlHandle,
    pub kind: ControlKind,
    pub label: String,
    pub display: DisplayValue,
    pub unit: Option<String>,
    pub disabled: bool,
    pub listeners: Vec<Listener>,
}

#[derive(Debug, Clone)]
pub struct Control {
    kind: ControlKind,
    label: String,
    unit: Option<String>,
    disabled: bool,
    fractions: Option<u32>,
    options: Vec<(String, Node)>,
    display: DisplayValue,
    wiring: Wiring,
    listeners: Vec<Listener>,
}

/// Everything a materializer reads besides the descriptor
pub struct Context<'a> {
    pub scope: &'a Scope,
    pub resolver: &'a PathResolver,
}

type Materializer = fn(&Descriptor, &Context<'_>) -> Control;

/// Indexed by `ControlKind as usize`
const MATERIALIZERS: [Materializer; 12] = [
    header,
    checkbox,
    numeric,
    text,
    text,
    range_slider,
    select,
    separator,
    button,
    output,
    meter,
    vector,
];

pub fn materialize(descriptor: &Descriptor, ctx: &Context<'_>) -> Control {
    let control = MATERIALIZERS[descriptor.kind as usize](descriptor, ctx);
    debug!(
        kind = %descriptor.kind,
        label = %descriptor.label,
        listeners = control.listeners.len(),
        "control materialized"
    );
    control
}

impl Control {
    fn base(descriptor: &Descriptor, wiring: Wiring) -> Self {
        Self {
            kind: descriptor.kind,
            label: descriptor.label.clone(),
            unit: descriptor.unit.clone(),
            disabled: descriptor.disabled,
            // `fractions: 0` means no rounding, like an absent count
            fractions: descriptor.fractions.filter(|&fractions| fractions > 0),
            options: descriptor
                .options
                .as_ref()
                .map(|o| o.pairs())
                .unwrap_or_default(),
            display: DisplayValue::Empty,
            wiring,
            listeners: Vec::new(),
        }
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    pub fn display(&self) -> &DisplayValue {
        &self.display
    }

    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    pub fn wiring(&self) -> &Wiring {
        &self.wiring
    }

    pub fn view(&self, handle: ControlHandle) -> ControlView {
        ControlView {
            handle,
            kind: self.kind,
            label: self.label.clone(),
            display: self.display.clone(),
            unit: self.unit.clone(),
            disabled: self.disabled,
            listeners: self.listeners.clone(),
        }
    }

    /// Drop every subscription (control removed or replaced)
    pub fn detach(&mut self) -> usize {
        let count = self.listeners.len();
        self.listeners.clear();
        count
    }

    /// Whether periodic refresh applies: a live binding on an enabled,
    /// non-action control
    pub fn is_refreshable(&self) -> bool {
        if self.disabled {
            return false;
        }
        match &self.wiring {
            Wiring::Value(binding) => binding.is_resolved(),
            Wiring::Fields(bindings) => bindings.iter().any(Binding::is_resolved),
            Wiring::Static | Wiring::Action(_) => false,
        }
    }

    /// Re-read the bound value(s); returns true if the display changed
    pub fn refresh(&mut self, scope: &Scope) -> bool {
        if !self.is_refreshable() {
            return false;
        }
        let next = match &self.wiring {
            Wiring::Value(binding) => match binding.current(scope) {
                Some(value) => self.present(&value),
                None => return false,
            },
            Wiring::Fields(bindings) => {
                let previous = match &self.display {
                    DisplayValue::Fields(fields) => fields.clone(),
                    _ => Vec::new(),
                };
                let fields = bindings
                    .iter()
                    .enumerate()
                    .map(|(i, binding)| match binding.current(scope) {
                        Some(value) => stringify(&value),
                        None => previous.get(i).cloned().unwrap_or_default(),
                    })
                    .collect();
                DisplayValue::Fields(fields)
            }
            Wiring::Static | Wiring::Action(_) => return false,
        };
        if next == self.display {
            return false;
        }
        self.display = next;
        true
    }

    /// Handle one user event
    ///
    /// Events the control did not subscribe to are ignored, so a detached
    /// control never writes.
    pub fn handle(&mut self, event: UserEvent, scope: &Scope) -> Outcome {
        if !self.listeners.contains(&event.listener()) {
            return Outcome::Ignored;
        }

        match (&self.wiring, event) {
            (Wiring::Action(binding), UserEvent::Click) => match binding.action(scope) {
                Some(action) => {
                    action.invoke();
                    Outcome::Invoked
                }
                None => Outcome::Ignored,
            },
            (Wiring::Fields(bindings), UserEvent::Field { index, value }) => {
                let Some(change) = bindings.get(index).and_then(|b| b.write(scope, value))
                else {
                    return Outcome::Ignored;
                };
                if let DisplayValue::Fields(fields) = &mut self.display {
                    if let Some(field) = fields.get_mut(index) {
                        *field = stringify(&change.value);
                    }
                }
                Outcome::Wrote(change)
            }
            (Wiring::Value(binding), UserEvent::Input(value) | UserEvent::Change(value)) => {
                let raw = self.input_value(value);
                let Some(change) = binding.write(scope, raw) else {
                    return Outcome::Ignored;
                };
                self.display = self.present(&change.value);
                Outcome::Wrote(change)
            }
            _ => Outcome::Ignored,
        }
    }

    /// Kind-specific shaping of raw input before coercion
    ///
    /// Non-numeric input to numeric and range controls is passed on as given
    /// and stored as text by [`crate::binding::coerce`], rather than becoming NaN.
    fn input_value(&self, value: Node) -> Node {
        match self.kind {
            ControlKind::Checkbox => Node::Bool(value.is_truthy()),
            ControlKind::Numeric | ControlKind::RangeSlider => {
                let number = match &value {
                    Node::Number(n) if n.is_finite() => Some(*n),
                    Node::Text(text) => parse_finite(text),
                    _ => None,
                };
                match (number, self.fractions) {
                    (Some(n), Some(fractions)) if self.kind == ControlKind::Numeric => {
                        Node::Number(round_to(n, fractions))
                    }
                    (Some(n), _) => Node::Number(n),
                    (None, _) => value,
                }
            }
            _ => value,
        }
    }

    /// Display for a bound value
    fn present(&self, value: &Node) -> DisplayValue {
        match self.kind {
            ControlKind::Checkbox => DisplayValue::Flag(value.is_truthy()),
            ControlKind::Numeric => DisplayValue::Text(match (value, self.fractions) {
                (Node::Number(n), Some(fractions)) => format_fixed(*n, fractions),
                (Node::Number(n), None) => format_number(*n),
                (other, _) => stringify(other),
            }),
            ControlKind::RangeSlider | ControlKind::Meter => match value {
                Node::Number(n) => DisplayValue::Number(*n),
                other => DisplayValue::Text(stringify(other)),
            },
            ControlKind::Select => DisplayValue::Text(
                self.options
                    .iter()
                    .find(|(_, option)| option == value)
                    .map(|(label, _)| label.clone())
                    .unwrap_or_else(|| stringify(value)),
            ),
            ControlKind::Vector => DisplayValue::Fields(vec![stringify(value)]),
            ControlKind::Header | ControlKind::Separator | ControlKind::Button => {
                self.display.clone()
            }
            ControlKind::Text | ControlKind::ColorPicker | ControlKind::Output => {
                DisplayValue::Text(stringify(value))
            }
        }
    }

    /// Subscribe `listeners` when the control is live
    fn subscribe(&mut self, live: bool, listeners: &[Listener]) {
        if live && !self.disabled {
            self.listeners.extend_from_slice(listeners);
        }
    }
}

/// `value` when truthy, else `fallback`
fn value_or(descriptor: &Descriptor, fallback: Node) -> Node {
    descriptor
        .value_node()
        .filter(Node::is_truthy)
        .unwrap_or(fallback)
}

/// `value || min || 0`
fn numeric_default(descriptor: &Descriptor) -> Node {
    let min = descriptor
        .min
        .map(Node::Number)
        .filter(Node::is_truthy)
        .unwrap_or(Node::Number(0.0));
    value_or(descriptor, min)
}

fn bind_single(descriptor: &Descriptor, ctx: &Context<'_>) -> Binding {
    Binding::resolve(ctx.resolver, descriptor.single_path(), ctx.scope)
}

/// Shared shape of single-value controls
fn value_control(
    descriptor: &Descriptor,
    ctx: &Context<'_>,
    default: Node,
    listeners: &[Listener],
) -> Control {
    let binding = bind_single(descriptor, ctx);
    let value = binding.read(ctx.scope, &default);
    let live = binding.is_resolved();
    let mut control = Control::base(descriptor, Wiring::Value(binding));
    control.display = control.present(&value);
    control.subscribe(live, listeners);
    control
}

fn header(descriptor: &Descriptor, _ctx: &Context<'_>) -> Control {
    let mut control = Control::base(descriptor, Wiring::Static);
    control.display = DisplayValue::Text(descriptor.text.clone().unwrap_or_default());
    control
}

fn separator(descriptor: &Descriptor, _ctx: &Context<'_>) -> Control {
    Control::base(descriptor, Wiring::Static)
}

fn checkbox(descriptor: &Descriptor, ctx: &Context<'_>) -> Control {
    let default = descriptor.value_node().unwrap_or(Node::Bool(false));
    value_control(descriptor, ctx, default, &[Listener::Input])
}

fn numeric(descriptor: &Descriptor, ctx: &Context<'_>) -> Control {
    let default = value_or(descriptor, Node::Number(0.0));
    value_control(
        descriptor,
        ctx,
        default,
        &[Listener::Input, Listener::Change],
    )
}

/// Text and colour picker share everything but the fallback
fn text(descriptor: &Descriptor, ctx: &Context<'_>) -> Control {
    let fallback = match descriptor.kind {
        ControlKind::ColorPicker => "#000000",
        _ => "",
    };
    let default = value_or(descriptor, Node::from(fallback));
    value_control(descriptor, ctx, default, &[Listener::Input])
}

fn range_slider(descriptor: &Descriptor, ctx: &Context<'_>) -> Control {
    value_control(descriptor, ctx, numeric_default(descriptor), &[Listener::Input])
}

fn select(descriptor: &Descriptor, ctx: &Context<'_>) -> Control {
    let first = descriptor
        .options
        .as_ref()
        .and_then(|o| o.pairs().into_iter().next())
        .map(|(_, value)| value)
        .unwrap_or_default();
    value_control(descriptor, ctx, first, &[Listener::Input])
}

fn output(descriptor: &Descriptor, ctx: &Context<'_>) -> Control {
    let default = value_or(descriptor, Node::from(""));
    value_control(descriptor, ctx, default, &[])
}

fn meter(descriptor: &Descriptor, ctx: &Context<'_>) -> Control {
    value_control(descriptor, ctx, numeric_default(descriptor), &[])
}

fn button(descriptor: &Descriptor, ctx: &Context<'_>) -> Control {
    let binding = bind_single(descriptor, ctx);
    let callable = binding.action(ctx.scope).is_some();
    let caption = descriptor
        .text
        .clone()
        .unwrap_or_else(|| descriptor.label.clone());
    let mut control = Control::base(descriptor, Wiring::Action(binding));
    control.display = DisplayValue::Text(caption);
    control.subscribe(callable, &[Listener::Click]);
    control
}

fn vector(descriptor: &Descriptor, ctx: &Context<'_>) -> Control {
    let paths = descriptor
        .path
        .as_ref()
        .map(|p| p.all())
        .unwrap_or_default();
    let bindings: Vec<Binding> = paths
        .into_iter()
        .map(|path| Binding::resolve(ctx.resolver, Some(path), ctx.scope))
        .collect();

    let fields = bindings
        .iter()
        .map(|b| match b.current(ctx.scope) {
            Some(value) => stringify(&value),
            None => String::new(),
        })
        .collect();
    let listeners: Vec<Listener> = bindings
        .iter()
        .enumerate()
        .filter(|(_, b)| b.is_resolved())
        .map(|(i, _)| Listener::Field(i))
        .collect();

    let mut control = Control::base(descriptor, Wiring::Fields(bindings));
    control.display = DisplayValue::Fields(fields);
    control.subscribe(true, &listeners);
    control
}
