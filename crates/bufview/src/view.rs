//! The declarative view tree.
//!
//! A view function turns a model into a fresh [`ViewNode`] tree on every render. Trees are
//! immutable once built and are discarded right after they have been mounted or diffed.
//!
//! There are three node kinds:
//!
//! - **text** leaves hold raw text, newlines included;
//! - **components** are fixed-shape composites produced by a [`Template`], identified by its
//!   [`TemplateId`];
//! - **arrays** are variable-length lists, typically one sub-tree per collection item.
//!
//! Components are normally built with the [`view!`](crate::view!) macro:
//!
//! ```rust
//! use bufview::{view, ViewNode};
//!
//! fn item(label: &str, done: bool) -> ViewNode {
//!     view!("- [{}] {}\n", if done { "x" } else { " " }, label)
//! }
//!
//! let list = view!("# Todo\n{}", vec![item("write", true), item("test", false)]);
//! assert_eq!(list.flatten(), "# Todo\n- [x] write\n- [ ] test\n");
//! ```

use crate::bindings::Bindings;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of a template.
///
/// Two components may only be diffed child-by-child when they share a template id. Ids are
/// handed out from a process-wide counter; the [`view!`](crate::view!) macro allocates one per
/// call site the first time that call site runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateId(u64);

impl TemplateId {
    /// Allocate a fresh, never-before-seen id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template#{}", self.0)
    }
}

/// An opaque decoration tag (e.g. a highlight group) attached to a node's range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decoration(String);

impl Decoration {
    /// Create a decoration tag.
    pub fn new(class: impl Into<String>) -> Self {
        Self(class.into())
    }

    /// The tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Decoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed template literal: fixed text parts separated by holes.
///
/// `"a{}b{}c"` parses into the parts `["a", "b", "c"]`. `{{` and `}}` escape literal braces.
/// Instantiating a template with `k` holes always yields a component with `2k + 1` children,
/// alternating between fixed parts and hole values.
#[derive(Debug, Clone)]
pub struct Template {
    id: TemplateId,
    parts: Vec<String>,
}

impl Template {
    /// Parse `source` and allocate a new [`TemplateId`] for it.
    pub fn parse(source: &str) -> Self {
        Self {
            id: TemplateId::next(),
            parts: split_parts(source),
        }
    }

    /// This template's identity.
    pub fn id(&self) -> TemplateId {
        self.id
    }

    /// The fixed text parts.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Number of holes.
    pub fn holes(&self) -> usize {
        self.parts.len() - 1
    }

    /// Build a component by filling the holes with `args`, in order.
    ///
    /// # Panics
    ///
    /// Panics if `args.len()` differs from [`holes`](Self::holes). A template is a literal, so
    /// this is a bug at the call site, much like a `format!` argument mismatch.
    pub fn instantiate(&self, args: Vec<ViewNode>) -> ViewNode {
        assert_eq!(
            args.len(),
            self.holes(),
            "{} has {} holes but was given {} arguments",
            self.id,
            self.holes(),
            args.len()
        );

        let mut children = Vec::with_capacity(self.parts.len() + args.len());
        let mut args = args.into_iter();
        for (idx, part) in self.parts.iter().enumerate() {
            if idx > 0 {
                children.extend(args.next());
            }
            children.push(ViewNode::text(part.as_str()));
        }
        ViewNode::component(self.id, children)
    }
}

/// Number of `{}` holes in a template literal, honouring `{{`/`}}` escapes.
///
/// `const` so that [`view!`](crate::view!) can reject a wrong argument count at compile time.
#[doc(hidden)]
pub const fn count_holes(source: &str) -> usize {
    let bytes = source.as_bytes();
    let mut holes = 0;
    let mut i = 0;
    while i < bytes.len() {
        if i + 1 < bytes.len() {
            match (bytes[i], bytes[i + 1]) {
                (b'{', b'{') | (b'}', b'}') => {
                    i += 2;
                    continue;
                }
                (b'{', b'}') => {
                    holes += 1;
                    i += 2;
                    continue;
                }
                _ => {}
            }
        }
        i += 1;
    }
    holes
}

fn split_parts(source: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        match (ch, chars.peek()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                current.push(ch);
            }
            ('{', Some('}')) => {
                chars.next();
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    parts.push(current);
    parts
}

/// The shape of a [`ViewNode`].
#[derive(Debug, Clone)]
pub enum ViewKind {
    /// Raw text; may contain newlines.
    Text(String),
    /// A fixed-shape composite.
    Component {
        /// Originating template.
        template: TemplateId,
        /// Children in document order.
        children: Vec<ViewNode>,
    },
    /// A variable-length list.
    Array(Vec<ViewNode>),
}

/// One node of a view tree.
#[derive(Debug, Clone)]
pub struct ViewNode {
    pub(crate) kind: ViewKind,
    pub(crate) decoration: Option<Decoration>,
    pub(crate) bindings: Option<Bindings>,
}

impl ViewNode {
    fn from_kind(kind: ViewKind) -> Self {
        Self {
            kind,
            decoration: None,
            bindings: None,
        }
    }

    /// A text leaf.
    pub fn text(content: impl Into<String>) -> Self {
        Self::from_kind(ViewKind::Text(content.into()))
    }

    /// An empty text leaf. It still occupies a zero-width position once mounted.
    pub fn empty() -> Self {
        Self::text(String::new())
    }

    /// A component with explicit children. Prefer [`view!`](crate::view!).
    pub fn component(template: TemplateId, children: Vec<ViewNode>) -> Self {
        Self::from_kind(ViewKind::Component { template, children })
    }

    /// An array node.
    pub fn array(children: Vec<ViewNode>) -> Self {
        Self::from_kind(ViewKind::Array(children))
    }

    /// The node's shape.
    pub fn kind(&self) -> &ViewKind {
        &self.kind
    }

    /// Direct children (empty for text leaves).
    pub fn children(&self) -> &[ViewNode] {
        match &self.kind {
            ViewKind::Text(_) => &[],
            ViewKind::Component { children, .. } | ViewKind::Array(children) => children,
        }
    }

    /// Attached decoration, if any.
    pub fn decoration(&self) -> Option<&Decoration> {
        self.decoration.as_ref()
    }

    /// Attached bindings, if any.
    pub fn bindings(&self) -> Option<&Bindings> {
        self.bindings.as_ref()
    }

    /// Attach a decoration tag to this node's range.
    pub fn decorate(mut self, class: impl Into<String>) -> Self {
        self.decoration = Some(Decoration::new(class));
        self
    }

    /// Attach a bindings map, replacing any previous one.
    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = Some(bindings);
        self
    }

    /// Bind a single key on this node, adding to any existing bindings.
    pub fn bind(mut self, key: impl Into<String>, handler: impl Fn() + 'static) -> Self {
        self.bindings
            .get_or_insert_with(Bindings::new)
            .insert(key, handler);
        self
    }

    /// Concatenate all leaf text in document order.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        self.flatten_into(&mut out);
        out
    }

    pub(crate) fn flatten_into(&self, out: &mut String) {
        match &self.kind {
            ViewKind::Text(content) => out.push_str(content),
            ViewKind::Component { children, .. } | ViewKind::Array(children) => {
                for child in children {
                    child.flatten_into(out);
                }
            }
        }
    }
}

impl From<String> for ViewNode {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<&str> for ViewNode {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<&String> for ViewNode {
    fn from(value: &String) -> Self {
        Self::text(value.as_str())
    }
}

impl From<char> for ViewNode {
    fn from(value: char) -> Self {
        Self::text(value.to_string())
    }
}

impl From<Vec<ViewNode>> for ViewNode {
    fn from(value: Vec<ViewNode>) -> Self {
        Self::array(value)
    }
}

macro_rules! impl_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ViewNode {
                fn from(value: $ty) -> Self {
                    Self::text(value.to_string())
                }
            }
        )*
    };
}

impl_from_display!(i32, i64, u32, u64, usize);

/// Build a component from a template literal.
///
/// Each `{}` in the literal is a hole filled by the next argument; arguments may be anything
/// convertible into a [`ViewNode`](crate::ViewNode) (strings, numbers, nodes, or `Vec<ViewNode>`
/// for an array). `{{` and `}}` produce literal braces.
///
/// The template is parsed once per call site and keeps the same
/// [`TemplateId`](crate::TemplateId) for the life of the process, so successive renders of the
/// same call site diff child-by-child.
///
/// ```rust
/// use bufview::view;
///
/// let node = view!("1{}2", "");
/// assert_eq!(node.children().len(), 3);
/// assert_eq!(node.flatten(), "12");
/// ```
///
/// Like `format!`, the argument count must match the holes, or the call does not compile:
///
/// ```compile_fail
/// use bufview::view;
///
/// let node = view!("{} and {}", "only one");
/// ```
#[macro_export]
macro_rules! view {
    ($template:literal $(, $arg:expr)* $(,)?) => {{
        const _: () = ::std::assert!(
            $crate::view::count_holes($template)
                == <[&str]>::len(&[$(::std::stringify!($arg)),*]),
            "view! argument count does not match the number of `{{}}` holes"
        );
        static TEMPLATE: ::std::sync::OnceLock<$crate::view::Template> =
            ::std::sync::OnceLock::new();
        TEMPLATE
            .get_or_init(|| $crate::view::Template::parse($template))
            .instantiate(::std::vec![$($crate::view::ViewNode::from($arg)),*])
    }};
}
