//! Message-driven app loop.
//!
//! An app is a [`Program`]: a model, an `update` function that applies messages to it, and a
//! `view` function that renders it. [`App::mount`] renders the initial model into a
//! [`TextSurface`] and returns an [`AppHandle`]; from then on every message goes through
//! [`Dispatch`]:
//!
//! 1. `update` runs synchronously and the new model is visible immediately;
//! 2. a render is scheduled on the executor, unless one is already in flight, in which case a
//!    single follow-up render is queued;
//! 3. the render diffs the new view against the mounted tree with [`patch`].
//!
//! `update` may return a [`Thunk`] for asynchronous work. Thunks are spawned, not awaited, and
//! can dispatch further messages whenever they like.
//!
//! Everything runs on one thread: trees, handlers and dispatchers are `Rc` based, and tasks are
//! spawned on a [`LocalSpawn`] executor such as `futures::executor::LocalPool`.
//!
//! Failures from `update`, thunks, or rendering move the app into a terminal error state: the
//! region shows a static error message and later messages are ignored. Remount to recover.
//!
//! ```rust
//! use bufview::{App, Dispatch, Program, RopeDocument, ViewNode, MountPoint, Position, view};
//! use futures::executor::LocalPool;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! struct Counter;
//!
//! impl Program for Counter {
//!     type Model = i64;
//!     type Msg = i64;
//!
//!     fn init(&self) -> i64 {
//!         0
//!     }
//!
//!     fn update(&self, msg: i64, model: &mut i64) -> anyhow::Result<Option<bufview::Thunk<i64>>> {
//!         *model += msg;
//!         Ok(None)
//!     }
//!
//!     fn view(&self, model: &i64, dispatch: &Dispatch<i64>) -> ViewNode {
//!         let inc = dispatch.clone();
//!         view!("count: {}\n", *model).bind("+", move || inc.dispatch(1))
//!     }
//! }
//!
//! let mut pool = LocalPool::new();
//! let doc = Rc::new(RefCell::new(RopeDocument::empty()));
//! let app = App::new(Counter)
//!     .mount(Rc::clone(&doc), MountPoint::point(Position::ZERO), pool.spawner())
//!     .unwrap();
//!
//! app.dispatch(41);
//! assert!(app.on_key("+"));
//! pool.run_until_stalled();
//! assert_eq!(doc.borrow().text(), "count: 42\n");
//! ```

use crate::bindings;
use crate::error::{AppError, RenderError, SurfaceError};
use crate::mounted::MountedNode;
use crate::position::MountPoint;
use crate::reconcile::patch;
use crate::render::render;
use crate::surface::TextSurface;
use crate::view::ViewNode;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawn, LocalSpawnExt};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

/// An application: model, update and view.
pub trait Program: 'static {
    /// Application state.
    type Model: 'static;
    /// Messages accepted by [`update`](Self::update).
    type Msg: 'static;

    /// Initial model, rendered at mount time.
    fn init(&self) -> Self::Model;

    /// Apply `msg` to `model`, optionally returning asynchronous follow-up work.
    ///
    /// An error moves the app into its terminal error state.
    fn update(
        &self,
        msg: Self::Msg,
        model: &mut Self::Model,
    ) -> anyhow::Result<Option<Thunk<Self::Msg>>>;

    /// Render `model`. Handlers in the returned tree use `dispatch` to send messages.
    fn view(&self, model: &Self::Model, dispatch: &Dispatch<Self::Msg>) -> ViewNode;
}

/// Asynchronous work requested by [`Program::update`].
pub struct Thunk<Msg> {
    run: Box<dyn FnOnce(Dispatch<Msg>) -> LocalBoxFuture<'static, anyhow::Result<()>>>,
}

impl<Msg: 'static> Thunk<Msg> {
    /// Wrap an async closure. It receives a dispatcher for reporting results.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(Dispatch<Msg>) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        Self {
            run: Box::new(move |dispatch| f(dispatch).boxed_local()),
        }
    }

    fn start(self, dispatch: Dispatch<Msg>) -> LocalBoxFuture<'static, anyhow::Result<()>> {
        (self.run)(dispatch)
    }
}

impl<Msg> fmt::Debug for Thunk<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk").finish_non_exhaustive()
    }
}

trait Mailbox<Msg> {
    fn deliver(self: Rc<Self>, msg: Msg);
}

/// Sends messages to a mounted app.
///
/// Holds only a weak reference: once the app is unmounted or dropped, dispatching is a no-op.
pub struct Dispatch<Msg> {
    target: Weak<dyn Mailbox<Msg>>,
}

impl<Msg> Clone for Dispatch<Msg> {
    fn clone(&self) -> Self {
        Self {
            target: Weak::clone(&self.target),
        }
    }
}

impl<Msg> fmt::Debug for Dispatch<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("live", &(self.target.strong_count() > 0))
            .finish()
    }
}

impl<Msg: 'static> Dispatch<Msg> {
    /// Send `msg`. If the app is busy inside `update` or `view`, the message is queued and
    /// handled right after.
    pub fn dispatch(&self, msg: Msg) {
        match self.target.upgrade() {
            Some(target) => target.deliver(msg),
            None => log::warn!("message dispatched to a dropped app; ignoring"),
        }
    }

    /// A handler that dispatches a clone of `msg` each time it is called.
    pub fn handler(&self, msg: Msg) -> impl Fn() + 'static
    where
        Msg: Clone,
    {
        let dispatch = self.clone();
        move || dispatch.dispatch(msg.clone())
    }
}

/// Tuning knobs for a mounted app.
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Delete the region's text on [`AppHandle::unmount`]. Default: `false`.
    pub clear_on_unmount: bool,
    /// Push decoration spans to the surface after every render. Default: `true`.
    pub apply_decorations: bool,
    /// Heading of the error view. Default: `"Error"`.
    pub error_title: String,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            clear_on_unmount: false,
            apply_decorations: true,
            error_title: "Error".to_string(),
        }
    }
}

impl AppOptions {
    /// Set [`clear_on_unmount`](Self::clear_on_unmount).
    pub fn clear_on_unmount(mut self, value: bool) -> Self {
        self.clear_on_unmount = value;
        self
    }

    /// Set [`apply_decorations`](Self::apply_decorations).
    pub fn apply_decorations(mut self, value: bool) -> Self {
        self.apply_decorations = value;
        self
    }

    /// Set [`error_title`](Self::error_title).
    pub fn error_title(mut self, value: impl Into<String>) -> Self {
        self.error_title = value.into();
        self
    }
}

/// Observable app state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppStatus {
    /// Accepting messages.
    Running,
    /// Terminal error state; the region shows `message`.
    Error {
        /// Description of the failure.
        message: String,
    },
    /// Unmounted; the region is no longer managed.
    Unmounted,
}

enum Status<M> {
    Running(M),
    Failed(String),
    Unmounted,
}

struct LoopState<M> {
    status: Status<M>,
    mount: MountPoint,
    tree: Option<MountedNode>,
    rendering: bool,
    rerender_pending: bool,
    /// Bumped by every successful update.
    generation: u64,
    /// Generation of the model the last render took its view from.
    rendered_generation: u64,
}

struct Inner<P: Program, S> {
    program: P,
    surface: Rc<RefCell<S>>,
    spawner: Rc<dyn LocalSpawn>,
    options: AppOptions,
    dispatch: Dispatch<P::Msg>,
    mailbox: RefCell<VecDeque<P::Msg>>,
    /// Set while running `update` or `view`; dispatches arriving meanwhile are only queued.
    busy: Cell<bool>,
    state: RefCell<LoopState<P::Model>>,
}

impl<P: Program, S: TextSurface + 'static> Mailbox<P::Msg> for Inner<P, S> {
    fn deliver(self: Rc<Self>, msg: P::Msg) {
        self.mailbox.borrow_mut().push_back(msg);
        self.drain();
    }
}

impl<P: Program, S: TextSurface + 'static> Inner<P, S> {
    fn drain(self: &Rc<Self>) {
        if self.busy.replace(true) {
            return;
        }
        loop {
            let Some(msg) = self.mailbox.borrow_mut().pop_front() else {
                break;
            };
            self.step(msg);
        }
        self.busy.set(false);
    }

    fn step(self: &Rc<Self>, msg: P::Msg) {
        let outcome = {
            let mut state = self.state.borrow_mut();
            let model = match &mut state.status {
                Status::Running(model) => model,
                Status::Failed(_) => {
                    log::debug!("app is in the error state; dropping message");
                    return;
                }
                Status::Unmounted => {
                    log::warn!("message dispatched after unmount; ignoring");
                    return;
                }
            };
            let outcome = self.program.update(msg, model);
            if outcome.is_ok() {
                state.generation += 1;
            }
            outcome
        };

        match outcome {
            Ok(thunk) => {
                if let Some(thunk) = thunk {
                    self.spawn_thunk(thunk);
                }
                self.request_render();
            }
            Err(err) => self.fail(AppError::Update(err)),
        }
    }

    fn spawn_thunk(self: &Rc<Self>, thunk: Thunk<P::Msg>) {
        let work = thunk.start(self.dispatch.clone());
        let app = Rc::downgrade(self);
        let task = async move {
            if let Err(err) = work.await {
                match app.upgrade() {
                    Some(app) => app.fail(AppError::Thunk(err)),
                    None => log::error!("thunk failed after its app was dropped: {err:#}"),
                }
            }
        };
        if let Err(err) = self.spawner.spawn_local(task) {
            log::error!("failed to spawn thunk: {err}");
        }
    }

    fn request_render(self: &Rc<Self>) {
        {
            let mut state = self.state.borrow_mut();
            if state.rendering {
                log::debug!("render in flight; queueing another");
                state.rerender_pending = true;
                return;
            }
            state.rendering = true;
        }

        let app = Rc::clone(self);
        if let Err(err) = self.spawner.spawn_local(async move { app.run_render() }) {
            self.state.borrow_mut().rendering = false;
            log::error!("failed to spawn render: {err}");
        }
    }

    fn run_render(self: &Rc<Self>) {
        let result = self.render_once();

        let again = {
            let mut state = self.state.borrow_mut();
            state.rendering = false;
            let stale = state.generation != state.rendered_generation;
            std::mem::take(&mut state.rerender_pending) && stale
        };

        match result {
            Ok(()) if again => self.request_render(),
            Ok(()) => {}
            Err(err) => self.fail(AppError::Render(err)),
        }

        // Messages dispatched from inside `view` were only queued.
        self.drain();
    }

    fn render_once(self: &Rc<Self>) -> Result<(), RenderError> {
        let was_busy = self.busy.replace(true);
        let snapshot = {
            let mut state = self.state.borrow_mut();
            let view = match &state.status {
                Status::Running(model) => Some(self.program.view(model, &self.dispatch)),
                Status::Failed(message) => Some(error_view(&self.options.error_title, message)),
                Status::Unmounted => None,
            };
            state.rendered_generation = state.generation;
            view.map(|view| (view, state.tree.take(), state.mount))
        };
        self.busy.set(was_busy);

        let Some((view, previous, mount)) = snapshot else {
            return Ok(());
        };

        let mut surface = self.surface.borrow_mut();
        let tree = match &previous {
            Some(tree) => patch(&mut *surface, tree, &view, mount)?,
            None => render(&mut *surface, &view, mount)?,
        };
        log::debug!("rendered {}", tree.range());

        let spans = self
            .options
            .apply_decorations
            .then(|| tree.decoration_spans());
        let range = tree.range();
        {
            let mut state = self.state.borrow_mut();
            state.mount = range;
            state.tree = Some(tree);
        }
        if let Some(spans) = spans {
            // Spans pushed by the previous render still use the pre-render coordinates.
            surface.set_decorations(mount, &[])?;
            surface.set_decorations(range, &spans)?;
        }
        Ok(())
    }

    fn fail(self: &Rc<Self>, err: AppError) {
        let first = {
            let mut state = self.state.borrow_mut();
            let running = matches!(state.status, Status::Running(_));
            if running {
                state.status = Status::Failed(err.to_string());
            }
            running
        };

        if first {
            log::error!("{err}");
            self.request_render();
        } else {
            log::error!("error after the app stopped: {err}");
        }
    }
}

fn error_view(title: &str, message: &str) -> ViewNode {
    ViewNode::text(format!("{title}: {message}")).decorate("Error")
}

/// Builder for mounting a [`Program`].
#[derive(Debug)]
pub struct App<P> {
    program: P,
    options: AppOptions,
}

impl<P: Program> App<P> {
    /// Start building an app from `program` with default options.
    pub fn new(program: P) -> Self {
        Self {
            program,
            options: AppOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: AppOptions) -> Self {
        self.options = options;
        self
    }

    /// Render the initial model over `mount` and start the loop.
    ///
    /// The initial render happens synchronously; later renders and thunks are spawned on
    /// `spawner`.
    pub fn mount<S>(
        self,
        surface: Rc<RefCell<S>>,
        mount: MountPoint,
        spawner: impl LocalSpawn + 'static,
    ) -> Result<AppHandle<P, S>, AppError>
    where
        S: TextSurface + 'static,
    {
        let model = self.program.init();
        let inner = Rc::new_cyclic(|weak: &Weak<Inner<P, S>>| {
            let target: Weak<dyn Mailbox<P::Msg>> = weak.clone();
            Inner {
                program: self.program,
                surface,
                spawner: Rc::new(spawner),
                options: self.options,
                dispatch: Dispatch { target },
                mailbox: RefCell::new(VecDeque::new()),
                busy: Cell::new(false),
                state: RefCell::new(LoopState {
                    status: Status::Running(model),
                    mount,
                    tree: None,
                    rendering: false,
                    rerender_pending: false,
                    generation: 0,
                    rendered_generation: 0,
                }),
            }
        });

        inner.render_once()?;
        inner.drain();
        log::debug!("mounted at {}", inner.state.borrow().mount);
        Ok(AppHandle { inner })
    }
}

/// Handle to a mounted app.
pub struct AppHandle<P: Program, S> {
    inner: Rc<Inner<P, S>>,
}

impl<P: Program, S> fmt::Debug for AppHandle<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("AppHandle")
            .field("mount", &state.mount)
            .field("rendering", &state.rendering)
            .finish_non_exhaustive()
    }
}

impl<P: Program, S: TextSurface + 'static> AppHandle<P, S> {
    /// Send a message to the app.
    pub fn dispatch(&self, msg: P::Msg) {
        Rc::clone(&self.inner).deliver(msg);
    }

    /// A dispatcher that can outlive this borrow (e.g. for thunks or host callbacks).
    pub fn dispatcher(&self) -> Dispatch<P::Msg> {
        self.inner.dispatch.clone()
    }

    /// Run the binding for `key` at the surface's cursor position.
    ///
    /// Returns `false` if no binding claims the key there.
    pub fn on_key(&self, key: &str) -> bool {
        let cursor = self.inner.surface.borrow().cursor_position();
        let handler = {
            let state = self.inner.state.borrow();
            state
                .tree
                .as_ref()
                .and_then(|tree| bindings::resolve(tree, cursor))
                .and_then(|bindings| bindings.get(key))
                .cloned()
        };

        match handler {
            Some(handler) => {
                log::debug!("key {key} at {cursor}");
                handler();
                true
            }
            None => false,
        }
    }

    /// Current status.
    pub fn status(&self) -> AppStatus {
        match &self.inner.state.borrow().status {
            Status::Running(_) => AppStatus::Running,
            Status::Failed(message) => AppStatus::Error {
                message: message.clone(),
            },
            Status::Unmounted => AppStatus::Unmounted,
        }
    }

    /// Returns `true` while a render task is scheduled or running.
    pub fn is_rendering(&self) -> bool {
        self.inner.state.borrow().rendering
    }

    /// The document range the app currently occupies.
    pub fn mount_point(&self) -> MountPoint {
        self.inner.state.borrow().mount
    }

    /// Inspect the model. `None` once the app has failed.
    pub fn with_model<R>(&self, f: impl FnOnce(&P::Model) -> R) -> Option<R> {
        match &self.inner.state.borrow().status {
            Status::Running(model) => Some(f(model)),
            _ => None,
        }
    }

    /// Inspect the mounted tree, if one is in place.
    pub fn with_mounted<R>(&self, f: impl FnOnce(&MountedNode) -> R) -> Option<R> {
        self.inner.state.borrow().tree.as_ref().map(f)
    }

    /// Stop the app and release its tree.
    ///
    /// Pending renders become no-ops and later dispatches are ignored. With
    /// [`AppOptions::clear_on_unmount`] the region's text is deleted as well.
    pub fn unmount(self) -> Result<(), SurfaceError> {
        let mount = {
            let mut state = self.inner.state.borrow_mut();
            state.status = Status::Unmounted;
            state.tree = None;
            state.mount
        };
        self.inner.mailbox.borrow_mut().clear();

        if self.inner.options.clear_on_unmount {
            let mut surface = self.inner.surface.borrow_mut();
            surface.delete_range(mount.start, mount.end)?;
            surface.set_decorations(mount, &[])?;
        }
        log::debug!("unmounted {mount}");
        Ok(())
    }
}
