//! Reacts to host events: keeps editor options in sync with the resolved
//! configuration and runs the transforms when a document is saved.
//!
//! Events are routed through an [`EventDispatcher`], a table from
//! [`EventKind`] to a handler returning a boxed future. The default table is
//! built once in [`ApplicationController::new`].

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::{debug, error, info};

use crate::cache::{ConfigResolutionCache, Resolution, SettingsProvider};
use crate::config::{generate_editorconfig, GenerateOutcome};
use crate::host::{EditError, EditorSurface, MessageLevel, TextDocument};
use crate::transform::{run_pipeline, TransformReport};
use crate::translate::{resolve_to_host_options, DefaultSettings, HostEditorOptions};

/// How long the indentation summary stays in the status bar.
pub const STATUS_DURATION: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Activated,
    ActiveEditorChanged,
    ConfigurationChanged,
    DocumentSaved,
}

#[derive(Clone)]
pub enum HostEvent {
    Activated,
    ActiveEditorChanged,
    ConfigurationChanged,
    DocumentSaved(Arc<dyn TextDocument>),
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Activated => EventKind::Activated,
            HostEvent::ActiveEditorChanged => EventKind::ActiveEditorChanged,
            HostEvent::ConfigurationChanged => EventKind::ConfigurationChanged,
            HostEvent::DocumentSaved(_) => EventKind::DocumentSaved,
        }
    }
}

pub type Handler =
    Arc<dyn Fn(Arc<ApplicationController>, HostEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Table of event handlers, one per kind.
#[derive(Default, Clone)]
pub struct EventDispatcher {
    handlers: HashMap<EventKind, Handler>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The handlers the controller installs for itself.
    pub fn with_default_handlers() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(EventKind::Activated, |c, _| async move {
            c.on_activated().await;
        });
        dispatcher.register(EventKind::ActiveEditorChanged, |c, _| async move {
            c.on_active_editor_changed().await;
        });
        dispatcher.register(EventKind::ConfigurationChanged, |c, _| async move {
            c.on_configuration_changed();
        });
        dispatcher.register(EventKind::DocumentSaved, |c, event| async move {
            if let HostEvent::DocumentSaved(document) = event {
                if let Err(e) = c.on_document_saved(&*document).await {
                    error!(error = %e, "failed to apply editorconfig on save");
                }
            }
        });
        dispatcher
    }

    /// Install `handler` for `kind`, replacing any previous one.
    pub fn register<F, Fut>(&mut self, kind: EventKind, handler: F)
    where
        F: Fn(Arc<ApplicationController>, HostEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: Handler =
            Arc::new(move |c: Arc<ApplicationController>, event: HostEvent| {
                handler(c, event).boxed()
            });
        self.handlers.insert(kind, handler);
    }

    pub fn dispatch(
        &self,
        controller: Arc<ApplicationController>,
        event: HostEvent,
    ) -> BoxFuture<'static, ()> {
        match self.handlers.get(&event.kind()) {
            Some(handler) => handler(controller, event),
            None => future::ready(()).boxed(),
        }
    }
}

/// Why a save did not run the transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Untitled,
    NoConfiguration,
    NoVisibleEditor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Skipped(SkipReason),
    Saved(TransformReport),
}

/// Push options for the active editor's document, if it has a configuration.
pub async fn apply_editor_options(
    provider: &dyn SettingsProvider,
    surface: &dyn EditorSurface,
) -> Option<HostEditorOptions> {
    let editor = surface.active_editor()?;
    let document = editor.document();
    let path = document.path()?;
    let config = provider.settings_for(path).await?;

    let options = resolve_to_host_options(&config, &provider.defaults());
    editor.set_options(options.clone());
    surface.show_status(&options.to_string(), STATUS_DURATION);
    debug!(path = %path.display(), ?options, "applied editor options");
    Some(options)
}

/// Trim, add the final newline, then save.
///
/// Skipped without error when the document has no configuration or no
/// visible editor shows it.
pub async fn run_save_pipeline(
    provider: &dyn SettingsProvider,
    surface: &dyn EditorSurface,
    document: &dyn TextDocument,
) -> Result<SaveOutcome, EditError> {
    let Some(path) = document.path() else {
        return Ok(SaveOutcome::Skipped(SkipReason::Untitled));
    };
    let Some(config) = provider.settings_for(path).await else {
        return Ok(SaveOutcome::Skipped(SkipReason::NoConfiguration));
    };
    if surface.visible_editor_for(path).is_none() {
        return Ok(SaveOutcome::Skipped(SkipReason::NoVisibleEditor));
    }

    let report = run_pipeline(&config, &provider.defaults(), document).await?;
    document.save().await?;
    Ok(SaveOutcome::Saved(report))
}

pub struct ApplicationController {
    surface: Arc<dyn EditorSurface>,
    cache: Arc<ConfigResolutionCache>,
    dispatcher: EventDispatcher,
}

impl ApplicationController {
    pub fn new(surface: Arc<dyn EditorSurface>, cache: Arc<ConfigResolutionCache>) -> Arc<Self> {
        Self::with_dispatcher(surface, cache, EventDispatcher::with_default_handlers())
    }

    pub fn with_dispatcher(
        surface: Arc<dyn EditorSurface>,
        cache: Arc<ConfigResolutionCache>,
        dispatcher: EventDispatcher,
    ) -> Arc<Self> {
        Arc::new(Self {
            surface,
            cache,
            dispatcher,
        })
    }

    pub fn cache(&self) -> &Arc<ConfigResolutionCache> {
        &self.cache
    }

    pub fn surface(&self) -> &Arc<dyn EditorSurface> {
        &self.surface
    }

    /// Route `event` to its handler.
    pub fn dispatch(self: &Arc<Self>, event: HostEvent) -> BoxFuture<'static, ()> {
        self.dispatcher.dispatch(self.clone(), event)
    }

    /// Resolve `document`, then refresh the active editor.
    ///
    /// The refresh targets whichever editor is active, which need not be the
    /// one showing `document`.
    pub async fn ensure_resolved(&self, document: &dyn TextDocument) -> Resolution {
        let resolution = self.cache.ensure_resolved(document).await;
        self.refresh_active_editor().await;
        resolution
    }

    /// Rebuild the cache from every open document, then refresh.
    pub async fn rebuild_all(&self) -> Vec<Resolution> {
        let documents = self.surface.open_documents();
        let results = self.cache.rebuild_all(&documents).await;
        self.refresh_active_editor().await;
        results
    }

    pub async fn refresh_active_editor(&self) -> Option<HostEditorOptions> {
        apply_editor_options(&*self.cache, &*self.surface).await
    }

    pub async fn on_activated(&self) {
        self.on_configuration_changed();
        self.rebuild_all().await;
    }

    pub async fn on_active_editor_changed(&self) {
        let Some(editor) = self.surface.active_editor() else {
            return;
        };
        let document = editor.document();
        self.ensure_resolved(document.as_ref()).await;
    }

    /// Replace the defaults with a fresh snapshot of the host settings.
    pub fn on_configuration_changed(&self) {
        let defaults = DefaultSettings::from_host(&self.surface.editor_settings());
        debug!(?defaults, "host settings changed");
        self.cache.replace_defaults(defaults);
    }

    /// Saving a configuration file rebuilds the cache before the pipeline
    /// runs, so the file is transformed with its own new settings.
    pub async fn on_document_saved(
        &self,
        document: &dyn TextDocument,
    ) -> Result<SaveOutcome, EditError> {
        if document.is_config_file() {
            info!("configuration file saved, rebuilding cache");
            self.rebuild_all().await;
        }
        run_save_pipeline(&*self.cache, &*self.surface, document).await
    }

    /// The "generate configuration file" command.
    pub fn generate_config_file(&self) -> io::Result<GenerateOutcome> {
        let root = self.surface.workspace_root();
        let result = generate_editorconfig(root.as_deref(), &self.surface.editor_settings());

        match &result {
            Ok(GenerateOutcome::Created(path)) => {
                info!(path = %path.display(), "generated editorconfig");
            }
            Ok(GenerateOutcome::NoWorkspace) => self.surface.show_message(
                MessageLevel::Info,
                "An .editorconfig file can only be generated inside a workspace.",
            ),
            Ok(GenerateOutcome::AlreadyExists(path)) => self.surface.show_message(
                MessageLevel::Info,
                &format!("{} already exists.", path.display()),
            ),
            Err(e) => self.surface.show_message(MessageLevel::Error, &e.to_string()),
        }
        result
    }
}
