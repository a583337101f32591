// src/core/navigation.rs

//! # Navigation Engine
//!
//! Runs a tree of [`MenuLevel`]s. Each level loops on "redraw, wait for a key,
//! run the choice" until it is left, and a submenu choice recurses into the
//! nested level, so the Rust call stack is the navigation stack.
//!
//! A level is left in one of four ways:
//!
//! - **pop**: `Esc` on a cancelable level, or an action returning
//!   [`Flow::Pop`]. The parent simply redraws.
//! - **exit request**: an action returning [`Flow::Exit`]. Every level unwinds
//!   up to the root and the shell ends cleanly.
//! - **interruption**: the termination signal is set, or the panel reports an
//!   external interruption. Never swallowed: it reaches the root.
//! - **action failure**: logged and recovered by the level that ran the
//!   action, except at the root where it becomes fatal. A front panel error
//!   while a nested level waits for a key is handled the same way: the level
//!   redraws, and after [`MAX_PANEL_FAILURES`] failures in a row it gives
//!   control back to its parent.

use crate::{
    CancellationToken,
    constants::{MAX_CHOICES, MAX_PANEL_FAILURES},
    core::{
        commons::{self, Interrupted},
        selector::{Selection, Selector},
        supervisor::SupervisorError,
    },
    models::ExitRequest,
    system::panel::{Panel, PanelError},
};
use thiserror::Error;

// --- MENU TREE ---

#[derive(Debug, Clone)]
pub struct MenuLevel<A> {
    title: String,
    choices: Vec<Choice<A>>,
    cancelable: bool,
}

#[derive(Debug, Clone)]
pub struct Choice<A> {
    pub label: String,
    pub item: MenuItem<A>,
}

#[derive(Debug, Clone)]
pub enum MenuItem<A> {
    Submenu(MenuLevel<A>),
    Action(A),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MenuError {
    #[error("Menu '{title}' has {count} choices, the keypad can select {max} at most.")]
    TooManyChoices {
        title: String,
        count: usize,
        max: usize,
    },
    #[error("Menu '{0}' has no choices.")]
    Empty(String),
}

impl<A> MenuLevel<A> {
    /// The root level: it cannot be cancelled.
    pub fn root(title: impl Into<String>, choices: Vec<Choice<A>>) -> Result<Self, MenuError> {
        Self::new(title.into(), choices, false)
    }

    pub fn submenu(title: impl Into<String>, choices: Vec<Choice<A>>) -> Result<Self, MenuError> {
        Self::new(title.into(), choices, true)
    }

    fn new(title: String, choices: Vec<Choice<A>>, cancelable: bool) -> Result<Self, MenuError> {
        if choices.is_empty() {
            return Err(MenuError::Empty(title));
        }
        if choices.len() > MAX_CHOICES {
            return Err(MenuError::TooManyChoices {
                title,
                count: choices.len(),
                max: MAX_CHOICES,
            });
        }
        Ok(Self {
            title,
            choices,
            cancelable,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn choices(&self) -> &[Choice<A>] {
        &self.choices
    }

    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }
}

impl<A> Choice<A> {
    pub fn action(label: impl Into<String>, action: A) -> Self {
        Self {
            label: label.into(),
            item: MenuItem::Action(action),
        }
    }

    pub fn submenu(label: impl Into<String>, level: MenuLevel<A>) -> Self {
        Self {
            label: label.into(),
            item: MenuItem::Submenu(level),
        }
    }
}

// --- ACTIONS ---

/// What the engine does once an action returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Redraw the current level.
    Stay,
    /// Leave the current level. Ignored at the root.
    Pop,
    /// Leave the shell.
    Exit(ExitRequest),
}

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Action interrupted by a termination request.")]
    Interrupted,
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl From<Interrupted> for ActionError {
    fn from(_: Interrupted) -> Self {
        Self::Interrupted
    }
}

impl From<PanelError> for ActionError {
    fn from(e: PanelError) -> Self {
        match e {
            PanelError::Interrupted => Self::Interrupted,
            other => Self::Failed(other.into()),
        }
    }
}

impl From<SupervisorError> for ActionError {
    fn from(e: SupervisorError) -> Self {
        match e {
            SupervisorError::Interrupted => Self::Interrupted,
            other => Self::Failed(other.into()),
        }
    }
}

/// Executes the leaf actions of a menu tree.
pub trait ActionHandler<A> {
    fn execute(
        &mut self,
        action: &A,
        panel: &mut dyn Panel,
        token: &CancellationToken,
    ) -> Result<Flow, ActionError>;
}

// --- ENGINE ---

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Navigation interrupted by a termination request.")]
    Interrupted,
    #[error("Unrecoverable error in the root menu: {0:#}")]
    Fatal(anyhow::Error),
}

/// How a level was left, as seen by its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelExit {
    Popped,
    Exit(ExitRequest),
}

pub struct Navigator<'a, H> {
    panel: &'a mut dyn Panel,
    handler: &'a mut H,
    token: &'a CancellationToken,
}

impl<H> std::fmt::Debug for Navigator<'_, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator").finish_non_exhaustive()
    }
}

impl<'a, H> Navigator<'a, H> {
    pub fn new(panel: &'a mut dyn Panel, handler: &'a mut H, token: &'a CancellationToken) -> Self {
        Self {
            panel,
            handler,
            token,
        }
    }

    /// Runs `root` until an action asks to leave the shell. Returns that request.
    pub fn run<A>(&mut self, root: &MenuLevel<A>) -> Result<ExitRequest, NavigationError>
    where
        H: ActionHandler<A>,
    {
        loop {
            match self.run_level(root, 0)? {
                LevelExit::Exit(request) => return Ok(request),
                // Only reachable if the root was built cancelable.
                LevelExit::Popped => log::debug!("ignoring pop request at the root"),
            }
        }
    }

    fn run_level<A>(&mut self, level: &MenuLevel<A>, depth: usize) -> Result<LevelExit, NavigationError>
    where
        H: ActionHandler<A>,
    {
        log::info!("entering level \"{}\" (depth {})", level.title, depth);
        let result = self.level_loop(level, depth);
        match &result {
            Ok(exit) => log::info!("exiting level \"{}\" with {:?}", level.title, exit),
            Err(e) => log::info!("leaving level \"{}\": {}", level.title, e),
        }
        result
    }

    fn level_loop<A>(&mut self, level: &MenuLevel<A>, depth: usize) -> Result<LevelExit, NavigationError>
    where
        H: ActionHandler<A>,
    {
        let labels: Vec<String> = level.choices.iter().map(|c| c.label.clone()).collect();
        let selector = Selector::new(&level.title, &labels, level.cancelable);
        let mut panel_failures = 0;

        loop {
            if commons::is_terminated(self.token) {
                return Err(NavigationError::Interrupted);
            }

            let position = match self.select(&selector) {
                Ok(Selection::Cancel) if level.cancelable => return Ok(LevelExit::Popped),
                Ok(Selection::Cancel) => continue,
                Ok(Selection::Choice(position)) => position,
                Err(PanelError::Interrupted) => return Err(NavigationError::Interrupted),
                Err(e) if depth == 0 => {
                    log::error!("front panel failed in the root menu: {}", e);
                    return Err(NavigationError::Fatal(e.into()));
                }
                Err(e) => {
                    panel_failures += 1;
                    log::error!("front panel failed in \"{}\": {}", level.title, e);
                    if panel_failures >= MAX_PANEL_FAILURES {
                        log::warn!("leaving \"{}\" after {} panel failures", level.title, panel_failures);
                        return Ok(LevelExit::Popped);
                    }
                    continue;
                }
            };
            panel_failures = 0;
            let Some(choice) = level.choices.get(position) else {
                continue;
            };
            log::debug!("\"{}\" selected in \"{}\"", choice.label, level.title);

            let flow = match &choice.item {
                MenuItem::Submenu(sublevel) => match self.run_level(sublevel, depth + 1)? {
                    LevelExit::Popped => Flow::Stay,
                    LevelExit::Exit(request) => Flow::Exit(request),
                },
                MenuItem::Action(action) => match self.handler.execute(action, self.panel, self.token) {
                    Ok(flow) => flow,
                    Err(ActionError::Interrupted) => return Err(NavigationError::Interrupted),
                    Err(ActionError::Failed(e)) if depth == 0 => {
                        log::error!("action \"{}\" failed in the root menu: {:#}", choice.label, e);
                        return Err(NavigationError::Fatal(e));
                    }
                    Err(ActionError::Failed(e)) => {
                        log::error!("action \"{}\" failed: {:#}", choice.label, e);
                        Flow::Stay
                    }
                },
            };

            match flow {
                Flow::Stay => {}
                Flow::Pop if level.cancelable => return Ok(LevelExit::Popped),
                Flow::Pop => log::debug!("ignoring pop request at the root"),
                Flow::Exit(request) => return Ok(LevelExit::Exit(request)),
            }
        }
    }

    fn select(&mut self, selector: &Selector<'_>) -> Result<Selection, PanelError> {
        selector.display(self.panel)?;
        selector.handle_choice(self.panel, self.token)
    }
}
