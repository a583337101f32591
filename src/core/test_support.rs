// src/core/test_support.rs

// In-memory collaborators used by the unit tests.

use crate::{
    CancellationToken,
    core::commons,
    models::{ExitStatus, Key, KeySet, LaunchSpec},
    system::{
        arm::{ArmClient, ArmError},
        executor::{ExecutionError, LaunchError, ProcessHandle, ProcessLauncher},
        panel::{Panel, PanelError},
    },
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

// --- Panel ---

/// A 20x4 panel whose keypad replays a script of key states, one state per
/// `current_keys` call.
///
/// When the script runs out the keypad keeps reporting the last state, unless
/// told to report an external interruption or a device failure instead.
#[derive(Debug)]
pub struct FakePanel {
    frame: Vec<Vec<char>>,
    script: VecDeque<KeySet>,
    last_state: KeySet,
    interrupt_when_exhausted: bool,
    fail_when_exhausted: bool,
    failing_reads: Vec<usize>,
    failing_writes: bool,
    terminate_at_read: Option<(usize, CancellationToken)>,
    key_reads: usize,
    ok_led: bool,
    leds_off_calls: usize,
    transcript: Vec<String>,
}

impl FakePanel {
    pub fn new() -> Self {
        Self {
            frame: vec![vec![' '; 20]; 4],
            script: VecDeque::new(),
            last_state: KeySet::new(),
            interrupt_when_exhausted: false,
            fail_when_exhausted: false,
            failing_reads: Vec::new(),
            failing_writes: false,
            terminate_at_read: None,
            key_reads: 0,
            ok_led: false,
            leds_off_calls: 0,
            transcript: Vec::new(),
        }
    }

    /// Appends one keypad state to the script.
    pub fn state<I: IntoIterator<Item = Key>>(mut self, keys: I) -> Self {
        self.script.push_back(keys.into_iter().collect());
        self
    }

    /// Appends `count` idle states.
    pub fn idle(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.script.push_back(KeySet::new());
        }
        self
    }

    /// Scripts one complete key press as seen by a key wait: the wait's
    /// initial (idle) read, then the key going down.
    pub fn press(self, key: Key) -> Self {
        self.idle(1).state([key])
    }

    pub fn interrupt_when_exhausted(mut self) -> Self {
        self.interrupt_when_exhausted = true;
        self
    }

    /// Once the script is over, keypad reads fail like a broken device.
    pub fn fail_when_exhausted(mut self) -> Self {
        self.fail_when_exhausted = true;
        self
    }

    /// Makes the given keypad reads (1-based) fail like a garbled device
    /// read. A failed read does not consume a scripted state.
    pub fn fail_at_reads<I: IntoIterator<Item = usize>>(mut self, reads: I) -> Self {
        self.failing_reads.extend(reads);
        self
    }

    /// Every display write fails with an I/O error.
    pub fn failing_writes(mut self) -> Self {
        self.failing_writes = true;
        self
    }

    /// Sets `token` while serving the `read`-th keypad read (1-based).
    pub fn terminate_at_read(mut self, read: usize, token: &CancellationToken) -> Self {
        self.terminate_at_read = Some((read, token.clone()));
        self
    }

    pub fn rows(&self) -> Vec<String> {
        self.frame.iter().map(|row| row.iter().collect()).collect()
    }

    /// Every text written since the panel was created, in order.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn showed(&self, text: &str) -> bool {
        self.transcript.iter().any(|t| t.contains(text))
    }

    pub fn key_reads(&self) -> usize {
        self.key_reads
    }

    pub fn unread_key_states(&self) -> usize {
        self.script.len()
    }

    pub fn ok_led(&self) -> bool {
        self.ok_led
    }

    pub fn leds_off_calls(&self) -> usize {
        self.leds_off_calls
    }
}

impl Panel for FakePanel {
    fn width(&self) -> usize {
        20
    }

    fn height(&self) -> usize {
        4
    }

    fn key_scan_period(&self) -> Duration {
        Duration::from_millis(1)
    }

    fn clear(&mut self) -> Result<(), PanelError> {
        for row in &mut self.frame {
            row.fill(' ');
        }
        Ok(())
    }

    fn write_at(&mut self, text: &str, line: usize, col: usize) -> Result<(), PanelError> {
        if self.failing_writes {
            return Err(PanelError::Device {
                path: "display".to_string(),
                source: io::Error::other("display write failed"),
            });
        }
        self.transcript.push(text.to_string());
        if let Some(row) = line.checked_sub(1).and_then(|l| self.frame.get_mut(l)) {
            for (cell, ch) in row.iter_mut().skip(col.saturating_sub(1)).zip(text.chars()) {
                *cell = ch;
            }
        }
        Ok(())
    }

    fn current_keys(&mut self) -> Result<KeySet, PanelError> {
        self.key_reads += 1;
        if let Some((read, token)) = &self.terminate_at_read {
            if *read == self.key_reads {
                commons::request_termination(token);
            }
        }
        if self.failing_reads.contains(&self.key_reads) {
            return Err(PanelError::InvalidKeyState(format!("{:#x}", self.key_reads)));
        }
        match self.script.pop_front() {
            Some(state) => {
                self.last_state = state.clone();
                Ok(state)
            }
            None if self.interrupt_when_exhausted => Err(PanelError::Interrupted),
            None if self.fail_when_exhausted => Err(PanelError::InvalidKeyState("garbage".to_string())),
            None => Ok(self.last_state.clone()),
        }
    }

    fn set_ok_led(&mut self, on: bool) -> Result<(), PanelError> {
        self.ok_led = on;
        Ok(())
    }

    fn leds_off(&mut self) -> Result<(), PanelError> {
        self.ok_led = false;
        self.leds_off_calls += 1;
        Ok(())
    }
}

// --- Processes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessEvent {
    TryWait,
    Terminate,
    Wait,
}

/// Shared record of the calls made on a [`FakeProcess`], readable after the
/// process has been boxed and handed over.
#[derive(Debug, Clone, Default)]
pub struct ProcessJournal {
    events: Rc<RefCell<Vec<ProcessEvent>>>,
}

impl ProcessJournal {
    fn record(&self, event: ProcessEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<ProcessEvent> {
        self.events.borrow().clone()
    }

    fn count(&self, event: ProcessEvent) -> usize {
        self.events.borrow().iter().filter(|e| **e == event).count()
    }

    pub fn try_wait_calls(&self) -> usize {
        self.count(ProcessEvent::TryWait)
    }

    pub fn terminate_calls(&self) -> usize {
        self.count(ProcessEvent::Terminate)
    }

    pub fn wait_calls(&self) -> usize {
        self.count(ProcessEvent::Wait)
    }
}

#[derive(Debug)]
pub struct FakeProcess {
    /// Number of `try_wait` calls answering "still running" before the
    /// process exits on its own. `None` runs until terminated.
    polls_before_exit: Option<usize>,
    exit_code: i32,
    terminate_fails: bool,
    terminated: bool,
    journal: ProcessJournal,
}

impl FakeProcess {
    pub fn exiting_after(polls: usize, exit_code: i32) -> Self {
        Self {
            polls_before_exit: Some(polls),
            exit_code,
            terminate_fails: false,
            terminated: false,
            journal: ProcessJournal::default(),
        }
    }

    pub fn running_forever() -> Self {
        Self {
            polls_before_exit: None,
            ..Self::exiting_after(0, 0)
        }
    }

    /// The terminate request reports a failure, but the process still dies.
    pub fn with_failing_terminate(mut self) -> Self {
        self.terminate_fails = true;
        self
    }

    pub fn journal(&self) -> ProcessJournal {
        self.journal.clone()
    }

    fn natural_status(&self) -> ExitStatus {
        ExitStatus::from_code(self.exit_code)
    }
}

impl ProcessHandle for FakeProcess {
    fn id(&self) -> u32 {
        4242
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.journal.record(ProcessEvent::TryWait);
        if self.terminated {
            return Ok(Some(ExitStatus::from_signal(15)));
        }
        match self.polls_before_exit {
            Some(0) => Ok(Some(self.natural_status())),
            Some(remaining) => {
                self.polls_before_exit = Some(remaining - 1);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.journal.record(ProcessEvent::Terminate);
        self.terminated = true;
        if self.terminate_fails {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "operation not permitted"));
        }
        Ok(())
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        self.journal.record(ProcessEvent::Wait);
        if self.terminated {
            Ok(ExitStatus::from_signal(15))
        } else {
            Ok(self.natural_status())
        }
    }
}

/// Hands out scripted processes in order. Once the queue is empty every
/// start fails as if the program did not exist.
#[derive(Debug, Default)]
pub struct FakeLauncher {
    queue: VecDeque<FakeProcess>,
    started: Vec<LaunchSpec>,
}

impl FakeLauncher {
    pub fn with_process(process: FakeProcess) -> Self {
        let mut launcher = Self::default();
        launcher.queue.push_back(process);
        launcher
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn then(mut self, process: FakeProcess) -> Self {
        self.queue.push_back(process);
        self
    }

    pub fn started(&self) -> &[LaunchSpec] {
        &self.started
    }
}

impl ProcessLauncher for FakeLauncher {
    fn start(&mut self, spec: &LaunchSpec) -> Result<Box<dyn ProcessHandle>, LaunchError> {
        self.started.push(spec.clone());
        match self.queue.pop_front() {
            Some(process) => Ok(Box::new(process)),
            None => Err(LaunchError::Spawn {
                command: spec.to_string(),
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    "No such file or directory (os error 2)",
                ),
            }),
        }
    }
}

/// Lets a test keep a handle on a launcher it hands over as a box.
impl ProcessLauncher for Rc<RefCell<FakeLauncher>> {
    fn start(&mut self, spec: &LaunchSpec) -> Result<Box<dyn ProcessHandle>, LaunchError> {
        self.borrow_mut().start(spec)
    }
}

// --- Arm ---

#[derive(Debug, Default)]
pub struct FakeArm {
    pub calls: Vec<&'static str>,
    pub failure: Option<String>,
}

impl FakeArm {
    pub fn failing(message: &str) -> Self {
        Self {
            calls: Vec::new(),
            failure: Some(message.to_string()),
        }
    }

    fn call(&mut self, name: &'static str) -> Result<(), ArmError> {
        self.calls.push(name);
        match &self.failure {
            Some(message) => Err(ArmError::Execution(ExecutionError::Wait {
                command: "arm-ctl".to_string(),
                source: io::Error::other(message.clone()),
            })),
            None => Ok(()),
        }
    }
}

impl ArmClient for FakeArm {
    fn disable_motors(&mut self, _token: &CancellationToken) -> Result<(), ArmError> {
        self.call("disable_motors")
    }

    fn initialize(&mut self, _token: &CancellationToken) -> Result<(), ArmError> {
        self.call("initialize")
    }
}
