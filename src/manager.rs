//! The orchestrator that ties the two backends and the public space list
//! together.
//!
//! [`SpaceManager`] owns one yabai backend and one native backend, picks the
//! active one according to the [`SpaceMode`], and exposes the caller-facing
//! operations (refresh, switch, rename).  It is shared behind an `Arc`;
//! every method takes `&self`, so a refresh may run while a switch is in
//! flight on the worker thread.

use crate::command::{Command, RenameTarget, SpaceIndex, SpaceRef};
use crate::error::{recovery_suggestion, user_message};
use crate::retry::{run_verified, RetryPolicy, RetryResult, SwitchToken, SwitchTokens};
use crate::space::{current_of, Space};
use crate::traits::{PanelEvent, PanelSnapshot, Preflight, SpaceBackend, SwitchOutcome};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{mpsc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// How the active backend is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceMode {
    /// yabai when available, otherwise native.
    #[default]
    Auto,
    /// yabai only.
    Yabai,
    /// Native only.
    Native,
}

impl SpaceMode {
    pub const ALL: [SpaceMode; 3] = [SpaceMode::Auto, SpaceMode::Yabai, SpaceMode::Native];

    pub fn display_name(self) -> &'static str {
        match self {
            SpaceMode::Auto => "Auto (Yabai if available)",
            SpaceMode::Yabai => "Yabai",
            SpaceMode::Native => "Native macOS",
        }
    }
}

/// The backend currently in charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveBackend {
    Yabai,
    Native,
    None,
}

/// Selection policy.  Auto prefers yabai; forced modes never fall back.
pub fn select_backend(mode: SpaceMode, yabai_available: bool, native_available: bool) -> ActiveBackend {
    match mode {
        SpaceMode::Auto if yabai_available => ActiveBackend::Yabai,
        SpaceMode::Auto if native_available => ActiveBackend::Native,
        SpaceMode::Yabai if yabai_available => ActiveBackend::Yabai,
        SpaceMode::Native if native_available => ActiveBackend::Native,
        _ => ActiveBackend::None,
    }
}

/// Human-readable name of `active` under `mode`.
pub fn active_backend_name(mode: SpaceMode, active: ActiveBackend) -> &'static str {
    match (active, mode) {
        (ActiveBackend::Yabai, _) => "Yabai",
        (ActiveBackend::Native, _) => "Native",
        (ActiveBackend::None, SpaceMode::Yabai) => "None (Yabai unavailable)",
        (ActiveBackend::None, SpaceMode::Native) => "None (Native unavailable)",
        (ActiveBackend::None, SpaceMode::Auto) => "None",
    }
}

/// Log a failed switch with its user-facing explanation.
pub fn report_outcome(outcome: SwitchOutcome) {
    if let Some(kind) = outcome.failure_kind() {
        match recovery_suggestion(kind) {
            Some(hint) => warn!("{} ({})", user_message(kind), hint),
            None => warn!("{}", user_message(kind)),
        }
    }
}

#[derive(Debug)]
struct State {
    mode: SpaceMode,
    active: ActiveBackend,
    spaces: Vec<Space>,
}

/// Backend selection, the public space list, and the switch protocol.
pub struct SpaceManager {
    yabai: Box<dyn SpaceBackend>,
    native: Box<dyn SpaceBackend>,
    state: RwLock<State>,
    tokens: SwitchTokens,
    verify: RetryPolicy,
    panel: Mutex<Option<mpsc::Sender<PanelEvent>>>,
}

impl SpaceManager {
    /// Build the manager and run the initial refresh.
    ///
    /// yabai is queried once up front regardless of `mode` so its native
    /// labels are seeded into the label store.  `verify` bounds the
    /// verification loop for backends that do not verify themselves.
    pub fn new(
        yabai: Box<dyn SpaceBackend>,
        native: Box<dyn SpaceBackend>,
        mode: SpaceMode,
        verify: RetryPolicy,
    ) -> Self {
        let manager = Self {
            yabai,
            native,
            state: RwLock::new(State {
                mode,
                active: ActiveBackend::None,
                spaces: Vec::new(),
            }),
            tokens: SwitchTokens::new(),
            verify,
            panel: Mutex::new(None),
        };
        if mode != SpaceMode::Native {
            let seeded = manager.yabai.spaces().len();
            debug!("initial yabai query returned {} space(s)", seeded);
        }
        manager.refresh_spaces();
        manager
    }

    /// Attach the selector panel channel.
    pub fn set_panel(&self, tx: mpsc::Sender<PanelEvent>) {
        *lock(&self.panel) = Some(tx);
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn backend(&self, active: ActiveBackend) -> Option<&dyn SpaceBackend> {
        match active {
            ActiveBackend::Yabai => Some(self.yabai.as_ref()),
            ActiveBackend::Native => Some(self.native.as_ref()),
            ActiveBackend::None => None,
        }
    }

    /// Probe only the backends `mode` could select.
    fn probe_and_select(&self, mode: SpaceMode) -> ActiveBackend {
        match mode {
            SpaceMode::Auto => {
                let yabai = self.yabai.is_available();
                let native = !yabai && self.native.is_available();
                select_backend(mode, yabai, native)
            }
            SpaceMode::Yabai => select_backend(mode, self.yabai.is_available(), false),
            SpaceMode::Native => select_backend(mode, false, self.native.is_available()),
        }
    }

    /// Re-probe availability, reselect the backend and replace the public
    /// space list.  Read-only with respect to the system.
    pub fn refresh_spaces(&self) -> Vec<Space> {
        let mut mode = self.mode();
        loop {
            let active = self.probe_and_select(mode);
            let spaces = self.backend(active).map(|b| b.spaces()).unwrap_or_default();

            let mut state = self.write();
            if state.mode != mode {
                // Mode changed while probing; select again under the new one.
                mode = state.mode;
                continue;
            }
            if state.active != active {
                info!(
                    "active backend: {} -> {}",
                    active_backend_name(mode, state.active),
                    active_backend_name(mode, active)
                );
            }
            state.active = active;
            state.spaces = spaces.clone();
            debug!("{} space(s) from {}", spaces.len(), active_backend_name(mode, active));
            return spaces;
        }
    }

    /// Snapshot of the last refreshed space list.
    pub fn spaces(&self) -> Vec<Space> {
        self.read().spaces.clone()
    }

    pub fn current_space(&self) -> Option<Space> {
        current_of(&self.read().spaces).cloned()
    }

    pub fn active_backend(&self) -> ActiveBackend {
        self.read().active
    }

    pub fn active_backend_name(&self) -> &'static str {
        let state = self.read();
        active_backend_name(state.mode, state.active)
    }

    pub fn mode(&self) -> SpaceMode {
        self.read().mode
    }

    /// Change the mode; reselects and refreshes if it changed.
    pub fn set_mode(&self, mode: SpaceMode) {
        {
            let mut state = self.write();
            if state.mode == mode {
                return;
            }
            info!("mode: {} -> {}", state.mode.display_name(), mode.display_name());
            state.mode = mode;
        }
        self.refresh_spaces();
    }

    pub fn has_available_backend(&self) -> bool {
        self.yabai.is_available() || self.native.is_available()
    }

    /// Run the native first-launch permission flow when the native backend
    /// is (or would become) the one in use.  Returns whether it ran.
    pub fn ensure_permissions(&self) -> bool {
        let needed = match self.mode() {
            SpaceMode::Native => true,
            SpaceMode::Auto => !self.yabai.is_available(),
            SpaceMode::Yabai => false,
        };
        if needed {
            self.native.prepare_permissions();
            self.refresh_spaces();
        }
        needed
    }

    //  Switching

    /// Start a new switch, cancelling any switch in flight.
    pub fn begin_switch(&self) -> SwitchToken {
        self.tokens.begin()
    }

    pub fn switch_to(&self, space: &Space) -> SwitchOutcome {
        let token = self.begin_switch();
        self.switch_with_token(space, &token)
    }

    /// Switch to `space` on the active backend under `token`.
    pub fn switch_with_token(&self, space: &Space, token: &SwitchToken) -> SwitchOutcome {
        let active = self.active_backend();
        let Some(backend) = self.backend(active) else {
            return SwitchOutcome::NoBackend;
        };
        if token.is_cancelled() {
            return SwitchOutcome::Cancelled;
        }
        if backend.preflight() == Preflight::PermissionRequested {
            info!("switch to {} skipped: no permission", space);
            return SwitchOutcome::PermissionRequested;
        }

        info!("switching to {} via {}", space, backend.kind());
        let outcome = if backend.verifies_switch() {
            backend.switch_to(space, token)
        } else {
            self.verified(backend, space, token)
        };
        if outcome == SwitchOutcome::Switched {
            self.refresh_spaces();
        }
        outcome
    }

    /// Wrap a backend that only issues actions in the manager's
    /// verify/retry loop.
    fn verified(&self, backend: &dyn SpaceBackend, space: &Space, token: &SwitchToken) -> SwitchOutcome {
        let mut last = SwitchOutcome::Unverified;
        let result = run_verified(
            &self.verify,
            token,
            |_| {
                last = backend.switch_to(space, token);
                matches!(last, SwitchOutcome::Switched | SwitchOutcome::Unverified)
            },
            || backend.current_space().is_some_and(|c| c.id == space.id),
        );
        match result {
            RetryResult::Verified { .. } => SwitchOutcome::Switched,
            RetryResult::Cancelled => SwitchOutcome::Cancelled,
            RetryResult::Exhausted => match last {
                SwitchOutcome::Switched => SwitchOutcome::Unverified,
                other => other,
            },
        }
    }

    pub fn switch_to_index(&self, index: u32) -> SwitchOutcome {
        let token = self.begin_switch();
        self.switch_to_index_with(index, &token)
    }

    /// Refresh, then switch to the space numbered `index`.  A missing index
    /// is a no-op.
    pub fn switch_to_index_with(&self, index: u32, token: &SwitchToken) -> SwitchOutcome {
        let spaces = self.refresh_spaces();
        if self.active_backend() == ActiveBackend::None {
            return SwitchOutcome::NoBackend;
        }
        match spaces.iter().find(|s| s.index == index) {
            Some(space) => self.switch_with_token(space, token),
            None => {
                debug!("no space with index {}", index);
                SwitchOutcome::NoSuchSpace
            }
        }
    }

    pub fn switch_to_id(&self, id: &str) -> SwitchOutcome {
        let token = self.begin_switch();
        self.switch_to_id_with(id, &token)
    }

    pub fn switch_to_id_with(&self, id: &str, token: &SwitchToken) -> SwitchOutcome {
        let spaces = self.refresh_spaces();
        if self.active_backend() == ActiveBackend::None {
            return SwitchOutcome::NoBackend;
        }
        match spaces.iter().find(|s| s.id == id) {
            Some(space) => self.switch_with_token(space, token),
            None => {
                debug!("no space with id {}", id);
                SwitchOutcome::NoSuchSpace
            }
        }
    }

    //  Labels

    /// Set or clear the label of `space`, then refresh.  Returns `false` when
    /// no backend is active.
    pub fn rename_space(&self, space: &Space, name: &str) -> bool {
        let Some(backend) = self.backend(self.active_backend()) else {
            warn!("cannot rename {}: {}", space, self.active_backend_name());
            return false;
        };
        info!("renaming {} to {:?}", space, name);
        backend.rename_space(space, name);
        self.refresh_spaces();
        true
    }

    pub fn rename_id(&self, id: &str, name: &str) -> bool {
        let spaces = self.refresh_spaces();
        if self.active_backend() == ActiveBackend::None {
            return false;
        }
        match spaces.iter().find(|s| s.id == id) {
            Some(space) => self.rename_space(space, name),
            None => {
                warn!("cannot rename: no space with id {}", id);
                false
            }
        }
    }

    pub fn rename_current(&self, name: &str) -> bool {
        let spaces = self.refresh_spaces();
        match current_of(&spaces) {
            Some(space) => self.rename_space(space, name),
            None => false,
        }
    }

    //  Panel

    /// Send a [`PanelEvent::Toggle`] with a fresh snapshot.  Without a panel
    /// the snapshot is only logged.
    pub fn toggle_visibility(&self) {
        let snapshot = PanelSnapshot {
            spaces: self.refresh_spaces(),
            active_backend: self.active_backend_name().to_string(),
        };
        match lock(&self.panel).as_ref() {
            Some(tx) => {
                if tx.send(PanelEvent::Toggle(snapshot)).is_err() {
                    debug!("panel receiver dropped");
                }
            }
            None => {
                for space in &snapshot.spaces {
                    info!("{}{}", if space.is_current { "* " } else { "  " }, space);
                }
            }
        }
    }

    /// Execute `cmd` synchronously.  Switch commands return their outcome.
    pub fn handle(&self, cmd: Command) -> Option<SwitchOutcome> {
        info!("command: {}", cmd);
        match cmd {
            Command::Refresh => {
                self.refresh_spaces();
            }
            Command::SwitchTo(SpaceRef(id)) => {
                let outcome = self.switch_to_id(&id);
                report_outcome(outcome);
                return Some(outcome);
            }
            Command::SwitchToIndex(SpaceIndex(n)) => {
                let outcome = self.switch_to_index(n);
                report_outcome(outcome);
                return Some(outcome);
            }
            Command::Rename(RenameTarget { id, name }) => {
                self.rename_id(&id.0, &name);
            }
            Command::RenameCurrent(name) => {
                self.rename_current(&name);
            }
            Command::SetMode(mode) => self.set_mode(mode),
            Command::ToggleVisibility => self.toggle_visibility(),
            Command::EnsurePermissions => {
                if !self.ensure_permissions() {
                    debug!("permission flow not needed in mode {:?}", self.mode());
                }
            }
        }
        None
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::traits::BackendKind;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Recording backend.  When `flip_after` is set, the switch target
    /// becomes current once that many switch calls have been made.
    pub(crate) struct MockBackend {
        pub kind: BackendKind,
        pub available: AtomicBool,
        pub spaces: Mutex<Vec<Space>>,
        pub switches: Mutex<Vec<String>>,
        pub renames: Mutex<Vec<(String, String)>>,
        pub flip_after: Option<usize>,
        pub self_verifying: bool,
        pub denied: AtomicBool,
        pub prepared: AtomicUsize,
    }

    impl MockBackend {
        pub fn new(kind: BackendKind, available: bool, spaces: Vec<Space>) -> Self {
            Self {
                kind,
                available: AtomicBool::new(available),
                spaces: Mutex::new(spaces),
                switches: Mutex::new(Vec::new()),
                renames: Mutex::new(Vec::new()),
                flip_after: None,
                self_verifying: false,
                denied: AtomicBool::new(false),
                prepared: AtomicUsize::new(0),
            }
        }

        pub fn flipping(mut self, after: usize) -> Self {
            self.flip_after = Some(after);
            self
        }

        pub fn switch_count(&self) -> usize {
            self.switches.lock().unwrap().len()
        }
    }

    impl SpaceBackend for MockBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn is_available(&self) -> bool {
            self.available.load(Ordering::SeqCst)
        }

        fn spaces(&self) -> Vec<Space> {
            if !self.is_available() {
                return Vec::new();
            }
            self.spaces.lock().unwrap().clone()
        }

        fn switch_to(&self, space: &Space, _token: &SwitchToken) -> SwitchOutcome {
            let mut switches = self.switches.lock().unwrap();
            switches.push(space.id.clone());
            if self.flip_after.is_some_and(|n| switches.len() >= n) {
                for s in self.spaces.lock().unwrap().iter_mut() {
                    s.is_current = s.id == space.id;
                }
                if self.self_verifying {
                    return SwitchOutcome::Switched;
                }
            }
            SwitchOutcome::Unverified
        }

        fn verifies_switch(&self) -> bool {
            self.self_verifying
        }

        fn rename_space(&self, space: &Space, name: &str) {
            self.renames.lock().unwrap().push((space.id.clone(), name.to_string()));
            for s in self.spaces.lock().unwrap().iter_mut() {
                if s.id == space.id {
                    s.label = crate::space::normalize_label(Some(name.to_string()));
                }
            }
        }

        fn preflight(&self) -> Preflight {
            if self.denied.load(Ordering::SeqCst) {
                Preflight::PermissionRequested
            } else {
                Preflight::Ready
            }
        }

        fn prepare_permissions(&self) {
            self.prepared.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn two_spaces() -> Vec<Space> {
        vec![Space::new("1", 1, None, true), Space::new("2", 2, None, false)]
    }

    pub(crate) fn manager(
        yabai: &Arc<MockBackend>,
        native: &Arc<MockBackend>,
        mode: SpaceMode,
    ) -> SpaceManager {
        SpaceManager::new(
            Box::new(yabai.clone()),
            Box::new(native.clone()),
            mode,
            RetryPolicy::immediate(2),
        )
    }

    fn backends(yabai: bool, native: bool) -> (Arc<MockBackend>, Arc<MockBackend>) {
        (
            Arc::new(MockBackend::new(BackendKind::Yabai, yabai, two_spaces())),
            Arc::new(MockBackend::new(BackendKind::Native, native, two_spaces())),
        )
    }

    #[test]
    fn selection_policy() {
        use ActiveBackend as A;
        use SpaceMode as M;
        assert_eq!(select_backend(M::Auto, true, true), A::Yabai);
        assert_eq!(select_backend(M::Auto, true, false), A::Yabai);
        assert_eq!(select_backend(M::Auto, false, true), A::Native);
        assert_eq!(select_backend(M::Auto, false, false), A::None);
        assert_eq!(select_backend(M::Yabai, true, true), A::Yabai);
        assert_eq!(select_backend(M::Yabai, false, true), A::None);
        assert_eq!(select_backend(M::Native, true, true), A::Native);
        assert_eq!(select_backend(M::Native, true, false), A::None);
    }

    #[test]
    fn backend_names() {
        assert_eq!(active_backend_name(SpaceMode::Auto, ActiveBackend::Yabai), "Yabai");
        assert_eq!(active_backend_name(SpaceMode::Auto, ActiveBackend::Native), "Native");
        assert_eq!(active_backend_name(SpaceMode::Auto, ActiveBackend::None), "None");
        assert_eq!(
            active_backend_name(SpaceMode::Yabai, ActiveBackend::None),
            "None (Yabai unavailable)"
        );
        assert_eq!(
            active_backend_name(SpaceMode::Native, ActiveBackend::None),
            "None (Native unavailable)"
        );
    }

    #[test]
    fn mode_serde_and_display_names() {
        assert_eq!(serde_json::to_string(&SpaceMode::Native).unwrap(), r#""native""#);
        let m: SpaceMode = serde_json::from_str(r#""yabai""#).unwrap();
        assert_eq!(m, SpaceMode::Yabai);
        assert_eq!(SpaceMode::default(), SpaceMode::Auto);
        let names: Vec<&str> = SpaceMode::ALL.iter().map(|m| m.display_name()).collect();
        assert_eq!(names, vec!["Auto (Yabai if available)", "Yabai", "Native macOS"]);
    }

    #[test]
    fn auto_prefers_yabai_then_native() {
        let (yabai, native) = backends(true, true);
        let m = manager(&yabai, &native, SpaceMode::Auto);
        assert_eq!(m.active_backend(), ActiveBackend::Yabai);

        yabai.available.store(false, Ordering::SeqCst);
        m.refresh_spaces();
        assert_eq!(m.active_backend(), ActiveBackend::Native);

        native.available.store(false, Ordering::SeqCst);
        m.refresh_spaces();
        assert_eq!(m.active_backend(), ActiveBackend::None);
        assert!(m.spaces().is_empty());
        assert!(!m.has_available_backend());
    }

    #[test]
    fn forced_mode_never_falls_back() {
        let (yabai, native) = backends(false, true);
        let m = manager(&yabai, &native, SpaceMode::Yabai);
        assert_eq!(m.active_backend(), ActiveBackend::None);
        assert_eq!(m.active_backend_name(), "None (Yabai unavailable)");
        assert!(m.has_available_backend());
        assert_eq!(m.switch_to_index(2), SwitchOutcome::NoBackend);
        assert_eq!(m.switch_to_id("2"), SwitchOutcome::NoBackend);
        assert_eq!(native.switch_count(), 0);
    }

    #[test]
    fn set_mode_reselects() {
        let (yabai, native) = backends(true, true);
        let m = manager(&yabai, &native, SpaceMode::Auto);
        m.set_mode(SpaceMode::Native);
        assert_eq!(m.active_backend(), ActiveBackend::Native);
        assert_eq!(m.mode(), SpaceMode::Native);
        m.handle(Command::SetMode(SpaceMode::Yabai));
        assert_eq!(m.active_backend(), ActiveBackend::Yabai);
    }

    /// Yabai stand-in that switches the manager to native mode from inside
    /// its availability check, once armed.
    struct ModeSwitchingBackend {
        manager: std::sync::OnceLock<std::sync::Weak<SpaceManager>>,
        armed: AtomicBool,
    }

    impl SpaceBackend for ModeSwitchingBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Yabai
        }

        fn is_available(&self) -> bool {
            if self.armed.swap(false, Ordering::SeqCst) {
                if let Some(m) = self.manager.get().and_then(|w| w.upgrade()) {
                    m.set_mode(SpaceMode::Native);
                }
            }
            true
        }

        fn spaces(&self) -> Vec<Space> {
            two_spaces()
        }

        fn switch_to(&self, _space: &Space, _token: &SwitchToken) -> SwitchOutcome {
            SwitchOutcome::Unverified
        }

        fn rename_space(&self, _space: &Space, _name: &str) {}
    }

    #[test]
    fn refresh_racing_set_mode_keeps_new_mode_selection() {
        let yabai = Arc::new(ModeSwitchingBackend {
            manager: std::sync::OnceLock::new(),
            armed: AtomicBool::new(false),
        });
        let native = Arc::new(MockBackend::new(BackendKind::Native, true, two_spaces()));
        let m = Arc::new(SpaceManager::new(
            Box::new(yabai.clone()),
            Box::new(native.clone()),
            SpaceMode::Auto,
            RetryPolicy::immediate(2),
        ));
        assert_eq!(m.active_backend(), ActiveBackend::Yabai);

        let _ = yabai.manager.set(Arc::downgrade(&m));
        yabai.armed.store(true, Ordering::SeqCst);
        m.refresh_spaces();

        assert_eq!(m.mode(), SpaceMode::Native);
        assert_eq!(m.active_backend(), ActiveBackend::Native);
    }

    #[test]
    fn switch_to_index_flipping_after_one_attempt() {
        let yabai = Arc::new(MockBackend::new(BackendKind::Yabai, true, two_spaces()).flipping(1));
        let native = Arc::new(MockBackend::new(BackendKind::Native, false, Vec::new()));
        let m = manager(&yabai, &native, SpaceMode::Auto);

        assert_eq!(m.switch_to_index(2), SwitchOutcome::Switched);
        assert_eq!(yabai.switch_count(), 1);
        let spaces = m.spaces();
        assert!(spaces.iter().find(|s| s.id == "2").unwrap().is_current);
        assert!(!spaces.iter().find(|s| s.id == "1").unwrap().is_current);
        assert_eq!(m.current_space().map(|s| s.id), Some("2".to_string()));
    }

    #[test]
    fn unverified_switch_retries_within_budget() {
        let (yabai, native) = backends(true, false);
        let m = manager(&yabai, &native, SpaceMode::Auto);
        assert_eq!(m.switch_to_index(2), SwitchOutcome::Unverified);
        assert_eq!(yabai.switch_count(), 2);
    }

    #[test]
    fn self_verifying_backend_is_called_once() {
        let mut inner = MockBackend::new(BackendKind::Native, true, two_spaces()).flipping(1);
        inner.self_verifying = true;
        let native = Arc::new(inner);
        let yabai = Arc::new(MockBackend::new(BackendKind::Yabai, false, Vec::new()));
        let m = manager(&yabai, &native, SpaceMode::Auto);

        assert_eq!(m.switch_to_id("2"), SwitchOutcome::Switched);
        assert_eq!(native.switch_count(), 1);
    }

    #[test]
    fn denied_preflight_short_circuits() {
        let (yabai, native) = backends(false, true);
        native.denied.store(true, Ordering::SeqCst);
        let m = manager(&yabai, &native, SpaceMode::Native);
        assert_eq!(m.switch_to_index(2), SwitchOutcome::PermissionRequested);
        assert_eq!(native.switch_count(), 0);
    }

    #[test]
    fn missing_index_is_a_no_op() {
        let (yabai, native) = backends(true, false);
        let m = manager(&yabai, &native, SpaceMode::Auto);
        assert_eq!(m.switch_to_index(7), SwitchOutcome::NoSuchSpace);
        assert_eq!(m.handle(Command::SwitchTo(SpaceRef("99".into()))), Some(SwitchOutcome::NoSuchSpace));
        assert_eq!(yabai.switch_count(), 0);
    }

    #[test]
    fn cancelled_token_does_not_act() {
        let (yabai, native) = backends(true, false);
        let m = manager(&yabai, &native, SpaceMode::Auto);
        let stale = m.begin_switch();
        let _newer = m.begin_switch();
        assert_eq!(m.switch_to_index_with(2, &stale), SwitchOutcome::Cancelled);
        assert_eq!(yabai.switch_count(), 0);
    }

    #[test]
    fn rename_current_and_by_id() {
        let (yabai, native) = backends(true, false);
        let m = manager(&yabai, &native, SpaceMode::Auto);

        assert!(m.rename_current("Mail"));
        assert!(m.handle(Command::Rename(RenameTarget {
            id: SpaceRef("2".into()),
            name: "Work".into(),
        }))
        .is_none());
        assert_eq!(
            *yabai.renames.lock().unwrap(),
            vec![("1".to_string(), "Mail".to_string()), ("2".to_string(), "Work".to_string())]
        );
        let names: Vec<String> = m.spaces().iter().map(Space::display_name).collect();
        assert_eq!(names, vec!["Mail", "Work"]);
        assert!(!m.rename_id("42", "x"));
    }

    #[test]
    fn rename_without_backend_fails() {
        let (yabai, native) = backends(false, false);
        let m = manager(&yabai, &native, SpaceMode::Auto);
        assert!(!m.rename_space(&Space::new("1", 1, None, true), "x"));
    }

    #[test]
    fn ensure_permissions_only_when_native_is_in_play() {
        let (yabai, native) = backends(true, true);
        let m = manager(&yabai, &native, SpaceMode::Auto);
        assert!(!m.ensure_permissions());

        yabai.available.store(false, Ordering::SeqCst);
        assert!(m.ensure_permissions());

        m.set_mode(SpaceMode::Yabai);
        assert!(!m.ensure_permissions());

        m.set_mode(SpaceMode::Native);
        m.handle(Command::EnsurePermissions);
        assert_eq!(native.prepared.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn toggle_visibility_sends_snapshot() {
        let (yabai, native) = backends(true, false);
        let m = manager(&yabai, &native, SpaceMode::Auto);
        let (tx, rx) = mpsc::channel();
        m.set_panel(tx);
        m.handle(Command::ToggleVisibility);
        match rx.try_recv().unwrap() {
            PanelEvent::Toggle(snapshot) => {
                assert_eq!(snapshot.active_backend, "Yabai");
                assert_eq!(snapshot.spaces.len(), 2);
            }
        }
    }
}
