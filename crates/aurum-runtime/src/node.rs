//! Tracker node
//!
//! Owns every piece of tracker state and processes world events one
//! at a time, in host delivery order. Network calls block the current
//! handler and resume it with the result; a failed write is simply
//! retried on the next trigger with a freshly derived quantity.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use aurum_core::{
    AccountId, AurumResult, BlockPos, ContainerSite, EventKind, ItemStack, ScopeId, SlotRegion,
    WeightTable, WorldEvent,
};
use aurum_ledger::{Ledger, LedgerSnapshot, NameResolver, WipeRequest};
use aurum_state::{
    plan, resolve, DeclareOutcome, ReconcileReport, RenounceOutcome, SnapshotTracker,
    StorageRegistry,
};
use aurum_store::{ConfigStore, GenericConfig};
use aurum_time::{GateDecision, PullTimer, PushGate};

use crate::{compile, ensure_session, Board, Host, HostWorld, SubscriptionHandle};

/// The event-driven tracker
pub struct Node<H: Host, L: Ledger, N: NameResolver> {
    host: H,
    ledger: L,
    resolver: N,
    scope: ScopeId,
    player: AccountId,
    store: ConfigStore,
    weights: WeightTable,
    snapshots: SnapshotTracker,
    registry: StorageRegistry,
    gate: PushGate,
    pull_timer: PullTimer,
    records: LedgerSnapshot,
    names: BTreeMap<String, String>,
    /// Last derived personal total (carry-space + reserve)
    cached_total: f64,
    /// Block most recently attacked, for break detection
    attacked: Option<BlockPos>,
    verbose: bool,
    board_limit: usize,
    subscriptions: Vec<SubscriptionHandle>,
}

impl<H: Host, L: Ledger, N: NameResolver> Node<H, L, N> {
    /// Validate the session, load configuration, subscribe to every
    /// event, announce the personal account, and reconcile once.
    pub fn attach(
        mut host: H,
        ledger: L,
        resolver: N,
        data_dir: impl AsRef<Path>,
    ) -> AurumResult<Self> {
        let scope = ensure_session(&host)?;
        let store = ConfigStore::open(data_dir.as_ref(), scope.clone())?;
        let (generic, world) = store.load_or_initialize()?;
        let registry = StorageRegistry::load(&store)?;
        let player = AccountId::player(host.player_id());

        let subscriptions = EventKind::ALL
            .iter()
            .map(|&kind| host.subscribe(kind))
            .collect();

        let mut node = Node {
            host,
            ledger,
            resolver,
            scope,
            player,
            store,
            weights: WeightTable::default(),
            snapshots: SnapshotTracker::new(),
            registry,
            gate: PushGate::from_seconds(generic.push_cooldown_seconds),
            pull_timer: PullTimer::from_seconds(generic.pull_interval_seconds),
            records: LedgerSnapshot::default(),
            names: generic.name_cache,
            cached_total: 0.0,
            attacked: None,
            verbose: generic.verbose,
            board_limit: generic.board_entry_limit,
            subscriptions,
        };

        node.cached_total =
            node.weights.tally(&node.host.carried_slots()) + world.reserve_quantity;
        info!(scope = %node.scope, "tracker attached");
        node.update_personal(true);
        node.reconcile();
        Ok(node)
    }

    /// Dispatch one world event
    pub fn handle(&mut self, event: WorldEvent) {
        match event {
            WorldEvent::ItemPickup { item } => self.on_item_pickup(item),
            WorldEvent::SlotDrop { region, stack } => self.on_slot_drop(region, stack),
            WorldEvent::ContainerOpened { site } => self.on_container_opened(site),
            WorldEvent::ScreenClosed => self.on_screen_closed(),
            WorldEvent::BlockAttacked { pos } => self.attacked = Some(pos),
            WorldEvent::BlockBreakFinished => self.on_block_break_finished(),
            WorldEvent::Tick { world_tick } => self.on_tick(world_tick),
            WorldEvent::WorldJoined => self.on_world_joined(),
            WorldEvent::DimensionChanged => self.on_dimension_changed(),
        }
    }

    // Handlers

    fn on_item_pickup(&mut self, item: ItemStack) {
        if !self.weights.is_tracked(&item.item) {
            return;
        }
        let carried = self.host.carried_slots();
        let container = self.host.container_slots();
        self.snapshots.refresh(&self.weights, &carried, &container);
        self.update_personal(false);
    }

    fn on_slot_drop(&mut self, region: SlotRegion, stack: Option<ItemStack>) {
        if let Some(stack) = &stack {
            if stack.count > 0 && !self.weights.is_tracked(&stack.item) {
                return;
            }
        }

        match region {
            SlotRegion::Carry => {
                self.update_personal(false);
            }
            SlotRegion::Container if self.snapshots.reserve_open() => {
                let carried = self.host.carried_slots();
                let container = self.host.container_slots();
                let observed = self.weights.tally(&container);
                self.snapshots.refresh(&self.weights, &carried, &container);
                if let Err(e) = self.store.set_reserve_quantity(observed) {
                    warn!(error = %e, "failed to persist reserve quantity");
                }
            }
            SlotRegion::Container if self.snapshots.shared_open() => {
                let Some(pos) = self
                    .host
                    .crosshair_target()
                    .filter(|&pos| self.registry.contains(pos))
                else {
                    self.notice("shared storage not declared");
                    return;
                };
                let carried = self.host.carried_slots();
                let container = self.host.container_slots();
                let observed = self.weights.tally(&container);
                self.snapshots.refresh(&self.weights, &carried, &container);
                self.snapshots.flag_explicit_drop();
                if let Err(e) = self.registry.set_quantity(&self.store, pos, observed) {
                    warn!(error = %e, "failed to persist storage quantity");
                }
            }
            SlotRegion::Container => {}
        }
    }

    fn on_container_opened(&mut self, site: ContainerSite) {
        let carried = self.host.carried_slots();
        let container = self.host.container_slots();
        match site {
            ContainerSite::Reserve => {
                self.snapshots
                    .open_reserve(&self.weights, &carried, &container);
            }
            ContainerSite::Shared => {
                let declared = self
                    .host
                    .crosshair_target()
                    .filter(|&pos| self.registry.contains(pos));
                if declared.is_none() {
                    self.notice("shared storage not declared");
                }
                self.snapshots
                    .open_shared(&self.weights, &carried, &container, declared);
            }
        }
    }

    fn on_screen_closed(&mut self) {
        if let Some(snapshot) = self.snapshots.take_reserve() {
            let current = self.weights.tally(&self.host.carried_slots());
            let resolution = resolve(snapshot, current, false);
            if let Some(new_reserve) = resolution.new_location() {
                if let Err(e) = self.store.set_reserve_quantity(new_reserve) {
                    warn!(error = %e, "failed to persist reserve quantity");
                }
            }
            // Redistribution conserves the personal total, so only a
            // genuine change warrants a push.
            let observed_total = snapshot.carried + snapshot.location;
            if self.cached_total != observed_total {
                self.cached_total = observed_total;
                self.update_personal(false);
            }
        } else if let Some(shared) = self.snapshots.take_shared() {
            let current = self.weights.tally(&self.host.carried_slots());

            if shared.undeclared_at_open {
                if current != shared.quantities.carried {
                    self.update_personal(true);
                }
                return;
            }
            let Some(pos) = shared.position else {
                return;
            };

            let resolution = resolve(shared.quantities, current, shared.explicit_drop);
            if let Some(new_quantity) = resolution.new_location() {
                if let Err(e) = self.registry.set_quantity(&self.store, pos, new_quantity) {
                    warn!(error = %e, "failed to persist storage quantity");
                }
            }
            if resolution.redistributed() || shared.explicit_drop {
                let quantity = self.registry.quantity(pos).unwrap_or(0.0);
                self.push_storage(pos, quantity);
                self.update_personal(true);
            }
        }
    }

    fn on_block_break_finished(&mut self) {
        let Some(pos) = self.attacked else {
            return;
        };
        if self.registry.contains(pos) {
            match self.renounce(pos) {
                Ok(RenounceOutcome::Renounced(_)) => {
                    self.notice(format!("renounced broken storage at {pos}"))
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "failed to renounce broken storage"),
            }
        }
        self.reconcile();
    }

    fn on_tick(&mut self, world_tick: u64) {
        self.gate.tick();
        if !self.pull_timer.should_fire(world_tick) {
            return;
        }
        self.refresh();
        self.reconcile();
    }

    fn on_world_joined(&mut self) {
        match ensure_session(&self.host) {
            Ok(scope) if scope == self.scope => debug!("session revalidated"),
            Ok(scope) => warn!(current = %scope, bound = %self.scope, "session scope changed"),
            Err(e) => warn!(error = %e, "session preconditions no longer hold"),
        }
    }

    fn on_dimension_changed(&mut self) {
        self.refresh();
    }

    // Commands

    /// Push the personal account; `force` bypasses the cooldown
    pub fn push(&mut self, force: bool) -> bool {
        self.update_personal(force)
    }

    /// Pull the authoritative records for this scope
    pub fn pull(&mut self) {
        self.pull_records();
    }

    /// Full refresh plus one reconciliation pass
    pub fn sync(&mut self) -> ReconcileReport {
        self.refresh();
        self.reconcile()
    }

    /// Declare the storage at `pos`. The account reaches the ledger
    /// once gold is first observed moving in, not at declare time.
    pub fn declare(&mut self, pos: BlockPos) -> AurumResult<DeclareOutcome> {
        let outcome = self
            .registry
            .declare(&self.store, &HostWorld(&self.host), pos)?;
        debug!(%pos, ?outcome, "declare");
        Ok(outcome)
    }

    /// Renounce the storage at `pos`, wiping its ledger account
    pub fn renounce(&mut self, pos: BlockPos) -> AurumResult<RenounceOutcome> {
        let outcome = self
            .registry
            .renounce(&self.store, &HostWorld(&self.host), pos)?;
        if let RenounceOutcome::Renounced(_) = &outcome {
            let request = WipeRequest::Single(AccountId::storage(pos));
            if let Err(e) = self.ledger.wipe(&self.scope, &request) {
                warn!(error = %e, "storage wipe failed");
            }
            self.pull_records();
        }
        Ok(outcome)
    }

    /// Set or clear a declared storage's nickname (purely local)
    pub fn set_nickname(&mut self, pos: BlockPos, nickname: Option<String>) -> AurumResult<bool> {
        self.registry.set_nickname(&self.store, pos, nickname)
    }

    /// Compile the leaderboard view of the last pull
    pub fn board(&self) -> Board {
        compile(&self.records, &self.names, &self.registry, self.board_limit)
    }

    pub fn set_push_cooldown_seconds(&mut self, seconds: u64) -> AurumResult<()> {
        self.store
            .update_generic(|cfg| cfg.push_cooldown_seconds = seconds)?;
        self.gate.reconfigure(Duration::from_secs(seconds));
        Ok(())
    }

    pub fn set_pull_interval_seconds(&mut self, seconds: u64) -> AurumResult<()> {
        self.store
            .update_generic(|cfg| cfg.pull_interval_seconds = seconds)?;
        self.pull_timer.reconfigure_seconds(seconds);
        Ok(())
    }

    pub fn set_board_entry_limit(&mut self, limit: usize) -> AurumResult<()> {
        self.store
            .update_generic(|cfg| cfg.board_entry_limit = limit)?;
        self.board_limit = limit;
        Ok(())
    }

    /// Flip the verbose flag; returns the new value
    pub fn toggle_verbose(&mut self) -> AurumResult<bool> {
        let cfg = self.store.update_generic(|cfg| cfg.verbose = !cfg.verbose)?;
        self.verbose = cfg.verbose;
        Ok(self.verbose)
    }

    pub fn reset_name_cache(&mut self) -> AurumResult<()> {
        self.store.reset_name_cache()?;
        self.names.clear();
        Ok(())
    }

    /// Current generic configuration, straight from disk
    pub fn config(&self) -> AurumResult<GenericConfig> {
        self.store.generic()
    }

    /// Release every subscription and hand the host back
    pub fn detach(mut self) -> H {
        for handle in self.subscriptions.drain(..) {
            self.host.unsubscribe(handle);
        }
        info!("tracker detached");
        self.host
    }

    // Accessors

    #[inline]
    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    #[inline]
    pub fn records(&self) -> &LedgerSnapshot {
        &self.records
    }

    #[inline]
    pub fn registry(&self) -> &StorageRegistry {
        &self.registry
    }

    #[inline]
    pub fn cached_total(&self) -> f64 {
        self.cached_total
    }

    #[inline]
    pub fn cooldown_remaining(&self) -> Duration {
        self.gate.remaining()
    }

    // Internals

    /// Derive and push the personal total through the gate
    fn update_personal(&mut self, force: bool) -> bool {
        match self.gate.check(force) {
            GateDecision::Throttled { remaining } => {
                self.notice(format!(
                    "push throttled, {} remaining",
                    humantime::format_duration(remaining)
                ));
                false
            }
            GateDecision::Open => {
                let reserve = match self.store.reserve_quantity() {
                    Ok(reserve) => reserve,
                    Err(e) => {
                        warn!(error = %e, "failed to read reserve quantity");
                        return false;
                    }
                };
                let total = self.weights.tally(&self.host.carried_slots()) + reserve;
                self.cached_total = total;
                self.notice(format!("pushing personal gold count: {total}"));
                match self.ledger.push(&self.scope, &self.player, total) {
                    Ok(()) => {
                        self.gate.arm();
                        self.pull_records();
                        true
                    }
                    Err(e) => {
                        warn!(error = %e, "personal push failed");
                        false
                    }
                }
            }
        }
    }

    /// Push one storage account, never gated
    fn push_storage(&mut self, pos: BlockPos, quantity: f64) {
        self.notice(format!("pushing gold count {quantity} to storage {pos}"));
        let account = AccountId::storage(pos);
        if let Err(e) = self.ledger.push(&self.scope, &account, quantity) {
            warn!(error = %e, "storage push failed");
        }
    }

    /// Replace the records snapshot wholesale and resolve new names
    fn pull_records(&mut self) {
        self.notice("pulling ledger records");
        match self.ledger.pull(&self.scope) {
            Ok(snapshot) => {
                self.records = snapshot;
                self.resolve_names();
            }
            Err(e) => warn!(error = %e, "ledger pull failed"),
        }
    }

    /// Pull plus registry reload from the persisted section
    fn refresh(&mut self) {
        self.pull_records();
        match StorageRegistry::load(&self.store) {
            Ok(registry) => self.registry = registry,
            Err(e) => warn!(error = %e, "registry reload failed"),
        }
    }

    /// One reconciliation pass over the pulled storage subset
    pub fn reconcile(&mut self) -> ReconcileReport {
        let remote = self.records.storage_entries();
        let plan = plan(&remote, &self.registry, &HostWorld(&self.host));
        let mut report = ReconcileReport::default();
        if plan.is_empty() {
            return report;
        }

        if !plan.removals.is_empty() {
            let keys: Vec<AccountId> = plan
                .removals
                .iter()
                .copied()
                .map(AccountId::storage)
                .collect();
            match self.ledger.wipe(&self.scope, &WipeRequest::Multiple(keys)) {
                Ok(()) => {
                    for &pos in &plan.removals {
                        match self.registry.renounce(&self.store, &HostWorld(&self.host), pos) {
                            Ok(_) => {}
                            Err(e) => warn!(error = %e, "failed to renounce {pos}"),
                        }
                    }
                    report.removed = plan.removals.len() as u32;
                }
                Err(e) => warn!(error = %e, "reconcile wipe failed, will retry next pass"),
            }
        }

        for (pos, quantity) in plan.additions {
            match self.registry.declare(&self.store, &HostWorld(&self.host), pos) {
                Ok(DeclareOutcome::Declared(_)) => {
                    if let Err(e) = self.registry.set_quantity(&self.store, pos, quantity) {
                        warn!(error = %e, "failed to persist adopted storage quantity");
                    }
                    // The value came from the ledger, so no push back.
                    report.added += 1;
                }
                Ok(DeclareOutcome::NotLoaded) => report.skipped_not_loaded += 1,
                Ok(DeclareOutcome::AlreadyDeclared | DeclareOutcome::InvalidKind) => {}
                Err(e) => warn!(error = %e, "reconcile declare failed"),
            }
        }

        if report.changed() {
            self.pull_records();
        }
        self.notice(format!(
            "reconciled: {} removed, {} added, {} skipped (not loaded)",
            report.removed, report.added, report.skipped_not_loaded
        ));
        report
    }

    /// Fill the display-name cache for newly seen player identities
    fn resolve_names(&mut self) {
        let mut fresh: Vec<(String, String)> = Vec::new();
        for (id, _) in self.records.player_entries() {
            if !self.names.contains_key(id) {
                let name = self
                    .resolver
                    .resolve(id)
                    .unwrap_or_else(|| id.to_string());
                fresh.push((id.to_string(), name));
            }
        }
        if fresh.is_empty() {
            return;
        }
        self.names.extend(fresh.iter().cloned());
        if let Err(e) = self.store.merge_name_cache(fresh) {
            warn!(error = %e, "failed to persist name cache");
        }
    }

    /// Routine notice: info when verbose, debug otherwise
    fn notice(&self, message: impl AsRef<str>) {
        if self.verbose {
            info!("{}", message.as_ref());
        } else {
            debug!("{}", message.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::rc::Rc;

    use aurum_core::{AurumError, Block};

    use crate::GameMode;

    struct WorldState {
        carried: Vec<ItemStack>,
        container: Vec<ItemStack>,
        blocks: HashMap<BlockPos, Block>,
        crosshair: Option<BlockPos>,
        mode: GameMode,
        scope: Option<String>,
        next_handle: u64,
        active: Vec<SubscriptionHandle>,
    }

    impl WorldState {
        fn survival(ingots: u32) -> Self {
            WorldState {
                carried: vec![ItemStack::new("gold_ingot", ingots)],
                container: Vec::new(),
                blocks: HashMap::new(),
                crosshair: None,
                mode: GameMode::Survival,
                scope: Some("mc.example.org".to_string()),
                next_handle: 0,
                active: Vec::new(),
            }
        }
    }

    #[derive(Clone)]
    struct MockHost(Rc<RefCell<WorldState>>);

    impl Host for MockHost {
        fn player_id(&self) -> String {
            "player-1".to_string()
        }

        fn scope_id(&self) -> Option<String> {
            self.0.borrow().scope.clone()
        }

        fn game_mode(&self) -> GameMode {
            self.0.borrow().mode
        }

        fn carried_slots(&self) -> Vec<ItemStack> {
            self.0.borrow().carried.clone()
        }

        fn container_slots(&self) -> Vec<ItemStack> {
            self.0.borrow().container.clone()
        }

        fn block_at(&self, pos: BlockPos) -> Option<Block> {
            self.0.borrow().blocks.get(&pos).cloned()
        }

        fn crosshair_target(&self) -> Option<BlockPos> {
            self.0.borrow().crosshair
        }

        fn subscribe(&mut self, _kind: EventKind) -> SubscriptionHandle {
            let mut state = self.0.borrow_mut();
            state.next_handle += 1;
            let handle = SubscriptionHandle(state.next_handle);
            state.active.push(handle);
            handle
        }

        fn unsubscribe(&mut self, handle: SubscriptionHandle) {
            self.0.borrow_mut().active.retain(|&h| h != handle);
        }
    }

    #[derive(Default)]
    struct LedgerState {
        records: BTreeMap<String, f64>,
        pushes: Vec<(String, f64)>,
        wipes: Vec<WipeRequest>,
        pulls: u32,
        attempts: u32,
        reject: bool,
    }

    #[derive(Clone)]
    struct MemoryLedger(Rc<RefCell<LedgerState>>);

    impl Ledger for MemoryLedger {
        fn push(&self, _scope: &ScopeId, account: &AccountId, quantity: f64) -> AurumResult<()> {
            let mut state = self.0.borrow_mut();
            state.attempts += 1;
            if state.reject {
                return Err(AurumError::LedgerRejected {
                    endpoint: "update".to_string(),
                    status: 401,
                });
            }
            state.records.insert(account.to_string(), quantity);
            state.pushes.push((account.to_string(), quantity));
            Ok(())
        }

        fn wipe(&self, _scope: &ScopeId, request: &WipeRequest) -> AurumResult<()> {
            let mut state = self.0.borrow_mut();
            match request {
                WipeRequest::All => state.records.clear(),
                WipeRequest::Single(account) => {
                    state.records.remove(&account.to_string());
                }
                WipeRequest::Multiple(accounts) => {
                    for account in accounts {
                        state.records.remove(&account.to_string());
                    }
                }
            }
            state.wipes.push(request.clone());
            Ok(())
        }

        fn pull(&self, _scope: &ScopeId) -> AurumResult<LedgerSnapshot> {
            let mut state = self.0.borrow_mut();
            state.pulls += 1;
            Ok(LedgerSnapshot::from_raw(state.records.clone()))
        }
    }

    struct NoNames;

    impl NameResolver for NoNames {
        fn resolve(&self, _id: &str) -> Option<String> {
            None
        }
    }

    struct Rig {
        world: Rc<RefCell<WorldState>>,
        ledger: Rc<RefCell<LedgerState>>,
        dir: PathBuf,
        node: Node<MockHost, MemoryLedger, NoNames>,
    }

    fn scratch(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aurum-node-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn rig(tag: &str, ingots: u32) -> Rig {
        let dir = scratch(tag);
        let world = Rc::new(RefCell::new(WorldState::survival(ingots)));
        let ledger = Rc::new(RefCell::new(LedgerState::default()));
        let node = Node::attach(
            MockHost(Rc::clone(&world)),
            MemoryLedger(Rc::clone(&ledger)),
            NoNames,
            &dir,
        )
        .unwrap();
        Rig {
            world,
            ledger,
            dir,
            node,
        }
    }

    fn reserve_on_disk(rig: &Rig) -> f64 {
        ConfigStore::open(&rig.dir, ScopeId::new("mc.example.org"))
            .unwrap()
            .reserve_quantity()
            .unwrap()
    }

    fn set_carried(rig: &Rig, ingots: u32) {
        rig.world.borrow_mut().carried = vec![ItemStack::new("gold_ingot", ingots)];
    }

    fn set_container(rig: &Rig, ingots: u32) {
        rig.world.borrow_mut().container = vec![ItemStack::new("gold_ingot", ingots)];
    }

    fn declare_barrel(rig: &mut Rig, pos: BlockPos) {
        rig.world.borrow_mut().blocks.insert(pos, Block::Barrel);
        rig.world.borrow_mut().crosshair = Some(pos);
        assert!(matches!(
            rig.node.declare(pos).unwrap(),
            DeclareOutcome::Declared(_)
        ));
    }

    fn clear_cooldown(rig: &mut Rig) {
        // Default cooldown is 10s = 200 ticks; tick values stay below
        // the default pull interval so no pull fires here.
        for tick in 1..=200 {
            rig.node.handle(WorldEvent::Tick { world_tick: tick });
        }
    }

    #[test]
    fn test_attach_requires_valid_session() {
        let world = Rc::new(RefCell::new(WorldState::survival(0)));
        world.borrow_mut().mode = GameMode::Creative;
        let err = Node::attach(
            MockHost(Rc::clone(&world)),
            MemoryLedger(Rc::default()),
            NoNames,
            scratch("creative"),
        )
        .err()
        .unwrap();
        assert!(matches!(err, AurumError::DisallowedGameMode(_)));

        let world = Rc::new(RefCell::new(WorldState::survival(0)));
        world.borrow_mut().scope = None;
        let err = Node::attach(
            MockHost(Rc::clone(&world)),
            MemoryLedger(Rc::default()),
            NoNames,
            scratch("noscope"),
        )
        .err()
        .unwrap();
        assert!(matches!(err, AurumError::UnidentifiedScope));
    }

    #[test]
    fn test_attach_seeds_and_pushes() {
        let rig = rig("attach", 100);
        assert_eq!(rig.node.cached_total(), 100.0);
        let ledger = rig.ledger.borrow();
        assert_eq!(ledger.records.get("player-1"), Some(&100.0));
        assert_eq!(ledger.pushes.len(), 1);
        assert!(ledger.pulls >= 1);
    }

    #[test]
    fn test_private_deposit_resolves_reserve() {
        let mut rig = rig("private", 100);
        rig.node.handle(WorldEvent::ContainerOpened {
            site: ContainerSite::Reserve,
        });
        // Move 70 gold from carry-space into the reserve.
        set_carried(&rig, 30);
        set_container(&rig, 70);
        rig.node.handle(WorldEvent::ScreenClosed);

        assert_eq!(reserve_on_disk(&rig), 70.0);
        // Redistribution conserved the total: no second push.
        assert_eq!(rig.node.cached_total(), 100.0);
        assert_eq!(rig.ledger.borrow().pushes.len(), 1);
    }

    #[test]
    fn test_pickup_respects_gate() {
        let mut rig = rig("pickup", 100);
        set_carried(&rig, 120);
        rig.node.handle(WorldEvent::ItemPickup {
            item: ItemStack::new("gold_ingot", 20),
        });
        // Attach armed the cooldown, so the pickup push is rejected.
        assert_eq!(rig.ledger.borrow().pushes.len(), 1);

        clear_cooldown(&mut rig);
        rig.node.handle(WorldEvent::ItemPickup {
            item: ItemStack::new("gold_ingot", 1),
        });
        let ledger = rig.ledger.borrow();
        assert_eq!(ledger.pushes.len(), 2);
        assert_eq!(ledger.records.get("player-1"), Some(&120.0));
    }

    #[test]
    fn test_untracked_pickup_ignored() {
        let mut rig = rig("untracked", 100);
        clear_cooldown(&mut rig);
        rig.node.handle(WorldEvent::ItemPickup {
            item: ItemStack::new("cobblestone", 64),
        });
        assert_eq!(rig.ledger.borrow().pushes.len(), 1);
    }

    #[test]
    fn test_shared_deposit_full_flow() {
        let mut rig = rig("shared", 100);
        let pos = BlockPos::new(1, 64, 1);
        declare_barrel(&mut rig, pos);

        rig.node.handle(WorldEvent::ContainerOpened {
            site: ContainerSite::Shared,
        });
        set_carried(&rig, 60);
        set_container(&rig, 40);
        rig.node.handle(WorldEvent::ScreenClosed);

        assert_eq!(rig.node.registry().quantity(pos), Some(40.0));
        let ledger = rig.ledger.borrow();
        assert_eq!(ledger.records.get("[C@1,64,1]"), Some(&40.0));
        // The close also force-pushed the personal account.
        assert_eq!(ledger.records.get("player-1"), Some(&60.0));
    }

    #[test]
    fn test_undeclared_shared_close_forces_personal_push() {
        let mut rig = rig("undeclared", 100);
        rig.node.handle(WorldEvent::ContainerOpened {
            site: ContainerSite::Shared,
        });
        set_carried(&rig, 60);
        rig.node.handle(WorldEvent::ScreenClosed);

        let ledger = rig.ledger.borrow();
        assert_eq!(ledger.records.get("player-1"), Some(&60.0));
        assert!(ledger.records.keys().all(|key| !key.starts_with('[')));
        assert!(rig.node.registry().is_empty());
    }

    #[test]
    fn test_explicit_drop_corrects_blind_spot() {
        let mut rig = rig("drop", 50);
        let pos = BlockPos::new(2, 64, 2);
        declare_barrel(&mut rig, pos);

        rig.node.handle(WorldEvent::ContainerOpened {
            site: ContainerSite::Shared,
        });
        // A single-slot deposit lands in the container; carry tally
        // happens to end up unchanged, which the diff cannot see.
        set_container(&rig, 25);
        rig.node.handle(WorldEvent::SlotDrop {
            region: SlotRegion::Container,
            stack: Some(ItemStack::new("gold_ingot", 25)),
        });
        rig.node.handle(WorldEvent::ScreenClosed);

        assert_eq!(rig.node.registry().quantity(pos), Some(25.0));
        assert_eq!(rig.ledger.borrow().records.get("[C@2,64,2]"), Some(&25.0));
    }

    #[test]
    fn test_blind_spot_without_flag_stays_silent() {
        let mut rig = rig("blindspot", 50);
        let pos = BlockPos::new(3, 64, 3);
        declare_barrel(&mut rig, pos);

        set_container(&rig, 10);
        rig.node.handle(WorldEvent::ContainerOpened {
            site: ContainerSite::Shared,
        });
        rig.node.handle(WorldEvent::ScreenClosed);

        // Equal and opposite movement is invisible: nothing persisted,
        // nothing pushed for the storage account.
        assert_eq!(rig.node.registry().quantity(pos), Some(0.0));
        assert!(rig.ledger.borrow().records.get("[C@3,64,3]").is_none());
    }

    #[test]
    fn test_reconcile_adopts_remote_storage() {
        let mut rig = rig("adopt", 0);
        let pos = BlockPos::new(1, 64, 1);
        rig.world.borrow_mut().blocks.insert(pos, Block::Barrel);
        rig.ledger
            .borrow_mut()
            .records
            .insert("[C@1,64,1]".to_string(), 40.0);

        let report = rig.node.sync();

        assert_eq!(report.added, 1);
        assert_eq!(report.removed, 0);
        assert_eq!(rig.node.registry().quantity(pos), Some(40.0));
        // Adoption copies the remote value without pushing it back.
        let ledger = rig.ledger.borrow();
        assert!(ledger.pushes.iter().all(|(key, _)| !key.starts_with('[')));
        drop(ledger);
        assert_eq!(
            rig.node.records().get(&AccountId::storage(pos)),
            Some(40.0)
        );
    }

    #[test]
    fn test_reconcile_removes_destroyed_storage() {
        let mut rig = rig("destroyed", 0);
        let pos = BlockPos::new(5, 64, 5);
        declare_barrel(&mut rig, pos);
        rig.ledger
            .borrow_mut()
            .records
            .insert("[C@5,64,5]".to_string(), 12.0);
        rig.node.pull();

        // The barrel is gone; something else stands there now.
        rig.world
            .borrow_mut()
            .blocks
            .insert(pos, Block::Other("stone".to_string()));
        let report = rig.node.reconcile();

        assert_eq!(report.removed, 1);
        assert!(rig.node.registry().is_empty());
        let ledger = rig.ledger.borrow();
        assert!(ledger.records.get("[C@5,64,5]").is_none());
        assert!(matches!(ledger.wipes.last(), Some(WipeRequest::Multiple(_))));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut rig = rig("idempotent", 0);
        let pos = BlockPos::new(1, 64, 1);
        rig.world.borrow_mut().blocks.insert(pos, Block::Barrel);
        rig.ledger
            .borrow_mut()
            .records
            .insert("[C@1,64,1]".to_string(), 40.0);

        let first = rig.node.sync();
        assert_eq!(first.added, 1);

        let wipes_before = rig.ledger.borrow().wipes.len();
        let second = rig.node.sync();
        assert_eq!(second, ReconcileReport::default());
        assert_eq!(rig.ledger.borrow().wipes.len(), wipes_before);
        assert_eq!(rig.node.registry().quantity(pos), Some(40.0));
    }

    #[test]
    fn test_reconcile_skips_unloaded_and_retries() {
        let mut rig = rig("skips", 0);
        let pos = BlockPos::new(7, 64, 7);
        rig.ledger
            .borrow_mut()
            .records
            .insert("[C@7,64,7]".to_string(), 9.0);

        let report = rig.node.sync();
        assert_eq!(report.skipped_not_loaded, 1);
        assert_eq!(report.added, 0);
        assert!(rig.node.registry().is_empty());

        // The chunk loads; the next pass adopts it.
        rig.world.borrow_mut().blocks.insert(pos, Block::Barrel);
        let report = rig.node.sync();
        assert_eq!(report.added, 1);
        assert_eq!(report.skipped_not_loaded, 0);
        assert_eq!(rig.node.registry().quantity(pos), Some(9.0));
    }

    #[test]
    fn test_renounce_wipes_and_pulls() {
        let mut rig = rig("renounce", 0);
        let pos = BlockPos::new(4, 64, 4);
        declare_barrel(&mut rig, pos);
        let pulls_before = rig.ledger.borrow().pulls;

        let outcome = rig.node.renounce(pos).unwrap();
        assert!(matches!(outcome, RenounceOutcome::Renounced(_)));
        assert!(rig.node.registry().is_empty());
        let ledger = rig.ledger.borrow();
        assert!(matches!(ledger.wipes.last(), Some(WipeRequest::Single(_))));
        assert!(ledger.pulls > pulls_before);
    }

    #[test]
    fn test_declare_outcomes() {
        let mut rig = rig("declare", 0);
        let barrel = BlockPos::new(1, 60, 1);
        let stone = BlockPos::new(2, 60, 2);
        let unloaded = BlockPos::new(3, 60, 3);
        {
            let mut world = rig.world.borrow_mut();
            world.blocks.insert(barrel, Block::Barrel);
            world.blocks.insert(stone, Block::Other("stone".to_string()));
        }

        assert!(matches!(
            rig.node.declare(unloaded).unwrap(),
            DeclareOutcome::NotLoaded
        ));
        assert!(matches!(
            rig.node.declare(stone).unwrap(),
            DeclareOutcome::InvalidKind
        ));
        assert!(matches!(
            rig.node.declare(barrel).unwrap(),
            DeclareOutcome::Declared(_)
        ));
        assert!(matches!(
            rig.node.declare(barrel).unwrap(),
            DeclareOutcome::AlreadyDeclared
        ));
    }

    #[test]
    fn test_breaking_declared_storage_renounces_it() {
        let mut rig = rig("break", 0);
        let pos = BlockPos::new(6, 64, 6);
        declare_barrel(&mut rig, pos);

        rig.node.handle(WorldEvent::BlockAttacked { pos });
        rig.node.handle(WorldEvent::BlockBreakFinished);

        assert!(rig.node.registry().is_empty());
        assert!(matches!(
            rig.ledger.borrow().wipes.last(),
            Some(WipeRequest::Single(_))
        ));
    }

    #[test]
    fn test_tick_fires_pull_on_interval() {
        let mut rig = rig("tick", 0);
        rig.node.set_pull_interval_seconds(1).unwrap();

        let pulls_before = rig.ledger.borrow().pulls;
        rig.node.handle(WorldEvent::Tick { world_tick: 21 });
        assert_eq!(rig.ledger.borrow().pulls, pulls_before);

        rig.node.handle(WorldEvent::Tick { world_tick: 40 });
        assert!(rig.ledger.borrow().pulls > pulls_before);
    }

    #[test]
    fn test_failed_push_retries_with_fresh_value() {
        let mut rig = rig("retry", 100);
        clear_cooldown(&mut rig);
        rig.ledger.borrow_mut().reject = true;

        assert!(!rig.node.push(false));
        // Failure must not arm the cooldown: the next trigger retries.
        assert_eq!(rig.node.cooldown_remaining(), Duration::ZERO);

        set_carried(&rig, 110);
        rig.ledger.borrow_mut().reject = false;
        assert!(rig.node.push(false));
        let ledger = rig.ledger.borrow();
        assert_eq!(ledger.records.get("player-1"), Some(&110.0));
        // Attach, the rejected attempt, and the retry.
        assert_eq!(ledger.attempts, 3);
    }

    #[test]
    fn test_detach_releases_all_subscriptions() {
        let rig = rig("detach", 0);
        assert_eq!(rig.world.borrow().active.len(), EventKind::ALL.len());
        rig.node.detach();
        assert!(rig.world.borrow().active.is_empty());
    }

    #[test]
    fn test_config_commands_persist() {
        let mut rig = rig("config", 0);
        assert!(!rig.node.config().unwrap().verbose);
        assert!(rig.node.toggle_verbose().unwrap());
        rig.node.set_push_cooldown_seconds(3).unwrap();
        rig.node.set_board_entry_limit(2).unwrap();

        let cfg = rig.node.config().unwrap();
        assert!(cfg.verbose);
        assert_eq!(cfg.push_cooldown_seconds, 3);
        assert_eq!(cfg.board_entry_limit, 2);
        // Reconfiguring the cooldown clears any pending one.
        assert_eq!(rig.node.cooldown_remaining(), Duration::ZERO);
    }

    #[test]
    fn test_nickname_shows_on_board() {
        let mut rig = rig("nick", 0);
        let pos = BlockPos::new(8, 64, 8);
        declare_barrel(&mut rig, pos);
        rig.ledger
            .borrow_mut()
            .records
            .insert("[C@8,64,8]".to_string(), 15.0);
        rig.node.pull();
        assert!(rig
            .node
            .set_nickname(pos, Some("west vault".to_string()))
            .unwrap());

        let board = rig.node.board();
        assert!(board
            .entries
            .iter()
            .any(|entry| entry.label == "west vault" && entry.quantity == 15.0));
    }

    #[test]
    fn test_name_cache_filled_with_fallback() {
        let rig = rig("names", 0);
        // NoNames resolves nothing, so the raw id is cached.
        let cache = ConfigStore::open(&rig.dir, ScopeId::new("mc.example.org"))
            .unwrap()
            .name_cache()
            .unwrap();
        assert_eq!(cache.get("player-1").map(String::as_str), Some("player-1"));
    }
}
