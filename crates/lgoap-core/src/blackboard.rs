use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    BlackboardError, BlackboardTemplate, BlackboardValue, KeyTraits, KeyType, KeyValue,
    MAX_VALUE_SIZE,
};

/// Typed handle to a compiled key: its dense index and byte offset.
///
/// Resolve once with [`BlackboardLayout::key`] and keep it; lookups by name are not free.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BbKey<T: 'static> {
    index: u32,
    offset: u32,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for BbKey<T> {}

impl<T: 'static> Clone for BbKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> BbKey<T> {
    /// Unchecked constructor; the caller guarantees `index`/`offset` describe a key of type `T`.
    pub const fn from_raw(index: u32, offset: u32) -> Self {
        Self {
            index,
            offset,
            _phantom: PhantomData,
        }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn offset(self) -> usize {
        self.offset as usize
    }
}

/// Compiled description of one key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInfo {
    pub name: String,
    pub index: usize,
    pub offset: usize,
    pub key_type: KeyType,
    pub traits: KeyTraits,
    /// Template that declared the key (an ancestor for inherited keys).
    pub owner: String,
}

impl KeyInfo {
    pub fn size(&self) -> usize {
        self.key_type.size()
    }

    fn range(&self) -> core::ops::Range<usize> {
        self.offset..self.offset + self.size()
    }
}

#[derive(Debug)]
struct SyncedStore {
    values: Mutex<Box<[u8]>>,
    version: AtomicU64,
}

impl SyncedStore {
    fn lock(&self) -> MutexGuard<'_, Box<[u8]>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A template flattened into a fixed memory layout.
///
/// Shared read-only (behind `Arc`) by every instance and every domain compiled against it. The only
/// interior mutability is the instance-synced store.
#[derive(Debug)]
pub struct BlackboardLayout {
    template: String,
    keys: Vec<KeyInfo>,
    by_name: BTreeMap<String, usize>,
    size: usize,
    defaults: Box<[u8]>,
    has_synced: bool,
    synced: SyncedStore,
}

impl BlackboardLayout {
    /// Flattens `template` on top of its already-compiled parent layout.
    ///
    /// Parent keys keep their indices and offsets; the template's own keys are appended. Expects a
    /// validated template: empty slots are skipped and mistyped defaults are ignored.
    pub fn compile(template: &BlackboardTemplate, parent: Option<&BlackboardLayout>) -> Self {
        let mut keys = parent.map(|p| p.keys.clone()).unwrap_or_default();
        let inherited = keys.len();
        let mut offset = parent.map_or(0, |p| p.size);

        for decl in template.keys.iter().flatten() {
            keys.push(KeyInfo {
                name: decl.name.clone(),
                index: keys.len(),
                offset,
                key_type: decl.key_type,
                traits: decl.traits,
                owner: template.name.clone(),
            });
            offset += decl.key_type.size();
        }

        let size = offset;
        let mut defaults = vec![0u8; size];
        if let Some(parent) = parent {
            defaults[..parent.size].copy_from_slice(&parent.defaults);
        }
        for (info, decl) in keys[inherited..].iter().zip(template.keys.iter().flatten()) {
            match decl.default_value() {
                Some(value) if value.key_type() == info.key_type => {
                    value.encode(&mut defaults[info.range()]);
                }
                _ => {}
            }
        }

        let by_name = keys
            .iter()
            .map(|k| (k.name.clone(), k.index))
            .collect::<BTreeMap<_, _>>();
        let has_synced = keys
            .iter()
            .any(|k| k.traits.contains(KeyTraits::INSTANCE_SYNCED));

        Self {
            template: template.name.clone(),
            keys,
            by_name,
            size,
            synced: SyncedStore {
                values: Mutex::new(defaults.clone().into_boxed_slice()),
                version: AtomicU64::new(0),
            },
            defaults: defaults.into_boxed_slice(),
            has_synced,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn keys(&self) -> &[KeyInfo] {
        &self.keys
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Bytes per instance: the sum of every key's size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Prototype buffer copied into every new instance.
    pub fn defaults(&self) -> &[u8] {
        &self.defaults
    }

    pub fn has_synced_keys(&self) -> bool {
        self.has_synced
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn info(&self, name: &str) -> Option<&KeyInfo> {
        self.index_of(name).map(|i| &self.keys[i])
    }

    pub fn key_at(&self, index: usize) -> Option<&KeyInfo> {
        self.keys.get(index)
    }

    pub fn lookup(&self, name: &str) -> Result<&KeyInfo, BlackboardError> {
        self.info(name).ok_or_else(|| BlackboardError::UnknownKey {
            template: self.template.clone(),
            key: name.to_string(),
        })
    }

    /// Resolves `name` to a typed handle, checking the key's type.
    pub fn key<T: BlackboardValue>(&self, name: &str) -> Result<BbKey<T>, BlackboardError> {
        let info = self.lookup(name)?;
        if info.key_type != T::KEY_TYPE {
            return Err(BlackboardError::TypeMismatch {
                key: name.to_string(),
                expected: T::KEY_TYPE,
                actual: info.key_type,
            });
        }
        Ok(raw_key(info))
    }

    pub fn new_blackboard(self: &Arc<Self>) -> Blackboard {
        Blackboard::new(Arc::clone(self))
    }
}

fn raw_key<T: 'static>(info: &KeyInfo) -> BbKey<T> {
    // Offsets and indices are bounded by the instance size, which is far below u32::MAX.
    BbKey::from_raw(info.index as u32, info.offset as u32)
}

/// One agent's working memory: a byte buffer laid out by a [`BlackboardLayout`].
///
/// Cloning copies the whole buffer. Scratch copies used by the planner are *detached*: their writes
/// never reach the instance-synced store.
#[derive(Debug, Clone)]
pub struct Blackboard {
    layout: Arc<BlackboardLayout>,
    memory: Box<[u8]>,
    unexpected: Vec<u64>,
    detached: bool,
    synced_version: u64,
}

impl Blackboard {
    pub fn new(layout: Arc<BlackboardLayout>) -> Self {
        let mut memory: Box<[u8]> = layout.defaults.clone();
        let mut synced_version = 0;
        if layout.has_synced {
            let shared = layout.synced.lock();
            synced_version = layout.synced.version.load(Ordering::Acquire);
            for info in layout.synced_keys() {
                memory[info.range()].copy_from_slice(&shared[info.range()]);
            }
        }
        let words = layout.keys.len().div_ceil(64);
        Self {
            layout,
            memory,
            unexpected: vec![0; words],
            detached: false,
            synced_version,
        }
    }

    pub fn layout(&self) -> &Arc<BlackboardLayout> {
        &self.layout
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.memory
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Detached copy of the current values, with no pending unexpected changes.
    pub fn scratch_copy(&self) -> Self {
        Self {
            layout: Arc::clone(&self.layout),
            memory: self.memory.clone(),
            unexpected: vec![0; self.unexpected.len()],
            detached: true,
            synced_version: self.synced_version,
        }
    }

    /// Overwrites every value with `other`'s. Both must share a layout.
    pub fn copy_from(&mut self, other: &Blackboard) {
        debug_assert!(Arc::ptr_eq(&self.layout, &other.layout));
        self.memory.copy_from_slice(&other.memory);
    }

    pub fn read<T: BlackboardValue>(&self, offset: usize) -> T {
        T::decode(&self.memory[offset..offset + T::KEY_TYPE.size()])
    }

    /// Writes `value` at `offset`, returning whether the stored bytes changed.
    pub fn write_and_detect_change<T: BlackboardValue>(&mut self, offset: usize, value: T) -> bool {
        let size = T::KEY_TYPE.size();
        let mut encoded = [0u8; MAX_VALUE_SIZE];
        value.encode(&mut encoded[..size]);

        let slot = &mut self.memory[offset..offset + size];
        if *slot == encoded[..size] {
            return false;
        }
        slot.copy_from_slice(&encoded[..size]);
        true
    }

    pub fn get<T: BlackboardValue>(&self, key: BbKey<T>) -> T {
        self.read(key.offset())
    }

    /// Host write. Flags an unexpected change when the key broadcasts and the value changed.
    pub fn set<T: BlackboardValue>(&mut self, key: BbKey<T>, value: T) -> bool {
        self.store(key, value, true)
    }

    /// Write whose outcome was anticipated (e.g. a task applying its own effect); never flags.
    pub fn set_expected<T: BlackboardValue>(&mut self, key: BbKey<T>, value: T) -> bool {
        self.store(key, value, false)
    }

    fn store<T: BlackboardValue>(&mut self, key: BbKey<T>, value: T, flag: bool) -> bool {
        if !self.write_and_detect_change(key.offset(), value) {
            return false;
        }

        let traits = self.layout.keys[key.index()].traits;
        if flag && traits.contains(KeyTraits::BROADCAST_ON_UNEXPECTED_CHANGE) {
            self.mark_unexpected(key.index());
        }
        if !self.detached && traits.contains(KeyTraits::INSTANCE_SYNCED) {
            self.publish_synced(key.index());
        }
        true
    }

    pub fn get_value(&self, name: &str) -> Result<KeyValue, BlackboardError> {
        let info = self.layout.lookup(name)?;
        KeyValue::decode(info.key_type, &self.memory[info.range()]).ok_or_else(|| {
            BlackboardError::UnknownKey {
                template: self.layout.template.clone(),
                key: name.to_string(),
            }
        })
    }

    /// By-name host write; see [`Blackboard::set`].
    pub fn set_value(&mut self, name: &str, value: KeyValue) -> Result<bool, BlackboardError> {
        let info = self.layout.lookup(name)?;
        if info.key_type != value.key_type() {
            return Err(BlackboardError::TypeMismatch {
                key: name.to_string(),
                expected: info.key_type,
                actual: value.key_type(),
            });
        }
        let (index, offset) = (info.index as u32, info.offset as u32);
        Ok(match value {
            KeyValue::Boolean(v) => self.set(BbKey::from_raw(index, offset), v),
            KeyValue::Float(v) => self.set(BbKey::from_raw(index, offset), v),
            KeyValue::Integer(v) => self.set(BbKey::from_raw(index, offset), v),
            KeyValue::Object(v) => self.set(BbKey::from_raw(index, offset), v),
            KeyValue::Vector(v) => self.set(BbKey::from_raw(index, offset), v),
            KeyValue::Quaternion(v) => self.set(BbKey::from_raw(index, offset), v),
        })
    }

    fn mark_unexpected(&mut self, index: usize) {
        self.unexpected[index / 64] |= 1 << (index % 64);
    }

    pub fn has_unexpected_changes(&self) -> bool {
        self.unexpected.iter().any(|w| *w != 0)
    }

    pub fn is_unexpectedly_changed(&self, index: usize) -> bool {
        self.unexpected
            .get(index / 64)
            .is_some_and(|w| (w >> (index % 64)) & 1 == 1)
    }

    /// Key indices changed unexpectedly since the last clear, ascending.
    pub fn unexpected_changes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.layout.keys.len()).filter(|i| self.is_unexpectedly_changed(*i))
    }

    /// Returns the pending unexpected changes and clears them.
    pub fn take_unexpected_changes(&mut self) -> Vec<usize> {
        let changes = self.unexpected_changes().collect();
        self.clear_unexpected_changes();
        changes
    }

    pub fn clear_unexpected_changes(&mut self) {
        self.unexpected.fill(0);
    }

    fn publish_synced(&mut self, index: usize) {
        let layout = Arc::clone(&self.layout);
        let range = layout.keys[index].range();
        let mut shared = layout.synced.lock();
        shared[range.clone()].copy_from_slice(&self.memory[range]);
        layout.synced.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Pulls instance-synced values written through other instances of this layout.
    ///
    /// Broadcast keys whose value changed are flagged as unexpected changes. Returns whether any
    /// value changed. Detached instances never sync.
    pub fn sync_instance(&mut self) -> bool {
        if self.detached || !self.layout.has_synced {
            return false;
        }

        let layout = Arc::clone(&self.layout);
        let shared = layout.synced.lock();
        let version = layout.synced.version.load(Ordering::Acquire);
        if version == self.synced_version {
            return false;
        }
        self.synced_version = version;

        let mut changed = false;
        for info in layout.synced_keys() {
            let range = info.range();
            if self.memory[range.clone()] == shared[range.clone()] {
                continue;
            }
            self.memory[range.clone()].copy_from_slice(&shared[range]);
            changed = true;
            if info
                .traits
                .contains(KeyTraits::BROADCAST_ON_UNEXPECTED_CHANGE)
            {
                self.mark_unexpected(info.index);
            }
        }
        changed
    }
}

impl BlackboardLayout {
    fn synced_keys(&self) -> impl Iterator<Item = &KeyInfo> {
        self.keys
            .iter()
            .filter(|k| k.traits.contains(KeyTraits::INSTANCE_SYNCED))
    }
}
