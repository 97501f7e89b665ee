use crate::{FieldLogError, Fields, Value};
use arc_swap::ArcSwap;
use std::{
    borrow::Cow,
    sync::{Arc, OnceLock, RwLock},
};

static GLOBAL_FIELDS: OnceLock<ArcSwap<Fields>> = OnceLock::new();
static ERROR_KEY: RwLock<Cow<'static, str>> = RwLock::new(Cow::Borrowed("error"));
static STACK_KEY: RwLock<Cow<'static, str>> = RwLock::new(Cow::Borrowed("stack"));

fn global_fields_cell() -> &'static ArcSwap<Fields> {
    GLOBAL_FIELDS.get_or_init(|| ArcSwap::from_pointee(Fields::new()))
}

/// Adds a field that is attached to all events of the process.
///
/// Session fields and event fields with the same key take precedence.
pub fn set_global_field<K: Into<String>, V: Into<Value>>(key: K, value: V) {
    let (key, value) = (key.into(), value.into());
    global_fields_cell().rcu(|current| {
        let mut fields = Fields::clone(current);
        fields.insert(key.clone(), value.clone());
        fields
    });
}

/// Adds multiple fields that are attached to all events of the process.
pub fn set_global_fields(new_fields: Fields) {
    global_fields_cell().rcu(|current| {
        let mut fields = Fields::clone(current);
        fields.extend(new_fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        fields
    });
}

/// Removes all global fields.
pub fn clear_global_fields() {
    global_fields_cell().store(Arc::new(Fields::new()));
}

/// Returns a snapshot of the global fields.
#[must_use]
pub fn global_fields() -> Arc<Fields> {
    global_fields_cell().load_full()
}

/// Changes the field key under which [`Event::with_error`](crate::Event::with_error)
/// stores the error text. The default is `error`.
///
/// # Errors
///
/// `FieldLogError::EmptyKey` if `key` is empty.
pub fn set_error_key<S: Into<String>>(key: S) -> Result<(), FieldLogError> {
    set_key(&ERROR_KEY, key.into())
}

/// Changes the field key under which [`Event::panic`](crate::Event::panic)
/// stores the stack trace. The default is `stack`.
///
/// # Errors
///
/// `FieldLogError::EmptyKey` if `key` is empty.
pub fn set_stack_key<S: Into<String>>(key: S) -> Result<(), FieldLogError> {
    set_key(&STACK_KEY, key.into())
}

fn set_key(lock: &RwLock<Cow<'static, str>>, key: String) -> Result<(), FieldLogError> {
    if key.is_empty() {
        return Err(FieldLogError::EmptyKey);
    }
    *lock.write().map_err(|_| FieldLogError::Poison)? = Cow::Owned(key);
    Ok(())
}

pub(crate) fn error_key() -> String {
    read_key(&ERROR_KEY)
}

pub(crate) fn stack_key() -> String {
    read_key(&STACK_KEY)
}

fn read_key(lock: &RwLock<Cow<'static, str>>) -> String {
    match lock.read() {
        Ok(guard) => guard.to_string(),
        Err(poisoned) => poisoned.into_inner().to_string(),
    }
}
