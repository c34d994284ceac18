//! Generic store tests.
//!
//! Each function writes or expects the same fixed set of keys, so a store can be checked with
//! [`store_write`] followed by [`store_read`] and [`store_list`].

use crate::{
    ListableStorageTraits, ReadableStorageTraits, StorageError, StoreKey, StorePrefix,
    WritableStorageTraits,
};

/// Write the fixture keys to `store`.
///
/// # Errors
/// Returns a [`StorageError`] if a store operation fails.
pub fn store_write<T: WritableStorageTraits>(store: &T) -> Result<(), StorageError> {
    store.erase_prefix(&StorePrefix::root())?;

    store.set(&"a/b".try_into()?, vec![0, 1, 2, 3].into())?;
    store.set(&"a/c".try_into()?, vec![0].into())?;
    store.set(&"a/d/e".try_into()?, vec![].into())?;
    store.set(&"a/f/g".try_into()?, vec![].into())?;
    store.set(&"a/f/h".try_into()?, vec![].into())?;
    store.set(&"b/c/d".try_into()?, vec![].into())?;
    store.set(&"c".try_into()?, vec![].into())?;

    store.set(&"i/j/k".try_into()?, vec![].into())?;
    store.erase(&"i/j/k".try_into()?)?;
    // erasing a missing key is not an error
    store.erase(&"i/j/k".try_into()?)?;

    store.set(&"l/m".try_into()?, vec![0, 1].into())?;
    store.set(&"l/n".try_into()?, vec![2].into())?;
    store.erase_prefix(&"l/".try_into()?)?;

    // overwrite
    store.set(&"a/c".try_into()?, vec![4, 5].into())?;

    Ok(())
}

/// Read the fixture keys from `store`.
///
/// # Errors
/// Returns a [`StorageError`] if a store operation fails.
///
/// # Panics
/// Panics if the store does not hold the values written by [`store_write`].
pub fn store_read<T: ReadableStorageTraits>(store: &T) -> Result<(), StorageError> {
    assert!(store.get(&"notfound".try_into()?)?.is_none());
    assert!(store.size_key(&"notfound".try_into()?)?.is_none());
    assert_eq!(
        store.get(&"a/b".try_into()?)?,
        Some(vec![0u8, 1, 2, 3].into())
    );
    assert_eq!(store.size_key(&"a/b".try_into()?)?, Some(4));
    assert_eq!(store.get(&"a/c".try_into()?)?, Some(vec![4u8, 5].into()));
    assert_eq!(store.get(&"a/d/e".try_into()?)?, Some(vec![].into()));
    assert!(store.get(&"i/j/k".try_into()?)?.is_none());
    assert!(store.get(&"l/m".try_into()?)?.is_none());
    assert!(store.get(&"l/n".try_into()?)?.is_none());
    Ok(())
}

/// List the fixture keys of `store`.
///
/// # Errors
/// Returns a [`StorageError`] if a store operation fails.
///
/// # Panics
/// Panics if the store does not list the keys written by [`store_write`].
pub fn store_list<T: ListableStorageTraits>(store: &T) -> Result<(), StorageError> {
    let key = |key: &str| -> Result<StoreKey, StorageError> { Ok(StoreKey::new(key)?) };

    let mut keys = store.list()?;
    keys.sort();
    assert_eq!(
        keys,
        &[
            key("a/b")?,
            key("a/c")?,
            key("a/d/e")?,
            key("a/f/g")?,
            key("a/f/h")?,
            key("b/c/d")?,
            key("c")?,
        ]
    );

    let mut keys = store.list_prefix(&"a/f/".try_into()?)?;
    keys.sort();
    assert_eq!(keys, &[key("a/f/g")?, key("a/f/h")?]);
    assert!(store.list_prefix(&"z/".try_into()?)?.is_empty());

    assert_eq!(store.size_prefix(&"a/".try_into()?)?, 6);
    assert_eq!(store.size()?, 6);
    Ok(())
}
