#![allow(missing_docs)]

use std::sync::Arc;

use earray::array::{Atom, AtomKind, BufferSizePolicy, EArrayBuilder};
use earray::config::global_config_mut;
use earray::container::Container;
use earray::storage::store::MemoryStore;

fn chunk_shape(atom: Atom, expected_rows: u64) -> (Vec<u64>, u64) {
    let container = Arc::new(Container::new(Arc::new(MemoryStore::new())));
    let array = EArrayBuilder::new(atom)
        .expected_rows(expected_rows)
        .build(container, "/array")
        .unwrap();
    (
        array.chunk_shape().iter().map(|v| v.get()).collect(),
        array.max_buffer_rows().get(),
    )
}

#[test]
#[serial_test::serial]
fn chunk_geometry_non_extendable_axes() {
    let (shape, max_buffer_rows) = chunk_shape(Atom::new(AtomKind::Float64, [0, 4]), 1000);
    assert_eq!(shape, vec![62, 4]);
    assert_eq!(max_buffer_rows, 62);

    let (shape, max_buffer_rows) = chunk_shape(Atom::new(AtomKind::Float32, [3, 0]), 1000);
    assert_eq!(shape, vec![3, 166]);
    assert_eq!(max_buffer_rows, 166);
}

#[test]
#[serial_test::serial]
fn chunk_geometry_exhausted_fallback() {
    testing_logger::setup();
    let (shape, max_buffer_rows) =
        chunk_shape(Atom::new(AtomKind::String { length: 20_000 }, [2, 0]), 1);
    assert_eq!(shape, vec![1, 1]);
    assert_eq!(max_buffer_rows, 1);
    testing_logger::validate(|captured_logs| {
        assert!(
            captured_logs
                .iter()
                .any(|log| log.level == log::Level::Warn
                    && log.body.contains("exceeds the buffer budget"))
        );
    });
}

#[test]
#[serial_test::serial]
fn chunk_geometry_configured() {
    {
        let mut config = global_config_mut();
        config.set_chunk_times(1);
        config.set_buffer_size_policy(BufferSizePolicy::new(1000));
    }
    let (shape, max_buffer_rows) = chunk_shape(Atom::new(AtomKind::Float64, [0, 4]), 1000);
    {
        let mut config = global_config_mut();
        config.set_chunk_times(5);
        config.set_buffer_size_policy(BufferSizePolicy::default());
    }
    // 5 * 1000 byte budget over 32 byte rows
    assert_eq!(shape, vec![156, 4]);
    assert_eq!(max_buffer_rows, 156);
}
